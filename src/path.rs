//! Path-like access to archive members
//!
//! An [`ArchivePath`] is the pair "archive file + path inside the archive".
//! Navigation (`/`, [`ArchivePath::parent`], [`ArchivePath::with_name`], ...)
//! only rewrites the member path and never touches the archive. Listing,
//! globbing and reading open the archive through the shared
//! [`DescriptorPool`].
//!
//! # Example
//!
//! ```no_run
//! use archive_path::ArchivePath;
//!
//! let root = ArchivePath::new("dist/pkg-0.2.0.tar.gz", "/tmp/pkg-cache");
//! let setup = &root / "pkg-0.2.0" / "setup.py";
//! let source = setup.read_text()?;
//!
//! for child in root.iterdir(false) {
//!     println!("{}", child?);
//! }
//! # Ok::<(), archive_path::ArchiveError>(())
//! ```

use crate::archive::ArchiveFormat;
use crate::config::ArchiveConfig;
use crate::descriptor_pool::{DescriptorPool, RetainGuard};
use crate::error::{ArchiveError, Result};
use crate::listing::IterDir;
use crate::pattern::{Glob, PatternMatcher};
use crate::reader::{MemberReader, OpenMode};
use crate::stream::ArchiveStream;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Div;
use std::path::{Component, Components, Path, PathBuf, MAIN_SEPARATOR_STR};
use tracing::trace;

/// Dotted suffixes of a file name, as in `["tar", "gz"]` -> `[".tar", ".gz"]`.
///
/// Leading dots are not suffixes (`.bashrc` has none) and a name ending in
/// a dot has none.
pub(crate) fn name_suffixes(name: &str) -> Vec<String> {
    if name.ends_with('.') {
        return Vec::new();
    }
    name.trim_start_matches('.')
        .split('.')
        .skip(1)
        .map(|suffix| format!(".{suffix}"))
        .collect()
}

/// Position of the final suffix's dot, if the name has one
fn suffix_start(name: &str) -> Option<usize> {
    let index = name.rfind('.')?;
    (index > 0 && index < name.len() - 1).then_some(index)
}

fn name_suffix(name: &str) -> String {
    suffix_start(name)
        .map(|index| name[index..].to_string())
        .unwrap_or_default()
}

fn name_stem(name: &str) -> String {
    suffix_start(name)
        .map(|index| name[..index].to_string())
        .unwrap_or_else(|| name.to_string())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Keep a member path relative: root, prefix and `.` components are dropped
/// and `..` is resolved lexically, stopping at the archive root.
fn relative_member(path: &Path) -> PathBuf {
    let mut member = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => member.push(part),
            Component::ParentDir => {
                member.pop();
            }
            _ => {}
        }
    }
    member
}

fn posix(path: &Path) -> String {
    let rendered = path.to_string_lossy();
    if cfg!(windows) {
        rendered.replace('\\', "/")
    } else {
        rendered.into_owned()
    }
}

/// Windows device names that cannot be used as file names
const RESERVED_NAMES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

fn percent_encode_path(path: &str) -> String {
    let mut encoded = String::with_capacity(path.len());
    for byte in path.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' | b'/' => {
                encoded.push(byte as char)
            }
            _ => encoded.push_str(&format!("%{byte:02X}")),
        }
    }
    encoded
}

/// Result of [`ArchivePath::parent`] and [`ArchivePath::parents`].
///
/// Inside the archive the parent is another [`ArchivePath`]; at the archive
/// root it is the archive's own filesystem location.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Parent {
    Member(ArchivePath),
    Archive(PathBuf),
}

impl Parent {
    pub fn as_member(&self) -> Option<&ArchivePath> {
        match self {
            Self::Member(path) => Some(path),
            Self::Archive(_) => None,
        }
    }

    pub fn as_archive(&self) -> Option<&Path> {
        match self {
            Self::Member(_) => None,
            Self::Archive(path) => Some(path),
        }
    }
}

/// A file or directory inside an archive, addressed like a filesystem path.
///
/// Identity is the triple (archive path, cache path, member path). The
/// descriptor pool and default text encoding travel with derived values but
/// are not part of equality, hashing or `Debug` output.
#[derive(Clone)]
pub struct ArchivePath {
    archive_path: PathBuf,
    cache_path: PathBuf,
    member_path: PathBuf,
    pool: DescriptorPool,
    encoding: Option<String>,
}

impl ArchivePath {
    /// Root of `archive_path`, extracting into `cache_path` on demand.
    ///
    /// Neither location needs to exist yet; the archive is first opened by
    /// the first listing, query or read.
    pub fn new(archive_path: impl AsRef<Path>, cache_path: impl AsRef<Path>) -> Self {
        Self {
            archive_path: archive_path.as_ref().to_path_buf(),
            cache_path: cache_path.as_ref().to_path_buf(),
            member_path: PathBuf::new(),
            pool: DescriptorPool::default(),
            encoding: None,
        }
    }

    /// Root built from a loaded [`ArchiveConfig`]
    pub fn from_config(archive_path: impl AsRef<Path>, config: &ArchiveConfig) -> Self {
        Self {
            pool: DescriptorPool::new(config.descriptor_policy),
            encoding: config.encoding.clone(),
            ..Self::new(archive_path, &config.cache_dir)
        }
    }

    /// Same archive and cache, pointing at `member_path`
    pub fn with_member(&self, member_path: impl AsRef<Path>) -> Self {
        Self {
            member_path: relative_member(member_path.as_ref()),
            ..self.clone()
        }
    }

    /// Share `pool` instead of this value's own descriptor pool
    pub fn with_pool(mut self, pool: DescriptorPool) -> Self {
        self.pool = pool;
        self
    }

    /// Default text encoding label used by [`read_text`](Self::read_text)
    pub fn with_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = Some(encoding.into());
        self
    }

    pub fn archive_path(&self) -> &Path {
        &self.archive_path
    }

    pub fn cache_path(&self) -> &Path {
        &self.cache_path
    }

    pub fn member_path(&self) -> &Path {
        &self.member_path
    }

    pub fn pool(&self) -> &DescriptorPool {
        &self.pool
    }

    pub fn encoding(&self) -> Option<&str> {
        self.encoding.as_deref()
    }

    /// Container format, from the archive's filename
    pub fn format(&self) -> Result<ArchiveFormat> {
        ArchiveFormat::detect(&self.archive_path)
    }

    /// Whether this value addresses the archive root
    pub fn is_root(&self) -> bool {
        self.member_path.as_os_str().is_empty()
    }

    // Introspection

    /// Final component of the member path, or the archive's file name at the root
    pub fn name(&self) -> String {
        if self.is_root() {
            file_name(&self.archive_path)
        } else {
            file_name(&self.member_path)
        }
    }

    pub fn suffix(&self) -> String {
        name_suffix(&self.name())
    }

    pub fn suffixes(&self) -> Vec<String> {
        name_suffixes(&self.name())
    }

    pub fn stem(&self) -> String {
        name_stem(&self.name())
    }

    /// Archive path components followed by member path components
    pub fn parts(&self) -> Vec<String> {
        self.archive_path
            .components()
            .chain(self.member_path.components())
            .map(|component| component.as_os_str().to_string_lossy().into_owned())
            .collect()
    }

    /// Drive or UNC prefix of the archive path (Windows only)
    pub fn drive(&self) -> String {
        match self.archive_path.components().next() {
            Some(Component::Prefix(prefix)) => prefix.as_os_str().to_string_lossy().into_owned(),
            _ => String::new(),
        }
    }

    /// Root separator of the archive path, if it has one
    pub fn root(&self) -> String {
        if self.archive_path.has_root() {
            MAIN_SEPARATOR_STR.to_string()
        } else {
            String::new()
        }
    }

    pub fn anchor(&self) -> String {
        format!("{}{}", self.drive(), self.root())
    }

    pub fn is_absolute(&self) -> bool {
        self.archive_path.is_absolute()
    }

    /// Whether the archive's file name is a reserved device name on Windows
    pub fn is_reserved(&self) -> bool {
        if !cfg!(windows) {
            return false;
        }
        let name = file_name(&self.archive_path);
        let base = name.split('.').next().unwrap_or_default().trim_end();
        RESERVED_NAMES
            .iter()
            .any(|reserved| reserved.eq_ignore_ascii_case(base))
    }

    /// Member path in forward-slash form, empty at the archive root
    pub fn member_posix(&self) -> String {
        self.member_path
            .components()
            .map(|component| component.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Archive location joined with the member path, forward-slash form
    pub fn as_posix(&self) -> String {
        if self.is_root() {
            posix(&self.archive_path)
        } else {
            format!(
                "{}/{}",
                posix(&self.archive_path).trim_end_matches('/'),
                self.member_posix()
            )
        }
    }

    /// `file://` URI of [`as_posix`](Self::as_posix). Needs an absolute archive path.
    pub fn as_uri(&self) -> Result<String> {
        if !self.is_absolute() {
            return Err(ArchiveError::InvalidPath(format!(
                "relative path can't be expressed as a file URI: {}",
                self.archive_path.display()
            )));
        }
        let rendered = self.as_posix();
        if rendered.starts_with('/') {
            Ok(format!("file://{}", percent_encode_path(&rendered)))
        } else {
            Ok(format!("file:///{}", percent_encode_path(&rendered)))
        }
    }

    /// Components of the member path
    pub fn components(&self) -> Components<'_> {
        self.member_path.components()
    }

    /// Whether the member path starts with `prefix` (whole components)
    pub fn starts_with(&self, prefix: impl AsRef<Path>) -> bool {
        self.member_path.starts_with(prefix)
    }

    /// Candidate location of this member in the extraction cache
    pub fn cache_entry(&self) -> PathBuf {
        self.cache_path.join(&self.member_path)
    }

    // Navigation

    pub fn join(&self, part: impl AsRef<Path>) -> Self {
        self.with_member(self.member_path.join(part))
    }

    pub fn joinpath<I, P>(&self, parts: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut member = self.member_path.clone();
        for part in parts {
            member.push(part);
        }
        self.with_member(member)
    }

    /// Containing member, or the archive location itself at the root
    pub fn parent(&self) -> Parent {
        match self.member_path.parent() {
            Some(parent) if !self.is_root() => Parent::Member(self.with_member(parent)),
            _ => Parent::Archive(self.archive_path.clone()),
        }
    }

    /// Member ancestors (nearest first, ending at the archive root), then the
    /// archive location's own ancestors
    pub fn parents(&self) -> Vec<Parent> {
        let members = self
            .member_path
            .ancestors()
            .skip(1)
            .map(|ancestor| Parent::Member(self.with_member(ancestor)));
        let archives = self
            .archive_path
            .ancestors()
            .skip(1)
            .filter(|ancestor| !ancestor.as_os_str().is_empty())
            .map(|ancestor| Parent::Archive(ancestor.to_path_buf()));
        members.chain(archives).collect()
    }

    /// Replace the final member component
    pub fn with_name(&self, name: &str) -> Result<Self> {
        if self.is_root() {
            return Err(ArchiveError::InvalidPath(format!(
                "{} has an empty member name",
                self.archive_path.display()
            )));
        }
        if name.is_empty() || name == "." || name.contains('/') || name.contains('\\') {
            return Err(ArchiveError::InvalidPath(format!("invalid name {name:?}")));
        }
        Ok(self.with_member(self.member_path.with_file_name(name)))
    }

    /// Replace (or add, or with `""` remove) the final suffix of the member name
    pub fn with_suffix(&self, suffix: &str) -> Result<Self> {
        if !suffix.is_empty() && (!suffix.starts_with('.') || suffix == "." || suffix.contains('/'))
        {
            return Err(ArchiveError::InvalidPath(format!("invalid suffix {suffix:?}")));
        }
        if self.is_root() {
            return Err(ArchiveError::InvalidPath(format!(
                "{} has an empty member name",
                self.archive_path.display()
            )));
        }
        let name = format!("{}{}", name_stem(&file_name(&self.member_path)), suffix);
        self.with_name(&name)
    }

    /// Expand a leading `~` in the archive path
    pub fn expanduser(&self) -> Result<Self> {
        let mut components = self.archive_path.components();
        let Some(Component::Normal(first)) = components.next() else {
            return Ok(self.clone());
        };
        if first != "~" {
            return Ok(self.clone());
        }
        let home = dirs::home_dir().ok_or_else(|| {
            ArchiveError::InvalidPath("could not determine home directory".to_string())
        })?;
        Ok(Self {
            archive_path: home.join(components.as_path()),
            ..self.clone()
        })
    }

    /// Make the archive path absolute, resolving symlinks where it exists
    pub fn resolve(&self) -> Result<Self> {
        let archive_path = match std::fs::canonicalize(&self.archive_path) {
            Ok(path) => path,
            Err(_) => std::env::current_dir()?.join(&self.archive_path),
        };
        Ok(Self {
            archive_path,
            ..self.clone()
        })
    }

    // Archive access

    /// Keep the archive open until the returned guard is dropped.
    ///
    /// Every operation in between, on this value or any value sharing its
    /// pool, reuses the same descriptor.
    pub fn retain_descriptor(&self) -> Result<RetainGuard> {
        self.pool.retain(&self.archive_path)
    }

    /// Children (or, with `recursive`, all descendants) of this member.
    ///
    /// Directories the archive does not list are synthesized from member
    /// names. Nothing is read until the iterator is first advanced.
    pub fn iterdir(&self, recursive: bool) -> IterDir {
        IterDir::new(self.clone(), recursive)
    }

    /// Descendants whose path relative to this member matches `pattern`
    pub fn glob(&self, pattern: &str) -> Result<Glob> {
        let matcher = PatternMatcher::new(pattern)?;
        Ok(Glob::new(self, matcher))
    }

    fn with_stream<T, F>(&self, mode: OpenMode, encoding: Option<&str>, f: F) -> Result<T>
    where
        F: FnOnce(ArchiveStream<'_>) -> Result<T>,
    {
        let member = self.member_posix();
        self.pool.with_descriptor(&self.archive_path, |descriptor| {
            f(ArchiveStream::new(
                descriptor,
                &self.cache_path,
                &member,
                mode,
                encoding,
            ))
        })
    }

    pub fn exists(&self) -> Result<bool> {
        let cached = self.cache_entry();
        if cached.exists() {
            trace!("Cache hit for {}", cached.display());
            return Ok(true);
        }
        self.with_stream(OpenMode::Binary, None, |mut stream| stream.exists())
    }

    pub fn is_file(&self) -> Result<bool> {
        let cached = self.cache_entry();
        if cached.exists() {
            trace!("Cache hit for {}", cached.display());
            return Ok(cached.is_file());
        }
        self.with_stream(OpenMode::Binary, None, |mut stream| stream.is_file())
    }

    pub fn is_dir(&self) -> Result<bool> {
        let cached = self.cache_entry();
        if cached.exists() {
            trace!("Cache hit for {}", cached.display());
            return Ok(cached.is_dir());
        }
        self.with_stream(OpenMode::Binary, None, |mut stream| stream.is_dir())
    }

    /// Open the member for reading.
    ///
    /// A member already in the cache is read from disk without opening the
    /// archive; otherwise it is extracted into the cache first. The default
    /// encoding only applies in [`OpenMode::Text`].
    pub fn open(&self, mode: OpenMode, encoding: Option<&str>) -> Result<MemberReader> {
        let encoding = match mode {
            OpenMode::Text => encoding.or(self.encoding.as_deref()),
            OpenMode::Binary => encoding,
        };
        let cached = self.cache_entry();
        if cached.exists() {
            trace!("Cache hit for {}", cached.display());
            return MemberReader::open(&cached, mode, encoding);
        }
        self.with_stream(mode, encoding, |stream| stream.open())
    }

    pub fn read_bytes(&self) -> Result<Vec<u8>> {
        self.open(OpenMode::Binary, None)?.read_bytes()
    }

    pub fn read_text(&self) -> Result<String> {
        self.open(OpenMode::Text, None)?.read_text()
    }

    /// [`read_text`](Self::read_text) with an explicit encoding label
    pub fn read_text_with(&self, encoding: &str) -> Result<String> {
        self.open(OpenMode::Text, Some(encoding))?.read_text()
    }
}

impl PartialEq for ArchivePath {
    fn eq(&self, other: &Self) -> bool {
        self.archive_path == other.archive_path
            && self.cache_path == other.cache_path
            && self.member_path == other.member_path
    }
}

impl Eq for ArchivePath {}

impl Hash for ArchivePath {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.archive_path.hash(state);
        self.cache_path.hash(state);
        self.member_path.hash(state);
    }
}

impl fmt::Debug for ArchivePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArchivePath")
            .field("archive_path", &self.archive_path)
            .field("cache_path", &self.cache_path)
            .field("member_path", &self.member_path)
            .finish()
    }
}

/// Renders the member path
impl fmt::Display for ArchivePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.member_path.display())
    }
}

impl<P: AsRef<Path>> Div<P> for &ArchivePath {
    type Output = ArchivePath;

    fn div(self, part: P) -> ArchivePath {
        self.join(part)
    }
}

impl<P: AsRef<Path>> Div<P> for ArchivePath {
    type Output = ArchivePath;

    fn div(self, part: P) -> ArchivePath {
        self.join(part)
    }
}
