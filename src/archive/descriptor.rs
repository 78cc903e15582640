use crate::archive::format::ArchiveFormat;
use crate::error::{ArchiveError, Result};
use bzip2::read::BzDecoder;
use flate2::read::GzDecoder;
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tar::EntryType;
use tracing::warn;
use xz2::read::XzDecoder;
use zip::ZipArchive;

/// Normalize a member name as stored in a container.
///
/// Backslashes become `/`; empty and `.` segments are dropped, so leading
/// `./`, leading or trailing `/` and doubled separators disappear.
///
/// Returns `None` for a name that is empty after normalizing or that has a
/// `..` segment. Such members are left out of listings and never extracted.
pub fn normalize_member_name(raw: &str) -> Option<String> {
    let mut segments = Vec::new();
    for segment in raw.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => return None,
            _ => segments.push(segment),
        }
    }
    (!segments.is_empty()).then(|| segments.join("/"))
}

/// Kind of an archive member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberKind {
    File,
    Dir,
}

/// One named entry in an archive listing
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Member {
    /// Forward-slash name relative to the archive root, no trailing slash
    pub name: String,
    pub kind: MemberKind,
}

impl Member {
    pub fn new(name: impl Into<String>, kind: MemberKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == MemberKind::Dir
    }
}

/// An open handle to an archive's container reader
pub trait Descriptor {
    /// Container format this descriptor reads
    fn format(&self) -> ArchiveFormat;

    /// Whether the handle can still be used
    fn is_open(&self) -> bool;

    /// Full member listing, in container order
    fn members(&mut self) -> Result<Vec<Member>>;

    /// Stream one file member into `sink`, returning the number of bytes copied
    fn copy_member(&mut self, name: &str, sink: &mut dyn Write) -> Result<u64>;

    /// Release the underlying file. Idempotent.
    fn close(&mut self);
}

fn closed_error(path: &Path) -> ArchiveError {
    ArchiveError::Io(io::Error::new(
        io::ErrorKind::Other,
        format!("archive descriptor is closed: {}", path.display()),
    ))
}

/// Descriptor over a zip container (`.zip`, `.whl`)
pub struct ZipDescriptor {
    path: PathBuf,
    archive: Option<ZipArchive<BufReader<File>>>,
    // normalized name -> central directory index
    index: HashMap<String, usize>,
    listing: Vec<Member>,
}

impl ZipDescriptor {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let mut archive = ZipArchive::new(BufReader::new(file))?;

        let mut index = HashMap::with_capacity(archive.len());
        let mut listing = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let entry = archive.by_index_raw(i)?;
            let raw = entry.name().to_string();
            let Some(name) = normalize_member_name(&raw) else {
                warn!(
                    "Skipping member {raw:?} in {} (empty or path traversal)",
                    path.display()
                );
                continue;
            };
            let kind = if raw.ends_with('/') || raw.ends_with('\\') {
                MemberKind::Dir
            } else {
                MemberKind::File
            };
            index.entry(name.clone()).or_insert(i);
            listing.push(Member::new(name, kind));
        }

        Ok(Self {
            path: path.to_path_buf(),
            archive: Some(archive),
            index,
            listing,
        })
    }
}

impl Descriptor for ZipDescriptor {
    fn format(&self) -> ArchiveFormat {
        ArchiveFormat::Zip
    }

    fn is_open(&self) -> bool {
        self.archive.is_some()
    }

    fn members(&mut self) -> Result<Vec<Member>> {
        if self.archive.is_none() {
            return Err(closed_error(&self.path));
        }
        Ok(self.listing.clone())
    }

    fn copy_member(&mut self, name: &str, sink: &mut dyn Write) -> Result<u64> {
        let archive = self
            .archive
            .as_mut()
            .ok_or_else(|| closed_error(&self.path))?;
        let index = *self
            .index
            .get(name)
            .ok_or_else(|| ArchiveError::MemberNotFound(name.to_string()))?;
        let mut file = archive.by_index(index)?;
        if file.is_dir() {
            return Err(ArchiveError::IsADirectory(name.to_string()));
        }
        Ok(io::copy(&mut file, sink)?)
    }

    fn close(&mut self) {
        self.archive = None;
    }
}

/// Descriptor over the tar family (`.tar`, `.tgz`, `.tar.gz`, `.tar.bz2`, `.tar.xz`).
///
/// Tar has no central directory, so the listing is built by one pass over
/// the stream at open time and member reads rescan from the start, copying
/// the matching entry straight into the caller's sink.
pub struct TarDescriptor {
    path: PathBuf,
    format: ArchiveFormat,
    file: Option<File>,
    listing: Vec<Member>,
}

impl TarDescriptor {
    pub fn open(path: &Path, format: ArchiveFormat) -> Result<Self> {
        let file = File::open(path)?;
        let mut descriptor = Self {
            path: path.to_path_buf(),
            format,
            file: Some(file),
            listing: Vec::new(),
        };
        descriptor.listing = descriptor.scan()?;
        Ok(descriptor)
    }

    /// Rewound decompressing reader over the whole container
    fn stream(&self) -> Result<tar::Archive<Box<dyn Read>>> {
        let mut file = self
            .file
            .as_ref()
            .ok_or_else(|| closed_error(&self.path))?
            .try_clone()?;
        file.seek(SeekFrom::Start(0))?;
        let reader = BufReader::new(file);

        let decoder: Box<dyn Read> = match self.format {
            ArchiveFormat::TarGz => Box::new(GzDecoder::new(reader)),
            ArchiveFormat::TarBz2 => Box::new(BzDecoder::new(reader)),
            ArchiveFormat::TarXz => Box::new(XzDecoder::new(reader)),
            _ => Box::new(reader),
        };
        Ok(tar::Archive::new(decoder))
    }

    fn scan(&self) -> Result<Vec<Member>> {
        let mut archive = self.stream()?;
        let mut listing = Vec::new();

        for entry in archive.entries()? {
            let entry = entry?;
            let entry_type = entry.header().entry_type();
            if matches!(entry_type, EntryType::XGlobalHeader | EntryType::XHeader) {
                continue;
            }

            let raw = String::from_utf8_lossy(&entry.path_bytes()).into_owned();
            let Some(name) = normalize_member_name(&raw) else {
                warn!(
                    "Skipping member {raw:?} in {} (empty or path traversal)",
                    self.path.display()
                );
                continue;
            };
            let kind = if entry_type.is_dir() {
                MemberKind::Dir
            } else {
                MemberKind::File
            };
            listing.push(Member::new(name, kind));
        }

        Ok(listing)
    }
}

impl Descriptor for TarDescriptor {
    fn format(&self) -> ArchiveFormat {
        self.format
    }

    fn is_open(&self) -> bool {
        self.file.is_some()
    }

    fn members(&mut self) -> Result<Vec<Member>> {
        if self.file.is_none() {
            return Err(closed_error(&self.path));
        }
        Ok(self.listing.clone())
    }

    fn copy_member(&mut self, name: &str, sink: &mut dyn Write) -> Result<u64> {
        let mut archive = self.stream()?;

        for entry in archive.entries()? {
            let mut entry = entry?;
            let entry_name = normalize_member_name(&String::from_utf8_lossy(&entry.path_bytes()));
            if entry_name.as_deref() != Some(name) {
                continue;
            }
            if entry.header().entry_type().is_dir() {
                return Err(ArchiveError::IsADirectory(name.to_string()));
            }
            return Ok(io::copy(&mut entry, sink)?);
        }

        Err(ArchiveError::MemberNotFound(name.to_string()))
    }

    fn close(&mut self) {
        self.file = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_member_name() {
        let cases = [
            ("pkg/", "pkg"),
            ("./pkg/setup.py", "pkg/setup.py"),
            ("pkg\\sub\\mod.py", "pkg/sub/mod.py"),
            ("plain.txt", "plain.txt"),
            ("/abs//pkg/./mod.py", "abs/pkg/mod.py"),
        ];
        for (raw, expected) in cases {
            assert_eq!(
                normalize_member_name(raw).as_deref(),
                Some(expected),
                "{raw}"
            );
        }
        assert_eq!(normalize_member_name("./"), None);
        assert_eq!(normalize_member_name(""), None);
    }

    #[test]
    fn test_normalize_rejects_parent_segments() {
        let rejected = [
            "..",
            "../outside.txt",
            "pkg/../../escape.txt",
            "pkg\\..\\x",
            "a/b/..",
        ];
        for raw in rejected {
            assert_eq!(normalize_member_name(raw), None, "{raw}");
        }
        assert_eq!(
            normalize_member_name("pkg/..data").as_deref(),
            Some("pkg/..data")
        );
    }

    #[test]
    fn test_member_kind() {
        assert!(Member::new("pkg", MemberKind::Dir).is_dir());
        assert!(!Member::new("pkg/a.py", MemberKind::File).is_dir());
    }

    #[test]
    fn test_open_missing_archive() {
        let result = ZipDescriptor::open(Path::new("/nonexistent/archive.zip"));
        assert!(matches!(result, Err(ArchiveError::Io(_))));

        let result =
            TarDescriptor::open(Path::new("/nonexistent/archive.tar"), ArchiveFormat::Tar);
        assert!(matches!(result, Err(ArchiveError::Io(_))));
    }
}
