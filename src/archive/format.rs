use crate::archive::descriptor::{Descriptor, TarDescriptor, ZipDescriptor};
use crate::error::{ArchiveError, Result};
use crate::path::name_suffixes;
use std::fmt;
use std::path::Path;

/// Container formats an archive path can be opened as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArchiveFormat {
    /// Zip container (`.zip`, `.whl`)
    Zip,
    /// Uncompressed tar (`.tar`)
    Tar,
    /// Gzip compressed tar (`.tgz`, `.tar.gz`)
    TarGz,
    /// Bzip2 compressed tar (`.tar.bz2`)
    TarBz2,
    /// Xz compressed tar (`.tar.xz`)
    TarXz,
}

/// Filename suffix to format table.
///
/// Keys are complete suffix combinations, so `.tar.gz` is its own entry and
/// is never confused with a bare `.gz`.
pub const EXTRACTORS: &[(&str, ArchiveFormat)] = &[
    (".zip", ArchiveFormat::Zip),
    (".whl", ArchiveFormat::Zip),
    (".tar", ArchiveFormat::Tar),
    (".tgz", ArchiveFormat::TarGz),
    (".tar.gz", ArchiveFormat::TarGz),
    (".tar.bz2", ArchiveFormat::TarBz2),
    (".tar.xz", ArchiveFormat::TarXz),
];

impl ArchiveFormat {
    /// Look up a format by an exact suffix key (e.g. `".tar.gz"`)
    pub fn from_suffix(suffix: &str) -> Option<Self> {
        EXTRACTORS
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(suffix))
            .map(|(_, format)| *format)
    }

    /// Detect the format of an archive from its filename.
    ///
    /// Suffix combinations are tried longest first (`.2.0.tar.gz`, then
    /// `.0.tar.gz`, then `.tar.gz`, ...) and the first one present in
    /// [`EXTRACTORS`] wins, so a multi-part key is never shadowed by a
    /// shorter one.
    pub fn detect(archive_path: &Path) -> Result<Self> {
        let name = archive_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let suffixes = name_suffixes(&name);

        for start in 0..suffixes.len() {
            if let Some(format) = Self::from_suffix(&suffixes[start..].concat()) {
                return Ok(format);
            }
        }

        Err(ArchiveError::UnsupportedFormat(format!(
            "{} (extension: {:?})",
            archive_path.display(),
            suffixes.concat()
        )))
    }

    /// Whether this format is a member of the tar family
    pub fn is_tar(self) -> bool {
        !matches!(self, Self::Zip)
    }

    /// Open a descriptor for an archive of this format
    pub fn open(self, archive_path: &Path) -> Result<Box<dyn Descriptor>> {
        match self {
            Self::Zip => Ok(Box::new(ZipDescriptor::open(archive_path)?)),
            _ => Ok(Box::new(TarDescriptor::open(archive_path, self)?)),
        }
    }
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Zip => "zip",
            Self::Tar => "tar",
            Self::TarGz => "tar.gz",
            Self::TarBz2 => "tar.bz2",
            Self::TarXz => "tar.xz",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_single_suffix() {
        assert_eq!(
            ArchiveFormat::detect(Path::new("dist/pkg.zip")).unwrap(),
            ArchiveFormat::Zip
        );
        assert_eq!(
            ArchiveFormat::detect(Path::new("pkg-1.0-py3-none-any.whl")).unwrap(),
            ArchiveFormat::Zip
        );
        assert_eq!(
            ArchiveFormat::detect(Path::new("pkg.tgz")).unwrap(),
            ArchiveFormat::TarGz
        );
        assert_eq!(
            ArchiveFormat::detect(Path::new("pkg.tar")).unwrap(),
            ArchiveFormat::Tar
        );
    }

    #[test]
    fn test_detect_multi_part_suffix() {
        assert_eq!(
            ArchiveFormat::detect(Path::new("dephell-0.2.0.tar.gz")).unwrap(),
            ArchiveFormat::TarGz
        );
        assert_eq!(
            ArchiveFormat::detect(Path::new("pkg.tar.bz2")).unwrap(),
            ArchiveFormat::TarBz2
        );
        assert_eq!(
            ArchiveFormat::detect(Path::new("pkg.tar.xz")).unwrap(),
            ArchiveFormat::TarXz
        );
    }

    #[test]
    fn test_detect_unsupported() {
        for name in ["pkg.gz", "pkg.rar", "README", "pkg.tar.zst"] {
            let result = ArchiveFormat::detect(Path::new(name));
            assert!(
                matches!(result, Err(ArchiveError::UnsupportedFormat(_))),
                "{name} should be unsupported"
            );
        }
    }

    #[test]
    fn test_detect_is_case_insensitive() {
        assert_eq!(
            ArchiveFormat::detect(Path::new("PKG.ZIP")).unwrap(),
            ArchiveFormat::Zip
        );
    }

    #[test]
    fn test_is_tar() {
        assert!(!ArchiveFormat::Zip.is_tar());
        assert!(ArchiveFormat::TarXz.is_tar());
    }
}
