use crate::error::{ArchiveError, Result};
use encoding_rs::{Encoding, UTF_8};
use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// How member content is presented
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OpenMode {
    /// Decoded text with `\r\n` and `\r` translated to `\n`
    #[default]
    Text,
    /// Raw bytes; text reads are decoded but not newline-translated
    Binary,
}

impl FromStr for OpenMode {
    type Err = ArchiveError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "r" | "rt" | "tr" => Ok(Self::Text),
            "rb" | "br" => Ok(Self::Binary),
            _ => Err(ArchiveError::InvalidPath(format!(
                "unsupported open mode '{s}', archives are read-only (expected r, rt or rb)"
            ))),
        }
    }
}

impl fmt::Display for OpenMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => write!(f, "r"),
            Self::Binary => write!(f, "rb"),
        }
    }
}

/// Resolve an encoding label; `None` means UTF-8
pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    match label {
        None => Ok(UTF_8),
        Some(label) => Encoding::for_label(label.trim().as_bytes())
            .ok_or_else(|| ArchiveError::UnsupportedEncoding(label.to_string())),
    }
}

/// Readable stream over a member materialized in the extraction cache
pub struct MemberReader {
    path: PathBuf,
    reader: BufReader<File>,
    mode: OpenMode,
    encoding: &'static Encoding,
}

impl MemberReader {
    /// Open a cache file. Fails if the path is a directory.
    pub fn open(path: &Path, mode: OpenMode, encoding: Option<&str>) -> Result<Self> {
        if path.is_dir() {
            return Err(ArchiveError::IsADirectory(path.display().to_string()));
        }
        let encoding = resolve_encoding(encoding)?;
        let file = File::open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            reader: BufReader::new(file),
            mode,
            encoding,
        })
    }

    /// Location of the backing cache file
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mode(&self) -> OpenMode {
        self.mode
    }

    /// Canonical name of the text encoding (e.g. `"UTF-8"`)
    pub fn encoding(&self) -> &'static str {
        self.encoding.name()
    }

    /// Read all remaining bytes
    pub fn read_bytes(&mut self) -> Result<Vec<u8>> {
        let mut data = Vec::new();
        self.reader.read_to_end(&mut data)?;
        Ok(data)
    }

    /// Read and decode all remaining content
    pub fn read_text(&mut self) -> Result<String> {
        let data = self.read_bytes()?;
        let (text, had_errors) = self.encoding.decode_without_bom_handling(&data);
        if had_errors {
            return Err(ArchiveError::Decode {
                encoding: self.encoding.name().to_string(),
                path: self.path.display().to_string(),
            });
        }

        Ok(match self.mode {
            OpenMode::Text if text.contains('\r') => text.replace("\r\n", "\n").replace('\r', "\n"),
            _ => text.into_owned(),
        })
    }
}

impl Read for MemberReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reader.read(buf)
    }
}

impl fmt::Debug for MemberReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemberReader")
            .field("path", &self.path)
            .field("mode", &self.mode)
            .field("encoding", &self.encoding.name())
            .finish()
    }
}
