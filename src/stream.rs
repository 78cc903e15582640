//! Extraction of archive members into the on-disk cache
//!
//! The cache mirrors the archive layout: member `pkg/setup.py` of an archive
//! cached under `cache/` lands at `cache/pkg/setup.py`.

use crate::archive::{Descriptor, MemberKind};
use crate::error::{ArchiveError, Result};
use crate::reader::{MemberReader, OpenMode};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// One member of an open archive, bound to a cache location
pub struct ArchiveStream<'a> {
    descriptor: &'a mut dyn Descriptor,
    cache_path: &'a Path,
    member_path: &'a str,
    mode: OpenMode,
    encoding: Option<&'a str>,
}

impl<'a> ArchiveStream<'a> {
    /// `member_path` is the forward-slash member name; empty is the archive root.
    pub fn new(
        descriptor: &'a mut dyn Descriptor,
        cache_path: &'a Path,
        member_path: &'a str,
        mode: OpenMode,
        encoding: Option<&'a str>,
    ) -> Self {
        Self {
            descriptor,
            cache_path,
            member_path: member_path.trim_matches('/'),
            mode,
            encoding,
        }
    }

    /// Kind of the member, if the archive lists or implies it
    pub fn kind(&mut self) -> Result<Option<MemberKind>> {
        if self.member_path.is_empty() {
            return Ok(Some(MemberKind::Dir));
        }

        let members = self.descriptor.members()?;
        if let Some(member) = members.iter().find(|member| member.name == self.member_path) {
            return Ok(Some(member.kind));
        }

        let implied = members.iter().any(|member| {
            member
                .name
                .strip_prefix(self.member_path)
                .is_some_and(|rest| rest.starts_with('/'))
        });
        Ok(implied.then_some(MemberKind::Dir))
    }

    pub fn exists(&mut self) -> Result<bool> {
        Ok(self.kind()?.is_some())
    }

    pub fn is_file(&mut self) -> Result<bool> {
        Ok(self.kind()? == Some(MemberKind::File))
    }

    pub fn is_dir(&mut self) -> Result<bool> {
        Ok(self.kind()? == Some(MemberKind::Dir))
    }

    /// Location of this member in the cache.
    ///
    /// Fails with [`ArchiveError::InvalidPath`] unless every segment of the
    /// member path is a plain name, so the result never leaves `cache_path`.
    pub fn cache_entry(&self) -> Result<PathBuf> {
        let mut entry = self.cache_path.to_path_buf();
        for segment in self.member_path.split('/').filter(|segment| !segment.is_empty()) {
            let mut components = Path::new(segment).components();
            match (components.next(), components.next()) {
                (Some(Component::Normal(part)), None) => entry.push(part),
                _ => {
                    return Err(ArchiveError::InvalidPath(format!(
                        "member {:?} escapes the cache directory",
                        self.member_path
                    )))
                }
            }
        }
        Ok(entry)
    }

    /// Copy the member into the cache and return the cache location.
    ///
    /// Content is written to a sibling `.partial` file first so an
    /// interrupted extraction never looks like a cached member.
    pub fn extract(&mut self) -> Result<PathBuf> {
        match self.kind()? {
            None => return Err(ArchiveError::MemberNotFound(self.member_path.to_string())),
            Some(MemberKind::Dir) => {
                return Err(ArchiveError::IsADirectory(self.member_path.to_string()))
            }
            Some(MemberKind::File) => {}
        }

        let target = self.cache_entry()?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut partial = target.clone().into_os_string();
        partial.push(".partial");
        let partial = PathBuf::from(partial);

        let size = match self.write_member(&partial) {
            Ok(size) => size,
            Err(err) => {
                let _ = fs::remove_file(&partial);
                return Err(err);
            }
        };
        fs::rename(&partial, &target)?;

        debug!(
            "Extracted {} ({} bytes) to {}",
            self.member_path,
            size,
            target.display()
        );
        Ok(target)
    }

    fn write_member(&mut self, destination: &Path) -> Result<u64> {
        let mut sink = BufWriter::new(File::create(destination)?);
        let copied = self.descriptor.copy_member(self.member_path, &mut sink)?;
        sink.flush()?;
        Ok(copied)
    }

    /// Extract the member and open it from the cache
    pub fn open(mut self) -> Result<MemberReader> {
        let target = self.extract()?;
        MemberReader::open(&target, self.mode, self.encoding)
    }
}
