//! Shared fixture archives for integration tests
//!
//! Layouts mirror real Python distributions: an sdist tarball with explicit
//! directory entries, a wheel without any, and two zips (with and without
//! directory entries).

#![allow(dead_code)]

use archive_path::ArchiveFormat;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tar::{EntryType, Header};
use tempfile::TempDir;
use zip::write::{FileOptions, ZipWriter};

/// One entry of a fixture archive
#[derive(Clone, Copy)]
pub enum Entry {
    Dir(&'static str),
    File(&'static str, &'static [u8]),
}

pub const SETUP_PY: &[u8] =
    b"from setuptools import setup\n\nsetup(name='dephell', version='0.2.0')\n";
pub const INIT_PY: &[u8] = b"from .controllers import Graph, Mutator\n";

pub const SDIST: &[Entry] = &[
    Entry::Dir("dephell-0.2.0/"),
    Entry::File("dephell-0.2.0/setup.py", SETUP_PY),
    Entry::File("dephell-0.2.0/PKG-INFO", b"Metadata-Version: 2.1\nName: dephell\n"),
    Entry::Dir("dephell-0.2.0/dephell/"),
    Entry::File("dephell-0.2.0/dephell/__init__.py", INIT_PY),
    Entry::Dir("dephell-0.2.0/dephell/controllers/"),
    Entry::File("dephell-0.2.0/dephell/controllers/__init__.py", b"from ._graph import Graph\n"),
    Entry::File("dephell-0.2.0/dephell/controllers/_graph.py", b"class Graph:\n    pass\n"),
];

pub const WHEEL: &[Entry] = &[
    Entry::File("dephell/__init__.py", INIT_PY),
    Entry::File("dephell/controllers/__init__.py", b"from ._graph import Graph\n"),
    Entry::File("dephell/controllers/_graph.py", b"class Graph:\n    pass\n"),
    Entry::File("dephell-0.2.0.dist-info/WHEEL", b"Wheel-Version: 1.0\n"),
    Entry::File("dephell-0.2.0.dist-info/METADATA", b"Name: dephell\n"),
];

pub const DNSPYTHON: &[Entry] = &[
    Entry::File("dnspython-1.16.0/setup.py", SETUP_PY),
    Entry::File("dnspython-1.16.0/dns/__init__.py", b"__all__ = ['name']\n"),
    Entry::File("dnspython-1.16.0/dns/name.py", b"class Name:\n    pass\n"),
    Entry::File("dnspython-1.16.0/dns/rdtypes/ANY/CNAME.py", b"class CNAME:\n    pass\n"),
    Entry::File("dnspython-1.16.0/dns/rdtypes/IN/A.py", b"class A:\n    pass\n"),
];

pub const GRAPHVIZ: &[Entry] = &[
    Entry::Dir("graphviz-0.13.2/"),
    Entry::File("graphviz-0.13.2/setup.py", SETUP_PY),
    Entry::Dir("graphviz-0.13.2/graphviz/"),
    Entry::File("graphviz-0.13.2/graphviz/__init__.py", b"from .dot import Graph\n"),
    Entry::File("graphviz-0.13.2/graphviz/dot.py", b"class Graph:\n    pass\n"),
    Entry::Dir("graphviz-0.13.2/docs/"),
];

/// Scratch directory holding generated archives and a cache directory
pub struct Fixtures {
    dir: TempDir,
}

impl Fixtures {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Extraction cache root; not created until something is extracted
    pub fn cache(&self) -> PathBuf {
        self.dir.path().join("cache")
    }

    pub fn archive(&self, file_name: &str, entries: &[Entry]) -> PathBuf {
        write_archive(&self.dir.path().join(file_name), entries)
    }

    pub fn sdist(&self) -> PathBuf {
        self.archive("sdist.tar.gz", SDIST)
    }

    pub fn wheel(&self) -> PathBuf {
        self.archive("wheel.whl", WHEEL)
    }

    pub fn dnspython(&self) -> PathBuf {
        self.archive("dnspython-1.16.0.zip", DNSPYTHON)
    }

    pub fn graphviz(&self) -> PathBuf {
        self.archive("graphviz-0.13.2.zip", GRAPHVIZ)
    }
}

/// Write `entries` as an archive whose format follows the file name
pub fn write_archive(path: &Path, entries: &[Entry]) -> PathBuf {
    match ArchiveFormat::detect(path).unwrap() {
        ArchiveFormat::Zip => write_zip(path, entries),
        format => write_tar(path, format, entries),
    }
    path.to_path_buf()
}

fn write_zip(path: &Path, entries: &[Entry]) {
    let mut zip = ZipWriter::new(File::create(path).unwrap());
    let options: FileOptions<()> = FileOptions::default();

    for entry in entries {
        match entry {
            Entry::Dir(name) => zip.add_directory(*name, options).unwrap(),
            Entry::File(name, data) => {
                zip.start_file(*name, options).unwrap();
                zip.write_all(data).unwrap();
            }
        }
    }

    zip.finish().unwrap();
}

/// Store `name` in the header verbatim. `Header::set_path` refuses `..` and
/// absolute names, which hostile fixtures need.
fn set_raw_name(header: &mut Header, name: &str) {
    let field = &mut header.as_old_mut().name;
    assert!(name.len() < field.len(), "fixture name too long: {name}");
    field.fill(0);
    field[..name.len()].copy_from_slice(name.as_bytes());
}

fn tar_bytes(entries: &[Entry]) -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());

    for entry in entries {
        let mut header = Header::new_gnu();
        match entry {
            Entry::Dir(name) => {
                set_raw_name(&mut header, name);
                header.set_entry_type(EntryType::Directory);
                header.set_size(0);
                header.set_mode(0o755);
                header.set_cksum();
                builder.append(&header, std::io::empty()).unwrap();
            }
            Entry::File(name, data) => {
                set_raw_name(&mut header, name);
                header.set_size(data.len() as u64);
                header.set_mode(0o644);
                header.set_cksum();
                builder.append(&header, *data).unwrap();
            }
        }
    }

    builder.into_inner().unwrap()
}

fn write_tar(path: &Path, format: ArchiveFormat, entries: &[Entry]) {
    let data = tar_bytes(entries);
    let file = File::create(path).unwrap();

    match format {
        ArchiveFormat::TarGz => {
            let mut encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
            encoder.write_all(&data).unwrap();
            encoder.finish().unwrap();
        }
        ArchiveFormat::TarBz2 => {
            let mut encoder = bzip2::write::BzEncoder::new(file, bzip2::Compression::default());
            encoder.write_all(&data).unwrap();
            encoder.finish().unwrap();
        }
        ArchiveFormat::TarXz => {
            let mut encoder = xz2::write::XzEncoder::new(file, 6);
            encoder.write_all(&data).unwrap();
            encoder.finish().unwrap();
        }
        _ => {
            let mut file = file;
            file.write_all(&data).unwrap();
        }
    }
}

/// Member paths (forward-slash form) of a listing, panicking on errors
pub fn members<I>(listing: I) -> Vec<String>
where
    I: IntoIterator<Item = archive_path::Result<archive_path::ArchivePath>>,
{
    listing
        .into_iter()
        .map(|path| path.unwrap().member_posix())
        .collect()
}

pub fn assert_unique(paths: &[String]) {
    for path in paths {
        assert_eq!(
            paths.iter().filter(|other| *other == path).count(),
            1,
            "duplicate entry: {path}"
        );
    }
}
