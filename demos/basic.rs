/// Basic example: navigate, list and read members of an archive
///
/// Run with: cargo run --example basic -- path/to/package.whl
use archive_path::{ArchivePath, OpenMode};
use std::error::Error;
use std::io::Write;
use std::path::PathBuf;
use zip::write::{FileOptions, ZipWriter};

fn main() -> Result<(), Box<dyn Error>> {
    println!("=== archive-path Basic Example ===\n");

    let cache = std::env::temp_dir().join("archive-path-basic-cache");
    let archive = match std::env::args().nth(1) {
        Some(path) => PathBuf::from(path),
        None => {
            println!("1. Creating example_basic.zip...");
            create_archive()?
        }
    };

    let root = ArchivePath::new(&archive, &cache);
    println!("   Archive: {} ({})", root.archive_path().display(), root.format()?);

    println!("\n2. Top-level members:");
    for child in root.iterdir(false) {
        let child = child?;
        let kind = if child.is_dir()? { "dir " } else { "file" };
        println!("     [{kind}] {child}");
    }

    println!("\n3. Everything, recursively:");
    for child in root.iterdir(true) {
        println!("     - {}", child?);
    }

    println!("\n4. Reading a member:");
    let readme = &root / "example" / "readme.txt";
    if readme.is_file()? {
        println!("     {}", readme.read_text()?.trim_end());
        println!("     cached at {}", readme.cache_entry().display());

        let reader = readme.open(OpenMode::Binary, None)?;
        println!("     reopened from cache: {reader:?}");
    } else {
        println!("     (no example/readme.txt in this archive)");
    }

    println!("\n5. Navigation:");
    let nested = &root / "example" / "docs" / "notes.md";
    println!("     member:   {}", nested.member_posix());
    println!("     combined: {}", nested.as_posix());
    println!("     name={} stem={} suffix={}", nested.name(), nested.stem(), nested.suffix());
    if let Some(parent) = nested.parent().as_member() {
        println!("     parent:   {parent}");
    }

    println!("\n✓ Example complete!");
    Ok(())
}

fn create_archive() -> Result<PathBuf, Box<dyn Error>> {
    let path = PathBuf::from("example_basic.zip");
    let mut zip = ZipWriter::new(std::fs::File::create(&path)?);
    let options: FileOptions<()> = FileOptions::default();

    zip.start_file("example/readme.txt", options)?;
    zip.write_all(b"This is a readme file for the basic example.\n")?;
    zip.start_file("example/docs/notes.md", options)?;
    zip.write_all(b"# Notes\n\nDirectories in this archive are implied, not listed.\n")?;
    zip.start_file("example/data.json", options)?;
    zip.write_all(br#"{"name": "Basic Example", "version": "1.0.0"}"#)?;
    zip.finish()?;

    println!("   ✓ Archive created: {}", path.display());
    Ok(path)
}
