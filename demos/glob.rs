/// Glob example: find members by pattern
///
/// Run with: cargo run --example glob -- path/to/archive.tar.gz '*/setup.py'
use archive_path::{ArchiveConfig, ArchivePath};
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    let mut args = std::env::args().skip(1);
    let (Some(archive), pattern) = (args.next(), args.next()) else {
        eprintln!("usage: glob <archive> [pattern]");
        std::process::exit(2);
    };
    let pattern = pattern.unwrap_or_else(|| "**/*".to_string());

    // Optional archive.toml next to the working directory
    let config = match ArchiveConfig::load("archive.toml") {
        Ok(config) => config,
        Err(_) => ArchiveConfig::new(std::env::temp_dir().join("archive-path-glob-cache")),
    };

    let root = ArchivePath::from_config(&archive, &config);
    // One open for the whole run
    let _guard = root.retain_descriptor()?;

    let mut matched = 0;
    for path in root.glob(&pattern)? {
        let path = path?;
        if path.is_dir()? {
            println!("{}/", path);
        } else {
            println!("{} ({} bytes)", path, path.read_bytes()?.len());
        }
        matched += 1;
    }

    println!("\n{matched} member(s) matching {pattern:?}");
    println!("descriptors opened: {}", root.pool().open_count());
    Ok(())
}
