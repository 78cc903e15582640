//! Generate seed corpus for fuzzing

use std::fs;
use std::io::Write;
use zip::write::{FileOptions, ZipWriter};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let listing_dir = "fuzz/corpus/fuzz_archive_listing";
    let walk_dir = "fuzz/corpus/fuzz_member_walk";
    fs::create_dir_all(listing_dir)?;
    fs::create_dir_all(walk_dir)?;

    println!("Generating seed corpus...");

    // Seed 1: wheel-like zip without directory entries
    {
        let path = format!("{}/seed_wheel.zip", listing_dir);
        let mut zip = ZipWriter::new(fs::File::create(&path)?);
        let options: FileOptions<()> = FileOptions::default();
        zip.start_file("pkg/__init__.py", options)?;
        zip.write_all(b"from .core import run\n")?;
        zip.start_file("pkg-1.0.dist-info/WHEEL", options)?;
        zip.write_all(b"Wheel-Version: 1.0\n")?;
        zip.finish()?;
        println!("✓ Generated: {}", path);
    }

    // Seed 2: plain tar with explicit directories
    {
        let path = format!("{}/seed_sdist.tar", listing_dir);
        let mut builder = tar::Builder::new(fs::File::create(&path)?);
        let mut header = tar::Header::new_gnu();
        header.set_path("pkg-1.0/")?;
        header.set_entry_type(tar::EntryType::Directory);
        header.set_size(0);
        header.set_cksum();
        builder.append(&header, std::io::empty())?;

        let data = b"from setuptools import setup\n";
        let mut header = tar::Header::new_gnu();
        header.set_path("pkg-1.0/setup.py")?;
        header.set_size(data.len() as u64);
        header.set_cksum();
        builder.append(&header, &data[..])?;
        builder.finish()?;
        println!("✓ Generated: {}", path);
    }

    // Seeds 3-5: member name listings (first line is the prefix)
    let listings: [(&str, &str); 3] = [
        ("seed_flat.txt", "\nsetup.py\nREADME\n"),
        ("seed_nested.txt", "\npkg/a/b/c.py\npkg/a/\npkg/setup.py\n"),
        ("seed_prefix.txt", "dns\ndns/name.py\ndnspython/setup.py\ndns/rdtypes/ANY/CNAME.py\n"),
    ];
    for (name, content) in listings {
        let path = format!("{}/{}", walk_dir, name);
        fs::write(&path, content)?;
        println!("✓ Generated: {}", path);
    }

    println!("\nSeed corpus ready");
    Ok(())
}
