#![no_main]

use archive_path::ArchivePath;
use libfuzzer_sys::fuzz_target;
use std::io::Write;

fuzz_target!(|data: &[u8]| {
    let Ok(dir) = tempfile::TempDir::new() else {
        return;
    };

    // The same bytes under every supported suffix; listing and reading must
    // fail cleanly on garbage, never panic
    for suffix in [".zip", ".tar", ".tar.gz", ".tar.bz2", ".tar.xz"] {
        let path = dir.path().join(format!("fuzz{suffix}"));
        let Ok(mut file) = std::fs::File::create(&path) else {
            return;
        };
        if file.write_all(data).is_err() {
            return;
        }
        drop(file);

        let root = ArchivePath::new(&path, dir.path().join(format!("cache{suffix}")));
        for child in root.iterdir(true).take(256) {
            let Ok(child) = child else {
                break;
            };
            let _ = child.is_dir();
            let _ = child.read_bytes();
        }
        let _ = root.glob("*/setup.py").map(|matches| matches.count());
    }
});
