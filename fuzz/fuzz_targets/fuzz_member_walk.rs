#![no_main]

use archive_path::archive::normalize_member_name;
use archive_path::{Member, MemberKind, MemberWalk};
use libfuzzer_sys::fuzz_target;
use std::collections::HashSet;

fuzz_target!(|data: &[u8]| {
    // One member name per line; a trailing '/' marks a directory entry
    let text = String::from_utf8_lossy(data);
    let mut lines = text.lines();
    let prefix = normalize_member_name(lines.next().unwrap_or_default()).unwrap_or_default();

    let members: Vec<Member> = lines
        .filter_map(|line| {
            let kind = if line.ends_with('/') {
                MemberKind::Dir
            } else {
                MemberKind::File
            };
            normalize_member_name(line).map(|name| Member::new(name, kind))
        })
        .collect();

    for recursive in [false, true] {
        let mut seen = HashSet::new();
        for member in MemberWalk::new(members.clone(), &prefix, recursive) {
            assert!(!member.name.is_empty(), "empty name yielded");
            assert!(!member.name.ends_with('/'), "trailing slash in {:?}", member.name);
            assert!(
                member.name.split('/').all(|segment| segment != ".."),
                "parent segment in {:?}",
                member.name
            );
            if !recursive {
                assert!(!member.name.contains('/'), "nested name {:?}", member.name);
            }
            assert!(seen.insert(member.name.clone()), "duplicate {:?}", member.name);
        }
    }
});
