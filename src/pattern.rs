//! Glob matching over archive members

use crate::archive::MemberKind;
use crate::error::Result;
use crate::listing::IterDir;
use crate::path::ArchivePath;
use glob::{MatchOptions, Pattern};

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Shell-style pattern tested against member paths relative to a prefix.
///
/// `*` and `?` stay within one path segment, `**` spans segments. A pattern
/// with a trailing `/` only matches directories.
#[derive(Debug, Clone)]
pub struct PatternMatcher {
    pattern: Pattern,
    dirs_only: bool,
}

impl PatternMatcher {
    pub fn new(pattern: &str) -> Result<Self> {
        let trimmed = pattern.trim_end_matches('/');
        let dirs_only = trimmed.len() != pattern.len();
        Ok(Self {
            pattern: Pattern::new(trimmed)?,
            dirs_only,
        })
    }

    pub fn dirs_only(&self) -> bool {
        self.dirs_only
    }

    pub fn matches(&self, candidate: &str, kind: MemberKind) -> bool {
        if self.dirs_only && kind != MemberKind::Dir {
            return false;
        }
        self.pattern.matches_with(candidate, MATCH_OPTIONS)
    }
}

/// Members of a recursive listing that satisfy a pattern.
///
/// Produced fresh by [`ArchivePath::glob`]; order follows the listing.
pub struct Glob {
    prefix_len: usize,
    matcher: PatternMatcher,
    listing: IterDir,
}

impl Glob {
    pub(crate) fn new(origin: &ArchivePath, matcher: PatternMatcher) -> Self {
        let prefix = origin.member_posix();
        let prefix_len = if prefix.is_empty() { 0 } else { prefix.len() + 1 };
        Self {
            prefix_len,
            matcher,
            listing: origin.iterdir(true),
        }
    }
}

impl Iterator for Glob {
    type Item = Result<ArchivePath>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (path, kind) = match self.listing.next_entry()? {
                Ok(entry) => entry,
                Err(err) => return Some(Err(err)),
            };
            let member = path.member_posix();
            let relative = member.get(self.prefix_len..).unwrap_or_default();
            if self.matcher.matches(relative, kind) {
                return Some(Ok(path));
            }
        }
    }
}
