//! Member enumeration
//!
//! Containers list members as flat names and often omit directory entries.
//! [`MemberWalk`] turns such a listing into the children (or all descendants)
//! of a prefix, synthesizing every implied directory exactly once.

use crate::archive::{Member, MemberKind};
use crate::error::Result;
use crate::path::ArchivePath;
use std::collections::{HashSet, VecDeque};
use std::mem;
use tracing::trace;

/// Strip `prefix` and the separator after it from `name`.
///
/// Returns `None` for members outside the prefix and for the prefix itself.
fn strip_prefix<'a>(name: &'a str, prefix: &str) -> Option<&'a str> {
    let name = name.trim_end_matches('/');
    let rest = if prefix.is_empty() {
        name
    } else {
        match name.strip_prefix(prefix).map(|rest| rest.strip_prefix('/')) {
            Some(Some(rest)) => rest,
            Some(None) if name.len() == prefix.len() => return None,
            _ => {
                trace!("Skipping member {name:?} outside prefix {prefix:?}");
                return None;
            }
        }
    };
    (!rest.is_empty()).then_some(rest)
}

/// Text before the last `/`, or `""` for a top-level name
fn parent_of(name: &str) -> &str {
    name.rsplit_once('/').map(|(parent, _)| parent).unwrap_or("")
}

enum Phase {
    /// Non-recursive: one entry per distinct first segment
    TopLevel,
    /// Recursive pass one: every listed member
    Listed,
    /// Recursive pass two: directories implied by listed members
    Implied,
    Done,
}

/// Iterator over the members below a prefix, with names relative to it.
///
/// Listed members come first, in container order; synthesized directories
/// follow in discovery order. No name is yielded twice.
pub struct MemberWalk {
    entries: Vec<Member>,
    cursor: usize,
    phase: Phase,
    seen: HashSet<String>,
    implied: HashSet<String>,
    pending: VecDeque<String>,
}

impl MemberWalk {
    pub fn new(members: Vec<Member>, prefix: &str, recursive: bool) -> Self {
        let prefix = prefix.trim_end_matches('/');
        let entries = members
            .into_iter()
            .filter_map(|member| {
                strip_prefix(&member.name, prefix).map(|rest| Member::new(rest, member.kind))
            })
            .collect();

        Self {
            entries,
            cursor: 0,
            phase: if recursive { Phase::Listed } else { Phase::TopLevel },
            seen: HashSet::new(),
            implied: HashSet::new(),
            pending: VecDeque::new(),
        }
    }

    fn next_top_level(&mut self) -> Option<Member> {
        while let Some(entry) = self.entries.get(self.cursor) {
            self.cursor += 1;
            let (segment, kind) = match entry.name.split_once('/') {
                Some((segment, _)) => (segment, MemberKind::Dir),
                None => (entry.name.as_str(), entry.kind),
            };
            if self.seen.insert(segment.to_string()) {
                return Some(Member::new(segment, kind));
            }
        }
        self.phase = Phase::Done;
        None
    }

    fn next_listed(&mut self) -> Option<Member> {
        while let Some(entry) = self.entries.get(self.cursor) {
            self.cursor += 1;
            if self.seen.insert(entry.name.clone()) {
                return Some(entry.clone());
            }
        }
        self.cursor = 0;
        self.phase = Phase::Implied;
        self.next_implied()
    }

    fn next_implied(&mut self) -> Option<Member> {
        loop {
            if let Some(name) = self.pending.pop_front() {
                return Some(Member::new(name, MemberKind::Dir));
            }

            let entry = self.entries.get(self.cursor)?;
            self.cursor += 1;

            // Ancestors of a listed or synthesized name get their own climb
            let mut parent = parent_of(&entry.name);
            while !parent.is_empty()
                && !self.seen.contains(parent)
                && self.implied.insert(parent.to_string())
            {
                self.pending.push_back(parent.to_string());
                parent = parent_of(parent);
            }
        }
    }
}

impl Iterator for MemberWalk {
    type Item = Member;

    fn next(&mut self) -> Option<Member> {
        let next = match self.phase {
            Phase::TopLevel => self.next_top_level(),
            Phase::Listed => self.next_listed(),
            Phase::Implied => self.next_implied(),
            Phase::Done => None,
        };
        if next.is_none() {
            self.phase = Phase::Done;
            self.entries = Vec::new();
        }
        next
    }
}

enum State {
    Pending,
    Walking(MemberWalk),
    Done,
}

/// Children of an [`ArchivePath`], listed lazily.
///
/// The archive is not touched until the first call to `next`. A listing
/// failure is yielded once, after which the iterator is exhausted.
pub struct IterDir {
    origin: ArchivePath,
    recursive: bool,
    state: State,
}

impl IterDir {
    pub(crate) fn new(origin: ArchivePath, recursive: bool) -> Self {
        Self {
            origin,
            recursive,
            state: State::Pending,
        }
    }

    /// Next child together with its member kind
    pub(crate) fn next_entry(&mut self) -> Option<Result<(ArchivePath, MemberKind)>> {
        loop {
            match mem::replace(&mut self.state, State::Done) {
                State::Pending => {
                    let members = self
                        .origin
                        .pool()
                        .with_descriptor(self.origin.archive_path(), |descriptor| {
                            descriptor.members()
                        });
                    match members {
                        Ok(members) => {
                            let prefix = self.origin.member_posix();
                            self.state =
                                State::Walking(MemberWalk::new(members, &prefix, self.recursive));
                        }
                        Err(err) => return Some(Err(err)),
                    }
                }
                State::Walking(mut walk) => {
                    let member = walk.next()?;
                    self.state = State::Walking(walk);
                    return Some(Ok((self.origin.join(&member.name), member.kind)));
                }
                State::Done => return None,
            }
        }
    }
}

impl Iterator for IterDir {
    type Item = Result<ArchivePath>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_entry().map(|entry| entry.map(|(path, _)| path))
    }
}
