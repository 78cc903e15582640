//! Descriptor lifecycle management
//!
//! Archive handles are kept in a [`DescriptorPool`] keyed by the archive's
//! canonical location instead of inside each [`ArchivePath`](crate::ArchivePath).
//! Paths derived from one root share the root's pool, so navigation never
//! forces the archive to be reopened.

use crate::archive::{ArchiveFormat, Descriptor};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::debug;

/// When a freshly opened descriptor is released
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DescriptorPolicy {
    /// Close a handle when the operation that opened it finishes, unless a
    /// [`RetainGuard`] holds it
    #[default]
    Scoped,
    /// Keep handles open between operations until [`DescriptorPool::close_all`]
    Retain,
}

#[derive(Default)]
struct Slot {
    descriptor: Option<Box<dyn Descriptor>>,
    holds: usize,
}

#[derive(Default)]
struct PoolState {
    policy: DescriptorPolicy,
    slots: HashMap<PathBuf, Slot>,
    opened: usize,
}

/// Shared arena of open archive descriptors.
///
/// Cloning the pool is cheap and yields another reference to the same arena.
/// The pool is single-threaded; independent threads need independent roots.
#[derive(Clone, Default)]
pub struct DescriptorPool {
    state: Rc<RefCell<PoolState>>,
}

fn pool_key(archive_path: &Path) -> PathBuf {
    std::fs::canonicalize(archive_path).unwrap_or_else(|_| archive_path.to_path_buf())
}

impl DescriptorPool {
    pub fn new(policy: DescriptorPolicy) -> Self {
        let pool = Self::default();
        pool.state.borrow_mut().policy = policy;
        pool
    }

    pub fn policy(&self) -> DescriptorPolicy {
        self.state.borrow().policy
    }

    /// Number of descriptors this pool has opened so far
    pub fn open_count(&self) -> usize {
        self.state.borrow().opened
    }

    /// Whether a live descriptor for `archive_path` is currently held
    pub fn is_open(&self, archive_path: &Path) -> bool {
        let key = pool_key(archive_path);
        self.state
            .borrow()
            .slots
            .get(&key)
            .and_then(|slot| slot.descriptor.as_ref())
            .is_some_and(|descriptor| descriptor.is_open())
    }

    /// Run `f` with a descriptor for `archive_path`.
    ///
    /// A live pooled descriptor is reused; otherwise one is opened through
    /// the format registry. If `f` fails, the descriptor is closed and
    /// dropped from the pool so the next use reopens the archive. A freshly
    /// opened descriptor is closed on return unless the policy or a
    /// [`RetainGuard`] keeps it.
    pub fn with_descriptor<T, F>(&self, archive_path: &Path, f: F) -> Result<T>
    where
        F: FnOnce(&mut dyn Descriptor) -> Result<T>,
    {
        let key = pool_key(archive_path);

        let (mut descriptor, fresh) = {
            let mut state = self.state.borrow_mut();
            let pooled = state
                .slots
                .get_mut(&key)
                .and_then(|slot| slot.descriptor.take());
            match pooled {
                Some(descriptor) if descriptor.is_open() => {
                    debug!("Reusing descriptor for {}", archive_path.display());
                    (descriptor, false)
                }
                _ => {
                    let format = ArchiveFormat::detect(archive_path)?;
                    let descriptor = format.open(archive_path)?;
                    state.opened += 1;
                    debug!("Opened {} descriptor for {}", format, archive_path.display());
                    (descriptor, true)
                }
            }
        };

        let result = f(&mut *descriptor);

        let mut state = self.state.borrow_mut();
        if result.is_err() {
            debug!("Discarding descriptor for {} after error", archive_path.display());
            descriptor.close();
            return result;
        }

        let held = state.slots.get(&key).is_some_and(|slot| slot.holds > 0);
        if fresh && !held && state.policy == DescriptorPolicy::Scoped {
            debug!("Closing descriptor for {}", archive_path.display());
            descriptor.close();
        } else {
            state.slots.entry(key).or_default().descriptor = Some(descriptor);
        }

        result
    }

    /// Keep a descriptor for `archive_path` open until the guard is dropped.
    ///
    /// The archive is opened immediately so failures surface here.
    pub fn retain(&self, archive_path: &Path) -> Result<RetainGuard> {
        let key = pool_key(archive_path);
        self.state.borrow_mut().slots.entry(key.clone()).or_default().holds += 1;

        let guard = RetainGuard {
            pool: self.clone(),
            key,
        };
        self.with_descriptor(archive_path, |_| Ok(()))?;
        Ok(guard)
    }

    /// Close and forget every pooled descriptor
    pub fn close_all(&self) {
        let mut state = self.state.borrow_mut();
        for slot in state.slots.values_mut() {
            if let Some(mut descriptor) = slot.descriptor.take() {
                descriptor.close();
            }
        }
        state.slots.retain(|_, slot| slot.holds > 0);
    }

    fn release(&self, key: &Path) {
        let mut state = self.state.borrow_mut();
        let policy = state.policy;
        let Some(slot) = state.slots.get_mut(key) else {
            return;
        };
        slot.holds = slot.holds.saturating_sub(1);
        if slot.holds > 0 || policy == DescriptorPolicy::Retain {
            return;
        }
        if let Some(mut descriptor) = slot.descriptor.take() {
            debug!("Closing retained descriptor for {}", key.display());
            descriptor.close();
        }
        state.slots.remove(key);
    }
}

impl fmt::Debug for DescriptorPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("DescriptorPool")
            .field("policy", &state.policy)
            .field("slots", &state.slots.len())
            .field("opened", &state.opened)
            .finish()
    }
}

/// Keeps one archive's descriptor open while alive
#[must_use = "the descriptor is released as soon as the guard is dropped"]
pub struct RetainGuard {
    pool: DescriptorPool,
    key: PathBuf,
}

impl Drop for RetainGuard {
    fn drop(&mut self) {
        self.pool.release(&self.key);
    }
}
