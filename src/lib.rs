//! archive-path: path-like access to files inside archives
//!
//! This library lets callers address, list, glob and read members of zip,
//! wheel and tar-family archives with the same navigation used for ordinary
//! filesystem paths, without extracting the whole archive first:
//! - One [`ArchivePath`] value per "archive + member" location
//! - Lazy listing with directories synthesized from member names
//! - Shell-style globbing with segment-scoped `*`
//! - Reads served from an on-disk extraction cache when possible
//!
//! Supported suffixes: `.zip`, `.whl`, `.tar`, `.tgz`, `.tar.gz`, `.tar.bz2`,
//! `.tar.xz`.
//!
//! # Example
//!
//! ```no_run
//! use archive_path::ArchivePath;
//!
//! let wheel = ArchivePath::new("dist/dephell-0.2.0-py3-none-any.whl", "/tmp/wheel-cache");
//!
//! for init in wheel.glob("*/__init__.py")? {
//!     let init = init?;
//!     println!("{}: {} bytes", init, init.read_bytes()?.len());
//! }
//! # Ok::<(), archive_path::ArchiveError>(())
//! ```

// Core modules
pub mod archive;
pub mod config;
pub mod descriptor_pool;
pub mod error;
pub mod listing;
pub mod path;
pub mod pattern;
pub mod reader;
pub mod stream;

// Re-export commonly used types
pub use archive::{ArchiveFormat, Descriptor, Member, MemberKind, EXTRACTORS};
pub use config::ArchiveConfig;
pub use descriptor_pool::{DescriptorPolicy, DescriptorPool, RetainGuard};
pub use error::{ArchiveError, Result};
pub use listing::{IterDir, MemberWalk};
pub use path::{ArchivePath, Parent};
pub use pattern::{Glob, PatternMatcher};
pub use reader::{MemberReader, OpenMode};
pub use stream::ArchiveStream;
