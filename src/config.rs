//! Configuration for archive roots
//!
//! ```toml
//! cache_dir = "/var/cache/pkg-archives"
//! encoding = "utf-8"
//! descriptor_policy = "retain"
//! ```

use crate::descriptor_pool::DescriptorPolicy;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Settings shared by every root built with
/// [`ArchivePath::from_config`](crate::ArchivePath::from_config)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveConfig {
    /// Extraction cache root
    pub cache_dir: PathBuf,

    /// Default text encoding label; UTF-8 when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,

    #[serde(default)]
    pub descriptor_policy: DescriptorPolicy,
}

impl ArchiveConfig {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            encoding: None,
            descriptor_policy: DescriptorPolicy::default(),
        }
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Load a TOML configuration file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}
