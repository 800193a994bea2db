//! Configuration schema for Trellis
//!
//! Configuration is stored at `~/.config/trellis/config.toml`, optionally
//! overridden by a project-local `.trellis.toml`.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Fragment cache settings
    pub cache: CacheConfig,

    /// Form builder settings
    pub forms: FormsConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
        }
    }
}

/// Fragment store backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    Memory,
    File,
    Null,
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Memory => "memory",
            Self::File => "file",
            Self::Null => "null",
        };
        write!(f, "{}", name)
    }
}

/// Fragment cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Enable fragment caching (default: true)
    pub enabled: bool,

    /// Backend used for fragments
    pub store: StoreKind,

    /// Directory for the file store (default: `<cache dir>/trellis/fragments`)
    pub dir: Option<PathBuf>,

    /// Prefix for every storage key
    pub namespace: String,

    /// Expire file store entries after N seconds (0 = never)
    pub expires_in_secs: u64,
}

impl CacheConfig {
    /// Directory the file store writes to
    pub fn fragments_dir(&self) -> PathBuf {
        self.dir.clone().unwrap_or_else(|| {
            dirs::cache_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("trellis")
                .join("fragments")
        })
    }

    /// Entry lifetime, if entries expire
    pub fn ttl(&self) -> Option<Duration> {
        if self.expires_in_secs == 0 {
            return None;
        }
        i64::try_from(self.expires_in_secs)
            .ok()
            .and_then(Duration::try_seconds)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            store: StoreKind::Memory,
            dir: None,
            namespace: "views".to_string(),
            expires_in_secs: 0,
        }
    }
}

/// Form builder configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FormsConfig {
    /// Registered name of the builder the form proxy wraps by default
    pub default_builder: String,
}

impl Default for FormsConfig {
    fn default() -> Self {
        Self {
            default_builder: "standard".to_string(),
        }
    }
}
