use caliper_core::Metric;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Where index entries live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StorageMode {
    /// Entries live only for the lifetime of the process.
    InMemory,
    /// Entries are stored in a SQLite file and survive restarts.
    #[default]
    OnDisk,
}

impl StorageMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InMemory => "in-memory",
            Self::OnDisk => "on-disk",
        }
    }
}

impl fmt::Display for StorageMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StorageMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "in-memory" | "memory" => Ok(Self::InMemory),
            "on-disk" | "disk" => Ok(Self::OnDisk),
            other => Err(format!(
                "unknown storage mode '{other}' (expected 'in-memory' or 'on-disk')"
            )),
        }
    }
}

/// Vector index settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Storage mode.
    ///
    /// Can be set via:
    /// - CLI: --in-memory
    /// - Config: [index] mode = "in-memory" | "on-disk"
    /// - Default: on-disk
    #[serde(default)]
    pub mode: StorageMode,

    /// Path of the SQLite file used in on-disk mode.
    ///
    /// Can be set via:
    /// - CLI: --index /path/to/index.db
    /// - Config: [index] path = "/path/to/index.db"
    /// - Default: ~/.local/share/caliper/index.db
    #[serde(default = "default_index_path")]
    pub path: PathBuf,

    /// Distance metric, fixed for the lifetime of an index.
    #[serde(default)]
    pub metric: Metric,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            mode: StorageMode::default(),
            path: default_index_path(),
            metric: Metric::default(),
        }
    }
}

impl IndexConfig {
    /// An in-memory configuration with the given metric.
    #[must_use]
    pub fn in_memory(metric: Metric) -> Self {
        Self {
            mode: StorageMode::InMemory,
            metric,
            ..Self::default()
        }
    }

    /// An on-disk configuration at `path` with the given metric.
    #[must_use]
    pub fn on_disk(path: impl Into<PathBuf>, metric: Metric) -> Self {
        Self {
            mode: StorageMode::OnDisk,
            path: path.into(),
            metric,
        }
    }
}

/// Get the default index path.
///
/// Returns: ~/.local/share/caliper/index.db (or platform equivalent)
pub fn default_index_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("caliper")
        .join("index.db")
}
