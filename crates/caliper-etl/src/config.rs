use anyhow::{Context, Result};
use caliper_search::{IndexConfig, StorageMode};
use confyg::{env, Confygery};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::embedding::EmbeddingConfig;
use crate::loader::LoaderConfig;

/// Configuration for caliper.
///
/// Configuration is loaded from multiple sources with the following priority:
/// 1. CLI arguments (highest priority)
/// 2. Environment variables (CALIPER_* prefix)
/// 3. Config file (~/.config/caliper/config.toml)
/// 4. Built-in defaults (lowest priority)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the snippet CSV file.
    ///
    /// Can be set via:
    /// - CLI: --csv /path/to/snippets.csv
    /// - ENV: CALIPER_DATA_PATH
    /// - Config: data_path = "/path/to/snippets.csv"
    /// - Default: data/diy_snippets.csv
    #[serde(default = "default_data_path")]
    pub data_path: PathBuf,

    #[serde(default)]
    pub loader: LoaderConfig,

    /// Vector index storage.
    ///
    /// Can be set via:
    /// - CLI: --index /path/to/index.db, --in-memory
    /// - ENV: CALIPER_INDEX_MODE, CALIPER_INDEX_PATH, CALIPER_INDEX_METRIC
    /// - Config: [index] mode / path / metric
    #[serde(default)]
    pub index: IndexConfig,

    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(default)]
    pub query: QueryConfig,
}

/// The `[query]` configuration section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Number of results returned when the CLI is not given `-k`.
    #[serde(default = "default_top_k", deserialize_with = "number_or_string")]
    pub top_k: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_path: default_data_path(),
            loader: LoaderConfig::default(),
            index: IndexConfig::default(),
            embedding: EmbeddingConfig::default(),
            query: QueryConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file and environment variables.
    ///
    /// Searches for config file at: ~/.config/caliper/config.toml
    /// Reads environment variables with CALIPER_ prefix.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed.
    pub fn load() -> Result<Self> {
        Self::load_from(&config_file_path())
    }

    /// Load configuration using the given file instead of the default
    /// location. A missing file is not an error.
    pub fn load_from(config_path: &Path) -> Result<Self> {
        let mut builder = Confygery::new().context("Failed to create config builder")?;

        if config_path.exists() {
            let path_str = config_path
                .to_str()
                .ok_or_else(|| anyhow::anyhow!("Config path contains invalid UTF-8"))?;
            builder
                .add_file(path_str)
                .context("Failed to load config file")?;
        }

        let mut env_opts = env::Options::with_top_level("caliper");
        for section in ENV_SECTIONS {
            env_opts.add_section(section);
        }
        builder
            .add_env(env_opts)
            .context("Failed to load environment variables")?;

        let config: Self = builder.build().context("Failed to build configuration")?;
        log::debug!("Loaded configuration: {:?}", config);
        Ok(config)
    }

    /// Load configuration, then apply CLI flag overrides.
    pub fn load_with_overrides(
        csv: Option<PathBuf>,
        index: Option<PathBuf>,
        in_memory: bool,
    ) -> Result<Self> {
        let mut config = Self::load()?;
        config.apply_overrides(csv, index, in_memory);
        Ok(config)
    }

    /// Apply CLI flag overrides. `--index` implies on-disk storage unless
    /// `--in-memory` is also given.
    pub fn apply_overrides(&mut self, csv: Option<PathBuf>, index: Option<PathBuf>, in_memory: bool) {
        if let Some(csv) = csv {
            self.data_path = csv;
        }
        if let Some(path) = index {
            self.index.path = path;
            self.index.mode = StorageMode::OnDisk;
        }
        if in_memory {
            self.index.mode = StorageMode::InMemory;
        }
    }

    /// Render the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }
}

/// Config tables that `CALIPER_<SECTION>_<KEY>` variables map into.
const ENV_SECTIONS: [&str; 4] = ["loader", "index", "embedding", "query"];

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString<T> {
    Number(T),
    Text(String),
}

/// Accept a number either as a TOML integer or as a string, since every
/// value read from the environment arrives as a string.
pub(crate) fn number_or_string<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + FromStr,
    T::Err: Display,
{
    use serde::de::Error;

    match NumberOrString::<T>::deserialize(deserializer)? {
        NumberOrString::Number(n) => Ok(n),
        NumberOrString::Text(s) => s
            .trim()
            .parse()
            .map_err(|e| Error::custom(format!("invalid number '{s}': {e}"))),
    }
}

fn default_data_path() -> PathBuf {
    PathBuf::from("data").join("diy_snippets.csv")
}

fn default_top_k() -> usize {
    3
}

/// Get the config file path.
///
/// Returns:
/// - Linux: ~/.config/caliper/config.toml
/// - macOS: ~/Library/Application Support/caliper/config.toml
/// - Windows: %APPDATA%\caliper\config.toml
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("caliper")
        .join("config.toml")
}

/// Get the example config file content.
pub fn example_config() -> &'static str {
    r#"# Caliper Configuration File
#
# Configuration is loaded from multiple sources with the following priority:
# 1. CLI arguments (highest priority)
# 2. Environment variables (CALIPER_* prefix)
# 3. This config file
# 4. Built-in defaults (lowest priority)

# Path to the DIY snippet CSV file
#
# Required columns: id, category, snippet_text, tools_required, ppe_required
#
# Can also be set via:
# - CLI: caliper --csv /custom/snippets.csv ingest
# - Environment: CALIPER_DATA_PATH=/custom/snippets.csv
data_path = "data/diy_snippets.csv"

[loader]
# Field delimiter (a single ASCII character)
delimiter = ","

[index]
# Where vectors live: "on-disk" (SQLite file) or "in-memory" (rebuilt each run)
mode = "on-disk"

# Distance metric: "cosine" or "euclidean"
# Fixed when the index is created; reopening with another metric fails.
metric = "cosine"

# Path to the on-disk index
#
# Can also be set via:
# - CLI: caliper --index /custom/index.db ingest
# - Environment: CALIPER_INDEX_PATH=/custom/index.db
#
# Default: Platform-specific data directory
#path = "/path/to/custom/index.db"

[embedding]
# Embedding provider: "hashing" (built in, no downloads) or "fastembed"
# (local ONNX model, requires the `fastembed` build feature)
provider = "hashing"

# fastembed model: all-MiniLM-L6-v2, bge-small-en-v1.5, bge-base-en-v1.5
model = "all-MiniLM-L6-v2"

# Vector length for the hashing provider
dimension = 384

# Seconds allowed for a single model load, and retries after a failed load
load_timeout_secs = 120
load_retries = 2

# Model download cache
#cache_dir = "/path/to/model/cache"

[query]
# Results returned per query when -k is not given
top_k = 3
"#
}

/// Create default config file if it doesn't exist.
///
/// Returns true if a new file was created, false if it already existed.
pub fn ensure_config_file() -> Result<bool> {
    ensure_config_file_at(&config_file_path())
}

/// Create a default config file at `config_path` if it doesn't exist.
pub fn ensure_config_file_at(config_path: &Path) -> Result<bool> {
    if config_path.exists() {
        return Ok(false);
    }

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create config directory")?;
    }

    std::fs::write(config_path, example_config()).context("Failed to write config file")?;

    Ok(true)
}
