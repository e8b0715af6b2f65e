use anyhow::{Context, Result};
use caliper_core::Metric;
use caliper_etl::{config, Config, ProviderKind};
use caliper_search::StorageMode;
use std::path::Path;
use toml_edit::{value, DocumentMut};

/// Keys accepted by `caliper config set`.
const KEYS: [&str; 12] = [
    "data_path",
    "loader.delimiter",
    "index.mode",
    "index.path",
    "index.metric",
    "embedding.provider",
    "embedding.model",
    "embedding.dimension",
    "embedding.cache_dir",
    "embedding.load_timeout_secs",
    "embedding.load_retries",
    "query.top_k",
];

/// Show the current effective configuration.
pub fn show_config() -> Result<()> {
    let config = Config::load()?;

    println!("Current Configuration");
    println!("=====================\n");

    let config_path = config::config_file_path();
    println!("Config file: {}", config_path.display());
    let exists = config_path.exists();
    println!(
        "File exists: {}\n",
        if exists { "yes" } else { "no (using defaults)" }
    );

    println!("Settings:");
    print!("{}", config.to_toml()?);

    println!("\nPriority: CLI args > ENV vars (CALIPER_*) > Config file > Defaults");

    Ok(())
}

/// Set a config value.
pub fn set_config(key: &str, raw: &str) -> Result<()> {
    let config_path = config::config_file_path();
    config::ensure_config_file()?;
    set_config_at(&config_path, key, raw)?;

    println!("✓ Updated {} = {}", key, raw);
    println!("  in {}", config_path.display());

    Ok(())
}

/// Set `key` to `raw` in the config file at `config_path`, keeping comments
/// and layout intact.
pub fn set_config_at(config_path: &Path, key: &str, raw: &str) -> Result<()> {
    let contents = std::fs::read_to_string(config_path).context("Failed to read config file")?;
    let mut doc: DocumentMut = contents
        .parse()
        .with_context(|| format!("Failed to parse {}", config_path.display()))?;

    let item = typed_value(key, raw)?;
    match key.split_once('.') {
        Some((table, field)) => {
            if !doc.contains_table(table) {
                doc[table] = toml_edit::table();
            }
            doc[table][field] = item;
        }
        None => doc[key] = item,
    }

    std::fs::write(config_path, doc.to_string()).context("Failed to write config file")?;
    Ok(())
}

/// Parse `raw` into the TOML value `key` expects, rejecting invalid input
/// before anything is written.
fn typed_value(key: &str, raw: &str) -> Result<toml_edit::Item> {
    let item = match key {
        "data_path" | "index.path" | "embedding.model" | "embedding.cache_dir" => value(raw),
        "loader.delimiter" => {
            let mut chars = raw.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if c.is_ascii() => value(c.to_string()),
                _ => anyhow::bail!("loader.delimiter must be a single ASCII character"),
            }
        }
        "index.mode" => {
            let mode: StorageMode = raw.parse().map_err(anyhow::Error::msg)?;
            value(mode.as_str())
        }
        "index.metric" => {
            let metric: Metric = raw.parse().map_err(anyhow::Error::msg)?;
            value(metric.as_str())
        }
        "embedding.provider" => {
            let provider: ProviderKind = raw.parse().map_err(anyhow::Error::msg)?;
            value(provider.as_str())
        }
        "embedding.dimension"
        | "embedding.load_timeout_secs"
        | "embedding.load_retries"
        | "query.top_k" => {
            let n: i64 = raw
                .parse()
                .ok()
                .filter(|n| *n > 0 || (key == "embedding.load_retries" && *n == 0))
                .with_context(|| format!("{key} must be a positive integer, got '{raw}'"))?;
            value(n)
        }
        _ => anyhow::bail!(
            "Unknown config key: {}\n\nValid keys: {}",
            key,
            KEYS.join(", ")
        ),
    };
    Ok(item)
}

/// Show the config file path.
pub fn show_path() -> Result<()> {
    let config_path = config::config_file_path();
    println!("{}", config_path.display());
    Ok(())
}

/// Show example configuration.
pub fn show_example() -> Result<()> {
    print!("{}", config::example_config());
    Ok(())
}

/// Initialize config file with defaults.
pub fn init_config() -> Result<()> {
    let created = config::ensure_config_file()?;
    let config_path = config::config_file_path();

    if created {
        println!("✓ Created config file: {}", config_path.display());
        println!("\nEdit this file to configure caliper.");
    } else {
        println!("Config file already exists: {}", config_path.display());
    }

    Ok(())
}
