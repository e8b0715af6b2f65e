use anyhow::{Context, Result};
use caliper_etl::Config;
use caliper_search::{open_index_for_query, StorageMode};
use serde_json::json;

pub fn show_status(config: &Config, as_json: bool) -> Result<()> {
    let index = open_index_for_query(&config.index).context("Failed to open index")?;
    let identity = index.identity();
    let categories = index.categories();
    let exists = config.index.mode == StorageMode::OnDisk && config.index.path.exists();

    if as_json {
        let status = json!({
            "mode": config.index.mode.as_str(),
            "path": config.index.path,
            "exists": exists,
            "entries": index.len(),
            "metric": index.metric().as_str(),
            "model": identity.map(|i| i.model.as_str()),
            "dimension": identity.map(|i| i.dimension),
            "categories": categories,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!("\n📊 Caliper Status\n");
    println!("  Storage: {}", config.index.mode);
    if config.index.mode == StorageMode::OnDisk {
        println!(
            "  Index: {}{}",
            config.index.path.display(),
            if exists { "" } else { " (not created yet)" }
        );
    }
    println!("  Entries: {}", index.len());
    println!("  Metric: {}", index.metric());
    match identity {
        Some(identity) => println!("  Embedding model: {}", identity),
        None => println!("  Embedding model: <none>"),
    }
    if !categories.is_empty() {
        println!("  Categories: {}", categories.join(", "));
    }

    if index.is_empty() {
        println!("\n  Run `caliper ingest` to build the index");
    }

    Ok(())
}
