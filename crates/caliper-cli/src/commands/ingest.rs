use anyhow::{Context, Result};
use caliper_etl::Config;
use caliper_search::{open_index, StorageMode};

use super::load_provider;

pub fn run_ingest(config: &Config) -> Result<()> {
    println!("\n📁 Ingesting {}", config.data_path.display());

    let provider = load_provider(config)?;
    let mut index = open_index(&config.index).context("Failed to open index")?;

    let report = caliper_etl::run_ingest(
        &config.data_path,
        &config.loader,
        provider.as_ref(),
        index.as_mut(),
    )?;

    println!("  ✓ Loaded {} snippets", report.loaded);
    println!("  ✓ Embedded with {}", report.identity);
    println!("  ✓ Indexed {} snippets ({} total)", report.indexed, index.len());
    println!("  Categories: {}", report.categories.join(", "));

    match config.index.mode {
        StorageMode::OnDisk => {
            println!("\n✓ Index saved to {}", config.index.path.display());
        }
        StorageMode::InMemory => {
            println!("\n⚠ In-memory index: entries are discarded when this process exits");
        }
    }

    Ok(())
}
