use anyhow::Result;
use caliper_etl::{model_info, Config};

use super::load_provider;

/// Report the configured embedding model without loading it.
pub fn show_model(config: &Config, as_json: bool) -> Result<()> {
    let provider = load_provider(config)?;
    let info = model_info(provider.as_ref());

    if as_json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!("\n🧠 Embedding Model\n");
    println!("  Provider: {}", config.embedding.provider);
    println!("  Model: {}", info.model);
    println!("  Dimension: {}", info.dimension);
    println!("  Status: {}", info.status);

    Ok(())
}
