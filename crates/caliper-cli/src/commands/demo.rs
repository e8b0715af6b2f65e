use anyhow::{Context, Result};
use caliper_etl::{index_snippets, load_snippets, Config};
use caliper_search::{MemoryIndex, QueryService, VectorIndex};

use super::load_provider;
use super::query::preview;

const DEMO_QUERIES: [&str; 4] = [
    "how to fix a leaky faucet",
    "what tools do I need for woodworking",
    "how to paint a room properly",
    "safety equipment for sanding",
];

const DEMO_TOP_K: usize = 2;

/// Load, index, and query the configured CSV on a throwaway in-memory index.
pub fn run_demo(config: &Config) -> Result<()> {
    println!("🔧 Caliper: DIY Assistant Demo");
    println!("{}", "=".repeat(50));
    println!("1. Load DIY data from CSV");
    println!("2. Embed snippets for semantic search");
    println!("3. Build an in-memory vector index");
    println!("4. Query the index for relevant DIY guidance");
    println!("{}", "=".repeat(50));

    println!("\n📁 Step 1: Loading DIY data...");
    let snippets = load_snippets(&config.data_path, &config.loader)
        .with_context(|| format!("Failed to load {}", config.data_path.display()))?;
    let mut categories: Vec<&str> = snippets
        .iter()
        .map(|s| s.metadata.category.as_str())
        .collect();
    categories.sort_unstable();
    categories.dedup();
    println!("  ✓ Loaded {} DIY snippets", snippets.len());
    println!("    Categories: {}", categories.join(", "));

    println!("\n🧠 Step 2: Preparing embedding provider...");
    let provider = load_provider(config)?;
    println!("  ✓ Using {}", provider.identity());

    println!("\n🗄️ Step 3: Building index...");
    let mut index = MemoryIndex::new(config.index.metric);
    let count = index_snippets(provider.as_ref(), &mut index, snippets)?;
    println!("  ✓ Indexed {} snippets ({})", count, index.metric());

    println!("\n🔍 Step 4: Testing semantic search...");
    let service = QueryService::new(provider.as_ref(), &index);
    for query in DEMO_QUERIES {
        println!("\n🔍 Query: '{}'", query);
        let results = service.answer(query, DEMO_TOP_K)?;
        if results.is_empty() {
            println!("  ✗ No results found");
            continue;
        }
        println!("  ✓ Found {} relevant snippets", results.len());
        for (rank, result) in results.iter().enumerate() {
            println!(
                "   {}. {} - {}",
                rank + 1,
                result.metadata.category,
                preview(&result.text, 100)
            );
        }
    }

    println!("\n🎉 Demo Complete!");
    println!("{}", "=".repeat(50));
    println!("To try interactive queries, run:");
    println!("  caliper ingest && caliper repl");

    Ok(())
}
