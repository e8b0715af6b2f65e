use anyhow::Result;
use caliper_core::{Metric, QueryResult};
use caliper_etl::Config;
use caliper_search::QueryService;

use super::{load_provider, prepare_index};

const PREVIEW_CHARS: usize = 200;

pub fn run_query(config: &Config, query: &str, top_k: usize) -> Result<()> {
    let provider = load_provider(config)?;
    let index = prepare_index(config, provider.as_ref())?;

    if index.is_empty() {
        println!("The index is empty. Run `caliper ingest` first.");
        return Ok(());
    }

    let service = QueryService::new(provider.as_ref(), index.as_ref());
    let results = service.answer(query, top_k)?;
    display_results(query, &results, service.metric());

    Ok(())
}

/// Print ranked results with their metadata and relevance.
pub fn display_results(query: &str, results: &[QueryResult], metric: Metric) {
    println!("\n🔍 Search Results for: '{}'", query);
    println!("{}", "=".repeat(50));

    if results.is_empty() {
        println!("No relevant DIY snippets found.");
        return;
    }

    for (rank, result) in results.iter().enumerate() {
        println!(
            "\n{}. {} - ID: {}",
            rank + 1,
            result.metadata.category,
            result.id
        );
        println!("   Tools: {}", result.metadata.tools_required);
        println!("   PPE: {}", result.metadata.ppe_required);
        println!("   Content: {}", preview(&result.text, PREVIEW_CHARS));
        println!("   Relevance: {:.2}", metric.relevance(result.distance));
    }
}

/// The first `max_chars` characters of `text`, with an ellipsis when cut.
pub fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => format!("{}...", &text[..end]),
        None => text.to_string(),
    }
}
