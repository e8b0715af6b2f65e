use anyhow::{Context, Result};
use caliper_etl::Config;
use caliper_search::QueryService;
use std::io::{self, BufRead, Write};

use super::query::display_results;
use super::{load_provider, prepare_index};

const EXIT_WORDS: [&str; 3] = ["quit", "exit", "q"];

pub fn run_repl(config: &Config, top_k: usize) -> Result<()> {
    let provider = load_provider(config)?;
    let index = prepare_index(config, provider.as_ref())?;
    let service = QueryService::new(provider.as_ref(), index.as_ref());

    println!("🔧 Caliper DIY Assistant - Interactive Query");
    println!("Type your DIY question (or 'quit' to exit)");
    println!("{}", "-".repeat(50));
    if index.is_empty() {
        println!("⚠ The index is empty. Run `caliper ingest` first.");
    }

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("\n❓ Your question: ");
        io::stdout().flush().context("Failed to flush stdout")?;

        let Some(line) = lines.next() else {
            println!();
            break;
        };
        let query = line.context("Failed to read input")?;
        let query = query.trim();

        if EXIT_WORDS.contains(&query.to_lowercase().as_str()) {
            println!("👋 Goodbye!");
            break;
        }
        if query.is_empty() {
            println!("Please enter a question.");
            continue;
        }

        match service.answer(query, top_k) {
            Ok(results) => display_results(query, &results, service.metric()),
            Err(e) => {
                log::warn!("Query '{}' failed: {}", query, e);
                eprintln!("  ✗ {e}");
            }
        }
    }

    Ok(())
}
