use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use caliper_etl::Config;

mod commands;

#[derive(Debug, Parser)]
#[command(name = "caliper", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the snippet CSV file (default: data/diy_snippets.csv)
    #[arg(long, global = true)]
    csv: Option<PathBuf>,

    /// Path to the on-disk index (default: ~/.local/share/caliper/index.db)
    #[arg(long, global = true)]
    index: Option<PathBuf>,

    /// Keep the index in memory for this run instead of on disk
    #[arg(long, global = true)]
    in_memory: bool,

    /// Log progress to stderr (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Debug, clap::Subcommand)]
enum Commands {
    /// Load the snippet CSV, embed every snippet, and store it in the index
    ///
    /// Reads the configured CSV file (columns: id, category, snippet_text,
    /// tools_required, ppe_required), embeds each snippet's text with the
    /// configured provider, and upserts the vectors into the index.
    ///
    /// The load is all-or-nothing: a missing column, an empty id, or a
    /// duplicate id aborts the run before anything is written. Re-ingesting
    /// replaces entries with the same id.
    ///
    /// The index remembers which embedding model built it. Ingesting with a
    /// different model or dimension into an existing index is rejected.
    Ingest,
    /// Ask a one-shot question
    ///
    /// In in-memory mode the CSV is ingested first in the same process.
    Query {
        /// The question, as one or more words
        #[arg(required = true)]
        words: Vec<String>,

        /// Number of results to return
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
    },
    /// Ask questions interactively (type 'quit' to leave)
    Repl {
        /// Number of results per question
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
    },
    /// Run the end-to-end demo on an in-memory index
    Demo,
    /// Show index status
    Status {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show embedding model information
    Model {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Debug, clap::Subcommand)]
enum ConfigCommand {
    /// Show the effective configuration
    Show,
    /// Print the config file path
    Path,
    /// Print an example config file
    Example,
    /// Create the config file with defaults if it does not exist
    Init,
    /// Set a value in the config file (e.g. `index.metric euclidean`)
    Set {
        /// Dotted key, e.g. `query.top_k`
        key: String,
        /// New value
        value: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Commands::Config { command } = cli.command {
        return match command {
            ConfigCommand::Show => commands::config::show_config(),
            ConfigCommand::Path => commands::config::show_path(),
            ConfigCommand::Example => commands::config::show_example(),
            ConfigCommand::Init => commands::config::init_config(),
            ConfigCommand::Set { key, value } => commands::config::set_config(&key, &value),
        };
    }

    let config = Config::load_with_overrides(cli.csv, cli.index, cli.in_memory)?;

    match cli.command {
        Commands::Ingest => commands::run_ingest(&config),
        Commands::Query { words, top_k } => {
            let top_k = top_k.unwrap_or(config.query.top_k);
            commands::run_query(&config, &words.join(" "), top_k)
        }
        Commands::Repl { top_k } => {
            let top_k = top_k.unwrap_or(config.query.top_k);
            commands::run_repl(&config, top_k)
        }
        Commands::Demo => commands::run_demo(&config),
        Commands::Status { json } => commands::show_status(&config, json),
        Commands::Model { json } => commands::show_model(&config, json),
        Commands::Config { .. } => Ok(()),
    }
}
