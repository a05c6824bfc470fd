//! Network Monitor Filter CLI
//!
//! Runs the filter box language over request dumps (JSON array or JSON Lines).

mod requests;

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Parser, Subcommand};

use nf_core::Matcher;
use nf_query::{autocomplete, parse_filters};

#[derive(Parser)]
#[command(name = "nf-cli")]
#[command(about = "Network monitor filter query tools")]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a filter query and print it as JSON
    Parse {
        /// Filter query, e.g. "method:get -is:cached app.js"
        query: String,

        /// Pretty-print the JSON
        #[arg(long)]
        pretty: bool,
    },

    /// Print the requests matching a filter query
    Filter {
        /// Request dump (JSON array or JSON Lines)
        #[arg(short, long)]
        input: PathBuf,

        /// Filter query
        #[arg(short, long, default_value = "")]
        query: String,

        /// Filter prefs snapshot, e.g. {"requestTypes": ["js"]}
        #[arg(short, long)]
        prefs: Option<PathBuf>,

        /// Print only the URL of each match
        #[arg(long)]
        urls_only: bool,
    },

    /// Suggest completions for the last token of a filter string
    Suggest {
        /// Filter string as typed so far
        filter: String,

        /// Request dump used for value completion
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    let result = match cli.command {
        Commands::Parse { query, pretty } => cmd_parse(&query, pretty),
        Commands::Filter {
            input,
            query,
            prefs,
            urls_only,
        } => cmd_filter(&input, &query, prefs.as_deref(), urls_only),
        Commands::Suggest { filter, input } => cmd_suggest(&filter, input.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn cmd_parse(query: &str, pretty: bool) -> Result<(), String> {
    let parsed = parse_filters(query);
    let json = if pretty {
        serde_json::to_string_pretty(&parsed)
    } else {
        serde_json::to_string(&parsed)
    }
    .map_err(|e| format!("Failed to serialize JSON: {}", e))?;

    println!("{}", json);
    Ok(())
}

fn cmd_filter(
    input: &Path,
    query: &str,
    prefs: Option<&Path>,
    urls_only: bool,
) -> Result<(), String> {
    let records = requests::read_records(input)?;
    let prefs = requests::read_prefs(prefs)?;

    let start = Instant::now();
    let parsed = parse_filters(query);
    let matcher = Matcher::new(&parsed).with_prefs(&prefs);
    let matched = matcher.filter(&records);
    let elapsed = start.elapsed();

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for record in &matched {
        let line = if urls_only {
            record.url.clone()
        } else {
            serde_json::to_string(record).map_err(|e| format!("Failed to serialize JSON: {}", e))?
        };
        writeln!(out, "{}", line).map_err(|e| format!("Failed to write output: {}", e))?;
    }

    log::info!("query parsed into {} text term(s), {} flag(s)", parsed.text.len(), parsed.flags.len());
    eprintln!(
        "Matched {} of {} requests in {:.2}ms (types: {})",
        matched.len(),
        records.len(),
        elapsed.as_secs_f64() * 1000.0,
        prefs.request_types.names().join(",")
    );

    Ok(())
}

fn cmd_suggest(filter: &str, input: Option<&Path>) -> Result<(), String> {
    let records = match input {
        Some(path) => requests::read_records(path)?,
        None => Vec::new(),
    };

    for suggestion in autocomplete(filter, &records) {
        println!("{}\t{}", suggestion.display_value, suggestion.value);
    }

    Ok(())
}
