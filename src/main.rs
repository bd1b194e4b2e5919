//! stickerdex CLI
//!
//! Commands:
//! - `search` - Search a pack list with the directory query language
//! - `parse` / `build` - Translate between query strings and clauses
//! - `keys` - List the attributes usable in queries

mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use stickerdex::config::{load_settings, Settings};
use stickerdex::search::{AttributeQuery, ParsedQuery, QueryParser};
use stickerdex::stickers::{build_engine, default_keys, load_packs};
use stickerdex::{AttributeKeys, SearchError};
use tracing::{debug, info};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity flags
    let log_level = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_writer(std::io::stderr) // Log to stderr to keep stdout clean
        .init();

    let result = load_settings(cli.config.as_deref()).and_then(|settings| match cli.command {
        Some(Commands::Search(args)) => execute_search_cli(args, settings),
        Some(Commands::Parse(args)) => execute_parse_cli(args, &settings),
        Some(Commands::Build(args)) => execute_build_cli(args, &settings),
        Some(Commands::Keys) => execute_keys_cli(&settings),
        None => {
            eprintln!("Error: No command specified. Use --help for usage information.");
            std::process::exit(2);
        }
    });

    // Handle result and exit with appropriate code
    match result {
        Ok(output) => {
            println!("{}", output);
            Ok(())
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(get_exit_code(&e));
        }
    }
}

fn keys_of(settings: &Settings) -> AttributeKeys {
    settings.keys.clone().unwrap_or_else(default_keys)
}

/// Execute search command
fn execute_search_cli(args: cli::SearchArgs, mut settings: Settings) -> Result<String> {
    if let Some(max_score) = args.max_score {
        settings.engine.max_score = max_score;
    }

    let packs = load_packs(&args.packs)?;
    let engine = build_engine(packs, &settings)?;

    let results = engine.search(&args.query);
    info!("{} packs matched {:?}", results.len(), args.query);
    let limit = args.limit.unwrap_or(results.len());
    let results = &results[..limit.min(results.len())];

    if args.json {
        return Ok(serde_json::to_string_pretty(results)?);
    }

    if results.is_empty() {
        return Ok(format!("No sticker packs match \"{}\".", args.query));
    }

    let mut output = format!("# Sticker packs matching \"{}\"\n\n", args.query);
    for result in results {
        output.push_str(&result.item.to_markdown(result.score));
        output.push('\n');
    }
    Ok(output.trim_end().to_string())
}

/// Execute parse command
fn execute_parse_cli(args: cli::ParseArgs, settings: &Settings) -> Result<String> {
    let keys = keys_of(settings);
    let parsed = QueryParser::new(&keys).parse(&args.query);
    debug!(
        "Parsed {} clauses, free text {:?}",
        parsed.attribute_queries.len(),
        parsed.query
    );
    Ok(serde_json::to_string_pretty(&parsed)?)
}

/// Execute build command
fn execute_build_cli(args: cli::BuildArgs, settings: &Settings) -> Result<String> {
    let keys = keys_of(settings);
    let parsed = ParsedQuery {
        query: args.query,
        attribute_queries: args
            .attrs
            .into_iter()
            .map(|(name, value)| AttributeQuery::new(name, value))
            .collect(),
    };
    Ok(QueryParser::new(&keys).build(&parsed)?)
}

/// Execute keys command
fn execute_keys_cli(settings: &Settings) -> Result<String> {
    let keys = keys_of(settings);
    let mut output = format!("Query attributes ({}):\n", keys.len());
    for (name, path) in keys.iter() {
        output.push_str(&format!("  • {} → {}\n", name, path));
    }
    Ok(output.trim_end().to_string())
}

/// Map errors to exit codes: 2 for usage mistakes, 1 for everything else
fn get_exit_code(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<SearchError>() {
        Some(SearchError::UnknownAttribute(_)) => 2,
        _ => 1,
    }
}
