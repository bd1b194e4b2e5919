//! Command-line interface for the sticker pack directory search

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use stickerdex::config::CONFIG_ENV;

/// stickerdex CLI
#[derive(Parser, Debug)]
#[command(name = "stickerdex")]
#[command(about = "Search a community sticker pack directory", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Settings file with attribute keys and engine tuning (JSON)
    #[arg(short, long, global = true, env = CONFIG_ENV)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-error output (no short flag to avoid conflicts)
    #[arg(long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search sticker packs with free text and attribute:value clauses
    Search(SearchArgs),
    /// Show how a query string is split into free text and clauses
    Parse(ParseArgs),
    /// Render a query string from free text and clauses
    Build(BuildArgs),
    /// List the attributes usable in queries
    Keys,
}

/// Search command arguments
#[derive(Parser, Debug, Clone)]
pub struct SearchArgs {
    /// JSON array of sticker pack directory entries
    #[arg(short, long)]
    pub packs: PathBuf,

    /// Query, e.g. `cats tag:cute author:"Jane Doe"`
    pub query: String,

    /// Maximum number of results
    #[arg(short = 'l', long)]
    pub limit: Option<usize>,

    /// Override the configured maximum score (0 = exact only, 1 = anything)
    #[arg(long, value_parser = parse_max_score)]
    pub max_score: Option<f64>,

    /// Print results as JSON instead of markdown
    #[arg(long)]
    pub json: bool,
}

/// Parse command arguments
#[derive(Parser, Debug, Clone)]
pub struct ParseArgs {
    pub query: String,
}

/// Build command arguments
#[derive(Parser, Debug, Clone)]
pub struct BuildArgs {
    /// Free text placed before the clauses
    #[arg(short, long, default_value = "")]
    pub query: String,

    /// Attribute clause as name=value; repeatable
    #[arg(short, long = "attr", value_parser = parse_clause)]
    pub attrs: Vec<(String, String)>,
}

fn parse_max_score(raw: &str) -> Result<f64, String> {
    let score: f64 = raw
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a number", raw))?;
    if !(0.0..=1.0).contains(&score) {
        return Err(format!("max score must be between 0 and 1, got '{}'", raw));
    }
    Ok(score)
}

fn parse_clause(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected name=value, got '{}'", raw)),
    }
}
