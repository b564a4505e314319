//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

/// mt - local maintenance action scheduler
#[derive(Parser, Debug)]
#[command(name = "mt")]
#[command(author, version, about = "Local maintenance action scheduler", long_about = None)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Execute one action inline and print its final record
    Exec {
        /// Description fields as key=value (must include name=TYPE)
        #[arg(required = true, value_parser = parse_field)]
        fields: Vec<(String, String)>,

        /// Action properties as a JSON document
        #[arg(short, long)]
        properties: Option<String>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Queue every action of a plan file and run them on the worker pool
    Run {
        /// YAML plan file
        #[arg(required = true)]
        plan: PathBuf,

        /// Worker threads (default from config)
        #[arg(short, long)]
        threads: Option<usize>,

        /// Give up waiting for the pool after this many seconds
        #[arg(long, default_value = "3600")]
        timeout_secs: u64,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// List registered action types
    Types,

    /// Print the effective configuration
    Config,
}

/// Parse a `key=value` description field
pub fn parse_field(s: &str) -> Result<(String, String), String> {
    debug!(%s, "parse_field: called");
    match s.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.trim().to_string(), value.to_string())),
        _ => Err(format!("Expected key=value, got: {}", s)),
    }
}

/// Output format for records and snapshots
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Yaml,
    Table,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        debug!(%s, "OutputFormat::from_str: called");
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            "table" => Ok(Self::Table),
            _ => {
                debug!(%s, "OutputFormat::from_str: unknown format");
                Err(format!("Unknown format: {}. Use: text, json, yaml, or table", s))
            }
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
            Self::Yaml => write!(f, "yaml"),
            Self::Table => write!(f, "table"),
        }
    }
}
