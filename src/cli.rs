//! Command-line interface definition.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use serde_json::Value;

/// Create Python files from named templates.
#[derive(Debug, Parser)]
#[command(name = "pynew", version, about)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Template directory (overrides PYNEW_TEMPLATES_DIR)
    #[arg(long, global = true, value_name = "DIR")]
    pub templates_dir: Option<PathBuf>,

    /// Cache document (overrides PYNEW_CACHE_FILE)
    #[arg(long, global = true, value_name = "FILE")]
    pub cache_file: Option<PathBuf>,

    /// Settings document (overrides PYNEW_SETTINGS_FILE)
    #[arg(long, global = true, value_name = "FILE")]
    pub settings_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Render a template into a new Python file
    New(NewArgs),

    /// Manage templates
    Template {
        #[command(subcommand)]
        command: TemplateCommand,
    },

    /// Inspect and edit the cache
    Cache {
        #[command(subcommand)]
        command: CacheCommand,
    },

    /// Inspect and edit settings
    Settings {
        #[command(subcommand)]
        command: SettingsCommand,
    },
}

#[derive(Debug, Args)]
pub struct NewArgs {
    /// Template name; defaults to the template used last
    pub template: Option<String>,

    /// Target directory
    #[arg(short, long, default_value = ".")]
    pub dir: PathBuf,

    /// File name; a numbered name is chosen when omitted
    #[arg(short, long)]
    pub name: Option<String>,

    #[command(flatten)]
    pub vars: VarArgs,

    /// Replace an existing file
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Debug, Args)]
pub struct VarArgs {
    /// Render variable, repeatable
    #[arg(long = "var", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub vars: Vec<(String, String)>,

    /// Fill declared variables with sample values before applying --var
    #[arg(long)]
    pub auto_fill: bool,
}

/// Template content source; stdin when neither is given.
#[derive(Debug, Args)]
pub struct ContentArgs {
    /// Read content from a file
    #[arg(long, value_name = "PATH", conflicts_with = "content")]
    pub file: Option<PathBuf>,

    /// Content given inline
    #[arg(long)]
    pub content: Option<String>,
}

#[derive(Debug, Args)]
pub struct MetadataArgs {
    /// Template description
    #[arg(long)]
    pub description: Option<String>,

    /// Declared variables, comma separated; inferred from placeholders when omitted
    #[arg(long = "vars", value_delimiter = ',')]
    pub variables: Vec<String>,
}

#[derive(Debug, Subcommand)]
pub enum TemplateCommand {
    /// List template names
    List,

    /// Print template content
    Show {
        name: String,
        /// Print the metadata record instead
        #[arg(long)]
        metadata: bool,
    },

    /// Render a template to stdout
    Render {
        name: String,
        #[command(flatten)]
        vars: VarArgs,
    },

    /// Create a new template
    Create {
        /// Template name; a random name is chosen when omitted
        name: Option<String>,
        #[command(flatten)]
        source: ContentArgs,
        #[command(flatten)]
        metadata: MetadataArgs,
    },

    /// Write a template, replacing existing content
    Save {
        name: String,
        #[command(flatten)]
        source: ContentArgs,
        #[command(flatten)]
        metadata: MetadataArgs,
        /// Fail instead of replacing an existing template
        #[arg(long)]
        no_overwrite: bool,
    },

    /// Delete a template
    Delete { name: String },

    /// Rename a template
    Rename { old: String, new: String },

    /// List the placeholders a template uses
    Placeholders { name: String },
}

#[derive(Debug, Subcommand)]
pub enum CacheCommand {
    /// Print a value as JSON
    Get { key: String },

    /// Store a value; parsed as JSON when possible, else stored as a string
    Set {
        key: String,
        value: String,
        /// Time to live in seconds
        #[arg(long, value_parser = parse_ttl)]
        ttl: Option<Duration>,
    },

    /// Remove a key
    Delete { key: String },

    /// List live keys
    Keys,

    /// Count live entries
    Size,

    /// Remove every entry
    Clear,

    /// Drop expired entries and persist the result
    Prune,

    /// Seconds until a key expires
    Ttl { key: String },

    /// Print entry counts and what loading the document pruned
    Stats,
}

#[derive(Debug, Subcommand)]
pub enum SettingsCommand {
    /// Print the whole settings document
    List,

    /// Print one setting
    Get { key: String },

    /// Store a setting; parsed as JSON when possible, else stored as a string
    Set { key: String, value: String },

    /// Remove a setting
    Delete { key: String },
}

// == Value Parsers ==
/// Splits `KEY=VALUE` at the first `=`.
pub fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got {:?}", raw)),
    }
}

/// Non-negative seconds, fractions allowed.
pub fn parse_ttl(raw: &str) -> Result<Duration, String> {
    let seconds: f64 = raw
        .parse()
        .map_err(|_| format!("invalid number of seconds: {:?}", raw))?;
    Duration::try_from_secs_f64(seconds).map_err(|e| e.to_string())
}

/// JSON when `raw` parses as JSON, else a plain string.
pub fn parse_json_or_string(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}
