//! Clap derive structures for the `strata` CLI.
//!
//! Defines the command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// strata -- query and project JSON record sets
#[derive(Debug, Parser)]
#[command(
    name = "strata",
    version,
    about = "Filter, sort, and build trees from JSON records",
    long_about = "Loads a JSON record set from a file or HTTP endpoint into an in-memory\n\
        store, then filters, sorts, or projects it into a parent/child tree.\n\n\
        Sources may be a bare JSON array of objects or a {\"data\": [...]} envelope.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Read records from a JSON file
    #[arg(long, short = 's', env = "STRATA_SOURCE", global = true, conflicts_with = "url")]
    pub source: Option<PathBuf>,

    /// Fetch records from an HTTP endpoint
    #[arg(long, short = 'u', env = "STRATA_URL", global = true)]
    pub url: Option<String>,

    /// API key sent with HTTP requests
    #[arg(long, env = "STRATA_API_KEY", global = true, hide_env = true)]
    pub api_key: Option<String>,

    /// Config file (defaults to the platform config directory)
    #[arg(long, env = "STRATA_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "STRATA_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Accept invalid TLS certificates
    #[arg(long, short = 'k', env = "STRATA_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides config)
    #[arg(long, env = "STRATA_TIMEOUT", global = true)]
    pub timeout: Option<u64>,

    /// Field holding each record's id
    #[arg(long, global = true)]
    pub id_field: Option<String>,

    /// Field holding each record's parent id
    #[arg(long, global = true)]
    pub parent_field: Option<String>,

    /// Field that receives nested children in tree output
    #[arg(long, global = true)]
    pub children_field: Option<String>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List records, optionally filtered and sorted
    #[command(alias = "q", alias = "ls")]
    Query(QueryArgs),

    /// Show a single record by id
    Get(NodeArgs),

    /// Print records as a parent/child tree
    #[command(alias = "t")]
    Tree(TreeArgs),

    /// List top-level records
    Roots(QueryArgs),

    /// List the direct children of a record
    Children(NodeArgs),

    /// List every descendant of a record (pre-order)
    Descendants(NodeArgs),

    /// Show the ancestor chain from the root down to a record
    Path(NodeArgs),

    /// Manage CLI configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Record commands ──────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct QueryArgs {
    /// Filter as property:operator:value (repeatable, combined with AND).
    /// Operators: eq ne gt gte lt lte like in. "property:value" means eq.
    /// Values parse as JSON when possible: 30, true, null, [1,2].
    #[arg(long, short = 'f')]
    pub filter: Vec<String>,

    /// Sort key as property[:asc|desc] (repeatable, first key wins)
    #[arg(long, short = 'S')]
    pub sort: Vec<String>,

    /// Columns to show in table output (comma-separated)
    #[arg(long, short = 'c', value_delimiter = ',')]
    pub columns: Vec<String>,

    /// Show at most this many records
    #[arg(long, short = 'l')]
    pub limit: Option<usize>,

    /// Print only the number of matching records
    #[arg(long)]
    pub count: bool,
}

#[derive(Debug, Args)]
pub struct NodeArgs {
    /// Record id (numbers and strings are both tried)
    pub id: String,

    /// Columns to show in table output (comma-separated)
    #[arg(long, short = 'c', value_delimiter = ',')]
    pub columns: Vec<String>,
}

#[derive(Debug, Args)]
pub struct TreeArgs {
    /// Field used as each node's label in table/plain output
    #[arg(long, short = 'L', default_value = "name")]
    pub label: String,

    /// Filters applied before nesting (same syntax as `query --filter`)
    #[arg(long, short = 'f')]
    pub filter: Vec<String>,

    /// Sort keys applied to siblings (same syntax as `query --sort`)
    #[arg(long, short = 'S')]
    pub sort: Vec<String>,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Display the resolved configuration
    Show,

    /// Print the config file path
    Path,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
