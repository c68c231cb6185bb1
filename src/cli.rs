use clap::{Parser, Subcommand};

use crate::common::OutputFormat;
use crate::config::Mode;

#[derive(Parser)]
#[command(name = "sleeping-beauty")]
#[command(about = "Detect Sleeping Beauty papers (delayed citation recognition) in a citation network")]
#[command(version = "1.0.0")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load years and citations, compute per-paper metrics and classify candidates
    Analyze(AnalyzeArgs),

    /// Re-run classification on a previously written metrics table
    Classify(ClassifyArgs),

    /// Print the default configuration (rules and parameters) for a mode as JSON
    Presets(PresetsArgs),
}

#[derive(Parser, Clone)]
pub struct AnalyzeArgs {
    /// Paper years table (CSV, CSV.gz or Parquet) with `paper_idx` and `year` columns
    #[arg(short, long, required = true)]
    pub years: String,

    /// Citation JSON lines file (optionally gzip-compressed), one paper per line
    #[arg(short, long, required = true)]
    pub citations: String,

    /// Optional table mapping `paper_idx` to `arxiv_id`
    #[arg(long)]
    pub index_mapping: Option<String>,

    /// Directory for all output tables
    #[arg(short, long, default_value = "data")]
    pub output_dir: String,

    /// Output table format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Csv)]
    pub format: OutputFormat,

    /// Estimation mode; picks the preset rules unless --config is given
    #[arg(short, long, value_enum, default_value_t = Mode::Aggregate)]
    pub mode: Mode,

    /// JSON configuration file (see the `presets` command)
    #[arg(long)]
    pub config: Option<String>,

    /// Reference year for ages and windows
    #[arg(long)]
    pub current_year: Option<i32>,

    /// Length of the early window in years
    #[arg(long)]
    pub early_years: Option<i32>,

    /// Minimum paper age to be analyzed
    #[arg(long)]
    pub min_age: Option<i32>,

    /// Number of top candidates to write
    #[arg(long)]
    pub top_k: Option<usize>,

    /// Number of worker threads (0 = all cores)
    #[arg(short, long, default_value = "0")]
    pub threads: usize,

    /// Lines parsed per parallel batch
    #[arg(long, default_value = "100000")]
    pub batch_size: usize,

    /// Logging level (DEBUG, INFO, WARN, ERROR, OFF)
    #[arg(short, long, default_value = "INFO")]
    pub log_level: String,
}

#[derive(Parser, Clone)]
pub struct ClassifyArgs {
    /// Metrics table written by `analyze` (all_papers_metrics.csv or .parquet)
    #[arg(short = 'i', long, required = true)]
    pub metrics: String,

    /// Directory for the candidate tables
    #[arg(short, long, default_value = "data")]
    pub output_dir: String,

    /// Output table format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Csv)]
    pub format: OutputFormat,

    /// Mode whose preset rules to apply unless --config is given
    #[arg(short, long, value_enum, default_value_t = Mode::Aggregate)]
    pub mode: Mode,

    /// JSON configuration file (see the `presets` command)
    #[arg(long)]
    pub config: Option<String>,

    /// Number of top candidates to write
    #[arg(long)]
    pub top_k: Option<usize>,

    /// Logging level (DEBUG, INFO, WARN, ERROR, OFF)
    #[arg(short, long, default_value = "INFO")]
    pub log_level: String,
}

#[derive(Parser, Clone)]
pub struct PresetsArgs {
    /// Mode whose defaults to print
    #[arg(short, long, value_enum, default_value_t = Mode::Aggregate)]
    pub mode: Mode,

    /// Keep only this preset rule (case-insensitive), which also becomes the top-K rule
    #[arg(short, long)]
    pub rule: Option<String>,

    /// Write the configuration to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<String>,

    /// Logging level (DEBUG, INFO, WARN, ERROR, OFF)
    #[arg(short, long, default_value = "INFO")]
    pub log_level: String,
}
