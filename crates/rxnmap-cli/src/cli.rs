use clap::{Args, Parser, Subcommand};
use rxnmap::engine::strategy::MappingStrategy;
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "Tony Kan, Ted Yu",
    version,
    about = "rxnmap CLI - Atom-atom mapping of chemical reactions with concurrent matching strategies.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compute an atom-atom mapping for a reaction and write the mapped reaction.
    Map(MapArgs),
}

/// Arguments for the `map` subcommand.
#[derive(Args, Debug, Clone)]
pub struct MapArgs {
    // --- Core Arguments ---
    /// Path to the input reaction (.toml reaction document or .rxn file).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Path for the mapped reaction, written as an RXN file.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,

    /// Path to a configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Also write the atom pairs as a CSV table.
    #[arg(long, value_name = "PATH")]
    pub mapping_csv: Option<PathBuf>,

    // --- Mapping Overrides ---
    /// Keep explicit hydrogens in the molecules handed to the matcher.
    #[arg(long)]
    pub keep_hydrogens: bool,

    /// Restrict mapping to these strategies (exhaustive, minimal, mixture, ring-biased).
    /// Accepts a comma-separated list or repeated flags.
    #[arg(long = "strategy", value_name = "NAME", value_delimiter = ',')]
    pub strategies: Vec<MappingStrategy>,

    /// Number of threads for matching the jobs of one strategy.
    /// Defaults to one less than the available logical cores.
    #[arg(short = 'j', long, value_name = "NUM")]
    pub threads: Option<usize>,

    /// Override the search step budget of a single match.
    #[arg(long, value_name = "INT")]
    pub search_budget: Option<u64>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S mapping.search-budget=50000
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}
