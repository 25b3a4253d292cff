use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "rforge",
    about = "Validate, bin, uniquify and reduce schema-checked record files",
    version,
    propagate_version = true
)]
pub struct Cli {
    /// Raise log verbosity (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Validate records against their kind
    #[command(visible_alias = "c")]
    Check(CheckArgs),

    /// Group records by key attributes and report collisions
    #[command(visible_alias = "b")]
    Bins(BinsArgs),

    /// Make record identities unique by bumping a numeric field
    #[command(visible_alias = "u")]
    Uniq(UniqArgs),

    /// Reduce records to runs of equal state
    #[command(visible_alias = "r")]
    Runs(RunsArgs),
}

impl Command {
    pub fn quiet(&self) -> bool {
        match self {
            Command::Check(args) => args.input.quiet,
            Command::Bins(args) => args.input.quiet,
            Command::Uniq(args) => args.input.quiet,
            Command::Runs(args) => args.input.quiet,
        }
    }
}

/// Input options shared by all commands.
#[derive(Args)]
pub struct InputOptions {
    /// Record file (stdin if omitted)
    #[arg(short, long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Kind of the records to read
    #[arg(short, long, value_name = "KIND")]
    pub kind: String,

    /// Kind catalog (TOML) extending the built-in kinds
    #[arg(long = "kinds", value_name = "FILE")]
    pub catalog: Option<PathBuf>,

    /// Suppress summary tables (for scripting)
    #[arg(short, long)]
    pub quiet: bool,
}

#[derive(Args)]
pub struct CheckArgs {
    #[command(flatten)]
    pub input: InputOptions,

    /// Print every record as an attribute block
    #[arg(long)]
    pub dump: bool,
}

#[derive(Args)]
pub struct BinsArgs {
    #[command(flatten)]
    pub input: InputOptions,

    /// Key attributes, comma separated or repeated
    #[arg(short, long, value_name = "ATTR", value_delimiter = ',', required = true)]
    pub by: Vec<String>,

    /// List every bin, not only those with more than one record
    #[arg(long)]
    pub all: bool,
}

#[derive(Args)]
pub struct UniqArgs {
    #[command(flatten)]
    pub input: InputOptions,

    /// Identity attributes; the first must be numeric
    #[arg(short, long, value_name = "ATTR", value_delimiter = ',', required = true)]
    pub fields: Vec<String>,

    /// Attributes forced to the first record's values
    #[arg(short, long, value_name = "ATTR", value_delimiter = ',')]
    pub common: Vec<String>,

    /// Output file (stdout if omitted)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct RunsArgs {
    #[command(flatten)]
    pub input: InputOptions,

    /// Attribute whose value is the state of a record
    #[arg(short, long, value_name = "ATTR")]
    pub attr: String,

    /// Use RESOLVED/MISSING by presence of the attribute instead of its value
    #[arg(long)]
    pub presence: bool,

    /// Mark intervals in this state as buildable
    #[arg(long, value_name = "STATE")]
    pub buildable: Option<String>,

    /// Output file (stdout if omitted)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

pub fn parse() -> Cli {
    Cli::parse()
}
