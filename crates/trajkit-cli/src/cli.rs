use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "trajkit - inspect, validate, and convert DCD trajectories without loading them into memory.",
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

    /// Set the number of threads for parallel decoding.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,

    #[command(flatten)]
    pub reader: ReaderArgs,
}

/// Options that control how frames are interpreted, shared by every subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct ReaderArgs {
    /// Reader configuration file in TOML format.
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Override the dimensionality of the system from the config file.
    #[arg(short, long, global = true, value_enum, value_name = "DIM")]
    pub dimensions: Option<DimensionsArg>,

    /// Give every particle this type name, overriding the config file.
    #[arg(short = 't', long, global = true, value_name = "NAME")]
    pub default_type: Option<String>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DimensionsArg {
    #[value(name = "2")]
    Two,
    #[value(name = "3")]
    Three,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the header and frame index summary of a trajectory.
    Info(InfoArgs),
    /// Decode and print a single frame.
    Frame(FrameArgs),
    /// Decode every frame and report the first defect, if any.
    Validate(ValidateArgs),
    /// Convert a trajectory to extended XYZ text, decoding frames in parallel.
    Export(ExportArgs),
}

#[derive(Args, Debug)]
pub struct InfoArgs {
    /// Path to the DCD file.
    #[arg(value_name = "PATH")]
    pub input: PathBuf,

    /// Also list the byte offset of every frame.
    #[arg(long)]
    pub offsets: bool,
}

#[derive(Args, Debug)]
pub struct FrameArgs {
    /// Path to the DCD file.
    #[arg(value_name = "PATH")]
    pub input: PathBuf,

    /// Frame to print; negative values count from the end.
    #[arg(allow_negative_numbers = true, value_name = "INDEX")]
    pub index: isize,

    /// Maximum number of particles to print.
    #[arg(short = 'n', long, default_value_t = 10, value_name = "INT")]
    pub limit: usize,
}

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Path to the DCD file.
    #[arg(value_name = "PATH")]
    pub input: PathBuf,
}

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Path to the DCD file.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Path for the extended XYZ output file.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,
}
