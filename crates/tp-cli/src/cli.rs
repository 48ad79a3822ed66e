use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "tpatch",
    about = "Structural diff and patch for JSON documents",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Compute the patch turning one document into another
    Diff(DiffArgs),
    /// Apply a patch to a document
    Apply(ApplyArgs),
    /// Print a patch in readable form
    Show(ShowArgs),
}

/// Settings shared by every command that compares or patches.
#[derive(Args, Clone, Debug, Default)]
pub struct SettingsArgs {
    /// TOML file with diff settings
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Diff arrays as keyed collections
    #[arg(long)]
    pub map: bool,
    /// Field used as the key of array elements (implies --map)
    #[arg(long)]
    pub key: Option<String>,
    /// Inputs are already sorted by key
    #[arg(long)]
    pub sorted: bool,
}

#[derive(Args)]
pub struct DiffArgs {
    pub old: PathBuf,
    pub new: PathBuf,
    #[command(flatten)]
    pub settings: SettingsArgs,
    #[arg(long)]
    pub pretty: bool,
}

#[derive(Args)]
pub struct ApplyArgs {
    pub patch: PathBuf,
    pub base: PathBuf,
    #[command(flatten)]
    pub settings: SettingsArgs,
    #[arg(long)]
    pub pretty: bool,
}

#[derive(Args)]
pub struct ShowArgs {
    pub patch: PathBuf,
}
