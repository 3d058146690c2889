use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "xlmerge",
    about = "Merge the worksheets of many workbooks into one",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run one merge, driven by a controller over stdin/stdout
    Worker(WorkerArgs),
    /// List the supported save formats and their format codes
    Formats,
}

#[derive(Args)]
pub struct WorkerArgs {
    /// Newline-delimited list of source workbook paths
    #[arg(long)]
    pub file_list: PathBuf,
    /// File whose existence requests cancellation
    #[arg(long)]
    pub cancel_flag: PathBuf,
    /// Name to propose when asking where to save
    #[arg(long)]
    pub suggested_name: Option<String>,
    /// TOML configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,
}
