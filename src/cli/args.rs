use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "so2-flux")]
#[command(about = "SO2 flux retrieval from a network of scanning spectrometers")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Log file path")]
    pub log_file: Option<PathBuf>,
}

/// Inputs shared by every command that runs the flux pipeline
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    #[arg(short, long, help = "Results directory holding one folder per day")]
    pub results_dir: PathBuf,

    #[arg(short, long, help = "Day to process (YYYY-MM-DD) [default: today, UTC]")]
    pub date: Option<NaiveDate>,

    #[arg(short, long, help = "Analysis settings (TOML)")]
    pub settings: PathBuf,

    #[arg(long, help = "Station registry (CSV)")]
    pub stations: PathBuf,

    #[arg(long, default_value = "false", help = "Write the _reanalysed tables")]
    pub reanalyse: bool,

    #[arg(long, default_value = "false", help = "Print the run report as JSON")]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compute and export the flux tables for one day
    Process {
        #[command(flatten)]
        run: RunArgs,
    },

    /// Recompute the day's flux tables at a fixed interval until interrupted
    Watch {
        #[command(flatten)]
        run: RunArgs,

        #[arg(long, default_value = "60")]
        interval_secs: u64,
    },

    /// Display a summary of an exported flux table
    Info {
        #[arg(short, long)]
        file: PathBuf,

        #[arg(long, default_value = "false")]
        json: bool,
    },
}
