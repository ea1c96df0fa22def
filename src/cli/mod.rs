pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "threadcast")]
#[command(about = "Crawl community best posts into a CSV store", long_about = None)]
pub struct Cli {
    /// Config file (default: ~/.config/threadcast/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the crawl scheduler in the foreground
    Run {
        /// Crawl interval (e.g., "300s", "5m", "1h"); overrides the config
        #[arg(short, long)]
        interval: Option<String>,

        /// Wait one interval before the first crawl
        #[arg(long)]
        no_initial_cycle: bool,
    },
    /// Run exactly one crawl cycle
    Crawl,
    /// Parse a saved listing page and print what would be kept
    Parse {
        /// Path to the HTML file
        path: PathBuf,
    },
    /// Show the stored posts
    List {
        /// Number of rows to print
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },
    /// Rewrite stored posts with the local language model
    Rewrite,
    /// Write narration scripts from rewritten posts
    Narrate,
    /// Check whether a scheduler is running
    Status,
    /// Stop the running scheduler
    Stop,
}
