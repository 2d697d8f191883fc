use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "page-ledger")]
#[command(about = "Keeps track of scraped pages and their stored artifacts")]
#[command(version)]
pub struct Args {
    /// Path to JSON configuration file
    #[arg(short, long)]
    pub config: PathBuf,

    /// Run identifier for temporary files (overrides the configuration)
    #[arg(long)]
    pub run_id: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print stored records as JSON lines
    List {
        /// Maximum number of records to print
        #[arg(short, long, default_value_t = 1000)]
        limit: usize,

        /// Only pages with (true) or without (false) content
        #[arg(long)]
        scraped: Option<bool>,
    },

    /// Print the urls that have not been scraped yet
    Filter {
        #[arg(required = true)]
        urls: Vec<String>,
    },

    /// Tell whether a url was already scraped
    WasScraped { url: String },

    /// Delete stored records by url
    Delete {
        #[arg(required = true)]
        urls: Vec<String>,
    },

    /// Upload a local url list for this run
    StoreTemp {
        source: PathBuf,
        destination: String,
    },

    /// List the url lists stored for this run
    ListTemp,

    /// List stored classifiers
    Classifiers,
}
