use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "snackroute")]
#[command(author, version, about = "Route chat queries to agents and tabular lookup", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Route a single query through the lookup assistant
    Route {
        query: String,

        /// JSON file with table records (defaults to the built-in sample)
        #[arg(long)]
        table: Option<PathBuf>,

        /// Deliver the summary to the matched contact via the configured webhook
        #[arg(long)]
        notify: bool,

        /// Subject line for the notification
        #[arg(long, default_value = "User preference info")]
        subject: String,
    },

    /// Interactive chat routed across the weather/food/therapist/logical agents
    Chat {
        /// Classify with the LLM backend instead of keyword rules
        #[arg(long)]
        llm_classifier: bool,

        /// Enable persistent memory (saves conversation to disk)
        #[arg(short = 'm', long)]
        memory: bool,

        /// Session ID for persistent memory
        #[arg(long, default_value = "default")]
        session_id: String,

        /// Storage directory for persistent memory
        #[arg(long, default_value = "./sessions")]
        storage_dir: String,
    },

    /// Route queries from a file in batch, one query per line
    Batch {
        file: String,

        #[arg(short, long, default_value = "4")]
        concurrency: usize,
    },
}
