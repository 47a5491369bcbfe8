use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "topup-core")]
#[command(about = "Driver Top-Up Orchestration Service", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server (default)
    Serve,

    /// Print the resolved configuration and which values came from the
    /// environment
    Config,
}
