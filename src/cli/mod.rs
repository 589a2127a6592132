//! Command-line interface

pub mod init_schema;
pub mod serve;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "user-service")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Extra configuration file layered over config/default and config/local
    #[arg(long, global = true, env = "CONFIG_PATH")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP server
    Serve,
    /// Create the PostgreSQL tables backing the user repository
    InitSchema,
}
