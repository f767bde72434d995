use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "sre", about = "SRE agent control plane and edge worker", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the control-plane HTTP API (§6).
    Serve,

    /// Run the edge worker poll loop for one cluster (§4.4).
    Worker,

    /// Connect to the database and apply migrations, then exit.
    Migrate,
}
