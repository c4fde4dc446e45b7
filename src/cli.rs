use crate::api::DashClient;
use crate::config;
use crate::view;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;

#[derive(Debug, Parser)]
#[command(
    name = "evodash",
    version,
    about = "Terminal client for the optimization-experiment dashboard backend"
)]
pub struct Cli {
    /// Backend host (overrides EVODASH_HOST and the config file)
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// Backend port (overrides EVODASH_PORT and the config file)
    #[arg(long, global = true)]
    pub port: Option<u16>,

    /// Print the decoded response as JSON instead of rendered tables
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List known experiment batches
    Batches,
    /// Show the result tables of one batch
    Tables { batch: String },
    /// Show the plot references of one batch
    Plots { batch: String },
    /// Trigger processing of a batch
    Process {
        batch: String,
        /// Cap the number of worker CPUs the backend may use
        #[arg(long)]
        max_cpus: Option<usize>,
    },
}

/// Resolve configuration, construct the one backend client, and hand it
/// to the requested view. Views receive the client explicitly; there is
/// no ambient instance.
pub async fn run(args: Cli) -> Result<()> {
    let cfg = config::resolve(args.host.as_deref(), args.port)?;
    let client =
        Arc::new(DashClient::new(&cfg).context("failed to construct backend client")?);

    match &args.command {
        Command::Batches => view::home::show_batches(&client, args.json).await,
        Command::Tables { batch } => view::batch::show_tables(&client, batch, args.json).await,
        Command::Plots { batch } => view::batch::show_plots(&client, batch, args.json).await,
        Command::Process { batch, max_cpus } => {
            view::home::process(&client, batch, *max_cpus, args.json).await
        }
    }
}
