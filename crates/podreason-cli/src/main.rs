use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod config;

use crate::config::PodreasonConfig;
use anyhow::Result;
use podreason_common::DeliveryType;

/// Root-cause diagnosis for slow pod lifecycle deliveries
#[derive(Parser, Debug)]
#[command(name = "podreason", about = "Pod lifecycle root-cause diagnosis")]
pub struct Cli {
    /// Path to configuration file (TOML, overrides $PODREASON_CONFIG)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Diagnose one delivery from a JSON request and print the result
    Diagnose {
        /// Delivery type: create, delete or upgrade
        #[arg(long)]
        delivery: DeliveryType,

        /// Request file, or `-` for stdin
        #[arg(long)]
        input: PathBuf,
    },

    /// Print the module topology used for a delivery type
    Graph {
        /// Delivery type: create, delete or upgrade
        #[arg(long)]
        delivery: DeliveryType,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = PodreasonConfig::resolve_config(cli.config)?;

    tracing_subscriber::fmt().with_writer(std::io::stderr).with_max_level(config.max_level()).init();

    match cli.command {
        Commands::Diagnose { delivery, input } => {
            commands::diagnose::run_diagnose(&config, delivery, &input).await?;
        }
        Commands::Graph { delivery } => {
            commands::graph::show_graph(delivery)?;
        }
    }

    Ok(())
}
