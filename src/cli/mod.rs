//! CLI module for Organon
//!
//! - `think`: run one request against a simulated node
//! - `serve`: answer newline-delimited JSON requests from stdin
//! - `config`: print the effective configuration

use clap::{Parser, Subcommand};
use organon_core::Modality;

pub mod config;
pub mod think;

/// Organon session orchestrator CLI
#[derive(Parser, Debug)]
#[command(name = "organon")]
#[command(about = "Gated session orchestrator for actuation nodes")]
#[command(version)]
pub struct Cli {
    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a single request and print the result
    Think {
        /// Node identity
        #[arg(long, default_value = "cl1-organoid-7x")]
        node: String,
        /// Response model identifier
        #[arg(long, default_value = "organoid-v1")]
        model: String,
        /// Input modality (text, image, audio)
        #[arg(long, default_value = "text")]
        modality: Modality,
        /// Treat the payload as a JSON object
        #[arg(long)]
        structured: bool,
        /// Override the simulated node load
        #[arg(long)]
        load: Option<f64>,
        /// Override the load ceiling
        #[arg(long)]
        ceiling: Option<f64>,
        /// Request payload
        payload: String,
    },
    /// Serve newline-delimited JSON requests from stdin
    Serve {
        /// Node identity
        #[arg(long, default_value = "cl1-organoid-7x")]
        node: String,
        /// Response model identifier
        #[arg(long, default_value = "organoid-v1")]
        model: String,
    },
    /// Print the effective configuration
    Config,
}

/// Run the CLI command
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Some(Commands::Think {
            node,
            model,
            modality,
            structured,
            load,
            ceiling,
            payload,
        }) => {
            think::run(think::ThinkArgs {
                node,
                model,
                modality,
                structured,
                load,
                ceiling,
                payload,
            })
            .await
        }
        Some(Commands::Serve { node, model }) => crate::server::run(&node, &model).await,
        Some(Commands::Config) => config::run(),
        None => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            cmd.print_help()?;
            println!();
            Ok(())
        }
    }
}
