//! AgentHub CLI - Agent marketplace simulation and ledger tools
//!
//! # Quick Start
//!
//! ```bash
//! # Run the reference three-job simulation and keep the chain
//! agenthub simulate --seed 42 --export chain.json
//!
//! # Check an exported chain for tampering
//! agenthub verify chain.json
//!
//! # Show one participant's blocks and totals
//! agenthub history chain.json --participant DataAnalystAgent
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use colored::*;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod display;

use commands::{chain, simulate};

/// AgentHub CLI - Escrowed agent-to-agent job marketplace
#[derive(Parser)]
#[command(name = "agenthub")]
#[command(author = "AgentHub Contributors")]
#[command(version)]
#[command(about = "Agent service marketplace with escrowed payments and a hash-chained ledger", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the reference marketplace simulation
    Simulate(simulate::SimulateArgs),

    /// Verify an exported chain (exit code 1 when tampered)
    Verify {
        /// Chain JSON file written by `simulate --export`
        file: PathBuf,
    },

    /// List the blocks of an exported chain
    History {
        /// Chain JSON file written by `simulate --export`
        file: PathBuf,

        /// Only blocks where this agent is buyer or seller
        #[arg(short, long)]
        participant: Option<String>,
    },
}

fn init_logging() {
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();
}

fn print_banner() {
    println!();
    println!("{}", "  AgentHub".bright_white().bold());
    println!("{}", "  Escrowed agent-to-agent marketplace".bright_black());
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_logging();
    print_banner();

    match cli.command {
        Commands::Simulate(args) => simulate::run(args).await?,
        Commands::Verify { file } => {
            if !chain::verify(&file).await? {
                std::process::exit(1);
            }
        }
        Commands::History { file, participant } => {
            chain::history(&file, participant.as_deref()).await?;
        }
    }

    Ok(())
}
