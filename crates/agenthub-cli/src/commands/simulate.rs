//! Reference marketplace simulation

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use agenthub_agents::{RuleValidator, SimAgent, DEFAULT_VARIANCE};
use agenthub_escrow::DEFAULT_QUALITY_THRESHOLD;
use agenthub_marketplace::{
    DisputePolicy, EscrowManager, Ledger, MarketConfig, Marketplace, Validator,
};
use agenthub_types::{AgentId, Amount, JobType};
use anyhow::Context;
use clap::Args;

use crate::display;

/// Jobs ResearchBot posts, in order
const JOBS: [(&str, JobType, u64); 3] = [
    (
        "Analyze customer satisfaction survey data (500 responses)",
        JobType::DataAnalysis,
        15,
    ),
    (
        "Generate product visualization for marketing campaign",
        JobType::ImageGeneration,
        12,
    ),
    (
        "Perform sentiment analysis on social media mentions",
        JobType::DataAnalysis,
        14,
    ),
];

#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// Minimum validator score that releases payment
    #[arg(long, env = "AGENTHUB_QUALITY_THRESHOLD", default_value_t = DEFAULT_QUALITY_THRESHOLD)]
    pub quality_threshold: u8,

    /// What happens to escrowed funds on a failed validation (forfeit | refund)
    #[arg(long, env = "AGENTHUB_DISPUTE_POLICY", default_value = "forfeit")]
    pub dispute_policy: DisputePolicy,

    /// Seed for validator variance (random if unset)
    #[arg(long, env = "AGENTHUB_SEED")]
    pub seed: Option<u64>,

    /// Bound on the random score adjustment
    #[arg(long, env = "AGENTHUB_VALIDATOR_VARIANCE", default_value_t = DEFAULT_VARIANCE)]
    pub variance: u8,

    /// Journal the ledger to this JSON-lines file
    #[arg(long, env = "AGENTHUB_LEDGER_JOURNAL")]
    pub journal: Option<PathBuf>,

    /// Timeout for each agent or validator call, in seconds
    #[arg(long, env = "AGENTHUB_TIMEOUT_SECS", default_value_t = 30)]
    pub timeout_secs: u64,

    /// Write the final chain as JSON to this file
    #[arg(long)]
    pub export: Option<PathBuf>,
}

pub async fn run(args: SimulateArgs) -> anyhow::Result<()> {
    let ledger = match &args.journal {
        Some(path) => Ledger::open(path)
            .await
            .with_context(|| format!("opening ledger journal {}", path.display()))?,
        None => Ledger::new(),
    };

    let validator = Arc::new(
        RuleValidator::new("ValidatorAgent", args.seed)
            .with_variance(args.variance)
            .with_pass_threshold(args.quality_threshold),
    );
    let config = MarketConfig::default()
        .with_quality_threshold(args.quality_threshold)
        .with_dispute_policy(args.dispute_policy)
        .with_collaborator_timeout(Duration::from_secs(args.timeout_secs));
    let market = Marketplace::new(ledger, validator.clone(), config);

    display::section("Agents");
    let agents = vec![
        Arc::new(SimAgent::buyer("ResearchBot", Amount::tokens(200))),
        Arc::new(SimAgent::seller(
            "DataAnalystAgent",
            vec![JobType::DataAnalysis, JobType::Validation],
            Amount::tokens(50),
        )),
        Arc::new(SimAgent::seller(
            "ImageGenAgent",
            vec![JobType::ImageGeneration, JobType::Validation],
            Amount::tokens(50),
        )),
    ];
    for agent in &agents {
        market.register_agent(agent.clone()).await?;
        display::profile(&agent.profile().await);
    }

    let poster = AgentId::from("ResearchBot");
    for (round, (description, job_type, budget)) in JOBS.into_iter().enumerate() {
        display::section(&format!("Job {}: {}", round + 1, job_type));
        display::info(description);

        match market
            .run_full_job_cycle(&poster, description, job_type, Amount::tokens(budget))
            .await
        {
            Ok(outcome) => display::outcome(&outcome),
            Err(e) => display::error(&e.to_string()),
        }
    }

    display::section("Final Agent States");
    for agent in &agents {
        display::profile(&agent.profile().await);
    }

    display::section("Marketplace");
    display::market_stats(&market.stats().await);

    display::section("Contracts");
    let escrow = market.escrow();
    let mut contracts = escrow.active_contracts().await;
    contracts.extend(escrow.completed_contracts().await);
    contracts.extend(escrow.disputed_contracts().await);
    for contract in &contracts {
        display::contract(contract);
    }

    display::section("Validation");
    display::validation_stats(validator.id().as_str(), &validator.stats().await);

    display::section("Ledger");
    let ledger = market.ledger();
    for block in ledger.blocks().await {
        display::block(&block);
    }
    println!();
    display::chain_validity(ledger.verify().await, ledger.len().await);

    if let Some(path) = &args.export {
        let json = ledger.to_json().await?;
        tokio::fs::write(path, json)
            .await
            .with_context(|| format!("writing {}", path.display()))?;
        display::success(&format!("Chain exported to {}", path.display()));
    }

    Ok(())
}
