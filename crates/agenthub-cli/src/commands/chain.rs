//! Chain commands - verify and inspect exported ledgers

use std::path::Path;

use agenthub_ledger::Ledger;
use agenthub_types::AgentId;
use anyhow::Context;
use colored::*;

use crate::display;

async fn load(path: &Path) -> anyhow::Result<Ledger> {
    let json = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    Ledger::from_json(&json).with_context(|| format!("parsing chain from {}", path.display()))
}

/// Verify an exported chain; returns whether it is intact
pub async fn verify(path: &Path) -> anyhow::Result<bool> {
    println!("{}", "Verifying Chain...".bright_white().bold());
    println!();

    let ledger = load(path).await?;
    let valid = ledger.verify().await;
    let blocks = ledger.len().await;

    display::labeled("File", &path.display().to_string());
    display::labeled("Last Hash", &ledger.last_hash().await);
    display::chain_validity(valid, blocks);

    Ok(valid)
}

/// List the blocks of an exported chain, optionally for one participant
pub async fn history(path: &Path, participant: Option<&str>) -> anyhow::Result<()> {
    let ledger = load(path).await?;
    let participant = participant.map(AgentId::from);

    let title = match &participant {
        Some(id) => format!("History: {}", id),
        None => "History".to_string(),
    };
    display::section(&title);

    let blocks = ledger.history(participant.as_ref()).await;
    if blocks.is_empty() {
        display::info("No matching blocks");
    }
    for block in &blocks {
        display::block(block);
    }

    if let Some(id) = &participant {
        let stats = ledger.participant_stats(id).await;
        display::section("Participant Stats");
        display::labeled("Earned", &format!("{} tokens", stats.earned));
        display::labeled("Spent", &format!("{} tokens", stats.spent));
        display::labeled("Completed as Seller", &stats.completed_as_seller.to_string());
        display::labeled("Completed as Buyer", &stats.completed_as_buyer.to_string());
        display::labeled("Transactions", &stats.transaction_count.to_string());
    }

    println!();
    display::chain_validity(ledger.verify().await, ledger.len().await);
    Ok(())
}
