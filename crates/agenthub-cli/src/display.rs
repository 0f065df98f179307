//! Display utilities for the CLI

use agenthub_agents::{AgentProfile, ValidationStats};
use agenthub_escrow::{ContractStatus, EscrowContract};
use agenthub_ledger::Block;
use agenthub_marketplace::{JobOutcome, MarketStats};
use colored::*;

/// Print a section header
pub fn section(title: &str) {
    println!();
    println!("{}", "━".repeat(60).bright_black());
    println!(" {}", title.bright_white().bold());
    println!("{}", "━".repeat(60).bright_black());
}

/// Print a success message
pub fn success(message: &str) {
    println!("  {} {}", "✓".bright_green(), message);
}

/// Print an error message
pub fn error(message: &str) {
    println!("  {} {}", "✗".bright_red(), message.bright_red());
}

/// Print an info message
pub fn info(message: &str) {
    println!("  {} {}", "→".bright_blue(), message);
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("      {}: {}", key, value.bright_cyan());
}

/// Print a labeled value
pub fn labeled(label: &str, value: &str) {
    println!("  {}: {}", label.bright_white(), value.bright_cyan());
}

fn short_hash(hash: &str) -> &str {
    hash.get(..16).unwrap_or(hash)
}

pub fn profile(profile: &AgentProfile) {
    println!();
    println!(
        "  {} {}",
        profile.id.to_string().bright_white().bold(),
        format!("({})", profile.role).bright_black()
    );
    if !profile.skills.is_empty() {
        let skills: Vec<String> = profile.skills.iter().map(|s| s.to_string()).collect();
        kv("Skills", &skills.join(", "));
    }
    kv("Balance", &format!("{} tokens", profile.balance));
    kv("Reputation", &format!("{:.2} / 5.00", profile.reputation));
    kv("Jobs Completed", &profile.jobs_completed.to_string());
    kv("Jobs Requested", &profile.jobs_requested.to_string());
    kv("Total Earned", &format!("{} tokens", profile.total_earned));
    kv("Total Spent", &format!("{} tokens", profile.total_spent));
    kv(
        "Completion Rate",
        &format!("{:.1}%", profile.completion_rate * 100.0),
    );
    for (skill, price) in &profile.pricing {
        kv(&format!("Price ({})", skill), &format!("{} tokens", price));
    }
}

pub fn outcome(outcome: &JobOutcome) {
    let verdict = if outcome.is_completed() {
        "COMPLETED".bright_green().bold()
    } else {
        "DISPUTED".bright_red().bold()
    };
    println!("  {} {}", outcome.job_id.to_string().bright_white(), verdict);
    kv("Contract", outcome.contract_id.as_str());
    kv("Price", &format!("{} tokens", outcome.price));
    kv("Quality", &format!("{}/100", outcome.quality_score));
    kv("Confidence", &format!("{:.2}", outcome.confidence));
}

pub fn market_stats(stats: &MarketStats) {
    labeled("Registered Agents", &stats.registered_agents.to_string());
    labeled("Active Jobs", &stats.active_jobs.to_string());
    labeled("Completed Jobs", &stats.completed_jobs.to_string());
    labeled("Disputed Jobs", &stats.disputed_jobs.to_string());
    if stats.completed_jobs > 0 {
        labeled("Total Value", &format!("{} tokens", stats.total_value));
        labeled("Average Job Value", &format!("{} tokens", stats.average_job_value));
        labeled("Average Quality", &format!("{:.1}/100", stats.average_quality));
    }
}

pub fn contract(contract: &EscrowContract) {
    let status = match contract.status {
        ContractStatus::Escrowed => "ESCROWED".yellow(),
        ContractStatus::Completed => "COMPLETED".bright_green(),
        ContractStatus::Disputed if contract.is_refunded() => "DISPUTED (refunded)".bright_red(),
        ContractStatus::Disputed => "DISPUTED".bright_red(),
    };
    println!("  {} {}", contract.id.to_string().bright_white(), status);
    kv("Buyer", contract.buyer.as_str());
    kv("Seller", contract.seller.as_str());
    kv("Amount", &format!("{} tokens", contract.amount));
    kv("Job", &contract.description);
    if let Some(score) = contract.quality_score {
        kv("Quality Score", &format!("{}/100", score));
    }
}

pub fn validation_stats(validator: &str, stats: &ValidationStats) {
    labeled("Validator", validator);
    labeled("Total Validations", &stats.total.to_string());
    labeled("Pass Rate", &format!("{:.1}%", stats.pass_rate));
    labeled("Average Score", &format!("{:.1}/100", stats.average_score));
}

pub fn block(block: &Block) {
    println!();
    println!(
        "  {} {}",
        format!("Block #{}", block.index).bright_white().bold(),
        block.payload.kind().bright_black()
    );
    kv("Timestamp", &block.timestamp.to_rfc3339());
    kv("Hash", &format!("{}...", short_hash(&block.hash)));
    kv(
        "Previous Hash",
        &format!("{}...", short_hash(&block.previous_hash)),
    );
    match serde_json::to_string(&block.payload) {
        Ok(payload) => kv("Payload", &payload),
        Err(e) => kv("Payload", &format!("<unprintable: {}>", e)),
    }
}

pub fn chain_validity(valid: bool, blocks: usize) {
    if valid {
        success(&format!("Chain valid ({} blocks)", blocks));
    } else {
        error(&format!("Chain INVALID ({} blocks) - tampering detected", blocks));
    }
}
