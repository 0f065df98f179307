//! AgentHub Marketplace - Agent-to-agent job matching and settlement
//!
//! - Collaborators: the `Agent` and `Validator` traits the marketplace drives
//! - Bids: reputation-weighted selection over snapshot bids
//! - Marketplace: post, bid, select and execute with escrowed payment

pub mod bid;
pub mod collaborator;
pub mod config;
pub mod error;
pub mod job;
pub mod market;
pub mod stats;

pub use bid::*;
pub use collaborator::*;
pub use config::*;
pub use error::*;
pub use job::*;
pub use market::*;
pub use stats::*;

pub use agenthub_escrow::{ContractStatus, EscrowContract, EscrowManager, SettlementOutcome};
pub use agenthub_ledger::Ledger;
