//! AgentHub Types - Canonical domain types for the agent service marketplace
//!
//! This crate contains the foundational types shared by every AgentHub crate
//! with zero dependencies on other agenthub crates:
//!
//! - Identity types (AgentId, ContractId, JobId)
//! - Fixed-point token amounts
//! - Job types and agent roles

pub mod identity;
pub mod amount;
pub mod job;

pub use identity::*;
pub use amount::*;
pub use job::*;
