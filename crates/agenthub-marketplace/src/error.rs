//! Marketplace and collaborator errors

use agenthub_escrow::EscrowError;
use agenthub_types::Amount;
use thiserror::Error;

/// Errors that can occur in marketplace operations
#[derive(Error, Debug)]
pub enum MarketError {
    #[error("Agent {agent_id} not found")]
    AgentNotFound { agent_id: String },

    #[error("Agent {agent_id} is already registered")]
    AgentAlreadyRegistered { agent_id: String },

    #[error("Job {job_id} not found")]
    JobNotFound { job_id: String },

    #[error("Job {job_id} is not open (status: {status})")]
    JobNotOpen { job_id: String, status: String },

    #[error("Job {job_id} is not assigned (status: {status})")]
    JobNotAssigned { job_id: String, status: String },

    #[error("Job {job_id} is already being executed")]
    ExecutionInProgress { job_id: String },

    #[error("Invalid budget: {message}")]
    InvalidBudget { message: String },

    #[error("Insufficient funds for {agent_id}: required {required}, available {available}")]
    InsufficientFunds {
        agent_id: String,
        required: Amount,
        available: Amount,
    },

    #[error("No bids for job {job_id}")]
    NoBids { job_id: String },

    #[error("Escrow error: {0}")]
    Escrow(#[from] EscrowError),
}

pub type Result<T> = std::result::Result<T, MarketError>;

/// Failure reported by, or imposed on, an Agent or Validator call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CollaboratorError {
    #[error("{collaborator} failed: {message}")]
    Failed {
        collaborator: String,
        message: String,
    },

    #[error("{collaborator} timed out after {after_ms}ms")]
    TimedOut { collaborator: String, after_ms: u64 },
}
