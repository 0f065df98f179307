//! Job postings and their lifecycle

use std::fmt;

use agenthub_escrow::ContractStatus;
use agenthub_types::{AgentId, Amount, ContractId, JobId, JobType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::bid::Bid;

/// Status of a job posting
///
/// `Open -> Assigned -> Completed | Disputed`. Nothing returns to Open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Open,
    Assigned,
    Completed,
    Disputed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Disputed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Open => "open",
            Self::Assigned => "assigned",
            Self::Completed => "completed",
            Self::Disputed => "disputed",
        };
        write!(f, "{}", s)
    }
}

/// A job request posted to the marketplace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPosting {
    pub id: JobId,
    pub poster: AgentId,
    pub description: String,
    pub job_type: JobType,
    pub budget: Amount,
    pub status: JobStatus,
    pub bids: Vec<Bid>,
    pub winner: Option<AgentId>,
    pub final_price: Option<Amount>,
    pub quality_score: Option<u8>,
    pub confidence: Option<f64>,
    /// Escrow funded for this job; set once, before work starts
    pub contract_id: Option<ContractId>,
    pub posted_at: DateTime<Utc>,
}

impl JobPosting {
    pub fn new(
        poster: AgentId,
        description: impl Into<String>,
        job_type: JobType,
        budget: Amount,
    ) -> Self {
        Self {
            id: JobId::new(),
            poster,
            description: description.into(),
            job_type,
            budget,
            status: JobStatus::Open,
            bids: Vec::new(),
            winner: None,
            final_price: None,
            quality_score: None,
            confidence: None,
            contract_id: None,
            posted_at: Utc::now(),
        }
    }
}

/// What `execute_job` settled
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobOutcome {
    pub job_id: JobId,
    pub contract_id: ContractId,
    pub status: ContractStatus,
    pub quality_score: u8,
    pub confidence: f64,
    pub price: Amount,
}

impl JobOutcome {
    pub fn is_completed(&self) -> bool {
        self.status == ContractStatus::Completed
    }
}
