//! Collaborator contracts consumed by the marketplace
//!
//! The marketplace never looks inside an agent's wallet or a validator's
//! scoring model. It talks to both through these traits, so a simulated agent,
//! a remote service, or a scripted test double can stand behind them.

use agenthub_types::{AgentId, AgentRole, Amount, JobType};
use serde::{Deserialize, Serialize};

use crate::bid::{propose_amount, Bid};
use crate::error::CollaboratorError;
use crate::job::JobPosting;

/// Upper bound of the reputation scale
pub const MAX_REPUTATION: f64 = 5.0;

/// Opaque artifact produced by an agent's work
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkOutput {
    pub content: String,
}

impl WorkOutput {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.content
    }
}

/// A validator's verdict on a piece of work
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    /// Quality score in 0..=100
    pub score: u8,
    /// Validator confidence in 0..=1
    pub confidence: f64,
}

/// Blend a new reputation sample into the current value
///
/// `current * (1 - weight) + sample * weight`, kept inside `0..=5`.
pub fn blend_reputation(current: f64, sample: f64, weight: f64) -> f64 {
    let weight = weight.clamp(0.0, 1.0);
    (current * (1.0 - weight) + sample * weight).clamp(0.0, MAX_REPUTATION)
}

/// Convert a 0..=100 quality score into a 0..=5 reputation sample
pub fn reputation_sample(quality_score: u8) -> f64 {
    f64::from(quality_score) / 100.0 * MAX_REPUTATION
}

/// A marketplace participant with a wallet, skills and a reputation
#[async_trait::async_trait]
pub trait Agent: Send + Sync {
    fn id(&self) -> &AgentId;

    fn role(&self) -> AgentRole;

    async fn balance(&self) -> Amount;

    /// Withdraw `amount`; returns false and leaves the balance alone if short
    async fn debit(&self, amount: Amount) -> bool;

    /// Pay `amount` into the wallet
    async fn credit(&self, amount: Amount);

    /// Return previously debited funds
    async fn refund(&self, amount: Amount) {
        self.credit(amount).await;
    }

    async fn current_reputation(&self) -> f64;

    async fn completion_rate(&self) -> f64;

    fn has_skill(&self, job_type: &JobType) -> bool;

    /// Asking price for a skill, None when the agent lacks it
    fn skill_price(&self, job_type: &JobType) -> Option<Amount>;

    async fn perform_work(&self, description: &str) -> Result<WorkOutput, CollaboratorError>;

    /// Blend a reputation sample in with the given weight and return the new value
    async fn adjust_reputation(&self, sample: f64, weight: f64) -> f64;

    /// Count a finished job as completed or failed
    async fn record_outcome(&self, completed: bool);

    /// Offer a bid on `job`
    ///
    /// Agents bid their skill price capped at one token below budget, and
    /// decline jobs outside their skills or too small to bid on.
    async fn bid(&self, job: &JobPosting) -> Option<Bid> {
        if !self.has_skill(&job.job_type) {
            return None;
        }
        let price = self.skill_price(&job.job_type)?;
        let amount = propose_amount(price, job.budget)?;

        Some(Bid {
            bidder: self.id().clone(),
            amount,
            reputation_at_bid_time: self.current_reputation().await,
            completion_rate_at_bid_time: self.completion_rate().await,
        })
    }
}

/// A quality oracle that scores delivered work
#[async_trait::async_trait]
pub trait Validator: Send + Sync {
    fn id(&self) -> &AgentId;

    async fn validate(
        &self,
        description: &str,
        output: &WorkOutput,
        job_type: &JobType,
    ) -> Result<Assessment, CollaboratorError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blend_reputation() {
        // 5.0 * 0.8 + (75 / 100 * 5) * 0.2 = 4.75
        let blended = blend_reputation(5.0, reputation_sample(75), 0.2);
        assert!((blended - 4.75).abs() < 1e-9);
    }

    #[test]
    fn test_blend_reputation_stays_in_range() {
        assert_eq!(blend_reputation(5.0, 9.0, 1.0), MAX_REPUTATION);
        assert_eq!(blend_reputation(0.0, -3.0, 0.5), 0.0);
        assert_eq!(blend_reputation(4.0, 0.0, 0.0), 4.0);
    }

    #[test]
    fn test_reputation_sample() {
        assert_eq!(reputation_sample(100), 5.0);
        assert_eq!(reputation_sample(0), 0.0);
    }
}
