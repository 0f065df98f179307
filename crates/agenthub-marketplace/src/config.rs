//! Marketplace configuration

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use agenthub_escrow::DEFAULT_QUALITY_THRESHOLD;
use serde::{Deserialize, Serialize};

use crate::bid::BidSelector;

/// Weight of a new sample in the seller reputation average
pub const DEFAULT_REPUTATION_WEIGHT: f64 = 0.2;

/// Upper bound on a single Agent or Validator call
pub const DEFAULT_COLLABORATOR_TIMEOUT: Duration = Duration::from_secs(30);

/// What happens to escrowed funds when validation fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisputePolicy {
    /// The buyer stays debited
    #[default]
    Forfeit,
    /// The contract is refunded and the buyer re-credited
    Refund,
}

impl fmt::Display for DisputePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Forfeit => write!(f, "forfeit"),
            Self::Refund => write!(f, "refund"),
        }
    }
}

impl FromStr for DisputePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "forfeit" => Ok(Self::Forfeit),
            "refund" => Ok(Self::Refund),
            other => Err(format!(
                "unknown dispute policy '{}' (expected 'forfeit' or 'refund')",
                other
            )),
        }
    }
}

/// Marketplace configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketConfig {
    /// Minimum validator score that releases payment
    pub quality_threshold: u8,
    /// Weight of a new sample in the reputation moving average
    pub reputation_weight: f64,
    pub bid_weights: BidSelector,
    pub collaborator_timeout: Duration,
    pub dispute_policy: DisputePolicy,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            quality_threshold: DEFAULT_QUALITY_THRESHOLD,
            reputation_weight: DEFAULT_REPUTATION_WEIGHT,
            bid_weights: BidSelector::default(),
            collaborator_timeout: DEFAULT_COLLABORATOR_TIMEOUT,
            dispute_policy: DisputePolicy::default(),
        }
    }
}

impl MarketConfig {
    pub fn with_quality_threshold(mut self, threshold: u8) -> Self {
        self.quality_threshold = threshold;
        self
    }

    pub fn with_reputation_weight(mut self, weight: f64) -> Self {
        self.reputation_weight = weight;
        self
    }

    pub fn with_bid_weights(mut self, bid_weights: BidSelector) -> Self {
        self.bid_weights = bid_weights;
        self
    }

    pub fn with_collaborator_timeout(mut self, timeout: Duration) -> Self {
        self.collaborator_timeout = timeout;
        self
    }

    pub fn with_dispute_policy(mut self, policy: DisputePolicy) -> Self {
        self.dispute_policy = policy;
        self
    }
}
