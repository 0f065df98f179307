//! Job types and participant roles

use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Kind of service a job requests
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    DataAnalysis,
    ImageGeneration,
    TextGeneration,
    CodeReview,
    Validation,
    /// Any service the marketplace has no built-in knowledge of
    Other(String),
}

impl JobType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::DataAnalysis => "data_analysis",
            Self::ImageGeneration => "image_generation",
            Self::TextGeneration => "text_generation",
            Self::CodeReview => "code_review",
            Self::Validation => "validation",
            Self::Other(name) => name,
        }
    }
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobType {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "data_analysis" => Self::DataAnalysis,
            "image_generation" => Self::ImageGeneration,
            "text_generation" => Self::TextGeneration,
            "code_review" => Self::CodeReview,
            "validation" => Self::Validation,
            other => Self::Other(other.to_string()),
        })
    }
}

/// Capability an agent registers with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    /// Posts jobs and pays for them
    Buyer,
    /// Bids on jobs and performs work
    Seller,
    /// Scores delivered work
    Validator,
}

impl fmt::Display for AgentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buyer => f.write_str("buyer"),
            Self::Seller => f.write_str("seller"),
            Self::Validator => f.write_str("validator"),
        }
    }
}
