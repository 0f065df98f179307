//! Rule-based quality validator
//!
//! Scores work by output length and keyword coverage for the job type, then
//! adds bounded random variance. The generator is seedable so simulations can
//! be replayed.

use agenthub_marketplace::{Assessment, CollaboratorError, Validator, WorkOutput};
use agenthub_types::{AgentId, JobType};
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::info;

/// Default bound on the random adjustment applied to each score
pub const DEFAULT_VARIANCE: u8 = 15;

/// Score at or above which a validation counts as passed
pub const DEFAULT_PASS_THRESHOLD: u8 = 70;

/// Confidence reported with every rule-based assessment
pub const RULE_CONFIDENCE: f64 = 0.6;

const SHORT_OUTPUT_PENALTY: i32 = 20;
const KEYWORD_BONUS: f64 = 15.0;

/// Scoring rule for one job type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoringRule {
    pub base_score: i32,
    pub min_length: usize,
    pub keywords: &'static [&'static str],
}

impl ScoringRule {
    pub fn for_job(job_type: &JobType) -> Self {
        let (base_score, min_length, keywords): (i32, usize, &'static [&'static str]) =
            match job_type {
                JobType::DataAnalysis => {
                    (75, 50, &["analysis", "dataset", "correlation", "insights"])
                }
                JobType::ImageGeneration => (80, 40, &["image", "generated", "visual", "quality"]),
                JobType::TextGeneration => (70, 60, &["content", "professional", "created"]),
                JobType::CodeReview => (85, 50, &["review", "code", "issues", "improvements"]),
                JobType::Validation => (90, 30, &["validation", "quality", "metrics"]),
                JobType::Other(_) => (70, 40, &[]),
            };
        Self {
            base_score,
            min_length,
            keywords,
        }
    }

    /// Deterministic part of the score, before variance
    pub fn base(&self, output: &str) -> i32 {
        let mut score = f64::from(self.base_score);

        if output.chars().count() < self.min_length {
            score -= f64::from(SHORT_OUTPUT_PENALTY);
        }

        if !self.keywords.is_empty() {
            let lowered = output.to_lowercase();
            let found = self
                .keywords
                .iter()
                .filter(|kw| lowered.contains(*kw))
                .count();
            score += found as f64 / self.keywords.len() as f64 * KEYWORD_BONUS;
        }

        score as i32
    }
}

/// One recorded validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationRecord {
    pub job_type: JobType,
    pub score: u8,
    pub output_length: usize,
    pub passed: bool,
    pub validated_at: DateTime<Utc>,
}

/// Aggregate over a validator's history
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationStats {
    pub total: usize,
    /// Percentage of validations that passed
    pub pass_rate: f64,
    pub average_score: f64,
}

struct ValidatorState {
    rng: StdRng,
    history: Vec<ValidationRecord>,
}

/// Keyword and length scoring oracle
pub struct RuleValidator {
    id: AgentId,
    variance: u8,
    pass_threshold: u8,
    state: Mutex<ValidatorState>,
}

impl RuleValidator {
    /// Validator with the given id, seeded for reproducible variance
    pub fn new(id: impl Into<AgentId>, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            id: id.into(),
            variance: DEFAULT_VARIANCE,
            pass_threshold: DEFAULT_PASS_THRESHOLD,
            state: Mutex::new(ValidatorState {
                rng,
                history: Vec::new(),
            }),
        }
    }

    pub fn with_variance(mut self, variance: u8) -> Self {
        self.variance = variance;
        self
    }

    pub fn with_pass_threshold(mut self, threshold: u8) -> Self {
        self.pass_threshold = threshold;
        self
    }

    pub async fn history(&self) -> Vec<ValidationRecord> {
        self.state.lock().await.history.clone()
    }

    pub async fn stats(&self) -> ValidationStats {
        let state = self.state.lock().await;
        let total = state.history.len();
        if total == 0 {
            return ValidationStats::default();
        }

        let passed = state.history.iter().filter(|v| v.passed).count();
        let score_sum: u64 = state.history.iter().map(|v| u64::from(v.score)).sum();
        ValidationStats {
            total,
            pass_rate: passed as f64 / total as f64 * 100.0,
            average_score: score_sum as f64 / total as f64,
        }
    }
}

impl Default for RuleValidator {
    fn default() -> Self {
        Self::new("ValidatorAgent", None)
    }
}

#[async_trait::async_trait]
impl Validator for RuleValidator {
    fn id(&self) -> &AgentId {
        &self.id
    }

    async fn validate(
        &self,
        _description: &str,
        output: &WorkOutput,
        job_type: &JobType,
    ) -> Result<Assessment, CollaboratorError> {
        let base = ScoringRule::for_job(job_type).base(output.as_str());

        let mut state = self.state.lock().await;
        let spread = i32::from(self.variance);
        let jitter = if spread == 0 {
            0
        } else {
            state.rng.gen_range(-spread..=spread)
        };
        let score = (base + jitter).clamp(0, 100) as u8;
        let passed = score >= self.pass_threshold;

        state.history.push(ValidationRecord {
            job_type: job_type.clone(),
            score,
            output_length: output.as_str().chars().count(),
            passed,
            validated_at: Utc::now(),
        });

        info!(
            "{} scored {} work {}/100 ({})",
            self.id,
            job_type,
            score,
            if passed { "passed" } else { "failed" }
        );

        Ok(Assessment {
            score,
            confidence: RULE_CONFIDENCE,
        })
    }
}
