//! Marketplace statistics

use agenthub_types::Amount;
use serde::{Deserialize, Serialize};

use crate::job::{JobPosting, JobStatus};

/// Aggregate view over the marketplace's job collections
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketStats {
    pub registered_agents: usize,
    /// Jobs not yet completed, disputed ones included
    pub active_jobs: usize,
    pub completed_jobs: usize,
    pub disputed_jobs: usize,
    /// Sum of final prices over completed jobs
    pub total_value: Amount,
    pub average_job_value: Amount,
    /// Mean validator score over completed jobs
    pub average_quality: f64,
}

impl MarketStats {
    pub fn collect(registered_agents: usize, active: &[JobPosting], completed: &[JobPosting]) -> Self {
        let disputed_jobs = active
            .iter()
            .filter(|job| job.status == JobStatus::Disputed)
            .count();

        let total_value = completed
            .iter()
            .filter_map(|job| job.final_price)
            .fold(Amount::zero(), Amount::saturating_add);

        let (average_job_value, average_quality) = if completed.is_empty() {
            (Amount::zero(), 0.0)
        } else {
            let count = completed.len() as u64;
            let quality_sum: u64 = completed
                .iter()
                .map(|job| u64::from(job.quality_score.unwrap_or(0)))
                .sum();
            (
                Amount::new(total_value.units() / count),
                quality_sum as f64 / count as f64,
            )
        };

        Self {
            registered_agents,
            active_jobs: active.len(),
            completed_jobs: completed.len(),
            disputed_jobs,
            total_value,
            average_job_value,
            average_quality,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agenthub_types::{AgentId, JobType};

    fn job(status: JobStatus, price: u64, score: u8) -> JobPosting {
        let mut job = JobPosting::new(
            AgentId::from("buyer"),
            "work",
            JobType::DataAnalysis,
            Amount::tokens(20),
        );
        job.status = status;
        job.final_price = Some(Amount::tokens(price));
        job.quality_score = Some(score);
        job
    }

    #[test]
    fn test_empty_stats() {
        let stats = MarketStats::collect(3, &[], &[]);
        assert_eq!(stats.registered_agents, 3);
        assert_eq!(stats.total_value, Amount::zero());
        assert_eq!(stats.average_quality, 0.0);
    }

    #[test]
    fn test_collect() {
        let active = vec![job(JobStatus::Disputed, 9, 40), job(JobStatus::Open, 0, 0)];
        let completed = vec![
            job(JobStatus::Completed, 10, 80),
            job(JobStatus::Completed, 7, 90),
        ];

        let stats = MarketStats::collect(3, &active, &completed);
        assert_eq!(stats.active_jobs, 2);
        assert_eq!(stats.disputed_jobs, 1);
        assert_eq!(stats.completed_jobs, 2);
        assert_eq!(stats.total_value, Amount::tokens(17));
        assert_eq!(stats.average_job_value, Amount::new(850));
        assert!((stats.average_quality - 85.0).abs() < 1e-9);
    }
}
