//! Bids and reputation-weighted bid selection

use agenthub_types::{AgentId, Amount};
use serde::{Deserialize, Serialize};

use crate::collaborator::MAX_REPUTATION;
use crate::job::JobPosting;

/// An immutable snapshot of one agent's offer on a job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bid {
    pub bidder: AgentId,
    pub amount: Amount,
    pub reputation_at_bid_time: f64,
    pub completion_rate_at_bid_time: f64,
}

/// Amount an agent asking `price` offers on a job with `budget`
///
/// `min(price, budget - 1 token)`, or None when that is not positive.
pub fn propose_amount(price: Amount, budget: Amount) -> Option<Amount> {
    let ceiling = budget.checked_sub(Amount::one_token())?;
    let amount = price.min(ceiling);
    amount.is_positive().then_some(amount)
}

/// Scores bids by reputation and price competitiveness
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BidSelector {
    pub reputation_weight: f64,
    pub price_weight: f64,
}

impl Default for BidSelector {
    fn default() -> Self {
        Self {
            reputation_weight: 0.6,
            price_weight: 0.4,
        }
    }
}

impl BidSelector {
    pub fn new(reputation_weight: f64, price_weight: f64) -> Self {
        Self {
            reputation_weight,
            price_weight,
        }
    }

    /// Weighted score of `bid` against `job`; higher is better
    ///
    /// Sub-scores are not clamped, so an over-budget bid scores a negative
    /// price component.
    pub fn score(&self, bid: &Bid, job: &JobPosting) -> f64 {
        let price_score = if job.budget.is_zero() {
            0.0
        } else {
            1.0 - bid.amount.units() as f64 / job.budget.units() as f64
        };
        let reputation_score = bid.reputation_at_bid_time / MAX_REPUTATION;

        self.reputation_weight * reputation_score + self.price_weight * price_score
    }

    /// Bid with the strictly greatest score, scanning in bid order
    ///
    /// Ties go to the earliest bid.
    pub fn select_winner<'a>(&self, job: &'a JobPosting) -> Option<&'a Bid> {
        let mut best: Option<(&Bid, f64)> = None;
        for bid in &job.bids {
            let score = self.score(bid, job);
            match best {
                Some((_, best_score)) if score <= best_score => {}
                _ => best = Some((bid, score)),
            }
        }
        best.map(|(bid, _)| bid)
    }

    /// Every bid with its score, best first; ties keep bid order
    pub fn rank(&self, job: &JobPosting) -> Vec<(Bid, f64)> {
        let mut ranked: Vec<(Bid, f64)> = job
            .bids
            .iter()
            .map(|bid| (bid.clone(), self.score(bid, job)))
            .collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        ranked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agenthub_types::JobType;

    fn job_with(budget: u64, bids: Vec<Bid>) -> JobPosting {
        let mut job = JobPosting::new(
            AgentId::from("ResearchBot"),
            "Analyze survey data",
            JobType::DataAnalysis,
            Amount::tokens(budget),
        );
        job.bids = bids;
        job
    }

    fn bid(bidder: &str, amount: Amount, reputation: f64) -> Bid {
        Bid {
            bidder: AgentId::from(bidder),
            amount,
            reputation_at_bid_time: reputation,
            completion_rate_at_bid_time: 1.0,
        }
    }

    #[test]
    fn test_propose_amount_uses_skill_price_under_budget() {
        // budget 15, price 10 -> min(10, 14) = 10
        assert_eq!(
            propose_amount(Amount::tokens(10), Amount::tokens(15)),
            Some(Amount::tokens(10))
        );
    }

    #[test]
    fn test_propose_amount_capped_below_budget() {
        assert_eq!(
            propose_amount(Amount::tokens(10), Amount::tokens(8)),
            Some(Amount::tokens(7))
        );
    }

    #[test]
    fn test_propose_amount_declines_tiny_budgets() {
        assert_eq!(propose_amount(Amount::tokens(10), Amount::tokens(1)), None);
        assert_eq!(propose_amount(Amount::tokens(10), Amount::new(50)), None);
        assert_eq!(propose_amount(Amount::zero(), Amount::tokens(10)), None);
    }

    #[test]
    fn test_score_formula() {
        let selector = BidSelector::default();
        let job = job_with(15, vec![]);
        let b = bid("a", Amount::tokens(10), 5.0);

        // 0.6 * 1.0 + 0.4 * (1 - 10/15)
        let expected = 0.6 + 0.4 * (1.0 - 10.0 / 15.0);
        assert!((selector.score(&b, &job) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_over_budget_bid_scores_negative_price() {
        let selector = BidSelector::new(0.0, 1.0);
        let job = job_with(10, vec![]);
        let b = bid("a", Amount::tokens(20), 5.0);
        assert!(selector.score(&b, &job) < 0.0);
    }

    #[test]
    fn test_select_winner_prefers_higher_score() {
        let selector = BidSelector::default();
        let job = job_with(
            15,
            vec![
                bid("Expensive", Amount::tokens(14), 4.0),
                bid("Cheap", Amount::tokens(8), 4.0),
            ],
        );
        assert_eq!(
            selector.select_winner(&job).map(|b| b.bidder.as_str()),
            Some("Cheap")
        );
    }

    #[test]
    fn test_select_winner_tie_goes_to_first_bid() {
        let selector = BidSelector::default();
        let job = job_with(
            15,
            vec![
                bid("First", Amount::tokens(10), 5.0),
                bid("Second", Amount::tokens(10), 5.0),
            ],
        );
        assert_eq!(
            selector.select_winner(&job).map(|b| b.bidder.as_str()),
            Some("First")
        );
    }

    #[test]
    fn test_select_winner_without_bids() {
        let selector = BidSelector::default();
        assert!(selector.select_winner(&job_with(15, vec![])).is_none());
    }

    #[test]
    fn test_rank_orders_best_first_and_keeps_ties_stable() {
        let selector = BidSelector::default();
        let job = job_with(
            15,
            vec![
                bid("Low", Amount::tokens(14), 2.0),
                bid("TieA", Amount::tokens(10), 5.0),
                bid("TieB", Amount::tokens(10), 5.0),
            ],
        );

        let ranked: Vec<String> = selector
            .rank(&job)
            .into_iter()
            .map(|(b, _)| b.bidder.to_string())
            .collect();
        assert_eq!(ranked, vec!["TieA", "TieB", "Low"]);
    }
}
