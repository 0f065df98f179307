//! Simulated marketplace agent

use agenthub_marketplace::{
    blend_reputation, Agent, CollaboratorError, WorkOutput, MAX_REPUTATION,
};
use agenthub_types::{AgentId, AgentRole, Amount, JobType};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::info;

/// Base price in tokens for a skill at full reputation
pub fn base_price(job_type: &JobType) -> f64 {
    match job_type {
        JobType::DataAnalysis => 10.0,
        JobType::ImageGeneration => 8.0,
        JobType::TextGeneration => 6.0,
        JobType::CodeReview => 12.0,
        JobType::Validation => 2.0,
        JobType::Other(_) => 5.0,
    }
}

#[derive(Debug)]
struct Wallet {
    balance: Amount,
    reputation: f64,
    jobs_completed: u32,
    jobs_failed: u32,
    jobs_requested: u32,
    total_earned: Amount,
    total_spent: Amount,
}

/// Point-in-time view of a simulated agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentProfile {
    pub id: AgentId,
    pub role: AgentRole,
    pub skills: Vec<JobType>,
    pub pricing: Vec<(JobType, Amount)>,
    pub balance: Amount,
    pub reputation: f64,
    pub jobs_completed: u32,
    pub jobs_failed: u32,
    pub jobs_requested: u32,
    pub total_earned: Amount,
    pub total_spent: Amount,
    pub completion_rate: f64,
}

/// An agent with a token wallet, priced skills and a reputation
///
/// Skill prices are fixed at construction from the starting reputation.
pub struct SimAgent {
    id: AgentId,
    role: AgentRole,
    skills: Vec<JobType>,
    pricing: Vec<(JobType, Amount)>,
    wallet: Mutex<Wallet>,
}

impl SimAgent {
    pub fn new(
        id: impl Into<AgentId>,
        role: AgentRole,
        skills: Vec<JobType>,
        initial_balance: Amount,
    ) -> Self {
        Self::with_reputation(id, role, skills, initial_balance, MAX_REPUTATION)
    }

    pub fn with_reputation(
        id: impl Into<AgentId>,
        role: AgentRole,
        skills: Vec<JobType>,
        initial_balance: Amount,
        reputation: f64,
    ) -> Self {
        let reputation = reputation.clamp(0.0, MAX_REPUTATION);
        let pricing = skills
            .iter()
            .map(|skill| {
                let price = base_price(skill) * reputation / MAX_REPUTATION;
                (skill.clone(), Amount::from_tokens_f64(price))
            })
            .collect();

        Self {
            id: id.into(),
            role,
            skills,
            pricing,
            wallet: Mutex::new(Wallet {
                balance: initial_balance,
                reputation,
                jobs_completed: 0,
                jobs_failed: 0,
                jobs_requested: 0,
                total_earned: Amount::zero(),
                total_spent: Amount::zero(),
            }),
        }
    }

    pub fn buyer(id: impl Into<AgentId>, initial_balance: Amount) -> Self {
        Self::new(id, AgentRole::Buyer, Vec::new(), initial_balance)
    }

    pub fn seller(id: impl Into<AgentId>, skills: Vec<JobType>, initial_balance: Amount) -> Self {
        Self::new(id, AgentRole::Seller, skills, initial_balance)
    }

    pub fn skills(&self) -> &[JobType] {
        &self.skills
    }

    pub fn pricing(&self) -> &[(JobType, Amount)] {
        &self.pricing
    }

    pub async fn profile(&self) -> AgentProfile {
        let wallet = self.wallet.lock().await;
        AgentProfile {
            id: self.id.clone(),
            role: self.role,
            skills: self.skills.clone(),
            pricing: self.pricing.clone(),
            balance: wallet.balance,
            reputation: wallet.reputation,
            jobs_completed: wallet.jobs_completed,
            jobs_failed: wallet.jobs_failed,
            jobs_requested: wallet.jobs_requested,
            total_earned: wallet.total_earned,
            total_spent: wallet.total_spent,
            completion_rate: completion_rate(wallet.jobs_completed, wallet.jobs_failed),
        }
    }

    fn canned_output(&self, description: &str) -> String {
        match self.skills.first() {
            Some(JobType::DataAnalysis) => {
                "Analysis complete: Dataset processed, key insights extracted. Correlation: 0.85"
                    .to_string()
            }
            Some(JobType::ImageGeneration) => format!(
                "Image generated: High-quality visual based on prompt '{}'",
                description
            ),
            Some(JobType::TextGeneration) => {
                "Content created: Professional text matching requirements".to_string()
            }
            Some(JobType::CodeReview) => {
                "Code review complete: 3 issues found, 5 improvements suggested".to_string()
            }
            Some(JobType::Validation) => {
                "Validation complete: Quality metrics calculated".to_string()
            }
            Some(JobType::Other(_)) | None => "Work completed successfully".to_string(),
        }
    }
}

fn completion_rate(completed: u32, failed: u32) -> f64 {
    let finished = completed + failed;
    if finished == 0 {
        1.0
    } else {
        f64::from(completed) / f64::from(finished)
    }
}

#[async_trait::async_trait]
impl Agent for SimAgent {
    fn id(&self) -> &AgentId {
        &self.id
    }

    fn role(&self) -> AgentRole {
        self.role
    }

    async fn balance(&self) -> Amount {
        self.wallet.lock().await.balance
    }

    async fn debit(&self, amount: Amount) -> bool {
        let mut wallet = self.wallet.lock().await;
        let Some(rest) = wallet.balance.checked_sub(amount) else {
            return false;
        };
        wallet.balance = rest;
        wallet.total_spent = wallet.total_spent.saturating_add(amount);
        wallet.jobs_requested += 1;
        true
    }

    async fn credit(&self, amount: Amount) {
        let mut wallet = self.wallet.lock().await;
        wallet.balance = wallet.balance.saturating_add(amount);
        wallet.total_earned = wallet.total_earned.saturating_add(amount);
        info!("{} received {} (balance {})", self.id, amount, wallet.balance);
    }

    async fn refund(&self, amount: Amount) {
        let mut wallet = self.wallet.lock().await;
        wallet.balance = wallet.balance.saturating_add(amount);
        wallet.total_spent = wallet.total_spent.saturating_sub(amount);
        wallet.jobs_requested = wallet.jobs_requested.saturating_sub(1);
    }

    async fn current_reputation(&self) -> f64 {
        self.wallet.lock().await.reputation
    }

    async fn completion_rate(&self) -> f64 {
        let wallet = self.wallet.lock().await;
        completion_rate(wallet.jobs_completed, wallet.jobs_failed)
    }

    fn has_skill(&self, job_type: &JobType) -> bool {
        self.skills.contains(job_type)
    }

    fn skill_price(&self, job_type: &JobType) -> Option<Amount> {
        self.pricing
            .iter()
            .find(|(skill, _)| skill == job_type)
            .map(|(_, price)| *price)
    }

    async fn perform_work(&self, description: &str) -> Result<WorkOutput, CollaboratorError> {
        Ok(WorkOutput::new(self.canned_output(description)))
    }

    async fn adjust_reputation(&self, sample: f64, weight: f64) -> f64 {
        let mut wallet = self.wallet.lock().await;
        wallet.reputation = blend_reputation(wallet.reputation, sample, weight);
        info!("{} reputation now {:.2}/5.00", self.id, wallet.reputation);
        wallet.reputation
    }

    async fn record_outcome(&self, completed: bool) {
        let mut wallet = self.wallet.lock().await;
        if completed {
            wallet.jobs_completed += 1;
        } else {
            wallet.jobs_failed += 1;
        }
    }
}
