//! Scripted collaborators for marketplace tests

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use agenthub_marketplace::{
    blend_reputation, Agent, Assessment, CollaboratorError, Ledger, MarketConfig, Marketplace,
    Validator, WorkOutput,
};
use agenthub_types::{AgentId, AgentRole, Amount, JobType};

/// How a scripted agent responds to `perform_work`
#[derive(Debug, Clone)]
pub enum Work {
    Deliver(String),
    DeliverAfter(Duration),
    Fail,
    Hang,
}

#[derive(Debug)]
struct Wallet {
    balance: Amount,
    reputation: f64,
    completed: u32,
    failed: u32,
}

pub struct ScriptedAgent {
    id: AgentId,
    role: AgentRole,
    skills: Vec<JobType>,
    price: Amount,
    work: Work,
    wallet: Mutex<Wallet>,
}

impl ScriptedAgent {
    pub fn buyer(id: &str, tokens: u64) -> Self {
        Self::new(id, AgentRole::Buyer, vec![], Amount::zero(), tokens)
    }

    pub fn seller(id: &str, skill: JobType, price_tokens: u64) -> Self {
        Self::new(
            id,
            AgentRole::Seller,
            vec![skill],
            Amount::tokens(price_tokens),
            0,
        )
    }

    pub fn new(id: &str, role: AgentRole, skills: Vec<JobType>, price: Amount, tokens: u64) -> Self {
        Self {
            id: AgentId::from(id),
            role,
            skills,
            price,
            work: Work::Deliver("analysis of the dataset with insights".to_string()),
            wallet: Mutex::new(Wallet {
                balance: Amount::tokens(tokens),
                reputation: 5.0,
                completed: 0,
                failed: 0,
            }),
        }
    }

    pub fn with_work(mut self, work: Work) -> Self {
        self.work = work;
        self
    }

    pub fn with_reputation(self, reputation: f64) -> Self {
        self.wallet.lock().unwrap().reputation = reputation;
        self
    }

    pub fn with_balance(self, balance: Amount) -> Self {
        self.wallet.lock().unwrap().balance = balance;
        self
    }

    pub fn reputation(&self) -> f64 {
        self.wallet.lock().unwrap().reputation
    }

    pub fn outcomes(&self) -> (u32, u32) {
        let wallet = self.wallet.lock().unwrap();
        (wallet.completed, wallet.failed)
    }

    pub fn balance_now(&self) -> Amount {
        self.wallet.lock().unwrap().balance
    }
}

#[async_trait::async_trait]
impl Agent for ScriptedAgent {
    fn id(&self) -> &AgentId {
        &self.id
    }

    fn role(&self) -> AgentRole {
        self.role
    }

    async fn balance(&self) -> Amount {
        self.balance_now()
    }

    async fn debit(&self, amount: Amount) -> bool {
        let mut wallet = self.wallet.lock().unwrap();
        match wallet.balance.checked_sub(amount) {
            Some(rest) => {
                wallet.balance = rest;
                true
            }
            None => false,
        }
    }

    async fn credit(&self, amount: Amount) {
        let mut wallet = self.wallet.lock().unwrap();
        wallet.balance = wallet.balance.saturating_add(amount);
    }

    async fn current_reputation(&self) -> f64 {
        self.reputation()
    }

    async fn completion_rate(&self) -> f64 {
        let (completed, failed) = self.outcomes();
        if completed + failed == 0 {
            1.0
        } else {
            f64::from(completed) / f64::from(completed + failed)
        }
    }

    fn has_skill(&self, job_type: &JobType) -> bool {
        self.skills.contains(job_type)
    }

    fn skill_price(&self, job_type: &JobType) -> Option<Amount> {
        self.has_skill(job_type).then_some(self.price)
    }

    async fn perform_work(&self, description: &str) -> Result<WorkOutput, CollaboratorError> {
        match &self.work {
            Work::Deliver(content) => Ok(WorkOutput::new(content.clone())),
            Work::DeliverAfter(delay) => {
                tokio::time::sleep(*delay).await;
                Ok(WorkOutput::new(format!("delivered: {}", description)))
            }
            Work::Fail => Err(CollaboratorError::Failed {
                collaborator: self.id.to_string(),
                message: "worker crashed".to_string(),
            }),
            Work::Hang => std::future::pending().await,
        }
    }

    async fn adjust_reputation(&self, sample: f64, weight: f64) -> f64 {
        let mut wallet = self.wallet.lock().unwrap();
        wallet.reputation = blend_reputation(wallet.reputation, sample, weight);
        wallet.reputation
    }

    async fn record_outcome(&self, completed: bool) {
        let mut wallet = self.wallet.lock().unwrap();
        if completed {
            wallet.completed += 1;
        } else {
            wallet.failed += 1;
        }
    }
}

/// How a scripted validator responds
#[derive(Debug, Clone)]
pub enum Verdict {
    Score(u8),
    Fail,
    Hang,
}

pub struct ScriptedValidator {
    id: AgentId,
    verdicts: Mutex<Vec<Verdict>>,
    fallback: Verdict,
}

impl ScriptedValidator {
    /// Always answer with `verdict`
    pub fn always(verdict: Verdict) -> Self {
        Self {
            id: AgentId::from("ValidatorAgent"),
            verdicts: Mutex::new(Vec::new()),
            fallback: verdict,
        }
    }

    /// Answer with `verdicts` in order, then with the last one
    pub fn sequence(verdicts: Vec<Verdict>) -> Self {
        let fallback = verdicts.last().cloned().unwrap_or(Verdict::Score(100));
        let mut queue = verdicts;
        queue.reverse();
        Self {
            id: AgentId::from("ValidatorAgent"),
            verdicts: Mutex::new(queue),
            fallback,
        }
    }
}

#[async_trait::async_trait]
impl Validator for ScriptedValidator {
    fn id(&self) -> &AgentId {
        &self.id
    }

    async fn validate(
        &self,
        _description: &str,
        _output: &WorkOutput,
        _job_type: &JobType,
    ) -> Result<Assessment, CollaboratorError> {
        let verdict = self
            .verdicts
            .lock()
            .unwrap()
            .pop()
            .unwrap_or_else(|| self.fallback.clone());

        match verdict {
            Verdict::Score(score) => Ok(Assessment {
                score,
                confidence: 0.9,
            }),
            Verdict::Fail => Err(CollaboratorError::Failed {
                collaborator: self.id.to_string(),
                message: "model unavailable".to_string(),
            }),
            Verdict::Hang => std::future::pending().await,
        }
    }
}

pub fn market(validator: ScriptedValidator, config: MarketConfig) -> Marketplace {
    Marketplace::new(Ledger::new(), Arc::new(validator), config)
}

pub async fn register(market: &Marketplace, agent: ScriptedAgent) -> Arc<ScriptedAgent> {
    let agent = Arc::new(agent);
    market.register_agent(agent.clone()).await.unwrap();
    agent
}
