//! Marketplace orchestration
//!
//! Drives a job through `post -> collect bids -> select winner -> execute`.
//! Execution debits the buyer, escrows the price, asks the winning agent for
//! work, asks the validator for a score, and lets the escrow contract decide
//! whether the seller gets paid.

use std::future::Future;
use std::sync::Arc;

use agenthub_escrow::{
    ContractStatus, EscrowError, EscrowManager, InMemoryEscrowManager, SettlementOutcome,
    MAX_QUALITY_SCORE,
};
use agenthub_ledger::Ledger;
use agenthub_types::{AgentId, AgentRole, Amount, ContractId, JobId, JobType};
use dashmap::{DashMap, DashSet};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::bid::{Bid, BidSelector};
use crate::collaborator::{reputation_sample, Agent, Assessment, Validator};
use crate::config::{DisputePolicy, MarketConfig};
use crate::error::{CollaboratorError, MarketError, Result};
use crate::job::{JobOutcome, JobPosting, JobStatus};
use crate::stats::MarketStats;

#[derive(Default)]
struct JobBook {
    active: Vec<JobPosting>,
    completed: Vec<JobPosting>,
}

impl JobBook {
    fn find(&self, job_id: &JobId) -> Option<&JobPosting> {
        self.active
            .iter()
            .chain(self.completed.iter())
            .find(|job| &job.id == job_id)
    }

    fn active_mut(&mut self, job_id: &JobId) -> Option<&mut JobPosting> {
        self.active.iter_mut().find(|job| &job.id == job_id)
    }
}

/// Marks a job as executing until dropped
struct ExecutionClaim<'a> {
    in_flight: &'a DashSet<JobId>,
    job_id: JobId,
}

impl<'a> ExecutionClaim<'a> {
    fn acquire(in_flight: &'a DashSet<JobId>, job_id: &JobId) -> Result<Self> {
        if !in_flight.insert(job_id.clone()) {
            return Err(MarketError::ExecutionInProgress {
                job_id: job_id.to_string(),
            });
        }
        Ok(Self {
            in_flight,
            job_id: job_id.clone(),
        })
    }
}

impl Drop for ExecutionClaim<'_> {
    fn drop(&mut self) {
        self.in_flight.remove(&self.job_id);
    }
}

/// Await a collaborator call, failing it once the timeout elapses
async fn bounded<T, F>(
    collaborator: &AgentId,
    timeout: std::time::Duration,
    call: F,
) -> std::result::Result<T, CollaboratorError>
where
    F: Future<Output = std::result::Result<T, CollaboratorError>>,
{
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result,
        Err(_) => Err(CollaboratorError::TimedOut {
            collaborator: collaborator.to_string(),
            after_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        }),
    }
}

/// The agent service marketplace
pub struct Marketplace {
    config: MarketConfig,
    selector: BidSelector,
    ledger: Ledger,
    escrow: Arc<dyn EscrowManager>,
    validator: Arc<dyn Validator>,
    agents: RwLock<Vec<Arc<dyn Agent>>>,
    jobs: RwLock<JobBook>,
    in_flight: DashSet<JobId>,
    buyer_locks: DashMap<AgentId, Arc<Mutex<()>>>,
}

impl Marketplace {
    /// Create a marketplace settling through an in-memory escrow on `ledger`
    pub fn new(ledger: Ledger, validator: Arc<dyn Validator>, config: MarketConfig) -> Self {
        let escrow = Arc::new(InMemoryEscrowManager::with_threshold(
            ledger.clone(),
            config.quality_threshold,
        ));
        Self::with_escrow(ledger, escrow, validator, config)
    }

    /// Create a marketplace around an existing escrow manager
    ///
    /// `escrow` must record into `ledger`.
    pub fn with_escrow(
        ledger: Ledger,
        escrow: Arc<dyn EscrowManager>,
        validator: Arc<dyn Validator>,
        config: MarketConfig,
    ) -> Self {
        Self {
            selector: config.bid_weights,
            config,
            ledger,
            escrow,
            validator,
            agents: RwLock::new(Vec::new()),
            jobs: RwLock::new(JobBook::default()),
            in_flight: DashSet::new(),
            buyer_locks: DashMap::new(),
        }
    }

    pub fn config(&self) -> &MarketConfig {
        &self.config
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn escrow(&self) -> &dyn EscrowManager {
        self.escrow.as_ref()
    }

    pub fn validator(&self) -> &dyn Validator {
        self.validator.as_ref()
    }

    /// Register an agent; registration order is bid order
    pub async fn register_agent(&self, agent: Arc<dyn Agent>) -> Result<()> {
        let mut agents = self.agents.write().await;
        if agents.iter().any(|a| a.id() == agent.id()) {
            warn!("Registration rejected: {} already registered", agent.id());
            return Err(MarketError::AgentAlreadyRegistered {
                agent_id: agent.id().to_string(),
            });
        }
        info!("{} registered as {}", agent.id(), agent.role());
        agents.push(agent);
        Ok(())
    }

    /// Registered agents in registration order
    pub async fn agents(&self) -> Vec<Arc<dyn Agent>> {
        self.agents.read().await.clone()
    }

    pub async fn agent(&self, agent_id: &AgentId) -> Option<Arc<dyn Agent>> {
        self.agents
            .read()
            .await
            .iter()
            .find(|a| a.id() == agent_id)
            .cloned()
    }

    async fn require_agent(&self, agent_id: &AgentId) -> Result<Arc<dyn Agent>> {
        self.agent(agent_id)
            .await
            .ok_or_else(|| MarketError::AgentNotFound {
                agent_id: agent_id.to_string(),
            })
    }

    /// Post a job; the poster must be able to cover the budget
    pub async fn post_job(
        &self,
        poster: &AgentId,
        description: &str,
        job_type: JobType,
        budget: Amount,
    ) -> Result<JobId> {
        let agent = self.require_agent(poster).await?;

        if budget.is_zero() {
            return Err(MarketError::InvalidBudget {
                message: "Budget must be greater than zero".to_string(),
            });
        }

        let available = agent.balance().await;
        if available < budget {
            warn!(
                "Job rejected: {} has {} but budget is {}",
                poster, available, budget
            );
            return Err(MarketError::InsufficientFunds {
                agent_id: poster.to_string(),
                required: budget,
                available,
            });
        }

        let mut job = JobPosting::new(poster.clone(), description, job_type, budget);
        let mut jobs = self.jobs.write().await;
        while jobs.find(&job.id).is_some() {
            job.id = JobId::new();
        }
        let job_id = job.id.clone();
        info!(
            "{} posted {} ({}, budget {}): {}",
            poster, job_id, job.job_type, budget, job.description
        );

        jobs.active.push(job);
        Ok(job_id)
    }

    pub async fn job(&self, job_id: &JobId) -> Option<JobPosting> {
        self.jobs.read().await.find(job_id).cloned()
    }

    /// Jobs not yet completed, in posting order
    pub async fn active_jobs(&self) -> Vec<JobPosting> {
        self.jobs.read().await.active.clone()
    }

    /// Completed jobs, in completion order
    pub async fn completed_jobs(&self) -> Vec<JobPosting> {
        self.jobs.read().await.completed.clone()
    }

    async fn open_job(&self, job_id: &JobId) -> Result<JobPosting> {
        let job = self.job(job_id).await.ok_or_else(|| MarketError::JobNotFound {
            job_id: job_id.to_string(),
        })?;
        if job.status != JobStatus::Open {
            return Err(MarketError::JobNotOpen {
                job_id: job_id.to_string(),
                status: job.status.to_string(),
            });
        }
        Ok(job)
    }

    /// Ask every seller except the poster to bid, replacing the job's bids
    pub async fn collect_bids(&self, job_id: &JobId) -> Result<Vec<Bid>> {
        let job = self.open_job(job_id).await?;

        let mut bids = Vec::new();
        for agent in self.agents().await {
            if agent.id() == &job.poster || agent.role() != AgentRole::Seller {
                continue;
            }
            if let Some(bid) = agent.bid(&job).await {
                debug!(
                    "{} bid {} on {} (reputation {:.2})",
                    bid.bidder, bid.amount, job_id, bid.reputation_at_bid_time
                );
                bids.push(bid);
            }
        }

        let mut jobs = self.jobs.write().await;
        let job = jobs
            .active_mut(job_id)
            .ok_or_else(|| MarketError::JobNotFound {
                job_id: job_id.to_string(),
            })?;
        if job.status != JobStatus::Open {
            return Err(MarketError::JobNotOpen {
                job_id: job_id.to_string(),
                status: job.status.to_string(),
            });
        }
        job.bids = bids.clone();

        info!("Collected {} bid(s) for {}", bids.len(), job_id);
        Ok(bids)
    }

    /// Pick the best bid and assign the job to its bidder
    pub async fn select_winner(&self, job_id: &JobId) -> Result<Bid> {
        let mut jobs = self.jobs.write().await;
        let job = jobs
            .active_mut(job_id)
            .ok_or_else(|| MarketError::JobNotFound {
                job_id: job_id.to_string(),
            })?;
        if job.status != JobStatus::Open {
            return Err(MarketError::JobNotOpen {
                job_id: job_id.to_string(),
                status: job.status.to_string(),
            });
        }

        let winner = match self.selector.select_winner(job) {
            Some(bid) => bid.clone(),
            None => {
                warn!("No bids to select from for {}", job_id);
                return Err(MarketError::NoBids {
                    job_id: job_id.to_string(),
                });
            }
        };

        job.winner = Some(winner.bidder.clone());
        job.final_price = Some(winner.amount);
        job.status = JobStatus::Assigned;

        info!(
            "{} assigned to {} for {} (score {:.2})",
            job_id,
            winner.bidder,
            winner.amount,
            self.selector.score(&winner, job)
        );
        Ok(winner)
    }

    /// Debit the buyer and escrow the price as one step per buyer
    async fn fund_escrow(
        &self,
        job: &JobPosting,
        buyer: &dyn Agent,
        seller: &AgentId,
        price: Amount,
    ) -> Result<ContractId> {
        let lock = self.buyer_locks.entry(buyer.id().clone()).or_default().clone();
        let _guard = lock.lock().await;

        if !buyer.debit(price).await {
            let available = buyer.balance().await;
            warn!(
                "Execution of {} aborted: {} has {} but owes {}",
                job.id,
                buyer.id(),
                available,
                price
            );
            return Err(MarketError::InsufficientFunds {
                agent_id: buyer.id().to_string(),
                required: price,
                available,
            });
        }

        match self
            .escrow
            .create(buyer.id(), seller, &job.description, price)
            .await
        {
            Ok(contract_id) => Ok(contract_id),
            Err(e) => {
                buyer.refund(price).await;
                warn!(
                    "Escrow for {} failed, {} returned to {}: {}",
                    job.id,
                    price,
                    buyer.id(),
                    e
                );
                Err(e.into())
            }
        }
    }

    async fn produce_and_assess(
        &self,
        job: &JobPosting,
        seller: &dyn Agent,
    ) -> std::result::Result<Assessment, CollaboratorError> {
        let timeout = self.config.collaborator_timeout;

        let output = bounded(seller.id(), timeout, seller.perform_work(&job.description)).await?;
        debug!("{} delivered work for {}: {}", seller.id(), job.id, output.as_str());

        let assessment = bounded(
            self.validator.id(),
            timeout,
            self.validator
                .validate(&job.description, &output, &job.job_type),
        )
        .await?;

        if assessment.score > MAX_QUALITY_SCORE {
            return Err(CollaboratorError::Failed {
                collaborator: self.validator.id().to_string(),
                message: format!("score {} is outside 0..=100", assessment.score),
            });
        }
        Ok(assessment)
    }

    /// Run an assigned job through escrow, work, validation and settlement
    ///
    /// A job is funded at most once. If a step after funding fails, the job
    /// stays Assigned with its contract recorded, and calling this again
    /// settles that same contract instead of debiting the buyer again.
    pub async fn execute_job(&self, job_id: &JobId) -> Result<JobOutcome> {
        let _claim = ExecutionClaim::acquire(&self.in_flight, job_id)?;

        let job = self.job(job_id).await.ok_or_else(|| MarketError::JobNotFound {
            job_id: job_id.to_string(),
        })?;
        let (seller_id, price) = match (&job.status, &job.winner, job.final_price) {
            (JobStatus::Assigned, Some(winner), Some(price)) => (winner.clone(), price),
            _ => {
                return Err(MarketError::JobNotAssigned {
                    job_id: job_id.to_string(),
                    status: job.status.to_string(),
                })
            }
        };

        let buyer = self.require_agent(&job.poster).await?;
        let seller = self.require_agent(&seller_id).await?;

        let contract_id = match &job.contract_id {
            Some(contract_id) => {
                info!("Resuming {} on {}", job_id, contract_id);
                contract_id.clone()
            }
            None => {
                let contract_id = self
                    .fund_escrow(&job, buyer.as_ref(), &seller_id, price)
                    .await?;
                self.update_job(job_id, |job| job.contract_id = Some(contract_id.clone()))
                    .await;
                contract_id
            }
        };

        let (quality_score, confidence) = match (job.quality_score, job.confidence) {
            (Some(score), Some(confidence)) => (score, confidence),
            _ => {
                let (score, confidence) =
                    match self.produce_and_assess(&job, seller.as_ref()).await {
                        Ok(assessment) => (assessment.score, assessment.confidence),
                        Err(e) => {
                            warn!("Collaborator failure on {}, disputing: {}", job_id, e);
                            (0, 0.0)
                        }
                    };
                self.update_job(job_id, |job| {
                    job.quality_score = Some(score);
                    job.confidence = Some(confidence);
                })
                .await;
                (score, confidence)
            }
        };

        let contract = self.escrow.contract(&contract_id).await.ok_or_else(|| {
            EscrowError::ContractNotFound {
                contract_id: contract_id.to_string(),
            }
        })?;

        let outcome = match contract.status {
            ContractStatus::Escrowed => {
                let outcome = self
                    .escrow
                    .validate_and_release(&contract_id, quality_score, self.validator.id())
                    .await?;
                self.apply_settlement(seller.as_ref(), outcome, quality_score, price)
                    .await;
                outcome
            }
            ContractStatus::Completed => SettlementOutcome::Released,
            ContractStatus::Disputed => SettlementOutcome::Disputed,
        };

        let status = match outcome {
            SettlementOutcome::Released => {
                self.finish_job(job_id, JobStatus::Completed).await;
                info!(
                    "{} completed: {} paid {} (score {})",
                    job_id, seller_id, price, quality_score
                );
                ContractStatus::Completed
            }
            SettlementOutcome::Disputed => {
                if self.config.dispute_policy == DisputePolicy::Refund && !contract.is_refunded() {
                    self.escrow.refund(&contract_id).await?;
                    buyer.refund(price).await;
                    info!("{} refunded to {} for {}", price, job.poster, job_id);
                }
                self.finish_job(job_id, JobStatus::Disputed).await;
                warn!(
                    "{} disputed: score {}, payment to {} withheld",
                    job_id, quality_score, seller_id
                );
                ContractStatus::Disputed
            }
        };

        Ok(JobOutcome {
            job_id: job_id.clone(),
            contract_id,
            status,
            quality_score,
            confidence,
            price,
        })
    }

    /// Seller-side effects of the settlement this call performed
    async fn apply_settlement(
        &self,
        seller: &dyn Agent,
        outcome: SettlementOutcome,
        quality_score: u8,
        price: Amount,
    ) {
        if outcome.is_released() {
            seller.credit(price).await;
            let reputation = seller
                .adjust_reputation(
                    reputation_sample(quality_score),
                    self.config.reputation_weight,
                )
                .await;
            seller.record_outcome(true).await;
            debug!("{} reputation now {:.2}", seller.id(), reputation);
        } else {
            seller.record_outcome(false).await;
        }
    }

    async fn update_job(&self, job_id: &JobId, apply: impl FnOnce(&mut JobPosting)) {
        if let Some(job) = self.jobs.write().await.active_mut(job_id) {
            apply(job);
        }
    }

    async fn finish_job(&self, job_id: &JobId, status: JobStatus) {
        let mut jobs = self.jobs.write().await;
        let Some(position) = jobs.active.iter().position(|job| &job.id == job_id) else {
            return;
        };

        jobs.active[position].status = status;
        if status == JobStatus::Completed {
            let job = jobs.active.remove(position);
            jobs.completed.push(job);
        }
    }

    /// Post, collect bids, select and execute, stopping at the first failure
    pub async fn run_full_job_cycle(
        &self,
        poster: &AgentId,
        description: &str,
        job_type: JobType,
        budget: Amount,
    ) -> Result<JobOutcome> {
        let job_id = self.post_job(poster, description, job_type, budget).await?;

        let bids = self.collect_bids(&job_id).await?;
        if bids.is_empty() {
            warn!("No bids received for {}", job_id);
            return Err(MarketError::NoBids {
                job_id: job_id.to_string(),
            });
        }

        self.select_winner(&job_id).await?;
        self.execute_job(&job_id).await
    }

    pub async fn stats(&self) -> MarketStats {
        let registered = self.agents.read().await.len();
        let jobs = self.jobs.read().await;
        MarketStats::collect(registered, &jobs.active, &jobs.completed)
    }
}
