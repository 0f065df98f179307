//! AgentHub Escrow - Quality-gated payment contracts
//!
//! Every assigned job is backed by one escrow contract. The buyer is debited
//! before the contract exists; the contract only records the commitment and
//! decides, from the validator's score, whether the funds go to the seller.
//!
//! Lifecycle:
//!
//! ```text
//! Escrowed --(score >= threshold)--> Completed
//! Escrowed --(score <  threshold)--> Disputed [--refund--> Disputed + refunded_at]
//! ```
//!
//! Each transition is mirrored by exactly one ledger block. Settled contracts,
//! Completed or Disputed, leave the active set for history and are never
//! validated again.

use std::collections::HashMap;
use std::sync::Arc;

use agenthub_ledger::{Ledger, LedgerError, Payload};
use agenthub_types::{AgentId, Amount, ContractId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Minimum validator score that releases payment
pub const DEFAULT_QUALITY_THRESHOLD: u8 = 70;

/// Highest score a validator can award
pub const MAX_QUALITY_SCORE: u8 = 100;

/// Errors that can occur in escrow operations
#[derive(Error, Debug)]
pub enum EscrowError {
    #[error("Contract {contract_id} not found")]
    ContractNotFound { contract_id: String },

    #[error("Quality score {score} is outside 0..=100")]
    InvalidQualityScore { score: u8 },

    #[error("Invalid amount: {message}")]
    InvalidAmount { message: String },

    #[error("Contract {contract_id} cannot be refunded: {reason}")]
    NotRefundable { contract_id: String, reason: String },

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

pub type Result<T> = std::result::Result<T, EscrowError>;

/// State of an escrow contract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractStatus {
    /// Buyer funds are held pending validation
    Escrowed,
    /// Validation passed, payment released to the seller
    Completed,
    /// Validation failed, payment withheld
    Disputed,
}

impl ContractStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Disputed)
    }
}

/// An escrow contract between a buyer and a seller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowContract {
    pub id: ContractId,
    pub buyer: AgentId,
    pub seller: AgentId,
    pub description: String,
    pub amount: Amount,
    pub status: ContractStatus,
    pub quality_score: Option<u8>,
    pub validator: Option<AgentId>,
    pub created_at: DateTime<Utc>,
    pub validated_at: Option<DateTime<Utc>>,
    pub refunded_at: Option<DateTime<Utc>>,
}

impl EscrowContract {
    pub fn is_refunded(&self) -> bool {
        self.refunded_at.is_some()
    }
}

/// Result of validating an escrowed contract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettlementOutcome {
    /// Payment released; the caller must now credit the seller
    Released,
    /// Payment withheld; the contract is Disputed
    Disputed,
}

impl SettlementOutcome {
    pub fn is_released(&self) -> bool {
        matches!(self, Self::Released)
    }
}

/// Escrow manager trait
#[async_trait::async_trait]
pub trait EscrowManager: Send + Sync {
    /// Record a new escrow for funds the caller has already debited
    async fn create(
        &self,
        buyer: &AgentId,
        seller: &AgentId,
        description: &str,
        amount: Amount,
    ) -> Result<ContractId>;

    /// Apply a validator score and settle the contract
    async fn validate_and_release(
        &self,
        contract_id: &ContractId,
        quality_score: u8,
        validator: &AgentId,
    ) -> Result<SettlementOutcome>;

    /// Mark a disputed contract as refunded; the caller returns the funds
    async fn refund(&self, contract_id: &ContractId) -> Result<EscrowContract>;

    /// Look up a contract in the active set, then in history
    async fn contract(&self, contract_id: &ContractId) -> Option<EscrowContract>;

    /// Contracts still awaiting validation, oldest first
    async fn active_contracts(&self) -> Vec<EscrowContract>;

    /// Settled contracts with status Completed
    async fn completed_contracts(&self) -> Vec<EscrowContract>;

    /// Settled contracts with status Disputed
    async fn disputed_contracts(&self) -> Vec<EscrowContract>;

    /// Score at or above which payment is released
    fn quality_threshold(&self) -> u8;
}

#[derive(Default)]
struct ContractBook {
    active: HashMap<ContractId, EscrowContract>,
    history: Vec<EscrowContract>,
}

impl ContractBook {
    fn contains(&self, contract_id: &ContractId) -> bool {
        self.active.contains_key(contract_id) || self.history.iter().any(|c| &c.id == contract_id)
    }

    /// A contract id not yet used by any active or settled contract
    fn fresh_id(&self) -> ContractId {
        let mut id = ContractId::new();
        while self.contains(&id) {
            id = ContractId::new();
        }
        id
    }
}

/// In-memory escrow manager backed by a shared [`Ledger`]
pub struct InMemoryEscrowManager {
    ledger: Ledger,
    quality_threshold: u8,
    book: Arc<RwLock<ContractBook>>,
}

impl InMemoryEscrowManager {
    pub fn new(ledger: Ledger) -> Self {
        Self::with_threshold(ledger, DEFAULT_QUALITY_THRESHOLD)
    }

    pub fn with_threshold(ledger: Ledger, quality_threshold: u8) -> Self {
        Self {
            ledger,
            quality_threshold: quality_threshold.min(MAX_QUALITY_SCORE),
            book: Arc::new(RwLock::new(ContractBook::default())),
        }
    }

    /// The ledger this manager records into
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    async fn history_with(&self, status: ContractStatus) -> Vec<EscrowContract> {
        let book = self.book.read().await;
        book.history
            .iter()
            .filter(|c| c.status == status)
            .cloned()
            .collect()
    }
}

#[async_trait::async_trait]
impl EscrowManager for InMemoryEscrowManager {
    async fn create(
        &self,
        buyer: &AgentId,
        seller: &AgentId,
        description: &str,
        amount: Amount,
    ) -> Result<ContractId> {
        if amount.is_zero() {
            return Err(EscrowError::InvalidAmount {
                message: "Escrow amount must be greater than zero".to_string(),
            });
        }

        // The contract becomes visible only once its block is on the chain.
        let mut book = self.book.write().await;
        let contract = EscrowContract {
            id: book.fresh_id(),
            buyer: buyer.clone(),
            seller: seller.clone(),
            description: description.to_string(),
            amount,
            status: ContractStatus::Escrowed,
            quality_score: None,
            validator: None,
            created_at: Utc::now(),
            validated_at: None,
            refunded_at: None,
        };

        self.ledger
            .append(Payload::ContractCreated {
                contract_id: contract.id.clone(),
                buyer: contract.buyer.clone(),
                seller: contract.seller.clone(),
                amount,
                description: contract.description.clone(),
            })
            .await?;

        info!(
            "Contract {} created: {} -> {} for {} (escrowed)",
            contract.id, contract.buyer, contract.seller, amount
        );

        let id = contract.id.clone();
        book.active.insert(id.clone(), contract);
        Ok(id)
    }

    async fn validate_and_release(
        &self,
        contract_id: &ContractId,
        quality_score: u8,
        validator: &AgentId,
    ) -> Result<SettlementOutcome> {
        if quality_score > MAX_QUALITY_SCORE {
            return Err(EscrowError::InvalidQualityScore {
                score: quality_score,
            });
        }

        let mut book = self.book.write().await;
        let mut contract = match book.active.get(contract_id) {
            Some(contract) => contract.clone(),
            None => {
                warn!("Validation rejected: contract {} not found", contract_id);
                return Err(EscrowError::ContractNotFound {
                    contract_id: contract_id.to_string(),
                });
            }
        };

        contract.quality_score = Some(quality_score);
        contract.validator = Some(validator.clone());
        contract.validated_at = Some(Utc::now());

        let outcome = if quality_score >= self.quality_threshold {
            contract.status = ContractStatus::Completed;
            self.ledger
                .append(Payload::PaymentReleased {
                    contract_id: contract.id.clone(),
                    buyer: contract.buyer.clone(),
                    seller: contract.seller.clone(),
                    amount: contract.amount,
                    quality_score,
                    validator: validator.clone(),
                })
                .await?;
            info!(
                "Contract {} completed: score {}/{} >= {}, {} released to {}",
                contract.id,
                quality_score,
                MAX_QUALITY_SCORE,
                self.quality_threshold,
                contract.amount,
                contract.seller
            );
            SettlementOutcome::Released
        } else {
            contract.status = ContractStatus::Disputed;
            self.ledger
                .append(Payload::PaymentDisputed {
                    contract_id: contract.id.clone(),
                    buyer: contract.buyer.clone(),
                    seller: contract.seller.clone(),
                    amount: contract.amount,
                    quality_score,
                    validator: validator.clone(),
                })
                .await?;
            warn!(
                "Contract {} disputed: score {}/{} below threshold {}, payment withheld",
                contract.id, quality_score, MAX_QUALITY_SCORE, self.quality_threshold
            );
            SettlementOutcome::Disputed
        };

        book.active.remove(contract_id);
        book.history.push(contract);
        Ok(outcome)
    }

    async fn refund(&self, contract_id: &ContractId) -> Result<EscrowContract> {
        let mut book = self.book.write().await;

        let position = book
            .history
            .iter()
            .position(|c| &c.id == contract_id)
            .ok_or_else(|| {
                if book.active.contains_key(contract_id) {
                    EscrowError::NotRefundable {
                        contract_id: contract_id.to_string(),
                        reason: "contract has not been validated".to_string(),
                    }
                } else {
                    EscrowError::ContractNotFound {
                        contract_id: contract_id.to_string(),
                    }
                }
            })?;

        let contract = &book.history[position];
        if contract.status != ContractStatus::Disputed {
            return Err(EscrowError::NotRefundable {
                contract_id: contract_id.to_string(),
                reason: "payment was released".to_string(),
            });
        }
        if contract.is_refunded() {
            return Err(EscrowError::NotRefundable {
                contract_id: contract_id.to_string(),
                reason: "already refunded".to_string(),
            });
        }

        self.ledger
            .append(Payload::PaymentRefunded {
                contract_id: contract.id.clone(),
                buyer: contract.buyer.clone(),
                seller: contract.seller.clone(),
                amount: contract.amount,
            })
            .await?;

        let contract = &mut book.history[position];
        contract.refunded_at = Some(Utc::now());
        info!(
            "Contract {} refunded: {} returned to {}",
            contract.id, contract.amount, contract.buyer
        );
        Ok(contract.clone())
    }

    async fn contract(&self, contract_id: &ContractId) -> Option<EscrowContract> {
        let book = self.book.read().await;
        book.active
            .get(contract_id)
            .or_else(|| book.history.iter().find(|c| &c.id == contract_id))
            .cloned()
    }

    async fn active_contracts(&self) -> Vec<EscrowContract> {
        let book = self.book.read().await;
        let mut active: Vec<EscrowContract> = book.active.values().cloned().collect();
        active.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        active
    }

    async fn completed_contracts(&self) -> Vec<EscrowContract> {
        self.history_with(ContractStatus::Completed).await
    }

    async fn disputed_contracts(&self) -> Vec<EscrowContract> {
        self.history_with(ContractStatus::Disputed).await
    }

    fn quality_threshold(&self) -> u8 {
        self.quality_threshold
    }
}
