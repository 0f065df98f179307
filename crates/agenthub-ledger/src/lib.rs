//! AgentHub Ledger - Append-only hash-chained record of settlement events
//!
//! The ledger is:
//! - Append-only (blocks are never rewritten or removed)
//! - Hash-chained (every block commits to the hash of its predecessor)
//! - Typed (each block carries exactly one [`Payload`] variant)
//! - Single-writer (appends are serialized behind one lock)
//!
//! # Invariants
//!
//! 1. `block[i].previous_hash == block[i - 1].hash` for all `i > 0`
//! 2. `block[i].hash == sha256(canonical(block[i] without hash))`
//! 3. `block[i].index == i`
//! 4. Block 0 is the genesis block with `previous_hash` set to [`ZERO_HASH`]
//!
//! Tampering is detected by [`Ledger::verify`], never repaired.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use agenthub_types::{AgentId, Amount, ContractId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Previous-hash value of the genesis block
pub const ZERO_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

/// Message carried by every genesis block
pub const GENESIS_MESSAGE: &str = "AgentHub Ledger Initialized";

/// Errors that can occur in ledger operations
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Serialization error: {message}")]
    SerializationError { message: String },

    #[error("Journal error at {path}: {message}")]
    JournalError { path: String, message: String },

    #[error("Chain corrupted at block {index}")]
    ChainCorrupted { index: u64 },

    #[error("Chain is empty: a ledger needs at least a genesis block")]
    EmptyChain,
}

impl From<serde_json::Error> for LedgerError {
    fn from(e: serde_json::Error) -> Self {
        LedgerError::SerializationError {
            message: e.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;

/// Economic event recorded by a block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Payload {
    /// First block of every chain
    Genesis { message: String },
    /// Buyer funds committed to escrow for a seller
    ContractCreated {
        contract_id: ContractId,
        buyer: AgentId,
        seller: AgentId,
        amount: Amount,
        description: String,
    },
    /// Validation passed and escrowed funds go to the seller
    PaymentReleased {
        contract_id: ContractId,
        buyer: AgentId,
        seller: AgentId,
        amount: Amount,
        quality_score: u8,
        validator: AgentId,
    },
    /// Validation failed and escrowed funds are withheld
    PaymentDisputed {
        contract_id: ContractId,
        buyer: AgentId,
        seller: AgentId,
        amount: Amount,
        quality_score: u8,
        validator: AgentId,
    },
    /// Disputed funds returned to the buyer
    PaymentRefunded {
        contract_id: ContractId,
        buyer: AgentId,
        seller: AgentId,
        amount: Amount,
    },
}

impl Payload {
    pub fn genesis() -> Self {
        Payload::Genesis {
            message: GENESIS_MESSAGE.to_string(),
        }
    }

    /// Short event name, matching the serialized tag
    pub fn kind(&self) -> &'static str {
        match self {
            Payload::Genesis { .. } => "genesis",
            Payload::ContractCreated { .. } => "contract_created",
            Payload::PaymentReleased { .. } => "payment_released",
            Payload::PaymentDisputed { .. } => "payment_disputed",
            Payload::PaymentRefunded { .. } => "payment_refunded",
        }
    }

    pub fn buyer(&self) -> Option<&AgentId> {
        match self {
            Payload::Genesis { .. } => None,
            Payload::ContractCreated { buyer, .. }
            | Payload::PaymentReleased { buyer, .. }
            | Payload::PaymentDisputed { buyer, .. }
            | Payload::PaymentRefunded { buyer, .. } => Some(buyer),
        }
    }

    pub fn seller(&self) -> Option<&AgentId> {
        match self {
            Payload::Genesis { .. } => None,
            Payload::ContractCreated { seller, .. }
            | Payload::PaymentReleased { seller, .. }
            | Payload::PaymentDisputed { seller, .. }
            | Payload::PaymentRefunded { seller, .. } => Some(seller),
        }
    }

    pub fn amount(&self) -> Option<Amount> {
        match self {
            Payload::Genesis { .. } => None,
            Payload::ContractCreated { amount, .. }
            | Payload::PaymentReleased { amount, .. }
            | Payload::PaymentDisputed { amount, .. }
            | Payload::PaymentRefunded { amount, .. } => Some(*amount),
        }
    }

    pub fn contract_id(&self) -> Option<&ContractId> {
        match self {
            Payload::Genesis { .. } => None,
            Payload::ContractCreated { contract_id, .. }
            | Payload::PaymentReleased { contract_id, .. }
            | Payload::PaymentDisputed { contract_id, .. }
            | Payload::PaymentRefunded { contract_id, .. } => Some(contract_id),
        }
    }

    /// Whether the participant appears as buyer or seller
    pub fn involves(&self, participant: &AgentId) -> bool {
        self.buyer() == Some(participant) || self.seller() == Some(participant)
    }
}

/// The fields a block hash commits to, in canonical order
#[derive(Serialize)]
struct HashInput<'a> {
    index: u64,
    payload: &'a Payload,
    timestamp: &'a DateTime<Utc>,
    previous_hash: &'a str,
}

/// A single link in the chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub index: u64,
    pub payload: Payload,
    pub timestamp: DateTime<Utc>,
    pub previous_hash: String,
    pub hash: String,
}

impl Block {
    fn seal(index: u64, payload: Payload, previous_hash: String) -> Self {
        let timestamp = Utc::now();
        let hash = hash_fields(index, &payload, &timestamp, &previous_hash);
        Self {
            index,
            payload,
            timestamp,
            previous_hash,
            hash,
        }
    }

    /// Recompute this block's hash from its own fields
    pub fn compute_hash(&self) -> String {
        hash_fields(
            self.index,
            &self.payload,
            &self.timestamp,
            &self.previous_hash,
        )
    }

    /// Whether the stored hash matches the block's contents
    pub fn is_sealed(&self) -> bool {
        self.hash == self.compute_hash()
    }

    pub fn is_genesis(&self) -> bool {
        matches!(self.payload, Payload::Genesis { .. })
    }
}

/// SHA-256 over the compact JSON of [`HashInput`], hex encoded
fn hash_fields(
    index: u64,
    payload: &Payload,
    timestamp: &DateTime<Utc>,
    previous_hash: &str,
) -> String {
    let input = HashInput {
        index,
        payload,
        timestamp,
        previous_hash,
    };
    let mut hasher = Sha256::new();
    if let Ok(bytes) = serde_json::to_vec(&input) {
        hasher.update(&bytes);
    }
    hex::encode(hasher.finalize())
}

/// Index of the first block that breaks a chain invariant
fn first_broken_link(blocks: &[Block]) -> Option<u64> {
    let genesis = match blocks.first() {
        Some(genesis) => genesis,
        None => return Some(0),
    };
    if genesis.index != 0 || genesis.previous_hash != ZERO_HASH || !genesis.is_sealed() {
        return Some(0);
    }

    for (position, pair) in blocks.windows(2).enumerate() {
        let (previous, current) = (&pair[0], &pair[1]);
        let expected_index = position as u64 + 1;
        if current.index != expected_index
            || !current.is_sealed()
            || current.previous_hash != previous.hash
        {
            return Some(expected_index);
        }
    }
    None
}

/// Per-participant totals derived from the chain
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantStats {
    /// Released payments received as seller
    pub earned: Amount,
    /// Escrowed payments made as buyer, net of refunds
    pub spent: Amount,
    pub completed_as_seller: u64,
    pub completed_as_buyer: u64,
    pub transaction_count: u64,
}

struct ChainState {
    blocks: Vec<Block>,
    journal: Option<Journal>,
}

struct Journal {
    path: PathBuf,
    file: File,
}

impl Journal {
    async fn write(&mut self, block: &Block) -> Result<()> {
        let mut line = serde_json::to_vec(block)?;
        line.push(b'\n');
        self.file
            .write_all(&line)
            .await
            .map_err(|e| journal_error(&self.path, e))?;
        self.file
            .sync_data()
            .await
            .map_err(|e| journal_error(&self.path, e))
    }
}

fn journal_error(path: &Path, e: std::io::Error) -> LedgerError {
    LedgerError::JournalError {
        path: path.display().to_string(),
        message: e.to_string(),
    }
}

/// The AgentHub Ledger
///
/// A hash-chained log of settlement events. Cloning is cheap and every clone
/// observes the same chain. Thread-safe and designed for concurrent access:
/// appends are serialized, reads run in parallel.
#[derive(Clone)]
pub struct Ledger {
    state: Arc<RwLock<ChainState>>,
}

impl Ledger {
    /// Create a new in-memory ledger holding only the genesis block
    pub fn new() -> Self {
        let genesis = Block::seal(0, Payload::genesis(), ZERO_HASH.to_string());
        Self::with_state(ChainState {
            blocks: vec![genesis],
            journal: None,
        })
    }

    fn with_state(state: ChainState) -> Self {
        Self {
            state: Arc::new(RwLock::new(state)),
        }
    }

    /// Open a journal-backed ledger
    ///
    /// An existing journal is replayed and must verify; otherwise a fresh
    /// chain is started and its genesis block written. Every later append is
    /// synced to the journal before it becomes visible.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let existing = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(journal_error(&path, e)),
        };

        let mut blocks = Vec::new();
        for line in existing.lines().filter(|l| !l.trim().is_empty()) {
            blocks.push(serde_json::from_str::<Block>(line)?);
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| journal_error(&path, e))?;
        let mut journal = Journal { path, file };

        if blocks.is_empty() {
            let genesis = Block::seal(0, Payload::genesis(), ZERO_HASH.to_string());
            journal.write(&genesis).await?;
            blocks.push(genesis);
            info!("Ledger journal created at {}", journal.path.display());
        } else if let Some(index) = first_broken_link(&blocks) {
            warn!(
                "Ledger journal {} failed verification at block {}",
                journal.path.display(),
                index
            );
            return Err(LedgerError::ChainCorrupted { index });
        } else {
            info!(
                "Ledger journal {} replayed: {} blocks",
                journal.path.display(),
                blocks.len()
            );
        }

        Ok(Self::with_state(ChainState {
            blocks,
            journal: Some(journal),
        }))
    }

    /// Load a chain exactly as given, without repairing or rejecting it
    ///
    /// Use [`Ledger::verify`] to decide whether the loaded chain is trustworthy.
    pub fn from_blocks(blocks: Vec<Block>) -> Result<Self> {
        if blocks.is_empty() {
            return Err(LedgerError::EmptyChain);
        }
        Ok(Self::with_state(ChainState {
            blocks,
            journal: None,
        }))
    }

    /// Load a chain previously produced by [`Ledger::to_json`]
    pub fn from_json(json: &str) -> Result<Self> {
        let blocks: Vec<Block> = serde_json::from_str(json)?;
        Self::from_blocks(blocks)
    }

    /// Append an event to the chain
    ///
    /// Reading the last hash, sealing the block, journaling and storing it all
    /// happen under one write lock.
    pub async fn append(&self, payload: Payload) -> Result<Block> {
        let mut state = self.state.write().await;

        let (index, previous_hash) = match state.blocks.last() {
            Some(last) => (last.index + 1, last.hash.clone()),
            None => (0, ZERO_HASH.to_string()),
        };
        let block = Block::seal(index, payload, previous_hash);

        if let Some(journal) = state.journal.as_mut() {
            journal.write(&block).await?;
        }
        state.blocks.push(block.clone());

        info!(
            "Block #{} appended: {} ({}...)",
            block.index,
            block.payload.kind(),
            &block.hash[..16]
        );
        Ok(block)
    }

    /// Check every hash and every link in the chain
    pub async fn verify(&self) -> bool {
        let state = self.state.read().await;
        match first_broken_link(&state.blocks) {
            None => true,
            Some(index) => {
                warn!("Ledger verification failed at block {}", index);
                false
            }
        }
    }

    /// Non-genesis blocks in chain order, optionally only those naming
    /// `participant` as buyer or seller
    pub async fn history(&self, participant: Option<&AgentId>) -> Vec<Block> {
        let state = self.state.read().await;
        state
            .blocks
            .iter()
            .skip(1)
            .filter(|b| participant.map_or(true, |p| b.payload.involves(p)))
            .cloned()
            .collect()
    }

    /// Totals for a participant, recomputed from the current chain
    pub async fn participant_stats(&self, participant: &AgentId) -> ParticipantStats {
        let mut stats = ParticipantStats::default();
        let mut refunded = Amount::zero();

        for block in self.history(Some(participant)).await {
            stats.transaction_count += 1;
            match &block.payload {
                Payload::ContractCreated { buyer, amount, .. } if buyer == participant => {
                    stats.spent = stats.spent.saturating_add(*amount);
                }
                Payload::PaymentReleased {
                    buyer,
                    seller,
                    amount,
                    ..
                } => {
                    if seller == participant {
                        stats.earned = stats.earned.saturating_add(*amount);
                        stats.completed_as_seller += 1;
                    }
                    if buyer == participant {
                        stats.completed_as_buyer += 1;
                    }
                }
                Payload::PaymentRefunded { buyer, amount, .. } if buyer == participant => {
                    refunded = refunded.saturating_add(*amount);
                }
                _ => {}
            }
        }

        stats.spent = stats.spent.saturating_sub(refunded);
        stats
    }

    /// Number of blocks, genesis included
    pub async fn len(&self) -> usize {
        self.state.read().await.blocks.len()
    }

    /// Hash of the newest block
    pub async fn last_hash(&self) -> String {
        let state = self.state.read().await;
        state
            .blocks
            .last()
            .map(|b| b.hash.clone())
            .unwrap_or_else(|| ZERO_HASH.to_string())
    }

    /// Get a block by index
    pub async fn block(&self, index: u64) -> Option<Block> {
        let state = self.state.read().await;
        state.blocks.get(index as usize).cloned()
    }

    /// Snapshot of the full chain, genesis included
    pub async fn blocks(&self) -> Vec<Block> {
        self.state.read().await.blocks.clone()
    }

    /// Export the full chain as a pretty-printed JSON array
    pub async fn to_json(&self) -> Result<String> {
        let state = self.state.read().await;
        Ok(serde_json::to_string_pretty(&state.blocks)?)
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn created(contract: &str, buyer: &str, seller: &str, tokens: u64) -> Payload {
        Payload::ContractCreated {
            contract_id: ContractId::from(contract),
            buyer: AgentId::from(buyer),
            seller: AgentId::from(seller),
            amount: Amount::tokens(tokens),
            description: format!("job for {}", contract),
        }
    }

    fn released(contract: &str, buyer: &str, seller: &str, tokens: u64) -> Payload {
        Payload::PaymentReleased {
            contract_id: ContractId::from(contract),
            buyer: AgentId::from(buyer),
            seller: AgentId::from(seller),
            amount: Amount::tokens(tokens),
            quality_score: 88,
            validator: AgentId::from("ValidatorAgent"),
        }
    }

    fn temp_journal() -> PathBuf {
        std::env::temp_dir().join(format!("agenthub-ledger-{}.jsonl", uuid::Uuid::new_v4()))
    }

    #[tokio::test]
    async fn test_genesis_block() {
        let ledger = Ledger::new();
        let genesis = ledger.block(0).await.unwrap();

        assert_eq!(genesis.index, 0);
        assert_eq!(genesis.previous_hash, ZERO_HASH);
        assert_eq!(genesis.payload, Payload::genesis());
        assert!(genesis.is_sealed());
        assert!(ledger.history(None).await.is_empty());
        assert!(ledger.verify().await);
    }

    #[tokio::test]
    async fn test_three_appends_verify() {
        let ledger = Ledger::new();
        for i in 0..3 {
            ledger
                .append(created(&format!("c{}", i), "buyer", "seller", 10))
                .await
                .unwrap();
            assert!(ledger.verify().await);
        }
        assert_eq!(ledger.len().await, 4);
    }

    #[tokio::test]
    async fn test_overwritten_amount_breaks_verification() {
        let ledger = Ledger::new();
        for i in 0..3 {
            ledger
                .append(created(&format!("c{}", i), "buyer", "seller", 10))
                .await
                .unwrap();
        }

        let mut blocks = ledger.blocks().await;
        if let Payload::ContractCreated { amount, .. } = &mut blocks[2].payload {
            *amount = Amount::tokens(1_000);
        }
        let tampered = Ledger::from_blocks(blocks).unwrap();

        assert!(!tampered.verify().await);
    }

    #[tokio::test]
    async fn test_rehashed_block_still_breaks_link() {
        let ledger = Ledger::new();
        for i in 0..3 {
            ledger
                .append(created(&format!("c{}", i), "buyer", "seller", 10))
                .await
                .unwrap();
        }

        // Re-sealing the edited block hides the edit from its own hash check,
        // but the successor still points at the old hash.
        let mut blocks = ledger.blocks().await;
        blocks[1].payload = created("c0", "buyer", "mallory", 10);
        blocks[1].hash = blocks[1].compute_hash();
        let tampered = Ledger::from_blocks(blocks).unwrap();

        assert!(!tampered.verify().await);
    }

    #[tokio::test]
    async fn test_links_and_deterministic_hash() {
        let ledger = Ledger::new();
        ledger.append(created("c1", "a", "b", 5)).await.unwrap();
        ledger.append(released("c1", "a", "b", 5)).await.unwrap();

        let blocks = ledger.blocks().await;
        for pair in blocks.windows(2) {
            assert_eq!(pair[1].previous_hash, pair[0].hash);
        }
        for block in &blocks {
            assert_eq!(block.compute_hash(), block.compute_hash());
            assert_eq!(block.compute_hash(), block.hash);
            assert_eq!(block.hash.len(), 64);
        }
        assert_eq!(ledger.last_hash().await, blocks[2].hash);
    }

    #[tokio::test]
    async fn test_history_filters_by_participant() {
        let ledger = Ledger::new();
        ledger.append(created("c1", "alice", "bob", 5)).await.unwrap();
        ledger.append(created("c2", "carol", "dave", 7)).await.unwrap();
        ledger.append(released("c1", "alice", "bob", 5)).await.unwrap();

        assert_eq!(ledger.history(None).await.len(), 3);

        let bob = ledger.history(Some(&AgentId::from("bob"))).await;
        assert_eq!(bob.len(), 2);
        assert_eq!(bob[0].payload.kind(), "contract_created");
        assert_eq!(bob[1].payload.kind(), "payment_released");

        assert!(ledger.history(Some(&AgentId::from("erin"))).await.is_empty());
    }

    #[tokio::test]
    async fn test_participant_stats() {
        let ledger = Ledger::new();
        ledger.append(created("c1", "alice", "bob", 10)).await.unwrap();
        ledger.append(released("c1", "alice", "bob", 10)).await.unwrap();
        ledger.append(created("c2", "alice", "bob", 8)).await.unwrap();
        ledger
            .append(Payload::PaymentDisputed {
                contract_id: ContractId::from("c2"),
                buyer: AgentId::from("alice"),
                seller: AgentId::from("bob"),
                amount: Amount::tokens(8),
                quality_score: 40,
                validator: AgentId::from("ValidatorAgent"),
            })
            .await
            .unwrap();

        let bob = ledger.participant_stats(&AgentId::from("bob")).await;
        assert_eq!(bob.earned, Amount::tokens(10));
        assert_eq!(bob.spent, Amount::zero());
        assert_eq!(bob.completed_as_seller, 1);
        assert_eq!(bob.transaction_count, 4);

        let alice = ledger.participant_stats(&AgentId::from("alice")).await;
        assert_eq!(alice.spent, Amount::tokens(18));
        assert_eq!(alice.completed_as_buyer, 1);

        ledger
            .append(Payload::PaymentRefunded {
                contract_id: ContractId::from("c2"),
                buyer: AgentId::from("alice"),
                seller: AgentId::from("bob"),
                amount: Amount::tokens(8),
            })
            .await
            .unwrap();

        let alice = ledger.participant_stats(&AgentId::from("alice")).await;
        assert_eq!(alice.spent, Amount::tokens(10));
        assert_eq!(alice.transaction_count, 5);
    }

    #[tokio::test]
    async fn test_concurrent_appends_keep_chain_linked() {
        let ledger = Ledger::new();
        let mut handles = Vec::new();
        for i in 0..32 {
            let ledger = ledger.clone();
            handles.push(tokio::spawn(async move {
                ledger
                    .append(created(&format!("c{}", i), "buyer", "seller", 1))
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(ledger.len().await, 33);
        assert!(ledger.verify().await);
    }

    #[tokio::test]
    async fn test_json_export_round_trip() {
        let ledger = Ledger::new();
        ledger.append(created("c1", "a", "b", 3)).await.unwrap();

        let json = ledger.to_json().await.unwrap();
        let restored = Ledger::from_json(&json).unwrap();

        assert_eq!(restored.blocks().await, ledger.blocks().await);
        assert!(restored.verify().await);
    }

    #[tokio::test]
    async fn test_empty_chain_rejected() {
        assert!(matches!(
            Ledger::from_blocks(Vec::new()),
            Err(LedgerError::EmptyChain)
        ));
    }

    #[tokio::test]
    async fn test_journal_survives_reopen() {
        let path = temp_journal();

        let ledger = Ledger::open(&path).await.unwrap();
        ledger.append(created("c1", "a", "b", 3)).await.unwrap();
        ledger.append(released("c1", "a", "b", 3)).await.unwrap();
        let before = ledger.blocks().await;
        drop(ledger);

        let reopened = Ledger::open(&path).await.unwrap();
        assert_eq!(reopened.blocks().await, before);
        assert!(reopened.verify().await);

        reopened.append(created("c2", "a", "b", 1)).await.unwrap();
        assert_eq!(reopened.len().await, 4);
        assert!(reopened.verify().await);

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_tampered_journal_refuses_to_open() {
        let path = temp_journal();

        let ledger = Ledger::open(&path).await.unwrap();
        ledger.append(created("c1", "a", "b", 3)).await.unwrap();
        drop(ledger);

        let content = std::fs::read_to_string(&path).unwrap();
        std::fs::write(&path, content.replace("\"amount\":300", "\"amount\":900")).unwrap();

        assert!(matches!(
            Ledger::open(&path).await,
            Err(LedgerError::ChainCorrupted { index: 1 })
        ));

        let _ = std::fs::remove_file(&path);
    }

    fn arb_payload() -> impl Strategy<Value = Payload> {
        ("[a-z]{1,8}", "[a-z]{1,8}", 1u64..10_000, 0u8..=100).prop_map(
            |(buyer, seller, units, score)| {
                if score >= 70 {
                    Payload::PaymentReleased {
                        contract_id: ContractId::new(),
                        buyer: AgentId::from(buyer),
                        seller: AgentId::from(seller),
                        amount: Amount::new(units),
                        quality_score: score,
                        validator: AgentId::from("v"),
                    }
                } else {
                    Payload::ContractCreated {
                        contract_id: ContractId::new(),
                        buyer: AgentId::from(buyer),
                        seller: AgentId::from(seller),
                        amount: Amount::new(units),
                        description: "work".to_string(),
                    }
                }
            },
        )
    }

    fn tamper(block: &mut Block, field: u8) {
        match field {
            0 => block.index += 1,
            1 => block.timestamp = block.timestamp + chrono::Duration::nanoseconds(1),
            2 => block.previous_hash = ZERO_HASH.to_string(),
            _ => match &mut block.payload {
                Payload::ContractCreated { amount, .. }
                | Payload::PaymentReleased { amount, .. } => *amount = Amount::new(amount.0 + 1),
                other => *other = Payload::genesis(),
            },
        }
    }

    proptest! {
        #[test]
        fn prop_verify_holds_after_every_append(payloads in prop::collection::vec(arb_payload(), 1..16)) {
            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            rt.block_on(async {
                let ledger = Ledger::new();
                for payload in payloads {
                    ledger.append(payload).await.unwrap();
                    assert!(ledger.verify().await);
                }
            });
        }

        #[test]
        fn prop_single_field_tamper_is_detected(
            payloads in prop::collection::vec(arb_payload(), 1..12),
            pick in any::<prop::sample::Index>(),
            field in 0u8..4,
        ) {
            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            rt.block_on(async {
                let ledger = Ledger::new();
                for payload in payloads {
                    ledger.append(payload).await.unwrap();
                }

                let mut blocks = ledger.blocks().await;
                let target = 1 + pick.index(blocks.len() - 1);
                tamper(&mut blocks[target], field);

                let tampered = Ledger::from_blocks(blocks).unwrap();
                assert!(!tampered.verify().await);
            });
        }
    }
}
