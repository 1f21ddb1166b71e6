//! Collaborator interfaces
//!
//! The coordinator never talks to a ledger directly. Everything it reads or
//! submits goes through the traits in this module, injected once at
//! construction as a [`Collaborators`] bundle.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use thiserror::Error;

use motions_core::{Address, Amount, CryptoResult, Hash, KeyPairWrapper, Signature, Timestamp};
use motions_core::utils::timestamp_secs;

use crate::state_machine::MotionState;
use crate::types::{Domain, DomainId, ExtensionInfo, Motion, MotionId, ReputationProof, SkillId, StakeFractions};

/// Failures reported by a chain executor
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    /// The ledger rejected the call
    #[error("Reverted: {0}")]
    Reverted(String),

    /// The ledger could not be reached
    #[error("Transport failure: {0}")]
    Transport(String),
}

/// Result type for chain executor calls
pub type ChainResult<T> = Result<T, ChainError>;

/// Failures reported by a reputation oracle
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OracleError {
    /// The user has no reputation record for the skill
    #[error("No reputation for {user} in skill {skill_id}")]
    NoReputation { skill_id: SkillId, user: Address },

    /// The oracle could not be reached
    #[error("Oracle unavailable: {0}")]
    Unavailable(String),
}

/// A positional contract call argument
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallArg {
    Uint(Amount),
    Bytes(Vec<u8>),
    Address(Address),
    Proof(ReputationProof),
}

/// A mutating call against a ledger contract
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractCall {
    pub contract: Address,
    pub method: String,
    pub args: Vec<CallArg>,
    /// Identity the call is sent as
    pub caller: Address,
}

impl ContractCall {
    pub fn new(contract: Address, method: &str, caller: Address) -> Self {
        Self {
            contract,
            method: method.to_string(),
            args: Vec::new(),
            caller,
        }
    }

    /// Append an argument
    pub fn arg(mut self, arg: CallArg) -> Self {
        self.args.push(arg);
        self
    }

    fn missing(&self, index: usize, kind: &str) -> ChainError {
        ChainError::Reverted(format!("{}: argument {} must be {}", self.method, index, kind))
    }

    /// Numeric argument at `index`
    pub fn uint(&self, index: usize) -> ChainResult<Amount> {
        match self.args.get(index) {
            Some(CallArg::Uint(value)) => Ok(*value),
            _ => Err(self.missing(index, "a uint")),
        }
    }

    /// Byte-string argument at `index`
    pub fn bytes(&self, index: usize) -> ChainResult<&[u8]> {
        match self.args.get(index) {
            Some(CallArg::Bytes(value)) => Ok(value),
            _ => Err(self.missing(index, "bytes")),
        }
    }

    /// Address argument at `index`
    pub fn address(&self, index: usize) -> ChainResult<&Address> {
        match self.args.get(index) {
            Some(CallArg::Address(value)) => Ok(value),
            _ => Err(self.missing(index, "an address")),
        }
    }

    /// Reputation proof argument at `index`
    pub fn proof(&self, index: usize) -> ChainResult<&ReputationProof> {
        match self.args.get(index) {
            Some(CallArg::Proof(value)) => Ok(value),
            _ => Err(self.missing(index, "a reputation proof")),
        }
    }
}

/// An event emitted by a call, with its arguments by name
#[derive(Debug, Clone, PartialEq)]
pub struct ChainEvent {
    pub name: String,
    pub args: serde_json::Map<String, serde_json::Value>,
}

impl ChainEvent {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            args: serde_json::Map::new(),
        }
    }

    /// Add a named argument
    pub fn with(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.args.insert(key.to_string(), value.into());
        self
    }
}

/// The outcome of a mined call
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionReceipt {
    pub tx_hash: Hash,
    pub block_number: u64,
    pub events: Vec<ChainEvent>,
}

/// Submits calls to the ledger and serves its read-only queries
#[async_trait]
pub trait ChainExecutor: Send + Sync {
    /// Submit a call and wait for its receipt
    async fn execute(&self, call: ContractCall) -> ChainResult<TransactionReceipt>;

    /// Dry-run a call without changing ledger state
    async fn simulate(&self, call: ContractCall) -> ChainResult<()>;

    /// The extension installed under `name` in an organization, if any
    async fn installed_extension(&self, colony: &Address, name: &str) -> ChainResult<Option<ExtensionInfo>>;

    /// Number of motions ever created by a module
    async fn motion_count(&self, module: &Address) -> ChainResult<u64>;

    /// A motion record
    async fn get_motion(&self, module: &Address, motion_id: MotionId) -> ChainResult<Option<Motion>>;

    /// The phase the ledger reports for a motion
    async fn motion_state(&self, module: &Address, motion_id: MotionId) -> ChainResult<MotionState>;

    /// Network-wide stake fractions of a module
    async fn stake_fractions(&self, module: &Address) -> ChainResult<StakeFractions>;

    /// A team of an organization
    async fn domain(&self, colony: &Address, domain_id: DomainId) -> ChainResult<Option<Domain>>;

    /// Tokens `user` approved `obligator` to stake in a team
    async fn stake_approval(
        &self,
        colony: &Address,
        user: &Address,
        obligator: &Address,
        domain_id: DomainId,
    ) -> ChainResult<Amount>;
}

/// Deposited and approved token balances
#[async_trait]
pub trait TokenLedger: Send + Sync {
    /// Tokens `user` deposited for staking
    async fn deposited(&self, token: &Address, user: &Address) -> ChainResult<Amount>;

    /// Deposited tokens `user` approved to `obligator`
    async fn approved(&self, token: &Address, user: &Address, obligator: &Address) -> ChainResult<Amount>;
}

/// Issues reputation proofs against a snapshot
#[async_trait]
pub trait ReputationOracle: Send + Sync {
    async fn reputation_proof(
        &self,
        skill_id: SkillId,
        user: &Address,
        root_hash: &Hash,
    ) -> Result<ReputationProof, OracleError>;
}

/// The acting identity
#[async_trait]
pub trait Signer: Send + Sync {
    fn address(&self) -> Address;

    /// Sign a message; the same message must always yield the same signature
    async fn sign_message(&self, message: &str) -> CryptoResult<Signature>;
}

#[async_trait]
impl Signer for KeyPairWrapper {
    fn address(&self) -> Address {
        Address::from_public_key(self.public_key_bytes())
    }

    async fn sign_message(&self, message: &str) -> CryptoResult<Signature> {
        Ok(self.sign(message.as_bytes()))
    }
}

/// Source of the current time in seconds
pub trait Clock: Send + Sync {
    fn now_secs(&self) -> Timestamp;
}

/// Wall-clock time
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_secs(&self) -> Timestamp {
        timestamp_secs()
    }
}

/// A clock that only moves when told to
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(now: Timestamp) -> Self {
        Self { now: AtomicU64::new(now) }
    }

    pub fn set(&self, now: Timestamp) {
        self.now.store(now, Ordering::SeqCst);
    }

    pub fn advance(&self, secs: u64) {
        self.now.fetch_add(secs, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_secs(&self) -> Timestamp {
        self.now.load(Ordering::SeqCst)
    }
}

/// Handles every coordinator depends on
#[derive(Clone)]
pub struct Collaborators {
    pub executor: Arc<dyn ChainExecutor>,
    pub tokens: Arc<dyn TokenLedger>,
    pub oracle: Arc<dyn ReputationOracle>,
    pub signer: Arc<dyn Signer>,
    pub clock: Arc<dyn Clock>,
}
