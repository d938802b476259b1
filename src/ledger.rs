use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Absolute tolerance when re-checking balance arithmetic during
/// verification, to absorb accumulated floating-point drift.
pub const BALANCE_TOLERANCE: f64 = 0.001;

/// Account event recorded by a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Op {
    Create,
    Deposit,
    Withdraw,
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Op::Create => write!(f, "CREATE"),
            Op::Deposit => write!(f, "DEPOSIT"),
            Op::Withdraw => write!(f, "WITHDRAW"),
        }
    }
}

/// One immutable entry in the hash-linked chain. `hash` commits to every
/// other field plus `previous_hash`, so any retroactive edit is detectable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub index: u64,
    pub timestamp: String,
    pub operation: Op,
    pub amount: f64,
    pub balance: f64,
    pub owner: String,
    pub previous_hash: Option<String>,
    pub hash: String,
}

/// SHA-256 over the block fields concatenated in fixed order, hex-encoded.
/// Floats are rendered with `{:?}` so `100.0` hashes as `"100.0"`, never a
/// locale-dependent form.
pub fn calculate_hash(
    index: u64,
    timestamp: &str,
    operation: Op,
    amount: f64,
    balance: f64,
    owner: &str,
    previous_hash: Option<&str>,
) -> String {
    let data = format!(
        "{}{}{}{:?}{:?}{}{}",
        index,
        timestamp,
        operation,
        amount,
        balance,
        owner,
        previous_hash.unwrap_or("")
    );
    hex::encode(Sha256::digest(data.as_bytes()))
}

#[derive(Debug, Clone, PartialEq)]
pub enum LedgerError {
    InvalidAmount,
    InsufficientBalance { balance: f64, requested: f64 },
}

impl fmt::Display for LedgerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedgerError::InvalidAmount => write!(f, "Amount must be positive"),
            LedgerError::InsufficientBalance { balance, requested } => write!(
                f,
                "Insufficient balance. Current balance: {:.2}, attempted withdrawal: {:.2}",
                balance, requested
            ),
        }
    }
}

impl std::error::Error for LedgerError {}

/// Single source of truth for the account: owns the chain exclusively,
/// mutated only by appending validated blocks. Never shrinks.
pub struct Ledger {
    owner: String,
    chain: Vec<Block>,
}

impl Ledger {
    /// Seed the chain with a genesis CREATE block. The initial deposit is
    /// deliberately unvalidated (zero or negative seeds are accepted),
    /// unlike regular deposits.
    pub fn new(owner: impl Into<String>, initial_deposit: f64) -> Self {
        let owner = owner.into();
        let timestamp = Utc::now().to_rfc3339();
        let hash = calculate_hash(
            0,
            &timestamp,
            Op::Create,
            initial_deposit,
            initial_deposit,
            &owner,
            None,
        );
        let genesis = Block {
            index: 0,
            timestamp,
            operation: Op::Create,
            amount: initial_deposit,
            balance: initial_deposit,
            owner: owner.clone(),
            previous_hash: None,
            hash,
        };
        Ledger { owner, chain: vec![genesis] }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Balance after the last block, O(1).
    pub fn balance(&self) -> f64 {
        self.chain.last().map(|b| b.balance).unwrap_or(0.0)
    }

    pub fn block_count(&self) -> usize {
        self.chain.len()
    }

    pub fn last_block(&self) -> &Block {
        // Invariant: the chain always holds at least the genesis block.
        self.chain.last().unwrap()
    }

    /// Snapshot of the full chain in order.
    pub fn history(&self) -> Vec<Block> {
        self.chain.clone()
    }

    fn append(&mut self, operation: Op, amount: f64, new_balance: f64) -> Block {
        let previous = self.last_block();
        let previous_hash = previous.hash.clone();
        let index = self.chain.len() as u64;
        let timestamp = Utc::now().to_rfc3339();
        let hash = calculate_hash(
            index,
            &timestamp,
            operation,
            amount,
            new_balance,
            &self.owner,
            Some(&previous_hash),
        );
        let block = Block {
            index,
            timestamp,
            operation,
            amount,
            balance: new_balance,
            owner: self.owner.clone(),
            previous_hash: Some(previous_hash),
            hash,
        };
        self.chain.push(block.clone());
        block
    }

    pub fn deposit(&mut self, amount: f64) -> Result<Block, LedgerError> {
        if amount <= 0.0 {
            return Err(LedgerError::InvalidAmount);
        }
        let new_balance = self.balance() + amount;
        Ok(self.append(Op::Deposit, amount, new_balance))
    }

    pub fn withdraw(&mut self, amount: f64) -> Result<Block, LedgerError> {
        if amount <= 0.0 {
            return Err(LedgerError::InvalidAmount);
        }
        let balance = self.balance();
        if amount > balance {
            return Err(LedgerError::InsufficientBalance { balance, requested: amount });
        }
        Ok(self.append(Op::Withdraw, amount, balance - amount))
    }

    /// Full read-only integrity pass over the chain. Deterministic: two runs
    /// with no intervening mutation return the same result.
    pub fn verify_integrity(&self) -> (bool, String) {
        verify_blocks(&self.chain)
    }
}

impl fmt::Display for Ledger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Ledger(owner={}, blocks={}, balance={:.2})",
            self.owner,
            self.chain.len(),
            self.balance()
        )
    }
}

/// Verify an arbitrary block sequence: per-block hash recomputation, chain
/// linkage, and the balance recurrence. Reports the first offending index.
pub fn verify_blocks(chain: &[Block]) -> (bool, String) {
    let genesis = match chain.first() {
        Some(b) => b,
        None => return (false, "Chain is empty".to_string()),
    };
    if genesis.previous_hash.is_some() {
        return (false, "Genesis block must have no previous hash".to_string());
    }

    for (i, block) in chain.iter().enumerate() {
        let recomputed = calculate_hash(
            block.index,
            &block.timestamp,
            block.operation,
            block.amount,
            block.balance,
            &block.owner,
            block.previous_hash.as_deref(),
        );
        if block.hash != recomputed {
            return (false, format!("Invalid hash at block {}", i));
        }

        if i > 0 {
            let previous = &chain[i - 1];
            if block.previous_hash.as_deref() != Some(previous.hash.as_str()) {
                return (false, format!("Broken chain linkage at block {}", i));
            }

            let expected = match block.operation {
                Op::Deposit => previous.balance + block.amount,
                Op::Withdraw => previous.balance - block.amount,
                // A CREATE past the genesis is never produced, but tolerated:
                // it carries its own balance verbatim.
                Op::Create => block.balance,
            };
            if (block.balance - expected).abs() > BALANCE_TOLERANCE {
                return (false, format!("Inconsistent balance at block {}", i));
            }
        }
    }

    (true, "Chain intact".to_string())
}
