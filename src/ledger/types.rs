//! Value-pool tags and the output/input records transactions are built from.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::transaction::{LedgerError, TxId};

/// Accounting pool a value chunk lives in.
///
/// Value never moves between pools implicitly; an explicit transaction
/// spending outputs of one pool and creating outputs of another is the
/// only conversion mechanism.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PoolType {
    /// Publicly visible pool
    Transparent,
    /// First-generation shielded pool
    Sprout,
    /// Second-generation shielded pool
    Sapling,
}

impl PoolType {
    /// Single-character tag used in exported datasets
    pub fn as_char(&self) -> char {
        match self {
            PoolType::Transparent => 't',
            PoolType::Sprout => 'x',
            PoolType::Sapling => 'z',
        }
    }

    /// Returns a string representation of the pool type
    pub fn as_str(&self) -> &'static str {
        match self {
            PoolType::Transparent => "transparent",
            PoolType::Sprout => "sprout",
            PoolType::Sapling => "sapling",
        }
    }
}

impl fmt::Display for PoolType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single unit of value created by a transaction.
///
/// `index` is unique among outputs of the same pool type within the owning
/// transaction and is how inputs refer back to this output. The spent flag
/// flips exactly once; outputs are kept around after spending so history
/// and balance reports stay complete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxOutput {
    pub pool: PoolType,
    pub index: u32,
    pub amount: u64,
    pub spent: bool,
}

impl TxOutput {
    /// Create an unspent output. Zero-amount outputs are rejected.
    pub fn new(pool: PoolType, index: u32, amount: u64) -> Result<Self, LedgerError> {
        if amount == 0 {
            return Err(LedgerError::InvalidAmount);
        }
        Ok(TxOutput {
            pool,
            index,
            amount,
            spent: false,
        })
    }
}

/// Reference to a prior transaction's output, used to spend it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxInput {
    pub pool: PoolType,
    pub prev_txid: TxId,
    pub index: u32,
}
