//! Transactions and the ledger registry that resolves and commits them.
//!
//! The ledger owns every transaction ever applied, assigns monotonically
//! increasing transaction ids, and is the sole resolver of inputs to the
//! outputs they spend. All mutation of spent flags happens here.

use std::collections::{BTreeMap, HashSet};

use log::debug;

use super::types::{PoolType, TxInput, TxOutput};

/// System-unique transaction identifier, assigned by the ledger and never reused.
pub type TxId = u64;

/// Data-integrity failures raised while committing a transaction.
///
/// Apart from `InvalidAmount` (caught at output construction) these all
/// indicate a broken invariant in the caller and should abort the run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("output amount must be positive")]
    InvalidAmount,

    #[error("input references unknown prevout (txid {txid}, pool {pool}, index {index})")]
    UnknownPrevout {
        txid: TxId,
        pool: PoolType,
        index: u32,
    },

    #[error("input double-spends prevout (txid {txid}, pool {pool}, index {index})")]
    DoubleSpend {
        txid: TxId,
        pool: PoolType,
        index: u32,
    },

    #[error("transaction does not conserve value (inputs {total_in}, outputs {total_out})")]
    ValueMismatch { total_in: u64, total_out: u64 },
}

/// A committed transaction: ordered inputs spending prior outputs and
/// ordered outputs carrying new value. Zero inputs means coinbase.
#[derive(Debug, Clone)]
pub struct Transaction {
    pub txid: TxId,
    pub inputs: Vec<TxInput>,
    pub outputs: Vec<TxOutput>,
}

impl Transaction {
    /// True for value-minting transactions, which are exempt from the
    /// conservation check.
    pub fn is_coinbase(&self) -> bool {
        self.inputs.is_empty()
    }

    /// Find the output matching a (pool, index) pair, spent or not.
    pub fn find_output(&self, pool: PoolType, index: u32) -> Option<&TxOutput> {
        self.outputs
            .iter()
            .find(|o| o.pool == pool && o.index == index)
    }

    fn find_output_mut(&mut self, pool: PoolType, index: u32) -> Option<&mut TxOutput> {
        self.outputs
            .iter_mut()
            .find(|o| o.pool == pool && o.index == index)
    }
}

/// Append-only registry of transactions plus the id counter.
///
/// Owned by the simulation run and passed by `&mut` into every
/// transaction-producing call; single-writer by construction.
#[derive(Debug, Default)]
pub struct Ledger {
    next_txid: TxId,
    transactions: BTreeMap<TxId, Transaction>,
}

impl Ledger {
    pub fn new() -> Self {
        Ledger::default()
    }

    /// Validate and commit a transaction, returning its assigned id.
    ///
    /// Non-coinbase transactions must spend existing unspent outputs whose
    /// amounts exactly equal the output total. Validation runs in two
    /// phases: every input is resolved and the totals checked before any
    /// spent flag is touched, so a failed apply leaves the ledger exactly
    /// as it was.
    pub fn apply(
        &mut self,
        inputs: Vec<TxInput>,
        outputs: Vec<TxOutput>,
    ) -> Result<TxId, LedgerError> {
        if !inputs.is_empty() {
            let mut referenced = HashSet::new();
            let mut total_in: u64 = 0;
            for input in &inputs {
                let prevout = self.resolve_prevout(input)?;
                if prevout.spent || !referenced.insert((input.prev_txid, input.pool, input.index))
                {
                    return Err(LedgerError::DoubleSpend {
                        txid: input.prev_txid,
                        pool: input.pool,
                        index: input.index,
                    });
                }
                total_in += prevout.amount;
            }

            let total_out: u64 = outputs.iter().map(|o| o.amount).sum();
            if total_in != total_out {
                return Err(LedgerError::ValueMismatch {
                    total_in,
                    total_out,
                });
            }

            // All checks passed; commit the spends.
            for input in &inputs {
                self.resolve_prevout_mut(input)?.spent = true;
            }
        }

        let txid = self.next_txid;
        self.next_txid += 1;
        debug!(
            "applied transaction {} ({} inputs, {} outputs)",
            txid,
            inputs.len(),
            outputs.len()
        );
        self.transactions.insert(
            txid,
            Transaction {
                txid,
                inputs,
                outputs,
            },
        );
        Ok(txid)
    }

    /// Look up a committed transaction by id.
    pub fn transaction(&self, txid: TxId) -> Option<&Transaction> {
        self.transactions.get(&txid)
    }

    /// All committed transactions in id order.
    pub fn transactions(&self) -> impl Iterator<Item = &Transaction> {
        self.transactions.values()
    }

    /// Number of committed transactions.
    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    fn resolve_prevout(&self, input: &TxInput) -> Result<&TxOutput, LedgerError> {
        self.transactions
            .get(&input.prev_txid)
            .and_then(|tx| tx.find_output(input.pool, input.index))
            .ok_or(LedgerError::UnknownPrevout {
                txid: input.prev_txid,
                pool: input.pool,
                index: input.index,
            })
    }

    fn resolve_prevout_mut(&mut self, input: &TxInput) -> Result<&mut TxOutput, LedgerError> {
        self.transactions
            .get_mut(&input.prev_txid)
            .and_then(|tx| tx.find_output_mut(input.pool, input.index))
            .ok_or(LedgerError::UnknownPrevout {
                txid: input.prev_txid,
                pool: input.pool,
                index: input.index,
            })
    }
}
