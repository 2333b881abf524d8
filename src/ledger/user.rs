//! Users and their output ownership records.

use super::transaction::{Ledger, TxId};
use super::types::PoolType;

/// Ownership record pointing at one output of a committed transaction.
///
/// Records are keys, not copies: the spent flag and amount live in the
/// ledger, which stays the single owner of output state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OwnedOutput {
    pub txid: TxId,
    pub pool: PoolType,
    pub index: u32,
}

/// Account-like aggregator of received outputs across pools.
///
/// Ownership records are never removed, even after the referenced output
/// is spent; balance queries filter on the current spent flag instead.
#[derive(Debug, Clone)]
pub struct User {
    pub user_id: u32,
    outputs: Vec<OwnedOutput>,
}

impl User {
    pub fn new(user_id: u32) -> Self {
        User {
            user_id,
            outputs: Vec::new(),
        }
    }

    /// Record ownership of an output.
    pub fn add_output(&mut self, txid: TxId, pool: PoolType, index: u32) {
        self.outputs.push(OwnedOutput { txid, pool, index });
    }

    /// All ownership records in the order they were received.
    pub fn outputs(&self) -> &[OwnedOutput] {
        &self.outputs
    }

    /// Sum of this user's currently-unspent outputs in the given pool.
    pub fn balance(&self, pool: PoolType, ledger: &Ledger) -> u64 {
        self.unspent_outputs(pool, ledger)
            .iter()
            .map(|(_, amount)| amount)
            .sum()
    }

    /// This user's unspent outputs in the given pool, with their amounts,
    /// in ownership-record order.
    pub fn unspent_outputs(&self, pool: PoolType, ledger: &Ledger) -> Vec<(OwnedOutput, u64)> {
        self.outputs
            .iter()
            .filter(|record| record.pool == pool)
            .filter_map(|record| {
                ledger
                    .transaction(record.txid)
                    .and_then(|tx| tx.find_output(record.pool, record.index))
                    .filter(|output| !output.spent)
                    .map(|output| (*record, output.amount))
            })
            .collect()
    }
}
