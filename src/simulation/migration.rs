//! Per-user migration strategies moving value between pools.

use log::debug;
use rand::rngs::StdRng;
use rand::Rng;

use crate::ledger::{Ledger, LedgerError, PoolType, TxId, TxInput, TxOutput, User};
use crate::simulation::selection::{select_notes, SelectionError};

/// Source and destination pools for a migration.
#[derive(Debug, Clone, Copy)]
pub struct MigrationPools {
    pub source: PoolType,
    pub destination: PoolType,
}

/// Migration policy applied to each user every period.
///
/// Modeled as a closed variant set with a single `on_period` capability;
/// new tiers slot in as additional variants without touching the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum MigrationStrategy {
    /// Never migrates anything
    NoOp,
    /// Each period, migrates a uniformly drawn amount in
    /// `[lowerbound, upperbound]`, capped at the user's source-pool balance
    UniformRandom { lowerbound: u64, upperbound: u64 },
}

impl MigrationStrategy {
    /// Run the strategy for one user at one period, returning the ids of
    /// any migration transactions produced.
    ///
    /// A zero source-pool balance (or a capped target of zero) is an
    /// inactive period, not an error.
    pub fn on_period(
        &self,
        user: &mut User,
        height: u64,
        pools: &MigrationPools,
        ledger: &mut Ledger,
        rng: &mut StdRng,
    ) -> Result<Vec<TxId>, LedgerError> {
        match self {
            MigrationStrategy::NoOp => Ok(Vec::new()),
            MigrationStrategy::UniformRandom {
                lowerbound,
                upperbound,
            } => {
                let drawn = rng.gen_range(*lowerbound..=*upperbound);
                let balance = user.balance(pools.source, ledger);
                let target = drawn.min(balance);
                if target == 0 {
                    return Ok(Vec::new());
                }

                let candidates = user.unspent_outputs(pools.source, ledger);
                let amounts: Vec<u64> = candidates.iter().map(|(_, amount)| *amount).collect();
                let selection = match select_notes(&amounts, target) {
                    Ok(selection) => selection,
                    Err(SelectionError::InsufficientFunds {
                        available,
                        requested,
                    }) => {
                        debug!(
                            "user {} skipping migration at height {}: {} available, {} requested",
                            user.user_id, height, available, requested
                        );
                        return Ok(Vec::new());
                    }
                };

                let inputs: Vec<TxInput> = candidates[..selection.selected.len()]
                    .iter()
                    .map(|(record, _)| TxInput {
                        pool: record.pool,
                        prev_txid: record.txid,
                        index: record.index,
                    })
                    .collect();

                let mut outputs = vec![TxOutput::new(pools.destination, 0, target)?];
                if selection.change > 0 {
                    outputs.push(TxOutput::new(pools.source, 0, selection.change)?);
                }
                let placements: Vec<(PoolType, u32)> =
                    outputs.iter().map(|o| (o.pool, o.index)).collect();

                let txid = ledger.apply(inputs, outputs)?;
                for (pool, index) in placements {
                    user.add_output(txid, pool, index);
                }

                debug!(
                    "user {} migrated {} from {} to {} at height {} (change {})",
                    user.user_id, target, pools.source, pools.destination, height, selection.change
                );
                Ok(vec![txid])
            }
        }
    }
}
