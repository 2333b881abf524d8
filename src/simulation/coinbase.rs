//! Per-period coinbase distribution.
//!
//! Each period mints a fixed budget through a single zero-input
//! transaction whose outputs are random-sized chunks handed to randomly
//! chosen users. A chunk is shielded with a fixed probability; shielded
//! chunks land in whichever shielded pool is active for the period.

use log::debug;
use rand::rngs::StdRng;
use rand::Rng;

use crate::ledger::{Ledger, LedgerError, PoolType, TxId, TxOutput, User};

/// Parameters for one period's coinbase distribution.
#[derive(Debug, Clone)]
pub struct CoinbaseParams {
    /// Total newly minted value for the period
    pub mint_amount: u64,
    /// Below this remaining budget the whole remainder is paid out in one
    /// chunk, bounding the chunk count and avoiding dust loops
    pub min_chunk: u64,
    /// Probability that a chunk goes to the active shielded pool
    pub shielded_probability: f64,
    /// Shielded pool active for this period
    pub shielded_pool: PoolType,
}

/// Mint one period's budget and register the chunks with their owners.
///
/// Returns the id of the coinbase transaction. The transaction's outputs
/// always sum to exactly `mint_amount` and every chunk is strictly
/// positive; a drawn amount of zero is discarded and redrawn.
pub fn distribute_coinbase(
    ledger: &mut Ledger,
    users: &mut [User],
    params: &CoinbaseParams,
    rng: &mut StdRng,
) -> Result<TxId, LedgerError> {
    let mut outputs: Vec<TxOutput> = Vec::new();
    let mut owners: Vec<usize> = Vec::new();

    let mut remaining = params.mint_amount;
    while remaining > 0 {
        let amount = if remaining > params.min_chunk {
            rng.gen_range(0..=remaining)
        } else {
            remaining
        };
        if amount == 0 {
            continue;
        }

        let pool = if rng.gen_bool(params.shielded_probability) {
            params.shielded_pool
        } else {
            PoolType::Transparent
        };
        let index = outputs.iter().filter(|o| o.pool == pool).count() as u32;
        outputs.push(TxOutput::new(pool, index, amount)?);
        owners.push(rng.gen_range(0..users.len()));

        remaining -= amount;
    }

    let placements: Vec<(PoolType, u32)> = outputs.iter().map(|o| (o.pool, o.index)).collect();
    let txid = ledger.apply(Vec::new(), outputs)?;

    for ((pool, index), &owner) in placements.iter().zip(&owners) {
        users[owner].add_output(txid, *pool, *index);
    }
    debug!(
        "coinbase {} minted {} across {} outputs",
        txid,
        params.mint_amount,
        placements.len()
    );

    Ok(txid)
}
