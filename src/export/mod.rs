//! CSV export of simulated chain history and user balance tables.
//!
//! Produces the two dataset shapes downstream tooling consumes: the full
//! transaction history (one row per period and transaction, with the
//! input/output lists serialized as JSON) and per-pool balance-distribution
//! tables sorted by balance with a totals row.

use std::cmp::Reverse;
use std::fs;
use std::path::Path;

use color_eyre::eyre::{eyre, Context, Result};
use serde::Serialize;

use crate::config::COIN;
use crate::ledger::{PoolType, Transaction, User};
use crate::simulation::SimulationResult;

/// Row-level rendering of an input reference
#[derive(Serialize)]
struct InputRecord {
    tx_type: char,
    prev_tx: u64,
    index: u32,
}

/// Row-level rendering of an output
#[derive(Serialize)]
struct OutputRecord {
    tx_type: char,
    index: u32,
    amount: u64,
    spent: bool,
}

/// Quote a CSV field, doubling any embedded quotes
fn csv_quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

/// Render zatoshis as whole coins with 8 decimal places
fn format_coins(zatoshis: u64) -> String {
    format!("{}.{:08}", zatoshis / COIN, zatoshis % COIN)
}

fn serialize_inputs(tx: &Transaction) -> Result<String> {
    let records: Vec<InputRecord> = tx
        .inputs
        .iter()
        .map(|input| InputRecord {
            tx_type: input.pool.as_char(),
            prev_tx: input.prev_txid,
            index: input.index,
        })
        .collect();
    serde_json::to_string(&records).context("Failed to serialize transaction inputs")
}

fn serialize_outputs(tx: &Transaction) -> Result<String> {
    let records: Vec<OutputRecord> = tx
        .outputs
        .iter()
        .map(|output| OutputRecord {
            tx_type: output.pool.as_char(),
            index: output.index,
            amount: output.amount,
            spent: output.spent,
        })
        .collect();
    serde_json::to_string(&records).context("Failed to serialize transaction outputs")
}

/// Write the full chain history, one row per (period, transaction).
pub fn write_chain_file(result: &SimulationResult, output_path: &Path) -> Result<()> {
    let mut lines: Vec<String> = Vec::new();
    lines.push("block_height,txid,inputs,outputs".to_string());

    for record in &result.chain {
        for txid in &record.txids {
            let tx = result
                .ledger
                .transaction(*txid)
                .ok_or_else(|| eyre!("chain references unknown transaction {}", txid))?;
            lines.push(format!(
                "{},{},{},{}",
                record.height,
                tx.txid,
                csv_quote(&serialize_inputs(tx)?),
                csv_quote(&serialize_outputs(tx)?),
            ));
        }
    }

    fs::write(output_path, lines.join("\n") + "\n")
        .with_context(|| format!("Failed to write chain file to {}", output_path.display()))?;

    log::info!(
        "Chain history written to {} ({} rows)",
        output_path.display(),
        lines.len() - 1
    );
    Ok(())
}

/// Write the per-user balance table sorted descending by `sort_pool`
/// balance, with a totals row whose last cell is the grand total.
pub fn write_balance_file(
    result: &SimulationResult,
    sort_pool: PoolType,
    output_path: &Path,
) -> Result<()> {
    let mut users: Vec<&User> = result.users.iter().collect();
    users.sort_by_key(|user| Reverse(user.balance(sort_pool, &result.ledger)));

    let mut lines: Vec<String> = Vec::new();
    lines.push(
        "user_id,sprout_balance,sapling_balance,transparent_balance,total_balance".to_string(),
    );

    let mut totals = [0u64; 3];
    for user in &users {
        let sprout = user.balance(PoolType::Sprout, &result.ledger);
        let sapling = user.balance(PoolType::Sapling, &result.ledger);
        let transparent = user.balance(PoolType::Transparent, &result.ledger);
        totals[0] += sprout;
        totals[1] += sapling;
        totals[2] += transparent;
        lines.push(format!(
            "{},{},{},{},{}",
            user.user_id,
            format_coins(sprout),
            format_coins(sapling),
            format_coins(transparent),
            format_coins(sprout + sapling + transparent),
        ));
    }

    let grand_total: u64 = totals.iter().sum();
    lines.push(format!(
        "total,{},{},{},{}",
        format_coins(totals[0]),
        format_coins(totals[1]),
        format_coins(totals[2]),
        format_coins(grand_total),
    ));

    fs::write(output_path, lines.join("\n") + "\n")
        .with_context(|| format!("Failed to write balance file to {}", output_path.display()))?;

    log::info!(
        "{} balance table written to {}",
        sort_pool,
        output_path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MigrationConfig, SimulationConfig};
    use crate::simulation::simulate;
    use tempfile::TempDir;

    fn run_small_simulation() -> SimulationResult {
        let config = SimulationConfig {
            periods: 10,
            activation_period: 5,
            user_count: 3,
            mint_per_period: 1_000,
            min_chunk: 50,
            shielded_probability: 0.3,
            seed: 5,
            migration: MigrationConfig::UniformRandom {
                lowerbound: 10,
                upperbound: 50,
                source_pool: PoolType::Sprout,
                destination_pool: PoolType::Sapling,
            },
        };
        simulate(&config).unwrap()
    }

    #[test]
    fn test_format_coins() {
        assert_eq!(format_coins(0), "0.00000000");
        assert_eq!(format_coins(COIN), "1.00000000");
        assert_eq!(format_coins(COIN / 2), "0.50000000");
        assert_eq!(format_coins(10 * COIN + 1), "10.00000001");
    }

    #[test]
    fn test_csv_quote_escapes_embedded_quotes() {
        assert_eq!(csv_quote(r#"a"b"#), r#""a""b""#);
        assert_eq!(csv_quote("plain"), "\"plain\"");
    }

    #[test]
    fn test_chain_file_layout() {
        let result = run_small_simulation();
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("blockchain.csv");

        write_chain_file(&result, &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let mut rows = content.lines();
        assert_eq!(rows.next().unwrap(), "block_height,txid,inputs,outputs");

        let tx_count: usize = result.chain.iter().map(|r| r.txids.len()).sum();
        assert_eq!(rows.count(), tx_count);

        // Coinbase rows have empty input lists.
        let second = content.lines().nth(1).unwrap();
        assert!(second.starts_with("1,0,"));
        assert!(second.contains("\"[]\""));
    }

    #[test]
    fn test_balance_file_layout() {
        let result = run_small_simulation();
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("user_balance_sapling.csv");

        write_balance_file(&result, PoolType::Sapling, &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let rows: Vec<&str> = content.lines().collect();
        assert_eq!(
            rows[0],
            "user_id,sprout_balance,sapling_balance,transparent_balance,total_balance"
        );
        // One row per user plus the totals row.
        assert_eq!(rows.len(), 1 + 3 + 1);
        assert!(rows[rows.len() - 1].starts_with("total,"));

        // Users are sorted descending by the chosen pool's balance.
        let sorted: Vec<u64> = rows[1..rows.len() - 1]
            .iter()
            .map(|row| {
                let user_id: u32 = row.split(',').next().unwrap().parse().unwrap();
                result.balance(user_id, PoolType::Sapling)
            })
            .collect();
        let mut expected = sorted.clone();
        expected.sort_by_key(|balance| Reverse(*balance));
        assert_eq!(sorted, expected);
    }

    #[test]
    fn test_totals_row_sums_to_minted_supply() {
        let result = run_small_simulation();
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("balances.csv");

        write_balance_file(&result, PoolType::Sprout, &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let totals_row = content.lines().last().unwrap();
        let grand_total = totals_row.split(',').last().unwrap();
        // 10 periods x 1000 zatoshis minted.
        assert_eq!(grand_total, format_coins(10_000));
    }
}
