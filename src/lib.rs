//! # Poolsim - Synthetic multi-pool ledger history generator
//!
//! This library synthesizes a plausible history of ledger transactions for
//! a multi-pool (transparent / sprout / sapling) accounting model, for
//! generating test fixtures and balance-distribution datasets.
//!
//! ## Overview
//!
//! Poolsim is not a live ledger: there is no networking, no consensus, no
//! cross-run persistence, and no real cryptography. Each simulated period
//! mints a fixed budget through a coinbase transaction whose chunks are
//! randomly sized, randomly shielded, and handed to randomly chosen users;
//! per-user migration strategies may then move value from one pool to
//! another using greedy note selection. Every non-coinbase transaction
//! conserves value exactly and spends each output at most once.
//!
//! ## Key Features
//!
//! - **Deterministic**: identical seed and configuration reproduce the
//!   run byte-for-byte
//! - **Conservation checked**: transaction application validates value
//!   conservation and double-spends before committing any state
//! - **Pluggable migration policies**: no-op or uniform-random, selected
//!   in configuration
//! - **Tabular export**: chain history and per-pool balance-distribution
//!   tables as CSV
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - `config`: Type-safe configuration structures and YAML parsing
//! - `ledger`: Pools, outputs, inputs, transactions, the transaction
//!   registry, and users
//! - `simulation`: Coinbase distribution, note selection, migration
//!   strategies, and the period-loop engine
//! - `export`: CSV export of chain history and balance tables
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use poolsim::config::SimulationConfig;
//! use poolsim::ledger::PoolType;
//! use poolsim::simulation::simulate;
//!
//! let config = SimulationConfig::default();
//! let result = simulate(&config)?;
//!
//! for user in &result.users {
//!     println!(
//!         "user {}: {} sapling zatoshis",
//!         user.user_id,
//!         user.balance(PoolType::Sapling, &result.ledger)
//!     );
//! }
//! # Ok::<(), color_eyre::eyre::Error>(())
//! ```
//!
//! ## Error Handling
//!
//! Ledger and selection invariants are reported through typed errors
//! (`LedgerError`, `SelectionError`); the driver layers use `color_eyre`
//! for error reporting with context.

pub mod config;
pub mod export;
pub mod ledger;
pub mod simulation;
