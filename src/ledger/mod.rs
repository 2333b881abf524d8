//! Ledger primitives: pools, outputs, inputs, transactions, and users.

pub mod transaction;
pub mod types;
pub mod user;

pub use transaction::{Ledger, LedgerError, Transaction, TxId};
pub use types::{PoolType, TxInput, TxOutput};
pub use user::{OwnedOutput, User};
