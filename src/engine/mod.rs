//! Balance reconciliation engine.
//!
//! This module provides:
//! - `Reconciler` - recomputes a (user, asset) net holding from the ledger
//!   and maintains the single materialized active-balance record
//! - `WithdrawalGuard` - the pre-write admission check that prevents
//!   overdraws
//! - `PairLocks` - per-(user, asset) serialization for the
//!   read-compute-write sequences of both

pub mod admission;
pub mod locks;
pub mod recalculator;

pub use admission::{Admission, WithdrawalGuard};
pub use locks::PairLocks;
pub use recalculator::{RecalcError, Reconciler};
