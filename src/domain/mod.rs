//! Domain types for the investment ledger.
//!
//! This module provides:
//! - Lossless numeric handling via a Decimal wrapper
//! - Typed identifiers: UserId, AssetId
//! - Ledger record types: Investment, Withdrawal, ActiveBalance, Asset
//! - Withdrawal status lifecycle and balance-counting policies

pub mod asset;
pub mod balance;
pub mod decimal;
pub mod investment;
pub mod primitives;
pub mod user;
pub mod withdrawal;

pub use asset::Asset;
pub use balance::ActiveBalance;
pub use decimal::Decimal;
pub use investment::Investment;
pub use primitives::{AssetId, UserId};
pub use user::User;
pub use withdrawal::{Withdrawal, WithdrawalCountPolicy, WithdrawalStatus};
