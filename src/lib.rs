pub mod api;
pub mod config;
pub mod db;
pub mod domain;
pub mod engine;
pub mod error;
pub mod service;

pub use config::Config;
pub use db::{init_db, Repository};
pub use domain::{
    ActiveBalance, Asset, AssetId, Decimal, Investment, User, UserId, Withdrawal,
    WithdrawalCountPolicy, WithdrawalStatus,
};
pub use engine::{Admission, RecalcError, Reconciler, WithdrawalGuard};
pub use error::AppError;
pub use service::LedgerService;
