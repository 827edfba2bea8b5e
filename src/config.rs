use crate::domain::WithdrawalCountPolicy;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_path: String,
    /// Which withdrawals the recalculator counts against the materialized
    /// balance. Defaults to `complete-only`: the balance moves when a
    /// payout completes.
    pub recalc_withdrawal_policy: WithdrawalCountPolicy,
    /// Which withdrawals the admission check counts as already withdrawn.
    /// Defaults to `exclude-rejected`: pending requests reserve funds.
    pub admission_withdrawal_policy: WithdrawalCountPolicy,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let port = env_map
            .get("PORT")
            .map(|s| s.as_str())
            .unwrap_or("8080")
            .parse::<u16>()
            .map_err(|_| {
                ConfigError::InvalidValue("PORT".to_string(), "must be a valid u16".to_string())
            })?;

        let database_path = env_map
            .get("DATABASE_PATH")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("DATABASE_PATH".to_string()))?;

        let recalc_withdrawal_policy = parse_policy(
            &env_map,
            "RECALC_WITHDRAWAL_POLICY",
            WithdrawalCountPolicy::CompleteOnly,
        )?;

        let admission_withdrawal_policy = parse_policy(
            &env_map,
            "ADMISSION_WITHDRAWAL_POLICY",
            WithdrawalCountPolicy::ExcludeRejected,
        )?;

        Ok(Config {
            port,
            database_path,
            recalc_withdrawal_policy,
            admission_withdrawal_policy,
        })
    }
}

fn parse_policy(
    env_map: &HashMap<String, String>,
    key: &str,
    default: WithdrawalCountPolicy,
) -> Result<WithdrawalCountPolicy, ConfigError> {
    match env_map.get(key).map(|s| s.as_str()) {
        None => Ok(default),
        Some("complete-only") => Ok(WithdrawalCountPolicy::CompleteOnly),
        Some("exclude-rejected") => Ok(WithdrawalCountPolicy::ExcludeRejected),
        Some(other) => Err(ConfigError::InvalidValue(
            key.to_string(),
            format!("must be complete-only or exclude-rejected, got {}", other),
        )),
    }
}
