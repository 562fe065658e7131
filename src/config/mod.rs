//! Configuration management for treasury-guard
//!
//! Supports loading configuration from:
//! - Built-in defaults
//! - Config file (treasury-guard.toml)
//! - Environment variables (TREASURY_GUARD_<SECTION>__<KEY>)

use crate::errors::{Result, TreasuryError};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Ethereum adapter configuration
    pub ethereum: EthereumConfig,

    /// Policy evaluation configuration
    pub policy: PolicyConfig,
}

/// Ethereum adapter configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EthereumConfig {
    /// EIP-155 chain id used for signing hashes
    pub chain_id: u64,

    /// Coin identifier prefix of the native currency
    pub coin_prefix: String,

    /// Accept EIP-1559 typed transactions next to legacy ones
    pub accept_typed_transactions: bool,
}

impl Default for EthereumConfig {
    fn default() -> Self {
        Self {
            chain_id: 1,
            coin_prefix: "ETH/".to_string(),
            accept_typed_transactions: true,
        }
    }
}

/// Policy evaluation configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Maximum nesting depth of an approval expression
    pub max_expression_depth: usize,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            max_expression_depth: 32,
        }
    }
}

impl Config {
    /// Load configuration from file and environment
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let defaults = config::Config::try_from(&Config::default())
            .map_err(|e| TreasuryError::ConfigError(e.to_string()))?;

        let mut builder = config::Config::builder().add_source(defaults);

        if let Some(path) = config_path {
            builder = builder.add_source(config::File::with_name(path).required(true));
        } else {
            builder = builder
                .add_source(config::File::with_name("treasury-guard").required(false));
        }

        // TREASURY_GUARD_ETHEREUM__CHAIN_ID, etc.
        builder = builder.add_source(
            config::Environment::with_prefix("TREASURY_GUARD")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: Config = builder
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| TreasuryError::ConfigError(e.to_string()))?;

        info!(
            chain_id = config.ethereum.chain_id,
            "Loaded treasury-guard configuration"
        );
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.ethereum.chain_id == 0 {
            return Err(TreasuryError::ConfigError(
                "ethereum.chain_id must be non-zero".to_string(),
            ));
        }

        if self.ethereum.coin_prefix.is_empty() {
            return Err(TreasuryError::ConfigError(
                "ethereum.coin_prefix must not be empty".to_string(),
            ));
        }

        if self.policy.max_expression_depth == 0 {
            return Err(TreasuryError::ConfigError(
                "policy.max_expression_depth must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}
