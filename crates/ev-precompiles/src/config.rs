//! Start-up configuration for extra precompiles.

use alloy_primitives::Address;
use eyre::WrapErr;
use std::{collections::HashSet, env, str::FromStr};
use thiserror::Error;

/// Comma-separated list of extra precompile addresses allowed to register.
pub const EXTRA_PRECOMPILES_ENV: &str = "EV_EXTRA_PRECOMPILES";

/// Block height from which extra precompiles are routed.
pub const EXTRA_PRECOMPILES_ACTIVATION_HEIGHT_ENV: &str = "EV_EXTRA_PRECOMPILES_ACTIVATION_HEIGHT";

/// Configuration for the extra precompile registry.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExtraPrecompilesConfig {
    /// Addresses allowed to register. `None` admits every extra precompile.
    pub enabled: Option<HashSet<Address>>,
    /// Block height from which calls are routed to extra precompiles.
    pub activation_height: u64,
}

impl ExtraPrecompilesConfig {
    /// Creates a configuration that admits every extra precompile from genesis.
    pub const fn new() -> Self {
        Self {
            enabled: None,
            activation_height: 0,
        }
    }

    /// Restricts registration to the given addresses.
    pub fn with_enabled(mut self, addresses: impl IntoIterator<Item = Address>) -> Self {
        self.enabled = Some(addresses.into_iter().collect());
        self
    }

    /// Sets the activation height.
    pub const fn with_activation_height(mut self, activation_height: u64) -> Self {
        self.activation_height = activation_height;
        self
    }

    /// Returns true if an extra precompile at `address` may be registered.
    pub fn is_enabled(&self, address: &Address) -> bool {
        self.enabled
            .as_ref()
            .is_none_or(|enabled| enabled.contains(address))
    }

    /// Returns true if extra precompiles are routed at the given block.
    pub const fn is_active(&self, block_number: u64) -> bool {
        block_number >= self.activation_height
    }

    /// Loads the configuration from environment variables.
    ///
    /// Both variables are optional; unset or blank values keep the defaults.
    pub fn from_env() -> eyre::Result<Self> {
        let mut config = Self::new();

        if let Some(raw) = non_empty_var(EXTRA_PRECOMPILES_ENV) {
            let enabled = parse_address_list(&raw)
                .wrap_err_with(|| format!("failed to parse {EXTRA_PRECOMPILES_ENV}"))?;
            config.enabled = Some(enabled);
        }

        if let Some(raw) = non_empty_var(EXTRA_PRECOMPILES_ACTIVATION_HEIGHT_ENV) {
            config.activation_height = parse_activation_height(&raw).wrap_err_with(|| {
                format!("failed to parse {EXTRA_PRECOMPILES_ACTIVATION_HEIGHT_ENV}")
            })?;
        }

        Ok(config)
    }
}

/// Errors that can occur while parsing an [`ExtraPrecompilesConfig`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// An entry of the address list could not be parsed.
    #[error("invalid precompile address {value:?}: {reason}")]
    InvalidAddress {
        /// The offending entry.
        value: String,
        /// Parser message.
        reason: String,
    },
    /// The address list contained no entries.
    #[error("precompile address list is empty")]
    EmptyAddressList,
    /// The activation height is not a valid block number.
    #[error("invalid activation height {0:?}")]
    InvalidActivationHeight(String),
}

/// Parses a comma-separated list of addresses. Blank entries are ignored.
pub fn parse_address_list(raw: &str) -> Result<HashSet<Address>, ConfigError> {
    let addresses = raw
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            Address::from_str(entry).map_err(|err| ConfigError::InvalidAddress {
                value: entry.to_string(),
                reason: err.to_string(),
            })
        })
        .collect::<Result<HashSet<_>, _>>()?;

    if addresses.is_empty() {
        return Err(ConfigError::EmptyAddressList);
    }
    Ok(addresses)
}

/// Parses a block height.
pub fn parse_activation_height(raw: &str) -> Result<u64, ConfigError> {
    let raw = raw.trim();
    raw.parse()
        .map_err(|_| ConfigError::InvalidActivationHeight(raw.to_string()))
}

fn non_empty_var(var: &str) -> Option<String> {
    env::var(var).ok().filter(|raw| !raw.trim().is_empty())
}
