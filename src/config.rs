//! Resolution of per-network connection and signing parameters.
//!
//! Profiles are resolved once, up front, from a flat key-value source keyed
//! `{NETWORK}_{SETTING}`, and threaded through the deployment flow as
//! immutable values. Deployment logic never reads the environment itself, so
//! a malformed profile surfaces here rather than mid-deployment.

use std::env;

use crate::{
    constants::{
        CHAIN_ID_SETTING, GAS_LIMIT_SETTING, GAS_PRICE_SETTING, PRIVATE_KEY_SETTING,
        RPC_URL_SETTING,
    },
    errors::ScriptError,
};

/// A flat key-value source of configuration settings
pub trait ConfigSource {
    /// Look up the raw value of a setting key
    fn get(&self, key: &str) -> Option<String>;
}

/// The process environment as a configuration source
pub struct EnvSource;

impl ConfigSource for EnvSource {
    fn get(&self, key: &str) -> Option<String> {
        env::var(key).ok()
    }
}

/// The resolved connection and signing parameters of one deployment target
#[derive(Debug, Clone)]
pub struct NetworkProfile {
    /// The network's name
    pub name: String,
    /// The RPC endpoint URL
    pub rpc_url: String,
    /// The deployer's private key, in hex
    pub private_key: String,
    /// The gas limit applied to each transaction
    pub gas_limit: u64,
    /// The gas price applied to each transaction
    pub gas_price: u64,
    /// The chain ID, where the network pins one; queried from the node otherwise
    pub chain_id: Option<u64>,
}

/// The setting-key prefix of each known network
fn env_prefix(network: &str) -> Option<&'static str> {
    match network {
        "local" => Some("LOCAL"),
        "ropsten" => Some("ROPSTEN"),
        "mainnet" => Some("MAINNET"),
        "bsctest" => Some("BSCTESTNET"),
        "bsc" => Some("BSCMAINNET"),
        _ => None,
    }
}

/// Resolve the full profile of the given network from the configuration
/// source.
///
/// Fails on the first missing required key; no partial profile is ever
/// returned.
pub fn resolve_profile(
    network: &str,
    source: &impl ConfigSource,
) -> Result<NetworkProfile, ScriptError> {
    let prefix =
        env_prefix(network).ok_or_else(|| ScriptError::UnsupportedNetwork(network.to_string()))?;

    let rpc_url = require(source, prefix, RPC_URL_SETTING)?;
    let private_key = require(source, prefix, PRIVATE_KEY_SETTING)?;
    let gas_limit = require_numeric(source, prefix, GAS_LIMIT_SETTING)?;
    let gas_price = require_numeric(source, prefix, GAS_PRICE_SETTING)?;
    let chain_id = optional_numeric(source, prefix, CHAIN_ID_SETTING)?;

    Ok(NetworkProfile {
        name: network.to_string(),
        rpc_url,
        private_key,
        gas_limit,
        gas_price,
        chain_id,
    })
}

/// The full key of a setting for the given network prefix
fn setting_key(prefix: &str, setting: &str) -> String {
    format!("{}_{}", prefix, setting)
}

/// Read a required setting, failing with the key's name if absent
fn require(source: &impl ConfigSource, prefix: &str, setting: &str) -> Result<String, ScriptError> {
    let key = setting_key(prefix, setting);
    source
        .get(&key)
        .ok_or(ScriptError::MissingConfiguration(key))
}

/// Read a required numeric setting, rejecting values that do not parse as
/// non-negative integers
fn require_numeric(
    source: &impl ConfigSource,
    prefix: &str,
    setting: &str,
) -> Result<u64, ScriptError> {
    let key = setting_key(prefix, setting);
    let raw = require(source, prefix, setting)?;
    raw.parse::<u64>()
        .map_err(|_| ScriptError::InvalidConfiguration(key, raw))
}

/// Read an optional numeric setting, still rejecting present-but-malformed
/// values
fn optional_numeric(
    source: &impl ConfigSource,
    prefix: &str,
    setting: &str,
) -> Result<Option<u64>, ScriptError> {
    let key = setting_key(prefix, setting);
    match source.get(&key) {
        Some(raw) => raw
            .parse::<u64>()
            .map(Some)
            .map_err(|_| ScriptError::InvalidConfiguration(key, raw)),
        None => Ok(None),
    }
}
