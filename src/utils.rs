//! Utilities for the deploy scripts.

use std::{
    fs::{self, File},
    io::Read,
    path::PathBuf,
    str::FromStr,
    sync::Arc,
};

use ethers::{
    middleware::SignerMiddleware,
    providers::{Http, Middleware, Provider},
    signers::{LocalWallet, Signer},
    types::{Address, U256},
};
use json::JsonValue;

use crate::{
    config::NetworkProfile,
    constants::{DEPLOYMENTS_KEY, IMPLEMENTATION_KEY_SUFFIX, PROXY_KEY_SUFFIX},
    errors::ScriptError,
    types::DeploymentReport,
};

/// Sets up the client with which to deploy and call contracts, connecting to
/// the profile's endpoint and signing with its credential
pub async fn setup_client(profile: &NetworkProfile) -> Result<Arc<impl Middleware>, ScriptError> {
    let provider = Provider::<Http>::try_from(profile.rpc_url.as_str())
        .map_err(|e| ScriptError::ClientInitialization(e.to_string()))?;

    let wallet = LocalWallet::from_str(&profile.private_key)
        .map_err(|e| ScriptError::ClientInitialization(e.to_string()))?;

    let chain_id = match profile.chain_id {
        Some(chain_id) => chain_id,
        None => provider
            .get_chainid()
            .await
            .map_err(|e| ScriptError::ClientInitialization(e.to_string()))?
            .as_u64(),
    };

    let client = Arc::new(SignerMiddleware::new(
        provider,
        wallet.with_chain_id(chain_id),
    ));

    Ok(client)
}

/// Parse a hex address from a CLI argument
pub fn parse_address(address: &str) -> Result<Address, ScriptError> {
    Address::from_str(address).map_err(|e| ScriptError::CalldataConstruction(e.to_string()))
}

/// Parse a decimal base-unit amount from a CLI argument
pub fn parse_amount(amount: &str) -> Result<U256, ScriptError> {
    U256::from_dec_str(amount).map_err(|e| ScriptError::CalldataConstruction(e.to_string()))
}

/// Parse the JSON file at the given path
fn get_json_from_file(file_path: &str) -> Result<JsonValue, ScriptError> {
    let mut file_contents = String::new();
    File::open(file_path)
        .map_err(|e| ScriptError::ReadDeployments(e.to_string()))?
        .read_to_string(&mut file_contents)
        .map_err(|e| ScriptError::ReadDeployments(e.to_string()))?;

    json::parse(&file_contents).map_err(|e| ScriptError::ReadDeployments(e.to_string()))
}

/// Record a report's addresses in the deployments file, merging with any
/// addresses already recorded there
pub fn write_deployments(file_path: &str, report: &DeploymentReport) -> Result<(), ScriptError> {
    // If the file doesn't exist, create it
    if !PathBuf::from(file_path).exists() {
        fs::write(file_path, "{}").map_err(|e| ScriptError::WriteDeployments(e.to_string()))?;
    }
    let mut parsed_json = get_json_from_file(file_path)?;

    for entry in report.entries() {
        let stem = entry.contract.deployments_stem();
        let proxy_key = format!("{}{}", stem, PROXY_KEY_SUFFIX);
        let implementation_key = format!("{}{}", stem, IMPLEMENTATION_KEY_SUFFIX);

        parsed_json[DEPLOYMENTS_KEY][proxy_key.as_str()] =
            JsonValue::String(format!("{:#x}", entry.proxy));
        parsed_json[DEPLOYMENTS_KEY][implementation_key.as_str()] =
            JsonValue::String(format!("{:#x}", entry.implementation));
    }

    fs::write(file_path, json::stringify_pretty(parsed_json, 4))
        .map_err(|e| ScriptError::WriteDeployments(e.to_string()))?;

    Ok(())
}

/// Read a recorded proxy address back out of the deployments file
pub fn read_deployed_proxy(file_path: &str, stem: &str) -> Result<Address, ScriptError> {
    let parsed_json = get_json_from_file(file_path)?;
    let proxy_key = format!("{}{}", stem, PROXY_KEY_SUFFIX);

    Address::from_str(
        parsed_json[DEPLOYMENTS_KEY][proxy_key.as_str()]
            .as_str()
            .ok_or_else(|| {
                ScriptError::ReadDeployments(
                    "could not parse contract address from deployments file".to_string(),
                )
            })?,
    )
    .map_err(|e| ScriptError::ReadDeployments(e.to_string()))
}
