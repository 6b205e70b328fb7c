//! Implementations of the deploy-script commands

use tracing::info;

use crate::{
    cli::{DeployArgs, ImplementationArgs},
    config::{resolve_profile, EnvSource},
    errors::ScriptError,
    orchestrator::DeploymentOrchestrator,
    proxy::{resolve_implementation, ArtifactStore, EthersDeployer},
    types::{DeploymentPlan, WiringInstructions},
    utils::{parse_address, parse_amount, read_deployed_proxy, setup_client, write_deployments},
};

/// Deploy the full plan against the selected network, print the address
/// report, and record it in the deployments file
pub async fn deploy(args: DeployArgs, network: Option<String>) -> Result<(), ScriptError> {
    let network = network.ok_or(ScriptError::UnresolvedNetwork)?;
    let profile = resolve_profile(&network, &EnvSource)?;

    let wiring = WiringInstructions {
        fee_recipient: parse_address(&args.fee_recipient)?,
        listing_fee: parse_amount(&args.listing_fee)?,
        payment_token: parse_address(&args.token_sale)?,
    };

    let client = setup_client(&profile).await?;
    let deployer = EthersDeployer::new(client, ArtifactStore::new(args.artifacts_dir), &profile);
    let orchestrator = DeploymentOrchestrator::new(deployer);

    let report = orchestrator
        .run(&DeploymentPlan::standard(), Some(&profile), &wiring)
        .await?;

    println!("{}", report);

    write_deployments(&args.deployments_path, &report)?;
    info!("addresses recorded in {}", args.deployments_path);

    Ok(())
}

/// Print the implementation address behind a deployed proxy
pub async fn implementation(
    args: ImplementationArgs,
    network: Option<String>,
) -> Result<(), ScriptError> {
    let network = network.ok_or(ScriptError::UnresolvedNetwork)?;
    let profile = resolve_profile(&network, &EnvSource)?;

    let proxy = match (args.proxy, args.contract) {
        (Some(address), _) => parse_address(&address)?,
        (None, Some(contract)) => {
            read_deployed_proxy(&args.deployments_path, contract.deployments_stem())?
        }
        (None, None) => {
            return Err(ScriptError::CalldataConstruction(
                "either --proxy or --contract is required".to_string(),
            ))
        }
    };

    let client = setup_client(&profile).await?;
    let implementation = resolve_implementation(client.as_ref(), proxy).await?;

    println!("Proxy {:#x} delegates to {:#x}", proxy, implementation);

    Ok(())
}
