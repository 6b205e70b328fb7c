//! Definitions of CLI arguments and commands for the deploy scripts

use clap::{Args, Parser, Subcommand};

use crate::{
    commands::{deploy, implementation},
    constants::{
        DEFAULT_ARTIFACTS_DIR, DEFAULT_DEPLOYMENTS_PATH, DEFAULT_FEE_RECIPIENT,
        DEFAULT_LISTING_FEE, DEFAULT_PAYMENT_TOKEN,
    },
    errors::ScriptError,
    types::ContractId,
};

/// Deploy and wire the upgradeable marketplace contracts
#[derive(Parser)]
pub struct Cli {
    /// Name of the target network; its profile is resolved from the
    /// environment
    #[arg(short, long, env = "DEPLOY_NETWORK")]
    pub network: Option<String>,

    /// The command to run
    #[command(subcommand)]
    pub command: Command,
}

/// The supported deploy-script commands
#[derive(Subcommand)]
pub enum Command {
    /// Deploy the WhiteList, NFT, and Market proxies and wire them together
    Deploy(DeployArgs),
    /// Print the implementation address a proxy currently delegates to
    Implementation(ImplementationArgs),
}

impl Command {
    /// Run the command against the selected network
    pub async fn run(self, network: Option<String>) -> Result<(), ScriptError> {
        match self {
            Command::Deploy(args) => deploy(args, network).await,
            Command::Implementation(args) => implementation(args, network).await,
        }
    }
}

/// Deploy the three marketplace contracts, each behind an
/// [ERC-1967](https://eips.ethereum.org/EIPS/eip-1967) UUPS proxy, then
/// inject the cross-contract addresses and economic parameters.
///
/// Calls made to a proxy are forwarded to its implementation contract;
/// upgrades replace the implementation without changing the address external
/// parties hold.
#[derive(Args)]
pub struct DeployArgs {
    /// Directory containing the compiled contract artifacts
    #[arg(long, default_value = DEFAULT_ARTIFACTS_DIR)]
    pub artifacts_dir: String,

    /// Path of the deployments file addresses are recorded in
    #[arg(long, default_value = DEFAULT_DEPLOYMENTS_PATH)]
    pub deployments_path: String,

    /// Address receiving marketplace fees, in hex
    #[arg(long, default_value = DEFAULT_FEE_RECIPIENT)]
    pub fee_recipient: String,

    /// Listing fee, in base units of the chain currency
    #[arg(long, default_value = DEFAULT_LISTING_FEE)]
    pub listing_fee: String,

    /// Address of the ERC20 token accepted as sale payment, in hex
    #[arg(long, default_value = DEFAULT_PAYMENT_TOKEN)]
    pub token_sale: String,
}

/// Resolve which implementation contract a deployed proxy delegates to
#[derive(Args)]
pub struct ImplementationArgs {
    /// Address of the proxy contract, in hex; read from the deployments file
    /// when omitted
    #[arg(short, long)]
    pub proxy: Option<String>,

    /// The contract whose recorded proxy address to resolve
    #[arg(short, long, value_enum)]
    pub contract: Option<ContractId>,

    /// Path of the deployments file recorded addresses are read from
    #[arg(long, default_value = DEFAULT_DEPLOYMENTS_PATH)]
    pub deployments_path: String,
}
