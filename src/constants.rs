//! Constants used in the deploy scripts

/// The storage slot containing the implementation contract address in an
/// ERC-1967 upgradeable proxy.
///
/// This is specified in EIP1967: https://eips.ethereum.org/EIPS/eip-1967#logic-contract-address
pub const IMPLEMENTATION_STORAGE_SLOT: &str =
    "0x360894a13ba1a3210667c828492db98dca3e2076cc3735a920a3ca505d382bbc";

/// The number of bytes stored in a single storage slot
pub const NUM_BYTES_STORAGE_SLOT: usize = 32;

/// The number of bytes in an Ethereum address
pub const NUM_BYTES_ADDRESS: usize = 20;

/// The number of confirmations to wait for on each deployment transaction
pub const NUM_DEPLOY_CONFIRMATIONS: usize = 1;

/// The artifact name of the ERC-1967 proxy contract wrapped around each
/// implementation contract
pub const PROXY_ARTIFACT: &str = "ERC1967Proxy";

/// The file extension of compiled contract artifacts
pub const ARTIFACT_EXTENSION: &str = "json";

/// The name of the initializer method called through the proxy constructor
pub const INITIALIZER_METHOD: &str = "initialize";

/// The setting key suffix for a network's RPC endpoint URL
pub const RPC_URL_SETTING: &str = "RPC_URL";

/// The setting key suffix for a network's deployer private key
pub const PRIVATE_KEY_SETTING: &str = "PRIVATE_KEY";

/// The setting key suffix for a network's gas limit
pub const GAS_LIMIT_SETTING: &str = "GAS_LIMIT";

/// The setting key suffix for a network's gas price
pub const GAS_PRICE_SETTING: &str = "GAS_PRICE";

/// The setting key suffix for a network's chain ID
pub const CHAIN_ID_SETTING: &str = "CHAIN_ID";

/// The deployments key in the `deployments.json` file
pub const DEPLOYMENTS_KEY: &str = "deployments";

/// The key suffix under which a contract's proxy address is recorded in the
/// `deployments.json` file
pub const PROXY_KEY_SUFFIX: &str = "_proxy";

/// The key suffix under which a contract's implementation address is recorded
/// in the `deployments.json` file
pub const IMPLEMENTATION_KEY_SUFFIX: &str = "_implementation";

/// The fee recipient used when no override is supplied
pub const DEFAULT_FEE_RECIPIENT: &str = "0x65CfcB06d1e9031A0a6209CE98C31d5f5bb9aa97";

/// The listing fee used when no override is supplied, in base units
/// (0.025 of the chain currency)
pub const DEFAULT_LISTING_FEE: &str = "25000000000000000";

/// The sale payment token used when no override is supplied
pub const DEFAULT_PAYMENT_TOKEN: &str = "0x9c3C9283D3e44854697Cd22D3Faa240Cfb032889";

/// The default directory containing compiled contract artifacts
pub const DEFAULT_ARTIFACTS_DIR: &str = "artifacts";

/// The default path of the deployments bookkeeping file
pub const DEFAULT_DEPLOYMENTS_PATH: &str = "deployments.json";
