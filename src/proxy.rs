//! Proxy deployment: compiled-artifact loading, ERC-1967 proxy deployment,
//! and capability handles over deployed contracts.
//!
//! The orchestrator only sees the [`ProxyDeployer`] and [`DeployedContract`]
//! traits; the `ethers`-backed implementations here own all transport detail.

use std::{fs, path::PathBuf, str::FromStr, sync::Arc};

use async_trait::async_trait;
use ethers::{
    abi::{Abi, Token},
    contract::{Contract, ContractFactory},
    providers::Middleware,
    types::{Address, Bytes, H256, U256},
};
use serde::Deserialize;

use crate::{
    config::NetworkProfile,
    constants::{
        ARTIFACT_EXTENSION, IMPLEMENTATION_STORAGE_SLOT, INITIALIZER_METHOD, NUM_BYTES_ADDRESS,
        NUM_BYTES_STORAGE_SLOT, NUM_DEPLOY_CONFIRMATIONS, PROXY_ARTIFACT,
    },
    errors::ScriptError,
    types::{ContractSpec, ProxyKind},
};

/// A deployed contract reachable through its proxy address
#[async_trait]
pub trait DeployedContract {
    /// The proxy address held by external parties
    fn address(&self) -> Address;

    /// Submit a state-changing call by method name and await its confirmation
    async fn invoke(&self, method: &str, args: Vec<Token>) -> Result<(), ScriptError>;
}

/// Deploys upgrade proxies and resolves their implementation addresses
#[async_trait]
pub trait ProxyDeployer {
    /// The handle type returned for deployed contracts
    type Handle: DeployedContract + Send + Sync;

    /// Deploy a proxy-wrapped instance of the given spec, awaiting on-chain
    /// confirmation of both the implementation and the proxy
    async fn deploy_proxy(&self, spec: &ContractSpec) -> Result<Self::Handle, ScriptError>;

    /// Resolve the implementation address a proxy currently delegates to.
    ///
    /// Read-only: this inspects the proxy's ERC-1967 storage slot and issues
    /// no transaction.
    async fn implementation_address(&self, proxy: Address) -> Result<Address, ScriptError>;
}

/// A compiled contract artifact, as emitted by the contract build pipeline
#[derive(Deserialize)]
struct Artifact {
    /// The contract's ABI
    abi: Abi,
    /// The contract's creation bytecode
    bytecode: Bytes,
}

/// Loads compiled artifacts from the build pipeline's output directory
pub struct ArtifactStore {
    /// The directory containing the artifact files
    dir: PathBuf,
}

impl ArtifactStore {
    /// An artifact store over the given directory
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Load and parse the artifact with the given name
    fn load(&self, name: &str) -> Result<Artifact, ScriptError> {
        let path = self.dir.join(name).with_extension(ARTIFACT_EXTENSION);
        let raw = fs::read_to_string(&path)
            .map_err(|e| ScriptError::ArtifactParsing(format!("{}: {}", path.display(), e)))?;

        serde_json::from_str(&raw).map_err(|e| ScriptError::ArtifactParsing(e.to_string()))
    }
}

/// Deploys ERC-1967 proxies through an `ethers` client
pub struct EthersDeployer<M> {
    /// The RPC client transactions are sent through
    client: Arc<M>,
    /// The store compiled artifacts are loaded from
    artifacts: ArtifactStore,
    /// The gas limit applied to each transaction
    gas_limit: U256,
    /// The gas price applied to each transaction
    gas_price: U256,
}

impl<M: Middleware> EthersDeployer<M> {
    /// A deployer sending through the given client with the profile's gas
    /// settings
    pub fn new(client: Arc<M>, artifacts: ArtifactStore, profile: &NetworkProfile) -> Self {
        Self {
            client,
            artifacts,
            gas_limit: U256::from(profile.gas_limit),
            gas_price: U256::from(profile.gas_price),
        }
    }

    /// Deploy a contract from its artifact, returning its address once the
    /// deployment transaction has confirmed
    async fn deploy_contract(
        &self,
        artifact: &Artifact,
        constructor_args: Vec<Token>,
    ) -> Result<Address, ScriptError> {
        let factory = ContractFactory::new(
            artifact.abi.clone(),
            artifact.bytecode.clone(),
            self.client.clone(),
        );

        let mut deployment = factory
            .deploy_tokens(constructor_args)
            .map_err(|e| ScriptError::ContractDeployment(e.to_string()))?;
        deployment.tx.set_gas(self.gas_limit);
        deployment.tx.set_gas_price(self.gas_price);

        let contract = deployment
            .confirmations(NUM_DEPLOY_CONFIRMATIONS)
            .send()
            .await
            .map_err(|e| ScriptError::ContractDeployment(e.to_string()))?;

        Ok(contract.address())
    }
}

#[async_trait]
impl<M: Middleware> ProxyDeployer for EthersDeployer<M> {
    type Handle = EthersContract<M>;

    async fn deploy_proxy(&self, spec: &ContractSpec) -> Result<Self::Handle, ScriptError> {
        // The only supported kind: the ERC-1967 proxy takes the implementation
        // address and initializer calldata directly, with no admin contract
        let ProxyKind::Uups = spec.kind;

        let implementation_artifact = self.artifacts.load(spec.contract.artifact_name())?;
        let implementation = self
            .deploy_contract(&implementation_artifact, Vec::new())
            .await?;

        let init_calldata = implementation_artifact
            .abi
            .function(INITIALIZER_METHOD)
            .and_then(|function| function.encode_input(&spec.init_args))
            .map_err(|e| ScriptError::CalldataConstruction(e.to_string()))?;

        let proxy_artifact = self.artifacts.load(PROXY_ARTIFACT)?;
        let proxy = self
            .deploy_contract(
                &proxy_artifact,
                vec![
                    Token::Address(implementation),
                    Token::Bytes(init_calldata),
                ],
            )
            .await?;

        Ok(EthersContract {
            contract: Contract::new(proxy, implementation_artifact.abi, self.client.clone()),
            gas_limit: self.gas_limit,
            gas_price: self.gas_price,
        })
    }

    async fn implementation_address(&self, proxy: Address) -> Result<Address, ScriptError> {
        resolve_implementation(self.client.as_ref(), proxy).await
    }
}

/// Read the implementation address out of a proxy's ERC-1967 storage slot
pub async fn resolve_implementation<M: Middleware>(
    client: &M,
    proxy: Address,
) -> Result<Address, ScriptError> {
    // Can `unwrap` here since we know the storage slot constitutes a valid H256
    let slot = H256::from_str(IMPLEMENTATION_STORAGE_SLOT).unwrap();

    let value = client
        .get_storage_at(proxy, slot, None /* block */)
        .await
        .map_err(|e| ScriptError::ContractInteraction(e.to_string()))?;

    Ok(Address::from_slice(
        &value[NUM_BYTES_STORAGE_SLOT - NUM_BYTES_ADDRESS..NUM_BYTES_STORAGE_SLOT],
    ))
}

/// A capability handle over a deployed proxy, dispatching calls by method
/// name through the implementation's ABI
pub struct EthersContract<M> {
    /// The contract instance, attached at the proxy address
    contract: Contract<M>,
    /// The gas limit applied to each call
    gas_limit: U256,
    /// The gas price applied to each call
    gas_price: U256,
}

#[async_trait]
impl<M: Middleware> DeployedContract for EthersContract<M> {
    fn address(&self) -> Address {
        self.contract.address()
    }

    async fn invoke(&self, method: &str, args: Vec<Token>) -> Result<(), ScriptError> {
        let call = self
            .contract
            .method::<_, ()>(method, &args[..])
            .map_err(|e| ScriptError::CalldataConstruction(e.to_string()))?
            .gas(self.gas_limit)
            .gas_price(self.gas_price);

        call.send()
            .await
            .map_err(|e| ScriptError::ContractInteraction(e.to_string()))?
            .await
            .map_err(|e| ScriptError::ContractInteraction(e.to_string()))?;

        Ok(())
    }
}
