//! Sequencing of the deployment plan and post-deployment wiring.
//!
//! Each deployment and wiring call is issued and confirmed before the next
//! one starts; step N+1 consumes addresses produced by step N, so the order
//! is a strict sequence rather than a scheduling suggestion. No call is
//! retried here: blind retries of non-idempotent state-changing calls risk
//! applying a financial parameter twice, so retry policy stays with the
//! transport.

use ethers::{abi::Token, types::Address};
use tracing::info;

use crate::{
    config::NetworkProfile,
    errors::ScriptError,
    proxy::{DeployedContract, ProxyDeployer},
    types::{
        ContractId, DeploymentPlan, DeploymentReport, ReportEntry, Stage, WiringCall,
        WiringInstructions,
    },
};

/// Executes a [`DeploymentPlan`] against a single network and wires the
/// deployed contracts together.
///
/// Each run is independent and stateless with respect to prior runs: running
/// the same plan twice deploys two independent sets of proxies.
pub struct DeploymentOrchestrator<D> {
    /// The deployer all chain interaction goes through
    deployer: D,
}

impl<D: ProxyDeployer> DeploymentOrchestrator<D> {
    /// An orchestrator issuing its calls through the given deployer
    pub fn new(deployer: D) -> Self {
        Self { deployer }
    }

    /// Run the plan to completion and assemble the address report.
    ///
    /// A `None` profile means no network was selected; the run fails before
    /// any chain interaction is attempted. On any later failure the returned
    /// error names the stage that failed and the proxies already deployed,
    /// since on-chain deployments cannot be rolled back.
    pub async fn run(
        &self,
        plan: &DeploymentPlan,
        profile: Option<&NetworkProfile>,
        wiring: &WiringInstructions,
    ) -> Result<DeploymentReport, ScriptError> {
        let profile = profile.ok_or(ScriptError::UnresolvedNetwork)?;
        info!(
            "deploying {} contracts to {}",
            plan.specs().len(),
            profile.name
        );

        let mut deployed: Vec<(ContractId, D::Handle)> = Vec::with_capacity(plan.specs().len());
        for spec in plan.specs() {
            let handle = self
                .deployer
                .deploy_proxy(spec)
                .await
                .map_err(|e| failure(Stage::Deploy(spec.contract), e, &deployed))?;

            info!("{} proxy deployed at {:#x}", spec.contract, handle.address());
            deployed.push((spec.contract, handle));
        }

        // Implementation addresses are resolved per-proxy and feed only the
        // report, never a wiring decision
        let mut entries = Vec::with_capacity(deployed.len());
        for (contract, handle) in &deployed {
            let implementation = self
                .deployer
                .implementation_address(handle.address())
                .await
                .map_err(|e| failure(Stage::ResolveImplementation(*contract), e, &deployed))?;

            entries.push(ReportEntry {
                contract: *contract,
                proxy: handle.address(),
                implementation,
            });
        }
        let report = DeploymentReport::new(entries);

        let whitelist = handle_of(&deployed, ContractId::WhiteList)?;
        let nft = handle_of(&deployed, ContractId::Nft)?;
        let market = handle_of(&deployed, ContractId::Market)?;
        let whitelist_address = whitelist.address();
        let market_address = market.address();

        for call in WiringCall::ORDERED {
            let target = match call.target() {
                ContractId::WhiteList => whitelist,
                ContractId::Nft => nft,
                ContractId::Market => market,
            };

            info!("wiring {}.{}", call.target(), call.method());
            target
                .invoke(
                    call.method(),
                    wiring_args(call, wiring, whitelist_address, market_address),
                )
                .await
                .map_err(|e| failure(Stage::Wire(call), e, &deployed))?;
        }

        Ok(report)
    }
}

/// The handle deployed for the given contract
fn handle_of<H>(deployed: &[(ContractId, H)], contract: ContractId) -> Result<&H, ScriptError> {
    deployed
        .iter()
        .find(|(deployed_contract, _)| *deployed_contract == contract)
        .map(|(_, handle)| handle)
        .ok_or(ScriptError::IncompletePlan(contract))
}

/// The arguments of a wiring call, drawn from the instructions and the
/// deployed proxy addresses
fn wiring_args(
    call: WiringCall,
    wiring: &WiringInstructions,
    whitelist: Address,
    market: Address,
) -> Vec<Token> {
    match call {
        WiringCall::MarketFeeRecipient => vec![Token::Address(wiring.fee_recipient)],
        WiringCall::MarketListingFee => vec![Token::Uint(wiring.listing_fee)],
        WiringCall::MarketPaymentToken => vec![Token::Address(wiring.payment_token)],
        WiringCall::MarketWhiteList | WiringCall::NftWhiteList => vec![Token::Address(whitelist)],
        WiringCall::NftMarket => vec![Token::Address(market)],
    }
}

/// Wrap a stage failure with the proxies already on-chain at that point
fn failure<H: DeployedContract>(
    stage: Stage,
    cause: ScriptError,
    deployed: &[(ContractId, H)],
) -> ScriptError {
    ScriptError::Deployment {
        stage,
        cause: Box::new(cause),
        deployed: deployed
            .iter()
            .map(|(contract, handle)| (*contract, handle.address()))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex,
    };

    use async_trait::async_trait;
    use ethers::{
        abi::Token,
        types::{Address, U256},
    };

    use crate::{
        config::NetworkProfile,
        errors::ScriptError,
        proxy::{DeployedContract, ProxyDeployer},
        types::{ContractId, ContractSpec, DeploymentPlan, Stage, WiringCall, WiringInstructions},
    };

    use super::DeploymentOrchestrator;

    /// A log of every deploy and wiring call, in issue order
    type CallLog = Arc<Mutex<Vec<(String, Vec<Token>)>>>;

    struct FakeHandle {
        contract: ContractId,
        address: Address,
        log: CallLog,
        fail_method: Option<&'static str>,
    }

    #[async_trait]
    impl DeployedContract for FakeHandle {
        fn address(&self) -> Address {
            self.address
        }

        async fn invoke(&self, method: &str, args: Vec<Token>) -> Result<(), ScriptError> {
            if self.fail_method == Some(method) {
                return Err(ScriptError::ContractInteraction("reverted".to_string()));
            }

            self.log
                .lock()
                .unwrap()
                .push((format!("{}.{}", self.contract, method), args));
            Ok(())
        }
    }

    struct FakeDeployer {
        log: CallLog,
        next_address: AtomicU64,
        fail_deploy: Option<ContractId>,
        fail_method: Option<&'static str>,
    }

    impl FakeDeployer {
        fn new() -> Self {
            Self {
                log: Arc::new(Mutex::new(Vec::new())),
                next_address: AtomicU64::new(1),
                fail_deploy: None,
                fail_method: None,
            }
        }

        fn call_names(&self) -> Vec<String> {
            self.log
                .lock()
                .unwrap()
                .iter()
                .map(|(name, _)| name.clone())
                .collect()
        }

        fn args_of(&self, name: &str) -> Vec<Token> {
            self.log
                .lock()
                .unwrap()
                .iter()
                .find(|(call, _)| call == name)
                .map(|(_, args)| args.clone())
                .unwrap()
        }
    }

    #[async_trait]
    impl ProxyDeployer for FakeDeployer {
        type Handle = FakeHandle;

        async fn deploy_proxy(&self, spec: &ContractSpec) -> Result<Self::Handle, ScriptError> {
            if self.fail_deploy == Some(spec.contract) {
                return Err(ScriptError::ContractDeployment("out of gas".to_string()));
            }

            let address =
                Address::from_low_u64_be(self.next_address.fetch_add(1, Ordering::SeqCst));
            self.log
                .lock()
                .unwrap()
                .push((format!("deploy.{}", spec.contract), Vec::new()));

            Ok(FakeHandle {
                contract: spec.contract,
                address,
                log: self.log.clone(),
                fail_method: self.fail_method,
            })
        }

        async fn implementation_address(&self, proxy: Address) -> Result<Address, ScriptError> {
            // Derive a distinct, stable pseudo-address for the implementation
            Ok(Address::from_low_u64_be(
                proxy.to_low_u64_be() + 0x1000,
            ))
        }
    }

    fn local_profile() -> NetworkProfile {
        NetworkProfile {
            name: "local".to_string(),
            rpc_url: "http://localhost:8545".to_string(),
            private_key: "0xdeadbeef".to_string(),
            gas_limit: 6_000_000,
            gas_price: 1_000_000_000,
            chain_id: None,
        }
    }

    fn wiring() -> WiringInstructions {
        WiringInstructions {
            fee_recipient: Address::from_low_u64_be(0xFEE),
            listing_fee: U256::from(25_000_000_000_000_000u64),
            payment_token: Address::from_low_u64_be(0x70CE),
        }
    }

    #[tokio::test]
    async fn test_deploys_and_wires_in_order() {
        let orchestrator = DeploymentOrchestrator::new(FakeDeployer::new());
        let profile = local_profile();

        orchestrator
            .run(&DeploymentPlan::standard(), Some(&profile), &wiring())
            .await
            .unwrap();

        let names = orchestrator.deployer.call_names();
        assert_eq!(
            names,
            vec![
                "deploy.white-list",
                "deploy.nft",
                "deploy.market",
                "market.setAddressFee",
                "market.setNewListingFee",
                "market.setTokenSale",
                "market.setWhiteListAddress",
                "nft.setWhiteListAddress",
                "nft.setMarketAddress",
            ]
        );

        // No call referencing the whitelist is issued before its deployment
        let whitelist_deployed = names.iter().position(|n| n == "deploy.white-list").unwrap();
        for referencing in ["market.setWhiteListAddress", "nft.setWhiteListAddress"] {
            let position = names.iter().position(|n| n == referencing).unwrap();
            assert!(whitelist_deployed < position);
        }
    }

    #[tokio::test]
    async fn test_wiring_arguments_flow_through() {
        let orchestrator = DeploymentOrchestrator::new(FakeDeployer::new());
        let profile = local_profile();
        let instructions = wiring();

        let report = orchestrator
            .run(&DeploymentPlan::standard(), Some(&profile), &instructions)
            .await
            .unwrap();

        let deployer = &orchestrator.deployer;
        assert_eq!(
            deployer.args_of("market.setAddressFee"),
            vec![Token::Address(instructions.fee_recipient)]
        );
        assert_eq!(
            deployer.args_of("market.setNewListingFee"),
            vec![Token::Uint(U256::from(25_000_000_000_000_000u64))]
        );
        assert_eq!(
            deployer.args_of("market.setTokenSale"),
            vec![Token::Address(instructions.payment_token)]
        );

        let whitelist_proxy = report.proxy(ContractId::WhiteList).unwrap();
        let market_proxy = report.proxy(ContractId::Market).unwrap();
        assert_eq!(
            deployer.args_of("market.setWhiteListAddress"),
            vec![Token::Address(whitelist_proxy)]
        );
        assert_eq!(
            deployer.args_of("nft.setWhiteListAddress"),
            vec![Token::Address(whitelist_proxy)]
        );
        assert_eq!(
            deployer.args_of("nft.setMarketAddress"),
            vec![Token::Address(market_proxy)]
        );
    }

    #[tokio::test]
    async fn test_report_addresses_are_distinct() {
        let orchestrator = DeploymentOrchestrator::new(FakeDeployer::new());
        let profile = local_profile();

        let report = orchestrator
            .run(&DeploymentPlan::standard(), Some(&profile), &wiring())
            .await
            .unwrap();

        let entries = report.entries();
        assert_eq!(entries.len(), 3);
        assert_eq!(
            entries.iter().map(|e| e.contract).collect::<Vec<_>>(),
            vec![ContractId::WhiteList, ContractId::Nft, ContractId::Market]
        );

        for (i, entry) in entries.iter().enumerate() {
            assert_ne!(entry.proxy, entry.implementation);
            for other in &entries[i + 1..] {
                assert_ne!(entry.proxy, other.proxy);
            }
        }
    }

    #[tokio::test]
    async fn test_whitelist_failure_short_circuits() {
        let deployer = FakeDeployer {
            fail_deploy: Some(ContractId::WhiteList),
            ..FakeDeployer::new()
        };
        let orchestrator = DeploymentOrchestrator::new(deployer);
        let profile = local_profile();

        let err = orchestrator
            .run(&DeploymentPlan::standard(), Some(&profile), &wiring())
            .await
            .unwrap_err();

        match err {
            ScriptError::Deployment {
                stage, deployed, ..
            } => {
                assert_eq!(stage, Stage::Deploy(ContractId::WhiteList));
                assert!(deployed.is_empty());
            }
            other => panic!("expected Deployment failure, got {:?}", other),
        }

        // No NFT or Market deployment was ever issued
        assert!(orchestrator.deployer.call_names().is_empty());
    }

    #[tokio::test]
    async fn test_wiring_failure_names_stage_and_reports_deployed() {
        let deployer = FakeDeployer {
            fail_method: Some("setTokenSale"),
            ..FakeDeployer::new()
        };
        let orchestrator = DeploymentOrchestrator::new(deployer);
        let profile = local_profile();

        let err = orchestrator
            .run(&DeploymentPlan::standard(), Some(&profile), &wiring())
            .await
            .unwrap_err();

        match err {
            ScriptError::Deployment {
                stage,
                deployed,
                cause,
            } => {
                assert_eq!(stage, Stage::Wire(WiringCall::MarketPaymentToken));
                // All three proxies are on-chain and still reported
                assert_eq!(
                    deployed.iter().map(|(c, _)| *c).collect::<Vec<_>>(),
                    vec![ContractId::WhiteList, ContractId::Nft, ContractId::Market]
                );
                assert!(matches!(*cause, ScriptError::ContractInteraction(_)));
            }
            other => panic!("expected Deployment failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_rerun_deploys_fresh_proxies() {
        // Deployment is not idempotent: the same plan run twice yields two
        // independent proxy sets, by design
        let orchestrator = DeploymentOrchestrator::new(FakeDeployer::new());
        let profile = local_profile();
        let plan = DeploymentPlan::standard();

        let first = orchestrator
            .run(&plan, Some(&profile), &wiring())
            .await
            .unwrap();
        let second = orchestrator
            .run(&plan, Some(&profile), &wiring())
            .await
            .unwrap();

        for entry in first.entries() {
            for other in second.entries() {
                assert_ne!(entry.proxy, other.proxy);
            }
        }
    }

    #[tokio::test]
    async fn test_missing_network_selection_fails_before_any_call() {
        let orchestrator = DeploymentOrchestrator::new(FakeDeployer::new());

        let err = orchestrator
            .run(&DeploymentPlan::standard(), None, &wiring())
            .await
            .unwrap_err();

        assert!(matches!(err, ScriptError::UnresolvedNetwork));
        assert_eq!(orchestrator.deployer.call_names().len(), 0);
    }
}
