//! Type definitions used throughout the deploy scripts

use std::fmt::{self, Display};

use clap::ValueEnum;
use ethers::{
    abi::Token,
    types::{Address, U256},
};

/// The contracts managed by the deploy scripts
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractId {
    /// The whitelist gate contract
    WhiteList,
    /// The NFT registry contract
    Nft,
    /// The marketplace contract
    Market,
}

impl ContractId {
    /// The name of the compiled artifact for this contract
    pub fn artifact_name(&self) -> &'static str {
        match self {
            ContractId::WhiteList => "WhiteListUpgradeable",
            ContractId::Nft => "NFTUpgradeable",
            ContractId::Market => "MarketUpgradeable",
        }
    }

    /// The key stem under which this contract's addresses are recorded in the
    /// `deployments.json` file
    pub fn deployments_stem(&self) -> &'static str {
        match self {
            ContractId::WhiteList => "white_list",
            ContractId::Nft => "nft",
            ContractId::Market => "market",
        }
    }
}

impl Display for ContractId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContractId::WhiteList => write!(f, "white-list"),
            ContractId::Nft => write!(f, "nft"),
            ContractId::Market => write!(f, "market"),
        }
    }
}

/// The kind of upgrade proxy wrapped around each implementation contract
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyKind {
    /// A UUPS proxy: an ERC-1967 proxy whose upgrade logic lives in the
    /// implementation contract itself
    Uups,
}

/// A single contract to deploy behind an upgrade proxy
#[derive(Debug, Clone)]
pub struct ContractSpec {
    /// The contract to deploy
    pub contract: ContractId,
    /// Arguments for the implementation's initializer method
    pub init_args: Vec<Token>,
    /// The kind of proxy to wrap the implementation in
    pub kind: ProxyKind,
}

impl ContractSpec {
    /// A spec for the given contract with an empty initializer and the
    /// supported proxy kind
    pub fn new(contract: ContractId) -> Self {
        Self {
            contract,
            init_args: Vec::new(),
            kind: ProxyKind::Uups,
        }
    }
}

/// An ordered sequence of contracts to deploy.
///
/// The order is a deployment contract in itself: later stages dereference
/// addresses produced by earlier stages, so the sequence is executed strictly
/// front to back.
#[derive(Debug, Clone)]
pub struct DeploymentPlan {
    /// The specs to deploy, in order
    specs: Vec<ContractSpec>,
}

impl DeploymentPlan {
    /// The standard plan: the whitelist gate first, since both other
    /// contracts reference its address during wiring, then the NFT registry
    /// and the marketplace.
    pub fn standard() -> Self {
        Self {
            specs: vec![
                ContractSpec::new(ContractId::WhiteList),
                ContractSpec::new(ContractId::Nft),
                ContractSpec::new(ContractId::Market),
            ],
        }
    }

    /// The specs in deployment order
    pub fn specs(&self) -> &[ContractSpec] {
        &self.specs
    }
}

/// The economic parameters injected into the marketplace after deployment
#[derive(Debug, Clone)]
pub struct WiringInstructions {
    /// The address receiving marketplace fees
    pub fee_recipient: Address,
    /// The listing fee, in base units of the chain currency
    pub listing_fee: U256,
    /// The ERC20 token accepted as sale payment
    pub payment_token: Address,
}

/// The post-deployment configuration calls, in the order they are issued.
///
/// The marketplace's own parameters are set before it is cross-linked, so a
/// reader inspecting intermediate on-chain state never sees a half-configured
/// marketplace referencing addresses already in effect. The whitelist links
/// come before the NFT-to-market link for the same reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WiringCall {
    /// `Market.setAddressFee(fee_recipient)`
    MarketFeeRecipient,
    /// `Market.setNewListingFee(listing_fee)`
    MarketListingFee,
    /// `Market.setTokenSale(payment_token)`
    MarketPaymentToken,
    /// `Market.setWhiteListAddress(white_list_proxy)`
    MarketWhiteList,
    /// `NFT.setWhiteListAddress(white_list_proxy)`
    NftWhiteList,
    /// `NFT.setMarketAddress(market_proxy)`
    NftMarket,
}

impl WiringCall {
    /// The wiring calls in issue order
    pub const ORDERED: [WiringCall; 6] = [
        WiringCall::MarketFeeRecipient,
        WiringCall::MarketListingFee,
        WiringCall::MarketPaymentToken,
        WiringCall::MarketWhiteList,
        WiringCall::NftWhiteList,
        WiringCall::NftMarket,
    ];

    /// The contract this call is addressed to
    pub fn target(&self) -> ContractId {
        match self {
            WiringCall::MarketFeeRecipient
            | WiringCall::MarketListingFee
            | WiringCall::MarketPaymentToken
            | WiringCall::MarketWhiteList => ContractId::Market,
            WiringCall::NftWhiteList | WiringCall::NftMarket => ContractId::Nft,
        }
    }

    /// The contract method this call invokes
    pub fn method(&self) -> &'static str {
        match self {
            WiringCall::MarketFeeRecipient => "setAddressFee",
            WiringCall::MarketListingFee => "setNewListingFee",
            WiringCall::MarketPaymentToken => "setTokenSale",
            WiringCall::MarketWhiteList | WiringCall::NftWhiteList => "setWhiteListAddress",
            WiringCall::NftMarket => "setMarketAddress",
        }
    }
}

/// A stage of an orchestration run, used to report where a failed run stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Deploying the given contract's proxy
    Deploy(ContractId),
    /// Resolving the implementation address behind the given contract's proxy
    ResolveImplementation(ContractId),
    /// Issuing the given wiring call
    Wire(WiringCall),
}

impl Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Deploy(contract) => write!(f, "deploy {}", contract),
            Stage::ResolveImplementation(contract) => {
                write!(f, "resolve {} implementation", contract)
            }
            Stage::Wire(call) => write!(f, "wire {}.{}", call.target(), call.method()),
        }
    }
}

/// The addresses recorded for one deployed contract
#[derive(Debug, Clone, Copy)]
pub struct ReportEntry {
    /// The contract the addresses belong to
    pub contract: ContractId,
    /// The proxy address held by external parties
    pub proxy: Address,
    /// The implementation address the proxy currently delegates to
    pub implementation: Address,
}

/// The final output of a successful orchestration run: per contract, the
/// proxy address and the implementation address behind it
#[derive(Debug, Clone)]
pub struct DeploymentReport {
    /// Report entries, in deployment order
    entries: Vec<ReportEntry>,
}

impl DeploymentReport {
    /// Assemble a report from its entries
    pub fn new(entries: Vec<ReportEntry>) -> Self {
        Self { entries }
    }

    /// The report entries, in deployment order
    pub fn entries(&self) -> &[ReportEntry] {
        &self.entries
    }

    /// The proxy address recorded for the given contract, if it was deployed
    pub fn proxy(&self, contract: ContractId) -> Option<Address> {
        self.entries
            .iter()
            .find(|entry| entry.contract == contract)
            .map(|entry| entry.proxy)
    }
}

impl Display for DeploymentReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            writeln!(
                f,
                "{} proxy deployed at {:#x}",
                entry.contract.artifact_name(),
                entry.proxy
            )?;
            writeln!(
                f,
                "{} implementation at {:#x}",
                entry.contract.artifact_name(),
                entry.implementation
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use ethers::types::Address;

    use super::{ContractId, DeploymentPlan, DeploymentReport, ProxyKind, ReportEntry, WiringCall};

    #[test]
    fn test_standard_plan_order() {
        let plan = DeploymentPlan::standard();
        let order: Vec<_> = plan.specs().iter().map(|spec| spec.contract).collect();
        assert_eq!(
            order,
            vec![ContractId::WhiteList, ContractId::Nft, ContractId::Market]
        );

        for spec in plan.specs() {
            assert!(spec.init_args.is_empty());
            assert_eq!(spec.kind, ProxyKind::Uups);
        }
    }

    #[test]
    fn test_wiring_call_order() {
        let methods: Vec<_> = WiringCall::ORDERED.iter().map(|c| c.method()).collect();
        assert_eq!(
            methods,
            vec![
                "setAddressFee",
                "setNewListingFee",
                "setTokenSale",
                "setWhiteListAddress",
                "setWhiteListAddress",
                "setMarketAddress",
            ]
        );

        // The marketplace is fully parameterized before anything links to it
        let targets: Vec<_> = WiringCall::ORDERED.iter().map(|c| c.target()).collect();
        assert_eq!(
            targets,
            vec![
                ContractId::Market,
                ContractId::Market,
                ContractId::Market,
                ContractId::Market,
                ContractId::Nft,
                ContractId::Nft,
            ]
        );
    }

    #[test]
    fn test_report_rendering() {
        let report = DeploymentReport::new(vec![ReportEntry {
            contract: ContractId::Market,
            proxy: Address::from_low_u64_be(1),
            implementation: Address::from_low_u64_be(2),
        }]);

        let rendered = report.to_string();
        assert!(rendered.contains("MarketUpgradeable proxy deployed at 0x"));
        assert!(rendered.contains("MarketUpgradeable implementation at 0x"));
    }
}
