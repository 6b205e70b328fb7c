//! Definitions of errors that can occur during the execution of the deploy scripts

use std::{
    error::Error,
    fmt::{self, Display, Formatter},
};

use ethers::types::Address;

use crate::types::{ContractId, Stage};

/// Errors that can occur during the execution of the deploy scripts
#[derive(Debug)]
pub enum ScriptError {
    /// The selected network does not match any known network profile
    UnsupportedNetwork(String),
    /// A required setting is absent from the configuration source
    MissingConfiguration(String),
    /// A setting is present in the configuration source but failed to parse,
    /// reported as (key, raw value)
    InvalidConfiguration(String, String),
    /// No network was selected at orchestration entry
    UnresolvedNetwork,
    /// Error parsing a compiled contract artifact
    ArtifactParsing(String),
    /// Error initializing the RPC client
    ClientInitialization(String),
    /// Error constructing calldata for a contract method
    CalldataConstruction(String),
    /// Error deploying a contract
    ContractDeployment(String),
    /// Error calling a contract method
    ContractInteraction(String),
    /// The deployment plan does not include a contract the wiring step needs
    IncompletePlan(ContractId),
    /// Error reading the `deployments.json` file
    ReadDeployments(String),
    /// Error writing the `deployments.json` file
    WriteDeployments(String),
    /// A stage of an orchestration run did not complete.
    ///
    /// Proxies deployed by earlier stages are already on-chain and are not
    /// rolled back; they are carried here so the operator can still record them.
    Deployment {
        /// The stage that failed
        stage: Stage,
        /// The underlying failure, surfaced untouched
        cause: Box<ScriptError>,
        /// Proxies that had been deployed and confirmed when the stage failed
        deployed: Vec<(ContractId, Address)>,
    },
}

impl Display for ScriptError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ScriptError::UnsupportedNetwork(name) => {
                write!(f, "unsupported network: {}", name)
            }
            ScriptError::MissingConfiguration(key) => {
                write!(f, "missing configuration: {}", key)
            }
            ScriptError::InvalidConfiguration(key, value) => {
                write!(f, "invalid configuration: {}={}", key, value)
            }
            ScriptError::UnresolvedNetwork => write!(f, "no network selected"),
            ScriptError::ArtifactParsing(s) => write!(f, "error parsing artifact: {}", s),
            ScriptError::ClientInitialization(s) => {
                write!(f, "error initializing client: {}", s)
            }
            ScriptError::CalldataConstruction(s) => {
                write!(f, "error constructing calldata: {}", s)
            }
            ScriptError::ContractDeployment(s) => write!(f, "error deploying contract: {}", s),
            ScriptError::ContractInteraction(s) => {
                write!(f, "error interacting with contract: {}", s)
            }
            ScriptError::IncompletePlan(contract) => {
                write!(f, "deployment plan is missing the {} contract", contract)
            }
            ScriptError::ReadDeployments(s) => write!(f, "error reading deployments: {}", s),
            ScriptError::WriteDeployments(s) => write!(f, "error writing deployments: {}", s),
            ScriptError::Deployment {
                stage,
                cause,
                deployed,
            } => {
                write!(f, "deployment failed at stage `{}`: {}", stage, cause)?;
                if !deployed.is_empty() {
                    write!(f, " (already deployed:")?;
                    for (contract, address) in deployed {
                        write!(f, " {}={:#x}", contract, address)?;
                    }
                    write!(f, ")")?;
                }
                Ok(())
            }
        }
    }
}

impl Error for ScriptError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ScriptError::Deployment { cause, .. } => Some(cause.as_ref()),
            _ => None,
        }
    }
}
