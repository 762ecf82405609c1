use thiserror::Error;

use crate::provider::ProviderRpcError;

/// SDK Error type
#[derive(Error, Debug)]
pub enum Error {
    /// No compatible wallet provider is present in the environment
    #[error("Wallet provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// The user declined a wallet prompt
    #[error("User rejected the request: {0}")]
    UserRejected(String),

    /// The wallet is connected to a different chain than the DEX requires
    #[error("Wrong network: connected to {current:?}, expected chain {required}")]
    NetworkMismatch { current: Option<u64>, required: u64 },

    /// The switch target is unknown to the wallet
    #[error("Chain {0} is not registered with the wallet")]
    ChainUnregistered(u64),

    /// Router could not price the requested path
    #[error("Quote unavailable: {0}")]
    QuoteUnavailable(String),

    /// On-chain failure with the provider's reason string
    #[error("Transaction reverted: {0}")]
    TransactionReverted(String),

    /// Unexpected local failure while submitting a transaction
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// No active wallet session
    #[error("Wallet not connected")]
    NotConnected,

    /// Raw EIP-1193 provider error that has no dedicated variant
    #[error("Provider error: {0}")]
    Provider(ProviderRpcError),

    /// Amount could not be parsed or is out of range
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Other invalid user input (unknown token, same token twice, ...)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// RPC client error
    #[error("RPC error: {0}")]
    Rpc(String),

    /// Contract read failed
    #[error("Contract error: {0}")]
    Contract(String),

    /// Wallet error
    #[error("Wallet error: {0}")]
    Wallet(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/Deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Best human-readable reason for progress and status lines.
    pub fn reason(&self) -> String {
        match self {
            Error::TransactionReverted(reason)
            | Error::TransactionFailed(reason)
            | Error::QuoteUnavailable(reason)
            | Error::UserRejected(reason) => reason.clone(),
            Error::Provider(e) => e.message.clone(),
            other => other.to_string(),
        }
    }

    /// True when the failure came from the user declining a prompt.
    pub fn is_user_rejection(&self) -> bool {
        matches!(self, Error::UserRejected(_))
    }
}

impl From<ProviderRpcError> for Error {
    fn from(e: ProviderRpcError) -> Self {
        use crate::provider::codes;

        match e.code {
            codes::USER_REJECTED_REQUEST => Error::UserRejected(e.message),
            codes::UNRECOGNIZED_CHAIN => {
                let chain_id = e
                    .data
                    .as_ref()
                    .and_then(|d| d.get("chainId"))
                    .and_then(|c| c.as_str())
                    .and_then(crate::provider::parse_chain_id)
                    .unwrap_or_default();
                Error::ChainUnregistered(chain_id)
            }
            _ => Error::Provider(e),
        }
    }
}

impl From<config::ConfigError> for Error {
    fn from(e: config::ConfigError) -> Self {
        Error::Config(e.to_string())
    }
}

/// Classify an `ethers` contract error into the submission taxonomy.
pub fn contract_error<M: ethers::providers::Middleware>(
    e: ethers::contract::ContractError<M>,
) -> Error {
    if let Some(reason) = e.decode_revert::<String>() {
        return Error::TransactionReverted(reason);
    }
    if e.is_revert() {
        return Error::TransactionReverted(e.to_string());
    }
    Error::TransactionFailed(e.to_string())
}
