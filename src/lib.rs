pub mod amount;
pub mod config;
pub mod context;
pub mod contracts;
pub mod dashboard;
pub mod error;
pub mod executor;
pub mod flows;
pub mod gateway;
pub mod history;
pub mod network;
pub mod progress;
pub mod provider;
pub mod quote;
pub mod schedule;
pub mod session;
pub mod views;
pub mod wallet;

pub use config::{
    timing, Config, ContractAddresses, NetworkConstants, TempoNetworkConfig, TokenInfo, TokenList,
};
pub use context::AppContext;
pub use dashboard::{load_dashboard, Dashboard, PoolStats};
pub use error::Error;
pub use executor::{ExecutionReport, StepExecutor, StepOutcome};
pub use flows::{
    add_liquidity, execute_swap, fetch_pool, mint_all, remove_liquidity, AddLiquidityRequest,
    MintReport, MintStatus, MintTracker, PoolSnapshot, RemoveLiquidityRequest, SwapRequest,
};
pub use gateway::{ContractGateway, DexContracts, Reserves, TxReceiptSummary};
pub use history::{BlockScanHistory, HistoryEntry, HistorySource, RecentTransactions};
pub use network::{NetworkManager, NetworkState, NetworkStatus};
pub use progress::{ProgressTracker, TransactionProgress};
pub use provider::{
    EventSubscription, ProviderEvent, ProviderKind, ProviderRegistry, ProviderRpcError,
    WalletProvider,
};
pub use quote::{fetch_quote, Quote, QuoteDebouncer, QuoteState};
pub use schedule::Cadence;
pub use session::{BalanceSnapshot, ConnectionState, WalletSession};
pub use wallet::{KeystoreProvider, TempoWallet, WalletStorage};

// Re-export ethers types used across the public API
pub use ethers::types::{Address, TxHash, U256};
pub use rust_decimal::Decimal;
