use config::{Config as ConfigLoader, ConfigError, File};
use ethers::types::{Address, U256};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::Error;

/// Key of the default network section in `config/network.toml`
pub const DEFAULT_NETWORK: &str = "tempo-testnet";

/// Fixed delays and intervals used by the client
pub mod timing {
    use super::Duration;

    /// Quote requests fire this long after the last amount edit
    pub const QUOTE_DEBOUNCE: Duration = Duration::from_millis(400);
    /// Successful swap/liquidity progress stays visible this long
    pub const SUCCESS_DISPLAY: Duration = Duration::from_secs(3);
    /// Per-token mint statuses stay visible this long
    pub const MINT_STATUS_DISPLAY: Duration = Duration::from_secs(10);
    /// Block number refresh while on the right chain
    pub const BLOCK_REFRESH: Duration = Duration::from_secs(15);
    /// Transaction history refresh
    pub const HISTORY_REFRESH: Duration = Duration::from_secs(30);
    /// Router deadline offset in seconds
    pub const DEADLINE_SECS: u64 = 600;
}

/// Network constants loaded from configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkConstants {
    /// Display name (used when registering the chain with a wallet)
    pub network_name: String,
    /// EVM chain id
    pub chain_id: u64,
    /// Default RPC endpoint
    pub rpc_url: String,
    /// Block explorer base URL
    pub explorer_url: String,
    /// Native currency name
    pub native_currency_name: String,
    /// Native currency symbol
    pub native_symbol: String,
    /// Native currency decimals
    pub native_decimals: u8,
}

impl Default for NetworkConstants {
    fn default() -> Self {
        Self {
            network_name: "Tempo Testnet (Andantino)".to_string(),
            chain_id: 42429,
            rpc_url: "https://rpc.testnet.tempo.xyz".to_string(),
            explorer_url: "https://explore.tempo.xyz".to_string(),
            native_currency_name: "ETH".to_string(),
            native_symbol: "ETH".to_string(),
            native_decimals: 18,
        }
    }
}

impl NetworkConstants {
    /// Load network constants from `$TEMPO_CONFIG_DIR/network.toml`
    pub fn load(network: &str) -> Result<Self, ConfigError> {
        let settings = ConfigLoader::builder()
            .add_source(File::with_name(&format!("{}/network", config_dir())))
            .build()?;

        settings.get::<NetworkConstants>(network)
    }

    /// Explorer link for a transaction
    pub fn tx_url(&self, tx_hash: &str) -> String {
        format!("{}/tx/{}", self.explorer_url.trim_end_matches('/'), tx_hash)
    }

    /// Explorer link for an account
    pub fn address_url(&self, address: &str) -> String {
        format!(
            "{}/address/{}",
            self.explorer_url.trim_end_matches('/'),
            address
        )
    }
}

/// Core DEX contract addresses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractAddresses {
    /// Uniswap V2 style router
    pub router: Address,
    /// Pair factory
    pub factory: Address,
}

impl Default for ContractAddresses {
    fn default() -> Self {
        Self {
            router: parse_address("0xa9eA686C102327d7718838092380f437Ecc60576"),
            factory: parse_address("0x7CbBf39f4444913a38098414402D79041E8c055C"),
        }
    }
}

/// Token information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenInfo {
    /// Stable key used in config and balance maps (e.g. `TmEth`)
    pub key: String,
    /// Token symbol
    pub symbol: String,
    /// Token name
    pub name: String,
    /// Contract address
    pub address: Address,
    /// Token decimals
    pub decimals: u8,
    /// Faucet mint amount in base units (decimal string)
    pub mint_amount: String,
}

impl TokenInfo {
    pub fn new(
        key: &str,
        symbol: &str,
        name: &str,
        address: &str,
        decimals: u8,
        mint_amount: &str,
    ) -> Self {
        Self {
            key: key.to_string(),
            symbol: symbol.to_string(),
            name: name.to_string(),
            address: parse_address(address),
            decimals,
            mint_amount: mint_amount.to_string(),
        }
    }

    /// Faucet amount in base units
    pub fn mint_amount_raw(&self) -> Result<U256, Error> {
        U256::from_dec_str(&self.mint_amount).map_err(|e| {
            Error::Config(format!("Invalid mint amount for {}: {}", self.key, e))
        })
    }
}

/// Ordered list of known tokens
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenList(Vec<TokenInfo>);

impl TokenList {
    pub fn new(tokens: Vec<TokenInfo>) -> Self {
        Self(tokens)
    }

    /// Look a token up by key or symbol (case-insensitive)
    pub fn get(&self, key_or_symbol: &str) -> Option<&TokenInfo> {
        self.0.iter().find(|t| {
            t.key.eq_ignore_ascii_case(key_or_symbol) || t.symbol.eq_ignore_ascii_case(key_or_symbol)
        })
    }

    /// Like `get` but reports unknown tokens as an error
    pub fn require(&self, key_or_symbol: &str) -> Result<&TokenInfo, Error> {
        self.get(key_or_symbol)
            .ok_or_else(|| Error::InvalidInput(format!("Unknown token: {}", key_or_symbol)))
    }

    pub fn by_address(&self, address: Address) -> Option<&TokenInfo> {
        self.0.iter().find(|t| t.address == address)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TokenInfo> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for TokenList {
    fn default() -> Self {
        Self(vec![
            TokenInfo::new(
                "OmUsd",
                "OMUSD",
                "Omni USD",
                "0xBF14175907a7E64DDB8e0C5534bF7A4b1A02f18F",
                18,
                "1000000000000000000000",
            ),
            TokenInfo::new(
                "TmEth",
                "TMETH",
                "Tempo ETH",
                "0xb9b6D36e1B31525d8EE24A2d8Ea4E29aaEdAE9Ec",
                18,
                "1000000000000000000000",
            ),
            TokenInfo::new(
                "TmUsdt",
                "TMUSDT",
                "Tempo USDT",
                "0x42C110818e147CC666E1A304Fc4CAef2892c27C7",
                6,
                "1000000000",
            ),
            TokenInfo::new(
                "TmUsdc",
                "TMUSDC",
                "Tempo USDC",
                "0x1407d60809844C404Db6D4ceFbC99DCC875baB90",
                6,
                "1000000000",
            ),
            TokenInfo::new(
                "TmBtc",
                "TMBTC",
                "Tempo BTC",
                "0xbd897d13EF8976096E344C460049A5AFc3EDd75b",
                8,
                "100000000000",
            ),
        ])
    }
}

/// Network configuration for TempoDEX
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TempoNetworkConfig {
    /// Chain parameters
    pub constants: NetworkConstants,
    /// Router and factory
    pub contracts: ContractAddresses,
    /// Known tokens
    pub tokens: TokenList,
}

impl TempoNetworkConfig {
    /// Create a new network config from network constants with the default
    /// contracts and tokens
    pub fn from_constants(constants: &NetworkConstants) -> Self {
        Self {
            constants: constants.clone(),
            ..Default::default()
        }
    }

    /// Load a network section plus its contracts and tokens from the
    /// configuration directory
    pub fn load(network: &str) -> Result<Self, Error> {
        let constants = NetworkConstants::load(network)?;

        let settings = ConfigLoader::builder()
            .add_source(File::with_name(&format!("{}/contracts", config_dir())))
            .build()?;

        let contracts = settings.get::<ContractAddresses>(&format!("{}.contracts", network))?;
        let tokens = settings.get::<Vec<TokenInfo>>(&format!("{}.tokens", network))?;

        Ok(Self {
            constants,
            contracts,
            tokens: TokenList::new(tokens),
        })
    }

    /// Override the RPC endpoint
    pub fn with_rpc_url(mut self, rpc_url: String) -> Self {
        self.constants.rpc_url = rpc_url;
        self
    }

    pub fn with_contracts(mut self, contracts: ContractAddresses) -> Self {
        self.contracts = contracts;
        self
    }

    pub fn with_tokens(mut self, tokens: TokenList) -> Self {
        self.tokens = tokens;
        self
    }

    pub fn chain_id(&self) -> u64 {
        self.constants.chain_id
    }
}

/// Complete user configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Default swap slippage tolerance in percent
    pub default_slippage: Decimal,
    /// Name of the keystore wallet to use
    pub active_wallet: Option<String>,
    /// Whether the user already approved account access; enables silent
    /// reconnect on startup
    #[serde(default)]
    pub authorized: bool,
    /// Active network configuration
    pub network: TempoNetworkConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self::with_network(TempoNetworkConfig::default())
    }
}

impl Config {
    /// Create a new configuration with the specified network
    pub fn with_network(network: TempoNetworkConfig) -> Self {
        Self {
            default_slippage: Decimal::new(5, 1),
            active_wallet: None,
            authorized: false,
            network,
        }
    }

    /// Load configuration from a file
    pub fn load(path: &PathBuf) -> Result<Self, Error> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?;
        Ok(config)
    }

    /// Load the file if present, otherwise fall back to defaults
    pub fn load_or_default(path: &PathBuf) -> Result<Self, Error> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a file
    pub fn save(&self, path: &PathBuf) -> Result<(), Error> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path
    pub fn default_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push("tempo-dex");
        path.push("config.toml");
        path
    }
}

fn config_dir() -> String {
    env::var("TEMPO_CONFIG_DIR").unwrap_or_else(|_| "config".to_string())
}

// Only used for compile-time constants above.
fn parse_address(s: &str) -> Address {
    Address::from_str(s).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_network_is_tempo_testnet() {
        let config = TempoNetworkConfig::default();
        assert_eq!(config.chain_id(), 42429);
        assert_eq!(config.tokens.len(), 5);
        assert_ne!(config.contracts.router, Address::zero());
        assert_ne!(config.contracts.factory, Address::zero());
    }

    #[test]
    fn test_token_lookup_by_key_symbol_and_address() {
        let tokens = TokenList::default();
        let eth = tokens.get("TmEth").unwrap();
        assert_eq!(tokens.get("tmeth").unwrap().key, "TmEth");
        assert_eq!(tokens.by_address(eth.address).unwrap().symbol, "TMETH");
        assert!(tokens.get("DOGE").is_none());
        assert!(tokens.require("DOGE").is_err());
    }

    #[test]
    fn test_mint_amounts_parse() {
        let tokens = TokenList::default();
        let btc = tokens.get("TMBTC").unwrap();
        assert_eq!(btc.mint_amount_raw().unwrap(), U256::from(100_000_000_000u64));
    }

    #[test]
    fn test_explorer_urls() {
        let network = NetworkConstants::default();
        assert_eq!(network.tx_url("0xabc"), "https://explore.tempo.xyz/tx/0xabc");
        assert_eq!(
            network.address_url("0xdef"),
            "https://explore.tempo.xyz/address/0xdef"
        );
    }

    #[test]
    fn test_config_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.active_wallet = Some("alice".to_string());
        config.authorized = true;
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded, config);
    }
}
