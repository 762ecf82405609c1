mod utils;

use std::sync::Arc;

use rust_decimal::Decimal;
use tempo_dex_sdk::provider::methods;
use tempo_dex_sdk::{ConnectionState, Error, ProviderKind, WalletSession};
use utils::test_utils::{
    account, init_test_env, network_config, registry_with, tokens, units, MockProvider,
    TEMPO_CHAIN,
};

fn session_for(provider: Arc<MockProvider>) -> WalletSession {
    let config = network_config();
    WalletSession::new(registry_with(provider), config.contracts, config.tokens)
}

#[tokio::test]
async fn test_connect_prompts_and_binds_first_account() {
    init_test_env();
    let provider = Arc::new(MockProvider::new(vec![account(1), account(2)], TEMPO_CHAIN));
    let mut session = session_for(provider.clone());

    let connected = session.connect(ProviderKind::Keystore).await.unwrap();

    assert_eq!(connected, account(1));
    assert_eq!(session.state(), ConnectionState::Connected);
    assert_eq!(session.account(), Some(account(1)));
    assert!(session.signer().is_ok());
    assert!(session.last_error().is_none());
    assert_eq!(provider.call_count(methods::REQUEST_ACCOUNTS), 1);
}

#[tokio::test]
async fn test_rejected_prompt_leaves_session_disconnected() {
    init_test_env();
    let provider = Arc::new(MockProvider::new(vec![account(1)], TEMPO_CHAIN).rejecting_prompts());
    let mut session = session_for(provider);

    let result = session.connect(ProviderKind::Keystore).await;

    assert!(matches!(result, Err(Error::UserRejected(_))));
    assert_eq!(session.state(), ConnectionState::Disconnected);
    assert!(!session.is_connected());
    assert!(session.last_error().is_some());
    assert!(matches!(session.signer(), Err(Error::NotConnected)));
}

#[tokio::test]
async fn test_missing_provider_kind_is_reported() {
    init_test_env();
    let provider = Arc::new(MockProvider::new(vec![account(1)], TEMPO_CHAIN));
    let mut session = session_for(provider);

    let result = session.connect(ProviderKind::Coinbase).await;

    assert!(matches!(result, Err(Error::ProviderUnavailable(_))));
    assert!(session.last_error().unwrap().contains("Coinbase Wallet"));
}

#[tokio::test]
async fn test_auto_reconnect_never_prompts() {
    init_test_env();
    let authorized = Arc::new(MockProvider::new(vec![account(1)], TEMPO_CHAIN).authorized());
    let mut session = session_for(authorized.clone());
    assert!(session.auto_reconnect().await);
    assert_eq!(session.account(), Some(account(1)));
    assert_eq!(authorized.call_count(methods::REQUEST_ACCOUNTS), 0);

    let fresh = Arc::new(MockProvider::new(vec![account(1)], TEMPO_CHAIN));
    let mut session = session_for(fresh.clone());
    assert!(!session.auto_reconnect().await);
    assert!(!session.is_connected());
    assert!(session.last_error().is_none());
    assert_eq!(fresh.call_count(methods::REQUEST_ACCOUNTS), 0);
    assert_eq!(fresh.call_count(methods::ACCOUNTS), 1);
}

#[tokio::test]
async fn test_refresh_balances_reads_every_token() {
    init_test_env();
    let provider = Arc::new(MockProvider::new(vec![account(1)], TEMPO_CHAIN));
    let list = tokens();
    let contracts = provider.contracts();
    contracts.set_balance(list.get("TmEth").unwrap().address, account(1), units(5, 18));
    contracts.set_balance(list.get("TmUsdt").unwrap().address, account(1), units(250, 6));

    let mut session = session_for(provider);
    assert!(matches!(session.refresh_balances().await, Err(Error::NotConnected)));

    session.connect(ProviderKind::Keystore).await.unwrap();
    let balances = session.refresh_balances().await.unwrap();

    assert_eq!(balances.len(), 5);
    assert_eq!(balances.get("TmEth"), Some(Decimal::from(5)));
    assert_eq!(balances.get("TmUsdt"), Some(Decimal::from(250)));
    assert_eq!(balances.get_or_zero("TmBtc"), Decimal::ZERO);
    assert_eq!(balances.total(), Decimal::from(255));
}

#[tokio::test]
async fn test_account_change_rebinds_signer() {
    init_test_env();
    let provider = Arc::new(MockProvider::new(vec![account(1), account(2)], TEMPO_CHAIN));
    let mut session = session_for(provider.clone());
    session.connect(ProviderKind::Keystore).await.unwrap();
    let signer_calls = provider.signer_calls();
    let generation = session.balances().generation();

    session.handle_accounts_changed(&[account(2)]);

    assert_eq!(session.account(), Some(account(2)));
    assert_eq!(provider.signer_calls(), signer_calls + 1);
    assert_eq!(session.balances().generation(), generation + 1);
}

#[tokio::test]
async fn test_empty_accounts_disconnect() {
    init_test_env();
    let provider = Arc::new(MockProvider::new(vec![account(1)], TEMPO_CHAIN));
    let mut session = session_for(provider);
    session.connect(ProviderKind::Keystore).await.unwrap();
    session.refresh_balances().await.unwrap();
    assert!(!session.balances().is_empty());

    session.handle_accounts_changed(&[]);

    assert_eq!(session.state(), ConnectionState::Disconnected);
    assert_eq!(session.account(), None);
    assert!(session.balances().is_empty());
    assert!(session.provider().is_none());
}

#[tokio::test]
async fn test_disconnect_twice_matches_once() {
    init_test_env();
    let provider = Arc::new(MockProvider::new(vec![account(1)], TEMPO_CHAIN));
    let mut session = session_for(provider);
    session.connect(ProviderKind::Keystore).await.unwrap();

    session.disconnect();
    let generation = session.balances().generation();
    session.disconnect();

    assert_eq!(session.state(), ConnectionState::Disconnected);
    assert_eq!(session.balances().generation(), generation);
    assert!(session.signer().is_err());
}

#[tokio::test]
async fn test_chain_change_invalidates_and_rebinds() {
    init_test_env();
    let provider = Arc::new(MockProvider::new(vec![account(1)], TEMPO_CHAIN));
    let mut session = session_for(provider.clone());
    session.connect(ProviderKind::Keystore).await.unwrap();
    session.refresh_balances().await.unwrap();
    let signer_calls = provider.signer_calls();

    session.handle_chain_changed();

    assert!(session.balances().is_empty());
    assert_eq!(provider.signer_calls(), signer_calls + 1);
    assert_eq!(session.account(), Some(account(1)));
}
