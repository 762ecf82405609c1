mod utils;

use tempo_dex_sdk::provider::methods;
use tempo_dex_sdk::{Error, NetworkConstants, NetworkManager, NetworkState};
use utils::test_utils::{account, init_test_env, MockProvider, MAINNET, TEMPO_CHAIN};

fn manager() -> NetworkManager {
    NetworkManager::new(NetworkConstants::default())
}

#[tokio::test]
async fn test_check_classifies_chain() {
    init_test_env();
    let mut network = manager();
    assert_eq!(network.state(), NetworkState::Unknown);

    let on_tempo = MockProvider::new(vec![account(1)], TEMPO_CHAIN);
    assert_eq!(network.check_network(&on_tempo).await, NetworkState::Matched);
    assert_eq!(network.current_chain_id(), Some(TEMPO_CHAIN));
    assert!(network.ensure_matched().is_ok());

    let on_mainnet = MockProvider::new(vec![account(1)], MAINNET);
    assert_eq!(network.check_network(&on_mainnet).await, NetworkState::Mismatched);
    let status = network.status();
    assert_eq!(status.current_chain_id, Some(MAINNET));
    assert_eq!(status.required_chain_id, TEMPO_CHAIN);
    assert!(!status.is_match);
    assert!(matches!(
        network.ensure_matched(),
        Err(Error::NetworkMismatch {
            current: Some(MAINNET),
            required: TEMPO_CHAIN
        })
    ));
    assert_eq!(network.check_count(), 2);
}

#[tokio::test]
async fn test_switch_to_known_chain() {
    init_test_env();
    let provider = MockProvider::new(vec![account(1)], MAINNET).knowing_chain(TEMPO_CHAIN);
    let mut network = manager();
    network.check_network(&provider).await;

    let state = network.switch_to_required(&provider).await.unwrap();

    assert_eq!(state, NetworkState::Matched);
    assert_eq!(provider.call_count(methods::SWITCH_CHAIN), 1);
    assert_eq!(provider.call_count(methods::ADD_CHAIN), 0);
}

#[tokio::test]
async fn test_unknown_chain_is_added_once() {
    init_test_env();
    let provider = MockProvider::new(vec![account(1)], MAINNET);
    let mut network = manager();
    network.check_network(&provider).await;

    let state = network.switch_to_required(&provider).await.unwrap();

    assert_eq!(state, NetworkState::Matched);
    assert_eq!(provider.chain_id(), TEMPO_CHAIN);
    assert_eq!(provider.call_count(methods::SWITCH_CHAIN), 1);
    assert_eq!(provider.call_count(methods::ADD_CHAIN), 1);
}

#[tokio::test]
async fn test_rejected_add_chain_ends_the_flow() {
    init_test_env();
    let provider = MockProvider::new(vec![account(1)], MAINNET).rejecting_add_chain();
    let mut network = manager();
    network.check_network(&provider).await;

    let result = network.switch_to_required(&provider).await;

    assert!(matches!(result, Err(Error::UserRejected(_))));
    assert_eq!(network.state(), NetworkState::Mismatched);
    assert!(!network.status().switch_in_progress);
    assert_eq!(provider.call_count(methods::SWITCH_CHAIN), 1);
    assert_eq!(provider.call_count(methods::ADD_CHAIN), 1);
}

#[tokio::test]
async fn test_block_number_only_on_required_chain() {
    init_test_env();
    let mut network = manager();

    let on_mainnet = MockProvider::new(vec![account(1)], MAINNET);
    network.check_network(&on_mainnet).await;
    assert_eq!(network.refresh_block_number(&on_mainnet).await, None);
    assert_eq!(on_mainnet.call_count(methods::BLOCK_NUMBER), 0);

    let on_tempo = MockProvider::new(vec![account(1)], TEMPO_CHAIN);
    network.check_network(&on_tempo).await;
    assert_eq!(network.refresh_block_number(&on_tempo).await, Some(420));
    assert_eq!(network.block_number(), Some(420));

    // Leaving the chain drops the stale block number
    network.check_network(&on_mainnet).await;
    assert_eq!(network.block_number(), None);
}
