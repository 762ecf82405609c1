mod utils;

use std::str::FromStr;

use ethers::types::U256;
use rust_decimal::Decimal;
use tempo_dex_sdk::progress::SWAP_STEPS;
use tempo_dex_sdk::{execute_swap, Error, ProgressTracker, SwapRequest, TokenList};
use utils::test_utils::{account, init_test_env, units, MockContracts};

fn request(tokens: &TokenList, amount_in: &str, quoted_out: &str) -> SwapRequest {
    SwapRequest {
        from: tokens.get("TmEth").unwrap().clone(),
        to: tokens.get("OmUsd").unwrap().clone(),
        amount_in: amount_in.to_string(),
        quoted_out: Decimal::from_str(quoted_out).unwrap(),
        slippage: Decimal::new(5, 1),
    }
}

#[tokio::test]
async fn test_sufficient_allowance_skips_approval() {
    init_test_env();
    let tokens = TokenList::default();
    let contracts = MockContracts::new(account(1));
    let tm_eth = tokens.get("TmEth").unwrap().address;
    contracts.set_allowance(tm_eth, units(10, 18));
    let tracker = ProgressTracker::default();

    let receipt = execute_swap(&contracts, &tracker, &request(&tokens, "10", "20.123456"))
        .await
        .unwrap();

    assert_eq!(contracts.calls(), vec!["swap", "wait"]);
    assert!(contracts.approvals().is_empty());
    assert_eq!(receipt.block_number, Some(420));

    let progress = tracker.current().unwrap();
    assert!(progress.success);
    assert_eq!(progress.step, SWAP_STEPS.len());
    assert_eq!(progress.message, "Swap completed successfully!");
}

#[tokio::test]
async fn test_insufficient_allowance_approves_exact_amount_first() {
    init_test_env();
    let tokens = TokenList::default();
    let contracts = MockContracts::new(account(1));
    let tm_eth = tokens.get("TmEth").unwrap().address;
    contracts.set_allowance(tm_eth, units(1, 18));
    let tracker = ProgressTracker::default();

    execute_swap(&contracts, &tracker, &request(&tokens, "10", "20.123456"))
        .await
        .unwrap();

    assert_eq!(contracts.calls(), vec!["approve", "wait", "swap", "wait"]);
    assert_eq!(contracts.approvals(), vec![(tm_eth, units(10, 18))]);
}

#[tokio::test]
async fn test_minimum_output_applies_slippage() {
    init_test_env();
    let tokens = TokenList::default();
    let contracts = MockContracts::new(account(1));
    contracts.set_allowance(tokens.get("TmEth").unwrap().address, U256::MAX);
    let tracker = ProgressTracker::default();

    execute_swap(&contracts, &tracker, &request(&tokens, "10", "20.123456"))
        .await
        .unwrap();

    let (amount_in, min_out) = contracts.swaps()[0];
    assert_eq!(amount_in, units(10, 18));
    assert_eq!(min_out, U256::from_dec_str("20022839000000000000").unwrap());
}

#[tokio::test]
async fn test_revert_marks_progress_failed() {
    init_test_env();
    let tokens = TokenList::default();
    let contracts = MockContracts::new(account(1));
    contracts.set_allowance(tokens.get("TmEth").unwrap().address, U256::MAX);
    contracts.revert_swap("UniswapV2Router: INSUFFICIENT_OUTPUT_AMOUNT");
    let tracker = ProgressTracker::default();

    let result = execute_swap(&contracts, &tracker, &request(&tokens, "10", "20")).await;

    assert!(matches!(result, Err(Error::TransactionReverted(_))));
    let progress = tracker.current().unwrap();
    assert!(progress.error);
    assert!(!progress.success);
    assert_eq!(progress.step, 0);
    assert_eq!(progress.message, "UniswapV2Router: INSUFFICIENT_OUTPUT_AMOUNT");
    assert!(!contracts.calls().contains(&"wait".to_string()));
}

#[tokio::test]
async fn test_invalid_request_sends_nothing() {
    init_test_env();
    let tokens = TokenList::default();
    let contracts = MockContracts::new(account(1));
    let tracker = ProgressTracker::default();

    let zero = execute_swap(&contracts, &tracker, &request(&tokens, "0", "1")).await;
    assert!(matches!(zero, Err(Error::InvalidAmount(_))));

    let mut same = request(&tokens, "1", "1");
    same.to = same.from.clone();
    assert!(execute_swap(&contracts, &tracker, &same).await.is_err());

    assert!(contracts.calls().is_empty());
    assert!(tracker.current().unwrap().error);
}

#[tokio::test(start_paused = true)]
async fn test_success_clears_after_display_time() {
    init_test_env();
    let tokens = TokenList::default();
    let contracts = MockContracts::new(account(1));
    contracts.set_allowance(tokens.get("TmEth").unwrap().address, U256::MAX);
    let tracker = ProgressTracker::default();

    execute_swap(&contracts, &tracker, &request(&tokens, "1", "2"))
        .await
        .unwrap();
    assert!(tracker.current().is_some());

    tracker.expire().await;
    assert!(tracker.current().is_none());
}
