//! Integration tests for the verification harness, running against
//! in-memory sources.

mod common;

use std::io::Write;

use alloy::primitives::U256;
use amm_data::pairs::load_pairs;
use amm_math::tolerance::{approx_eq, Tolerance};
use amm_verify::{verify_v2_pairs, verify_v3_pool, V3CheckConfig, DEFAULT_PPM_TOLERANCE};
use common::*;
use num_bigint::BigUint;

/// 100.005 is half a basis point from 100; 100.02 is two.
#[test]
fn default_tolerance_is_one_basis_point() {
    assert!(approx_eq(100.0, 100.005));
    assert!(!approx_eq(100.0, 100.02));
}

#[test]
fn tolerance_is_reflexive_for_nonzero_values() {
    for value in [1e-18, 0.5, 2765.0, 3.6e15, 1e30] {
        assert!(Tolerance::default().accepts(value, value));
    }
}

#[tokio::test]
async fn pair_file_to_report() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(mainnet_pairs_csv().as_bytes()).expect("write csv");

    let pairs = load_pairs(file.path()).expect("pairs load");
    assert_eq!(pairs.len(), 3);

    let (_, reserves) = mainnet_pairs();
    let chain = InMemoryV2::new(&pairs, &reserves);

    let report = verify_v2_pairs(&pairs, &chain, &chain, DEFAULT_PPM_TOLERANCE)
        .await
        .expect("verification runs");

    assert_eq!(report.checks.len(), 3);
    assert!(report.all_passed(), "{report:?}");
    assert_eq!(report.passed(), 3);
}

#[tokio::test]
async fn skewed_router_is_reported_not_raised() {
    let (pairs, reserves) = mainnet_pairs();
    let mut chain = InMemoryV2::new(&pairs, &reserves);
    // ~2.5% of the WETH/USDT sell price; negligible for the 18-decimal pairs.
    chain.sell_skew = BigUint::from(60_000_000u64);

    let report = verify_v2_pairs(&pairs, &chain, &chain, DEFAULT_PPM_TOLERANCE)
        .await
        .expect("mismatches are not errors");

    let weth_usdt = report
        .checks
        .iter()
        .find(|c| c.pair == WETH_USDT_V2)
        .expect("pair checked");
    assert!(!weth_usdt.sell_ok);
    assert!(weth_usdt.buy_ok);
    assert_eq!(report.failed(), 1);
}

/// A gated buy passes as 0 against 0: the reference never reaches the router,
/// so the pass says nothing about the on-chain buy price.
#[tokio::test]
async fn gated_buy_passes_as_zero_against_zero() {
    let (pairs, reserves) = mainnet_pairs();
    let chain = InMemoryV2::new(&pairs, &reserves);

    let report = verify_v2_pairs(&pairs, &chain, &chain, DEFAULT_PPM_TOLERANCE)
        .await
        .expect("verification runs");

    let weth_usdt = report
        .checks
        .iter()
        .find(|c| c.pair == WETH_USDT_V2)
        .expect("pair checked");
    assert!(weth_usdt.buy_ok);
    assert_eq!(weth_usdt.estimate.buy_price, BigUint::default());
    assert_eq!(weth_usdt.reference.buy_price, BigUint::default());
    assert!(weth_usdt.estimate.sell_price > BigUint::default());
}

#[tokio::test]
async fn unknown_pair_is_an_error() {
    let (pairs, reserves) = mainnet_pairs();
    let chain = InMemoryV2::new(&pairs[..1], &reserves[..1]);

    let err = verify_v2_pairs(&pairs, &chain, &chain, DEFAULT_PPM_TOLERANCE)
        .await
        .expect_err("missing reserves");
    assert!(format!("{err:#}").contains("unknown pair"));
}

#[tokio::test]
async fn single_tick_estimates_match_virtual_reserve_quotes() {
    let state = usdc_weth_v3_state();
    let quoter = VirtualReserveQuoter {
        state: state.clone(),
    };

    let report = verify_v3_pool(state.pool, &FixedPool(state), &quoter, V3CheckConfig::default())
        .await
        .expect("verification runs");

    assert_eq!(report.amount, U256::from(10_000_000u64));
    assert!(report.all_passed(), "{report:?}");
    assert!(report.exact_input.comparison.relative_error.abs() < 1e-6);
    assert!(report.exact_output.comparison.relative_error.abs() < 1e-6);
}

/// A zero tolerance still accepts nothing but exact matches, so the
/// floored quote against the `+1`-biased estimate fails.
#[tokio::test]
async fn zero_tolerance_rejects_rounding_differences() {
    let state = usdc_weth_v3_state();
    let quoter = VirtualReserveQuoter {
        state: state.clone(),
    };
    let config = V3CheckConfig {
        tolerance: Tolerance::new(0.0).expect("valid"),
        ..V3CheckConfig::default()
    };

    let report = verify_v3_pool(state.pool, &FixedPool(state), &quoter, config)
        .await
        .expect("verification runs");
    assert!(!report.exact_input.comparison.acceptable);
}

#[tokio::test]
async fn trade_larger_than_the_tick_is_an_error() {
    let state = usdc_weth_v3_state();
    let quoter = VirtualReserveQuoter {
        state: state.clone(),
    };
    // Virtual token0 reserve is L / √P, about 1.3e15 base units (1.3e9 USDC).
    let config = V3CheckConfig {
        tokens: 5_000_000_000,
        ..V3CheckConfig::default()
    };

    let err = verify_v3_pool(state.pool, &FixedPool(state), &quoter, config)
        .await
        .expect_err("exhausted");
    assert!(format!("{err:#}").contains("token0 out"));
}
