//! Integration tests for the V2 buy/sell price model.

mod common;

use amm_math::v2::{buy_price, get_amount_in, get_amount_out, pair_prices, sell_price, trade_unit, ReservePair};
use amm_verify::estimate_pair_prices;
use common::*;
use num_bigint::BigUint;

/// Selling 1000 units of token0 into (1_000_000, 2_000_000).
///
/// floor(2_000_000 * 1000 * 997 / (1_000_000 * 1000 + 1000 * 997)) = 1992
#[test]
fn sell_thousand_units_small_pool() {
    let reserves = ReservePair::new(1_000_000u64, 2_000_000u64);
    assert_eq!(sell_price(&reserves, 3), BigUint::from(1992u32));
}

/// Buying 1000 units of token0 from (1_000_000, 2_000_000).
///
/// floor(2_000_000_000 / floor(999_000 * 997 / 1000)) + 1 = 2008 + 1
#[test]
fn buy_thousand_units_small_pool() {
    let reserves = ReservePair::new(1_000_000u64, 2_000_000u64);
    assert_eq!(buy_price(&reserves, 3).expect("live reserves"), BigUint::from(2009u32));
}

/// Buying costs more than selling returns: the fee and price impact both
/// work against the trader.
#[test]
fn spread_is_positive_for_feasible_pairs() {
    let (pairs, reserves) = mainnet_pairs();
    for (info, r) in pairs.iter().zip(&reserves) {
        let prices = pair_prices(r, info.trade_decimals()).expect("live reserves");
        if prices.buy_price == BigUint::default() {
            continue;
        }
        assert!(
            prices.buy_price > prices.sell_price,
            "pair {:#x}: buy {} <= sell {}",
            info.pair,
            prices.buy_price,
            prices.sell_price
        );
    }
}

/// Selling one whole token0 gives exactly what the router computes.
#[test]
fn sell_price_equals_router_get_amount_out() {
    let (pairs, reserves) = mainnet_pairs();
    for (info, r) in pairs.iter().zip(&reserves) {
        let unit = trade_unit(info.trade_decimals());
        let router = get_amount_out(&unit, &r.reserve0, &r.reserve1).expect("valid");
        assert_eq!(sell_price(r, info.trade_decimals()), router);
    }
}

/// The buy price floors the fee-adjusted reserve before dividing, so it can
/// sit a few units above the router's `getAmountIn`, never below, and never
/// by more than a part per million on real pools.
#[test]
fn buy_price_tracks_router_get_amount_in() {
    let (pairs, reserves) = mainnet_pairs();
    for (info, r) in pairs.iter().zip(&reserves) {
        let unit = trade_unit(info.trade_decimals());
        if unit >= r.reserve1 {
            continue;
        }
        let router = get_amount_in(&unit, &r.reserve1, &r.reserve0).expect("valid");
        let local = buy_price(r, info.trade_decimals()).expect("live reserves");

        assert!(local >= router);
        assert!(amm_math::within_ppm(&router, &local, 1));
    }
}

#[test]
fn unit_at_least_reserve1_is_infeasible_not_free() {
    let reserves = ReservePair::new(10u128.pow(24), 10u128.pow(18));
    assert_eq!(buy_price(&reserves, 18).expect("no error"), BigUint::default());
    assert!(sell_price(&reserves, 18) > BigUint::default());
}

/// The feasibility gate compares `10^decimals0` with the token1 reserve, so
/// one whole WETH against a USDT reserve in 6-decimal units reads as
/// infeasible even though the pool could fill it.
#[test]
fn weth_usdt_buy_is_gated_on_token1_reserve() {
    let (pairs, reserves) = mainnet_pairs();
    assert_eq!(pairs[1].pair, WETH_USDT_V2);

    let prices = pair_prices(&reserves[1], pairs[1].trade_decimals()).expect("no error");
    assert_eq!(prices.buy_price, BigUint::default());
    assert_eq!(prices.sell_price, BigUint::from(2_492_304_793u64));
}

#[test]
fn estimates_keep_pair_order() {
    let (pairs, reserves) = mainnet_pairs();
    let prices = estimate_pair_prices(&pairs, &reserves).expect("prices");

    let order: Vec<_> = prices.iter().map(|p| p.pair).collect();
    assert_eq!(order, vec![USDC_WETH_V2, WETH_USDT_V2, DAI_WETH_V2]);
}

/// 1 USDC buys roughly 1/2440 WETH in the fixture pool.
#[test]
fn usdc_weth_prices_are_in_weth_base_units() {
    let (pairs, reserves) = mainnet_pairs();
    let prices = pair_prices(&reserves[0], pairs[0].trade_decimals()).expect("live reserves");

    let lower = BigUint::from(390_000_000_000_000u64); // 0.00039 WETH
    let upper = BigUint::from(420_000_000_000_000u64); // 0.00042 WETH
    assert!(prices.sell_price > lower && prices.sell_price < upper);
    assert!(prices.buy_price > lower && prices.buy_price < upper);
}
