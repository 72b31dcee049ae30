//! Shared test helpers and utilities.
//!
//! Provides mainnet-shaped fixtures and in-memory implementations of the
//! data-source traits, so the verification flows run without an RPC node.

#![allow(dead_code)]

use alloy::primitives::{address, Address, U256};
use amm_data::{
    PairInfo, PoolStateSource, PriceResult, QuoteRequest, QuoteSource, ReferencePriceSource,
    ReserveSource, V3PoolState,
};
use amm_math::fee::MAX_FEE;
use amm_math::v2::{get_amount_in, get_amount_out, trade_unit, ReservePair};
use eyre::{eyre, Result};
use num_bigint::BigUint;

pub const USDC: Address = address!("A0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48");
pub const WETH: Address = address!("C02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2");
pub const USDT: Address = address!("dAC17F958D2ee523a2206206994597C13D831ec7");
pub const DAI: Address = address!("6B175474E89094C44Da98b954EedeAC495271d0F");

pub const USDC_WETH_V2: Address = address!("B4e16d0168e52d35CaCD2c6185b44281Ec28C9Dc");
pub const WETH_USDT_V2: Address = address!("0d4a11d5EEaaC28EC3F61d100daF4d40471f1852");
pub const DAI_WETH_V2: Address = address!("A478c2975Ab1Ea89e8196811F51A7B7Ade33eB11");

/// Builds a [`PairInfo`] row.
pub fn pair_info(token0: Address, token1: Address, pair: Address, decimals0: u8, decimals1: u8) -> PairInfo {
    PairInfo {
        token0,
        token1,
        pair,
        decimals0,
        decimals1,
    }
}

/// Three mainnet V2 pairs with plausible reserves, in matching order.
///
/// - USDC/WETH: ~30M USDC vs ~12k WETH
/// - WETH/USDT: ~8k WETH vs ~20M USDT
/// - DAI/WETH: ~5M DAI vs ~2k WETH
pub fn mainnet_pairs() -> (Vec<PairInfo>, Vec<ReservePair>) {
    let pairs = vec![
        pair_info(USDC, WETH, USDC_WETH_V2, 6, 18),
        pair_info(WETH, USDT, WETH_USDT_V2, 18, 6),
        pair_info(DAI, WETH, DAI_WETH_V2, 18, 18),
    ];
    let reserves = vec![
        ReservePair::new(30_123_456_789_012u128, 12_345_678_901_234_567_890_123u128),
        ReservePair::new(8_000_123_456_789_000_000_000u128, 20_001_234_567_890u128),
        ReservePair::new(5_000_000_123_456_789_000_000_000u128, 2_000_987_654_321_000_000_000u128),
    ];
    (pairs, reserves)
}

/// The `pair-check.csv` rows matching [`mainnet_pairs`].
pub fn mainnet_pairs_csv() -> String {
    let (pairs, _) = mainnet_pairs();
    let mut csv = String::from("token0,token1,pair,decimals0,decimals1\n");
    for p in pairs {
        csv.push_str(&format!(
            "{:#x},{:#x},{:#x},{},{}\n",
            p.token0, p.token1, p.pair, p.decimals0, p.decimals1
        ));
    }
    csv
}

/// In-memory V2 chain: returns fixed reserves and prices them with the
/// router's `getAmountOut` / `getAmountIn`.
pub struct InMemoryV2 {
    pairs: Vec<(Address, ReservePair)>,
    /// Added to every reference sell price, to simulate a mismatch.
    pub sell_skew: BigUint,
}

impl InMemoryV2 {
    pub fn new(pairs: &[PairInfo], reserves: &[ReservePair]) -> Self {
        Self {
            pairs: pairs
                .iter()
                .map(|p| p.pair)
                .zip(reserves.iter().cloned())
                .collect(),
            sell_skew: BigUint::default(),
        }
    }

    fn reserves_of(&self, pair: Address) -> Result<&ReservePair> {
        self.pairs
            .iter()
            .find(|(address, _)| *address == pair)
            .map(|(_, reserves)| reserves)
            .ok_or_else(|| eyre!("unknown pair {pair:#x}"))
    }
}

impl ReserveSource for InMemoryV2 {
    async fn fetch_reserves(&self, pairs: &[Address]) -> Result<Vec<ReservePair>> {
        pairs.iter().map(|p| self.reserves_of(*p).cloned()).collect()
    }
}

impl ReferencePriceSource for InMemoryV2 {
    async fn fetch_reference_prices(&self, pairs: &[PairInfo]) -> Result<Vec<PriceResult>> {
        pairs
            .iter()
            .map(|info| {
                let reserves = self.reserves_of(info.pair)?;
                let unit = trade_unit(info.trade_decimals());
                let sell_price =
                    get_amount_out(&unit, &reserves.reserve0, &reserves.reserve1)? + &self.sell_skew;
                let buy_price = if unit >= reserves.reserve1 {
                    BigUint::default()
                } else {
                    get_amount_in(&unit, &reserves.reserve1, &reserves.reserve0)?
                };
                Ok(PriceResult {
                    pair: info.pair,
                    buy_price,
                    sell_price,
                })
            })
            .collect()
    }
}

/// USDC/WETH 0.3% V3 pool at a tick near 2765 USDC per WETH.
pub fn usdc_weth_v3_state() -> V3PoolState {
    V3PoolState {
        pool: address!("8ad599c3A0ff1De082011EFDDc58f1908eb6e6D8"),
        token0: USDC,
        token1: WETH,
        fee: 3000,
        liquidity: 25_000_000_000_000_000_000,
        tick: 197_071,
        sqrt_price_x96: U256::from_str_radix("1506673274302120988651364689808458", 10)
            .expect("valid U256"),
        token0_decimals: 6,
        token1_decimals: 18,
    }
}

/// Fixed V3 pool state.
pub struct FixedPool(pub V3PoolState);

impl PoolStateSource for FixedPool {
    async fn fetch_pool_state(&self, pool: Address) -> Result<V3PoolState> {
        if pool != self.0.pool {
            return Err(eyre!("unknown pool {pool:#x}"));
        }
        Ok(self.0.clone())
    }
}

/// Quotes single-tick swaps from virtual reserves `x = L/√P`, `y = L·√P`,
/// the way a pool does when no tick is crossed.
pub struct VirtualReserveQuoter {
    pub state: V3PoolState,
}

impl VirtualReserveQuoter {
    fn reserves(&self) -> (f64, f64) {
        let liquidity = self.state.liquidity_f64();
        let sqrt_price = self.state.sqrt_price();
        (liquidity / sqrt_price, liquidity * sqrt_price)
    }

    fn fee_factor(&self) -> f64 {
        f64::from(MAX_FEE - self.state.fee) / f64::from(MAX_FEE)
    }
}

impl QuoteSource for VirtualReserveQuoter {
    async fn quote_exact_input(&self, request: &QuoteRequest) -> Result<U256> {
        if request.token_in != self.state.token0 {
            return Err(eyre!("only token0 input is quoted"));
        }
        let (x, y) = self.reserves();
        let net = amm_math::v3::u256_to_f64(request.amount) * self.fee_factor();
        let out = y * net / (x + net);
        Ok(U256::from(out.floor() as u128))
    }

    async fn quote_exact_output(&self, request: &QuoteRequest) -> Result<U256> {
        if request.token_out != self.state.token0 {
            return Err(eyre!("only token0 output is quoted"));
        }
        let (x, y) = self.reserves();
        let amount = amm_math::v3::u256_to_f64(request.amount);
        if amount >= x {
            return Err(eyre!("not enough token0 in range"));
        }
        let net = y * amount / (x - amount);
        Ok(U256::from((net / self.fee_factor()).ceil() as u128))
    }
}
