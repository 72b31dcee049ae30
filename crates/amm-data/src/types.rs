//! Type definitions shared by the data sources and the verification harness.

use alloy::primitives::{Address, U256};
use amm_math::v2::V2Prices;
use amm_math::v3::{spot_price, sqrt_price_at_tick};
use num_bigint::BigUint;

/// One row of the pair list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PairInfo {
    /// token0 of the pair.
    pub token0: Address,
    /// token1 of the pair.
    pub token1: Address,
    /// Pair contract address.
    pub pair: Address,
    /// Decimals of token0.
    pub decimals0: u8,
    /// Decimals of token1.
    pub decimals1: u8,
}

impl PairInfo {
    /// Exponent of the unit trade: one whole token0.
    pub fn trade_decimals(&self) -> u32 {
        u32::from(self.decimals0)
    }
}

/// Buy and sell price of a pair for one unit trade.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PriceResult {
    /// Pair contract address.
    pub pair: Address,
    /// token1 paid for one unit of token0. Zero means infeasible.
    pub buy_price: BigUint,
    /// token1 received for one unit of token0.
    pub sell_price: BigUint,
}

impl PriceResult {
    /// Tags computed prices with their pair.
    pub fn new(pair: Address, prices: V2Prices) -> Self {
        Self {
            pair,
            buy_price: prices.buy_price,
            sell_price: prices.sell_price,
        }
    }
}

/// Snapshot of a Uniswap V3 pool.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct V3PoolState {
    /// Pool contract address.
    pub pool: Address,
    /// token0 address.
    pub token0: Address,
    /// token1 address.
    pub token1: Address,
    /// Pool fee in pips.
    pub fee: u32,
    /// Active liquidity.
    pub liquidity: u128,
    /// Current tick from `slot0`.
    pub tick: i32,
    /// Current `sqrtPriceX96` from `slot0`.
    pub sqrt_price_x96: U256,
    /// Decimals of token0.
    pub token0_decimals: u8,
    /// Decimals of token1.
    pub token1_decimals: u8,
}

impl V3PoolState {
    /// `√P` derived from the tick, as the estimators expect it.
    pub fn sqrt_price(&self) -> f64 {
        sqrt_price_at_tick(self.tick)
    }

    /// Active liquidity as `f64`.
    pub fn liquidity_f64(&self) -> f64 {
        self.liquidity as f64
    }

    /// Human price of one token0 in token1.
    pub fn spot_price(&self) -> f64 {
        spot_price(self.sqrt_price(), self.token0_decimals, self.token1_decimals)
    }
}
