//! Data-source seams between the pricing core and the chain.
//!
//! The verification harness is generic over these traits so it can run
//! against an RPC node ([`crate::v2::V2RpcSource`], [`crate::v3::V3RpcSource`])
//! or against fixed in-memory values in tests.

#![allow(async_fn_in_trait)]

use alloy::primitives::{Address, U256};
use amm_math::v2::ReservePair;
use eyre::Result;

use crate::types::{PairInfo, PriceResult, V3PoolState};

/// Reads current reserves of V2 pairs.
pub trait ReserveSource {
    /// Returns one [`ReservePair`] per address, in input order.
    async fn fetch_reserves(&self, pairs: &[Address]) -> Result<Vec<ReservePair>>;
}

/// Reads on-chain computed buy/sell prices for V2 pairs.
pub trait ReferencePriceSource {
    /// Returns one [`PriceResult`] per pair, in input order, for a trade of
    /// one whole token0 (`10^decimals0`).
    async fn fetch_reference_prices(&self, pairs: &[PairInfo]) -> Result<Vec<PriceResult>>;
}

/// Reads the state of a V3 pool.
pub trait PoolStateSource {
    /// Returns tokens, fee, liquidity, tick and `sqrtPriceX96` of `pool`, all
    /// read at the same block.
    async fn fetch_pool_state(&self, pool: Address) -> Result<V3PoolState>;
}

/// Single-pool swap to be quoted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuoteRequest {
    /// Token paid into the pool.
    pub token_in: Address,
    /// Token taken out of the pool.
    pub token_out: Address,
    /// Pool fee in pips, selects the pool.
    pub fee: u32,
    /// Exact input amount, or exact output amount, depending on the quote.
    pub amount: U256,
}

/// Exact swap quotes from an on-chain quoter.
pub trait QuoteSource {
    /// Output amount for exactly `request.amount` of `token_in`.
    async fn quote_exact_input(&self, request: &QuoteRequest) -> Result<U256>;

    /// Input amount needed to receive exactly `request.amount` of `token_out`.
    async fn quote_exact_output(&self, request: &QuoteRequest) -> Result<U256>;
}
