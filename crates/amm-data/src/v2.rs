//! Uniswap V2 reserves and router reference prices over JSON-RPC.
//!
//! Reserves come from the pair's `getReserves()`. Reference prices come from
//! Router02's pure `getAmountOut` / `getAmountIn`, evaluated against the same
//! reserves, so the reference is exactly what the chain would compute. Both
//! reads happen at the client's block, so the client should be
//! [pinned](crate::rpc::RpcClient::pinned) before use.
//!
//! The reference applies the same `10^decimals0 >= reserve1` feasibility gate
//! as the local buy price and reports 0 without calling the router. A passing
//! buy check on such a pair is 0 against 0 and confirms nothing on chain.

use alloy::primitives::{address, Address, U256};
use alloy::sol;
use amm_math::v2::{trade_unit, u256_to_biguint, ReservePair};
use eyre::{Context, Result};
use futures::future::try_join_all;
use num_bigint::BigUint;

use crate::rpc::RpcClient;
use crate::source::{ReferencePriceSource, ReserveSource};
use crate::types::{PairInfo, PriceResult};

/// Uniswap V2 Router02 on Ethereum mainnet.
pub const UNISWAP_V2_ROUTER: Address = address!("7a250d5630B4cF539739dF2C5dAcb4c659F2488D");

sol! {
    interface IUniswapV2Pair {
        function getReserves() external view returns (uint112 reserve0, uint112 reserve1, uint32 blockTimestampLast);
    }

    interface IUniswapV2Router02 {
        function getAmountOut(uint amountIn, uint reserveIn, uint reserveOut) external pure returns (uint amountOut);
        function getAmountIn(uint amountOut, uint reserveIn, uint reserveOut) external pure returns (uint amountIn);
    }
}

/// Reads V2 reserves and router reference prices from an RPC node.
#[derive(Clone, Debug)]
pub struct V2RpcSource {
    rpc: RpcClient,
    router: Address,
}

impl V2RpcSource {
    /// Creates a source that uses `router` for reference prices.
    pub fn new(rpc: RpcClient, router: Address) -> Self {
        Self { rpc, router }
    }

    async fn pair_reserves(&self, pair: Address) -> Result<(U256, U256)> {
        let reserves = self
            .rpc
            .call(pair, &IUniswapV2Pair::getReservesCall {})
            .await
            .wrap_err_with(|| format!("getReserves failed for pair {pair:#x}"))?;

        Ok((
            U256::from(reserves.reserve0.to::<u128>()),
            U256::from(reserves.reserve1.to::<u128>()),
        ))
    }

    async fn reference_price(&self, info: &PairInfo) -> Result<PriceResult> {
        let (reserve0, reserve1) = self.pair_reserves(info.pair).await?;
        let unit = trade_unit(info.trade_decimals());
        let unit_u256 = U256::from(10u64).pow(U256::from(info.trade_decimals()));

        let sell = self
            .rpc
            .call(
                self.router,
                &IUniswapV2Router02::getAmountOutCall {
                    amountIn: unit_u256,
                    reserveIn: reserve0,
                    reserveOut: reserve1,
                },
            )
            .await
            .wrap_err_with(|| format!("router getAmountOut failed for pair {:#x}", info.pair))?;

        // Same feasibility rule as the off-chain buy price.
        let buy_price = if unit >= u256_to_biguint(reserve1) {
            BigUint::default()
        } else {
            let buy = self
                .rpc
                .call(
                    self.router,
                    &IUniswapV2Router02::getAmountInCall {
                        amountOut: unit_u256,
                        reserveIn: reserve1,
                        reserveOut: reserve0,
                    },
                )
                .await
                .wrap_err_with(|| format!("router getAmountIn failed for pair {:#x}", info.pair))?;
            u256_to_biguint(buy.amountIn)
        };

        Ok(PriceResult {
            pair: info.pair,
            buy_price,
            sell_price: u256_to_biguint(sell.amountOut),
        })
    }
}

impl ReserveSource for V2RpcSource {
    #[tracing::instrument(skip_all, fields(pairs = pairs.len()))]
    async fn fetch_reserves(&self, pairs: &[Address]) -> Result<Vec<ReservePair>> {
        let reserves = try_join_all(pairs.iter().map(|pair| self.pair_reserves(*pair))).await?;

        tracing::debug!(count = reserves.len(), "fetched pair reserves");
        Ok(reserves
            .into_iter()
            .map(|(reserve0, reserve1)| ReservePair::from_u256(reserve0, reserve1))
            .collect())
    }
}

impl ReferencePriceSource for V2RpcSource {
    #[tracing::instrument(skip_all, fields(pairs = pairs.len(), router = %self.router))]
    async fn fetch_reference_prices(&self, pairs: &[PairInfo]) -> Result<Vec<PriceResult>> {
        let prices = try_join_all(pairs.iter().map(|info| self.reference_price(info))).await?;

        tracing::debug!(count = prices.len(), "fetched router reference prices");
        Ok(prices)
    }
}
