//! Uniswap V3 pool state and QuoterV2 quotes over JSON-RPC.
//!
//! The pool state needed by the estimators is spread over several view
//! functions (`token0`, `token1`, `fee`, `liquidity`, `slot0`) plus the
//! token's `decimals`; they are read concurrently at the same block.
//! Reference amounts come from QuoterV2, which simulates the real swap
//! (including tick crossings) and reverts with the result.

use alloy::primitives::aliases::{U160, U24};
use alloy::primitives::{address, Address, U256};
use alloy::sol;
use amm_math::fee::validate_fee;
use eyre::{eyre, Context, Result};

use crate::rpc::RpcClient;
use crate::source::{PoolStateSource, QuoteRequest, QuoteSource};
use crate::types::V3PoolState;

/// Uniswap V3 WETH/USDC 0.3% pool on Ethereum mainnet.
///
/// - token0 = USDC (6 decimals)
/// - token1 = WETH (18 decimals)
pub const V3_WETH_USDC_POOL: Address = address!("8ad599c3A0ff1De082011EFDDc58f1908eb6e6D8");

/// Uniswap QuoterV2 on Ethereum mainnet.
pub const UNISWAP_V3_QUOTER_V2: Address = address!("61fFE014bA17989E743c5F6cB21bF9697530B21e");

sol! {
    interface IUniswapV3Pool {
        function token0() external view returns (address token0);
        function token1() external view returns (address token1);
        function fee() external view returns (uint24 fee);
        function liquidity() external view returns (uint128 liquidity);
        function slot0() external view returns (
            uint160 sqrtPriceX96,
            int24 tick,
            uint16 observationIndex,
            uint16 observationCardinality,
            uint16 observationCardinalityNext,
            uint8 feeProtocol,
            bool unlocked
        );
    }

    interface IERC20Metadata {
        function decimals() external view returns (uint8 decimals);
    }

    interface IQuoterV2 {
        struct QuoteExactInputSingleParams {
            address tokenIn;
            address tokenOut;
            uint256 amountIn;
            uint24 fee;
            uint160 sqrtPriceLimitX96;
        }

        struct QuoteExactOutputSingleParams {
            address tokenIn;
            address tokenOut;
            uint256 amount;
            uint24 fee;
            uint160 sqrtPriceLimitX96;
        }

        function quoteExactInputSingle(QuoteExactInputSingleParams memory params)
            external
            returns (uint256 amountOut, uint160 sqrtPriceX96After, uint32 initializedTicksCrossed, uint256 gasEstimate);

        function quoteExactOutputSingle(QuoteExactOutputSingleParams memory params)
            external
            returns (uint256 amountIn, uint160 sqrtPriceX96After, uint32 initializedTicksCrossed, uint256 gasEstimate);
    }
}

/// Price-relevant part of `slot0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot0 {
    /// Current √P in Q64.96.
    pub sqrt_price_x96: U256,
    /// Current tick.
    pub tick: i32,
}

/// Reads V3 pool state and quotes from an RPC node.
#[derive(Clone, Debug)]
pub struct V3RpcSource {
    rpc: RpcClient,
    quoter: Address,
}

impl V3RpcSource {
    /// Creates a source that quotes through `quoter`.
    pub fn new(rpc: RpcClient, quoter: Address) -> Self {
        Self { rpc, quoter }
    }

    /// Reads `slot0()` of `pool`.
    ///
    /// # Errors
    /// Returns error if the call fails or the tick does not fit `int24`.
    pub async fn slot0(&self, pool: Address) -> Result<Slot0> {
        let slot0 = self
            .rpc
            .call(pool, &IUniswapV3Pool::slot0Call {})
            .await
            .wrap_err_with(|| format!("slot0 failed for pool {pool:#x}"))?;

        let tick = i32::try_from(slot0.tick)
            .map_err(|e| eyre!("slot0 tick out of range for pool {pool:#x}: {e:?}"))?;

        Ok(Slot0 {
            sqrt_price_x96: U256::from(slot0.sqrtPriceX96),
            tick,
        })
    }

    async fn decimals(&self, token: Address) -> Result<u8> {
        let decimals = self
            .rpc
            .call(token, &IERC20Metadata::decimalsCall {})
            .await
            .wrap_err_with(|| format!("decimals failed for token {token:#x}"))?;
        Ok(decimals.decimals)
    }
}

impl PoolStateSource for V3RpcSource {
    #[tracing::instrument(skip(self), fields(block = %self.rpc.block().as_param()))]
    async fn fetch_pool_state(&self, pool: Address) -> Result<V3PoolState> {
        let (token0, token1, fee, liquidity, slot0) = futures::try_join!(
            self.rpc.call(pool, &IUniswapV3Pool::token0Call {}),
            self.rpc.call(pool, &IUniswapV3Pool::token1Call {}),
            self.rpc.call(pool, &IUniswapV3Pool::feeCall {}),
            self.rpc.call(pool, &IUniswapV3Pool::liquidityCall {}),
            self.slot0(pool),
        )
        .wrap_err_with(|| format!("failed to read pool state for {pool:#x}"))?;

        let (token0_decimals, token1_decimals) =
            futures::try_join!(self.decimals(token0.token0), self.decimals(token1.token1))?;

        let state = V3PoolState {
            pool,
            token0: token0.token0,
            token1: token1.token1,
            fee: fee.fee.to::<u32>(),
            liquidity: liquidity.liquidity,
            tick: slot0.tick,
            sqrt_price_x96: slot0.sqrt_price_x96,
            token0_decimals,
            token1_decimals,
        };

        tracing::debug!(
            fee = state.fee,
            liquidity = state.liquidity,
            tick = state.tick,
            "fetched V3 pool state"
        );
        Ok(state)
    }
}

impl QuoteSource for V3RpcSource {
    #[tracing::instrument(skip(self), fields(quoter = %self.quoter))]
    async fn quote_exact_input(&self, request: &QuoteRequest) -> Result<U256> {
        validate_fee(request.fee)?;
        let call = IQuoterV2::quoteExactInputSingleCall {
            params: IQuoterV2::QuoteExactInputSingleParams {
                tokenIn: request.token_in,
                tokenOut: request.token_out,
                amountIn: request.amount,
                fee: U24::from(request.fee),
                sqrtPriceLimitX96: U160::ZERO,
            },
        };

        let quote = self
            .rpc
            .call(self.quoter, &call)
            .await
            .wrap_err("quoteExactInputSingle failed")?;

        tracing::debug!(
            amount_out = %quote.amountOut,
            ticks_crossed = quote.initializedTicksCrossed,
            "exact input quote"
        );
        Ok(quote.amountOut)
    }

    #[tracing::instrument(skip(self), fields(quoter = %self.quoter))]
    async fn quote_exact_output(&self, request: &QuoteRequest) -> Result<U256> {
        validate_fee(request.fee)?;
        let call = IQuoterV2::quoteExactOutputSingleCall {
            params: IQuoterV2::QuoteExactOutputSingleParams {
                tokenIn: request.token_in,
                tokenOut: request.token_out,
                amount: request.amount,
                fee: U24::from(request.fee),
                sqrtPriceLimitX96: U160::ZERO,
            },
        };

        let quote = self
            .rpc
            .call(self.quoter, &call)
            .await
            .wrap_err("quoteExactOutputSingle failed")?;

        tracing::debug!(
            amount_in = %quote.amountIn,
            ticks_crossed = quote.initializedTicksCrossed,
            "exact output quote"
        );
        Ok(quote.amountIn)
    }
}
