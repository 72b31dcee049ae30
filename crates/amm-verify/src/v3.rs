//! V3 estimate verification.
//!
//! A trade of `tokens` whole token0 is priced two ways against the pool's
//! current state:
//!
//! - exact input: sell token0, estimate token1 received
//! - exact output: buy token0, estimate token1 paid (fee included)
//!
//! Both estimates use the single-tick formulas and are compared with the
//! quoter, which runs the real swap.

use alloy::primitives::{Address, U256};
use amm_data::{PoolStateSource, QuoteRequest, QuoteSource, V3PoolState};
use amm_math::fee::{amount_after_fee, amount_before_fee};
use amm_math::tolerance::{Comparison, Tolerance};
use amm_math::v3::{amount_delta, estimate_sqrt_price, u256_to_f64, Direction, Token};
use eyre::{eyre, Context, Result};

/// Default trade size in whole token0.
pub const DEFAULT_TOKENS_TO_TEST: u64 = 10;

/// Parameters of a V3 check.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct V3CheckConfig {
    /// Trade size in whole token0.
    pub tokens: u64,
    pub tolerance: Tolerance,
}

impl Default for V3CheckConfig {
    fn default() -> Self {
        Self {
            tokens: DEFAULT_TOKENS_TO_TEST,
            tolerance: Tolerance::default(),
        }
    }
}

/// Intermediate and final values of a single-tick swap estimate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct V3Estimates {
    /// token0 traded, in base units.
    pub amount_token0: f64,
    /// token0 reaching the curve on the exact input side.
    pub amount_after_fee: f64,
    /// √P before the trade.
    pub sqrt_price: f64,
    /// √P after selling `amount_token0` into the pool.
    pub sqrt_price_after_input: f64,
    /// √P after buying `amount_token0` from the pool.
    pub sqrt_price_after_output: f64,
    /// token1 received for the exact input.
    pub token1_out: f64,
    /// token1 paid, fee included, for the exact output.
    pub token1_in: f64,
}

/// One estimate checked against one quote.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct QuoteCheck {
    pub estimate: f64,
    pub quoted: U256,
    pub comparison: Comparison,
}

impl QuoteCheck {
    fn new(estimate: f64, quoted: U256, tolerance: &Tolerance) -> Self {
        Self {
            estimate,
            quoted,
            comparison: tolerance.compare(u256_to_f64(quoted), estimate),
        }
    }
}

/// Outcome of a V3 run.
#[derive(Clone, Debug, PartialEq)]
pub struct V3Report {
    pub state: V3PoolState,
    /// token0 traded, in base units.
    pub amount: U256,
    pub estimates: V3Estimates,
    /// token0 -> token1, exact input.
    pub exact_input: QuoteCheck,
    /// token1 -> token0, exact output.
    pub exact_output: QuoteCheck,
}

impl V3Report {
    pub fn all_passed(&self) -> bool {
        self.exact_input.comparison.acceptable && self.exact_output.comparison.acceptable
    }
}

/// `tokens * 10^decimals`.
///
/// # Errors
/// Returns error if the amount overflows `uint256`.
pub fn trade_amount(tokens: u64, decimals: u8) -> Result<U256> {
    U256::from(10u64)
        .checked_pow(U256::from(decimals))
        .and_then(|unit| unit.checked_mul(U256::from(tokens)))
        .ok_or_else(|| eyre!("{tokens} tokens with {decimals} decimals overflow uint256"))
}

/// Estimates both sides of a token0 trade of `amount_token0` base units.
///
/// # Errors
/// Returns error for an invalid pool fee, or when the trade would exhaust
/// the active liquidity.
pub fn estimate_v3_swap(state: &V3PoolState, amount_token0: f64) -> Result<V3Estimates> {
    let liquidity = state.liquidity_f64();
    let sqrt_price = state.sqrt_price();
    let net_input = amount_after_fee(amount_token0, state.fee)?;

    let sqrt_price_after_input =
        estimate_sqrt_price(liquidity, sqrt_price, net_input, Token::Token0, Direction::In)
            .into_result("token0 in")?;
    let sqrt_price_after_output =
        estimate_sqrt_price(liquidity, sqrt_price, amount_token0, Token::Token0, Direction::Out)
            .into_result("token0 out")?;

    let token1_out = amount_delta(
        sqrt_price_after_input,
        sqrt_price,
        liquidity,
        Token::Token1,
        Direction::Out,
    )
    .into_result("token1 out")?;
    let net_token1_in = amount_delta(
        sqrt_price,
        sqrt_price_after_output,
        liquidity,
        Token::Token1,
        Direction::In,
    )
    .into_result("token1 in")?;
    let token1_in = amount_before_fee(net_token1_in, state.fee)?;

    tracing::debug!(
        amount_token0,
        sqrt_price,
        sqrt_price_after_input,
        sqrt_price_after_output,
        token1_out,
        token1_in,
        "estimated V3 swap"
    );

    Ok(V3Estimates {
        amount_token0,
        amount_after_fee: net_input,
        sqrt_price,
        sqrt_price_after_input,
        sqrt_price_after_output,
        token1_out,
        token1_in,
    })
}

/// Reads `pool`, estimates a `config.tokens` token0 trade both ways and
/// checks the estimates against `quoter`.
///
/// # Errors
/// Returns error if a source fails or the trade cannot be estimated.
/// Out-of-tolerance estimates are reported, not returned as errors.
#[tracing::instrument(skip(state_source, quoter), fields(tokens = config.tokens))]
pub async fn verify_v3_pool<S, Q>(
    pool: Address,
    state_source: &S,
    quoter: &Q,
    config: V3CheckConfig,
) -> Result<V3Report>
where
    S: PoolStateSource,
    Q: QuoteSource,
{
    let state = state_source
        .fetch_pool_state(pool)
        .await
        .wrap_err_with(|| format!("failed to read V3 pool {pool:#x}"))?;

    let amount = trade_amount(config.tokens, state.token0_decimals)?;
    let estimates = estimate_v3_swap(&state, u256_to_f64(amount))?;

    let sell_token0 = QuoteRequest {
        token_in: state.token0,
        token_out: state.token1,
        fee: state.fee,
        amount,
    };
    let buy_token0 = QuoteRequest {
        token_in: state.token1,
        token_out: state.token0,
        fee: state.fee,
        amount,
    };

    let (quoted_out, quoted_in) = futures::try_join!(
        quoter.quote_exact_input(&sell_token0),
        quoter.quote_exact_output(&buy_token0),
    )
    .wrap_err("quoter call failed")?;

    let report = V3Report {
        exact_input: QuoteCheck::new(estimates.token1_out, quoted_out, &config.tolerance),
        exact_output: QuoteCheck::new(estimates.token1_in, quoted_in, &config.tolerance),
        state,
        amount,
        estimates,
    };

    tracing::info!(
        exact_input_error = report.exact_input.comparison.relative_error,
        exact_output_error = report.exact_output.comparison.relative_error,
        passed = report.all_passed(),
        "V3 verification complete"
    );
    Ok(report)
}
