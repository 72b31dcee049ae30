//! Uniswap V2 constant-product pricing with exact integer math.
//!
//! Every division here is floor division on non-negative big integers, which
//! is what the pair and router contracts do on `uint256`. The estimate must
//! match the on-chain number exactly, so nothing on this path touches `f64`.
//!
//! ## Formulas
//!
//! With reserves `(x, y)` and a unit trade `u = 10^d` of token0:
//!
//! ```text
//! sell = floor(y * u * 997 / (x * 1000 + u * 997))
//! buy  = floor(y * u / floor((x - u) * 997 / 1000)) + 1      (only when u < y)
//! ```
//!
//! The `+1` on the buy side rounds the cost up the same way
//! `UniswapV2Library.getAmountIn` does. When `u >= y` the buy is infeasible and
//! the price is reported as zero.

use alloy::primitives::U256;
use eyre::{bail, Result};
use num_bigint::BigUint;
use num_traits::{One, Zero};

/// Fee numerator of the standard 0.3% V2 fee.
pub const FEE_NUMERATOR: u32 = 997;
/// Fee denominator of the standard 0.3% V2 fee.
pub const FEE_DENOMINATOR: u32 = 1000;

/// Reserves of a constant-product pair at one point in time.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ReservePair {
    /// Reserve of token0 (`x`).
    pub reserve0: BigUint,
    /// Reserve of token1 (`y`).
    pub reserve1: BigUint,
}

impl ReservePair {
    /// Creates a reserve pair from anything convertible into `BigUint`.
    pub fn new(reserve0: impl Into<BigUint>, reserve1: impl Into<BigUint>) -> Self {
        Self {
            reserve0: reserve0.into(),
            reserve1: reserve1.into(),
        }
    }

    /// Builds a reserve pair from raw on-chain `uint` values.
    pub fn from_u256(reserve0: U256, reserve1: U256) -> Self {
        Self {
            reserve0: u256_to_biguint(reserve0),
            reserve1: u256_to_biguint(reserve1),
        }
    }
}

/// Sell and buy price for a single unit trade.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct V2Prices {
    /// token1 paid for buying `10^d` token0. Zero means infeasible.
    pub buy_price: BigUint,
    /// token1 received for selling `10^d` token0.
    pub sell_price: BigUint,
}

/// Converts an alloy `U256` into an arbitrary-precision integer.
pub fn u256_to_biguint(value: U256) -> BigUint {
    BigUint::from_bytes_be(&value.to_be_bytes::<32>())
}

/// Returns the unit trade size `10^decimals`.
pub fn trade_unit(decimals: u32) -> BigUint {
    BigUint::from(10u32).pow(decimals)
}

/// token1 received for selling `10^decimals` units of token0.
///
/// The denominator is at least 997, so this cannot fail even for an empty pool.
pub fn sell_price(reserves: &ReservePair, decimals: u32) -> BigUint {
    let unit = trade_unit(decimals);
    let unit_with_fee = &unit * FEE_NUMERATOR;

    let numerator = &reserves.reserve1 * &unit_with_fee;
    let denominator = &reserves.reserve0 * FEE_DENOMINATOR + &unit_with_fee;

    numerator / denominator
}

/// token1 cost of buying `10^decimals` units of token0, rounded up by one.
///
/// Returns zero when `10^decimals >= reserve1`; callers must read that as
/// "infeasible", not as a free trade.
///
/// # Errors
/// Returns an error when the reserves are degenerate: `reserve0 <= 10^decimals`
/// or the fee-adjusted remaining reserve floors to zero.
pub fn buy_price(reserves: &ReservePair, decimals: u32) -> Result<BigUint> {
    let unit = trade_unit(decimals);

    if unit >= reserves.reserve1 {
        return Ok(BigUint::zero());
    }

    if reserves.reserve0 <= unit {
        bail!(
            "degenerate reserves: reserve0 {} does not exceed trade unit {}",
            reserves.reserve0,
            unit
        );
    }

    let remaining = &reserves.reserve0 - &unit;
    let denominator = remaining * FEE_NUMERATOR / FEE_DENOMINATOR;
    if denominator.is_zero() {
        bail!(
            "degenerate reserves: fee-adjusted reserve0 is zero (reserve0 {}, unit {})",
            reserves.reserve0,
            unit
        );
    }

    let numerator = &reserves.reserve1 * &unit;
    Ok(numerator / denominator + BigUint::one())
}

/// Computes both prices for a `10^decimals` trade.
///
/// # Errors
/// Propagates the degenerate-reserve error from [`buy_price`].
pub fn pair_prices(reserves: &ReservePair, decimals: u32) -> Result<V2Prices> {
    Ok(V2Prices {
        buy_price: buy_price(reserves, decimals)?,
        sell_price: sell_price(reserves, decimals),
    })
}

/// Exact `UniswapV2Library.getAmountOut`.
///
/// # Errors
/// Mirrors the library's `require`s: zero input or zero reserves fail.
pub fn get_amount_out(
    amount_in: &BigUint,
    reserve_in: &BigUint,
    reserve_out: &BigUint,
) -> Result<BigUint> {
    if amount_in.is_zero() {
        bail!("insufficient input amount");
    }
    if reserve_in.is_zero() || reserve_out.is_zero() {
        bail!("insufficient liquidity");
    }

    let amount_in_with_fee = amount_in * FEE_NUMERATOR;
    let numerator = &amount_in_with_fee * reserve_out;
    let denominator = reserve_in * FEE_DENOMINATOR + amount_in_with_fee;

    Ok(numerator / denominator)
}

/// Exact `UniswapV2Library.getAmountIn`.
///
/// # Errors
/// Zero output, zero reserves, or an output that would drain `reserve_out` fail.
pub fn get_amount_in(
    amount_out: &BigUint,
    reserve_in: &BigUint,
    reserve_out: &BigUint,
) -> Result<BigUint> {
    if amount_out.is_zero() {
        bail!("insufficient output amount");
    }
    if reserve_in.is_zero() || reserve_out.is_zero() {
        bail!("insufficient liquidity");
    }
    if amount_out >= reserve_out {
        bail!(
            "output {} exceeds available reserve {}",
            amount_out,
            reserve_out
        );
    }

    let numerator = reserve_in * amount_out * FEE_DENOMINATOR;
    let denominator = (reserve_out - amount_out) * FEE_NUMERATOR;

    Ok(numerator / denominator + BigUint::one())
}
