//! Tick and `sqrtPriceX96` conversions in floating point.
//!
//! ## Math
//!
//! The price at tick `t` is `1.0001^t`, so `√P = sqrt(1.0001^t)`.
//! `sqrtPriceX96` encodes `√P × 2^96`; dividing by `2^96` recovers `√P`
//! in raw token units (token1 base units per token0 base unit).
//!
//! Wide integers are converted limb by limb, so nothing goes through a
//! string and values above `u128` still convert.

use alloy::primitives::U256;
use eyre::{bail, Result};

/// Base of the tick price ladder.
pub const TICK_BASE: f64 = 1.0001;

/// `√P` at `tick`: `sqrt(1.0001^tick)`.
pub fn sqrt_price_at_tick(tick: i32) -> f64 {
    TICK_BASE.powf(f64::from(tick)).sqrt()
}

/// Converts a Q64.96 `sqrtPriceX96` into `√P` as `f64`.
///
/// # Errors
/// Returns an error if the value does not fit in `uint160`.
pub fn sqrt_price_x96_to_f64(sqrt_price_x96: U256) -> Result<f64> {
    if sqrt_price_x96.bit_len() > 160 {
        bail!("sqrtPriceX96 {sqrt_price_x96} exceeds uint160");
    }

    Ok(u256_to_f64(sqrt_price_x96) / 2f64.powi(96))
}

/// Nearest `f64` to a `U256` (rounding in the low bits is accepted).
pub fn u256_to_f64(value: U256) -> f64 {
    value
        .as_limbs()
        .iter()
        .rev()
        .fold(0.0, |acc, limb| acc * 2f64.powi(64) + *limb as f64)
}

/// Human price of one token0 in token1, adjusted for token decimals.
pub fn spot_price(sqrt_price: f64, token0_decimals: u8, token1_decimals: u8) -> f64 {
    let decimal_shift = i32::from(token0_decimals) - i32::from(token1_decimals);
    sqrt_price * sqrt_price * 10f64.powi(decimal_shift)
}
