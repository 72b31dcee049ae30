//! Pool fees expressed in parts per million (pips).
//!
//! A V3 pool stores its fee as `uint24` pips, so `3000` is 0.3%. The
//! estimators strip the fee from an input before pricing and add it back
//! when converting a net input into the gross amount a trader pays.

use eyre::{bail, Result};

/// Fee denominator: one million pips is 100%.
pub const MAX_FEE: u32 = 1_000_000;

/// Checks that a fee leaves something to trade with.
///
/// # Errors
/// Returns an error when `fee >= MAX_FEE`.
pub fn validate_fee(fee: u32) -> Result<()> {
    if fee >= MAX_FEE {
        bail!("fee {fee} pips must be below {MAX_FEE}");
    }
    Ok(())
}

/// Net amount that reaches the curve after the pool takes its fee.
///
/// `amount * (MAX_FEE - fee) / MAX_FEE`
///
/// # Errors
/// See [`validate_fee`].
pub fn amount_after_fee(amount: f64, fee: u32) -> Result<f64> {
    validate_fee(fee)?;
    Ok(amount * f64::from(MAX_FEE - fee) / f64::from(MAX_FEE))
}

/// Gross amount a trader pays so that `amount` reaches the curve.
///
/// `amount * MAX_FEE / (MAX_FEE - fee)`
///
/// # Errors
/// See [`validate_fee`].
pub fn amount_before_fee(amount: f64, fee: u32) -> Result<f64> {
    validate_fee(fee)?;
    Ok(amount * f64::from(MAX_FEE) / f64::from(MAX_FEE - fee))
}
