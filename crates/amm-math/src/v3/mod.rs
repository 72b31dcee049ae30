//! Uniswap V3 single-tick price estimation.
//!
//! ## Scope
//!
//! These functions approximate a swap that stays inside the current tick:
//! liquidity `L` is treated as constant and the new √P is solved directly.
//! Tick crossings are ignored, so the estimate is only meaningful for trades
//! small relative to the active liquidity. Results are checked against the
//! on-chain quoter, never used to settle anything, so `f64` is fine here.
//!
//! Only the combinations the verification flow needs are implemented:
//! [`estimate_sqrt_price`] prices token0 trades and [`amount_delta`] returns
//! token1 amounts. Everything else yields [`Estimate::Unsupported`].

pub mod delta;
pub mod estimate;
pub mod tick;

pub use delta::amount_delta;
pub use estimate::estimate_sqrt_price;
pub use tick::{spot_price, sqrt_price_at_tick, sqrt_price_x96_to_f64, u256_to_f64};

use eyre::{eyre, Result};

/// Which pool token an amount refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Token {
    Token0,
    Token1,
}

/// Whether an amount flows into the pool or out of it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    In,
    Out,
}

/// Result of a V3 estimate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Estimate {
    /// The estimated value.
    Value(f64),
    /// The token/direction combination is not covered by this estimator.
    Unsupported,
    /// The trade would take out at least all of the active liquidity, so the
    /// single-tick formula has no finite answer.
    Exhausted,
}

impl Estimate {
    /// Returns the value, if there is one.
    pub fn value(self) -> Option<f64> {
        match self {
            Self::Value(v) => Some(v),
            Self::Unsupported | Self::Exhausted => None,
        }
    }

    /// Converts into a `Result`, naming `what` in the error.
    ///
    /// # Errors
    /// Returns an error for [`Estimate::Unsupported`] and [`Estimate::Exhausted`].
    pub fn into_result(self, what: &str) -> Result<f64> {
        match self {
            Self::Value(v) => Ok(v),
            Self::Unsupported => Err(eyre!("{what}: token/direction not supported")),
            Self::Exhausted => Err(eyre!("{what}: trade exhausts active liquidity")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_accessor() {
        assert_eq!(Estimate::Value(1.5).value(), Some(1.5));
        assert_eq!(Estimate::Unsupported.value(), None);
        assert_eq!(Estimate::Exhausted.value(), None);
    }

    #[test]
    fn into_result_names_the_failure() {
        let err = Estimate::Unsupported
            .into_result("token1 out")
            .expect_err("unsupported must fail");
        assert!(err.to_string().contains("token1 out"));
        assert!(Estimate::Exhausted.into_result("x").is_err());
        assert_eq!(Estimate::Value(2.0).into_result("x").expect("value"), 2.0);
    }
}
