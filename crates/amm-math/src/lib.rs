//! amm-math: off-chain Uniswap pricing formulas.
//!
//! Pure functions that reproduce what Uniswap V2 and V3 contracts compute,
//! so the results can be checked against on-chain reference values.
//! V2 math is exact big-integer arithmetic; the V3 estimators are `f64`
//! approximations meant to be validated, not settled against.

pub mod fee;
pub mod tolerance;
pub mod v2;
pub mod v3;

pub use tolerance::{approx_eq, within_ppm, Comparison, Tolerance, DEFAULT_RELATIVE_TOLERANCE};
pub use v2::{pair_prices, ReservePair, V2Prices};
pub use v3::{amount_delta, estimate_sqrt_price, Direction, Estimate, Token};
