//! token1 amount between two √P bounds at constant liquidity.
//!
//! Within one tick `Δy = L · (√P_upper − √P_lower)`; this is the float
//! counterpart of `SqrtPriceMath.getAmount1Delta`.

use super::{Direction, Estimate, Token};

/// token1 amount moved when √P travels between `sqrt_price_a` and
/// `sqrt_price_b`. Bound order does not matter.
///
/// - token1 in:  `L · (upper − lower)`
/// - token1 out: `L · (upper − lower) + 1`
///
/// The extra unit on the outgoing side is a deliberate rounding bias in the
/// pool's favour and is kept as is. token0 returns [`Estimate::Unsupported`].
///
/// # Precision
/// The `+ 1` is an f64 addition. It is exact while `L · (upper − lower)` is a
/// whole number below 2^53 (about 9.007e15) and within a few ulps for fractional
/// values in that range. From 2^53 upward adjacent floats are at least 2 apart,
/// so the unit is rounded away and out equals in. A 10 WETH leg (1e19 wei) is
/// already past that point.
pub fn amount_delta(
    sqrt_price_a: f64,
    sqrt_price_b: f64,
    liquidity: f64,
    token: Token,
    direction: Direction,
) -> Estimate {
    let (lower, upper) = if sqrt_price_a > sqrt_price_b {
        (sqrt_price_b, sqrt_price_a)
    } else {
        (sqrt_price_a, sqrt_price_b)
    };

    match (token, direction) {
        (Token::Token1, Direction::In) => Estimate::Value(liquidity * (upper - lower)),
        (Token::Token1, Direction::Out) => Estimate::Value(liquidity * (upper - lower) + 1.0),
        (Token::Token0, _) => Estimate::Unsupported,
    }
}
