//! √P after a token0 trade, assuming liquidity stays in one tick.
//!
//! Inside a tick, token0 reserves behave like `L / √P`. Adding `a` token0 gives
//!
//! ```text
//! L / √P' = L / √P + a   =>   √P' = L·√P / (L + a·√P)
//! ```
//!
//! and removing `a` flips the sign in the denominator.

use super::{Direction, Estimate, Token};

/// Estimates the new √P after a trade of `amount` token0.
///
/// - token0 in:  `√P' = L·√P / (L + a·√P)`
/// - token0 out: `√P' = L·√P / (L − a·√P)`
///
/// token1 trades return [`Estimate::Unsupported`]. A token0 withdrawal with
/// `a·√P >= L` returns [`Estimate::Exhausted`].
pub fn estimate_sqrt_price(
    liquidity: f64,
    sqrt_price: f64,
    amount: f64,
    token: Token,
    direction: Direction,
) -> Estimate {
    let scaled_amount = amount * sqrt_price;
    let numerator = liquidity * sqrt_price;

    match (token, direction) {
        (Token::Token0, Direction::In) => Estimate::Value(numerator / (liquidity + scaled_amount)),
        (Token::Token0, Direction::Out) => {
            let denominator = liquidity - scaled_amount;
            if denominator <= 0.0 {
                return Estimate::Exhausted;
            }
            Estimate::Value(numerator / denominator)
        }
        (Token::Token1, _) => Estimate::Unsupported,
    }
}
