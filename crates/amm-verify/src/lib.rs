//! amm-verify crate
//!
//! Runs the off-chain estimators against reference values and reports how
//! far apart they are:
//! - [`v2`]: exact buy/sell prices per pair vs. the router's own formulas
//! - [`v3`]: single-tick swap estimates vs. QuoterV2
//!
//! Both flows are generic over the `amm-data` source traits, so the same
//! code runs against an RPC node or fixed test values.

pub mod v2;
pub mod v3;

pub use v2::{
    compare_prices, estimate_pair_prices, verify_v2_pairs, PairCheck, V2Report, DEFAULT_PPM_TOLERANCE,
};
pub use v3::{
    estimate_v3_swap, trade_amount, verify_v3_pool, QuoteCheck, V3CheckConfig, V3Estimates, V3Report,
    DEFAULT_TOKENS_TO_TEST,
};
