//! amm-data crate
//!
//! Inputs for the price checks: the pair list, on-chain pool state and the
//! reference values the estimates are compared against. Everything that
//! touches the network sits behind the traits in [`source`].

pub mod pairs;
pub mod rpc;
pub mod source;
pub mod types;
pub mod v2;
pub mod v3;

pub use rpc::{BlockTag, RpcClient};
pub use source::{PoolStateSource, QuoteRequest, QuoteSource, ReferencePriceSource, ReserveSource};
pub use types::{PairInfo, PriceResult, V3PoolState};
