//! V2 price verification.
//!
//! For every pair the local buy/sell prices (from reserves) are compared to
//! the router's reference prices with an integer ppm tolerance. The local
//! formulas mirror the router exactly, so anything beyond rounding noise is
//! a real mismatch.

use alloy::primitives::Address;
use amm_data::{PairInfo, PriceResult, ReferencePriceSource, ReserveSource};
use amm_math::tolerance::within_ppm;
use amm_math::v2::{pair_prices, ReservePair};
use eyre::{bail, Context, Result};

/// Default V2 tolerance: one part per million.
pub const DEFAULT_PPM_TOLERANCE: u64 = 1;

/// Result of checking one pair.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PairCheck {
    pub pair: Address,
    /// Prices computed from reserves.
    pub estimate: PriceResult,
    /// Prices from the reference source.
    pub reference: PriceResult,
    pub buy_ok: bool,
    pub sell_ok: bool,
}

impl PairCheck {
    /// Both prices within tolerance.
    pub fn passed(&self) -> bool {
        self.buy_ok && self.sell_ok
    }
}

/// Outcome of a V2 run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct V2Report {
    pub checks: Vec<PairCheck>,
    pub tolerance_ppm: u64,
}

impl V2Report {
    /// Number of pairs with both prices in tolerance.
    pub fn passed(&self) -> usize {
        self.checks.iter().filter(|c| c.passed()).count()
    }

    /// Number of pairs with at least one price out of tolerance.
    pub fn failed(&self) -> usize {
        self.checks.len() - self.passed()
    }

    pub fn all_passed(&self) -> bool {
        self.failed() == 0
    }
}

/// Computes buy/sell prices for each pair from its reserves.
///
/// `reserves[i]` belongs to `pairs[i]`; the unit trade is one whole token0.
///
/// # Errors
/// Returns error if the slices differ in length or a pair has degenerate
/// reserves.
pub fn estimate_pair_prices(pairs: &[PairInfo], reserves: &[ReservePair]) -> Result<Vec<PriceResult>> {
    if pairs.len() != reserves.len() {
        bail!(
            "got reserves for {} pairs, expected {}",
            reserves.len(),
            pairs.len()
        );
    }

    pairs
        .iter()
        .zip(reserves)
        .map(|(info, reserves)| {
            let prices = pair_prices(reserves, info.trade_decimals())
                .wrap_err_with(|| format!("pricing failed for pair {:#x}", info.pair))?;
            Ok(PriceResult::new(info.pair, prices))
        })
        .collect()
}

/// Matches estimates to references by position and checks each price.
///
/// # Errors
/// Returns error if the lists differ in length or pair order.
pub fn compare_prices(
    estimates: &[PriceResult],
    references: &[PriceResult],
    tolerance_ppm: u64,
) -> Result<V2Report> {
    if estimates.len() != references.len() {
        bail!(
            "{} estimates but {} reference prices",
            estimates.len(),
            references.len()
        );
    }

    let mut checks = Vec::with_capacity(estimates.len());
    for (estimate, reference) in estimates.iter().zip(references) {
        if estimate.pair != reference.pair {
            bail!(
                "reference for {:#x} returned out of order (got {:#x})",
                estimate.pair,
                reference.pair
            );
        }

        let buy_ok = within_ppm(&reference.buy_price, &estimate.buy_price, tolerance_ppm);
        let sell_ok = within_ppm(&reference.sell_price, &estimate.sell_price, tolerance_ppm);

        if !(buy_ok && sell_ok) {
            tracing::warn!(
                pair = %estimate.pair,
                buy_estimate = %estimate.buy_price,
                buy_reference = %reference.buy_price,
                sell_estimate = %estimate.sell_price,
                sell_reference = %reference.sell_price,
                "V2 price mismatch"
            );
        }

        checks.push(PairCheck {
            pair: estimate.pair,
            estimate: estimate.clone(),
            reference: reference.clone(),
            buy_ok,
            sell_ok,
        });
    }

    Ok(V2Report {
        checks,
        tolerance_ppm,
    })
}

/// Fetches reserves and reference prices, estimates locally and compares.
///
/// # Errors
/// Returns error if either source fails or a pair cannot be priced.
#[tracing::instrument(skip_all, fields(pairs = pairs.len(), tolerance_ppm = tolerance_ppm))]
pub async fn verify_v2_pairs<R, P>(
    pairs: &[PairInfo],
    reserve_source: &R,
    reference_source: &P,
    tolerance_ppm: u64,
) -> Result<V2Report>
where
    R: ReserveSource,
    P: ReferencePriceSource,
{
    let addresses: Vec<Address> = pairs.iter().map(|p| p.pair).collect();
    let reserves = reserve_source
        .fetch_reserves(&addresses)
        .await
        .wrap_err("failed to fetch reserves")?;
    let references = reference_source
        .fetch_reference_prices(pairs)
        .await
        .wrap_err("failed to fetch reference prices")?;

    let estimates = estimate_pair_prices(pairs, &reserves)?;
    let report = compare_prices(&estimates, &references, tolerance_ppm)?;

    tracing::info!(
        passed = report.passed(),
        failed = report.failed(),
        "V2 verification complete"
    );
    Ok(report)
}
