//! Approximate equality for checking estimates against reference values.
//!
//! Two flavours:
//! - [`Tolerance`]: relative error on `f64`, default one basis point. Used for
//!   the V3 estimates, which are approximations by construction.
//! - [`within_ppm`]: integer parts-per-million check on big integers, used for
//!   the V2 prices where the estimate should be exact.

use eyre::{bail, Result};
use num_bigint::BigUint;

/// Default maximum relative error: 0.0001 (1 bp).
pub const DEFAULT_RELATIVE_TOLERANCE: f64 = 1e-4;

/// Relative-error threshold for comparing a candidate against a reference.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tolerance {
    max_relative_error: f64,
}

/// Outcome of a single comparison.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Comparison {
    /// Whether the candidate is within tolerance.
    pub acceptable: bool,
    /// `(reference - candidate) / |reference|`. Positive when the candidate
    /// undershoots the reference.
    pub relative_error: f64,
}

impl Default for Tolerance {
    fn default() -> Self {
        Self {
            max_relative_error: DEFAULT_RELATIVE_TOLERANCE,
        }
    }
}

impl Tolerance {
    /// Creates a tolerance with a custom threshold.
    ///
    /// # Errors
    /// Returns an error for negative or non-finite thresholds.
    pub fn new(max_relative_error: f64) -> Result<Self> {
        if !max_relative_error.is_finite() || max_relative_error < 0.0 {
            bail!("tolerance must be a finite non-negative number, got {max_relative_error}");
        }
        Ok(Self { max_relative_error })
    }

    /// Threshold this tolerance accepts.
    pub fn max_relative_error(&self) -> f64 {
        self.max_relative_error
    }

    /// Compares `candidate` against `reference`.
    ///
    /// A zero reference only accepts a zero candidate. Anything outside the
    /// threshold is logged at `warn` with the signed relative error.
    pub fn compare(&self, reference: f64, candidate: f64) -> Comparison {
        let relative_error = if reference == 0.0 {
            if candidate == 0.0 {
                0.0
            } else {
                f64::INFINITY.copysign(-candidate)
            }
        } else {
            (reference - candidate) / reference.abs()
        };

        // NaN fails this comparison, so NaN inputs are never acceptable.
        let acceptable = relative_error.abs() <= self.max_relative_error;

        if !acceptable {
            tracing::warn!(
                reference,
                candidate,
                relative_error,
                max_relative_error = self.max_relative_error,
                "value outside tolerance"
            );
        }

        Comparison {
            acceptable,
            relative_error,
        }
    }

    /// Shorthand for `compare(..).acceptable`.
    pub fn accepts(&self, reference: f64, candidate: f64) -> bool {
        self.compare(reference, candidate).acceptable
    }
}

/// `true` when `candidate` is within the default 1 bp of `reference`.
pub fn approx_eq(reference: f64, candidate: f64) -> bool {
    Tolerance::default().accepts(reference, candidate)
}

/// Integer tolerance: `|reference - candidate| * 1_000_000 <= reference * ppm`.
///
/// With `ppm = 1` this is the one-part-per-million check applied to V2 prices.
/// A zero reference only matches a zero candidate.
pub fn within_ppm(reference: &BigUint, candidate: &BigUint, ppm: u64) -> bool {
    let diff = if reference >= candidate {
        reference - candidate
    } else {
        candidate - reference
    };
    diff * 1_000_000u32 <= reference * ppm
}
