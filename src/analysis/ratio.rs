//! Percentages and length-unit normalization.
//!
//! Nothing here rounds. Presentation code calls [`round_to`] explicitly.

use crate::error::{AnalysisError, AnalysisResult};
use std::fmt;

const METRES_PER_KILOMETRE: f64 = 1000.0;

/// `numerator / denominator * 100`.
pub fn percentage(numerator: f64, denominator: f64) -> AnalysisResult<f64> {
    if denominator == 0.0 {
        return Err(AnalysisError::DivisionByZero {
            numerator,
            dataset: None,
            column: None,
        });
    }
    Ok(numerator / denominator * 100.0)
}

/// Round half away from zero to a fixed number of decimal places.
pub fn round_to(value: f64, decimals: usize) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// A length, always stored in metres.
///
/// Ratios between lengths are taken on the stored metres, so both operands
/// share a unit no matter how either one is displayed.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Length {
    metres: f64,
}

impl Length {
    pub fn metres(metres: f64) -> Self {
        Self { metres }
    }

    pub fn as_kilometres(&self) -> f64 {
        self.metres / METRES_PER_KILOMETRE
    }

    /// This length as a percentage of `whole`.
    pub fn percentage_of(&self, whole: Length) -> AnalysisResult<f64> {
        percentage(self.metres, whole.metres)
    }
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let precision = f.precision().unwrap_or(1);
        write!(f, "{:.*} km", precision, self.as_kilometres())
    }
}
