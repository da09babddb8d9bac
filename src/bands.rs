//! Confidence-band display normalization.
//!
//! Turns a (lower, upper, mean, confidence_level) tuple from the prediction
//! backend into [0, 1] ratios the frontend can hand straight to a bar chart.

use crate::types::ConfidenceBand;
use serde::{Deserialize, Serialize};

/// Display-ready confidence band
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandDisplay {
    /// Position of the mean within [lower, upper], normalized to [0, 1]
    pub mean_ratio: f64,
    /// Lower bound, unchanged
    pub lower: f64,
    /// Upper bound, unchanged
    pub upper: f64,
    /// Width of the interval (upper - lower)
    pub width: f64,
    /// Stated confidence level, unchanged
    pub confidence_level: f64,
}

/// Normalize a confidence band for rendering.
///
/// A degenerate band (upper == lower) places the mean at the midpoint 0.5
/// instead of dividing by zero; a mean outside the band clamps to the
/// nearest edge. Non-finite bounds collapse to the same neutral midpoint.
pub fn format_confidence_band(band: &ConfidenceBand) -> BandDisplay {
    let finite =
        band.lower.is_finite() && band.upper.is_finite() && band.mean.is_finite();
    let width = band.upper - band.lower;

    let mean_ratio = if !finite || width <= 0.0 {
        0.5
    } else {
        ((band.mean - band.lower) / width).clamp(0.0, 1.0)
    };

    BandDisplay {
        mean_ratio,
        lower: band.lower,
        upper: band.upper,
        width: if finite { width.max(0.0) } else { 0.0 },
        confidence_level: band.confidence_level,
    }
}
