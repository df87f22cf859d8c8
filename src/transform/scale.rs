//! Z-score normalization for waveform segments.

use crate::utils::stats::{mean, population_variance};

/// Spread below which a segment is treated as flat.
pub const FLAT_TOLERANCE: f64 = 1e-10;

/// Result of a scaling transform, containing parameters for inverse transform.
#[derive(Debug, Clone)]
pub struct ScaleResult {
    /// Transformed data
    pub data: Vec<f64>,
    /// Mean removed from the input
    pub center: f64,
    /// Population standard deviation divided out
    pub scale: f64,
}

impl ScaleResult {
    /// Inverse transform to recover original scale.
    pub fn inverse(&self) -> Vec<f64> {
        self.data
            .iter()
            .map(|&x| x * self.scale + self.center)
            .collect()
    }
}

/// Standardize a segment to zero mean and unit (population) variance.
///
/// x_scaled = (x - mean) / std
///
/// Returns `None` for an empty or flat segment, which cannot be brought to
/// unit variance.
pub fn zscore(series: &[f64]) -> Option<ScaleResult> {
    if series.is_empty() {
        return None;
    }

    let center = mean(series);
    let scale = population_variance(series).sqrt();
    if !scale.is_finite() || scale < FLAT_TOLERANCE {
        return None;
    }

    let data = series.iter().map(|&x| (x - center) / scale).collect();
    Some(ScaleResult {
        data,
        center,
        scale,
    })
}
