//! Pairwise dissimilarity between waveform segments.
//!
//! Every method returns a non-negative score where lower means more similar.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::dtw::{dtw_distance, dtw_distance_windowed};
use crate::error::{ClusterError, Result};
use crate::utils::stats::pearson_correlation;

/// Similarity measure used to compare two segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "method")]
pub enum SimilarityMethod {
    /// Dynamic Time Warping, optionally constrained to a Sakoe-Chiba band
    #[serde(alias = "DTW")]
    Dtw {
        #[serde(default)]
        window: Option<usize>,
    },
    /// `1 - pearson(a, b)`, in `[0, 2]` (requires same-length series)
    Correlation,
    /// L2 distance (requires same-length series)
    Euclidean,
}

impl Default for SimilarityMethod {
    fn default() -> Self {
        SimilarityMethod::Dtw { window: None }
    }
}

impl SimilarityMethod {
    /// Unconstrained DTW.
    pub const DTW: SimilarityMethod = SimilarityMethod::Dtw { window: None };

    /// Parse a method name, falling back to DTW for anything unrecognized.
    ///
    /// A warning is logged when the fallback kicks in. Use [`str::parse`]
    /// to reject unknown names instead.
    pub fn parse_lenient(name: &str) -> Self {
        match name.parse() {
            Ok(method) => method,
            Err(_) => {
                tracing::warn!(method = name, "unknown similarity method, using dtw");
                SimilarityMethod::DTW
            }
        }
    }

    /// Short lowercase name of the method.
    pub fn name(&self) -> &'static str {
        match self {
            SimilarityMethod::Dtw { .. } => "dtw",
            SimilarityMethod::Correlation => "correlation",
            SimilarityMethod::Euclidean => "euclidean",
        }
    }

    /// Whether both inputs must have the same length.
    pub fn requires_equal_length(&self) -> bool {
        !matches!(self, SimilarityMethod::Dtw { .. })
    }
}

impl FromStr for SimilarityMethod {
    type Err = ClusterError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dtw" => Ok(SimilarityMethod::DTW),
            "correlation" | "corr" => Ok(SimilarityMethod::Correlation),
            "euclidean" | "l2" => Ok(SimilarityMethod::Euclidean),
            _ => Err(ClusterError::UnknownMethod(s.to_string())),
        }
    }
}

impl fmt::Display for SimilarityMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimilarityMethod::Dtw { window: Some(w) } => write!(f, "dtw(window={w})"),
            other => f.write_str(other.name()),
        }
    }
}

/// Compute the dissimilarity between two segments.
///
/// # Errors
/// `LengthMismatch` when `method` needs equal lengths and the inputs differ.
pub fn similarity(a: &[f64], b: &[f64], method: SimilarityMethod) -> Result<f64> {
    match method {
        SimilarityMethod::Dtw { window: None } => Ok(dtw_distance(a, b)),
        SimilarityMethod::Dtw { window: Some(w) } => Ok(dtw_distance_windowed(a, b, w)),
        SimilarityMethod::Correlation => correlation_distance(a, b),
        SimilarityMethod::Euclidean => euclidean_distance(a, b),
    }
}

/// Euclidean distance for same-length series.
pub fn euclidean_distance(a: &[f64], b: &[f64]) -> Result<f64> {
    check_lengths(a, b)?;
    Ok(a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt())
}

/// Correlation distance `1 - r` for same-length series.
///
/// A flat input has no defined correlation: identical inputs score 0,
/// anything else scores 1 (as if uncorrelated).
pub fn correlation_distance(a: &[f64], b: &[f64]) -> Result<f64> {
    check_lengths(a, b)?;
    match pearson_correlation(a, b) {
        Some(r) => Ok((1.0 - r).clamp(0.0, 2.0)),
        None if a == b => Ok(0.0),
        None => Ok(1.0),
    }
}

fn check_lengths(a: &[f64], b: &[f64]) -> Result<()> {
    if a.len() != b.len() {
        return Err(ClusterError::LengthMismatch {
            expected: a.len(),
            got: b.len(),
        });
    }
    Ok(())
}
