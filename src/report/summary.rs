//! Machine-readable summary of one pipeline run.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::clustering::{ClosestPair, SimilarityMethod};
use crate::error::{ClusterError, Result};
use crate::features::MaxSubarray;

/// Per-cluster outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterSummary {
    /// 1-based cluster number, as printed
    pub number: usize,
    /// Segment indices in the cluster
    pub members: Vec<usize>,
    /// Closest pair, indices relative to `members`
    pub closest_pair: ClosestPair,
}

/// Kadane result for one sampled segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentPeak {
    /// 1-based segment number, as printed
    pub number: usize,
    pub subarray: MaxSubarray,
}

/// Everything a run produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub generated_at: DateTime<Utc>,
    pub channel: String,
    pub source: PathBuf,
    pub segments: usize,
    pub skipped: usize,
    pub method: SimilarityMethod,
    pub max_size: usize,
    pub forced_splits: usize,
    pub max_depth: usize,
    pub clusters: Vec<ClusterSummary>,
    pub peaks: Vec<SegmentPeak>,
    pub plots: Vec<PathBuf>,
}

impl RunReport {
    /// Number of clusters.
    pub fn cluster_count(&self) -> usize {
        self.clusters.len()
    }
}

/// Write the report as pretty-printed JSON, creating parent directories.
pub fn write_summary(report: &RunReport, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| ClusterError::io(parent, e))?;
    }
    let json = serde_json::to_string_pretty(report)?;
    fs::write(path, json).map_err(|e| ClusterError::io(path, e))?;
    tracing::info!(path = %path.display(), "run summary written");
    Ok(())
}

/// Read a summary written by [`write_summary`].
pub fn read_summary(path: &Path) -> Result<RunReport> {
    let text = fs::read_to_string(path).map_err(|e| ClusterError::io(path, e))?;
    Ok(serde_json::from_str(&text)?)
}
