//! # pulse-cluster
//!
//! Exploratory analysis of physiological waveform segments (ABP, ECG, PPG).
//!
//! Segments are loaded and z-score normalized, grouped by divide-and-conquer
//! median splitting under DTW, correlation or Euclidean similarity, and each
//! cluster's closest pair is reported. A Kadane maximum-subarray scan and SVG
//! plots round off a run.

#![allow(clippy::needless_range_loop)]

pub mod clustering;
pub mod data;
pub mod error;
pub mod features;
pub mod pipeline;
pub mod report;
pub mod transform;
pub mod utils;

pub use error::{ClusterError, Result};

pub mod prelude {
    pub use crate::clustering::{
        closest_pair, divide_and_conquer, similarity, ClosestPair, Cluster, ClusterConfig,
        ClusterForest, SimilarityMethod,
    };
    pub use crate::data::{load_dataset, LoaderConfig, SegmentCollection, Signal};
    pub use crate::error::{ClusterError, Result};
    pub use crate::features::{max_subarray, MaxSubarray};
    pub use crate::pipeline::{run, PipelineConfig};
}
