//! Data transformations for waveform segments.
//!
//! # Example
//!
//! ```
//! use pulse_cluster::transform::zscore;
//!
//! let segment = vec![1.0, 2.0, 3.0, 4.0, 5.0];
//! let scaled = zscore(&segment).unwrap();
//! assert!(scaled.data[2].abs() < 1e-12);
//! ```

pub mod scale;

pub use scale::{zscore, ScaleResult, FLAT_TOLERANCE};
