//! Per-segment features.
//!
//! # Example
//!
//! ```
//! use pulse_cluster::features::max_subarray;
//!
//! let segment = vec![-0.5, 1.2, 0.8, -2.0, 0.3];
//! let best = max_subarray(&segment).unwrap();
//! assert_eq!((best.start, best.end), (1, 2));
//! ```

pub mod subarray;

pub use subarray::{max_subarray, MaxSubarray};
