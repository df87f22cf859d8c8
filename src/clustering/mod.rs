//! Segment clustering.
//!
//! Provides similarity measures (DTW, correlation, Euclidean), the
//! divide-and-conquer median-split clusterer and the per-cluster closest-pair
//! search.
//!
//! # Example
//!
//! ```
//! use pulse_cluster::clustering::{
//!     closest_pair, divide_and_conquer, similarity, ClusterConfig, SimilarityMethod,
//! };
//!
//! let a = vec![1.0, 2.0, 3.0, 2.0, 1.0];
//! let b = vec![1.0, 2.0, 3.0, 2.0, 1.0];
//! assert_eq!(similarity(&a, &b, SimilarityMethod::DTW).unwrap(), 0.0);
//!
//! let segments = vec![
//!     vec![1.0, 2.0, 1.0],
//!     vec![1.1, 2.1, 1.1],
//!     vec![10.0, 11.0, 10.0],
//!     vec![10.1, 11.1, 10.1],
//! ];
//! let config = ClusterConfig::default().max_size(2).seed(42);
//! let forest = divide_and_conquer(&segments, &config).unwrap();
//! assert_eq!(forest.total_members(), 4);
//!
//! for cluster in &forest {
//!     let pair = closest_pair(&cluster.signals(&segments));
//!     assert!(pair.distance() >= 0.0);
//! }
//! ```

pub mod closest_pair;
pub mod divide;
pub mod dtw;
pub mod progress;
pub mod similarity;

pub use closest_pair::{closest_pair, closest_pair_parallel, closest_pair_with, ClosestPair};
pub use divide::{divide_and_conquer, divide_and_conquer_with, Cluster, ClusterConfig, ClusterForest};
pub use dtw::{dtw_distance, dtw_distance_windowed};
pub use progress::{CountingProgress, LogProgress, NoProgress, ProgressObserver};
pub use similarity::{correlation_distance, euclidean_distance, similarity, SimilarityMethod};
