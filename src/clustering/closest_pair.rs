//! Most similar pair of segments inside one cluster.
//!
//! Clusters are bounded by the clusterer's `max_size`, so an exhaustive
//! O(k²) scan is affordable.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::dtw::dtw_distance;
use super::similarity::{similarity, SimilarityMethod};
use crate::error::Result;

/// Outcome of a closest-pair search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClosestPair {
    /// Indices into the cluster (`first < second`) and their distance.
    Pair {
        first: usize,
        second: usize,
        distance: f64,
    },
    /// The cluster had fewer than two segments.
    NoPair,
}

impl ClosestPair {
    /// Distance of the pair, `0.0` when there is none.
    pub fn distance(&self) -> f64 {
        match self {
            ClosestPair::Pair { distance, .. } => *distance,
            ClosestPair::NoPair => 0.0,
        }
    }

    /// The index pair, if any.
    pub fn indices(&self) -> Option<(usize, usize)> {
        match self {
            ClosestPair::Pair { first, second, .. } => Some((*first, *second)),
            ClosestPair::NoPair => None,
        }
    }

    pub fn is_pair(&self) -> bool {
        matches!(self, ClosestPair::Pair { .. })
    }

    /// Keep `self` unless `other` is strictly closer.
    fn closer(self, other: ClosestPair) -> ClosestPair {
        match (self, other) {
            (ClosestPair::NoPair, o) => o,
            (s, ClosestPair::NoPair) => s,
            (s, o) => {
                if o.distance() < s.distance() {
                    o
                } else {
                    s
                }
            }
        }
    }
}

/// Find the pair with the smallest DTW distance.
///
/// Ties resolve to the first pair in `(i, j)` lexicographic order.
///
/// # Example
///
/// ```
/// use pulse_cluster::clustering::{closest_pair, ClosestPair};
///
/// let cluster = vec![vec![0.0, 1.0, 0.0], vec![5.0, 5.0, 5.0], vec![0.0, 1.0, 0.1]];
/// let result = closest_pair(&cluster);
/// assert_eq!(result.indices(), Some((0, 2)));
/// ```
pub fn closest_pair<S: AsRef<[f64]>>(cluster: &[S]) -> ClosestPair {
    let mut best = ClosestPair::NoPair;
    for i in 0..cluster.len() {
        for j in (i + 1)..cluster.len() {
            let distance = dtw_distance(cluster[i].as_ref(), cluster[j].as_ref());
            best = best.closer(ClosestPair::Pair {
                first: i,
                second: j,
                distance,
            });
        }
    }
    best
}

/// Closest pair under any similarity measure.
///
/// # Errors
/// Propagates similarity errors such as a length mismatch.
pub fn closest_pair_with<S: AsRef<[f64]>>(
    cluster: &[S],
    method: SimilarityMethod,
) -> Result<ClosestPair> {
    let mut best = ClosestPair::NoPair;
    for i in 0..cluster.len() {
        for j in (i + 1)..cluster.len() {
            let distance = similarity(cluster[i].as_ref(), cluster[j].as_ref(), method)?;
            best = best.closer(ClosestPair::Pair {
                first: i,
                second: j,
                distance,
            });
        }
    }
    Ok(best)
}

/// Parallel closest-pair search with the same tie-break as the sequential scan.
pub fn closest_pair_parallel<S: AsRef<[f64]> + Sync>(
    cluster: &[S],
    method: SimilarityMethod,
) -> Result<ClosestPair> {
    let n = cluster.len();
    let pairs: Vec<(usize, usize)> = (0..n)
        .flat_map(|i| ((i + 1)..n).map(move |j| (i, j)))
        .collect();

    let scored: Vec<ClosestPair> = pairs
        .par_iter()
        .map(|&(i, j)| {
            similarity(cluster[i].as_ref(), cluster[j].as_ref(), method).map(|distance| {
                ClosestPair::Pair {
                    first: i,
                    second: j,
                    distance,
                }
            })
        })
        .collect::<Result<_>>()?;

    // Folding in scan order keeps the first minimal pair.
    Ok(scored
        .into_iter()
        .fold(ClosestPair::NoPair, ClosestPair::closer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClusterError;
    use approx::assert_relative_eq;

    #[test]
    fn empty_and_singleton_have_no_pair() {
        let empty: Vec<Vec<f64>> = vec![];
        assert_eq!(closest_pair(&empty), ClosestPair::NoPair);
        assert_eq!(closest_pair(&empty).distance(), 0.0);

        let single = vec![vec![1.0, 2.0]];
        assert_eq!(closest_pair(&single), ClosestPair::NoPair);
        assert!(closest_pair(&single).indices().is_none());
    }

    #[test]
    fn identical_signals_pick_first_pair() {
        let cluster = vec![vec![1.0, 1.0, 1.0]; 3];
        let result = closest_pair(&cluster);

        assert_eq!(
            result,
            ClosestPair::Pair {
                first: 0,
                second: 1,
                distance: 0.0
            }
        );
    }

    #[test]
    fn finds_nearest_pair() {
        let cluster = vec![
            vec![0.0, 0.0, 0.0],
            vec![10.0, 10.0, 10.0],
            vec![10.0, 10.5, 10.0],
            vec![-4.0, 0.0, 4.0],
        ];
        let result = closest_pair(&cluster);

        assert_eq!(result.indices(), Some((1, 2)));
        assert_relative_eq!(result.distance(), 0.5, epsilon = 1e-10);
    }

    #[test]
    fn ties_keep_scan_order() {
        // d(0,1) = d(1,2) = 1, d(0,2) = 2
        let cluster = vec![vec![0.0], vec![1.0], vec![2.0]];
        assert_eq!(closest_pair(&cluster).indices(), Some((0, 1)));
    }

    #[test]
    fn works_on_borrowed_members() {
        let segments = vec![vec![0.0, 1.0], vec![9.0, 9.0], vec![0.0, 1.0]];
        let cluster: Vec<&Vec<f64>> = vec![&segments[1], &segments[0], &segments[2]];
        assert_eq!(closest_pair(&cluster).indices(), Some((1, 2)));
    }

    #[test]
    fn closest_pair_with_method() {
        let cluster = vec![vec![0.0, 0.0], vec![3.0, 4.0], vec![3.0, 5.0]];
        let result = closest_pair_with(&cluster, SimilarityMethod::Euclidean).unwrap();

        assert_eq!(result.indices(), Some((1, 2)));
        assert_relative_eq!(result.distance(), 1.0, epsilon = 1e-10);
    }

    #[test]
    fn closest_pair_with_length_mismatch() {
        let cluster = vec![vec![0.0, 0.0], vec![3.0]];
        let err = closest_pair_with(&cluster, SimilarityMethod::Euclidean).unwrap_err();
        assert!(matches!(err, ClusterError::LengthMismatch { .. }));
    }

    #[test]
    fn parallel_matches_sequential() {
        let cluster: Vec<Vec<f64>> = (0..9)
            .map(|i| (0..30).map(|t| ((t * (i % 3 + 1)) as f64 * 0.2).sin()).collect())
            .collect();

        let sequential = closest_pair(&cluster);
        let parallel = closest_pair_parallel(&cluster, SimilarityMethod::DTW).unwrap();
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn parallel_handles_tiny_clusters() {
        let single = vec![vec![1.0]];
        assert_eq!(
            closest_pair_parallel(&single, SimilarityMethod::DTW).unwrap(),
            ClosestPair::NoPair
        );
    }
}
