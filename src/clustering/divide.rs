//! Divide-and-conquer clustering by median split around a random pivot.
//!
//! Each node scores its members against a randomly chosen pivot, splits them
//! at the median score and recurses until every leaf holds at most
//! `max_size` segments. This is a fast heuristic, not an optimal clustering.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};

use super::progress::{NoProgress, ProgressObserver};
use super::similarity::{similarity, SimilarityMethod};
use crate::error::{ClusterError, Result};
use crate::utils::stats::median;

/// Divide-and-conquer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// Largest leaf cluster allowed
    pub max_size: usize,
    /// Similarity measure used against the pivot
    pub method: SimilarityMethod,
    /// Random seed for pivot selection (entropy when absent)
    pub seed: Option<u64>,
    /// Evaluate sibling subtrees and pivot scoring on the rayon pool
    pub parallel: bool,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            max_size: 10,
            method: SimilarityMethod::default(),
            seed: None,
            parallel: false,
        }
    }
}

impl ClusterConfig {
    /// Set the maximum leaf size.
    pub fn max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size;
        self
    }

    /// Set the similarity measure.
    pub fn method(mut self, method: SimilarityMethod) -> Self {
        self.method = method;
        self
    }

    /// Set random seed.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Enable or disable parallel evaluation.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.max_size == 0 {
            return Err(ClusterError::InvalidParameter(
                "max_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// One leaf cluster: indices into the segment collection, in input order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cluster {
    members: Vec<usize>,
}

impl Cluster {
    pub fn new(members: Vec<usize>) -> Self {
        Self { members }
    }

    /// Indices of the member segments.
    pub fn members(&self) -> &[usize] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Resolve member indices against the collection the forest was built from.
    ///
    /// # Panics
    /// Panics if `segments` is not that collection (an index is out of range).
    pub fn signals<'a, S>(&self, segments: &'a [S]) -> Vec<&'a S> {
        self.members.iter().map(|&i| &segments[i]).collect()
    }
}

/// Ordered leaf clusters produced by one clustering run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusterForest {
    /// Leaf clusters, left subtrees before right subtrees
    pub clusters: Vec<Cluster>,
    /// Nodes where the median split made no progress and order was used instead
    pub forced_splits: usize,
    /// Deepest leaf (root is depth 0)
    pub max_depth: usize,
}

impl ClusterForest {
    fn leaf(members: Vec<usize>, depth: usize) -> Self {
        Self {
            clusters: vec![Cluster::new(members)],
            forced_splits: 0,
            max_depth: depth,
        }
    }

    fn append(&mut self, other: ClusterForest) {
        self.clusters.extend(other.clusters);
        self.forced_splits += other.forced_splits;
        self.max_depth = self.max_depth.max(other.max_depth);
    }

    /// Number of clusters.
    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Cluster> {
        self.clusters.iter()
    }

    /// Size of each cluster, in forest order.
    pub fn sizes(&self) -> Vec<usize> {
        self.clusters.iter().map(Cluster::len).collect()
    }

    /// Total number of segments across all clusters.
    pub fn total_members(&self) -> usize {
        self.clusters.iter().map(Cluster::len).sum()
    }

    /// Resolve every cluster to references into `segments`.
    pub fn resolve<'a, S>(&self, segments: &'a [S]) -> Vec<Vec<&'a S>> {
        self.clusters.iter().map(|c| c.signals(segments)).collect()
    }
}

impl<'a> IntoIterator for &'a ClusterForest {
    type Item = &'a Cluster;
    type IntoIter = std::slice::Iter<'a, Cluster>;

    fn into_iter(self) -> Self::IntoIter {
        self.clusters.iter()
    }
}

/// Cluster segments with the configured seed (or entropy) and no progress output.
///
/// # Example
///
/// ```
/// use pulse_cluster::clustering::{divide_and_conquer, ClusterConfig};
///
/// let segments: Vec<Vec<f64>> = (0..25)
///     .map(|i| (0..50).map(|t| ((t + i) as f64 * 0.3).sin()).collect())
///     .collect();
/// let forest = divide_and_conquer(&segments, &ClusterConfig::default().seed(7)).unwrap();
///
/// assert_eq!(forest.total_members(), 25);
/// assert!(forest.sizes().iter().all(|&s| s <= 10));
/// ```
pub fn divide_and_conquer<S>(segments: &[S], config: &ClusterConfig) -> Result<ClusterForest>
where
    S: AsRef<[f64]> + Sync,
{
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    divide_and_conquer_with(segments, config, &mut rng, &NoProgress)
}

/// Cluster segments with an explicit random source and progress observer.
///
/// `config.seed` is ignored here; `rng` decides the pivots.
///
/// # Errors
/// `InvalidParameter` when `max_size` is zero, or any similarity error
/// (e.g. a length mismatch under Euclidean or correlation).
pub fn divide_and_conquer_with<S, R, P>(
    segments: &[S],
    config: &ClusterConfig,
    rng: &mut R,
    observer: &P,
) -> Result<ClusterForest>
where
    S: AsRef<[f64]> + Sync,
    R: Rng + ?Sized,
    P: ProgressObserver + ?Sized,
{
    config.validate()?;
    if segments.is_empty() {
        return Ok(ClusterForest::default());
    }

    let splitter = Splitter {
        segments,
        config,
        observer,
    };
    let forest = splitter.split((0..segments.len()).collect(), 0, rng)?;

    tracing::debug!(
        clusters = forest.len(),
        forced_splits = forest.forced_splits,
        max_depth = forest.max_depth,
        "divide-and-conquer finished"
    );
    Ok(forest)
}

struct Splitter<'a, S, P: ?Sized> {
    segments: &'a [S],
    config: &'a ClusterConfig,
    observer: &'a P,
}

impl<S, P> Splitter<'_, S, P>
where
    S: AsRef<[f64]> + Sync,
    P: ProgressObserver + ?Sized,
{
    fn split<R: Rng + ?Sized>(
        &self,
        members: Vec<usize>,
        depth: usize,
        rng: &mut R,
    ) -> Result<ClusterForest> {
        if members.len() <= self.config.max_size {
            return Ok(ClusterForest::leaf(members, depth));
        }

        let pivot = members[rng.gen_range(0..members.len())];
        let scores = self.score(&members, pivot, depth)?;
        let cut = median(&scores);

        let (mut left, mut right): (Vec<usize>, Vec<usize>) = (Vec::new(), Vec::new());
        for (&member, &score) in members.iter().zip(scores.iter()) {
            if score <= cut {
                left.push(member);
            } else {
                right.push(member);
            }
        }

        // A median split over tied scores can leave one side empty; fall back
        // to halving by input order so every level shrinks.
        let forced = left.is_empty() || right.is_empty();
        if forced {
            tracing::debug!(depth, size = members.len(), "median split stalled, halving");
            let mid = members.len() / 2;
            right = members[mid..].to_vec();
            left = members;
            left.truncate(mid);
        }
        self.observer.on_split(depth, left.len(), right.len(), forced);

        let left_seed: u64 = rng.gen();
        let right_seed: u64 = rng.gen();

        let (left_forest, right_forest) = if self.config.parallel {
            rayon::join(
                || self.split(left, depth + 1, &mut StdRng::seed_from_u64(left_seed)),
                || self.split(right, depth + 1, &mut StdRng::seed_from_u64(right_seed)),
            )
        } else {
            (
                self.split(left, depth + 1, &mut StdRng::seed_from_u64(left_seed)),
                self.split(right, depth + 1, &mut StdRng::seed_from_u64(right_seed)),
            )
        };

        let mut forest = left_forest?;
        forest.append(right_forest?);
        if forced {
            forest.forced_splits += 1;
        }
        Ok(forest)
    }

    /// Similarity of every member to the pivot, in member order.
    fn score(&self, members: &[usize], pivot: usize, depth: usize) -> Result<Vec<f64>> {
        let reference = self.segments[pivot].as_ref();
        let total = members.len();
        let completed = AtomicUsize::new(0);

        let evaluate = |&member: &usize| -> Result<f64> {
            let score = similarity(reference, self.segments[member].as_ref(), self.config.method)?;
            let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
            self.observer.on_similarity(depth, done, total);
            Ok(score)
        };

        if self.config.parallel {
            use rayon::prelude::*;
            members.par_iter().map(evaluate).collect()
        } else {
            members.iter().map(evaluate).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clustering::progress::CountingProgress;

    fn wave(freq: f64, phase: f64, len: usize) -> Vec<f64> {
        (0..len)
            .map(|t| (t as f64 * freq + phase).sin())
            .collect()
    }

    fn twelve_segments() -> Vec<Vec<f64>> {
        (0..12)
            .map(|i| wave(0.05 + 0.02 * i as f64, 0.3 * i as f64, 100))
            .collect()
    }

    fn assert_partition(forest: &ClusterForest, n: usize) {
        let mut seen: Vec<usize> = forest.iter().flat_map(|c| c.members().to_vec()).collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..n).collect::<Vec<_>>());
    }

    // ==================== base cases ====================

    #[test]
    fn small_input_is_one_cluster() {
        let segments = vec![vec![0.0, 0.0, 0.0], vec![0.0, 0.0, 0.0]];
        let config = ClusterConfig::default().max_size(10).seed(1);
        let forest = divide_and_conquer(&segments, &config).unwrap();

        assert_eq!(forest.len(), 1);
        assert_eq!(forest.clusters[0].members(), &[0, 1]);
        assert_eq!(forest.resolve(&segments), vec![vec![&segments[0], &segments[1]]]);
        assert_eq!(forest.forced_splits, 0);
        assert_eq!(forest.max_depth, 0);
    }

    #[test]
    fn empty_input_gives_empty_forest() {
        let segments: Vec<Vec<f64>> = vec![];
        let forest = divide_and_conquer(&segments, &ClusterConfig::default()).unwrap();
        assert!(forest.is_empty());
        assert_eq!(forest.total_members(), 0);
    }

    #[test]
    fn single_segment_is_singleton() {
        let segments = vec![vec![1.0, 2.0, 3.0]];
        let forest = divide_and_conquer(&segments, &ClusterConfig::default().max_size(1)).unwrap();
        assert_eq!(forest.sizes(), vec![1]);
    }

    #[test]
    fn zero_max_size_is_rejected() {
        let segments = vec![vec![1.0, 2.0]];
        let err = divide_and_conquer(&segments, &ClusterConfig::default().max_size(0)).unwrap_err();
        assert!(matches!(err, ClusterError::InvalidParameter(_)));
    }

    // ==================== splitting ====================

    #[test]
    fn twelve_segments_split_under_max_size() {
        let segments = twelve_segments();
        let config = ClusterConfig::default().max_size(10).seed(42);
        let forest = divide_and_conquer(&segments, &config).unwrap();

        assert!(forest.len() >= 2);
        assert!(forest.sizes().iter().all(|&s| s <= 10));
        assert_eq!(forest.total_members(), 12);
        assert_partition(&forest, 12);
    }

    #[test]
    fn members_keep_input_order() {
        let segments = twelve_segments();
        let config = ClusterConfig::default()
            .max_size(3)
            .method(SimilarityMethod::Euclidean)
            .seed(3);
        let forest = divide_and_conquer(&segments, &config).unwrap();

        for cluster in &forest {
            assert!(cluster.members().windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    fn separated_groups_stay_together() {
        let mut segments = Vec::new();
        for i in 0..10 {
            segments.push(vec![i as f64 * 0.01; 8]);
        }
        for i in 0..10 {
            segments.push(vec![50.0 + i as f64 * 0.01; 8]);
        }

        for seed in 0..5 {
            let config = ClusterConfig::default()
                .max_size(10)
                .method(SimilarityMethod::Euclidean)
                .seed(seed);
            let forest = divide_and_conquer(&segments, &config).unwrap();

            assert_eq!(forest.sizes(), vec![10, 10]);
            for cluster in &forest {
                let low = cluster.members().iter().all(|&m| m < 10);
                let high = cluster.members().iter().all(|&m| m >= 10);
                assert!(low || high);
            }
        }
    }

    #[test]
    fn identical_segments_force_a_split() {
        let segments = vec![vec![0.5, -0.5, 0.5, -0.5]; 20];
        let config = ClusterConfig::default().max_size(10).seed(9);
        let counter = CountingProgress::new();
        let mut rng = StdRng::seed_from_u64(9);
        let forest = divide_and_conquer_with(&segments, &config, &mut rng, &counter).unwrap();

        assert_eq!(forest.sizes(), vec![10, 10]);
        assert_eq!(forest.forced_splits, 1);
        assert_eq!(forest.clusters[0].members(), &(0..10).collect::<Vec<_>>()[..]);
        assert_eq!(counter.similarities(), 20);
        assert_eq!(counter.splits(), 1);
        assert_eq!(counter.forced_splits(), 1);
    }

    #[test]
    fn identical_segments_terminate_for_every_method() {
        let segments = vec![vec![1.0, 1.0, 1.0]; 37];
        for method in [
            SimilarityMethod::DTW,
            SimilarityMethod::Correlation,
            SimilarityMethod::Euclidean,
        ] {
            let config = ClusterConfig::default().max_size(4).method(method).seed(0);
            let forest = divide_and_conquer(&segments, &config).unwrap();
            assert!(forest.sizes().iter().all(|&s| s <= 4));
            assert_partition(&forest, 37);
        }
    }

    #[test]
    fn length_mismatch_aborts_clustering() {
        let mut segments = vec![vec![0.0, 1.0, 2.0]; 5];
        segments.push(vec![0.0, 1.0]);
        let config = ClusterConfig::default()
            .max_size(2)
            .method(SimilarityMethod::Euclidean)
            .seed(1);

        let err = divide_and_conquer(&segments, &config).unwrap_err();
        assert!(matches!(err, ClusterError::LengthMismatch { .. }));
    }

    // ==================== randomness ====================

    #[test]
    fn same_seed_same_forest() {
        let segments: Vec<Vec<f64>> = (0..40)
            .map(|i| wave(0.02 * (1 + i % 7) as f64, i as f64, 60))
            .collect();
        let config = ClusterConfig::default().max_size(5).seed(2024);

        let a = divide_and_conquer(&segments, &config).unwrap();
        let b = divide_and_conquer(&segments, &config).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn parallel_matches_sequential() {
        let segments: Vec<Vec<f64>> = (0..40)
            .map(|i| wave(0.02 * (1 + i % 5) as f64, 0.1 * i as f64, 60))
            .collect();
        let config = ClusterConfig::default().max_size(4).seed(11);

        let sequential = divide_and_conquer(&segments, &config).unwrap();
        let parallel = divide_and_conquer(&segments, &config.clone().parallel(true)).unwrap();
        assert_eq!(sequential, parallel);
    }

    // ==================== config builder ====================

    #[test]
    fn config_builder() {
        let config = ClusterConfig::default()
            .max_size(25)
            .method(SimilarityMethod::Correlation)
            .seed(123)
            .parallel(true);

        assert_eq!(config.max_size, 25);
        assert_eq!(config.method, SimilarityMethod::Correlation);
        assert_eq!(config.seed, Some(123));
        assert!(config.parallel);
    }

    #[test]
    fn config_defaults() {
        let config = ClusterConfig::default();
        assert_eq!(config.max_size, 10);
        assert_eq!(config.method, SimilarityMethod::DTW);
        assert_eq!(config.seed, None);
        assert!(!config.parallel);
    }
}
