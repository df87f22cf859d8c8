//! End-to-end analysis run: load, cluster, closest pairs, Kadane scan, plots.
//!
//! # Example
//!
//! ```no_run
//! use pulse_cluster::pipeline::{run, PipelineConfig};
//! use pulse_cluster::data::LoaderConfig;
//!
//! let config = PipelineConfig::default()
//!     .loader(LoaderConfig::new("data/VitalDB_AAMI_Test_Subset.json").signal_type("ABP"));
//! let report = run(&config).unwrap();
//! println!("{} clusters", report.cluster_count());
//! ```

use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::clustering::{
    closest_pair, closest_pair_parallel, divide_and_conquer_with, ClosestPair, ClusterConfig,
    ClusterForest, LogProgress, SimilarityMethod,
};
use crate::data::{load_dataset, LoaderConfig, Signal};
use crate::error::{ClusterError, Result};
use crate::features::max_subarray;
use crate::report::{
    plot_clusters, write_summary, ClusterSummary, PlotConfig, RunReport, SegmentPeak,
};

/// Full run configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub loader: LoaderConfig,
    pub cluster: ClusterConfig,
    /// Leading segments scanned with Kadane
    pub kadane_samples: usize,
    /// Plot settings; `None` skips plotting
    pub plot: Option<PlotConfig>,
    /// Where to write the JSON run summary, if anywhere
    pub summary_path: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            loader: LoaderConfig::default(),
            cluster: ClusterConfig::default(),
            kadane_samples: 5,
            plot: Some(PlotConfig::default()),
            summary_path: None,
        }
    }
}

impl PipelineConfig {
    /// Read a configuration stored as JSON.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| ClusterError::io(path, e))?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Set loader settings.
    pub fn loader(mut self, loader: LoaderConfig) -> Self {
        self.loader = loader;
        self
    }

    /// Set clustering settings.
    pub fn cluster(mut self, cluster: ClusterConfig) -> Self {
        self.cluster = cluster;
        self
    }

    /// Set how many leading segments get a Kadane scan.
    pub fn kadane_samples(mut self, n: usize) -> Self {
        self.kadane_samples = n;
        self
    }

    /// Set plot settings, or disable plotting with `None`.
    pub fn plot(mut self, plot: Option<PlotConfig>) -> Self {
        self.plot = plot;
        self
    }

    /// Write a JSON summary to `path` at the end of the run.
    pub fn summary_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.summary_path = Some(path.into());
        self
    }
}

/// Run the pipeline, printing progress lines to stdout.
pub fn run(config: &PipelineConfig) -> Result<RunReport> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    run_with_output(config, &mut out)
}

/// Run the pipeline, printing progress lines to `out`.
pub fn run_with_output<W: Write>(config: &PipelineConfig, out: &mut W) -> Result<RunReport> {
    say(out, format_args!("=== Time-Series Clustering and Segment Analysis ==="))?;

    let collection = load_dataset(&config.loader)?;
    say(
        out,
        format_args!(
            "Loaded {} {} segments from {}",
            collection.len(),
            collection.channel,
            collection.source.display()
        ),
    )?;
    let segments = collection.as_slice();

    say(out, format_args!("Clustering time-series segments..."))?;
    let forest = cluster_segments(segments, &config.cluster)?;
    say(out, format_args!(" Generated {} clusters.", forest.len()))?;

    let pairs = closest_pairs(&forest, segments, config.cluster.parallel)?;
    for summary in &pairs {
        say(
            out,
            format_args!(
                "Cluster {}: Closest pair distance = {:.4}",
                summary.number,
                summary.closest_pair.distance()
            ),
        )?;
    }

    say(out, format_args!("\nApplying Kadane's algorithm on sample signals..."))?;
    let peaks = scan_peaks(segments, config.kadane_samples);
    for peak in &peaks {
        say(
            out,
            format_args!(
                "Segment {}: Max subarray sum = {:.4} (indices {}-{})",
                peak.number, peak.subarray.sum, peak.subarray.start, peak.subarray.end
            ),
        )?;
    }

    let plots = match &config.plot {
        Some(plot) => {
            say(out, format_args!("\nSaving representative cluster plots..."))?;
            plot_clusters(&forest, segments, plot)?
        }
        None => Vec::new(),
    };

    let report = RunReport {
        generated_at: Utc::now(),
        channel: collection.channel.clone(),
        source: collection.source.clone(),
        segments: collection.len(),
        skipped: collection.skipped,
        method: config.cluster.method,
        max_size: config.cluster.max_size,
        forced_splits: forest.forced_splits,
        max_depth: forest.max_depth,
        clusters: pairs,
        peaks,
        plots,
    };

    if let Some(path) = &config.summary_path {
        write_summary(&report, path)?;
    }

    match &config.plot {
        Some(plot) => say(
            out,
            format_args!(
                "\n Analysis complete. Plots saved in '{}/'.",
                plot.output_dir.display()
            ),
        )?,
        None => say(out, format_args!("\n Analysis complete."))?,
    }
    Ok(report)
}

/// Cluster with the configured seed, logging root-level progress.
pub fn cluster_segments(segments: &[Signal], config: &ClusterConfig) -> Result<ClusterForest> {
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let progress = LogProgress::default();
    divide_and_conquer_with(segments, config, &mut rng, &progress)
}

/// DTW closest pair for every cluster, in forest order.
pub fn closest_pairs(
    forest: &ClusterForest,
    segments: &[Signal],
    parallel: bool,
) -> Result<Vec<ClusterSummary>> {
    forest
        .iter()
        .enumerate()
        .map(|(i, cluster)| {
            let members = cluster.signals(segments);
            let pair: ClosestPair = if parallel {
                closest_pair_parallel(&members, SimilarityMethod::DTW)?
            } else {
                closest_pair(&members)
            };
            Ok(ClusterSummary {
                number: i + 1,
                members: cluster.members().to_vec(),
                closest_pair: pair,
            })
        })
        .collect()
}

/// Kadane scan over the first `samples` segments.
pub fn scan_peaks(segments: &[Signal], samples: usize) -> Vec<SegmentPeak> {
    segments
        .iter()
        .take(samples)
        .enumerate()
        .filter_map(|(i, segment)| {
            max_subarray(segment).map(|subarray| SegmentPeak {
                number: i + 1,
                subarray,
            })
        })
        .collect()
}

fn say<W: Write>(out: &mut W, line: fmt::Arguments<'_>) -> Result<()> {
    writeln!(out, "{line}").map_err(|e| ClusterError::io("<output>", e))
}
