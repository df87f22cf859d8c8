//! pulse-cluster CLI
//!
//! Loads one channel of a waveform dataset, clusters its segments, reports
//! the closest pair per cluster and Kadane peaks for sample segments, and
//! writes cluster plots.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use pulse_cluster::clustering::SimilarityMethod;
use pulse_cluster::pipeline::{run, PipelineConfig};

/// Divide-and-conquer clustering of physiological waveform segments
#[derive(Parser, Debug)]
#[command(name = "pulse-cluster")]
#[command(version)]
#[command(about = "Cluster ABP/ECG/PPG segments and report closest pairs")]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// JSON pipeline configuration; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Dataset file (.json, .csv, .tsv, .txt)
    #[arg(long)]
    path: Option<PathBuf>,

    /// Channel to load, matched as a case-insensitive substring
    #[arg(long)]
    signal_type: Option<String>,

    /// Maximum number of segments to load
    #[arg(long)]
    limit: Option<usize>,

    /// Largest cluster allowed
    #[arg(long)]
    max_size: Option<usize>,

    /// Similarity method: dtw, correlation or euclidean (unknown names fall back to dtw)
    #[arg(long)]
    method: Option<String>,

    /// Sakoe-Chiba band for DTW
    #[arg(long)]
    dtw_window: Option<usize>,

    /// Seed for pivot selection
    #[arg(long)]
    seed: Option<u64>,

    /// Evaluate subtrees and pair scans in parallel
    #[arg(long)]
    parallel: bool,

    /// Number of leading segments scanned with Kadane
    #[arg(long)]
    samples: Option<usize>,

    /// Directory for cluster plots
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Skip writing plots
    #[arg(long)]
    no_plots: bool,

    /// Write a JSON run summary to this file
    #[arg(long)]
    summary: Option<PathBuf>,
}

impl Cli {
    fn pipeline_config(&self) -> anyhow::Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_file(path)
                .with_context(|| format!("reading config {}", path.display()))?,
            None => PipelineConfig::default(),
        };

        if let Some(path) = &self.path {
            config.loader.path = path.clone();
        }
        if let Some(signal_type) = &self.signal_type {
            config.loader.signal_type = signal_type.clone();
        }
        if let Some(limit) = self.limit {
            config.loader.limit = limit;
        }
        if let Some(max_size) = self.max_size {
            config.cluster.max_size = max_size;
        }
        if let Some(method) = &self.method {
            config.cluster.method = SimilarityMethod::parse_lenient(method);
        }
        if let Some(window) = self.dtw_window {
            match &mut config.cluster.method {
                SimilarityMethod::Dtw { window: w } => *w = Some(window),
                other => tracing::warn!(method = %other, "--dtw-window ignored for non-dtw method"),
            }
        }
        if let Some(seed) = self.seed {
            config.cluster.seed = Some(seed);
        }
        if self.parallel {
            config.cluster.parallel = true;
        }
        if let Some(samples) = self.samples {
            config.kadane_samples = samples;
        }
        if let Some(dir) = &self.output_dir {
            config.plot.get_or_insert_with(Default::default).output_dir = dir.clone();
        }
        if self.no_plots {
            config.plot = None;
        }
        if let Some(summary) = &self.summary {
            config.summary_path = Some(summary.clone());
        }
        Ok(config)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();

    match execute(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "run aborted");
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn execute(cli: &Cli) -> anyhow::Result<()> {
    let config = cli.pipeline_config()?;
    tracing::debug!(?config, "resolved configuration");

    run(&config).with_context(|| format!("analysis of {} failed", config.loader.path.display()))?;
    Ok(())
}
