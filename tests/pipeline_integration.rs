//! End-to-end runs of the analysis pipeline against temporary datasets.

use std::fs;
use std::path::Path;

use pulse_cluster::clustering::{ClusterConfig, SimilarityMethod};
use pulse_cluster::data::LoaderConfig;
use pulse_cluster::pipeline::{run_with_output, PipelineConfig};
use pulse_cluster::report::{read_summary, PlotConfig};
use pulse_cluster::ClusterError;

/// Synthetic pressure-like beats: two families with different rates.
fn beat(i: usize, len: usize) -> Vec<f64> {
    let rate = if i % 2 == 0 { 0.15 } else { 0.4 };
    (0..len)
        .map(|t| 90.0 + 25.0 * (t as f64 * rate + i as f64 * 0.05).sin())
        .collect()
}

fn write_json_dataset(path: &Path, count: usize, len: usize) {
    let segments: Vec<Vec<f64>> = (0..count).map(|i| beat(i, len)).collect();
    let doc = serde_json::json!({
        "ABP_Raw": segments,
        "ECG_F": [[0.0, 1.0, 0.0, 1.0]],
    });
    fs::write(path, serde_json::to_string(&doc).unwrap()).unwrap();
}

fn run_to_string(config: &PipelineConfig) -> (String, pulse_cluster::Result<pulse_cluster::report::RunReport>) {
    let mut out = Vec::new();
    let result = run_with_output(config, &mut out);
    (String::from_utf8(out).unwrap(), result)
}

#[test]
fn json_dataset_full_run() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("abp.json");
    write_json_dataset(&data, 12, 100);

    let plots = dir.path().join("plots");
    let summary = dir.path().join("out").join("summary.json");
    let config = PipelineConfig::default()
        .loader(LoaderConfig::new(&data).signal_type("abp"))
        .cluster(ClusterConfig::default().max_size(10).seed(42))
        .plot(Some(PlotConfig::default().output_dir(&plots)))
        .summary_path(&summary);

    let (output, result) = run_to_string(&config);
    let report = result.unwrap();

    assert_eq!(report.channel, "ABP_Raw");
    assert_eq!(report.segments, 12);
    assert!(report.cluster_count() >= 2);
    assert_eq!(
        report.clusters.iter().map(|c| c.members.len()).sum::<usize>(),
        12
    );
    assert!(report.clusters.iter().all(|c| c.members.len() <= 10));
    assert_eq!(report.peaks.len(), 5);

    assert!(output.contains(&format!(" Generated {} clusters.", report.cluster_count())));
    assert!(output.contains("Cluster 1: Closest pair distance = "));
    assert!(output.contains("Segment 5: Max subarray sum = "));
    assert!(output.contains("Analysis complete."));

    assert_eq!(report.plots.len(), report.cluster_count());
    for plot in &report.plots {
        let svg = fs::read_to_string(plot).unwrap();
        assert!(svg.contains("<polyline"));
    }
    assert!(plots.join("cluster_1.svg").exists());

    assert_eq!(read_summary(&summary).unwrap(), report);
}

#[test]
fn delimited_dataset_with_correlation() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("ppg.csv");
    let mut text = String::from("# channel,samples...\n");
    for i in 0..25 {
        let row: Vec<String> = beat(i, 60).iter().map(|v| format!("{v:.3}")).collect();
        text.push_str(&format!("PPG_F,{}\n", row.join(",")));
    }
    text.push_str("PPG_F,1,2,nan,4\n");
    fs::write(&data, text).unwrap();

    let config = PipelineConfig::default()
        .loader(LoaderConfig::new(&data).signal_type("ppg"))
        .cluster(
            ClusterConfig::default()
                .max_size(5)
                .method(SimilarityMethod::Correlation)
                .seed(7)
                .parallel(true),
        )
        .kadane_samples(2)
        .plot(None);

    let (output, result) = run_to_string(&config);
    let report = result.unwrap();

    assert_eq!(report.segments, 25);
    assert_eq!(report.skipped, 1);
    assert!(report.clusters.iter().all(|c| c.members.len() <= 5));
    assert_eq!(report.peaks.len(), 2);
    assert!(report.plots.is_empty());
    assert!(!output.contains("Saving representative cluster plots"));
}

#[test]
fn missing_channel_aborts_before_plotting() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("ecg_only.json");
    fs::write(&data, r#"{"ECG_F": [[0.0, 1.0, 0.5]]}"#).unwrap();

    let plots = dir.path().join("plots");
    let config = PipelineConfig::default()
        .loader(LoaderConfig::new(&data).signal_type("ABP"))
        .plot(Some(PlotConfig::default().output_dir(&plots)));

    let (output, result) = run_to_string(&config);

    assert!(matches!(result, Err(ClusterError::MissingChannel { .. })));
    assert!(!output.contains("Clustering time-series segments"));
    assert!(!plots.exists());
}

#[test]
fn unsupported_format_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("subset.mat");
    fs::write(&data, b"MATLAB 5.0").unwrap();

    let config = PipelineConfig::default().loader(LoaderConfig::new(&data));
    let (_, result) = run_to_string(&config);

    assert_eq!(
        result.unwrap_err(),
        ClusterError::UnsupportedFormat(".mat".to_string())
    );
}

#[test]
fn identical_segments_are_split_not_looped() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("flat.json");
    let segment: Vec<f64> = (0..30).map(|t| (t as f64 * 0.3).sin()).collect();
    let doc = serde_json::json!({ "ABP": vec![segment; 20] });
    fs::write(&data, doc.to_string()).unwrap();

    let config = PipelineConfig::default()
        .loader(LoaderConfig::new(&data))
        .cluster(ClusterConfig::default().max_size(10).seed(1))
        .plot(None);

    let (_, result) = run_to_string(&config);
    let report = result.unwrap();

    assert_eq!(report.cluster_count(), 2);
    assert_eq!(report.forced_splits, 1);
    for cluster in &report.clusters {
        assert_eq!(cluster.closest_pair.indices(), Some((0, 1)));
        assert_eq!(cluster.closest_pair.distance(), 0.0);
    }
}
