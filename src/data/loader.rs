//! Loading waveform segments from dataset files.
//!
//! Two layouts are understood, chosen by file extension:
//!
//! * `.json`: an object mapping channel keys (e.g. `"ABP_Raw"`) to an array
//!   of segments. Each segment is an array of numbers; nested arrays are
//!   flattened and `null` marks a missing sample.
//! * `.csv`, `.tsv`, `.txt`: one segment per line, the first field being the
//!   channel key and the rest the samples. Fields are separated by commas,
//!   semicolons, tabs or spaces. Blank lines and `#` comments are ignored.
//!
//! The first key whose lowercase form contains the requested signal type is
//! used. Segments with missing or non-finite samples, and flat segments, are
//! skipped; the rest are z-score normalized.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ClusterError, Result};
use crate::transform::zscore;

/// One waveform segment.
pub type Signal = Vec<f64>;

/// Where and what to load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Dataset file
    pub path: PathBuf,
    /// Channel to look for, matched case-insensitively as a substring
    pub signal_type: String,
    /// Maximum number of segments to accept
    pub limit: usize,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/VitalDB_AAMI_Test_Subset.json"),
            signal_type: "ABP".to_string(),
            limit: 1000,
        }
    }
}

impl LoaderConfig {
    /// Loader for `path` with default channel and limit.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    /// Set the channel to load.
    pub fn signal_type(mut self, signal_type: impl Into<String>) -> Self {
        self.signal_type = signal_type.into();
        self
    }

    /// Set the maximum number of segments.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.signal_type.trim().is_empty() {
            return Err(ClusterError::InvalidParameter(
                "signal_type must not be empty".to_string(),
            ));
        }
        if self.limit == 0 {
            return Err(ClusterError::InvalidParameter(
                "limit must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Supported dataset layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetFormat {
    Json,
    Delimited,
}

impl DatasetFormat {
    /// Pick the layout from the file extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "json" => Ok(DatasetFormat::Json),
            "csv" | "tsv" | "txt" => Ok(DatasetFormat::Delimited),
            "" => Err(ClusterError::UnsupportedFormat(format!(
                "{} has no extension",
                path.display()
            ))),
            other => Err(ClusterError::UnsupportedFormat(format!(".{other}"))),
        }
    }
}

/// Normalized segments of one channel.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentCollection {
    /// Dataset key the segments came from
    pub channel: String,
    /// File the segments were read from
    pub source: PathBuf,
    /// Normalized segments, in file order
    pub segments: Vec<Signal>,
    /// Rows dropped for missing samples, bad values or zero variance
    pub skipped: usize,
}

impl SegmentCollection {
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn as_slice(&self) -> &[Signal] {
        &self.segments
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Signal> {
        self.segments.iter()
    }
}

/// Read and normalize segments as described in the module docs.
///
/// # Errors
/// `Io` if the file cannot be read, `UnsupportedFormat` for unknown
/// extensions, `MissingChannel` when no key matches and `NoSegments` when
/// nothing survives filtering.
pub fn load_dataset(config: &LoaderConfig) -> Result<SegmentCollection> {
    config.validate()?;
    let format = DatasetFormat::from_path(&config.path)?;
    tracing::info!(
        path = %config.path.display(),
        signal_type = %config.signal_type,
        "loading segments"
    );

    let text = fs::read_to_string(&config.path).map_err(|e| ClusterError::io(&config.path, e))?;
    let collection = parse_dataset(&text, format, config)?;

    tracing::info!(
        loaded = collection.len(),
        skipped = collection.skipped,
        channel = %collection.channel,
        file = %config.path.file_name().map(|f| f.to_string_lossy()).unwrap_or_default(),
        "segments ready"
    );
    Ok(collection)
}

/// Parse already-read dataset text.
pub fn parse_dataset(
    text: &str,
    format: DatasetFormat,
    config: &LoaderConfig,
) -> Result<SegmentCollection> {
    config.validate()?;
    let (channel, rows) = match format {
        DatasetFormat::Json => json_rows(text, &config.signal_type)?,
        DatasetFormat::Delimited => delimited_rows(text, &config.signal_type)?,
    };

    let mut segments = Vec::new();
    let mut skipped = 0;
    for (row, raw) in rows.into_iter().enumerate() {
        if segments.len() >= config.limit {
            break;
        }
        match raw.and_then(|samples| accept(&samples)) {
            Some(segment) => segments.push(segment),
            None => {
                tracing::debug!(row, channel = %channel, "skipping segment");
                skipped += 1;
            }
        }
    }

    if segments.is_empty() {
        return Err(ClusterError::NoSegments { channel });
    }

    Ok(SegmentCollection {
        channel,
        source: config.path.clone(),
        segments,
        skipped,
    })
}

fn accept(samples: &[f64]) -> Option<Signal> {
    if samples.is_empty() || samples.iter().any(|x| !x.is_finite()) {
        return None;
    }
    zscore(samples).map(|scaled| scaled.data)
}

fn matches_channel(key: &str, needle: &str) -> bool {
    key.to_lowercase().contains(&needle.to_lowercase())
}

/// Rows of the matching JSON key; `None` marks a row that is not numeric.
fn json_rows(text: &str, signal_type: &str) -> Result<(String, Vec<Option<Vec<f64>>>)> {
    let root: Value = serde_json::from_str(text)?;
    let Value::Object(map) = root else {
        return Err(ClusterError::Parse {
            line: 1,
            message: "expected an object of channel arrays".to_string(),
        });
    };

    let mut keys: Vec<&String> = map.keys().collect();
    keys.sort();
    let Some(key) = keys.iter().find(|k| matches_channel(k, signal_type)) else {
        return Err(ClusterError::MissingChannel {
            channel: signal_type.to_string(),
            available: keys.iter().map(|k| k.to_string()).collect(),
        });
    };

    let Some(rows) = map[key.as_str()].as_array() else {
        return Err(ClusterError::Parse {
            line: 1,
            message: format!("channel '{key}' is not an array of segments"),
        });
    };

    let rows = rows
        .iter()
        .map(|row| {
            let mut samples = Vec::new();
            flatten_json(row, &mut samples).then_some(samples)
        })
        .collect();
    Ok((key.to_string(), rows))
}

fn flatten_json(value: &Value, out: &mut Vec<f64>) -> bool {
    match value {
        Value::Number(n) => match n.as_f64() {
            Some(x) => {
                out.push(x);
                true
            }
            None => false,
        },
        Value::Null => {
            out.push(f64::NAN);
            true
        }
        Value::Array(items) => items.iter().all(|item| flatten_json(item, out)),
        _ => false,
    }
}

/// Rows of the first matching channel in a delimited text file.
fn delimited_rows(text: &str, signal_type: &str) -> Result<(String, Vec<Option<Vec<f64>>>)> {
    let mut available: Vec<String> = Vec::new();
    let mut chosen: Option<String> = None;
    let mut rows = Vec::new();

    for (line_no, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut fields = split_fields(line);
        let Some(key) = fields.next() else {
            continue;
        };

        if !available.iter().any(|k| k == key) {
            available.push(key.to_string());
        }
        if chosen.is_none() && matches_channel(key, signal_type) {
            chosen = Some(key.to_string());
        }
        if chosen.as_deref() != Some(key) {
            continue;
        }

        let parsed: Option<Vec<f64>> = fields.map(parse_sample).collect();
        if parsed.is_none() {
            tracing::debug!(line = line_no + 1, "non-numeric sample");
        }
        rows.push(parsed);
    }

    match chosen {
        Some(channel) => Ok((channel, rows)),
        None => Err(ClusterError::MissingChannel {
            channel: signal_type.to_string(),
            available,
        }),
    }
}

fn split_fields(line: &str) -> Box<dyn Iterator<Item = &str> + '_> {
    if line.contains(',') {
        Box::new(line.split(',').map(str::trim))
    } else if line.contains(';') {
        Box::new(line.split(';').map(str::trim))
    } else {
        Box::new(line.split_whitespace())
    }
}

fn parse_sample(field: &str) -> Option<f64> {
    if field.is_empty() || field.eq_ignore_ascii_case("nan") || field.eq_ignore_ascii_case("na") {
        return Some(f64::NAN);
    }
    field.parse().ok()
}
