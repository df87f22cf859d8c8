//! SVG line plots of representative cluster members.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::clustering::ClusterForest;
use crate::error::{ClusterError, Result};

const PALETTE: [&str; 6] = [
    "#4c72b0", "#dd8452", "#55a868", "#c44e52", "#8172b3", "#937860",
];
const MARGIN_LEFT: f64 = 50.0;
const MARGIN_RIGHT: f64 = 20.0;
const MARGIN_TOP: f64 = 40.0;
const MARGIN_BOTTOM: f64 = 30.0;
const GRID_LINES: usize = 5;

/// Plot output settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotConfig {
    /// Directory the SVG files are written to (created if missing)
    pub output_dir: PathBuf,
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Members drawn per cluster
    pub max_signals_per_plot: usize,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("results/cluster_visuals"),
            width: 1000,
            height: 400,
            max_signals_per_plot: 3,
        }
    }
}

impl PlotConfig {
    /// Set the output directory.
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Set image size.
    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width.max(200);
        self.height = height.max(120);
        self
    }

    /// Set how many members are drawn per cluster.
    pub fn max_signals_per_plot(mut self, n: usize) -> Self {
        self.max_signals_per_plot = n.max(1);
        self
    }
}

/// Write `cluster_{i}.svg` (1-based) for every non-empty cluster.
///
/// Returns the written paths in forest order.
pub fn plot_clusters<S: AsRef<[f64]>>(
    forest: &ClusterForest,
    segments: &[S],
    config: &PlotConfig,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(&config.output_dir).map_err(|e| ClusterError::io(&config.output_dir, e))?;

    let mut written = Vec::with_capacity(forest.len());
    for (i, cluster) in forest.iter().enumerate() {
        if cluster.is_empty() {
            continue;
        }
        let members: Vec<&[f64]> = cluster
            .signals(segments)
            .into_iter()
            .take(config.max_signals_per_plot)
            .map(AsRef::as_ref)
            .collect();
        let title = format!("Cluster {} (n={})", i + 1, cluster.len());
        let svg = render_svg(&title, &members, config);

        let path = config.output_dir.join(format!("cluster_{}.svg", i + 1));
        write_file(&path, &svg)?;
        written.push(path);
    }

    tracing::info!(
        plots = written.len(),
        dir = %config.output_dir.display(),
        "cluster plots written"
    );
    Ok(written)
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents).map_err(|e| ClusterError::io(path, e))
}

/// Render one line chart as a standalone SVG document.
pub fn render_svg(title: &str, signals: &[&[f64]], config: &PlotConfig) -> String {
    let width = f64::from(config.width);
    let height = f64::from(config.height);
    let plot_w = width - MARGIN_LEFT - MARGIN_RIGHT;
    let plot_h = height - MARGIN_TOP - MARGIN_BOTTOM;

    let (mut lo, mut hi) = signals
        .iter()
        .flat_map(|s| s.iter().copied())
        .filter(|x| x.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), x| {
            (lo.min(x), hi.max(x))
        });
    if !lo.is_finite() || !hi.is_finite() {
        lo = -1.0;
        hi = 1.0;
    } else if hi - lo < f64::EPSILON {
        lo -= 1.0;
        hi += 1.0;
    }
    let longest = signals.iter().map(|s| s.len()).max().unwrap_or(0);
    let x_span = longest.saturating_sub(1).max(1) as f64;

    let x_of = |i: usize| MARGIN_LEFT + plot_w * i as f64 / x_span;
    let y_of = |v: f64| MARGIN_TOP + plot_h * (hi - v) / (hi - lo);

    let mut svg = String::new();
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = config.width,
        h = config.height
    );
    let _ = writeln!(svg, r#"<rect width="100%" height="100%" fill="white"/>"#);
    let _ = writeln!(
        svg,
        r##"<rect x="{MARGIN_LEFT}" y="{MARGIN_TOP}" width="{plot_w:.1}" height="{plot_h:.1}" fill="#eaeaf2"/>"##
    );

    for k in 0..=GRID_LINES {
        let frac = k as f64 / GRID_LINES as f64;
        let y = MARGIN_TOP + plot_h * frac;
        let value = hi - (hi - lo) * frac;
        let _ = writeln!(
            svg,
            r#"<line x1="{MARGIN_LEFT}" y1="{y:.1}" x2="{:.1}" y2="{y:.1}" stroke="white"/>"#,
            MARGIN_LEFT + plot_w
        );
        let _ = writeln!(
            svg,
            r#"<text x="{:.1}" y="{:.1}" font-size="10" text-anchor="end">{value:.2}</text>"#,
            MARGIN_LEFT - 6.0,
            y + 3.0
        );
    }

    for (idx, signal) in signals.iter().enumerate() {
        if signal.is_empty() {
            continue;
        }
        let points: Vec<String> = signal
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_finite())
            .map(|(i, &v)| format!("{:.1},{:.1}", x_of(i), y_of(v)))
            .collect();
        let _ = writeln!(
            svg,
            r#"<polyline fill="none" stroke="{}" stroke-width="1.2" stroke-opacity="0.7" points="{}"/>"#,
            PALETTE[idx % PALETTE.len()],
            points.join(" ")
        );
    }

    let _ = writeln!(
        svg,
        r#"<text x="{:.1}" y="24" font-size="16" text-anchor="middle" font-family="sans-serif">{}</text>"#,
        width / 2.0,
        escape(title)
    );
    svg.push_str("</svg>\n");
    svg
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
