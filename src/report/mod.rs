//! Run outputs: cluster plots and the JSON run summary.

pub mod plot;
pub mod summary;

pub use plot::{plot_clusters, render_svg, PlotConfig};
pub use summary::{read_summary, write_summary, ClusterSummary, RunReport, SegmentPeak};
