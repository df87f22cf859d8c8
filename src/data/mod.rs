//! Dataset access.

pub mod loader;

pub use loader::{
    load_dataset, parse_dataset, DatasetFormat, LoaderConfig, SegmentCollection, Signal,
};
