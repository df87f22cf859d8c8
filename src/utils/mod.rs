//! Utility functions shared across modules.

pub mod stats;

pub use stats::{mean, median, pearson_correlation, population_variance, std_dev, variance};
