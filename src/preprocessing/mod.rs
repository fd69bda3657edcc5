//! Cleaning steps applied to survey tables before matching.

pub mod duplicates;
pub mod outliers;

pub use duplicates::{Aggregation, DuplicatesRemoval};
pub use outliers::{OutlierRemoval, QuantileThreshold, Threshold, ValueThreshold};
