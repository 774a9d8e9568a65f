//! Nearest-centroid color classification

pub mod centroid;
pub mod classifier;

pub use centroid::{CentroidTable, ColorCentroid, ColorLabel};
pub use classifier::{ClassificationResult, ColorClassifier};
