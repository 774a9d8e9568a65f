//! Batched color sampling
//!
//! A batch of raw readings is summed and normalized to a unit vector so that
//! classification is insensitive to overall brightness.

pub mod aggregator;
pub mod color;

pub use aggregator::{AggregatedReading, SampleAggregator};
pub use color::{NormalizedColor, ZeroMagnitude};

pub use crate::traits::Rgb;
