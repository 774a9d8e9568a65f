//! Board-agnostic core logic for the Chromasort cube sorting rig
//!
//! This crate contains all control logic that does not depend on
//! specific hardware implementations:
//!
//! - Hardware collaborator traits (trigger, color sensor, motor, log sink)
//! - Batched color sampling and normalization
//! - Nearest-centroid color classification
//! - Actuation planning (dedicated pistons or rotating tray) and sequencing
//! - Request loop state machine
//! - Configuration type definitions and TOML parsing

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

mod fmt;

pub mod classify;
pub mod config;
pub mod controller;
pub mod motion;
pub mod sampling;
pub mod state;
pub mod traits;

#[cfg(test)]
mod testing;

pub use controller::{CycleOutcome, LoopError, RequestLoop, RunSummary};
