//! Hardware driver implementations
//!
//! This crate provides concrete implementations of the collaborator traits
//! defined in chromasort-core on top of `embedded-hal` 1.0:
//!
//! - Touch trigger on a GPIO input
//! - TCS34725 I2C color sensor
//! - Step/dir stepper channel with position tracking in degrees

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod color;
pub mod motor;
pub mod trigger;

#[cfg(test)]
mod mock;
