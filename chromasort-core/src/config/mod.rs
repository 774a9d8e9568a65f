//! Configuration types
//!
//! Board-agnostic configuration structures and the TOML loader used to
//! build them from the embedded `sorter.toml`.

pub mod hardware;
pub mod toml;
pub mod types;

pub use hardware::*;
pub use toml::{parse_config, ParseError};
pub use types::*;
