//! Shared types, config, and error definitions for the talent scanner.

pub mod config;
pub mod error;
pub mod game_data;
pub mod types;

pub use config::{FetchLimits, ScannerConfig};
pub use error::Error;
pub use game_data::GameData;
pub use types::*;

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, Error>;
