/// Database configuration and connection management
pub mod database;

/// Club settings loading from config.toml
pub mod club;

pub use club::{CategoryConfig, ClubConfig};
