//! Analytics Core Library
//!
//! Configuration resolution, error types and query helpers shared by the
//! Learning Tapestry analytics client.

pub mod config;
pub mod error;
pub mod keys;
pub mod types;

// Re-export commonly used types
pub use config::{ConfigMap, ConfigResolver};
pub use error::*;
pub use keys::{normalize_entries, normalize_key};
pub use types::*;
