//! Learning Tapestry Analytics Agent
//!
//! Client library for the Learning Tapestry analytics API.
//!
//! # Public API
//!
//! The primary public API is [`agent::AnalyticsAgent`], which resolves its
//! settings from parameters and `config/analytics.yml` and issues the
//! `users` and `visits` queries. Request execution lives in [`client`].
//!
//! ```no_run
//! use analytics_agent::AnalyticsAgent;
//! use serde_json::json;
//!
//! # async fn example() -> analytics_core::Result<()> {
//! let agent = AnalyticsAgent::new([("org_api_key", json!("key")), ("org_secret_key", json!("secret"))])?;
//!
//! let users = agent.fetch_users().await?;
//! println!("HTTP {}", users["status"]);
//! # Ok(())
//! # }
//! ```

/// The analytics agent and its query assembly.
pub mod agent;

/// HTTP request execution and response parsing.
pub mod client;

#[cfg(test)]
pub mod test_utils;

pub use agent::AnalyticsAgent;
pub use analytics_core::{AnalyticsError, ConfigResolver, Result};
pub use client::ApiResponse;
