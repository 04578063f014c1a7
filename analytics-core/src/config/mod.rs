//! Configuration resolution for the analytics client
//!
//! # Architecture
//!
//! Options come from two tiers, looked up in order:
//! 1. Explicit parameters passed by the caller
//! 2. A YAML file (`config/analytics.yml` by default)
//!
//! A caller-supplied default applies when neither tier has the key.
//! See [`ConfigResolver`].

mod paths;
mod resolver;

pub use paths::{default_config_dir, resolve_config_path, DEFAULT_CONFIG_DIR, DEFAULT_CONFIG_FILE};
pub use resolver::{lookup, parse_config, ConfigMap, ConfigResolver, CONFIG_FILE, IGNORE_CONFIG_FILE};
