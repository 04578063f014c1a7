//! Option key normalization
//!
//! Parameters and configuration files may spell the same option differently
//! (`configFile`, `config-file`, `:config_file`). All of them are folded into
//! one canonical snake_case key before lookup.

use heck::ToSnakeCase;
use std::collections::HashMap;

use crate::error::{AnalyticsError, Result};

/// Normalize an option key to its canonical snake_case form.
pub fn normalize_key(key: &str) -> String {
    let key = key.trim();
    key.strip_prefix(':').unwrap_or(key).to_snake_case()
}

/// Normalize the keys of a sequence of entries, keeping their order.
///
/// # Errors
///
/// Returns [`AnalyticsError::Config`] when two different spellings fold into
/// the same key (`fooBar` and `foo_bar`), since one value would shadow the other.
pub fn normalize_entries<K, V, I>(entries: I) -> Result<Vec<(String, V)>>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
{
    let mut seen: HashMap<String, String> = HashMap::new();
    let mut normalized = Vec::new();

    for (key, value) in entries {
        let original = key.as_ref();
        let canonical = normalize_key(original);

        if let Some(previous) = seen.insert(canonical.clone(), original.to_string()) {
            return Err(AnalyticsError::Config(format!(
                "Option keys '{}' and '{}' both resolve to '{}'",
                previous, original, canonical
            )));
        }

        normalized.push((canonical, value));
    }

    Ok(normalized)
}
