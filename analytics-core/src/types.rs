//! Shared types for query assembly

use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::{AnalyticsError, Result};
use crate::keys::normalize_entries;

/// Filter name to filter value.
pub type Filters = BTreeMap<String, Value>;

/// Lower bound of the queried date range.
pub const DATE_BEGIN: &str = "date_begin";
/// Upper bound of the queried date range.
pub const DATE_END: &str = "date_end";
/// Restrict results to these site domains (list).
pub const SITE_DOMAINS: &str = "site_domains";
/// Restrict results to these page URLs (list).
pub const PAGE_URLS: &str = "page_urls";

/// Filters sent verbatim.
pub const PASSTHROUGH_FILTERS: [&str; 2] = [DATE_BEGIN, DATE_END];
/// Filters sent as comma-joined lists.
pub const LIST_FILTERS: [&str; 2] = [SITE_DOMAINS, PAGE_URLS];

/// Entity value routed to the sites endpoint; anything else goes to pages.
pub const SITE_VISITS: &str = "site_visits";

/// Render a value as a single query-string field.
///
/// Lists are comma-joined, scalars use their plain text form, `null` gives
/// `None` so the field is left out of the query.
pub fn render_param(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(render_param)
                .collect::<Vec<_>>()
                .join(","),
        ),
        Value::Object(_) => Some(value.to_string()),
    }
}

/// Build a filter map from a configuration value, normalizing filter names.
///
/// # Errors
///
/// Returns [`AnalyticsError::Config`] unless the value is a mapping whose
/// filter names stay distinct once normalized.
pub fn filters_from_value(value: Value) -> Result<Filters> {
    match value {
        Value::Null => Ok(Filters::new()),
        Value::Object(map) => Ok(normalize_entries(map)?.into_iter().collect()),
        other => Err(AnalyticsError::Config(format!(
            "'filters' must be a mapping, got {}",
            other
        ))),
    }
}

/// Build a username list from a configuration value.
///
/// A single string becomes a one-element list.
///
/// # Errors
///
/// Returns [`AnalyticsError::Config`] for anything but a string or a list of
/// scalars.
pub fn usernames_from_value(value: Value) -> Result<Vec<String>> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::String(s) => Ok(s),
                Value::Number(n) => Ok(n.to_string()),
                other => Err(AnalyticsError::Config(format!(
                    "usernames must be strings, got {}",
                    other
                ))),
            })
            .collect(),
        Value::String(s) => Ok(vec![s]),
        Value::Number(n) => Ok(vec![n.to_string()]),
        other => Err(AnalyticsError::Config(format!(
            "'usernames' must be a list of strings, got {}",
            other
        ))),
    }
}
