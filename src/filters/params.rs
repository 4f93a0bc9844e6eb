//! Typed readers over raw query-string parameters.

use std::collections::HashMap;

use crate::validator::Validator;

/// Decoded query string as delivered by the router.
pub type QueryParams = HashMap<String, String>;

/// Read a string parameter; empty or absent yields `default`.
pub fn read_string(params: &QueryParams, key: &str, default: &str) -> String {
    match params.get(key) {
        Some(value) if !value.is_empty() => value.clone(),
        _ => default.to_string(),
    }
}

/// Read a comma-separated list, dropping empty elements.
pub fn read_csv(params: &QueryParams, key: &str) -> Vec<String> {
    params
        .get(key)
        .map(|value| {
            value
                .split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Read an integer parameter.
///
/// Absent or empty yields `Some(default)`. A value that does not parse records
/// "must be an integer value" against `key` and yields `None`.
pub fn read_int(params: &QueryParams, key: &str, default: i64, v: &mut Validator) -> Option<i64> {
    match params.get(key) {
        Some(value) if !value.is_empty() => match value.parse::<i64>() {
            Ok(parsed) => Some(parsed),
            Err(_) => {
                v.add_error(key, "must be an integer value");
                None
            }
        },
        _ => Some(default),
    }
}
