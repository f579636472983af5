use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::debug_log::DEFAULT_LOG_CAPACITY;
use crate::message::DEFAULT_MESSAGE_CAPACITY;

/// Page global that may carry a settings object, e.g.
/// `window.__GOTIFY_DESK_SETTINGS__ = { debug: false, logCapacity: 200 }`.
pub const SETTINGS_GLOBAL: &str = "__GOTIFY_DESK_SETTINGS__";

/// Largest accepted `logCapacity` / `messageCapacity`.
pub const MAX_CAPACITY: usize = 10_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ShellSettings {
    /// Record info-level entries in the debug panel.
    pub debug: bool,
    pub log_capacity: usize,
    pub message_capacity: usize,
}

impl Default for ShellSettings {
    fn default() -> Self {
        Self {
            debug: true,
            log_capacity: DEFAULT_LOG_CAPACITY,
            message_capacity: DEFAULT_MESSAGE_CAPACITY,
        }
    }
}

impl ShellSettings {
    /// Reads settings leniently: an unreadable object yields the defaults and
    /// out-of-range capacities fall back to their defaults.
    #[must_use]
    pub fn from_value(value: Option<Value>) -> Self {
        let Some(value) = value.filter(|value| !value.is_null()) else {
            return Self::default();
        };
        match serde_json::from_value::<Self>(value) {
            Ok(settings) => settings.normalized(),
            Err(error) => {
                tracing::warn!("ignoring unreadable {SETTINGS_GLOBAL}: {error}");
                Self::default()
            }
        }
    }

    /// Replaces a zero capacity, or one above [`MAX_CAPACITY`], with its default.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.log_capacity =
            checked_capacity("logCapacity", self.log_capacity, DEFAULT_LOG_CAPACITY);
        self.message_capacity = checked_capacity(
            "messageCapacity",
            self.message_capacity,
            DEFAULT_MESSAGE_CAPACITY,
        );
        self
    }
}

fn checked_capacity(field: &str, value: usize, default: usize) -> usize {
    match value {
        0 => default,
        value if value > MAX_CAPACITY => {
            tracing::warn!("{field} {value} exceeds {MAX_CAPACITY}; using {default}");
            default
        }
        value => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_settings_use_defaults() {
        assert_eq!(ShellSettings::from_value(None), ShellSettings::default());
        assert_eq!(ShellSettings::from_value(Some(Value::Null)), ShellSettings::default());
    }

    #[test]
    fn partial_settings_merge_with_defaults() {
        let settings = ShellSettings::from_value(Some(json!({"debug": false, "logCapacity": 20})));
        assert!(!settings.debug);
        assert_eq!(settings.log_capacity, 20);
        assert_eq!(settings.message_capacity, DEFAULT_MESSAGE_CAPACITY);
    }

    #[test]
    fn zero_capacity_falls_back() {
        let settings = ShellSettings::from_value(Some(json!({"logCapacity": 0})));
        assert_eq!(settings.log_capacity, DEFAULT_LOG_CAPACITY);
    }

    #[test]
    fn oversized_capacity_falls_back() {
        let settings = ShellSettings::from_value(Some(json!({
            "logCapacity": 4_000_000_000_000_000_000_u64,
            "messageCapacity": MAX_CAPACITY + 1,
        })));
        assert_eq!(settings.log_capacity, DEFAULT_LOG_CAPACITY);
        assert_eq!(settings.message_capacity, DEFAULT_MESSAGE_CAPACITY);

        let settings = ShellSettings::from_value(Some(json!({"logCapacity": MAX_CAPACITY})));
        assert_eq!(settings.log_capacity, MAX_CAPACITY);
    }

    #[test]
    fn malformed_settings_are_ignored() {
        let settings = ShellSettings::from_value(Some(json!({"debug": "yes"})));
        assert_eq!(settings, ShellSettings::default());
    }
}
