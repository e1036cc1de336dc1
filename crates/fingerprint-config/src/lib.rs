//! Configuration for the fingerprint HAL
//!
//! Sensor description and policy knobs are plain properties. Each key is
//! looked up as `persist.vendor.fingerprint.<key>`, then
//! `ro.vendor.fingerprint.<key>`, then as the bare key, across all sources in
//! order, before falling back to a built-in default.

mod properties;
mod sensor;

pub use properties::{
    ConfigFile, ENV_PREFIX, MapProperties, PropertyFile, PropertySource, SystemProperties,
};
pub use sensor::{FingerprintSensorType, SensorLocation, parse_sensor_locations};

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("unrecognized or unimplemented fingerprint behavior: {0:?}")]
    UnsupportedSensorType(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config source error: {0}")]
    Source(#[from] config::ConfigError),
}

/// Config Result type
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Writable override namespace
pub const PERSIST_PREFIX: &str = "persist.vendor.fingerprint.";
/// Read-only namespace set by the vendor build
pub const RO_PREFIX: &str = "ro.vendor.fingerprint.";

/// Property keys
pub mod keys {
    pub const TYPE: &str = "type";
    pub const SENSOR_ID: &str = "sensor_id";
    pub const SENSOR_STRENGTH: &str = "sensor_strength";
    pub const SENSOR_LOCATION: &str = "sensor_location";
    pub const NAVIGATION_GESTURE: &str = "navigation_gesture";
    pub const DETECT_INTERACTION: &str = "detect_interaction";
    pub const LOCKOUT_TIMED_THRESHOLD: &str = "lockout_timed_threshold";
    pub const LOCKOUT_TIMED_DURATION: &str = "lockout_timed_duration";
    pub const LOCKOUT_PERMANENT_THRESHOLD: &str = "lockout_permanent_threshold";
}

const DEFAULTS: &[(&str, &str)] = &[
    (keys::TYPE, ""),
    (keys::SENSOR_ID, "0"),
    (keys::SENSOR_STRENGTH, "2"),
    (keys::SENSOR_LOCATION, ""),
    (keys::NAVIGATION_GESTURE, "false"),
    (keys::DETECT_INTERACTION, "false"),
    (keys::LOCKOUT_TIMED_THRESHOLD, "5"),
    (keys::LOCKOUT_TIMED_DURATION, "10000"),
    (keys::LOCKOUT_PERMANENT_THRESHOLD, "20"),
];

/// Built-in default for `key`
pub fn default_value(key: &str) -> Option<&'static str> {
    DEFAULTS.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
}

/// Parse a property boolean the way `android::base::ParseBool` does
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim() {
        "1" | "y" | "yes" | "on" | "true" => Some(true),
        "0" | "n" | "no" | "off" | "false" => Some(false),
        _ => None,
    }
}

/// Layered property lookup
#[derive(Default)]
pub struct FingerprintConfig {
    sources: Vec<Box<dyn PropertySource>>,
}

impl std::fmt::Debug for FingerprintConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FingerprintConfig")
            .field(
                "sources",
                &self.sources.iter().map(|s| s.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl FingerprintConfig {
    /// A config with no sources; every key resolves to its default
    pub fn new() -> Self {
        Self::default()
    }

    /// Device configuration: system properties only
    pub fn system() -> Self {
        Self::new().with_source(SystemProperties)
    }

    /// Append a source; earlier sources take precedence
    pub fn with_source(mut self, source: impl PropertySource + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    /// Raw value of `key`, without defaults
    pub fn lookup(&self, key: &str) -> Option<String> {
        let candidates = [
            format!("{PERSIST_PREFIX}{key}"),
            format!("{RO_PREFIX}{key}"),
            key.to_string(),
        ];

        candidates.iter().find_map(|name| {
            self.sources.iter().find_map(|source| {
                source.get(name).filter(|v| !v.is_empty()).inspect(|v| {
                    tracing::trace!("{} = {:?} (from {})", name, v, source.name())
                })
            })
        })
    }

    pub fn get_string(&self, key: &str) -> String {
        self.lookup(key)
            .or_else(|| default_value(key).map(str::to_string))
            .unwrap_or_default()
    }

    pub fn get_i32(&self, key: &str) -> i32 {
        let fallback = default_value(key)
            .and_then(|v| v.parse().ok())
            .unwrap_or_default();

        match self.lookup(key) {
            Some(value) => value.trim().parse().unwrap_or_else(|_| {
                tracing::warn!(
                    "Ignoring non-integer value {:?} for {}, using {}",
                    value,
                    key,
                    fallback
                );
                fallback
            }),
            None => fallback,
        }
    }

    pub fn get_bool(&self, key: &str) -> bool {
        let fallback = default_value(key).and_then(parse_bool).unwrap_or(false);

        match self.lookup(key) {
            Some(value) => parse_bool(&value).unwrap_or_else(|| {
                tracing::warn!(
                    "Ignoring non-boolean value {:?} for {}, using {}",
                    value,
                    key,
                    fallback
                );
                fallback
            }),
            None => fallback,
        }
    }

    /// Sensor type from the `type` key
    pub fn sensor_type(&self) -> Result<FingerprintSensorType> {
        FingerprintSensorType::from_property(&self.get_string(keys::TYPE))
    }

    /// Sensor locations from the `sensor_location` key
    pub fn sensor_locations(&self) -> Vec<SensorLocation> {
        parse_sensor_locations(&self.get_string(keys::SENSOR_LOCATION))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = FingerprintConfig::new();

        assert_eq!(config.get_string(keys::TYPE), "");
        assert_eq!(config.get_i32(keys::SENSOR_ID), 0);
        assert_eq!(config.get_i32(keys::SENSOR_STRENGTH), 2);
        assert!(!config.get_bool(keys::NAVIGATION_GESTURE));
        assert!(!config.get_bool(keys::DETECT_INTERACTION));
        assert_eq!(config.get_i32(keys::LOCKOUT_TIMED_THRESHOLD), 5);
        assert_eq!(config.get_i32(keys::LOCKOUT_TIMED_DURATION), 10_000);
        assert_eq!(config.get_i32(keys::LOCKOUT_PERMANENT_THRESHOLD), 20);
        assert!(config.sensor_locations().is_empty());
    }

    #[test]
    fn test_unknown_key_without_default() {
        let config = FingerprintConfig::new();
        assert_eq!(config.get_string("nope"), "");
        assert_eq!(config.get_i32("nope"), 0);
        assert!(!config.get_bool("nope"));
    }

    #[test]
    fn test_persist_overrides_ro() {
        let config = FingerprintConfig::new().with_source(
            MapProperties::new()
                .with("ro.vendor.fingerprint.type", "rear")
                .with("persist.vendor.fingerprint.type", "side"),
        );

        assert_eq!(
            config.sensor_type().unwrap(),
            FingerprintSensorType::PowerButton
        );
    }

    #[test]
    fn test_prefixed_key_beats_earlier_bare_key() {
        let config = FingerprintConfig::new()
            .with_source(MapProperties::new().with("sensor_id", "1"))
            .with_source(MapProperties::new().with("ro.vendor.fingerprint.sensor_id", "2"));

        assert_eq!(config.get_i32(keys::SENSOR_ID), 2);
    }

    #[test]
    fn test_earlier_source_wins() {
        let config = FingerprintConfig::new()
            .with_source(MapProperties::new().with("sensor_id", "1"))
            .with_source(MapProperties::new().with("sensor_id", "2"));

        assert_eq!(config.get_i32(keys::SENSOR_ID), 1);
    }

    #[test]
    fn test_empty_value_is_unset() {
        let config = FingerprintConfig::new()
            .with_source(MapProperties::new().with("persist.vendor.fingerprint.sensor_id", ""))
            .with_source(MapProperties::new().with("ro.vendor.fingerprint.sensor_id", "7"));

        assert_eq!(config.get_i32(keys::SENSOR_ID), 7);
    }

    #[test]
    fn test_bad_values_fall_back_to_default() {
        let config = FingerprintConfig::new().with_source(
            MapProperties::new()
                .with("sensor_strength", "strong")
                .with("navigation_gesture", "maybe"),
        );

        assert_eq!(config.get_i32(keys::SENSOR_STRENGTH), 2);
        assert!(!config.get_bool(keys::NAVIGATION_GESTURE));
    }

    #[test]
    fn test_parse_bool() {
        for v in ["1", "y", "yes", "on", "true"] {
            assert_eq!(parse_bool(v), Some(true), "{v}");
        }
        for v in ["0", "n", "no", "off", "false"] {
            assert_eq!(parse_bool(v), Some(false), "{v}");
        }
        assert_eq!(parse_bool("TRUE"), None);
    }

    #[test]
    fn test_sensor_locations_from_config() {
        let config = FingerprintConfig::new().with_source(
            MapProperties::new().with("ro.vendor.fingerprint.sensor_location", "10|20|30|local:1"),
        );

        let locations = config.sensor_locations();
        assert_eq!(locations.len(), 1);
        assert_eq!(locations[0].sensor_radius, 30);
        assert_eq!(locations[0].display, "local:1");
    }

    #[test]
    fn test_missing_type_is_an_error() {
        let config = FingerprintConfig::new();
        assert!(matches!(
            config.sensor_type(),
            Err(ConfigError::UnsupportedSensorType(_))
        ));
    }

    #[test]
    fn test_debug_lists_sources() {
        let config = FingerprintConfig::system().with_source(MapProperties::new());
        assert_eq!(
            format!("{config:?}"),
            "FingerprintConfig { sources: [\"sysprop\", \"map\"] }"
        );
    }
}
