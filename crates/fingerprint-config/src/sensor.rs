//! Sensor type and sensor location
//!
//! Location entries are `x|y|radius` or `x|y|radius|display`, comma separated.
//! A bad entry is logged and skipped; the rest of the list still applies.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ConfigError;

/// `FingerprintSensorType`, with the AIDL discriminants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FingerprintSensorType {
    Unknown = -1,
    Rear = 0,
    UnderDisplayUltrasonic = 1,
    UnderDisplayOptical = 2,
    PowerButton = 3,
    HomeButton = 4,
}

impl FingerprintSensorType {
    /// AIDL enumerator name
    pub fn as_str(&self) -> &'static str {
        match self {
            FingerprintSensorType::Unknown => "UNKNOWN",
            FingerprintSensorType::Rear => "REAR",
            FingerprintSensorType::UnderDisplayUltrasonic => "UNDER_DISPLAY_ULTRASONIC",
            FingerprintSensorType::UnderDisplayOptical => "UNDER_DISPLAY_OPTICAL",
            FingerprintSensorType::PowerButton => "POWER_BUTTON",
            FingerprintSensorType::HomeButton => "HOME_BUTTON",
        }
    }

    /// Parse the `type` property
    pub fn from_property(value: &str) -> Result<Self, ConfigError> {
        match value.trim() {
            "side" => Ok(FingerprintSensorType::PowerButton),
            "home" => Ok(FingerprintSensorType::HomeButton),
            "rear" => Ok(FingerprintSensorType::Rear),
            "udfps" | "udfps_optical" => Ok(FingerprintSensorType::UnderDisplayOptical),
            "ultrasonic" | "udfps_ultrasonic" => Ok(FingerprintSensorType::UnderDisplayUltrasonic),
            other => Err(ConfigError::UnsupportedSensorType(other.to_string())),
        }
    }
}

impl fmt::Display for FingerprintSensorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sensor geometry reported for UI placement
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorLocation {
    /// Deprecated in favor of `display`, always 0
    pub display_id: i32,
    pub sensor_location_x: i32,
    pub sensor_location_y: i32,
    pub sensor_radius: i32,
    /// Display unique id; empty means the default display
    pub display: String,
}

impl fmt::Display for SensorLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SensorLocation{{displayId: {}, sensorLocationX: {}, sensorLocationY: {}, sensorRadius: {}, display: {}}}",
            self.display_id,
            self.sensor_location_x,
            self.sensor_location_y,
            self.sensor_radius,
            self.display
        )
    }
}

fn parse_entry(entry: &str) -> Result<SensorLocation, String> {
    let fields: Vec<&str> = entry.split('|').collect();
    if fields.len() != 3 && fields.len() != 4 {
        return Err(format!("expected 3 or 4 fields, got {}", fields.len()));
    }

    let int = |i: usize, what: &str| {
        fields[i]
            .trim()
            .parse::<i32>()
            .map_err(|_| format!("{what} is not an integer: {:?}", fields[i]))
    };

    let sensor_location_x = int(0, "x")?;
    let sensor_location_y = int(1, "y")?;
    let sensor_radius = int(2, "radius")?;

    let display = match fields.get(3) {
        Some(d) if d.trim().is_empty() => return Err("display is empty".to_string()),
        Some(d) => d.trim().to_string(),
        None => String::new(),
    };

    Ok(SensorLocation {
        display_id: 0,
        sensor_location_x,
        sensor_location_y,
        sensor_radius,
        display,
    })
}

/// Parse a `sensor_location` property value
pub fn parse_sensor_locations(value: &str) -> Vec<SensorLocation> {
    if value.is_empty() {
        return Vec::new();
    }

    value
        .split(',')
        .filter_map(|entry| match parse_entry(entry) {
            Ok(location) => Some(location),
            Err(reason) => {
                tracing::warn!(
                    "Invalid sensor location input (x|y|radius) or (x|y|radius|display): {:?} in {:?}: {}",
                    entry,
                    value,
                    reason
                );
                None
            }
        })
        .collect()
}
