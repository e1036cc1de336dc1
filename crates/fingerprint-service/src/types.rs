//! Types shaped after the `android.hardware.biometrics.fingerprint` and
//! `android.hardware.biometrics.common` AIDL parcelables

use serde::Serialize;

use fingerprint_config::ConfigError;
pub use fingerprint_config::{FingerprintSensorType, SensorLocation};
pub use fingerprint_hal::HardwareAuthToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SensorStrength {
    Convenience = 0,
    Weak = 1,
    Strong = 2,
}

impl TryFrom<i32> for SensorStrength {
    type Error = ConfigError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(SensorStrength::Convenience),
            1 => Ok(SensorStrength::Weak),
            2 => Ok(SensorStrength::Strong),
            other => Err(ConfigError::Invalid(format!("sensor_strength {other}"))),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentInfo {
    pub component_id: String,
    pub hardware_version: String,
    pub firmware_version: String,
    pub serial_number: String,
    pub software_version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommonProps {
    pub sensor_id: i32,
    pub sensor_strength: SensorStrength,
    pub max_enrollments_per_user: i32,
    pub component_info: Vec<ComponentInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TouchDetectionParameters {
    pub target_size: f32,
    pub min_overlap: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorProps {
    pub common_props: CommonProps,
    pub sensor_type: FingerprintSensorType,
    pub sensor_locations: Vec<SensorLocation>,
    pub supports_navigation_gestures: bool,
    pub supports_detect_interaction: bool,
    pub hal_handles_display_touches: bool,
    pub hal_controls_illumination: bool,
    pub touch_detection_parameters: Option<TouchDetectionParameters>,
}

/// `AcquiredInfo`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquiredInfo {
    Unknown = 0,
    Good = 1,
    Partial = 2,
    Insufficient = 3,
    SensorDirty = 4,
    TooSlow = 5,
    TooFast = 6,
    Vendor = 7,
    Start = 8,
}

/// `Error` reported through `onError`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FingerprintError {
    Unknown = 0,
    HwUnavailable = 1,
    UnableToProcess = 2,
    Timeout = 3,
    NoSpace = 4,
    Canceled = 5,
    UnableToRemove = 6,
    Vendor = 7,
}
