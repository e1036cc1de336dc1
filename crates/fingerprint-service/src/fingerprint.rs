//! The `IFingerprint` service object
//!
//! Owns the opened legacy device, reports static sensor properties and hands
//! out at most one open [`Session`] at a time.

use std::sync::{Arc, Mutex};

use fingerprint_config::{FingerprintConfig, keys};
use fingerprint_hal::{FingerprintDevice, ModuleLoader};

use crate::callback::SessionCallback;
use crate::error::ServiceError;
use crate::lockout::{LockoutPolicy, LockoutTracker};
use crate::notify;
use crate::session::{Session, lock};
use crate::types::{
    CommonProps, ComponentInfo, FingerprintSensorType, SensorLocation, SensorProps,
    SensorStrength,
};

pub const MAX_ENROLLMENTS_PER_USER: i32 = 5;

const HW_COMPONENT_ID: &str = "fingerprintSensor";
const HW_VERSION: &str = "vendor/model/revision";
const FW_VERSION: &str = "1.01";
const SERIAL_NUMBER: &str = "00000001";
const SW_COMPONENT_ID: &str = "matchingAlgorithm";
const SW_VERSION: &str = "vendor/version/revision";

/// One log line with the sensor type and every location
fn describe_sensor(sensor_type: FingerprintSensorType, locations: &[SensorLocation]) -> String {
    let locations = locations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    format!("sensor type: {sensor_type}, location: {locations}")
}

pub struct Fingerprint {
    config: FingerprintConfig,
    sensor_type: FingerprintSensorType,
    device: Arc<FingerprintDevice>,
    lockout: Arc<Mutex<LockoutTracker>>,
    /// Serializes `create_session`; never held by the notification path
    create_lock: Mutex<()>,
    session: Mutex<Option<Arc<Session>>>,
}

impl std::fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fingerprint")
            .field("sensor_type", &self.sensor_type)
            .field("device_version", &self.device.version())
            .finish_non_exhaustive()
    }
}

impl Fingerprint {
    /// Open the legacy module and register as the notification receiver
    pub fn new(
        config: FingerprintConfig,
        loader: &dyn ModuleLoader,
    ) -> Result<Arc<Self>, ServiceError> {
        let sensor_type = config.sensor_type()?;
        let device = FingerprintDevice::open(loader, notify::hal_notify)?;
        let lockout = LockoutTracker::new(LockoutPolicy::from_config(&config));

        let instance = Arc::new(Self {
            config,
            sensor_type,
            device: Arc::new(device),
            lockout: Arc::new(Mutex::new(lockout)),
            create_lock: Mutex::new(()),
            session: Mutex::new(None),
        });
        notify::install(&instance);

        tracing::info!(
            "Fingerprint HAL ready, sensor type {}, device version {:#06x}",
            sensor_type,
            instance.device.version()
        );
        Ok(instance)
    }

    pub fn sensor_type(&self) -> FingerprintSensorType {
        self.sensor_type
    }

    pub fn get_sensor_props(&self) -> Result<Vec<SensorProps>, ServiceError> {
        let component_info = vec![
            ComponentInfo {
                component_id: HW_COMPONENT_ID.into(),
                hardware_version: HW_VERSION.into(),
                firmware_version: FW_VERSION.into(),
                serial_number: SERIAL_NUMBER.into(),
                software_version: String::new(),
            },
            ComponentInfo {
                component_id: SW_COMPONENT_ID.into(),
                software_version: SW_VERSION.into(),
                ..Default::default()
            },
        ];

        let common_props = CommonProps {
            sensor_id: self.config.get_i32(keys::SENSOR_ID),
            sensor_strength: SensorStrength::try_from(
                self.config.get_i32(keys::SENSOR_STRENGTH),
            )?,
            max_enrollments_per_user: MAX_ENROLLMENTS_PER_USER,
            component_info,
        };

        let sensor_locations = self.config.sensor_locations();
        tracing::info!("{}", describe_sensor(self.sensor_type, &sensor_locations));

        Ok(vec![SensorProps {
            common_props,
            sensor_type: self.sensor_type,
            sensor_locations,
            supports_navigation_gestures: self.config.get_bool(keys::NAVIGATION_GESTURE),
            supports_detect_interaction: self.config.get_bool(keys::DETECT_INTERACTION),
            hal_handles_display_touches: false,
            hal_controls_illumination: false,
            touch_detection_parameters: None,
        }])
    }

    /// Open a session for `user_id`, failing while another one is open
    pub fn create_session(
        &self,
        sensor_id: i32,
        user_id: i32,
        callback: Arc<dyn SessionCallback>,
    ) -> Result<Arc<Session>, ServiceError> {
        // The module may notify from inside `set_active_group`, so the slot
        // the router reads is only locked to read or publish.
        let _creating = lock(&self.create_lock);
        if self.current_session().is_some_and(|s| !s.is_closed()) {
            tracing::error!("Open session already exists!");
            return Err(ServiceError::SessionAlreadyOpen);
        }

        tracing::debug!("Creating session for sensor {}, user {}", sensor_id, user_id);
        let session = Session::new(
            Arc::clone(&self.device),
            user_id,
            callback,
            Arc::clone(&self.lockout),
            self.config.get_bool(keys::DETECT_INTERACTION),
        )?;
        *lock(&self.session) = Some(Arc::clone(&session));
        Ok(session)
    }

    pub fn current_session(&self) -> Option<Arc<Session>> {
        lock(&self.session).clone()
    }

}

impl Drop for Fingerprint {
    fn drop(&mut self) {
        notify::uninstall(self);
    }
}
