//! Fingerprint HAL service
//!
//! Bridges the legacy `fingerprint` hardware module to a session API shaped
//! after the `IFingerprint`/`ISession` AIDL interfaces:
//!
//! - [`Fingerprint`] opens the module, reports [`SensorProps`] and creates sessions
//! - [`Session`] forwards client requests and translates module notifications
//! - [`notify`] routes the module's context-free callback to the open session

pub mod callback;
pub mod error;
pub mod fingerprint;
pub mod lockout;
pub mod notify;
pub mod session;
pub mod types;

#[cfg(test)]
mod test_utils;

pub use callback::SessionCallback;
pub use error::ServiceError;
pub use fingerprint::Fingerprint;
pub use lockout::{LockoutMode, LockoutPolicy, LockoutTracker};
pub use session::{CancellationSignal, Operation, Session};
pub use types::{
    AcquiredInfo, CommonProps, ComponentInfo, FingerprintError, FingerprintSensorType,
    HardwareAuthToken, SensorLocation, SensorProps, SensorStrength, TouchDetectionParameters,
};

/// Service Result type
pub type Result<T> = std::result::Result<T, ServiceError>;
