//! Legacy fingerprint hardware module bindings
//!
//! This crate wraps the vendor `fingerprint` module that the OS module loader
//! resolves by id. It exposes the raw ABI, a version-gated device handle and
//! owned message types for the module's asynchronous notifications.
//!
//! # Example
//!
//! ```no_run
//! use fingerprint_hal::mock::MockModule;
//! use fingerprint_hal::FingerprintDevice;
//!
//! unsafe extern "C" fn notify(_msg: *const fingerprint_hal::ffi::FingerprintMsgRaw) {}
//!
//! fn main() -> fingerprint_hal::Result<()> {
//!     let module = MockModule::new();
//!     let device = FingerprintDevice::open(&module, notify)?;
//!     println!("Device version: {:#06x}", device.version());
//!     Ok(())
//! }
//! ```

pub mod device;
pub mod ffi;
pub mod message;
pub mod mock;
pub mod token;

#[cfg(feature = "libhardware")]
pub use device::LibHardware;
pub use device::{FingerprintDevice, HalError, ModuleLoader};
pub use message::{FingerId, FingerprintMsg};
pub use token::{AUTHENTICATOR_TYPE_FINGERPRINT, HardwareAuthToken};

/// HAL Result type
pub type Result<T> = std::result::Result<T, HalError>;
