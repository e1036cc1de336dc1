//! Module loading and the fingerprint device handle
//!
//! Opens the vendor `fingerprint` module through a [`ModuleLoader`], checks the
//! device API version, registers the notify callback and wraps the resulting
//! `fingerprint_device_t` so the rest of the service never touches raw
//! function pointers.

use std::ffi::{CStr, CString, c_int};
use std::ptr::{self, NonNull};
use thiserror::Error;

use crate::ffi::{
    FINGERPRINT_HARDWARE_MODULE_ID, FINGERPRINT_MODULE_API_VERSION_2_1, FingerprintDeviceRaw,
    FingerprintNotify, HwAuthToken, HwDevice, HwModule,
};

#[derive(Debug, Error)]
pub enum HalError {
    #[error("Can't open fingerprint HW module {id}, error: {code}")]
    ModuleNotFound { id: String, code: i32 },

    #[error("No valid open method")]
    NoOpenMethod,

    #[error("Can't open fingerprint methods, error: {0}")]
    OpenFailed(i32),

    #[error("Module returned no device")]
    NoDevice,

    #[error("Wrong fp version. Expected {expected}, got {actual}")]
    VersionMismatch { expected: u32, actual: u32 },

    #[error("Can't register fingerprint module callback, error: {0}")]
    NotifyRegistrationFailed(i32),

    #[error("Device does not implement {0}")]
    MissingMethod(&'static str),

    #[error("{op} failed, error: {code}")]
    Call { op: &'static str, code: i32 },

    #[error("Invalid store path: {0}")]
    InvalidPath(String),
}

/// Resolves a hardware module by id, as `hw_get_module` does
pub trait ModuleLoader {
    fn get_module(&self, id: &CStr) -> Result<NonNull<HwModule>, HalError>;
}

/// Loader backed by the platform `libhardware`
#[cfg(feature = "libhardware")]
#[derive(Debug, Default, Clone, Copy)]
pub struct LibHardware;

#[cfg(feature = "libhardware")]
#[link(name = "hardware")]
unsafe extern "C" {
    fn hw_get_module(id: *const std::ffi::c_char, module: *mut *const HwModule) -> c_int;
}

#[cfg(feature = "libhardware")]
impl ModuleLoader for LibHardware {
    fn get_module(&self, id: &CStr) -> Result<NonNull<HwModule>, HalError> {
        let mut module: *const HwModule = ptr::null();
        // SAFETY: `id` is NUL-terminated and `module` is a valid out pointer.
        let code = unsafe { hw_get_module(id.as_ptr(), &mut module) };
        if code != 0 {
            return Err(HalError::ModuleNotFound {
                id: id.to_string_lossy().into_owned(),
                code,
            });
        }
        NonNull::new(module.cast_mut()).ok_or(HalError::ModuleNotFound {
            id: id.to_string_lossy().into_owned(),
            code: 0,
        })
    }
}

/// An open `fingerprint_device_t`
///
/// Closed through `common.close` on drop.
pub struct FingerprintDevice {
    raw: NonNull<FingerprintDeviceRaw>,
    version: u32,
}

// SAFETY: the legacy HAL contract lets the framework call into the device from
// any binder thread; the module serializes internally.
unsafe impl Send for FingerprintDevice {}
unsafe impl Sync for FingerprintDevice {}

impl std::fmt::Debug for FingerprintDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FingerprintDevice")
            .field("raw", &self.raw)
            .field("version", &format_args!("{:#06x}", self.version))
            .finish()
    }
}

impl FingerprintDevice {
    /// Open the fingerprint module and register `notify` for its events
    pub fn open(loader: &dyn ModuleLoader, notify: FingerprintNotify) -> Result<Self, HalError> {
        tracing::debug!("Opening fingerprint hal library...");

        let module = loader
            .get_module(FINGERPRINT_HARDWARE_MODULE_ID)
            .inspect_err(|e| tracing::error!("{}", e))?;

        // SAFETY: the loader returns a live module descriptor.
        let open = unsafe { module.as_ref().methods.as_ref() }
            .and_then(|methods| methods.open)
            .ok_or_else(|| {
                tracing::error!("No valid open method");
                HalError::NoOpenMethod
            })?;

        let mut device: *mut HwDevice = ptr::null_mut();
        // SAFETY: `open` comes from the module and receives valid pointers.
        let code = unsafe { open(module.as_ptr(), ptr::null(), &mut device) };
        if code != 0 {
            tracing::error!("Can't open fingerprint methods, error: {}", code);
            return Err(HalError::OpenFailed(code));
        }

        let device = NonNull::new(device).ok_or_else(|| {
            tracing::error!("Fingerprint module returned no device");
            HalError::NoDevice
        })?;

        // SAFETY: `device` was just produced by `open`.
        let version = unsafe { device.as_ref().version };

        // From here on, dropping `handle` closes the device on every error path.
        let handle = Self {
            raw: device.cast(),
            version,
        };

        let expected = u32::from(FINGERPRINT_MODULE_API_VERSION_2_1);
        if version != expected {
            tracing::error!("Wrong fp version. Expected {}, got {}", expected, version);
            return Err(HalError::VersionMismatch {
                expected,
                actual: version,
            });
        }

        let set_notify = handle
            .method(|d| d.set_notify, "set_notify")
            .inspect_err(|e| tracing::error!("{}", e))?;
        // SAFETY: the device is open and `notify` has the expected signature.
        let code = unsafe { set_notify(handle.raw.as_ptr(), notify) };
        if code != 0 {
            tracing::error!("Can't register fingerprint module callback, error: {}", code);
            return Err(HalError::NotifyRegistrationFailed(code));
        }

        tracing::info!("Opened fingerprint device, version {:#06x}", version);
        Ok(handle)
    }

    /// Reported device API version
    pub fn version(&self) -> u32 {
        self.version
    }

    fn method<F>(
        &self,
        select: impl FnOnce(&FingerprintDeviceRaw) -> Option<F>,
        name: &'static str,
    ) -> Result<F, HalError> {
        // SAFETY: `raw` stays valid until drop.
        select(unsafe { self.raw.as_ref() }).ok_or(HalError::MissingMethod(name))
    }

    fn check(op: &'static str, code: c_int) -> Result<(), HalError> {
        if code == 0 {
            Ok(())
        } else {
            tracing::error!("{} failed, error: {}", op, code);
            Err(HalError::Call { op, code })
        }
    }

    /// Generate a challenge for enrollment (`pre_enroll`)
    pub fn pre_enroll(&self) -> Result<u64, HalError> {
        let f = self.method(|d| d.pre_enroll, "pre_enroll")?;
        // SAFETY: the device is open.
        Ok(unsafe { f(self.raw.as_ptr()) })
    }

    pub fn enroll(&self, hat: &HwAuthToken, gid: u32, timeout_sec: u32) -> Result<(), HalError> {
        let f = self.method(|d| d.enroll, "enroll")?;
        // SAFETY: the device is open and `hat` outlives the call.
        Self::check("enroll", unsafe { f(self.raw.as_ptr(), hat, gid, timeout_sec) })
    }

    /// Invalidate the enrollment challenge (`post_enroll`)
    pub fn post_enroll(&self) -> Result<(), HalError> {
        let f = self.method(|d| d.post_enroll, "post_enroll")?;
        // SAFETY: the device is open.
        Self::check("post_enroll", unsafe { f(self.raw.as_ptr()) })
    }

    pub fn authenticator_id(&self) -> Result<u64, HalError> {
        let f = self.method(|d| d.get_authenticator_id, "get_authenticator_id")?;
        // SAFETY: the device is open.
        Ok(unsafe { f(self.raw.as_ptr()) })
    }

    pub fn cancel(&self) -> Result<(), HalError> {
        let f = self.method(|d| d.cancel, "cancel")?;
        // SAFETY: the device is open.
        Self::check("cancel", unsafe { f(self.raw.as_ptr()) })
    }

    pub fn enumerate(&self) -> Result<(), HalError> {
        let f = self.method(|d| d.enumerate, "enumerate")?;
        // SAFETY: the device is open.
        Self::check("enumerate", unsafe { f(self.raw.as_ptr()) })
    }

    /// Remove one template; `fid == 0` removes every template of the group
    pub fn remove(&self, gid: u32, fid: u32) -> Result<(), HalError> {
        let f = self.method(|d| d.remove, "remove")?;
        // SAFETY: the device is open.
        Self::check("remove", unsafe { f(self.raw.as_ptr(), gid, fid) })
    }

    pub fn set_active_group(&self, gid: u32, store_path: &str) -> Result<(), HalError> {
        let f = self.method(|d| d.set_active_group, "set_active_group")?;
        let path =
            CString::new(store_path).map_err(|_| HalError::InvalidPath(store_path.to_string()))?;
        // SAFETY: the device is open and `path` outlives the call.
        Self::check("set_active_group", unsafe {
            f(self.raw.as_ptr(), gid, path.as_ptr())
        })
    }

    pub fn authenticate(&self, operation_id: u64, gid: u32) -> Result<(), HalError> {
        let f = self.method(|d| d.authenticate, "authenticate")?;
        // SAFETY: the device is open.
        Self::check("authenticate", unsafe {
            f(self.raw.as_ptr(), operation_id, gid)
        })
    }
}

impl Drop for FingerprintDevice {
    fn drop(&mut self) {
        tracing::trace!("Closing fingerprint device");
        // SAFETY: `raw` is the open device; it is not used after this.
        let close = unsafe { self.raw.as_ref().common.close };
        let Some(close) = close else {
            tracing::error!("Fingerprint device has no close method");
            return;
        };
        // SAFETY: `common` is the first field, so the pointer is a valid `hw_device_t`.
        let code = unsafe { close(self.raw.as_ptr().cast::<HwDevice>()) };
        if code != 0 {
            tracing::error!("Can't close fingerprint module, error: {}", code);
        }
    }
}
