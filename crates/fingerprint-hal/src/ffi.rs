//! Raw ABI of the legacy fingerprint hardware module
//!
//! Layouts mirror `hardware/hardware.h`, `hardware/fingerprint.h` and
//! `hardware/hw_auth_token.h`. Field order and widths must not change.

use std::ffi::{CStr, c_char, c_int, c_void};

/// Module id passed to `hw_get_module`
pub const FINGERPRINT_HARDWARE_MODULE_ID: &CStr = c"fingerprint";

/// Encode a module API version the way `HARDWARE_MODULE_API_VERSION` does
pub const fn hardware_module_api_version(major: u16, minor: u16) -> u16 {
    ((major & 0xff) << 8) | (minor & 0xff)
}

/// The only device API version this service drives
pub const FINGERPRINT_MODULE_API_VERSION_2_1: u16 = hardware_module_api_version(2, 1);

/// `HARDWARE_MODULE_TAG` ('H' 'W' 'M' 'T')
pub const HARDWARE_MODULE_TAG: u32 = u32::from_be_bytes(*b"HWMT");

/// `HARDWARE_DEVICE_TAG` ('H' 'W' 'D' 'T')
pub const HARDWARE_DEVICE_TAG: u32 = u32::from_be_bytes(*b"HWDT");

pub const HW_AUTH_TOKEN_VERSION: u8 = 0;

#[repr(C)]
pub struct HwModuleMethods {
    pub open: Option<
        unsafe extern "C" fn(
            module: *const HwModule,
            id: *const c_char,
            device: *mut *mut HwDevice,
        ) -> c_int,
    >,
}

#[repr(C)]
pub struct HwModule {
    pub tag: u32,
    pub module_api_version: u16,
    pub hal_api_version: u16,
    pub id: *const c_char,
    pub name: *const c_char,
    pub author: *const c_char,
    pub methods: *const HwModuleMethods,
    pub dso: *mut c_void,
    pub reserved: [usize; 32 - 7],
}

#[repr(C)]
pub struct HwDevice {
    pub tag: u32,
    pub version: u32,
    pub module: *const HwModule,
    pub reserved: [usize; 12],
    pub close: Option<unsafe extern "C" fn(device: *mut HwDevice) -> c_int>,
}

/// `hw_auth_token_t`, packed to 69 bytes
#[repr(C, packed)]
#[derive(Clone, Copy, Debug, Default)]
pub struct HwAuthToken {
    pub version: u8,
    pub challenge: u64,
    pub user_id: u64,
    pub authenticator_id: u64,
    /// Network byte order
    pub authenticator_type: u32,
    /// Network byte order
    pub timestamp: u64,
    pub hmac: [u8; 32],
}

// fingerprint_msg_type_t
pub const FINGERPRINT_ERROR: c_int = -1;
pub const FINGERPRINT_ACQUIRED: c_int = 1;
pub const FINGERPRINT_TEMPLATE_ENROLLING: c_int = 3;
pub const FINGERPRINT_TEMPLATE_REMOVED: c_int = 4;
pub const FINGERPRINT_AUTHENTICATED: c_int = 5;
pub const FINGERPRINT_TEMPLATE_ENUMERATING: c_int = 6;

// fingerprint_error_t
pub const FINGERPRINT_ERROR_HW_UNAVAILABLE: c_int = 1;
pub const FINGERPRINT_ERROR_UNABLE_TO_PROCESS: c_int = 2;
pub const FINGERPRINT_ERROR_TIMEOUT: c_int = 3;
pub const FINGERPRINT_ERROR_NO_SPACE: c_int = 4;
pub const FINGERPRINT_ERROR_CANCELED: c_int = 5;
pub const FINGERPRINT_ERROR_UNABLE_TO_REMOVE: c_int = 6;
pub const FINGERPRINT_ERROR_LOCKOUT: c_int = 7;
pub const FINGERPRINT_ERROR_VENDOR_BASE: c_int = 1000;

// fingerprint_acquired_info_t
pub const FINGERPRINT_ACQUIRED_GOOD: c_int = 0;
pub const FINGERPRINT_ACQUIRED_PARTIAL: c_int = 1;
pub const FINGERPRINT_ACQUIRED_INSUFFICIENT: c_int = 2;
pub const FINGERPRINT_ACQUIRED_IMAGER_DIRTY: c_int = 3;
pub const FINGERPRINT_ACQUIRED_TOO_SLOW: c_int = 4;
pub const FINGERPRINT_ACQUIRED_TOO_FAST: c_int = 5;
pub const FINGERPRINT_ACQUIRED_DETECTED: c_int = 6;
pub const FINGERPRINT_ACQUIRED_VENDOR_BASE: c_int = 1000;

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FingerprintFingerId {
    pub gid: u32,
    pub fid: u32,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
pub struct FingerprintEnroll {
    pub finger: FingerprintFingerId,
    pub samples_remaining: u32,
    pub msg: u64,
}

/// Shared layout of `fingerprint_removed_t` and `fingerprint_enumerated_t`
#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
pub struct FingerprintIterator {
    pub finger: FingerprintFingerId,
    pub remaining_templates: u32,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
pub struct FingerprintAcquired {
    pub acquired_info: c_int,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
pub struct FingerprintAuthenticated {
    pub finger: FingerprintFingerId,
    pub hat: HwAuthToken,
}

#[repr(C)]
#[derive(Clone, Copy)]
pub union FingerprintMsgData {
    pub error: c_int,
    pub enroll: FingerprintEnroll,
    pub enumerated: FingerprintIterator,
    pub removed: FingerprintIterator,
    pub acquired: FingerprintAcquired,
    pub authenticated: FingerprintAuthenticated,
}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct FingerprintMsgRaw {
    pub msg_type: c_int,
    pub data: FingerprintMsgData,
}

/// `fingerprint_notify_t`
pub type FingerprintNotify = unsafe extern "C" fn(msg: *const FingerprintMsgRaw);

#[repr(C)]
pub struct FingerprintDeviceRaw {
    pub common: HwDevice,
    pub notify: Option<FingerprintNotify>,
    pub set_notify: Option<
        unsafe extern "C" fn(dev: *mut FingerprintDeviceRaw, notify: FingerprintNotify) -> c_int,
    >,
    pub pre_enroll: Option<unsafe extern "C" fn(dev: *mut FingerprintDeviceRaw) -> u64>,
    pub enroll: Option<
        unsafe extern "C" fn(
            dev: *mut FingerprintDeviceRaw,
            hat: *const HwAuthToken,
            gid: u32,
            timeout_sec: u32,
        ) -> c_int,
    >,
    pub post_enroll: Option<unsafe extern "C" fn(dev: *mut FingerprintDeviceRaw) -> c_int>,
    pub get_authenticator_id: Option<unsafe extern "C" fn(dev: *mut FingerprintDeviceRaw) -> u64>,
    pub cancel: Option<unsafe extern "C" fn(dev: *mut FingerprintDeviceRaw) -> c_int>,
    pub enumerate: Option<unsafe extern "C" fn(dev: *mut FingerprintDeviceRaw) -> c_int>,
    pub remove:
        Option<unsafe extern "C" fn(dev: *mut FingerprintDeviceRaw, gid: u32, fid: u32) -> c_int>,
    pub set_active_group: Option<
        unsafe extern "C" fn(
            dev: *mut FingerprintDeviceRaw,
            gid: u32,
            store_path: *const c_char,
        ) -> c_int,
    >,
    pub authenticate: Option<
        unsafe extern "C" fn(dev: *mut FingerprintDeviceRaw, operation_id: u64, gid: u32) -> c_int,
    >,
    pub reserved: [*mut c_void; 4],
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::size_of;

    #[test]
    fn test_module_api_version() {
        assert_eq!(FINGERPRINT_MODULE_API_VERSION_2_1, 0x0201);
        assert_eq!(hardware_module_api_version(1, 0), 0x0100);
    }

    #[test]
    fn test_auth_token_is_packed() {
        assert_eq!(size_of::<HwAuthToken>(), 69);
    }

    #[test]
    fn test_hw_structs_fill_reserved_space() {
        let word = size_of::<usize>();
        assert_eq!(size_of::<HwModule>(), 8 + 30 * word);
        assert_eq!(size_of::<HwDevice>(), 8 + 14 * word);
    }

    #[test]
    fn test_tags() {
        assert_eq!(HARDWARE_MODULE_TAG, 0x48574d54);
        assert_eq!(HARDWARE_DEVICE_TAG, 0x48574454);
    }
}
