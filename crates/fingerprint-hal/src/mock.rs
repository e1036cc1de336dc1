//! Mock fingerprint module for testing without vendor hardware
//!
//! The mock implements the real C ABI: `MockModule` hands out an `hw_module_t`
//! whose `open` produces a `fingerprint_device_t` backed by `extern "C"`
//! functions. Everything above the loader runs unmodified against it.
//!
//! # Usage
//!
//! ```no_run
//! use fingerprint_hal::mock::MockModule;
//! use fingerprint_hal::{FingerprintDevice, FingerprintMsg};
//!
//! unsafe extern "C" fn notify(_msg: *const fingerprint_hal::ffi::FingerprintMsgRaw) {}
//!
//! let module = MockModule::new();
//! let device = FingerprintDevice::open(&module, notify).unwrap();
//!
//! // Pretend the sensor saw a finger
//! module.state().emit(&FingerprintMsg::Acquired { info: 0 });
//! ```

use std::ffi::{CStr, c_char, c_int};
use std::ptr::{self, NonNull};
use std::sync::{Arc, RwLock};

use crate::device::{HalError, ModuleLoader};
use crate::ffi::{
    FINGERPRINT_HARDWARE_MODULE_ID, FINGERPRINT_MODULE_API_VERSION_2_1, FingerprintDeviceRaw,
    FingerprintNotify, HARDWARE_DEVICE_TAG, HARDWARE_MODULE_TAG, HwAuthToken, HwDevice, HwModule,
    HwModuleMethods,
};
use crate::message::FingerprintMsg;
use crate::token::HardwareAuthToken;

/// A call the mock device received
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    SetNotify,
    PreEnroll,
    Enroll {
        token: HardwareAuthToken,
        gid: u32,
        timeout_sec: u32,
    },
    PostEnroll,
    GetAuthenticatorId,
    Cancel,
    Enumerate,
    Remove {
        gid: u32,
        fid: u32,
    },
    SetActiveGroup {
        gid: u32,
        path: String,
    },
    Authenticate {
        operation_id: u64,
        gid: u32,
    },
}

#[derive(Debug)]
struct MockInner {
    device_version: u32,
    open_result: c_int,
    set_notify_result: c_int,
    call_result: c_int,
    challenge: u64,
    authenticator_id: u64,
    closed: bool,
    notify: Option<FingerprintNotify>,
    on_set_active_group: Option<FingerprintMsg>,
    has_set_notify: bool,
    calls: Vec<MockCall>,
}

impl Default for MockInner {
    fn default() -> Self {
        Self {
            device_version: u32::from(FINGERPRINT_MODULE_API_VERSION_2_1),
            open_result: 0,
            set_notify_result: 0,
            call_result: 0,
            challenge: 0x5eed_c0de,
            authenticator_id: 0xa11ce,
            closed: false,
            notify: None,
            on_set_active_group: None,
            has_set_notify: true,
            calls: Vec::new(),
        }
    }
}

/// Shared state of a mock module and the device it opened
///
/// Tests use it to inject failures, inspect calls and fire notifications.
#[derive(Debug, Default)]
pub struct MockState {
    inner: RwLock<MockInner>,
}

impl MockState {
    fn read<T>(&self, f: impl FnOnce(&MockInner) -> T) -> T {
        match self.inner.read() {
            Ok(inner) => f(&inner),
            Err(poisoned) => f(&poisoned.into_inner()),
        }
    }

    fn write<T>(&self, f: impl FnOnce(&mut MockInner) -> T) -> T {
        match self.inner.write() {
            Ok(mut inner) => f(&mut inner),
            Err(poisoned) => f(&mut poisoned.into_inner()),
        }
    }

    fn record(&self, call: MockCall) -> c_int {
        tracing::debug!("[MOCK] {:?}", call);
        self.write(|s| {
            s.calls.push(call);
            s.call_result
        })
    }

    /// Version the next opened device reports
    pub fn set_device_version(&self, version: u32) {
        self.write(|s| s.device_version = version);
    }

    /// Return code of the module's `open`
    pub fn set_open_result(&self, code: i32) {
        self.write(|s| s.open_result = code);
    }

    /// Return code of `set_notify`
    pub fn set_notify_result(&self, code: i32) {
        self.write(|s| s.set_notify_result = code);
    }

    /// Open devices without a `set_notify` entry point
    pub fn remove_set_notify(&self) {
        self.write(|s| s.has_set_notify = false);
    }

    /// Return code of every other device call
    pub fn set_call_result(&self, code: i32) {
        self.write(|s| s.call_result = code);
    }

    pub fn set_challenge(&self, challenge: u64) {
        self.write(|s| s.challenge = challenge);
    }

    pub fn set_authenticator_id(&self, id: u64) {
        self.write(|s| s.authenticator_id = id);
    }

    /// Deliver `msg` synchronously from inside `set_active_group`, as some
    /// vendor modules do
    pub fn notify_on_set_active_group(&self, msg: FingerprintMsg) {
        self.write(|s| s.on_set_active_group = Some(msg));
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.read(|s| s.calls.clone())
    }

    pub fn clear_calls(&self) {
        self.write(|s| s.calls.clear());
    }

    pub fn is_closed(&self) -> bool {
        self.read(|s| s.closed)
    }

    pub fn has_notify(&self) -> bool {
        self.read(|s| s.notify.is_some())
    }

    /// Deliver `msg` through the registered callback, as the vendor thread would.
    ///
    /// Returns `false` when no callback is registered.
    pub fn emit(&self, msg: &FingerprintMsg) -> bool {
        let Some(notify) = self.read(|s| s.notify) else {
            tracing::debug!("[MOCK] No notify callback registered, dropping {:?}", msg);
            return false;
        };
        let raw = msg.to_raw();
        // SAFETY: `raw` lives for the duration of the callback.
        unsafe { notify(&raw) };
        true
    }
}

#[repr(C)]
struct MockModuleRaw {
    common: HwModule,
    state: Arc<MockState>,
}

#[repr(C)]
struct MockDeviceRaw {
    device: FingerprintDeviceRaw,
    state: Arc<MockState>,
}

static MOCK_METHODS: HwModuleMethods = HwModuleMethods {
    open: Some(mock_open),
};

/// Mock `fingerprint` hardware module
pub struct MockModule {
    raw: Box<MockModuleRaw>,
}

impl MockModule {
    pub fn new() -> Self {
        Self::with_methods(&MOCK_METHODS)
    }

    /// A module whose `methods` table is missing
    pub fn without_methods() -> Self {
        Self::with_methods(ptr::null())
    }

    fn with_methods(methods: *const HwModuleMethods) -> Self {
        let raw = Box::new(MockModuleRaw {
            common: HwModule {
                tag: HARDWARE_MODULE_TAG,
                module_api_version: FINGERPRINT_MODULE_API_VERSION_2_1,
                hal_api_version: 0,
                id: FINGERPRINT_HARDWARE_MODULE_ID.as_ptr(),
                name: c"Mock fingerprint HAL".as_ptr(),
                author: c"fingerprint-hal".as_ptr(),
                methods,
                dso: ptr::null_mut(),
                reserved: [0; 32 - 7],
            },
            state: Arc::new(MockState::default()),
        });
        Self { raw }
    }

    /// Shared state, also held by any device this module opened
    pub fn state(&self) -> Arc<MockState> {
        Arc::clone(&self.raw.state)
    }
}

impl Default for MockModule {
    fn default() -> Self {
        Self::new()
    }
}

impl ModuleLoader for MockModule {
    fn get_module(&self, id: &CStr) -> Result<NonNull<HwModule>, HalError> {
        if id != FINGERPRINT_HARDWARE_MODULE_ID {
            return Err(HalError::ModuleNotFound {
                id: id.to_string_lossy().into_owned(),
                code: -libc::ENOENT,
            });
        }
        Ok(NonNull::from(&self.raw.common))
    }
}

/// Recover the mock state from a device pointer handed back by the caller
///
/// # Safety
///
/// `dev` must come from `mock_open` and not be closed yet.
unsafe fn state_of<'a>(dev: *mut FingerprintDeviceRaw) -> &'a MockState {
    // SAFETY: `device` is the first field of the `repr(C)` `MockDeviceRaw`.
    unsafe { &(*dev.cast::<MockDeviceRaw>()).state }
}

unsafe extern "C" fn mock_open(
    module: *const HwModule,
    _id: *const c_char,
    device: *mut *mut HwDevice,
) -> c_int {
    // SAFETY: `common` is the first field of the `repr(C)` `MockModuleRaw`.
    let state = unsafe { Arc::clone(&(*module.cast::<MockModuleRaw>()).state) };

    let (open_result, version, has_set_notify) =
        state.read(|s| (s.open_result, s.device_version, s.has_set_notify));
    if open_result != 0 {
        return open_result;
    }
    state.write(|s| s.closed = false);

    let raw = Box::new(MockDeviceRaw {
        device: FingerprintDeviceRaw {
            common: HwDevice {
                tag: HARDWARE_DEVICE_TAG,
                version,
                module,
                reserved: [0; 12],
                close: Some(mock_close),
            },
            notify: None,
            set_notify: if has_set_notify {
                Some(mock_set_notify)
            } else {
                None
            },
            pre_enroll: Some(mock_pre_enroll),
            enroll: Some(mock_enroll),
            post_enroll: Some(mock_post_enroll),
            get_authenticator_id: Some(mock_get_authenticator_id),
            cancel: Some(mock_cancel),
            enumerate: Some(mock_enumerate),
            remove: Some(mock_remove),
            set_active_group: Some(mock_set_active_group),
            authenticate: Some(mock_authenticate),
            reserved: [ptr::null_mut(); 4],
        },
        state,
    });

    // SAFETY: the caller passes a valid out pointer.
    unsafe { *device = Box::into_raw(raw).cast::<HwDevice>() };
    0
}

unsafe extern "C" fn mock_close(device: *mut HwDevice) -> c_int {
    // SAFETY: `device` was produced by `Box::into_raw` in `mock_open`.
    let raw = unsafe { Box::from_raw(device.cast::<MockDeviceRaw>()) };
    raw.state.write(|s| {
        s.closed = true;
        s.notify = None;
    });
    tracing::debug!("[MOCK] Device closed");
    0
}

unsafe extern "C" fn mock_set_notify(
    dev: *mut FingerprintDeviceRaw,
    notify: FingerprintNotify,
) -> c_int {
    // SAFETY: `dev` is an open mock device.
    let state = unsafe { state_of(dev) };
    let code = state.read(|s| s.set_notify_result);
    if code != 0 {
        return code;
    }
    // SAFETY: as above.
    unsafe { (*dev).notify = Some(notify) };
    state.write(|s| s.notify = Some(notify));
    state.record(MockCall::SetNotify);
    0
}

unsafe extern "C" fn mock_pre_enroll(dev: *mut FingerprintDeviceRaw) -> u64 {
    // SAFETY: `dev` is an open mock device.
    let state = unsafe { state_of(dev) };
    state.record(MockCall::PreEnroll);
    state.read(|s| s.challenge)
}

unsafe extern "C" fn mock_enroll(
    dev: *mut FingerprintDeviceRaw,
    hat: *const HwAuthToken,
    gid: u32,
    timeout_sec: u32,
) -> c_int {
    // SAFETY: `dev` is an open mock device and `hat` is valid or null.
    let (state, hat) = unsafe { (state_of(dev), hat.as_ref()) };
    let Some(hat) = hat else {
        return -libc::EINVAL;
    };
    state.record(MockCall::Enroll {
        token: HardwareAuthToken::from_legacy(hat),
        gid,
        timeout_sec,
    })
}

unsafe extern "C" fn mock_post_enroll(dev: *mut FingerprintDeviceRaw) -> c_int {
    // SAFETY: `dev` is an open mock device.
    unsafe { state_of(dev) }.record(MockCall::PostEnroll)
}

unsafe extern "C" fn mock_get_authenticator_id(dev: *mut FingerprintDeviceRaw) -> u64 {
    // SAFETY: `dev` is an open mock device.
    let state = unsafe { state_of(dev) };
    state.record(MockCall::GetAuthenticatorId);
    state.read(|s| s.authenticator_id)
}

unsafe extern "C" fn mock_cancel(dev: *mut FingerprintDeviceRaw) -> c_int {
    // SAFETY: `dev` is an open mock device.
    unsafe { state_of(dev) }.record(MockCall::Cancel)
}

unsafe extern "C" fn mock_enumerate(dev: *mut FingerprintDeviceRaw) -> c_int {
    // SAFETY: `dev` is an open mock device.
    unsafe { state_of(dev) }.record(MockCall::Enumerate)
}

unsafe extern "C" fn mock_remove(dev: *mut FingerprintDeviceRaw, gid: u32, fid: u32) -> c_int {
    // SAFETY: `dev` is an open mock device.
    unsafe { state_of(dev) }.record(MockCall::Remove { gid, fid })
}

unsafe extern "C" fn mock_set_active_group(
    dev: *mut FingerprintDeviceRaw,
    gid: u32,
    store_path: *const c_char,
) -> c_int {
    if store_path.is_null() {
        return -libc::EINVAL;
    }
    // SAFETY: `dev` is an open mock device and `store_path` is NUL-terminated.
    let (state, path) = unsafe { (state_of(dev), CStr::from_ptr(store_path)) };
    let code = state.record(MockCall::SetActiveGroup {
        gid,
        path: path.to_string_lossy().into_owned(),
    });
    if let Some(msg) = state.read(|s| s.on_set_active_group.clone()) {
        state.emit(&msg);
    }
    code
}

unsafe extern "C" fn mock_authenticate(
    dev: *mut FingerprintDeviceRaw,
    operation_id: u64,
    gid: u32,
) -> c_int {
    // SAFETY: `dev` is an open mock device.
    unsafe { state_of(dev) }.record(MockCall::Authenticate { operation_id, gid })
}
