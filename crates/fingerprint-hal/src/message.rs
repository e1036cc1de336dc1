//! Notifications sent by the legacy module
//!
//! The module reports every asynchronous event through one C callback taking a
//! `fingerprint_msg_t`. `FingerprintMsg` is the owned, tagged form of that
//! message so nothing past the FFI boundary reads the union.

use crate::ffi::{
    self, FingerprintAcquired, FingerprintAuthenticated, FingerprintEnroll, FingerprintIterator,
    FingerprintMsgData, FingerprintMsgRaw,
};
use crate::token::HardwareAuthToken;

pub use crate::ffi::FingerprintFingerId as FingerId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FingerprintMsg {
    /// `fingerprint_error_t` value, vendor codes included
    Error { code: i32 },
    /// `fingerprint_acquired_info_t` value, vendor codes included
    Acquired { info: i32 },
    TemplateEnrolling {
        finger: FingerId,
        samples_remaining: u32,
    },
    TemplateRemoved {
        finger: FingerId,
        remaining_templates: u32,
    },
    /// `finger.fid == 0` means the presented finger did not match
    Authenticated {
        finger: FingerId,
        token: HardwareAuthToken,
    },
    TemplateEnumerating {
        finger: FingerId,
        remaining_templates: u32,
    },
}

impl FingerprintMsg {
    /// Decode a message handed to the notify callback.
    ///
    /// Returns `None` for a null pointer or an unknown message type.
    ///
    /// # Safety
    ///
    /// `msg` must be null or point to a valid `fingerprint_msg_t` for the
    /// duration of the call.
    pub unsafe fn from_raw(msg: *const FingerprintMsgRaw) -> Option<Self> {
        // SAFETY: the caller guarantees `msg` is null or valid.
        let msg = unsafe { msg.as_ref() }?;

        // SAFETY: each arm reads the union member selected by `msg_type`.
        let decoded = unsafe {
            match msg.msg_type {
                ffi::FINGERPRINT_ERROR => FingerprintMsg::Error {
                    code: msg.data.error,
                },
                ffi::FINGERPRINT_ACQUIRED => FingerprintMsg::Acquired {
                    info: msg.data.acquired.acquired_info,
                },
                ffi::FINGERPRINT_TEMPLATE_ENROLLING => FingerprintMsg::TemplateEnrolling {
                    finger: msg.data.enroll.finger,
                    samples_remaining: msg.data.enroll.samples_remaining,
                },
                ffi::FINGERPRINT_TEMPLATE_REMOVED => FingerprintMsg::TemplateRemoved {
                    finger: msg.data.removed.finger,
                    remaining_templates: msg.data.removed.remaining_templates,
                },
                ffi::FINGERPRINT_AUTHENTICATED => FingerprintMsg::Authenticated {
                    finger: msg.data.authenticated.finger,
                    token: HardwareAuthToken::from_legacy(&msg.data.authenticated.hat),
                },
                ffi::FINGERPRINT_TEMPLATE_ENUMERATING => FingerprintMsg::TemplateEnumerating {
                    finger: msg.data.enumerated.finger,
                    remaining_templates: msg.data.enumerated.remaining_templates,
                },
                other => {
                    tracing::warn!("Unknown fingerprint message type {}", other);
                    return None;
                }
            }
        };

        Some(decoded)
    }

    /// Encode back into the C layout, as a module would send it
    pub fn to_raw(&self) -> FingerprintMsgRaw {
        match *self {
            FingerprintMsg::Error { code } => FingerprintMsgRaw {
                msg_type: ffi::FINGERPRINT_ERROR,
                data: FingerprintMsgData { error: code },
            },
            FingerprintMsg::Acquired { info } => FingerprintMsgRaw {
                msg_type: ffi::FINGERPRINT_ACQUIRED,
                data: FingerprintMsgData {
                    acquired: FingerprintAcquired {
                        acquired_info: info,
                    },
                },
            },
            FingerprintMsg::TemplateEnrolling {
                finger,
                samples_remaining,
            } => FingerprintMsgRaw {
                msg_type: ffi::FINGERPRINT_TEMPLATE_ENROLLING,
                data: FingerprintMsgData {
                    enroll: FingerprintEnroll {
                        finger,
                        samples_remaining,
                        msg: 0,
                    },
                },
            },
            FingerprintMsg::TemplateRemoved {
                finger,
                remaining_templates,
            } => FingerprintMsgRaw {
                msg_type: ffi::FINGERPRINT_TEMPLATE_REMOVED,
                data: FingerprintMsgData {
                    removed: FingerprintIterator {
                        finger,
                        remaining_templates,
                    },
                },
            },
            FingerprintMsg::Authenticated { finger, token } => FingerprintMsgRaw {
                msg_type: ffi::FINGERPRINT_AUTHENTICATED,
                data: FingerprintMsgData {
                    authenticated: FingerprintAuthenticated {
                        finger,
                        hat: token.to_legacy(),
                    },
                },
            },
            FingerprintMsg::TemplateEnumerating {
                finger,
                remaining_templates,
            } => FingerprintMsgRaw {
                msg_type: ffi::FINGERPRINT_TEMPLATE_ENUMERATING,
                data: FingerprintMsgData {
                    enumerated: FingerprintIterator {
                        finger,
                        remaining_templates,
                    },
                },
            },
        }
    }
}
