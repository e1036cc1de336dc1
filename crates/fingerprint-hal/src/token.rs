//! Hardware auth tokens
//!
//! The session API carries `HardwareAuthToken` with host-order fields while the
//! legacy module expects a packed `hw_auth_token_t` whose authenticator type and
//! timestamp are big-endian.

use crate::ffi::{HW_AUTH_TOKEN_VERSION, HwAuthToken};

/// Authenticator type bit for fingerprint, as in `HardwareAuthenticatorType`
pub const AUTHENTICATOR_TYPE_FINGERPRINT: u32 = 1 << 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HardwareAuthToken {
    pub challenge: u64,
    pub user_id: u64,
    pub authenticator_id: u64,
    pub authenticator_type: u32,
    pub timestamp_ms: u64,
    pub mac: [u8; 32],
}

impl HardwareAuthToken {
    /// Convert to the packed legacy layout
    pub fn to_legacy(&self) -> HwAuthToken {
        HwAuthToken {
            version: HW_AUTH_TOKEN_VERSION,
            challenge: self.challenge,
            user_id: self.user_id,
            authenticator_id: self.authenticator_id,
            authenticator_type: self.authenticator_type.to_be(),
            timestamp: self.timestamp_ms.to_be(),
            hmac: self.mac,
        }
    }

    /// Convert from the packed legacy layout
    pub fn from_legacy(hat: &HwAuthToken) -> Self {
        // Fields are read by value; the struct is packed.
        Self {
            challenge: hat.challenge,
            user_id: hat.user_id,
            authenticator_id: hat.authenticator_id,
            authenticator_type: u32::from_be(hat.authenticator_type),
            timestamp_ms: u64::from_be(hat.timestamp),
            mac: hat.hmac,
        }
    }
}
