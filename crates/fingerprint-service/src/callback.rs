//! Client callback of a session, shaped after `ISessionCallback`

use crate::types::{AcquiredInfo, FingerprintError, HardwareAuthToken};

pub trait SessionCallback: Send + Sync {
    fn on_challenge_generated(&self, challenge: i64);
    fn on_challenge_revoked(&self, challenge: i64);
    fn on_acquired(&self, info: AcquiredInfo, vendor_code: i32);
    fn on_error(&self, error: FingerprintError, vendor_code: i32);
    fn on_enrollment_progress(&self, enrollment_id: i32, remaining: i32);
    fn on_authentication_succeeded(&self, enrollment_id: i32, hat: &HardwareAuthToken);
    fn on_authentication_failed(&self);
    fn on_lockout_timed(&self, duration_millis: i64);
    fn on_lockout_permanent(&self);
    fn on_lockout_cleared(&self);
    fn on_interaction_detected(&self);
    fn on_enrollments_enumerated(&self, enrollment_ids: &[i32]);
    fn on_enrollments_removed(&self, enrollment_ids: &[i32]);
    fn on_authenticator_id_retrieved(&self, authenticator_id: i64);
    fn on_authenticator_id_invalidated(&self, new_authenticator_id: i64);
    fn on_session_closed(&self);
}
