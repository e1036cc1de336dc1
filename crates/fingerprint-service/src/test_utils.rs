//! Shared helpers for unit tests

use std::sync::{Arc, Mutex};

use fingerprint_config::{FingerprintConfig, MapProperties};
use fingerprint_hal::FingerprintDevice;
use fingerprint_hal::mock::MockModule;

use crate::callback::SessionCallback;
use crate::types::{AcquiredInfo, FingerprintError, HardwareAuthToken};

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    ChallengeGenerated(i64),
    ChallengeRevoked(i64),
    Acquired(AcquiredInfo, i32),
    Error(FingerprintError, i32),
    EnrollmentProgress(i32, i32),
    AuthenticationSucceeded(i32, HardwareAuthToken),
    AuthenticationFailed,
    LockoutTimed(i64),
    LockoutPermanent,
    LockoutCleared,
    InteractionDetected,
    EnrollmentsEnumerated(Vec<i32>),
    EnrollmentsRemoved(Vec<i32>),
    AuthenticatorIdRetrieved(i64),
    AuthenticatorIdInvalidated(i64),
    SessionClosed,
}

#[derive(Debug, Default)]
pub struct RecordingCallback {
    events: Mutex<Vec<Event>>,
    panic_on_acquired: bool,
}

impl RecordingCallback {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// A callback whose `on_acquired` panics instead of recording
    pub fn panicking_on_acquired() -> Arc<Self> {
        Arc::new(Self {
            panic_on_acquired: true,
            ..Self::default()
        })
    }

    /// Drain recorded events
    pub fn take(&self) -> Vec<Event> {
        std::mem::take(&mut *self.events.lock().unwrap())
    }

    fn push(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

impl SessionCallback for RecordingCallback {
    fn on_challenge_generated(&self, challenge: i64) {
        self.push(Event::ChallengeGenerated(challenge));
    }
    fn on_challenge_revoked(&self, challenge: i64) {
        self.push(Event::ChallengeRevoked(challenge));
    }
    fn on_acquired(&self, info: AcquiredInfo, vendor_code: i32) {
        if self.panic_on_acquired {
            panic!("on_acquired failed for {info:?}");
        }
        self.push(Event::Acquired(info, vendor_code));
    }
    fn on_error(&self, error: FingerprintError, vendor_code: i32) {
        self.push(Event::Error(error, vendor_code));
    }
    fn on_enrollment_progress(&self, enrollment_id: i32, remaining: i32) {
        self.push(Event::EnrollmentProgress(enrollment_id, remaining));
    }
    fn on_authentication_succeeded(&self, enrollment_id: i32, hat: &HardwareAuthToken) {
        self.push(Event::AuthenticationSucceeded(enrollment_id, *hat));
    }
    fn on_authentication_failed(&self) {
        self.push(Event::AuthenticationFailed);
    }
    fn on_lockout_timed(&self, duration_millis: i64) {
        self.push(Event::LockoutTimed(duration_millis));
    }
    fn on_lockout_permanent(&self) {
        self.push(Event::LockoutPermanent);
    }
    fn on_lockout_cleared(&self) {
        self.push(Event::LockoutCleared);
    }
    fn on_interaction_detected(&self) {
        self.push(Event::InteractionDetected);
    }
    fn on_enrollments_enumerated(&self, enrollment_ids: &[i32]) {
        self.push(Event::EnrollmentsEnumerated(enrollment_ids.to_vec()));
    }
    fn on_enrollments_removed(&self, enrollment_ids: &[i32]) {
        self.push(Event::EnrollmentsRemoved(enrollment_ids.to_vec()));
    }
    fn on_authenticator_id_retrieved(&self, authenticator_id: i64) {
        self.push(Event::AuthenticatorIdRetrieved(authenticator_id));
    }
    fn on_authenticator_id_invalidated(&self, new_authenticator_id: i64) {
        self.push(Event::AuthenticatorIdInvalidated(new_authenticator_id));
    }
    fn on_session_closed(&self) {
        self.push(Event::SessionClosed);
    }
}

unsafe extern "C" fn ignore(_msg: *const fingerprint_hal::ffi::FingerprintMsgRaw) {}

/// Open a mock device without routing its notifications anywhere
pub fn open_mock_device() -> (MockModule, Arc<FingerprintDevice>) {
    let module = MockModule::new();
    let device = FingerprintDevice::open(&module, ignore).expect("mock device opens");
    module.state().clear_calls();
    (module, Arc::new(device))
}

/// Config for a side-mounted sensor
pub fn side_sensor_config() -> FingerprintConfig {
    FingerprintConfig::new().with_source(
        MapProperties::new()
            .with("ro.vendor.fingerprint.type", "side")
            .with("ro.vendor.fingerprint.sensor_id", "1"),
    )
}
