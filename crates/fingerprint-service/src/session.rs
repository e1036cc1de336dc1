//! A client session on the sensor
//!
//! Requests are forwarded to the legacy device; its notifications come back
//! through [`Session::notify`] and are translated into [`SessionCallback`]
//! calls. Enumeration and removal results arrive one template per message and
//! are reported as a single list once the module says none remain.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use fingerprint_hal::ffi::{
    FINGERPRINT_ACQUIRED_DETECTED, FINGERPRINT_ACQUIRED_GOOD, FINGERPRINT_ACQUIRED_IMAGER_DIRTY,
    FINGERPRINT_ACQUIRED_INSUFFICIENT, FINGERPRINT_ACQUIRED_PARTIAL, FINGERPRINT_ACQUIRED_TOO_FAST,
    FINGERPRINT_ACQUIRED_TOO_SLOW, FINGERPRINT_ACQUIRED_VENDOR_BASE, FINGERPRINT_ERROR_CANCELED,
    FINGERPRINT_ERROR_HW_UNAVAILABLE, FINGERPRINT_ERROR_LOCKOUT, FINGERPRINT_ERROR_NO_SPACE,
    FINGERPRINT_ERROR_TIMEOUT, FINGERPRINT_ERROR_UNABLE_TO_PROCESS,
    FINGERPRINT_ERROR_UNABLE_TO_REMOVE, FINGERPRINT_ERROR_VENDOR_BASE,
};
use fingerprint_hal::{FingerprintDevice, FingerprintMsg};

use crate::callback::SessionCallback;
use crate::error::ServiceError;
use crate::lockout::{LockoutMode, LockoutTracker};
use crate::types::{AcquiredInfo, FingerprintError, HardwareAuthToken};

/// Seconds the module waits for enrollment samples
pub const ENROLL_TIMEOUT_SEC: u32 = 60;

/// Per-user template store handed to `set_active_group`
pub fn store_path(user_id: i32) -> String {
    format!("/data/vendor_de/{user_id}/fpdata/")
}

/// What the device is currently doing on behalf of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Idle,
    Enrolling,
    Authenticating,
    DetectingInteraction,
    Enumerating,
    Removing,
}

#[derive(Debug)]
struct SessionState {
    operation: Operation,
    enumerated: Vec<i32>,
    removed: Vec<i32>,
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}

fn map_error(code: i32) -> (FingerprintError, i32) {
    match code {
        FINGERPRINT_ERROR_HW_UNAVAILABLE => (FingerprintError::HwUnavailable, 0),
        FINGERPRINT_ERROR_UNABLE_TO_PROCESS => (FingerprintError::UnableToProcess, 0),
        FINGERPRINT_ERROR_TIMEOUT => (FingerprintError::Timeout, 0),
        FINGERPRINT_ERROR_NO_SPACE => (FingerprintError::NoSpace, 0),
        FINGERPRINT_ERROR_CANCELED => (FingerprintError::Canceled, 0),
        FINGERPRINT_ERROR_UNABLE_TO_REMOVE => (FingerprintError::UnableToRemove, 0),
        c if c >= FINGERPRINT_ERROR_VENDOR_BASE => {
            (FingerprintError::Vendor, c - FINGERPRINT_ERROR_VENDOR_BASE)
        }
        _ => (FingerprintError::Unknown, 0),
    }
}

fn map_acquired(info: i32) -> (AcquiredInfo, i32) {
    match info {
        FINGERPRINT_ACQUIRED_GOOD => (AcquiredInfo::Good, 0),
        FINGERPRINT_ACQUIRED_PARTIAL => (AcquiredInfo::Partial, 0),
        FINGERPRINT_ACQUIRED_INSUFFICIENT => (AcquiredInfo::Insufficient, 0),
        FINGERPRINT_ACQUIRED_IMAGER_DIRTY => (AcquiredInfo::SensorDirty, 0),
        FINGERPRINT_ACQUIRED_TOO_SLOW => (AcquiredInfo::TooSlow, 0),
        FINGERPRINT_ACQUIRED_TOO_FAST => (AcquiredInfo::TooFast, 0),
        FINGERPRINT_ACQUIRED_DETECTED => (AcquiredInfo::Start, 0),
        i if i >= FINGERPRINT_ACQUIRED_VENDOR_BASE => {
            (AcquiredInfo::Vendor, i - FINGERPRINT_ACQUIRED_VENDOR_BASE)
        }
        _ => (AcquiredInfo::Unknown, 0),
    }
}

pub struct Session {
    device: Arc<FingerprintDevice>,
    user_id: i32,
    callback: Arc<dyn SessionCallback>,
    lockout: Arc<Mutex<LockoutTracker>>,
    detect_interaction_supported: bool,
    closed: AtomicBool,
    state: Mutex<SessionState>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("user_id", &self.user_id)
            .field("closed", &self.is_closed())
            .field("operation", &self.operation())
            .finish()
    }
}

impl Session {
    /// Bind a session to `user_id`'s template group
    pub fn new(
        device: Arc<FingerprintDevice>,
        user_id: i32,
        callback: Arc<dyn SessionCallback>,
        lockout: Arc<Mutex<LockoutTracker>>,
        detect_interaction_supported: bool,
    ) -> Result<Arc<Self>, ServiceError> {
        device.set_active_group(user_id as u32, &store_path(user_id))?;
        tracing::debug!("Session opened for user {}", user_id);

        Ok(Arc::new(Self {
            device,
            user_id,
            callback,
            lockout,
            detect_interaction_supported,
            closed: AtomicBool::new(false),
            state: Mutex::new(SessionState {
                operation: Operation::Idle,
                enumerated: Vec::new(),
                removed: Vec::new(),
            }),
        }))
    }

    pub fn user_id(&self) -> i32 {
        self.user_id
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub fn operation(&self) -> Operation {
        lock(&self.state).operation
    }

    fn gid(&self) -> u32 {
        self.user_id as u32
    }

    fn ensure_open(&self) -> Result<(), ServiceError> {
        if self.is_closed() {
            tracing::warn!("Call on closed session for user {}", self.user_id);
            return Err(ServiceError::SessionClosed);
        }
        Ok(())
    }

    fn set_operation(&self, operation: Operation) {
        lock(&self.state).operation = operation;
    }

    pub fn generate_challenge(&self) -> Result<(), ServiceError> {
        self.ensure_open()?;
        let challenge = self.device.pre_enroll()?;
        self.callback.on_challenge_generated(challenge as i64);
        Ok(())
    }

    pub fn revoke_challenge(&self, challenge: i64) -> Result<(), ServiceError> {
        self.ensure_open()?;
        self.device.post_enroll()?;
        self.callback.on_challenge_revoked(challenge);
        Ok(())
    }

    pub fn enroll(self: &Arc<Self>, hat: &HardwareAuthToken) -> Result<CancellationSignal, ServiceError> {
        self.ensure_open()?;
        self.set_operation(Operation::Enrolling);
        self.device
            .enroll(&hat.to_legacy(), self.gid(), ENROLL_TIMEOUT_SEC)
            .inspect_err(|_| self.set_operation(Operation::Idle))?;
        Ok(CancellationSignal::new(self))
    }

    pub fn authenticate(self: &Arc<Self>, operation_id: i64) -> Result<CancellationSignal, ServiceError> {
        self.ensure_open()?;

        let (mode, remaining) = {
            let tracker = lock(&self.lockout);
            (tracker.mode(), tracker.remaining())
        };
        match mode {
            LockoutMode::Permanent => {
                tracing::info!("Refusing authentication: permanent lockout");
                self.callback.on_lockout_permanent();
                return Ok(CancellationSignal::new(self));
            }
            LockoutMode::Timed => {
                tracing::info!("Refusing authentication: timed lockout, {:?} left", remaining);
                self.callback.on_lockout_timed(remaining.as_millis() as i64);
                return Ok(CancellationSignal::new(self));
            }
            LockoutMode::None => {}
        }

        self.set_operation(Operation::Authenticating);
        self.device
            .authenticate(operation_id as u64, self.gid())
            .inspect_err(|_| self.set_operation(Operation::Idle))?;
        Ok(CancellationSignal::new(self))
    }

    pub fn detect_interaction(self: &Arc<Self>) -> Result<CancellationSignal, ServiceError> {
        self.ensure_open()?;
        if !self.detect_interaction_supported {
            return Err(ServiceError::Unsupported("detectInteraction"));
        }
        self.set_operation(Operation::DetectingInteraction);
        self.device
            .authenticate(0, self.gid())
            .inspect_err(|_| self.set_operation(Operation::Idle))?;
        Ok(CancellationSignal::new(self))
    }

    pub fn enumerate_enrollments(&self) -> Result<(), ServiceError> {
        self.ensure_open()?;
        {
            let mut state = lock(&self.state);
            state.operation = Operation::Enumerating;
            state.enumerated.clear();
        }
        self.device
            .enumerate()
            .inspect_err(|_| self.set_operation(Operation::Idle))?;
        Ok(())
    }

    pub fn remove_enrollments(&self, enrollment_ids: &[i32]) -> Result<(), ServiceError> {
        self.ensure_open()?;
        if enrollment_ids.is_empty() {
            self.callback.on_enrollments_removed(&[]);
            return Ok(());
        }
        {
            let mut state = lock(&self.state);
            state.operation = Operation::Removing;
            state.removed.clear();
        }
        for &id in enrollment_ids {
            self.device
                .remove(self.gid(), id as u32)
                .inspect_err(|_| self.set_operation(Operation::Idle))?;
        }
        Ok(())
    }

    pub fn get_authenticator_id(&self) -> Result<(), ServiceError> {
        self.ensure_open()?;
        let id = self.device.authenticator_id()?;
        self.callback.on_authenticator_id_retrieved(id as i64);
        Ok(())
    }

    /// The legacy module cannot rotate its id; the current one is reported.
    pub fn invalidate_authenticator_id(&self) -> Result<(), ServiceError> {
        self.ensure_open()?;
        let id = self.device.authenticator_id()?;
        self.callback.on_authenticator_id_invalidated(id as i64);
        Ok(())
    }

    pub fn reset_lockout(&self, _hat: &HardwareAuthToken) -> Result<(), ServiceError> {
        self.ensure_open()?;
        lock(&self.lockout).reset();
        self.callback.on_lockout_cleared();
        Ok(())
    }

    /// Close the session; later calls are no-ops
    pub fn close(&self) -> Result<(), ServiceError> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        let operation = std::mem::replace(&mut lock(&self.state).operation, Operation::Idle);
        if operation != Operation::Idle {
            tracing::debug!("Cancelling {:?} on close", operation);
            if let Err(e) = self.device.cancel() {
                tracing::warn!("Failed to cancel {:?} on close: {}", operation, e);
            }
        }

        tracing::debug!("Session closed for user {}", self.user_id);
        self.callback.on_session_closed();
        Ok(())
    }

    /// The client's binder died
    pub fn on_binder_died(&self) {
        tracing::warn!("Session client for user {} died", self.user_id);
        if let Err(e) = self.close() {
            tracing::error!("Failed to close session: {}", e);
        }
    }

    /// Translate one legacy notification into client callbacks
    pub fn notify(&self, msg: FingerprintMsg) {
        if self.is_closed() {
            tracing::debug!("Dropping {:?} for closed session", msg);
            return;
        }

        match msg {
            FingerprintMsg::Error { code } => self.on_error(code),
            FingerprintMsg::Acquired { info } => {
                let (info, vendor_code) = map_acquired(info);
                self.callback.on_acquired(info, vendor_code);
            }
            FingerprintMsg::TemplateEnrolling {
                finger,
                samples_remaining,
            } => {
                if samples_remaining == 0 {
                    self.set_operation(Operation::Idle);
                }
                self.callback
                    .on_enrollment_progress(finger.fid as i32, samples_remaining as i32);
            }
            FingerprintMsg::TemplateRemoved {
                finger,
                remaining_templates,
            } => {
                let done = {
                    let mut state = lock(&self.state);
                    if finger.fid != 0 {
                        state.removed.push(finger.fid as i32);
                    }
                    if remaining_templates == 0 {
                        state.operation = Operation::Idle;
                        Some(std::mem::take(&mut state.removed))
                    } else {
                        None
                    }
                };
                if let Some(ids) = done {
                    self.callback.on_enrollments_removed(&ids);
                }
            }
            FingerprintMsg::TemplateEnumerating {
                finger,
                remaining_templates,
            } => {
                let done = {
                    let mut state = lock(&self.state);
                    if finger.fid != 0 {
                        state.enumerated.push(finger.fid as i32);
                    }
                    if remaining_templates == 0 {
                        state.operation = Operation::Idle;
                        Some(std::mem::take(&mut state.enumerated))
                    } else {
                        None
                    }
                };
                if let Some(ids) = done {
                    self.callback.on_enrollments_enumerated(&ids);
                }
            }
            FingerprintMsg::Authenticated { finger, token } => {
                self.on_authenticated(finger.fid, &token)
            }
        }
    }

    fn on_error(&self, code: i32) {
        self.set_operation(Operation::Idle);

        if code == FINGERPRINT_ERROR_LOCKOUT {
            let (mode, remaining) = {
                let mut tracker = lock(&self.lockout);
                tracker.start_timed();
                (tracker.mode(), tracker.remaining())
            };
            match mode {
                LockoutMode::Permanent => self.callback.on_lockout_permanent(),
                _ => self.callback.on_lockout_timed(remaining.as_millis() as i64),
            }
            return;
        }

        let (error, vendor_code) = map_error(code);
        if error == FingerprintError::Unknown {
            tracing::warn!("Unknown fingerprint error {}", code);
        }
        self.callback.on_error(error, vendor_code);
    }

    fn on_authenticated(&self, fid: u32, token: &HardwareAuthToken) {
        let operation = std::mem::replace(&mut lock(&self.state).operation, Operation::Idle);

        if operation == Operation::DetectingInteraction {
            if fid != 0 {
                lock(&self.lockout).reset();
            }
            self.callback.on_interaction_detected();
            return;
        }

        if fid != 0 {
            lock(&self.lockout).reset();
            self.callback.on_authentication_succeeded(fid as i32, token);
            return;
        }

        let (mode, remaining) = {
            let mut tracker = lock(&self.lockout);
            (tracker.add_failed_attempt(), tracker.remaining())
        };
        self.callback.on_authentication_failed();
        match mode {
            LockoutMode::Timed => self.callback.on_lockout_timed(remaining.as_millis() as i64),
            LockoutMode::Permanent => self.callback.on_lockout_permanent(),
            LockoutMode::None => {
                // Keep authenticating until a match, an error or a cancel
                self.set_operation(Operation::Authenticating);
            }
        }
    }
}

/// Cancels the operation it was returned from, shaped after `ICancellationSignal`
#[derive(Debug, Clone)]
pub struct CancellationSignal {
    session: Weak<Session>,
}

impl CancellationSignal {
    fn new(session: &Arc<Session>) -> Self {
        Self {
            session: Arc::downgrade(session),
        }
    }

    /// No-op once the session is gone or closed
    pub fn cancel(&self) -> Result<(), ServiceError> {
        let Some(session) = self.session.upgrade() else {
            return Ok(());
        };
        if session.is_closed() {
            return Ok(());
        }
        session.device.cancel()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lockout::LockoutPolicy;
    use crate::test_utils::{Event, RecordingCallback, open_mock_device};
    use fingerprint_hal::FingerId;
    use fingerprint_hal::mock::{MockCall, MockModule};
    use std::time::Duration;

    struct Fixture {
        module: MockModule,
        callback: Arc<RecordingCallback>,
        session: Arc<Session>,
    }

    fn fixture_with(policy: LockoutPolicy, detect: bool) -> Fixture {
        let (module, device) = open_mock_device();
        let callback = RecordingCallback::new();
        let lockout = Arc::new(Mutex::new(LockoutTracker::new(policy)));
        let session = Session::new(device, 10, callback.clone(), lockout, detect).unwrap();
        Fixture {
            module,
            callback,
            session,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(LockoutPolicy::default(), false)
    }

    fn finger(fid: u32) -> FingerId {
        FingerId { gid: 10, fid }
    }

    #[test]
    fn test_new_sets_active_group() {
        let f = fixture();
        assert_eq!(
            f.module.state().calls(),
            vec![MockCall::SetActiveGroup {
                gid: 10,
                path: "/data/vendor_de/10/fpdata/".into()
            }]
        );
        assert_eq!(f.session.user_id(), 10);
        assert_eq!(f.session.operation(), Operation::Idle);
    }

    #[test]
    fn test_challenge_round_trip() {
        let f = fixture();
        f.module.state().set_challenge(1234);

        f.session.generate_challenge().unwrap();
        f.session.revoke_challenge(1234).unwrap();

        assert_eq!(
            f.callback.take(),
            vec![Event::ChallengeGenerated(1234), Event::ChallengeRevoked(1234)]
        );
    }

    #[test]
    fn test_enroll_progress() {
        let f = fixture();
        let hat = HardwareAuthToken {
            challenge: 1234,
            ..Default::default()
        };

        f.session.enroll(&hat).unwrap();
        assert_eq!(f.session.operation(), Operation::Enrolling);
        assert!(f.module.state().calls().contains(&MockCall::Enroll {
            token: hat,
            gid: 10,
            timeout_sec: ENROLL_TIMEOUT_SEC
        }));

        f.session.notify(FingerprintMsg::Acquired { info: 0 });
        f.session.notify(FingerprintMsg::TemplateEnrolling {
            finger: finger(7),
            samples_remaining: 1,
        });
        f.session.notify(FingerprintMsg::TemplateEnrolling {
            finger: finger(7),
            samples_remaining: 0,
        });

        assert_eq!(
            f.callback.take(),
            vec![
                Event::Acquired(AcquiredInfo::Good, 0),
                Event::EnrollmentProgress(7, 1),
                Event::EnrollmentProgress(7, 0),
            ]
        );
        assert_eq!(f.session.operation(), Operation::Idle);
    }

    #[test]
    fn test_authentication_success_resets_lockout() {
        let f = fixture();
        let token = HardwareAuthToken {
            challenge: 99,
            ..Default::default()
        };

        f.session.authenticate(99).unwrap();
        f.session.notify(FingerprintMsg::Authenticated {
            finger: finger(0),
            token: HardwareAuthToken::default(),
        });
        f.session.notify(FingerprintMsg::Authenticated {
            finger: finger(3),
            token,
        });

        assert_eq!(
            f.callback.take(),
            vec![
                Event::AuthenticationFailed,
                Event::AuthenticationSucceeded(3, token)
            ]
        );
        assert_eq!(lock(&f.session.lockout).failed_attempts(), 0);
    }

    #[test]
    fn test_failures_trigger_timed_lockout() {
        let policy = LockoutPolicy {
            timed_threshold: 2,
            timed_duration: Duration::from_secs(30),
            permanent_threshold: 10,
        };
        let f = fixture_with(policy, false);

        f.session.authenticate(1).unwrap();
        for _ in 0..2 {
            f.session.notify(FingerprintMsg::Authenticated {
                finger: finger(0),
                token: HardwareAuthToken::default(),
            });
        }

        let events = f.callback.take();
        assert_eq!(events.len(), 3);
        assert_eq!(
            events[..2],
            [Event::AuthenticationFailed, Event::AuthenticationFailed]
        );
        assert!(matches!(events[2], Event::LockoutTimed(ms) if ms > 29_000 && ms <= 30_000));

        // Locked out: the device is not asked to authenticate
        f.module.state().clear_calls();
        f.session.authenticate(2).unwrap();
        assert!(f.module.state().calls().is_empty());
        assert!(matches!(f.callback.take()[..], [Event::LockoutTimed(_)]));
    }

    #[test]
    fn test_permanent_lockout_and_reset() {
        let policy = LockoutPolicy {
            timed_threshold: 5,
            timed_duration: Duration::from_secs(30),
            permanent_threshold: 1,
        };
        let f = fixture_with(policy, false);

        f.session.authenticate(1).unwrap();
        f.session.notify(FingerprintMsg::Authenticated {
            finger: finger(0),
            token: HardwareAuthToken::default(),
        });
        assert_eq!(
            f.callback.take(),
            vec![Event::AuthenticationFailed, Event::LockoutPermanent]
        );

        f.session.authenticate(2).unwrap();
        assert_eq!(f.callback.take(), vec![Event::LockoutPermanent]);

        f.session.reset_lockout(&HardwareAuthToken::default()).unwrap();
        assert_eq!(f.callback.take(), vec![Event::LockoutCleared]);

        f.module.state().clear_calls();
        f.session.authenticate(3).unwrap();
        assert_eq!(
            f.module.state().calls(),
            vec![MockCall::Authenticate {
                operation_id: 3,
                gid: 10
            }]
        );
    }

    #[test]
    fn test_enumerate_collects_until_last() {
        let f = fixture();

        f.session.enumerate_enrollments().unwrap();
        f.session.notify(FingerprintMsg::TemplateEnumerating {
            finger: finger(1),
            remaining_templates: 2,
        });
        f.session.notify(FingerprintMsg::TemplateEnumerating {
            finger: finger(2),
            remaining_templates: 1,
        });
        assert!(f.callback.take().is_empty());

        f.session.notify(FingerprintMsg::TemplateEnumerating {
            finger: finger(5),
            remaining_templates: 0,
        });
        assert_eq!(
            f.callback.take(),
            vec![Event::EnrollmentsEnumerated(vec![1, 2, 5])]
        );
    }

    #[test]
    fn test_enumerate_with_no_templates() {
        let f = fixture();

        f.session.enumerate_enrollments().unwrap();
        f.session.notify(FingerprintMsg::TemplateEnumerating {
            finger: finger(0),
            remaining_templates: 0,
        });

        assert_eq!(f.callback.take(), vec![Event::EnrollmentsEnumerated(vec![])]);
    }

    #[test]
    fn test_remove_enrollments() {
        let f = fixture();

        f.session.remove_enrollments(&[4, 6]).unwrap();
        let calls = f.module.state().calls();
        assert!(calls.contains(&MockCall::Remove { gid: 10, fid: 4 }));
        assert!(calls.contains(&MockCall::Remove { gid: 10, fid: 6 }));

        f.session.notify(FingerprintMsg::TemplateRemoved {
            finger: finger(4),
            remaining_templates: 1,
        });
        f.session.notify(FingerprintMsg::TemplateRemoved {
            finger: finger(6),
            remaining_templates: 0,
        });

        assert_eq!(f.callback.take(), vec![Event::EnrollmentsRemoved(vec![4, 6])]);
    }

    #[test]
    fn test_remove_nothing() {
        let f = fixture();
        f.session.remove_enrollments(&[]).unwrap();
        assert_eq!(f.callback.take(), vec![Event::EnrollmentsRemoved(vec![])]);
    }

    #[test]
    fn test_error_mapping() {
        let f = fixture();

        f.session.notify(FingerprintMsg::Error { code: 3 });
        f.session.notify(FingerprintMsg::Error { code: 5 });
        f.session.notify(FingerprintMsg::Error { code: 1002 });
        f.session.notify(FingerprintMsg::Error { code: 42 });

        assert_eq!(
            f.callback.take(),
            vec![
                Event::Error(FingerprintError::Timeout, 0),
                Event::Error(FingerprintError::Canceled, 0),
                Event::Error(FingerprintError::Vendor, 2),
                Event::Error(FingerprintError::Unknown, 0),
            ]
        );
    }

    #[test]
    fn test_lockout_error_from_module() {
        let f = fixture();
        f.session.notify(FingerprintMsg::Error {
            code: FINGERPRINT_ERROR_LOCKOUT,
        });
        let events = f.callback.take();
        assert!(matches!(
            events.as_slice(),
            [Event::LockoutTimed(ms)] if *ms > 9_000 && *ms <= 10_000
        ));

        // The module is locked out, so the next attempt never reaches it
        f.module.state().clear_calls();
        f.session.authenticate(1).unwrap();
        assert!(f.module.state().calls().is_empty());
        assert!(matches!(f.callback.take()[..], [Event::LockoutTimed(_)]));
    }

    #[test]
    fn test_acquired_mapping() {
        let f = fixture();

        for info in [1, 3, 6, 1005, -3] {
            f.session.notify(FingerprintMsg::Acquired { info });
        }

        assert_eq!(
            f.callback.take(),
            vec![
                Event::Acquired(AcquiredInfo::Partial, 0),
                Event::Acquired(AcquiredInfo::SensorDirty, 0),
                Event::Acquired(AcquiredInfo::Start, 0),
                Event::Acquired(AcquiredInfo::Vendor, 5),
                Event::Acquired(AcquiredInfo::Unknown, 0),
            ]
        );
    }

    #[test]
    fn test_detect_interaction() {
        let f = fixture();
        assert!(matches!(
            f.session.detect_interaction(),
            Err(ServiceError::Unsupported(_))
        ));

        let f = fixture_with(LockoutPolicy::default(), true);
        f.session.detect_interaction().unwrap();
        f.session.notify(FingerprintMsg::Authenticated {
            finger: finger(0),
            token: HardwareAuthToken::default(),
        });

        assert_eq!(f.callback.take(), vec![Event::InteractionDetected]);
        assert_eq!(lock(&f.session.lockout).failed_attempts(), 0);
    }

    #[test]
    fn test_authenticator_id() {
        let f = fixture();
        f.module.state().set_authenticator_id(77);

        f.session.get_authenticator_id().unwrap();
        f.session.invalidate_authenticator_id().unwrap();

        assert_eq!(
            f.callback.take(),
            vec![
                Event::AuthenticatorIdRetrieved(77),
                Event::AuthenticatorIdInvalidated(77)
            ]
        );
    }

    #[test]
    fn test_close_is_idempotent_and_cancels() {
        let f = fixture();
        f.session.authenticate(1).unwrap();
        f.module.state().clear_calls();

        f.session.close().unwrap();
        f.session.close().unwrap();

        assert!(f.session.is_closed());
        assert_eq!(f.module.state().calls(), vec![MockCall::Cancel]);
        assert_eq!(f.callback.take(), vec![Event::SessionClosed]);
    }

    #[test]
    fn test_closed_session_rejects_calls_and_drops_messages() {
        let f = fixture();
        f.session.on_binder_died();
        f.callback.take();

        assert!(matches!(
            f.session.generate_challenge(),
            Err(ServiceError::SessionClosed)
        ));
        f.session.notify(FingerprintMsg::Acquired { info: 0 });
        assert!(f.callback.take().is_empty());
    }

    #[test]
    fn test_cancellation_signal() {
        let f = fixture();
        let signal = f.session.authenticate(1).unwrap();
        f.module.state().clear_calls();

        signal.cancel().unwrap();
        assert_eq!(f.module.state().calls(), vec![MockCall::Cancel]);

        f.session.close().unwrap();
        f.module.state().clear_calls();
        signal.cancel().unwrap();
        assert!(f.module.state().calls().is_empty());
    }

    #[test]
    fn test_device_failure_resets_operation() {
        let f = fixture();
        f.module.state().set_call_result(-1);

        assert!(matches!(
            f.session.authenticate(1),
            Err(ServiceError::Hal(_))
        ));
        assert_eq!(f.session.operation(), Operation::Idle);
    }
}
