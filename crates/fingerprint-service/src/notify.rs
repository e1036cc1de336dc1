//! Routing of legacy notifications
//!
//! The module's notify callback carries no context pointer, so the live
//! [`Fingerprint`] instance is registered here and every message is forwarded
//! to its current session. The slot holds a weak reference; a dropped
//! instance simply stops receiving messages.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, RwLock, Weak};

use fingerprint_hal::FingerprintMsg;
use fingerprint_hal::ffi::FingerprintMsgRaw;

use crate::fingerprint::Fingerprint;

static CURRENT: RwLock<Option<Weak<Fingerprint>>> = RwLock::new(None);

/// Make `instance` the receiver of all notifications
pub(crate) fn install(instance: &Arc<Fingerprint>) {
    let mut slot = CURRENT
        .write()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    *slot = Some(Arc::downgrade(instance));
}

/// Unregister `instance` if it is still the receiver
pub(crate) fn uninstall(instance: *const Fingerprint) {
    let mut slot = CURRENT
        .write()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    if slot.as_ref().is_some_and(|w| w.as_ptr() == instance) {
        *slot = None;
    }
}

fn current() -> Option<Arc<Fingerprint>> {
    CURRENT
        .read()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
        .as_ref()
        .and_then(Weak::upgrade)
}

/// Forward `msg` to the current session.
///
/// Returns `false` when the message was dropped.
pub fn dispatch(msg: FingerprintMsg) -> bool {
    let Some(instance) = current() else {
        tracing::warn!("No fingerprint instance, dropping {:?}", msg);
        return false;
    };
    let Some(session) = instance.current_session() else {
        tracing::debug!("No open session, dropping {:?}", msg);
        return false;
    };
    if session.is_closed() {
        tracing::debug!("Session closed, dropping {:?}", msg);
        return false;
    }
    session.notify(msg);
    true
}

/// Callback registered with the legacy device
pub(crate) unsafe extern "C" fn hal_notify(msg: *const FingerprintMsgRaw) {
    let result = catch_unwind(AssertUnwindSafe(|| {
        // SAFETY: the module passes a message valid for the duration of the call.
        match unsafe { FingerprintMsg::from_raw(msg) } {
            Some(msg) => {
                dispatch(msg);
            }
            None => tracing::warn!("Ignoring undecodable notification"),
        }
    }));
    if result.is_err() {
        tracing::error!("Panic while handling fingerprint notification");
    }
}
