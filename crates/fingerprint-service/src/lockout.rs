//! Failed-attempt lockout
//!
//! Failures past the timed threshold start a timed lockout window; failures
//! past the permanent threshold lock the sensor until `reset`. A successful
//! match or a lockout reset clears the count.

use std::time::{Duration, Instant};

use fingerprint_config::{FingerprintConfig, default_value, keys};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockoutMode {
    None,
    Timed,
    Permanent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockoutPolicy {
    pub timed_threshold: u32,
    pub timed_duration: Duration,
    pub permanent_threshold: u32,
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        Self {
            timed_threshold: 5,
            timed_duration: Duration::from_millis(10_000),
            permanent_threshold: 20,
        }
    }
}

impl LockoutPolicy {
    /// Read thresholds from config; non-positive values keep the default
    pub fn from_config(config: &FingerprintConfig) -> Self {
        let positive = |key: &str| {
            let value = config.get_i32(key);
            match u32::try_from(value) {
                Ok(v) if v > 0 => v,
                _ => {
                    let fallback = default_value(key)
                        .and_then(|v| v.parse().ok())
                        .unwrap_or(1);
                    tracing::warn!("{} must be positive, got {}; using {}", key, value, fallback);
                    fallback
                }
            }
        };

        Self {
            timed_threshold: positive(keys::LOCKOUT_TIMED_THRESHOLD),
            timed_duration: Duration::from_millis(u64::from(positive(
                keys::LOCKOUT_TIMED_DURATION,
            ))),
            permanent_threshold: positive(keys::LOCKOUT_PERMANENT_THRESHOLD),
        }
    }
}

#[derive(Debug)]
pub struct LockoutTracker {
    policy: LockoutPolicy,
    failed_attempts: u32,
    timed_until: Option<Instant>,
}

impl LockoutTracker {
    pub fn new(policy: LockoutPolicy) -> Self {
        Self {
            policy,
            failed_attempts: 0,
            timed_until: None,
        }
    }

    pub fn policy(&self) -> &LockoutPolicy {
        &self.policy
    }

    pub fn failed_attempts(&self) -> u32 {
        self.failed_attempts
    }

    /// Record a failed match and return the resulting mode
    pub fn add_failed_attempt(&mut self) -> LockoutMode {
        self.add_failed_attempt_at(Instant::now())
    }

    pub fn add_failed_attempt_at(&mut self, now: Instant) -> LockoutMode {
        self.failed_attempts = self.failed_attempts.saturating_add(1);

        if self.failed_attempts >= self.policy.timed_threshold && self.mode_at(now) == LockoutMode::None {
            self.timed_until = Some(now + self.policy.timed_duration);
        }

        let mode = self.mode_at(now);
        if mode != LockoutMode::None {
            tracing::info!(
                "Lockout {:?} after {} failed attempts",
                mode,
                self.failed_attempts
            );
        }
        mode
    }

    /// Start a timed window without recording a failure, for lockouts the
    /// module reports on its own
    pub fn start_timed(&mut self) {
        self.start_timed_at(Instant::now())
    }

    pub fn start_timed_at(&mut self, now: Instant) {
        if self.mode_at(now) == LockoutMode::None {
            self.timed_until = Some(now + self.policy.timed_duration);
        }
    }

    pub fn mode(&self) -> LockoutMode {
        self.mode_at(Instant::now())
    }

    pub fn mode_at(&self, now: Instant) -> LockoutMode {
        if self.failed_attempts >= self.policy.permanent_threshold {
            LockoutMode::Permanent
        } else if self.timed_until.is_some_and(|until| now < until) {
            LockoutMode::Timed
        } else {
            LockoutMode::None
        }
    }

    /// Time left in the timed window
    pub fn remaining(&self) -> Duration {
        self.remaining_at(Instant::now())
    }

    pub fn remaining_at(&self, now: Instant) -> Duration {
        self.timed_until
            .map(|until| until.saturating_duration_since(now))
            .unwrap_or_default()
    }

    pub fn reset(&mut self) {
        if self.failed_attempts > 0 {
            tracing::debug!("Lockout reset after {} failed attempts", self.failed_attempts);
        }
        self.failed_attempts = 0;
        self.timed_until = None;
    }
}

impl Default for LockoutTracker {
    fn default() -> Self {
        Self::new(LockoutPolicy::default())
    }
}
