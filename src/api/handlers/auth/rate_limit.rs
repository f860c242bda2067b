//! Resend cooldown for confirmation and recovery emails.
//!
//! A limited request is rejected locally, before any platform call, with the
//! number of whole seconds left in the window. Only successful sends are
//! recorded, so a failed send leaves the caller free to retry immediately.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

pub const DEFAULT_RESEND_COOLDOWN_SECONDS: u64 = 60;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CooldownDecision {
    Ready,
    Wait { seconds: u64 },
}

/// Keyed rate limiter for outbound emails. Injected into handlers so tests
/// (and alternative deployments) can substitute their own store.
pub trait ResendLimiter: Send + Sync {
    fn check(&self, email: &str) -> CooldownDecision;
    fn mark_sent(&self, email: &str);
}

#[derive(Clone, Debug)]
pub struct NoopResendLimiter;

impl ResendLimiter for NoopResendLimiter {
    fn check(&self, _email: &str) -> CooldownDecision {
        CooldownDecision::Ready
    }

    fn mark_sent(&self, _email: &str) {}
}

/// In-process key-expiry store. Stale entries are evicted on every check, so
/// the map is bounded by the number of distinct addresses seen within one
/// window.
pub struct CooldownStore {
    window: Duration,
    last_sent: Mutex<HashMap<String, Instant>>,
}

impl CooldownStore {
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_sent: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Instant>> {
        match self.last_sent.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.lock().len()
    }
}

impl ResendLimiter for CooldownStore {
    fn check(&self, email: &str) -> CooldownDecision {
        let mut entries = self.lock();
        entries.retain(|_, sent_at| sent_at.elapsed() < self.window);

        match entries.get(email) {
            None => CooldownDecision::Ready,
            Some(sent_at) => {
                let remaining = self.window.saturating_sub(sent_at.elapsed());
                if remaining.is_zero() {
                    CooldownDecision::Ready
                } else {
                    CooldownDecision::Wait {
                        seconds: remaining.as_millis().div_ceil(1000) as u64,
                    }
                }
            }
        }
    }

    fn mark_sent(&self, email: &str) {
        self.lock().insert(email.to_string(), Instant::now());
    }
}
