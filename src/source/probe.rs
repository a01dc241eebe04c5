//! Bounded polling for the host SDK.
//!
//! The probe does no I/O itself: the caller reports whether the SDK is
//! present and receives the next step. The page drives it from a timer,
//! the CLI through [`wait_blocking`].

use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbePolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl Default for ProbePolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            interval: Duration::from_millis(500),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeStep {
    /// The SDK answered; use it.
    Ready,
    /// Check again after the delay.
    Retry(Duration),
    /// Attempts exhausted; fall back to the stub source.
    Fallback,
}

#[derive(Debug, Clone)]
pub struct Probe {
    policy: ProbePolicy,
    attempts: u32,
    done: Option<ProbeStep>,
}

impl Probe {
    pub fn new(policy: ProbePolicy) -> Self {
        Self {
            policy,
            attempts: 0,
            done: None,
        }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// The terminal step, once one has been reached.
    pub fn finished(&self) -> Option<ProbeStep> {
        self.done
    }

    /// Record one availability check.
    ///
    /// Once `Ready` or `Fallback` is returned, later calls repeat it.
    pub fn poll(&mut self, available: bool) -> ProbeStep {
        if let Some(step) = self.done {
            return step;
        }
        self.attempts += 1;

        let step = if available {
            debug!(attempt = self.attempts, "host SDK available");
            ProbeStep::Ready
        } else if self.attempts >= self.policy.max_attempts {
            warn!(attempts = self.attempts, "host SDK not found, using stub data");
            ProbeStep::Fallback
        } else {
            debug!(attempt = self.attempts, "host SDK not ready");
            return ProbeStep::Retry(self.policy.interval);
        };

        self.done = Some(step);
        step
    }
}

/// Poll `check` until it succeeds or the policy runs out, sleeping with
/// `sleep` between attempts. Returns `true` when the SDK became available.
pub fn wait_blocking(
    policy: ProbePolicy,
    mut check: impl FnMut() -> bool,
    mut sleep: impl FnMut(Duration),
) -> bool {
    let mut probe = Probe::new(policy);
    loop {
        match probe.poll(check()) {
            ProbeStep::Ready => return true,
            ProbeStep::Fallback => return false,
            ProbeStep::Retry(delay) => sleep(delay),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ready_on_third_attempt() {
        let mut calls = 0;
        let mut slept = Vec::new();
        let ok = wait_blocking(
            ProbePolicy::default(),
            || {
                calls += 1;
                calls == 3
            },
            |d| slept.push(d),
        );
        assert!(ok);
        assert_eq!(calls, 3);
        assert_eq!(slept, vec![Duration::from_millis(500); 2]);
    }

    #[test]
    fn test_fallback_after_max_attempts() {
        let mut calls = 0;
        let mut sleeps = 0;
        let policy = ProbePolicy {
            max_attempts: 4,
            interval: Duration::from_millis(1),
        };
        let ok = wait_blocking(
            policy,
            || {
                calls += 1;
                false
            },
            |_| sleeps += 1,
        );
        assert!(!ok);
        assert_eq!(calls, 4);
        assert_eq!(sleeps, 3);
    }

    #[test]
    fn test_terminal_step_is_sticky() {
        let mut probe = Probe::new(ProbePolicy {
            max_attempts: 1,
            interval: Duration::ZERO,
        });
        assert_eq!(probe.finished(), None);
        assert_eq!(probe.poll(false), ProbeStep::Fallback);
        assert_eq!(probe.finished(), Some(ProbeStep::Fallback));
        assert_eq!(probe.poll(true), ProbeStep::Fallback);
        assert_eq!(probe.attempts(), 1);
    }
}
