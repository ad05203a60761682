//! Retry-with-cancellation polling for dependencies that appear later

use serde::{Deserialize, Serialize};

/// How many attempts a poll may make
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RetryPolicy {
    Unbounded,
    /// Total attempts, the first one included
    Bounded { max_attempts: u32 },
}

impl RetryPolicy {
    /// Policy from a retry budget, where `None` retries forever
    pub fn from_max_retries(max_retries: Option<u32>) -> Self {
        match max_retries {
            Some(retries) => RetryPolicy::Bounded {
                max_attempts: retries.saturating_add(1),
            },
            None => RetryPolicy::Unbounded,
        }
    }
}

/// Lifecycle of a poll; every state but `Pending` is terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PollStatus {
    Pending,
    Ready,
    Exhausted,
    Cancelled,
}

/// Result of one call to [`ReadinessPoll::poll`]
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome<T> {
    /// The probe succeeded on this call
    Ready(T),
    /// Not ready yet, or not due for another attempt
    Pending,
    /// This call used the last allowed attempt
    Exhausted,
    /// The poll already reached a terminal state earlier
    Inactive,
}

/// Attempts a probe immediately, then at most once per interval, until it
/// succeeds, runs out of attempts or is cancelled. Never restarts.
#[derive(Debug, Clone)]
pub struct ReadinessPoll {
    interval_ms: u64,
    policy: RetryPolicy,
    attempts: u32,
    last_attempt_ms: Option<u64>,
    status: PollStatus,
}

impl ReadinessPoll {
    pub fn new(interval_ms: u64, policy: RetryPolicy) -> Self {
        Self {
            interval_ms,
            policy,
            attempts: 0,
            last_attempt_ms: None,
            status: PollStatus::Pending,
        }
    }

    pub fn status(&self) -> PollStatus {
        self.status
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn is_terminal(&self) -> bool {
        self.status != PollStatus::Pending
    }

    /// Run the probe if an attempt is due
    pub fn poll<T, F>(&mut self, now_ms: u64, probe: F) -> PollOutcome<T>
    where
        F: FnOnce() -> Option<T>,
    {
        if self.is_terminal() {
            return PollOutcome::Inactive;
        }

        if let Some(last) = self.last_attempt_ms {
            if now_ms < last.saturating_add(self.interval_ms) {
                return PollOutcome::Pending;
            }
        }

        self.attempts += 1;
        self.last_attempt_ms = Some(now_ms);

        if let Some(value) = probe() {
            self.status = PollStatus::Ready;
            return PollOutcome::Ready(value);
        }

        match self.policy {
            RetryPolicy::Bounded { max_attempts } if self.attempts >= max_attempts => {
                self.status = PollStatus::Exhausted;
                PollOutcome::Exhausted
            }
            _ => PollOutcome::Pending,
        }
    }

    /// Stop polling for good; no effect once terminal
    pub fn cancel(&mut self) {
        if self.status == PollStatus::Pending {
            self.status = PollStatus::Cancelled;
        }
    }
}
