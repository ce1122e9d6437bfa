//! Retry policy for backend delivery
//!
//! Kept as a pure function of attempt count and error class so policy is
//! testable without any network I/O.

use std::time::Duration;

/// Whether a failed attempt is worth repeating
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Backend unreachable, timed out, or returned a server error
    Transient,
    /// The backend rejected the payload; retrying cannot help
    Permanent,
}

/// Bounded fixed-delay retry policy for steady-state event delivery
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// Decide what to do after attempt `attempt` (1-based) failed with an
    /// error of the given class. `Some(delay)` means wait and try again;
    /// `None` means give up and surface the failure.
    pub fn next_delay(&self, attempt: u32, class: ErrorClass) -> Option<Duration> {
        match class {
            ErrorClass::Permanent => None,
            ErrorClass::Transient if attempt < self.max_attempts => Some(self.delay),
            ErrorClass::Transient => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_errors_retry_until_budget() {
        let policy = RetryPolicy::new(3, Duration::from_secs(2));
        assert_eq!(
            policy.next_delay(1, ErrorClass::Transient),
            Some(Duration::from_secs(2))
        );
        assert_eq!(
            policy.next_delay(2, ErrorClass::Transient),
            Some(Duration::from_secs(2))
        );
        assert_eq!(policy.next_delay(3, ErrorClass::Transient), None);
        assert_eq!(policy.next_delay(7, ErrorClass::Transient), None);
    }

    #[test]
    fn permanent_errors_never_retry() {
        let policy = RetryPolicy::new(5, Duration::from_secs(2));
        assert_eq!(policy.next_delay(1, ErrorClass::Permanent), None);
    }

    #[test]
    fn at_least_one_attempt() {
        let policy = RetryPolicy::new(0, Duration::ZERO);
        assert_eq!(policy.max_attempts, 1);
        assert_eq!(policy.next_delay(1, ErrorClass::Transient), None);
    }
}
