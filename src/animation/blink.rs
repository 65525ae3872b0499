//! A single blink: eyelids driven closed for the first half of the duration,
//! then open for the second half.

use super::{LIDS_CLOSED, LIDS_OPEN};

/// A blink in progress.
///
/// # Examples
///
/// ```
/// use animatronic_eyes::animation::Blink;
///
/// let blink = Blink::new(1_000, 150);
/// assert_eq!(blink.eyelids(1_010), 1.0); // closing
/// assert_eq!(blink.eyelids(1_100), 0.0); // reopening
/// assert!(blink.is_finished(1_150));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Blink {
    started_ms: u64,
    duration_ms: u64,
}

impl Blink {
    #[must_use]
    pub fn new(started_ms: u64, duration_ms: u64) -> Self {
        Self {
            started_ms,
            duration_ms: duration_ms.max(1),
        }
    }

    #[must_use]
    pub fn started_ms(&self) -> u64 {
        self.started_ms
    }

    #[must_use]
    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    /// Whether the lids are still being driven closed.
    #[must_use]
    pub fn is_closing(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.started_ms) < self.duration_ms / 2
    }

    /// Logical eyelid target at `now_ms`.
    #[must_use]
    pub fn eyelids(&self, now_ms: u64) -> f32 {
        if self.is_closing(now_ms) {
            LIDS_CLOSED
        } else {
            LIDS_OPEN
        }
    }

    #[must_use]
    pub fn is_finished(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.started_ms) >= self.duration_ms
    }
}
