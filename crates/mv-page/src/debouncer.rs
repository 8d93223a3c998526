//! Scan debouncing.
//!
//! Bursts of mutation batches collapse into one re-scan. Only one deadline
//! is pending at a time and later triggers do not push it back, so a scan
//! always runs one window after the first trigger of a burst.

use std::time::Duration;

use tokio::time::Instant;

/// Default debounce window.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(100);

/// Single-deadline debouncer for page re-scans.
#[derive(Debug, Clone)]
pub struct ScanDebouncer {
    window: Duration,
    deadline: Option<Instant>,
}

impl Default for ScanDebouncer {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}

impl ScanDebouncer {
    /// Create a debouncer with the given window.
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            deadline: None,
        }
    }

    /// Schedule a scan one window from now, unless one is already pending.
    ///
    /// Returns whether a new deadline was set.
    pub fn schedule(&mut self) -> bool {
        if self.deadline.is_some() {
            return false;
        }
        self.deadline = Some(Instant::now() + self.window);
        true
    }

    /// Pending deadline, if any.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Clear the deadline if it has passed, returning whether it had.
    pub fn take_due(&mut self) -> bool {
        match self.deadline {
            Some(deadline) if deadline <= Instant::now() => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    /// Drop any pending deadline.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test(start_paused = true)]
    async fn test_due_after_window() {
        let mut debouncer = ScanDebouncer::new(Duration::from_millis(100));
        assert!(debouncer.schedule());
        assert!(!debouncer.take_due());

        tokio::time::advance(Duration::from_millis(99)).await;
        assert!(!debouncer.take_due());

        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(debouncer.take_due());
        assert!(!debouncer.is_pending());
        assert!(!debouncer.take_due());
    }

    #[tokio::test(start_paused = true)]
    async fn test_later_triggers_keep_first_deadline() {
        let mut debouncer = ScanDebouncer::default();
        debouncer.schedule();
        let first = debouncer.deadline();

        tokio::time::advance(Duration::from_millis(60)).await;
        assert!(!debouncer.schedule());
        assert_eq!(debouncer.deadline(), first);

        tokio::time::advance(Duration::from_millis(40)).await;
        assert!(debouncer.take_due());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel() {
        let mut debouncer = ScanDebouncer::default();
        debouncer.schedule();
        debouncer.cancel();
        tokio::time::advance(Duration::from_millis(200)).await;
        assert!(!debouncer.take_due());
        assert_eq!(debouncer.deadline(), None);
    }
}
