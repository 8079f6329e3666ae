//! Cooperative cancellation shared by the executor, the wait poller, and capabilities.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use thiserror::Error;

/// Overall deadline for a routine run.
pub const ROUTINE_DEADLINE: Duration = Duration::from_secs(15 * 60);
/// Deadline for a single capability command.
pub const COMMAND_DEADLINE: Duration = Duration::from_secs(30);

/// Why a run stopped early.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Cancelled {
    #[error("routine interrupted")]
    Interrupted,
    #[error("routine deadline exceeded")]
    DeadlineExceeded,
}

/// Deadline plus an interrupt flag. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelSignal {
    deadline: Option<Instant>,
    interrupted: Arc<AtomicBool>,
}

impl CancelSignal {
    /// A signal that only trips on [`CancelSignal::interrupt`].
    pub fn new() -> Self {
        Self::default()
    }

    /// A signal that also trips once `budget` has elapsed from now.
    pub fn with_deadline(budget: Duration) -> Self {
        Self {
            deadline: Instant::now().checked_add(budget),
            interrupted: Arc::default(),
        }
    }

    /// Trip the signal for every clone.
    pub fn interrupt(&self) {
        self.interrupted.store(true, Ordering::SeqCst);
    }

    pub fn check(&self) -> Result<(), Cancelled> {
        if self.interrupted.load(Ordering::SeqCst) {
            return Err(Cancelled::Interrupted);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(Cancelled::DeadlineExceeded),
            _ => Ok(()),
        }
    }

    /// Time left before the deadline, `None` when there is no deadline.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline.map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interrupt_is_shared_between_clones() {
        let signal = CancelSignal::new();
        let observer = signal.clone();
        assert_eq!(observer.check(), Ok(()));
        signal.interrupt();
        assert_eq!(observer.check(), Err(Cancelled::Interrupted));
    }

    #[test]
    fn elapsed_deadline_trips() {
        let signal = CancelSignal::with_deadline(Duration::ZERO);
        assert_eq!(signal.check(), Err(Cancelled::DeadlineExceeded));
        assert_eq!(signal.remaining(), Some(Duration::ZERO));
        assert_eq!(CancelSignal::new().remaining(), None);
    }
}
