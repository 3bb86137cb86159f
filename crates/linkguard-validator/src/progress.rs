//! Progress reporting and cooperative cancellation

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;

/// Observer of a long-running validation
///
/// The validator reports its progress at checkpoints and asks whether it
/// should stop. Cancellation is only honoured at those checkpoints.
pub trait ProgressMonitor {
    /// Record progress, in percent
    fn set_progress(&self, percent: u8);

    /// Whether the run should stop at the next checkpoint
    fn is_cancelled(&self) -> bool;
}

/// Shareable cancellation flag with progress tracking
///
/// Clones share state, so one clone can be handed to a worker while another
/// cancels it from a different thread.
///
/// # Examples
///
/// ```
/// use linkguard_validator::{CancellationFlag, ProgressMonitor};
///
/// let flag = CancellationFlag::new();
/// let remote = flag.clone();
/// remote.cancel();
/// assert!(flag.is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag {
    cancelled: Arc<AtomicBool>,
    progress: Arc<AtomicU8>,
}

impl CancellationFlag {
    /// Create a flag that is not cancelled
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Last reported progress, in percent
    pub fn progress(&self) -> u8 {
        self.progress.load(Ordering::SeqCst)
    }
}

impl ProgressMonitor for CancellationFlag {
    fn set_progress(&self, percent: u8) {
        self.progress.store(percent.min(100), Ordering::SeqCst);
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Report progress and stop if cancelled
pub(crate) fn checkpoint(
    monitor: Option<&dyn ProgressMonitor>,
    percent: u8,
) -> Result<(), crate::ValidatorError> {
    let Some(monitor) = monitor else {
        return Ok(());
    };
    monitor.set_progress(percent);
    if monitor.is_cancelled() {
        tracing::warn!("Validation interrupted at {}%", percent);
        return Err(crate::ValidatorError::Interrupted);
    }
    Ok(())
}

/// Percentage of `done` out of `total` within the band `from..to`
pub(crate) fn band(from: u8, to: u8, done: usize, total: usize) -> u8 {
    if total == 0 {
        return to;
    }
    let span = usize::from(to - from);
    from + (span * done.min(total) / total) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ValidatorError;

    #[test]
    fn test_checkpoint_without_monitor() {
        assert!(checkpoint(None, 50).is_ok());
    }

    #[test]
    fn test_checkpoint_records_and_cancels() {
        let flag = CancellationFlag::new();
        assert!(checkpoint(Some(&flag), 30).is_ok());
        assert_eq!(flag.progress(), 30);

        flag.clone().cancel();
        assert_eq!(checkpoint(Some(&flag), 40), Err(ValidatorError::Interrupted));
    }

    #[test]
    fn test_band() {
        assert_eq!(band(20, 100, 0, 10), 20);
        assert_eq!(band(20, 100, 5, 10), 60);
        assert_eq!(band(20, 100, 10, 10), 100);
        assert_eq!(band(0, 10, 0, 0), 10);
    }
}
