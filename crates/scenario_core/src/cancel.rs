//! Cooperative cancellation between pipeline stages.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::types::ScenarioError;

/// Shared cancellation flag.
///
/// Clones observe the same flag, so a controller thread can keep one clone
/// and hand another to a running generation.
///
/// # Examples
///
/// ```
/// use scenario_core::cancel::CancellationToken;
///
/// let token = CancellationToken::new();
/// let handle = token.clone();
/// assert!(token.checkpoint("calibration").is_ok());
///
/// handle.cancel();
/// assert!(token.checkpoint("short_rate").is_err());
/// ```
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Fresh, not-cancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// True once [`cancel`](Self::cancel) has been called on any clone.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Fail with `ScenarioError::Cancelled` if cancellation was requested.
    ///
    /// `stage` names the stage that has just completed.
    pub fn checkpoint(&self, stage: &str) -> Result<(), ScenarioError> {
        if self.is_cancelled() {
            Err(ScenarioError::Cancelled {
                stage: stage.to_string(),
            })
        } else {
            Ok(())
        }
    }
}
