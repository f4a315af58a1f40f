//! Cooperative scheduling primitives for long-running scans.
//!
//! A scan is a resumable state machine. Each [`Scan::step`] scores one chunk of
//! candidates and then either suspends, handing control back to the host, or
//! finishes with its result. Cancellation is only observed at suspension.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;

use crate::error::{EngineError, EngineResult};

/// Shared flag used to abort a scan from another handle or thread.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    /// Creates an unset token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Candidates scored so far out of the total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SearchProgress {
    /// Candidates already scored.
    pub processed: usize,
    /// Candidates in the full scan.
    pub total: usize,
}

impl SearchProgress {
    /// Completion in `[0, 1]`; an empty scan counts as complete.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.processed as f64 / self.total as f64
        }
    }
}

/// Outcome of a single [`Scan::step`].
#[derive(Debug, Clone, PartialEq)]
pub enum ScanStep<T> {
    /// A chunk was scored and more remain.
    Suspended(SearchProgress),
    /// The scan is complete.
    Finished(T),
}

/// A resumable exhaustive scan.
pub trait Scan {
    /// Value produced when the scan completes.
    type Output;

    /// Scores the next chunk of candidates.
    ///
    /// Once finished, further calls return `Finished` with the same value, so
    /// outputs are cheap to clone.
    fn step(&mut self) -> ScanStep<Self::Output>;

    /// Progress as of the last suspension.
    fn progress(&self) -> SearchProgress;
}

/// Drives `scan` to completion, reporting progress and honouring `cancel` at
/// every suspension point.
pub fn run_to_completion<S: Scan>(
    scan: &mut S,
    cancel: &CancelToken,
    mut on_progress: impl FnMut(SearchProgress),
) -> EngineResult<S::Output> {
    loop {
        match scan.step() {
            ScanStep::Suspended(progress) => {
                on_progress(progress);
                if cancel.is_cancelled() {
                    log::debug!(
                        "scan cancelled at {}/{}",
                        progress.processed,
                        progress.total
                    );
                    return Err(EngineError::Cancelled);
                }
            }
            ScanStep::Finished(output) => return Ok(output),
        }
    }
}
