//! Progress reporting decoupled from the fetch loops.
//!
//! Stages report through this trait instead of printing, so the core stays
//! testable without console side effects. The binary supplies an indicatif-backed
//! implementation; library callers default to [`NoopProgress`].

/// Observer notified as a stage works through its units.
pub trait ProgressObserver: Send + Sync {
    /// A stage is starting `total` units of work
    fn begin(&self, _task: &str, _total: u64) {}

    /// `delta` more units finished
    fn advance(&self, _delta: u64) {}

    /// The stage is done
    fn finish(&self) {}
}

/// Discards all progress events.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProgress;

impl ProgressObserver for NoopProgress {}
