//! Progress reporting for tiled runs

use tracing::info;

/// Receives a notification after each tile completes.
///
/// Reporting never influences the computed result.
pub trait Progress {
    /// `done` of `total` tiles have been computed
    fn tile_done(&mut self, done: usize, total: usize);

    /// Called once when the run is complete
    fn finish(&mut self) {}
}

/// Discards all notifications
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl Progress for NoProgress {
    fn tile_done(&mut self, _done: usize, _total: usize) {}
}

/// Reports each tile through `tracing` at INFO level
#[derive(Debug, Clone, Copy, Default)]
pub struct LogProgress;

impl Progress for LogProgress {
    fn tile_done(&mut self, done: usize, total: usize) {
        info!("Processing {} of {} tiles...", done, total);
    }

    fn finish(&mut self) {
        info!("Tiled run complete");
    }
}

/// Forwards each notification to a closure
pub struct FnProgress<F>(pub F);

impl<F: FnMut(usize, usize)> Progress for FnProgress<F> {
    fn tile_done(&mut self, done: usize, total: usize) {
        (self.0)(done, total)
    }
}
