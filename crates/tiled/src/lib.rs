//! # gridcalc tiled
//!
//! Memory-bounded execution of window computations.
//!
//! [`run_tiled`] splits aligned grids into row-major tiles, runs a
//! computation on each tile plus a halo of `buffer` cells, and stitches the
//! per-tile outputs back together. The result is identical, cell for cell,
//! to running the computation once on the whole grids.

mod progress;
mod tiled;

pub use progress::{FnProgress, LogProgress, NoProgress, Progress};
pub use tiled::{run_tiled, TilingConfig};
