//! Tiled execution with halo clipping and mosaic stitching

use crate::progress::Progress;
use gridcalc_core::align::{standardize, ExtentMode};
use gridcalc_core::error::{Error, Result};
use gridcalc_core::mosaic::mosaic;
use gridcalc_core::raster::{Extent, Grid, GridGeometry};
use serde::{Deserialize, Serialize};
use std::ops::Range;
use tracing::debug;

/// Memory bound for tiled runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TilingConfig {
    /// Budget divided by buffer and grid count gives the tile side length
    pub cell_budget: usize,
    /// Runs with at most this many tiles are computed in one piece
    pub min_tiles: usize,
}

impl Default for TilingConfig {
    fn default() -> Self {
        Self {
            cell_budget: 8000,
            min_tiles: 4,
        }
    }
}

impl TilingConfig {
    /// Tile side length for `grid_count` grids and a halo of `buffer` cells
    pub fn stride(&self, buffer: usize, grid_count: usize) -> usize {
        (self.cell_budget / buffer.max(1) / grid_count.max(1)).max(1)
    }
}

/// A block of cells, half-open in both directions
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Tile {
    pub rows: Range<usize>,
    pub cols: Range<usize>,
}

impl Tile {
    /// World extent of the tile grown by `halo` cells on every side
    fn extent(&self, base: &GridGeometry, halo: usize) -> Extent {
        let origin = base.extent();
        let cs = base.cell_size();
        let halo = halo as f64;
        Extent::new(
            origin.xmin + (self.cols.start as f64 - halo) * cs.x,
            origin.ymax - (self.rows.end as f64 + halo) * cs.y,
            origin.xmin + (self.cols.end as f64 + halo) * cs.x,
            origin.ymax - (self.rows.start as f64 - halo) * cs.y,
        )
    }
}

/// Row-major iterator over `stride`-sized tiles covering a grid
pub(crate) struct TileIterator {
    rows: usize,
    cols: usize,
    stride: usize,
    current_row: usize,
    current_col: usize,
}

impl TileIterator {
    pub fn new(rows: usize, cols: usize, stride: usize) -> Self {
        Self {
            rows,
            cols,
            stride: stride.max(1),
            current_row: 0,
            current_col: 0,
        }
    }

    pub fn count_for(rows: usize, cols: usize, stride: usize) -> usize {
        let stride = stride.max(1);
        rows.div_ceil(stride) * cols.div_ceil(stride)
    }
}

impl Iterator for TileIterator {
    type Item = Tile;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current_row >= self.rows || self.cols == 0 {
            return None;
        }

        let tile = Tile {
            rows: self.current_row..(self.current_row + self.stride).min(self.rows),
            cols: self.current_col..(self.current_col + self.stride).min(self.cols),
        };

        self.current_col += self.stride;
        if self.current_col >= self.cols {
            self.current_col = 0;
            self.current_row += self.stride;
        }

        Some(tile)
    }
}

/// Run `compute` over `grids` in memory-bounded tiles.
///
/// The grids are first aligned onto their common intersection. When the
/// aligned grids split into no more than `config.min_tiles` tiles, `compute`
/// runs once on them. Otherwise each tile is computed on inputs clipped to
/// the tile plus up to `buffer` cells of halo (never past the grid edge),
/// its outputs are clipped back to the tile, and each output channel is
/// stitched from its tiles with one [`mosaic`].
///
/// `compute` must give every cell a value that depends only on the inputs
/// within `buffer` cells of it; then the stitched result equals a single
/// untiled run, cell for cell.
pub fn run_tiled<F>(
    mut compute: F,
    buffer: usize,
    grids: &[Grid],
    config: &TilingConfig,
    progress: &mut dyn Progress,
) -> Result<Vec<Grid>>
where
    F: FnMut(&[Grid]) -> Result<Vec<Grid>>,
{
    let aligned = standardize(ExtentMode::Intersect, grids)?;
    let base = aligned[0].geometry();

    let stride = config.stride(buffer, aligned.len());
    let total = TileIterator::count_for(base.rows, base.cols, stride);

    if total <= config.min_tiles {
        debug!(tiles = total, stride, "computing in a single pass");
        let outputs = compute(&aligned)?;
        progress.tile_done(1, 1);
        progress.finish();
        return Ok(outputs);
    }

    debug!(
        tiles = total,
        stride,
        buffer,
        rows = base.rows,
        cols = base.cols,
        "computing in tiles"
    );

    let bounds = base.extent();
    let mut channels: Vec<Vec<Grid>> = Vec::new();
    for (i, tile) in TileIterator::new(base.rows, base.cols, stride).enumerate() {
        // Windows reaching past the grid edge see missing cells either way
        let halo_extent = tile.extent(&base, buffer).intersect(&bounds);
        let inputs = aligned
            .iter()
            .map(|g| g.clip(&halo_extent))
            .collect::<Result<Vec<_>>>()?;

        let tile_extent = tile.extent(&base, 0);
        let outputs = compute(&inputs)?
            .iter()
            .map(|g| g.clip(&tile_extent))
            .collect::<Result<Vec<_>>>()?;

        if i == 0 {
            channels = outputs.into_iter().map(|g| vec![g]).collect();
        } else {
            if outputs.len() != channels.len() {
                return Err(Error::Algorithm(format!(
                    "tile {} produced {} outputs, expected {}",
                    i + 1,
                    outputs.len(),
                    channels.len()
                )));
            }
            for (pieces, out) in channels.iter_mut().zip(outputs) {
                pieces.push(out);
            }
        }

        progress.tile_done(i + 1, total);
    }

    let stitched = channels
        .iter()
        .map(|pieces| mosaic(pieces))
        .collect::<Result<Vec<_>>>()?;
    progress.finish();

    Ok(stitched)
}
