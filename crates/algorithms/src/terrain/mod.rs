//! Terrain analysis of elevation grids
//!
//! - **slope**: steepness of the surface
//! - **aspect**: compass direction of steepest descent
//! - **hillshade**: shaded relief
//!
//! All three derive from Horn's (1981) 3x3 gradient and run as focal
//! operations with a one-cell halo, so large grids are tiled like any other
//! focal statistic. A cell whose window touches a missing or out-of-grid
//! cell is missing.

pub mod aspect;
pub mod hillshade;
pub mod slope;

pub use aspect::{aspect, AspectOutput};
pub use hillshade::{hillshade, HillshadeParams};
pub use slope::{slope, SlopeParams, SlopeUnits};

use crate::statistics::{focal, reducer_fn, FocalParams};
use gridcalc_core::error::{Error, Result};
use gridcalc_core::raster::{CellSize, Grid};
use gridcalc_tiled::{NoProgress, TilingConfig};

/// Surface gradient at a cell: elevation change per unit distance
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Gradient {
    /// Towards east
    pub dz_dx: f64,
    /// Towards north
    pub dz_dy: f64,
}

impl Gradient {
    /// Horn gradient of a row-major 3x3 window
    ///
    /// ```text
    /// a b c
    /// d e f
    /// g h i
    /// ```
    fn horn(window: &[f64], cell: CellSize, z_factor: f64) -> Option<Self> {
        if window.len() != 9 || window.iter().any(|v| v.is_nan()) {
            return None;
        }
        let [a, b, c, d, _, f, g, h, i] = [
            window[0], window[1], window[2], window[3], window[4], window[5], window[6], window[7],
            window[8],
        ];
        Some(Self {
            dz_dx: z_factor * ((c + 2.0 * f + i) - (a + 2.0 * d + g)) / (8.0 * cell.x),
            dz_dy: z_factor * ((a + 2.0 * b + c) - (g + 2.0 * h + i)) / (8.0 * cell.y),
        })
    }

    /// Angle from the horizontal, radians
    pub fn slope(&self) -> f64 {
        self.dz_dx.hypot(self.dz_dy).atan()
    }

    /// Compass bearing of steepest descent in radians (0 = north,
    /// clockwise); `None` on a flat surface
    pub fn aspect(&self) -> Option<f64> {
        const FLAT: f64 = 1e-10;
        if self.dz_dx.abs() < FLAT && self.dz_dy.abs() < FLAT {
            return None;
        }
        let bearing = (-self.dz_dx).atan2(-self.dz_dy);
        Some(bearing.rem_euclid(std::f64::consts::TAU))
    }
}

/// Map the gradient of every cell of `dem` through `f`; `Float32` result
pub(crate) fn gradient_map<F>(dem: &Grid, z_factor: f64, tiling: &TilingConfig, f: F) -> Result<Grid>
where
    F: Fn(Gradient) -> f64,
{
    let cell = dem.cell_size();
    let mut reducer = reducer_fn(1, |inputs: &[Vec<f64>], out: &mut [f64]| {
        out[0] = Gradient::horn(&inputs[0], cell, z_factor).map_or(f64::NAN, &f);
    });
    let params = FocalParams {
        buffer: 1,
        tiling: *tiling,
        ..Default::default()
    };
    focal(std::slice::from_ref(dem), &mut reducer, &params, &mut NoProgress)?
        .into_iter()
        .next()
        .ok_or_else(|| Error::Algorithm("terrain reducer produced no output".into()))
}
