//! Aspect from elevation grids

use super::gradient_map;
use gridcalc_core::error::{Error, Result};
use gridcalc_core::raster::Grid;
use gridcalc_tiled::TilingConfig;
use std::str::FromStr;

/// Output format for aspect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AspectOutput {
    /// Degrees (0-360, 0 = north, clockwise)
    #[default]
    Degrees,
    /// Radians (0-2π)
    Radians,
    /// Compass sector N, NE, E, SE, S, SW, W, NW as 1-8
    Compass,
}

impl FromStr for AspectOutput {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "degrees" | "deg" => Ok(AspectOutput::Degrees),
            "radians" | "rad" => Ok(AspectOutput::Radians),
            "compass" => Ok(AspectOutput::Compass),
            other => Err(Error::InvalidParameter {
                name: "output",
                value: other.to_string(),
                reason: "expected degrees, radians or compass".into(),
            }),
        }
    }
}

/// 45 degree sector centred on each compass point, north = 1
fn compass_sector(degrees: f64) -> f64 {
    (((degrees + 22.5) / 45.0).floor() % 8.0) + 1.0
}

/// Direction of steepest descent at every cell, as a `Float32` grid.
///
/// Flat cells have no direction and are missing, as are edge cells and
/// cells next to missing ones.
pub fn aspect(dem: &Grid, output: AspectOutput, tiling: &TilingConfig) -> Result<Grid> {
    gradient_map(dem, 1.0, tiling, |g| match g.aspect() {
        None => f64::NAN,
        Some(radians) => match output {
            AspectOutput::Degrees => radians.to_degrees(),
            AspectOutput::Radians => radians,
            AspectOutput::Compass => compass_sector(radians.to_degrees()),
        },
    })
}
