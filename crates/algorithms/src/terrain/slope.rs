//! Slope from elevation grids

use super::gradient_map;
use gridcalc_core::error::{Error, Result};
use gridcalc_core::raster::Grid;
use gridcalc_tiled::TilingConfig;
use std::str::FromStr;

/// Units for slope output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SlopeUnits {
    /// Degrees (0-90)
    #[default]
    Degrees,
    /// Rise over run times 100
    Percent,
    /// Radians (0-π/2)
    Radians,
}

impl FromStr for SlopeUnits {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "degrees" | "deg" => Ok(SlopeUnits::Degrees),
            "percent" => Ok(SlopeUnits::Percent),
            "radians" | "rad" => Ok(SlopeUnits::Radians),
            other => Err(Error::InvalidParameter {
                name: "units",
                value: other.to_string(),
                reason: "expected degrees, percent or radians".into(),
            }),
        }
    }
}

/// Parameters for slope calculation
#[derive(Debug, Clone)]
pub struct SlopeParams {
    pub units: SlopeUnits,
    /// Multiplier from elevation units to horizontal units
    pub z_factor: f64,
    pub tiling: TilingConfig,
}

impl Default for SlopeParams {
    fn default() -> Self {
        Self {
            units: SlopeUnits::Degrees,
            z_factor: 1.0,
            tiling: TilingConfig::default(),
        }
    }
}

/// Steepness of `dem` at every cell, as a `Float32` grid.
///
/// Edge cells and cells next to missing ones are missing.
pub fn slope(dem: &Grid, params: &SlopeParams) -> Result<Grid> {
    let units = params.units;
    gradient_map(dem, params.z_factor, &params.tiling, |g| {
        let radians = g.slope();
        match units {
            SlopeUnits::Degrees => radians.to_degrees(),
            SlopeUnits::Percent => g.dz_dx.hypot(g.dz_dy) * 100.0,
            SlopeUnits::Radians => radians,
        }
    })
}
