//! Hillshade (shaded relief)
//!
//! Illumination of the surface by a distant light source at the given
//! azimuth and altitude.

use super::gradient_map;
use gridcalc_core::error::{Error, Result};
use gridcalc_core::raster::Grid;
use gridcalc_tiled::TilingConfig;

/// Parameters for hillshade calculation
#[derive(Debug, Clone)]
pub struct HillshadeParams {
    /// Sun azimuth in degrees (0 = north, clockwise)
    pub azimuth: f64,
    /// Sun altitude in degrees above the horizon (0-90)
    pub altitude: f64,
    /// Vertical exaggeration
    pub z_factor: f64,
    /// Output range: false = 0-255, true = 0.0-1.0
    pub normalized: bool,
    pub tiling: TilingConfig,
}

impl Default for HillshadeParams {
    fn default() -> Self {
        Self {
            azimuth: 315.0,
            altitude: 45.0,
            z_factor: 1.0,
            normalized: false,
            tiling: TilingConfig::default(),
        }
    }
}

/// Shaded relief of `dem`, as a `Float32` grid.
///
/// Cells facing away from the light are 0. Edge cells and cells next to
/// missing ones are missing.
pub fn hillshade(dem: &Grid, params: &HillshadeParams) -> Result<Grid> {
    if !(0.0..=90.0).contains(&params.altitude) {
        return Err(Error::InvalidParameter {
            name: "altitude",
            value: params.altitude.to_string(),
            reason: "must be between 0 and 90 degrees".into(),
        });
    }

    let azimuth = params.azimuth.to_radians();
    let zenith = (90.0 - params.altitude).to_radians();
    let (sin_zenith, cos_zenith) = zenith.sin_cos();
    let scale = if params.normalized { 1.0 } else { 255.0 };

    gradient_map(dem, params.z_factor, &params.tiling, |g| {
        let slope = g.slope();
        // Flat cells see the sun at its altitude whatever the azimuth
        let facing = g.aspect().map_or(0.0, |aspect| (azimuth - aspect).cos());
        let shade = cos_zenith * slope.cos() + sin_zenith * slope.sin() * facing;
        let shade = shade.clamp(0.0, 1.0) * scale;
        if params.normalized {
            shade
        } else {
            shade.round()
        }
    })
}
