//! Resampling a grid onto another geometry in the same reference system

use crate::crs::{self, CRS};
use crate::error::{Error, Result};
use crate::raster::{Cells, CellSize, ElementKind, Extent, Grid, GridGeometry};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Resampling algorithm used when cell centres do not line up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resampling {
    #[default]
    Nearest,
    Bilinear,
    Cubic,
}

impl fmt::Display for Resampling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Resampling::Nearest => "nearest",
            Resampling::Bilinear => "bilinear",
            Resampling::Cubic => "cubic",
        })
    }
}

impl FromStr for Resampling {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "nearest" => Ok(Resampling::Nearest),
            "bilinear" => Ok(Resampling::Bilinear),
            "cubic" => Ok(Resampling::Cubic),
            other => Err(Error::InvalidParameter {
                name: "resampling",
                value: other.to_string(),
                reason: "expected nearest, bilinear or cubic".into(),
            }),
        }
    }
}

/// Moves a grid's cells onto a target geometry.
///
/// The alignment protocol calls this whenever a grid's cell size or extent
/// differs from the common target. Implementations that understand map
/// projections can accept a `target_crs` different from the grid's own.
pub trait Reproject {
    fn warp(
        &self,
        grid: &Grid,
        target: &GridGeometry,
        target_crs: Option<&CRS>,
        method: Resampling,
    ) -> Result<Grid>;
}

/// Same-CRS resampler sampling source values at target cell centres.
///
/// Target cells whose centre falls outside the source are missing. Nearest
/// keeps the element kind when every target cell is covered; otherwise (and
/// always for bilinear/cubic) the result is `Float32`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AffineResampler;

impl Reproject for AffineResampler {
    fn warp(
        &self,
        grid: &Grid,
        target: &GridGeometry,
        target_crs: Option<&CRS>,
        method: Resampling,
    ) -> Result<Grid> {
        if !crs::same_reference_system(grid.crs(), target_crs) {
            return Err(Error::IncompatibleReferenceSystem(
                crs::describe(grid.crs()),
                crs::describe(target_crs),
            ));
        }

        let source = grid.to_f64();
        let src_transform = grid.transform();
        let mut covered = true;

        let values = Array2::from_shape_fn((target.rows, target.cols), |(row, col)| {
            let (x, y) = target.transform.pixel_to_geo(col, row);
            let (sc, sr) = src_transform.geo_to_pixel(x, y);
            let value = match method {
                Resampling::Nearest => sample_nearest(&source, sc, sr),
                Resampling::Bilinear => sample_bilinear(&source, sc, sr),
                Resampling::Cubic => sample_cubic(&source, sc, sr),
            };
            value.unwrap_or_else(|| {
                covered = false;
                f64::NAN
            })
        });

        let kind = if method == Resampling::Nearest && covered {
            grid.kind()
        } else {
            ElementKind::Float32
        };

        Ok(Grid::new(Cells::from_f64(kind, &values), target_crs.copied(), target.transform)?
            .with_color_map(grid.color_map()))
    }
}

/// Source index of the cell containing fractional pixel position `p`
fn cell_index(p: f64, len: usize) -> Option<usize> {
    if p >= 0.0 && p < len as f64 {
        Some(p.floor() as usize)
    } else {
        None
    }
}

pub(crate) fn sample_nearest(source: &Array2<f64>, col: f64, row: f64) -> Option<f64> {
    let (rows, cols) = source.dim();
    let c = cell_index(col, cols)?;
    let r = cell_index(row, rows)?;
    Some(source[(r, c)])
}

/// Clamp a signed index into `0..len`
fn clamped(i: isize, len: usize) -> usize {
    i.clamp(0, len as isize - 1) as usize
}

fn sample_bilinear(source: &Array2<f64>, col: f64, row: f64) -> Option<f64> {
    let (rows, cols) = source.dim();
    cell_index(col, cols)?;
    cell_index(row, rows)?;

    // Distances are measured between cell centres
    let fx = col - 0.5;
    let fy = row - 0.5;
    let x0 = fx.floor();
    let y0 = fy.floor();
    let tx = fx - x0;
    let ty = fy - y0;
    let (x0, y0) = (x0 as isize, y0 as isize);

    let at = |r: isize, c: isize| source[(clamped(r, rows), clamped(c, cols))];
    let top = at(y0, x0) * (1.0 - tx) + at(y0, x0 + 1) * tx;
    let bottom = at(y0 + 1, x0) * (1.0 - tx) + at(y0 + 1, x0 + 1) * tx;
    Some(top * (1.0 - ty) + bottom * ty)
}

/// Keys cubic convolution kernel with a = -0.5
fn cubic_weight(t: f64) -> f64 {
    let t = t.abs();
    if t <= 1.0 {
        1.5 * t * t * t - 2.5 * t * t + 1.0
    } else if t < 2.0 {
        -0.5 * t * t * t + 2.5 * t * t - 4.0 * t + 2.0
    } else {
        0.0
    }
}

fn sample_cubic(source: &Array2<f64>, col: f64, row: f64) -> Option<f64> {
    let (rows, cols) = source.dim();
    cell_index(col, cols)?;
    cell_index(row, rows)?;

    let fx = col - 0.5;
    let fy = row - 0.5;
    let x0 = fx.floor() as isize;
    let y0 = fy.floor() as isize;

    let mut value = 0.0;
    for dy in -1..=2 {
        let wy = cubic_weight(fy - (y0 + dy) as f64);
        for dx in -1..=2 {
            let wx = cubic_weight(fx - (x0 + dx) as f64);
            value += wy * wx * source[(clamped(y0 + dy, rows), clamped(x0 + dx, cols))];
        }
    }
    Some(value)
}

impl Grid {
    /// Move this grid onto `target` with the built-in same-CRS resampler
    pub fn warp(&self, target: &GridGeometry, method: Resampling) -> Result<Grid> {
        AffineResampler.warp(self, target, self.crs(), method)
    }

    /// Change the cell size, keeping (approximately) the same extent
    pub fn resample(&self, cell_size: CellSize, method: Resampling) -> Result<Grid> {
        let target = GridGeometry::from_extent(&self.extent(), cell_size)?;
        self.warp(&target, method)
    }

    /// Clip or pad to `extent`, keeping the cell size; new cells are missing
    pub fn clip(&self, extent: &Extent) -> Result<Grid> {
        let target = GridGeometry::from_extent(extent, self.cell_size())?;
        self.warp(&target, Resampling::Nearest)
    }

    /// Clip to the smallest extent covering every non-missing cell
    pub fn shrink(&self) -> Result<Grid> {
        self.clip(&self.data_extent()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::GeoTransform;
    use approx::assert_relative_eq;
    use ndarray::array;

    fn grid_4x4() -> Grid {
        let values = Array2::from_shape_fn((4, 4), |(r, c)| (r * 4 + c) as i32);
        Grid::new(values, None, GeoTransform::new(0.0, 4.0, 1.0, -1.0)).unwrap()
    }

    #[test]
    fn test_clip_inside_keeps_kind() {
        let clipped = grid_4x4().clip(&Extent::new(1.0, 1.0, 3.0, 3.0)).unwrap();
        assert_eq!(clipped.kind(), ElementKind::Int32);
        assert_eq!(clipped.shape(), (2, 2));
        assert_eq!(clipped.to_f64(), array![[5.0, 6.0], [9.0, 10.0]]);
    }

    #[test]
    fn test_clip_outside_pads_with_missing() {
        let padded = grid_4x4().clip(&Extent::new(-1.0, 0.0, 4.0, 5.0)).unwrap();
        assert_eq!(padded.kind(), ElementKind::Float32);
        assert_eq!(padded.shape(), (5, 5));
        assert!(padded.get(0, 0).unwrap().is_nan());
        assert!(padded.get(3, 0).unwrap().is_nan());
        assert_eq!(padded.get(1, 1).unwrap(), 0.0);
        assert_eq!(padded.get(4, 4).unwrap(), 15.0);
    }

    #[test]
    fn test_shrink_to_data() {
        let grid = Grid::new(
            array![
                [f32::NAN, f32::NAN, f32::NAN],
                [f32::NAN, 1.0, 2.0],
                [f32::NAN, f32::NAN, f32::NAN]
            ],
            None,
            GeoTransform::new(0.0, 3.0, 1.0, -1.0),
        )
        .unwrap();
        let shrunk = grid.shrink().unwrap();
        assert_eq!(shrunk.extent(), Extent::new(1.0, 1.0, 3.0, 2.0));
        assert_eq!(shrunk.to_f64(), array![[1.0, 2.0]]);

        let empty = Grid::from_array(array![[f32::NAN]]).unwrap();
        assert!(matches!(empty.shrink(), Err(Error::EmptyResult)));
    }

    #[test]
    fn test_nearest_coarsening() {
        let coarse = grid_4x4().resample(CellSize::square(2.0), Resampling::Nearest).unwrap();
        assert_eq!(coarse.shape(), (2, 2));
        // Centre of the first 2x2 block lands on the corner shared by cells 0, 1, 4, 5
        assert_eq!(coarse.get(0, 0).unwrap(), 5.0);
        assert_eq!(coarse.kind(), ElementKind::Int32);
    }

    #[test]
    fn test_bilinear_on_constant_gradient() {
        let coarse = grid_4x4().resample(CellSize::square(2.0), Resampling::Bilinear).unwrap();
        assert_eq!(coarse.kind(), ElementKind::Float32);
        assert_relative_eq!(coarse.get(0, 0).unwrap(), 2.5, epsilon = 1e-6);
        assert_relative_eq!(coarse.get(1, 1).unwrap(), 12.5, epsilon = 1e-6);
    }

    #[test]
    fn test_cubic_reproduces_linear_ramp() {
        let ramp = Array2::from_shape_fn((8, 8), |(_, c)| c as f32);
        let grid = Grid::new(ramp, None, GeoTransform::new(0.0, 8.0, 1.0, -1.0)).unwrap();
        let target = GridGeometry::new(GeoTransform::new(2.5, 6.0, 1.0, -1.0), 2, 2);
        let warped = grid.warp(&target, Resampling::Cubic).unwrap();
        assert_relative_eq!(warped.get(0, 0).unwrap(), 2.5, epsilon = 1e-6);
        assert_relative_eq!(warped.get(1, 1).unwrap(), 3.5, epsilon = 1e-6);
    }

    #[test]
    fn test_warp_refuses_other_crs() {
        let grid = grid_4x4().with_crs(Some(CRS::from_epsg(4326)));
        let target = grid.geometry();
        let result = AffineResampler.warp(&grid, &target, Some(&CRS::from_epsg(3857)), Resampling::Nearest);
        assert!(matches!(result, Err(Error::IncompatibleReferenceSystem(_, _))));
    }

    #[test]
    fn test_resampling_names() {
        assert_eq!("Bilinear".parse::<Resampling>().unwrap(), Resampling::Bilinear);
        assert!("lanczos".parse::<Resampling>().is_err());
    }
}
