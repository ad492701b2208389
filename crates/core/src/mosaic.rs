//! Combining overlapping grids into one

use crate::align::{common_geometry, sample_nearest, ExtentMode};
use crate::error::{Error, Result};
use crate::raster::{Cells, ElementKind, Extent, Grid, GridGeometry};
use ndarray::Array2;
use std::ops::Range;

/// Merge grids over the union of their extents.
///
/// Where several grids cover a cell, the first non-missing value in argument
/// order wins; values are taken by nearest sampling at the coarsest cell
/// size. Cells no grid covers are missing. The element kind is the promotion
/// of the input kinds, widened to `Float32` only when the merged grid still
/// has missing cells.
pub fn mosaic(grids: &[Grid]) -> Result<Grid> {
    let target = common_geometry(ExtentMode::Union, grids)?;
    let first = grids.first().ok_or(Error::EmptyResult)?;
    let mut values = Array2::from_elem((target.rows, target.cols), f64::NAN);
    let mut kind = first.kind();

    for grid in grids {
        kind = kind.promote(grid.kind());
        let source = grid.to_f64();
        let transform = grid.transform();
        let (rows, cols) = footprint(&target, &grid.extent());
        for row in rows {
            for col in cols.clone() {
                let slot = &mut values[(row, col)];
                if !slot.is_nan() {
                    continue;
                }
                let (x, y) = target.transform.pixel_to_geo(col, row);
                let (sc, sr) = transform.geo_to_pixel(x, y);
                if let Some(v) = sample_nearest(&source, sc, sr) {
                    *slot = v;
                }
            }
        }
    }

    if !kind.is_float() && values.iter().any(|v| v.is_nan()) {
        kind = ElementKind::Float32;
    }

    Ok(Grid::new(Cells::from_f64(kind, &values), first.crs().copied(), target.transform)?
        .with_color_map(first.color_map()))
}

/// Target rows and columns whose centres may fall inside `extent`
fn footprint(target: &GridGeometry, extent: &Extent) -> (Range<usize>, Range<usize>) {
    let bounds = target.extent();
    let cs = target.cell_size();
    let span = |from: f64, to: f64, step: f64, len: usize| {
        let lo = (from / step).floor().max(0.0) as usize;
        let hi = (to / step).ceil().max(0.0) as usize;
        lo.min(len)..hi.min(len)
    };
    (
        span(bounds.ymax - extent.ymax, bounds.ymax - extent.ymin, cs.y, target.rows),
        span(extent.xmin - bounds.xmin, extent.xmax - bounds.xmin, cs.x, target.cols),
    )
}

impl Grid {
    /// Merge with other grids; `self` has the highest priority
    pub fn mosaic(&self, others: &[Grid]) -> Result<Grid> {
        let mut grids = Vec::with_capacity(others.len() + 1);
        grids.push(self.clone());
        grids.extend_from_slice(others);
        mosaic(&grids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::{ElementKind, Extent, GeoTransform};
    use ndarray::array;

    fn tile(xmin: f64, values: ndarray::Array2<f32>) -> Grid {
        let rows = values.nrows() as f64;
        Grid::new(values, None, GeoTransform::new(xmin, rows, 1.0, -1.0)).unwrap()
    }

    #[test]
    fn test_first_grid_wins_on_overlap() {
        let a = tile(0.0, array![[1.0, 2.0], [3.0, f32::NAN]]);
        let b = tile(1.0, array![[9.0, 9.0], [9.0, 9.0]]);
        let m = mosaic(&[a, b]).unwrap();
        assert_eq!(m.extent(), Extent::new(0.0, 0.0, 3.0, 2.0));
        assert_eq!(m.to_f64(), array![[1.0, 2.0, 9.0], [3.0, 9.0, 9.0]]);
    }

    #[test]
    fn test_gaps_stay_missing() {
        let a = tile(0.0, array![[1.0]]);
        let b = tile(2.0, array![[2.0]]);
        let m = a.mosaic(&[b]).unwrap();
        assert_eq!(m.shape(), (1, 3));
        assert!(m.get(0, 1).unwrap().is_nan());
        assert_eq!(m.get(0, 2).unwrap(), 2.0);
    }

    #[test]
    fn test_extent_is_union() {
        let a = tile(0.0, array![[1.0, 1.0]]);
        let b = tile(5.0, array![[2.0]]);
        let m = mosaic(&[b.clone(), a.clone()]).unwrap();
        assert_eq!(m.extent(), a.extent().union(&b.extent()));
    }

    #[test]
    fn test_wide_integers_survive_stitching() {
        let big = 16_777_217_i32;
        let left = Grid::new(array![[big, big + 1]], None, GeoTransform::new(0.0, 1.0, 1.0, -1.0)).unwrap();
        let right = Grid::new(array![[big + 2]], None, GeoTransform::new(2.0, 1.0, 1.0, -1.0)).unwrap();
        let m = mosaic(&[left.clone(), right.clone()]).unwrap();
        assert_eq!(m.kind(), ElementKind::Int32);
        assert_eq!(m.get(0, 0).unwrap(), 16_777_217.0);
        assert_eq!(m.get(0, 2).unwrap(), 16_777_219.0);

        let apart = right.with_transform(GeoTransform::new(3.0, 1.0, 1.0, -1.0)).unwrap();
        let m = mosaic(&[left, apart]).unwrap();
        assert_eq!(m.kind(), ElementKind::Float32);
        assert!(m.get(0, 2).unwrap().is_nan());
    }

    #[test]
    fn test_integer_kinds_promote() {
        let a = Grid::from_array(array![[1_u8, 2]]).unwrap();
        let b = Grid::from_array(array![[3_i16, 4]]).unwrap();
        let m = mosaic(&[a, b]).unwrap();
        assert_eq!(m.kind(), ElementKind::Int16);
        assert_eq!(m.to_f64(), array![[1.0, 2.0]]);
    }
}
