//! Bringing several grids onto one common geometry
//!
//! Joint operations need cells that line up one to one. [`standardize`]
//! picks the coarsest cell size among the inputs (resampling to a finer grid
//! would invent precision) and either the intersection or the union of their
//! extents, then warps every grid that does not already match.

mod resample;

pub use resample::{AffineResampler, Reproject, Resampling};
pub(crate) use resample::sample_nearest;

use crate::crs;
use crate::error::{Error, Result};
use crate::raster::{Grid, GridGeometry};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::debug;

/// How the common extent is derived from the input extents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtentMode {
    /// Only the area every grid covers
    #[default]
    Intersect,
    /// The area any grid covers; uncovered cells become missing
    Union,
}

impl FromStr for ExtentMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "intersect" => Ok(ExtentMode::Intersect),
            "union" => Ok(ExtentMode::Union),
            other => Err(Error::InvalidParameter {
                name: "mode",
                value: other.to_string(),
                reason: "expected intersect or union".into(),
            }),
        }
    }
}

/// Align grids with nearest-neighbour resampling.
///
/// See [`standardize_with`].
pub fn standardize(mode: ExtentMode, grids: &[Grid]) -> Result<Vec<Grid>> {
    standardize_with(mode, grids, Resampling::Nearest, &AffineResampler)
}

/// Common geometry of `grids` under `mode`.
///
/// - every grid must declare the same CRS
/// - a single grid keeps its own geometry
/// - cell size is the component-wise maximum of the inputs
/// - extent is their intersection or union, per `mode`
pub fn common_geometry(mode: ExtentMode, grids: &[Grid]) -> Result<GridGeometry> {
    let (first, rest) = grids.split_first().ok_or_else(|| Error::InvalidParameter {
        name: "grids",
        value: "0".into(),
        reason: "at least one grid is required".into(),
    })?;

    if rest.is_empty() {
        return Ok(first.geometry());
    }

    if let Some(other) = rest
        .iter()
        .find(|g| !crs::same_reference_system(first.crs(), g.crs()))
    {
        return Err(Error::IncompatibleReferenceSystem(
            crs::describe(first.crs()),
            crs::describe(other.crs()),
        ));
    }

    let mut cell_size = first.cell_size();
    let mut extent = first.extent();
    for grid in rest {
        cell_size = cell_size.max(&grid.cell_size());
        extent = match mode {
            ExtentMode::Intersect => extent.intersect(&grid.extent()),
            ExtentMode::Union => extent.union(&grid.extent()),
        };
    }

    GridGeometry::from_extent(&extent, cell_size)
}

/// Align grids onto their [`common_geometry`].
///
/// Grids whose cell size differs from the target are warped with
/// `resampling`; grids that differ only in extent are clipped/padded with
/// nearest sampling. All returned grids share one transform and shape, and a
/// single grid is returned unchanged.
pub fn standardize_with(
    mode: ExtentMode,
    grids: &[Grid],
    resampling: Resampling,
    reproject: &dyn Reproject,
) -> Result<Vec<Grid>> {
    let target = common_geometry(mode, grids)?;
    if grids.len() == 1 {
        return Ok(grids.to_vec());
    }

    let target_crs = grids.first().and_then(Grid::crs);
    let cell_size = target.cell_size();
    grids
        .iter()
        .enumerate()
        .map(|(i, grid)| {
            if grid.geometry().matches(&target) {
                return Ok(grid.clone());
            }
            let method = if grid.cell_size().approx_eq(&cell_size, 1e-9) {
                Resampling::Nearest
            } else {
                resampling
            };
            debug!(
                input = i,
                from = %grid.extent(),
                to = %target.extent(),
                cell = %cell_size,
                %method,
                "aligning grid"
            );
            reproject.warp(grid, &target, target_crs, method)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::{CellSize, ElementKind, Extent, GeoTransform};
    use crate::CRS;
    use ndarray::{array, Array2};
    use std::cell::RefCell;

    fn grid_at(xmin: f64, ymax: f64, cell: f64, rows: usize, cols: usize) -> Grid {
        let values = Array2::from_shape_fn((rows, cols), |(r, c)| (r * cols + c) as f32);
        Grid::new(values, Some(CRS::from_epsg(32633)), GeoTransform::new(xmin, ymax, cell, -cell))
            .unwrap()
    }

    #[test]
    fn test_single_grid_is_identity() {
        let g = grid_at(0.0, 2.0, 1.0, 2, 2);
        let out = standardize(ExtentMode::Union, std::slice::from_ref(&g)).unwrap();
        assert_eq!(out, vec![g]);
    }

    #[test]
    fn test_empty_input_is_rejected() {
        assert!(standardize(ExtentMode::Intersect, &[]).is_err());
    }

    #[test]
    fn test_identical_geometry_is_unchanged() {
        let a = grid_at(0.0, 3.0, 1.0, 3, 3);
        let b = grid_at(0.0, 3.0, 1.0, 3, 3);
        for mode in [ExtentMode::Intersect, ExtentMode::Union] {
            let out = standardize(mode, &[a.clone(), b.clone()]).unwrap();
            assert_eq!(out[0], a);
            assert_eq!(out[1], b);
        }
    }

    #[test]
    fn test_mismatched_crs_fails() {
        let a = grid_at(0.0, 2.0, 1.0, 2, 2);
        let b = grid_at(0.0, 2.0, 1.0, 2, 2).with_crs(Some(CRS::from_epsg(4326)));
        let c = grid_at(0.0, 2.0, 1.0, 2, 2).with_crs(None);
        assert!(matches!(
            standardize(ExtentMode::Intersect, &[a.clone(), b]),
            Err(Error::IncompatibleReferenceSystem(_, _))
        ));
        assert!(matches!(
            standardize(ExtentMode::Union, &[a, c]),
            Err(Error::IncompatibleReferenceSystem(_, _))
        ));
    }

    #[test]
    fn test_offset_grids_intersect_and_union() {
        let a = grid_at(0.0, 2.0, 1.0, 2, 2);
        let b = grid_at(1.0, 2.0, 1.0, 2, 2);

        let inter = standardize(ExtentMode::Intersect, &[a.clone(), b.clone()]).unwrap();
        for g in &inter {
            assert_eq!((g.cols(), g.rows()), (1, 2));
            assert_eq!(g.extent(), Extent::new(1.0, 0.0, 2.0, 2.0));
        }
        assert_eq!(inter[0].to_f64(), array![[1.0], [3.0]]);
        assert_eq!(inter[1].to_f64(), array![[0.0], [2.0]]);

        let union = standardize(ExtentMode::Union, &[a, b]).unwrap();
        for g in &union {
            assert_eq!((g.cols(), g.rows()), (3, 2));
            assert_eq!(g.extent(), Extent::new(0.0, 0.0, 3.0, 2.0));
        }
        assert!(union[0].get(0, 2).unwrap().is_nan());
        assert!(union[0].get(1, 2).unwrap().is_nan());
        assert!(union[1].get(0, 0).unwrap().is_nan());
        assert!(union[1].get(1, 0).unwrap().is_nan());
        assert_eq!(union[1].get(0, 1).unwrap(), 0.0);
    }

    #[test]
    fn test_coarsest_cell_size_wins() {
        let fine = grid_at(0.0, 4.0, 1.0, 4, 4).cast(ElementKind::Int16);
        let coarse = grid_at(0.0, 4.0, 2.0, 2, 2);
        let out = standardize(ExtentMode::Intersect, &[fine, coarse.clone()]).unwrap();
        assert_eq!(out[0].cell_size(), CellSize::square(2.0));
        assert_eq!(out[0].shape(), (2, 2));
        assert_eq!(out[0].kind(), ElementKind::Int16);
        assert_eq!(out[1], coarse);
        assert_eq!(out[0].transform(), out[1].transform());
    }

    #[test]
    fn test_disjoint_intersection_fails() {
        let a = grid_at(0.0, 2.0, 1.0, 2, 2);
        let b = grid_at(5.0, 2.0, 1.0, 2, 2);
        assert!(matches!(
            standardize(ExtentMode::Intersect, &[a, b]),
            Err(Error::DisjointExtents)
        ));
    }

    /// Records the method chosen for each warped grid
    struct Recording(RefCell<Vec<(f64, Resampling)>>);

    impl Reproject for Recording {
        fn warp(
            &self,
            grid: &Grid,
            target: &GridGeometry,
            target_crs: Option<&CRS>,
            method: Resampling,
        ) -> Result<Grid> {
            self.0.borrow_mut().push((grid.cell_size().x, method));
            AffineResampler.warp(grid, target, target_crs, method)
        }
    }

    #[test]
    fn test_method_depends_on_cell_size() {
        let fine = grid_at(0.0, 4.0, 1.0, 4, 4);
        let coarse = grid_at(0.0, 4.0, 2.0, 2, 2);
        let shifted = grid_at(2.0, 4.0, 2.0, 2, 2);
        let on_target = grid_at(2.0, 4.0, 2.0, 2, 1);

        let recording = Recording(RefCell::new(Vec::new()));
        let out = standardize_with(
            ExtentMode::Intersect,
            &[fine, coarse, shifted, on_target.clone()],
            Resampling::Bilinear,
            &recording,
        )
        .unwrap();

        assert_eq!(
            recording.0.into_inner(),
            vec![
                (1.0, Resampling::Bilinear),
                (2.0, Resampling::Nearest),
                (2.0, Resampling::Nearest),
            ]
        );
        assert_eq!(out[3], on_target);
        assert!(out.iter().all(|g| g.shape() == (2, 1)));
        assert_eq!(out[0].kind(), ElementKind::Float32);
        assert_eq!(out[1].get(1, 0).unwrap(), 3.0);
    }

    #[test]
    fn test_mode_names() {
        assert_eq!("UNION".parse::<ExtentMode>().unwrap(), ExtentMode::Union);
        assert!("overlap".parse::<ExtentMode>().is_err());
    }
}
