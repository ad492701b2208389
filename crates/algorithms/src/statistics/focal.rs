//! Focal (moving window) statistics
//!
//! Computes statistics within a moving window centred on each cell. Large
//! grids are processed in tiles with a halo of `buffer` cells, so memory use
//! stays bounded while the result matches a single pass exactly.

use super::reduce::{MissingPolicy, Statistic};
use super::window::{FocalReducer, Neighborhoods, StatisticReducer};
use gridcalc_core::error::{Error, Result};
use gridcalc_core::raster::{ElementKind, Grid, Neighborhood};
use gridcalc_tiled::{run_tiled, NoProgress, Progress, TilingConfig};
use ndarray::Zip;

/// Parameters for focal operations
#[derive(Debug, Clone)]
pub struct FocalParams {
    /// Window radius (window size = 2 * buffer + 1)
    pub buffer: usize,
    /// Whether to use a circular window (default: false = square)
    pub circular: bool,
    /// Treatment of missing cells inside the window
    pub policy: MissingPolicy,
    /// Memory bound for tiled execution
    pub tiling: TilingConfig,
}

impl Default for FocalParams {
    fn default() -> Self {
        Self {
            buffer: 1,
            circular: false,
            policy: MissingPolicy::Ignore,
            tiling: TilingConfig::default(),
        }
    }
}

impl FocalParams {
    pub fn neighborhood(&self) -> Neighborhood {
        Neighborhood::new(self.buffer, self.circular)
    }
}

/// Run `reducer` over the windows of `grids`, tiling as needed.
///
/// Grids are aligned onto their common intersection first. Returns one
/// `Float32` grid per reducer output.
pub fn focal(
    grids: &[Grid],
    reducer: &mut dyn FocalReducer,
    params: &FocalParams,
    progress: &mut dyn Progress,
) -> Result<Vec<Grid>> {
    let neighborhood = params.neighborhood();
    run_tiled(
        |tile| Neighborhoods::extract(tile, neighborhood)?.reduce_to_grids(reducer),
        params.buffer,
        grids,
        &params.tiling,
        progress,
    )
}

/// Run `reducer` once over already aligned grids, without tiling
pub fn focal_pass(
    grids: &[Grid],
    reducer: &mut dyn FocalReducer,
    neighborhood: Neighborhood,
) -> Result<Vec<Grid>> {
    Neighborhoods::extract(grids, neighborhood)?.reduce_to_grids(reducer)
}

/// A single focal statistic of one grid
pub fn focal_statistic(grid: &Grid, statistic: Statistic, params: &FocalParams) -> Result<Grid> {
    statistic.validate()?;
    let mut reducer = StatisticReducer::new(statistic, params.policy);
    focal(std::slice::from_ref(grid), &mut reducer, params, &mut NoProgress)?
        .into_iter()
        .next()
        .ok_or_else(|| Error::Algorithm("focal reducer produced no output".into()))
}

macro_rules! focal_fns {
    ($($(#[$doc:meta])* $name:ident => $stat:ident),* $(,)?) => {
        $(
            $(#[$doc])*
            pub fn $name(grid: &Grid, params: &FocalParams) -> Result<Grid> {
                focal_statistic(grid, Statistic::$stat, params)
            }
        )*
    };
}

focal_fns! {
    focal_mean => Mean,
    focal_sum => Sum,
    /// Number of non-missing cells in the window
    focal_count => Count,
    /// Population standard deviation
    focal_std => StdDev,
    /// Population variance
    focal_var => Variance,
    focal_min => Min,
    focal_max => Max,
    focal_median => Median,
    /// Max - min in the window
    focal_range => Range,
}

/// Percentile (0-100) of the window
pub fn focal_percentile(grid: &Grid, percentile: f64, params: &FocalParams) -> Result<Grid> {
    focal_statistic(grid, Statistic::Percentile(percentile), params)
}

/// Quantile (0-1) of the window
pub fn focal_quantile(grid: &Grid, quantile: f64, params: &FocalParams) -> Result<Grid> {
    focal_statistic(grid, Statistic::Quantile(quantile), params)
}

/// Largest supported `max_exponent` for [`fill_missing`]
pub const MAX_FILL_EXPONENT: u32 = 12;

/// Fill missing cells with the mean of growing circular neighbourhoods.
///
/// Round `n` (0..=max_exponent) replaces each still-missing cell with the
/// mean of the non-missing cells within radius 2^n. Cells that remain
/// missing after the last round stay missing.
pub fn fill_missing(grid: &Grid, max_exponent: u32) -> Result<Grid> {
    fill_missing_with(grid, max_exponent, &TilingConfig::default(), &mut NoProgress)
}

/// [`fill_missing`] with explicit tiling and progress
pub fn fill_missing_with(
    grid: &Grid,
    max_exponent: u32,
    tiling: &TilingConfig,
    progress: &mut dyn Progress,
) -> Result<Grid> {
    if max_exponent > MAX_FILL_EXPONENT {
        return Err(Error::InvalidParameter {
            name: "max_exponent",
            value: max_exponent.to_string(),
            reason: format!("must be at most {}", MAX_FILL_EXPONENT),
        });
    }
    if !grid.has_missing() {
        return Ok(grid.clone());
    }

    // A cell's final value depends on cells up to the sum of all radii away
    let reach = (1_usize << (max_exponent + 1)) - 1;
    let bounds = grid.extent();
    let mut reducer = StatisticReducer::new(Statistic::Mean, MissingPolicy::Ignore);

    let compute = |tile: &[Grid]| -> Result<Vec<Grid>> {
        let first = &tile[0];
        let transform = *first.transform();
        // Halo cells outside the source grid must stay missing in every round
        let inside = ndarray::Array2::from_shape_fn(first.shape(), |(r, c)| {
            let (x, y) = transform.pixel_to_geo(c, r);
            x > bounds.xmin && x < bounds.xmax && y > bounds.ymin && y < bounds.ymax
        });

        let mut values = first.to_f64();
        for n in 0..=max_exponent {
            let pending = Zip::from(&values)
                .and(&inside)
                .fold(false, |acc, v, &i| acc || (i && v.is_nan()));
            if !pending {
                break;
            }
            let current = first.with_values(ElementKind::Float32, &values)?;
            let mean = focal_pass(&[current], &mut reducer, Neighborhood::Circle(1 << n))?
                .into_iter()
                .next()
                .ok_or_else(|| Error::Algorithm("focal reducer produced no output".into()))?
                .to_f64();
            Zip::from(&mut values)
                .and(&mean)
                .and(&inside)
                .for_each(|v, &m, &i| {
                    if i && v.is_nan() {
                        *v = m;
                    }
                });
        }
        Ok(vec![first.with_values(grid.kind(), &values)?])
    };

    run_tiled(compute, reach, std::slice::from_ref(grid), tiling, progress)?
        .into_iter()
        .next()
        .ok_or_else(|| Error::Algorithm("fill produced no output".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use gridcalc_core::raster::GeoTransform;
    use ndarray::{array, Array2};

    fn uniform_grid(size: usize, value: f32) -> Grid {
        Grid::new(
            Array2::from_elem((size, size), value),
            None,
            GeoTransform::new(0.0, size as f64, 1.0, -1.0),
        )
        .unwrap()
    }

    fn gradient_grid(size: usize) -> Grid {
        let values = Array2::from_shape_fn((size, size), |(r, c)| (r * size + c) as f32);
        Grid::new(values, None, GeoTransform::new(0.0, size as f64, 1.0, -1.0)).unwrap()
    }

    #[test]
    fn test_focal_mean_uniform() {
        let result = focal_mean(&uniform_grid(10, 5.0), &FocalParams::default()).unwrap();
        assert_relative_eq!(result.get(5, 5).unwrap(), 5.0);
        assert_eq!(result.kind(), ElementKind::Float32);
    }

    #[test]
    fn test_focal_min_max() {
        let r = gradient_grid(10);
        let params = FocalParams::default();
        // Cell (5,5) = 55, neighbours span (4,4)=44 to (6,6)=66
        assert_eq!(focal_min(&r, &params).unwrap().get(5, 5).unwrap(), 44.0);
        assert_eq!(focal_max(&r, &params).unwrap().get(5, 5).unwrap(), 66.0);
        assert_eq!(focal_range(&r, &params).unwrap().get(5, 5).unwrap(), 22.0);
    }

    #[test]
    fn test_focal_std_uniform() {
        let result = focal_std(&uniform_grid(10, 5.0), &FocalParams::default()).unwrap();
        assert!(result.get(5, 5).unwrap().abs() < 1e-10);
    }

    #[test]
    fn test_focal_sum_and_count_at_edges() {
        let params = FocalParams::default();
        let sum = focal_sum(&uniform_grid(10, 1.0), &params).unwrap();
        assert_eq!(sum.get(5, 5).unwrap(), 9.0);
        assert_eq!(sum.get(0, 0).unwrap(), 4.0);
        let count = focal_count(&uniform_grid(10, 1.0), &params).unwrap();
        assert_eq!(count.get(0, 5).unwrap(), 6.0);
    }

    #[test]
    fn test_focal_median_and_percentile() {
        let r = gradient_grid(10);
        let params = FocalParams::default();
        assert_eq!(focal_median(&r, &params).unwrap().get(5, 5).unwrap(), 55.0);
        assert_eq!(focal_percentile(&r, 100.0, &params).unwrap().get(5, 5).unwrap(), 66.0);
        assert_eq!(focal_quantile(&r, 0.0, &params).unwrap().get(5, 5).unwrap(), 44.0);
        assert!(focal_percentile(&r, 101.0, &params).is_err());
    }

    #[test]
    fn test_focal_circular() {
        let params = FocalParams {
            buffer: 2,
            circular: true,
            ..Default::default()
        };
        let result = focal_count(&uniform_grid(10, 1.0), &params).unwrap();
        assert_eq!(result.get(5, 5).unwrap(), 13.0);
    }

    #[test]
    fn test_propagate_policy() {
        let grid = Grid::from_array(array![[1.0_f32, 2.0, 3.0], [4.0, f32::NAN, 6.0], [7.0, 8.0, 9.0]]).unwrap();
        let params = FocalParams {
            buffer: 0,
            policy: MissingPolicy::Propagate,
            ..Default::default()
        };
        let result = focal_mean(&grid, &params).unwrap();
        assert!(result.get(1, 1).unwrap().is_nan());
        assert_eq!(result.get(0, 0).unwrap(), 1.0);
    }

    #[test]
    fn test_fill_missing() {
        let grid = Grid::from_array(array![
            [1.0_f32, 1.0, 1.0, 1.0],
            [1.0, f32::NAN, f32::NAN, 1.0],
            [1.0, f32::NAN, f32::NAN, 1.0],
            [3.0, 3.0, 3.0, 3.0]
        ])
        .unwrap();
        let filled = fill_missing(&grid, 2).unwrap();
        assert!(!filled.has_missing());
        // Radius 1 circle around (1,1) sees (0,1) and (1,0)
        assert_eq!(filled.get(1, 1).unwrap(), 1.0);
        assert_eq!(filled.get(2, 1).unwrap(), 2.0);
        assert_eq!(filled.get(0, 0).unwrap(), 1.0);
    }

    #[test]
    fn test_reducer_with_unchecked_quantile() {
        let grid = Grid::from_array(array![[1.0_f32, 2.0], [3.0, 4.0]]).unwrap();
        let mut reducer = StatisticReducer::new(Statistic::Quantile(1.5), MissingPolicy::Ignore);
        let out = focal(&[grid], &mut reducer, &FocalParams::default(), &mut NoProgress).unwrap();
        assert_eq!(out[0].to_f64(), array![[4.0, 4.0], [4.0, 4.0]]);
    }

    #[test]
    fn test_fill_missing_largest_reach_on_small_grid() {
        let grid = Grid::from_array(array![
            [1.0_f32, 2.0, 3.0],
            [4.0, f32::NAN, 6.0],
            [7.0, 8.0, 9.0]
        ])
        .unwrap();
        let filled = fill_missing(&grid, MAX_FILL_EXPONENT).unwrap();
        // Radius 1 circle: 2, 4, 6 and 8
        assert_eq!(filled.get(1, 1).unwrap(), 5.0);
        assert_eq!(filled.get(0, 0).unwrap(), 1.0);
    }

    #[test]
    fn test_fill_missing_without_gaps_is_identity() {
        let grid = Grid::from_array(array![[1_u8, 2], [3, 4]]).unwrap();
        assert_eq!(fill_missing(&grid, 4).unwrap(), grid);
        assert!(fill_missing(&grid, 40).is_err());
    }
}
