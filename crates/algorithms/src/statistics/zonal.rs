//! Zonal statistics
//!
//! Computes statistics for each zone defined by a zone grid. Zone values are
//! truncated to integer identifiers; cells whose zone is missing belong to no
//! zone.

use super::reduce::{MissingPolicy, Statistic};
use crate::algebra::align_pair;
use gridcalc_core::error::Result;
use gridcalc_core::raster::{ElementKind, Grid};
use std::collections::BTreeMap;

/// Values of `grid` grouped by zone, with the aligned grid pair
fn group_by_zone(grid: &Grid, zones: &Grid) -> Result<(Grid, Grid, BTreeMap<i32, Vec<f64>>)> {
    let (grid, zones) = align_pair(grid, zones)?;
    let mut groups: BTreeMap<i32, Vec<f64>> = BTreeMap::new();
    for (&v, &z) in grid.to_f64().iter().zip(zones.to_f64().iter()) {
        if !z.is_nan() {
            groups.entry(z as i32).or_default().push(v);
        }
    }
    Ok((grid, zones, groups))
}

/// The statistic of every zone, keyed by zone identifier
pub fn zonal_table(
    grid: &Grid,
    zones: &Grid,
    statistic: Statistic,
    policy: MissingPolicy,
) -> Result<BTreeMap<i32, f64>> {
    statistic.validate()?;
    let (_, _, groups) = group_by_zone(grid, zones)?;
    Ok(tabulate(groups, statistic, policy))
}

fn tabulate(
    groups: BTreeMap<i32, Vec<f64>>,
    statistic: Statistic,
    policy: MissingPolicy,
) -> BTreeMap<i32, f64> {
    let mut scratch = Vec::new();
    groups
        .into_iter()
        .map(|(zone, values)| (zone, statistic.compute(&values, policy, &mut scratch)))
        .collect()
}

/// Grid where each cell holds the statistic of its zone.
///
/// The grids are aligned on their intersection first. The result is
/// `Float32`; cells with a missing zone are missing.
pub fn zonal(grid: &Grid, zones: &Grid, statistic: Statistic, policy: MissingPolicy) -> Result<Grid> {
    statistic.validate()?;
    let (grid, zones, groups) = group_by_zone(grid, zones)?;
    let table = tabulate(groups, statistic, policy);

    let values = zones.to_f64().mapv(|z| {
        if z.is_nan() {
            f64::NAN
        } else {
            table.get(&(z as i32)).copied().unwrap_or(f64::NAN)
        }
    });
    grid.with_values(ElementKind::Float32, &values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use gridcalc_core::raster::GeoTransform;
    use ndarray::array;

    #[test]
    fn test_zonal_mean_and_table() {
        let values = Grid::from_array(array![[1.0_f32, 2.0, 3.0], [4.0, f32::NAN, 6.0]]).unwrap();
        let zones = Grid::from_array(array![[1_u8, 1, 2], [1, 2, 2]]).unwrap();

        let mean = zonal(&values, &zones, Statistic::Mean, MissingPolicy::Ignore).unwrap();
        assert_relative_eq!(mean.get(0, 0).unwrap(), 7.0 / 3.0, epsilon = 1e-6);
        assert_eq!(mean.get(1, 1).unwrap(), 4.5);

        let table = zonal_table(&values, &zones, Statistic::Count, MissingPolicy::Ignore).unwrap();
        assert_eq!(table.get(&1), Some(&3.0));
        assert_eq!(table.get(&2), Some(&2.0));

        let max = zonal(&values, &zones, Statistic::Max, MissingPolicy::Propagate).unwrap();
        assert!(max.get(0, 2).unwrap().is_nan());
        assert_eq!(max.get(0, 0).unwrap(), 4.0);
    }

    #[test]
    fn test_missing_zone_is_missing() {
        let values = Grid::from_array(array![[1_i32, 2]]).unwrap();
        let zones = Grid::from_array(array![[f32::NAN, 1.7]]).unwrap();
        let sum = zonal(&values, &zones, Statistic::Sum, MissingPolicy::Ignore).unwrap();
        assert!(sum.get(0, 0).unwrap().is_nan());
        assert_eq!(sum.get(0, 1).unwrap(), 2.0);
    }

    #[test]
    fn test_zones_are_aligned() {
        let values = Grid::new(array![[1.0_f32, 2.0, 3.0]], None, GeoTransform::new(0.0, 1.0, 1.0, -1.0))
            .unwrap();
        let zones = Grid::new(array![[5_i16, 5]], None, GeoTransform::new(1.0, 1.0, 1.0, -1.0)).unwrap();
        let r = zonal(&values, &zones, Statistic::Sum, MissingPolicy::Ignore).unwrap();
        assert_eq!(r.shape(), (1, 2));
        assert_eq!(r.to_f64(), array![[5.0, 5.0]]);
    }
}
