//! Cell-wise operations across several grids and value reclassification

use crate::statistics::{MissingPolicy, Statistic};
use gridcalc_core::align::{standardize, ExtentMode};
use gridcalc_core::error::{Error, Result};
use gridcalc_core::raster::{ElementKind, Grid};
use ndarray::Array2;

/// Combine grids cell by cell with `statistic`.
///
/// Grids are aligned on their intersection. A missing cell in any grid makes
/// the result cell missing. `Min` and `Max` keep the promoted input kind;
/// every other statistic gives `Float32`.
pub fn aggregate(grids: &[Grid], statistic: Statistic) -> Result<Grid> {
    statistic.validate()?;
    let aligned = standardize(ExtentMode::Intersect, grids)?;
    let first = &aligned[0];
    let arrays: Vec<Array2<f64>> = aligned.iter().map(Grid::to_f64).collect();

    let mut column = Vec::with_capacity(arrays.len());
    let mut scratch = Vec::with_capacity(arrays.len());
    let values = Array2::from_shape_fn(first.shape(), |idx| {
        column.clear();
        column.extend(arrays.iter().map(|a| a[idx]));
        statistic.compute(&column, MissingPolicy::Propagate, &mut scratch)
    });

    let kind = match statistic {
        Statistic::Min | Statistic::Max => aligned
            .iter()
            .map(Grid::kind)
            .reduce(ElementKind::promote)
            .unwrap_or(ElementKind::Float32),
        _ => ElementKind::Float32,
    };
    first.with_values(kind, &values)
}

/// Cell-wise mean of several grids
pub fn mean(grids: &[Grid]) -> Result<Grid> {
    aggregate(grids, Statistic::Mean)
}

/// Cell-wise population standard deviation of several grids
pub fn std(grids: &[Grid]) -> Result<Grid> {
    aggregate(grids, Statistic::StdDev)
}

/// Cell-wise minimum of several grids
pub fn minimum(grids: &[Grid]) -> Result<Grid> {
    aggregate(grids, Statistic::Min)
}

/// Cell-wise maximum of several grids
pub fn maximum(grids: &[Grid]) -> Result<Grid> {
    aggregate(grids, Statistic::Max)
}

/// A reclassification entry mapping an input range to an output value
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReclassEntry {
    /// Minimum value (inclusive)
    pub min: f64,
    /// Maximum value (exclusive)
    pub max: f64,
    /// Output value for this class
    pub value: f64,
}

impl ReclassEntry {
    pub fn new(min: f64, max: f64, value: f64) -> Self {
        Self { min, max, value }
    }
}

/// Reclassify values by range.
///
/// The first entry with `min <= v < max` gives the output value; cells that
/// match no entry (and missing cells) become missing. The result is `Float32`.
///
/// # Example
/// ```ignore
/// // NDVI classes
/// let classes = [
///     ReclassEntry::new(-1.0, 0.0, 1.0), // Water
///     ReclassEntry::new(0.0, 0.2, 2.0),  // Bare soil
///     ReclassEntry::new(0.2, 1.01, 3.0), // Vegetation
/// ];
/// let classified = reclass(&ndvi, &classes)?;
/// ```
pub fn reclass(grid: &Grid, classes: &[ReclassEntry]) -> Result<Grid> {
    if let Some(bad) = classes.iter().find(|c| c.min.is_nan() || c.max.is_nan()) {
        return Err(Error::InvalidParameter {
            name: "classes",
            value: format!("{:?}", bad),
            reason: "class bounds must be numbers".into(),
        });
    }
    let values = grid.to_f64().mapv(|v| {
        classes
            .iter()
            .find(|c| c.min <= v && v < c.max)
            .map_or(f64::NAN, |c| c.value)
    });
    grid.with_values(ElementKind::Float32, &values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_aggregates() {
        let a = Grid::from_array(array![[1_i16, 8], [3, 4]]).unwrap();
        let b = Grid::from_array(array![[3_u8, 2], [3, 0]]).unwrap();
        let grids = [a, b];

        assert_eq!(mean(&grids).unwrap().to_f64(), array![[2.0, 5.0], [3.0, 2.0]]);
        assert_relative_eq!(std(&grids).unwrap().get(0, 1).unwrap(), 3.0);

        let lo = minimum(&grids).unwrap();
        assert_eq!(lo.kind(), ElementKind::Int16);
        assert_eq!(lo.to_f64(), array![[1.0, 2.0], [3.0, 0.0]]);
        assert_eq!(maximum(&grids).unwrap().to_f64(), array![[3.0, 8.0], [3.0, 4.0]]);
    }

    #[test]
    fn test_aggregate_propagates_missing() {
        let a = Grid::from_array(array![[1.0_f32, f32::NAN]]).unwrap();
        let b = Grid::from_array(array![[2.0_f32, 5.0]]).unwrap();
        let r = maximum(&[a, b]).unwrap();
        assert_eq!(r.get(0, 0).unwrap(), 2.0);
        assert!(r.get(0, 1).unwrap().is_nan());
    }

    #[test]
    fn test_reclass() {
        let g = Grid::from_array(array![[-0.5_f32, 0.1, 0.6, 2.0]]).unwrap();
        let classes = [
            ReclassEntry::new(-1.0, 0.0, 1.0),
            ReclassEntry::new(0.0, 0.5, 2.0),
            ReclassEntry::new(0.5, 1.0, 3.0),
        ];
        let r = reclass(&g, &classes).unwrap();
        assert_eq!(r.get(0, 0).unwrap(), 1.0);
        assert_eq!(r.get(0, 1).unwrap(), 2.0);
        assert_eq!(r.get(0, 2).unwrap(), 3.0);
        assert!(r.get(0, 3).unwrap().is_nan());
        assert!(reclass(&g, &[ReclassEntry::new(f64::NAN, 1.0, 1.0)]).is_err());
    }
}
