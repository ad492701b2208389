//! Conditional selection

use super::dispatch::eq;
use super::operand::{promoted_kind, Operand};
use gridcalc_core::align::{standardize, ExtentMode};
use gridcalc_core::error::Result;
use gridcalc_core::raster::{ElementKind, Grid};
use ndarray::{Array2, Zip};

/// Cell-wise `if condition { true_value } else { false_value }`.
///
/// A cell is true when its condition value is non-zero. Grid values are
/// aligned with the condition on their common intersection. Where the
/// condition is missing the result is missing if it is floating, and takes
/// the false branch otherwise.
///
/// The result kind is the promotion of the two values after alignment; two
/// whole-number scalars give `Int32`. When alignment pads the condition with
/// missing cells the result is `Float32`, so those cells stay missing.
pub fn con(
    condition: &Grid,
    true_value: impl Into<Operand>,
    false_value: impl Into<Operand>,
) -> Result<Grid> {
    let (true_value, false_value) = (true_value.into(), false_value.into());

    let mut grids = vec![condition.clone()];
    grids.extend(true_value.as_grid().cloned());
    grids.extend(false_value.as_grid().cloned());
    let aligned = if grids.iter().all(|g| g.same_geometry(condition)) {
        grids
    } else {
        standardize(ExtentMode::Intersect, &grids)?
    };

    let cond = &aligned[0];
    let mut rest = aligned[1..].iter().cloned();
    let mut realign = |operand: Operand| match operand {
        Operand::Grid(g) => Operand::Grid(rest.next().unwrap_or(g)),
        scalar => scalar,
    };
    let (true_value, false_value) = (realign(true_value), realign(false_value));

    let mut kind = promoted_kind(&true_value, &false_value).unwrap_or(ElementKind::Int32);
    if !kind.is_float() && cond.has_missing() && !condition.has_missing() {
        kind = ElementKind::Float32;
    }

    let values_of = |operand: &Operand| -> Array2<f64> {
        match operand {
            Operand::Grid(g) => g.to_f64(),
            Operand::Scalar(s) => Array2::from_elem(cond.shape(), *s),
        }
    };
    let t = values_of(&true_value);
    let f = values_of(&false_value);

    let float_result = kind.is_float();
    let values = Zip::from(&cond.to_f64())
        .and(&t)
        .and(&f)
        .map_collect(|&c, &t, &f| {
            if c.is_nan() {
                if float_result {
                    f64::NAN
                } else {
                    f
                }
            } else if c != 0.0 {
                t
            } else {
                f
            }
        });

    cond.with_values(kind, &values)
}

/// Replace cells equal to `value` (or where `value` is a true grid) with
/// `replacement`; other cells take `fallback`, or keep their own value.
pub fn replace(
    grid: &Grid,
    value: impl Into<Operand>,
    replacement: impl Into<Operand>,
    fallback: Option<Operand>,
) -> Result<Grid> {
    let condition = match value.into() {
        Operand::Grid(mask) => mask,
        scalar => eq(grid, scalar)?,
    };
    con(
        &condition,
        replacement,
        fallback.unwrap_or_else(|| Operand::from(grid)),
    )
}

/// Mark cells equal to `value` (or where `value` is a true grid) as missing
pub fn set_missing(grid: &Grid, value: impl Into<Operand>) -> Result<Grid> {
    replace(grid, value, f64::NAN, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridcalc_core::raster::GeoTransform;
    use ndarray::array;

    #[test]
    fn test_select_between_grids_and_scalars() {
        let cond = Grid::from_array(array![[true, false], [false, true]]).unwrap();
        let values = Grid::from_array(array![[1_i16, 2], [3, 4]]).unwrap();

        let r = con(&cond, &values, 0).unwrap();
        assert_eq!(r.kind(), ElementKind::Int16);
        assert_eq!(r.to_f64(), array![[1.0, 0.0], [0.0, 4.0]]);

        let r = con(&cond, 1, 2).unwrap();
        assert_eq!(r.kind(), ElementKind::Int32);
        assert_eq!(r.to_f64(), array![[1.0, 2.0], [2.0, 1.0]]);

        let r = con(&cond, 0.5, &values).unwrap();
        assert_eq!(r.kind(), ElementKind::Float32);
        assert_eq!(r.to_f64(), array![[0.5, 2.0], [3.0, 0.5]]);
    }

    #[test]
    fn test_missing_condition() {
        let cond = Grid::from_array(array![[1.0_f32, f32::NAN, 0.0]]).unwrap();
        let r = con(&cond, 1.5, 2).unwrap();
        assert_eq!(r.get(0, 0).unwrap(), 1.5);
        assert!(r.get(0, 1).unwrap().is_nan());
        assert_eq!(r.get(0, 2).unwrap(), 2.0);

        let r = con(&cond, 1, 2).unwrap();
        assert_eq!(r.kind(), ElementKind::Int32);
        assert_eq!(r.to_f64(), array![[1.0, 2.0, 2.0]]);
    }

    #[test]
    fn test_values_are_aligned_with_condition() {
        let cond = Grid::new(
            array![[1_u8, 0, 1]],
            None,
            GeoTransform::new(0.0, 1.0, 1.0, -1.0),
        )
        .unwrap();
        let values = Grid::new(
            array![[7_u8, 8, 9]],
            None,
            GeoTransform::new(1.0, 1.0, 1.0, -1.0),
        )
        .unwrap();
        let r = con(&cond, &values, 0).unwrap();
        assert_eq!(r.shape(), (1, 2));
        assert_eq!(r.to_f64(), array![[0.0, 8.0]]);
    }

    #[test]
    fn test_padded_cells_stay_missing() {
        let cond = Grid::new(
            ndarray::Array2::from_elem((5, 5), true),
            None,
            GeoTransform::new(0.0, 5.0, 1.0, -1.0),
        )
        .unwrap();
        let values = Grid::new(
            ndarray::Array2::from_elem((3, 3), 7_i16),
            None,
            GeoTransform::new(0.0, 6.0, 2.0, -2.0),
        )
        .unwrap();

        let r = con(&cond, &values, 0).unwrap();
        assert_eq!(r.kind(), ElementKind::Float32);
        assert_eq!(r.shape(), (3, 3));
        assert_eq!(r.get(0, 0).unwrap(), 7.0);
        assert!(r.get(2, 2).unwrap().is_nan());
        assert!(r.get(0, 2).unwrap().is_nan());
    }

    #[test]
    fn test_replace_and_set_missing() {
        let g = Grid::from_array(array![[1.0_f32, -9999.0, 3.0]]).unwrap();
        let cleaned = set_missing(&g, -9999).unwrap();
        assert!(cleaned.get(0, 1).unwrap().is_nan());
        assert_eq!(cleaned.get(0, 2).unwrap(), 3.0);

        let r = replace(&g, 1, 100, Some(Operand::Scalar(0.0))).unwrap();
        assert_eq!(r.to_f64(), array![[100.0, 0.0, 0.0]]);
    }
}
