//! Operands of grid algebra

use gridcalc_core::raster::{ElementKind, Grid};

/// One side of a binary operation: a grid or a broadcast scalar
#[derive(Debug, Clone)]
pub enum Operand {
    Scalar(f64),
    Grid(Grid),
}

impl Operand {
    pub fn as_grid(&self) -> Option<&Grid> {
        match self {
            Operand::Grid(g) => Some(g),
            Operand::Scalar(_) => None,
        }
    }
}

/// A finite whole-number scalar; it takes on the kind of the grid it meets
pub(crate) fn is_integral(value: f64) -> bool {
    value.is_finite() && value.fract() == 0.0
}

/// Kind an operand contributes to promotion, `None` for a weak scalar
pub(crate) fn operand_kind(operand: &Operand) -> Option<ElementKind> {
    match operand {
        Operand::Grid(g) => Some(g.kind()),
        Operand::Scalar(s) if is_integral(*s) => None,
        Operand::Scalar(_) => Some(ElementKind::Float32),
    }
}

/// Promoted kind of two operands, `None` when both are integral scalars
pub(crate) fn promoted_kind(left: &Operand, right: &Operand) -> Option<ElementKind> {
    match (operand_kind(left), operand_kind(right)) {
        (Some(a), Some(b)) => Some(a.promote(b)),
        (Some(k), None) | (None, Some(k)) => Some(k),
        (None, None) => None,
    }
}

impl From<Grid> for Operand {
    fn from(grid: Grid) -> Self {
        Operand::Grid(grid)
    }
}

impl From<&Grid> for Operand {
    fn from(grid: &Grid) -> Self {
        Operand::Grid(grid.clone())
    }
}

macro_rules! impl_scalar_operand {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Operand {
                fn from(value: $t) -> Self {
                    Operand::Scalar(value as f64)
                }
            }
        )*
    };
}

impl_scalar_operand!(f64, f32, i8, i16, i32, i64, u8, u16, u32, u64, usize);

impl From<bool> for Operand {
    fn from(value: bool) -> Self {
        Operand::Scalar(if value { 1.0 } else { 0.0 })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_weak_scalars() {
        let g = Operand::from(Grid::from_array(array![[1_u8]]).unwrap());
        assert_eq!(promoted_kind(&g, &Operand::from(300)), Some(ElementKind::UInt8));
        assert_eq!(promoted_kind(&Operand::from(0.5), &g), Some(ElementKind::Float32));
        assert_eq!(promoted_kind(&g, &Operand::from(f64::NAN)), Some(ElementKind::Float32));
        assert_eq!(promoted_kind(&Operand::from(1), &Operand::from(2)), None);
    }
}
