//! Typed cell storage

use crate::raster::element::{ElementKind, GridElement, WideElement};
use ndarray::Array2;
use std::any::Any;

/// A 2-D cell array of one of the supported element kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum Cells {
    Bool(Array2<bool>),
    Int8(Array2<i8>),
    Int16(Array2<i16>),
    Int32(Array2<i32>),
    UInt8(Array2<u8>),
    UInt16(Array2<u16>),
    UInt32(Array2<u32>),
    Float32(Array2<f32>),
}

/// Evaluate `$body` with `$a` bound to the typed array of any variant.
macro_rules! each_kind {
    ($cells:expr, $a:ident => $body:expr) => {
        match $cells {
            Cells::Bool($a) => $body,
            Cells::Int8($a) => $body,
            Cells::Int16($a) => $body,
            Cells::Int32($a) => $body,
            Cells::UInt8($a) => $body,
            Cells::UInt16($a) => $body,
            Cells::UInt32($a) => $body,
            Cells::Float32($a) => $body,
        }
    };
}

macro_rules! impl_from_array {
    ($t:ty, $variant:ident) => {
        impl From<Array2<$t>> for Cells {
            fn from(data: Array2<$t>) -> Self {
                Cells::$variant(data)
            }
        }
    };
}

impl_from_array!(bool, Bool);
impl_from_array!(i8, Int8);
impl_from_array!(i16, Int16);
impl_from_array!(i32, Int32);
impl_from_array!(u8, UInt8);
impl_from_array!(u16, UInt16);
impl_from_array!(u32, UInt32);
impl_from_array!(f32, Float32);

macro_rules! impl_from_wide_array {
    ($t:ty) => {
        impl From<Array2<$t>> for Cells {
            fn from(data: Array2<$t>) -> Self {
                data.mapv(WideElement::narrow).into()
            }
        }
    };
}

impl_from_wide_array!(f64);
impl_from_wide_array!(i64);
impl_from_wide_array!(u64);

impl Cells {
    /// Build cells of `kind` from computed values (see the narrowing rules
    /// in [`crate::raster::element`]).
    pub fn from_f64(kind: ElementKind, data: &Array2<f64>) -> Self {
        match kind {
            ElementKind::Bool => Cells::Bool(data.mapv(bool::from_f64)),
            ElementKind::Int8 => Cells::Int8(data.mapv(i8::from_f64)),
            ElementKind::Int16 => Cells::Int16(data.mapv(i16::from_f64)),
            ElementKind::Int32 => Cells::Int32(data.mapv(i32::from_f64)),
            ElementKind::UInt8 => Cells::UInt8(data.mapv(u8::from_f64)),
            ElementKind::UInt16 => Cells::UInt16(data.mapv(u16::from_f64)),
            ElementKind::UInt32 => Cells::UInt32(data.mapv(u32::from_f64)),
            ElementKind::Float32 => Cells::Float32(data.mapv(f32::from_f64)),
        }
    }

    pub fn kind(&self) -> ElementKind {
        match self {
            Cells::Bool(_) => ElementKind::Bool,
            Cells::Int8(_) => ElementKind::Int8,
            Cells::Int16(_) => ElementKind::Int16,
            Cells::Int32(_) => ElementKind::Int32,
            Cells::UInt8(_) => ElementKind::UInt8,
            Cells::UInt16(_) => ElementKind::UInt16,
            Cells::UInt32(_) => ElementKind::UInt32,
            Cells::Float32(_) => ElementKind::Float32,
        }
    }

    /// Dimensions as (rows, cols)
    pub fn dim(&self) -> (usize, usize) {
        each_kind!(self, a => a.dim())
    }

    /// Widen every cell to `f64`; missing cells stay NaN
    pub fn to_f64(&self) -> Array2<f64> {
        each_kind!(self, a => a.mapv(GridElement::to_f64))
    }

    /// Value at (row, col) widened to `f64`
    pub fn get_f64(&self, row: usize, col: usize) -> Option<f64> {
        each_kind!(self, a => a.get((row, col)).map(|v| v.to_f64()))
    }

    /// Convert to another kind through the common `f64` path
    pub fn cast(&self, kind: ElementKind) -> Cells {
        if kind == self.kind() {
            return self.clone();
        }
        Cells::from_f64(kind, &self.to_f64())
    }

    /// Typed view of the array when the kind matches `T`
    pub fn as_array<T: GridElement>(&self) -> Option<&Array2<T>> {
        each_kind!(self, a => (a as &dyn Any).downcast_ref::<Array2<T>>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_wide_inputs_are_narrowed() {
        let cells = Cells::from(array![[1.5_f64, 2.0]]);
        assert_eq!(cells.kind(), ElementKind::Float32);

        let cells = Cells::from(array![[i64::MAX, -1]]);
        assert_eq!(cells, Cells::Int32(array![[i32::MAX, -1]]));

        let cells = Cells::from(array![[u64::MAX]]);
        assert_eq!(cells.kind(), ElementKind::UInt32);
    }

    #[test]
    fn test_cast_and_lookup() {
        let cells = Cells::from(array![[1_u8, 2, 3], [4, 5, 6]]);
        assert_eq!(cells.dim(), (2, 3));
        assert_eq!(cells.get_f64(1, 2), Some(6.0));
        assert_eq!(cells.get_f64(2, 0), None);

        let as_bool = cells.cast(ElementKind::Bool);
        assert_eq!(as_bool.kind(), ElementKind::Bool);
        assert_eq!(as_bool.to_f64(), array![[1.0, 1.0, 1.0], [1.0, 1.0, 1.0]]);
    }

    #[test]
    fn test_typed_view() {
        let cells = Cells::from(array![[1_i16, 2]]);
        assert!(cells.as_array::<i16>().is_some());
        assert!(cells.as_array::<f32>().is_none());
    }
}
