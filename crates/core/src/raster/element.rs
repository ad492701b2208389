//! Element kinds a grid cell may hold
//!
//! The set is closed: booleans, 8/16/32-bit signed and unsigned integers and
//! 32-bit floats. Wider inputs are narrowed when a grid is built:
//!
//! | input | stored as | rule                          |
//! |-------|-----------|-------------------------------|
//! | `f64` | `f32`     | nearest representable value   |
//! | `i64` | `i32`     | saturating                    |
//! | `u64` | `u32`     | saturating                    |
//!
//! Every computed value re-enters a grid through [`GridElement::from_f64`],
//! which saturates into integer ranges and maps non-finite values to zero.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::Debug;
use std::str::FromStr;

/// Declared element kind of a grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Bool,
    Int8,
    Int16,
    Int32,
    UInt8,
    UInt16,
    UInt32,
    Float32,
}

impl ElementKind {
    /// All supported kinds
    pub const ALL: [ElementKind; 8] = [
        ElementKind::Bool,
        ElementKind::Int8,
        ElementKind::Int16,
        ElementKind::Int32,
        ElementKind::UInt8,
        ElementKind::UInt16,
        ElementKind::UInt32,
        ElementKind::Float32,
    ];

    /// Canonical lowercase name (`"int16"`, `"float32"`, ...)
    pub fn name(self) -> &'static str {
        match self {
            ElementKind::Bool => "bool",
            ElementKind::Int8 => "int8",
            ElementKind::Int16 => "int16",
            ElementKind::Int32 => "int32",
            ElementKind::UInt8 => "uint8",
            ElementKind::UInt16 => "uint16",
            ElementKind::UInt32 => "uint32",
            ElementKind::Float32 => "float32",
        }
    }

    /// Whether cells of this kind can hold a missing value
    pub fn is_float(self) -> bool {
        self == ElementKind::Float32
    }

    pub fn is_signed(self) -> bool {
        matches!(
            self,
            ElementKind::Int8 | ElementKind::Int16 | ElementKind::Int32 | ElementKind::Float32
        )
    }

    /// Storage width in bits (`Bool` counts as 8)
    pub fn bits(self) -> u32 {
        match self {
            ElementKind::Bool | ElementKind::Int8 | ElementKind::UInt8 => 8,
            ElementKind::Int16 | ElementKind::UInt16 => 16,
            ElementKind::Int32 | ElementKind::UInt32 | ElementKind::Float32 => 32,
        }
    }

    /// Smallest kind able to represent values of both `self` and `other`.
    ///
    /// Mixed signed/unsigned integers widen to a signed kind, capped at `Int32`.
    pub fn promote(self, other: ElementKind) -> ElementKind {
        use ElementKind::*;
        if self == other {
            return self;
        }
        if self.is_float() || other.is_float() {
            return Float32;
        }
        if self == Bool {
            return other;
        }
        if other == Bool {
            return self;
        }
        let bits = self.bits().max(other.bits());
        match (self.is_signed(), other.is_signed()) {
            (true, true) => signed_with_bits(bits),
            (false, false) => unsigned_with_bits(bits),
            _ => {
                let (signed, unsigned) = if self.is_signed() { (self, other) } else { (other, self) };
                if signed.bits() > unsigned.bits() {
                    signed
                } else {
                    signed_with_bits((unsigned.bits() * 2).min(32))
                }
            }
        }
    }

    /// Storage-boundary sentinel for missing cells, `None` for `Bool`
    pub fn nodata(self) -> Option<f64> {
        match self {
            ElementKind::Bool => None,
            ElementKind::Int8 => Some(i8::MIN as f64),
            ElementKind::Int16 => Some(i16::MIN as f64),
            ElementKind::Int32 => Some(i32::MIN as f64),
            ElementKind::UInt8 => Some(u8::MAX as f64),
            ElementKind::UInt16 => Some(u16::MAX as f64),
            ElementKind::UInt32 => Some(u32::MAX as f64),
            ElementKind::Float32 => Some(f32::MIN as f64),
        }
    }
}

fn signed_with_bits(bits: u32) -> ElementKind {
    match bits {
        8 => ElementKind::Int8,
        16 => ElementKind::Int16,
        _ => ElementKind::Int32,
    }
}

fn unsigned_with_bits(bits: u32) -> ElementKind {
    match bits {
        8 => ElementKind::UInt8,
        16 => ElementKind::UInt16,
        _ => ElementKind::UInt32,
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ElementKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        ElementKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s.to_ascii_lowercase())
            .ok_or_else(|| Error::UnsupportedDataType(s.to_string()))
    }
}

/// Rust types that can be stored in a grid cell.
pub trait GridElement: Copy + Debug + PartialEq + Send + Sync + 'static {
    /// Declared kind for this type
    const KIND: ElementKind;

    /// Lossless widening used by every computation
    fn to_f64(self) -> f64;

    /// Narrowing back into the cell type (saturating, non-finite → 0)
    fn from_f64(value: f64) -> Self;
}

macro_rules! impl_grid_element_int {
    ($t:ty, $kind:ident) => {
        impl GridElement for $t {
            const KIND: ElementKind = ElementKind::$kind;

            fn to_f64(self) -> f64 {
                self as f64
            }

            fn from_f64(value: f64) -> Self {
                if value.is_finite() {
                    value as $t
                } else {
                    0
                }
            }
        }
    };
}

impl_grid_element_int!(i8, Int8);
impl_grid_element_int!(i16, Int16);
impl_grid_element_int!(i32, Int32);
impl_grid_element_int!(u8, UInt8);
impl_grid_element_int!(u16, UInt16);
impl_grid_element_int!(u32, UInt32);

impl GridElement for f32 {
    const KIND: ElementKind = ElementKind::Float32;

    fn to_f64(self) -> f64 {
        self as f64
    }

    fn from_f64(value: f64) -> Self {
        value as f32
    }
}

impl GridElement for bool {
    const KIND: ElementKind = ElementKind::Bool;

    fn to_f64(self) -> f64 {
        if self {
            1.0
        } else {
            0.0
        }
    }

    fn from_f64(value: f64) -> Self {
        value != 0.0 && !value.is_nan()
    }
}

/// 64-bit inputs accepted at construction and narrowed to a supported kind
pub trait WideElement: Copy {
    type Narrow: GridElement;

    fn narrow(self) -> Self::Narrow;
}

impl WideElement for f64 {
    type Narrow = f32;

    fn narrow(self) -> f32 {
        self as f32
    }
}

impl WideElement for i64 {
    type Narrow = i32;

    fn narrow(self) -> i32 {
        self.clamp(i32::MIN as i64, i32::MAX as i64) as i32
    }
}

impl WideElement for u64 {
    type Narrow = u32;

    fn narrow(self) -> u32 {
        self.min(u32::MAX as u64) as u32
    }
}
