//! Grid algebra
//!
//! Operators treat grids like scalars. Operands whose geometry differs are
//! aligned onto their common intersection before the cells are combined;
//! operands that already line up skip alignment entirely.
//!
//! ```ignore
//! use gridcalc_algorithms::algebra::{add, con, gt};
//!
//! let sum = add(&dem, 10)?;
//! let masked = con(&gt(&slope, 30)?, f64::NAN, &dem)?;
//! ```

mod con;
mod dispatch;
mod operand;
mod ops;

pub use con::{con, replace, set_missing};
pub use dispatch::{
    abs, acos, add, and, apply, asin, atan, between, cos, divide, eq, floor_divide, ge, gt,
    invert, le, lt, modulo, multiply, ne, negate, or, positive, power, round, shift_left,
    shift_right, sin, subtract, tan, unary, xor,
};
pub use operand::Operand;
pub use ops::{BinaryOp, UnaryOp};

pub(crate) use dispatch::align_pair;
