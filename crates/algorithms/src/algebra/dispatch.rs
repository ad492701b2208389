//! Applying operators to grids and scalars

use super::operand::{promoted_kind, Operand};
use super::ops::{BinaryOp, UnaryOp};
use gridcalc_core::align::{standardize, ExtentMode};
use gridcalc_core::error::{Error, Result};
use gridcalc_core::raster::{ElementKind, Grid};
use ndarray::Zip;
use tracing::debug;

/// Bring two grids onto one geometry, skipping the resolver when they
/// already line up cell for cell
pub(crate) fn align_pair(a: &Grid, b: &Grid) -> Result<(Grid, Grid)> {
    if a.same_geometry(b) {
        return Ok((a.clone(), b.clone()));
    }
    debug!(left = %a.extent(), right = %b.extent(), "operands differ in geometry, aligning");
    let mut aligned = standardize(ExtentMode::Intersect, &[a.clone(), b.clone()])?.into_iter();
    match (aligned.next(), aligned.next()) {
        (Some(a), Some(b)) => Ok((a, b)),
        _ => Err(Error::Algorithm("alignment returned fewer grids than given".into())),
    }
}

/// Apply a binary operator.
///
/// - two scalars: [`Error::NoGridOperand`]
/// - grid and scalar: the scalar is broadcast to every cell
/// - two grids of the same geometry: cell by cell
/// - two grids otherwise: both are aligned onto their intersection first
///
/// The result kind follows from the operands as they are after alignment,
/// so padding that introduced missing cells yields a floating result.
pub fn apply(left: impl Into<Operand>, right: impl Into<Operand>, op: BinaryOp) -> Result<Grid> {
    let (left, right) = (left.into(), right.into());
    let kind_of = |l: &Operand, r: &Operand| {
        op.result_kind(promoted_kind(l, r).unwrap_or(ElementKind::Int32))
    };

    match (&left, &right) {
        (Operand::Scalar(_), Operand::Scalar(_)) => Err(Error::NoGridOperand),
        (Operand::Grid(g), Operand::Scalar(s)) => {
            let values = g.to_f64().mapv(|v| op.eval(v, *s));
            g.with_values(kind_of(&left, &right), &values)
        }
        (Operand::Scalar(s), Operand::Grid(g)) => {
            let values = g.to_f64().mapv(|v| op.eval(*s, v));
            g.with_values(kind_of(&left, &right), &values)
        }
        (Operand::Grid(a), Operand::Grid(b)) => {
            let (a, b) = align_pair(a, b)?;
            let values = Zip::from(&a.to_f64())
                .and(&b.to_f64())
                .map_collect(|&x, &y| op.eval(x, y));
            let kind = op.result_kind(a.kind().promote(b.kind()));
            a.with_values(kind, &values)
        }
    }
}

/// Apply a unary operator
pub fn unary(grid: &Grid, op: UnaryOp) -> Result<Grid> {
    if op == UnaryOp::IsMissing {
        return Ok(grid.is_missing());
    }
    let values = grid.to_f64().mapv(|v| op.eval(v));
    grid.with_values(op.result_kind(grid.kind()), &values)
}

macro_rules! binary_fns {
    ($($(#[$doc:meta])* $name:ident => $op:ident),* $(,)?) => {
        $(
            $(#[$doc])*
            pub fn $name(left: impl Into<Operand>, right: impl Into<Operand>) -> Result<Grid> {
                apply(left, right, BinaryOp::$op)
            }
        )*
    };
}

binary_fns! {
    add => Add,
    subtract => Subtract,
    multiply => Multiply,
    /// Division that always yields `Float32`
    divide => TrueDivide,
    floor_divide => FloorDivide,
    power => Power,
    /// Remainder with the sign of the divisor
    modulo => Modulo,
    lt => Less,
    le => LessEqual,
    gt => Greater,
    ge => GreaterEqual,
    eq => Equal,
    ne => NotEqual,
    and => And,
    or => Or,
    xor => Xor,
    shift_left => ShiftLeft,
    shift_right => ShiftRight,
}

macro_rules! unary_fns {
    ($($name:ident => $op:ident),* $(,)?) => {
        $(
            pub fn $name(grid: &Grid) -> Result<Grid> {
                unary(grid, UnaryOp::$op)
            }
        )*
    };
}

unary_fns! {
    negate => Negate,
    positive => Positive,
    invert => Invert,
    abs => Abs,
    sin => Sin,
    cos => Cos,
    tan => Tan,
    asin => ArcSin,
    acos => ArcCos,
    atan => ArcTan,
}

/// Round half to even at `decimals` places (negative rounds to tens, ...)
pub fn round(grid: &Grid, decimals: i32) -> Result<Grid> {
    unary(grid, UnaryOp::Round(decimals))
}

/// Cells strictly between `low` and `high`
pub fn between(grid: &Grid, low: impl Into<Operand>, high: impl Into<Operand>) -> Result<Grid> {
    and(gt(grid, low)?, lt(grid, high)?)
}
