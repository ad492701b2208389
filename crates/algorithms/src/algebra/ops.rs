//! Cell kernels and result kinds of the algebra operators
//!
//! Every kernel works on widened `f64` values; NaN is a missing cell. The
//! result is narrowed into the kind given by `result_kind`.

use gridcalc_core::error::{Error, Result};
use gridcalc_core::raster::ElementKind;
use std::fmt;
use std::str::FromStr;

/// Binary cell-wise operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    TrueDivide,
    FloorDivide,
    Power,
    /// Remainder with the sign of the divisor
    Modulo,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Equal,
    NotEqual,
    And,
    Or,
    Xor,
    ShiftLeft,
    ShiftRight,
}

impl BinaryOp {
    pub const ALL: [BinaryOp; 18] = [
        BinaryOp::Add,
        BinaryOp::Subtract,
        BinaryOp::Multiply,
        BinaryOp::TrueDivide,
        BinaryOp::FloorDivide,
        BinaryOp::Power,
        BinaryOp::Modulo,
        BinaryOp::Less,
        BinaryOp::LessEqual,
        BinaryOp::Greater,
        BinaryOp::GreaterEqual,
        BinaryOp::Equal,
        BinaryOp::NotEqual,
        BinaryOp::And,
        BinaryOp::Or,
        BinaryOp::Xor,
        BinaryOp::ShiftLeft,
        BinaryOp::ShiftRight,
    ];

    /// Operator symbol, as accepted by `FromStr`
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::TrueDivide => "/",
            BinaryOp::FloorDivide => "//",
            BinaryOp::Power => "**",
            BinaryOp::Modulo => "%",
            BinaryOp::Less => "<",
            BinaryOp::LessEqual => "<=",
            BinaryOp::Greater => ">",
            BinaryOp::GreaterEqual => ">=",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::And => "&",
            BinaryOp::Or => "|",
            BinaryOp::Xor => "^",
            BinaryOp::ShiftLeft => "<<",
            BinaryOp::ShiftRight => ">>",
        }
    }

    /// Word name, as accepted by `FromStr`
    pub fn name(self) -> &'static str {
        match self {
            BinaryOp::Add => "add",
            BinaryOp::Subtract => "sub",
            BinaryOp::Multiply => "mul",
            BinaryOp::TrueDivide => "div",
            BinaryOp::FloorDivide => "floordiv",
            BinaryOp::Power => "pow",
            BinaryOp::Modulo => "mod",
            BinaryOp::Less => "lt",
            BinaryOp::LessEqual => "le",
            BinaryOp::Greater => "gt",
            BinaryOp::GreaterEqual => "ge",
            BinaryOp::Equal => "eq",
            BinaryOp::NotEqual => "ne",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
            BinaryOp::Xor => "xor",
            BinaryOp::ShiftLeft => "shl",
            BinaryOp::ShiftRight => "shr",
        }
    }

    pub fn is_relational(self) -> bool {
        matches!(
            self,
            BinaryOp::Less
                | BinaryOp::LessEqual
                | BinaryOp::Greater
                | BinaryOp::GreaterEqual
                | BinaryOp::Equal
                | BinaryOp::NotEqual
        )
    }

    pub fn is_bitwise(self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or | BinaryOp::Xor)
    }

    /// Kind of the result given the promoted kind of the operands
    pub fn result_kind(self, promoted: ElementKind) -> ElementKind {
        match self {
            BinaryOp::TrueDivide => ElementKind::Float32,
            op if op.is_relational() => {
                if promoted.is_float() {
                    ElementKind::Float32
                } else {
                    ElementKind::Bool
                }
            }
            op if op.is_bitwise() => promoted,
            _ if promoted == ElementKind::Bool => ElementKind::Int32,
            _ => promoted,
        }
    }

    /// Apply the operator to one pair of cells
    pub fn eval(self, a: f64, b: f64) -> f64 {
        match self {
            BinaryOp::Add => a + b,
            BinaryOp::Subtract => a - b,
            BinaryOp::Multiply => a * b,
            BinaryOp::TrueDivide => a / b,
            BinaryOp::FloorDivide => (a / b).floor(),
            BinaryOp::Power => a.powf(b),
            BinaryOp::Modulo => a - (a / b).floor() * b,
            BinaryOp::Less => compare(a, b, a < b),
            BinaryOp::LessEqual => compare(a, b, a <= b),
            BinaryOp::Greater => compare(a, b, a > b),
            BinaryOp::GreaterEqual => compare(a, b, a >= b),
            BinaryOp::Equal => compare(a, b, a == b),
            BinaryOp::NotEqual => compare(a, b, a != b),
            BinaryOp::And => bitwise(a, b, |x, y| x & y),
            BinaryOp::Or => bitwise(a, b, |x, y| x | y),
            BinaryOp::Xor => bitwise(a, b, |x, y| x ^ y),
            BinaryOp::ShiftLeft => shift(a, b, true),
            BinaryOp::ShiftRight => shift(a, b, false),
        }
    }
}

fn compare(a: f64, b: f64, result: bool) -> f64 {
    if a.is_nan() || b.is_nan() {
        f64::NAN
    } else if result {
        1.0
    } else {
        0.0
    }
}

fn bitwise(a: f64, b: f64, f: impl Fn(i64, i64) -> i64) -> f64 {
    if a.is_nan() || b.is_nan() {
        return f64::NAN;
    }
    f(a as i64, b as i64) as f64
}

fn shift(a: f64, b: f64, left: bool) -> f64 {
    if a.is_nan() || b.is_nan() {
        return f64::NAN;
    }
    let value = a as i64;
    let amount = match u32::try_from(b as i64) {
        Ok(n) if n < 64 => n,
        _ => return if left || value >= 0 { 0.0 } else { -1.0 },
    };
    if left {
        (value << amount) as f64
    } else {
        (value >> amount) as f64
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for BinaryOp {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        BinaryOp::ALL
            .into_iter()
            .find(|op| op.symbol() == s || op.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::InvalidParameter {
                name: "op",
                value: s.to_string(),
                reason: "unknown operator".into(),
            })
    }
}

/// Unary cell-wise operators
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnaryOp {
    Negate,
    Positive,
    /// Logical not
    Invert,
    Abs,
    Sin,
    Cos,
    Tan,
    ArcSin,
    ArcCos,
    ArcTan,
    /// Round half to even at the given number of decimals
    Round(i32),
    IsMissing,
}

impl UnaryOp {
    /// Kind of the result given the operand kind
    pub fn result_kind(self, kind: ElementKind) -> ElementKind {
        match self {
            UnaryOp::Negate | UnaryOp::Positive if kind == ElementKind::Bool => ElementKind::Int32,
            UnaryOp::Negate | UnaryOp::Positive | UnaryOp::Abs | UnaryOp::Round(_) => kind,
            UnaryOp::Invert if kind.is_float() => ElementKind::Float32,
            UnaryOp::Invert | UnaryOp::IsMissing => ElementKind::Bool,
            UnaryOp::Sin
            | UnaryOp::Cos
            | UnaryOp::Tan
            | UnaryOp::ArcSin
            | UnaryOp::ArcCos
            | UnaryOp::ArcTan => ElementKind::Float32,
        }
    }

    /// Apply the operator to one cell
    pub fn eval(self, v: f64) -> f64 {
        match self {
            UnaryOp::Negate => -v,
            UnaryOp::Positive => v,
            UnaryOp::Invert => {
                if v.is_nan() {
                    f64::NAN
                } else if v == 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            UnaryOp::Abs => v.abs(),
            UnaryOp::Sin => v.sin(),
            UnaryOp::Cos => v.cos(),
            UnaryOp::Tan => v.tan(),
            UnaryOp::ArcSin => v.asin(),
            UnaryOp::ArcCos => v.acos(),
            UnaryOp::ArcTan => v.atan(),
            UnaryOp::Round(decimals) => round_half_even(v, decimals),
            UnaryOp::IsMissing => {
                if v.is_nan() {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }
}

fn round_half_even(v: f64, decimals: i32) -> f64 {
    match decimals {
        0 => v.round_ties_even(),
        d if d > 0 => {
            let scale = 10_f64.powi(d);
            (v * scale).round_ties_even() / scale
        }
        d => {
            let scale = 10_f64.powi(-d);
            (v / scale).round_ties_even() * scale
        }
    }
}

impl FromStr for UnaryOp {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim().to_ascii_lowercase();
        let op = match lower.as_str() {
            "neg" | "negate" | "-" => UnaryOp::Negate,
            "pos" | "positive" | "+" => UnaryOp::Positive,
            "not" | "invert" | "~" => UnaryOp::Invert,
            "abs" => UnaryOp::Abs,
            "sin" => UnaryOp::Sin,
            "cos" => UnaryOp::Cos,
            "tan" => UnaryOp::Tan,
            "asin" | "arcsin" => UnaryOp::ArcSin,
            "acos" | "arccos" => UnaryOp::ArcCos,
            "atan" | "arctan" => UnaryOp::ArcTan,
            "round" => UnaryOp::Round(0),
            "isnan" | "is_missing" | "is-missing" => UnaryOp::IsMissing,
            other => match other.strip_prefix("round:").map(str::parse::<i32>) {
                Some(Ok(d)) => UnaryOp::Round(d),
                _ => {
                    return Err(Error::InvalidParameter {
                        name: "op",
                        value: s.to_string(),
                        reason: "unknown unary operator".into(),
                    })
                }
            },
        };
        Ok(op)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ElementKind::*;

    #[test]
    fn test_modulo_takes_divisor_sign() {
        assert_eq!(BinaryOp::Modulo.eval(7.0, 3.0), 1.0);
        assert_eq!(BinaryOp::Modulo.eval(-7.0, 3.0), 2.0);
        assert_eq!(BinaryOp::Modulo.eval(7.0, -3.0), -2.0);
        assert!(BinaryOp::Modulo.eval(1.0, 0.0).is_nan());
        assert_eq!(BinaryOp::FloorDivide.eval(-7.0, 2.0), -4.0);
    }

    #[test]
    fn test_comparisons_propagate_missing() {
        assert_eq!(BinaryOp::Less.eval(1.0, 2.0), 1.0);
        assert_eq!(BinaryOp::Equal.eval(1.0, 2.0), 0.0);
        assert!(BinaryOp::NotEqual.eval(f64::NAN, 2.0).is_nan());
        assert!(BinaryOp::And.eval(1.0, f64::NAN).is_nan());
    }

    #[test]
    fn test_bitwise_and_shift() {
        assert_eq!(BinaryOp::And.eval(6.0, 3.0), 2.0);
        assert_eq!(BinaryOp::Or.eval(6.0, 3.0), 7.0);
        assert_eq!(BinaryOp::Xor.eval(6.7, 3.0), 5.0);
        assert_eq!(BinaryOp::ShiftLeft.eval(3.0, 2.0), 12.0);
        assert_eq!(BinaryOp::ShiftRight.eval(-8.0, 1.0), -4.0);
        assert_eq!(BinaryOp::ShiftLeft.eval(1.0, 80.0), 0.0);
    }

    #[test]
    fn test_result_kinds() {
        assert_eq!(BinaryOp::Add.result_kind(UInt8), UInt8);
        assert_eq!(BinaryOp::Add.result_kind(Bool), Int32);
        assert_eq!(BinaryOp::TrueDivide.result_kind(Int16), Float32);
        assert_eq!(BinaryOp::Less.result_kind(Int16), Bool);
        assert_eq!(BinaryOp::Less.result_kind(Float32), Float32);
        assert_eq!(BinaryOp::And.result_kind(Bool), Bool);
        assert_eq!(BinaryOp::ShiftLeft.result_kind(Bool), Int32);
        assert_eq!(UnaryOp::Negate.result_kind(Bool), Int32);
        assert_eq!(UnaryOp::Invert.result_kind(UInt8), Bool);
        assert_eq!(UnaryOp::Invert.result_kind(Float32), Float32);
        assert_eq!(UnaryOp::Sin.result_kind(Int32), Float32);
        assert_eq!(UnaryOp::Round(2).result_kind(Int32), Int32);
    }

    #[test]
    fn test_round_half_to_even() {
        assert_eq!(UnaryOp::Round(0).eval(2.5), 2.0);
        assert_eq!(UnaryOp::Round(0).eval(3.5), 4.0);
        assert_eq!(UnaryOp::Round(0).eval(-0.5), -0.0);
        assert_relative_eq!(UnaryOp::Round(1).eval(1.25), 1.2);
        assert_eq!(UnaryOp::Round(-1).eval(25.0), 20.0);
    }

    #[test]
    fn test_operator_names() {
        for op in BinaryOp::ALL {
            assert_eq!(op.symbol().parse::<BinaryOp>().unwrap(), op);
            assert_eq!(op.name().to_uppercase().parse::<BinaryOp>().unwrap(), op);
        }
        assert!("%%".parse::<BinaryOp>().is_err());
        assert_eq!("round:2".parse::<UnaryOp>().unwrap(), UnaryOp::Round(2));
        assert!("round:x".parse::<UnaryOp>().is_err());
    }
}
