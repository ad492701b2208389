//! # gridcalc algorithms
//!
//! Operations over [`Grid`](gridcalc_core::Grid)s.
//!
//! ## Available Categories
//!
//! - **algebra**: arithmetic, comparison, bitwise and trigonometric operators, `con`
//! - **local**: cell-wise aggregation across grids, reclassification
//! - **statistics**: focal (moving window), zonal statistics, gap filling
//! - **terrain**: slope, aspect, hillshade

pub mod algebra;
pub mod local;
pub mod statistics;
pub mod terrain;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::algebra::{apply, con, unary, BinaryOp, Operand, UnaryOp};
    pub use crate::local::{aggregate, reclass, ReclassEntry};
    pub use crate::statistics::{
        fill_missing, focal, focal_statistic, zonal, zonal_table, FocalParams, FocalReducer,
        MissingPolicy, Statistic,
    };
    pub use crate::terrain::{aspect, hillshade, slope, AspectOutput, HillshadeParams, SlopeParams};
    pub use gridcalc_core::prelude::*;
}
