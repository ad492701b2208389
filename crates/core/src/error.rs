//! Error types for gridcalc

use thiserror::Error;

/// Main error type for gridcalc operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid grid dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Index out of bounds: ({row}, {col}) in grid of size ({rows}, {cols})")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("Grid size mismatch: expected ({er}, {ec}), got ({ar}, {ac})")]
    SizeMismatch { er: usize, ec: usize, ar: usize, ac: usize },

    #[error("Input grids must share a coordinate reference system: {0} vs {1}")]
    IncompatibleReferenceSystem(String, String),

    #[error("Grid extents do not overlap")]
    DisjointExtents,

    #[error("None of the cells has a value")]
    EmptyResult,

    #[error("At least one operand must be a grid")]
    NoGridOperand,

    #[error("Invalid geotransform: {0}")]
    InvalidTransform(String),

    #[error("Unsupported data type: {0}")]
    UnsupportedDataType(String),

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("Algorithm error: {0}")]
    Algorithm(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for gridcalc operations
pub type Result<T> = std::result::Result<T, Error>;
