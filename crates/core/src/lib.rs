//! # gridcalc core
//!
//! Core types and I/O for the gridcalc raster algebra engine.
//!
//! This crate provides:
//! - [`Grid`]: immutable georeferenced 2-D grid over a closed set of element kinds
//! - [`GeoTransform`], [`Extent`], [`CellSize`]: placement in world space
//! - [`CRS`]: reference system identifiers
//! - [`standardize`]: bringing grids onto a common cell size and extent
//! - [`mosaic`]: merging overlapping grids
//! - [`Stack`]: aligned multi-band grids
//! - GeoTIFF decode/encode

pub mod align;
pub mod crs;
pub mod error;
pub mod io;
pub mod mosaic;
pub mod raster;
pub mod stack;

pub use align::{common_geometry, standardize, standardize_with, ExtentMode, Reproject, Resampling};
pub use crs::CRS;
pub use error::{Error, Result};
pub use mosaic::mosaic;
pub use raster::{
    CellSize, Cells, ColorMap, ElementKind, Extent, GeoTransform, Grid, GridElement, GridGeometry,
    Neighborhood,
};
pub use stack::Stack;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::align::{standardize, ExtentMode, Resampling};
    pub use crate::crs::CRS;
    pub use crate::error::{Error, Result};
    pub use crate::mosaic::mosaic;
    pub use crate::raster::{
        CellSize, ElementKind, Extent, GeoTransform, Grid, GridGeometry, Neighborhood,
    };
    pub use crate::stack::Stack;
}
