//! Grid data structures

mod cells;
mod colormap;
mod element;
mod extent;
mod geotransform;
mod grid;
mod neighborhood;

pub use cells::Cells;
pub use colormap::ColorMap;
pub use element::{ElementKind, GridElement, WideElement};
pub use extent::{CellSize, Extent};
pub use geotransform::GeoTransform;
pub use grid::{CellPoints, Grid, GridGeometry, GridStatistics};
pub use neighborhood::Neighborhood;
