//! Main Grid type

use crate::crs::{self, CRS};
use crate::error::{Error, Result};
use crate::raster::{Cells, CellSize, ColorMap, ElementKind, Extent, GeoTransform};
use ndarray::Array2;
use std::fmt;
use std::sync::Arc;

/// Placement of a grid in world space: transform plus dimensions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridGeometry {
    pub transform: GeoTransform,
    pub rows: usize,
    pub cols: usize,
}

impl GridGeometry {
    pub fn new(transform: GeoTransform, rows: usize, cols: usize) -> Self {
        Self {
            transform,
            rows,
            cols,
        }
    }

    /// Geometry covering `extent` with whole cells of `cell_size`.
    ///
    /// Dimensions are rounded to the nearest whole number of cells.
    pub fn from_extent(extent: &Extent, cell_size: CellSize) -> Result<Self> {
        if extent.is_empty() {
            return Err(Error::DisjointExtents);
        }
        let cols = (extent.width() / cell_size.x).round() as usize;
        let rows = (extent.height() / cell_size.y).round() as usize;
        if rows == 0 || cols == 0 {
            return Err(Error::InvalidDimensions {
                width: cols,
                height: rows,
            });
        }
        Ok(Self::new(GeoTransform::from_extent(extent, cell_size), rows, cols))
    }

    pub fn cell_size(&self) -> CellSize {
        self.transform.cell_size()
    }

    pub fn extent(&self) -> Extent {
        self.transform.extent(self.cols, self.rows)
    }

    /// Same cell size and extent, within a small fraction of a cell
    pub fn matches(&self, other: &GridGeometry) -> bool {
        let cs = self.cell_size();
        self.rows == other.rows
            && self.cols == other.cols
            && cs.approx_eq(&other.cell_size(), 1e-9)
            && self.extent().approx_eq(&other.extent(), cs.min_edge() * 1e-9)
    }
}

/// A georeferenced, immutable 2-D grid.
///
/// Cells live behind an [`Arc`], so clones are cheap and share storage. No
/// operation mutates a grid; every transformation returns a new one.
///
/// # Example
///
/// ```ignore
/// use gridcalc_core::{Grid, GeoTransform, CRS};
///
/// let grid = Grid::from_vec(vec![1_i16, 2, 3, 4], 2, 2)?
///     .with_crs(Some(CRS::from_epsg(32633)))
///     .with_transform(GeoTransform::new(500_000.0, 4_000_000.0, 30.0, -30.0))?;
/// assert_eq!(grid.value_at(500_010.0, 3_999_950.0), 3.0);
/// ```
#[derive(Debug, Clone)]
pub struct Grid {
    cells: Arc<Cells>,
    crs: Option<CRS>,
    transform: GeoTransform,
    color_map: ColorMap,
}

impl Grid {
    /// Create a grid, validating its dimensions and transform
    pub fn new(cells: impl Into<Cells>, crs: Option<CRS>, transform: GeoTransform) -> Result<Self> {
        let cells = cells.into();
        let (rows, cols) = cells.dim();
        if rows == 0 || cols == 0 {
            return Err(Error::InvalidDimensions {
                width: cols,
                height: rows,
            });
        }
        transform.validate()?;
        Ok(Self {
            cells: Arc::new(cells),
            crs,
            transform,
            color_map: ColorMap::default(),
        })
    }

    /// Create a grid with the default transform and no CRS
    pub fn from_array(data: impl Into<Cells>) -> Result<Self> {
        Self::new(data, None, GeoTransform::default())
    }

    /// Create a grid from row-major values
    pub fn from_vec<T>(data: Vec<T>, rows: usize, cols: usize) -> Result<Self>
    where
        Array2<T>: Into<Cells>,
    {
        if data.len() != rows * cols {
            return Err(Error::InvalidDimensions {
                width: cols,
                height: rows,
            });
        }
        let array =
            Array2::from_shape_vec((rows, cols), data).map_err(|e| Error::Other(e.to_string()))?;
        Self::from_array(array)
    }

    /// Same CRS and transform, new cells of matching shape
    pub fn with_cells(&self, cells: impl Into<Cells>) -> Result<Self> {
        let cells = cells.into();
        if cells.dim() != self.shape() {
            let (ar, ac) = cells.dim();
            return Err(Error::SizeMismatch {
                er: self.rows(),
                ec: self.cols(),
                ar,
                ac,
            });
        }
        Self::new(cells, self.crs, self.transform)
    }

    /// Same geometry, computed values narrowed into `kind`
    pub fn with_values(&self, kind: ElementKind, values: &Array2<f64>) -> Result<Self> {
        self.with_cells(Cells::from_f64(kind, values))
    }

    /// Replace the CRS
    pub fn with_crs(mut self, crs: Option<CRS>) -> Self {
        self.crs = crs;
        self
    }

    /// Replace the transform
    pub fn with_transform(mut self, transform: GeoTransform) -> Result<Self> {
        transform.validate()?;
        self.transform = transform;
        Ok(self)
    }

    /// Attach a presentation hint
    pub fn with_color_map(mut self, color_map: ColorMap) -> Self {
        self.color_map = color_map;
        self
    }

    // Dimensions

    /// Number of rows
    pub fn rows(&self) -> usize {
        self.cells.dim().0
    }

    /// Number of columns
    pub fn cols(&self) -> usize {
        self.cells.dim().1
    }

    /// Dimensions as (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        self.cells.dim()
    }

    /// Total number of cells
    pub fn len(&self) -> usize {
        self.rows() * self.cols()
    }

    /// Grids always hold at least one cell
    pub fn is_empty(&self) -> bool {
        false
    }

    // Data access

    pub fn kind(&self) -> ElementKind {
        self.cells.kind()
    }

    pub fn cells(&self) -> &Cells {
        &self.cells
    }

    /// Value at (row, col) widened to `f64`; NaN marks a missing cell
    pub fn get(&self, row: usize, col: usize) -> Result<f64> {
        self.cells.get_f64(row, col).ok_or(Error::IndexOutOfBounds {
            row,
            col,
            rows: self.rows(),
            cols: self.cols(),
        })
    }

    /// All cells widened to `f64`
    pub fn to_f64(&self) -> Array2<f64> {
        self.cells.to_f64()
    }

    /// Same grid with a different element kind
    pub fn cast(&self, kind: ElementKind) -> Grid {
        if kind == self.kind() {
            return self.clone();
        }
        Grid {
            cells: Arc::new(self.cells.cast(kind)),
            crs: self.crs,
            transform: self.transform,
            color_map: self.color_map,
        }
    }

    // Metadata

    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    pub fn crs(&self) -> Option<&CRS> {
        self.crs.as_ref()
    }

    pub fn color_map(&self) -> ColorMap {
        self.color_map
    }

    pub fn geometry(&self) -> GridGeometry {
        GridGeometry::new(self.transform, self.rows(), self.cols())
    }

    pub fn cell_size(&self) -> CellSize {
        self.transform.cell_size()
    }

    pub fn extent(&self) -> Extent {
        self.transform.extent(self.cols(), self.rows())
    }

    /// Same CRS, cell size and extent: cells line up one to one
    pub fn same_geometry(&self, other: &Grid) -> bool {
        crs::same_reference_system(self.crs(), other.crs())
            && self.geometry().matches(&other.geometry())
    }

    // Missing values

    /// Boolean grid, true where the cell is missing
    pub fn is_missing(&self) -> Grid {
        let mask = match self.cells.as_ref() {
            Cells::Float32(a) => a.mapv(f32::is_nan),
            other => Array2::from_elem(other.dim(), false),
        };
        Grid {
            cells: Arc::new(Cells::Bool(mask)),
            crs: self.crs,
            transform: self.transform,
            color_map: ColorMap::default(),
        }
    }

    pub fn has_missing(&self) -> bool {
        match self.cells.as_ref() {
            Cells::Float32(a) => a.iter().any(|v| v.is_nan()),
            _ => false,
        }
    }

    /// Cell-wise equality that treats two missing cells as equal
    pub fn same_values(&self, other: &Grid) -> bool {
        self.shape() == other.shape()
            && self
                .to_f64()
                .iter()
                .zip(other.to_f64().iter())
                .all(|(a, b)| a == b || (a.is_nan() && b.is_nan()))
    }

    // Coordinates

    /// Value of the cell containing (x, y); NaN outside the grid
    pub fn value_at(&self, x: f64, y: f64) -> f64 {
        let (col, row) = self.transform.geo_to_pixel(x, y);
        if !(col >= 0.0 && row >= 0.0) || col >= self.cols() as f64 || row >= self.rows() as f64 {
            return f64::NAN;
        }
        self.cells
            .get_f64(row as usize, col as usize)
            .unwrap_or(f64::NAN)
    }

    /// Lazy iterator over the centre point and value of every non-missing cell.
    ///
    /// Calling it again restarts from the first cell.
    pub fn points(&self) -> CellPoints<'_> {
        CellPoints {
            grid: self,
            index: 0,
        }
    }

    /// Smallest extent covering every non-missing cell
    pub fn data_extent(&self) -> Result<Extent> {
        let cs = self.cell_size();
        let mut bounds: Option<Extent> = None;
        for ((x, y), _) in self.points() {
            let cell = Extent::new(x - cs.x / 2.0, y - cs.y / 2.0, x + cs.x / 2.0, y + cs.y / 2.0);
            bounds = Some(match bounds {
                Some(b) => b.union(&cell),
                None => cell,
            });
        }
        bounds.ok_or(Error::EmptyResult)
    }

    // Statistics

    /// Basic statistics over non-missing cells
    pub fn statistics(&self) -> GridStatistics {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut sum = 0.0;
        let mut sum_sq = 0.0;
        let mut count: usize = 0;

        for value in self.to_f64().iter().copied().filter(|v| !v.is_nan()) {
            min = min.min(value);
            max = max.max(value);
            sum += value;
            sum_sq += value * value;
            count += 1;
        }

        let (mean, std_dev) = if count > 0 {
            let mean = sum / count as f64;
            let var = (sum_sq / count as f64 - mean * mean).max(0.0);
            (Some(mean), Some(var.sqrt()))
        } else {
            (None, None)
        };

        GridStatistics {
            min: (count > 0).then_some(min),
            max: (count > 0).then_some(max),
            mean,
            std_dev,
            valid_count: count,
            missing_count: self.len() - count,
        }
    }
}

/// Grids compare by cells, CRS and transform; the colour map is ignored.
impl PartialEq for Grid {
    fn eq(&self, other: &Self) -> bool {
        self.transform == other.transform && self.crs == other.crs && self.cells == other.cells
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stats = self.statistics();
        let d = if self.kind().is_float() { 3 } else { 0 };
        let show = |v: Option<f64>| v.map_or_else(|| "nan".to_string(), |v| format!("{:.*}", d, v));
        write!(
            f,
            "image: {}x{} {} | range: {}~{} | mean: {} | std: {} | crs: {} | cell: {}",
            self.cols(),
            self.rows(),
            self.kind(),
            show(stats.min),
            show(stats.max),
            show(stats.mean),
            show(stats.std_dev),
            crs::describe(self.crs()),
            self.cell_size()
        )
    }
}

/// Basic statistics for a grid
#[derive(Debug, Clone, PartialEq)]
pub struct GridStatistics {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
    pub std_dev: Option<f64>,
    pub valid_count: usize,
    pub missing_count: usize,
}

/// Iterator returned by [`Grid::points`]
pub struct CellPoints<'a> {
    grid: &'a Grid,
    index: usize,
}

impl Iterator for CellPoints<'_> {
    /// ((x, y) of the cell centre, value)
    type Item = ((f64, f64), f64);

    fn next(&mut self) -> Option<Self::Item> {
        let cols = self.grid.cols();
        while self.index < self.grid.len() {
            let (row, col) = (self.index / cols, self.index % cols);
            self.index += 1;
            if let Some(value) = self.grid.cells.get_f64(row, col) {
                if !value.is_nan() {
                    return Some((self.grid.transform.pixel_to_geo(col, row), value));
                }
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.grid.len() - self.index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    fn sample() -> Grid {
        Grid::new(
            array![[1.0_f32, 2.0, f32::NAN], [4.0, 5.0, 6.0]],
            Some(CRS::from_epsg(4326)),
            GeoTransform::new(10.0, 20.0, 0.5, -0.5),
        )
        .unwrap()
    }

    #[test]
    fn test_grid_creation() {
        let grid = Grid::from_vec(vec![0_u16; 200], 10, 20).unwrap();
        assert_eq!(grid.rows(), 10);
        assert_eq!(grid.cols(), 20);
        assert_eq!(grid.kind(), ElementKind::UInt16);
        assert!(Grid::from_vec(vec![0_u16; 3], 2, 2).is_err());
        assert!(Grid::from_array(Array2::<f32>::zeros((0, 3))).is_err());
    }

    #[test]
    fn test_rejects_rotated_transform() {
        let rotated = GeoTransform::from_gdal([0.0, 1.0, 0.2, 0.0, 0.0, -1.0]);
        assert!(Grid::new(array![[1_i8]], None, rotated).is_err());
    }

    #[test]
    fn test_geometry() {
        let grid = sample();
        let extent = grid.extent();
        assert_relative_eq!(extent.xmin, 10.0);
        assert_relative_eq!(extent.xmax, 11.5);
        assert_relative_eq!(extent.ymin, 19.0);
        assert_relative_eq!(extent.ymax, 20.0);
        assert_eq!(grid.cell_size(), CellSize::square(0.5));
    }

    #[test]
    fn test_value_at() {
        let grid = sample();
        assert_eq!(grid.value_at(10.1, 19.9), 1.0);
        assert_eq!(grid.value_at(11.4, 19.1), 6.0);
        assert!(grid.value_at(9.9, 19.9).is_nan());
        assert!(grid.value_at(10.1, 20.1).is_nan());
    }

    #[test]
    fn test_points_skip_missing_and_restart() {
        let grid = sample();
        let points: Vec<_> = grid.points().collect();
        assert_eq!(points.len(), 5);
        assert_eq!(points[0], ((10.25, 19.75), 1.0));
        assert_eq!(grid.points().count(), 5);
    }

    #[test]
    fn test_data_extent() {
        let grid = Grid::from_array(array![
            [f32::NAN, f32::NAN, f32::NAN],
            [f32::NAN, 3.0, f32::NAN],
            [f32::NAN, 1.0, f32::NAN]
        ])
        .unwrap();
        let extent = grid.data_extent().unwrap();
        assert_eq!(extent, Extent::new(1.0, -3.0, 2.0, -1.0));

        let empty = Grid::from_array(array![[f32::NAN]]).unwrap();
        assert!(matches!(empty.data_extent(), Err(Error::EmptyResult)));
    }

    #[test]
    fn test_statistics() {
        let stats = sample().statistics();
        assert_eq!(stats.min, Some(1.0));
        assert_eq!(stats.max, Some(6.0));
        assert_relative_eq!(stats.mean.unwrap(), 3.6);
        assert_eq!(stats.valid_count, 5);
        assert_eq!(stats.missing_count, 1);
    }

    #[test]
    fn test_equality_ignores_color_map() {
        let a = Grid::from_array(array![[1_u8, 2]]).unwrap();
        let b = a.clone().with_color_map(ColorMap::Terrain);
        assert_eq!(a, b);
        assert_ne!(a, a.cast(ElementKind::Int16));
    }

    #[test]
    fn test_missing_mask() {
        let grid = sample();
        assert!(grid.has_missing());
        let mask = grid.is_missing();
        assert_eq!(mask.kind(), ElementKind::Bool);
        assert_eq!(mask.get(0, 2).unwrap(), 1.0);
        assert!(!Grid::from_array(array![[1_i32]]).unwrap().has_missing());
    }
}
