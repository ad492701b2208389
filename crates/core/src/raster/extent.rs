//! Bounding boxes and cell sizes

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitAnd, BitOr};

/// Axis-aligned bounding box in a grid's coordinate system
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
}

impl Extent {
    pub fn new(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Self {
        Self {
            xmin,
            ymin,
            xmax,
            ymax,
        }
    }

    /// Coordinate-wise meet of two boxes
    pub fn intersect(&self, other: &Extent) -> Extent {
        Extent::new(
            self.xmin.max(other.xmin),
            self.ymin.max(other.ymin),
            self.xmax.min(other.xmax),
            self.ymax.min(other.ymax),
        )
    }

    /// Coordinate-wise join of two boxes
    pub fn union(&self, other: &Extent) -> Extent {
        Extent::new(
            self.xmin.min(other.xmin),
            self.ymin.min(other.ymin),
            self.xmax.max(other.xmax),
            self.ymax.max(other.ymax),
        )
    }

    pub fn width(&self) -> f64 {
        self.xmax - self.xmin
    }

    pub fn height(&self) -> f64 {
        self.ymax - self.ymin
    }

    /// True when the box covers no area (e.g. the meet of disjoint boxes)
    pub fn is_empty(&self) -> bool {
        !(self.xmin < self.xmax && self.ymin < self.ymax)
    }

    /// Equality up to an absolute tolerance on every coordinate
    pub fn approx_eq(&self, other: &Extent, tolerance: f64) -> bool {
        (self.xmin - other.xmin).abs() <= tolerance
            && (self.ymin - other.ymin).abs() <= tolerance
            && (self.xmax - other.xmax).abs() <= tolerance
            && (self.ymax - other.ymax).abs() <= tolerance
    }
}

impl BitAnd for Extent {
    type Output = Extent;

    fn bitand(self, rhs: Extent) -> Extent {
        self.intersect(&rhs)
    }
}

impl BitOr for Extent {
    type Output = Extent;

    fn bitor(self, rhs: Extent) -> Extent {
        self.union(&rhs)
    }
}

impl fmt::Display for Extent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {}, {})", self.xmin, self.ymin, self.xmax, self.ymax)
    }
}

/// Edge length of one cell in each direction; both strictly positive
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CellSize {
    pub x: f64,
    pub y: f64,
}

impl CellSize {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Square cells
    pub fn square(size: f64) -> Self {
        Self::new(size, size)
    }

    /// Component-wise maximum (the coarser cell wins)
    pub fn max(&self, other: &CellSize) -> CellSize {
        CellSize::new(self.x.max(other.x), self.y.max(other.y))
    }

    /// Equality up to a relative tolerance
    pub fn approx_eq(&self, other: &CellSize, relative: f64) -> bool {
        (self.x - other.x).abs() <= relative * self.x.max(other.x)
            && (self.y - other.y).abs() <= relative * self.y.max(other.y)
    }

    /// Smaller of the two edge lengths
    pub fn min_edge(&self) -> f64 {
        self.x.min(self.y)
    }
}

impl fmt::Display for CellSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.x == self.y {
            write!(f, "{}", self.x)
        } else {
            write!(f, "{} x {}", self.x, self.y)
        }
    }
}
