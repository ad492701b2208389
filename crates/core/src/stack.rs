//! Multi-band stacks

use crate::align::{standardize, ExtentMode, Resampling};
use crate::crs::CRS;
use crate::error::{Error, Result};
use crate::raster::{CellSize, Extent, Grid, GridGeometry};
use std::fmt;

/// Bands that share one CRS, cell size and extent.
///
/// Building a stack aligns its bands onto their common intersection, so band
/// `i` and band `j` always line up cell for cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Stack {
    bands: Vec<Grid>,
}

impl Stack {
    /// Align `bands` on their intersection; at least one band is required
    pub fn new(bands: Vec<Grid>) -> Result<Self> {
        if bands.is_empty() {
            return Err(Error::InvalidParameter {
                name: "bands",
                value: "0".into(),
                reason: "a stack needs at least one band".into(),
            });
        }
        Ok(Self {
            bands: standardize(ExtentMode::Intersect, &bands)?,
        })
    }

    pub fn bands(&self) -> &[Grid] {
        &self.bands
    }

    pub fn into_bands(self) -> Vec<Grid> {
        self.bands
    }

    /// Band by zero-based index
    pub fn band(&self, index: usize) -> Option<&Grid> {
        self.bands.get(index)
    }

    pub fn band_count(&self) -> usize {
        self.bands.len()
    }

    fn first(&self) -> &Grid {
        &self.bands[0]
    }

    pub fn geometry(&self) -> GridGeometry {
        self.first().geometry()
    }

    pub fn crs(&self) -> Option<&CRS> {
        self.first().crs()
    }

    pub fn cell_size(&self) -> CellSize {
        self.first().cell_size()
    }

    pub fn extent(&self) -> Extent {
        self.first().extent()
    }

    /// Apply `f` to every band and stack the results
    pub fn each<F>(&self, f: F) -> Result<Stack>
    where
        F: FnMut(&Grid) -> Result<Grid>,
    {
        Stack::new(self.bands.iter().map(f).collect::<Result<Vec<_>>>()?)
    }

    /// Combine band `i` of both stacks with `f`.
    ///
    /// Each pair is aligned on its intersection before `f` sees it. Extra
    /// bands of the longer stack are dropped.
    pub fn zip_with<F>(&self, other: &Stack, mut f: F) -> Result<Stack>
    where
        F: FnMut(&Grid, &Grid) -> Result<Grid>,
    {
        let bands = self
            .bands
            .iter()
            .zip(&other.bands)
            .map(|(a, b)| {
                let pair = standardize(ExtentMode::Intersect, &[a.clone(), b.clone()])?;
                f(&pair[0], &pair[1])
            })
            .collect::<Result<Vec<_>>>()?;
        Stack::new(bands)
    }

    /// Value of every band at (x, y); NaN where missing or outside
    pub fn values(&self, x: f64, y: f64) -> Vec<f64> {
        self.bands.iter().map(|g| g.value_at(x, y)).collect()
    }

    /// Clip or pad every band to `extent`
    pub fn clip(&self, extent: &Extent) -> Result<Stack> {
        self.each(|g| g.clip(extent))
    }

    /// Change every band's cell size
    pub fn resample(&self, cell_size: CellSize, method: Resampling) -> Result<Stack> {
        self.each(|g| g.resample(cell_size, method))
    }
}

impl fmt::Display for Stack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let first = self.first();
        write!(
            f,
            "{} x {} {} | crs: {} | cell: {} | bands: {}",
            first.cols(),
            first.rows(),
            first.kind(),
            crate::crs::describe(first.crs()),
            first.cell_size(),
            self.bands.len()
        )
    }
}
