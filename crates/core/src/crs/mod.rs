//! Reference system identifiers
//!
//! The engine never transforms coordinates between systems; it only needs to
//! tell whether two grids declare the same one, and to carry the EPSG code
//! through GeoTIFF files.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Reference system identified by its EPSG code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CRS {
    epsg: u32,
}

impl CRS {
    pub fn from_epsg(code: u32) -> Self {
        Self { epsg: code }
    }

    pub fn epsg(&self) -> u32 {
        self.epsg
    }

    /// EPSG 4000-4999 are geographic 2-D systems, the rest are treated as projected
    pub fn is_geographic(&self) -> bool {
        (4000..5000).contains(&self.epsg)
    }
}

impl fmt::Display for CRS {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg)
    }
}

/// Whether two optional reference systems are compatible for a joint operation.
///
/// An undeclared system only matches another undeclared system.
pub fn same_reference_system(a: Option<&CRS>, b: Option<&CRS>) -> bool {
    a == b
}

/// Label used in error messages for an optional CRS
pub fn describe(crs: Option<&CRS>) -> String {
    crs.map_or_else(|| "undeclared".to_string(), CRS::to_string)
}
