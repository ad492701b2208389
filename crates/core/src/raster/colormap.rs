//! Presentation hint carried by a grid

use serde::{Deserialize, Serialize};

/// Colour map a viewer should use for a grid.
///
/// Purely advisory: it never takes part in computation or grid equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMap {
    #[default]
    Gray,
    Terrain,
    Viridis,
    Magma,
    Spectral,
    Coolwarm,
    Blues,
    Greens,
}
