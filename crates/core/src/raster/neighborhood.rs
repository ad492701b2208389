//! Window shapes for focal operations

use ndarray::Array2;

/// A square window of side `2 * buffer + 1` centred on a cell, optionally
/// restricted to a disc.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Neighborhood {
    /// Every cell within `buffer` rows and columns
    Square(usize),
    /// Cells whose Euclidean distance from the centre is at most `buffer`
    Circle(usize),
}

impl Neighborhood {
    pub fn new(buffer: usize, circular: bool) -> Self {
        if circular {
            Neighborhood::Circle(buffer)
        } else {
            Neighborhood::Square(buffer)
        }
    }

    /// Halo width in cells
    pub fn buffer(&self) -> usize {
        match self {
            Neighborhood::Square(b) | Neighborhood::Circle(b) => *b,
        }
    }

    /// Side length of the bounding square
    pub fn size(&self) -> usize {
        self.buffer() * 2 + 1
    }

    /// Check if a relative position is within this neighborhood
    pub fn contains(&self, dr: isize, dc: isize) -> bool {
        let b = self.buffer() as isize;
        match self {
            Neighborhood::Square(_) => dr.abs() <= b && dc.abs() <= b,
            Neighborhood::Circle(_) => {
                let dist = ((dr * dr + dc * dc) as f64).sqrt();
                dist <= b as f64
            }
        }
    }

    /// Boolean mask over the bounding square, row-major
    pub fn mask(&self) -> Array2<bool> {
        let b = self.buffer() as isize;
        let size = self.size();
        Array2::from_shape_fn((size, size), |(r, c)| {
            self.contains(r as isize - b, c as isize - b)
        })
    }

    /// Selected positions inside the bounding square, row-major.
    ///
    /// Positions are relative to the square's upper-left corner, which is
    /// what indexing into a padded array needs.
    pub fn window_offsets(&self) -> Vec<(usize, usize)> {
        self.mask()
            .indexed_iter()
            .filter(|(_, &inside)| inside)
            .map(|(pos, _)| pos)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_square_offsets() {
        assert_eq!(Neighborhood::Square(1).window_offsets().len(), 9);
        assert_eq!(Neighborhood::Square(2).window_offsets().len(), 25);
        assert_eq!(Neighborhood::Square(0).window_offsets(), vec![(0, 0)]);
    }

    #[test]
    fn test_circle_mask() {
        // dr² + dc² <= 4: centre, 8 ring-1 cells and the 4 axis cells at distance 2
        let circle = Neighborhood::Circle(2);
        assert_eq!(circle.window_offsets().len(), 13);

        let mask = circle.mask();
        assert!(mask[(2, 2)]);
        assert!(mask[(0, 2)]);
        assert!(!mask[(0, 0)]);
        assert!(!mask[(1, 0)]);
    }

    #[test]
    fn test_offsets_are_row_major() {
        let offsets = Neighborhood::Circle(1).window_offsets();
        assert_eq!(offsets, vec![(0, 1), (1, 0), (1, 1), (1, 2), (2, 1)]);
    }
}
