// THEORY:
// The `Grid` is the plain 2-D container every per-pixel quantity in the detector
// is stored in. It is a "dumb" data container: a width, a height and a flat,
// row-major vector of cells. It knows how to address its cells safely and
// nothing else.
//
// Key architectural principles:
// 1.  **Explicit Element Types**: A grid is typed by what it holds. Flow fields
//     are `Grid<FlowVector>`; the binary mask lives in its own `MotionMask`
//     type. Nothing converts between them implicitly.
// 2.  **Bounds-Checked Access**: `get` returns `Option`, so callers that
//     can wander off the edge must say what happens there. Indexing with
//     `grid[(x, y)]` is reserved for coordinates that are known to be inside and
//     panics with the offending coordinate otherwise.
// 3.  **Row-Major Iteration**: `iter` walks the cells in memory order and
//     yields each cell's coordinates with it.

use std::ops::{Index, IndexMut};

/// A row-major, fixed-size 2-D grid of cells.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid<T> {
    width: u32,
    height: u32,
    cells: Vec<T>,
}

impl<T: Clone> Grid<T> {
    /// Creates a grid with every cell set to `value`.
    pub fn filled(width: u32, height: u32, value: T) -> Self {
        Self {
            width,
            height,
            cells: vec![value; width as usize * height as usize],
        }
    }
}

impl<T> Grid<T> {
    /// Creates a grid by evaluating `f(x, y)` for every cell in row-major order.
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> T) -> Self {
        let mut cells = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                cells.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            cells,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns `(width, height)`, matching `image::GenericImageView::dimensions`.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn offset(&self, x: u32, y: u32) -> Option<usize> {
        if x < self.width && y < self.height {
            Some(y as usize * self.width as usize + x as usize)
        } else {
            None
        }
    }

    /// Returns the cell at `(x, y)`, or `None` outside the grid.
    pub fn get(&self, x: u32, y: u32) -> Option<&T> {
        self.offset(x, y).map(|i| &self.cells[i])
    }

    /// Iterates every cell, yielding `(x, y, cell)`.
    pub fn iter(&self) -> impl Iterator<Item = (u32, u32, &T)> + '_ {
        let width = self.width.max(1);
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, cell)| (i as u32 % width, i as u32 / width, cell))
    }
}

impl<T> Index<(u32, u32)> for Grid<T> {
    type Output = T;

    fn index(&self, (x, y): (u32, u32)) -> &T {
        match self.offset(x, y) {
            Some(i) => &self.cells[i],
            None => panic!(
                "cell ({x}, {y}) outside grid of {}x{}",
                self.width, self.height
            ),
        }
    }
}

impl<T> IndexMut<(u32, u32)> for Grid<T> {
    fn index_mut(&mut self, (x, y): (u32, u32)) -> &mut T {
        match self.offset(x, y) {
            Some(i) => &mut self.cells[i],
            None => panic!(
                "cell ({x}, {y}) outside grid of {}x{}",
                self.width, self.height
            ),
        }
    }
}

/// Estimated displacement of one pixel between two frames, in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FlowVector {
    /// Horizontal displacement (positive to the right).
    pub dx: f32,
    /// Vertical displacement (positive downwards).
    pub dy: f32,
}

impl FlowVector {
    pub const ZERO: Self = Self { dx: 0.0, dy: 0.0 };

    pub fn new(dx: f32, dy: f32) -> Self {
        Self { dx, dy }
    }

    /// Sum of the absolute components after scaling, `|s·dx| + |s·dy|`.
    ///
    /// This is the sensitivity metric the motion mask thresholds; it is not the
    /// Euclidean norm.
    pub fn scaled_l1(&self, scale: f32) -> f32 {
        (scale * self.dx).abs() + (scale * self.dy).abs()
    }
}

/// A dense per-pixel displacement field between two frames.
pub type FlowField = Grid<FlowVector>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_fn_is_row_major() {
        let grid = Grid::from_fn(3, 2, |x, y| (x, y));
        assert_eq!(grid.get(1, 1), Some(&(1, 1)));
        assert_eq!(grid[(2, 0)], (2, 0));
        assert_eq!(grid.dimensions(), (3, 2));
    }

    #[test]
    fn get_is_bounds_checked() {
        let mut grid = Grid::filled(4, 4, 0u8);
        assert!(grid.get(4, 0).is_none());
        assert!(grid.get(0, 4).is_none());
        grid[(3, 3)] = 9;
        assert_eq!(grid.get(3, 3), Some(&9));
    }

    #[test]
    #[should_panic(expected = "outside grid")]
    fn index_outside_panics() {
        let grid = Grid::filled(2, 2, 0.0f32);
        let _ = grid[(2, 1)];
    }

    #[test]
    fn iter_yields_coordinates() {
        let grid = Grid::from_fn(2, 2, |x, y| x + 10 * y);
        let seen: Vec<_> = grid.iter().map(|(x, y, v)| (x, y, *v)).collect();
        assert_eq!(seen, vec![(0, 0, 0), (1, 0, 1), (0, 1, 10), (1, 1, 11)]);
    }

    #[test]
    fn scaled_l1_uses_absolute_components() {
        let v = FlowVector::new(3.0, -2.0);
        assert_eq!(v.scaled_l1(5.0), 25.0);
        assert_eq!(FlowVector::ZERO.scaled_l1(5.0), 0.0);
    }
}
