//! Bordered grid of cells
//!
//! A grid built for an inner area of `W x H` cells actually stores
//! `(W+2) x (H+2)` cells: the outermost ring is a fixed frame used for
//! intersection tests.
//!
//! ```text
//!   B B .. B B
//!   B 0 .. 0 B
//!   .        .
//!   B 0 .. 0 B
//!   G G .. G B
//! ```
//!
//! `B` marks a side/ceiling border cell, `G` the floor. Coordinates are
//! `(x, y)` with `x` growing to the right and `y` growing downwards.

use crate::cell::{Cell, CellCode};
use crate::error::{EngineError, Result};
use ratatui::style::Color;
use std::fmt;
use std::ops::Add;

/// A point in grid or shape space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

/// Flat indices of the 4-neighborhood of an interior cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Neighborhood {
    pub right: usize,
    pub left: usize,
    pub top: usize,
    pub bottom: usize,
}

/// One entry of the render sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayCell {
    pub code: CellCode,
    pub color: Option<Color>,
}

impl From<&Cell> for DisplayCell {
    fn from(cell: &Cell) -> Self {
        Self {
            code: cell.code(),
            color: cell.color,
        }
    }
}

/// Owned, row-major copy of the grid handed to renderers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderSnapshot {
    pub width: usize,
    pub height: usize,
    pub cells: Vec<DisplayCell>,
}

impl RenderSnapshot {
    pub fn rows(&self) -> impl Iterator<Item = &[DisplayCell]> {
        self.cells.chunks(self.width)
    }

    pub fn at(&self, x: usize, y: usize) -> Option<DisplayCell> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.cells.get(y * self.width + x).copied()
    }
}

/// The playing field
#[derive(Debug, Clone)]
pub struct Grid {
    inner_width: usize,
    inner_height: usize,
    /// Row-major cell store
    cells: Vec<Cell>,
    /// Neighbor lookups, `Some` exactly for interior cells
    neighborhoods: Vec<Option<Neighborhood>>,
}

impl Grid {
    /// Build an empty grid with the given inner dimensions
    pub fn new(width: usize, height: usize) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(EngineError::config(format!(
                "grid dimensions must be positive, got {}x{}",
                width, height
            )));
        }

        let total = width
            .checked_add(2)
            .zip(height.checked_add(2))
            .and_then(|(w, h)| w.checked_mul(h))
            .ok_or_else(|| {
                EngineError::config(format!("grid dimensions too large: {}x{}", width, height))
            })?;
        let mut grid = Self {
            inner_width: width,
            inner_height: height,
            cells: vec![Cell::empty(); total],
            neighborhoods: vec![None; total],
        };
        grid.specify_borders();
        grid.encode_neighborhoods();
        Ok(grid)
    }

    pub fn inner_width(&self) -> usize {
        self.inner_width
    }

    pub fn inner_height(&self) -> usize {
        self.inner_height
    }

    /// Inner width plus the two side borders
    pub fn total_width(&self) -> usize {
        self.inner_width + 2
    }

    /// Inner height plus ceiling and floor
    pub fn total_height(&self) -> usize {
        self.inner_height + 2
    }

    /// Interior column indices, left to right
    pub fn interior_columns(&self) -> std::ops::RangeInclusive<usize> {
        1..=self.inner_width
    }

    /// Interior row indices, top to bottom
    pub fn interior_rows(&self) -> std::ops::RangeInclusive<usize> {
        1..=self.inner_height
    }

    pub fn is_interior(&self, x: usize, y: usize) -> bool {
        (1..=self.inner_width).contains(&x) && (1..=self.inner_height).contains(&y)
    }

    /// Flat index of `(x, y)`, `None` when outside the grid
    pub fn index_of(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 {
            return None;
        }
        let (x, y) = (x as usize, y as usize);
        if x >= self.total_width() || y >= self.total_height() {
            return None;
        }
        Some(y * self.total_width() + x)
    }

    /// Coordinates of a flat index
    pub fn coords_of(&self, index: usize) -> (usize, usize) {
        (index % self.total_width(), index / self.total_width())
    }

    /// Checked lookup for callers probing candidate positions
    pub fn get(&self, x: i32, y: i32) -> Option<&Cell> {
        self.index_of(x, y).map(|idx| &self.cells[idx])
    }

    /// Cell at `(x, y)`.
    ///
    /// # Panics
    /// Out-of-range access is a caller bug; coordinates are validated upstream.
    pub fn field_at(&self, x: usize, y: usize) -> &Cell {
        let idx = self.checked_index(x, y);
        &self.cells[idx]
    }

    /// Mutable cell at `(x, y)`, panics like [`Grid::field_at`]
    pub fn field_at_mut(&mut self, x: usize, y: usize) -> &mut Cell {
        let idx = self.checked_index(x, y);
        &mut self.cells[idx]
    }

    /// Replace the cell at `(x, y)`, panics like [`Grid::field_at`]
    pub fn set_field_at(&mut self, x: usize, y: usize, cell: Cell) {
        let idx = self.checked_index(x, y);
        self.cells[idx] = cell;
    }

    pub fn cell(&self, index: usize) -> &Cell {
        &self.cells[index]
    }

    pub fn cell_mut(&mut self, index: usize) -> &mut Cell {
        &mut self.cells[index]
    }

    /// Neighbor lookups of an interior cell
    pub fn neighbors(&self, x: usize, y: usize) -> Option<Neighborhood> {
        if x >= self.total_width() || y >= self.total_height() {
            return None;
        }
        self.neighborhoods[y * self.total_width() + x]
    }

    /// Neighbor lookups by flat index
    pub fn neighbors_of(&self, index: usize) -> Option<Neighborhood> {
        self.neighborhoods.get(index).copied().flatten()
    }

    /// Row-major render sequence. Cloning the iterator restarts it.
    pub fn to_display(&self) -> impl Iterator<Item = DisplayCell> + Clone + '_ {
        self.cells.iter().map(DisplayCell::from)
    }

    pub fn snapshot(&self) -> RenderSnapshot {
        RenderSnapshot {
            width: self.total_width(),
            height: self.total_height(),
            cells: self.to_display().collect(),
        }
    }

    fn checked_index(&self, x: usize, y: usize) -> usize {
        if x >= self.total_width() || y >= self.total_height() {
            panic!(
                "cell ({}, {}) out of range for {}x{} grid",
                x,
                y,
                self.total_width(),
                self.total_height()
            );
        }
        y * self.total_width() + x
    }

    /// Stamp the frame. Side columns win over the floor so the two bottom
    /// corners are plain borders.
    fn specify_borders(&mut self) {
        let (w, h) = (self.total_width(), self.total_height());
        for x in 0..w {
            self.set_field_at(x, 0, Cell::border());
            self.set_field_at(x, h - 1, Cell::ground_border());
        }
        for y in 0..h {
            self.set_field_at(0, y, Cell::border());
            self.set_field_at(w - 1, y, Cell::border());
        }
    }

    fn encode_neighborhoods(&mut self) {
        let w = self.total_width();
        for y in self.interior_rows() {
            for x in self.interior_columns() {
                let idx = y * w + x;
                self.neighborhoods[idx] = Some(Neighborhood {
                    right: idx + 1,
                    left: idx - 1,
                    top: idx - w,
                    bottom: idx + w,
                });
            }
        }
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.cells.chunks(self.total_width()) {
            for cell in row {
                write!(f, "{} ", cell.code() as u8)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::CellType;

    #[test]
    fn test_dimensions() {
        for (w, h) in [(1, 1), (8, 5), (12, 20)] {
            let grid = Grid::new(w, h).unwrap();
            assert_eq!(grid.total_width(), w + 2);
            assert_eq!(grid.total_height(), h + 2);
        }
    }

    #[test]
    fn test_zero_dimension_is_config_error() {
        assert!(matches!(Grid::new(0, 5), Err(EngineError::Config { .. })));
        assert!(matches!(Grid::new(5, 0), Err(EngineError::Config { .. })));
    }

    #[test]
    fn test_oversized_dimensions_are_config_error() {
        assert!(matches!(Grid::new(usize::MAX, 1), Err(EngineError::Config { .. })));
        assert!(matches!(Grid::new(usize::MAX / 2, 4), Err(EngineError::Config { .. })));
    }

    #[test]
    fn test_frame_cells() {
        let grid = Grid::new(8, 5).unwrap();
        for y in 0..grid.total_height() {
            for x in 0..grid.total_width() {
                let cell = grid.field_at(x, y);
                if grid.is_interior(x, y) {
                    assert_eq!(cell.kind, CellType::Normal);
                    assert!(cell.is_empty());
                } else {
                    assert!(cell.is_frame(), "({}, {}) should be frame", x, y);
                }
            }
        }
        // Floor between the side columns
        assert_eq!(grid.field_at(3, 6).kind, CellType::GroundBorder);
        assert_eq!(grid.field_at(0, 6).kind, CellType::Border);
        assert_eq!(grid.field_at(3, 0).kind, CellType::Border);
    }

    #[test]
    fn test_neighbors_match_coordinates() {
        let grid = Grid::new(6, 4).unwrap();
        for y in grid.interior_rows() {
            for x in grid.interior_columns() {
                let n = grid.neighbors(x, y).unwrap();
                assert_eq!(grid.coords_of(n.right), (x + 1, y));
                assert_eq!(grid.coords_of(n.left), (x - 1, y));
                assert_eq!(grid.coords_of(n.top), (x, y - 1));
                assert_eq!(grid.coords_of(n.bottom), (x, y + 1));
            }
        }
        assert!(grid.neighbors(0, 0).is_none());
        assert!(grid.neighbors(7, 2).is_none());
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_field_at_out_of_range_panics() {
        let grid = Grid::new(4, 4).unwrap();
        grid.field_at(6, 0);
    }

    #[test]
    fn test_checked_get() {
        let grid = Grid::new(4, 4).unwrap();
        assert!(grid.get(-1, 0).is_none());
        assert!(grid.get(0, 6).is_none());
        assert!(grid.get(5, 5).is_some());
    }

    #[test]
    fn test_display_matches_frame_layout() {
        let grid = Grid::new(2, 1).unwrap();
        assert_eq!(grid.to_string(), "2 2 2 2 \n2 0 0 2 \n2 2 2 2 \n");
    }

    #[test]
    fn test_to_display_is_restartable() {
        let mut grid = Grid::new(3, 3).unwrap();
        grid.field_at_mut(2, 2).color = Some(Color::Blue);

        let seq = grid.to_display();
        let first: Vec<_> = seq.clone().collect();
        let second: Vec<_> = seq.collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 25);
        assert_eq!(first[2 * 5 + 2].code, CellCode::Filled);
        assert_eq!(first[2 * 5 + 2].color, Some(Color::Blue));

        let snapshot = grid.snapshot();
        assert_eq!(snapshot.rows().count(), 5);
        assert_eq!(snapshot.at(2, 2), Some(first[12]));
        assert_eq!(snapshot.at(5, 0), None);
    }
}
