//! Collision classification of proposed moves and rotations

use crate::grid::{Grid, Point};
use crate::shape::Shape;

/// A proposed change of the active shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Movement {
    /// Sideways (or any non-settling) translation
    Shift(Point),
    /// One row down; the only movement that can ground a shape
    Drop,
    /// Advance to the next orientation at the same origin
    Rotate,
}

impl Movement {
    pub fn delta(&self) -> Point {
        match self {
            Movement::Shift(delta) => *delta,
            Movement::Drop => Point::new(0, 1),
            Movement::Rotate => Point::new(0, 0),
        }
    }

    pub fn is_downward(&self) -> bool {
        matches!(self, Movement::Drop)
    }
}

/// Outcome of a collision check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collision {
    Free,
    /// Move is rejected, nothing changes
    Blocked,
    /// Downward move rests on the floor or the settled stack
    Grounded,
}

impl Collision {
    pub fn is_blocked(&self) -> bool {
        matches!(self, Collision::Blocked)
    }
}

/// Classify moving `shape` by `movement` on `grid`
pub fn classify(grid: &Grid, shape: &Shape, movement: Movement) -> Collision {
    let cells = shape.candidate_cells(movement);
    classify_cells(grid, &cells, movement.is_downward())
}

/// Classify a set of candidate grid cells
pub fn classify_cells(grid: &Grid, cells: &[Point], downward: bool) -> Collision {
    let mut grounded = false;
    for point in cells {
        let Some(cell) = grid.get(point.x, point.y) else {
            return Collision::Blocked;
        };
        if downward && cell.is_support() {
            grounded = true;
        } else if cell.is_frame() || cell.is_placed() {
            return Collision::Blocked;
        }
    }

    if grounded {
        Collision::Grounded
    } else {
        Collision::Free
    }
}
