//! Active falling shape and its bookkeeping

use crate::cell::{Cell, CellType};
use crate::collision::{classify, Collision, Movement};
use crate::grid::{Grid, Point};
use crate::tetromino::{PieceKind, PositionState, ROTATIONS};
use ratatui::style::Color;

/// Offset from shape space into grid space (skips the frame)
const BORDER_SHIFT: Point = Point::new(1, 1);

/// The active piece.
///
/// Invariant: while a shape is live on a grid, exactly the cells implied by
/// `(origin, rotation)` carry its color.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shape {
    kind: PieceKind,
    /// Origin of the local coordinate system, in shape space
    origin: Point,
    rotation: usize,
    color: Color,
}

impl Shape {
    /// Create a shape in orientation 0. Nothing is painted yet.
    pub fn new(kind: PieceKind, origin: Point, color: Color) -> Self {
        Self {
            kind,
            origin,
            rotation: 0,
            color,
        }
    }

    pub fn kind(&self) -> PieceKind {
        self.kind
    }

    pub fn origin(&self) -> Point {
        self.origin
    }

    pub fn rotation(&self) -> usize {
        self.rotation
    }

    pub fn color(&self) -> Color {
        self.color
    }

    /// Local points of the current orientation
    pub fn local_points(&self) -> &'static PositionState {
        self.kind.position_state(self.rotation)
    }

    /// Grid cells currently covered by the shape
    pub fn points_in_grid_coords(&self) -> [Point; 4] {
        Self::project(self.local_points(), self.origin)
    }

    /// Grid cells the shape would cover after `movement`
    pub fn candidate_cells(&self, movement: Movement) -> [Point; 4] {
        match movement {
            Movement::Rotate => Self::project(self.next_rotation_state(), self.origin),
            other => Self::project(self.local_points(), self.origin + other.delta()),
        }
    }

    fn next_rotation_state(&self) -> &'static PositionState {
        self.kind.position_state((self.rotation + 1) % ROTATIONS)
    }

    fn project(state: &PositionState, origin: Point) -> [Point; 4] {
        state.map(|local| local + origin + BORDER_SHIFT)
    }

    /// Paint the covered cells with the shape color
    pub fn paint(&self, grid: &mut Grid) {
        for point in self.points_in_grid_coords() {
            *cell_at(grid, point) = Cell {
                color: Some(self.color),
                kind: CellType::Normal,
            };
        }
    }

    /// Reset the covered cells to empty
    pub fn erase(&self, grid: &mut Grid) {
        for point in self.points_in_grid_coords() {
            cell_at(grid, point).wipe_out();
        }
    }

    /// Translate the shape.
    ///
    /// `Free` repaints at the new origin, `Blocked` leaves everything as is and
    /// `Grounded` settles the shape where it stands. Settling is only reachable
    /// through [`Movement::Drop`].
    pub fn move_by(&mut self, grid: &mut Grid, movement: Movement) -> Collision {
        let collision = classify(grid, self, movement);
        match collision {
            Collision::Free => {
                self.erase(grid);
                self.origin = self.origin + movement.delta();
                self.paint(grid);
            }
            Collision::Grounded => {
                self.mark_placed(grid);
            }
            Collision::Blocked => {}
        }
        collision
    }

    /// Advance to the next orientation. No wall kicks: a blocked rotation
    /// is a no-op. Returns whether the shape rotated.
    pub fn rotate(&mut self, grid: &mut Grid) -> bool {
        if classify(grid, self, Movement::Rotate).is_blocked() {
            return false;
        }
        self.erase(grid);
        self.rotation = (self.rotation + 1) % ROTATIONS;
        self.paint(grid);
        true
    }

    /// Settle the covered cells
    pub fn mark_placed(&self, grid: &mut Grid) {
        for point in self.points_in_grid_coords() {
            let cell = cell_at(grid, point);
            cell.color = Some(self.color);
            cell.kind = CellType::Placed;
        }
    }

    /// Whether any covered cell lies in the top interior row
    pub fn touches_top_row(&self) -> bool {
        self.points_in_grid_coords().iter().any(|point| point.y == 1)
    }
}

fn cell_at(grid: &mut Grid, point: Point) -> &mut Cell {
    grid.field_at_mut(point.x as usize, point.y as usize)
}

/// Tracks the active shape and what has been settled so far
#[derive(Debug, Clone, Default)]
pub struct ShapeManager {
    active: Option<Shape>,
    placed_shapes: usize,
    last_placed: Option<PieceKind>,
}

impl ShapeManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<&Shape> {
        self.active.as_ref()
    }

    pub fn active_mut(&mut self) -> Option<&mut Shape> {
        self.active.as_mut()
    }

    /// Install a new active shape, returning the superseded one
    pub fn replace(&mut self, shape: Shape) -> Option<Shape> {
        self.active.replace(shape)
    }

    /// Drop the active shape after it settled
    pub fn retire_active(&mut self) -> Option<Shape> {
        let shape = self.active.take()?;
        self.placed_shapes += 1;
        self.last_placed = Some(shape.kind());
        Some(shape)
    }

    pub fn clear(&mut self) {
        self.active = None;
    }

    pub fn placed_shapes(&self) -> usize {
        self.placed_shapes
    }

    pub fn last_placed(&self) -> Option<PieceKind> {
        self.last_placed
    }
}
