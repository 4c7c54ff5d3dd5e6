//! A single grid location

use ratatui::style::Color;

/// Color painted on border cells
pub const BORDER_COLOR: Color = Color::Black;

/// Role of a cell inside the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CellType {
    #[default]
    Normal,
    /// Side or ceiling frame cell
    Border,
    /// Floor frame cell, the only border pieces come to rest on
    GroundBorder,
    /// Settled cell that no longer belongs to a falling piece
    Placed,
}

/// Code a renderer uses to pick a glyph for a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellCode {
    Empty = 0,
    Filled = 1,
    Border = 2,
}

/// A cell on the grid. `None` color is the empty sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cell {
    pub color: Option<Color>,
    pub kind: CellType,
}

impl Cell {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn border() -> Self {
        Self {
            color: Some(BORDER_COLOR),
            kind: CellType::Border,
        }
    }

    pub fn ground_border() -> Self {
        Self {
            color: Some(BORDER_COLOR),
            kind: CellType::GroundBorder,
        }
    }

    pub fn is_filled(&self) -> bool {
        self.color.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.color.is_none()
    }

    pub fn is_placed(&self) -> bool {
        self.kind == CellType::Placed
    }

    /// Side/ceiling border or floor
    pub fn is_frame(&self) -> bool {
        matches!(self.kind, CellType::Border | CellType::GroundBorder)
    }

    /// Whether a falling cell comes to rest on top of this one
    pub fn is_support(&self) -> bool {
        matches!(self.kind, CellType::Placed | CellType::GroundBorder)
    }

    /// Resets an interior cell to empty. Frame cells are left alone.
    pub fn wipe_out(&mut self) {
        if !self.is_frame() {
            *self = Cell::empty();
        }
    }

    /// Takes over color and type of another cell
    pub fn copy_state_from(&mut self, other: &Cell) {
        self.color = other.color;
        self.kind = other.kind;
    }

    pub fn code(&self) -> CellCode {
        if self.is_frame() {
            CellCode::Border
        } else if self.is_filled() {
            CellCode::Filled
        } else {
            CellCode::Empty
        }
    }
}
