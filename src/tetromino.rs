//! Piece catalogue
//!
//! Every kind owns exactly four fixed orientations. Local coordinates use the
//! grid convention (`x` right, `y` down) around the piece origin:
//!
//! ```text
//!   (-1,-1) | (0,-1) | (1,-1)
//!   (-1, 0) | (0, 0) | (1, 0)
//!   (-1, 1) | (0, 1) | (1, 1)
//! ```
//!
//! Rotation is naive: the next orientation is tried at the same origin, so the
//! tables below define each kind's pivot. Orientation 0 never reaches above
//! the origin row, which keeps spawns inside the interior.

use crate::grid::Point;
use ratatui::style::Color;
use serde::{Deserialize, Serialize};

/// Number of orientations per kind
pub const ROTATIONS: usize = 4;

/// One orientation: four local points
pub type PositionState = [Point; 4];

const fn p(x: i32, y: i32) -> Point {
    Point::new(x, y)
}

const LINE: [PositionState; ROTATIONS] = [
    [p(-1, 0), p(0, 0), p(1, 0), p(2, 0)],
    [p(0, -1), p(0, 0), p(0, 1), p(0, -2)],
    [p(-1, 0), p(0, 0), p(1, 0), p(-2, 0)],
    [p(0, -1), p(0, 0), p(0, 1), p(0, 2)],
];

const SQUARE: [PositionState; ROTATIONS] = [
    [p(0, 0), p(1, 0), p(0, 1), p(1, 1)],
    [p(0, 0), p(1, 0), p(0, 1), p(1, 1)],
    [p(0, 0), p(1, 0), p(0, 1), p(1, 1)],
    [p(0, 0), p(1, 0), p(0, 1), p(1, 1)],
];

const TEE: [PositionState; ROTATIONS] = [
    [p(-1, 0), p(0, 0), p(1, 0), p(0, 1)],
    [p(0, -1), p(0, 0), p(0, 1), p(-1, 0)],
    [p(1, 0), p(0, 0), p(-1, 0), p(0, -1)],
    [p(0, 1), p(0, 0), p(0, -1), p(1, 0)],
];

// S and Z toggle between two orientations
const ESS: [PositionState; ROTATIONS] = [
    [p(0, 0), p(1, 0), p(-1, 1), p(0, 1)],
    [p(0, 0), p(0, 1), p(-1, -1), p(-1, 0)],
    [p(0, 0), p(1, 0), p(-1, 1), p(0, 1)],
    [p(0, 0), p(0, 1), p(-1, -1), p(-1, 0)],
];

const ZED: [PositionState; ROTATIONS] = [
    [p(-1, 0), p(0, 0), p(0, 1), p(1, 1)],
    [p(0, -1), p(0, 0), p(-1, 0), p(-1, 1)],
    [p(-1, 0), p(0, 0), p(0, 1), p(1, 1)],
    [p(0, -1), p(0, 0), p(-1, 0), p(-1, 1)],
];

const JAY: [PositionState; ROTATIONS] = [
    [p(-1, 0), p(0, 0), p(1, 0), p(1, 1)],
    [p(0, -1), p(0, 0), p(0, 1), p(-1, 1)],
    [p(1, 0), p(0, 0), p(-1, 0), p(-1, -1)],
    [p(0, 1), p(0, 0), p(0, -1), p(1, -1)],
];

const ELL: [PositionState; ROTATIONS] = [
    [p(-1, 0), p(0, 0), p(1, 0), p(-1, 1)],
    [p(0, -1), p(0, 0), p(0, 1), p(-1, -1)],
    [p(1, 0), p(0, 0), p(-1, 0), p(1, -1)],
    [p(0, 1), p(0, 0), p(0, -1), p(1, 1)],
];

/// The closed set of piece kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PieceKind {
    I, // line
    O, // square
    T,
    S,
    Z,
    J,
    L,
}

impl PieceKind {
    pub fn all() -> [PieceKind; 7] {
        [
            PieceKind::I,
            PieceKind::O,
            PieceKind::T,
            PieceKind::S,
            PieceKind::Z,
            PieceKind::J,
            PieceKind::L,
        ]
    }

    /// The four orientations of this kind
    pub fn position_states(&self) -> &'static [PositionState; ROTATIONS] {
        match self {
            PieceKind::I => &LINE,
            PieceKind::O => &SQUARE,
            PieceKind::T => &TEE,
            PieceKind::S => &ESS,
            PieceKind::Z => &ZED,
            PieceKind::J => &JAY,
            PieceKind::L => &ELL,
        }
    }

    /// Orientation at `rotation`, wrapping around the cycle
    pub fn position_state(&self, rotation: usize) -> &'static PositionState {
        &self.position_states()[rotation % ROTATIONS]
    }

    pub fn default_color(&self) -> Color {
        match self {
            PieceKind::I => Color::Cyan,
            PieceKind::O => Color::Yellow,
            PieceKind::T => Color::Magenta,
            PieceKind::S => Color::Green,
            PieceKind::Z => Color::Red,
            PieceKind::J => Color::Blue,
            PieceKind::L => Color::Rgb(255, 165, 0), // Orange
        }
    }
}
