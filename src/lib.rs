//! BLOCKFALL - a falling-block puzzle engine
//!
//! A bordered grid, one active piece with four fixed orientations, collision
//! classification, placement, row clears and post-clear gravity. Rendering,
//! audio playback and input devices live outside the engine and talk to it
//! through [`events`] and [`grid::RenderSnapshot`].

pub mod bag;
pub mod cell;
pub mod collision;
pub mod error;
pub mod events;
pub mod grid;
pub mod map;
pub mod score;
pub mod session;
pub mod settings;
pub mod shape;
pub mod tetromino;

pub use error::{EngineError, Result};
pub use events::{EngineEvent, InputEvent, SoundCue};
pub use map::{Map, MapConfig};
pub use session::Session;
