//! Piece selection
//!
//! The engine does not pick pieces itself: it pulls them from a
//! [`PieceSource`]. The default source is a "bag" randomizer: every catalogue
//! entry is shuffled, then dealt out before reshuffling, which prevents long
//! droughts of a single kind.

use crate::tetromino::PieceKind;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use ratatui::style::Color;
use std::collections::VecDeque;

/// A catalogue entry: which kind to spawn and how to paint it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PieceSpec {
    pub kind: PieceKind,
    pub color: Color,
}

impl PieceSpec {
    pub fn new(kind: PieceKind, color: Color) -> Self {
        Self { kind, color }
    }
}

impl From<PieceKind> for PieceSpec {
    fn from(kind: PieceKind) -> Self {
        Self::new(kind, kind.default_color())
    }
}

/// Supplies the next piece to spawn
pub trait PieceSource: Send {
    fn next_piece(&mut self) -> PieceSpec;
}

/// Bag randomizer over a catalogue
#[derive(Debug, Clone)]
pub struct Bag {
    catalogue: Vec<PieceSpec>,
    /// Preview queue for upcoming pieces
    queue: VecDeque<PieceSpec>,
    rng: ChaCha8Rng,
}

impl Bag {
    /// Bag over `catalogue` with a random seed
    pub fn new(catalogue: Vec<PieceSpec>) -> Self {
        Self::with_seed(catalogue, rand::random())
    }

    /// Deterministic bag, same seed gives the same piece order
    pub fn with_seed(catalogue: Vec<PieceSpec>, seed: u64) -> Self {
        let catalogue = if catalogue.is_empty() {
            PieceKind::all().into_iter().map(PieceSpec::from).collect()
        } else {
            catalogue
        };
        let mut bag = Self {
            queue: VecDeque::with_capacity(catalogue.len() * 2),
            catalogue,
            rng: ChaCha8Rng::seed_from_u64(seed),
        };
        // Keep at least two full bags queued
        bag.refill();
        bag.refill();
        bag
    }

    /// Preview the next `count` pieces without removing them
    pub fn preview(&self, count: usize) -> Vec<PieceSpec> {
        self.queue.iter().take(count).copied().collect()
    }

    fn refill(&mut self) {
        let mut new_bag = self.catalogue.clone();
        new_bag.shuffle(&mut self.rng);
        self.queue.extend(new_bag);
    }
}

impl PieceSource for Bag {
    fn next_piece(&mut self) -> PieceSpec {
        if self.queue.len() <= self.catalogue.len() {
            self.refill();
        }
        match self.queue.pop_front() {
            Some(spec) => spec,
            // Unreachable after a refill, catalogue is never empty
            None => PieceSpec::from(PieceKind::I),
        }
    }
}

/// Replays a fixed list of pieces in a loop
#[derive(Debug, Clone)]
pub struct Sequence {
    pieces: Vec<PieceSpec>,
    next: usize,
}

impl Sequence {
    pub fn new(pieces: Vec<PieceSpec>) -> Self {
        Self { pieces, next: 0 }
    }
}

impl PieceSource for Sequence {
    fn next_piece(&mut self) -> PieceSpec {
        if self.pieces.is_empty() {
            return PieceSpec::from(PieceKind::I);
        }
        let spec = self.pieces[self.next % self.pieces.len()];
        self.next += 1;
        spec
    }
}
