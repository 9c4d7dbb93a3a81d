//! Piece: the value stored in every grid cell (empty, or a coloured piece that is falling or locked).

use crate::rng::SpawnSource;

/// Piece colour. `None` marks an empty cell and never forms a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PieceColor {
    #[default]
    None,
    Red,
    Green,
    Blue,
    Yellow,
}

impl PieceColor {
    /// Colours a spawned piece can take.
    pub const PLAYABLE: [Self; 4] = [Self::Red, Self::Green, Self::Blue, Self::Yellow];

    /// Uniformly random playable colour.
    pub fn random(source: &mut impl SpawnSource) -> Self {
        Self::PLAYABLE[source.next_index(Self::PLAYABLE.len())]
    }
}

/// One grid cell. Empty cells are never active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Piece {
    color: PieceColor,
    active: bool,
}

impl Piece {
    /// Locked (inactive) piece of the given colour.
    pub const fn new(color: PieceColor) -> Self {
        Self {
            color,
            active: false,
        }
    }

    /// Inactive piece of a random playable colour.
    pub fn random(source: &mut impl SpawnSource) -> Self {
        Self::new(PieceColor::random(source))
    }

    pub const fn empty() -> Self {
        Self::new(PieceColor::None)
    }

    /// Same colour with the active flag replaced. Empty pieces stay inactive.
    pub const fn with_active(self, active: bool) -> Self {
        Self {
            color: self.color,
            active: active && !matches!(self.color, PieceColor::None),
        }
    }

    #[inline]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    #[inline]
    pub const fn color(&self) -> PieceColor {
        self.color
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        matches!(self.color, PieceColor::None)
    }

    /// Non-empty and not falling.
    #[inline]
    pub const fn is_locked(&self) -> bool {
        !self.is_empty() && !self.active
    }
}
