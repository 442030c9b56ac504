/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

/// Detecting whether a square is attacked.
mod attacks;

/// A set of squares, one bit each.
mod bitboard;

/// Printable board diagrams.
mod display;

/// Errors raised by a [`Position`].
mod error;

/// Reading, writing, and validating FEN strings.
mod fen;

/// Pseudolegal targets and the legality filter.
mod movegen;

/// Moves and the records needed to take them back.
mod moves;

/// Perft and divide.
mod perft;

/// Colors, piece kinds, and pieces.
mod piece;

/// The game state and everything that changes it.
mod position;

/// Squares, ranks, and files.
mod square;

pub(crate) use attacks::*;
pub use bitboard::*;
pub use display::*;
pub use error::*;
pub use fen::*;
pub use moves::*;
pub use piece::*;
pub use position::*;
pub use square::*;
