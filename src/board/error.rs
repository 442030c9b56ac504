/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use thiserror::Error;

use super::{PieceKind, Square};

/// Ways a request to the [`crate::Position`] can be declined.
///
/// None of these leave the position modified.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionError {
    /// The pair of squares is not in the current list of legal moves.
    #[error("Illegal move: {from}{to}")]
    IllegalMove { from: Square, to: Square },

    /// Pawns can only become a Knight, Bishop, Rook, or Queen.
    #[error("Cannot promote to a {}", .0.name())]
    InvalidPromotion(PieceKind),

    #[error("Nothing to undo")]
    EmptyHistory,

    /// Perft and divide only accept depths of zero or more.
    #[error("Invalid depth {0}: depth must not be negative")]
    InvalidDepth(i32),
}
