/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

use anyhow::{bail, Result};

use super::{CastlingRights, PieceKind, Square};

/// Legal moves available in a single position, in generation order.
pub type MoveList = Vec<LegalMove>;

/// A move that has been verified to not leave the mover's King in check.
///
/// This is only an ordered pair of squares.
/// When a Pawn reaches its last rank, the piece it becomes is chosen by whoever makes the move,
/// so a single [`LegalMove`] stands in for all four promotions.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LegalMove {
    from: Square,
    to: Square,
}

impl LegalMove {
    #[inline(always)]
    pub const fn new(from: Square, to: Square) -> Self {
        Self { from, to }
    }

    #[inline(always)]
    pub const fn from(&self) -> Square {
        self.from
    }

    #[inline(always)]
    pub const fn to(&self) -> Square {
        self.to
    }

    /// Algebraic notation for this move, optionally followed by the uppercase letter of the promoted piece.
    ///
    /// # Example
    /// ```
    /// # use crudechess::{LegalMove, PieceKind, Square};
    /// let e7: Square = "e7".parse().unwrap();
    /// let mv = LegalMove::new(e7, Square::E8);
    /// assert_eq!(mv.notation(None), "e7e8");
    /// assert_eq!(mv.notation(Some(PieceKind::Knight)), "e7e8N");
    /// ```
    pub fn notation(&self, promotion: Option<PieceKind>) -> String {
        match promotion {
            Some(kind) => format!("{self}{}", kind.to_uci().to_ascii_uppercase()),
            None => self.to_string(),
        }
    }
}

impl fmt::Display for LegalMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)
    }
}

impl fmt::Debug for LegalMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

/// Parses a move as a player would type it: two squares, then optionally a promotion letter in either case.
///
/// Whitespace between the parts is ignored, so `e7e8q`, `e7e8Q`, and `e7 e8 q` are all the same move.
/// Nothing is said about whether the move is legal.
///
/// # Example
/// ```
/// # use crudechess::{parse_move, PieceKind, Square};
/// let (from, to, promotion) = parse_move("b2 a1 n").unwrap();
/// assert_eq!((from.to_string(), to), (String::from("b2"), Square::A1));
/// assert_eq!(promotion, Some(PieceKind::Knight));
/// assert!(parse_move("e2").is_err());
/// ```
pub fn parse_move(notation: &str) -> Result<(Square, Square, Option<PieceKind>)> {
    let compact = notation
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>();

    if !compact.is_ascii() || !(4..=5).contains(&compact.len()) {
        bail!("Invalid move {notation:?}: Expected two squares and an optional promotion, like \"e7e8q\"");
    }

    let from = Square::from_uci(&compact[0..2])?;
    let to = Square::from_uci(&compact[2..4])?;
    let promotion = match compact[4..].chars().next() {
        Some(c) => Some(PieceKind::from_uci(c)?),
        None => None,
    };

    Ok((from, to, promotion))
}

/// How a move changed the board, beyond relocating the moving piece.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Default)]
pub enum MoveKind {
    /// A quiet move or an ordinary capture.
    #[default]
    Standard,

    /// The King moved two files and the Rook jumped over it.
    Castle,

    /// A Pawn captured the Pawn that had just passed it, landing behind it.
    EnPassant,

    /// A Pawn reached its last rank and became the provided piece.
    Promotion(PieceKind),
}

impl MoveKind {
    /// The piece a Pawn became, if this was a promotion.
    #[inline(always)]
    pub const fn promotion(&self) -> Option<PieceKind> {
        match self {
            Self::Promotion(kind) => Some(*kind),
            _ => None,
        }
    }
}

/// Everything needed to take back one move.
///
/// Created by [`crate::Position::make`], consumed exactly once by [`crate::Position::unmake`].
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct UndoRecord {
    pub(crate) from: Square,
    pub(crate) to: Square,

    /// Kind of the piece that was removed by this move, if any.
    ///
    /// For en passant this is always a Pawn, even though it did not stand on `to`.
    pub(crate) captured: Option<PieceKind>,

    pub(crate) kind: MoveKind,
    pub(crate) castling_rights: CastlingRights,
    pub(crate) ep_square: Option<Square>,
    pub(crate) halfmove: usize,
    pub(crate) fullmove: usize,

    /// The legal moves of the position before this move was made.
    pub(crate) legal_moves: MoveList,
}

impl UndoRecord {
    #[inline(always)]
    pub const fn kind(&self) -> MoveKind {
        self.kind
    }

    #[inline(always)]
    pub const fn captured(&self) -> Option<PieceKind> {
        self.captured
    }

    /// The move this record takes back, as it would be written by the player.
    pub fn notation(&self) -> String {
        LegalMove::new(self.from, self.to).notation(self.kind.promotion())
    }
}
