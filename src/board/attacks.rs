/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use super::{Color, Piece, PieceKind, Position, Square};

/// `(file, rank)` steps a Knight can take.
pub(crate) const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (1, 2),
    (2, 1),
    (2, -1),
    (1, -2),
    (-1, -2),
    (-2, -1),
    (-2, 1),
    (-1, 2),
];

/// `(file, rank)` steps a King can take, not counting castling.
pub(crate) const KING_OFFSETS: [(i8, i8); 8] = [
    (0, 1),
    (1, 1),
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, -1),
    (-1, 0),
    (-1, 1),
];

/// Directions a Bishop slides in.
pub(crate) const DIAGONALS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, -1), (-1, 1)];

/// Directions a Rook slides in.
pub(crate) const ORTHOGONALS: [(i8, i8); 4] = [(0, 1), (1, 0), (0, -1), (-1, 0)];

impl Position {
    /// `true` if any piece of color `by` attacks `square`.
    ///
    /// Rather than generating every move `by` has, this looks outward from `square`
    /// along each line an attacker would have to use, and checks what stands at the end of it.
    /// Pieces of either color block sliding attacks, and the occupant of `square` itself is irrelevant.
    ///
    /// # Example
    /// ```
    /// # use crudechess::{Color, Position, Square};
    /// let pos = Position::startpos();
    /// assert!(pos.is_square_attacked("f3".parse().unwrap(), Color::White));
    /// assert!(!pos.is_square_attacked("e4".parse().unwrap(), Color::White));
    /// ```
    pub fn is_square_attacked(&self, square: Square, by: Color) -> bool {
        let holds = |candidate: Option<Square>, kind: PieceKind| {
            candidate.and_then(|sq| self.piece_at(sq)) == Some(Piece::new(by, kind))
        };

        // An attacking Pawn stands one rank behind `square`, from its own point of view
        let pawn_rank = -by.forward();
        if holds(square.offset(-1, pawn_rank), PieceKind::Pawn)
            || holds(square.offset(1, pawn_rank), PieceKind::Pawn)
        {
            return true;
        }

        if KNIGHT_OFFSETS
            .iter()
            .any(|&(df, dr)| holds(square.offset(df, dr), PieceKind::Knight))
        {
            return true;
        }

        if KING_OFFSETS
            .iter()
            .any(|&(df, dr)| holds(square.offset(df, dr), PieceKind::King))
        {
            return true;
        }

        self.is_attacked_along(square, by, &DIAGONALS, PieceKind::Bishop)
            || self.is_attacked_along(square, by, &ORTHOGONALS, PieceKind::Rook)
    }

    /// Checks the first piece in each direction for a `slider` or Queen of color `by`.
    fn is_attacked_along(
        &self,
        square: Square,
        by: Color,
        directions: &[(i8, i8)],
        slider: PieceKind,
    ) -> bool {
        directions.iter().any(|&direction| {
            self.first_piece_along(square, direction)
                .is_some_and(|piece| {
                    piece.color() == by
                        && (piece.kind() == slider || piece.kind() == PieceKind::Queen)
                })
        })
    }

    /// The nearest piece from `square` in a direction, not counting `square` itself.
    fn first_piece_along(&self, square: Square, (df, dr): (i8, i8)) -> Option<Piece> {
        let mut current = square;
        while let Some(next) = current.offset(df, dr) {
            if let Some(piece) = self.piece_at(next) {
                return Some(piece);
            }
            current = next;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(s: &str) -> Square {
        s.parse().unwrap()
    }

    #[test]
    fn test_pawn_attacks_are_directional() {
        let pos = Position::from_fen("4k3/8/8/3p4/4P3/8/8/4K3 w - - 0 1").unwrap();

        assert!(pos.is_square_attacked(sq("d5"), Color::White));
        assert!(pos.is_square_attacked(sq("f5"), Color::White));
        assert!(!pos.is_square_attacked(sq("e5"), Color::White));
        assert!(!pos.is_square_attacked(sq("d3"), Color::White));

        assert!(pos.is_square_attacked(sq("e4"), Color::Black));
        assert!(pos.is_square_attacked(sq("c4"), Color::Black));
        assert!(!pos.is_square_attacked(sq("d4"), Color::Black));
        assert!(!pos.is_square_attacked(sq("e6"), Color::Black));
    }

    #[test]
    fn test_pawn_attacks_do_not_wrap() {
        let pos = Position::from_fen("4k3/8/8/8/8/8/7P/4K3 w - - 0 1").unwrap();
        assert!(pos.is_square_attacked(sq("g3"), Color::White));
        assert!(!pos.is_square_attacked(sq("a4"), Color::White));
        assert!(!pos.is_square_attacked(sq("a3"), Color::White));
    }

    #[test]
    fn test_knight_and_king_attacks() {
        let pos = Position::from_fen("4k3/8/8/8/8/8/8/N3K3 w - - 0 1").unwrap();

        assert!(pos.is_square_attacked(sq("b3"), Color::White));
        assert!(pos.is_square_attacked(sq("c2"), Color::White));
        assert!(!pos.is_square_attacked(sq("h8"), Color::White));

        assert!(pos.is_square_attacked(sq("d2"), Color::White));
        assert!(pos.is_square_attacked(sq("f1"), Color::White));
        assert!(!pos.is_square_attacked(sq("e3"), Color::White));

        assert!(pos.is_square_attacked(sq("d7"), Color::Black));
        assert!(!pos.is_square_attacked(sq("d6"), Color::Black));
    }

    #[test]
    fn test_sliders_are_blocked() {
        let pos = Position::from_fen("4k3/8/8/8/1b6/8/3N4/R3K3 w - - 0 1").unwrap();

        // Rook along the first rank, stopped by the King
        assert!(pos.is_square_attacked(sq("d1"), Color::White));
        assert!(pos.is_square_attacked(sq("e1"), Color::White));
        assert!(pos.is_square_attacked(sq("f1"), Color::White));
        assert!(!pos.is_square_attacked(sq("g1"), Color::White));
        assert!(!pos.is_square_attacked(sq("h1"), Color::White));
        assert!(pos.is_square_attacked(sq("a8"), Color::White));

        // Bishop on b4 towards e1, stopped by the Knight on d2
        assert!(pos.is_square_attacked(sq("c3"), Color::Black));
        assert!(pos.is_square_attacked(sq("d2"), Color::Black));
        assert!(!pos.is_square_attacked(sq("e1"), Color::Black));
    }

    #[test]
    fn test_queen_attacks_both_ways() {
        let pos = Position::from_fen("4k3/8/8/8/3q4/8/8/K7 w - - 0 1").unwrap();

        for target in ["d8", "d1", "a4", "h4", "a7", "h8", "g1", "a1"] {
            assert!(pos.is_square_attacked(sq(target), Color::Black), "{target}");
        }
        assert!(!pos.is_square_attacked(sq("e6"), Color::Black));
        assert!(!pos.is_square_attacked(sq("c6"), Color::Black));
        assert!(pos.is_in_check());
    }

    #[test]
    fn test_check_is_symmetric() {
        // The same check, seen from either side to move
        let white_checked = Position::from_fen("4k3/8/8/8/8/8/8/r3K3 w - - 0 1").unwrap();
        assert!(white_checked.is_in_check());

        let black_checked = Position::from_fen("R3k3/8/8/8/8/8/8/4K3 b - - 0 1").unwrap();
        assert!(black_checked.is_in_check());

        let white_fine = Position::from_fen("4k3/8/8/8/8/8/8/r3K3 b - - 0 1");
        assert!(white_fine.is_err(), "White cannot be in check when Black is to move");

        let quiet = Position::from_fen("4k3/8/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        assert!(!quiet.is_in_check());
    }
}
