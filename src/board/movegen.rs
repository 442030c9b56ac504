/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use super::{
    Color, File, LegalMove, MoveList, Piece, PieceKind, Position, Rank, Square, DIAGONALS, KING_OFFSETS,
    KNIGHT_OFFSETS, ORTHOGONALS,
};

impl Position {
    /// Squares the piece on `square` could move to if its own King's safety were ignored.
    ///
    /// Castling is the exception: it is only offered when the King is not currently in check,
    /// the squares between King and Rook are empty, and the right is still held.
    /// Whether the King would pass through or land on an attacked square is left to the legality filter.
    ///
    /// Empty squares have no targets.
    pub fn pseudolegal_targets(&self, square: Square) -> Vec<Square> {
        let mut targets = Vec::new();
        let Some(piece) = self.piece_at(square) else {
            return targets;
        };
        let color = piece.color();

        match piece.kind() {
            PieceKind::Pawn => self.pawn_targets(square, color, &mut targets),
            PieceKind::Knight => self.step_targets(square, color, &KNIGHT_OFFSETS, &mut targets),
            PieceKind::Bishop => self.slide_targets(square, color, &DIAGONALS, &mut targets),
            PieceKind::Rook => self.slide_targets(square, color, &ORTHOGONALS, &mut targets),
            PieceKind::Queen => {
                self.slide_targets(square, color, &DIAGONALS, &mut targets);
                self.slide_targets(square, color, &ORTHOGONALS, &mut targets);
            }
            PieceKind::King => {
                self.step_targets(square, color, &KING_OFFSETS, &mut targets);
                self.castling_targets(square, color, &mut targets);
            }
        }

        targets
    }

    /// Every legal move for the side to move.
    ///
    /// Each pseudolegal move is tried on the board and kept only if the mover's King is safe afterwards.
    /// Castling must also survive the King stopping on the square it passes over.
    pub(crate) fn generate_legal_moves(&mut self) -> MoveList {
        let color = self.side_to_move();
        let mut moves = MoveList::new();

        for from in self.pieces(color) {
            let is_king = self.piece_at(from).is_some_and(|piece| piece.is_king());

            for to in self.pseudolegal_targets(from) {
                if is_king && from.file().abs_diff(to.file()) == 2 {
                    let step = if to.file() > from.file() { 1 } else { -1 };
                    let passes_safely = from
                        .offset(step, 0)
                        .is_some_and(|passed| self.is_safe_after(from, passed));

                    if !passes_safely {
                        continue;
                    }
                }

                if self.is_safe_after(from, to) {
                    moves.push(LegalMove::new(from, to));
                }
            }
        }

        moves
    }

    fn pawn_targets(&self, square: Square, color: Color, targets: &mut Vec<Square>) {
        if let Some(single) = square.forward(color) {
            if self.piece_at(single).is_none() {
                targets.push(single);

                if square.rank() == Rank::second(color) {
                    if let Some(double) = single.forward(color) {
                        if self.piece_at(double).is_none() {
                            targets.push(double);
                        }
                    }
                }
            }
        }

        for df in [-1, 1] {
            let Some(diagonal) = square.offset(df, color.forward()) else {
                continue;
            };

            match self.piece_at(diagonal) {
                Some(victim) if victim.color() != color => targets.push(diagonal),
                None if self.ep_square() == Some(diagonal) && self.has_ep_victim(diagonal, color) => {
                    targets.push(diagonal)
                }
                _ => {}
            }
        }
    }

    /// Whether an enemy Pawn stands just past `ep_square`, where a double push by the opponent would have left it.
    fn has_ep_victim(&self, ep_square: Square, color: Color) -> bool {
        ep_square
            .backward(color)
            .is_some_and(|behind| self.piece_at(behind) == Some(Piece::new(color.opponent(), PieceKind::Pawn)))
    }

    /// Single steps, onto empty squares or enemy pieces.
    fn step_targets(
        &self,
        square: Square,
        color: Color,
        offsets: &[(i8, i8)],
        targets: &mut Vec<Square>,
    ) {
        for &(df, dr) in offsets {
            if let Some(target) = square.offset(df, dr) {
                if self.piece_at(target).map_or(true, |occupant| occupant.color() != color) {
                    targets.push(target);
                }
            }
        }
    }

    /// Rays that stop before a friendly piece, or on an enemy one.
    fn slide_targets(
        &self,
        square: Square,
        color: Color,
        directions: &[(i8, i8)],
        targets: &mut Vec<Square>,
    ) {
        for &(df, dr) in directions {
            let mut current = square;
            while let Some(next) = current.offset(df, dr) {
                match self.piece_at(next) {
                    None => targets.push(next),
                    Some(occupant) => {
                        if occupant.color() != color {
                            targets.push(next);
                        }
                        break;
                    }
                }
                current = next;
            }
        }
    }

    fn castling_targets(&self, king: Square, color: Color, targets: &mut Vec<Square>) {
        let rank = Rank::first(color);
        if king != Square::new(File::E, rank) {
            return;
        }

        let rights = self.castling_rights();
        let wings: [(bool, File, &[File], File); 2] = [
            (rights.short(color), File::H, &[File::F, File::G], File::G),
            (rights.long(color), File::A, &[File::B, File::C, File::D], File::C),
        ];

        // Computed at most once, and only if some wing is otherwise available
        let mut in_check = None;

        for (has_right, rook_file, between, destination) in wings {
            if !has_right {
                continue;
            }

            let rook = self.piece_at(Square::new(rook_file, rank));
            if rook != Some(Piece::new(color, PieceKind::Rook)) {
                continue;
            }

            if between
                .iter()
                .any(|&file| self.piece_at(Square::new(file, rank)).is_some())
            {
                continue;
            }

            if !*in_check.get_or_insert_with(|| self.is_square_attacked(king, color.opponent())) {
                targets.push(Square::new(destination, rank));
            }
        }
    }
}
