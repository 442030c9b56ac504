/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

use super::{Bitboard, Color, File, GameState, Position, Rank, Square};

/// A printable diagram of a [`Position`], with some squares optionally highlighted.
///
/// Highlighted squares are drawn in brackets, so they stand out without terminal colors:
/// ```text
/// 8| r  n  b  q  k  b  n  r
/// 7| p  p  p  p  p  p  p  p           FEN: ...
/// 6| .  .  .  .  .  .  .  .          Side: White
/// 5| .  .  .  .  .  .  .  .      Castling: KQkq
/// 4| .  .  .  . [.] .  .  .            EP: -
/// 3| .  .  .  . [.] .  .  .     Half-move: 0
/// 2| P  P  P  P  P  P  P  P     Full-move: 1
/// 1| R  N  B  Q  K  B  N  R         State: Ongoing
///  +------------------------
///    a  b  c  d  e  f  g  h
/// ```
pub struct BoardView<'a> {
    position: &'a Position,
    highlights: Bitboard,
}

impl<'a> BoardView<'a> {
    #[inline(always)]
    pub const fn new(position: &'a Position) -> Self {
        Self {
            position,
            highlights: Bitboard::EMPTY_BOARD,
        }
    }

    /// Highlights every square in `squares`.
    #[inline(always)]
    pub fn highlighting(mut self, squares: Bitboard) -> Self {
        self.highlights = squares;
        self
    }

    /// Highlights where the piece on `square` can legally move.
    pub fn targets_from(position: &'a Position, square: Square) -> Self {
        Self::new(position).highlighting(position.legal_targets_from(square))
    }

    /// Highlights every piece of `color`.
    pub fn pieces_of(position: &'a Position, color: Color) -> Self {
        Self::new(position).highlighting(position.pieces(color))
    }

    fn side_panel(&self, rank: Rank) -> Option<String> {
        let pos = self.position;
        let line = match rank {
            Rank::SEVEN => format!("           FEN: {pos}"),
            Rank::SIX => format!("          Side: {}", pos.side_to_move().name()),
            Rank::FIVE => format!("      Castling: {}", pos.castling_rights()),
            Rank::FOUR => {
                let ep = pos
                    .ep_square()
                    .map(|square| square.to_string())
                    .unwrap_or_else(|| String::from("-"));
                format!("            EP: {ep}")
            }
            Rank::THREE => format!("     Half-move: {}", pos.halfmove()),
            Rank::TWO => format!("     Full-move: {}", pos.fullmove()),
            Rank::ONE => {
                let state = match pos.game_end_state() {
                    GameState::Ongoing if pos.is_in_check() => String::from("Check"),
                    state => state.to_string(),
                };
                format!("         State: {state}")
            }
            _ => return None,
        };
        Some(line)
    }
}

impl fmt::Display for BoardView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in Rank::iter().rev() {
            write!(f, "{rank}|")?;
            for file in File::iter() {
                let square = Square::new(file, rank);
                let piece = self
                    .position
                    .piece_at(square)
                    .map(|piece| piece.to_uci())
                    .unwrap_or('.');

                if self.highlights.contains(square) {
                    write!(f, "[{piece}]")?;
                } else {
                    write!(f, " {piece} ")?;
                }
            }

            if let Some(line) = self.side_panel(rank) {
                write!(f, "{line}")?;
            }
            writeln!(f)?;
        }

        write!(f, " +")?;
        for _ in File::iter() {
            write!(f, "---")?;
        }
        write!(f, "\n  ")?;
        for file in File::iter() {
            write!(f, " {file} ")?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_highlights_are_bracketed() {
        let pos = Position::startpos();
        let view = BoardView::targets_from(&pos, Square::G1).to_string();
        let lines = view.lines().collect::<Vec<_>>();

        // Rank 3 is the sixth line from the top
        assert!(lines[5].starts_with("3| .  .  .  .  . [.] . [.]"));
        assert_eq!(view.matches('[').count(), 2);
    }

    #[test]
    fn test_side_panel() {
        let pos = Position::startpos();
        let view = BoardView::new(&pos).to_string();
        assert!(view.contains("Side: White"));
        assert!(view.contains("Castling: KQkq"));
        assert!(view.contains("EP: -"));
        assert!(view.contains("State: Ongoing"));
        assert!(view.contains(&format!("FEN: {pos}")));
        assert!(!view.contains('['));
    }

    #[test]
    fn test_pieces_of() {
        let pos = Position::startpos();
        let view = BoardView::pieces_of(&pos, Color::Black).to_string();
        assert_eq!(view.matches('[').count(), 16);
        assert!(view.lines().next().unwrap().starts_with("8|[r][n][b][q][k][b][n][r]"));
    }
}
