/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{fmt, str::FromStr};

use anyhow::{anyhow, bail, Context, Result};
use log::debug;

use super::{CastlingRights, Color, File, Piece, PieceKind, Position, Rank, Square};

/// FEN string for the starting position of chess.
pub const FEN_STARTPOS: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// A popular FEN string for debugging move generation.
///
/// See [here](https://www.chessprogramming.org/Perft_Results#Position_2) for details.
pub const FEN_KIWIPETE: &str =
    "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";

/// Checks that `fen` is well-formed, without looking at whether the position it describes makes sense.
///
/// The rules are strict:
/// * Exactly 4 or 6 fields, separated by single spaces, with nothing before or after.
/// * 8 ranks of piece letters and the digits `1`-`8`, each describing exactly 8 squares.
/// * `w` or `b` to move.
/// * Castling is `-` or some of `KQkq`, in that order and without repeats.
/// * The en passant square is `-` or a square on rank 3 or 6.
/// * If present, the halfmove clock has no leading zeros, and the fullmove counter is a positive number without them.
///
/// # Example
/// ```
/// # use crudechess::validate_fen;
/// assert!(validate_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq -").is_ok());
/// assert!(validate_fen("8/8/8/8/8/8/8/k6K w qk -").is_err());
/// ```
pub fn validate_fen(fen: &str) -> Result<()> {
    let fields = fen.split(' ').collect::<Vec<_>>();
    if fields.len() != 4 && fields.len() != 6 {
        bail!(
            "Invalid FEN: Must have 4 or 6 fields separated by single spaces. Got {}",
            fields.len()
        );
    }

    if fields.iter().any(|field| field.is_empty()) {
        bail!("Invalid FEN: Found an empty field in {fen:?}");
    }

    validate_placements(fields[0])?;

    if fields[1] != "w" && fields[1] != "b" {
        bail!("Invalid FEN: Side to move must be 'w' or 'b'. Got {:?}", fields[1]);
    }

    validate_castling(fields[2])?;
    validate_ep_square(fields[3], fields[1])?;

    if fields.len() == 6 {
        parse_counter(fields[4], "halfmove clock", true)?;
        parse_counter(fields[5], "fullmove counter", false)?;
    }

    Ok(())
}

fn validate_placements(placements: &str) -> Result<()> {
    let ranks = placements.split('/').collect::<Vec<_>>();
    if ranks.len() != Rank::COUNT {
        bail!(
            "Invalid FEN: Piece placements must describe {} ranks. Got {} in {placements:?}",
            Rank::COUNT,
            ranks.len()
        );
    }

    for rank in ranks {
        let mut width = 0;
        for c in rank.chars() {
            width += match c {
                '1'..='8' => c as usize - '0' as usize,
                _ if PieceKind::from_uci(c).is_ok() => 1,
                _ => bail!("Invalid FEN: Unexpected character {c:?} in rank {rank:?}"),
            };
        }

        if width != File::COUNT {
            bail!(
                "Invalid FEN: Each rank must describe {} squares. Rank {rank:?} describes {width}",
                File::COUNT
            );
        }
    }

    Ok(())
}

fn validate_castling(castling: &str) -> Result<()> {
    if castling == "-" {
        return Ok(());
    }

    // Each letter must appear later in "KQkq" than the one before it
    let mut remaining = "KQkq".chars();
    for c in castling.chars() {
        if !remaining.any(|allowed| allowed == c) {
            bail!("Invalid FEN: Castling rights must be '-' or an ordered subset of \"KQkq\". Got {castling:?}");
        }
    }

    Ok(())
}

fn validate_ep_square(ep_square: &str, side: &str) -> Result<()> {
    if ep_square == "-" {
        return Ok(());
    }

    let square = Square::from_uci(ep_square)
        .with_context(|| format!("Invalid FEN: Malformed en passant square {ep_square:?}"))?;

    // The square was skipped by the side that just moved
    let expected = if side == "w" { Rank::SIX } else { Rank::THREE };
    if square.rank() != expected {
        bail!(
            "Invalid FEN: En passant square must be on rank {} when {side:?} is to move. Got {square}",
            expected.char()
        );
    }

    Ok(())
}

fn parse_counter(counter: &str, name: &str, allow_zero: bool) -> Result<usize> {
    if !counter.bytes().all(|b| b.is_ascii_digit()) {
        bail!("Invalid FEN: The {name} must be a non-negative integer. Got {counter:?}");
    }

    if counter.len() > 1 && counter.starts_with('0') {
        bail!("Invalid FEN: The {name} must not have leading zeros. Got {counter:?}");
    }

    let value = counter
        .parse()
        .with_context(|| format!("Invalid FEN: The {name} {counter:?} is out of range"))?;

    if value == 0 && !allow_zero {
        bail!("Invalid FEN: The {name} must be at least 1");
    }

    Ok(value)
}

/// Checks that a well-formed position could actually occur in a game.
///
/// Each side needs exactly one King and no Pawn may stand on the first or last rank.
/// The side that just moved cannot have left its own King in check.
/// An en passant square must sit between an empty starting square and the enemy Pawn that just double-pushed.
pub fn check_position_legality(position: &Position) -> Result<()> {
    let mut kings = [0; Color::COUNT];
    for square in Square::iter() {
        let Some(piece) = position.piece_at(square) else {
            continue;
        };

        if piece.is_king() {
            kings[piece.color()] += 1;
        }

        if piece.is_pawn() && (square.rank() == Rank::ONE || square.rank() == Rank::EIGHT) {
            bail!("Illegal position: {} on {square}", piece.name());
        }
    }

    for color in Color::all() {
        if kings[color] != 1 {
            bail!(
                "Illegal position: {} must have exactly one king. Found {}",
                color.name(),
                kings[color]
            );
        }
    }

    let waiting = position.side_to_move().opponent();
    if let Some(ep_square) = position.ep_square() {
        let pusher = Piece::new(waiting, PieceKind::Pawn);
        if ep_square.forward(waiting).and_then(|sq| position.piece_at(sq)) != Some(pusher) {
            bail!("Illegal position: No {} in front of en passant square {ep_square}", pusher.name());
        }

        let origin = ep_square.backward(waiting);
        if position.piece_at(ep_square).is_some() || origin.and_then(|sq| position.piece_at(sq)).is_some() {
            bail!("Illegal position: No pawn could have just passed over {ep_square}");
        }
    }

    if position.is_square_attacked(position.king_square(waiting), waiting.opponent()) {
        bail!(
            "Illegal position: {} is in check, but it is {}'s turn",
            waiting.name(),
            waiting.opponent().name()
        );
    }

    Ok(())
}

impl Position {
    /// Parses a FEN string, rejecting anything malformed or illegal.
    ///
    /// Surrounding whitespace is ignored. The clocks default to `0 1` if the last two fields are absent.
    ///
    /// # Example
    /// ```
    /// # use crudechess::{Position, FEN_KIWIPETE};
    /// let pos = Position::from_fen(FEN_KIWIPETE).unwrap();
    /// assert_eq!(pos.legal_moves().len(), 48);
    ///
    /// assert!(Position::from_fen("8/8/8/8/8/8/8/8 w - -").is_err());
    /// ```
    pub fn from_fen(fen: &str) -> Result<Self> {
        let fen = fen.trim();
        validate_fen(fen)?;

        let fields = fen.split(' ').collect::<Vec<_>>();

        let board = parse_placements(fields[0])?;

        let side_to_move = fields[1]
            .chars()
            .next()
            .ok_or_else(|| anyhow!("Invalid FEN: Missing side to move"))
            .and_then(Color::from_uci)?;

        let mut castling_rights = CastlingRights::NONE;
        for c in fields[2].chars().filter(|&c| c != '-') {
            let color = Color::from_case(c);
            match c.to_ascii_lowercase() {
                'k' => castling_rights.set_short(color),
                'q' => castling_rights.set_long(color),
                _ => bail!("Invalid FEN: Unexpected castling right {c:?}"),
            }
        }

        let ep_square = match fields[3] {
            "-" => None,
            square => Some(Square::from_uci(square)?),
        };

        let (halfmove, fullmove) = match fields.get(4..6) {
            Some(&[halfmove, fullmove]) => (
                parse_counter(halfmove, "halfmove clock", true)?,
                parse_counter(fullmove, "fullmove counter", false)?,
            ),
            _ => (0, 1),
        };

        let position = Self::from_parts(
            board,
            side_to_move,
            castling_rights,
            ep_square,
            halfmove,
            fullmove,
        );
        check_position_legality(&position)?;

        debug!(
            "Loaded {fen:?} with {} legal moves",
            position.legal_moves().len()
        );
        Ok(position)
    }

    /// Writes this position as a 6-field FEN string.
    pub fn to_fen(&self) -> String {
        self.to_string()
    }
}

/// Rank 8 comes first in FEN, so ranks are filled top down.
fn parse_placements(placements: &str) -> Result<[Option<Piece>; Square::COUNT]> {
    let mut board = [None; Square::COUNT];

    for (rank, pieces) in Rank::iter().rev().zip(placements.split('/')) {
        let mut file = 0;
        for c in pieces.chars() {
            if let Some(empty) = c.to_digit(10) {
                file += empty as u8;
            } else {
                board[Square::new(File(file), rank)] = Some(Piece::from_uci(c)?);
                file += 1;
            }
        }
    }

    Ok(board)
}

impl FromStr for Position {
    type Err = anyhow::Error;
    #[inline(always)]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_fen(s)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in Rank::iter().rev() {
            let mut empty = 0;
            for file in File::iter() {
                match self.piece_at(Square::new(file, rank)) {
                    Some(piece) => {
                        if empty > 0 {
                            write!(f, "{empty}")?;
                            empty = 0;
                        }
                        write!(f, "{piece}")?;
                    }
                    None => empty += 1,
                }
            }

            if empty > 0 {
                write!(f, "{empty}")?;
            }

            if rank != Rank::ONE {
                write!(f, "/")?;
            }
        }

        let ep_square = self
            .ep_square()
            .map(|square| square.to_string())
            .unwrap_or_else(|| String::from("-"));

        write!(
            f,
            " {} {} {ep_square} {} {}",
            self.side_to_move().to_uci(),
            self.castling_rights(),
            self.halfmove(),
            self.fullmove()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_fens() {
        for fen in [
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq -",
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
            "8/8/8/k5QK/8/8/8/8 b - -",
            FEN_KIWIPETE,
        ] {
            assert!(validate_fen(fen).is_ok(), "{fen}");
        }
    }

    #[test]
    fn test_well_formed_but_inaccurate_fens() {
        // Syntax says nothing about whether the rights, square, or clocks are consistent with the board
        for fen in [
            "8/8/k7/8/8/8/8/7K w KQ -",
            "8/8/8/p7/8/3PP3/8/K6k w - a6",
            "8/8/8/pP6/8/8/8/K6k w - a6 21 37",
            "8/11111111/8/8/8/8/8/k6K b - -",
        ] {
            assert!(validate_fen(fen).is_ok(), "{fen}");
            assert!(Position::from_fen(fen).is_ok(), "{fen}");
        }
    }

    #[test]
    fn test_well_formed_but_illegal_fens() {
        for fen in [
            "8/8/8/8/8/8/8/8 w - -",
            "8/K5K1/8/8/8/8/k1k5/8 w - -",
            "8/K5K1/8/8/8/8/8/8 w - -",
            "8/kK6/8/8/8/8/8/8 w - -",
            "pPpPpPpP/8/8/k6K/8/8/8/PpPpPpPp w - -",
            "8/8/8/k5QK/8/8/8/8 w - -",
        ] {
            assert!(validate_fen(fen).is_ok(), "{fen}");
            assert!(Position::from_fen(fen).is_err(), "{fen}");
        }
    }

    #[test]
    fn test_en_passant_square_needs_a_double_push() {
        for fen in [
            "4k3/8/8/8/8/8/8/4K3 w - e6 0 1",
            "4k3/8/8/4n3/8/8/8/4K3 w - e6 0 1",
            "4k3/8/8/3p4/8/8/8/4K3 w - e6 0 1",
            "4k3/4p3/8/4p3/8/8/8/4K3 w - e6 0 1",
            "4k3/8/4b3/4p3/8/8/8/4K3 w - e6 0 1",
            "4k3/8/8/8/3p4/8/3N4/4K3 b - d3 0 1",
        ] {
            assert!(validate_fen(fen).is_ok(), "{fen}");
            assert!(Position::from_fen(fen).is_err(), "{fen}");
        }

        for fen in [
            "4k3/8/8/4p3/8/8/8/4K3 w - e6 0 1",
            "4k3/8/8/8/3Pp3/8/8/4K3 b - d3 0 1",
            "rnbqkbnr/pp1ppppp/8/2p5/4P3/8/PPPP1PPP/RNBQKBNR w KQkq c6 0 2",
        ] {
            assert!(Position::from_fen(fen).is_ok(), "{fen}");
        }

        // The impossible square is refused before it can reach make/unmake
        assert!(Position::from_fen("4k3/8/8/8/8/8/3PP3/4K3 w - e3 0 1").is_err());
    }

    #[test]
    fn test_malformed_fens() {
        for fen in [
            "",
            "Most certainly not a FEN.",
            "9/8/7/6/0/4/3/2 b - -",
            " rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - ",
            "rrrrrrrrrrrrrrrrrr/8/8/8/8/8/8/k6K b - -",
            "8/8/k6K b - -",
            "8/12345/8/8/8/8/8/k6K b - -",
            "8/1p/8/8/8/8/8/k6K b - -",
            "8/8/8/8/8/8/8/k6K q - -",
            "8/8/8/8/8/8/8/k6K w FFFF -",
            "8/8/8/8/8/8/8/k6K w QQ -",
            "8/8/8/8/8/8/8/k6K w qk -",
            "8/8/8/8/8/8/8/k6K w - x0",
            "8/8/8/8/8/8/8/k6K w - a8",
            "8/8/k7/8/8/8/8/7K w - a3",
            "4k3/8/8/8/8/8/3PP3/4K3 w - e3 0 1",
            "4k3/8/8/4p3/8/8/8/4K3 b - e6 0 1",
            "8/8/8/8/8/8/8/k6K w - - -5 -10",
            "8/8/8/8/8/8/8/k6K w - - 00 3",
            "8/8/8/8/8/8/8/k6K w - - 0 0",
            "8/8/8/8/8/8/8/k6K w  - -",
            "8/8/8/8/8/8/8/k6K w - - 0",
        ] {
            assert!(validate_fen(fen).is_err(), "{fen:?}");
        }
    }

    #[test]
    fn test_from_fen_trims_whitespace() {
        let padded = format!("  {FEN_STARTPOS}\n");
        assert!(validate_fen(&padded).is_err());
        assert_eq!(Position::from_fen(&padded).unwrap(), Position::startpos());
    }

    #[test]
    fn test_fen_round_trip() {
        for fen in [
            FEN_STARTPOS,
            FEN_KIWIPETE,
            "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
            "rnbqkbnr/pp1ppppp/8/2p5/4P3/8/PPPP1PPP/RNBQKBNR w KQkq c6 0 2",
            "4k3/8/8/8/8/8/8/4K3 b - - 99 150",
        ] {
            assert_eq!(Position::from_fen(fen).unwrap().to_fen(), fen);
        }
    }

    #[test]
    fn test_missing_clocks_default() {
        let pos: Position = "8/8/8/k5QK/8/8/8/8 b - -".parse().unwrap();
        assert_eq!(pos.halfmove(), 0);
        assert_eq!(pos.fullmove(), 1);
        assert_eq!(pos.to_fen(), "8/8/8/k5QK/8/8/8/8 b - - 0 1");
    }

    #[test]
    fn test_startpos_matches_fen() {
        assert_eq!(Position::from_fen(FEN_STARTPOS).unwrap(), Position::startpos());
        assert_eq!(Position::default().to_fen(), FEN_STARTPOS);
    }
}
