/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{
    fmt,
    ops::{Index, IndexMut, Not},
    str::FromStr,
};

use anyhow::{bail, Result};

/// The color of a player or of the pieces they own.
///
/// White always moves first, so [`Color`] defaults to [`Color::White`].
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Color {
    #[default]
    White,
    Black,
}

impl Color {
    /// Number of color variants.
    pub const COUNT: usize = 2;

    /// Both colors, White first.
    #[inline(always)]
    pub const fn all() -> [Self; Self::COUNT] {
        [Self::White, Self::Black]
    }

    /// Returns the other player's color.
    ///
    /// # Example
    /// ```
    /// # use crudechess::Color;
    /// assert_eq!(Color::White.opponent(), Color::Black);
    /// assert_eq!(Color::Black.opponent(), Color::White);
    /// ```
    #[inline(always)]
    pub const fn opponent(&self) -> Self {
        match self {
            Self::White => Self::Black,
            Self::Black => Self::White,
        }
    }

    /// `0` for White, `1` for Black.
    #[inline(always)]
    pub const fn index(&self) -> usize {
        *self as usize
    }

    /// The direction this color's pawns travel along the ranks: `1` for White, `-1` for Black.
    #[inline(always)]
    pub const fn forward(&self) -> i8 {
        match self {
            Self::White => 1,
            Self::Black => -1,
        }
    }

    /// Uppercase characters are White, lowercase are Black.
    #[inline(always)]
    pub const fn from_case(c: char) -> Self {
        if c.is_ascii_lowercase() {
            Self::Black
        } else {
            Self::White
        }
    }

    /// Parses `w` or `b`, in either case.
    ///
    /// # Example
    /// ```
    /// # use crudechess::Color;
    /// assert_eq!(Color::from_uci('b').unwrap(), Color::Black);
    /// assert!(Color::from_uci('x').is_err());
    /// ```
    #[inline(always)]
    pub fn from_uci(color: char) -> Result<Self> {
        match color {
            'w' | 'W' => Ok(Self::White),
            'b' | 'B' => Ok(Self::Black),
            _ => bail!("Color must be either 'w' or 'b' (case-insensitive). Found {color:?}"),
        }
    }

    #[inline(always)]
    pub const fn to_uci(&self) -> char {
        match self {
            Self::White => 'w',
            Self::Black => 'b',
        }
    }

    /// Human-readable name, capitalized for messages like "White wins".
    #[inline(always)]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::White => "White",
            Self::Black => "Black",
        }
    }
}

impl Not for Color {
    type Output = Self;
    #[inline(always)]
    fn not(self) -> Self::Output {
        self.opponent()
    }
}

/// What a piece is, without regard to who owns it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceKind {
    /// Number of piece kinds.
    pub const COUNT: usize = 6;

    /// Kinds a pawn may promote to, in the order traversal tries them.
    pub const PROMOTIONS: [Self; 4] = [Self::Queen, Self::Rook, Self::Bishop, Self::Knight];

    #[inline(always)]
    pub const fn all() -> [Self; Self::COUNT] {
        [
            Self::Pawn,
            Self::Knight,
            Self::Bishop,
            Self::Rook,
            Self::Queen,
            Self::King,
        ]
    }

    #[inline(always)]
    pub const fn index(&self) -> usize {
        *self as usize
    }

    /// Whether a pawn is allowed to become this kind.
    #[inline(always)]
    pub const fn is_promotion_target(&self) -> bool {
        matches!(self, Self::Knight | Self::Bishop | Self::Rook | Self::Queen)
    }

    /// Parses a piece letter in either case.
    ///
    /// # Example
    /// ```
    /// # use crudechess::PieceKind;
    /// assert_eq!(PieceKind::from_uci('Q').unwrap(), PieceKind::Queen);
    /// assert_eq!(PieceKind::from_uci('n').unwrap(), PieceKind::Knight);
    /// assert!(PieceKind::from_uci('x').is_err());
    /// ```
    #[inline(always)]
    pub fn from_uci(kind: char) -> Result<Self> {
        match kind {
            'P' | 'p' => Ok(Self::Pawn),
            'N' | 'n' => Ok(Self::Knight),
            'B' | 'b' => Ok(Self::Bishop),
            'R' | 'r' => Ok(Self::Rook),
            'Q' | 'q' => Ok(Self::Queen),
            'K' | 'k' => Ok(Self::King),
            _ => bail!("Invalid char for PieceKind: Got {kind:?}."),
        }
    }

    /// Lowercase piece letter.
    #[inline(always)]
    pub const fn to_uci(&self) -> char {
        match self {
            Self::Pawn => 'p',
            Self::Knight => 'n',
            Self::Bishop => 'b',
            Self::Rook => 'r',
            Self::Queen => 'q',
            Self::King => 'k',
        }
    }

    #[inline(always)]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Pawn => "pawn",
            Self::Knight => "knight",
            Self::Bishop => "bishop",
            Self::Rook => "rook",
            Self::Queen => "queen",
            Self::King => "king",
        }
    }
}

/// A chess piece: a [`Color`] and a [`PieceKind`] packed into one byte.
///
/// ```text
///     0000 0 000
///          |  |
///          |  +- PieceKind
///          +- Color (0 = White, 1 = Black)
/// ```
///
/// Because both halves live in the same value, a square can never hold a color without a kind (or vice versa).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Piece(u8);

impl Piece {
    const KIND_MASK: u8 = 0b0000_0111;
    const COLOR_SHIFT: u8 = 3;

    /// Number of distinct pieces (6 kinds for each of 2 colors).
    pub const COUNT: usize = Color::COUNT * PieceKind::COUNT;

    /// # Example
    /// ```
    /// # use crudechess::{Color, Piece, PieceKind};
    /// let knight = Piece::new(Color::Black, PieceKind::Knight);
    /// assert_eq!(knight.color(), Color::Black);
    /// assert_eq!(knight.kind(), PieceKind::Knight);
    /// ```
    #[inline(always)]
    pub const fn new(color: Color, kind: PieceKind) -> Self {
        Self((color as u8) << Self::COLOR_SHIFT | kind as u8)
    }

    #[inline(always)]
    pub const fn color(&self) -> Color {
        if self.0 >> Self::COLOR_SHIFT == 0 {
            Color::White
        } else {
            Color::Black
        }
    }

    #[inline(always)]
    pub const fn kind(&self) -> PieceKind {
        match self.0 & Self::KIND_MASK {
            0 => PieceKind::Pawn,
            1 => PieceKind::Knight,
            2 => PieceKind::Bishop,
            3 => PieceKind::Rook,
            4 => PieceKind::Queen,
            _ => PieceKind::King,
        }
    }

    #[inline(always)]
    pub const fn is_pawn(&self) -> bool {
        matches!(self.kind(), PieceKind::Pawn)
    }

    #[inline(always)]
    pub const fn is_king(&self) -> bool {
        matches!(self.kind(), PieceKind::King)
    }

    /// `0..6` for White pieces, `6..12` for Black pieces.
    #[inline(always)]
    pub const fn index(&self) -> usize {
        self.color().index() * PieceKind::COUNT + self.kind().index()
    }

    /// Parses a FEN piece letter. Case determines the color.
    ///
    /// # Example
    /// ```
    /// # use crudechess::{Color, Piece, PieceKind};
    /// let rook = Piece::from_uci('R').unwrap();
    /// assert_eq!(rook, Piece::new(Color::White, PieceKind::Rook));
    /// ```
    #[inline(always)]
    pub fn from_uci(piece: char) -> Result<Self> {
        let kind = PieceKind::from_uci(piece)?;
        Ok(Self::new(Color::from_case(piece), kind))
    }

    /// FEN piece letter: uppercase for White, lowercase for Black.
    #[inline(always)]
    pub const fn to_uci(&self) -> char {
        match self.color() {
            Color::White => self.kind().to_uci().to_ascii_uppercase(),
            Color::Black => self.kind().to_uci(),
        }
    }

    /// The same color, but a different kind.
    #[inline(always)]
    pub const fn promoted(self, promotion: PieceKind) -> Self {
        Self::new(self.color(), promotion)
    }

    /// The same color, turned back into a pawn.
    #[inline(always)]
    pub const fn demoted(self) -> Self {
        self.promoted(PieceKind::Pawn)
    }

    #[inline(always)]
    pub fn name(&self) -> String {
        format!("{} {}", self.color().name(), self.kind().name())
    }
}

macro_rules! impl_common_traits {
    ($type:ty) => {
        impl<T> Index<$type> for [T; <$type>::COUNT] {
            type Output = T;
            #[inline(always)]
            fn index(&self, index: $type) -> &Self::Output {
                &self[index.index()]
            }
        }

        impl<T> IndexMut<$type> for [T; <$type>::COUNT] {
            #[inline(always)]
            fn index_mut(&mut self, index: $type) -> &mut Self::Output {
                &mut self[index.index()]
            }
        }

        impl FromStr for $type {
            type Err = anyhow::Error;
            /// Single-character form of `from_uci`.
            #[inline(always)]
            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Self::from_uci(c),
                    _ => bail!(
                        "Invalid str for {}: Must be a single character. Got {s:?}",
                        stringify!($type)
                    ),
                }
            }
        }

        impl fmt::Display for $type {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.to_uci())
            }
        }

        impl fmt::Debug for $type {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "\"{}\" ({})", self.name(), self.index())
            }
        }
    };
}

impl_common_traits!(Piece);
impl_common_traits!(PieceKind);
impl_common_traits!(Color);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_piece_packing() {
        for color in Color::all() {
            for kind in PieceKind::all() {
                let piece = Piece::new(color, kind);
                assert_eq!(piece.color(), color);
                assert_eq!(piece.kind(), kind);
            }
        }
    }

    #[test]
    fn test_piece_chars() {
        assert_eq!(Piece::from_uci('k').unwrap().to_uci(), 'k');
        assert_eq!(Piece::from_uci('Q').unwrap().to_uci(), 'Q');
        assert_eq!("N".parse::<Piece>().unwrap().name(), "White knight");
        assert!("NN".parse::<Piece>().is_err());
        assert!("".parse::<PieceKind>().is_err());
        assert!(Piece::from_uci('x').is_err());
    }

    #[test]
    fn test_promotion_targets() {
        assert!(PieceKind::PROMOTIONS
            .iter()
            .all(PieceKind::is_promotion_target));
        assert!(!PieceKind::Pawn.is_promotion_target());
        assert!(!PieceKind::King.is_promotion_target());

        let pawn = Piece::new(Color::Black, PieceKind::Pawn);
        let queen = pawn.promoted(PieceKind::Queen);
        assert_eq!(queen.color(), Color::Black);
        assert_eq!(queen.demoted(), pawn);
    }

    #[test]
    fn test_color_indexing() {
        let mut counts = [0; Color::COUNT];
        counts[Color::Black] += 1;
        assert_eq!(counts, [0, 1]);
        assert_eq!(!Color::White, Color::Black);
        assert_eq!(Color::Black.forward(), -1);
    }
}
