/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{
    fmt,
    ops::{Index, IndexMut},
    str::FromStr,
};

use anyhow::{bail, Context, Result};

use super::Color;

/// One of the 64 squares of a chess board.
///
/// Squares are numbered rank-major from `a1`, so `index = file + rank * 8`:
/// ```text
/// 8| 56 57 58 59 60 61 62 63
/// 7| 48 49 50 51 52 53 54 55
/// 6| 40 41 42 43 44 45 46 47
/// 5| 32 33 34 35 36 37 38 39
/// 4| 24 25 26 27 28 29 30 31
/// 3| 16 17 18 19 20 21 22 23
/// 2|  8  9 10 11 12 13 14 15
/// 1|  0  1  2  3  4  5  6  7
///  +------------------------
///    a  b  c  d  e  f  g  h
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[repr(transparent)]
pub struct Square(pub(crate) u8);

impl Square {
    pub const A1: Self = Self::new(File::A, Rank::ONE);
    pub const B1: Self = Self::new(File::B, Rank::ONE);
    pub const C1: Self = Self::new(File::C, Rank::ONE);
    pub const D1: Self = Self::new(File::D, Rank::ONE);
    pub const E1: Self = Self::new(File::E, Rank::ONE);
    pub const F1: Self = Self::new(File::F, Rank::ONE);
    pub const G1: Self = Self::new(File::G, Rank::ONE);
    pub const H1: Self = Self::new(File::H, Rank::ONE);

    pub const A8: Self = Self::new(File::A, Rank::EIGHT);
    pub const B8: Self = Self::new(File::B, Rank::EIGHT);
    pub const C8: Self = Self::new(File::C, Rank::EIGHT);
    pub const D8: Self = Self::new(File::D, Rank::EIGHT);
    pub const E8: Self = Self::new(File::E, Rank::EIGHT);
    pub const F8: Self = Self::new(File::F, Rank::EIGHT);
    pub const G8: Self = Self::new(File::G, Rank::EIGHT);
    pub const H8: Self = Self::new(File::H, Rank::EIGHT);

    pub const MIN: u8 = 0;
    pub const MAX: u8 = 63;
    pub const COUNT: usize = 64;

    /// All squares, from `a1` to `h8`.
    ///
    /// # Example
    /// ```
    /// # use crudechess::Square;
    /// let mut iter = Square::iter();
    /// assert_eq!(iter.len(), 64);
    /// assert_eq!(iter.next().unwrap(), Square::A1);
    /// assert_eq!(iter.last().unwrap(), Square::H8);
    /// ```
    #[inline(always)]
    pub fn iter() -> impl ExactSizeIterator<Item = Self> + DoubleEndedIterator<Item = Self> {
        (Self::MIN..=Self::MAX).map(Self)
    }

    #[inline(always)]
    pub const fn new(file: File, rank: Rank) -> Self {
        Self(rank.0 << 3 | file.0)
    }

    /// Creates a [`Square`] from an index in `[0, 63]`.
    ///
    /// # Example
    /// ```
    /// # use crudechess::Square;
    /// assert_eq!(Square::from_index(4).unwrap(), Square::E1);
    /// assert!(Square::from_index(64).is_err());
    /// ```
    #[inline(always)]
    pub fn from_index(index: usize) -> Result<Self> {
        if index > Self::MAX as usize {
            bail!(
                "Invalid index for Square: Must be between [{}, {}]. Got {index}",
                Self::MIN,
                Self::MAX
            );
        }

        Ok(Self(index as u8))
    }

    #[inline(always)]
    pub const fn file(&self) -> File {
        File(self.0 & 0b111)
    }

    #[inline(always)]
    pub const fn rank(&self) -> Rank {
        Rank(self.0 >> 3)
    }

    #[inline(always)]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }

    /// Steps `file_delta` files and `rank_delta` ranks away from this square.
    ///
    /// The file and rank are offset independently, so stepping off any edge of the board
    /// yields `None` instead of wrapping around onto the next rank.
    ///
    /// # Example
    /// ```
    /// # use crudechess::Square;
    /// let c4: Square = "c4".parse().unwrap();
    /// assert_eq!(c4.offset(1, 1), "d5".parse().ok());
    /// assert_eq!(Square::H1.offset(1, 0), None);
    /// assert_eq!(Square::A8.offset(0, 1), None);
    /// ```
    #[inline(always)]
    pub const fn offset(&self, file_delta: i8, rank_delta: i8) -> Option<Self> {
        let Some(file) = self.file().offset(file_delta) else {
            return None;
        };

        let Some(rank) = self.rank().offset(rank_delta) else {
            return None;
        };

        Some(Self::new(file, rank))
    }

    /// One step toward the opponent's side of the board, from `color`'s perspective.
    #[inline(always)]
    pub const fn forward(&self, color: Color) -> Option<Self> {
        self.offset(0, color.forward())
    }

    /// One step toward `color`'s own side of the board.
    #[inline(always)]
    pub const fn backward(&self, color: Color) -> Option<Self> {
        self.offset(0, -color.forward())
    }

    /// Parses algebraic notation such as `e4`.
    ///
    /// # Example
    /// ```
    /// # use crudechess::Square;
    /// assert_eq!(Square::from_uci("e1").unwrap(), Square::E1);
    /// assert!(Square::from_uci("z0").is_err());
    /// ```
    pub fn from_uci(square: &str) -> Result<Self> {
        let mut chars = square.chars();
        let (Some(file), Some(rank), None) = (chars.next(), chars.next(), chars.next()) else {
            bail!("Invalid Square string: String must contain exactly 2 characters. Got {square:?}")
        };

        Ok(Self::new(File::from_char(file)?, Rank::from_char(rank)?))
    }

    #[inline(always)]
    pub fn to_uci(self) -> String {
        format!("{}{}", self.file(), self.rank())
    }
}

impl FromStr for Square {
    type Err = anyhow::Error;
    #[inline(always)]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_uci(s)
    }
}

impl<T> Index<Square> for [T; Square::COUNT] {
    type Output = T;
    #[inline(always)]
    fn index(&self, index: Square) -> &Self::Output {
        &self[index.index()]
    }
}

impl<T> IndexMut<Square> for [T; Square::COUNT] {
    #[inline(always)]
    fn index_mut(&mut self, index: Square) -> &mut Self::Output {
        &mut self[index.index()]
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.file(), self.rank())
    }
}

impl fmt::Debug for Square {
    /// Algebraic name followed by the raw index.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self, self.0)
    }
}

/// A row of the board, `1` through `8`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct Rank(pub(crate) u8);

impl Rank {
    pub const ONE: Self = Self(0);
    pub const TWO: Self = Self(1);
    pub const THREE: Self = Self(2);
    pub const FOUR: Self = Self(3);
    pub const FIVE: Self = Self(4);
    pub const SIX: Self = Self(5);
    pub const SEVEN: Self = Self(6);
    pub const EIGHT: Self = Self(7);

    pub const MAX: u8 = 7;
    pub const COUNT: usize = 8;

    /// Ranks `1` through `8`, in ascending order.
    #[inline(always)]
    pub fn iter() -> impl ExactSizeIterator<Item = Self> + DoubleEndedIterator<Item = Self> {
        (0..=Self::MAX).map(Self)
    }

    /// The rank `color`'s pieces start on.
    #[inline(always)]
    pub const fn first(color: Color) -> Self {
        [Self::ONE, Self::EIGHT][color.index()]
    }

    /// The rank `color`'s pawns start on.
    #[inline(always)]
    pub const fn second(color: Color) -> Self {
        [Self::TWO, Self::SEVEN][color.index()]
    }

    /// The rank `color`'s pawns promote on.
    #[inline(always)]
    pub const fn eighth(color: Color) -> Self {
        [Self::EIGHT, Self::ONE][color.index()]
    }

    pub fn from_char(rank: char) -> Result<Self> {
        let digit = rank
            .to_digit(10)
            .filter(|d| (1..=8).contains(d))
            .with_context(|| format!("Invalid char for Rank: Must be between [1, 8]. Got {rank:?}"))?;

        Ok(Self(digit as u8 - 1))
    }

    #[inline(always)]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }

    #[inline(always)]
    pub const fn char(&self) -> char {
        (self.0 + b'1') as char
    }

    /// `None` if `self + delta` leaves the board.
    #[inline(always)]
    pub const fn offset(self, delta: i8) -> Option<Self> {
        match self.0.checked_add_signed(delta) {
            Some(bits) if bits <= Self::MAX => Some(Self(bits)),
            _ => None,
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.char())
    }
}

impl fmt::Debug for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.char(), self.0)
    }
}

/// A column of the board, `a` through `h`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct File(pub(crate) u8);

impl File {
    pub const A: Self = Self(0);
    pub const B: Self = Self(1);
    pub const C: Self = Self(2);
    pub const D: Self = Self(3);
    pub const E: Self = Self(4);
    pub const F: Self = Self(5);
    pub const G: Self = Self(6);
    pub const H: Self = Self(7);

    pub const MAX: u8 = 7;
    pub const COUNT: usize = 8;

    /// Files `a` through `h`, in ascending order.
    #[inline(always)]
    pub fn iter() -> impl ExactSizeIterator<Item = Self> + DoubleEndedIterator<Item = Self> {
        (0..=Self::MAX).map(Self)
    }

    /// Parses a lowercase file letter.
    pub fn from_char(file: char) -> Result<Self> {
        if !('a'..='h').contains(&file) {
            bail!("Invalid char for File: Must be between ['a', 'h']. Got {file:?}");
        }

        Ok(Self(file as u8 - b'a'))
    }

    #[inline(always)]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }

    #[inline(always)]
    pub const fn char(&self) -> char {
        (self.0 + b'a') as char
    }

    /// `None` if `self + delta` leaves the board.
    #[inline(always)]
    pub const fn offset(self, delta: i8) -> Option<Self> {
        match self.0.checked_add_signed(delta) {
            Some(bits) if bits <= Self::MAX => Some(Self(bits)),
            _ => None,
        }
    }

    /// Number of files between `self` and `other`.
    #[inline(always)]
    pub const fn abs_diff(&self, other: Self) -> u8 {
        self.0.abs_diff(other.0)
    }
}

impl fmt::Display for File {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.char())
    }
}

impl fmt::Debug for File {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.char(), self.0)
    }
}
