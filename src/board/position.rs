/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

use log::{debug, warn};

use super::{
    Bitboard, BoardView, Color, File, LegalMove, MoveKind, MoveList, Piece, PieceKind,
    PositionError, Rank, Square, UndoRecord,
};

/// Which of the four castling moves are still permitted.
///
/// A right is lost for good once the King or the matching Rook leaves its home square,
/// or the Rook is captured there. It says nothing about whether castling is playable *right now*.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CastlingRights {
    /// Kingside, indexed by [`Color`].
    short: [bool; Color::COUNT],

    /// Queenside, indexed by [`Color`].
    long: [bool; Color::COUNT],
}

impl CastlingRights {
    pub const NONE: Self = Self::new(false, false, false, false);
    pub const ALL: Self = Self::new(true, true, true, true);

    #[inline(always)]
    pub const fn new(white_short: bool, white_long: bool, black_short: bool, black_long: bool) -> Self {
        Self {
            short: [white_short, black_short],
            long: [white_long, black_long],
        }
    }

    #[inline(always)]
    pub const fn short(&self, color: Color) -> bool {
        self.short[color.index()]
    }

    #[inline(always)]
    pub const fn long(&self, color: Color) -> bool {
        self.long[color.index()]
    }

    #[inline(always)]
    pub fn set_short(&mut self, color: Color) {
        self.short[color] = true;
    }

    #[inline(always)]
    pub fn set_long(&mut self, color: Color) {
        self.long[color] = true;
    }

    /// Removes both of `color`'s rights.
    #[inline(always)]
    pub fn clear(&mut self, color: Color) {
        self.short[color] = false;
        self.long[color] = false;
    }

    /// Removes the right tied to a Rook on `square`, if `square` is one of `color`'s home corners.
    #[inline(always)]
    fn clear_corner(&mut self, square: Square, color: Color) {
        if square.rank() != Rank::first(color) {
            return;
        }

        if square.file() == File::H {
            self.short[color] = false;
        } else if square.file() == File::A {
            self.long[color] = false;
        }
    }
}

impl fmt::Display for CastlingRights {
    /// FEN notation: some ordered subset of `KQkq`, or `-` if no rights remain.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rights = [
            (self.short(Color::White), 'K'),
            (self.long(Color::White), 'Q'),
            (self.short(Color::Black), 'k'),
            (self.long(Color::Black), 'q'),
        ];

        let mut any = false;
        for (_, c) in rights.iter().filter(|(held, _)| *held) {
            write!(f, "{c}")?;
            any = true;
        }

        if !any {
            write!(f, "-")?;
        }

        Ok(())
    }
}

impl fmt::Debug for CastlingRights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

/// Whether the game can continue from a position.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum GameState {
    Ongoing,

    /// The side to move has no legal moves and its King is attacked.
    Checkmate,

    /// The side to move has no legal moves, but its King is safe.
    Stalemate,
}

impl GameState {
    #[inline(always)]
    pub const fn is_over(&self) -> bool {
        !matches!(self, Self::Ongoing)
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self {
            Self::Ongoing => "Ongoing",
            Self::Checkmate => "Checkmate",
            Self::Stalemate => "Stalemate",
        };
        write!(f, "{state}")
    }
}

/// The full state of a chess game, mutated in place as moves are made and taken back.
///
/// Alongside the 64 squares, a [`Position`] keeps two derived indices in sync:
/// the set of squares each color occupies, and the square each color's King stands on.
/// Both are only ever changed through [`Position::place`] and [`Position::take`].
///
/// The legal moves for the side to move are computed once after every change and cached,
/// so [`Position::legal_moves`] never recomputes them.
#[derive(Clone, PartialEq, Eq)]
pub struct Position {
    board: [Option<Piece>; Square::COUNT],

    side_to_move: Color,

    castling_rights: CastlingRights,

    /// Square a Pawn skipped over on the previous move, if that move was a double push.
    ep_square: Option<Square>,

    /// Moves since the last Pawn move or capture.
    halfmove: usize,

    /// Starts at 1 and goes up after every Black move.
    fullmove: usize,

    /// Squares occupied by each color.
    pieces: [Bitboard; Color::COUNT],

    /// Where each color's King stands.
    kings: [Square; Color::COUNT],

    legal_moves: MoveList,

    history: Vec<UndoRecord>,
}

impl Position {
    /// Builds a [`Position`] from an already-validated snapshot.
    ///
    /// Nothing here is checked. Positions coming from text should go through [`Position::from_fen`] instead.
    pub fn from_parts(
        board: [Option<Piece>; Square::COUNT],
        side_to_move: Color,
        castling_rights: CastlingRights,
        ep_square: Option<Square>,
        halfmove: usize,
        fullmove: usize,
    ) -> Self {
        let mut position = Self {
            board: [None; Square::COUNT],
            side_to_move,
            castling_rights,
            ep_square,
            halfmove,
            fullmove,
            pieces: [Bitboard::EMPTY_BOARD; Color::COUNT],
            kings: [Square::default(); Color::COUNT],
            legal_moves: MoveList::new(),
            history: Vec::new(),
        };

        for square in Square::iter() {
            if let Some(piece) = board[square] {
                position.place(piece, square);
            }
        }

        position.legal_moves = position.generate_legal_moves();
        position
    }

    /// The standard starting position.
    ///
    /// # Example
    /// ```
    /// # use crudechess::Position;
    /// let pos = Position::startpos();
    /// assert_eq!(pos.legal_moves().len(), 20);
    /// assert_eq!(pos.to_fen(), "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1");
    /// ```
    pub fn startpos() -> Self {
        use PieceKind::*;
        let back_rank = [Rook, Knight, Bishop, Queen, King, Bishop, Knight, Rook];

        let mut board = [None; Square::COUNT];
        for color in Color::all() {
            for (file, kind) in File::iter().zip(back_rank) {
                board[Square::new(file, Rank::first(color))] = Some(Piece::new(color, kind));
                board[Square::new(file, Rank::second(color))] = Some(Piece::new(color, Pawn));
            }
        }

        Self::from_parts(board, Color::White, CastlingRights::ALL, None, 0, 1)
    }

    #[inline(always)]
    pub const fn piece_at(&self, square: Square) -> Option<Piece> {
        self.board[square.index()]
    }

    #[inline(always)]
    pub const fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    #[inline(always)]
    pub const fn castling_rights(&self) -> CastlingRights {
        self.castling_rights
    }

    #[inline(always)]
    pub const fn ep_square(&self) -> Option<Square> {
        self.ep_square
    }

    #[inline(always)]
    pub const fn halfmove(&self) -> usize {
        self.halfmove
    }

    #[inline(always)]
    pub const fn fullmove(&self) -> usize {
        self.fullmove
    }

    /// Every square occupied by `color`.
    #[inline(always)]
    pub const fn pieces(&self, color: Color) -> Bitboard {
        self.pieces[color.index()]
    }

    #[inline(always)]
    pub const fn king_square(&self, color: Color) -> Square {
        self.kings[color.index()]
    }

    /// Legal moves for the side to move, in generation order.
    #[inline(always)]
    pub fn legal_moves(&self) -> &[LegalMove] {
        &self.legal_moves
    }

    /// Destinations the piece on `square` can legally move to.
    pub fn legal_targets_from(&self, square: Square) -> Bitboard {
        self.legal_moves
            .iter()
            .filter(|mv| mv.from() == square)
            .map(|mv| mv.to())
            .collect()
    }

    /// Moves made so far that can still be taken back, oldest first.
    #[inline(always)]
    pub fn history(&self) -> &[UndoRecord] {
        &self.history
    }

    /// `true` if moving `mv` would put a Pawn on its last rank.
    #[inline(always)]
    pub fn is_promotion(&self, mv: LegalMove) -> bool {
        self.piece_at(mv.from()).is_some_and(|piece| {
            piece.is_pawn() && mv.to().rank() == Rank::eighth(piece.color())
        })
    }

    /// `true` if the side to move has its King attacked.
    #[inline(always)]
    pub fn is_in_check(&self) -> bool {
        let color = self.side_to_move;
        self.is_square_attacked(self.king_square(color), color.opponent())
    }

    pub fn game_end_state(&self) -> GameState {
        if !self.legal_moves.is_empty() {
            GameState::Ongoing
        } else if self.is_in_check() {
            GameState::Checkmate
        } else {
            GameState::Stalemate
        }
    }

    /// The color that delivered checkmate, if the game ended that way.
    pub fn winner(&self) -> Option<Color> {
        (self.game_end_state() == GameState::Checkmate).then(|| self.side_to_move.opponent())
    }

    /// Makes a move, but only if it is in the current list of legal moves.
    ///
    /// If a Pawn reaches its last rank, it becomes `promotion`, or a Queen if none was provided.
    ///
    /// # Example
    /// ```
    /// # use crudechess::{Position, PositionError, Square};
    /// let mut pos = Position::startpos();
    /// let e2 = "e2".parse().unwrap();
    /// let e5 = "e5".parse().unwrap();
    /// assert_eq!(pos.apply(e2, e5, None), Err(PositionError::IllegalMove { from: e2, to: e5 }));
    /// assert!(pos.apply(e2, "e4".parse().unwrap(), None).is_ok());
    /// ```
    pub fn apply(
        &mut self,
        from: Square,
        to: Square,
        promotion: Option<PieceKind>,
    ) -> Result<MoveKind, PositionError> {
        match self.make(from, to, promotion, true) {
            Ok(kind) => {
                debug!("Applied {from}{to} ({kind:?}); {} to move", self.side_to_move.name());
                Ok(kind)
            }
            Err(err) => {
                warn!("Rejected move {from}{to}: {err}");
                Err(err)
            }
        }
    }

    /// Takes back the most recent move.
    pub fn undo(&mut self) -> Result<(), PositionError> {
        let notation = self.history.last().map(UndoRecord::notation);
        self.unmake()?;
        debug!("Took back {}", notation.unwrap_or_default());
        Ok(())
    }

    /// Makes the move from `from` to `to`, recording everything needed to take it back.
    ///
    /// When `strict` is set, the move must be one of [`Position::legal_moves`] and `promotion` must be a piece
    /// a Pawn can become. Otherwise the move is trusted as-is, which is how perft drives the position.
    ///
    /// On error, the position is left untouched.
    pub fn make(
        &mut self,
        from: Square,
        to: Square,
        promotion: Option<PieceKind>,
        strict: bool,
    ) -> Result<MoveKind, PositionError> {
        if strict {
            if !self.legal_moves.contains(&LegalMove::new(from, to)) {
                return Err(PositionError::IllegalMove { from, to });
            }

            if let Some(kind) = promotion.filter(|kind| !kind.is_promotion_target()) {
                return Err(PositionError::InvalidPromotion(kind));
            }
        }

        let Some(piece) = self.piece_at(from) else {
            return Err(PositionError::IllegalMove { from, to });
        };

        let color = piece.color();
        let kind = self.classify(piece, from, to, promotion);

        // Snapshot everything `unmake` cannot recompute
        let castling_rights = self.castling_rights;
        let ep_square = self.ep_square;
        let halfmove = self.halfmove;
        let fullmove = self.fullmove;

        let captured = match kind {
            MoveKind::EnPassant => Some(PieceKind::Pawn),
            _ => self.piece_at(to).map(|victim| victim.kind()),
        };

        // Each of these can apply to the same move, e.g. a Rook capturing a Rook from corner to corner
        match piece.kind() {
            PieceKind::King => self.castling_rights.clear(color),
            PieceKind::Rook => self.castling_rights.clear_corner(from, color),
            _ => {}
        }
        if captured == Some(PieceKind::Rook) {
            self.castling_rights.clear_corner(to, color.opponent());
        }

        match kind {
            MoveKind::Castle => {
                let (rook_from, rook_to) = castling_rook_squares(to);
                if let Some(rook) = self.take(rook_from) {
                    self.place(rook, rook_to);
                }
            }
            MoveKind::EnPassant => {
                if let Some(victim) = to.backward(color) {
                    self.take(victim);
                }
            }
            _ => {}
        }

        self.take(from);
        self.take(to);
        let landed = match kind {
            MoveKind::Promotion(promoted) => piece.promoted(promoted),
            _ => piece,
        };
        self.place(landed, to);

        if piece.is_pawn() || captured.is_some() {
            self.halfmove = 0;
        } else {
            self.halfmove += 1;
        }

        if color == Color::Black {
            self.fullmove += 1;
        }

        self.side_to_move = color.opponent();

        self.ep_square = if piece.is_pawn() && from.rank().index().abs_diff(to.rank().index()) == 2 {
            from.forward(color)
        } else {
            None
        };

        // The old list moves into the record instead of being cloned
        let next_moves = self.generate_legal_moves();
        let legal_moves = std::mem::replace(&mut self.legal_moves, next_moves);

        self.history.push(UndoRecord {
            from,
            to,
            captured,
            kind,
            castling_rights,
            ep_square,
            halfmove,
            fullmove,
            legal_moves,
        });

        Ok(kind)
    }

    /// Takes back the most recent move made with [`Position::make`], restoring the position exactly,
    /// including its cached legal moves.
    pub fn unmake(&mut self) -> Result<(), PositionError> {
        let record = self.history.pop().ok_or(PositionError::EmptyHistory)?;
        let mover = self.side_to_move.opponent();

        if let Some(piece) = self.take(record.to) {
            let piece = match record.kind {
                MoveKind::Promotion(_) => piece.demoted(),
                _ => piece,
            };
            self.place(piece, record.from);
        }

        match record.kind {
            MoveKind::Castle => {
                let (rook_from, rook_to) = castling_rook_squares(record.to);
                if let Some(rook) = self.take(rook_to) {
                    self.place(rook, rook_from);
                }
            }
            MoveKind::EnPassant => {
                if let Some(victim) = record.to.backward(mover) {
                    self.place(Piece::new(mover.opponent(), PieceKind::Pawn), victim);
                }
            }
            MoveKind::Standard | MoveKind::Promotion(_) => {
                if let Some(kind) = record.captured {
                    self.place(Piece::new(mover.opponent(), kind), record.to);
                }
            }
        }

        self.side_to_move = mover;
        self.castling_rights = record.castling_rights;
        self.ep_square = record.ep_square;
        self.halfmove = record.halfmove;
        self.fullmove = record.fullmove;
        self.legal_moves = record.legal_moves;

        Ok(())
    }

    /// Moves a piece from `from` to `to` just long enough to see whether its own King would be attacked,
    /// then puts everything back.
    ///
    /// Nothing is recorded and no counters change. An en passant capture also lifts the captured Pawn,
    /// since its absence can expose the King along the rank.
    pub(crate) fn is_safe_after(&mut self, from: Square, to: Square) -> bool {
        let Some(piece) = self.take(from) else {
            return false;
        };
        let color = piece.color();

        let captured = self.take(to);
        let ep_victim = if piece.is_pawn() && captured.is_none() && from.file() != to.file() {
            to.backward(color)
                .and_then(|square| self.take(square).map(|victim| (square, victim)))
        } else {
            None
        };

        self.place(piece, to);
        let safe = !self.is_square_attacked(self.king_square(color), color.opponent());

        self.take(to);
        self.place(piece, from);
        if let Some(captured) = captured {
            self.place(captured, to);
        }
        if let Some((square, victim)) = ep_victim {
            self.place(victim, square);
        }

        safe
    }

    /// Works out what kind of move this is from the moving piece and the geometry of the move.
    fn classify(
        &self,
        piece: Piece,
        from: Square,
        to: Square,
        promotion: Option<PieceKind>,
    ) -> MoveKind {
        match piece.kind() {
            PieceKind::King if from.file().abs_diff(to.file()) == 2 => MoveKind::Castle,

            PieceKind::Pawn if to.rank() == Rank::eighth(piece.color()) => MoveKind::Promotion(
                promotion
                    .filter(PieceKind::is_promotion_target)
                    .unwrap_or(PieceKind::Queen),
            ),

            PieceKind::Pawn
                if from.file() != to.file()
                    && self.piece_at(to).is_none()
                    && self.ep_square == Some(to) =>
            {
                MoveKind::EnPassant
            }

            _ => MoveKind::Standard,
        }
    }

    /// Puts `piece` on `square`, keeping the occupancy sets and King squares in sync.
    #[inline(always)]
    fn place(&mut self, piece: Piece, square: Square) {
        let color = piece.color();
        self.board[square] = Some(piece);
        self.pieces[color].set(square);
        if piece.is_king() {
            self.kings[color] = square;
        }
    }

    /// Removes and returns whatever is on `square`, keeping the occupancy sets in sync.
    #[inline(always)]
    fn take(&mut self, square: Square) -> Option<Piece> {
        let piece = self.board[square].take()?;
        self.pieces[piece.color()].clear(square);
        Some(piece)
    }
}

/// Where the Rook starts and lands when the King castles onto `king_to`.
#[inline(always)]
fn castling_rook_squares(king_to: Square) -> (Square, Square) {
    let rank = king_to.rank();
    if king_to.file() == File::G {
        (Square::new(File::H, rank), Square::new(File::F, rank))
    } else {
        (Square::new(File::A, rank), Square::new(File::D, rank))
    }
}

impl Default for Position {
    #[inline(always)]
    fn default() -> Self {
        Self::startpos()
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", BoardView::new(self))
    }
}
