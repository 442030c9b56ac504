/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use crudechess::*;

const FENS: [&str; 5] = [
    FEN_STARTPOS,
    FEN_KIWIPETE,
    "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
    "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1",
    "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8",
];

fn sq(s: &str) -> Square {
    s.parse().unwrap()
}

fn play(pos: &mut Position, moves: &[&str]) {
    for mv in moves {
        let (from, to, promotion) = parse_move(mv).unwrap();
        pos.apply(from, to, promotion).unwrap();
    }
}

fn legal_strings(pos: &Position) -> Vec<String> {
    let mut moves = pos
        .legal_moves()
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>();
    moves.sort();
    moves
}

#[test]
fn test_walk_and_unwind() {
    for fen in FENS {
        let mut pos = Position::from_fen(fen).unwrap();
        let mut snapshots = Vec::new();

        for ply in 0..60 {
            let moves = pos.legal_moves();
            if moves.is_empty() {
                break;
            }

            let mv = moves[(ply * 7 + 3) % moves.len()];
            snapshots.push(pos.clone());
            pos.make(mv.from(), mv.to(), None, true).unwrap();
            assert_eq!(pos.history().len(), snapshots.len());
        }

        while let Some(expected) = snapshots.pop() {
            pos.undo().unwrap();
            assert_eq!(pos, expected, "unwinding {fen}");
        }

        assert_eq!(pos.to_fen(), Position::from_fen(fen).unwrap().to_fen());
        assert_eq!(pos.undo(), Err(PositionError::EmptyHistory));
    }
}

#[test]
fn test_every_reply_restores_exactly() {
    for fen in FENS {
        let mut pos = Position::from_fen(fen).unwrap();
        let root = pos.clone();

        for mv in root.legal_moves().to_vec() {
            pos.make(mv.from(), mv.to(), None, false).unwrap();
            let child = pos.clone();

            for reply in child.legal_moves().to_vec() {
                pos.make(reply.from(), reply.to(), Some(PieceKind::Knight), false)
                    .unwrap();
                pos.unmake().unwrap();
                assert_eq!(pos, child, "{fen}: {mv} then {reply}");
            }

            pos.unmake().unwrap();
            assert_eq!(pos, root, "{fen}: {mv}");
        }
    }
}

#[test]
fn test_check_must_be_answered() {
    let mut pos = Position::startpos();
    play(&mut pos, &["e2e4", "f7f6", "d1h5"]);

    assert!(pos.is_in_check());
    assert_eq!(pos.game_end_state(), GameState::Ongoing);
    assert_eq!(legal_strings(&pos), ["g7g6"]);

    pos.undo().unwrap();
    assert!(!pos.is_in_check());
}

#[test]
fn test_legal_moves_never_leave_king_attacked() {
    for fen in FENS {
        let mut pos = Position::from_fen(fen).unwrap();
        let mover = pos.side_to_move();

        for mv in pos.legal_moves().to_vec() {
            pos.make(mv.from(), mv.to(), None, true).unwrap();
            let king = pos.king_square(mover);
            assert_eq!(pos.piece_at(king), Some(Piece::new(mover, PieceKind::King)));

            // Handing the move back to the mover must not let them capture the enemy King
            assert!(
                !pos.legal_moves().iter().any(|reply| reply.to() == king),
                "{fen}: {mv} leaves the King en prise"
            );
            pos.undo().unwrap();
        }
    }
}

#[test]
fn test_castling_round_trip() {
    let mut pos = Position::from_fen(FEN_KIWIPETE).unwrap();
    let before = pos.clone();

    assert_eq!(pos.apply(Square::E1, Square::G1, None), Ok(MoveKind::Castle));
    assert_eq!(pos.piece_at(Square::F1), Some(Piece::new(Color::White, PieceKind::Rook)));
    assert_eq!(pos.piece_at(Square::H1), None);
    assert_eq!(pos.king_square(Color::White), Square::G1);
    assert_eq!(pos.castling_rights().to_string(), "kq");

    assert_eq!(pos.apply(Square::E8, Square::C8, None), Ok(MoveKind::Castle));
    assert_eq!(pos.piece_at(Square::D8), Some(Piece::new(Color::Black, PieceKind::Rook)));
    assert_eq!(pos.piece_at(Square::A8), None);
    assert_eq!(pos.castling_rights(), CastlingRights::NONE);

    pos.undo().unwrap();
    pos.undo().unwrap();
    assert_eq!(pos, before);
}

#[test]
fn test_no_castling_out_of_check() {
    let pos = Position::from_fen("4k3/8/8/8/8/8/8/R3K2r w Q - 0 1").unwrap();
    assert!(pos.is_in_check());
    assert!(!pos.legal_moves().contains(&LegalMove::new(Square::E1, Square::C1)));
}

#[test]
fn test_en_passant_lifecycle() {
    let mut pos = Position::startpos();
    play(&mut pos, &["e2e4", "a7a6", "e4e5", "d7d5"]);
    assert_eq!(pos.ep_square(), Some(sq("d6")));

    let before = pos.clone();
    assert_eq!(pos.apply(sq("e5"), sq("d6"), None), Ok(MoveKind::EnPassant));
    assert_eq!(pos.piece_at(sq("d5")), None);
    assert_eq!(pos.piece_at(sq("d6")), Some(Piece::new(Color::White, PieceKind::Pawn)));
    assert_eq!(pos.history().last().unwrap().captured(), Some(PieceKind::Pawn));
    assert_eq!(pos.ep_square(), None);

    pos.undo().unwrap();
    assert_eq!(pos, before);
    assert_eq!(pos.piece_at(sq("d5")), Some(Piece::new(Color::Black, PieceKind::Pawn)));

    // Declining the capture forfeits it
    play(&mut pos, &["g1f3", "h7h6"]);
    assert!(!pos.legal_moves().contains(&LegalMove::new(sq("e5"), sq("d6"))));
}

#[test]
fn test_underpromotion_round_trip() {
    let mut pos = Position::from_fen("8/P7/8/8/8/8/8/k1K5 w - - 0 1").unwrap();
    let before = pos.clone();

    assert_eq!(
        pos.apply(sq("a7"), Square::A8, Some(PieceKind::Knight)),
        Ok(MoveKind::Promotion(PieceKind::Knight))
    );
    assert_eq!(pos.piece_at(Square::A8), Some(Piece::new(Color::White, PieceKind::Knight)));
    assert_eq!(pos.history()[0].notation(), "a7a8N");

    pos.undo().unwrap();
    assert_eq!(pos, before);
    assert_eq!(pos.piece_at(sq("a7")), Some(Piece::new(Color::White, PieceKind::Pawn)));
}

#[test]
fn test_checkmate_and_stalemate() {
    let mut pos = Position::from_fen("6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1").unwrap();
    assert_eq!(pos.winner(), None);

    pos.apply(Square::A1, Square::A8, None).unwrap();
    assert!(pos.is_in_check());
    assert_eq!(pos.game_end_state(), GameState::Checkmate);
    assert_eq!(pos.winner(), Some(Color::White));
    assert!(pos.legal_moves().is_empty());

    let pos = Position::from_fen("k7/2Q5/1K6/8/8/8/8/8 b - - 0 1").unwrap();
    assert!(!pos.is_in_check());
    assert_eq!(pos.game_end_state(), GameState::Stalemate);
    assert_eq!(pos.winner(), None);
}

#[test]
fn test_errors_leave_position_untouched() {
    let mut pos = Position::startpos();
    let before = pos.clone();

    assert_eq!(pos.undo(), Err(PositionError::EmptyHistory));
    assert_eq!(
        pos.apply(Square::E1, Square::G1, None),
        Err(PositionError::IllegalMove { from: Square::E1, to: Square::G1 })
    );
    assert_eq!(
        pos.make(sq("e4"), sq("e5"), None, false),
        Err(PositionError::IllegalMove { from: sq("e4"), to: sq("e5") })
    );
    assert_eq!(pos.perft(-3), Err(PositionError::InvalidDepth(-3)));
    assert_eq!(pos.divide(-1), Err(PositionError::InvalidDepth(-1)));
    assert_eq!(pos, before);

    let mut pos = Position::from_fen("8/P7/8/8/8/8/8/k1K5 w - - 0 1").unwrap();
    assert_eq!(
        pos.apply(sq("a7"), Square::A8, Some(PieceKind::King)),
        Err(PositionError::InvalidPromotion(PieceKind::King))
    );
    assert!(pos.history().is_empty());
}

#[test]
fn test_legal_moves_are_cached() {
    let mut pos = Position::from_fen(FEN_KIWIPETE).unwrap();
    let first = pos.legal_moves().to_vec();
    assert_eq!(pos.legal_moves(), first.as_slice());

    pos.perft(2).unwrap();
    assert_eq!(pos.legal_moves(), first.as_slice());

    pos.apply(Square::E1, Square::G1, None).unwrap();
    assert_ne!(pos.legal_moves(), first.as_slice());
    pos.undo().unwrap();
    assert_eq!(pos.legal_moves(), first.as_slice());
}
