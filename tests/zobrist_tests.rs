//! The incrementally maintained key must equal the from-scratch
//! recompute after every make and unmake, and the en passant file may
//! only contribute while a capture is actually possible.

use maxim::board::Board;
use maxim::moves::execute::{generate_legal, make_move, unmake_move};
use maxim::moves::types::MoveList;
use std::str::FromStr;

fn legal_moves(board: &Board) -> MoveList {
    let mut moves = MoveList::new();
    let mut scratch = MoveList::new();
    generate_legal(board, &mut moves, &mut scratch);
    moves
}

fn splitmix64(x: &mut u64) -> u64 {
    *x = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = *x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Walk a deterministic pseudo-random game, checking hash parity at
/// every step in both directions.
fn random_walk(fen: &str, plies: usize, seed: u64) {
    let mut board = Board::from_str(fen).unwrap();
    let mut state = seed;
    let mut undos = Vec::new();

    for _ in 0..plies {
        let moves = legal_moves(&board);
        if moves.is_empty() {
            break;
        }
        let pick = (splitmix64(&mut state) as usize) % moves.len();
        let mv = moves[pick];

        undos.push(make_move(&mut board, mv));
        assert_eq!(
            board.zobrist,
            board.compute_zobrist_full(),
            "incremental key diverged after {} in {}",
            mv,
            fen
        );
    }

    while let Some(undo) = undos.pop() {
        unmake_move(&mut board, undo);
        assert_eq!(
            board.zobrist,
            board.compute_zobrist_full(),
            "incremental key diverged on unmake in {}",
            fen
        );
    }
}

#[test]
fn hash_parity_from_start() {
    random_walk(
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
        120,
        0xC0FF_EE00,
    );
}

#[test]
fn hash_parity_from_kiwipete() {
    random_walk(
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        120,
        0xBEEF,
    );
}

#[test]
fn hash_parity_through_promotions() {
    random_walk("r3k3/1P6/8/8/8/8/6p1/4K2R w K - 0 1", 60, 0x1234);
}

#[test]
fn ep_square_without_capturer_does_not_hash() {
    // A lone double push no enemy pawn can take: the ep file must not
    // enter the key, so the position transposes with the slow route.
    let mut fast = Board::from_str("4k3/8/8/8/8/8/P7/4K3 w - - 0 1").unwrap();
    let mv = legal_moves(&fast)
        .into_iter()
        .find(|m| m.to_uci() == "a2a4")
        .unwrap();
    make_move(&mut fast, mv);

    let slow = Board::from_str("4k3/8/8/8/P7/8/8/4K3 b - - 0 1").unwrap();
    assert_eq!(fast.zobrist, slow.zobrist);
}

#[test]
fn ep_square_with_capturer_does_hash() {
    // Black pawn on b4 can take a3 ep: the keys must differ.
    let mut fast = Board::from_str("4k3/8/8/8/1p6/8/P7/4K3 w - - 0 1").unwrap();
    let mv = legal_moves(&fast)
        .into_iter()
        .find(|m| m.to_uci() == "a2a4")
        .unwrap();
    make_move(&mut fast, mv);

    let without_ep = Board::from_str("4k3/8/8/8/Pp6/8/8/4K3 b - - 0 1").unwrap();
    assert_ne!(fast.zobrist, without_ep.zobrist);
}

#[test]
fn side_to_move_flips_the_key() {
    let white = Board::from_str("4k3/8/8/8/8/8/8/4K3 w - - 0 1").unwrap();
    let black = Board::from_str("4k3/8/8/8/8/8/8/4K3 b - - 0 1").unwrap();
    assert_ne!(white.zobrist, black.zobrist);
}

#[test]
fn castling_rights_change_the_key() {
    let all = Board::from_str("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
    let none = Board::from_str("r3k2r/8/8/8/8/8/8/R3K2R w - - 0 1").unwrap();
    assert_ne!(all.zobrist, none.zobrist);
}
