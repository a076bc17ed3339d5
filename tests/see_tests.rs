//! Static exchange evaluation against hand-computed exchanges.

use maxim::board::Board;
use maxim::moves::execute::generate_legal;
use maxim::moves::types::{Move, MoveList};
use maxim::search::see::SeeExt;
use maxim::square::Square;
use std::str::FromStr;

fn find_move(board: &Board, from: &str, to: &str) -> Move {
    let mut moves = MoveList::new();
    let mut scratch = MoveList::new();
    generate_legal(board, &mut moves, &mut scratch);

    let from = Square::from_str(from).unwrap();
    let to = Square::from_str(to).unwrap();
    moves
        .into_iter()
        .find(|m| m.from() == from && m.to() == to)
        .unwrap_or_else(|| panic!("move {}{} not legal in {}", from, to, board.to_fen()))
}

#[test]
fn two_piece_exchange_bounds() {
    // Rook takes a pawn defended by one rook: the attacker wins the
    // victim and loses itself. Gain = V_victim - V_attacker = -400.
    let board = Board::from_str("3r4/8/8/8/3p4/8/8/3RK3 w - - 0 1").unwrap();
    let mv = find_move(&board, "d1", "d4");

    assert!(board.see_ge(mv, -400), "exact break-even threshold");
    assert!(!board.see_ge(mv, -399), "one centipawn above must fail");
}

#[test]
fn undefended_victim_is_pure_profit() {
    let board = Board::from_str("8/8/8/8/3p4/8/8/3RK3 w - - 0 1").unwrap();
    let mv = find_move(&board, "d1", "d4");

    assert!(board.see_ge(mv, 100));
    assert!(!board.see_ge(mv, 101));
}

#[test]
fn losing_capture_fails_at_zero() {
    // Knight takes a pawn defended by the king: 100 - 300 = -200.
    let board = Board::from_str("8/8/8/4k3/3p4/8/4N3/3K4 w - - 0 1").unwrap();
    let mv = find_move(&board, "e2", "d4");

    assert!(!board.see_ge(mv, 0));
    assert!(board.see_ge(mv, -200));
    assert!(!board.see_ge(mv, -199));
}

#[test]
fn battery_capture_of_undefended_rook() {
    // Queen takes the a8 rook, rook backing her up; nothing recaptures.
    let board = Board::from_str("r6k/8/8/8/8/8/Q7/R6K w - - 0 1").unwrap();
    let mv = find_move(&board, "a2", "a8");

    assert!(board.see_ge(mv, 500));
    assert!(!board.see_ge(mv, 501));
}

#[test]
fn xray_attackers_and_defenders_both_count() {
    // Doubled rooks on both sides contest a pawn on d4. The exchange
    // runs RxP, rxR, Rxr, rxR: white trades two rooks for a rook and a
    // pawn, net -400, and the x-rayed rooks must all be seen.
    let board = Board::from_str("3r4/3r4/8/8/3p4/8/3R4/3RK3 w - - 0 1").unwrap();
    let mv = find_move(&board, "d2", "d4");

    assert!(board.see_ge(mv, -400));
    assert!(!board.see_ge(mv, -399));
}

#[test]
fn xray_attacker_turns_a_loss_into_a_win() {
    // A lone defender against doubled attackers: RxP, rxR, Rxr leaves
    // white a pawn up once the back rook is revealed.
    let board = Board::from_str("3r4/8/8/8/3p4/8/3R4/3RK3 w - - 0 1").unwrap();
    let mv = find_move(&board, "d2", "d4");

    assert!(board.see_ge(mv, 100));
    assert!(!board.see_ge(mv, 101));
}

#[test]
fn en_passant_victim_is_on_the_offset_square() {
    let board =
        Board::from_str("rnbqkbnr/ppppp1pp/8/4Pp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 1").unwrap();
    let mv = find_move(&board, "e5", "f6");

    // Pawn takes pawn, recaptured by the g7 pawn: net 0.
    assert!(board.see_ge(mv, 0));
    assert!(!board.see_ge(mv, 1));
}

#[test]
fn promotion_capture_counts_the_new_piece() {
    // a7xb8=Q: wins a rook and turns a pawn into a queen.
    let board = Board::from_str("1r6/P7/8/8/8/8/8/K6k w - - 0 1").unwrap();
    let mut moves = MoveList::new();
    let mut scratch = MoveList::new();
    generate_legal(&board, &mut moves, &mut scratch);
    let mv = moves
        .into_iter()
        .find(|m| m.to_uci() == "a7b8q")
        .expect("promotion capture available");

    assert!(board.see_ge(mv, 1000));
}

#[test]
fn quiet_move_threshold_pivots_at_zero() {
    let board = Board::from_str("4k3/8/8/8/8/8/4P3/4K3 w - - 0 1").unwrap();
    let mv = find_move(&board, "e2", "e3");

    assert!(board.see_ge(mv, 0));
    assert!(!board.see_ge(mv, 1));
}
