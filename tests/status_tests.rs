//! Game-status classification.

use maxim::board::Board;
use maxim::status::{position_status, GameStatus};
use std::str::FromStr;

#[test]
fn fresh_game_is_in_play() {
    let board = Board::new();
    assert_eq!(position_status(&board), GameStatus::InPlay);
}

#[test]
fn back_rank_mate_is_checkmate() {
    let board = Board::from_str("4R1k1/5ppp/8/8/8/8/8/6K1 b - - 0 1").unwrap();
    assert_eq!(position_status(&board), GameStatus::Checkmate);
}

#[test]
fn smothered_corner_is_checkmate() {
    // Knight mate with the king boxed in by its own pieces.
    let board = Board::from_str("6rk/5Npp/8/8/8/8/8/6K1 b - - 0 1").unwrap();
    assert_eq!(position_status(&board), GameStatus::Checkmate);
}

#[test]
fn no_moves_without_check_is_stalemate() {
    let board = Board::from_str("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
    assert_eq!(position_status(&board), GameStatus::Stalemate);
}

#[test]
fn check_with_escape_is_in_play() {
    let board = Board::from_str("4R1k1/6pp/8/8/8/8/8/6K1 b - - 0 1").unwrap();
    assert_eq!(position_status(&board), GameStatus::InPlay);
}

#[test]
fn dead_position_beats_move_counting() {
    let board = Board::from_str("8/8/8/4k3/8/4K3/8/8 w - - 30 60").unwrap();
    assert_eq!(position_status(&board), GameStatus::DrawDeadPosition);
}

#[test]
fn claimable_draws_by_clock() {
    let hundred = Board::from_str("4k3/8/8/8/8/8/8/R3K3 w - - 100 80").unwrap();
    assert_eq!(position_status(&hundred), GameStatus::DrawFiftyMove);

    let one_fifty = Board::from_str("4k3/8/8/8/8/8/8/R3K3 w - - 150 110").unwrap();
    assert_eq!(position_status(&one_fifty), GameStatus::DrawSeventyFiveMove);
}
