//! Search behavior: decisive advantages, mates, determinism, limits.

use maxim::board::Board;
use maxim::engine::Engine;
use maxim::eval::MaterialEvaluator;
use maxim::search::search::{search, Limits};
use maxim::search::tt::TranspositionTable;
use maxim::search::{MATE_SCORE, MATE_THRESHOLD};
use std::str::FromStr;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

fn search_fen(fen: &str, depth: u32) -> (String, i32) {
    let mut board = Board::from_str(fen).unwrap();
    let mut evaluator = MaterialEvaluator;
    let mut tt = TranspositionTable::new(16);
    let result = search(
        &mut board,
        &mut evaluator,
        &mut tt,
        &Limits::depth(depth),
        Arc::new(AtomicBool::new(false)),
    );
    (result.best_move.to_uci(), result.score)
}

#[test]
fn rook_up_scores_decisively() {
    // A clean extra rook with no compensation must read as winning.
    let (mv, score) = search_fen("6k1/6pp/8/8/8/8/5PPP/4R1K1 w - - 0 1", 5);
    assert!(!mv.is_empty());
    assert!(score > 400, "expected > +400 cp, got {}", score);
}

#[test]
fn finds_back_rank_mate_in_one() {
    let (mv, score) = search_fen("6k1/5ppp/8/8/8/8/5PPP/4R1K1 w - - 0 1", 3);
    assert_eq!(mv, "e1e8");
    assert!(
        score > MATE_SCORE - 100,
        "expected a mate score, got {}",
        score
    );
}

#[test]
fn queen_corner_position_is_mating() {
    // Literal scenario: forced mate found by depth 3 with a mate score.
    let (_, score) = search_fen("8/8/8/8/8/5K2/6Q1/7k w - - 0 1", 3);
    assert!(
        score > MATE_SCORE - 100,
        "expected a mate score, got {}",
        score
    );
}

#[test]
fn finds_mate_in_two() {
    // Two-rook ladder: confine the king to the back rank, then mate.
    let (mv, score) = search_fen("4k3/8/8/8/8/8/1R6/R5K1 w - - 0 1", 4);
    assert!(!mv.is_empty());
    assert!(
        score > MATE_SCORE - 100,
        "expected a mate score, got {}",
        score
    );
}

#[test]
fn does_not_hang_mate() {
    // The shape scenario: White must keep the back rank covered.
    let (mv, score) = search_fen("6k1/5ppp/8/8/8/8/5PPP/R5K1 w - - 0 1", 3);
    assert!(!mv.is_empty());
    assert!(
        score > -MATE_THRESHOLD,
        "search thinks it is getting mated: {}",
        score
    );
}

#[test]
fn survives_the_two_rook_shape() {
    // At depth >= 5 the two-rook side must find a non-losing move.
    let (mv, score) = search_fen("7k/5ppp/8/8/8/8/8/R3K2R w KQ - 0 1", 5);
    assert!(!mv.is_empty());
    assert!(score > -100, "a winning position scored {}", score);
}

#[test]
fn search_is_deterministic_on_fresh_engines() {
    let fen = "r1bqkbnr/pppp1ppp/2n5/4p3/2B1P3/5N2/PPPP1PPP/RNBQK2R w KQkq - 4 4";
    let first = search_fen(fen, 4);
    let second = search_fen(fen, 4);
    assert_eq!(first, second);
}

#[test]
fn no_legal_moves_returns_null() {
    // Stalemate: the search has nothing to return.
    let mut board = Board::from_str("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
    let mut evaluator = MaterialEvaluator;
    let mut tt = TranspositionTable::new(4);
    let result = search(
        &mut board,
        &mut evaluator,
        &mut tt,
        &Limits::depth(3),
        Arc::new(AtomicBool::new(false)),
    );
    assert!(result.best_move.is_null());
}

#[test]
fn pre_set_stop_returns_immediately() {
    let stop = Arc::new(AtomicBool::new(true));
    let mut board = Board::new();
    let mut evaluator = MaterialEvaluator;
    let mut tt = TranspositionTable::new(4);
    let result = search(&mut board, &mut evaluator, &mut tt, &Limits::depth(12), stop);
    // Nothing completed; the result is empty but well-formed.
    assert_eq!(result.info.depth, 0);
}

#[test]
fn time_budget_is_respected() {
    let mut engine = Engine::new();
    engine.new_game();
    let start = std::time::Instant::now();
    let mv = engine.search_move(0, 250);
    let elapsed = start.elapsed().as_millis();
    assert_ne!(mv, "(none)");
    // Generous ceiling: the poll interval is 64 nodes.
    assert!(elapsed < 2000, "search ran {}ms on a 250ms budget", elapsed);
}

#[test]
fn search_info_is_published() {
    let mut engine = Engine::new();
    engine.new_game();
    engine.search_move(4, 0);
    let info = engine.get_info();
    assert_eq!(info.depth, 4);
    assert!(info.nodes > 0);
    assert!(info.sel_depth >= info.depth);
    assert!(!info.best_move.is_null());
}
