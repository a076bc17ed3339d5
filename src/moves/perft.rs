//! Perft: exhaustive legal move counting for move generator validation.

use crate::board::Board;
use crate::moves::execute::{generate_legal, make_move, unmake_move};
use crate::moves::types::{Move, MoveList};
use tracing::debug;

/// Count leaf nodes of the legal move tree to the given depth.
pub fn perft(board: &mut Board, depth: u32) -> u64 {
    if depth == 0 {
        return 1;
    }

    let mut moves = MoveList::new();
    let mut scratch = MoveList::new();
    generate_legal(board, &mut moves, &mut scratch);

    if depth == 1 {
        return moves.len() as u64;
    }

    let mut nodes = 0;
    for mv in moves.iter().copied() {
        let undo = make_move(board, mv);
        nodes += perft(board, depth - 1);
        unmake_move(board, undo);
    }
    nodes
}

/// Per-root-move node counts, for localizing generator disagreements.
pub fn perft_divide(board: &mut Board, depth: u32) -> Vec<(Move, u64)> {
    let mut moves = MoveList::new();
    let mut scratch = MoveList::new();
    generate_legal(board, &mut moves, &mut scratch);

    let mut results = Vec::with_capacity(moves.len());
    for mv in moves.iter().copied() {
        let undo = make_move(board, mv);
        let nodes = if depth <= 1 {
            1
        } else {
            perft(board, depth - 1)
        };
        unmake_move(board, undo);
        debug!(mv = %mv, nodes, "perft divide");
        results.push((mv, nodes));
    }
    results
}
