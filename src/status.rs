//! Game-status classification for a finished-or-not position.

use crate::board::{Board, Color, Piece};
use crate::moves::execute::generate_legal;
use crate::moves::types::MoveList;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    InPlay,
    DrawFivefold,
    DrawSeventyFiveMove,
    DrawThreefold,
    DrawFiftyMove,
    DrawDeadPosition,
    Stalemate,
    Checkmate,
}

pub fn is_draw_by_threefold(board: &Board) -> bool {
    board.is_threefold()
}

pub fn is_draw_by_fifty_move(board: &Board) -> bool {
    board.halfmove_clock >= 100
}

pub fn is_fivefold(board: &Board) -> bool {
    board.repetition_count() >= 5
}

pub fn is_seventyfive_move(board: &Board) -> bool {
    board.halfmove_clock >= 150
}

#[inline]
fn heavy_material(board: &Board) -> u64 {
    board.bb(Color::White, Piece::Pawn)
        | board.bb(Color::Black, Piece::Pawn)
        | board.bb(Color::White, Piece::Rook)
        | board.bb(Color::Black, Piece::Rook)
        | board.bb(Color::White, Piece::Queen)
        | board.bb(Color::Black, Piece::Queen)
}

/// The narrow material clause of the search's draw test: only the two
/// kings, or kings plus one minor piece. Anything richer keeps
/// searching, even shapes the dead-position analysis would call drawn.
pub fn is_bare_material(board: &Board) -> bool {
    if heavy_material(board) != 0 {
        return false;
    }
    let minors = board.bb(Color::White, Piece::Bishop)
        | board.bb(Color::White, Piece::Knight)
        | board.bb(Color::Black, Piece::Bishop)
        | board.bb(Color::Black, Piece::Knight);
    minors.count_ones() <= 1
}

/// Dead position: no sequence of legal moves can ever mate.
pub fn is_insufficient_material(board: &Board) -> bool {
    // Any pawn, rook, or queen means mating material exists.
    if heavy_material(board) != 0 {
        return false;
    }

    let wb = board.bb(Color::White, Piece::Bishop).count_ones();
    let wn = board.bb(Color::White, Piece::Knight).count_ones();
    let bb = board.bb(Color::Black, Piece::Bishop).count_ones();
    let bn = board.bb(Color::Black, Piece::Knight).count_ones();

    let w_minors = wb + wn;
    let b_minors = bb + bn;
    let total = w_minors + b_minors;

    // K vs K, or K vs K + one minor.
    if total <= 1 {
        return true;
    }

    if total == 2 {
        // KNN vs K cannot force mate; one minor each cannot either.
        if wn == 2 || bn == 2 {
            return true;
        }
        if w_minors == 1 && b_minors == 1 {
            return true;
        }
        // KBB vs K and KBN vs K can mate.
        return false;
    }

    // Three or more minors: mate is possible somewhere.
    false
}

/// Draw as the search sees it: fifty-move rule, bare material, or a
/// single earlier repetition inside the reversible window.
pub fn is_search_draw(board: &Board) -> bool {
    board.halfmove_clock >= 100 || is_bare_material(board) || board.is_repetition()
}

/// Classify the position, automatic draws first, then claimable draws,
/// then move-based outcomes.
pub fn position_status(board: &Board) -> GameStatus {
    let hmc = board.halfmove_clock;

    if board.repetition_count() >= 5 {
        return GameStatus::DrawFivefold;
    }
    if hmc >= 150 {
        return GameStatus::DrawSeventyFiveMove;
    }

    if is_insufficient_material(board) {
        return GameStatus::DrawDeadPosition;
    }

    if board.is_threefold() {
        return GameStatus::DrawThreefold;
    }
    if hmc >= 100 {
        return GameStatus::DrawFiftyMove;
    }

    let mut legal = MoveList::new();
    let mut scratch = MoveList::new();
    generate_legal(board, &mut legal, &mut scratch);
    if legal.is_empty() {
        if board.in_check() {
            GameStatus::Checkmate
        } else {
            GameStatus::Stalemate
        }
    } else {
        GameStatus::InPlay
    }
}
