//! Attack queries: who attacks a square, is a side in check, and the
//! attack-path legality of castling.

use crate::board::{Board, Color, Piece};
use crate::moves::king::KING_ATTACKS;
use crate::moves::knight::KNIGHT_ATTACKS;
use crate::moves::magic::tables;
use crate::moves::pawn::{pawn_attacks, BLACK_PAWN_ATTACKS, WHITE_PAWN_ATTACKS};
use crate::moves::types::Move;
use crate::square::Square;

/// Squares a piece of the given type and color attacks from `square`
/// with the given blockers.
pub fn attacks_from(piece: Piece, color: Color, square: u8, blockers: u64) -> u64 {
    let sq = square as usize;
    let t = tables();
    match piece {
        Piece::Pawn => pawn_attacks(square, color),
        Piece::Knight => KNIGHT_ATTACKS[sq],
        Piece::King => KING_ATTACKS[sq],
        Piece::Bishop => t.bishop.get_attacks(sq, blockers),
        Piece::Rook => t.rook.get_attacks(sq, blockers),
        Piece::Queen => t.queen_attacks(sq, blockers),
    }
}

/// All pieces of either color attacking `sq` under the given occupancy.
/// Type-dispatched reverse lookups; sliders honor `occ` for blocking.
pub fn attackers_to(board: &Board, sq: Square, occ: u64) -> u64 {
    let idx = sq.index() as usize;
    let t = tables();

    // A white pawn attacks sq exactly when a black pawn on sq would
    // attack the white pawn's square, and vice versa.
    let white_pawns = BLACK_PAWN_ATTACKS[idx] & board.pieces(Piece::Pawn, Color::White);
    let black_pawns = WHITE_PAWN_ATTACKS[idx] & board.pieces(Piece::Pawn, Color::Black);

    let knights = KNIGHT_ATTACKS[idx]
        & (board.pieces(Piece::Knight, Color::White) | board.pieces(Piece::Knight, Color::Black));
    let kings = KING_ATTACKS[idx]
        & (board.pieces(Piece::King, Color::White) | board.pieces(Piece::King, Color::Black));

    let bishop_queens = board.pieces(Piece::Bishop, Color::White)
        | board.pieces(Piece::Bishop, Color::Black)
        | board.pieces(Piece::Queen, Color::White)
        | board.pieces(Piece::Queen, Color::Black);
    let rook_queens = board.pieces(Piece::Rook, Color::White)
        | board.pieces(Piece::Rook, Color::Black)
        | board.pieces(Piece::Queen, Color::White)
        | board.pieces(Piece::Queen, Color::Black);

    let diag = t.bishop.get_attacks(idx, occ) & bishop_queens;
    let orth = t.rook.get_attacks(idx, occ) & rook_queens;

    white_pawns | black_pawns | knights | kings | diag | orth
}

/// Is `square` attacked by any piece of `attacker`, with an explicit
/// occupancy (used to test king destinations with the king lifted off).
pub fn is_square_attacked_with_occ(board: &Board, square: Square, attacker: Color, occ: u64) -> bool {
    let idx = square.index() as usize;
    let t = tables();

    let pawn_sources = match attacker {
        Color::White => BLACK_PAWN_ATTACKS[idx],
        Color::Black => WHITE_PAWN_ATTACKS[idx],
    };
    if pawn_sources & board.pieces(Piece::Pawn, attacker) != 0 {
        return true;
    }
    if KNIGHT_ATTACKS[idx] & board.pieces(Piece::Knight, attacker) != 0 {
        return true;
    }
    if KING_ATTACKS[idx] & board.pieces(Piece::King, attacker) != 0 {
        return true;
    }

    let rook_attacks = t.rook.get_attacks(idx, occ);
    if rook_attacks & board.pieces(Piece::Rook, attacker) != 0 {
        return true;
    }
    let bishop_attacks = t.bishop.get_attacks(idx, occ);
    if bishop_attacks & board.pieces(Piece::Bishop, attacker) != 0 {
        return true;
    }
    if (rook_attacks | bishop_attacks) & board.pieces(Piece::Queen, attacker) != 0 {
        return true;
    }

    false
}

#[inline(always)]
pub fn is_square_attacked(board: &Board, square: Square, attacker: Color) -> bool {
    is_square_attacked_with_occ(board, square, attacker, board.occupied())
}

/// Union of every square attacked by `color` under the current
/// occupancy. Own pieces do not block their own attacks from counting.
pub fn attack_union(board: &Board, color: Color) -> u64 {
    let occ = board.occupied();
    let mut union = 0u64;
    for piece in [
        Piece::Pawn,
        Piece::Knight,
        Piece::Bishop,
        Piece::Rook,
        Piece::Queen,
        Piece::King,
    ] {
        let mut bb = board.pieces(piece, color);
        while bb != 0 {
            let sq = crate::utils::pop_lsb(&mut bb);
            union |= attacks_from(piece, color, sq, occ);
        }
    }
    union
}

/// Enemy pieces giving check to the side to move. `Board` caches the
/// result; this is the recompute used after make/unmake and FEN load.
pub fn compute_checkers(board: &Board) -> u64 {
    let us = board.side_to_move;
    if board.pieces(Piece::King, us) == 0 {
        return 0; // test scaffolding positions without a king
    }
    let ksq = board.king_square(us);
    attackers_to(board, ksq, board.occupied()) & board.occupancy(us.opposite())
}

#[inline(always)]
pub fn in_check(board: &Board, side: Color) -> bool {
    if side == board.side_to_move {
        return board.checkers != 0;
    }
    let ksq = board.king_square(side);
    is_square_attacked(board, ksq, side.opposite())
}

/// Attack-path legality for a castling move: the king's start, transit,
/// and destination squares must all be safe. The empty-path requirement
/// is the generator's job.
pub fn is_legal_castling(board: &Board, mv: Move) -> bool {
    let color = board.side_to_move;

    if board.checkers != 0 {
        return false;
    }

    let (start, middle, end) = match (color, mv.to().index()) {
        (Color::White, 6) => (4u8, 5u8, 6u8),
        (Color::White, 2) => (4, 3, 2),
        (Color::Black, 62) => (60, 61, 62),
        (Color::Black, 58) => (60, 59, 58),
        _ => return false,
    };

    let opp = color.opposite();
    for &idx in &[start, middle, end] {
        if is_square_attacked(board, Square::from_index(idx), opp) {
            return false;
        }
    }

    true
}
