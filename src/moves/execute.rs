//! Make, unmake, and the non-mutating legality test.

use crate::board::castle_bits::*;
use crate::board::{Board, Color, Piece, EMPTY_SQ};
use crate::hash::zobrist::{ep_file_to_hash, xor_castling_rights_delta, zobrist_keys};
use crate::moves::king::KING_ATTACKS;
use crate::moves::knight::KNIGHT_ATTACKS;
use crate::moves::magic::tables;
use crate::moves::movegen::generate_pseudo_legal;
use crate::moves::pawn::{pawn_attacks, BLACK_PAWN_ATTACKS, WHITE_PAWN_ATTACKS};
use crate::moves::rays::{between, line};
use crate::moves::square_control::{
    compute_checkers, is_legal_castling, is_square_attacked_with_occ,
};
use crate::moves::types::{Move, MoveBuffer, MoveKind, NullUndo, Undo};
use crate::square::Square;
use crate::utils::pop_lsb;

/// Castling rook squares keyed by the king's destination.
#[inline(always)]
fn rook_castle_squares(king_to: u8) -> Option<(Square, Square)> {
    match king_to {
        6 => Some((Square::from_index(7), Square::from_index(5))), // White O-O
        2 => Some((Square::from_index(0), Square::from_index(3))), // White O-O-O
        62 => Some((Square::from_index(63), Square::from_index(61))), // Black O-O
        58 => Some((Square::from_index(56), Square::from_index(59))), // Black O-O-O
        _ => None,
    }
}

/// Castling rights cleared when a rook moves from, or is captured on, a
/// corner square. Applied to both ends of every move.
#[inline(always)]
fn rights_cleared_at(sq: u8) -> u8 {
    match sq {
        0 => CASTLE_WQ,
        7 => CASTLE_WK,
        56 => CASTLE_BQ,
        63 => CASTLE_BK,
        4 => CASTLE_WK | CASTLE_WQ,
        60 => CASTLE_BK | CASTLE_BQ,
        _ => 0,
    }
}

#[inline(always)]
fn remove_piece(board: &mut Board, color: Color, piece: Piece, idx: usize) {
    let new_bb = board.bb(color, piece) & !(1u64 << idx);
    board.set_bb(color, piece, new_bb);
}

#[inline(always)]
fn place_piece(board: &mut Board, color: Color, piece: Piece, idx: usize) {
    let new_bb = board.bb(color, piece) | (1u64 << idx);
    board.set_bb(color, piece, new_bb);
}

/// Apply a pseudo-legal move. The returned undo record snapshots every
/// irreversible field, so `unmake_move` restores the position exactly.
pub fn make_move(board: &mut Board, mv: Move) -> Undo {
    let color = board.side_to_move;
    let from_idx = mv.from().index() as usize;
    let to_idx = mv.to().index() as usize;
    let piece = board
        .piece_type_at(mv.from())
        .expect("make_move from an empty square");

    let mut undo = Undo {
        mv,
        piece,
        captured: None,
        prev_castling_rights: board.castling_rights,
        prev_en_passant: board.en_passant,
        prev_halfmove_clock: board.halfmove_clock,
        prev_fullmove_number: board.fullmove_number,
        prev_key: board.zobrist,
        prev_checkers: board.checkers,
    };

    // EP file leaves the hash before the square is cleared.
    if let Some(f) = ep_file_to_hash(board) {
        board.zobrist ^= zobrist_keys().ep_file[f as usize];
    }
    board.en_passant = None;

    // Captures, en passant included.
    if mv.kind() == MoveKind::EnPassant {
        let cap_idx = if color == Color::White {
            to_idx - 8
        } else {
            to_idx + 8
        };
        remove_piece(board, color.opposite(), Piece::Pawn, cap_idx);
        undo.captured = Some(Piece::Pawn);
    } else {
        let occupant = board.piece_on_sq[to_idx];
        if occupant != EMPTY_SQ {
            let cap_piece = Piece::from_u8(occupant & 0b111);
            remove_piece(board, color.opposite(), cap_piece, to_idx);
            undo.captured = Some(cap_piece);
        }
    }

    // Castling rights: one delta covering king moves, rook moves off a
    // corner, and rook captures on a corner.
    let old_rights = board.castling_rights;
    let mask_to_clear = rights_cleared_at(from_idx as u8) | rights_cleared_at(to_idx as u8);
    let new_rights = old_rights & !mask_to_clear;
    if new_rights != old_rights {
        board.castling_rights = new_rights;
        xor_castling_rights_delta(&mut board.zobrist, zobrist_keys(), old_rights, new_rights);
    }

    // Move the piece; promotions swap the pawn for the chosen piece.
    remove_piece(board, color, piece, from_idx);
    if let Some(promo) = mv.promotion_piece() {
        debug_assert_eq!(piece, Piece::Pawn, "only pawns promote");
        place_piece(board, color, promo, to_idx);
    } else {
        place_piece(board, color, piece, to_idx);
    }

    // Castling also moves the rook between its two fixed squares.
    if mv.kind() == MoveKind::Castling {
        let (rook_from, rook_to) =
            rook_castle_squares(to_idx as u8).expect("castling to a non-castle square");
        remove_piece(board, color, Piece::Rook, rook_from.index() as usize);
        place_piece(board, color, Piece::Rook, rook_to.index() as usize);
    }

    // Double push: record the ep square only when an enemy pawn could
    // actually capture on it, so keys stay stable under transpositions
    // that never realize the capture.
    if piece == Piece::Pawn && to_idx.abs_diff(from_idx) == 16 {
        let ep_idx = (from_idx + to_idx) / 2;
        let enemy_pawns = board.pieces(Piece::Pawn, color.opposite());
        if pawn_attacks(ep_idx as u8, color) & enemy_pawns != 0 {
            board.en_passant = Some(Square::from_index(ep_idx as u8));
        }
    }

    // Clocks.
    if undo.captured.is_some() || piece == Piece::Pawn {
        board.halfmove_clock = 0;
    } else {
        board.halfmove_clock = undo.prev_halfmove_clock + 1;
    }
    if color == Color::Black {
        board.fullmove_number = undo.prev_fullmove_number + 1;
    }

    // Flip side, then the new ep file (if any) enters the hash.
    board.side_to_move = color.opposite();
    board.zobrist ^= zobrist_keys().side_to_move;
    if let Some(f) = ep_file_to_hash(board) {
        board.zobrist ^= zobrist_keys().ep_file[f as usize];
    }

    board.checkers = compute_checkers(board);
    board.key_history.push(board.zobrist);

    #[cfg(all(debug_assertions, feature = "paranoid_hash"))]
    board.assert_hash();

    undo
}

/// Invert `make_move`. Piece mutations are reversed in the exact reverse
/// order; the irreversible fields come straight from the undo snapshot.
pub fn unmake_move(board: &mut Board, undo: Undo) {
    let mv = undo.mv;
    let color = board.side_to_move.opposite();
    let from_idx = mv.from().index() as usize;
    let to_idx = mv.to().index() as usize;

    // Un-promote / un-move.
    if let Some(promo) = mv.promotion_piece() {
        remove_piece(board, color, promo, to_idx);
        place_piece(board, color, Piece::Pawn, from_idx);
    } else {
        remove_piece(board, color, undo.piece, to_idx);
        place_piece(board, color, undo.piece, from_idx);
    }

    // Un-castle the rook.
    if mv.kind() == MoveKind::Castling {
        let (rook_from, rook_to) = rook_castle_squares(to_idx as u8).expect("bad castle undo");
        remove_piece(board, color, Piece::Rook, rook_to.index() as usize);
        place_piece(board, color, Piece::Rook, rook_from.index() as usize);
    }

    // Un-capture.
    if let Some(cap_piece) = undo.captured {
        let cap_idx = if mv.kind() == MoveKind::EnPassant {
            if color == Color::White {
                to_idx - 8
            } else {
                to_idx + 8
            }
        } else {
            to_idx
        };
        place_piece(board, color.opposite(), cap_piece, cap_idx);
    }

    // Snapshot restore for everything irreversible; the piece-key XORs
    // above are superseded by the saved key.
    board.side_to_move = color;
    board.castling_rights = undo.prev_castling_rights;
    board.en_passant = undo.prev_en_passant;
    board.halfmove_clock = undo.prev_halfmove_clock;
    board.fullmove_number = undo.prev_fullmove_number;
    board.zobrist = undo.prev_key;
    board.checkers = undo.prev_checkers;
    board.key_history.pop();

    #[cfg(all(debug_assertions, feature = "paranoid_hash"))]
    board.assert_hash();
}

/// Pass the move: flip side and clear ep, nothing else. Used by null-move
/// pruning.
pub fn make_null_move(board: &mut Board) -> NullUndo {
    let undo = NullUndo {
        prev_en_passant: board.en_passant,
        prev_halfmove_clock: board.halfmove_clock,
        prev_key: board.zobrist,
        prev_checkers: board.checkers,
    };

    if let Some(f) = ep_file_to_hash(board) {
        board.zobrist ^= zobrist_keys().ep_file[f as usize];
    }
    board.en_passant = None;

    board.side_to_move = board.side_to_move.opposite();
    board.zobrist ^= zobrist_keys().side_to_move;
    board.checkers = compute_checkers(board);
    board.key_history.push(board.zobrist);

    undo
}

pub fn unmake_null_move(board: &mut Board, undo: NullUndo) {
    board.side_to_move = board.side_to_move.opposite();
    board.en_passant = undo.prev_en_passant;
    board.halfmove_clock = undo.prev_halfmove_clock;
    board.zobrist = undo.prev_key;
    board.checkers = undo.prev_checkers;
    board.key_history.pop();
}

/// Is the piece on `from` pinned against its own king? True when lifting
/// it exposes the king to an enemy slider that `from` alone was blocking.
fn is_pinned(board: &Board, from: Square, ksq: Square, us: Color) -> bool {
    let them = us.opposite();
    if line(ksq, from) == 0 {
        return false; // not even aligned with the king
    }

    let occ_without = board.occupied() ^ from.bb();
    let t = tables();
    let rook_queens = board.pieces(Piece::Rook, them) | board.pieces(Piece::Queen, them);
    let bishop_queens = board.pieces(Piece::Bishop, them) | board.pieces(Piece::Queen, them);

    let mut snipers = (t.rook.get_attacks(ksq.index() as usize, occ_without) & rook_queens)
        | (t.bishop.get_attacks(ksq.index() as usize, occ_without) & bishop_queens);
    while snipers != 0 {
        let sniper = Square::from_index(pop_lsb(&mut snipers));
        if between(ksq, sniper) & from.bb() != 0 {
            return true;
        }
    }
    false
}

/// En passant needs a full simulation: two pawns leave the rank at once,
/// which can uncover a slider no other test sees.
fn ep_is_legal(board: &Board, mv: Move) -> bool {
    let us = board.side_to_move;
    let them = us.opposite();
    let ksq = board.king_square(us);
    let to_idx = mv.to().index() as usize;
    let cap_idx = if us == Color::White {
        to_idx - 8
    } else {
        to_idx + 8
    };
    let cap_bb = 1u64 << cap_idx;

    let occ = (board.occupied() ^ mv.from().bb() ^ cap_bb) | mv.to().bb();
    let kidx = ksq.index() as usize;
    let t = tables();

    let rook_queens = board.pieces(Piece::Rook, them) | board.pieces(Piece::Queen, them);
    if t.rook.get_attacks(kidx, occ) & rook_queens != 0 {
        return false;
    }
    let bishop_queens = board.pieces(Piece::Bishop, them) | board.pieces(Piece::Queen, them);
    if t.bishop.get_attacks(kidx, occ) & bishop_queens != 0 {
        return false;
    }
    // Non-sliders: only the captured pawn vanished.
    if KNIGHT_ATTACKS[kidx] & board.pieces(Piece::Knight, them) != 0 {
        return false;
    }
    let pawn_sources = match us {
        Color::White => BLACK_PAWN_ATTACKS[kidx],
        Color::Black => WHITE_PAWN_ATTACKS[kidx],
    };
    if pawn_sources & (board.pieces(Piece::Pawn, them) & !cap_bb & !mv.from().bb()) != 0 {
        return false;
    }
    if KING_ATTACKS[kidx] & board.pieces(Piece::King, them) != 0 {
        return false;
    }
    true
}

/// Decide legality of a pseudo-legal move without mutating the board.
pub fn is_legal(board: &Board, mv: Move) -> bool {
    let us = board.side_to_move;
    let them = us.opposite();

    if mv.kind() == MoveKind::Castling {
        return is_legal_castling(board, mv);
    }
    if mv.kind() == MoveKind::EnPassant {
        return ep_is_legal(board, mv);
    }

    let ksq = board.king_square(us);
    let piece = match board.piece_type_at(mv.from()) {
        Some(p) => p,
        None => return false,
    };

    if piece == Piece::King {
        // Destination must be safe with the king off its own square, so
        // sliders checking through it keep counting.
        let occ = board.occupied() ^ mv.from().bb();
        return !is_square_attacked_with_occ(board, mv.to(), them, occ);
    }

    let checkers = board.checkers;
    if checkers != 0 {
        if checkers.count_ones() > 1 {
            return false; // double check: only the king may move
        }
        let checker = Square::from_index(checkers.trailing_zeros() as u8);
        let evasions = between(ksq, checker) | checkers;
        if mv.to().bb() & evasions == 0 {
            return false;
        }
    }

    // Pinned pieces may only slide along the pin ray.
    if is_pinned(board, mv.from(), ksq, us) && line(ksq, mv.from()) & mv.to().bb() == 0 {
        return false;
    }

    true
}

/// Generate fully legal moves: pseudo-legal filtered through `is_legal`.
pub fn generate_legal(board: &Board, moves: &mut impl MoveBuffer, scratch: &mut impl MoveBuffer) {
    scratch.clear();
    generate_pseudo_legal(board, scratch);
    moves.clear();
    for mv in scratch.iter().copied() {
        if is_legal(board, mv) {
            moves.push(mv);
        }
    }
}
