//! Pseudo-legal move generation. Callers filter through `is_legal`;
//! nothing generated here is illegal for any reason other than king
//! exposure (castling attack paths included, which `is_legal` owns).

use crate::bitboard::{RANK_1, RANK_2, RANK_7, RANK_8};
use crate::board::{Board, Color, Piece};
use crate::moves::king::KING_ATTACKS;
use crate::moves::knight::KNIGHT_ATTACKS;
use crate::moves::magic::tables;
use crate::moves::pawn::{BLACK_PAWN_ATTACKS, WHITE_PAWN_ATTACKS};
use crate::moves::types::{Move, MoveBuffer};
use crate::square::Square;
use crate::utils::pop_lsb;

// Squares that must be empty between king and rook.
const WHITE_KINGSIDE_BETWEEN: u64 = 0x0000_0000_0000_0060;
const WHITE_QUEENSIDE_BETWEEN: u64 = 0x0000_0000_0000_000E;
const BLACK_KINGSIDE_BETWEEN: u64 = 0x6000_0000_0000_0000;
const BLACK_QUEENSIDE_BETWEEN: u64 = 0x0E00_0000_0000_0000;

const PROMOS: [Piece; 4] = [Piece::Queen, Piece::Rook, Piece::Bishop, Piece::Knight];

#[inline(always)]
fn push_targets(from: u8, mut targets: u64, move_list: &mut impl MoveBuffer) {
    while targets != 0 {
        let to = pop_lsb(&mut targets);
        move_list.push(Move::new(Square::from_index(from), Square::from_index(to)));
    }
}

#[inline(always)]
fn kingside_between(color: Color) -> u64 {
    match color {
        Color::White => WHITE_KINGSIDE_BETWEEN,
        Color::Black => BLACK_KINGSIDE_BETWEEN,
    }
}

#[inline(always)]
fn queenside_between(color: Color) -> u64 {
    match color {
        Color::White => WHITE_QUEENSIDE_BETWEEN,
        Color::Black => BLACK_QUEENSIDE_BETWEEN,
    }
}

#[inline(always)]
fn pawn_attacks_of(color: Color, sq: usize) -> u64 {
    match color {
        Color::White => WHITE_PAWN_ATTACKS[sq],
        Color::Black => BLACK_PAWN_ATTACKS[sq],
    }
}

/// Knight, bishop, rook, queen: attack lookup intersected with a target
/// set. `allowed` is `!own` for full generation, `enemy` for captures,
/// `empty` for quiets.
fn generate_piece_moves(board: &Board, piece: Piece, allowed: u64, move_list: &mut impl MoveBuffer) {
    let color = board.side_to_move;
    let enemy_king = board.pieces(Piece::King, color.opposite());
    let blockers = board.occupied();
    let t = tables();

    let mut bb = board.pieces(piece, color);
    while bb != 0 {
        let from = pop_lsb(&mut bb);
        let attacks = match piece {
            Piece::Knight => KNIGHT_ATTACKS[from as usize],
            Piece::Bishop => t.bishop.get_attacks(from as usize, blockers),
            Piece::Rook => t.rook.get_attacks(from as usize, blockers),
            Piece::Queen => t.queen_attacks(from as usize, blockers),
            _ => unreachable!(),
        };
        push_targets(from, attacks & allowed & !enemy_king, move_list);
    }
}

fn generate_king_moves(board: &Board, allowed: u64, castles: bool, move_list: &mut impl MoveBuffer) {
    let color = board.side_to_move;
    let king_bb = board.pieces(Piece::King, color);
    if king_bb == 0 {
        return; // scaffolding positions without a king
    }

    let from = king_bb.trailing_zeros() as u8;
    let enemy_king = board.pieces(Piece::King, color.opposite());
    push_targets(from, KING_ATTACKS[from as usize] & allowed & !enemy_king, move_list);

    // Castling: generated only out of check with an empty path; the
    // attack-path test lives in is_legal.
    if !castles || board.in_check() {
        return;
    }
    let occ = board.occupied();
    if board.has_kingside_castle(color) && occ & kingside_between(color) == 0 {
        move_list.push(Move::castling(
            Square::from_index(from),
            Square::from_index(from + 2),
        ));
    }
    if board.has_queenside_castle(color) && occ & queenside_between(color) == 0 {
        move_list.push(Move::castling(
            Square::from_index(from),
            Square::from_index(from - 2),
        ));
    }
}

fn push_promotions(from: u8, to: u8, queen_only: bool, move_list: &mut impl MoveBuffer) {
    for &promo in PROMOS.iter() {
        move_list.push(Move::promotion(
            Square::from_index(from),
            Square::from_index(to),
            promo,
        ));
        if queen_only {
            break; // PROMOS starts with the queen
        }
    }
}

/// Pawn pushes, captures, promotions, and en passant.
/// `quiet_promos`: None = skip promotion pushes, Some(queen_only) otherwise.
fn generate_pawn_moves(
    board: &Board,
    pushes: bool,
    captures: bool,
    quiet_promos: Option<bool>,
    move_list: &mut impl MoveBuffer,
) {
    let color = board.side_to_move;
    let pawns = board.pieces(Piece::Pawn, color);
    let enemy_without_king =
        board.opponent_occupancy(color) & !board.pieces(Piece::King, color.opposite());
    let empty = !board.occupied();

    let (pre_promo_rank, promo_rank) = match color {
        Color::White => (RANK_7, RANK_8),
        Color::Black => (RANK_2, RANK_1),
    };

    if pushes {
        // Single pushes, excluding the promotion rank.
        let single = match color {
            Color::White => (pawns << 8) & empty & !promo_rank,
            Color::Black => (pawns >> 8) & empty & !promo_rank,
        };
        let mut bb = single;
        while bb != 0 {
            let to = pop_lsb(&mut bb);
            let from = match color {
                Color::White => to - 8,
                Color::Black => to + 8,
            };
            move_list.push(Move::new(Square::from_index(from), Square::from_index(to)));
        }

        // Double pushes, gated by the starting rank.
        let double = match color {
            Color::White => ((((pawns & RANK_2) << 8) & empty) << 8) & empty,
            Color::Black => ((((pawns & RANK_7) >> 8) & empty) >> 8) & empty,
        };
        let mut bb = double;
        while bb != 0 {
            let to = pop_lsb(&mut bb);
            let from = match color {
                Color::White => to - 16,
                Color::Black => to + 16,
            };
            move_list.push(Move::new(Square::from_index(from), Square::from_index(to)));
        }
    }

    if captures {
        // Non-promotion captures.
        let mut attackers = pawns & !pre_promo_rank;
        while attackers != 0 {
            let from = pop_lsb(&mut attackers);
            let mut t = pawn_attacks_of(color, from as usize) & enemy_without_king;
            while t != 0 {
                let to = pop_lsb(&mut t);
                move_list.push(Move::new(Square::from_index(from), Square::from_index(to)));
            }
        }

        // Promotion captures, all four choices.
        let mut promo_attackers = pawns & pre_promo_rank;
        while promo_attackers != 0 {
            let from = pop_lsb(&mut promo_attackers);
            let mut t = pawn_attacks_of(color, from as usize) & enemy_without_king & promo_rank;
            while t != 0 {
                let to = pop_lsb(&mut t);
                push_promotions(from, to, false, move_list);
            }
        }

        // En passant, sanity-checked pseudo-legal.
        if let Some(ep_sq) = board.en_passant {
            let ep = ep_sq.index();
            if empty & (1u64 << ep) != 0 {
                let cap_sq = match color {
                    Color::White => ep - 8,
                    Color::Black => ep + 8,
                };
                let enemy_pawns = board.pieces(Piece::Pawn, color.opposite());
                if enemy_pawns & (1u64 << cap_sq) != 0 {
                    let mut atk = pawns;
                    while atk != 0 {
                        let from = pop_lsb(&mut atk);
                        if pawn_attacks_of(color, from as usize) & (1u64 << ep) != 0 {
                            move_list.push(Move::en_passant(
                                Square::from_index(from),
                                Square::from_index(ep),
                            ));
                        }
                    }
                }
            }
        }
    }

    if let Some(queen_only) = quiet_promos {
        // Promotion pushes.
        let promo_pushes = match color {
            Color::White => ((pawns & pre_promo_rank) << 8) & empty,
            Color::Black => ((pawns & pre_promo_rank) >> 8) & empty,
        };
        let mut bb = promo_pushes;
        while bb != 0 {
            let to = pop_lsb(&mut bb);
            let from = match color {
                Color::White => to - 8,
                Color::Black => to + 8,
            };
            push_promotions(from, to, queen_only, move_list);
        }
    }
}

/// Generate all pseudo-legal moves for the side to move.
pub fn generate_pseudo_legal(board: &Board, moves: &mut impl MoveBuffer) {
    moves.clear();
    let own = board.occupancy(board.side_to_move);
    generate_pawn_moves(board, true, true, Some(false), moves);
    generate_piece_moves(board, Piece::Knight, !own, moves);
    generate_piece_moves(board, Piece::Bishop, !own, moves);
    generate_piece_moves(board, Piece::Rook, !own, moves);
    generate_piece_moves(board, Piece::Queen, !own, moves);
    generate_king_moves(board, !own, true, moves);
}

/// Captures-only mode for quiescence: every capture (promotion captures
/// in all four flavors) plus the queen promotion push. Under-promotion
/// pushes are the one thing left out.
pub fn generate_pseudo_legal_captures(board: &Board, moves: &mut impl MoveBuffer) {
    let enemy = board.opponent_occupancy(board.side_to_move);
    generate_pawn_moves(board, false, true, Some(true), moves);
    generate_piece_moves(board, Piece::Knight, enemy, moves);
    generate_piece_moves(board, Piece::Bishop, enemy, moves);
    generate_piece_moves(board, Piece::Rook, enemy, moves);
    generate_piece_moves(board, Piece::Queen, enemy, moves);
    generate_king_moves(board, enemy, false, moves);
}

/// Quiet moves only (for the staged picker): pushes, piece moves to
/// empty squares, castling. Excludes all promotions.
pub fn generate_pseudo_legal_quiets(board: &Board, moves: &mut impl MoveBuffer) {
    let empty = !board.occupied();
    generate_pawn_moves(board, true, false, None, moves);
    generate_piece_moves(board, Piece::Knight, empty, moves);
    generate_piece_moves(board, Piece::Bishop, empty, moves);
    generate_piece_moves(board, Piece::Rook, empty, moves);
    generate_piece_moves(board, Piece::Queen, empty, moves);
    generate_king_moves(board, empty, true, moves);
}
