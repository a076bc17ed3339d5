//! A Turing-style evaluator in the spirit of the 1948 paper machine:
//! material first, then square roots of mobility and protection, a king
//! exposure penalty, and small positional nudges.

use crate::board::{Board, Color, Piece};
use crate::eval::pawns::advancement;
use crate::eval::{castle_state, CastleState, Evaluator};
use crate::moves::magic::tables;
use crate::moves::square_control::{attack_union, attacks_from};
use crate::utils::pop_lsb;

#[derive(Debug, Default, Clone)]
pub struct TuringEvaluator;

impl TuringEvaluator {
    fn score_side(&self, board: &Board, color: Color) -> f64 {
        let them = color.opposite();
        let occ = board.occupied();
        let own_occ = board.occupancy(color);
        let mut score = 0.0;

        // Material.
        for piece in [Piece::Pawn, Piece::Knight, Piece::Bishop, Piece::Rook, Piece::Queen] {
            score += piece.value() as f64 * board.pieces(piece, color).count_ones() as f64;
        }

        let defended = attack_union(board, color);

        // Mobility and protection, both square-rooted so the first few
        // moves matter more than the twentieth.
        for piece in [Piece::Knight, Piece::Bishop, Piece::Rook, Piece::Queen] {
            let mut bb = board.pieces(piece, color);
            while bb != 0 {
                let sq = pop_lsb(&mut bb);
                let moves = (attacks_from(piece, color, sq, occ) & !own_occ).count_ones();
                score += 10.0 * (moves as f64).sqrt();
                if defended & (1u64 << sq) != 0 {
                    score += 15.0;
                }
            }
        }

        // King exposure: the mobility a queen would enjoy from the king
        // square, square-rooted, as a penalty.
        if board.pieces(Piece::King, color) != 0 {
            let ksq = board.king_square(color);
            let queen_moves =
                (tables().queen_attacks(ksq.index() as usize, occ) & !own_occ).count_ones();
            score -= 10.0 * (queen_moves as f64).sqrt();
        }

        // Pawn advancement, plus a nudge for defended pawns.
        let mut pawns = board.pieces(Piece::Pawn, color);
        while pawns != 0 {
            let sq = pop_lsb(&mut pawns);
            score += 3.0 * advancement(sq, color) as f64;
            if defended & (1u64 << sq) != 0 {
                score += 2.0;
            }
        }

        // Castling kept its bonus in Turing's scheme too.
        if castle_state(board, color) != CastleState::NotCastled {
            score += 30.0;
        }

        // Giving check is worth a nudge.
        if board.pieces(Piece::King, them) != 0 {
            let their_king = board.king_square(them);
            if defended & their_king.bb() != 0 {
                score += 20.0;
            }
        }

        score
    }
}

impl Evaluator for TuringEvaluator {
    fn name(&self) -> &'static str {
        "turing-like"
    }

    fn evaluate(&mut self, board: &Board) -> i32 {
        let us = board.side_to_move;
        let score = self.score_side(board, us) - self.score_side(board, us.opposite());
        score.round() as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_position_is_balanced() {
        let board = Board::new();
        assert_eq!(TuringEvaluator.evaluate(&board), 0);
    }

    #[test]
    fn extra_queen_decides() {
        use std::str::FromStr;
        let board = Board::from_str("7k/8/8/8/8/8/6Q1/6K1 w - - 0 1").unwrap();
        assert!(TuringEvaluator.evaluate(&board) > 800);
    }
}
