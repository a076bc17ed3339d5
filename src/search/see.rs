//! Static exchange evaluation: the material outcome of a capture
//! sequence on one square, computed by the swap algorithm without any
//! tree search.

use crate::bitboard::BitboardExt;
use crate::board::{Board, Color, Piece};
use crate::moves::square_control::attackers_to;
use crate::moves::types::Move;
use crate::square::Square;

/// Exchange values; deliberately coarser than the evaluators (both
/// minors count 300) and with a king worth more than anything it could
/// ever win back.
#[inline(always)]
fn exchange_value(p: Piece) -> i32 {
    match p {
        Piece::Pawn => 100,
        Piece::Knight | Piece::Bishop => 300,
        Piece::Rook => 500,
        Piece::Queen => 900,
        Piece::King => 10_000,
    }
}

pub trait SeeExt {
    /// True iff the side to move comes out of the exchange on `mv.to()`
    /// at least `threshold` centipawns ahead.
    fn see_ge(&self, mv: Move, threshold: i32) -> bool;
}

impl SeeExt for Board {
    fn see_ge(&self, mv: Move, threshold: i32) -> bool {
        let to = mv.to();
        let from = mv.from();

        // First capture: the en passant victim sits one rank behind the
        // destination, every other victim sits on it.
        let first_victim = if mv.is_en_passant() {
            Piece::Pawn
        } else {
            match self.piece_type_at(to) {
                Some(p) => p,
                None => return threshold <= 0, // quiet move: nothing to win
            }
        };

        let mut value = exchange_value(first_victim);
        if let Some(promo) = mv.promotion_piece() {
            value += exchange_value(promo) - exchange_value(Piece::Pawn);
        }
        if value < threshold {
            return false;
        }

        // The piece now standing on the square is what the opponent can
        // win next; a promotion leaves the promoted piece, not the pawn.
        let mut next_victim = match mv.promotion_piece() {
            Some(p) => p,
            None => self
                .piece_type_at(from)
                .expect("see_ge from an empty square"),
        };

        let mut gain = [0i32; 32];
        let mut d = 0;
        gain[d] = value;

        let mut occupancy = self.occupied() & !from.bb();
        if mv.is_en_passant() {
            let cap_idx = if self.side_to_move == Color::White {
                to.index() - 8
            } else {
                to.index() + 8
            };
            occupancy &= !(1u64 << cap_idx);
        }

        let mut attackers = attackers_to(self, to, occupancy) & occupancy;
        let mut side = self.side_to_move.opposite();

        loop {
            d += 1;
            let attacker_sq = least_valuable_attacker(self, attackers, side);
            let Some(attacker_sq) = attacker_sq else {
                break;
            };

            attackers &= !attacker_sq.bb();
            occupancy &= !attacker_sq.bb();

            // Capturing can reveal an x-ray attacker behind the capturer.
            if matches!(next_victim, Piece::Pawn | Piece::Bishop | Piece::Rook | Piece::Queen) {
                attackers = attackers_to(self, to, occupancy) & occupancy;
            }

            if d >= 31 {
                break;
            }

            gain[d] = exchange_value(next_victim) - gain[d - 1];
            next_victim = self
                .piece_type_at(attacker_sq)
                .expect("attacker without a piece");
            side = side.opposite();
        }

        // Minimax back-propagation over the gain ladder.
        while d > 1 {
            d -= 1;
            gain[d - 1] = -std::cmp::max(-gain[d - 1], gain[d]);
        }
        gain[0] >= threshold
    }
}

/// Least-valued attacker of `side` among `attackers`, if any.
fn least_valuable_attacker(board: &Board, attackers: u64, side: Color) -> Option<Square> {
    let side_attackers = attackers & board.occupancy(side);
    if side_attackers == 0 {
        return None;
    }
    for piece in [
        Piece::Pawn,
        Piece::Knight,
        Piece::Bishop,
        Piece::Rook,
        Piece::Queen,
        Piece::King,
    ] {
        let subset = side_attackers & board.pieces(piece, side);
        if subset != 0 {
            return Some(Square::from_index(subset.lsb()));
        }
    }
    None
}
