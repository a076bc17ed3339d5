//! Shared per-evaluation scratch data for the rule executor.
//!
//! One evaluation touches each expensive bitboard artifact at most once:
//! attack sets, pawn-structure masks, and the game phase are computed on
//! first demand and reused by every rule that needs them. The buffers
//! live in the compiled rule set, so an evaluation allocates nothing.

use arrayvec::ArrayVec;

use crate::board::{Board, Color, Piece};
use crate::eval::pawns::{connected_mask, doubled_count, isolated_count, passed_mask};
use crate::moves::king::KING_ATTACKS;
use crate::moves::square_control::attacks_from;
use crate::rules::model::GamePhase;
use crate::utils::pop_lsb;

/// Per-piece attack list: (square, attack set). Sixteen covers any
/// promotion spree.
pub type PieceAttacks = ArrayVec<(u8, u64), 16>;

#[derive(Default, Debug)]
pub struct EvalScratch {
    piece_attacks: [[Option<PieceAttacks>; 6]; 2],
    attack_union: [Option<u64>; 2],
    passed: [Option<u64>; 2],
    connected: [Option<u64>; 2],
    doubled: [Option<u32>; 2],
    isolated: [Option<u32>; 2],
    phase: Option<GamePhase>,
    /// Per-category score accumulator, indexed by interned category id.
    pub categories: Vec<f64>,
}

impl EvalScratch {
    pub fn new(category_count: usize) -> Self {
        EvalScratch {
            categories: vec![0.0; category_count],
            ..Default::default()
        }
    }

    /// Drop all cached artifacts and zero the accumulators; called at
    /// the top of every evaluation.
    pub fn reset(&mut self) {
        for per_color in self.piece_attacks.iter_mut() {
            for slot in per_color.iter_mut() {
                *slot = None;
            }
        }
        self.attack_union = [None; 2];
        self.passed = [None; 2];
        self.connected = [None; 2];
        self.doubled = [None; 2];
        self.isolated = [None; 2];
        self.phase = None;
        for c in self.categories.iter_mut() {
            *c = 0.0;
        }
    }

    /// Attack set of every piece of one type, computed once per side.
    pub fn piece_attacks(&mut self, board: &Board, color: Color, piece: Piece) -> &PieceAttacks {
        let slot = &mut self.piece_attacks[color as usize][piece as usize];
        if slot.is_none() {
            let occ = board.occupied();
            let mut list = PieceAttacks::new();
            let mut bb = board.pieces(piece, color);
            while bb != 0 {
                let sq = pop_lsb(&mut bb);
                if list.try_push((sq, attacks_from(piece, color, sq, occ))).is_err() {
                    break;
                }
            }
            *slot = Some(list);
        }
        slot.as_ref().unwrap()
    }

    /// Union of everything one side attacks.
    pub fn attack_union(&mut self, board: &Board, color: Color) -> u64 {
        if let Some(cached) = self.attack_union[color as usize] {
            return cached;
        }
        let mut union = 0u64;
        for piece in [
            Piece::Pawn,
            Piece::Knight,
            Piece::Bishop,
            Piece::Rook,
            Piece::Queen,
            Piece::King,
        ] {
            for &(_, attacks) in self.piece_attacks(board, color, piece).iter() {
                union |= attacks;
            }
        }
        self.attack_union[color as usize] = Some(union);
        union
    }

    pub fn passed(&mut self, board: &Board, color: Color) -> u64 {
        *self.passed[color as usize].get_or_insert_with(|| {
            passed_mask(
                board.pieces(Piece::Pawn, color),
                board.pieces(Piece::Pawn, color.opposite()),
                color,
            )
        })
    }

    pub fn connected(&mut self, board: &Board, color: Color) -> u64 {
        *self.connected[color as usize]
            .get_or_insert_with(|| connected_mask(board.pieces(Piece::Pawn, color), color))
    }

    pub fn doubled(&mut self, board: &Board, color: Color) -> u32 {
        *self.doubled[color as usize]
            .get_or_insert_with(|| doubled_count(board.pieces(Piece::Pawn, color)))
    }

    pub fn isolated(&mut self, board: &Board, color: Color) -> u32 {
        *self.isolated[color as usize]
            .get_or_insert_with(|| isolated_count(board.pieces(Piece::Pawn, color)))
    }

    /// King zone: the king's square plus its neighborhood.
    pub fn king_zone(&self, board: &Board, color: Color) -> u64 {
        let king_bb = board.pieces(Piece::King, color);
        if king_bb == 0 {
            return 0;
        }
        let ksq = board.king_square(color);
        KING_ATTACKS[ksq.index() as usize] | ksq.bb()
    }

    /// Game phase from the summed non-pawn piece weights of both sides
    /// (knight 3, bishop 3, rook 5, queen 9).
    pub fn phase(&mut self, board: &Board) -> GamePhase {
        *self.phase.get_or_insert_with(|| {
            let mut weight = 0i32;
            for color in [Color::White, Color::Black] {
                weight += 3 * board.pieces(Piece::Knight, color).count_ones() as i32;
                weight += 3 * board.pieces(Piece::Bishop, color).count_ones() as i32;
                weight += 5 * board.pieces(Piece::Rook, color).count_ones() as i32;
                weight += 9 * board.pieces(Piece::Queen, color).count_ones() as i32;
            }
            if weight >= 50 {
                GamePhase::Opening
            } else if weight >= 30 {
                GamePhase::Middlegame
            } else if weight >= 10 {
                GamePhase::Endgame
            } else {
                GamePhase::LateEndgame
            }
        })
    }
}
