//! Staged move picker: lazy generation and ordering.
//!
//! Moves come out in stages — TT move, good captures by MVV-LVA, the two
//! killers, history-ordered quiets, then SEE-losing captures — and later
//! stages are never generated if an earlier move already cut off.

use crate::board::{Board, Color, Piece};
use crate::moves::execute::is_legal;
use crate::moves::king::KING_ATTACKS;
use crate::moves::knight::KNIGHT_ATTACKS;
use crate::moves::magic::tables;
use crate::moves::movegen::{generate_pseudo_legal_captures, generate_pseudo_legal_quiets};
use crate::moves::pawn::{BLACK_PAWN_ATTACKS, WHITE_PAWN_ATTACKS};
use crate::moves::types::{Move, MoveKind};
use crate::search::ordering::{mvv_lva_score, quiet_score};
use crate::search::see::SeeExt;
use arrayvec::ArrayVec;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    HashMove,
    GenerateCaptures,
    GoodCaptures,
    Killer1,
    Killer2,
    GenerateQuiets,
    Quiets,
    BadCaptures,
    Done,
}

pub struct MovePicker {
    stage: Stage,

    good_captures: ArrayVec<Move, 128>,
    bad_captures: ArrayVec<Move, 128>,
    quiets: ArrayVec<Move, 256>,

    good_capture_scores: ArrayVec<i32, 128>,
    quiet_scores: ArrayVec<i32, 256>,

    good_cap_idx: usize,
    quiet_idx: usize,
    bad_cap_idx: usize,

    hash_move: Move,
    killers: [Move; 2],

    /// Quiescence mode: skip killers and quiets.
    captures_only: bool,
}

impl MovePicker {
    pub fn new(hash_move: Move, killers: [Move; 2], captures_only: bool) -> Self {
        Self {
            stage: Stage::HashMove,
            good_captures: ArrayVec::new(),
            bad_captures: ArrayVec::new(),
            quiets: ArrayVec::new(),
            good_capture_scores: ArrayVec::new(),
            quiet_scores: ArrayVec::new(),
            good_cap_idx: 0,
            quiet_idx: 0,
            bad_cap_idx: 0,
            hash_move,
            killers,
            captures_only,
        }
    }

    #[inline]
    fn is_hash_move(&self, mv: Move) -> bool {
        !self.hash_move.is_null() && mv == self.hash_move
    }

    #[inline]
    fn is_killer(&self, mv: Move) -> bool {
        !mv.is_null() && (mv == self.killers[0] || mv == self.killers[1])
    }

    /// Generate captures once and split by SEE: winning or even
    /// exchanges go first, losing ones wait until after the quiets.
    fn generate_and_classify_captures(&mut self, board: &Board) {
        let mut captures: ArrayVec<Move, 128> = ArrayVec::new();
        generate_pseudo_legal_captures(board, &mut captures);

        for mv in captures {
            if self.is_hash_move(mv) {
                continue; // already tried
            }
            let score = mvv_lva_score(mv, board) + promotion_bonus(mv);
            if mv.is_promotion() || board.see_ge(mv, 0) {
                self.good_captures.push(mv);
                self.good_capture_scores.push(score);
            } else {
                self.bad_captures.push(mv);
            }
        }
    }

    fn generate_quiets(&mut self, board: &Board, history: &[[i32; 64]; 64]) {
        generate_pseudo_legal_quiets(board, &mut self.quiets);
        for mv in &self.quiets {
            self.quiet_scores.push(quiet_score(*mv, board, history));
        }
    }

    /// Selection sort step over the remaining good captures.
    fn pick_best_capture(&mut self) -> Option<Move> {
        if self.good_cap_idx >= self.good_captures.len() {
            return None;
        }
        let mut best_idx = self.good_cap_idx;
        for i in (self.good_cap_idx + 1)..self.good_captures.len() {
            if self.good_capture_scores[i] > self.good_capture_scores[best_idx] {
                best_idx = i;
            }
        }
        self.good_captures.swap(self.good_cap_idx, best_idx);
        self.good_capture_scores.swap(self.good_cap_idx, best_idx);
        let mv = self.good_captures[self.good_cap_idx];
        self.good_cap_idx += 1;
        Some(mv)
    }

    fn pick_best_quiet(&mut self) -> Option<Move> {
        if self.quiet_idx >= self.quiets.len() {
            return None;
        }
        let mut best_idx = self.quiet_idx;
        for i in (self.quiet_idx + 1)..self.quiets.len() {
            if self.quiet_scores[i] > self.quiet_scores[best_idx] {
                best_idx = i;
            }
        }
        self.quiets.swap(self.quiet_idx, best_idx);
        self.quiet_scores.swap(self.quiet_idx, best_idx);
        let mv = self.quiets[self.quiet_idx];
        self.quiet_idx += 1;
        Some(mv)
    }

    /// The next legal move, or None when exhausted. Loop-based so deep
    /// stages never recurse.
    pub fn next(&mut self, board: &Board, history: &[[i32; 64]; 64]) -> Option<Move> {
        loop {
            match self.stage {
                Stage::HashMove => {
                    self.stage = Stage::GenerateCaptures;
                    let hm = self.hash_move;
                    // The TT move may come from a key collision; it must
                    // survive full validation before being searched.
                    if !hm.is_null() && is_pseudo_legal(board, hm) && is_legal(board, hm) {
                        return Some(hm);
                    }
                }

                Stage::GenerateCaptures => {
                    self.generate_and_classify_captures(board);
                    self.stage = Stage::GoodCaptures;
                }

                Stage::GoodCaptures => {
                    while let Some(mv) = self.pick_best_capture() {
                        if is_legal(board, mv) {
                            return Some(mv);
                        }
                    }
                    self.stage = if self.captures_only {
                        Stage::BadCaptures
                    } else {
                        Stage::Killer1
                    };
                }

                Stage::Killer1 => {
                    self.stage = Stage::Killer2;
                    let k1 = self.killers[0];
                    if !k1.is_null()
                        && !self.is_hash_move(k1)
                        && is_pseudo_legal(board, k1)
                        && !k1.is_capture(board)
                        && is_legal(board, k1)
                    {
                        return Some(k1);
                    }
                }

                Stage::Killer2 => {
                    self.stage = Stage::GenerateQuiets;
                    let k2 = self.killers[1];
                    if !k2.is_null()
                        && k2 != self.killers[0]
                        && !self.is_hash_move(k2)
                        && is_pseudo_legal(board, k2)
                        && !k2.is_capture(board)
                        && is_legal(board, k2)
                    {
                        return Some(k2);
                    }
                }

                Stage::GenerateQuiets => {
                    self.generate_quiets(board, history);
                    self.stage = Stage::Quiets;
                }

                Stage::Quiets => {
                    while let Some(mv) = self.pick_best_quiet() {
                        if self.is_hash_move(mv) || self.is_killer(mv) {
                            continue; // already tried
                        }
                        if is_legal(board, mv) {
                            return Some(mv);
                        }
                    }
                    self.stage = Stage::BadCaptures;
                }

                Stage::BadCaptures => {
                    while self.bad_cap_idx < self.bad_captures.len() {
                        let mv = self.bad_captures[self.bad_cap_idx];
                        self.bad_cap_idx += 1;
                        if is_legal(board, mv) {
                            return Some(mv);
                        }
                    }
                    self.stage = Stage::Done;
                }

                Stage::Done => return None,
            }
        }
    }
}

#[inline(always)]
fn promotion_bonus(mv: Move) -> i32 {
    match mv.promotion_piece() {
        Some(p) => 10_000 + p.value(),
        None => 0,
    }
}

/// Would the move generator have produced this move here? Guards hash
/// and killer moves that may belong to a different position entirely.
pub fn is_pseudo_legal(board: &Board, mv: Move) -> bool {
    if mv.is_null() {
        return false;
    }
    let color = board.side_to_move;
    let from_idx = mv.from().index() as usize;
    let to_idx = mv.to().index() as usize;
    let to_bb = mv.to().bb();

    let piece = match board.piece_at(mv.from()) {
        Some((c, p)) if c == color => p,
        _ => return false,
    };

    if board.occupancy(color) & to_bb != 0 {
        return false;
    }
    if board.pieces(Piece::King, color.opposite()) & to_bb != 0 {
        return false;
    }

    let occ = board.occupied();
    let enemy = board.opponent_occupancy(color);
    let t = tables();

    match mv.kind() {
        MoveKind::Castling => {
            if piece != Piece::King {
                return false;
            }
            let (needs_right, path) = match (color, to_idx) {
                (Color::White, 6) => (board.has_kingside_castle(color), 0x0000_0000_0000_0060u64),
                (Color::White, 2) => (board.has_queenside_castle(color), 0x0000_0000_0000_000Eu64),
                (Color::Black, 62) => (board.has_kingside_castle(color), 0x6000_0000_0000_0000u64),
                (Color::Black, 58) => (board.has_queenside_castle(color), 0x0E00_0000_0000_0000u64),
                _ => return false,
            };
            let king_home = if color == Color::White { 4 } else { 60 };
            needs_right && from_idx == king_home && occ & path == 0 && !board.in_check()
        }

        MoveKind::EnPassant => {
            let cap_idx = if color == Color::White {
                to_idx.wrapping_sub(8)
            } else {
                to_idx + 8
            };
            piece == Piece::Pawn
                && board.en_passant == Some(mv.to())
                && pawn_attack_of(color, from_idx) & to_bb != 0
                && cap_idx < 64
                && board.pieces(Piece::Pawn, color.opposite()) & (1u64 << cap_idx) != 0
        }

        MoveKind::Promotion | MoveKind::Normal => {
            if mv.kind() == MoveKind::Promotion {
                if piece != Piece::Pawn {
                    return false;
                }
                let promo_rank = if color == Color::White { 7 } else { 0 };
                if mv.to().rank() != promo_rank {
                    return false;
                }
            }
            match piece {
                Piece::Pawn => {
                    if mv.kind() == MoveKind::Normal {
                        let last_rank = if color == Color::White { 7 } else { 0 };
                        if mv.to().rank() == last_rank {
                            return false; // must be flagged as a promotion
                        }
                    }
                    if enemy & to_bb != 0 {
                        return pawn_attack_of(color, from_idx) & to_bb != 0;
                    }
                    // Pushes: one step, or two from the starting rank.
                    let step: i32 = if color == Color::White { 8 } else { -8 };
                    let one = from_idx as i32 + step;
                    if to_idx as i32 == one {
                        return occ & to_bb == 0;
                    }
                    let start_rank = if color == Color::White { 1 } else { 6 };
                    to_idx as i32 == from_idx as i32 + 2 * step
                        && mv.from().rank() == start_rank
                        && occ & (1u64 << one) == 0
                        && occ & to_bb == 0
                }
                Piece::Knight => KNIGHT_ATTACKS[from_idx] & to_bb != 0,
                Piece::Bishop => t.bishop.get_attacks(from_idx, occ) & to_bb != 0,
                Piece::Rook => t.rook.get_attacks(from_idx, occ) & to_bb != 0,
                Piece::Queen => t.queen_attacks(from_idx, occ) & to_bb != 0,
                Piece::King => KING_ATTACKS[from_idx] & to_bb != 0,
            }
        }
    }
}

#[inline(always)]
fn pawn_attack_of(color: Color, sq: usize) -> u64 {
    match color {
        Color::White => WHITE_PAWN_ATTACKS[sq],
        Color::Black => BLACK_PAWN_ATTACKS[sq],
    }
}
