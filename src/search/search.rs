//! Iterative-deepening alpha-beta with quiescence, PVS, null-move
//! pruning, and late move reductions.

use crate::board::Board;
use crate::eval::Evaluator;
use crate::moves::execute::{make_move, make_null_move, unmake_move, unmake_null_move};
use crate::moves::types::Move;
use crate::search::context::{SearchContext, MAX_PLY};
use crate::search::picker::MovePicker;
use crate::search::see::SeeExt;
use crate::search::tt::{Bound, TranspositionTable};
use crate::status::is_search_draw;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

pub const INF: i32 = 32_000;
pub const MATE_SCORE: i32 = 31_000;
/// Scores beyond this are mate-in-N; they get ply-adjusted through the TT.
pub const MATE_THRESHOLD: i32 = MATE_SCORE - 1000;
const DRAW_SCORE: i32 = 0;

const DEFAULT_BUDGET_MS: u64 = 5000;
const MAX_DEPTH: u32 = 64;

// Quiescence may run this far past the iteration depth.
const QSEARCH_WINDOW: usize = 32;

// Null-move pruning.
const NMP_MIN_DEPTH: i32 = 3;

// Late move reductions.
const LMR_MIN_DEPTH: i32 = 2;
const LMR_MIN_MOVES: usize = 4;

/// Search limits. Both budgets zero and not infinite means the default
/// five-second budget.
#[derive(Debug, Clone, Copy, Default)]
pub struct Limits {
    pub max_depth: u32,
    pub max_millis: u64,
    /// Soft budget: no new iteration starts once it is predicted to
    /// overrun this. Zero means "same as max_millis".
    pub soft_millis: u64,
    pub infinite: bool,
}

impl Limits {
    pub fn depth(max_depth: u32) -> Self {
        Limits {
            max_depth,
            ..Default::default()
        }
    }

    pub fn millis(max_millis: u64) -> Self {
        Limits {
            max_millis,
            ..Default::default()
        }
    }

    fn effective(&self) -> (u32, Option<Duration>, Option<Duration>) {
        if self.infinite {
            return (MAX_DEPTH, None, None);
        }
        let depth = if self.max_depth > 0 {
            self.max_depth.min(MAX_DEPTH)
        } else {
            MAX_DEPTH
        };
        let hard_ms = if self.max_millis > 0 {
            Some(self.max_millis)
        } else if self.max_depth == 0 {
            Some(DEFAULT_BUDGET_MS)
        } else {
            None
        };
        let hard = hard_ms.map(Duration::from_millis);
        let soft = if self.soft_millis > 0 {
            Some(Duration::from_millis(self.soft_millis))
        } else {
            hard
        };
        (depth, hard, soft)
    }
}

/// Wall-clock budget plus the external stop flag, polled at node
/// granularity. Stopping is cooperative: the search unwinds at the next
/// poll and keeps its best-so-far.
pub struct TimeManager {
    pub start: Instant,
    allotted: Option<Duration>,
    stop: Arc<AtomicBool>,
    stopped: bool,
}

impl TimeManager {
    pub fn new(allotted: Option<Duration>, stop: Arc<AtomicBool>) -> Self {
        Self {
            start: Instant::now(),
            allotted,
            stop,
            stopped: false,
        }
    }

    #[inline(always)]
    pub fn check(&mut self) {
        if self.stopped {
            return;
        }
        if self.stop.load(Ordering::Relaxed) {
            self.stopped = true;
            return;
        }
        if let Some(limit) = self.allotted {
            if self.start.elapsed() >= limit {
                self.stopped = true;
            }
        }
    }

    #[inline(always)]
    pub fn stopped(&self) -> bool {
        self.stopped
    }

    #[inline(always)]
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

/// Per-iteration publication: what the engine reports after each
/// completed depth.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchInfo {
    pub depth: u32,
    pub sel_depth: u32,
    pub score: i32,
    pub nodes: u64,
    pub time_ms: u64,
    pub best_move: Move,
}

#[derive(Debug, Clone, Copy)]
pub struct SearchResult {
    pub best_move: Move,
    pub score: i32,
    pub info: SearchInfo,
}

/// Mate scores are stored relative to the storing node, not the root, so
/// a transposition found at a different ply still reads correctly.
#[inline]
fn score_to_tt(score: i32, ply: i32) -> i32 {
    if score >= MATE_THRESHOLD {
        score + ply
    } else if score <= -MATE_THRESHOLD {
        score - ply
    } else {
        score
    }
}

#[inline]
fn score_from_tt(score: i32, ply: i32) -> i32 {
    if score >= MATE_THRESHOLD {
        score - ply
    } else if score <= -MATE_THRESHOLD {
        score + ply
    } else {
        score
    }
}

#[allow(clippy::too_many_arguments)]
fn quiescence(
    board: &mut Board,
    evaluator: &mut dyn Evaluator,
    ctx: &mut SearchContext,
    ply: usize,
    mut alpha: i32,
    beta: i32,
    time: &mut TimeManager,
) -> i32 {
    // Poll before counting so a pre-set stop never searches a node.
    if ctx.nodes & 63 == 0 {
        time.check();
    }
    ctx.nodes += 1;
    ctx.observe_ply(ply);

    let stand_pat = evaluator.evaluate(board);
    if time.stopped() {
        return stand_pat;
    }

    // Selective-depth brake.
    let limit = (ctx.root_depth as usize + QSEARCH_WINDOW).min(MAX_PLY - 1);
    if ply >= limit {
        return stand_pat;
    }

    if stand_pat >= beta {
        return beta;
    }
    if stand_pat > alpha {
        alpha = stand_pat;
    }

    let mut picker = MovePicker::new(Move::NULL, [Move::NULL; 2], true);
    let empty_history = [[0i32; 64]; 64];

    while let Some(mv) = picker.next(board, &empty_history) {
        // Losing captures never stand a quiescence search; promotions
        // and en passant are exempt from the filter.
        if !mv.is_promotion() && !mv.is_en_passant() && !board.see_ge(mv, 0) {
            continue;
        }

        let undo = make_move(board, mv);
        let score = -quiescence(board, evaluator, ctx, ply + 1, -beta, -alpha, time);
        unmake_move(board, undo);

        if time.stopped() {
            return alpha;
        }
        if score >= beta {
            return beta;
        }
        if score > alpha {
            alpha = score;
        }
    }

    alpha
}

#[allow(clippy::too_many_arguments)]
fn alpha_beta(
    board: &mut Board,
    evaluator: &mut dyn Evaluator,
    ctx: &mut SearchContext,
    tt: &mut TranspositionTable,
    depth: i32,
    ply: usize,
    mut alpha: i32,
    beta: i32,
    time: &mut TimeManager,
) -> (i32, Move) {
    if ctx.nodes & 63 == 0 {
        time.check();
    }
    if time.stopped() {
        return (0, Move::NULL);
    }
    ctx.nodes += 1;
    ctx.observe_ply(ply);

    // Interior draws: repetition, fifty-move, bare material.
    if ply > 0 && is_search_draw(board) {
        return (DRAW_SCORE, Move::NULL);
    }

    let in_check_now = board.in_check();
    if depth <= 0 && !in_check_now {
        let score = quiescence(board, evaluator, ctx, ply, alpha, beta, time);
        return (score, Move::NULL);
    }

    // TT probe: a deep-enough entry whose bound proves a cut ends the
    // node; otherwise its move still improves ordering.
    let hash = board.zobrist;
    let mut hash_move = Move::NULL;
    if let Some(entry) = tt.probe(hash) {
        hash_move = entry.best_move;
        if ply > 0 && i32::from(entry.depth) >= depth {
            let tt_score = score_from_tt(entry.score as i32, ply as i32);
            match entry.flag {
                Bound::Exact => return (tt_score, entry.best_move),
                Bound::Lower if tt_score >= beta => return (tt_score, entry.best_move),
                Bound::Upper if tt_score <= alpha => return (tt_score, entry.best_move),
                _ => {}
            }
        }
    }

    // Escaping check is worth one extra ply.
    let extension = if in_check_now { 1 } else { 0 };

    // Null-move pruning: hand the opponent a free move; if the position
    // still fails high at reduced depth, it would have failed high
    // anyway. Skipped in check and without non-pawn material.
    if ply > 0
        && depth >= NMP_MIN_DEPTH
        && !in_check_now
        && beta.abs() < MATE_THRESHOLD
        && board.has_non_pawn_material(board.side_to_move)
        && evaluator.evaluate(board) >= beta
    {
        let r = if depth > 6 { 3 } else { 2 };
        let undo = make_null_move(board);
        let (val, _) = alpha_beta(
            board,
            evaluator,
            ctx,
            tt,
            depth - r - 1,
            ply + 1,
            -beta,
            -beta + 1,
            time,
        );
        unmake_null_move(board, undo);
        let score = -val;

        if score >= beta && !time.stopped() && score < MATE_THRESHOLD {
            return (beta, Move::NULL);
        }
    }

    let killers = if ply < MAX_PLY {
        ctx.killer_moves[ply]
    } else {
        [Move::NULL; 2]
    };
    let mut picker = MovePicker::new(hash_move, killers, false);

    let mut best_score = -INF;
    let mut best_move = Move::NULL;
    let original_alpha = alpha;
    let mut move_count: usize = 0;

    loop {
        let next = picker.next(board, &ctx.history);
        let Some(mv) = next else {
            break;
        };
        let is_quiet = !mv.is_capture(board) && !mv.is_promotion();

        let undo = make_move(board, mv);
        let mut score;

        if move_count == 0 {
            // The presumed principal move gets the full window.
            let (val, _) = alpha_beta(
                board,
                evaluator,
                ctx,
                tt,
                depth - 1 + extension,
                ply + 1,
                -beta,
                -alpha,
                time,
            );
            score = -val;
        } else {
            // Late quiet moves shrink first; a surprise re-searches.
            let mut reduction = 0;
            if depth > LMR_MIN_DEPTH && move_count > LMR_MIN_MOVES && is_quiet && !in_check_now {
                reduction = 1 + depth / 8 + (move_count as i32) / 20;
                if beta - alpha > 1 {
                    reduction -= 1; // PV nodes reduce less
                }
                reduction = reduction.clamp(0, depth - 2);
            }

            let (val, _) = alpha_beta(
                board,
                evaluator,
                ctx,
                tt,
                depth - 1 - reduction,
                ply + 1,
                -alpha - 1,
                -alpha,
                time,
            );
            score = -val;

            if score > alpha && reduction > 0 {
                let (val, _) = alpha_beta(
                    board,
                    evaluator,
                    ctx,
                    tt,
                    depth - 1,
                    ply + 1,
                    -alpha - 1,
                    -alpha,
                    time,
                );
                score = -val;
            }

            if score > alpha && score < beta {
                // PVS re-search with the full window.
                let (val, _) = alpha_beta(
                    board,
                    evaluator,
                    ctx,
                    tt,
                    depth - 1 + extension,
                    ply + 1,
                    -beta,
                    -alpha,
                    time,
                );
                score = -val;
            }
        }

        unmake_move(board, undo);
        move_count += 1;

        if time.stopped() {
            return (0, Move::NULL);
        }

        if score > best_score {
            best_score = score;
            best_move = mv;
            if score > alpha {
                alpha = score;
            }
            if score >= beta {
                tt.store(
                    hash,
                    mv,
                    score_to_tt(best_score, ply as i32),
                    depth.max(0) as u8,
                    Bound::Lower,
                );
                if is_quiet {
                    ctx.update_killer(ply, mv);
                    ctx.update_history(mv, depth);
                }
                return (best_score, mv);
            }
        }
    }

    // No legal moves: checkmate scored by distance, else stalemate.
    if move_count == 0 {
        if in_check_now {
            return (-MATE_SCORE + ply as i32, Move::NULL);
        }
        return (DRAW_SCORE, Move::NULL);
    }

    let flag = if best_score > original_alpha {
        Bound::Exact
    } else {
        Bound::Upper
    };
    tt.store(
        hash,
        best_move,
        score_to_tt(best_score, ply as i32),
        depth.max(0) as u8,
        flag,
    );

    (best_score, best_move)
}

/// Iterative deepening driver. Publishes one `SearchInfo` per completed
/// depth and returns the best move of the deepest completed iteration.
pub fn search(
    board: &mut Board,
    evaluator: &mut dyn Evaluator,
    tt: &mut TranspositionTable,
    limits: &Limits,
    stop: Arc<AtomicBool>,
) -> SearchResult {
    let (max_depth, hard, soft) = limits.effective();

    tt.new_search();
    let mut ctx = SearchContext::new();
    let mut time = TimeManager::new(hard, stop);

    let mut best_move = Move::NULL;
    let mut best_score = 0;
    let mut last_info = SearchInfo::default();
    let mut last_iter = Duration::from_millis(0);

    for depth in 1..=max_depth {
        // Predict whether the next iteration fits the soft budget; a
        // tactical position can triple the previous iteration's time.
        if depth > 1 {
            if let Some(limit) = soft {
                if time.elapsed() + last_iter * 3 > limit {
                    break;
                }
            }
        }

        let iter_start = Instant::now();
        ctx.age_history();
        ctx.root_depth = depth as i32;

        // Aspiration window around the previous score once the search is
        // stable; fail-highs and fail-lows reopen to the full window.
        let window = 50;
        let mut alpha = if depth > 4 { best_score - window } else { -INF };
        let mut beta = if depth > 4 { best_score + window } else { INF };

        let (score, mv) = loop {
            let (score, mv) = alpha_beta(
                board,
                evaluator,
                &mut ctx,
                tt,
                depth as i32,
                0,
                alpha,
                beta,
                &mut time,
            );
            if time.stopped() {
                break (score, mv);
            }
            if score <= alpha {
                alpha = -INF;
                continue;
            }
            if score >= beta {
                beta = INF;
                continue;
            }
            break (score, mv);
        };

        last_iter = iter_start.elapsed();

        // An interrupted iteration is untrustworthy; keep the last
        // completed result.
        if time.stopped() {
            break;
        }

        best_score = score;
        if !mv.is_null() {
            best_move = mv;
        }

        last_info = SearchInfo {
            depth,
            sel_depth: ctx.sel_depth,
            score: best_score,
            nodes: ctx.nodes,
            time_ms: time.elapsed().as_millis() as u64,
            best_move,
        };
        info!(
            depth,
            sel_depth = ctx.sel_depth,
            score = best_score,
            nodes = ctx.nodes,
            time_ms = last_info.time_ms,
            pv = %best_move,
            "iteration complete"
        );

        // A forced mate does not get better with depth.
        if best_score.abs() >= MATE_THRESHOLD {
            break;
        }
    }

    SearchResult {
        best_move,
        score: best_score,
        info: last_info,
    }
}
