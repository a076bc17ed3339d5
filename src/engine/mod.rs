//! The engine façade: one isolated instance per game or request.
//!
//! An `Engine` owns its position, transposition table, and evaluator;
//! nothing mutable is shared between instances, so any number of them
//! may run on different threads. The process-wide attack tables, ray
//! masks, and zobrist keys are immutable after first use and shared
//! read-only.

pub mod stateless;

use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::debug;

use crate::board::{Board, Color, Piece};
use crate::error::{ConfigError, FenError};
use crate::eval::{
    ClassicalEvaluator, Evaluator, MaterialEvaluator, ParametricWeights, TuringEvaluator,
};
use crate::moves::execute::{generate_legal, make_move};
use crate::moves::types::{Move, MoveList};
use crate::rules::{RuleEvaluator, RuleSetConfig};
use crate::search::search::{search, Limits, SearchInfo};
use crate::search::tt::TranspositionTable;
use crate::square::Square;
use crate::status::{position_status, GameStatus};

const TT_SIZE_MB: usize = 64;

/// Four-valued game summary; `status::GameStatus` carries the detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOutcome {
    Ongoing,
    WhiteWin,
    BlackWin,
    Draw,
}

/// The installed evaluator. An enum rather than a bare trait object so
/// the configuration entry points can reach the concrete type without
/// downcasting.
enum EngineEvaluator {
    Material(MaterialEvaluator),
    Classical(ClassicalEvaluator),
    Turing(TuringEvaluator),
    Rule(RuleEvaluator),
}

impl EngineEvaluator {
    fn as_dyn(&mut self) -> &mut dyn Evaluator {
        match self {
            EngineEvaluator::Material(e) => e,
            EngineEvaluator::Classical(e) => e,
            EngineEvaluator::Turing(e) => e,
            EngineEvaluator::Rule(e) => e,
        }
    }
}

pub struct Engine {
    board: Board,
    tt: TranspositionTable,
    evaluator: EngineEvaluator,
    /// Weights for the parametric evaluator, kept across evaluator
    /// switches.
    parametric: ParametricWeights,
    info: SearchInfo,
    stop: Arc<AtomicBool>,
}

impl Default for Engine {
    fn default() -> Self {
        Engine::new()
    }
}

impl Engine {
    pub fn new() -> Self {
        Engine {
            board: Board::new(),
            tt: TranspositionTable::new(TT_SIZE_MB),
            evaluator: EngineEvaluator::Classical(ClassicalEvaluator::default()),
            parametric: ParametricWeights::default(),
            info: SearchInfo::default(),
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Reset to the starting position and clear all search state.
    pub fn new_game(&mut self) {
        self.board = Board::new();
        self.tt.clear();
        self.info = SearchInfo::default();
        self.stop.store(false, Ordering::Relaxed);
    }

    /// Load a FEN. Parsed into a scratch board first, so a malformed
    /// string leaves the engine position untouched.
    pub fn set_fen(&mut self, fen: &str) -> Result<(), FenError> {
        let board = Board::from_str(fen)?;
        self.board = board;
        Ok(())
    }

    pub fn get_fen(&self) -> String {
        self.board.to_fen()
    }

    pub fn set_start_pos(&mut self) {
        self.board = Board::new();
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Apply a long-algebraic move if it is legal. Returns false (and
    /// changes nothing) on a malformed string or an illegal move.
    pub fn make_move(&mut self, uci: &str) -> bool {
        match self.resolve_uci(uci) {
            Some(mv) => {
                make_move(&mut self.board, mv);
                true
            }
            None => false,
        }
    }

    /// Match a UCI string against the current legal moves.
    fn resolve_uci(&self, uci: &str) -> Option<Move> {
        if uci.len() < 4 || uci.len() > 5 {
            return None;
        }
        let from = Square::from_str(&uci[0..2]).ok()?;
        let to = Square::from_str(&uci[2..4]).ok()?;
        let promo = match uci.as_bytes().get(4) {
            None => None,
            Some(b'n') => Some(Piece::Knight),
            Some(b'b') => Some(Piece::Bishop),
            Some(b'r') => Some(Piece::Rook),
            Some(b'q') => Some(Piece::Queen),
            Some(_) => return None,
        };

        let mut legal = MoveList::new();
        let mut scratch = MoveList::new();
        generate_legal(&self.board, &mut legal, &mut scratch);
        legal
            .iter()
            .copied()
            .find(|mv| mv.from() == from && mv.to() == to && mv.promotion_piece() == promo)
    }

    /// Iterative-deepening search under the given limits; returns the
    /// best move as UCI, or "(none)" for a position with no legal moves.
    pub fn search_move(&mut self, depth: u32, time_ms: u64) -> String {
        self.stop.store(false, Ordering::Relaxed);
        let limits = Limits {
            max_depth: depth,
            max_millis: time_ms,
            ..Default::default()
        };

        let result = search(
            &mut self.board,
            self.evaluator.as_dyn(),
            &mut self.tt,
            &limits,
            Arc::clone(&self.stop),
        );
        self.info = result.info;

        if result.best_move.is_null() {
            "(none)".to_string()
        } else {
            result.best_move.to_uci()
        }
    }

    /// Info published by the last search's deepest completed iteration.
    pub fn get_info(&self) -> SearchInfo {
        self.info
    }

    pub fn game_status(&self) -> GameOutcome {
        match position_status(&self.board) {
            GameStatus::InPlay => GameOutcome::Ongoing,
            GameStatus::Checkmate => match self.board.side_to_move {
                Color::White => GameOutcome::BlackWin,
                Color::Black => GameOutcome::WhiteWin,
            },
            _ => GameOutcome::Draw,
        }
    }

    pub fn detailed_status(&self) -> GameStatus {
        position_status(&self.board)
    }

    /// Static evaluation from the side-to-move perspective.
    pub fn evaluate(&mut self) -> i32 {
        self.evaluator.as_dyn().evaluate(&self.board)
    }

    pub fn get_moves(&self) -> Vec<String> {
        let mut legal = MoveList::new();
        let mut scratch = MoveList::new();
        generate_legal(&self.board, &mut legal, &mut scratch);
        legal.iter().map(|mv| mv.to_uci()).collect()
    }

    /// Install a built-in evaluator by name: `material`,
    /// `classical-parametric`, `turing-like`, or `rule`.
    pub fn set_evaluator(&mut self, name: &str) -> Result<(), ConfigError> {
        match name {
            "material" => self.evaluator = EngineEvaluator::Material(MaterialEvaluator),
            "classical-parametric" | "classical" => {
                self.evaluator =
                    EngineEvaluator::Classical(ClassicalEvaluator::new(self.parametric.clone()))
            }
            "turing-like" | "turing" => self.evaluator = EngineEvaluator::Turing(TuringEvaluator),
            // An already-configured rule evaluator stays; otherwise an
            // empty one is installed until a configuration arrives.
            "rule" => {
                if !matches!(self.evaluator, EngineEvaluator::Rule(_)) {
                    self.evaluator = EngineEvaluator::Rule(RuleEvaluator::empty());
                }
            }
            other => {
                return Err(ConfigError::UnknownEvaluator {
                    name: other.to_string(),
                })
            }
        }
        debug!(evaluator = self.evaluator_name(), "evaluator installed");
        Ok(())
    }

    pub fn evaluator_name(&mut self) -> &'static str {
        self.evaluator.as_dyn().name()
    }

    /// Update the parametric evaluator's weights. Takes effect
    /// immediately if it is active, and on the next switch otherwise.
    pub fn configure_parametric(&mut self, weights: ParametricWeights) {
        self.parametric = weights.clone();
        if let EngineEvaluator::Classical(eval) = &mut self.evaluator {
            eval.configure(weights);
        }
    }

    /// Compile a rule configuration and install it atomically: on any
    /// error the previous evaluator stays active.
    pub fn configure_rule_evaluator(&mut self, config: &RuleSetConfig) -> Result<(), ConfigError> {
        let evaluator = RuleEvaluator::new(config)?;
        self.evaluator = EngineEvaluator::Rule(evaluator);
        debug!(rule_set = %config.name, "rule evaluator installed");
        Ok(())
    }

    /// Access the installed rule set (for enable/disable toggles and
    /// category weight updates), if the rule evaluator is active.
    pub fn rule_evaluator_mut(&mut self) -> Option<&mut RuleEvaluator> {
        match &mut self.evaluator {
            EngineEvaluator::Rule(rule) => Some(rule),
            _ => None,
        }
    }

    /// Request the current search stop at its next poll point.
    /// Idempotent and callable from any thread via `stop_handle`.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }
}
