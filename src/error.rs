//! Error types for the engine core.
//!
//! Parsing and configuration are validated at the edge and rejected
//! atomically; the evaluators and the search itself never fail, they
//! return structured results.

use std::fmt;

/// Error type for FEN parsing failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FenError {
    /// FEN string has too few fields (needs at least 4).
    TooFewFields { found: usize },
    /// Invalid piece character in the placement field.
    InvalidPiece { ch: char },
    /// A rank does not describe exactly 8 files.
    BadRankWidth { rank: usize, files: usize },
    /// The placement field does not describe exactly 8 ranks.
    BadRankCount { ranks: usize },
    /// Invalid side to move (must be 'w' or 'b').
    InvalidSideToMove { found: String },
    /// Invalid castling character.
    InvalidCastling { ch: char },
    /// Invalid en passant square.
    InvalidEnPassant { found: String },
    /// Halfmove or fullmove counter is not a number.
    InvalidCounter { found: String },
}

impl fmt::Display for FenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FenError::TooFewFields { found } => {
                write!(f, "FEN must have at least 4 fields, found {found}")
            }
            FenError::InvalidPiece { ch } => {
                write!(f, "invalid piece character '{ch}' in FEN")
            }
            FenError::BadRankWidth { rank, files } => {
                write!(f, "rank {rank} describes {files} files, expected 8")
            }
            FenError::BadRankCount { ranks } => {
                write!(f, "FEN placement has {ranks} ranks, expected 8")
            }
            FenError::InvalidSideToMove { found } => {
                write!(f, "invalid side to move '{found}', expected 'w' or 'b'")
            }
            FenError::InvalidCastling { ch } => {
                write!(f, "invalid castling character '{ch}' in FEN")
            }
            FenError::InvalidEnPassant { found } => {
                write!(f, "invalid en passant square '{found}'")
            }
            FenError::InvalidCounter { found } => {
                write!(f, "invalid move counter '{found}'")
            }
        }
    }
}

impl std::error::Error for FenError {}

/// Error type for long-algebraic (UCI) move parsing failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveParseError {
    /// Move string has invalid length (must be 4-5 characters).
    InvalidLength { len: usize },
    /// Invalid square notation in the move.
    InvalidSquare { notation: String },
    /// Invalid promotion character (must be one of n, b, r, q).
    InvalidPromotion { ch: char },
}

impl fmt::Display for MoveParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveParseError::InvalidLength { len } => {
                write!(f, "move must be 4-5 characters, got {len}")
            }
            MoveParseError::InvalidSquare { notation } => {
                write!(f, "invalid square '{notation}'")
            }
            MoveParseError::InvalidPromotion { ch } => {
                write!(f, "invalid promotion piece '{ch}'")
            }
        }
    }
}

impl std::error::Error for MoveParseError {}

/// Error type for rule-evaluator configuration failures. Reported at
/// configure time; the previously installed evaluator stays active.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// The configuration JSON did not deserialize (unknown `type` tags,
    /// missing fields, wrong shapes).
    Malformed { detail: String },
    /// A formula expression failed to parse.
    BadFormula { rule_id: String, detail: String },
    /// A rule references something the engine cannot resolve.
    BadRule { rule_id: String, detail: String },
    /// Unknown evaluator name passed to `set_evaluator`.
    UnknownEvaluator { name: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Malformed { detail } => {
                write!(f, "malformed rule configuration: {detail}")
            }
            ConfigError::BadFormula { rule_id, detail } => {
                write!(f, "rule '{rule_id}': bad formula: {detail}")
            }
            ConfigError::BadRule { rule_id, detail } => {
                write!(f, "rule '{rule_id}': {detail}")
            }
            ConfigError::UnknownEvaluator { name } => {
                write!(f, "unknown evaluator '{name}'")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Umbrella error for the engine façade and the stateless search entry.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineError {
    Fen(FenError),
    MoveParse(MoveParseError),
    Config(ConfigError),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::Fen(e) => write!(f, "{e}"),
            EngineError::MoveParse(e) => write!(f, "{e}"),
            EngineError::Config(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for EngineError {}

impl From<FenError> for EngineError {
    fn from(e: FenError) -> Self {
        EngineError::Fen(e)
    }
}

impl From<MoveParseError> for EngineError {
    fn from(e: MoveParseError) -> Self {
        EngineError::MoveParse(e)
    }
}

impl From<ConfigError> for EngineError {
    fn from(e: ConfigError) -> Self {
        EngineError::Config(e)
    }
}
