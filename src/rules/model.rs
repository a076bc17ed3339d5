//! Declarative rule model: the JSON-facing data types.
//!
//! A rule set is a list of rules plus category weights. Each rule pairs
//! a `Condition` (does it fire for a side?), a `Target` (what units
//! contribute, each yielding a measurement), and a `Value` (measurement
//! to centipawns). All three are `type`-tagged enums; an unknown tag is
//! a deserialization error, never a silent no-op.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RuleSetConfig {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub rules: Vec<Rule>,
    #[serde(default)]
    pub category_weights: HashMap<String, f64>,
}

impl RuleSetConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Malformed {
            detail: e.to_string(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    pub category: String,
    #[serde(default = "default_weight")]
    pub weight: f64,
    pub condition: Condition,
    pub target: Target,
    pub value: Value,
}

fn default_enabled() -> bool {
    true
}

fn default_weight() -> f64 {
    1.0
}

/// Whose pieces a rule clause refers to, relative to the side being
/// evaluated.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Side {
    My,
    Opponent,
    Both,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceKind {
    pub fn to_piece(self) -> crate::board::Piece {
        match self {
            PieceKind::Pawn => crate::board::Piece::Pawn,
            PieceKind::Knight => crate::board::Piece::Knight,
            PieceKind::Bishop => crate::board::Piece::Bishop,
            PieceKind::Rook => crate::board::Piece::Rook,
            PieceKind::Queen => crate::board::Piece::Queen,
            PieceKind::King => crate::board::Piece::King,
        }
    }
}

/// Piece selector for counting targets; `BishopPair` is the composite
/// "this side has two or more bishops".
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum PieceSel {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
    BishopPair,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum GamePhase {
    Opening,
    Middlegame,
    Endgame,
    LateEndgame,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Cmp {
    Eq,
    Ge,
    Le,
    Gt,
    Lt,
}

impl Cmp {
    pub fn holds(self, lhs: f64, rhs: f64) -> bool {
        match self {
            Cmp::Eq => lhs == rhs,
            Cmp::Ge => lhs >= rhs,
            Cmp::Le => lhs <= rhs,
            Cmp::Gt => lhs > rhs,
            Cmp::Lt => lhs < rhs,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum CastlingStatus {
    HasCastledKingside,
    HasCastledQueenside,
    HasCastledEither,
    HasNotCastled,
    CanStillCastle,
    CannotCastle,
    LostRights,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum DistanceMetric {
    Chebyshev,
    Manhattan,
}

/// One endpoint of a piece-distance clause.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PieceRef {
    pub piece: PieceKind,
    pub who: Side,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum LogicalOp {
    And,
    Or,
    Not,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Condition {
    Always,
    GamePhase {
        phases: Vec<GamePhase>,
    },
    Material {
        piece: PieceKind,
        who: Side,
        op: Cmp,
        count: u32,
    },
    Castling {
        who: Side,
        status: CastlingStatus,
    },
    PieceDistance {
        piece1: PieceRef,
        piece2: PieceRef,
        metric: DistanceMetric,
        op: Cmp,
        distance: u32,
    },
    Logical {
        op: LogicalOp,
        conditions: Vec<Condition>,
    },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum PawnStructureKind {
    Doubled,
    Isolated,
    Connected,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum CenterArea {
    Core,
    Extended,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum RookFileKind {
    Open,
    SemiOpen,
    Quality,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum DevelopmentKind {
    AllMinors,
    Fianchetto,
    CentralKnights,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Target {
    /// One contribution per piece of the type (measurement 1), or the
    /// bishop-pair composite (single contribution when it holds).
    PieceCount { piece: PieceSel },
    /// One contribution per piece; measurement = quiet destinations plus
    /// `captureWeight` times capture destinations.
    Mobility {
        piece: PieceKind,
        #[serde(default = "default_capture_weight")]
        capture_weight: f64,
    },
    /// One contribution per piece defended by at least `minDefenders`
    /// friendly pieces, x-rays included.
    Defense {
        piece: PieceKind,
        min_defenders: u32,
    },
    /// One contribution per instance pair; measurement = distance.
    PieceDistance {
        piece1: PieceRef,
        piece2: PieceRef,
        metric: DistanceMetric,
    },
    /// One contribution per own pawn; measurement = ranks advanced.
    PawnAdvancement,
    /// A single contribution; measurement = count of pawns showing the
    /// property.
    PawnStructure { kind: PawnStructureKind },
    /// One contribution per passed pawn; measurement = ranks advanced.
    PassedPawn,
    /// A single contribution; measurement = enemy-attacked squares in
    /// the own king zone.
    KingSafety,
    /// A single contribution; measurement = attacked center squares.
    CenterControl { area: CenterArea },
    /// One contribution per qualifying rook.
    RookFile { kind: RookFileKind },
    /// Fixed-square development tests.
    Development { kind: DevelopmentKind },
    /// One contribution iff the side currently gives check.
    Check,
    /// One contribution per piece; measurement = table value at its
    /// square (tables flipped for black).
    PieceSquareTable { piece: PieceKind },
    /// Exactly one contribution with measurement 1.
    Global,
}

fn default_capture_weight() -> f64 {
    1.0
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ScaleShape {
    Linear,
    SquareRoot,
    Quadratic,
    Exponential,
}

/// Piecewise-constant band for `Value::Conditional`; inclusive on both
/// ends.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
    pub value: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Value {
    Fixed {
        value: f64,
    },
    Scaled {
        base: f64,
        #[serde(default = "default_weight")]
        multiplier: f64,
        shape: ScaleShape,
    },
    Conditional {
        ranges: Vec<ValueRange>,
        #[serde(default)]
        default: f64,
    },
    Formula {
        expression: String,
    },
}
