//! The rule executor: conditions, target measurements, aggregation.

use crate::board::{Board, Color, Piece};
use crate::error::ConfigError;
use crate::eval::classical::{CENTER_CORE, CENTER_EXTENDED};
use crate::eval::pawns::{advancement, FILE_MASKS};
use crate::eval::psqt::psqt_value;
use crate::eval::{castle_state, CastleState, Evaluator};
use crate::moves::square_control::attackers_to;
use crate::rules::compile::{compile, lower_target, CompiledRuleSet, CompiledValue, Family};
use crate::rules::formula;
use crate::rules::model::{
    CastlingStatus, CenterArea, Condition, DevelopmentKind, DistanceMetric, LogicalOp,
    PawnStructureKind, PieceRef, PieceSel, RookFileKind, RuleSetConfig, Side, Value,
};
use crate::rules::scratch::EvalScratch;
use crate::square::Square;
use crate::utils::pop_lsb;

impl CompiledRuleSet {
    /// Score the position from the side-to-move perspective, in
    /// centipawns (fractional; the evaluator rounds).
    pub fn score(&mut self, board: &Board) -> f64 {
        let CompiledRuleSet {
            rules,
            scratch,
            category_weights,
            ..
        } = self;
        scratch.reset();

        let us = board.side_to_move;
        let them = us.opposite();

        for rule in rules.iter() {
            if !rule.enabled {
                continue;
            }
            let family = rule.lowered.family();

            let s_us = if condition_holds(&rule.condition, board, scratch, us) {
                family_sum(board, scratch, us, &family, |n| rule.value.apply(n))
            } else {
                0.0
            };
            let s_them = if condition_holds(&rule.condition, board, scratch, them) {
                family_sum(board, scratch, them, &family, |n| rule.value.apply(n))
            } else {
                0.0
            };

            scratch.categories[rule.category] += rule.weight * (s_us - s_them);
        }

        let mut total = 0.0;
        for (i, weight) in category_weights.iter().enumerate() {
            total += weight * scratch.categories[i];
        }
        total
    }

    /// Reference path: interpret the source configuration directly,
    /// bypassing every pre-lowered record. Must agree with `score` for
    /// any accepted configuration; the test suite holds it to that.
    pub fn score_interpreted(&mut self, board: &Board) -> f64 {
        let CompiledRuleSet {
            scratch, config, ..
        } = self;
        scratch.reset();

        let us = board.side_to_move;
        let them = us.opposite();
        let mut category_totals: Vec<(String, f64)> = Vec::new();

        for rule in &config.rules {
            if !rule.enabled {
                continue;
            }
            let family = lower_target(&rule.target);
            let apply = |n: f64| interpret_value(&rule.value, n);

            let s_us = if condition_holds(&rule.condition, board, scratch, us) {
                family_sum(board, scratch, us, &family, apply)
            } else {
                0.0
            };
            let s_them = if condition_holds(&rule.condition, board, scratch, them) {
                family_sum(board, scratch, them, &family, apply)
            } else {
                0.0
            };

            let delta = rule.weight * (s_us - s_them);
            match category_totals.iter_mut().find(|(c, _)| *c == rule.category) {
                Some((_, total)) => *total += delta,
                None => category_totals.push((rule.category.clone(), delta)),
            }
        }

        category_totals
            .iter()
            .map(|(category, total)| {
                total * config.category_weights.get(category).copied().unwrap_or(1.0)
            })
            .sum()
    }
}

/// Interpret a value straight from the AST, parsing formulas on demand.
fn interpret_value(value: &Value, n: f64) -> f64 {
    match value {
        Value::Formula { expression } => match formula::parse(expression) {
            Ok(expr) => expr.eval(n),
            Err(_) => 0.0, // compile() already rejected unparsable formulas
        },
        Value::Fixed { value } => *value,
        Value::Scaled {
            base,
            multiplier,
            shape,
        } => CompiledValue::Scaled {
            base: *base,
            multiplier: *multiplier,
            shape: *shape,
        }
        .apply(n),
        Value::Conditional { ranges, default } => CompiledValue::Conditional {
            ranges: ranges.iter().map(|r| (r.min, r.max, r.value)).collect(),
            default: *default,
        }
        .apply(n),
    }
}

fn resolve_sides(who: Side, us: Color) -> (Color, Option<Color>) {
    match who {
        Side::My => (us, None),
        Side::Opponent => (us.opposite(), None),
        Side::Both => (us, Some(us.opposite())),
    }
}

fn material_count(board: &Board, piece: Piece, who: Side, us: Color) -> u32 {
    let (first, second) = resolve_sides(who, us);
    let mut count = board.pieces(piece, first).count_ones();
    if let Some(color) = second {
        count += board.pieces(piece, color).count_ones();
    }
    count
}

fn castling_holds(board: &Board, color: Color, status: CastlingStatus) -> bool {
    let state = castle_state(board, color);
    let any_rights =
        board.has_kingside_castle(color) || board.has_queenside_castle(color);
    match status {
        CastlingStatus::HasCastledKingside => state == CastleState::KingsideCastled,
        CastlingStatus::HasCastledQueenside => state == CastleState::QueensideCastled,
        CastlingStatus::HasCastledEither => state != CastleState::NotCastled,
        CastlingStatus::HasNotCastled => state == CastleState::NotCastled,
        CastlingStatus::CanStillCastle => any_rights,
        CastlingStatus::CannotCastle => !any_rights,
        CastlingStatus::LostRights => !any_rights && state == CastleState::NotCastled,
    }
}

#[inline]
fn square_distance(a: u8, b: u8, metric: DistanceMetric) -> u32 {
    let dr = ((a >> 3) as i32 - (b >> 3) as i32).unsigned_abs();
    let df = ((a & 7) as i32 - (b & 7) as i32).unsigned_abs();
    match metric {
        DistanceMetric::Chebyshev => dr.max(df),
        DistanceMetric::Manhattan => dr + df,
    }
}

fn piece_squares(board: &Board, piece_ref: PieceRef, us: Color) -> Vec<u8> {
    let (first, second) = resolve_sides(piece_ref.who, us);
    let piece = piece_ref.piece.to_piece();
    let mut bb = board.pieces(piece, first);
    if let Some(color) = second {
        bb |= board.pieces(piece, color);
    }
    let mut squares = Vec::with_capacity(bb.count_ones() as usize);
    let mut rest = bb;
    while rest != 0 {
        squares.push(pop_lsb(&mut rest));
    }
    squares
}

/// Minimum pairwise distance between two piece selections, or None if
/// either selection is empty.
fn min_piece_distance(
    board: &Board,
    piece1: PieceRef,
    piece2: PieceRef,
    metric: DistanceMetric,
    us: Color,
) -> Option<u32> {
    let first = piece_squares(board, piece1, us);
    let second = piece_squares(board, piece2, us);
    let mut best: Option<u32> = None;
    for &a in &first {
        for &b in &second {
            if a == b {
                continue;
            }
            let d = square_distance(a, b, metric);
            best = Some(best.map_or(d, |cur| cur.min(d)));
        }
    }
    best
}

pub(crate) fn condition_holds(
    condition: &Condition,
    board: &Board,
    scratch: &mut EvalScratch,
    us: Color,
) -> bool {
    match condition {
        Condition::Always => true,
        Condition::GamePhase { phases } => {
            let phase = scratch.phase(board);
            phases.contains(&phase)
        }
        Condition::Material {
            piece,
            who,
            op,
            count,
        } => {
            let held = material_count(board, piece.to_piece(), *who, us);
            op.holds(held as f64, *count as f64)
        }
        Condition::Castling { who, status } => {
            let (first, second) = resolve_sides(*who, us);
            let mut holds = castling_holds(board, first, *status);
            if let Some(color) = second {
                holds = holds && castling_holds(board, color, *status);
            }
            holds
        }
        Condition::PieceDistance {
            piece1,
            piece2,
            metric,
            op,
            distance,
        } => match min_piece_distance(board, *piece1, *piece2, *metric, us) {
            Some(d) => op.holds(d as f64, *distance as f64),
            None => false,
        },
        Condition::Logical { op, conditions } => match op {
            LogicalOp::And => conditions
                .iter()
                .all(|c| condition_holds(c, board, scratch, us)),
            LogicalOp::Or => conditions
                .iter()
                .any(|c| condition_holds(c, board, scratch, us)),
            // Compilation pins NOT to a single child.
            LogicalOp::Not => !condition_holds(&conditions[0], board, scratch, us),
        },
    }
}

/// Minor-piece home squares for the development tests.
fn minor_home_squares(color: Color) -> u64 {
    match color {
        Color::White => (1u64 << 1) | (1u64 << 2) | (1u64 << 5) | (1u64 << 6),
        Color::Black => (1u64 << 57) | (1u64 << 58) | (1u64 << 61) | (1u64 << 62),
    }
}

/// Fianchetto squares: b2/g2 and b7/g7.
fn fianchetto_squares(color: Color) -> u64 {
    match color {
        Color::White => (1u64 << 9) | (1u64 << 14),
        Color::Black => (1u64 << 49) | (1u64 << 54),
    }
}

/// Count friendly defenders of a square, lifting each wave of defenders
/// off the board to reveal stacked x-ray defenders behind them.
fn defender_count(board: &Board, sq: Square, color: Color) -> u32 {
    let mut occ = board.occupied();
    let mut count = 0;
    loop {
        let defenders = attackers_to(board, sq, occ) & board.occupancy(color) & occ;
        if defenders == 0 {
            return count;
        }
        count += defenders.count_ones();
        occ &= !defenders;
    }
}

/// Sum `value(measurement)` over every contribution the family yields
/// for `color`. This is the one place target semantics live; the fast
/// and interpreted paths both land here.
pub(crate) fn family_sum<F: Fn(f64) -> f64>(
    board: &Board,
    scratch: &mut EvalScratch,
    color: Color,
    family: &Family,
    value: F,
) -> f64 {
    let them = color.opposite();
    match family {
        Family::PieceCount(PieceSel::BishopPair) => {
            if board.pieces(Piece::Bishop, color).count_ones() >= 2 {
                value(1.0)
            } else {
                0.0
            }
        }
        Family::PieceCount(sel) => {
            let piece = match sel {
                PieceSel::Pawn => Piece::Pawn,
                PieceSel::Knight => Piece::Knight,
                PieceSel::Bishop => Piece::Bishop,
                PieceSel::Rook => Piece::Rook,
                PieceSel::Queen => Piece::Queen,
                PieceSel::King => Piece::King,
                PieceSel::BishopPair => unreachable!(),
            };
            board.pieces(piece, color).count_ones() as f64 * value(1.0)
        }

        Family::Mobility {
            piece,
            capture_weight,
        } => {
            let own = board.occupancy(color);
            let enemy = board.occupancy(them);
            let mut sum = 0.0;
            for &(_, attacks) in scratch.piece_attacks(board, color, *piece).iter() {
                let reachable = attacks & !own;
                let quiet = (reachable & !enemy).count_ones() as f64;
                let captures = (reachable & enemy).count_ones() as f64;
                sum += value(quiet + capture_weight * captures);
            }
            sum
        }

        Family::Defense {
            piece,
            min_defenders,
        } => {
            let mut sum = 0.0;
            let mut bb = board.pieces(*piece, color);
            while bb != 0 {
                let sq = pop_lsb(&mut bb);
                if defender_count(board, Square::from_index(sq), color) >= *min_defenders {
                    sum += value(1.0);
                }
            }
            sum
        }

        Family::PieceDistance {
            piece1,
            piece2,
            metric,
        } => {
            let first = piece_squares(board, *piece1, color);
            let second = piece_squares(board, *piece2, color);
            let mut sum = 0.0;
            for &a in &first {
                for &b in &second {
                    if a != b {
                        sum += value(square_distance(a, b, *metric) as f64);
                    }
                }
            }
            sum
        }

        Family::PawnAdvancement => {
            let mut sum = 0.0;
            let mut bb = board.pieces(Piece::Pawn, color);
            while bb != 0 {
                let sq = pop_lsb(&mut bb);
                sum += value(advancement(sq, color) as f64);
            }
            sum
        }

        Family::PawnStructure(kind) => {
            let count = match kind {
                PawnStructureKind::Doubled => scratch.doubled(board, color),
                PawnStructureKind::Isolated => scratch.isolated(board, color),
                PawnStructureKind::Connected => scratch.connected(board, color).count_ones(),
            };
            value(count as f64)
        }

        Family::PassedPawn => {
            let mut passed = scratch.passed(board, color);
            let mut sum = 0.0;
            while passed != 0 {
                let sq = pop_lsb(&mut passed);
                sum += value(advancement(sq, color) as f64);
            }
            sum
        }

        Family::KingSafety => {
            let zone = scratch.king_zone(board, color);
            let enemy_attacks = scratch.attack_union(board, them);
            value((zone & enemy_attacks).count_ones() as f64)
        }

        Family::CenterControl(area) => {
            let mask = match area {
                CenterArea::Core => CENTER_CORE,
                CenterArea::Extended => CENTER_EXTENDED,
            };
            let attacks = scratch.attack_union(board, color);
            value((attacks & mask).count_ones() as f64)
        }

        Family::RookFile(kind) => {
            let own_pawns = board.pieces(Piece::Pawn, color);
            let enemy_pawns = board.pieces(Piece::Pawn, them);
            let mut sum = 0.0;
            let mut rooks = board.pieces(Piece::Rook, color);
            while rooks != 0 {
                let sq = pop_lsb(&mut rooks);
                let file = FILE_MASKS[(sq & 7) as usize];
                let open = file & (own_pawns | enemy_pawns) == 0;
                let semi = !open && file & own_pawns == 0;
                match kind {
                    RookFileKind::Open if open => sum += value(1.0),
                    RookFileKind::SemiOpen if semi => sum += value(1.0),
                    RookFileKind::Quality => {
                        let measurement = if open {
                            2.0
                        } else if semi {
                            1.0
                        } else {
                            0.0
                        };
                        if measurement > 0.0 {
                            sum += value(measurement);
                        }
                    }
                    _ => {}
                }
            }
            sum
        }

        Family::Development(kind) => match kind {
            DevelopmentKind::AllMinors => {
                let minors =
                    board.pieces(Piece::Knight, color) | board.pieces(Piece::Bishop, color);
                if minors & minor_home_squares(color) == 0 {
                    value(1.0)
                } else {
                    0.0
                }
            }
            DevelopmentKind::Fianchetto => {
                let bishops = board.pieces(Piece::Bishop, color);
                (bishops & fianchetto_squares(color)).count_ones() as f64 * value(1.0)
            }
            DevelopmentKind::CentralKnights => {
                let knights = board.pieces(Piece::Knight, color);
                (knights & CENTER_EXTENDED).count_ones() as f64 * value(1.0)
            }
        },

        Family::Check => {
            if board.pieces(Piece::King, them) == 0 {
                return 0.0;
            }
            let their_king = board.king_square(them);
            if scratch.attack_union(board, color) & their_king.bb() != 0 {
                value(1.0)
            } else {
                0.0
            }
        }

        Family::Psqt(piece) => {
            let mut sum = 0.0;
            let mut bb = board.pieces(*piece, color);
            while bb != 0 {
                let sq = pop_lsb(&mut bb);
                sum += value(psqt_value(*piece, color, sq) as f64);
            }
            sum
        }

        Family::Global => value(1.0),
    }
}

/// The rule-composed evaluator: a compiled rule set behind the common
/// `Evaluator` contract.
#[derive(Debug)]
pub struct RuleEvaluator {
    set: CompiledRuleSet,
}

impl RuleEvaluator {
    pub fn new(config: &RuleSetConfig) -> Result<Self, ConfigError> {
        Ok(RuleEvaluator {
            set: compile(config)?,
        })
    }

    /// An evaluator with no rules; scores every position zero. The
    /// placeholder until a configuration is installed.
    pub fn empty() -> Self {
        let config = RuleSetConfig {
            name: "empty".to_string(),
            description: String::new(),
            rules: Vec::new(),
            category_weights: Default::default(),
        };
        RuleEvaluator {
            set: compile(&config).expect("empty rule set always compiles"),
        }
    }

    pub fn ruleset(&self) -> &CompiledRuleSet {
        &self.set
    }

    pub fn ruleset_mut(&mut self) -> &mut CompiledRuleSet {
        &mut self.set
    }
}

impl Evaluator for RuleEvaluator {
    fn name(&self) -> &'static str {
        "rule"
    }

    fn evaluate(&mut self, board: &Board) -> i32 {
        self.set.score(board).round() as i32
    }
}
