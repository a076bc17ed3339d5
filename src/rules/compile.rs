//! Lowering from the declarative rule model to the executable form.
//!
//! Compilation interns categories, parses formula values once, validates
//! conditions, and buckets rules by target family so the executor's
//! expensive per-family loops run over adjacent rules. Rules whose
//! target has no family lowering (piece distance) stay in generic form
//! and are lowered on the fly by the interpreter path; both paths score
//! identically by construction and by test.

use std::collections::HashMap;

use crate::error::ConfigError;
use crate::rules::formula::{self, Expr};
use crate::rules::model::{
    CenterArea, Condition, DevelopmentKind, DistanceMetric, LogicalOp, PawnStructureKind, PieceRef,
    PieceSel, RookFileKind, Rule, RuleSetConfig, ScaleShape, Target, Value,
};
use crate::rules::scratch::EvalScratch;

/// A target lowered to its executable family. `PieceDistance` appears
/// here too: the interpreter path produces it when lowering on the fly.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Family {
    PieceCount(PieceSel),
    Mobility {
        piece: crate::board::Piece,
        capture_weight: f64,
    },
    Defense {
        piece: crate::board::Piece,
        min_defenders: u32,
    },
    PieceDistance {
        piece1: PieceRef,
        piece2: PieceRef,
        metric: DistanceMetric,
    },
    PawnAdvancement,
    PawnStructure(PawnStructureKind),
    PassedPawn,
    KingSafety,
    CenterControl(CenterArea),
    RookFile(RookFileKind),
    Development(DevelopmentKind),
    Check,
    Psqt(crate::board::Piece),
    Global,
}

impl Family {
    /// Bucket ordinal used to group same-family rules together.
    fn ordinal(&self) -> u8 {
        match self {
            Family::PieceCount(_) => 0,
            Family::Mobility { .. } => 1,
            Family::Defense { .. } => 2,
            Family::PieceDistance { .. } => 3,
            Family::PawnAdvancement => 4,
            Family::PawnStructure(_) => 5,
            Family::PassedPawn => 6,
            Family::KingSafety => 7,
            Family::CenterControl(_) => 8,
            Family::RookFile(_) => 9,
            Family::Development(_) => 10,
            Family::Check => 11,
            Family::Psqt(_) => 12,
            Family::Global => 13,
        }
    }
}

pub(crate) fn lower_target(target: &Target) -> Family {
    match target {
        Target::PieceCount { piece } => Family::PieceCount(*piece),
        Target::Mobility {
            piece,
            capture_weight,
        } => Family::Mobility {
            piece: piece.to_piece(),
            capture_weight: *capture_weight,
        },
        Target::Defense {
            piece,
            min_defenders,
        } => Family::Defense {
            piece: piece.to_piece(),
            min_defenders: *min_defenders,
        },
        Target::PieceDistance {
            piece1,
            piece2,
            metric,
        } => Family::PieceDistance {
            piece1: *piece1,
            piece2: *piece2,
            metric: *metric,
        },
        Target::PawnAdvancement => Family::PawnAdvancement,
        Target::PawnStructure { kind } => Family::PawnStructure(*kind),
        Target::PassedPawn => Family::PassedPawn,
        Target::KingSafety => Family::KingSafety,
        Target::CenterControl { area } => Family::CenterControl(*area),
        Target::RookFile { kind } => Family::RookFile(*kind),
        Target::Development { kind } => Family::Development(*kind),
        Target::Check => Family::Check,
        Target::PieceSquareTable { piece } => Family::Psqt(piece.to_piece()),
        Target::Global => Family::Global,
    }
}

/// A value with its formula pre-parsed.
#[derive(Debug, Clone)]
pub(crate) enum CompiledValue {
    Fixed(f64),
    Scaled {
        base: f64,
        multiplier: f64,
        shape: ScaleShape,
    },
    Conditional {
        ranges: Vec<(f64, f64, f64)>,
        default: f64,
    },
    Formula(Expr),
}

impl CompiledValue {
    pub fn apply(&self, n: f64) -> f64 {
        match self {
            CompiledValue::Fixed(v) => *v,
            CompiledValue::Scaled {
                base,
                multiplier,
                shape,
            } => {
                let shaped = match shape {
                    ScaleShape::Linear => n,
                    ScaleShape::SquareRoot => {
                        if n < 0.0 {
                            0.0
                        } else {
                            n.sqrt()
                        }
                    }
                    ScaleShape::Quadratic => n * n,
                    ScaleShape::Exponential => 2f64.powf(n),
                };
                base * shaped * multiplier
            }
            CompiledValue::Conditional { ranges, default } => {
                for &(min, max, value) in ranges {
                    if n >= min && n <= max {
                        return value;
                    }
                }
                *default
            }
            CompiledValue::Formula(expr) => expr.eval(n),
        }
    }
}

/// How the executor runs a rule: pre-lowered, or generic AST lowered at
/// evaluation time.
#[derive(Debug, Clone)]
pub(crate) enum Lowered {
    Fast(Family),
    Generic(Target),
}

impl Lowered {
    pub fn family(&self) -> Family {
        match self {
            Lowered::Fast(f) => f.clone(),
            Lowered::Generic(t) => lower_target(t),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct CompiledRule {
    pub id: String,
    pub enabled: bool,
    pub category: usize,
    pub weight: f64,
    pub condition: Condition,
    pub lowered: Lowered,
    pub value: CompiledValue,
}

/// An installed rule set: immutable after compilation except for
/// enable/disable toggles and category weights.
#[derive(Debug)]
pub struct CompiledRuleSet {
    pub name: String,
    pub description: String,
    pub(crate) rules: Vec<CompiledRule>,
    pub(crate) categories: Vec<String>,
    pub(crate) category_weights: Vec<f64>,
    pub(crate) scratch: EvalScratch,
    /// The source configuration, kept for introspection and for the
    /// interpreter reference path.
    pub(crate) config: RuleSetConfig,
}

impl CompiledRuleSet {
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn category_weight(&self, name: &str) -> Option<f64> {
        self.categories
            .iter()
            .position(|c| c == name)
            .map(|i| self.category_weights[i])
    }

    /// Runtime-mutable: adjust one category's weight without
    /// recompiling. Returns false for an unknown category.
    pub fn set_category_weight(&mut self, name: &str, weight: f64) -> bool {
        if let Some(i) = self.categories.iter().position(|c| c == name) {
            self.category_weights[i] = weight;
            true
        } else {
            false
        }
    }

    /// Runtime-mutable: toggle a rule by id. Returns false for an
    /// unknown id.
    pub fn set_rule_enabled(&mut self, id: &str, enabled: bool) -> bool {
        let mut found = false;
        for rule in self.rules.iter_mut() {
            if rule.id == id {
                rule.enabled = enabled;
                found = true;
            }
        }
        found
    }

    pub fn rule_ids(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.id.as_str()).collect()
    }

    pub fn config(&self) -> &RuleSetConfig {
        &self.config
    }
}

/// Is `b` the direct negation of `a`?
fn negation_of(a: &Condition, b: &Condition) -> bool {
    matches!(
        b,
        Condition::Logical {
            op: LogicalOp::Not,
            conditions,
        } if conditions.len() == 1 && conditions[0] == *a
    )
}

/// A conjunction holding both a clause and its negation can never fire.
/// Deeper semantic contradictions are left alone: such rules are
/// well-formed and simply score nothing.
fn has_direct_contradiction(conditions: &[Condition]) -> bool {
    for (i, a) in conditions.iter().enumerate() {
        for b in &conditions[i + 1..] {
            if negation_of(a, b) || negation_of(b, a) {
                return true;
            }
        }
    }
    false
}

fn validate_condition(rule: &Rule, condition: &Condition) -> Result<(), ConfigError> {
    match condition {
        Condition::Logical { op, conditions } => {
            if conditions.is_empty() {
                return Err(ConfigError::BadRule {
                    rule_id: rule.id.clone(),
                    detail: "logical condition with no children".to_string(),
                });
            }
            if *op == LogicalOp::Not && conditions.len() != 1 {
                return Err(ConfigError::BadRule {
                    rule_id: rule.id.clone(),
                    detail: format!(
                        "not takes exactly one child condition, found {}",
                        conditions.len()
                    ),
                });
            }
            if *op == LogicalOp::And && has_direct_contradiction(conditions) {
                return Err(ConfigError::BadRule {
                    rule_id: rule.id.clone(),
                    detail: "self-contradictory condition: a clause conjoined with its own negation"
                        .to_string(),
                });
            }
            for child in conditions {
                validate_condition(rule, child)?;
            }
            Ok(())
        }
        Condition::GamePhase { phases } => {
            if phases.is_empty() {
                return Err(ConfigError::BadRule {
                    rule_id: rule.id.clone(),
                    detail: "gamePhase condition with no phases".to_string(),
                });
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

fn compile_value(rule: &Rule) -> Result<CompiledValue, ConfigError> {
    Ok(match &rule.value {
        Value::Fixed { value } => CompiledValue::Fixed(*value),
        Value::Scaled {
            base,
            multiplier,
            shape,
        } => CompiledValue::Scaled {
            base: *base,
            multiplier: *multiplier,
            shape: *shape,
        },
        Value::Conditional { ranges, default } => CompiledValue::Conditional {
            ranges: ranges.iter().map(|r| (r.min, r.max, r.value)).collect(),
            default: *default,
        },
        Value::Formula { expression } => {
            let expr = formula::parse(expression).map_err(|e| ConfigError::BadFormula {
                rule_id: rule.id.clone(),
                detail: e.to_string(),
            })?;
            CompiledValue::Formula(expr)
        }
    })
}

/// Compile a configuration. All-or-nothing: any invalid rule rejects
/// the whole set and leaves the caller's current evaluator untouched.
pub fn compile(config: &RuleSetConfig) -> Result<CompiledRuleSet, ConfigError> {
    let mut categories: Vec<String> = Vec::new();
    let mut category_index: HashMap<&str, usize> = HashMap::new();
    let mut rules = Vec::with_capacity(config.rules.len());

    for rule in &config.rules {
        validate_condition(rule, &rule.condition)?;
        let value = compile_value(rule)?;

        let category = *category_index
            .entry(rule.category.as_str())
            .or_insert_with(|| {
                categories.push(rule.category.clone());
                categories.len() - 1
            });

        let lowered = match &rule.target {
            Target::PieceDistance { .. } => Lowered::Generic(rule.target.clone()),
            other => Lowered::Fast(lower_target(other)),
        };

        rules.push(CompiledRule {
            id: rule.id.clone(),
            enabled: rule.enabled,
            category,
            weight: rule.weight,
            condition: rule.condition.clone(),
            lowered,
            value,
        });
    }

    // Group by family so same-family rules share the hot loop's cache
    // locality; stable, so in-family order follows the configuration.
    rules.sort_by_key(|r| r.lowered.family().ordinal());

    // Categories without an explicit weight count at full strength.
    let category_weights = categories
        .iter()
        .map(|c| config.category_weights.get(c).copied().unwrap_or(1.0))
        .collect();

    tracing::debug!(
        name = %config.name,
        rules = rules.len(),
        categories = categories.len(),
        "rule set compiled"
    );

    let scratch = EvalScratch::new(categories.len());
    Ok(CompiledRuleSet {
        name: config.name.clone(),
        description: config.description.clone(),
        rules,
        categories,
        category_weights,
        scratch,
        config: config.clone(),
    })
}
