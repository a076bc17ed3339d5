//! Rule-composed evaluator: configuration, semantics, and the
//! compiled-versus-interpreted equivalence contract.

use maxim::board::Board;
use maxim::eval::Evaluator;
use maxim::rules::model::{
    Cmp, Condition, GamePhase, LogicalOp, PieceKind, PieceRef, PieceSel, Rule, Side, Value,
};
use maxim::rules::{compile, RuleEvaluator, RuleSetConfig, Target};
use std::collections::HashMap;
use std::str::FromStr;

fn rule(id: &str, category: &str, target: Target, value: Value) -> Rule {
    Rule {
        id: id.to_string(),
        name: id.to_string(),
        enabled: true,
        category: category.to_string(),
        weight: 1.0,
        condition: Condition::Always,
        target,
        value,
    }
}

fn fixed(v: f64) -> Value {
    Value::Fixed { value: v }
}

fn config(rules: Vec<Rule>, weights: &[(&str, f64)]) -> RuleSetConfig {
    RuleSetConfig {
        name: "test".to_string(),
        description: String::new(),
        rules,
        category_weights: weights
            .iter()
            .map(|(k, v)| (k.to_string(), *v))
            .collect::<HashMap<_, _>>(),
    }
}

fn material_config() -> RuleSetConfig {
    config(
        vec![
            rule(
                "pawns",
                "material",
                Target::PieceCount {
                    piece: PieceSel::Pawn,
                },
                fixed(100.0),
            ),
            rule(
                "knights",
                "material",
                Target::PieceCount {
                    piece: PieceSel::Knight,
                },
                fixed(320.0),
            ),
            rule(
                "bishops",
                "material",
                Target::PieceCount {
                    piece: PieceSel::Bishop,
                },
                fixed(330.0),
            ),
            rule(
                "rooks",
                "material",
                Target::PieceCount {
                    piece: PieceSel::Rook,
                },
                fixed(500.0),
            ),
            rule(
                "queens",
                "material",
                Target::PieceCount {
                    piece: PieceSel::Queen,
                },
                fixed(900.0),
            ),
        ],
        &[("material", 1.0)],
    )
}

fn score(config: &RuleSetConfig, fen: &str) -> i32 {
    let mut evaluator = RuleEvaluator::new(config).expect("config compiles");
    evaluator.evaluate(&Board::from_str(fen).unwrap())
}

#[test]
fn material_rules_literal_scores() {
    let config = material_config();
    assert_eq!(
        score(&config, "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"),
        0
    );
    assert_eq!(score(&config, "7k/8/8/8/8/8/PPPPPPPP/K7 w - - 0 1"), 800);
    // Same imbalance seen from the other side.
    assert_eq!(score(&config, "7k/8/8/8/8/8/PPPPPPPP/K7 b - - 0 1"), -800);
}

#[test]
fn category_weight_scales_linearly() {
    // Pawn and rook imbalances in separate categories.
    let build = |material_weight: f64| {
        config(
            vec![
                rule(
                    "pawns",
                    "pawn-material",
                    Target::PieceCount {
                        piece: PieceSel::Pawn,
                    },
                    fixed(100.0),
                ),
                rule(
                    "rooks",
                    "rook-material",
                    Target::PieceCount {
                        piece: PieceSel::Rook,
                    },
                    fixed(500.0),
                ),
            ],
            &[("pawn-material", material_weight), ("rook-material", 1.0)],
        )
    };

    let fen = "7k/8/8/8/8/8/P7/R3K3 w - - 0 1";
    let single = score(&build(1.0), fen);
    let double = score(&build(2.0), fen);

    assert_eq!(single, 600);
    // Doubling the pawn category doubles exactly its 100cp contribution.
    assert_eq!(double, 700);
}

#[test]
fn disabling_equals_removal() {
    let fen = "7k/8/8/8/8/8/P7/R3K3 w - - 0 1";

    let mut disabled = material_config();
    disabled.rules[0].enabled = false;

    let mut removed = material_config();
    removed.rules.remove(0);

    assert_eq!(score(&disabled, fen), score(&removed, fen));
}

#[test]
fn runtime_toggle_matches_config_disable() {
    let fen = "7k/8/8/8/8/8/P7/R3K3 w - - 0 1";
    let board = Board::from_str(fen).unwrap();

    let mut evaluator = RuleEvaluator::new(&material_config()).unwrap();
    assert!(evaluator.ruleset_mut().set_rule_enabled("pawns", false));
    let toggled = evaluator.evaluate(&board);

    let mut disabled = material_config();
    disabled.rules[0].enabled = false;
    assert_eq!(toggled, score(&disabled, fen));

    // Unknown ids report failure and change nothing.
    assert!(!evaluator.ruleset_mut().set_rule_enabled("nope", false));
}

#[test]
fn runtime_category_weight_update() {
    let board = Board::from_str("7k/8/8/8/8/8/P7/K7 w - - 0 1").unwrap();
    let mut evaluator = RuleEvaluator::new(&material_config()).unwrap();
    assert_eq!(evaluator.evaluate(&board), 100);

    assert!(evaluator.ruleset_mut().set_category_weight("material", 3.0));
    assert_eq!(evaluator.evaluate(&board), 300);
}

#[test]
fn bishop_pair_is_a_single_contribution() {
    let config = config(
        vec![rule(
            "pair",
            "minor",
            Target::PieceCount {
                piece: PieceSel::BishopPair,
            },
            fixed(50.0),
        )],
        &[("minor", 1.0)],
    );

    // Two bishops vs one: only the pair side collects.
    assert_eq!(score(&config, "4k3/8/8/8/8/8/8/1BB1K3 w - - 0 1"), 50);
    assert_eq!(score(&config, "4k3/8/8/8/8/8/8/1B2K3 w - - 0 1"), 0);
}

#[test]
fn scaled_value_shapes() {
    // Pawn advancement with a quadratic shape: a pawn on its fourth
    // rank (2 ranks advanced) yields base * 4 * multiplier.
    let quad = config(
        vec![rule(
            "advance",
            "pawns",
            Target::PawnAdvancement,
            Value::Scaled {
                base: 10.0,
                multiplier: 1.0,
                shape: maxim::rules::model::ScaleShape::Quadratic,
            },
        )],
        &[("pawns", 1.0)],
    );
    assert_eq!(score(&quad, "4k3/8/8/8/4P3/8/8/4K3 w - - 0 1"), 40);

    let sqrt = config(
        vec![rule(
            "advance",
            "pawns",
            Target::PawnAdvancement,
            Value::Scaled {
                base: 10.0,
                multiplier: 2.0,
                shape: maxim::rules::model::ScaleShape::SquareRoot,
            },
        )],
        &[("pawns", 1.0)],
    );
    // sqrt(4 ranks advanced) = 2; 10 * 2 * 2 = 40.
    assert_eq!(score(&sqrt, "4k3/8/4P3/8/8/8/8/4K3 w - - 0 1"), 40);
}

#[test]
fn formula_value() {
    let config = config(
        vec![rule(
            "advance",
            "pawns",
            Target::PawnAdvancement,
            Value::Formula {
                expression: "10 * n + min(n, 2) ^ 2".to_string(),
            },
        )],
        &[("pawns", 1.0)],
    );
    // n = 4 (pawn on its sixth rank): 40 + min(4,2)^2 = 44.
    assert_eq!(score(&config, "4k3/8/4P3/8/8/8/8/4K3 w - - 0 1"), 44);
}

#[test]
fn conditional_value_bands() {
    let config = config(
        vec![rule(
            "passer",
            "pawns",
            Target::PassedPawn,
            Value::Conditional {
                ranges: vec![
                    maxim::rules::model::ValueRange {
                        min: 0.0,
                        max: 2.0,
                        value: 10.0,
                    },
                    maxim::rules::model::ValueRange {
                        min: 3.0,
                        max: 5.0,
                        value: 80.0,
                    },
                ],
                default: 200.0,
            },
        )],
        &[("pawns", 1.0)],
    );

    // Passed pawn 2 ranks advanced: first band.
    assert_eq!(score(&config, "4k3/8/8/8/4P3/8/8/4K3 w - - 0 1"), 10);
    // Passed pawn 5 ranks advanced: second band.
    assert_eq!(score(&config, "4k3/4P3/8/8/8/8/8/4K3 w - - 0 1"), 80);
}

#[test]
fn game_phase_condition_gates_rules() {
    let mut bonus = rule("endgame-pawns", "pawns", Target::PawnAdvancement, fixed(10.0));
    bonus.condition = Condition::GamePhase {
        phases: vec![GamePhase::Endgame, GamePhase::LateEndgame],
    };
    let config = config(vec![bonus], &[("pawns", 1.0)]);

    // Bare kings and a pawn: late endgame, the rule fires.
    assert_ne!(score(&config, "4k3/8/8/8/4P3/8/8/4K3 w - - 0 1"), 0);
    // Full armies: opening, the rule stays silent.
    assert_eq!(
        score(
            &config,
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 1"
        ),
        0
    );
}

#[test]
fn material_condition_relative_to_each_side() {
    // Rook bonus only while the opponent still has a queen.
    let mut r = rule(
        "rook-vs-queen",
        "material",
        Target::PieceCount {
            piece: PieceSel::Rook,
        },
        fixed(50.0),
    );
    r.condition = Condition::Material {
        piece: PieceKind::Queen,
        who: Side::Opponent,
        op: Cmp::Ge,
        count: 1,
    };
    let config = config(vec![r], &[("material", 1.0)]);

    // White rook, black queen: fires for White only -> +50.
    assert_eq!(score(&config, "3qk3/8/8/8/8/8/8/R3K3 w - - 0 1"), 50);
    // No queens anywhere: silent.
    assert_eq!(score(&config, "4k3/8/8/8/8/8/8/R3K3 w - - 0 1"), 0);
}

#[test]
fn logical_conditions_fold() {
    let mut r = rule("global", "misc", Target::Global, fixed(7.0));
    r.condition = Condition::Logical {
        op: LogicalOp::And,
        conditions: vec![
            Condition::Always,
            Condition::Logical {
                op: LogicalOp::Not,
                conditions: vec![Condition::Material {
                    piece: PieceKind::Queen,
                    who: Side::My,
                    op: Cmp::Ge,
                    count: 1,
                }],
            },
        ],
    };
    let config = config(vec![r], &[("misc", 1.0)]);

    // Global fires for both sides when neither has a queen: net zero.
    assert_eq!(score(&config, "4k3/8/8/8/8/8/8/4K3 w - - 0 1"), 0);
    // White queen: the rule now fires only for Black -> -7.
    assert_eq!(score(&config, "4k3/8/8/8/8/8/8/Q3K3 w - - 0 1"), -7);
}

#[test]
fn empty_logical_condition_is_rejected() {
    let mut r = rule("bad", "misc", Target::Global, fixed(1.0));
    r.condition = Condition::Logical {
        op: LogicalOp::And,
        conditions: vec![],
    };
    assert!(RuleEvaluator::new(&config(vec![r], &[])).is_err());
}

#[test]
fn not_takes_exactly_one_child() {
    let mut r = rule("bad-not", "misc", Target::Global, fixed(1.0));
    r.condition = Condition::Logical {
        op: LogicalOp::Not,
        conditions: vec![
            Condition::Always,
            Condition::Material {
                piece: PieceKind::Queen,
                who: Side::My,
                op: Cmp::Ge,
                count: 1,
            },
        ],
    };
    let err = RuleEvaluator::new(&config(vec![r], &[])).unwrap_err();
    assert!(err.to_string().contains("exactly one"));
}

#[test]
fn clause_conjoined_with_its_negation_is_rejected() {
    let clause = Condition::Material {
        piece: PieceKind::Pawn,
        who: Side::My,
        op: Cmp::Ge,
        count: 5,
    };
    let negated = Condition::Logical {
        op: LogicalOp::Not,
        conditions: vec![clause.clone()],
    };

    let mut direct = rule("contradiction", "misc", Target::Global, fixed(1.0));
    direct.condition = Condition::Logical {
        op: LogicalOp::And,
        conditions: vec![clause.clone(), negated.clone()],
    };
    let err = RuleEvaluator::new(&config(vec![direct], &[])).unwrap_err();
    assert!(err.to_string().contains("self-contradictory"));

    // Validation recurses, so the same shape nested under an Or is
    // caught too.
    let mut nested = rule("nested", "misc", Target::Global, fixed(1.0));
    nested.condition = Condition::Logical {
        op: LogicalOp::Or,
        conditions: vec![
            Condition::Always,
            Condition::Logical {
                op: LogicalOp::And,
                conditions: vec![clause.clone(), negated.clone()],
            },
        ],
    };
    assert!(RuleEvaluator::new(&config(vec![nested], &[])).is_err());

    // A clause or-ed with its negation is a tautology, not an error.
    let mut tautology = rule("tautology", "misc", Target::Global, fixed(1.0));
    tautology.condition = Condition::Logical {
        op: LogicalOp::Or,
        conditions: vec![clause, negated],
    };
    assert!(RuleEvaluator::new(&config(vec![tautology], &[])).is_ok());
}

#[test]
fn bad_formula_is_rejected_and_names_the_rule() {
    let r = rule(
        "broken",
        "misc",
        Target::Global,
        Value::Formula {
            expression: "n +".to_string(),
        },
    );
    let err = RuleEvaluator::new(&config(vec![r], &[])).unwrap_err();
    assert!(err.to_string().contains("broken"));
}

#[test]
fn unknown_json_tag_is_rejected() {
    let json = r#"{
        "name": "bad",
        "rules": [{
            "id": "x",
            "category": "misc",
            "condition": {"type": "always"},
            "target": {"type": "wormholeControl"},
            "value": {"type": "fixed", "value": 1.0}
        }]
    }"#;
    assert!(RuleSetConfig::from_json(json).is_err());
}

#[test]
fn rule_evaluator_symmetry() {
    // A mixed config over a mirrored position pair must agree from the
    // two side-to-move perspectives.
    let config = mixed_config();
    let white = score(&config, "r3k3/1p6/8/8/8/8/1P2Q3/4K3 w - - 0 1");
    let black = score(&config, "4k3/1p2q3/8/8/8/8/1P6/R3K3 b - - 0 1");
    assert_eq!(white, black);
}

/// A configuration touching most target families, value shapes, and
/// condition forms.
fn mixed_config() -> RuleSetConfig {
    let mut rules = vec![
        rule(
            "mat-pawn",
            "material",
            Target::PieceCount {
                piece: PieceSel::Pawn,
            },
            fixed(100.0),
        ),
        rule(
            "mobility-n",
            "activity",
            Target::Mobility {
                piece: PieceKind::Knight,
                capture_weight: 2.0,
            },
            Value::Scaled {
                base: 4.0,
                multiplier: 1.0,
                shape: maxim::rules::model::ScaleShape::SquareRoot,
            },
        ),
        rule(
            "defended-rooks",
            "activity",
            Target::Defense {
                piece: PieceKind::Rook,
                min_defenders: 1,
            },
            fixed(12.0),
        ),
        rule("advance", "pawns", Target::PawnAdvancement, fixed(3.0)),
        rule(
            "doubled",
            "pawns",
            Target::PawnStructure {
                kind: maxim::rules::model::PawnStructureKind::Doubled,
            },
            fixed(-12.0),
        ),
        rule(
            "isolated",
            "pawns",
            Target::PawnStructure {
                kind: maxim::rules::model::PawnStructureKind::Isolated,
            },
            fixed(-15.0),
        ),
        rule("passers", "pawns", Target::PassedPawn, fixed(20.0)),
        rule("king-zone", "safety", Target::KingSafety, fixed(-8.0)),
        rule(
            "core",
            "center",
            Target::CenterControl {
                area: maxim::rules::model::CenterArea::Core,
            },
            fixed(5.0),
        ),
        rule(
            "open-rooks",
            "activity",
            Target::RookFile {
                kind: maxim::rules::model::RookFileKind::Quality,
            },
            Value::Formula {
                expression: "12 * n".to_string(),
            },
        ),
        rule(
            "psqt-n",
            "position",
            Target::PieceSquareTable {
                piece: PieceKind::Knight,
            },
            Value::Scaled {
                base: 1.0,
                multiplier: 0.5,
                shape: maxim::rules::model::ScaleShape::Linear,
            },
        ),
        rule("gives-check", "tactics", Target::Check, fixed(25.0)),
        // Piece distance has no fast lowering: exercises the generic
        // interpreter record inside a compiled set.
        rule(
            "king-tropism",
            "tactics",
            Target::PieceDistance {
                piece1: PieceRef {
                    piece: PieceKind::Queen,
                    who: Side::My,
                },
                piece2: PieceRef {
                    piece: PieceKind::King,
                    who: Side::Opponent,
                },
                metric: maxim::rules::model::DistanceMetric::Chebyshev,
            },
            Value::Formula {
                expression: "max(0, 8 - n) * 2".to_string(),
            },
        ),
    ];

    let mut phase_rule = rule("endgame-push", "pawns", Target::PawnAdvancement, fixed(4.0));
    phase_rule.condition = Condition::GamePhase {
        phases: vec![GamePhase::Endgame, GamePhase::LateEndgame],
    };
    rules.push(phase_rule);

    config(
        rules,
        &[
            ("material", 1.0),
            ("activity", 0.8),
            ("pawns", 1.2),
            ("safety", 1.0),
            ("center", 0.5),
            ("position", 1.0),
            ("tactics", 0.7),
        ],
    )
}

#[test]
fn compiled_and_interpreted_paths_agree() {
    let config = mixed_config();
    let mut set = compile(&config).unwrap();

    for fen in [
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
        "6k1/6pp/8/8/8/8/5PPP/4R1K1 w - - 0 1",
        "4k3/8/4P3/8/8/8/8/4K3 b - - 0 1",
    ] {
        let board = Board::from_str(fen).unwrap();
        let fast = set.score(&board);
        let interpreted = set.score_interpreted(&board);
        assert!(
            (fast - interpreted).abs() < 1e-9,
            "paths disagree on {}: {} vs {}",
            fen,
            fast,
            interpreted
        );
    }
}

#[test]
fn json_round_trip_preserves_scores() {
    let config = mixed_config();
    let json = serde_json::to_string(&config).unwrap();
    let back = RuleSetConfig::from_json(&json).unwrap();

    let fen = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
    assert_eq!(score(&config, fen), score(&back, fen));
}
