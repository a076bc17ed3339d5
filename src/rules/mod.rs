//! The rule-composed evaluator: declarative rules, compiled into
//! family-grouped records sharing one scratch buffer, executed for both
//! sides and aggregated by category.

pub mod compile;
pub mod exec;
pub mod formula;
pub mod model;
pub mod scratch;

pub use compile::{compile, CompiledRuleSet};
pub use exec::RuleEvaluator;
pub use model::{Condition, Rule, RuleSetConfig, Target, Value};
