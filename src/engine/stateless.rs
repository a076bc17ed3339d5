//! One-shot search entry for parallel batch drivers.
//!
//! Each call owns a fresh engine for its whole duration and retains
//! nothing afterwards, so any number of calls may run concurrently
//! without ordering or aliasing concerns.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::engine::Engine;
use crate::error::{ConfigError, EngineError};
use crate::rules::RuleSetConfig;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub fen: String,
    #[serde(default)]
    pub depth: u32,
    #[serde(default)]
    pub time_ms: u64,
    /// Optional rule-evaluator configuration applied before searching.
    #[serde(default)]
    pub eval_config: Option<RuleSetConfig>,
}

impl SearchRequest {
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        serde_json::from_str(json).map_err(|e| {
            EngineError::Config(ConfigError::Malformed {
                detail: e.to_string(),
            })
        })
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub best_move: String,
}

/// Build an isolated engine, apply the optional evaluator
/// configuration, search, and return the best move.
pub fn run_search(request: &SearchRequest) -> Result<SearchResponse, EngineError> {
    let mut engine = Engine::new();
    engine.set_fen(&request.fen)?;
    if let Some(config) = &request.eval_config {
        engine.configure_rule_evaluator(config)?;
    }

    let best_move = engine.search_move(request.depth, request.time_ms);
    debug!(fen = %request.fen, depth = request.depth, best = %best_move, "stateless search done");

    Ok(SearchResponse { best_move })
}

/// JSON-in, JSON-out shim over `run_search`.
pub fn run_search_json(json: &str) -> Result<String, EngineError> {
    let request = SearchRequest::from_json(json)?;
    let response = run_search(&request)?;
    serde_json::to_string(&response).map_err(|e| {
        EngineError::Config(ConfigError::Malformed {
            detail: e.to_string(),
        })
    })
}
