pub mod context;
pub mod ordering;
pub mod picker;
#[allow(clippy::module_inception)]
pub mod search;
pub mod see;
pub mod tt;

pub use search::{search, Limits, SearchInfo, SearchResult, MATE_SCORE, MATE_THRESHOLD};
