// Core algorithm exports
pub mod filters;
pub mod matcher;
pub mod scoring;

pub use filters::{filter_strength, term_overlap, TermOverlap};
pub use matcher::{Matcher, MatchResult};
pub use scoring::{calculate_match_score, score_candidate};
