//! Find My Chiro match service
//!
//! Ranks chiropractors against a patient's search filters with a point-additive
//! match score, fetching candidates from the Supabase-hosted directory.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use core::{filter_strength, Matcher, MatchResult};
pub use models::{BusinessModel, CandidateProfile, ScoredCandidate, ScoringPoints, SearchFilters};
