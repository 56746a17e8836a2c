// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    BusinessModel, CandidateProfile, DirectoryQuery, MatchTier, ScoreBreakdown, ScoredCandidate,
    ScoringPoints, SearchFilters,
};
pub use requests::{ScoreRequest, SearchParams, SearchRequest};
pub use responses::{ErrorResponse, FilterStrengthResponse, HealthResponse, SearchResponse};
