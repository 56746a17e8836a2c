use crate::models::{CandidateProfile, ScoredCandidate, ScoringPoints, SearchFilters};
use crate::core::scoring::score_candidate;

/// Result of the ranking process
#[derive(Debug)]
pub struct MatchResult {
    pub matches: Vec<ScoredCandidate>,
    pub total_candidates: usize,
}

/// Scores and ranks directory candidates against a patient's filters
///
/// The matcher never drops a candidate: narrowing the pool is the directory
/// query's job, the matcher only orders it.
#[derive(Debug, Clone)]
pub struct Matcher {
    points: ScoringPoints,
}

impl Matcher {
    pub fn new(points: ScoringPoints) -> Self {
        Self { points }
    }

    pub fn with_default_points() -> Self {
        Self {
            points: ScoringPoints::default(),
        }
    }

    pub fn points(&self) -> &ScoringPoints {
        &self.points
    }

    /// Score every candidate, preserving input order
    pub fn score(&self, candidates: Vec<CandidateProfile>, filters: &SearchFilters) -> Vec<ScoredCandidate> {
        candidates
            .into_iter()
            .map(|candidate| score_candidate(candidate, filters, &self.points))
            .collect()
    }

    /// Score and rank candidates
    ///
    /// # Arguments
    /// * `filters` - The patient's search filters
    /// * `candidates` - Candidates fetched from the directory
    /// * `limit` - Maximum number of matches to return, `None` for all
    ///
    /// # Returns
    /// MatchResult with matches sorted by score, descending. Equal scores keep
    /// their input order.
    pub fn rank(
        &self,
        filters: &SearchFilters,
        candidates: Vec<CandidateProfile>,
        limit: Option<usize>,
    ) -> MatchResult {
        let total_candidates = candidates.len();

        let mut matches = self.score(candidates, filters);

        // sort_by is stable
        matches.sort_by(|a, b| b.match_score.total_cmp(&a.match_score));

        if let Some(limit) = limit {
            matches.truncate(limit);
        }

        MatchResult {
            matches,
            total_candidates,
        }
    }
}

impl Default for Matcher {
    fn default() -> Self {
        Self::with_default_points()
    }
}
