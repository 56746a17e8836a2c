use crate::models::domain::match_percent;
use crate::models::{CandidateProfile, MatchTier, ScoreBreakdown, ScoredCandidate, ScoringPoints, SearchFilters};
use crate::core::filters::{business_model_points, insurance_points, location_points, term_overlap};

/// Score a single candidate against a patient's filters
///
/// Scoring formula (default points):
/// score = min(100,
///     10                          # base, always awarded
///   + location       (0/10/20)    # exact ZIP 20, city or state 10, no ZIP given 10
///   + modalities     (0..30)      # 30 * matched / preferred
///   + focus_areas    (0..20)      # 20 * matched / preferred
///   + business_model (0/10/20)    # exact 20, hybrid on either side 10
///   + insurance      (0/10)       # insured patient, practice bills insurance
/// )
///
/// Never fails: missing candidate fields simply earn nothing for that criterion.
pub fn calculate_match_score(
    candidate: &CandidateProfile,
    filters: &SearchFilters,
    points: &ScoringPoints,
) -> (ScoreBreakdown, Vec<String>, Vec<String>) {
    let modality_overlap = term_overlap(&filters.preferred_modalities, &candidate.modalities);
    let focus_overlap = term_overlap(&filters.focus_areas, &candidate.focus_areas);

    let breakdown = ScoreBreakdown {
        base: points.base,
        location: location_points(candidate, filters, points),
        modalities: modality_overlap
            .ratio()
            .map_or(0.0, |ratio| points.modalities * ratio),
        focus_areas: focus_overlap
            .ratio()
            .map_or(0.0, |ratio| points.focus_areas * ratio),
        business_model: business_model_points(
            candidate.business_model,
            filters.preferred_business_model,
            points,
        ),
        insurance: insurance_points(
            candidate.business_model,
            filters.insurance_type.as_deref(),
            points,
        ),
    };

    (
        breakdown,
        modality_overlap.matched_attributes,
        focus_overlap.matched_attributes,
    )
}

/// Score a candidate and wrap it for the response
pub fn score_candidate(
    candidate: CandidateProfile,
    filters: &SearchFilters,
    points: &ScoringPoints,
) -> ScoredCandidate {
    let (breakdown, matched_modalities, matched_focus_areas) =
        calculate_match_score(&candidate, filters, points);
    let match_score = breakdown.total();
    let percent = match_percent(match_score);
    let match_tier = MatchTier::from_percent(percent);

    ScoredCandidate {
        display_name: candidate.display_name(),
        badge_color: match_tier.badge_color().to_string(),
        candidate,
        match_score,
        match_percent: percent,
        match_tier,
        breakdown,
        matched_modalities,
        matched_focus_areas,
    }
}
