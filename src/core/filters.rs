use crate::models::{BusinessModel, CandidateProfile, ScoringPoints, SearchFilters};

/// Insurance answers that mean the patient is paying out of pocket
const SELF_PAY_ANSWERS: &[&str] = &[
    "any",
    "none",
    "no insurance",
    "no-insurance",
    "no_insurance",
    "self-pay",
    "self pay",
    "self_pay",
    "cash",
    "uninsured",
];

/// Return the trimmed value if it carries a preference
///
/// Blank strings and the UI's `"any"` option count as no preference.
#[inline]
pub fn preference(value: Option<&str>) -> Option<&str> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("any"))
}

/// Lowercased, de-duplicated, non-blank preference terms in input order
pub fn normalize_terms(terms: &[String]) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::with_capacity(terms.len());
    for term in terms {
        let term = term.trim().to_lowercase();
        if !term.is_empty() && !normalized.contains(&term) {
            normalized.push(term);
        }
    }
    normalized
}

/// Overlap between preferred terms and a candidate's attributes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TermOverlap {
    /// Preferred terms found in at least one candidate attribute
    pub matched_terms: usize,
    /// Number of distinct preferred terms
    pub preferred_terms: usize,
    /// Candidate attributes that contained a preferred term
    pub matched_attributes: Vec<String>,
}

impl TermOverlap {
    /// Fraction of preferred terms matched, or `None` if the criterion can't be evaluated
    pub fn ratio(&self) -> Option<f64> {
        if self.preferred_terms == 0 {
            None
        } else {
            Some(self.matched_terms as f64 / self.preferred_terms as f64)
        }
    }
}

/// Count preferred terms that appear as a case-insensitive substring of any
/// candidate attribute.
///
/// "Cox" matches a candidate's "Cox Flexion-Distraction". Returns an empty
/// overlap when either side is empty.
pub fn term_overlap(preferred: &[String], attributes: &[String]) -> TermOverlap {
    let terms = normalize_terms(preferred);
    let lowered: Vec<(String, &String)> = attributes
        .iter()
        .filter(|a| !a.trim().is_empty())
        .map(|a| (a.to_lowercase(), a))
        .collect();

    if terms.is_empty() || lowered.is_empty() {
        return TermOverlap::default();
    }

    let mut overlap = TermOverlap {
        preferred_terms: terms.len(),
        ..Default::default()
    };

    for term in &terms {
        let mut found = false;
        for (attribute, original) in &lowered {
            if attribute.contains(term.as_str()) {
                found = true;
                if !overlap.matched_attributes.contains(*original) {
                    overlap.matched_attributes.push((*original).clone());
                }
            }
        }
        if found {
            overlap.matched_terms += 1;
        }
    }

    overlap
}

/// Location points: exact ZIP, then city or state, else nothing.
/// Without a ZIP the criterion can't be evaluated and the partial credit is free.
pub fn location_points(
    candidate: &CandidateProfile,
    filters: &SearchFilters,
    points: &ScoringPoints,
) -> f64 {
    let Some(zip) = preference(filters.zip_code.as_deref()) else {
        return points.location_partial;
    };

    if preference(candidate.zip_code.as_deref()) == Some(zip) {
        return points.location_exact;
    }

    let same = |wanted: Option<&str>, actual: Option<&str>| match (preference(wanted), preference(actual)) {
        (Some(w), Some(a)) => w.eq_ignore_ascii_case(a),
        _ => false,
    };

    if same(filters.city.as_deref(), candidate.city.as_deref())
        || same(filters.state.as_deref(), candidate.state.as_deref())
    {
        points.location_partial
    } else {
        0.0
    }
}

/// Business model points: exact match, or partial credit across hybrid
pub fn business_model_points(
    candidate: Option<BusinessModel>,
    preferred: Option<BusinessModel>,
    points: &ScoringPoints,
) -> f64 {
    match (preferred, candidate) {
        (Some(p), Some(c)) if p == c => points.business_model_exact,
        (Some(BusinessModel::Hybrid), Some(_)) | (Some(_), Some(BusinessModel::Hybrid)) => {
            points.business_model_partial
        }
        _ => 0.0,
    }
}

/// Whether the patient named an insurer rather than paying out of pocket
pub fn has_insurance(insurance_type: Option<&str>) -> bool {
    preference(insurance_type)
        .map(|i| !SELF_PAY_ANSWERS.iter().any(|s| i.eq_ignore_ascii_case(s)))
        .unwrap_or(false)
}

/// Insurance bonus.
///
/// No insurer acceptance list is modeled, so any practice that bills
/// insurance is assumed to take the patient's plan.
pub fn insurance_points(
    candidate: Option<BusinessModel>,
    insurance_type: Option<&str>,
    points: &ScoringPoints,
) -> f64 {
    match candidate {
        Some(model) if model.bills_insurance() && has_insurance(insurance_type) => points.insurance,
        _ => 0.0,
    }
}

/// How much the patient has told us, as a 0-100 "match potential".
///
/// Looks only at the filters, never at candidates.
pub fn filter_strength(filters: &SearchFilters) -> u8 {
    let mut strength: u32 = 0;

    if preference(filters.zip_code.as_deref()).is_some() {
        strength += 10;
    }
    if !normalize_terms(&filters.preferred_modalities).is_empty() {
        strength += 20;
    }
    if !normalize_terms(&filters.focus_areas).is_empty() {
        strength += 20;
    }
    if !normalize_terms(&filters.preferred_philosophies).is_empty() {
        strength += 15;
    }
    if filters.preferred_business_model.is_some() {
        strength += 15;
    }
    if preference(filters.insurance_type.as_deref()).is_some() {
        strength += 10;
    }
    if preference(filters.budget_range.as_deref()).is_some() {
        strength += 10;
    }

    strength.min(100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn candidate_at(zip: Option<&str>, city: Option<&str>, state: Option<&str>) -> CandidateProfile {
        CandidateProfile {
            id: "c1".to_string(),
            zip_code: zip.map(str::to_string),
            city: city.map(str::to_string),
            state: state.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_term_overlap_substring() {
        let overlap = term_overlap(
            &strings(&["cox", "Gonstead"]),
            &strings(&["Cox Flexion-Distraction", "Diversified"]),
        );

        assert_eq!(overlap.matched_terms, 1);
        assert_eq!(overlap.preferred_terms, 2);
        assert_eq!(overlap.matched_attributes, vec!["Cox Flexion-Distraction"]);
        assert_eq!(overlap.ratio(), Some(0.5));
    }

    #[test]
    fn test_term_overlap_empty_sides() {
        assert_eq!(term_overlap(&[], &strings(&["Gonstead"])).ratio(), None);
        assert_eq!(term_overlap(&strings(&["Gonstead"]), &[]).ratio(), None);
        assert_eq!(term_overlap(&strings(&["  "]), &strings(&["Gonstead"])).ratio(), None);
    }

    #[test]
    fn test_term_overlap_dedupes_preferences() {
        let overlap = term_overlap(&strings(&["Sports", "sports"]), &strings(&["Sports"]));
        assert_eq!(overlap.preferred_terms, 1);
        assert_eq!(overlap.ratio(), Some(1.0));
    }

    #[test]
    fn test_location_points() {
        let points = ScoringPoints::default();
        let filters = SearchFilters {
            zip_code: Some("10001".to_string()),
            city: Some("Brooklyn".to_string()),
            ..Default::default()
        };

        assert_eq!(location_points(&candidate_at(Some("10001"), None, None), &filters, &points), 20.0);
        assert_eq!(location_points(&candidate_at(Some("11201"), Some("brooklyn"), None), &filters, &points), 10.0);
        assert_eq!(location_points(&candidate_at(Some("11201"), Some("Queens"), Some("NY")), &filters, &points), 0.0);
        assert_eq!(location_points(&candidate_at(None, None, None), &SearchFilters::default(), &points), 10.0);
    }

    #[test]
    fn test_location_blank_zip_is_no_preference() {
        let points = ScoringPoints::default();
        let filters = SearchFilters {
            zip_code: Some("  ".to_string()),
            ..Default::default()
        };
        assert_eq!(location_points(&candidate_at(Some("10001"), None, None), &filters, &points), 10.0);
    }

    #[test]
    fn test_business_model_points() {
        let points = ScoringPoints::default();
        use BusinessModel::*;

        assert_eq!(business_model_points(Some(Cash), Some(Cash), &points), 20.0);
        assert_eq!(business_model_points(Some(Cash), Some(Hybrid), &points), 10.0);
        assert_eq!(business_model_points(Some(Hybrid), Some(Insurance), &points), 10.0);
        assert_eq!(business_model_points(Some(Insurance), Some(Cash), &points), 0.0);
        assert_eq!(business_model_points(None, Some(Hybrid), &points), 0.0);
        assert_eq!(business_model_points(Some(Hybrid), None, &points), 0.0);
    }

    #[test]
    fn test_insurance_points() {
        let points = ScoringPoints::default();
        use BusinessModel::*;

        assert_eq!(insurance_points(Some(Insurance), Some("BCBS"), &points), 10.0);
        assert_eq!(insurance_points(Some(Hybrid), Some("Aetna"), &points), 10.0);
        assert_eq!(insurance_points(Some(Cash), Some("BCBS"), &points), 0.0);
        assert_eq!(insurance_points(Some(Insurance), Some("Self-Pay"), &points), 0.0);
        assert_eq!(insurance_points(Some(Insurance), Some("any"), &points), 0.0);
        assert_eq!(insurance_points(None, Some("BCBS"), &points), 0.0);
    }

    #[test]
    fn test_filter_strength() {
        assert_eq!(filter_strength(&SearchFilters::default()), 0);

        let filters = SearchFilters {
            zip_code: Some("10001".to_string()),
            preferred_modalities: strings(&["Gonstead"]),
            focus_areas: strings(&["Sports"]),
            preferred_philosophies: strings(&["Holistic"]),
            preferred_business_model: Some(BusinessModel::Cash),
            insurance_type: Some("BCBS".to_string()),
            budget_range: Some("50-100".to_string()),
            ..Default::default()
        };
        assert_eq!(filter_strength(&filters), 100);

        let filters = SearchFilters {
            zip_code: Some("10001".to_string()),
            budget_range: Some("any".to_string()),
            ..Default::default()
        };
        assert_eq!(filter_strength(&filters), 10);
    }
}
