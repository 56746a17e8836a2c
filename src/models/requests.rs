use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::models::domain::{BusinessModel, CandidateProfile, SearchFilters};

/// Request to search the directory
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SearchRequest {
    #[serde(default)]
    #[validate(custom(function = "validate_filters"))]
    pub filters: SearchFilters,
    #[serde(default = "default_limit")]
    #[validate(range(min = 1, max = 100))]
    pub limit: u16,
}

fn default_limit() -> u16 {
    20
}

/// Request to score a caller-supplied candidate list without touching the directory
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ScoreRequest {
    #[serde(default)]
    #[validate(custom(function = "validate_filters"))]
    pub filters: SearchFilters,
    #[serde(default)]
    #[validate(length(max = 1000))]
    pub candidates: Vec<CandidateProfile>,
}

/// Query-string form of a search, e.g. `/search?zip=10001&modalities=Gonstead,Activator`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    #[serde(alias = "zipCode")]
    pub zip: Option<String>,
    pub modalities: Option<String>,
    pub focus_areas: Option<String>,
    pub business_model: Option<String>,
    pub insurance: Option<String>,
    pub budget: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub philosophies: Option<String>,
    pub limit: Option<u16>,
}

impl SearchParams {
    pub fn into_request(self, default_limit: u16) -> SearchRequest {
        SearchRequest {
            filters: SearchFilters {
                zip_code: self.zip,
                preferred_modalities: split_list(self.modalities.as_deref()),
                focus_areas: split_list(self.focus_areas.as_deref()),
                preferred_business_model: self.business_model.as_deref().and_then(BusinessModel::parse),
                insurance_type: self.insurance,
                budget_range: self.budget,
                city: self.city,
                state: self.state,
                preferred_philosophies: split_list(self.philosophies.as_deref()),
            },
            limit: self.limit.unwrap_or(default_limit),
        }
    }
}

/// Split a comma-separated query value, dropping blank entries
fn split_list(value: Option<&str>) -> Vec<String> {
    value
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn validate_filters(filters: &SearchFilters) -> Result<(), ValidationError> {
    if let Some(zip) = filters.zip_code.as_deref().map(str::trim) {
        if !zip.is_empty() && (zip.len() > 10 || !zip.chars().all(|c| c.is_ascii_digit() || c == '-')) {
            return Err(ValidationError::new("invalid_zip_code"));
        }
    }

    if filters.preferred_modalities.len() > 50 || filters.focus_areas.len() > 50 {
        return Err(ValidationError::new("too_many_terms"));
    }

    Ok(())
}
