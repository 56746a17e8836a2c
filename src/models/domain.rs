use serde::{Deserialize, Deserializer, Serialize};

/// Payment structure of a practice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BusinessModel {
    Cash,
    Insurance,
    Hybrid,
}

impl BusinessModel {
    /// Parse a business model label, case-insensitively.
    ///
    /// Blank values and the UI's `"any"` sentinel mean "no preference" and
    /// return `None`, as does anything unrecognised.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "cash" | "cash-based" | "cash_based" | "cash-only" | "cash_only" | "self-pay" => {
                Some(BusinessModel::Cash)
            }
            "insurance" | "insurance-based" | "insurance_based" => Some(BusinessModel::Insurance),
            "hybrid" | "mixed" => Some(BusinessModel::Hybrid),
            _ => None,
        }
    }

    /// Derive a practice's business model from its payment-model associations
    ///
    /// An explicit hybrid entry, or both a cash and an insurance entry, makes
    /// the practice hybrid.
    pub fn from_payment_models<S: AsRef<str>>(payment_models: &[S]) -> Option<Self> {
        let mut cash = false;
        let mut insurance = false;

        for model in payment_models {
            match Self::parse(model.as_ref()) {
                Some(BusinessModel::Hybrid) => return Some(BusinessModel::Hybrid),
                Some(BusinessModel::Cash) => cash = true,
                Some(BusinessModel::Insurance) => insurance = true,
                None => {}
            }
        }

        match (cash, insurance) {
            (true, true) => Some(BusinessModel::Hybrid),
            (true, false) => Some(BusinessModel::Cash),
            (false, true) => Some(BusinessModel::Insurance),
            (false, false) => None,
        }
    }

    /// Whether an insurance-carrying patient can plausibly be billed here
    pub fn bills_insurance(&self) -> bool {
        matches!(self, BusinessModel::Insurance | BusinessModel::Hybrid)
    }
}

/// Patient search filters
///
/// Every field is optional. An absent field, a blank string or `"any"` means
/// the patient has no preference.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchFilters {
    pub zip_code: Option<String>,
    pub preferred_modalities: Vec<String>,
    pub focus_areas: Vec<String>,
    #[serde(deserialize_with = "deserialize_business_model")]
    pub preferred_business_model: Option<BusinessModel>,
    pub insurance_type: Option<String>,
    pub budget_range: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub preferred_philosophies: Vec<String>,
}

/// Chiropractor record as fetched from the directory
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateProfile {
    pub id: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub clinic_name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default = "default_true")]
    pub accepting_new_patients: bool,
    #[serde(default)]
    pub modalities: Vec<String>,
    #[serde(default)]
    pub focus_areas: Vec<String>,
    #[serde(default, deserialize_with = "deserialize_business_model")]
    pub business_model: Option<BusinessModel>,
    #[serde(default)]
    pub zip_code: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
}

impl CandidateProfile {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }
}

fn default_true() -> bool { true }

/// Accepts a business model label or null; unknown labels become `None`
fn deserialize_business_model<'de, D>(deserializer: D) -> Result<Option<BusinessModel>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.as_deref().and_then(BusinessModel::parse))
}

/// Points awarded per criterion for a single candidate
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub base: f64,
    pub location: f64,
    pub modalities: f64,
    pub focus_areas: f64,
    pub business_model: f64,
    pub insurance: f64,
}

impl ScoreBreakdown {
    /// Sum of all criteria before clamping
    pub fn raw_total(&self) -> f64 {
        self.base
            + self.location
            + self.modalities
            + self.focus_areas
            + self.business_model
            + self.insurance
    }

    /// Final match score, clamped to `[0, 100]`
    pub fn total(&self) -> f64 {
        self.raw_total().clamp(0.0, 100.0)
    }
}

/// Display band for a match score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchTier {
    High,
    Medium,
    Low,
}

impl MatchTier {
    pub fn from_percent(percent: u8) -> Self {
        match percent {
            70..=u8::MAX => MatchTier::High,
            40..=69 => MatchTier::Medium,
            _ => MatchTier::Low,
        }
    }

    pub fn badge_color(&self) -> &'static str {
        match self {
            MatchTier::High => "green",
            MatchTier::Medium => "yellow",
            MatchTier::Low => "red",
        }
    }
}

/// Candidate with its match score
///
/// `matchScore` is the unrounded score, `matchPercent` the whole percentage
/// shown on the card. Tier and badge color follow the percentage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredCandidate {
    #[serde(flatten)]
    pub candidate: CandidateProfile,
    pub display_name: String,
    pub match_score: f64,
    pub match_percent: u8,
    pub match_tier: MatchTier,
    pub badge_color: String,
    pub breakdown: ScoreBreakdown,
    pub matched_modalities: Vec<String>,
    pub matched_focus_areas: Vec<String>,
}

/// Round a match score to a whole percentage
pub fn match_percent(score: f64) -> u8 {
    score.round().clamp(0.0, 100.0) as u8
}

/// Coarse pre-filter handed to the directory backend
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DirectoryQuery {
    pub zip_code: Option<String>,
    pub accepting_only: bool,
    pub limit: usize,
}

/// Points available per criterion
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringPoints {
    pub base: f64,
    pub location_exact: f64,
    pub location_partial: f64,
    pub modalities: f64,
    pub focus_areas: f64,
    pub business_model_exact: f64,
    pub business_model_partial: f64,
    pub insurance: f64,
}

impl Default for ScoringPoints {
    fn default() -> Self {
        Self {
            base: 10.0,
            location_exact: 20.0,
            location_partial: 10.0,
            modalities: 30.0,
            focus_areas: 20.0,
            business_model_exact: 20.0,
            business_model_partial: 10.0,
            insurance: 10.0,
        }
    }
}
