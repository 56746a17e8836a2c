use crate::models::{BusinessModel, CandidateProfile, DirectoryQuery};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when talking to Supabase's REST layer
#[derive(Debug, Error)]
pub enum SupabaseError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("Unauthorized: invalid API key or token")]
    Unauthorized,

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

/// Table names in the directory schema
#[derive(Debug, Clone)]
pub struct DirectoryTables {
    pub chiropractors: String,
    pub profiles: String,
    pub organizations: String,
    pub modalities: String,
    pub focus_areas: String,
    pub payment_models: String,
}

impl Default for DirectoryTables {
    fn default() -> Self {
        Self {
            chiropractors: "chiropractors".to_string(),
            profiles: "profiles".to_string(),
            organizations: "organizations".to_string(),
            modalities: "modalities".to_string(),
            focus_areas: "focus_areas".to_string(),
            payment_models: "payment_models".to_string(),
        }
    }
}

/// Supabase PostgREST client
///
/// Reads chiropractor records with their practice and association tables
/// embedded in a single request.
pub struct SupabaseClient {
    base_url: String,
    api_key: String,
    client: Client,
    tables: DirectoryTables,
}

impl SupabaseClient {
    /// Create a new Supabase client
    pub fn new(
        base_url: String,
        api_key: String,
        tables: DirectoryTables,
        timeout_secs: u64,
    ) -> Result<Self, SupabaseError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            base_url,
            api_key,
            client,
            tables,
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url.trim_end_matches('/'), table)
    }

    /// PostgREST `select` expression embedding everything scoring needs
    fn select_clause(&self, zip_filtered: bool) -> String {
        let t = &self.tables;
        // !inner turns the embed into a join so the ZIP filter drops rows
        let organization_join = if zip_filtered { "!inner" } else { "" };
        format!(
            "*,profile:{}(first_name,last_name,avatar_url),\
             organization:{}{}(name,city,state,zip_code),\
             modality_rows:{}(name),focus_area_rows:{}(name),payment_model_rows:{}(name)",
            t.profiles, t.organizations, organization_join, t.modalities, t.focus_areas, t.payment_models,
        )
    }

    /// Build the query string for a directory query
    fn build_query(&self, query: &DirectoryQuery) -> String {
        let zip = query
            .zip_code
            .as_deref()
            .map(str::trim)
            .filter(|z| !z.is_empty());

        let mut params = vec![format!(
            "select={}",
            urlencoding::encode(&self.select_clause(zip.is_some()))
        )];

        if let Some(zip) = zip {
            params.push(format!("organization.zip_code=eq.{}", urlencoding::encode(zip)));
        }
        // NULL counts as accepting, `eq.true` would drop those rows
        if query.accepting_only {
            params.push("accepting_new_patients=not.is.false".to_string());
        }
        params.push("order=created_at.desc".to_string());
        params.push(format!("limit={}", query.limit));

        params.join("&")
    }

    /// Fetch candidates matching the coarse pre-filter
    pub async fn fetch_candidates(&self, query: &DirectoryQuery) -> Result<Vec<CandidateProfile>, SupabaseError> {
        let url = format!("{}?{}", self.table_url(&self.tables.chiropractors), self.build_query(query));

        tracing::debug!("Querying directory: {}", url);

        let response = self
            .client
            .get(&url)
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(SupabaseError::Unauthorized);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|_| "Unable to read body".to_string());
            tracing::error!("Directory query failed: {} - {}", status, body);
            return Err(SupabaseError::ApiError(format!("Failed to query chiropractors: {}", status)));
        }

        let json: Value = response.json().await?;
        let rows = json
            .as_array()
            .ok_or_else(|| SupabaseError::InvalidResponse("Expected a JSON array of rows".into()))?;

        let candidates: Vec<CandidateProfile> = rows
            .iter()
            .filter_map(|row| match serde_json::from_value::<ChiropractorRow>(row.clone()) {
                Ok(row) => Some(row.into()),
                Err(e) => {
                    tracing::warn!("Skipping malformed chiropractor row: {}", e);
                    None
                }
            })
            .collect();

        tracing::debug!("Fetched {} candidates (of {} rows)", candidates.len(), rows.len());

        Ok(candidates)
    }

    /// Cheap request to confirm the REST layer is reachable and the key is valid
    pub async fn health_check(&self) -> Result<bool, SupabaseError> {
        let url = format!("{}?select=id&limit=1", self.table_url(&self.tables.chiropractors));

        let response = self
            .client
            .get(&url)
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await?;

        Ok(response.status().is_success())
    }
}

#[derive(Debug, Deserialize)]
struct NamedRow {
    name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ProfileRow {
    first_name: Option<String>,
    last_name: Option<String>,
    avatar_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct OrganizationRow {
    name: Option<String>,
    city: Option<String>,
    state: Option<String>,
    zip_code: Option<String>,
}

/// One row of the embedded chiropractor select
#[derive(Debug, Deserialize)]
struct ChiropractorRow {
    #[serde(deserialize_with = "deserialize_id")]
    id: String,
    #[serde(default)]
    accepting_new_patients: Option<bool>,
    #[serde(default)]
    profile: Option<ProfileRow>,
    #[serde(default)]
    organization: Option<OrganizationRow>,
    #[serde(default)]
    modality_rows: Vec<NamedRow>,
    #[serde(default)]
    focus_area_rows: Vec<NamedRow>,
    #[serde(default)]
    payment_model_rows: Vec<NamedRow>,
    /// Legacy flat column, may hold a JSON array, a JSON-encoded array or a single name
    #[serde(default, deserialize_with = "deserialize_loose_list")]
    modalities: Vec<String>,
}

fn names(rows: Vec<NamedRow>) -> Vec<String> {
    rows.into_iter()
        .filter_map(|r| r.name)
        .filter(|n| !n.trim().is_empty())
        .collect()
}

impl From<ChiropractorRow> for CandidateProfile {
    fn from(row: ChiropractorRow) -> Self {
        let profile = row.profile.unwrap_or_default();
        let organization = row.organization.unwrap_or_default();

        let mut modalities = names(row.modality_rows);
        if modalities.is_empty() {
            modalities = row.modalities;
        }
        let payment_models = names(row.payment_model_rows);

        CandidateProfile {
            id: row.id,
            first_name: profile.first_name.unwrap_or_default(),
            last_name: profile.last_name.unwrap_or_default(),
            clinic_name: organization.name,
            avatar_url: profile.avatar_url,
            accepting_new_patients: row.accepting_new_patients.unwrap_or(true),
            modalities,
            focus_areas: names(row.focus_area_rows),
            business_model: BusinessModel::from_payment_models(&payment_models),
            zip_code: organization.zip_code,
            city: organization.city,
            state: organization.state,
        }
    }
}

/// Ids arrive as uuid strings or integers
fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!("unexpected id: {}", other))),
    }
}

fn deserialize_loose_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(loose_list(Value::deserialize(deserializer)?))
}

/// Normalize a column that may hold a list in several shapes
pub(crate) fn loose_list(value: Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .filter(|s| !s.trim().is_empty())
            .collect(),
        Value::String(s) if s.trim().is_empty() => vec![],
        Value::String(s) => match serde_json::from_str::<Value>(&s) {
            Ok(parsed @ Value::Array(_)) => loose_list(parsed),
            _ => vec![s],
        },
        _ => vec![],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn test_client() -> SupabaseClient {
        SupabaseClient::new(
            "https://project.supabase.co/".to_string(),
            "anon_key".to_string(),
            DirectoryTables::default(),
            10,
        )
        .unwrap()
    }

    #[test]
    fn test_build_query_with_zip() {
        let client = test_client();
        let query = DirectoryQuery {
            zip_code: Some("10001".to_string()),
            accepting_only: true,
            limit: 50,
        };

        let qs = client.build_query(&query);

        assert!(qs.contains("organization.zip_code=eq.10001"));
        assert!(qs.contains("accepting_new_patients=not.is.false"));
        assert!(qs.ends_with("limit=50"));
        assert!(qs.contains(&*urlencoding::encode("organizations!inner(")));
    }

    #[test]
    fn test_build_query_without_zip() {
        let client = test_client();
        let query = DirectoryQuery {
            zip_code: Some(" ".to_string()),
            accepting_only: false,
            limit: 10,
        };

        let qs = client.build_query(&query);

        assert!(!qs.contains("zip_code=eq"));
        assert!(!qs.contains("accepting_new_patients="));
        assert!(!qs.contains(&*urlencoding::encode("!inner")));
        assert_eq!(client.table_url("chiropractors"), "https://project.supabase.co/rest/v1/chiropractors");
    }

    #[test]
    fn test_row_into_candidate() {
        let row: ChiropractorRow = serde_json::from_value(json!({
            "id": "7d1c",
            "accepting_new_patients": null,
            "profile": { "first_name": "Dana", "last_name": "Reyes", "avatar_url": null },
            "organization": { "name": "Midtown Spine", "city": "New York", "state": "NY", "zip_code": "10001" },
            "modality_rows": [{ "name": "Gonstead" }, { "name": null }],
            "focus_area_rows": [{ "name": "Sports" }],
            "payment_model_rows": [{ "name": "cash" }, { "name": "insurance" }],
            "modalities": null
        }))
        .unwrap();

        let candidate = CandidateProfile::from(row);

        assert_eq!(candidate.display_name(), "Dana Reyes");
        assert_eq!(candidate.clinic_name.as_deref(), Some("Midtown Spine"));
        assert_eq!(candidate.zip_code.as_deref(), Some("10001"));
        assert_eq!(candidate.modalities, vec!["Gonstead"]);
        assert_eq!(candidate.focus_areas, vec!["Sports"]);
        assert_eq!(candidate.business_model, Some(BusinessModel::Hybrid));
        assert!(candidate.accepting_new_patients);
    }

    #[test]
    fn test_row_falls_back_to_flat_modalities() {
        let row: ChiropractorRow = serde_json::from_value(json!({
            "id": 42,
            "modalities": "[\"Activator\",\"Thompson\"]"
        }))
        .unwrap();

        let candidate = CandidateProfile::from(row);

        assert_eq!(candidate.id, "42");
        assert_eq!(candidate.modalities, vec!["Activator", "Thompson"]);
        assert_eq!(candidate.business_model, None);
    }

    #[test]
    fn test_loose_list_shapes() {
        assert_eq!(loose_list(json!(["Gonstead", ""])), vec!["Gonstead"]);
        assert_eq!(loose_list(json!("Diversified")), vec!["Diversified"]);
        assert_eq!(loose_list(json!("[\"SOT\"]")), vec!["SOT"]);
        assert!(loose_list(json!(null)).is_empty());
        assert!(loose_list(json!("")).is_empty());
    }
}
