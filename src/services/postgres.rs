use crate::models::{BusinessModel, CandidateProfile, DirectoryQuery};
use crate::services::supabase::DirectoryTables;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when interacting with PostgreSQL
#[derive(Debug, Error)]
pub enum PostgresError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Direct PostgreSQL access to the directory tables
///
/// Same data the REST layer serves, read with one aggregated join instead of
/// embedded resources. Useful when the service runs next to the database.
pub struct PostgresClient {
    pool: PgPool,
    candidates_sql: String,
}

impl PostgresClient {
    /// Create a new PostgreSQL client from a connection string
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout_secs: u64,
        idle_timeout_secs: u64,
        tables: &DirectoryTables,
    ) -> Result<Self, PostgresError> {
        let candidates_sql = candidates_sql(tables)?;

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(acquire_timeout_secs))
            .idle_timeout(Duration::from_secs(idle_timeout_secs))
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        Ok(Self { pool, candidates_sql })
    }

    /// Create a new PostgreSQL client from settings
    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
        acquire_timeout_secs: Option<u64>,
        idle_timeout_secs: Option<u64>,
        tables: &DirectoryTables,
    ) -> Result<Self, PostgresError> {
        tracing::info!("Connecting to PostgreSQL directory");

        Self::new(
            url,
            max_connections.unwrap_or(10),
            min_connections.unwrap_or(1),
            acquire_timeout_secs.unwrap_or(5),
            idle_timeout_secs.unwrap_or(600),
            tables,
        )
        .await
    }

    /// Fetch candidates matching the coarse pre-filter
    pub async fn fetch_candidates(&self, query: &DirectoryQuery) -> Result<Vec<CandidateProfile>, PostgresError> {
        let zip = query
            .zip_code
            .as_deref()
            .map(str::trim)
            .filter(|z| !z.is_empty());
        let limit = i64::try_from(query.limit)
            .map_err(|_| PostgresError::InvalidInput(format!("limit too large: {}", query.limit)))?;

        let rows = sqlx::query(&self.candidates_sql)
            .bind(zip)
            .bind(query.accepting_only)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        let candidates = rows
            .iter()
            .map(row_to_candidate)
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!("Fetched {} candidates from PostgreSQL", candidates.len());

        Ok(candidates)
    }

    /// Health check for the database connection
    pub async fn health_check(&self) -> Result<bool, PostgresError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}

fn row_to_candidate(row: &PgRow) -> Result<CandidateProfile, PostgresError> {
    let payment_models: Vec<String> = row.try_get("payment_models")?;

    Ok(CandidateProfile {
        id: row.try_get("id")?,
        first_name: row.try_get::<Option<String>, _>("first_name")?.unwrap_or_default(),
        last_name: row.try_get::<Option<String>, _>("last_name")?.unwrap_or_default(),
        clinic_name: row.try_get("clinic_name")?,
        avatar_url: row.try_get("avatar_url")?,
        accepting_new_patients: row.try_get::<Option<bool>, _>("accepting_new_patients")?.unwrap_or(true),
        modalities: row.try_get("modalities")?,
        focus_areas: row.try_get("focus_areas")?,
        business_model: BusinessModel::from_payment_models(&payment_models),
        zip_code: row.try_get("zip_code")?,
        city: row.try_get("city")?,
        state: row.try_get("state")?,
    })
}

/// Table names are interpolated into SQL, so only plain identifiers are allowed
fn identifier(name: &str) -> Result<&str, PostgresError> {
    let valid = !name.is_empty()
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !name.starts_with(|c: char| c.is_ascii_digit());

    if valid {
        Ok(name)
    } else {
        Err(PostgresError::InvalidInput(format!("invalid table name: {}", name)))
    }
}

/// Aggregated candidate query
///
/// $1 = ZIP code or NULL, $2 = accepting new patients only, $3 = row limit.
/// Association tables follow the `chiropractor_<table>` naming with
/// `chiropractor_id` and a singular `<entity>_id` column.
fn candidates_sql(tables: &DirectoryTables) -> Result<String, PostgresError> {
    let chiropractors = identifier(&tables.chiropractors)?;
    let profiles = identifier(&tables.profiles)?;
    let organizations = identifier(&tables.organizations)?;
    let modalities = identifier(&tables.modalities)?;
    let focus_areas = identifier(&tables.focus_areas)?;
    let payment_models = identifier(&tables.payment_models)?;

    Ok(format!(
        r#"
        SELECT
            c.id::text AS id,
            p.first_name,
            p.last_name,
            p.avatar_url,
            o.name AS clinic_name,
            o.city,
            o.state,
            o.zip_code,
            c.accepting_new_patients,
            COALESCE(array_agg(DISTINCT m.name) FILTER (WHERE m.name IS NOT NULL), '{{}}') AS modalities,
            COALESCE(array_agg(DISTINCT f.name) FILTER (WHERE f.name IS NOT NULL), '{{}}') AS focus_areas,
            COALESCE(array_agg(DISTINCT pm.name) FILTER (WHERE pm.name IS NOT NULL), '{{}}') AS payment_models
        FROM {chiropractors} c
        LEFT JOIN {profiles} p ON p.id = c.id
        LEFT JOIN {organizations} o ON o.id = c.organization_id
        LEFT JOIN chiropractor_{modalities} cm ON cm.chiropractor_id = c.id
        LEFT JOIN {modalities} m ON m.id = cm.modality_id
        LEFT JOIN chiropractor_{focus_areas} cf ON cf.chiropractor_id = c.id
        LEFT JOIN {focus_areas} f ON f.id = cf.focus_area_id
        LEFT JOIN chiropractor_{payment_models} cp ON cp.chiropractor_id = c.id
        LEFT JOIN {payment_models} pm ON pm.id = cp.payment_model_id
        WHERE ($1::text IS NULL OR o.zip_code = $1)
          AND (NOT $2 OR COALESCE(c.accepting_new_patients, true))
        GROUP BY c.id, p.id, o.id
        ORDER BY c.created_at DESC
        LIMIT $3
        "#
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidates_sql_uses_configured_tables() {
        let tables = DirectoryTables {
            chiropractors: "chiros".to_string(),
            ..Default::default()
        };

        let sql = candidates_sql(&tables).unwrap();

        assert!(sql.contains("FROM chiros c"));
        assert!(sql.contains("LEFT JOIN chiropractor_modalities cm"));
        assert!(sql.contains("'{}'"));
    }

    #[test]
    fn test_rejects_unsafe_table_names() {
        let tables = DirectoryTables {
            organizations: "orgs; DROP TABLE x".to_string(),
            ..Default::default()
        };

        assert!(matches!(candidates_sql(&tables), Err(PostgresError::InvalidInput(_))));
        assert!(identifier("1table").is_err());
        assert!(identifier("focus_areas").is_ok());
    }
}
