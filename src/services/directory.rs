use crate::core::filters::preference;
use crate::models::{CandidateProfile, DirectoryQuery, SearchFilters};
use crate::services::cache::{CacheKey, CacheManager, CacheStats};
use crate::services::postgres::{PostgresClient, PostgresError};
use crate::services::supabase::{SupabaseClient, SupabaseError};
use std::sync::Arc;
use thiserror::Error;

/// Errors from fetching directory candidates
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("Supabase error: {0}")]
    Supabase(#[from] SupabaseError),

    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] PostgresError),
}

/// Where chiropractor records are read from
#[derive(Clone)]
pub enum DirectoryBackend {
    Rest(Arc<SupabaseClient>),
    Postgres(Arc<PostgresClient>),
}

impl DirectoryBackend {
    pub fn name(&self) -> &'static str {
        match self {
            DirectoryBackend::Rest(_) => "rest",
            DirectoryBackend::Postgres(_) => "postgres",
        }
    }

    async fn fetch_candidates(&self, query: &DirectoryQuery) -> Result<Vec<CandidateProfile>, DirectoryError> {
        match self {
            DirectoryBackend::Rest(client) => Ok(client.fetch_candidates(query).await?),
            DirectoryBackend::Postgres(client) => Ok(client.fetch_candidates(query).await?),
        }
    }

    async fn health_check(&self) -> Result<bool, DirectoryError> {
        match self {
            DirectoryBackend::Rest(client) => Ok(client.health_check().await?),
            DirectoryBackend::Postgres(client) => Ok(client.health_check().await?),
        }
    }
}

/// Pre-filter policy applied before scoring
#[derive(Debug, Clone, Copy)]
pub struct DirectoryPolicy {
    /// Only fetch practices at the patient's exact ZIP when one is given
    pub strict_zip: bool,
    /// Only fetch chiropractors accepting new patients
    pub accepting_only: bool,
    /// Candidates fetched per requested result
    pub candidate_multiplier: usize,
    /// Upper bound on candidates fetched per search
    pub max_candidates: usize,
}

impl Default for DirectoryPolicy {
    fn default() -> Self {
        Self {
            strict_zip: true,
            accepting_only: true,
            candidate_multiplier: 5,
            max_candidates: 500,
        }
    }
}

/// Directory query service
///
/// Fetches the candidate pool for a search, with the coarse pre-filter and
/// a candidate-list cache in front of the backend.
#[derive(Clone)]
pub struct DirectoryService {
    backend: DirectoryBackend,
    cache: Option<Arc<CacheManager>>,
    policy: DirectoryPolicy,
}

impl DirectoryService {
    pub fn new(backend: DirectoryBackend, cache: Option<Arc<CacheManager>>, policy: DirectoryPolicy) -> Self {
        Self { backend, cache, policy }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Candidate cache statistics, `None` when caching is off
    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.cache.as_ref().map(|cache| cache.stats())
    }

    /// Build the coarse pre-filter for a search
    pub fn build_query(&self, filters: &SearchFilters, limit: usize) -> DirectoryQuery {
        let zip_code = if self.policy.strict_zip {
            preference(filters.zip_code.as_deref()).map(str::to_string)
        } else {
            None
        };

        DirectoryQuery {
            zip_code,
            accepting_only: self.policy.accepting_only,
            limit: limit
                .saturating_mul(self.policy.candidate_multiplier.max(1))
                .clamp(1, self.policy.max_candidates.max(1)),
        }
    }

    /// Fetch candidates for a search, consulting the cache first
    pub async fn fetch_candidates(
        &self,
        filters: &SearchFilters,
        limit: usize,
    ) -> Result<Vec<CandidateProfile>, DirectoryError> {
        let query = self.build_query(filters, limit);
        let key = CacheKey::candidates(&query);

        if let Some(cache) = &self.cache {
            match cache.get::<Vec<CandidateProfile>>(&key).await {
                Ok(Some(candidates)) => {
                    tracing::debug!("Serving {} cached candidates for {}", candidates.len(), key);
                    return Ok(candidates);
                }
                Ok(None) => {}
                Err(e) => tracing::warn!("Cache read failed for {}, querying directory: {}", key, e),
            }
        }

        let candidates = self.backend.fetch_candidates(&query).await?;

        if let Some(cache) = &self.cache {
            if let Err(e) = cache.set(&key, &candidates).await {
                tracing::warn!("Failed to cache candidates for {}: {}", key, e);
            }
        }

        Ok(candidates)
    }

    pub async fn health_check(&self) -> bool {
        match self.backend.health_check().await {
            Ok(healthy) => healthy,
            Err(e) => {
                tracing::warn!("Directory health check failed ({}): {}", self.backend.name(), e);
                false
            }
        }
    }
}
