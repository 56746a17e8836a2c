use actix_web::{web, HttpResponse, Responder};
use validator::Validate;
use crate::config::SearchSettings;
use crate::core::{filter_strength, Matcher};
use crate::models::{
    ErrorResponse, FilterStrengthResponse, HealthResponse, ScoreRequest, SearchFilters, SearchParams,
    SearchRequest, SearchResponse,
};
use crate::services::DirectoryService;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub directory: DirectoryService,
    pub matcher: Matcher,
    pub search: SearchSettings,
}

/// Configure all search-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/search", web::post().to(search))
        .route("/search", web::get().to(search_by_query))
        .route("/score", web::post().to(score))
        .route("/filters/strength", web::post().to(strength));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let directory_healthy = state.directory.health_check().await;

    let status = if directory_healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        directory: state.directory.backend_name().to_string(),
        cache: state.directory.cache_stats(),
        timestamp: chrono::Utc::now(),
    })
}

/// Search the directory
///
/// POST /api/v1/search
///
/// Request body:
/// ```json
/// {
///   "filters": {
///     "zipCode": "10001",
///     "preferredModalities": ["Gonstead"],
///     "focusAreas": ["Sports"],
///     "preferredBusinessModel": "cash",
///     "insuranceType": "BCBS"
///   },
///   "limit": 20
/// }
/// ```
async fn search(
    state: web::Data<AppState>,
    req: web::Json<SearchRequest>,
) -> impl Responder {
    run_search(&state, req.into_inner()).await
}

/// Search the directory from query-string parameters
///
/// GET /api/v1/search?zip=10001&modalities=Gonstead,Activator&limit=10
async fn search_by_query(
    state: web::Data<AppState>,
    query: web::Query<SearchParams>,
) -> impl Responder {
    let request = query.into_inner().into_request(state.search.default_limit);
    run_search(&state, request).await
}

async fn run_search(state: &AppState, req: SearchRequest) -> HttpResponse {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for search request: {:?}", errors);
        return HttpResponse::BadRequest().json(ErrorResponse::new(
            "validation_failed",
            errors.to_string(),
            400,
        ));
    }

    let limit = req.limit.min(state.search.max_limit) as usize;
    let filters = req.filters;
    let request_id = uuid::Uuid::new_v4();

    tracing::info!(
        %request_id,
        zip = ?filters.zip_code,
        modalities = filters.preferred_modalities.len(),
        focus_areas = filters.focus_areas.len(),
        limit,
        "Searching directory"
    );

    let candidates = match state.directory.fetch_candidates(&filters, limit).await {
        Ok(candidates) => candidates,
        Err(e) => {
            tracing::error!(%request_id, "Failed to fetch candidates: {}", e);
            return HttpResponse::ServiceUnavailable().json(
                ErrorResponse::new(
                    "directory_unavailable",
                    "The chiropractor directory could not be reached, please try again",
                    503,
                )
                .retryable(),
            );
        }
    };

    let result = state.matcher.rank(&filters, candidates, Some(limit));

    let response = SearchResponse {
        results: result.matches,
        total_candidates: result.total_candidates,
        filter_strength: filter_strength(&filters),
    };

    tracing::info!(
        %request_id,
        top_match = ?response.results.first().map(|r| (&r.display_name, r.match_percent)),
        "Returning {} results (from {} candidates)",
        response.results.len(),
        response.total_candidates
    );

    HttpResponse::Ok().json(response)
}

/// Score a caller-supplied candidate list
///
/// POST /api/v1/score
///
/// Pure ranking, the directory is not consulted.
async fn score(
    state: web::Data<AppState>,
    req: web::Json<ScoreRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return HttpResponse::BadRequest().json(ErrorResponse::new(
            "validation_failed",
            errors.to_string(),
            400,
        ));
    }

    let ScoreRequest { filters, candidates } = req.into_inner();
    let result = state.matcher.rank(&filters, candidates, None);

    HttpResponse::Ok().json(SearchResponse {
        results: result.matches,
        total_candidates: result.total_candidates,
        filter_strength: filter_strength(&filters),
    })
}

/// Match potential of a set of filters
///
/// POST /api/v1/filters/strength
async fn strength(filters: web::Json<SearchFilters>) -> impl Responder {
    HttpResponse::Ok().json(FilterStrengthResponse {
        filter_strength: filter_strength(&filters),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{DirectoryBackend, DirectoryPolicy, DirectoryTables, SupabaseClient};
    use actix_web::{test, App};
    use std::sync::Arc;

    fn offline_state() -> AppState {
        // Nothing listens on port 9; only used by handlers that never touch the directory
        let client = SupabaseClient::new(
            "http://127.0.0.1:9".to_string(),
            "anon".to_string(),
            DirectoryTables::default(),
            1,
        )
        .unwrap();

        AppState {
            directory: DirectoryService::new(
                DirectoryBackend::Rest(Arc::new(client)),
                None,
                DirectoryPolicy::default(),
            ),
            matcher: Matcher::default(),
            search: SearchSettings::default(),
        }
    }

    #[actix_web::test]
    async fn test_filter_strength_endpoint() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(offline_state()))
                .configure(crate::routes::configure_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/v1/filters/strength")
            .set_json(serde_json::json!({
                "zipCode": "10001",
                "preferredModalities": ["Gonstead"],
                "insuranceType": "any"
            }))
            .to_request();

        let resp: FilterStrengthResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(resp.filter_strength, 30);
    }

    #[actix_web::test]
    async fn test_health_reports_backend_when_degraded() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(offline_state()))
                .configure(crate::routes::configure_routes),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/v1/health").to_request();
        let resp: HealthResponse = test::call_and_read_body_json(&app, req).await;

        assert_eq!(resp.status, "degraded");
        assert_eq!(resp.directory, "rest");
        assert!(resp.cache.is_none());
    }

    #[actix_web::test]
    async fn test_directory_failure_is_retryable() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(offline_state()))
                .configure(crate::routes::configure_routes),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/v1/search?zip=10001")
            .to_request();

        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::SERVICE_UNAVAILABLE);

        let body: ErrorResponse = test::read_body_json(resp).await;
        assert!(body.retryable);
        assert_eq!(body.error, "directory_unavailable");
    }
}
