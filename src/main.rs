use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use chiro_match::config::{BackendKind, LoggingSettings, Settings};
use chiro_match::core::Matcher;
use chiro_match::models::ScoringPoints;
use chiro_match::routes::{self, search::AppState};
use chiro_match::services::{
    CacheManager, DirectoryBackend, DirectoryService, DirectoryTables, PostgresClient, SupabaseClient,
};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// RUST_LOG wins over the configured level
fn init_logging(logging: &LoggingSettings) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if logging.format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.compact().init();
    }
}

fn startup_error(context: &str, err: impl std::fmt::Display) -> std::io::Error {
    error!("{}: {}", context, err);
    std::io::Error::new(std::io::ErrorKind::Other, format!("{}: {}", context, err))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    // Logging isn't up until the configuration is read
    let settings = Settings::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;

    init_logging(&settings.logging);

    info!("Starting Find My Chiro match service...");

    let tables = DirectoryTables::from(&settings.directory.tables);

    let backend = match settings.directory.backend {
        BackendKind::Rest => {
            let client = SupabaseClient::new(
                settings.supabase.url.clone(),
                settings.supabase.api_key.clone(),
                tables,
                settings.supabase.timeout_secs,
            )
            .map_err(|e| startup_error("Failed to create Supabase client", e))?;

            info!("Supabase REST directory initialized");
            DirectoryBackend::Rest(Arc::new(client))
        }
        BackendKind::Postgres => {
            let url = settings
                .database
                .url
                .as_deref()
                .ok_or_else(|| startup_error("Postgres backend selected", "database.url is not set"))?;

            let client = PostgresClient::from_settings(
                url,
                settings.database.max_connections,
                settings.database.min_connections,
                settings.database.acquire_timeout_secs,
                settings.database.idle_timeout_secs,
                &tables,
            )
            .await
            .map_err(|e| startup_error("Failed to connect to PostgreSQL", e))?;

            info!(
                "PostgreSQL directory initialized (max: {} connections)",
                settings.database.max_connections.unwrap_or(10)
            );
            DirectoryBackend::Postgres(Arc::new(client))
        }
    };

    // Candidate cache is optional, searches fall through to the directory without it
    let cache_ttl = settings.cache.ttl_secs.unwrap_or(300);
    let l1_cache_size = settings.cache.l1_cache_size.unwrap_or(1000);

    let cache = if !settings.cache.enabled {
        info!("Candidate cache disabled");
        None
    } else if let Some(redis_url) = settings.cache.redis_url.as_deref() {
        match CacheManager::new(redis_url, l1_cache_size, cache_ttl).await {
            Ok(c) => {
                info!("Cache manager initialized (L1: {} entries, Redis L2, TTL: {}s)", l1_cache_size, cache_ttl);
                Some(Arc::new(c))
            }
            Err(e) => {
                warn!("Failed to connect to Redis ({}), using in-process cache only", e);
                Some(Arc::new(CacheManager::local(l1_cache_size, cache_ttl)))
            }
        }
    } else {
        info!("Cache manager initialized (L1: {} entries, TTL: {}s)", l1_cache_size, cache_ttl);
        Some(Arc::new(CacheManager::local(l1_cache_size, cache_ttl)))
    };

    let directory = DirectoryService::new(backend, cache, settings.directory.policy());

    let points = ScoringPoints::from(&settings.scoring.points);
    let matcher = Matcher::new(points);

    info!("Matcher initialized with points: {:?}", matcher.points());

    let app_state = AppState {
        directory,
        matcher,
        search: settings.search.clone(),
    };

    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .configure(routes::configure_extractors)
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
