use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use std::sync::Arc;
use std::time::Duration;
use tinpet_api::config::{LoggingSettings, Settings};
use tinpet_api::routes::{self, AppState};
use tinpet_api::services::{Auth0Verifier, CacheManager, PostgresClient};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn init_logging(logging: &LoggingSettings) {
    // RUST_LOG wins over the configured level when set
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if logging.format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.init();
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()));
        }
    };

    init_logging(&settings.logging);

    info!("Starting TinPet API...");

    let auth = Arc::new(
        Auth0Verifier::new(
            &settings.auth0.issuer,
            &settings.auth0.audience,
            settings.auth0.jwks_cache_ttl_secs,
        )
        .map_err(|e| {
            error!("Failed to initialise Auth0 verifier: {}", e);
            std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
        })?
        .with_refetch_cooldown(Duration::from_secs(settings.auth0.jwks_refetch_cooldown_secs)),
    );

    info!(
        "Auth0 verifier ready (issuer: {}, audience: {})",
        auth.issuer(),
        auth.audience()
    );

    // Redis is optional; fall back to the in-process tier
    let cache_ttl = settings.cache.ttl_secs;
    let l1_cache_size = settings.cache.l1_cache_size;

    let cache = match settings.cache.redis_url.as_deref() {
        Some(redis_url) => match CacheManager::new(redis_url, l1_cache_size, cache_ttl).await {
            Ok(c) => {
                info!(
                    "Cache manager initialized with Redis (L1: {} entries, TTL: {}s)",
                    l1_cache_size, cache_ttl
                );
                c
            }
            Err(e) => {
                warn!("Failed to connect to Redis ({}), using in-process cache only", e);
                CacheManager::in_memory(l1_cache_size, cache_ttl)
            }
        },
        None => {
            info!(
                "Cache manager initialized in-process (L1: {} entries, TTL: {}s)",
                l1_cache_size, cache_ttl
            );
            CacheManager::in_memory(l1_cache_size, cache_ttl)
        }
    };

    let postgres = Arc::new(
        PostgresClient::from_settings(&settings.database)
            .await
            .map_err(|e| {
                error!("Failed to connect to PostgreSQL: {}", e);
                std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
            })?,
    );

    info!("PostgreSQL client initialized, migrations applied");

    let app_state = AppState {
        postgres,
        cache: Arc::new(cache),
        auth,
    };

    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
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
