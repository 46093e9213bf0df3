// Route exports
pub mod auth;
pub mod matches;
pub mod pets;
pub mod system;
pub mod users;

use actix_web::web;
use std::sync::Arc;

use crate::error::{handle_json_payload_error, handle_query_payload_error};
use crate::services::{Auth0Verifier, CacheManager, PostgresClient};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub postgres: Arc<PostgresClient>,
    pub cache: Arc<CacheManager>,
    pub auth: Arc<Auth0Verifier>,
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    let json_config = web::JsonConfig::default()
        .limit(10 * 1024 * 1024)
        .error_handler(handle_json_payload_error);

    cfg.app_data(json_config)
        .app_data(web::QueryConfig::default().error_handler(handle_query_payload_error))
        .configure(system::configure)
        .configure(users::configure_root)
        .service(
            web::scope("/api")
                .configure(system::configure_api)
                .configure(pets::configure)
                .configure(users::configure)
                .configure(matches::configure),
        );
}
