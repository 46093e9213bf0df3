use actix_web::{web, HttpResponse, Responder};

use crate::models::HealthResponse;
use crate::routes::auth::AuthenticatedUser;
use crate::routes::AppState;

/// Routes outside `/api`
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/ping", web::get().to(ping))
        .route("/health", web::get().to(health_check));
}

/// Routes under `/api`
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.route("/protected", web::get().to(protected));
}

async fn ping() -> impl Responder {
    HttpResponse::Ok().content_type("text/plain").body("pong")
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let pg_healthy = state.postgres.health_check().await.unwrap_or(false);

    let status = if pg_healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Token smoke test for clients
async fn protected(_user: AuthenticatedUser) -> impl Responder {
    HttpResponse::Ok()
        .content_type("text/plain")
        .body("This is a protected route")
}
