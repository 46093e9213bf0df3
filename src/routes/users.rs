use actix_web::{web, HttpResponse};
use validator::Validate;

use crate::core::parse_id;
use crate::error::ApiError;
use crate::models::{UpsertUserRequest, User, UserIdResponse, UserWithPets};
use crate::routes::auth::AuthenticatedUser;
use crate::routes::pets::invalidate_latest;
use crate::routes::AppState;

/// Routes outside `/api`
pub fn configure_root(cfg: &mut web::ServiceConfig) {
    cfg.route("/me", web::get().to(me))
        .route("/verify-user", web::post().to(verify_user));
}

/// Routes under `/api`
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/users", web::get().to(list_users))
        .route("/users", web::post().to(upsert_user))
        .route("/users/{id}", web::delete().to(delete_user))
        .route("/user", web::get().to(current_user_id))
        // The SPA posts here after login
        .route("/verify-user", web::post().to(verify_user));
}

/// First-login registration
///
/// POST /verify-user
///
/// Returns the caller's user (200), creating it from the token's
/// `email` and `name` claims when this is their first visit (201).
async fn verify_user(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, ApiError> {
    let claims = &user.claims;
    tracing::debug!("Verifying user {}", claims.sub);

    let (record, created) = state
        .postgres
        .find_or_create_user(&claims.sub, claims.email.as_deref(), claims.name.as_deref())
        .await?;

    let body = with_pets(&state, record).await?;

    if created {
        Ok(HttpResponse::Created().json(body))
    } else {
        Ok(HttpResponse::Ok().json(body))
    }
}

/// Create or update the caller's user record
///
/// POST /api/users
///
/// Request body:
/// ```json
/// {
///   "auth0Id": "auth0|abc",
///   "email": "owner@example.com",
///   "name": "Pet Owner"
/// }
/// ```
async fn upsert_user(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    req: web::Json<UpsertUserRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;

    if let Some(auth0_id) = req.auth0_id.as_deref() {
        if auth0_id != user.subject() {
            return Err(ApiError::Forbidden(
                "auth0Id does not match the authenticated user".to_string(),
            ));
        }
    }

    let email = req.email.as_deref().or(user.claims.email.as_deref());
    let name = req.name.as_deref().or(user.claims.name.as_deref());

    let record = state.postgres.upsert_user(user.subject(), email, name).await?;
    let body = with_pets(&state, record).await?;

    Ok(HttpResponse::Created().json(body))
}

async fn list_users(
    state: web::Data<AppState>,
    _user: AuthenticatedUser,
) -> Result<HttpResponse, ApiError> {
    let users = state.postgres.list_users().await?;
    Ok(HttpResponse::Ok().json(users))
}

/// GET /api/user
async fn current_user_id(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, ApiError> {
    let record = user.resolve(&state).await?;
    Ok(HttpResponse::Ok().json(UserIdResponse { id: record.id }))
}

/// GET /me
async fn me(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, ApiError> {
    let record = user.resolve(&state).await?;
    Ok(HttpResponse::Ok().json(with_pets(&state, record).await?))
}

/// Delete the caller's own account; pets and matches cascade
///
/// DELETE /api/users/{id}
async fn delete_user(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let user_id = parse_id(&path, "User")?;
    let requester = user.resolve(&state).await?;

    if user_id != requester.id {
        return match state.postgres.get_user(user_id).await? {
            Some(_) => Err(ApiError::Forbidden(
                "Users can only delete their own account".to_string(),
            )),
            None => Err(ApiError::user_not_found()),
        };
    }

    if !state.postgres.delete_user(user_id).await? {
        return Err(ApiError::user_not_found());
    }

    tracing::info!("Deleted user {} ({})", user_id, requester.auth0_id);
    invalidate_latest(&state).await;

    Ok(HttpResponse::NoContent().finish())
}

async fn with_pets(state: &AppState, user: User) -> Result<UserWithPets, ApiError> {
    let pets = state.postgres.pets_for_owner(user.id).await?;
    Ok(UserWithPets { user, pets })
}
