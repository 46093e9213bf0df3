use actix_web::{web, HttpResponse};

use crate::core::{parse_id, MatchPair};
use crate::error::ApiError;
use crate::models::{CreateMatchRequest, MatchFilter, MatchQuery};
use crate::routes::auth::AuthenticatedUser;
use crate::routes::AppState;

/// Configure all match-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/matches", web::get().to(list_matches))
        .route("/matches", web::post().to(create_match))
        .route("/matches/{id}", web::delete().to(delete_match));
}

/// List matches with both pets embedded
///
/// GET /api/matches?petId={petId}&mine=true
async fn list_matches(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    query: web::Query<MatchQuery>,
) -> Result<HttpResponse, ApiError> {
    let owner_id = if query.mine.unwrap_or(false) {
        Some(user.resolve(&state).await?.id)
    } else {
        None
    };

    let filter = MatchFilter {
        pet_id: query.pet_id,
        owner_id,
    };

    let matches = state.postgres.list_matches(filter).await?;

    tracing::debug!("Returning {} matches ({:?})", matches.len(), filter);

    Ok(HttpResponse::Ok().json(matches))
}

/// Pair one of the caller's pets with another pet
///
/// POST /api/matches
///
/// Request body:
/// ```json
/// {
///   "pet1Id": 1,
///   "pet2Id": 2
/// }
/// ```
///
/// `pet1Id` must be owned by the caller. A pair that already exists in
/// either order is a 409.
async fn create_match(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    req: web::Json<CreateMatchRequest>,
) -> Result<HttpResponse, ApiError> {
    // Self-matches never reach the database
    let pair = MatchPair::new(req.pet1_id, req.pet2_id)?;

    let requester = user.resolve(&state).await?;

    tracing::info!(
        "User {} requesting match: pet {} -> pet {}",
        requester.id,
        pair.pet1_id(),
        pair.pet2_id()
    );

    let created = state.postgres.create_match(pair, requester.id).await?;

    Ok(HttpResponse::Created().json(created))
}

/// DELETE /api/matches/{id}
async fn delete_match(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let match_id = parse_id(&path, "Match")?;
    let requester = user.resolve(&state).await?;

    let (owner1, owner2) = state
        .postgres
        .match_owners(match_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Match not found".to_string()))?;

    if requester.id != owner1 && requester.id != owner2 {
        return Err(ApiError::Forbidden(
            "Only owners of a matched pet can remove the match".to_string(),
        ));
    }

    if !state.postgres.delete_match(match_id).await? {
        return Err(ApiError::NotFound("Match not found".to_string()));
    }

    tracing::info!("User {} removed match {}", requester.id, match_id);

    Ok(HttpResponse::NoContent().finish())
}
