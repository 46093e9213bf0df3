use actix_web::{web, HttpResponse};
use validator::Validate;

use crate::core::{parse_age, parse_id, ParseError};
use crate::error::ApiError;
use crate::models::{CreatePetRequest, NewPet, Pet, PetChanges, UpdatePetRequest};
use crate::routes::auth::AuthenticatedUser;
use crate::routes::AppState;
use crate::services::{CacheError, CacheKey};

/// Size of the public "latest pets" listing
pub const LATEST_PETS_LIMIT: i64 = 8;

/// Configure all pet routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        // Registered before `/pets/{id}` so it is not read as an id
        .route("/pets/latest", web::get().to(latest_pets))
        .route("/pets", web::get().to(list_pets))
        .route("/pets", web::post().to(create_pet))
        .route("/pets/{id}", web::get().to(get_pet))
        .route("/pets/{id}", web::put().to(update_pet))
        .route("/pets/{id}", web::delete().to(delete_pet))
        .route("/my-pets", web::get().to(my_pets));
}

/// Latest pets endpoint
///
/// GET /api/pets/latest
async fn latest_pets(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let key = CacheKey::latest_pets();

    match state.cache.get::<Vec<Pet>>(&key).await {
        Ok(pets) => return Ok(HttpResponse::Ok().json(pets)),
        Err(CacheError::CacheMiss(_)) => {}
        Err(e) => tracing::warn!("Cache read failed for {}, querying database: {}", key, e),
    }

    let pets = state.postgres.latest_pets(LATEST_PETS_LIMIT).await?;

    if let Err(e) = state.cache.set(&key, &pets).await {
        tracing::warn!("Failed to cache latest pets: {}", e);
    }

    Ok(HttpResponse::Ok().json(pets))
}

async fn list_pets(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let pets = state.postgres.list_pets().await?;
    Ok(HttpResponse::Ok().json(pets))
}

/// GET /api/pets/{id}
async fn get_pet(
    state: web::Data<AppState>,
    _user: AuthenticatedUser,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let pet_id = parse_id(&path, "Pet")?;

    let pet = state
        .postgres
        .get_pet(pet_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Pet not found".to_string()))?;

    Ok(HttpResponse::Ok().json(pet))
}

/// Register a pet for the caller
///
/// POST /api/pets
///
/// Request body:
/// ```json
/// {
///   "name": "Rex",
///   "age": 3,
///   "breed": "beagle",
///   "gender": "male",
///   "image": "https://...",
///   "ownerId": 1
/// }
/// ```
async fn create_pet(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    req: web::Json<CreatePetRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;
    let age = req
        .age
        .as_ref()
        .ok_or(ParseError::InvalidAge)
        .and_then(parse_age)?;

    let owner = user.resolve(&state).await?;
    if let Some(owner_id) = req.owner_id {
        if owner_id != owner.id {
            return Err(ApiError::Forbidden(
                "Pets can only be created for the signed-in user".to_string(),
            ));
        }
    }

    let req = req.into_inner();
    let pet = state
        .postgres
        .create_pet(&NewPet {
            name: req.name,
            age,
            breed: req.breed,
            gender: req.gender,
            image: req.image,
            owner_id: owner.id,
        })
        .await?;

    invalidate_latest(&state).await;

    Ok(HttpResponse::Created().json(pet))
}

/// PUT /api/pets/{id}
async fn update_pet(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
    req: web::Json<UpdatePetRequest>,
) -> Result<HttpResponse, ApiError> {
    let pet_id = parse_id(&path, "Pet")?;
    req.validate()?;

    let req = req.into_inner();
    let changes = PetChanges {
        age: req.age.as_ref().map(parse_age).transpose()?,
        name: req.name,
        breed: req.breed,
        gender: req.gender,
        image: req.image,
    };
    if changes.is_empty() {
        return Err(ApiError::BadRequest("No fields to update".to_string()));
    }

    let requester = user.resolve(&state).await?;
    owned_pet(&state, pet_id, requester.id).await?;

    let pet = state
        .postgres
        .update_pet(pet_id, &changes)
        .await?
        .ok_or_else(|| ApiError::NotFound("Pet not found".to_string()))?;

    invalidate_latest(&state).await;

    Ok(HttpResponse::Ok().json(pet))
}

/// Delete a pet and, through the schema, every match it is part of
///
/// DELETE /api/pets/{id}
async fn delete_pet(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let pet_id = parse_id(&path, "Pet")?;

    let requester = user.resolve(&state).await?;
    owned_pet(&state, pet_id, requester.id).await?;

    if !state.postgres.delete_pet(pet_id).await? {
        return Err(ApiError::NotFound("Pet not found".to_string()));
    }

    tracing::info!("User {} deleted pet {}", requester.id, pet_id);
    invalidate_latest(&state).await;

    Ok(HttpResponse::NoContent().finish())
}

/// GET /api/my-pets
async fn my_pets(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, ApiError> {
    let owner = user.resolve(&state).await?;
    let pets = state.postgres.pets_for_owner(owner.id).await?;
    Ok(HttpResponse::Ok().json(pets))
}

/// Load a pet and check it belongs to `owner_id`
async fn owned_pet(state: &AppState, pet_id: i32, owner_id: i32) -> Result<Pet, ApiError> {
    let pet = state
        .postgres
        .get_pet(pet_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Pet not found".to_string()))?;

    if pet.owner_id != owner_id {
        return Err(ApiError::Forbidden(format!(
            "Pet {} belongs to another user",
            pet_id
        )));
    }
    Ok(pet)
}

/// Drop the cached latest-pets listing after any pet mutation
pub(crate) async fn invalidate_latest(state: &AppState) {
    if let Err(e) = state.cache.delete(&CacheKey::latest_pets()).await {
        tracing::warn!("Failed to invalidate latest pets cache: {}", e);
    }
}
