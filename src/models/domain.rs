use serde::{Deserialize, Serialize};

/// Registered account, keyed by the Auth0 subject
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i32,
    #[serde(rename = "auth0Id")]
    pub auth0_id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// User together with the pets they own
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserWithPets {
    #[serde(flatten)]
    pub user: User,
    pub pets: Vec<Pet>,
}

/// Pet listed for adoption or matching
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Pet {
    pub id: i32,
    pub name: String,
    pub age: i32,
    pub breed: String,
    pub gender: String,
    /// Absolute URL or a path relative to the upload host
    pub image: String,
    pub owner_id: i32,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Unordered pairing of two pets
///
/// `pet1_id` is the pet the requester picked from their own pets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Match {
    pub id: i32,
    #[serde(rename = "pet1Id")]
    pub pet1_id: i32,
    #[serde(rename = "pet2Id")]
    pub pet2_id: i32,
    #[serde(rename = "createdAt")]
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Match with both pets resolved, as rendered by the matches page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchWithPets {
    #[serde(flatten)]
    pub pairing: Match,
    pub pet1: Pet,
    pub pet2: Pet,
}

/// Fields a pet update may change; `None` leaves the column untouched
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PetChanges {
    pub name: Option<String>,
    pub age: Option<i32>,
    pub breed: Option<String>,
    pub gender: Option<String>,
    pub image: Option<String>,
}

impl PetChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.age.is_none()
            && self.breed.is_none()
            && self.gender.is_none()
            && self.image.is_none()
    }
}

/// Columns for a new pet row
#[derive(Debug, Clone, PartialEq)]
pub struct NewPet {
    pub name: String,
    pub age: i32,
    pub breed: String,
    pub gender: String,
    pub image: String,
    pub owner_id: i32,
}

/// Filters for listing matches
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MatchFilter {
    pub pet_id: Option<i32>,
    /// Restrict to matches touching any pet owned by this user
    pub owner_id: Option<i32>,
}
