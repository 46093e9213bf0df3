use serde::{Deserialize, Serialize};
use validator::Validate;

/// Age as sent by clients: forms post strings, API callers post numbers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AgeValue {
    Integer(i64),
    Float(f64),
    Text(String),
}

/// Request to register a pet
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreatePetRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    /// Missing or `null` is reported as an invalid age, not a JSON error
    #[serde(default)]
    pub age: Option<AgeValue>,
    #[validate(length(min = 1, max = 100))]
    pub breed: String,
    #[validate(length(min = 1, max = 32))]
    pub gender: String,
    #[validate(length(min = 1, max = 2048))]
    pub image: String,
    #[serde(default, alias = "owner_id", rename = "ownerId")]
    pub owner_id: Option<i32>,
}

/// Partial pet update
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdatePetRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[serde(default)]
    pub age: Option<AgeValue>,
    #[serde(default)]
    #[validate(length(min = 1, max = 100))]
    pub breed: Option<String>,
    #[serde(default)]
    #[validate(length(min = 1, max = 32))]
    pub gender: Option<String>,
    #[serde(default)]
    #[validate(length(min = 1, max = 2048))]
    pub image: Option<String>,
}

/// Request to pair two pets
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMatchRequest {
    #[serde(alias = "pet1_id", rename = "pet1Id")]
    pub pet1_id: i32,
    #[serde(alias = "pet2_id", rename = "pet2Id")]
    pub pet2_id: i32,
}

/// Create-or-update of the caller's user record
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpsertUserRequest {
    #[serde(default, alias = "auth0_id", rename = "auth0Id")]
    pub auth0_id: Option<String>,
    #[serde(default)]
    #[validate(email)]
    pub email: Option<String>,
    #[serde(default)]
    #[validate(length(max = 200))]
    pub name: Option<String>,
}

/// Query string for `GET /api/matches`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchQuery {
    #[serde(default, alias = "pet_id", rename = "petId")]
    pub pet_id: Option<i32>,
    #[serde(default)]
    pub mine: Option<bool>,
}
