// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    Match, MatchFilter, MatchWithPets, NewPet, Pet, PetChanges, User, UserWithPets,
};
pub use requests::{
    AgeValue, CreateMatchRequest, CreatePetRequest, MatchQuery, UpdatePetRequest,
    UpsertUserRequest,
};
pub use responses::{HealthResponse, ErrorResponse, UserIdResponse};
