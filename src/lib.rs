//! TinPet API - REST backend for the TinPet pet matching app
//!
//! Users authenticate with Auth0, register pets, and pair one of their pets
//! with another pet. A pair is unordered and can exist only once.

pub mod config;
pub mod core;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{MatchPair, PairingError};
pub use error::ApiError;
pub use models::{User, Pet, Match, MatchWithPets};
pub use routes::{configure_routes, AppState};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        let pair = MatchPair::new(2, 1).unwrap();
        assert_eq!(pair.key(), (1, 2));
    }
}
