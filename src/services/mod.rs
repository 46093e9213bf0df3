// Service exports
pub mod auth0;
pub mod cache;
pub mod postgres;

pub use auth0::{Auth0Verifier, AuthError, Claims};
pub use cache::{CacheManager, CacheKey, CacheError};
pub use postgres::{PostgresClient, PostgresError};
