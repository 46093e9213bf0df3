use actix_web::{dev::Payload, http::header, web, FromRequest, HttpRequest};
use std::future::Future;
use std::pin::Pin;

use crate::error::ApiError;
use crate::models::User;
use crate::routes::AppState;
use crate::services::Claims;

/// Caller identity, extracted from a verified bearer token
///
/// Adding this as a handler argument makes the route protected.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub claims: Claims,
}

impl AuthenticatedUser {
    pub fn subject(&self) -> &str {
        &self.claims.sub
    }

    /// The registered user behind this token, or 404
    pub async fn resolve(&self, state: &AppState) -> Result<User, ApiError> {
        state
            .postgres
            .find_user_by_auth0_id(self.subject())
            .await?
            .ok_or_else(ApiError::user_not_found)
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = ApiError;
    type Future = Pin<Box<dyn Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let state = req.app_data::<web::Data<AppState>>().cloned();
        let header = req
            .headers()
            .get(header::AUTHORIZATION)
            .map(|value| value.to_str().map(str::to_owned));

        Box::pin(async move {
            let state = state
                .ok_or_else(|| ApiError::Internal("Application state not configured".to_string()))?;

            let header = match header {
                None => None,
                Some(Ok(value)) => Some(value),
                Some(Err(_)) => {
                    return Err(ApiError::Unauthorized(
                        "Authorization header is not valid text".to_string(),
                    ))
                }
            };

            let claims = state.auth.verify_header(header.as_deref()).await?;
            tracing::trace!("Authenticated request for {}", claims.sub);

            Ok(AuthenticatedUser { claims })
        })
    }
}
