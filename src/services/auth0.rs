use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Default minimum gap between JWKS fetches
const DEFAULT_REFETCH_COOLDOWN: Duration = Duration::from_secs(30);

/// Errors that can occur while authenticating a request
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing bearer token")]
    MissingToken,

    #[error("Authorization header must use the Bearer scheme")]
    MalformedHeader,

    #[error("Invalid token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),

    #[error("Token header has no key id")]
    MissingKeyId,

    #[error("No signing key found for kid {0}")]
    UnknownKey(String),

    #[error("Failed to fetch JWKS: {0}")]
    JwksError(#[from] reqwest::Error),
}

/// Claims read from an Auth0 access token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: u64,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

enum KeySource {
    /// Keys fetched from the tenant's JWKS endpoint, cached by `kid`
    Jwks {
        url: String,
        client: Client,
        keys: moka::future::Cache<String, DecodingKey>,
        /// Held while fetching; records when the last fetch started
        refresh: tokio::sync::Mutex<Option<Instant>>,
        cooldown: Duration,
    },
    /// One fixed key, for local setups without a tenant
    Static(DecodingKey),
}

/// Verifies Auth0 bearer tokens
pub struct Auth0Verifier {
    issuer: String,
    audience: String,
    algorithm: Algorithm,
    source: KeySource,
}

impl Auth0Verifier {
    /// Create a verifier that resolves RS256 keys from `{issuer}/.well-known/jwks.json`
    pub fn new(issuer: &str, audience: &str, jwks_cache_ttl_secs: u64) -> Result<Self, AuthError> {
        let issuer = normalize_issuer(issuer);
        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;

        let keys = moka::future::CacheBuilder::new(32)
            .time_to_live(Duration::from_secs(jwks_cache_ttl_secs))
            .build();

        Ok(Self {
            source: KeySource::Jwks {
                url: jwks_url(&issuer),
                client,
                keys,
                refresh: tokio::sync::Mutex::new(None),
                cooldown: DEFAULT_REFETCH_COOLDOWN,
            },
            issuer,
            audience: audience.to_string(),
            algorithm: Algorithm::RS256,
        })
    }

    /// Set the minimum gap between JWKS fetches. No effect on a static key.
    pub fn with_refetch_cooldown(mut self, gap: Duration) -> Self {
        if let KeySource::Jwks { cooldown, .. } = &mut self.source {
            *cooldown = gap;
        }
        self
    }

    /// Create a verifier that checks every token against one key
    pub fn with_static_key(
        issuer: &str,
        audience: &str,
        key: DecodingKey,
        algorithm: Algorithm,
    ) -> Self {
        Self {
            issuer: normalize_issuer(issuer),
            audience: audience.to_string(),
            algorithm,
            source: KeySource::Static(key),
        }
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn audience(&self) -> &str {
        &self.audience
    }

    /// Verify a raw JWT and return its claims
    pub async fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let header = decode_header(token)?;

        let key = match &self.source {
            KeySource::Static(key) => key.clone(),
            KeySource::Jwks { .. } => {
                let kid = header.kid.ok_or(AuthError::MissingKeyId)?;
                self.jwks_key(&kid).await?
            }
        };

        let mut validation = Validation::new(self.algorithm);
        validation.set_audience(&[&self.audience]);
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["exp", "sub", "iss", "aud"]);

        let data = decode::<Claims>(token, &key, &validation)?;
        Ok(data.claims)
    }

    /// Verify the value of an `Authorization` header
    pub async fn verify_header(&self, header: Option<&str>) -> Result<Claims, AuthError> {
        let header = header.ok_or(AuthError::MissingToken)?;
        let token = bearer_token(header)?;
        self.verify(token).await
    }

    async fn jwks_key(&self, kid: &str) -> Result<DecodingKey, AuthError> {
        let KeySource::Jwks { url, client, keys, refresh, cooldown } = &self.source else {
            return Err(AuthError::UnknownKey(kid.to_string()));
        };

        if let Some(key) = keys.get(kid).await {
            return Ok(key);
        }

        // One refresh at a time; whoever waited may find the key already loaded
        let mut last_fetch = refresh.lock().await;
        if let Some(key) = keys.get(kid).await {
            return Ok(key);
        }

        if let Some(at) = *last_fetch {
            if at.elapsed() < *cooldown {
                tracing::debug!("Unknown kid {} inside JWKS refetch cooldown", kid);
                return Err(AuthError::UnknownKey(kid.to_string()));
            }
        }
        *last_fetch = Some(Instant::now());

        tracing::debug!("Fetching JWKS from {} (unknown kid {})", url, kid);

        let jwks: JwkSet = client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        for jwk in &jwks.keys {
            let Some(id) = jwk.common.key_id.as_ref() else {
                continue;
            };
            match DecodingKey::from_jwk(jwk) {
                Ok(key) => keys.insert(id.clone(), key).await,
                Err(e) => tracing::warn!("Skipping unusable JWK {}: {}", id, e),
            }
        }

        tracing::info!("Loaded {} signing keys from JWKS", keys.entry_count());

        keys.get(kid)
            .await
            .ok_or_else(|| AuthError::UnknownKey(kid.to_string()))
    }
}

/// Auth0 issuers end with a slash; the `iss` claim must match exactly
pub fn normalize_issuer(issuer: &str) -> String {
    let trimmed = issuer.trim();
    if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{}/", trimmed)
    }
}

fn jwks_url(normalized_issuer: &str) -> String {
    format!("{}.well-known/jwks.json", normalized_issuer)
}

/// Extract the token from `Bearer <token>`; the scheme is case-insensitive
pub fn bearer_token(header: &str) -> Result<&str, AuthError> {
    let mut parts = header.trim().splitn(2, ' ');
    let scheme = parts.next().unwrap_or_default();
    let token = parts.next().map(str::trim).unwrap_or_default();

    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::MalformedHeader);
    }
    if token.is_empty() {
        return Err(AuthError::MissingToken);
    }
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &[u8] = b"tinpet-test-secret";
    const ISSUER: &str = "https://tinpet.test.auth0.com/";
    const AUDIENCE: &str = "https://tinpet-api";

    fn verifier() -> Auth0Verifier {
        Auth0Verifier::with_static_key(
            ISSUER,
            AUDIENCE,
            DecodingKey::from_secret(SECRET),
            Algorithm::HS256,
        )
    }

    fn token(aud: &str, iss: &str, exp_offset: i64) -> String {
        let exp = chrono::Utc::now().timestamp() + exp_offset;
        let claims = serde_json::json!({
            "sub": "auth0|123",
            "aud": aud,
            "iss": iss,
            "exp": exp,
            "email": "owner@example.com",
        });
        encode(&Header::new(Algorithm::HS256), &claims, &EncodingKey::from_secret(SECRET)).unwrap()
    }

    #[test]
    fn test_normalize_issuer() {
        assert_eq!(normalize_issuer("https://a.auth0.com"), "https://a.auth0.com/");
        assert_eq!(normalize_issuer("https://a.auth0.com/"), "https://a.auth0.com/");
        assert_eq!(
            jwks_url(&normalize_issuer("https://a.auth0.com")),
            "https://a.auth0.com/.well-known/jwks.json"
        );
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token("Bearer abc.def").unwrap(), "abc.def");
        assert_eq!(bearer_token("bearer   abc").unwrap(), "abc");
        assert!(matches!(bearer_token("Basic abc"), Err(AuthError::MalformedHeader)));
        assert!(matches!(bearer_token("Bearer"), Err(AuthError::MissingToken)));
        assert!(matches!(bearer_token("Bearer  "), Err(AuthError::MissingToken)));
    }

    #[tokio::test]
    async fn test_verify_valid_token() {
        let claims = verifier().verify(&token(AUDIENCE, ISSUER, 300)).await.unwrap();
        assert_eq!(claims.sub, "auth0|123");
        assert_eq!(claims.email.as_deref(), Some("owner@example.com"));
        assert_eq!(claims.name, None);
    }

    #[tokio::test]
    async fn test_issuer_without_slash_still_matches() {
        let v = Auth0Verifier::with_static_key(
            "https://tinpet.test.auth0.com",
            AUDIENCE,
            DecodingKey::from_secret(SECRET),
            Algorithm::HS256,
        );
        assert!(v.verify(&token(AUDIENCE, ISSUER, 300)).await.is_ok());
    }

    #[tokio::test]
    async fn test_rejects_wrong_audience_issuer_and_expiry() {
        let v = verifier();
        assert!(v.verify(&token("https://other-api", ISSUER, 300)).await.is_err());
        assert!(v.verify(&token(AUDIENCE, "https://evil.example/", 300)).await.is_err());
        assert!(v.verify(&token(AUDIENCE, ISSUER, -3600)).await.is_err());
    }

    #[tokio::test]
    async fn test_verify_header() {
        let v = verifier();
        assert!(matches!(v.verify_header(None).await, Err(AuthError::MissingToken)));

        let header = format!("Bearer {}", token(AUDIENCE, ISSUER, 300));
        assert!(v.verify_header(Some(&header)).await.is_ok());
    }
}
