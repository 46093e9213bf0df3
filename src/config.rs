use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub auth0: Auth0Settings,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
    pub acquire_timeout_secs: Option<u64>,
    pub idle_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Auth0Settings {
    /// Issuer base URL, e.g. `https://tenant.eu.auth0.com/`
    pub issuer: String,
    pub audience: String,
    #[serde(default = "default_jwks_cache_ttl")]
    pub jwks_cache_ttl_secs: u64,
    /// Minimum gap between JWKS fetches triggered by unknown key ids
    #[serde(default = "default_jwks_refetch_cooldown")]
    pub jwks_refetch_cooldown_secs: u64,
}

fn default_jwks_cache_ttl() -> u64 { 3600 }
fn default_jwks_refetch_cooldown() -> u64 { 30 }

#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    /// Redis is optional; without it only the in-process tier is used
    pub redis_url: Option<String>,
    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: u64,
    #[serde(default = "default_l1_cache_size")]
    pub l1_cache_size: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            redis_url: None,
            ttl_secs: default_cache_ttl(),
            l1_cache_size: default_l1_cache_size(),
        }
    }
}

fn default_cache_ttl() -> u64 { 60 }
fn default_l1_cache_size() -> u64 { 1000 }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Environment variables (prefixed with TINPET_)
    /// 4. Deployment variables: DATABASE_URL, PORT, AUTH0_ISSUER, AUTH0_AUDIENCE, REDIS_URL
    pub fn load() -> Result<Self, ConfigError> {
        let mut settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            // Local overrides for development
            .add_source(File::with_name("config/local").required(false))
            // e.g., TINPET__SERVER__PORT -> server.port
            .add_source(
                Environment::with_prefix("TINPET")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings = apply_deployment_overrides(settings, |name| std::env::var(name).ok())?;

        settings.try_deserialize()
    }
}

/// Conventional deployment variables and the config keys they override
const DEPLOYMENT_OVERRIDES: &[(&str, &str)] = &[
    ("DATABASE_URL", "database.url"),
    ("PORT", "server.port"),
    ("AUTH0_ISSUER", "auth0.issuer"),
    ("AUTH0_AUDIENCE", "auth0.audience"),
    ("REDIS_URL", "cache.redis_url"),
];

/// Layer the unprefixed deployment variables on top of the loaded config
fn apply_deployment_overrides<F>(settings: Config, lookup: F) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut builder = Config::builder().add_source(settings);

    for (var, key) in DEPLOYMENT_OVERRIDES {
        if let Some(value) = lookup(var).filter(|v| !v.trim().is_empty()) {
            builder = builder.set_override(*key, value)?;
        }
    }

    builder.build()
}
