use std::env;
use std::time::Duration;

use auth::TokenCodec;
use auth::TokenError;
use auth::TokenTtls;
use config::Config as ConfigBuilder;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub cache: CacheConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    pub url: String,
    /// TTL for cached identity snapshots, in seconds
    pub identity_ttl_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    /// Signing algorithm name; must be on the codec's HMAC allow-list
    pub algorithm: String,
    pub access_ttl_secs: i64,
    pub refresh_ttl_secs: i64,
    pub verification_ttl_secs: i64,
}

impl CacheConfig {
    pub fn identity_ttl(&self) -> Duration {
        Duration::from_secs(self.identity_ttl_secs)
    }
}

impl AuthConfig {
    /// Build the token codec from the configured secret, algorithm, and TTLs.
    ///
    /// # Errors
    /// * `UnsupportedAlgorithm` - Algorithm name is not on the allow-list
    pub fn token_codec(&self) -> Result<TokenCodec, TokenError> {
        let algorithm = self.algorithm.parse()?;
        let ttls = TokenTtls {
            access: chrono::Duration::seconds(self.access_ttl_secs),
            refresh: chrono::Duration::seconds(self.refresh_ttl_secs),
            verification: chrono::Duration::seconds(self.verification_ttl_secs),
        };

        Ok(TokenCodec::new(self.jwt_secret.as_bytes(), algorithm, ttls))
    }
}

impl Config {
    /// Load configuration from files with environment variable overrides
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (DATABASE__URL, AUTH__JWT_SECRET, etc.)
    /// 2. Environment-specific config file (config/{environment}.toml)
    /// 3. Default config file (config/default.toml)
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let configuration = ConfigBuilder::builder()
            // Start with default configuration
            .add_source(File::with_name("config/default").required(false))
            // Layer on environment-specific configuration
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Layer on environment variables (with __ as separator)
            // Example: AUTH__JWT_SECRET=... overrides auth.jwt_secret
            .add_source(Environment::with_prefix("").separator("__"))
            .build()?;

        let config: Config = configuration.try_deserialize()?;

        Ok(config)
    }
}
