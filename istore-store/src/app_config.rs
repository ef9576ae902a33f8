use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    /// Base URL magic links point at.
    pub public_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RedisConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_expiration_seconds: u64,
    #[serde(default = "default_magic_link_ttl")]
    pub magic_link_ttl_seconds: u64,
    /// Magic links one email may request per rate-limit window.
    #[serde(default = "default_magic_link_rate_limit")]
    pub magic_link_rate_limit: i64,
}

fn default_magic_link_ttl() -> u64 { 900 }
fn default_magic_link_rate_limit() -> i64 { 5 }

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Postgres,
    /// Process-local maps; data is lost on restart.
    Memory,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Not checked in.
            .add_source(config::File::with_name("config/local").required(false))
            // e.g. `ISTORE__AUTH__JWT_SECRET=...`
            .add_source(config::Environment::with_prefix("ISTORE").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_for_optional_sections() {
        let cfg: Config = config::Config::builder()
            .set_override("server.port", 8080)
            .unwrap()
            .set_override("server.public_url", "http://localhost:5173")
            .unwrap()
            .set_override("database.url", "postgres://localhost/istore")
            .unwrap()
            .set_override("redis.url", "redis://127.0.0.1/")
            .unwrap()
            .set_override("auth.jwt_secret", "secret")
            .unwrap()
            .set_override("auth.jwt_expiration_seconds", 3600)
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(cfg.auth.magic_link_ttl_seconds, 900);
        assert_eq!(cfg.auth.magic_link_rate_limit, 5);
        assert_eq!(cfg.storage.backend, StorageBackend::Postgres);
    }
}
