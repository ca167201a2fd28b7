use config::{Config, ConfigError, Environment};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server_port: u16,
    pub rust_log: String,
    pub jwt_secret: String,
    /// Issuer of bearer tokens and prefix of login challenges.
    pub auth_domain: String,
    pub challenge_expiry_secs: u64,
    pub jwt_expiry_secs: u64,
}

fn build_config(env: Environment) -> Result<AppConfig, ConfigError> {
    let settings = Config::builder()
        .add_source(env)
        .set_default("server_port", 8080)?
        .set_default("rust_log", "info")?
        .set_default("jwt_secret", "dev-secret-change-in-production")?
        .set_default("auth_domain", "tokenledger")?
        .set_default("challenge_expiry_secs", 300)?
        .set_default("jwt_expiry_secs", 86400)?
        .build()?;

    settings.try_deserialize()
}

pub fn load_config() -> Result<AppConfig, ConfigError> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    build_config(Environment::default())
}
