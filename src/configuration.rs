use config::ConfigError;
use jsonwebtoken::Algorithm;

use crate::error::AppError;

#[derive(serde::Deserialize, Clone)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub application: ApplicationSettings,
    pub jwt: JwtSettings,
}

#[derive(serde::Deserialize, Clone)]
pub struct ApplicationSettings {
    pub port: u16,
}

#[derive(serde::Deserialize, Clone)]
pub struct DatabaseSettings {
    pub username: String,
    pub password: String,
    pub port: u16,
    pub host: String,
    pub database_name: String,
}

impl DatabaseSettings {
    pub fn connection_string(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database_name
        )
    }

    pub fn connection_string_without_db(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}",
            self.username, self.password, self.host, self.port
        )
    }
}

/// Token signing settings. The secret and algorithm are process
/// configuration and never appear in the HTTP surface.
#[derive(serde::Deserialize, Clone)]
pub struct JwtSettings {
    pub secret: String,
    /// HS-family algorithm name, e.g. "HS256".
    pub algorithm: String,
    pub access_token_expiry: i64,  // seconds (900 = 15 minutes)
    pub refresh_token_expiry: i64, // seconds (604800 = 7 days)
}

impl JwtSettings {
    pub fn algorithm(&self) -> Result<Algorithm, AppError> {
        self.algorithm
            .parse::<Algorithm>()
            .map_err(|_| AppError::Internal(format!("Unknown JWT algorithm: {}", self.algorithm)))
    }
}

pub fn get_configuration() -> Result<Settings, ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("configuration").required(false))
        .set_default("application.port", 8000)?
        .set_default("jwt.algorithm", "HS256")?
        .set_default("jwt.access_token_expiry", 900)?
        .set_default("jwt.refresh_token_expiry", 604_800)?
        .build()?;
    settings.try_deserialize::<Settings>()
}
