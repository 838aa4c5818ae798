use crate::model::settings::ExpectedStart;
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,
    pub access_token_ttl: usize,

    // Rate limiting
    pub rate_login_per_min: u32,
    pub rate_protected_per_min: u32,

    pub api_prefix: String,

    /// Used until an administrator stores an expected start.
    pub default_expected_start: ExpectedStart,
    pub log_dir: String,
}

fn var_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn required(key: &str) -> anyhow::Result<String> {
    env::var(key).map_err(|_| anyhow::anyhow!("{} must be set", key))
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok();

        let default_expected_start = match env::var("DEFAULT_EXPECTED_START") {
            Ok(raw) => raw.parse()?,
            Err(_) => "07:00".parse()?,
        };

        Ok(Self {
            server_addr: required("SERVER_ADDR")?,
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            access_token_ttl: var_or("ACCESS_TOKEN_TTL", 43_200), // one work day

            rate_login_per_min: var_or("RATE_LOGIN_PER_MIN", 60),
            rate_protected_per_min: var_or("RATE_PROTECTED_PER_MIN", 1000),

            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),
            default_expected_start,
            log_dir: env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string()),
        })
    }

    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            database_url: "mysql://localhost/asistencia_test".into(),
            jwt_secret: "test-secret".into(),
            server_addr: "127.0.0.1:0".into(),
            access_token_ttl: 60,
            rate_login_per_min: 60,
            rate_protected_per_min: 1000,
            api_prefix: "/api".into(),
            default_expected_start: "07:00".parse().unwrap(),
            log_dir: "logs".into(),
        }
    }
}
