use jsonwebtoken::Algorithm;
use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_AUTH_PORT: u16 = 8001;
pub const DEFAULT_TASKS_PORT: u16 = 8000;

const DEFAULT_FRONTEND_URL: &str = "http://localhost:5173";

/// Failure while reading process configuration at startup.
#[derive(Debug, PartialEq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "{} must be set", key),
            ConfigError::Invalid { key, value } => write!(f, "{} has an invalid value: {:?}", key, value),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn from_env(default_port: u16) -> Result<Self, ConfigError> {
        Ok(Self {
            host: env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: parse_or("SERVER_PORT", default_port)?,
        })
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

/// Token signing settings shared by session and verification tokens.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub algorithm: Algorithm,
    pub access_token_ttl: chrono::Duration,
}

impl JwtConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let secret = env::var("SECRET_KEY")
            .map(|s| s.trim().to_string())
            .ok()
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing("SECRET_KEY"))?;

        let algorithm_name = env::var("ALGORITHM").unwrap_or_else(|_| "HS256".to_string());
        let algorithm = match Algorithm::from_str(&algorithm_name) {
            Ok(alg @ (Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512)) => alg,
            _ => {
                return Err(ConfigError::Invalid {
                    key: "ALGORITHM",
                    value: algorithm_name,
                })
            }
        };

        let minutes: i64 = parse_or("ACCESS_TOKEN_EXPIRE_MINUTES", 30)?;
        if minutes <= 0 {
            return Err(ConfigError::Invalid {
                key: "ACCESS_TOKEN_EXPIRE_MINUTES",
                value: minutes.to_string(),
            });
        }

        Ok(Self {
            secret,
            algorithm,
            access_token_ttl: chrono::Duration::minutes(minutes),
        })
    }
}

/// Configuration of the authentication service process.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub server: ServerConfig,
    /// `None` selects the in-memory credential store.
    pub database_url: Option<String>,
    pub jwt: JwtConfig,
    /// Base of the verification link mailed on signup; also the allowed CORS origin.
    pub frontend_url: String,
}

impl AuthConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            server: ServerConfig::from_env(DEFAULT_AUTH_PORT)?,
            database_url: optional("DATABASE_URL"),
            jwt: JwtConfig::from_env()?,
            frontend_url: optional("FRONTEND_URL")
                .unwrap_or_else(|| DEFAULT_FRONTEND_URL.to_string()),
        })
    }
}

/// Configuration of the task service process.
#[derive(Debug, Clone)]
pub struct TaskConfig {
    pub server: ServerConfig,
    pub database_url: Option<String>,
    pub auth_service_url: String,
    pub auth_timeout: Duration,
    pub frontend_url: String,
}

impl TaskConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            server: ServerConfig::from_env(DEFAULT_TASKS_PORT)?,
            database_url: optional("DATABASE_URL"),
            auth_service_url: optional("AUTH_SERVICE_URL")
                .unwrap_or_else(|| "http://localhost:8001".to_string()),
            auth_timeout: Duration::from_secs(parse_or("AUTH_TIMEOUT_SECS", 5)?),
            frontend_url: optional("FRONTEND_URL")
                .unwrap_or_else(|| DEFAULT_FRONTEND_URL.to_string()),
        })
    }
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_or<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match optional(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
        None => Ok(default),
    }
}
