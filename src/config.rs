use std::env;

use thiserror::Error;

/// Default token lifetime in seconds (~21.75 hours).
pub const DEFAULT_TOKEN_TTL_SECS: u64 = 78_300;
/// Default bcrypt work factor.
pub const DEFAULT_BCRYPT_COST: u32 = 10;
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

/// AppConfig
///
/// Holds the application's entire configuration state. Loaded once at startup and
/// never mutated afterwards; handlers and the authorization gate pull it out of the
/// shared `AppState` via `FromRef`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Database connection string (Postgres).
    pub db_url: String,
    // Runtime environment marker. Controls the log format.
    pub env: Env,
    pub bind_addr: String,
    pub auth: AuthConfig,
    // Initial administrator created at startup, if configured.
    pub admin_seed: Option<AdminSeed>,
}

/// AuthConfig
///
/// The signing secret and token policy handed to the `Authenticator` constructor.
#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_secs: u64,
    pub bcrypt_cost: u32,
}

// Keeps the secret out of log lines that print the whole config.
impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .field("token_ttl_secs", &self.token_ttl_secs)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .finish()
    }
}

impl AuthConfig {
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            token_ttl_secs: DEFAULT_TOKEN_TTL_SECS,
            bcrypt_cost: DEFAULT_BCRYPT_COST,
        }
    }
}

#[derive(Clone)]
pub struct AdminSeed {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for AdminSeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminSeed")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Env
///
/// Runtime context: pretty logs locally, JSON logs in production.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

impl AppConfig {
    /// load
    ///
    /// Reads every parameter from the process environment. The signing secret has no
    /// fallback in any environment; a missing one is a `ConfigError` and `main`
    /// refuses to start.
    pub fn load() -> Result<Self, ConfigError> {
        let env = match env::var("APP_ENV").as_deref() {
            Ok("production") => Env::Production,
            _ => Env::Local,
        };

        let db_url = required("DATABASE_URL")?;
        let jwt_secret = required("JWT_SECRET")?;
        if jwt_secret.trim().is_empty() {
            return Err(ConfigError::Invalid {
                name: "JWT_SECRET",
                value: "<empty>".to_string(),
            });
        }

        let token_ttl_secs = parsed("TOKEN_TTL_SECS", DEFAULT_TOKEN_TTL_SECS)?;
        if token_ttl_secs == 0 {
            return Err(ConfigError::Invalid {
                name: "TOKEN_TTL_SECS",
                value: "0".to_string(),
            });
        }

        let bcrypt_cost = parsed("BCRYPT_COST", DEFAULT_BCRYPT_COST)?;
        // bcrypt only accepts work factors in 4..=31.
        if !(4..=31).contains(&bcrypt_cost) {
            return Err(ConfigError::Invalid {
                name: "BCRYPT_COST",
                value: bcrypt_cost.to_string(),
            });
        }

        let admin_seed = match (env::var("ADMIN_SEED_EMAIL"), env::var("ADMIN_SEED_PASSWORD")) {
            (Ok(email), Ok(password)) => Some(AdminSeed {
                name: env::var("ADMIN_SEED_NAME").unwrap_or_else(|_| "Administrator".to_string()),
                email,
                password,
            }),
            _ => None,
        };

        Ok(Self {
            db_url,
            env,
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string()),
            auth: AuthConfig {
                jwt_secret,
                token_ttl_secs,
                bcrypt_cost,
            },
            admin_seed,
        })
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::Missing(name))
}

fn parsed<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value: raw }),
        Err(_) => Ok(default),
    }
}
