use std::env;
use std::fmt;

const DEFAULT_API_PATH: &str = "/api";
const DEFAULT_CONSOLE_PATH: &str = "/console";
/// A century; longer lifetimes overflow timestamp arithmetic.
const MAX_JWT_EXPIRATION_HOURS: i64 = 24 * 365 * 100;

/// Raised at startup when an environment variable is missing or malformed.
#[derive(Debug, PartialEq, Eq)]
pub struct ConfigError {
    pub variable: &'static str,
    pub reason: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.variable, self.reason)
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone)]
pub struct Config {
    /// `None` runs the service on the in-memory store.
    pub database_url: Option<String>,
    pub server_port: u16,
    pub server_host: String,
    /// Base path every API route lives under, e.g. `/api`.
    pub api_path: String,
    pub console_path: String,
    pub jwt_secret: String,
    pub jwt_expiration_hours: i64,
    pub bcrypt_cost: u32,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key/value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = lookup("JWT_SECRET").ok_or(ConfigError {
            variable: "JWT_SECRET",
            reason: "must be set".into(),
        })?;
        if jwt_secret.is_empty() {
            return Err(ConfigError {
                variable: "JWT_SECRET",
                reason: "must not be empty".into(),
            });
        }

        let bcrypt_cost = parse_or(&lookup, "BCRYPT_COST", bcrypt::DEFAULT_COST)?;
        if !(4..=31).contains(&bcrypt_cost) {
            return Err(ConfigError {
                variable: "BCRYPT_COST",
                reason: format!("{} is outside 4..=31", bcrypt_cost),
            });
        }

        let jwt_expiration_hours = parse_or(&lookup, "JWT_EXPIRATION_HOURS", 24)?;
        if !(1..=MAX_JWT_EXPIRATION_HOURS).contains(&jwt_expiration_hours) {
            return Err(ConfigError {
                variable: "JWT_EXPIRATION_HOURS",
                reason: format!(
                    "{} is outside 1..={}",
                    jwt_expiration_hours, MAX_JWT_EXPIRATION_HOURS
                ),
            });
        }

        Ok(Self {
            database_url: lookup("DATABASE_URL").filter(|url| !url.is_empty()),
            server_port: parse_or(&lookup, "SERVER_PORT", 8080)?,
            server_host: lookup("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            api_path: base_path(&lookup, "API_PATH", DEFAULT_API_PATH)?,
            console_path: base_path(&lookup, "CONSOLE_PATH", DEFAULT_CONSOLE_PATH)?,
            jwt_secret,
            jwt_expiration_hours,
            bcrypt_cost,
        })
    }

    /// Configuration for tests: in-memory store, fast hashing.
    pub fn for_tests(jwt_secret: &str) -> Self {
        Self {
            database_url: None,
            server_port: 0,
            server_host: "127.0.0.1".to_string(),
            api_path: DEFAULT_API_PATH.to_string(),
            console_path: DEFAULT_CONSOLE_PATH.to_string(),
            jwt_secret: jwt_secret.to_string(),
            jwt_expiration_hours: 24,
            bcrypt_cost: 4,
        }
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }
}

fn parse_or<F, T>(lookup: &F, variable: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    match lookup(variable) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError {
            variable,
            reason: format!("cannot parse {:?}: {}", raw, e),
        }),
        None => Ok(default),
    }
}

fn base_path<F>(lookup: &F, variable: &'static str, default: &str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let path = lookup(variable).unwrap_or_else(|| default.to_string());
    let trimmed = path.trim_end_matches('/');
    if !trimmed.starts_with('/') {
        return Err(ConfigError {
            variable,
            reason: format!("{:?} must start with '/' and name a non-root prefix", path),
        });
    }
    Ok(trimmed.to_string())
}
