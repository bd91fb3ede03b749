use std::env;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Required environment variable '{0}' is not set")]
    Missing(&'static str),
    #[error("Environment variable '{key}' has an invalid value: {value}")]
    Invalid { key: &'static str, value: String },
    #[error("'{0}' and '{1}' must be set together")]
    Incomplete(&'static str, &'static str),
}

#[derive(Debug, Clone)]
pub struct JwtSettings {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_hours: i64,
    pub refresh_ttl_days: i64,
}

#[derive(Debug, Clone)]
pub struct RazorpaySettings {
    pub key_id: String,
    pub key_secret: String,
}

#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub email: String,
    pub password: String,
}

/// Service configuration, read once at startup from `.env` + environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// `mongodb://...` or `memory://` for a throwaway in-process store
    pub database_url: String,
    pub jwt: JwtSettings,
    pub bcrypt_cost: u32,
    pub cors_origins: Vec<String>,
    pub razorpay: Option<RazorpaySettings>,
    pub admin_seed: Option<AdminSeed>,
    /// Active job posts allowed to institutions without a paid plan
    pub free_job_post_limit: u64,
    pub sweep_interval_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        let razorpay = match (optional("RAZORPAY_KEY_ID"), optional("RAZORPAY_KEY_SECRET")) {
            (Some(key_id), Some(key_secret)) => Some(RazorpaySettings { key_id, key_secret }),
            (None, None) => None,
            _ => return Err(ConfigError::Incomplete("RAZORPAY_KEY_ID", "RAZORPAY_KEY_SECRET")),
        };

        let admin_seed = match (optional("ADMIN_EMAIL"), optional("ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(AdminSeed { email, password }),
            (None, None) => None,
            _ => return Err(ConfigError::Incomplete("ADMIN_EMAIL", "ADMIN_PASSWORD")),
        };

        let cors_origins = optional("CORS_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_else(|| vec!["http://localhost:3000".to_string()]);

        Ok(Config {
            host: optional("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parsed("PORT", 5000)?,
            database_url: required("DATABASE_URL")?,
            jwt: JwtSettings {
                secret: required("JWT_SECRET")?,
                issuer: optional("JWT_ISSUER").unwrap_or_else(|| "eduhire-api".to_string()),
                audience: optional("JWT_AUDIENCE").unwrap_or_else(|| "eduhire-web".to_string()),
                ttl_hours: parsed("JWT_TTL_HOURS", 24)?,
                refresh_ttl_days: parsed("REFRESH_TTL_DAYS", 30)?,
            },
            bcrypt_cost: parsed("BCRYPT_COST", bcrypt::DEFAULT_COST)?,
            cors_origins,
            razorpay,
            admin_seed,
            free_job_post_limit: parsed("FREE_JOB_POST_LIMIT", 3)?,
            sweep_interval_secs: parsed("SWEEP_INTERVAL_SECS", 3600)?,
        })
    }
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn required(key: &'static str) -> Result<String, ConfigError> {
    optional(key).ok_or(ConfigError::Missing(key))
}

fn parsed<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match optional(key) {
        Some(value) => value.parse().map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parsed_reports_bad_values() {
        env::set_var("EDUHIRE_TEST_PORT_BAD", "eighty");
        match parsed::<u16>("EDUHIRE_TEST_PORT_BAD", 80) {
            Err(ConfigError::Invalid { key, value }) => {
                assert_eq!(key, "EDUHIRE_TEST_PORT_BAD");
                assert_eq!(value, "eighty");
            }
            other => panic!("expected invalid value, got {:?}", other),
        }
        assert_eq!(parsed::<u16>("EDUHIRE_TEST_PORT_UNSET", 80).unwrap(), 80);
    }
}
