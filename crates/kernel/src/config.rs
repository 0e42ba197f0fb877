//! Configuration loaded from environment variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port (default: 3000).
    pub port: u16,

    /// PostgreSQL connection URL. When None, an in-memory store is used.
    pub database_url: Option<String>,

    /// Maximum database connections in pool (default: 10).
    pub database_max_connections: u32,

    /// Upper bound for a single persistence call (default: 5s).
    pub store_timeout: Duration,

    /// Administrator login email.
    pub admin_email: String,

    /// Administrator login password.
    pub admin_password: String,

    /// HMAC secret for signing admin tokens.
    pub jwt_secret: String,

    /// Admin token lifetime (default: 240 minutes).
    pub jwt_expire: Duration,

    /// Maximum mutating requests per client and route within the window.
    pub rate_limit_max: usize,

    /// Sliding window length for rate limiting (default: 60s).
    pub rate_limit_window: Duration,

    /// CORS allowed origins (comma-separated, default: "*").
    pub cors_allowed_origins: Vec<String>,

    /// Path to uploads directory (default: ./uploads).
    pub uploads_dir: PathBuf,

    /// Base URL for serving uploaded files (default: /static/uploads).
    pub files_url: String,

    /// S3 bucket for uploads. When set (and built with `s3`), replaces local storage.
    pub s3_bucket: Option<String>,

    /// Optional key prefix inside the S3 bucket.
    pub s3_prefix: Option<String>,

    /// Public base URL for objects in the S3 bucket.
    pub s3_public_url: Option<String>,

    /// Custom S3 endpoint (MinIO, Supabase storage, ...).
    pub s3_endpoint: Option<String>,

    /// Directory with the admin UI static files, served at /admin.
    pub admin_static_dir: PathBuf,

    /// SMTP host for lead notifications. When None, notifications are disabled.
    pub smtp_host: Option<String>,

    /// SMTP port (default: 587).
    pub smtp_port: u16,

    /// SMTP username for authentication.
    pub smtp_username: Option<String>,

    /// SMTP password for authentication.
    pub smtp_password: Option<String>,

    /// SMTP encryption mode: "starttls" (default), "tls", or "none".
    pub smtp_encryption: String,

    /// From address for outgoing email.
    pub smtp_from_email: String,

    /// Recipients of lead notifications.
    pub leads_to_email: Vec<String>,

    /// Upper bound for a single notification send (default: 10s).
    pub notify_timeout: Duration,

    /// Directory of JSON documents to seed at startup.
    pub seed_dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .context("PORT must be a valid u16")?;

        let database_url = env::var("DATABASE_URL").ok().filter(|s| !s.is_empty());

        let database_max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .context("DATABASE_MAX_CONNECTIONS must be a valid u32")?;

        let store_timeout = secs_var("STORE_TIMEOUT_SECS", 5)?;

        let admin_email =
            env::var("ADMIN_EMAIL").unwrap_or_else(|_| "admin@example.com".to_string());
        let admin_password = env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "changeme".to_string());
        let jwt_secret = env::var("JWT_SECRET").unwrap_or_else(|_| "replace-me".to_string());

        let jwt_expire_minutes: u64 = env::var("JWT_EXPIRE_MINUTES")
            .unwrap_or_else(|_| "240".to_string())
            .parse()
            .context("JWT_EXPIRE_MINUTES must be a valid number of minutes")?;

        let rate_limit_max = env::var("RATE_LIMIT_MAX")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .context("RATE_LIMIT_MAX must be a valid number")?;

        let rate_limit_window = secs_var("RATE_LIMIT_WINDOW_SECS", 60)?;

        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .map(|v| split_list(&v))
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| vec!["*".to_string()]);

        let uploads_dir = env::var("UPLOADS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./uploads"));

        let files_url = env::var("FILES_URL").unwrap_or_else(|_| "/static/uploads".to_string());

        let admin_static_dir = env::var("ADMIN_STATIC_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./admin_static"));

        let smtp_host = env::var("SMTP_HOST").ok().filter(|s| !s.is_empty());

        let smtp_port = env::var("SMTP_PORT")
            .unwrap_or_else(|_| "587".to_string())
            .parse()
            .context("SMTP_PORT must be a valid u16")?;

        let smtp_encryption = env::var("SMTP_ENCRYPTION")
            .unwrap_or_else(|_| "starttls".to_string())
            .to_lowercase();

        let smtp_from_email =
            env::var("SMTP_FROM_EMAIL").unwrap_or_else(|_| "noreply@localhost".to_string());

        let leads_to_email = env::var("LEADS_TO_EMAIL")
            .map(|v| split_list(&v))
            .unwrap_or_else(|_| vec!["office@localhost".to_string()]);

        let config = Self {
            port,
            database_url,
            database_max_connections,
            store_timeout,
            admin_email,
            admin_password,
            jwt_secret,
            jwt_expire: Duration::from_secs(jwt_expire_minutes * 60),
            rate_limit_max,
            rate_limit_window,
            cors_allowed_origins,
            uploads_dir,
            files_url,
            s3_bucket: env::var("S3_BUCKET").ok().filter(|s| !s.is_empty()),
            s3_prefix: env::var("S3_PREFIX").ok().filter(|s| !s.is_empty()),
            s3_public_url: env::var("S3_PUBLIC_URL").ok(),
            s3_endpoint: env::var("S3_ENDPOINT").ok(),
            admin_static_dir,
            smtp_host,
            smtp_port,
            smtp_username: env::var("SMTP_USERNAME").ok(),
            smtp_password: env::var("SMTP_PASSWORD").ok(),
            smtp_encryption,
            smtp_from_email,
            leads_to_email,
            notify_timeout: secs_var("NOTIFY_TIMEOUT_SECS", 10)?,
            seed_dir: env::var("SEED_DIR").map(PathBuf::from).ok(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would disable or crash a component.
    pub fn validate(&self) -> Result<()> {
        if self.rate_limit_max == 0 {
            bail!("RATE_LIMIT_MAX must be at least 1");
        }
        if self.rate_limit_window.is_zero() {
            bail!("RATE_LIMIT_WINDOW_SECS must be at least 1");
        }
        if self.jwt_expire.is_zero() {
            bail!("JWT_EXPIRE_MINUTES must be at least 1");
        }
        if self.store_timeout.is_zero() {
            bail!("STORE_TIMEOUT_SECS must be at least 1");
        }
        if self.notify_timeout.is_zero() {
            bail!("NOTIFY_TIMEOUT_SECS must be at least 1");
        }
        Ok(())
    }

    /// Whether any credential or secret is still at its shipped default.
    ///
    /// Also true for [`Config::default`].
    pub fn uses_default_secrets(&self) -> bool {
        self.admin_password == "changeme" || self.jwt_secret == "replace-me"
    }
}

impl Default for Config {
    /// The values `from_env` falls back to when nothing is set.
    fn default() -> Self {
        Self {
            port: 3000,
            database_url: None,
            database_max_connections: 10,
            store_timeout: Duration::from_secs(5),
            admin_email: "admin@example.com".to_string(),
            admin_password: "changeme".to_string(),
            jwt_secret: "replace-me".to_string(),
            jwt_expire: Duration::from_secs(240 * 60),
            rate_limit_max: 30,
            rate_limit_window: Duration::from_secs(60),
            cors_allowed_origins: vec!["*".to_string()],
            uploads_dir: PathBuf::from("./uploads"),
            files_url: "/static/uploads".to_string(),
            s3_bucket: None,
            s3_prefix: None,
            s3_public_url: None,
            s3_endpoint: None,
            admin_static_dir: PathBuf::from("./admin_static"),
            smtp_host: None,
            smtp_port: 587,
            smtp_username: None,
            smtp_password: None,
            smtp_encryption: "starttls".to_string(),
            smtp_from_email: "noreply@localhost".to_string(),
            leads_to_email: vec!["office@localhost".to_string()],
            notify_timeout: Duration::from_secs(10),
            seed_dir: None,
        }
    }
}

fn secs_var(name: &str, default: u64) -> Result<Duration> {
    let secs: u64 = match env::var(name) {
        Ok(v) => v
            .parse()
            .with_context(|| format!("{name} must be a whole number of seconds"))?,
        Err(_) => default,
    };
    Ok(Duration::from_secs(secs))
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn split_list_drops_blanks() {
        assert_eq!(
            split_list(" a@x.com, ,b@x.com,"),
            vec!["a@x.com".to_string(), "b@x.com".to_string()]
        );
    }

    #[test]
    fn default_flags_shipped_secrets() {
        let mut config = Config::default();
        assert!(config.uses_default_secrets());
        config.admin_password = "long-and-random".to_string();
        config.jwt_secret = "another-long-random-value".to_string();
        assert!(!config.uses_default_secrets());
    }

    #[test]
    fn defaults_pass_validation() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn zero_rate_limit_settings_are_rejected() {
        let config = Config {
            rate_limit_window: Duration::ZERO,
            ..Config::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("RATE_LIMIT_WINDOW_SECS"));

        let config = Config {
            rate_limit_max: 0,
            ..Config::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("RATE_LIMIT_MAX"));
    }

    #[test]
    fn zero_timeouts_are_rejected() {
        let config = Config {
            notify_timeout: Duration::ZERO,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }
}
