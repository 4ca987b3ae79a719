//! Configuration management
//!
//! Loads configuration from:
//! 1. Default values
//! 2. Configuration file (config/default.toml, config/local.toml)
//! 3. Environment variables (override)

use serde::Deserialize;
use std::{net::IpAddr, path::PathBuf};

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub admin: AdminConfig,
    pub payment: PaymentConfig,
    pub storage: StorageConfig,
    pub cache: CacheConfig,
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0")
    pub host: String,
    /// Port number (e.g., 8080)
    pub port: u16,
    /// Public domain (e.g., "prep.example.com")
    pub domain: String,
    /// Protocol ("http" or "https")
    pub protocol: String,
    /// Largest accepted request body, uploads included
    pub max_upload_bytes: usize,
}

impl ServerConfig {
    /// Get the base URL of the site
    ///
    /// # Returns
    /// Full URL like "https://prep.example.com"
    pub fn base_url(&self) -> String {
        format!("{}://{}", self.protocol, self.domain)
    }
}

/// Database configuration (SQLite only)
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to SQLite database file
    pub path: PathBuf,
}

/// Authentication configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Session signing secret (32+ bytes)
    pub session_secret: String,
    /// Session max age in seconds (default: 604800 = 7 days)
    pub session_max_age: i64,
    /// Failed logins allowed per e-mail within the window
    pub login_max_attempts: u32,
    /// Login throttling window in seconds
    pub login_window_seconds: u64,
}

/// Admin account created at startup when both fields are set
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AdminConfig {
    pub email: Option<String>,
    pub password: Option<String>,
    /// Display name (default: "Admin")
    #[serde(default = "default_admin_name")]
    pub name: String,
}

fn default_admin_name() -> String {
    "Admin".to_string()
}

/// Payment gateway configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentConfig {
    pub razorpay: RazorpayConfig,
}

/// Razorpay credentials
#[derive(Debug, Clone, Deserialize)]
pub struct RazorpayConfig {
    /// Public key id, handed to the checkout widget
    pub key_id: String,
    /// Secret used for API basic auth and signature verification
    pub key_secret: String,
    /// API base URL (default: "https://api.razorpay.com")
    pub api_base: String,
    /// ISO currency code (default: "INR")
    pub currency: String,
}

/// Supabase Storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Project URL, e.g. "https://abcd.supabase.co"
    pub url: String,
    /// Service role key
    pub service_key: String,
    /// Bucket holding material PDFs
    pub bucket: String,
    /// Lifetime of signed download URLs in seconds
    pub signed_url_ttl: u64,
}

/// Cache configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Catalog listing TTL in seconds (default: 300)
    pub catalog_ttl: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: String,
    /// Log format: "pretty" or "json"
    pub format: String,
}

impl LoggingConfig {
    const LEVELS: [&'static str; 5] = ["trace", "debug", "info", "warn", "error"];

    /// Filter used when `RUST_LOG` is not set
    pub fn filter_directives(&self) -> String {
        format!(
            "examdesk={},tower_http=debug",
            self.level.trim().to_ascii_lowercase()
        )
    }

    pub fn is_json(&self) -> bool {
        self.format.trim().eq_ignore_ascii_case("json")
    }
}

impl AppConfig {
    /// Load configuration from file and environment
    ///
    /// # Loading Order
    /// 1. Default values
    /// 2. config/default.toml (if exists)
    /// 3. config/local.toml (if exists)
    /// 4. Environment variables (EXAMDESK__*)
    ///
    /// # Errors
    /// Returns error if configuration is invalid
    pub fn load() -> Result<Self, crate::error::AppError> {
        use config::{Config, Environment, File};

        let config = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("server.domain", "localhost")?
            .set_default("server.protocol", "http")?
            .set_default("server.max_upload_bytes", 50 * 1024 * 1024)?
            .set_default("database.path", "data/examdesk.db")?
            .set_default("auth.session_max_age", 604800)?
            .set_default("auth.login_max_attempts", 10)?
            .set_default("auth.login_window_seconds", 900)?
            .set_default("payment.razorpay.api_base", "https://api.razorpay.com")?
            .set_default("payment.razorpay.currency", "INR")?
            .set_default("storage.bucket", "materials")?
            .set_default("storage.signed_url_ttl", 300)?
            .set_default("cache.catalog_ttl", 300)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(
                Environment::with_prefix("EXAMDESK")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;

        let app_config: Self = config
            .try_deserialize()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;
        app_config.validate()?;
        Ok(app_config)
    }

    pub fn should_use_secure_cookies(&self) -> bool {
        self.server.protocol.eq_ignore_ascii_case("https")
            || !is_local_server_domain(&self.server.domain)
    }

    /// Admin bootstrap credentials, when both are configured and non-empty
    pub fn admin_credentials(&self) -> Option<(&str, &str)> {
        let email = self.admin.email.as_deref().map(str::trim)?;
        let password = self.admin.password.as_deref()?;
        if email.is_empty() || password.is_empty() {
            return None;
        }
        Some((email, password))
    }

    pub(crate) fn validate(&self) -> Result<(), crate::error::AppError> {
        use crate::error::AppError;
        const MIN_SESSION_SECRET_BYTES: usize = 32;

        if self.auth.session_secret.len() < MIN_SESSION_SECRET_BYTES {
            return Err(AppError::Config(format!(
                "auth.session_secret must be at least {} bytes",
                MIN_SESSION_SECRET_BYTES
            )));
        }

        if self.auth.session_max_age <= 0 {
            return Err(AppError::Config(
                "auth.session_max_age must be greater than 0".to_string(),
            ));
        }

        if self.auth.login_max_attempts == 0 {
            return Err(AppError::Config(
                "auth.login_max_attempts must be greater than 0".to_string(),
            ));
        }

        if self.payment.razorpay.key_id.trim().is_empty()
            || self.payment.razorpay.key_secret.trim().is_empty()
        {
            return Err(AppError::Config(
                "payment.razorpay.key_id and key_secret are required".to_string(),
            ));
        }

        url::Url::parse(&self.payment.razorpay.api_base).map_err(|e| {
            AppError::Config(format!("payment.razorpay.api_base is not a URL: {e}"))
        })?;
        url::Url::parse(&self.storage.url)
            .map_err(|e| AppError::Config(format!("storage.url is not a URL: {e}")))?;

        let level = self.logging.level.trim().to_ascii_lowercase();
        if !LoggingConfig::LEVELS.contains(&level.as_str()) {
            return Err(AppError::Config(format!(
                "logging.level must be one of {}",
                LoggingConfig::LEVELS.join(", ")
            )));
        }
        let format = self.logging.format.trim();
        if !format.eq_ignore_ascii_case("pretty") && !format.eq_ignore_ascii_case("json") {
            return Err(AppError::Config(
                "logging.format must be \"pretty\" or \"json\"".to_string(),
            ));
        }

        if self.should_use_secure_cookies() && !self.server.protocol.eq_ignore_ascii_case("https") {
            return Err(AppError::Config(
                "server.protocol must be https for non-local server domains".to_string(),
            ));
        }

        Ok(())
    }
}

impl AppConfig {
    /// Warn about a valid but development-only setup, once tracing is up
    pub fn log_startup_warnings(&self) {
        if !self.should_use_secure_cookies() {
            tracing::warn!(
                host = %normalized_server_host(&self.server.domain),
                protocol = %self.server.protocol,
                "Using insecure session cookies for local development"
            );
        }
    }
}

fn normalized_server_host(domain: &str) -> String {
    let trimmed = domain.trim();
    let parsed_host = url::Url::parse(&format!("http://{trimmed}"))
        .ok()
        .and_then(|url| url.host_str().map(|host| host.to_string()));
    let host = parsed_host.unwrap_or_else(|| trimmed.to_string());
    host.trim_end_matches('.').to_ascii_lowercase()
}

fn is_local_server_domain(domain: &str) -> bool {
    let host = normalized_server_host(domain);
    if host == "localhost" || host.ends_with(".localhost") {
        return true;
    }

    if let Ok(ip) = host.parse::<IpAddr>() {
        return ip.is_loopback() || ip.is_unspecified();
    }

    false
}
