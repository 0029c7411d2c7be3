//! Application configuration module
//!
//! Handles loading and validating configuration from environment variables.
//! Settings are read once at startup and passed explicitly to whoever needs them.

use serde::Deserialize;
use std::net::Ipv4Addr;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: Ipv4Addr,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: Ipv4Addr::new(0, 0, 0, 0), // Bind to 0.0.0.0 for Docker
            port: 3000,
        }
    }
}

/// Hosted backend platform (identity, rest and storage APIs share one base URL)
#[derive(Debug, Clone, Deserialize)]
pub struct PlatformConfig {
    pub url: String,
    pub anon_key: String,
    pub service_role_key: String,
    pub profiles_table: String,
    pub storage_bucket: String,
    pub timeout_secs: u64,
}

impl PlatformConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Authentication configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Email granted `admin` without consulting the profile store.
    /// Empty disables the fail-safe path.
    pub fail_safe_admin_email: String,
    /// Where the platform sends the browser after a third-party sign-in
    pub redirect_url: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            fail_safe_admin_email: String::new(),
            redirect_url: "http://localhost:3001/auth/callback".to_string(),
        }
    }
}

/// CORS configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["http://localhost:3001".to_string()],
        }
    }
}

/// Complete application settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerConfig,
    pub platform: PlatformConfig,
    pub auth: AuthConfig,
    pub cors: CorsConfig,
}

impl Settings {
    /// Load settings from environment variables
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if it exists (ignore errors if file not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| ConfigError::MissingVar(key.to_string()))
        };

        let server = ServerConfig {
            host: lookup("HOST")
                .and_then(|h| h.parse().ok())
                .unwrap_or_else(|| ServerConfig::default().host),
            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or_else(|| ServerConfig::default().port),
        };

        let platform = PlatformConfig {
            url: Self::parse_platform_url(&required("PLATFORM_URL")?)?,
            anon_key: required("PLATFORM_ANON_KEY")?,
            service_role_key: required("PLATFORM_SERVICE_ROLE_KEY")?,
            profiles_table: lookup("PROFILES_TABLE").unwrap_or_else(|| "profiles".to_string()),
            storage_bucket: lookup("STORAGE_BUCKET").unwrap_or_else(|| "uploads".to_string()),
            timeout_secs: lookup("PLATFORM_TIMEOUT_SECS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
        };

        let auth = AuthConfig {
            fail_safe_admin_email: lookup("FAIL_SAFE_ADMIN_EMAIL")
                .map(|s| s.trim().to_string())
                .unwrap_or_default(),
            redirect_url: lookup("AUTH_REDIRECT_URL")
                .unwrap_or_else(|| AuthConfig::default().redirect_url),
        };

        let cors = CorsConfig {
            allowed_origins: lookup("ALLOWED_ORIGINS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or_else(|| CorsConfig::default().allowed_origins),
        };

        Ok(Self {
            server,
            platform,
            auth,
            cors,
        })
    }

    /// Validate the platform base URL and strip any trailing slash
    fn parse_platform_url(raw: &str) -> Result<String, ConfigError> {
        let parsed = url::Url::parse(raw).map_err(|_| {
            ConfigError::InvalidValue("Invalid PLATFORM_URL format (expected https://...)".to_string())
        })?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidValue(format!(
                "PLATFORM_URL must use http or https, got {}",
                parsed.scheme()
            )));
        }

        Ok(raw.trim_end_matches('/').to_string())
    }
}
