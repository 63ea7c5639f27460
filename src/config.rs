//! Configuration management for STL Hub
//!
//! The whole configuration is read once at startup from an optional `config.toml`
//! layered under `STL_HUB__*` environment variables, validated, and then handed to
//! the components that need it. Nothing below the server reads the environment.

use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Development signing secret; a warning is logged when it is still in use.
pub const DEV_SECRET_KEY: &str = "dev_secret_change_me";

/// Environment variable naming an alternative configuration file.
pub const CONFIG_PATH_ENV: &str = "STL_HUB_CONFIG";

/// Complete server configuration
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct ServerConfig {
    pub server: StartupConfig,
    pub auth: AuthConfig,
    pub chat: ChatConfig,
    pub terminal: TerminalConfig,
}

/// Network and storage settings
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StartupConfig {
    // ═══ NETWORK ═══
    /// IP address to bind the HTTP listener
    pub bind_address: String,

    /// Port for the HTTP listener
    pub port: u16,

    /// Public URL of this server, used to build the OAuth redirect URI
    pub app_base_url: String,

    // ═══ STORAGE ═══
    /// Directory holding one sub-directory per user
    pub storage_root: String,

    /// Directory holding the HTML pages and their assets
    pub static_dir: String,

    /// Request body limit for uploads, in MB
    pub max_upload_mb: u64,
}

impl Default for StartupConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 8080,
            app_base_url: "http://localhost:8080".to_string(),
            storage_root: "/srv/stl-hub/files".to_string(),
            static_dir: "static".to_string(),
            max_upload_mb: 512,
        }
    }
}

/// Session and OAuth settings
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AuthConfig {
    pub secret_key: String,
    pub token_expire_hours: u64,
    pub google_client_id: String,
    pub google_client_secret: String,
    /// Empty means every verified account is admitted
    pub allowed_emails: Vec<String>,
    pub google_auth_url: String,
    pub google_token_url: String,
    pub google_userinfo_url: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret_key: DEV_SECRET_KEY.to_string(),
            token_expire_hours: 8,
            google_client_id: String::new(),
            google_client_secret: String::new(),
            allowed_emails: Vec::new(),
            google_auth_url: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
            google_token_url: "https://oauth2.googleapis.com/token".to_string(),
            google_userinfo_url: "https://www.googleapis.com/oauth2/v3/userinfo".to_string(),
        }
    }
}

/// Upstream text-generation services used by the chat endpoint
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ChatConfig {
    pub anthropic_api_key: String,
    pub openai_api_key: String,
    pub anthropic_base_url: String,
    pub openai_base_url: String,
    pub max_tokens: u32,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            anthropic_api_key: String::new(),
            openai_api_key: String::new(),
            anthropic_base_url: "https://api.anthropic.com".to_string(),
            openai_base_url: "https://api.openai.com".to_string(),
            max_tokens: 1024,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct TerminalConfig {
    pub enabled: bool,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl ServerConfig {
    /// Load configuration from `config.toml` (or `$STL_HUB_CONFIG`) with environment overrides
    pub fn load() -> Result<Self, config::ConfigError> {
        let config_path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| "config".to_string());
        Self::load_from(&config_path)
    }

    /// Load configuration from the given file stem or path; a missing file falls back to defaults
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name(config_path).required(false))
            .add_source(
                Environment::with_prefix("STL_HUB")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("auth.allowed_emails")
                    .try_parsing(true),
            )
            .build()?;

        let config: ServerConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validation for all configuration values
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.server.port == 0 {
            return Err(config::ConfigError::Message("port cannot be 0".into()));
        }

        if self.server.storage_root.trim().is_empty() {
            return Err(config::ConfigError::Message(
                "storage_root cannot be empty".into(),
            ));
        }

        if self.server.max_upload_mb == 0 {
            return Err(config::ConfigError::Message(
                "max_upload_mb must be greater than 0".into(),
            ));
        }

        if self.auth.secret_key.is_empty() {
            return Err(config::ConfigError::Message(
                "secret_key cannot be empty".into(),
            ));
        }

        if self.auth.token_expire_hours == 0 {
            return Err(config::ConfigError::Message(
                "token_expire_hours must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    pub fn uses_dev_secret(&self) -> bool {
        self.auth.secret_key == DEV_SECRET_KEY
    }
}

impl StartupConfig {
    /// Bind address and port as a socket address string
    pub fn http_socket(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }

    pub fn storage_root_path(&self) -> PathBuf {
        PathBuf::from(&self.storage_root)
    }

    pub fn static_dir_path(&self) -> PathBuf {
        PathBuf::from(&self.static_dir)
    }

    /// Upload body limit in bytes
    pub fn max_upload_bytes(&self) -> usize {
        (self.max_upload_mb as usize).saturating_mul(1024 * 1024)
    }

    /// OAuth redirect target registered with Google
    pub fn oauth_redirect_uri(&self) -> String {
        format!(
            "{}/auth/google/callback",
            self.app_base_url.trim_end_matches('/')
        )
    }
}

impl AuthConfig {
    pub fn token_lifetime(&self) -> Duration {
        Duration::from_secs(self.token_expire_hours * 3600)
    }

    /// Whether the allow-list admits this email
    pub fn is_email_allowed(&self, email: &str) -> bool {
        self.allowed_emails.is_empty() || self.allowed_emails.iter().any(|e| e.trim() == email)
    }
}
