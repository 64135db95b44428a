use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub email: EmailConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Prebuilt SPA bundle, served for every non-API path
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
    /// Where uploaded images are written and served from (`/uploads`)
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
    /// Origins allowed to call the API cross-site; empty means same-origin only
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: default_static_dir(),
            upload_dir: default_upload_dir(),
            max_upload_bytes: default_max_upload_bytes(),
            cors_origins: Vec::new(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("static/dist")
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("./data/uploads")
}

fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// SQL when reachable, JSON file otherwise
    Auto,
    Sql,
    Json,
}

impl std::str::FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(StorageBackend::Auto),
            "sql" => Ok(StorageBackend::Sql),
            "json" => Ok(StorageBackend::Json),
            other => Err(format!("unknown storage backend '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_backend")]
    pub backend: StorageBackend,
    #[serde(default = "default_database_url")]
    pub database_url: Option<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_json_path")]
    pub json_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            database_url: default_database_url(),
            max_connections: default_max_connections(),
            json_path: default_json_path(),
        }
    }
}

fn default_backend() -> StorageBackend {
    StorageBackend::Auto
}

fn default_database_url() -> Option<String> {
    Some("sqlite:./data/vetmission.db?mode=rwc".to_string())
}

fn default_max_connections() -> u32 {
    5
}

fn default_json_path() -> PathBuf {
    PathBuf::from("./data/content.json")
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Plain admin password, compared in constant time
    #[serde(default)]
    pub admin_password: Option<String>,
    /// Argon2 hash of the admin password; takes precedence over `admin_password`
    #[serde(default)]
    pub admin_password_hash: Option<String>,
    /// Secret used to sign admin tokens (HS256)
    #[serde(default)]
    pub jwt_secret: String,
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            admin_password: None,
            admin_password_hash: None,
            jwt_secret: String::new(),
            token_ttl_hours: default_token_ttl_hours(),
        }
    }
}

fn default_token_ttl_hours() -> i64 {
    24
}

/// Generate a random signing secret
fn generate_secret() -> String {
    use rand::Rng;
    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();
    hex::encode(bytes)
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    pub smtp_host: Option<String>,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    #[serde(default = "default_smtp_tls")]
    pub smtp_tls: bool,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub from_address: Option<String>,
    #[serde(default = "default_from_name")]
    pub from_name: String,
    /// Inbox that receives contact form submissions
    pub contact_recipient: Option<String>,
}

impl EmailConfig {
    /// Whether enough is configured to deliver contact form mail
    pub fn is_configured(&self) -> bool {
        self.smtp_host.is_some() && self.from_address.is_some() && self.contact_recipient.is_some()
    }
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            smtp_host: None,
            smtp_port: default_smtp_port(),
            smtp_tls: default_smtp_tls(),
            smtp_username: None,
            smtp_password: None,
            from_address: None,
            from_name: default_from_name(),
            contact_recipient: None,
        }
    }
}

fn default_smtp_port() -> u16 {
    587
}

fn default_smtp_tls() -> bool {
    true
}

fn default_from_name() -> String {
    "Veterinary Mission Website".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_rate_limit_enabled")]
    pub enabled: bool,
    #[serde(default = "default_api_requests")]
    pub api_requests_per_window: u32,
    #[serde(default = "default_auth_requests")]
    pub auth_requests_per_window: u32,
    #[serde(default = "default_contact_requests")]
    pub contact_requests_per_window: u32,
    #[serde(default = "default_window_seconds")]
    pub window_seconds: u64,
    /// Seconds between sweeps of stale limiter entries
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval: u64,
    /// Key clients by `X-Forwarded-For`/`X-Real-IP`. Only enable behind a
    /// reverse proxy that overwrites these headers.
    #[serde(default)]
    pub trust_proxy_headers: bool,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: default_rate_limit_enabled(),
            api_requests_per_window: default_api_requests(),
            auth_requests_per_window: default_auth_requests(),
            contact_requests_per_window: default_contact_requests(),
            window_seconds: default_window_seconds(),
            cleanup_interval: default_cleanup_interval(),
            trust_proxy_headers: false,
        }
    }
}

fn default_rate_limit_enabled() -> bool {
    true
}

fn default_api_requests() -> u32 {
    300
}

fn default_auth_requests() -> u32 {
    10
}

fn default_contact_requests() -> u32 {
    5
}

fn default_window_seconds() -> u64 {
    60
}

fn default_cleanup_interval() -> u64 {
    300
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load the TOML file (if present), then apply environment overrides.
    pub fn load(path: &Path) -> Result<Self> {
        Self::load_with(path, |key| std::env::var(key).ok())
    }

    fn load_with<F>(path: &Path, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = if path.exists() {
            info!("Loading configuration from {}", path.display());
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            Self::from_toml(&content)?
        } else {
            info!("No config file found, using defaults");
            Config::default()
        };

        config.apply_env(lookup)?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).with_context(|| "Failed to parse configuration file")
    }

    /// Apply overrides from environment-style variables.
    ///
    /// Takes a lookup function so the override rules can be exercised
    /// without touching the process environment.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("ADMIN_PASSWORD") {
            self.auth.admin_password = Some(v);
        }
        if let Some(v) = lookup("ADMIN_PASSWORD_HASH") {
            self.auth.admin_password_hash = Some(v);
        }
        if let Some(v) = lookup("JWT_SECRET") {
            self.auth.jwt_secret = v;
        }
        if let Some(v) = lookup("DATABASE_URL") {
            self.storage.database_url = if v.is_empty() { None } else { Some(v) };
        }
        if let Some(v) = lookup("STORAGE_BACKEND") {
            self.storage.backend = v.parse().map_err(anyhow::Error::msg)?;
        }
        if let Some(v) = lookup("JSON_STORE_PATH") {
            self.storage.json_path = PathBuf::from(v);
        }
        if let Some(v) = lookup("SMTP_HOST") {
            self.email.smtp_host = Some(v);
        }
        if let Some(v) = lookup("SMTP_PORT") {
            self.email.smtp_port = v
                .parse()
                .with_context(|| format!("SMTP_PORT is not a valid port: {v}"))?;
        }
        if let Some(v) = lookup("SMTP_USER") {
            self.email.smtp_username = Some(v);
        }
        if let Some(v) = lookup("SMTP_PASSWORD") {
            self.email.smtp_password = Some(v);
        }
        if let Some(v) = lookup("SMTP_FROM") {
            self.email.from_address = Some(v);
        }
        if let Some(v) = lookup("CONTACT_EMAIL") {
            self.email.contact_recipient = Some(v);
        }
        if let Some(v) = lookup("PORT") {
            self.server.port = v
                .parse()
                .with_context(|| format!("PORT is not a valid port: {v}"))?;
        }
        Ok(())
    }

    /// Fill an empty JWT secret with a random one. Returns whether it did.
    ///
    /// Tokens signed with a generated secret stop validating on restart,
    /// so this is only acceptable for local development.
    pub fn ensure_jwt_secret(&mut self) -> bool {
        if !self.auth.jwt_secret.is_empty() {
            return false;
        }
        self.auth.jwt_secret = generate_secret();
        true
    }

    /// Problems that make the configuration unusable or unsafe
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();

        let has_password = self
            .auth
            .admin_password
            .as_deref()
            .is_some_and(|p| !p.is_empty());
        let has_hash = self
            .auth
            .admin_password_hash
            .as_deref()
            .is_some_and(|h| !h.is_empty());
        if !has_password && !has_hash {
            problems.push(
                "auth: neither admin_password nor admin_password_hash is set; admin login is disabled"
                    .to_string(),
            );
        }
        if self.auth.jwt_secret.is_empty() {
            problems.push(
                "auth: jwt_secret is not set; a random one will be generated and admin sessions will not survive a restart"
                    .to_string(),
            );
        } else if self.auth.jwt_secret.len() < 32 {
            problems.push("auth: jwt_secret should be at least 32 characters".to_string());
        }
        if self.auth.token_ttl_hours <= 0 {
            problems.push("auth: token_ttl_hours must be positive".to_string());
        }
        if self.server.max_upload_bytes == 0 {
            problems.push("server: max_upload_bytes must be greater than 0".to_string());
        }
        if self.storage.backend == StorageBackend::Sql && self.storage.database_url.is_none() {
            problems.push("storage: backend \"sql\" requires database_url".to_string());
        }
        if self.storage.max_connections == 0 {
            problems.push("storage: max_connections must be greater than 0".to_string());
        }
        if self.email.smtp_host.is_some() && !self.email.is_configured() {
            problems.push(
                "email: smtp_host is set but from_address or contact_recipient is missing"
                    .to_string(),
            );
        }

        problems
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.server.max_upload_bytes, 10 * 1024 * 1024);
        assert_eq!(config.storage.backend, StorageBackend::Auto);
        assert_eq!(config.auth.token_ttl_hours, 24);
        assert!(!config.email.is_configured());
    }

    #[test]
    fn test_parse_partial_toml() {
        let config = Config::from_toml(
            r#"
            [server]
            port = 8080

            [storage]
            backend = "json"
            json_path = "/srv/site/content.json"

            [auth]
            admin_password = "hunter2hunter2"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.storage.backend, StorageBackend::Json);
        assert_eq!(config.storage.json_path, PathBuf::from("/srv/site/content.json"));
        assert_eq!(config.auth.admin_password.as_deref(), Some("hunter2hunter2"));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("ADMIN_PASSWORD", "from-env"),
            ("STORAGE_BACKEND", "SQL"),
            ("DATABASE_URL", "sqlite::memory:"),
            ("SMTP_PORT", "2525"),
            ("PORT", "3001"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config
            .apply_env(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.auth.admin_password.as_deref(), Some("from-env"));
        assert_eq!(config.storage.backend, StorageBackend::Sql);
        assert_eq!(config.storage.database_url.as_deref(), Some("sqlite::memory:"));
        assert_eq!(config.email.smtp_port, 2525);
        assert_eq!(config.server.port, 3001);
    }

    #[test]
    fn test_empty_database_url_disables_sql() {
        let mut config = Config::default();
        config
            .apply_env(|k| (k == "DATABASE_URL").then(String::new))
            .unwrap();
        assert!(config.storage.database_url.is_none());
    }

    #[test]
    fn test_invalid_env_values_are_errors() {
        let mut config = Config::default();
        assert!(config
            .apply_env(|k| (k == "STORAGE_BACKEND").then(|| "mysql".to_string()))
            .is_err());
        assert!(config
            .apply_env(|k| (k == "PORT").then(|| "eighty".to_string()))
            .is_err());
    }

    #[test]
    fn test_generated_jwt_secret() {
        let mut config = Config::default();
        assert!(config.ensure_jwt_secret());
        assert_eq!(config.auth.jwt_secret.len(), 64);

        let secret = config.auth.jwt_secret.clone();
        assert!(!config.ensure_jwt_secret());
        assert_eq!(config.auth.jwt_secret, secret);
    }

    #[test]
    fn test_load_reports_missing_jwt_secret() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.toml");

        let config = Config::load_with(&path, |k| {
            (k == "ADMIN_PASSWORD").then(|| "correct horse battery staple".to_string())
        })
        .unwrap();

        assert!(config.auth.jwt_secret.is_empty());
        let problems = config.validate();
        assert_eq!(problems.len(), 1);
        assert!(problems[0].contains("jwt_secret is not set"));
    }

    #[test]
    fn test_load_reads_file_then_env() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vetmission.toml");
        std::fs::write(
            &path,
            "[auth]\njwt_secret = \"from-file-from-file-from-file-0123\"\n[server]\nport = 8080\n",
        )
        .unwrap();

        let config = Config::load_with(&path, |k| (k == "PORT").then(|| "9000".to_string())).unwrap();
        assert_eq!(config.auth.jwt_secret, "from-file-from-file-from-file-0123");
        assert_eq!(config.server.port, 9000);
    }

    #[test]
    fn test_validate_reports_missing_credentials() {
        let config = Config::default();
        let problems = config.validate();
        assert!(problems.iter().any(|p| p.contains("admin_password")));
        assert!(problems.iter().any(|p| p.contains("jwt_secret")));
    }

    #[test]
    fn test_validate_clean_config() {
        let mut config = Config::default();
        config.auth.admin_password = Some("correct horse battery staple".to_string());
        config.auth.jwt_secret = "x".repeat(48);
        assert!(config.validate().is_empty());
    }
}
