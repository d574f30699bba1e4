use std::path::Path;

use serde::Deserialize;

/// Upper bound for `session.lifetime_hours` (ten years).
pub const MAX_SESSION_LIFETIME_HOURS: i64 = 24 * 366 * 10;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub static_dir: String,
    pub request_timeout_secs: u64,
    pub max_body_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
}

/// Session cookie and lifetime settings.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub cookie_name: String,
    /// Absolute lifetime, counted from the moment the session is created.
    pub lifetime_hours: i64,
    /// Emit the `Secure` cookie attribute. Only disable for plain-HTTP development.
    pub secure: bool,
    /// Key for deriving CSRF tokens. Empty means a random key per process.
    pub secret: Option<String>,
    pub cleanup_interval_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct SecurityConfig {
    pub enable_hsts: Option<bool>,
    pub hsts_max_age: Option<u64>,
    pub hsts_include_subdomains: Option<bool>,
    pub csp: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub session: SessionConfig,
    pub security: Option<SecurityConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        // Fallback: parse the embedded default TOML
        let defaults: &str = include_str!("../config/default.toml");
        match ::config::Config::builder()
            .add_source(::config::File::from_str(defaults, ::config::FileFormat::Toml))
            .build()
            .and_then(|cfg| cfg.try_deserialize())
        {
            Ok(app_cfg) => app_cfg,
            Err(e) => {
                eprintln!("FATAL: Failed to load embedded default config: {}", e);
                panic!("Failed to load embedded default config: {}", e);
            }
        }
    }
}

pub fn load() -> anyhow::Result<AppConfig> {
    // Load .env first (optional)
    let _ = dotenvy::dotenv();

    let defaults: &str = include_str!("../config/default.toml");
    let mut builder = ::config::Config::builder()
        .add_source(::config::File::from_str(defaults, ::config::FileFormat::Toml))
        // Optional local file: snippetbox.toml (in CWD)
        .add_source(::config::File::with_name("snippetbox").required(false));

    if let Ok(custom_path) = std::env::var("SNIPPETBOX_CONFIG") {
        builder = builder.add_source(::config::File::with_name(&custom_path).required(false));
    }
    // Environment variables last to have highest precedence
    builder = builder.add_source(::config::Environment::with_prefix("SNIPPETBOX").separator("__"));

    let cfg = builder.build()?;
    let app_cfg: AppConfig = cfg.try_deserialize()?;
    validate(&app_cfg)?;
    Ok(app_cfg)
}

pub fn validate(cfg: &AppConfig) -> anyhow::Result<()> {
    if cfg.server.port == 0 {
        return Err(anyhow::anyhow!("invalid server.port: {}", cfg.server.port));
    }
    #[cfg(unix)]
    if cfg.server.port < 1024 {
        tracing::warn!("Using privileged port {} - may require elevated permissions", cfg.server.port);
    }
    if cfg.server.request_timeout_secs == 0 {
        return Err(anyhow::anyhow!("server.request_timeout_secs must be > 0"));
    }
    if cfg.server.max_body_bytes < 1024 {
        return Err(anyhow::anyhow!("server.max_body_bytes must be at least 1024"));
    }

    let name = cfg.session.cookie_name.trim();
    if name.is_empty() || name.contains(|c: char| c == ';' || c == '=' || c == ',' || c.is_whitespace()) {
        return Err(anyhow::anyhow!("invalid session.cookie_name: {:?}", cfg.session.cookie_name));
    }
    if cfg.session.lifetime_hours <= 0 || cfg.session.lifetime_hours > MAX_SESSION_LIFETIME_HOURS {
        return Err(anyhow::anyhow!(
            "session.lifetime_hours must be between 1 and {}",
            MAX_SESSION_LIFETIME_HOURS
        ));
    }
    if cfg.session.cleanup_interval_secs == 0 {
        return Err(anyhow::anyhow!("session.cleanup_interval_secs must be > 0"));
    }
    if !cfg.session.secure {
        tracing::warn!("session.secure is disabled - session cookies will be sent over plain HTTP");
    }
    if let Some(secret) = cfg.session.secret.as_deref() {
        if !secret.is_empty() && secret.len() < 32 {
            return Err(anyhow::anyhow!("session.secret must be at least 32 bytes when set"));
        }
    }

    Ok(())
}

pub fn ensure_sqlite_parent_dir(url: &str) -> anyhow::Result<()> {
    if let Some(path) = url.strip_prefix("sqlite://") {
        let path = path.split('?').next().unwrap_or(path);
        let p = Path::new(path);
        if let Some(parent) = p.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
    }
    Ok(())
}
