use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::utils::file::expand_path;

use super::cli::CliConfig;
use super::constants::{
    APP_DOT_FOLDER, CONFIG_FILE_NAME, DEFAULT_HOST, DEFAULT_PORT, DEFAULT_SESSION_TTL_SECS,
    MIN_JWT_SECRET_LEN, POSTGRES_DEFAULT_ACQUIRE_TIMEOUT_SECS, POSTGRES_DEFAULT_IDLE_TIMEOUT_SECS,
    POSTGRES_DEFAULT_MAX_CONNECTIONS, POSTGRES_DEFAULT_MAX_LIFETIME_SECS,
    POSTGRES_DEFAULT_MIN_CONNECTIONS, POSTGRES_DEFAULT_STATEMENT_TIMEOUT_SECS,
};

// =============================================================================
// File Config Structs (JSON, every field optional)
// =============================================================================

/// Server configuration section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ServerFileConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub cors_origins: Option<Vec<String>>,
}

/// Authentication configuration section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct AuthFileConfig {
    pub jwt_secret: Option<String>,
    pub session_ttl_secs: Option<u64>,
}

/// PostgreSQL configuration section (from JSON config file)
#[derive(Debug, Default, Clone, Deserialize)]
pub struct PostgresFileConfig {
    /// PostgreSQL connection URL (or use DATABASE_URL env var)
    pub url: Option<String>,
    /// Maximum number of connections in the pool (default: 20)
    pub max_connections: Option<u32>,
    /// Minimum number of connections to keep warm (default: 2)
    pub min_connections: Option<u32>,
    /// Connection acquire timeout in seconds (default: 30)
    pub acquire_timeout_secs: Option<u64>,
    /// Idle connection timeout in seconds (default: 600)
    pub idle_timeout_secs: Option<u64>,
    /// Max connection lifetime in seconds (default: 1800)
    pub max_lifetime_secs: Option<u64>,
    /// Statement timeout in seconds (default: 60)
    pub statement_timeout_secs: Option<u64>,
}

/// File-based configuration (JSON)
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub server: Option<ServerFileConfig>,
    pub auth: Option<AuthFileConfig>,
    pub postgres: Option<PostgresFileConfig>,
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

/// Overwrite `current` with `incoming` when the incoming layer sets it
fn take<T>(current: &mut Option<T>, incoming: Option<T>) {
    if incoming.is_some() {
        *current = incoming;
    }
}

impl FileConfig {
    /// Load configuration from a JSON file
    fn load_from_file(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "Loading config file");
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Warn about unknown fields in the config
    fn warn_unknown_fields(&self) {
        if let serde_json::Value::Object(map) = &self.extra
            && !map.is_empty()
        {
            let keys_str: String = map
                .keys()
                .map(|k| k.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            tracing::warn!(
                fields = %keys_str,
                "Unknown fields in config file (possible typos)"
            );
        }
    }

    /// Merge another FileConfig into this one (other takes precedence)
    fn merge(&mut self, other: FileConfig) {
        if let Some(server) = other.server {
            let current = self.server.get_or_insert_with(ServerFileConfig::default);
            take(&mut current.host, server.host);
            take(&mut current.port, server.port);
            take(&mut current.cors_origins, server.cors_origins);
        }

        if let Some(auth) = other.auth {
            let current = self.auth.get_or_insert_with(AuthFileConfig::default);
            take(&mut current.jwt_secret, auth.jwt_secret);
            take(&mut current.session_ttl_secs, auth.session_ttl_secs);
        }

        if let Some(pg) = other.postgres {
            let current = self.postgres.get_or_insert_with(PostgresFileConfig::default);
            take(&mut current.url, pg.url);
            take(&mut current.max_connections, pg.max_connections);
            take(&mut current.min_connections, pg.min_connections);
            take(&mut current.acquire_timeout_secs, pg.acquire_timeout_secs);
            take(&mut current.idle_timeout_secs, pg.idle_timeout_secs);
            take(&mut current.max_lifetime_secs, pg.max_lifetime_secs);
            take(&mut current.statement_timeout_secs, pg.statement_timeout_secs);
        }
    }
}

// =============================================================================
// Runtime Config Structs (final merged configuration)
// =============================================================================

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Session signing configuration
#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub session_ttl_secs: u64,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .field("session_ttl_secs", &self.session_ttl_secs)
            .finish()
    }
}

/// PostgreSQL configuration (final/runtime)
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// PostgreSQL connection URL
    pub url: String,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Minimum number of connections to keep warm
    pub min_connections: u32,
    /// Connection acquire timeout in seconds
    pub acquire_timeout_secs: u64,
    /// Idle connection timeout in seconds
    pub idle_timeout_secs: u64,
    /// Max connection lifetime in seconds
    pub max_lifetime_secs: u64,
    /// Statement timeout in seconds
    pub statement_timeout_secs: u64,
}

/// Final merged application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    /// Explicit CORS origins; empty means localhost defaults
    pub cors_origins: Vec<String>,
    pub auth: AuthConfig,
    pub postgres: PostgresConfig,
}

impl AppConfig {
    /// Load configuration from all sources
    ///
    /// Priority (lowest to highest):
    /// 1. Defaults
    /// 2. Profile directory config (~/.leaddesk/leaddesk.json)
    /// 3. Local directory config OR CLI-specified config path
    /// 4. CLI arguments (which include env var fallbacks via clap)
    pub fn load(cli: &CliConfig) -> Result<Self> {
        tracing::debug!("Loading application configuration");

        let mut file_config = FileConfig::default();
        let mut found_configs: Vec<String> = Vec::new();

        if let Some(profile_path) = get_profile_config_path()
            && profile_path.exists()
        {
            let profile_config = FileConfig::load_from_file(&profile_path)?;
            profile_config.warn_unknown_fields();
            file_config.merge(profile_config);
            found_configs.push(profile_path.display().to_string());
        }

        let overlay_path = if let Some(ref path) = cli.config {
            let expanded = expand_path(&path.to_string_lossy());
            if !expanded.exists() {
                anyhow::bail!("Config file not found: {}", expanded.display());
            }
            Some(expanded)
        } else {
            let local = PathBuf::from(CONFIG_FILE_NAME);
            if local.exists() { Some(local) } else { None }
        };

        if let Some(path) = overlay_path {
            let overlay_config = FileConfig::load_from_file(&path)?;
            overlay_config.warn_unknown_fields();
            file_config.merge(overlay_config);
            found_configs.push(path.display().to_string());
        }

        tracing::debug!(configs = ?found_configs, "Config files loaded");

        let config = Self::resolve(file_config, cli);
        config.validate()?;
        Ok(config)
    }

    /// Layer defaults, merged file config and CLI/env overrides
    pub fn resolve(file_config: FileConfig, cli: &CliConfig) -> Self {
        let file_server = file_config.server.unwrap_or_default();
        let file_auth = file_config.auth.unwrap_or_default();
        let file_pg = file_config.postgres.unwrap_or_default();

        let host = cli
            .host
            .clone()
            .or(file_server.host)
            .unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = cli.port.or(file_server.port).unwrap_or(DEFAULT_PORT);

        let cors_origins = cli
            .cors_origins
            .clone()
            .or(file_server.cors_origins)
            .unwrap_or_default()
            .into_iter()
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .collect();

        let auth = AuthConfig {
            jwt_secret: cli
                .jwt_secret
                .clone()
                .or(file_auth.jwt_secret)
                .unwrap_or_default(),
            session_ttl_secs: file_auth
                .session_ttl_secs
                .unwrap_or(DEFAULT_SESSION_TTL_SECS),
        };

        let postgres = PostgresConfig {
            url: cli
                .database_url
                .clone()
                .or(file_pg.url)
                .unwrap_or_default(),
            max_connections: file_pg
                .max_connections
                .unwrap_or(POSTGRES_DEFAULT_MAX_CONNECTIONS),
            min_connections: file_pg
                .min_connections
                .unwrap_or(POSTGRES_DEFAULT_MIN_CONNECTIONS),
            acquire_timeout_secs: file_pg
                .acquire_timeout_secs
                .unwrap_or(POSTGRES_DEFAULT_ACQUIRE_TIMEOUT_SECS),
            idle_timeout_secs: file_pg
                .idle_timeout_secs
                .unwrap_or(POSTGRES_DEFAULT_IDLE_TIMEOUT_SECS),
            max_lifetime_secs: file_pg
                .max_lifetime_secs
                .unwrap_or(POSTGRES_DEFAULT_MAX_LIFETIME_SECS),
            statement_timeout_secs: file_pg
                .statement_timeout_secs
                .unwrap_or(POSTGRES_DEFAULT_STATEMENT_TIMEOUT_SECS),
        };

        Self {
            server: ServerConfig { host, port },
            cors_origins,
            auth,
            postgres,
        }
    }

    /// Validate the configuration for consistency and correctness
    pub fn validate(&self) -> Result<()> {
        if self.server.host.is_empty() {
            anyhow::bail!("Configuration error: server.host must not be empty");
        }
        if self.server.port == 0 {
            anyhow::bail!("Configuration error: server.port must be greater than 0");
        }

        if self.auth.jwt_secret.is_empty() {
            anyhow::bail!("Configuration error: JWT_SECRET (auth.jwt_secret) is required");
        }
        if self.auth.jwt_secret.len() < MIN_JWT_SECRET_LEN {
            anyhow::bail!(
                "Configuration error: auth.jwt_secret must be at least {} bytes",
                MIN_JWT_SECRET_LEN
            );
        }
        if self.auth.session_ttl_secs == 0 {
            anyhow::bail!("Configuration error: auth.session_ttl_secs must be greater than 0");
        }

        if self.postgres.url.trim().is_empty() {
            anyhow::bail!("Configuration error: DATABASE_URL (postgres.url) is required");
        }
        if self.postgres.max_connections == 0 {
            anyhow::bail!("Configuration error: postgres.max_connections must be greater than 0");
        }
        if self.postgres.min_connections > self.postgres.max_connections {
            anyhow::bail!(
                "Configuration error: postgres.min_connections ({}) exceeds max_connections ({})",
                self.postgres.min_connections,
                self.postgres.max_connections
            );
        }

        if is_all_interfaces(&self.server.host) && self.cors_origins.is_empty() {
            tracing::warn!(
                host = %self.server.host,
                "Listening on all interfaces without CORS origins; only localhost origins are allowed"
            );
        }

        Ok(())
    }
}

/// Get the profile config path (~/.leaddesk/leaddesk.json)
fn get_profile_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(APP_DOT_FOLDER).join(CONFIG_FILE_NAME))
}

/// Check if host binds to all network interfaces
pub(crate) fn is_all_interfaces(host: &str) -> bool {
    matches!(host, "0.0.0.0" | "::" | "[::]")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SECRET: &str = "0123456789abcdef0123";

    fn valid_cli() -> CliConfig {
        CliConfig {
            database_url: Some("postgres://localhost/leaddesk".to_string()),
            jwt_secret: Some(SECRET.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_file_config_parse_full() {
        let json = r#"{
            "server": { "host": "0.0.0.0", "port": 8080, "cors_origins": ["https://crm.example.com"] },
            "auth": { "jwt_secret": "s", "session_ttl_secs": 3600 },
            "postgres": { "url": "postgres://db/leads", "max_connections": 5 }
        }"#;
        let config: FileConfig = serde_json::from_str(json).unwrap();

        let server = config.server.as_ref().unwrap();
        assert_eq!(server.host.as_deref(), Some("0.0.0.0"));
        assert_eq!(server.port, Some(8080));
        assert_eq!(config.auth.as_ref().unwrap().session_ttl_secs, Some(3600));
        assert_eq!(config.postgres.as_ref().unwrap().max_connections, Some(5));
    }

    #[test]
    fn test_file_config_parse_extra_fields() {
        let json = r#"{ "server": { "host": "localhost" }, "unknown_field": 123 }"#;
        let config: FileConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.extra.get("unknown_field").unwrap(), 123);
    }

    #[test]
    fn test_file_config_merge() {
        let mut base: FileConfig = serde_json::from_str(
            r#"{ "server": { "host": "base.host", "port": 1000 }, "postgres": { "url": "postgres://a" } }"#,
        )
        .unwrap();
        let overlay: FileConfig =
            serde_json::from_str(r#"{ "server": { "port": 2000 }, "postgres": { "min_connections": 1 } }"#)
                .unwrap();
        base.merge(overlay);

        let server = base.server.unwrap();
        assert_eq!(server.host.as_deref(), Some("base.host"));
        assert_eq!(server.port, Some(2000));
        let pg = base.postgres.unwrap();
        assert_eq!(pg.url.as_deref(), Some("postgres://a"));
        assert_eq!(pg.min_connections, Some(1));
    }

    #[test]
    fn test_resolve_defaults() {
        let config = AppConfig::resolve(FileConfig::default(), &CliConfig::default());
        assert_eq!(config.server.host, DEFAULT_HOST);
        assert_eq!(config.server.port, DEFAULT_PORT);
        assert!(config.cors_origins.is_empty());
        assert_eq!(config.auth.session_ttl_secs, DEFAULT_SESSION_TTL_SECS);
        assert_eq!(
            config.postgres.max_connections,
            POSTGRES_DEFAULT_MAX_CONNECTIONS
        );
    }

    #[test]
    fn test_resolve_cli_overrides_file() {
        let file: FileConfig = serde_json::from_str(
            r#"{ "server": { "host": "file.host", "port": 1000, "cors_origins": ["https://file"] },
                 "auth": { "jwt_secret": "file-secret" },
                 "postgres": { "url": "postgres://file" } }"#,
        )
        .unwrap();
        let cli = CliConfig {
            port: Some(3000),
            cors_origins: Some(vec![" https://cli ".to_string(), "".to_string()]),
            database_url: Some("postgres://cli".to_string()),
            ..Default::default()
        };

        let config = AppConfig::resolve(file, &cli);
        assert_eq!(config.server.host, "file.host");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.cors_origins, vec!["https://cli".to_string()]);
        assert_eq!(config.auth.jwt_secret, "file-secret");
        assert_eq!(config.postgres.url, "postgres://cli");
    }

    #[test]
    fn test_validate_requires_secret_and_url() {
        let config = AppConfig::resolve(FileConfig::default(), &CliConfig::default());
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("JWT_SECRET"));

        let cli = CliConfig {
            jwt_secret: Some(SECRET.to_string()),
            ..Default::default()
        };
        let err = AppConfig::resolve(FileConfig::default(), &cli)
            .validate()
            .unwrap_err()
            .to_string();
        assert!(err.contains("DATABASE_URL"));

        assert!(
            AppConfig::resolve(FileConfig::default(), &valid_cli())
                .validate()
                .is_ok()
        );
    }

    #[test]
    fn test_validate_short_secret() {
        let cli = CliConfig {
            jwt_secret: Some("short".to_string()),
            ..valid_cli()
        };
        let config = AppConfig::resolve(FileConfig::default(), &cli);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_pool_bounds() {
        let file: FileConfig = serde_json::from_str(
            r#"{ "postgres": { "min_connections": 10, "max_connections": 5 } }"#,
        )
        .unwrap();
        let config = AppConfig::resolve(file, &valid_cli());
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("min_connections"));
    }

    #[test]
    fn test_validate_port_zero() {
        let cli = CliConfig {
            port: Some(0),
            ..valid_cli()
        };
        assert!(AppConfig::resolve(FileConfig::default(), &cli).validate().is_err());
    }

    #[test]
    fn test_load_from_explicit_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "server": {{ "port": 9100 }}, "auth": {{ "session_ttl_secs": 60 }} }}"#
        )
        .unwrap();

        let cli = CliConfig {
            config: Some(file.path().to_path_buf()),
            ..valid_cli()
        };
        let config = AppConfig::load(&cli).unwrap();
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.auth.session_ttl_secs, 60);
    }

    #[test]
    fn test_load_missing_explicit_path() {
        let cli = CliConfig {
            config: Some(PathBuf::from("/nonexistent/leaddesk.json")),
            ..valid_cli()
        };
        assert!(AppConfig::load(&cli).is_err());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let config = AppConfig::resolve(FileConfig::default(), &valid_cli());
        let rendered = format!("{:?}", config.auth);
        assert!(!rendered.contains(SECRET));
    }

    #[test]
    fn test_is_all_interfaces() {
        assert!(is_all_interfaces("0.0.0.0"));
        assert!(is_all_interfaces("::"));
        assert!(is_all_interfaces("[::]"));
        assert!(!is_all_interfaces("127.0.0.1"));
        assert!(!is_all_interfaces("localhost"));
    }
}
