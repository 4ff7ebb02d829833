// =============================================================================
// Application Identity
// =============================================================================

/// Application name in title case (for display)
pub const APP_NAME: &str = "LeadDesk";

/// Unix-style dotfile folder name
pub const APP_DOT_FOLDER: &str = ".leaddesk";

// =============================================================================
// Configuration Files
// =============================================================================

/// Config file name
pub const CONFIG_FILE_NAME: &str = "leaddesk.json";

/// Environment variable for config file path
pub const ENV_CONFIG: &str = "LEADDESK_CONFIG";

// =============================================================================
// Environment Variables
// =============================================================================

/// Environment variable for server host
pub const ENV_HOST: &str = "LEADDESK_HOST";

/// Environment variable for server port
pub const ENV_PORT: &str = "LEADDESK_PORT";

/// Environment variable for log level/filter
pub const ENV_LOG: &str = "LEADDESK_LOG";

/// Environment variable for the PostgreSQL connection URL
pub const ENV_DATABASE_URL: &str = "DATABASE_URL";

/// Environment variable for the session signing secret
pub const ENV_JWT_SECRET: &str = "JWT_SECRET";

/// Environment variable for allowed CORS origins (comma separated)
pub const ENV_CORS_ORIGIN: &str = "CORS_ORIGIN";

// =============================================================================
// Server Defaults
// =============================================================================

/// Default server host
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default server port
pub const DEFAULT_PORT: u16 = 4000;

/// Default log filter when neither LEADDESK_LOG nor RUST_LOG is set
pub const DEFAULT_LOG_FILTER: &str = "info,leaddesk=info,leaddesk_server=info";

// =============================================================================
// Authentication
// =============================================================================

/// Session cookie name
pub const SESSION_COOKIE_NAME: &str = "token";

/// Session lifetime in seconds (1 day)
pub const DEFAULT_SESSION_TTL_SECS: u64 = 24 * 60 * 60;

/// Shortest accepted signing secret, in bytes
pub const MIN_JWT_SECRET_LEN: usize = 16;

// =============================================================================
// Request Body Limits
// =============================================================================

/// Default body limit for general API requests (1 MB)
pub const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

/// Body limit for auth endpoints (64 KB)
pub const AUTH_BODY_LIMIT: usize = 64 * 1024;

// =============================================================================
// Shutdown
// =============================================================================

/// Graceful shutdown timeout in seconds
pub const SHUTDOWN_TIMEOUT_SECS: u64 = 30;

// =============================================================================
// PostgreSQL Database
// =============================================================================

/// PostgreSQL default max connections
pub const POSTGRES_DEFAULT_MAX_CONNECTIONS: u32 = 20;

/// PostgreSQL default min connections (keep warm for low latency)
pub const POSTGRES_DEFAULT_MIN_CONNECTIONS: u32 = 2;

/// PostgreSQL default connection acquire timeout in seconds
pub const POSTGRES_DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 30;

/// PostgreSQL idle connection timeout in seconds
pub const POSTGRES_DEFAULT_IDLE_TIMEOUT_SECS: u64 = 600;

/// PostgreSQL max connection lifetime in seconds
pub const POSTGRES_DEFAULT_MAX_LIFETIME_SECS: u64 = 1800;

/// PostgreSQL statement timeout in seconds
pub const POSTGRES_DEFAULT_STATEMENT_TIMEOUT_SECS: u64 = 60;

/// Interval between background pool pings
pub const POSTGRES_HEALTH_CHECK_INTERVAL_SECS: u64 = 30;
