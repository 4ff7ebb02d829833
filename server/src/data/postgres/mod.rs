//! PostgreSQL database service
//!
//! Owns the connection pool and runs parameterized [`Statement`]s against it:
//! - Connection pooling with min/max bounds
//! - Idle connection cleanup and lifetime cycling
//! - Statement timeout set per connection
//!
//! Schema bootstrap and versioned migrations run at init.

mod migrations;
pub mod schema;

pub use sqlx::PgPool;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::postgres::{PgArguments, PgConnectOptions, PgPoolOptions};
use sqlx::{Arguments, ConnectOptions};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::log::LevelFilter;

use crate::core::config::PostgresConfig;
use crate::core::constants::{
    POSTGRES_DEFAULT_ACQUIRE_TIMEOUT_SECS, POSTGRES_DEFAULT_IDLE_TIMEOUT_SECS,
    POSTGRES_DEFAULT_MAX_CONNECTIONS, POSTGRES_DEFAULT_MAX_LIFETIME_SECS,
    POSTGRES_DEFAULT_MIN_CONNECTIONS, POSTGRES_DEFAULT_STATEMENT_TIMEOUT_SECS,
    POSTGRES_HEALTH_CHECK_INTERVAL_SECS,
};
use crate::data::error::DataError;
use crate::data::statement::{ColumnType, SqlValue, Statement};
use crate::data::traits::SqlStore;

fn or_default<T: PartialEq + Default>(value: T, default: T) -> T {
    if value == T::default() { default } else { value }
}

/// PostgreSQL database service
///
/// Created once at startup and shared by every request handler.
pub struct PostgresService {
    pool: PgPool,
}

impl PostgresService {
    /// Connect, size the pool from configuration and bring the schema up to date
    pub async fn init(config: &PostgresConfig) -> Result<Self, DataError> {
        let url = config.url.trim();
        if url.is_empty() {
            return Err(DataError::Config("PostgreSQL URL is required".into()));
        }

        let max_connections = or_default(config.max_connections, POSTGRES_DEFAULT_MAX_CONNECTIONS);
        let min_connections = or_default(config.min_connections, POSTGRES_DEFAULT_MIN_CONNECTIONS)
            .min(max_connections);
        let acquire_timeout =
            or_default(config.acquire_timeout_secs, POSTGRES_DEFAULT_ACQUIRE_TIMEOUT_SECS);
        let idle_timeout = or_default(config.idle_timeout_secs, POSTGRES_DEFAULT_IDLE_TIMEOUT_SECS);
        let max_lifetime = or_default(config.max_lifetime_secs, POSTGRES_DEFAULT_MAX_LIFETIME_SECS);
        let statement_timeout = or_default(
            config.statement_timeout_secs,
            POSTGRES_DEFAULT_STATEMENT_TIMEOUT_SECS,
        );

        let options: PgConnectOptions = url
            .parse()
            .map_err(|e| DataError::Config(format!("Invalid PostgreSQL URL: {}", e)))?;

        // DATE_TRUNC('day', ...) on timestamptz follows the session zone
        let options = options
            .log_statements(LevelFilter::Trace)
            .options([
                ("statement_timeout", format!("{}s", statement_timeout)),
                ("TimeZone", "UTC".to_string()),
            ]);

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(acquire_timeout))
            .idle_timeout(Duration::from_secs(idle_timeout))
            .max_lifetime(Duration::from_secs(max_lifetime))
            .connect_with(options)
            .await?;

        migrations::run_migrations(&pool).await?;

        tracing::debug!(
            max_connections,
            min_connections,
            acquire_timeout_secs = acquire_timeout,
            idle_timeout_secs = idle_timeout,
            max_lifetime_secs = max_lifetime,
            statement_timeout_secs = statement_timeout,
            "PostgresService initialized"
        );
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Close the connection pool gracefully
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::debug!("PostgreSQL pool closed");
    }

    /// Periodically ping the database until shutdown
    pub fn start_health_check_task(
        self: &Arc<Self>,
        mut shutdown_rx: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        let db = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval =
                tokio::time::interval(Duration::from_secs(POSTGRES_HEALTH_CHECK_INTERVAL_SECS));
            loop {
                tokio::select! {
                    biased;
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            tracing::debug!("PostgreSQL health check task shutting down");
                            break;
                        }
                    }
                    _ = interval.tick() => {
                        if let Err(e) = sqlx::query("SELECT 1").execute(&db.pool).await {
                            tracing::warn!("PostgreSQL health check failed: {}", e);
                        }
                    }
                }
            }
        })
    }
}

/// Encode statement parameters in placeholder order
fn bind_params(params: &[SqlValue]) -> Result<PgArguments, DataError> {
    let mut args = PgArguments::default();
    for value in params {
        let added = match value {
            SqlValue::Text(s) => args.add(s.clone()),
            SqlValue::Integer(i) => args.add(*i),
            SqlValue::Float(f) => args.add(*f),
            SqlValue::Timestamp(ts) => args.add(*ts),
            SqlValue::Null(ColumnType::Text) => args.add(None::<String>),
            SqlValue::Null(ColumnType::Integer) => args.add(None::<i64>),
            SqlValue::Null(ColumnType::Float) => args.add(None::<f64>),
            SqlValue::Null(ColumnType::Timestamp) => args.add(None::<DateTime<Utc>>),
        };
        added.map_err(|e| DataError::Bind(e.to_string()))?;
    }
    Ok(args)
}

/// Wrap a row-returning statement so each row comes back as one JSONB value.
/// A CTE is used because data-modifying statements are not allowed in FROM.
fn as_json_rows(sql: &str) -> String {
    format!("WITH q AS ({sql}) SELECT to_jsonb(q) FROM q")
}

#[async_trait]
impl SqlStore for PostgresService {
    async fn fetch_rows(&self, stmt: &Statement) -> Result<Vec<Value>, DataError> {
        tracing::trace!(sql = %stmt.sql, params = stmt.params.len(), "fetch_rows");
        let sql = as_json_rows(&stmt.sql);
        let args = bind_params(&stmt.params)?;
        let rows = sqlx::query_scalar_with::<_, Value, _>(&sql, args)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn fetch_count(&self, stmt: &Statement) -> Result<u64, DataError> {
        tracing::trace!(sql = %stmt.sql, params = stmt.params.len(), "fetch_count");
        let args = bind_params(&stmt.params)?;
        let count = sqlx::query_scalar_with::<_, i64, _>(&stmt.sql, args)
            .fetch_one(&self.pool)
            .await?;
        u64::try_from(count).map_err(|_| DataError::Decode(format!("negative count {count}")))
    }

    async fn execute(&self, stmt: &Statement) -> Result<u64, DataError> {
        tracing::trace!(sql = %stmt.sql, params = stmt.params.len(), "execute");
        let args = bind_params(&stmt.params)?;
        let result = sqlx::query_with(&stmt.sql, args)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
