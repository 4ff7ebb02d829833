//! PostgreSQL migration management
//!
//! Handles schema initialization and versioned migrations.

use sqlx::PgPool;

use super::schema::{SCHEMA, SCHEMA_VERSION};
use crate::data::error::DataError;

/// Run all pending migrations
pub async fn run_migrations(pool: &PgPool) -> Result<(), DataError> {
    let table_exists: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS (
            SELECT FROM information_schema.tables
            WHERE table_schema = current_schema()
            AND table_name = 'schema_version'
        )
        "#,
    )
    .fetch_one(pool)
    .await?;

    let current_version: Option<i32> = if table_exists {
        sqlx::query_scalar("SELECT version FROM schema_version WHERE id = 1")
            .fetch_optional(pool)
            .await?
    } else {
        None
    };

    match current_version {
        None => {
            tracing::debug!("Applying initial PostgreSQL schema v{}", SCHEMA_VERSION);
            apply_initial_schema(pool).await?;
        }
        Some(v) if v < SCHEMA_VERSION => {
            tracing::debug!(
                "Migrating PostgreSQL schema from v{} to v{}",
                v,
                SCHEMA_VERSION
            );
            for version in (v + 1)..=SCHEMA_VERSION {
                apply_versioned_migration(pool, version).await?;
            }
        }
        Some(v) if v > SCHEMA_VERSION => {
            tracing::warn!(
                "PostgreSQL schema version {} is newer than application version {}",
                v,
                SCHEMA_VERSION
            );
        }
        _ => {
            tracing::debug!("PostgreSQL schema is up to date (v{})", SCHEMA_VERSION);
        }
    }

    Ok(())
}

async fn apply_initial_schema(pool: &PgPool) -> Result<(), DataError> {
    let now = chrono::Utc::now().timestamp();

    // Multi-statement script; raw_sql runs it over the simple query protocol
    sqlx::raw_sql(SCHEMA)
        .execute(pool)
        .await
        .map_err(|e| DataError::migration_failed(SCHEMA_VERSION, "initial", &e.to_string()))?;

    sqlx::query(
        "INSERT INTO schema_version (id, version, applied_at, description)
         VALUES (1, $1, $2, 'Initial schema')
         ON CONFLICT (id) DO UPDATE SET version = $1, applied_at = $2",
    )
    .bind(SCHEMA_VERSION)
    .bind(now)
    .execute(pool)
    .await?;

    tracing::debug!("PostgreSQL schema v{} applied successfully", SCHEMA_VERSION);
    Ok(())
}

/// SQL for each schema version after the initial one
#[allow(clippy::match_single_binding)]
fn migration(version: i32) -> Option<(&'static str, &'static str)> {
    match version {
        // 2 => Some(("add_lead_owner", "ALTER TABLE leads ADD COLUMN ...")),
        _ => None,
    }
}

async fn apply_versioned_migration(pool: &PgPool, version: i32) -> Result<(), DataError> {
    let (name, sql) = migration(version).ok_or_else(|| {
        DataError::migration_failed(
            version,
            "unknown",
            &format!("No migration defined for version {}", version),
        )
    })?;

    let start = std::time::Instant::now();
    let now = chrono::Utc::now().timestamp();

    sqlx::raw_sql(sql)
        .execute(pool)
        .await
        .map_err(|e| DataError::migration_failed(version, name, &e.to_string()))?;

    let elapsed = start.elapsed().as_millis() as i64;

    sqlx::query(
        "INSERT INTO schema_migrations (version, name, applied_at, checksum, execution_time_ms, success)
         VALUES ($1, $2, $3, $4, $5, TRUE)",
    )
    .bind(version)
    .bind(name)
    .bind(now)
    .bind(compute_checksum(sql))
    .bind(elapsed)
    .execute(pool)
    .await?;

    sqlx::query("UPDATE schema_version SET version = $1, applied_at = $2 WHERE id = 1")
        .bind(version)
        .bind(now)
        .execute(pool)
        .await?;

    tracing::debug!(
        "PostgreSQL migration v{} ({}) applied in {}ms",
        version,
        name,
        elapsed
    );
    Ok(())
}

fn compute_checksum(sql: &str) -> String {
    use std::hash::{Hash, Hasher};
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    sql.hash(&mut hasher);
    format!("{:x}", hasher.finish())
}
