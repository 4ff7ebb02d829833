//! User repository

use serde::{Deserialize, Serialize};

use super::decode_row;
use crate::data::error::DataError;
use crate::data::statement::Statement;
use crate::data::traits::SqlStore;

/// Stored user including the password hash; never serialized to clients
#[derive(Debug, Clone, Deserialize)]
pub struct UserRow {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
}

/// Client-facing user identity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: i64,
    pub email: String,
}

impl From<UserRow> for PublicUser {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            email: row.email,
        }
    }
}

/// Insert a user; a duplicate email surfaces as a unique violation
pub async fn create_user(
    store: &dyn SqlStore,
    email: &str,
    password_hash: &str,
) -> Result<PublicUser, DataError> {
    let stmt = Statement::new(
        "INSERT INTO users (email, password_hash) VALUES ($1, $2) RETURNING id, email",
        vec![email.into(), password_hash.into()],
    );
    let row = store
        .fetch_optional(&stmt)
        .await?
        .ok_or_else(|| DataError::Decode("INSERT returned no row".into()))?;
    decode_row(row)
}

pub async fn get_by_email(store: &dyn SqlStore, email: &str) -> Result<Option<UserRow>, DataError> {
    let stmt = Statement::new(
        "SELECT id, email, password_hash FROM users WHERE email = $1",
        vec![email.into()],
    );
    store.fetch_optional(&stmt).await?.map(decode_row).transpose()
}
