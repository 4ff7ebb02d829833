//! Repositories over [`SqlStore`](crate::data::traits::SqlStore)

pub mod lead;
pub mod user;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::data::error::DataError;

/// Decode a JSON row into a typed record
pub(crate) fn decode_row<T: DeserializeOwned>(row: Value) -> Result<T, DataError> {
    serde_json::from_value(row).map_err(|e| DataError::Decode(e.to_string()))
}
