//! Scripted in-memory store for tests
//!
//! Replies are queued up front and popped in order; every statement that
//! reaches the store is recorded so tests can assert on the SQL.

use std::collections::VecDeque;
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use sqlx::error::{DatabaseError, ErrorKind};

use crate::data::error::DataError;
use crate::data::statement::Statement;
use crate::data::traits::SqlStore;

#[derive(Debug)]
pub enum Reply {
    Rows(Vec<Value>),
    Count(u64),
    Affected(u64),
    Fail(ErrorKind),
}

#[derive(Default)]
pub struct ScriptedStore {
    replies: Mutex<VecDeque<Reply>>,
    seen: Mutex<Vec<Statement>>,
}

impl ScriptedStore {
    pub fn new(replies: Vec<Reply>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            seen: Mutex::new(Vec::new()),
        })
    }

    pub fn statements(&self) -> Vec<Statement> {
        self.seen.lock().clone()
    }

    fn next(&self, stmt: &Statement) -> Reply {
        self.seen.lock().push(stmt.clone());
        self.replies
            .lock()
            .pop_front()
            .unwrap_or_else(|| panic!("no scripted reply for: {}", stmt.sql))
    }
}

#[async_trait]
impl SqlStore for ScriptedStore {
    async fn fetch_rows(&self, stmt: &Statement) -> Result<Vec<Value>, DataError> {
        match self.next(stmt) {
            Reply::Rows(rows) => Ok(rows),
            Reply::Fail(kind) => Err(db_error(kind)),
            other => panic!("expected rows reply, got {other:?}"),
        }
    }

    async fn fetch_count(&self, stmt: &Statement) -> Result<u64, DataError> {
        match self.next(stmt) {
            Reply::Count(n) => Ok(n),
            Reply::Fail(kind) => Err(db_error(kind)),
            other => panic!("expected count reply, got {other:?}"),
        }
    }

    async fn execute(&self, stmt: &Statement) -> Result<u64, DataError> {
        match self.next(stmt) {
            Reply::Affected(n) => Ok(n),
            Reply::Fail(kind) => Err(db_error(kind)),
            other => panic!("expected affected reply, got {other:?}"),
        }
    }
}

/// A database error carrying the given constraint kind
pub fn db_error(kind: ErrorKind) -> DataError {
    DataError::Postgres(sqlx::Error::Database(Box::new(FakeDbError(kind))))
}

#[derive(Debug)]
struct FakeDbError(ErrorKind);

impl fmt::Display for FakeDbError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scripted database error: {:?}", self.0)
    }
}

impl StdError for FakeDbError {}

impl DatabaseError for FakeDbError {
    fn message(&self) -> &str {
        "scripted database error"
    }

    fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
        self
    }

    fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
        self
    }

    fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
        self
    }

    fn kind(&self) -> ErrorKind {
        match self.0 {
            ErrorKind::UniqueViolation => ErrorKind::UniqueViolation,
            ErrorKind::NotNullViolation => ErrorKind::NotNullViolation,
            ErrorKind::CheckViolation => ErrorKind::CheckViolation,
            ErrorKind::ForeignKeyViolation => ErrorKind::ForeignKeyViolation,
            _ => ErrorKind::Other,
        }
    }
}
