//! Database repository shared by every resource.
//!
//! Each resource lives in its own `impl Repository` block (`courses.rs`,
//! `instructors.rs`, `users.rs`, `tokens.rs`). All statements are
//! parameterized and every call runs under [`QUERY_TIMEOUT`].

use std::future::Future;
use std::time::Duration;

use sqlx::SqlitePool;

use crate::errors::AppError;

/// Deadline applied to every store operation.
pub const QUERY_TIMEOUT: Duration = Duration::from_secs(3);

/// Database repository for all data operations.
#[derive(Clone)]
pub struct Repository {
    pub(super) pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Cheap round trip used by the health check.
    pub async fn ping(&self) -> Result<(), AppError> {
        bounded(sqlx::query("SELECT 1").execute(&self.pool)).await?;
        Ok(())
    }
}

/// Run a store operation under [`QUERY_TIMEOUT`]. A timeout surfaces as a
/// database error like any other store failure.
///
/// The operation may fail with anything convertible into [`AppError`], so
/// callers can classify driver errors (unique violations and the like) inside
/// the bounded future.
pub(super) async fn bounded<T, E, F>(operation: F) -> Result<T, AppError>
where
    F: Future<Output = Result<T, E>>,
    AppError: From<E>,
{
    Ok(tokio::time::timeout(QUERY_TIMEOUT, operation).await??)
}

/// Lower-cased words of a free-text search term. Empty input yields no words,
/// meaning "no constraint".
///
/// Words are matched against SQLite's `lower()`, which folds ASCII letters
/// only. Folding here is ASCII-only as well so both sides agree: `rust` finds
/// `Rust`, but `über` does not find `Über`. Non-ASCII text matches by exact
/// case.
pub(super) fn search_words(term: &str) -> Vec<String> {
    term.split_whitespace()
        .map(|word| word.to_ascii_lowercase())
        .collect()
}

pub(super) fn encode_string_list(values: &[String]) -> String {
    serde_json::to_string(values).unwrap_or_else(|_| "[]".to_string())
}

/// Decode a JSON string-array column. A malformed value is a decode error
/// rather than an empty list.
pub(super) fn parse_string_list(s: &str) -> Result<Vec<String>, sqlx::Error> {
    serde_json::from_str(s).map_err(|e| sqlx::Error::Decode(Box::new(e)))
}

#[cfg(test)]
pub(crate) mod test_support {
    use tempfile::TempDir;

    use super::Repository;
    use crate::db::init_database;

    /// Repository over a throwaway database; keep the `TempDir` alive.
    pub async fn repository() -> (Repository, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let pool = init_database(&temp_dir.path().join("test.sqlite"), 5)
            .await
            .expect("Failed to init DB");
        (Repository::new(pool), temp_dir)
    }
}
