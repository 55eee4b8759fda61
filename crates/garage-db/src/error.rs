//! # Database Error Types
//!
//! Error types for database operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  PostgreSQL error (sqlx::Error)                                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbError (this module) ← classified by SQLSTATE / transport variant     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  CoreError ← same taxonomy the engine raises                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ApiError (checkout-api) ← status code + JSON envelope                  │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## SQLSTATE Classes
//! ```text
//! 23xxx  integrity constraint violation  → ConstraintViolation
//! 28xxx  invalid authorization           → AuthFailed
//! 08xxx  connection exception            → ConnectionFailed
//! 53300  too many connections            → ConnectionFailed
//! 57P0x  server shutting down            → ConnectionFailed
//! ```

use garage_core::CoreError;
use thiserror::Error;

/// Database operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A CHECK, UNIQUE, FOREIGN KEY or NOT NULL constraint rejected a write.
    ///
    /// ## When This Occurs
    /// - Stock would go negative
    /// - A second active batch for one inventory row
    /// - Duplicate reference number
    #[error("Constraint violation ({}): {message}", constraint.as_deref().unwrap_or("unnamed"))]
    ConstraintViolation {
        constraint: Option<String>,
        message: String,
    },

    /// The server rejected the credentials.
    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    /// The server could not be reached or dropped the connection.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// The health probe failed.
    #[error("Database unavailable: {0}")]
    Unavailable(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed for any other reason.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Whether the database itself could not be used (as opposed to a bad query).
    pub fn is_connectivity(&self) -> bool {
        matches!(
            self,
            DbError::AuthFailed(_) | DbError::ConnectionFailed(_) | DbError::Unavailable(_)
        )
    }

    fn from_sqlstate(code: &str, constraint: Option<&str>, message: &str) -> Self {
        if code.starts_with("23") {
            DbError::ConstraintViolation {
                constraint: constraint.map(String::from),
                message: message.to_string(),
            }
        } else if code.starts_with("28") {
            DbError::AuthFailed(message.to_string())
        } else if code.starts_with("08") || code == "53300" || code.starts_with("57P0") {
            DbError::ConnectionFailed(message.to_string())
        } else {
            DbError::QueryFailed(format!("{message} (SQLSTATE {code})"))
        }
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound      → DbError::NotFound
/// sqlx::Error::Database         → by SQLSTATE class
/// sqlx::Error::Io / Tls         → DbError::ConnectionFailed
/// sqlx::Error::PoolTimedOut     → DbError::ConnectionFailed
/// sqlx::Error::PoolClosed       → DbError::ConnectionFailed
/// Other                         → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Record", "unknown"),

            sqlx::Error::Database(db_err) => match db_err.code() {
                Some(code) => DbError::from_sqlstate(&code, db_err.constraint(), db_err.message()),
                None => DbError::QueryFailed(db_err.message().to_string()),
            },

            sqlx::Error::Io(e) => DbError::ConnectionFailed(e.to_string()),
            sqlx::Error::Tls(e) => DbError::ConnectionFailed(format!("TLS: {e}")),
            sqlx::Error::PoolTimedOut => {
                DbError::ConnectionFailed("timed out acquiring a connection".to_string())
            }
            sqlx::Error::PoolClosed => DbError::ConnectionFailed("pool is closed".to_string()),

            other => DbError::Internal(other.to_string()),
        }
    }
}

/// Connectivity failures keep their variant so callers can tell an
/// unreachable server from a broken migration.
impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        match err {
            sqlx::migrate::MigrateError::Execute(e) => match DbError::from(e) {
                db_err if db_err.is_connectivity() => db_err,
                other => DbError::MigrationFailed(other.to_string()),
            },
            other => DbError::MigrationFailed(other.to_string()),
        }
    }
}

impl From<DbError> for CoreError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => CoreError::NotFound { entity, id },
            e @ DbError::ConstraintViolation { .. } => CoreError::ConstraintViolation(e.to_string()),
            DbError::AuthFailed(msg) => CoreError::AuthFailed(msg),
            DbError::ConnectionFailed(msg) => CoreError::ConnectionFailed(msg),
            DbError::Unavailable(msg) => CoreError::DatabaseUnavailable(msg),
            e @ (DbError::MigrationFailed(_) | DbError::QueryFailed(_) | DbError::Internal(_)) => {
                CoreError::Internal(e.to_string())
            }
        }
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;
