//! Store error types.

use derive_more::{Display, Error};
use diesel::result::DatabaseErrorKind;
use tracing::instrument;

/// Category of a [`StoreError`].
///
/// The HTTP layer maps each kind onto a status code, so callers should match
/// on the kind rather than on the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum StoreErrorKind {
    /// A player with the requested username already exists.
    #[display("already exists")]
    AlreadyExists,
    /// The requested row does not exist.
    #[display("not found")]
    NotFound,
    /// A session or high score referenced a player that is not registered.
    #[display("unknown player")]
    UnknownPlayer,
    /// A score was negative or would push a running total past `i64::MAX`.
    #[display("invalid score")]
    InvalidScore,
    /// The underlying database failed.
    #[display("storage failure")]
    Storage,
}

/// Store error with location tracking.
#[derive(Debug, Clone, Display, Error)]
#[display("Store error ({}): {} at {}:{}", kind, message, file, line)]
pub struct StoreError {
    /// What went wrong.
    pub kind: StoreErrorKind,
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl StoreError {
    /// Creates a new store error with caller location tracking.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(kind: StoreErrorKind, message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            kind,
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }

    /// Username is already registered.
    #[track_caller]
    pub fn already_exists(username: &str) -> Self {
        Self::new(
            StoreErrorKind::AlreadyExists,
            format!("Player '{}' already exists", username),
        )
    }

    /// Lookup found nothing.
    #[track_caller]
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::NotFound, what)
    }

    /// Write referenced a player that does not exist.
    #[track_caller]
    pub fn unknown_player(username: &str) -> Self {
        Self::new(
            StoreErrorKind::UnknownPlayer,
            format!("Player '{}' is not registered", username),
        )
    }

    /// Score cannot be recorded.
    #[track_caller]
    pub fn invalid_score(message: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::InvalidScore, message)
    }

    /// Database failure.
    #[track_caller]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::Storage, message)
    }

    /// Returns the error category.
    pub fn kind(&self) -> StoreErrorKind {
        self.kind
    }
}

impl From<diesel::result::Error> for StoreError {
    #[track_caller]
    fn from(err: diesel::result::Error) -> Self {
        use diesel::result::Error;
        match &err {
            Error::NotFound => Self::not_found(format!("Diesel error: {}", err)),
            Error::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                Self::new(StoreErrorKind::AlreadyExists, format!("Diesel error: {}", err))
            }
            Error::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {
                Self::new(StoreErrorKind::UnknownPlayer, format!("Diesel error: {}", err))
            }
            _ => Self::storage(format!("Diesel error: {}", err)),
        }
    }
}

impl From<diesel::ConnectionError> for StoreError {
    #[track_caller]
    fn from(err: diesel::ConnectionError) -> Self {
        Self::storage(format!("Connection error: {}", err))
    }
}

impl From<serde_json::Error> for StoreError {
    #[track_caller]
    fn from(err: serde_json::Error) -> Self {
        Self::storage(format!("Achievement encoding error: {}", err))
    }
}
