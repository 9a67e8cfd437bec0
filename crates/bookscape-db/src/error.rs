use rusqlite::ErrorCode;
use rusqlite::ffi;
use thiserror::Error;

/// Substrings that mark a driver error as a connectivity problem rather than
/// a query problem.
const CONNECTIVITY_MARKERS: &[&str] = &["connect", "timeout", "timed out", "refused"];

#[derive(Debug, Error)]
pub enum DbError {
    /// The store could not be opened. Requests keep retrying the open.
    #[error("database unavailable: {0}")]
    Unavailable(String),

    /// A unique key collided on insert.
    #[error("duplicate {0}")]
    Duplicate(&'static str),

    /// A stored row failed to decode.
    #[error("corrupt row: {0}")]
    Corrupt(String),

    #[error("database lock poisoned")]
    Poisoned,

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, DbError>;

impl DbError {
    /// True when the failure means the store itself is unreachable, as opposed
    /// to a bad query or bad data.
    pub fn is_connectivity(&self) -> bool {
        match self {
            DbError::Unavailable(_) => true,
            DbError::Sqlite(err) => {
                if matches!(
                    err.sqlite_error_code(),
                    Some(
                        ErrorCode::CannotOpen
                            | ErrorCode::DatabaseBusy
                            | ErrorCode::DatabaseLocked
                            | ErrorCode::SystemIoFailure
                    )
                ) {
                    return true;
                }
                let msg = err.to_string().to_lowercase();
                CONNECTIVITY_MARKERS.iter().any(|m| msg.contains(m))
            }
            _ => false,
        }
    }
}

/// Maps a unique/primary-key violation to `Duplicate(what)`, passing every
/// other error through.
pub(crate) fn unique_violation(err: rusqlite::Error, what: &'static str) -> DbError {
    match &err {
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
                || e.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY =>
        {
            DbError::Duplicate(what)
        }
        _ => DbError::Sqlite(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sqlite_failure(code: i32, msg: &str) -> DbError {
        DbError::Sqlite(rusqlite::Error::SqliteFailure(
            ffi::Error::new(code),
            Some(msg.to_string()),
        ))
    }

    #[test]
    fn unavailable_and_io_codes_are_connectivity() {
        assert!(DbError::Unavailable("gone".into()).is_connectivity());
        assert!(
            sqlite_failure(ffi::SQLITE_CANTOPEN, "unable to open database file").is_connectivity()
        );
        assert!(sqlite_failure(ffi::SQLITE_BUSY, "database is locked").is_connectivity());
        assert!(sqlite_failure(ffi::SQLITE_IOERR, "disk I/O error").is_connectivity());
    }

    #[test]
    fn message_markers_are_connectivity() {
        assert!(sqlite_failure(ffi::SQLITE_ERROR, "connection refused by peer").is_connectivity());
        assert!(sqlite_failure(ffi::SQLITE_ERROR, "operation timed out").is_connectivity());
    }

    #[test]
    fn query_errors_are_not_connectivity() {
        assert!(!sqlite_failure(ffi::SQLITE_ERROR, "no such table: subscribers").is_connectivity());
        assert!(!DbError::Duplicate("email").is_connectivity());
        assert!(!DbError::Corrupt("bad date".into()).is_connectivity());
        assert!(!DbError::Sqlite(rusqlite::Error::InvalidQuery).is_connectivity());
    }
}
