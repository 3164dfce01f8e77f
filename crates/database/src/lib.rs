// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

//! evreg database connector, interface and connection handling
use diesel::r2d2::ConnectionManager;
use diesel::result::{DatabaseErrorKind, Error};
use diesel::{r2d2, SqliteConnection};

mod db;

pub use db::Db;

/// Connection type all storage functions operate on
pub type DbConnection = SqliteConnection;

/// Pooled connection alias, derefs into [`DbConnection`]
pub type PooledDbConnection = r2d2::PooledConnection<ConnectionManager<SqliteConnection>>;

/// Result type using [`DatabaseError`] as a default Error
pub type Result<T, E = DatabaseError> = std::result::Result<T, E>;

/// Error types for the database abstraction
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Diesel Error: `{0}`")]
    DieselError(diesel::result::Error),
    #[error("A requested resource could not be found")]
    NotFound,
    // The R2D2 error mapping is only possible when using r2d2 directly as a dependency, hence the
    // generic R2D2 error handling. See https://github.com/diesel-rs/diesel/issues/2336
    #[error("The connection pool returned an Error: `{0}`")]
    R2D2Error(String),
}

impl DatabaseError {
    /// Returns true if the error was caused by a violated UNIQUE constraint
    pub fn is_unique_violation(&self) -> bool {
        matches!(
            self,
            Self::DieselError(Error::DatabaseError(DatabaseErrorKind::UniqueViolation, _))
        )
    }
}

pub trait OptionalExt<T, E> {
    fn optional(self) -> Result<Option<T>, E>;
}

impl<T> OptionalExt<T, DatabaseError> for Result<T, DatabaseError> {
    fn optional(self) -> Result<Option<T>, DatabaseError> {
        match self {
            Ok(t) => Ok(Some(t)),
            Err(DatabaseError::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

impl From<diesel::result::Error> for DatabaseError {
    fn from(err: diesel::result::Error) -> Self {
        match err {
            Error::NotFound => Self::NotFound,
            err => DatabaseError::DieselError(err),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn not_found_maps_to_none() {
        let result: Result<()> = Err(diesel::result::Error::NotFound.into());

        assert!(matches!(result.optional(), Ok(None)));
    }

    #[test]
    fn other_errors_are_kept() {
        let result: Result<()> = Err(DatabaseError::R2D2Error("timed out".into()));

        assert!(matches!(result.optional(), Err(DatabaseError::R2D2Error(_))));
    }
}
