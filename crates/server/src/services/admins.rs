// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

//! Admin credentials
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use database::{DatabaseError, DbConnection};
use db_storage::admins::{Admin, NewAdmin};
use rand::rngs::OsRng;

#[derive(Debug, thiserror::Error)]
pub enum AuthenticationError {
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Password hashing failed, {0}")]
    Hashing(String),
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<argon2::password_hash::Error> for AuthenticationError {
    fn from(e: argon2::password_hash::Error) -> Self {
        Self::Hashing(e.to_string())
    }
}

/// Hashes and verifies admin passwords with Argon2id
pub struct Authenticator {
    argon2: Argon2<'static>,
    /// Verified against when the username is unknown, so both paths take the same time
    dummy_hash: String,
}

impl Authenticator {
    pub fn new() -> Result<Self, AuthenticationError> {
        let argon2 = Argon2::default();

        let salt = SaltString::generate(&mut OsRng);
        let dummy_hash = argon2
            .hash_password(b"evreg-dummy-password", &salt)?
            .to_string();

        Ok(Self { argon2, dummy_hash })
    }

    /// Returns the PHC string of the salted password hash
    pub fn hash_password(&self, password: &str) -> Result<String, AuthenticationError> {
        let salt = SaltString::generate(&mut OsRng);

        let hash = self.argon2.hash_password(password.as_bytes(), &salt)?;

        Ok(hash.to_string())
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthenticationError> {
        let parsed_hash = PasswordHash::new(hash)?;

        match self.argon2.verify_password(password.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Checks the credentials and returns the matching admin
    ///
    /// Unknown usernames and wrong passwords both yield
    /// [`AuthenticationError::InvalidCredentials`].
    #[tracing::instrument(err, skip(self, conn, password))]
    pub fn authenticate(
        &self,
        conn: &mut DbConnection,
        username: &str,
        password: &str,
    ) -> Result<Admin, AuthenticationError> {
        match Admin::get_by_username(conn, username)? {
            Some(admin) => {
                if self.verify(password, &admin.password_hash)? {
                    Ok(admin)
                } else {
                    log::warn!("Failed login attempt for admin {}", username);
                    Err(AuthenticationError::InvalidCredentials)
                }
            }
            None => {
                // Result is irrelevant, only the time spent matters
                let _ = self.verify(password, &self.dummy_hash);

                log::warn!("Failed login attempt for unknown admin");
                Err(AuthenticationError::InvalidCredentials)
            }
        }
    }

    /// Creates an admin or replaces the password of an existing one
    #[tracing::instrument(err, skip(self, conn, password))]
    pub fn set_credentials(
        &self,
        conn: &mut DbConnection,
        username: &str,
        password: &str,
    ) -> Result<Admin, AuthenticationError> {
        let admin = NewAdmin {
            username: username.to_owned(),
            password_hash: self.hash_password(password)?,
        }
        .upsert(conn)?;

        Ok(admin)
    }

    /// Creates an admin unless the username is already taken, returns true if one was created
    #[tracing::instrument(err, skip(self, conn, password))]
    pub fn create_if_missing(
        &self,
        conn: &mut DbConnection,
        username: &str,
        password: &str,
    ) -> Result<bool, AuthenticationError> {
        if Admin::get_by_username(conn, username)?.is_some() {
            return Ok(false);
        }

        let created = NewAdmin {
            username: username.to_owned(),
            password_hash: self.hash_password(password)?,
        }
        .insert_if_missing(conn)?;

        Ok(created)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_util::database::DatabaseContext;

    #[test]
    fn hashes_are_salted() {
        let authenticator = Authenticator::new().unwrap();

        let a = authenticator.hash_password("admin123").unwrap();
        let b = authenticator.hash_password("admin123").unwrap();

        assert_ne!(a, b);
        assert!(a.starts_with("$argon2id$"));
        assert!(authenticator.verify("admin123", &a).unwrap());
        assert!(!authenticator.verify("admin124", &a).unwrap());
    }

    #[test]
    fn authenticate_checks_the_password() {
        let db_ctx = DatabaseContext::new();
        let mut conn = db_ctx.db.get_conn().unwrap();
        let authenticator = Authenticator::new().unwrap();

        let created = authenticator
            .create_if_missing(&mut conn, "admin", "admin123")
            .unwrap();
        assert!(created);

        let admin = authenticator
            .authenticate(&mut conn, "admin", "admin123")
            .unwrap();
        assert_eq!(admin.username, "admin");

        let wrong_password = authenticator.authenticate(&mut conn, "admin", "wrong");
        assert!(matches!(
            wrong_password,
            Err(AuthenticationError::InvalidCredentials)
        ));

        let unknown_user = authenticator.authenticate(&mut conn, "root", "admin123");
        assert!(matches!(
            unknown_user,
            Err(AuthenticationError::InvalidCredentials)
        ));
    }

    #[test]
    fn set_credentials_resets_the_password() {
        let db_ctx = DatabaseContext::new();
        let mut conn = db_ctx.db.get_conn().unwrap();
        let authenticator = Authenticator::new().unwrap();

        authenticator
            .create_if_missing(&mut conn, "admin", "admin123")
            .unwrap();
        assert!(!authenticator
            .create_if_missing(&mut conn, "admin", "other")
            .unwrap());

        authenticator
            .set_credentials(&mut conn, "admin", "s3cret")
            .unwrap();

        assert!(authenticator
            .authenticate(&mut conn, "admin", "admin123")
            .is_err());
        assert!(authenticator
            .authenticate(&mut conn, "admin", "s3cret")
            .is_ok());
    }
}
