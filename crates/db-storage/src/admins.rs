// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

use crate::schema::admins;
use database::{DbConnection, Result};
use diesel::prelude::*;
use diesel::upsert::excluded;

diesel_newtype! {
    #[derive(Copy)] AdminId(i64) => diesel::sql_types::BigInt
}

#[derive(Clone, Queryable, Identifiable)]
#[diesel(table_name = admins)]
pub struct Admin {
    pub id: AdminId,
    pub username: String,
    /// Argon2 PHC string
    pub password_hash: String,
}

impl std::fmt::Debug for Admin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Admin")
            .field("id", &self.id)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl Admin {
    #[tracing::instrument(err, skip_all, fields(username = %username))]
    pub fn get_by_username(conn: &mut DbConnection, username: &str) -> Result<Option<Admin>> {
        let admin = admins::table
            .filter(admins::username.eq(username))
            .first(conn)
            .optional()?;

        Ok(admin)
    }
}

#[derive(Insertable)]
#[diesel(table_name = admins)]
pub struct NewAdmin {
    pub username: String,
    pub password_hash: String,
}

impl NewAdmin {
    /// Inserts the admin unless one with the same username exists
    ///
    /// Returns true if a new admin was created.
    #[tracing::instrument(err, skip_all)]
    pub fn insert_if_missing(self, conn: &mut DbConnection) -> Result<bool> {
        let inserted = diesel::insert_into(admins::table)
            .values(self)
            .on_conflict(admins::username)
            .do_nothing()
            .execute(conn)?;

        Ok(inserted > 0)
    }

    /// Inserts the admin or replaces the password of an existing admin with the same username
    #[tracing::instrument(err, skip_all)]
    pub fn upsert(self, conn: &mut DbConnection) -> Result<Admin> {
        let admin = diesel::insert_into(admins::table)
            .values(self)
            .on_conflict(admins::username)
            .do_update()
            .set(admins::password_hash.eq(excluded(admins::password_hash)))
            .returning(admins::all_columns)
            .get_result(conn)?;

        Ok(admin)
    }
}
