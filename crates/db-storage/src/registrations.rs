// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

use crate::events::{Event, EventId};
use crate::schema::{events, registrations};
use chrono::NaiveDateTime;
use database::{DatabaseError, DbConnection, Result};
use diesel::backend::Backend;
use diesel::deserialize::{self, FromSql};
use diesel::dsl::exists;
use diesel::prelude::*;
use diesel::serialize::{self, IsNull, Output, ToSql};
use diesel::sql_types::Text;
use diesel::sqlite::Sqlite;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

diesel_newtype! {
    #[derive(Copy)] RegistrationId(i64) => diesel::sql_types::BigInt
}

/// Status of a registration
///
/// Every registration starts out as `Pending`, `Approved` and `Rejected` are terminal.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    diesel::AsExpression,
    diesel::FromSqlRow,
)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationStatus {
    Pending,
    Approved,
    Rejected,
}

impl RegistrationStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => f.write_str("Pending"),
            Self::Approved => f.write_str("Approved"),
            Self::Rejected => f.write_str("Rejected"),
        }
    }
}

impl FromStr for RegistrationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            _ => Err(format!("unknown registration status {s:?}")),
        }
    }
}

impl ToSql<Text, Sqlite> for RegistrationStatus {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Sqlite>) -> serialize::Result {
        out.set_value(self.as_str());
        Ok(IsNull::No)
    }
}

impl FromSql<Text, Sqlite> for RegistrationStatus {
    fn from_sql(bytes: <Sqlite as Backend>::RawValue<'_>) -> deserialize::Result<Self> {
        let s = <String as FromSql<Text, Sqlite>>::from_sql(bytes)?;

        Ok(s.parse()?)
    }
}

#[derive(Debug, Clone, Queryable, Identifiable, PartialEq, Eq)]
#[diesel(table_name = registrations)]
pub struct Registration {
    pub id: RegistrationId,
    pub event_id: EventId,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub status: RegistrationStatus,
    pub created_at: NaiveDateTime,
}

impl Registration {
    #[tracing::instrument(err, skip_all)]
    pub fn get(conn: &mut DbConnection, registration_id: RegistrationId) -> Result<Registration> {
        let query = registrations::table.filter(registrations::id.eq(registration_id));

        let registration = query.first(conn)?;

        Ok(registration)
    }

    /// Returns all registrations of the given event, the newest first
    #[tracing::instrument(err, skip_all)]
    pub fn get_all_for_event(
        conn: &mut DbConnection,
        event_id: EventId,
    ) -> Result<Vec<Registration>> {
        let query = registrations::table
            .filter(registrations::event_id.eq(event_id))
            .order_by((registrations::created_at.desc(), registrations::id.desc()));

        let registrations = query.load(conn)?;

        Ok(registrations)
    }

    /// Returns all registrations made with the given email across all events, the newest first
    #[tracing::instrument(err, skip_all)]
    pub fn get_all_by_email_with_event(
        conn: &mut DbConnection,
        email: &str,
    ) -> Result<Vec<(Registration, Event)>> {
        let query = registrations::table
            .inner_join(events::table)
            .filter(registrations::email.eq(email))
            .order_by((registrations::created_at.desc(), registrations::id.desc()))
            .select((registrations::all_columns, events::all_columns));

        let registrations = query.load(conn)?;

        Ok(registrations)
    }

    #[tracing::instrument(err, skip_all)]
    pub fn exists_for_event(conn: &mut DbConnection, event_id: EventId, email: &str) -> Result<bool> {
        let query = diesel::select(exists(
            registrations::table
                .filter(registrations::event_id.eq(event_id))
                .filter(registrations::email.eq(email)),
        ));

        let exists = query.get_result(conn)?;

        Ok(exists)
    }

    /// Counts the registrations of an event that have the given status
    #[tracing::instrument(err, skip_all)]
    pub fn count_for_event_with_status(
        conn: &mut DbConnection,
        event_id: EventId,
        status: RegistrationStatus,
    ) -> Result<i64> {
        let query = registrations::table
            .filter(registrations::event_id.eq(event_id))
            .filter(registrations::status.eq(status))
            .count();

        let count = query.get_result(conn)?;

        Ok(count)
    }

    /// Counts the registrations of all events that have the given status
    #[tracing::instrument(err, skip_all)]
    pub fn count_with_status(conn: &mut DbConnection, status: RegistrationStatus) -> Result<i64> {
        let query = registrations::table
            .filter(registrations::status.eq(status))
            .count();

        let count = query.get_result(conn)?;

        Ok(count)
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = registrations)]
pub struct NewRegistration {
    pub event_id: EventId,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub status: RegistrationStatus,
    pub created_at: NaiveDateTime,
}

impl NewRegistration {
    /// Tries to insert the Registration into the database
    ///
    /// When yielding a unique key violation, None is returned.
    #[tracing::instrument(err, skip_all)]
    pub fn try_insert(self, conn: &mut DbConnection) -> Result<Option<Registration>> {
        let query = diesel::insert_into(registrations::table)
            .values(self)
            .returning(registrations::all_columns);

        let result: Result<Registration> = query.get_result(conn).map_err(DatabaseError::from);

        match result {
            Ok(registration) => Ok(Some(registration)),
            Err(e) if e.is_unique_violation() => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[derive(Debug, AsChangeset)]
#[diesel(table_name = registrations)]
pub struct UpdateRegistration {
    pub status: RegistrationStatus,
}

impl UpdateRegistration {
    #[tracing::instrument(err, skip_all)]
    pub fn apply(
        self,
        conn: &mut DbConnection,
        registration_id: RegistrationId,
    ) -> Result<Registration> {
        let query = diesel::update(registrations::table)
            .filter(registrations::id.eq(registration_id))
            .set(self)
            .returning(registrations::all_columns);

        let registration = query.get_result(conn)?;

        Ok(registration)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn status_text_round_trip() {
        for status in [
            RegistrationStatus::Pending,
            RegistrationStatus::Approved,
            RegistrationStatus::Rejected,
        ] {
            assert_eq!(status.as_str().parse::<RegistrationStatus>(), Ok(status));
        }

        assert!("accepted".parse::<RegistrationStatus>().is_err());
    }

    #[test]
    fn only_pending_is_open() {
        assert!(!RegistrationStatus::Pending.is_terminal());
        assert!(RegistrationStatus::Approved.is_terminal());
        assert!(RegistrationStatus::Rejected.is_terminal());
    }
}
