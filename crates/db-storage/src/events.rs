// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

use crate::registrations::RegistrationStatus;
use crate::schema::{events, registrations};
use chrono::NaiveDateTime;
use database::{DbConnection, Result};
use diesel::dsl::count_star;
use diesel::prelude::*;
use std::collections::HashMap;

diesel_newtype! {
    #[derive(Copy)] EventId(i64) => diesel::sql_types::BigInt
}

#[derive(Debug, Clone, Queryable, Identifiable, PartialEq, Eq)]
#[diesel(table_name = events)]
pub struct Event {
    pub id: EventId,
    pub title: String,
    pub description: Option<String>,

    /// Date and time the event takes place, in UTC
    pub date: NaiveDateTime,

    /// Maximum number of approved registrations, `None` means unlimited
    pub capacity: Option<i32>,
}

impl Event {
    #[tracing::instrument(err, skip_all)]
    pub fn get(conn: &mut DbConnection, event_id: EventId) -> Result<Event> {
        let query = events::table.filter(events::id.eq(event_id));

        let event = query.first(conn)?;

        Ok(event)
    }

    /// Returns all events, the earliest first
    #[tracing::instrument(err, skip_all)]
    pub fn get_all_ordered_by_date(conn: &mut DbConnection) -> Result<Vec<Event>> {
        let query = events::table.order_by((events::date.asc(), events::id.asc()));

        let events = query.load(conn)?;

        Ok(events)
    }

    /// Returns all events ordered by date, each with the number of its pending registrations
    #[tracing::instrument(err, skip_all)]
    pub fn get_all_with_pending_count(conn: &mut DbConnection) -> Result<Vec<(Event, i64)>> {
        let events = Self::get_all_ordered_by_date(conn)?;

        let pending: HashMap<EventId, i64> = registrations::table
            .filter(registrations::status.eq(RegistrationStatus::Pending))
            .group_by(registrations::event_id)
            .select((registrations::event_id, count_star()))
            .load::<(EventId, i64)>(conn)?
            .into_iter()
            .collect();

        Ok(events
            .into_iter()
            .map(|event| {
                let count = pending.get(&event.id).copied().unwrap_or_default();
                (event, count)
            })
            .collect())
    }

    #[tracing::instrument(err, skip_all)]
    pub fn count(conn: &mut DbConnection) -> Result<i64> {
        let count = events::table.count().get_result(conn)?;

        Ok(count)
    }

    /// Returns true if no further registration can be approved
    pub fn is_full(&self, approved: i64) -> bool {
        self.capacity
            .map(|capacity| approved >= i64::from(capacity))
            .unwrap_or(false)
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = events)]
pub struct NewEvent {
    pub title: String,
    pub description: Option<String>,
    pub date: NaiveDateTime,
    pub capacity: Option<i32>,
}

impl NewEvent {
    #[tracing::instrument(err, skip_all)]
    pub fn insert(self, conn: &mut DbConnection) -> Result<Event> {
        let query = diesel::insert_into(events::table)
            .values(self)
            .returning(events::all_columns);

        let event = query.get_result(conn)?;

        Ok(event)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::NaiveDate;

    fn event(capacity: Option<i32>) -> Event {
        Event {
            id: EventId::from(1),
            title: "Test".into(),
            description: None,
            date: NaiveDate::from_ymd_opt(2025, 12, 1)
                .and_then(|d| d.and_hms_opt(10, 0, 0))
                .unwrap(),
            capacity,
        }
    }

    #[test]
    fn unlimited_capacity_is_never_full() {
        assert!(!event(None).is_full(10_000));
    }

    #[test]
    fn capacity_limits_approvals() {
        assert!(!event(Some(2)).is_full(1));
        assert!(event(Some(2)).is_full(2));
        assert!(event(Some(0)).is_full(0));
    }
}
