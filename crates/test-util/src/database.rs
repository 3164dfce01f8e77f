// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime, Utc};
use database::Db;
use db_storage::events::{Event, EventId, NewEvent};
use db_storage::migrations::migrate;
use db_storage::registrations::{NewRegistration, Registration, RegistrationStatus};
use std::sync::Arc;
use tempfile::TempDir;

/// Contains the [`Db`] as well as the directory holding the test database
pub struct DatabaseContext {
    pub db: Arc<Db>,
    /// The database file is removed together with this directory when the context is dropped
    pub dir: TempDir,
}

impl DatabaseContext {
    /// Create a new [`DatabaseContext`]
    ///
    /// Creates a fresh SQLite database inside a temporary directory and applies the evreg
    /// migrations to it.
    pub fn new() -> Self {
        Self::try_new().expect("Unable to create test database")
    }

    fn try_new() -> Result<Self> {
        let dir = tempfile::tempdir().context("Unable to create temporary directory")?;
        let url = dir.path().join("evreg_test.db");

        let db = Db::connect_url(&url.to_string_lossy(), 8, 5000)?;

        let mut conn = db.get_conn()?;
        migrate(&mut conn).context("Unable to migrate database")?;
        drop(conn);

        Ok(Self {
            db: Arc::new(db),
            dir,
        })
    }

    pub fn create_test_event(&self, title: &str, capacity: Option<i32>) -> Result<Event> {
        let new_event = NewEvent {
            title: title.into(),
            description: Some(format!("Description of {title}")),
            date: test_date(12, 1),
            capacity,
        };

        let mut conn = self.db.get_conn()?;

        let event = new_event.insert(&mut conn)?;

        Ok(event)
    }

    pub fn create_test_registration(
        &self,
        event_id: EventId,
        name: &str,
        email: &str,
    ) -> Result<Registration> {
        let new_registration = NewRegistration {
            event_id,
            name: name.into(),
            email: email.into(),
            phone: None,
            status: RegistrationStatus::Pending,
            created_at: Utc::now().naive_utc(),
        };

        let mut conn = self.db.get_conn()?;

        new_registration
            .try_insert(&mut conn)?
            .with_context(|| format!("{email} is already registered for event {event_id}"))
    }
}

impl Default for DatabaseContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Returns 10:00 of the given day in 2025
pub fn test_date(month: u32, day: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, month, day)
        .and_then(|date| date.and_hms_opt(10, 0, 0))
        .expect("Invalid test date")
}
