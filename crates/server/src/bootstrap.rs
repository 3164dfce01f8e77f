// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

//! Startup procedure preparing the database
//!
//! Runs the migrations, seeds the default admin and, when no event exists, the sample events.
//! Every step is idempotent, running it on an already prepared database changes nothing.
use crate::services::admins::Authenticator;
use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use database::DbConnection;
use db_storage::events::{Event, NewEvent};
use db_storage::migrations::migrate;
use shared::settings::Bootstrap;

#[tracing::instrument(err, skip_all)]
pub fn run(
    conn: &mut DbConnection,
    settings: &Bootstrap,
    authenticator: &Authenticator,
) -> Result<()> {
    migrate(conn).context("Failed to migrate database")?;

    if authenticator
        .create_if_missing(conn, &settings.admin_username, &settings.admin_password)
        .context("Failed to seed admin")?
    {
        log::info!("Created admin {}", settings.admin_username);
    }

    if settings.sample_events {
        seed_sample_events(conn)?;
    }

    Ok(())
}

fn seed_sample_events(conn: &mut DbConnection) -> Result<()> {
    conn.immediate_transaction(|conn| {
        if Event::count(conn)? > 0 {
            return Ok(());
        }

        for event in sample_events()? {
            let event = event.insert(conn)?;
            log::info!("Created sample event {} ({})", event.title, event.id);
        }

        Ok(())
    })
}

fn sample_events() -> Result<Vec<NewEvent>> {
    Ok(vec![
        NewEvent {
            title: "Tech Talk: Web Development".into(),
            description: Some("Introductory talk on web development".into()),
            date: at(2025, 12, 1, 10)?,
            capacity: Some(100),
        },
        NewEvent {
            title: "Hackathon 24H".into(),
            description: Some("Team hackathon".into()),
            date: at(2025, 12, 10, 9)?,
            capacity: Some(50),
        },
    ])
}

fn at(year: i32, month: u32, day: u32, hour: u32) -> Result<NaiveDateTime> {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(hour, 0, 0))
        .context("Invalid sample event date")
}

#[cfg(test)]
mod test {
    use super::*;
    use db_storage::admins::Admin;
    use pretty_assertions::assert_eq;
    use test_util::database::DatabaseContext;

    #[test]
    fn bootstrap_is_idempotent() {
        let db_ctx = DatabaseContext::new();
        let mut conn = db_ctx.db.get_conn().unwrap();
        let authenticator = Authenticator::new().unwrap();
        let settings = Bootstrap::default();

        run(&mut conn, &settings, &authenticator).unwrap();
        run(&mut conn, &settings, &authenticator).unwrap();

        let titles: Vec<_> = Event::get_all_ordered_by_date(&mut conn)
            .unwrap()
            .into_iter()
            .map(|event| (event.title, event.capacity))
            .collect();
        assert_eq!(
            titles,
            [
                ("Tech Talk: Web Development".to_owned(), Some(100)),
                ("Hackathon 24H".to_owned(), Some(50)),
            ]
        );

        let admin = Admin::get_by_username(&mut conn, "admin").unwrap().unwrap();
        assert!(authenticator
            .authenticate(&mut conn, &admin.username, "admin123")
            .is_ok());
    }

    #[test]
    fn existing_events_suppress_samples() {
        let db_ctx = DatabaseContext::new();
        db_ctx.create_test_event("Own event", None).unwrap();
        let mut conn = db_ctx.db.get_conn().unwrap();

        run(&mut conn, &Bootstrap::default(), &Authenticator::new().unwrap()).unwrap();

        assert_eq!(Event::count(&mut conn).unwrap(), 1);
    }

    #[test]
    fn samples_can_be_disabled() {
        let db_ctx = DatabaseContext::new();
        let mut conn = db_ctx.db.get_conn().unwrap();
        let settings = Bootstrap {
            sample_events: false,
            ..Default::default()
        };

        run(&mut conn, &settings, &Authenticator::new().unwrap()).unwrap();

        assert_eq!(Event::count(&mut conn).unwrap(), 0);
    }
}
