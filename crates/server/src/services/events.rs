// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

//! Event creation by admins
use chrono::NaiveDateTime;
use database::{DatabaseError, DbConnection};
use db_storage::events::{Event, NewEvent};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use validator::{Validate, ValidationError, ValidationErrors};

/// Accepted date formats, the first one is sent by `datetime-local` inputs
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

/// Body of the `POST /admin/events` form
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
pub struct EventForm {
    #[serde(default, deserialize_with = "super::trimmed")]
    #[validate(required(message = "A title is required."), length(max = 200))]
    pub title: Option<String>,

    #[serde(default, deserialize_with = "super::trimmed")]
    #[validate(length(max = 2000))]
    pub description: Option<String>,

    #[serde(default, deserialize_with = "super::trimmed")]
    #[validate(
        required(message = "A date is required."),
        custom = "validate_date"
    )]
    pub date: Option<String>,

    /// Empty for unlimited
    #[serde(default, deserialize_with = "super::trimmed")]
    #[validate(custom = "validate_capacity")]
    pub capacity: Option<String>,
}

fn parse_date(date: &str) -> Option<NaiveDateTime> {
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(date, format).ok())
}

fn parse_capacity(capacity: &str) -> Option<i32> {
    capacity.parse::<i32>().ok().filter(|capacity| *capacity >= 0)
}

fn validate_date(date: &str) -> Result<(), ValidationError> {
    match parse_date(date) {
        Some(_) => Ok(()),
        None => {
            let mut error = ValidationError::new("invalid_date");
            error.message = Some(Cow::Borrowed("The date must look like 2025-12-01 10:00."));
            Err(error)
        }
    }
}

fn validate_capacity(capacity: &str) -> Result<(), ValidationError> {
    match parse_capacity(capacity) {
        Some(_) => Ok(()),
        None => {
            let mut error = ValidationError::new("invalid_capacity");
            error.message = Some(Cow::Borrowed(
                "The capacity must be a non-negative number or empty.",
            ));
            Err(error)
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EventError {
    #[error("Invalid event, {0}")]
    Validation(#[from] ValidationErrors),
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl TryFrom<EventForm> for NewEvent {
    type Error = ValidationErrors;

    fn try_from(form: EventForm) -> Result<Self, Self::Error> {
        form.validate()?;

        let title = form.title.unwrap_or_default();
        let date = form.date.as_deref().and_then(parse_date);

        let capacity = match form.capacity.as_deref() {
            Some(capacity) => parse_capacity(capacity),
            None => None,
        };

        match date {
            Some(date) => Ok(NewEvent {
                title,
                description: form.description,
                date,
                capacity,
            }),
            None => Err(ValidationErrors::new()),
        }
    }
}

/// Creates a new event from the admin form
#[tracing::instrument(err, skip_all)]
pub fn create(conn: &mut DbConnection, form: EventForm) -> Result<Event, EventError> {
    let new_event = NewEvent::try_from(form)?;

    let event = new_event.insert(conn)?;

    log::info!("Created event {} `{}`", event.id, event.title);

    Ok(event)
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use test_util::database::{test_date, DatabaseContext};

    fn form(value: serde_json::Value) -> EventForm {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn datetime_local_and_plain_dates_are_accepted() {
        assert_eq!(parse_date("2025-12-01T10:00"), Some(test_date(12, 1)));
        assert_eq!(parse_date("2025-12-01 10:00"), Some(test_date(12, 1)));
        assert_eq!(parse_date("01.12.2025"), None);
    }

    #[test]
    fn create_with_unlimited_capacity() {
        let db_ctx = DatabaseContext::new();
        let mut conn = db_ctx.db.get_conn().unwrap();

        let event = create(
            &mut conn,
            form(json!({
                "title": " Workshop ",
                "description": "",
                "date": "2025-12-01T10:00",
                "capacity": ""
            })),
        )
        .unwrap();

        assert_eq!(event.title, "Workshop");
        assert_eq!(event.description, None);
        assert_eq!(event.date, test_date(12, 1));
        assert_eq!(event.capacity, None);
    }

    #[test]
    fn create_with_capacity() {
        let db_ctx = DatabaseContext::new();
        let mut conn = db_ctx.db.get_conn().unwrap();

        let event = create(
            &mut conn,
            form(json!({
                "title": "Workshop",
                "description": "Bring a laptop",
                "date": "2025-12-01 10:00",
                "capacity": "0"
            })),
        )
        .unwrap();

        assert_eq!(event.description.as_deref(), Some("Bring a laptop"));
        assert_eq!(event.capacity, Some(0));
    }

    #[test]
    fn invalid_forms_are_rejected() {
        let db_ctx = DatabaseContext::new();
        let mut conn = db_ctx.db.get_conn().unwrap();

        for value in [
            json!({ "title": "", "date": "2025-12-01T10:00" }),
            json!({ "title": "Workshop" }),
            json!({ "title": "Workshop", "date": "tomorrow" }),
            json!({ "title": "Workshop", "date": "2025-12-01T10:00", "capacity": "-1" }),
            json!({ "title": "Workshop", "date": "2025-12-01T10:00", "capacity": "many" }),
        ] {
            let result = create(&mut conn, form(value));
            assert!(matches!(result, Err(EventError::Validation(_))));
        }

        assert_eq!(Event::count(&mut conn).unwrap(), 0);
    }
}
