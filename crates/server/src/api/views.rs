// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

//! Template contexts
use crate::flash::Flash;
use chrono::NaiveDateTime;
use db_storage::events::{Event, EventId};
use db_storage::registrations::{Registration, RegistrationId, RegistrationStatus};
use serde::Serialize;

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

fn format_date(date: &NaiveDateTime) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Values every page gets, the page specific body is flattened into it
#[derive(Debug, Serialize)]
pub struct PageContext<'a, T> {
    pub title: &'a str,
    pub flash: Option<Flash>,
    /// Username of the logged in admin
    pub admin: Option<String>,
    #[serde(flatten)]
    pub body: T,
}

#[derive(Debug, Clone, Serialize)]
pub struct EventView {
    pub id: EventId,
    pub title: String,
    pub description: Option<String>,
    pub date: String,
    pub capacity: Option<i32>,
    pub capacity_label: Option<String>,
}

impl From<Event> for EventView {
    fn from(event: Event) -> Self {
        Self {
            id: event.id,
            date: format_date(&event.date),
            capacity_label: event
                .capacity
                .map(|capacity| format!("{capacity} places")),
            capacity: event.capacity,
            title: event.title,
            description: event.description,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RegistrationView {
    pub id: RegistrationId,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub status: RegistrationStatus,
    pub status_label: String,
    pub pending: bool,
    pub created_at: String,
}

impl From<Registration> for RegistrationView {
    fn from(registration: Registration) -> Self {
        Self {
            id: registration.id,
            status_label: registration.status.to_string(),
            pending: !registration.status.is_terminal(),
            status: registration.status,
            created_at: format_date(&registration.created_at),
            name: registration.name,
            email: registration.email,
            phone: registration.phone,
        }
    }
}

/// One row of the attendee lookup
#[derive(Debug, Clone, Serialize)]
pub struct LookupView {
    pub event_title: String,
    pub event_date: String,
    pub status: RegistrationStatus,
    pub status_label: String,
    pub created_at: String,
}

impl From<(Registration, Event)> for LookupView {
    fn from((registration, event): (Registration, Event)) -> Self {
        Self {
            event_title: event.title,
            event_date: format_date(&event.date),
            status: registration.status,
            status_label: registration.status.to_string(),
            created_at: format_date(&registration.created_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct EventList {
    pub events: Vec<EventView>,
}

#[derive(Debug, Serialize)]
pub struct RegisterPage<F> {
    pub event: EventView,
    pub form: F,
}

#[derive(Debug, Serialize)]
pub struct LookupPage {
    pub email: String,
    pub registrations: Vec<LookupView>,
}

#[derive(Debug, Serialize)]
pub struct LoginPage {
    pub username: String,
}

#[derive(Debug, Serialize)]
pub struct DashboardRow {
    pub event: EventView,
    pub pending: i64,
}

#[derive(Debug, Serialize)]
pub struct DashboardPage {
    pub events: Vec<DashboardRow>,
    pub pending_total: i64,
}

#[derive(Debug, Serialize)]
pub struct NewEventPage<F> {
    pub form: F,
}

#[derive(Debug, Serialize)]
pub struct ParticipantsPage {
    pub event: EventView,
    pub approved: i64,
    pub registrations: Vec<RegistrationView>,
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::NaiveDate;
    use test_util::assert_eq_json;

    fn date() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 12, 1)
            .and_then(|d| d.and_hms_opt(10, 0, 0))
            .unwrap()
    }

    #[test]
    fn event_view() {
        let event = Event {
            id: EventId::from(3),
            title: "Tech Talk: Web Development".into(),
            description: None,
            date: date(),
            capacity: Some(100),
        };

        assert_eq_json!(
            EventView::from(event),
            {
                "id": 3,
                "title": "Tech Talk: Web Development",
                "description": null,
                "date": "2025-12-01 10:00",
                "capacity": 100,
                "capacity_label": "100 places"
            }
        );
    }

    #[test]
    fn registration_view() {
        let registration = Registration {
            id: RegistrationId::from(7),
            event_id: EventId::from(3),
            name: "Alice".into(),
            email: "alice@example.org".into(),
            phone: None,
            status: RegistrationStatus::Approved,
            created_at: date(),
        };

        assert_eq_json!(
            RegistrationView::from(registration),
            {
                "id": 7,
                "name": "Alice",
                "email": "alice@example.org",
                "phone": null,
                "status": "approved",
                "status_label": "Approved",
                "pending": false,
                "created_at": "2025-12-01 10:00"
            }
        );
    }

    #[test]
    fn page_context_flattens_body() {
        let context = PageContext {
            title: "Events",
            flash: Some(Flash::info("Registration rejected.")),
            admin: None,
            body: EventList { events: vec![] },
        };

        assert_eq_json!(
            context,
            {
                "title": "Events",
                "flash": { "level": "info", "message": "Registration rejected." },
                "admin": null,
                "events": []
            }
        );
    }
}
