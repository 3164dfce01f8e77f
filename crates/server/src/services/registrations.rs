// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

//! Registration lifecycle
//!
//! A registration is created `Pending` by an attendee and is moved into one of the terminal
//! states `Approved` or `Rejected` by an admin. Approving checks the capacity of the event.
use chrono::Utc;
use database::{DatabaseError, DbConnection, OptionalExt};
use db_storage::events::{Event, EventId};
use db_storage::registrations::{
    NewRegistration, Registration, RegistrationId, RegistrationStatus, UpdateRegistration,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use validator::{Validate, ValidationErrors};

/// Body of the `POST /events/{event_id}/register` form
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
pub struct RegistrationForm {
    #[serde(default, deserialize_with = "super::trimmed")]
    #[validate(required(message = "Name and email are required."), length(max = 200))]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "super::trimmed")]
    #[validate(required(message = "Name and email are required."), length(max = 200))]
    pub email: Option<String>,

    #[serde(default, deserialize_with = "super::trimmed")]
    #[validate(length(max = 50))]
    pub phone: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum RegistrationError {
    #[error("Invalid registration, {0}")]
    Validation(#[from] ValidationErrors),
    #[error("The event does not exist")]
    EventNotFound,
    #[error("`{email}` is already registered for this event")]
    Duplicate { email: String },
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// Creates a pending registration for the given event
#[tracing::instrument(err, skip(conn, form))]
pub fn submit(
    conn: &mut DbConnection,
    event_id: EventId,
    form: RegistrationForm,
) -> Result<Registration, RegistrationError> {
    form.validate()?;

    let (name, email) = match (form.name, form.email) {
        (Some(name), Some(email)) => (name, email),
        _ => return Err(RegistrationError::Validation(ValidationErrors::new())),
    };

    let event = Event::get(conn, event_id)
        .optional()?
        .ok_or(RegistrationError::EventNotFound)?;

    if Registration::exists_for_event(conn, event.id, &email)? {
        return Err(RegistrationError::Duplicate { email });
    }

    let registration = NewRegistration {
        event_id: event.id,
        name,
        email: email.clone(),
        phone: form.phone,
        status: RegistrationStatus::Pending,
        created_at: Utc::now().naive_utc(),
    }
    .try_insert(conn)?;

    match registration {
        Some(registration) => {
            log::info!(
                "New registration {} for event {}",
                registration.id,
                registration.event_id
            );
            Ok(registration)
        }
        // A concurrent submission won the race for the unique index
        None => Err(RegistrationError::Duplicate { email }),
    }
}

/// Admin decision on a pending registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Approve,
    Reject,
}

impl FromStr for Decision {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "approve" => Ok(Self::Approve),
            "reject" => Ok(Self::Reject),
            _ => Err(format!("unknown decision {s:?}")),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DecisionError {
    #[error("The registration does not exist")]
    NotFound,
    #[error("Event {event_id} is full")]
    CapacityExceeded { event_id: EventId },
    #[error("The registration has already been {}", .status.as_str())]
    Terminal {
        event_id: EventId,
        status: RegistrationStatus,
    },
    #[error(transparent)]
    Database(DatabaseError),
}

impl From<DatabaseError> for DecisionError {
    fn from(e: DatabaseError) -> Self {
        match e {
            DatabaseError::NotFound => Self::NotFound,
            e => Self::Database(e),
        }
    }
}

impl From<diesel::result::Error> for DecisionError {
    fn from(e: diesel::result::Error) -> Self {
        DatabaseError::from(e).into()
    }
}

/// Applies an admin decision to a pending registration
///
/// Reading the approved count and writing the new status happens inside one immediate
/// transaction, which takes the database write lock up front. Concurrent approvals for the
/// same event are serialized and cannot exceed the capacity.
#[tracing::instrument(err, skip(conn))]
pub fn decide(
    conn: &mut DbConnection,
    registration_id: RegistrationId,
    decision: Decision,
) -> Result<Registration, DecisionError> {
    conn.immediate_transaction(|conn| {
        let registration = Registration::get(conn, registration_id)?;

        if registration.status.is_terminal() {
            return Err(DecisionError::Terminal {
                event_id: registration.event_id,
                status: registration.status,
            });
        }

        let status = match decision {
            Decision::Reject => RegistrationStatus::Rejected,
            Decision::Approve => {
                let event = Event::get(conn, registration.event_id)?;
                let approved = Registration::count_for_event_with_status(
                    conn,
                    event.id,
                    RegistrationStatus::Approved,
                )?;

                if event.is_full(approved) {
                    return Err(DecisionError::CapacityExceeded { event_id: event.id });
                }

                RegistrationStatus::Approved
            }
        };

        let registration = UpdateRegistration { status }.apply(conn, registration_id)?;

        log::info!(
            "Registration {} of event {} is now {}",
            registration.id,
            registration.event_id,
            registration.status
        );

        Ok(registration)
    })
}

/// Returns all registrations of the given email across all events, the newest first
#[tracing::instrument(err, skip_all)]
pub fn lookup(
    conn: &mut DbConnection,
    email: &str,
) -> Result<Vec<(Registration, Event)>, DatabaseError> {
    let email = email.trim();

    if email.is_empty() {
        return Ok(vec![]);
    }

    Registration::get_all_by_email_with_event(conn, email)
}
