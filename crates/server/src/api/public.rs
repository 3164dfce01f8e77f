// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

//! Endpoints available to attendees
use super::views::{EventList, EventView, LookupPage, LookupView, RegisterPage};
use super::{redirect, render, ApiError};
use crate::flash::Flash;
use crate::services::registrations::{self, RegistrationError, RegistrationForm};
use crate::templates::Templates;
use actix_web::http::StatusCode;
use actix_web::web::{Data, Form, Path, Query};
use actix_web::{get, post, HttpRequest, HttpResponse};
use database::{Db, OptionalExt};
use db_storage::events::{Event, EventId};
use serde::Deserialize;

pub const MSG_SUBMITTED: &str = "Registration submitted. Waiting for admin approval.";
pub const MSG_ALREADY_REGISTERED: &str = "You have already registered for this event.";
pub const MSG_EVENT_NOT_FOUND: &str = "The requested event does not exist.";

/// API Endpoint `GET /`
#[get("/")]
pub async fn index(
    req: HttpRequest,
    db: Data<Db>,
    templates: Data<Templates>,
) -> Result<HttpResponse, ApiError> {
    event_list(req, db, templates).await
}

/// API Endpoint `GET /events`
///
/// Lists all events, the earliest first
#[get("/events")]
pub async fn events(
    req: HttpRequest,
    db: Data<Db>,
    templates: Data<Templates>,
) -> Result<HttpResponse, ApiError> {
    event_list(req, db, templates).await
}

async fn event_list(
    req: HttpRequest,
    db: Data<Db>,
    templates: Data<Templates>,
) -> Result<HttpResponse, ApiError> {
    let all_events = crate::block(move || {
        let mut conn = db.get_conn()?;

        Event::get_all_ordered_by_date(&mut conn)
    })
    .await??;

    render(
        &req,
        &templates,
        "events",
        "Events",
        StatusCode::OK,
        None,
        EventList {
            events: all_events.into_iter().map(EventView::from).collect(),
        },
    )
}

async fn find_event(db: Data<Db>, event_id: EventId) -> Result<Option<Event>, ApiError> {
    let event = crate::block(move || {
        let mut conn = db.get_conn()?;

        Event::get(&mut conn, event_id).optional()
    })
    .await??;

    Ok(event)
}

/// API Endpoint `GET /events/{event_id}/register`
#[get("/events/{event_id}/register")]
pub async fn register_form(
    req: HttpRequest,
    db: Data<Db>,
    templates: Data<Templates>,
    event_id: Path<EventId>,
) -> Result<HttpResponse, ApiError> {
    let Some(event) = find_event(db, event_id.into_inner()).await? else {
        return Ok(redirect("/events", Flash::danger(MSG_EVENT_NOT_FOUND)));
    };

    render(
        &req,
        &templates,
        "register",
        &event.title.clone(),
        StatusCode::OK,
        None,
        RegisterPage {
            event: event.into(),
            form: RegistrationForm::default(),
        },
    )
}

/// API Endpoint `POST /events/{event_id}/register`
///
/// Creates a pending registration. Invalid input re-renders the form with status 422, a
/// second registration of the same email is redirected to the lookup of that email.
#[post("/events/{event_id}/register")]
pub async fn register(
    req: HttpRequest,
    db: Data<Db>,
    templates: Data<Templates>,
    event_id: Path<EventId>,
    form: Form<RegistrationForm>,
) -> Result<HttpResponse, ApiError> {
    let event_id = event_id.into_inner();
    let form = form.into_inner();

    let result = {
        let db = db.clone();
        let form = form.clone();

        crate::block(move || {
            let mut conn = db.get_conn()?;

            registrations::submit(&mut conn, event_id, form)
        })
        .await?
    };

    match result {
        Ok(_) => Ok(redirect("/", Flash::success(MSG_SUBMITTED))),
        Err(RegistrationError::Validation(errors)) => {
            let Some(event) = find_event(db, event_id).await? else {
                return Ok(redirect("/events", Flash::danger(MSG_EVENT_NOT_FOUND)));
            };

            render(
                &req,
                &templates,
                "register",
                &event.title.clone(),
                StatusCode::UNPROCESSABLE_ENTITY,
                Some(Flash::danger(super::error::validation_message(&errors))),
                RegisterPage {
                    event: event.into(),
                    form,
                },
            )
        }
        Err(RegistrationError::EventNotFound) => {
            Ok(redirect("/events", Flash::danger(MSG_EVENT_NOT_FOUND)))
        }
        Err(RegistrationError::Duplicate { email }) => {
            let email: String = url::form_urlencoded::byte_serialize(email.as_bytes()).collect();

            Ok(redirect(
                &format!("/my-registrations?email={email}"),
                Flash::warning(MSG_ALREADY_REGISTERED),
            ))
        }
        Err(RegistrationError::Database(e)) => Err(e.into()),
    }
}

#[derive(Debug, Deserialize)]
pub struct LookupQuery {
    #[serde(default)]
    email: String,
}

/// API Endpoint `GET /my-registrations?email=`
///
/// Lists the registrations of an email across all events, the newest first
#[get("/my-registrations")]
pub async fn my_registrations(
    req: HttpRequest,
    db: Data<Db>,
    templates: Data<Templates>,
    query: Query<LookupQuery>,
) -> Result<HttpResponse, ApiError> {
    let email = query.into_inner().email.trim().to_owned();

    let found = {
        let email = email.clone();

        crate::block(move || {
            let mut conn = db.get_conn()?;

            registrations::lookup(&mut conn, &email)
        })
        .await??
    };

    render(
        &req,
        &templates,
        "my_registrations",
        "My registrations",
        StatusCode::OK,
        None,
        LookupPage {
            email,
            registrations: found.into_iter().map(LookupView::from).collect(),
        },
    )
}
