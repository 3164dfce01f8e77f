// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

//! Endpoints of the admin area
//!
//! Everything except the login endpoints is wrapped by [`AdminAuth`](super::middleware::AdminAuth).
use super::views::{
    DashboardPage, DashboardRow, EventView, LoginPage, NewEventPage, ParticipantsPage,
    RegistrationView,
};
use super::{redirect, render, ApiError};
use crate::flash::Flash;
use crate::services::admins::{AuthenticationError, Authenticator};
use crate::services::events::{self, EventError, EventForm};
use crate::services::registrations::{self, Decision, DecisionError};
use crate::sessions::{AdminSession, SessionStore};
use crate::templates::Templates;
use actix_web::http::{header, StatusCode};
use actix_web::web::{Data, Form, Path, ReqData};
use actix_web::{get, post, HttpRequest, HttpResponse};
use database::{Db, OptionalExt};
use db_storage::events::{Event, EventId};
use db_storage::registrations::{Registration, RegistrationId, RegistrationStatus};
use serde::Deserialize;

pub const DASHBOARD_PATH: &str = "/admin/dashboard";

pub const MSG_INVALID_CREDENTIALS: &str = "Invalid credentials";
pub const MSG_LOGGED_OUT: &str = "You have been logged out.";
pub const MSG_EVENT_CREATED: &str = "Event created.";
pub const MSG_EVENT_NOT_FOUND: &str = "Event not found.";
pub const MSG_APPROVED: &str = "Registration approved.";
pub const MSG_REJECTED: &str = "Registration rejected.";
pub const MSG_REGISTRATION_NOT_FOUND: &str = "Registration not found.";
pub const MSG_EVENT_FULL: &str = "Event is full. Cannot approve more participants.";
pub const MSG_UNKNOWN_ACTION: &str = "Choose whether to approve or reject the registration.";

fn participants_path(event_id: EventId) -> String {
    format!("/admin/events/{event_id}/participants")
}

/// API Endpoint `GET /admin/login`
#[get("/login")]
pub async fn login_form(
    req: HttpRequest,
    templates: Data<Templates>,
) -> Result<HttpResponse, ApiError> {
    render(
        &req,
        &templates,
        "admin_login",
        "Admin login",
        StatusCode::OK,
        None,
        LoginPage {
            username: String::new(),
        },
    )
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

/// API Endpoint `POST /admin/login`
///
/// Starts a session and hands out the session cookie. Invalid credentials re-render the
/// login form with status 401.
#[post("/login")]
pub async fn login(
    req: HttpRequest,
    db: Data<Db>,
    templates: Data<Templates>,
    sessions: Data<SessionStore>,
    authenticator: Data<Authenticator>,
    form: Form<LoginForm>,
) -> Result<HttpResponse, ApiError> {
    let LoginForm { username, password } = form.into_inner();
    let username = username.trim().to_owned();

    let result = {
        let username = username.clone();

        crate::block(move || {
            let mut conn = db.get_conn()?;

            authenticator.authenticate(&mut conn, &username, &password)
        })
        .await?
    };

    match result {
        Ok(admin) => {
            let session = sessions.create(&admin);

            log::info!("Admin {} logged in", admin.username);

            Ok(HttpResponse::SeeOther()
                .insert_header((header::LOCATION, DASHBOARD_PATH))
                .cookie(sessions.cookie(&session))
                .finish())
        }
        Err(AuthenticationError::InvalidCredentials) => render(
            &req,
            &templates,
            "admin_login",
            "Admin login",
            StatusCode::UNAUTHORIZED,
            Some(Flash::danger(MSG_INVALID_CREDENTIALS)),
            LoginPage { username },
        ),
        Err(AuthenticationError::Database(e)) => Err(e.into()),
        Err(e @ AuthenticationError::Hashing(_)) => Err(anyhow::Error::from(e).into()),
    }
}

/// API Endpoint `POST /admin/logout`
#[post("/logout")]
pub async fn logout(
    sessions: Data<SessionStore>,
    session: ReqData<AdminSession>,
) -> HttpResponse {
    sessions.remove(&session.token);

    log::info!("Admin {} logged out", session.username);

    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, super::middleware::LOGIN_PATH))
        .cookie(sessions.removal_cookie())
        .cookie(Flash::info(MSG_LOGGED_OUT).to_cookie())
        .finish()
}

/// API Endpoint `GET /admin/dashboard`
///
/// Lists all events with their number of pending registrations
#[get("/dashboard")]
pub async fn dashboard(
    req: HttpRequest,
    db: Data<Db>,
    templates: Data<Templates>,
) -> Result<HttpResponse, ApiError> {
    let (events, pending_total) = crate::block(move || -> database::Result<_> {
        let mut conn = db.get_conn()?;

        let events = Event::get_all_with_pending_count(&mut conn)?;
        let pending_total = Registration::count_with_status(&mut conn, RegistrationStatus::Pending)?;

        Ok((events, pending_total))
    })
    .await??;

    render(
        &req,
        &templates,
        "admin_dashboard",
        "Dashboard",
        StatusCode::OK,
        None,
        DashboardPage {
            events: events
                .into_iter()
                .map(|(event, pending)| DashboardRow {
                    event: event.into(),
                    pending,
                })
                .collect(),
            pending_total,
        },
    )
}

/// API Endpoint `GET /admin/events/new`
#[get("/events/new")]
pub async fn new_event_form(
    req: HttpRequest,
    templates: Data<Templates>,
) -> Result<HttpResponse, ApiError> {
    render(
        &req,
        &templates,
        "new_event",
        "Create event",
        StatusCode::OK,
        None,
        NewEventPage {
            form: EventForm::default(),
        },
    )
}

/// API Endpoint `POST /admin/events`
#[post("/events")]
pub async fn create_event(
    req: HttpRequest,
    db: Data<Db>,
    templates: Data<Templates>,
    form: Form<EventForm>,
) -> Result<HttpResponse, ApiError> {
    let form = form.into_inner();

    let result = {
        let form = form.clone();

        crate::block(move || {
            let mut conn = db.get_conn()?;

            events::create(&mut conn, form)
        })
        .await?
    };

    match result {
        Ok(_) => Ok(redirect(DASHBOARD_PATH, Flash::success(MSG_EVENT_CREATED))),
        Err(EventError::Validation(errors)) => render(
            &req,
            &templates,
            "new_event",
            "Create event",
            StatusCode::UNPROCESSABLE_ENTITY,
            Some(Flash::danger(super::error::validation_message(&errors))),
            NewEventPage { form },
        ),
        Err(EventError::Database(e)) => Err(e.into()),
    }
}

/// API Endpoint `GET /admin/events/{event_id}/participants`
///
/// Lists the registrations of one event, the newest first
#[get("/events/{event_id}/participants")]
pub async fn participants(
    req: HttpRequest,
    db: Data<Db>,
    templates: Data<Templates>,
    event_id: Path<EventId>,
) -> Result<HttpResponse, ApiError> {
    let event_id = event_id.into_inner();

    let found = crate::block(move || -> database::Result<_> {
        let mut conn = db.get_conn()?;

        let Some(event) = Event::get(&mut conn, event_id).optional()? else {
            return Ok(None);
        };

        let approved = Registration::count_for_event_with_status(
            &mut conn,
            event_id,
            RegistrationStatus::Approved,
        )?;
        let registrations = Registration::get_all_for_event(&mut conn, event_id)?;

        Ok(Some((event, approved, registrations)))
    })
    .await??;

    let Some((event, approved, registrations)) = found else {
        return Ok(redirect(DASHBOARD_PATH, Flash::danger(MSG_EVENT_NOT_FOUND)));
    };

    let title = format!("Participants of {}", event.title);

    render(
        &req,
        &templates,
        "participants",
        &title,
        StatusCode::OK,
        None,
        ParticipantsPage {
            event: EventView::from(event),
            approved,
            registrations: registrations
                .into_iter()
                .map(RegistrationView::from)
                .collect(),
        },
    )
}

#[derive(Debug, Deserialize)]
pub struct DecisionForm {
    /// `approve` or `reject`
    #[serde(default)]
    action: String,
}

/// Redirect for a decision form that carries neither `approve` nor `reject`
async fn unknown_action(
    db: Data<Db>,
    registration_id: RegistrationId,
) -> Result<HttpResponse, ApiError> {
    let registration = crate::block(move || {
        let mut conn = db.get_conn()?;

        Registration::get(&mut conn, registration_id).optional()
    })
    .await??;

    let response = match registration {
        Some(registration) => redirect(
            &participants_path(registration.event_id),
            Flash::danger(MSG_UNKNOWN_ACTION),
        ),
        None => redirect(
            DASHBOARD_PATH,
            Flash::danger(MSG_REGISTRATION_NOT_FOUND),
        ),
    };

    Ok(response)
}

/// API Endpoint `POST /admin/registrations/{registration_id}/decision`
///
/// Approves or rejects a pending registration and redirects back to the participants of its
/// event.
#[post("/registrations/{registration_id}/decision")]
pub async fn decision(
    db: Data<Db>,
    session: ReqData<AdminSession>,
    registration_id: Path<RegistrationId>,
    form: Form<DecisionForm>,
) -> Result<HttpResponse, ApiError> {
    let registration_id = registration_id.into_inner();

    let Ok(action) = form.into_inner().action.parse::<Decision>() else {
        return unknown_action(db, registration_id).await;
    };

    let result = crate::block(move || {
        let mut conn = db.get_conn()?;

        registrations::decide(&mut conn, registration_id, action)
    })
    .await?;

    let response = match result {
        Ok(registration) => {
            log::info!(
                "Admin {} decided {:?} on registration {}",
                session.username,
                action,
                registration.id
            );

            let flash = match registration.status {
                RegistrationStatus::Approved => Flash::success(MSG_APPROVED),
                _ => Flash::info(MSG_REJECTED),
            };

            redirect(&participants_path(registration.event_id), flash)
        }
        Err(DecisionError::NotFound) => redirect(
            DASHBOARD_PATH,
            Flash::danger(MSG_REGISTRATION_NOT_FOUND),
        ),
        Err(DecisionError::CapacityExceeded { event_id }) => {
            redirect(&participants_path(event_id), Flash::danger(MSG_EVENT_FULL))
        }
        Err(DecisionError::Terminal { event_id, status }) => redirect(
            &participants_path(event_id),
            Flash::warning(format!(
                "The registration has already been {}.",
                status.as_str()
            )),
        ),
        Err(DecisionError::Database(e)) => return Err(e.into()),
    };

    Ok(response)
}
