// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

//! HTML frontend
//!
//! Current Endpoints. See their respective function:
//! - `/` and `/events` ([GET](public::events))
//! - `/events/{event_id}/register` ([GET](public::register_form), [POST](public::register))
//! - `/my-registrations` ([GET](public::my_registrations))
//! - `/admin/login` ([GET](admin::login_form), [POST](admin::login))
//! - `/admin/logout` ([POST](admin::logout))
//! - `/admin/dashboard` ([GET](admin::dashboard))
//! - `/admin/events/new` ([GET](admin::new_event_form))
//! - `/admin/events` ([POST](admin::create_event))
//! - `/admin/events/{event_id}/participants` ([GET](admin::participants))
//! - `/admin/registrations/{registration_id}/decision` ([POST](admin::decision))
use crate::flash::Flash;
use crate::services::admins::Authenticator;
use crate::sessions::{AdminSession, SessionStore};
use crate::templates::Templates;
use actix_web::http::header::{self, ContentType};
use actix_web::http::StatusCode;
use actix_web::web::{self, Data};
use actix_web::{HttpMessage, HttpRequest, HttpResponse};
use database::Db;
use serde::Serialize;
use views::PageContext;

pub mod admin;
pub mod error;
pub mod middleware;
pub mod public;
pub mod views;

pub use error::ApiError;

/// Application data shared by all workers
#[derive(Clone)]
pub struct AppData {
    pub db: Data<Db>,
    pub sessions: Data<SessionStore>,
    pub templates: Data<Templates>,
    pub authenticator: Data<Authenticator>,
}

/// Registers the application data and every endpoint
pub fn configure(cfg: &mut web::ServiceConfig, data: &AppData) {
    cfg.app_data(data.db.clone())
        .app_data(data.sessions.clone())
        .app_data(data.templates.clone())
        .app_data(data.authenticator.clone())
        .app_data(web::FormConfig::default().error_handler(error::form_error_handler))
        .service(public::index)
        .service(public::events)
        .service(public::register_form)
        .service(public::register)
        .service(public::my_registrations)
        .service(
            web::scope("/admin")
                .service(admin::login_form)
                .service(admin::login)
                .service(
                    // empty scope to differentiate between the public login endpoints
                    web::scope("")
                        .wrap(middleware::AdminAuth {
                            sessions: data.sessions.clone(),
                        })
                        .service(admin::logout)
                        .service(admin::dashboard)
                        .service(admin::new_event_form)
                        .service(admin::create_event)
                        .service(admin::participants)
                        .service(admin::decision),
                ),
        );
}

/// Fallback for unknown routes
pub async fn not_found() -> Result<HttpResponse, ApiError> {
    Err(ApiError::not_found())
}

/// 303 redirect carrying a flash message
pub(crate) fn redirect(location: &str, flash: Flash) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, location))
        .cookie(flash.to_cookie())
        .finish()
}

/// Renders a page inside the layout
///
/// Shows the `flash` if one is passed, otherwise the flash cookie of the request is consumed.
pub(crate) fn render<T: Serialize>(
    req: &HttpRequest,
    templates: &Templates,
    template: &str,
    title: &str,
    status: StatusCode,
    flash: Option<Flash>,
    body: T,
) -> Result<HttpResponse, ApiError> {
    let has_flash_cookie = req.cookie(crate::flash::FLASH_COOKIE).is_some();
    let flash = flash.or_else(|| Flash::from_request(req));

    let admin = req
        .extensions()
        .get::<AdminSession>()
        .map(|session| session.username.clone());

    let context = PageContext {
        title,
        flash,
        admin,
        body,
    };

    let html = templates.render(template, &context)?;

    let mut response = HttpResponse::build(status);

    if has_flash_cookie {
        response.cookie(Flash::removal_cookie());
    }

    Ok(response.content_type(ContentType::html()).body(html))
}
