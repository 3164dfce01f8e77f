// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

//! Handles admin authentication of requests
use crate::sessions::{SessionStore, SessionToken, SESSION_COOKIE};
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::error::Error;
use actix_web::http::header;
use actix_web::web::Data;
use actix_web::{HttpMessage, HttpResponse};
use core::future::ready;
use std::future::{Future, Ready};
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

/// Location unauthenticated requests are redirected to
pub const LOGIN_PATH: &str = "/admin/login";

/// Middleware factory
///
/// Transforms into [`AdminAuthMiddleware`]
pub struct AdminAuth {
    pub sessions: Data<SessionStore>,
}

impl<S> Transform<S, ServiceRequest> for AdminAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse, Error = Error> + 'static,
    S::Future: 'static,
{
    type Response = ServiceResponse;
    type Error = Error;
    type Transform = AdminAuthMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AdminAuthMiddleware {
            service: Rc::new(service),
            sessions: self.sessions.clone(),
        }))
    }
}

/// Authentication middleware
///
/// Whenever a request is received, the AdminAuthMiddleware resolves the session cookie and
/// provides the associated [`AdminSession`](crate::sessions::AdminSession) as
/// [`ReqData`](actix_web::web::ReqData) for the subsequent services. Requests without a valid
/// session are redirected to the login page.
pub struct AdminAuthMiddleware<S> {
    service: Rc<S>,
    sessions: Data<SessionStore>,
}

type ResultFuture<O, E> = Pin<Box<dyn Future<Output = Result<O, E>>>>;

impl<S> Service<ServiceRequest> for AdminAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse, Error = Error> + 'static,
    S::Future: 'static,
{
    type Response = ServiceResponse;
    type Error = Error;
    type Future = ResultFuture<Self::Response, Self::Error>;

    fn poll_ready(&self, ctx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let session = req
            .cookie(SESSION_COOKIE)
            .and_then(|cookie| self.sessions.get(&SessionToken::from(cookie.value())));

        let Some(session) = session else {
            log::debug!("Redirecting unauthenticated request for {}", req.path());

            let response = HttpResponse::SeeOther()
                .insert_header((header::LOCATION, LOGIN_PATH))
                .cookie(self.sessions.removal_cookie())
                .finish();

            return Box::pin(ready(Ok(req.into_response(response))));
        };

        let service = self.service.clone();

        Box::pin(async move {
            req.extensions_mut().insert(session);
            service.call(req).await
        })
    }
}
