// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

//! In-process store for admin sessions
//!
//! A successful login creates a session which is identified by an opaque random token. The
//! token is handed to the client inside the [`SESSION_COOKIE`] and resolved back into an
//! [`AdminSession`] by the [`AdminAuth`](crate::api::middleware::AdminAuth) middleware.
use actix_web::cookie::{Cookie, SameSite};
use db_storage::admins::{Admin, AdminId};
use parking_lot::RwLock;
use rand::rngs::OsRng;
use rand::RngCore;
use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};

/// Name of the cookie carrying the session token
pub const SESSION_COOKIE: &str = "evreg_session";

/// Opaque session token
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SessionToken(String);

impl SessionToken {
    fn generate() -> Self {
        let mut bytes = [0u8; 32];
        OsRng.fill_bytes(&mut bytes);

        Self(base64::encode_config(bytes, base64::URL_SAFE_NO_PAD))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SessionToken {
    fn from(token: &str) -> Self {
        Self(token.to_owned())
    }
}

// Never leak tokens into logs
impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(..)")
    }
}

/// The admin a session belongs to
///
/// Inserted into the request extensions for authenticated requests, retrieve it with
/// [`ReqData<AdminSession>`](actix_web::web::ReqData).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminSession {
    pub admin_id: AdminId,
    pub username: String,
    pub token: SessionToken,
}

struct SessionEntry {
    admin_id: AdminId,
    username: String,
    /// `None` if the lifetime reaches beyond what [`Instant`] can represent
    expires_at: Option<Instant>,
}

impl SessionEntry {
    fn is_valid(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |expires_at| expires_at > now)
    }
}

pub struct SessionStore {
    sessions: RwLock<HashMap<SessionToken, SessionEntry>>,
    lifetime: Duration,
    cookie_secure: bool,
}

impl SessionStore {
    pub fn new(lifetime: Duration, cookie_secure: bool) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            lifetime,
            cookie_secure,
        }
    }

    /// Creates a new session for the given admin
    pub fn create(&self, admin: &Admin) -> AdminSession {
        let token = SessionToken::generate();
        let now = Instant::now();

        let mut sessions = self.sessions.write();
        sessions.retain(|_, entry| entry.is_valid(now));
        sessions.insert(
            token.clone(),
            SessionEntry {
                admin_id: admin.id,
                username: admin.username.clone(),
                expires_at: now.checked_add(self.lifetime),
            },
        );

        log::debug!("Created session for admin {}", admin.username);

        AdminSession {
            admin_id: admin.id,
            username: admin.username.clone(),
            token,
        }
    }

    /// Resolves a token into its session, expired sessions are removed on access
    pub fn get(&self, token: &SessionToken) -> Option<AdminSession> {
        let now = Instant::now();

        {
            let sessions = self.sessions.read();
            let entry = sessions.get(token)?;

            if entry.is_valid(now) {
                return Some(AdminSession {
                    admin_id: entry.admin_id,
                    username: entry.username.clone(),
                    token: token.clone(),
                });
            }
        }

        self.sessions.write().remove(token);

        None
    }

    pub fn remove(&self, token: &SessionToken) -> bool {
        self.sessions.write().remove(token).is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cookie handing the session token to the client
    pub fn cookie(&self, session: &AdminSession) -> Cookie<'static> {
        Cookie::build(SESSION_COOKIE, session.token.as_str().to_owned())
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.cookie_secure)
            .max_age(actix_web::cookie::time::Duration::seconds(
                i64::try_from(self.lifetime.as_secs()).unwrap_or(i64::MAX),
            ))
            .finish()
    }

    /// Cookie instructing the client to drop the session token
    pub fn removal_cookie(&self) -> Cookie<'static> {
        let mut cookie = Cookie::build(SESSION_COOKIE, "")
            .path("/")
            .http_only(true)
            .finish();
        cookie.make_removal();

        cookie
    }
}
