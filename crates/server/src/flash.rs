// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

//! One-shot messages carried across a redirect
//!
//! The message is stored as base64 encoded JSON inside the [`FLASH_COOKIE`] and removed again
//! by the next page that renders it.
use actix_web::cookie::{Cookie, SameSite};
use actix_web::HttpRequest;
use serde::{Deserialize, Serialize};

pub const FLASH_COOKIE: &str = "evreg_flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Success,
    Info,
    Warning,
    Danger,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
}

impl Flash {
    pub fn new<M: Into<String>>(level: FlashLevel, message: M) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }

    pub fn success<M: Into<String>>(message: M) -> Self {
        Self::new(FlashLevel::Success, message)
    }

    pub fn info<M: Into<String>>(message: M) -> Self {
        Self::new(FlashLevel::Info, message)
    }

    pub fn warning<M: Into<String>>(message: M) -> Self {
        Self::new(FlashLevel::Warning, message)
    }

    pub fn danger<M: Into<String>>(message: M) -> Self {
        Self::new(FlashLevel::Danger, message)
    }

    pub fn to_cookie(&self) -> Cookie<'static> {
        // Serializing a struct of strings cannot fail
        let json = serde_json::to_vec(self).unwrap_or_default();

        Cookie::build(
            FLASH_COOKIE,
            base64::encode_config(json, base64::URL_SAFE_NO_PAD),
        )
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .finish()
    }

    /// Reads the flash of the request, malformed cookies are ignored
    pub fn from_request(req: &HttpRequest) -> Option<Self> {
        let cookie = req.cookie(FLASH_COOKIE)?;

        let json = base64::decode_config(cookie.value(), base64::URL_SAFE_NO_PAD).ok()?;

        match serde_json::from_slice(&json) {
            Ok(flash) => Some(flash),
            Err(e) => {
                log::debug!("Ignoring malformed flash cookie, {}", e);
                None
            }
        }
    }

    pub fn removal_cookie() -> Cookie<'static> {
        let mut cookie = Cookie::build(FLASH_COOKIE, "").path("/").finish();
        cookie.make_removal();

        cookie
    }
}
