// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

//! Services that expose clean APIs and hide implementation details from endpoints
//!
//! All functions in here are blocking and are expected to run inside [`crate::block`].
pub mod admins;
pub mod events;
pub mod registrations;

use serde::{Deserialize, Deserializer};

/// Deserializes an optional form field, trimming it and treating blank values as absent
pub(crate) fn trimmed<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Deserialize::deserialize(deserializer)?;

    Ok(value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty()))
}
