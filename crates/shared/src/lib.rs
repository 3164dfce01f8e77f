// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

//! Shared types for the evreg crates.
//! One purpose is to let the storage crates read the settings without depending on the server.

pub mod settings;
