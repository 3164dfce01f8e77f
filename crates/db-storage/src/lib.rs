// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

//! Contains the database ORM and database migrations for evreg
//! Builds upon evreg-database
//!
//! Every table gets its own module holding the queryable model, the insertable model and the
//! queries operating on them. All functions take a `&mut DbConnection`, a pooled connection can
//! be passed directly since it dereferences into one.

#[macro_use]
mod macros;
mod schema;

pub mod admins;
pub mod events;
pub mod migrations;
pub mod registrations;
