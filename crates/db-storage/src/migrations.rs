// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

use anyhow::{anyhow, Result};
use database::DbConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

/// Applies all pending migrations and returns the versions that were run
#[tracing::instrument(err, skip_all)]
pub fn migrate(conn: &mut DbConnection) -> Result<Vec<String>> {
    let applied: Vec<String> = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| anyhow!(e))?
        .into_iter()
        .map(|version| version.to_string())
        .collect();

    if applied.is_empty() {
        log::debug!("Database schema is up to date");
    } else {
        log::info!("Applied migrations: {}", applied.join(", "));
    }

    Ok(applied)
}

#[cfg(test)]
mod migration_tests {
    use super::*;
    use database::Db;

    #[test]
    fn migrations_apply_once() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let url = dir.path().join("migrate.db");
        let db = Db::connect_url(&url.to_string_lossy(), 1, 1000)?;
        let mut conn = db.get_conn()?;

        let first = migrate(&mut conn)?;
        assert_eq!(first.len(), 1);

        let second = migrate(&mut conn)?;
        assert!(second.is_empty());

        Ok(())
    }
}
