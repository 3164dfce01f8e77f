// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

use crate::services::admins::Authenticator;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use database::Db;
use shared::settings::Settings;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(name = "evreg")]
pub struct Args {
    #[arg(
        short,
        long,
        default_value = "config.toml",
        help = "Specify path to configuration file"
    )]
    pub config: PathBuf,

    #[command(subcommand)]
    cmd: Option<SubCommand>,
}

#[derive(Subcommand, Debug, Clone)]
enum SubCommand {
    /// Migrate the db. This is done automatically during start of the server,
    /// but can be done without starting the server using this command.
    MigrateDb,
    /// Create an admin or reset the password of an existing one
    CreateAdmin {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
    },
}

impl Args {
    /// Returns true if we want to startup the server after we finished the cli part
    pub fn server_should_start(&self) -> bool {
        self.cmd.is_none()
    }
}

/// Parses the CLI-Arguments into [`Args`]
pub fn parse_args() -> Args {
    Args::parse()
}

/// Runs the cli command, if one was given
pub async fn run_command(args: &Args, settings: &Settings) -> Result<()> {
    let Some(sub_command) = args.cmd.clone() else {
        return Ok(());
    };

    let db = Db::connect(&settings.database).context("Failed to connect to database")?;

    match sub_command {
        SubCommand::MigrateDb => {
            let applied = crate::block(move || -> Result<Vec<String>> {
                let mut conn = db.get_conn()?;

                db_storage::migrations::migrate(&mut conn)
            })
            .await?
            .context("Failed to migrate database")?;

            println!("Applied {} migration(s)", applied.len());
        }
        SubCommand::CreateAdmin { username, password } => {
            let admin = crate::block(move || -> Result<_> {
                let mut conn = db.get_conn()?;

                db_storage::migrations::migrate(&mut conn)?;

                let admin = Authenticator::new()?.set_credentials(&mut conn, &username, &password)?;

                Ok(admin)
            })
            .await?
            .context("Failed to create admin")?;

            println!("Admin `{}` is ready", admin.username);
        }
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Args::command().debug_assert();
    }

    #[test]
    fn create_admin_does_not_start_server() {
        let args = Args::try_parse_from([
            "evreg",
            "--config",
            "evreg.toml",
            "create-admin",
            "--username",
            "root",
            "--password",
            "secret",
        ])
        .unwrap();

        assert_eq!(args.config, PathBuf::from("evreg.toml"));
        assert!(!args.server_should_start());
    }

    #[test]
    fn default_config_starts_server() {
        let args = Args::try_parse_from(["evreg"]).unwrap();

        assert_eq!(args.config, PathBuf::from("config.toml"));
        assert!(args.server_should_start());
    }
}
