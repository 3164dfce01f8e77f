// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

//! Core library of the *evreg* event registration server
//!
//! # Example
//!
//! ```no_run
//! use evreg_server::Controller;
//! use anyhow::Result;
//!
//! #[actix_web::main]
//! async fn main()  {
//!     evreg_server::try_or_exit(run()).await;
//! }
//!
//! async fn run() -> Result<()> {
//!    if let Some(controller) = Controller::create("evreg Event Registration").await? {
//!         controller.run().await?;
//!     }
//!
//!     Ok(())
//! }
//! ```

use crate::api::AppData;
use crate::services::admins::Authenticator;
use crate::sessions::SessionStore;
use crate::templates::Templates;
use crate::trace::ReducedSpanBuilder;
use actix_web::web::{self, Data};
use actix_web::{App, HttpServer};
use anyhow::{Context, Result};
use database::Db;
use shared::settings::Settings;
use std::sync::Arc;
use tokio::signal::ctrl_c;
use tracing_actix_web::TracingLogger;

pub mod api;
pub mod bootstrap;
mod cli;
pub mod flash;
pub mod services;
pub mod sessions;
pub mod templates;
mod trace;

#[derive(Debug, thiserror::Error)]
#[error("Blocking thread has panicked")]
pub struct BlockingError;

/// Custom version of `actix_web::web::block` which retains the current tracing span
pub async fn block<F, R>(f: F) -> Result<R, BlockingError>
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    let span = tracing::Span::current();

    let fut = actix_rt::task::spawn_blocking(move || span.in_scope(f));

    fut.await.map_err(|_| BlockingError)
}

/// Wrapper of the main function. Correctly outputs the error to the logging utility or stderr.
pub async fn try_or_exit<T, F>(f: F) -> T
where
    F: std::future::Future<Output = Result<T>>,
{
    match f.await {
        Ok(ok) => ok,
        Err(err) => {
            if log::log_enabled!(log::Level::Error) {
                log::error!("Crashed with error: {:?}", err);
            } else {
                eprintln!("Crashed with error: {err:?}");
            }

            std::process::exit(-1);
        }
    }
}

/// Controller struct representation containing everything required to serve the application
pub struct Controller {
    /// Settings loaded on [Controller::create]
    pub startup_settings: Arc<Settings>,

    /// Data shared with every request handler
    data: AppData,
}

impl Controller {
    /// Tries to create a controller from CLI arguments and then the settings.
    ///
    /// This can return Ok(None) which would indicate that the controller executed a CLI
    /// subprogram (e.g. `migrate-db`) and must now exit.
    ///
    /// Otherwise it will return itself which can be run using [`Controller::run`]
    pub async fn create(program_name: &str) -> Result<Option<Self>> {
        let args = cli::parse_args();

        let settings = Settings::load(&args.config)
            .with_context(|| format!("Failed to load settings from {:?}", args.config))?;

        trace::init(&settings.logging)?;

        // Some args run commands by them self and thus should exit here
        if !args.server_should_start() {
            cli::run_command(&args, &settings).await?;
            return Ok(None);
        }

        log::info!("Starting {}", program_name);

        let controller = Self::init(settings).await?;

        Ok(Some(controller))
    }

    #[tracing::instrument(err, skip(settings))]
    async fn init(settings: Settings) -> Result<Self> {
        let settings = Arc::new(settings);

        let db = Arc::new(Db::connect(&settings.database).context("Failed to connect to database")?);

        let authenticator =
            Arc::new(Authenticator::new().context("Failed to initialize password hashing")?);

        {
            let db = db.clone();
            let authenticator = authenticator.clone();
            let bootstrap = settings.bootstrap.clone();

            block(move || -> Result<()> {
                let mut conn = db.get_conn()?;

                bootstrap::run(&mut conn, &bootstrap, &authenticator)
            })
            .await?
            .context("Failed to prepare database")?;
        }

        let sessions = SessionStore::new(settings.session.lifetime, settings.session.cookie_secure);
        let templates = Templates::new().context("Failed to compile templates")?;

        Ok(Self {
            startup_settings: settings,
            data: AppData {
                db: Data::from(db),
                sessions: Data::new(sessions),
                templates: Data::new(templates),
                authenticator: Data::from(authenticator),
            },
        })
    }

    /// Runs the controller until a shutdown is requested (e.g. SIGTERM).
    pub async fn run(self) -> Result<()> {
        let data = self.data;

        let http_server = HttpServer::new(move || {
            let data = data.clone();

            App::new()
                .wrap(TracingLogger::<ReducedSpanBuilder>::new())
                .configure(|cfg| api::configure(cfg, &data))
                .default_service(web::to(api::not_found))
        });

        let address = (
            self.startup_settings.http.address,
            self.startup_settings.http.port,
        );

        let http_server = http_server.bind(address).with_context(|| {
            format!("Failed to bind http server to {}:{}", address.0, address.1)
        })?;

        log::info!("Startup finished, listening on {}:{}", address.0, address.1);

        let http_server = http_server.disable_signals().run();
        let http_server_handle = http_server.handle();

        actix_rt::spawn(http_server);

        ctrl_c()
            .await
            .context("Failed to register termination signal handler")?;

        log::info!("Got termination signal, exiting");

        http_server_handle.stop(true).await;

        log::info!("Server stopped, goodbye!");

        Ok(())
    }
}
