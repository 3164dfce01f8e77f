// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

//! Contains the application settings.
//!
//! The application settings are set with a TOML config file. Settings specified in the config file
//! can be overwritten by environment variables. To do so, set an environment variable
//! with the prefix `EVREG_` followed by the field names you want to set. Nested fields are separated by two underscores `__`.
//! ```sh
//! EVREG_<field>__<field-of-field>...
//! ```
//!
//! # Example
//!
//! set the `database.url` field:
//! ```sh
//! EVREG_DATABASE__URL=/var/lib/evreg/evreg.db
//! ```
//!
//! So the field 'session.lifetime' would resolve to:
//! ```sh
//! EVREG_SESSION__LIFETIME=3600
//! ```
//!
//! # Note
//!
//! Fields set via environment variables do not affect the underlying config file.
//!
//! # Implementation Details:
//!
//! Every setting category implements [`Default`], the config file itself is optional.
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Deserializer};
use std::net::{IpAddr, Ipv4Addr};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub database: Database,
    #[serde(default)]
    pub http: Http,
    #[serde(default)]
    pub session: Session,
    #[serde(default)]
    pub bootstrap: Bootstrap,
    #[serde(default)]
    pub logging: Logging,
}

impl Settings {
    /// Creates a new Settings instance from the provided TOML file.
    /// Specific fields can be set or overwritten with environment variables (See module level docs for more details).
    pub fn load(file_name: &Path) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from(file_name).required(false))
            .add_source(
                Environment::with_prefix("EVREG")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Database {
    /// Path of the SQLite database file
    #[serde(default = "default_database_url")]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// How long a connection waits for a competing writer before giving up
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u32,
}

impl Default for Database {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

fn default_database_url() -> String {
    "evreg.db".into()
}

fn default_max_connections() -> u32 {
    10
}

fn default_busy_timeout_ms() -> u32 {
    5000
}

#[derive(Debug, Clone, Deserialize)]
pub struct Http {
    #[serde(default = "default_http_address")]
    pub address: IpAddr,
    #[serde(default = "default_http_port")]
    pub port: u16,
}

impl Default for Http {
    fn default() -> Self {
        Self {
            address: default_http_address(),
            port: default_http_port(),
        }
    }
}

const fn default_http_address() -> IpAddr {
    IpAddr::V4(Ipv4Addr::LOCALHOST)
}

const fn default_http_port() -> u16 {
    8000
}

/// Settings for the admin session cookie
#[derive(Debug, Clone, Deserialize)]
pub struct Session {
    /// How long an admin session stays valid, in seconds
    #[serde(
        deserialize_with = "duration_from_secs",
        default = "default_session_lifetime"
    )]
    pub lifetime: Duration,

    /// Only send the session cookie over https
    #[serde(default)]
    pub cookie_secure: bool,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            lifetime: default_session_lifetime(),
            cookie_secure: false,
        }
    }
}

fn default_session_lifetime() -> Duration {
    Duration::from_secs(8 * 60 * 60)
}

/// Data seeded into an empty database on startup
#[derive(Debug, Clone, Deserialize)]
pub struct Bootstrap {
    #[serde(default = "default_admin_username")]
    pub admin_username: String,
    #[serde(default = "default_admin_password")]
    pub admin_password: String,
    /// Create two sample events when no event exists
    #[serde(default = "default_sample_events")]
    pub sample_events: bool,
}

impl Default for Bootstrap {
    fn default() -> Self {
        Self {
            admin_username: default_admin_username(),
            admin_password: default_admin_password(),
            sample_events: default_sample_events(),
        }
    }
}

fn default_admin_username() -> String {
    "admin".into()
}

fn default_admin_password() -> String {
    "admin123".into()
}

const fn default_sample_events() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct Logging {
    #[serde(default = "default_directives")]
    pub default_directives: Vec<String>,
}

impl Default for Logging {
    fn default() -> Self {
        Self {
            default_directives: default_directives(),
        }
    }
}

fn default_directives() -> Vec<String> {
    // Disable spamming noninformative traces
    vec![
        "evreg=INFO".into(),
        "actix_server=WARN".into(),
        "mio=ERROR".into(),
    ]
}

fn duration_from_secs<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let duration: u64 = Deserialize::deserialize(deserializer)?;

    Ok(Duration::from_secs(duration))
}

#[cfg(test)]
mod test {
    use super::Settings;
    use config::ConfigError;
    use pretty_assertions::assert_eq;
    use std::path::Path;
    use std::time::Duration;

    #[test]
    fn example_toml() -> Result<(), ConfigError> {
        let settings = Settings::load(Path::new("../../extra/example.toml"))?;

        assert_eq!(settings.database.url, "evreg.db");
        assert_eq!(settings.http.port, 8000);
        assert_eq!(settings.session.lifetime, Duration::from_secs(28800));
        assert_eq!(settings.bootstrap.admin_username, "admin");
        Ok(())
    }

    #[test]
    fn missing_file_uses_defaults() -> Result<(), ConfigError> {
        let settings = Settings::load(Path::new("does/not/exist.toml"))?;

        assert_eq!(settings.database.max_connections, 10);
        assert_eq!(settings.database.busy_timeout_ms, 5000);
        assert!(!settings.session.cookie_secure);
        assert!(settings.bootstrap.sample_events);
        Ok(())
    }
}
