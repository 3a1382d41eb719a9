//! Layered settings: built-in defaults, then an optional `config.toml`, then `ATTENDANCE_*`
//! environment variables, then `DATABASE_URL` (which may come from a `.env` file).

use config::{Config, ConfigError, Environment, File};
use dotenvy::dotenv;
use serde::Deserialize;
use std::env;
use tracing::info;

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub server: ServerSettings,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct DatabaseSettings {
    /// Path of the SQLite database file. Created on first run.
    pub url: String,
    /// Whether an empty roster is filled with the sample students on startup.
    pub seed_sample_students: bool,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl ServerSettings {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Settings {
    /// Loads settings from `config.toml` in the working directory and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        dotenv().ok();
        Self::from_file("config")
    }

    /// Loads settings with `path` (extension optional) as the config file. A missing file is
    /// not an error.
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("database.url", "attendance.db")?
            .set_default("database.seed_sample_students", true)?
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 5000)?
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix("ATTENDANCE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        if let Ok(database_url) = env::var("DATABASE_URL") {
            info!("DATABASE_URL set, overriding configured database");
            builder = builder.set_override("database.url", database_url)?;
        }

        builder.build()?.try_deserialize()
    }
}
