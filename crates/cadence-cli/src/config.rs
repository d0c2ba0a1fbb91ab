use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;

use crate::timezone::detect_system_timezone;

#[derive(Deserialize, Debug)]
#[serde(default)]
pub struct Config {
    /// Path to the SQLite database file
    pub database_path: String,
    /// User's default timezone (IANA format); decides which calendar day
    /// "today" is when resolving occurrences
    pub default_timezone: String,
    /// How many occurrences `recur preview` shows by default
    pub preview_count: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: "cadence.db".to_string(),
            default_timezone: detect_system_timezone(),
            preview_count: 5,
        }
    }
}

impl Config {
    pub fn new() -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Toml::file("cadence.toml"))
            .merge(Env::prefixed("CADENCE_"))
            .extract()
    }
}
