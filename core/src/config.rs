/*
    playlist-tracker-rs | Track the playing Spotify song across your playlists.
    Copyright (C) 2025  Israel Alberto Roldan Vega

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU Affero General Public License as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.

    This program is distributed in the hope that it will be useful,
    but WITHOUT ANY WARRANTY; without even the implied warranty of
    MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
    GNU Affero General Public License for more details.

    You should have received a copy of the GNU Affero General Public License
    along with this program.  If not, see <https://www.gnu.org/licenses/>.
*/

use rspotify::{Credentials, OAuth};
use std::env;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

pub const POLL_INTERVAL_VAR: &str = "TRACKER_POLL_INTERVAL_MS";
pub const SHOW_DIALOG_VAR: &str = "TRACKER_SHOW_DIALOG";

/// Default period between playback polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);

// - playlist-read-private / playlist-modify-*: browse and edit the user's playlists.
// - user-read-playback-state / user-modify-playback-state: the playing track.
// - user-library-*: saved tracks.
// - user-read-private: profile (market) information.
pub const SCOPES: [&str; 8] = [
    "playlist-modify-public",
    "user-read-playback-state",
    "playlist-read-private",
    "playlist-modify-private",
    "user-modify-playback-state",
    "user-library-read",
    "user-library-modify",
    "user-read-private",
];

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing {0}")]
    Missing(&'static str),
    #[error("Invalid value for {name}: '{value}'")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerConfig {
    pub client_id: String,
    pub redirect_uri: String,
    pub scopes: Vec<String>,
    pub show_dialog: bool,
    pub poll_interval: Duration,
}

impl TrackerConfig {
    pub fn new(client_id: impl Into<String>, redirect_uri: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            redirect_uri: redirect_uri.into(),
            scopes: SCOPES.iter().map(|s| s.to_string()).collect(),
            show_dialog: false,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Reads the app registration the same way `rspotify` does
    /// (`RSPOTIFY_CLIENT_ID`, `RSPOTIFY_REDIRECT_URI`, `.env` honoured), plus
    /// the tracker's own optional knobs.
    pub fn from_env() -> Result<Self, ConfigError> {
        // The implicit grant has no client secret, only the id is needed.
        let creds = Credentials::from_env().ok_or(ConfigError::Missing("RSPOTIFY_CLIENT_ID"))?;
        let oauth = OAuth::from_env(SCOPES.iter().map(|s| s.to_string()).collect())
            .ok_or(ConfigError::Missing("RSPOTIFY_REDIRECT_URI"))?;

        let mut config = Self::new(creds.id, oauth.redirect_uri);

        if let Some(ms) = parse_var::<u64>(POLL_INTERVAL_VAR, env::var(POLL_INTERVAL_VAR).ok())? {
            config.poll_interval = poll_interval_from_millis(ms)?;
        }
        if let Some(show) = parse_flag(SHOW_DIALOG_VAR, env::var(SHOW_DIALOG_VAR).ok())? {
            config.show_dialog = show;
        }

        Ok(config)
    }
}

fn poll_interval_from_millis(ms: u64) -> Result<Duration, ConfigError> {
    if ms == 0 {
        return Err(ConfigError::Invalid {
            name: POLL_INTERVAL_VAR,
            value: ms.to_string(),
        });
    }
    Ok(Duration::from_millis(ms))
}

fn parse_var<T: FromStr>(name: &'static str, raw: Option<String>) -> Result<Option<T>, ConfigError> {
    match raw {
        None => Ok(None),
        Some(value) if value.trim().is_empty() => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { name, value }),
    }
}

fn parse_flag(name: &'static str, raw: Option<String>) -> Result<Option<bool>, ConfigError> {
    match raw.as_deref().map(|v| v.trim().to_ascii_lowercase()) {
        None => Ok(None),
        Some(v) if v.is_empty() => Ok(None),
        Some(v) if matches!(v.as_str(), "1" | "true" | "yes") => Ok(Some(true)),
        Some(v) if matches!(v.as_str(), "0" | "false" | "no") => Ok(Some(false)),
        Some(_) => Err(ConfigError::Invalid {
            name,
            value: raw.unwrap_or_default(),
        }),
    }
}
