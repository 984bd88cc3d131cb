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

use crate::config::TrackerConfig;
use chrono::{Duration, Utc};
use rspotify::{AuthCodeSpotify, Config, Credentials, OAuth, Token};
use thiserror::Error;
use url::{form_urlencoded, Url};

pub const AUTHORIZE_URL: &str = "https://accounts.spotify.com/authorize";

/// Lifetime assumed when the redirect does not say (`expires_in`).
const DEFAULT_EXPIRES_IN_SECS: i64 = 3600;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("No access token in the redirect URL, please log in")]
    MissingToken,
    #[error("Invalid redirect URL: {0}")]
    InvalidRedirect(#[from] url::ParseError),
}

/// Bearer credential recovered from the implicit-grant redirect.
///
/// There is no refresh token in this flow: once the credential expires the
/// only way forward is a new login redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    credential: Option<String>,
    expires_in_secs: i64,
    fragment_present: bool,
}

impl Session {
    pub fn anonymous() -> Self {
        Self {
            credential: None,
            expires_in_secs: DEFAULT_EXPIRES_IN_SECS,
            fragment_present: false,
        }
    }

    /// Parses `#access_token=...&token_type=Bearer&expires_in=3600` (leading `#` optional).
    pub fn from_fragment(fragment: &str) -> Self {
        let fragment = fragment.trim();
        let body = fragment.strip_prefix('#').unwrap_or(fragment);

        let mut session = Self::anonymous();
        session.fragment_present = !body.is_empty();

        for (key, value) in form_urlencoded::parse(body.as_bytes()) {
            match key.as_ref() {
                "access_token" if !value.is_empty() => {
                    session.credential = Some(value.into_owned());
                }
                "expires_in" => {
                    if let Ok(secs) = value.parse::<i64>() {
                        if secs > 0 {
                            session.expires_in_secs = secs;
                        }
                    }
                }
                _ => {}
            }
        }

        session
    }

    /// Same as [`Session::from_fragment`] for a full pasted redirect URL.
    pub fn from_redirect_url(redirect: &str) -> Result<Self, AuthError> {
        let url = Url::parse(redirect.trim())?;
        Ok(Self::from_fragment(url.fragment().unwrap_or("")))
    }

    pub fn credential(&self) -> Option<&str> {
        self.credential.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.credential.is_some()
    }

    pub fn expires_in_secs(&self) -> i64 {
        self.expires_in_secs
    }

    /// Any fragment at all hides the login affordance. The token itself is
    /// only validated by the first API call.
    pub fn login_visible(&self) -> bool {
        !self.fragment_present
    }
}

/// Builds the implicit-grant (`response_type=token`) authorization URL.
pub fn authorize_url(config: &TrackerConfig) -> String {
    let mut scopes = config.scopes.clone();
    scopes.sort();
    scopes.dedup();

    format!(
        "{}?client_id={}&response_type=token&redirect_uri={}&scope={}&show_dialog={}",
        AUTHORIZE_URL,
        urlencoding::encode(&config.client_id),
        urlencoding::encode(&config.redirect_uri),
        urlencoding::encode(&scopes.join(" ")),
        config.show_dialog
    )
}

/// Client configuration for an implicit-grant token.
///
/// Refreshing stays off: there is no refresh token, and rspotify would
/// otherwise drop the expired token and fail locally instead of letting
/// Spotify answer 401.
fn client_config() -> Config {
    Config {
        token_cached: false,
        token_refreshing: false,
        ..Default::default()
    }
}

/// Wraps the session credential in a `rspotify` client.
pub fn get_spotify_client(session: &Session) -> Result<AuthCodeSpotify, AuthError> {
    client_with_config(session, client_config())
}

fn client_with_config(session: &Session, config: Config) -> Result<AuthCodeSpotify, AuthError> {
    let access_token = session.credential().ok_or(AuthError::MissingToken)?;
    let expires_in = Duration::seconds(session.expires_in_secs());

    let token = Token {
        access_token: access_token.to_string(),
        expires_in,
        expires_at: Some(Utc::now() + expires_in),
        ..Default::default()
    };

    Ok(AuthCodeSpotify::from_token_with_config(
        token,
        Credentials::default(),
        OAuth::default(),
        config,
    ))
}
