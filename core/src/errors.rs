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

use crate::service::ServiceError;
use log::warn;
use serde::Serialize;

pub const SESSION_EXPIRED_MESSAGE: &str =
    "Please log in again, sessions are only valid for one hour";
pub const RATE_LIMITED_MESSAGE: &str =
    "Too many requests to the Spotify API, please wait a little and try again";

/// What the user sees for a failure, and whether login must be offered again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub message: String,
    pub reveal_login: bool,
}

/// Maps a failure to its user-facing message. Generic failures show the
/// status code when there is one, otherwise the error text.
pub fn classify(error: &ServiceError) -> Classification {
    match error {
        ServiceError::Unauthorized => Classification {
            message: SESSION_EXPIRED_MESSAGE.to_string(),
            reveal_login: true,
        },
        ServiceError::RateLimited => Classification {
            message: RATE_LIMITED_MESSAGE.to_string(),
            reveal_login: false,
        },
        ServiceError::Service {
            status: Some(status),
            ..
        } => Classification {
            message: status.to_string(),
            reveal_login: false,
        },
        ServiceError::Service {
            status: None,
            message,
        } => Classification {
            message: message.clone(),
            reveal_login: false,
        },
    }
}

/// The shared error area plus the login affordance.
///
/// A shown error is cleared only by a later success.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StatusBoard {
    error: Option<String>,
    login_visible: bool,
}

impl StatusBoard {
    pub fn new(login_visible: bool) -> Self {
        Self {
            error: None,
            login_visible,
        }
    }

    pub fn succeed(&mut self) {
        self.error = None;
    }

    pub fn fail(&mut self, error: &ServiceError) -> Classification {
        let classification = classify(error);
        warn!("{} ({})", classification.message, error);

        if classification.reveal_login {
            self.login_visible = true;
        }
        self.error = Some(classification.message.clone());
        classification
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn login_visible(&self) -> bool {
        self.login_visible
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthorized_reveals_login() {
        let mut board = StatusBoard::new(false);
        let c = board.fail(&ServiceError::Unauthorized);

        assert!(c.reveal_login);
        assert!(board.login_visible());
        assert_eq!(board.error(), Some(SESSION_EXPIRED_MESSAGE));
    }

    #[test]
    fn test_rate_limit_keeps_login_hidden() {
        let mut board = StatusBoard::new(false);
        board.fail(&ServiceError::RateLimited);

        assert!(!board.login_visible());
        assert_eq!(board.error(), Some(RATE_LIMITED_MESSAGE));
    }

    #[test]
    fn test_generic_errors_pass_through() {
        assert_eq!(
            classify(&ServiceError::from_status(503, "unavailable")).message,
            "503"
        );
        assert_eq!(
            classify(&ServiceError::other("connection reset")).message,
            "connection reset"
        );
    }

    #[test]
    fn test_only_success_clears_error() {
        let mut board = StatusBoard::new(true);
        board.fail(&ServiceError::other("boom"));
        assert_eq!(board.error(), Some("boom"));

        board.fail(&ServiceError::from_status(500, "again"));
        assert_eq!(board.error(), Some("500"));

        board.succeed();
        assert_eq!(board.error(), None);
        // success does not hide the login affordance
        assert!(board.login_visible());
    }
}
