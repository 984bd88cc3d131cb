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

pub mod app;
pub mod auth;
pub mod config;
pub mod errors;
pub mod models;
pub mod poller;
pub mod service;
pub mod tracker;

#[cfg(test)]
pub(crate) mod testing;

// Re-export key items for convenience
pub use app::{TrackerApp, View};
pub use auth::{authorize_url, get_spotify_client, Session};
pub use config::TrackerConfig;
pub use models::{Playback, Track, TrackedPlaylist};
pub use poller::{PollerState, TrackPoller};
pub use service::{ServiceError, SpotifyService, StreamingService};
