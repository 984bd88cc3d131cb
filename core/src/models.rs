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

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artist {
    pub name: String,
}

/// A track reported by the playback endpoint. `uri` is the identity used for
/// change detection and membership checks (`spotify:track:...`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub uri: String,
    pub name: String,
    pub artists: Vec<Artist>,
}

impl Track {
    pub fn new(uri: impl Into<String>, name: impl Into<String>, artists: &[&str]) -> Self {
        Self {
            uri: uri.into(),
            name: name.into(),
            artists: artists
                .iter()
                .map(|name| Artist {
                    name: name.to_string(),
                })
                .collect(),
        }
    }
}

/// Renders the "track context" line, e.g. `Song by Artist A, Artist B`.
impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.artists.is_empty() {
            return write!(f, "{}", self.name);
        }

        let artists = self
            .artists
            .iter()
            .map(|a| a.name.as_str())
            .collect::<Vec<&str>>()
            .join(", ");

        write!(f, "{} by {}", self.name, artists)
    }
}

/// Result of a playback poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Playback {
    Track(Track),
    /// Nothing is playing, or the playing item cannot be tracked (episodes, local files).
    NothingPlaying,
}

impl Playback {
    pub fn track(&self) -> Option<&Track> {
        match self {
            Playback::Track(track) => Some(track),
            Playback::NothingPlaying => None,
        }
    }
}

/// Summary of a playlist for listing purposes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistSummary {
    pub id: String,
    pub name: String,
}

/// A row of the playlist catalog. `selected` mirrors tracked-set membership.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: String,
    pub name: String,
    pub selected: bool,
}

/// A playlist the user monitors for the current track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedPlaylist {
    pub id: String,
    pub name: String,
    pub contains_current_track: bool,
}

impl TrackedPlaylist {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            contains_current_track: false,
        }
    }
}
