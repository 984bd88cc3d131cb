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

use crate::models::{Track, TrackedPlaylist};
use crate::service::{ServiceResult, StreamingService};
use futures::future::join_all;
use log::debug;
use std::collections::HashSet;

/// Ordered set of tracked playlists, unique by id.
#[derive(Debug, Default, Clone)]
pub struct PlaylistTracker {
    playlists: Vec<TrackedPlaylist>,
}

impl PlaylistTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the playlist unflagged. Returns `false` if it was already tracked.
    pub fn track(&mut self, id: &str, name: &str) -> bool {
        if self.contains(id) {
            debug!("Playlist {} already tracked", id);
            return false;
        }
        self.playlists.push(TrackedPlaylist::new(id, name));
        true
    }

    /// Returns `false` if the playlist was not tracked.
    pub fn untrack(&mut self, id: &str) -> bool {
        let before = self.playlists.len();
        self.playlists.retain(|pl| pl.id != id);
        self.playlists.len() != before
    }

    pub fn contains(&self, id: &str) -> bool {
        self.playlists.iter().any(|pl| pl.id == id)
    }

    pub fn get(&self, id: &str) -> Option<&TrackedPlaylist> {
        self.playlists.iter().find(|pl| pl.id == id)
    }

    pub fn ids(&self) -> Vec<String> {
        self.playlists.iter().map(|pl| pl.id.clone()).collect()
    }

    pub fn playlists(&self) -> &[TrackedPlaylist] {
        &self.playlists
    }

    pub fn len(&self) -> usize {
        self.playlists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.playlists.is_empty()
    }

    /// Resets every flag, then marks the playlists in `found`.
    pub fn apply_membership(&mut self, found: &HashSet<String>) {
        for pl in &mut self.playlists {
            pl.contains_current_track = false;
        }
        for pl in &mut self.playlists {
            if found.contains(&pl.id) {
                pl.contains_current_track = true;
            }
        }
    }

    pub fn clear_flags(&mut self) {
        self.apply_membership(&HashSet::new());
    }
}

/// Asks the service, one request per playlist, which of `playlist_ids`
/// contain `track`. All checks run to completion; the first failure wins.
pub async fn check_membership<S: StreamingService + ?Sized>(
    service: &S,
    playlist_ids: &[String],
    track: &Track,
) -> ServiceResult<HashSet<String>> {
    let checks = playlist_ids.iter().map(|id| async move {
        service
            .is_track_in_playlist(id, &track.uri)
            .await
            .map(|found| (id, found))
    });

    let mut found = HashSet::new();
    for result in join_all(checks).await {
        let (id, contained) = result?;
        if contained {
            found.insert(id.clone());
        }
    }

    debug!(
        "'{}' found in {} of {} tracked playlists",
        track.name,
        found.len(),
        playlist_ids.len()
    );
    Ok(found)
}
