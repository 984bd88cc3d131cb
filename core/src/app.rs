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

use crate::errors::StatusBoard;
use crate::models::{CatalogEntry, Playback, Track, TrackedPlaylist};
use crate::service::{ServiceError, ServiceResult, StreamingService};
use crate::tracker::{check_membership, PlaylistTracker};
use futures::future::join_all;
use log::{debug, info};
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Enabled/visible state of the interactive controls.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Controls {
    pub update_disabled: bool,
    pub browse_disabled: bool,
    pub loading: bool,
    pub catalog_visible: bool,
    /// Playlists whose add/remove control is disabled by an in-flight edit.
    pub pending: BTreeSet<String>,
}

/// Everything a front end needs to draw the screen.
#[derive(Debug, Clone, Serialize)]
pub struct View {
    pub login_visible: bool,
    pub error: Option<String>,
    pub track_context: Option<String>,
    pub current_track: Option<Track>,
    pub catalog: Option<Vec<CatalogEntry>>,
    pub tracked: Vec<TrackedPlaylist>,
    pub controls: Controls,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edit {
    Add,
    Remove,
}

struct AppState {
    status: StatusBoard,
    current_track: Option<Track>,
    catalog: Option<Vec<CatalogEntry>>,
    tracker: PlaylistTracker,
    controls: Controls,
    catalog_fetching: bool,
}

/// Owns the session state and runs the user-facing operations.
///
/// The state lock is never held across a network call, so a poll tick, a
/// manual update and an add/remove may all be in flight at once. Every
/// operation settles into the shared status board: success clears the error,
/// failure shows exactly one classified message.
pub struct TrackerApp<S> {
    service: Arc<S>,
    state: Mutex<AppState>,
}

impl<S: StreamingService> TrackerApp<S> {
    pub fn new(service: Arc<S>, login_visible: bool) -> Self {
        Self {
            service,
            state: Mutex::new(AppState {
                status: StatusBoard::new(login_visible),
                current_track: None,
                catalog: None,
                tracker: PlaylistTracker::new(),
                controls: Controls::default(),
                catalog_fetching: false,
            }),
        }
    }

    pub fn service(&self) -> &Arc<S> {
        &self.service
    }

    pub async fn view(&self) -> View {
        let state = self.state.lock().await;
        View {
            login_visible: state.status.login_visible(),
            error: state.status.error().map(str::to_string),
            track_context: state.current_track.as_ref().map(|t| t.to_string()),
            current_track: state.current_track.clone(),
            catalog: state.catalog.clone(),
            tracked: state.tracker.playlists().to_vec(),
            controls: state.controls.clone(),
        }
    }

    async fn settle<T>(&self, result: ServiceResult<T>) -> ServiceResult<T> {
        let mut state = self.state.lock().await;
        match &result {
            Ok(_) => state.status.succeed(),
            Err(err) => {
                state.status.fail(err);
            }
        }
        result
    }

    /// One poll-and-reconcile cycle.
    pub async fn update(&self) -> ServiceResult<Playback> {
        let result = self.poll_and_reconcile().await;
        self.settle(result).await
    }

    async fn poll_and_reconcile(&self) -> ServiceResult<Playback> {
        let playback = self.service.current_playback().await?;

        match &playback {
            Playback::Track(track) => {
                {
                    let mut state = self.state.lock().await;
                    let changed = state
                        .current_track
                        .as_ref()
                        .map_or(true, |current| current.uri != track.uri);
                    if changed {
                        info!("Now playing: {}", track);
                        state.current_track = Some(track.clone());
                    }
                }
                // Membership may change without the track changing, so this
                // runs on every tick.
                self.reconcile(track).await?;
            }
            Playback::NothingPlaying => {
                let mut state = self.state.lock().await;
                if state.current_track.take().is_some() {
                    info!("Playback stopped");
                }
                state.tracker.clear_flags();
            }
        }

        Ok(playback)
    }

    /// Recomputes every tracked playlist's flag for `track`.
    ///
    /// Results for a track that is no longer displayed (a slower request
    /// finishing after a newer one) are dropped.
    async fn reconcile(&self, track: &Track) -> ServiceResult<()> {
        let ids = self.state.lock().await.tracker.ids();
        let found = check_membership(self.service.as_ref(), &ids, track).await?;

        let mut state = self.state.lock().await;
        let displayed = state.current_track.as_ref().map(|t| t.uri.as_str());
        if displayed != Some(track.uri.as_str()) {
            debug!("Dropping membership for {}, no longer displayed", track.uri);
            return Ok(());
        }
        state.tracker.apply_membership(&found);
        Ok(())
    }

    /// Toggles the catalog. The catalog is fetched once per session; tracked
    /// playlists are then subscribed concurrently while update and browse
    /// are disabled. Browsing while the first fetch is in flight is ignored.
    pub async fn browse_playlists(&self) -> ServiceResult<()> {
        let needs_fetch = {
            let mut state = self.state.lock().await;
            if state.controls.browse_disabled {
                debug!("Browse ignored, a bulk subscribe is still running");
                return Ok(());
            }
            if state.catalog_fetching {
                debug!("Browse ignored, the catalog is still loading");
                return Ok(());
            }
            state.controls.catalog_visible = !state.controls.catalog_visible;
            let needs_fetch = state.catalog.is_none();
            state.catalog_fetching = needs_fetch;
            needs_fetch
        };

        if needs_fetch {
            let fetched = self.service.list_playlists().await;
            self.state.lock().await.catalog_fetching = false;

            match fetched {
                Ok(playlists) => {
                    let mut state = self.state.lock().await;
                    let catalog: Vec<CatalogEntry> = playlists
                        .into_iter()
                        .map(|pl| CatalogEntry {
                            selected: state.tracker.contains(&pl.id),
                            id: pl.id,
                            name: pl.name,
                        })
                        .collect();
                    state.catalog = Some(catalog);
                    state.status.succeed();
                }
                Err(err) => {
                    let mut state = self.state.lock().await;
                    state.status.fail(&err);
                    state.controls.catalog_visible = false;
                    return Err(err);
                }
            }
        }

        self.subscribe_all().await
    }

    async fn subscribe_all(&self) -> ServiceResult<()> {
        let ids = {
            let mut state = self.state.lock().await;
            if state.tracker.is_empty() {
                return Ok(());
            }
            state.controls.update_disabled = true;
            state.controls.browse_disabled = true;
            state.controls.loading = true;
            state.tracker.ids()
        };

        debug!("Subscribing {} tracked playlists", ids.len());
        let results = join_all(ids.iter().map(|id| self.service.subscribe_playlist(id))).await;
        let outcome = results.into_iter().collect::<ServiceResult<Vec<()>>>().map(|_| ());

        {
            let mut state = self.state.lock().await;
            state.controls.update_disabled = false;
            state.controls.browse_disabled = false;
            state.controls.loading = false;
        }

        self.settle(outcome).await
    }

    /// Toggles a catalog entry in or out of the tracked set. Returns the new
    /// selection state.
    pub async fn select_playlist(&self, playlist_id: &str) -> ServiceResult<bool> {
        let selection = {
            let mut state = self.state.lock().await;
            let entry = state
                .catalog
                .as_mut()
                .and_then(|catalog| catalog.iter_mut().find(|e| e.id == playlist_id));

            match entry {
                Some(entry) => {
                    entry.selected = !entry.selected;
                    let (selected, name) = (entry.selected, entry.name.clone());
                    if selected {
                        state.tracker.track(playlist_id, &name);
                    } else {
                        state.tracker.untrack(playlist_id);
                        state.controls.pending.remove(playlist_id);
                    }
                    Ok(selected)
                }
                None => Err(ServiceError::other(format!(
                    "Unknown playlist: {}",
                    playlist_id
                ))),
            }
        };

        let result = match selection {
            Ok(true) => self.service.subscribe_playlist(playlist_id).await.map(|_| true),
            Ok(false) => self
                .service
                .unsubscribe_playlist(playlist_id)
                .await
                .map(|_| false),
            Err(err) => Err(err),
        };
        self.settle(result).await
    }

    pub async fn add_current_track(&self, playlist_id: &str) -> ServiceResult<bool> {
        self.edit_current_track(playlist_id, Edit::Add).await
    }

    pub async fn remove_current_track(&self, playlist_id: &str) -> ServiceResult<bool> {
        self.edit_current_track(playlist_id, Edit::Remove).await
    }

    /// Adds or removes the displayed track, then runs a full update so the
    /// flag converges. Returns `false` when the playlist's control is already
    /// disabled by an earlier edit.
    pub async fn edit_current_track(&self, playlist_id: &str, edit: Edit) -> ServiceResult<bool> {
        let prepared = {
            let mut state = self.state.lock().await;
            if !state.tracker.contains(playlist_id) {
                Err(ServiceError::other(format!(
                    "Playlist {} is not tracked",
                    playlist_id
                )))
            } else if state.controls.pending.contains(playlist_id) {
                Ok(None)
            } else {
                match state.current_track.clone() {
                    Some(track) => {
                        state.controls.pending.insert(playlist_id.to_string());
                        Ok(Some(track))
                    }
                    None => Err(ServiceError::other("Nothing is playing")),
                }
            }
        };

        let track = match prepared {
            Ok(Some(track)) => track,
            Ok(None) => {
                debug!("{:?} on {} already in flight", edit, playlist_id);
                return Ok(false);
            }
            Err(err) => return self.settle(Err(err)).await,
        };

        let mutation = match edit {
            Edit::Add => {
                self.service
                    .add_track_to_playlist(playlist_id, &track.uri)
                    .await
            }
            Edit::Remove => {
                self.service
                    .remove_track_from_playlist(playlist_id, &track.uri)
                    .await
            }
        };

        let outcome = match mutation {
            Ok(()) => self.update().await.map(|_| true),
            Err(err) => self.settle(Err(err)).await,
        };

        self.state.lock().await.controls.pending.remove(playlist_id);
        outcome
    }
}
