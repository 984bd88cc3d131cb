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

//! Scriptable in-memory [`StreamingService`] for unit tests.

use crate::models::{Playback, PlaylistSummary, Track};
use crate::service::{ServiceError, ServiceResult, StreamingService};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

struct FakeState {
    playback: ServiceResult<Playback>,
    scripted: VecDeque<(Duration, ServiceResult<Playback>)>,
    playlists: Vec<PlaylistSummary>,
    members: HashMap<String, HashSet<String>>,
    listing_error: Option<ServiceError>,
    membership_error: Option<ServiceError>,
    mutation_error: Option<ServiceError>,
    subscribe_errors: HashMap<String, ServiceError>,
    subscribe_delay: Duration,
    mutation_delay: Duration,
    listing_delay: Duration,
    calls: HashMap<&'static str, usize>,
}

pub struct FakeService {
    state: Mutex<FakeState>,
}

impl FakeService {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(FakeState {
                playback: Ok(Playback::NothingPlaying),
                scripted: VecDeque::new(),
                playlists: Vec::new(),
                members: HashMap::new(),
                listing_error: None,
                membership_error: None,
                mutation_error: None,
                subscribe_errors: HashMap::new(),
                subscribe_delay: Duration::ZERO,
                mutation_delay: Duration::ZERO,
                listing_delay: Duration::ZERO,
                calls: HashMap::new(),
            }),
        }
    }

    pub fn playing(&self, track: &Track) {
        self.state.lock().unwrap().playback = Ok(Playback::Track(track.clone()));
    }

    pub fn nothing_playing(&self) {
        self.state.lock().unwrap().playback = Ok(Playback::NothingPlaying);
    }

    pub fn fail_playback(&self, error: ServiceError) {
        self.state.lock().unwrap().playback = Err(error);
    }

    /// Queues a one-shot playback response, answered after `delay`.
    pub fn script_playback(&self, delay: Duration, result: ServiceResult<Playback>) {
        self.state
            .lock()
            .unwrap()
            .scripted
            .push_back((delay, result));
    }

    pub fn with_playlists(&self, playlists: &[(&str, &str)]) {
        self.state.lock().unwrap().playlists = playlists
            .iter()
            .map(|(id, name)| PlaylistSummary {
                id: id.to_string(),
                name: name.to_string(),
            })
            .collect();
    }

    pub fn put(&self, playlist_id: &str, track_uri: &str) {
        self.state
            .lock()
            .unwrap()
            .members
            .entry(playlist_id.to_string())
            .or_default()
            .insert(track_uri.to_string());
    }

    pub fn contains(&self, playlist_id: &str, track_uri: &str) -> bool {
        self.state
            .lock()
            .unwrap()
            .members
            .get(playlist_id)
            .map_or(false, |m| m.contains(track_uri))
    }

    pub fn fail_listing(&self, error: Option<ServiceError>) {
        self.state.lock().unwrap().listing_error = error;
    }

    pub fn fail_membership(&self, error: Option<ServiceError>) {
        self.state.lock().unwrap().membership_error = error;
    }

    pub fn fail_mutations(&self, error: Option<ServiceError>) {
        self.state.lock().unwrap().mutation_error = error;
    }

    pub fn fail_subscribe(&self, playlist_id: &str, error: ServiceError) {
        self.state
            .lock()
            .unwrap()
            .subscribe_errors
            .insert(playlist_id.to_string(), error);
    }

    pub fn set_subscribe_delay(&self, delay: Duration) {
        self.state.lock().unwrap().subscribe_delay = delay;
    }

    pub fn set_mutation_delay(&self, delay: Duration) {
        self.state.lock().unwrap().mutation_delay = delay;
    }

    pub fn set_listing_delay(&self, delay: Duration) {
        self.state.lock().unwrap().listing_delay = delay;
    }

    pub fn calls(&self, op: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .calls
            .get(op)
            .copied()
            .unwrap_or(0)
    }

    fn record(&self, op: &'static str) {
        *self.state.lock().unwrap().calls.entry(op).or_default() += 1;
    }
}

async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

#[async_trait]
impl StreamingService for FakeService {
    async fn current_playback(&self) -> ServiceResult<Playback> {
        self.record("current_playback");
        let (delay, result) = {
            let mut state = self.state.lock().unwrap();
            match state.scripted.pop_front() {
                Some(next) => next,
                None => (Duration::ZERO, state.playback.clone()),
            }
        };
        pause(delay).await;
        result
    }

    async fn list_playlists(&self) -> ServiceResult<Vec<PlaylistSummary>> {
        self.record("list_playlists");
        let delay = self.state.lock().unwrap().listing_delay;
        pause(delay).await;
        let state = self.state.lock().unwrap();
        match &state.listing_error {
            Some(err) => Err(err.clone()),
            None => Ok(state.playlists.clone()),
        }
    }

    async fn is_track_in_playlist(&self, playlist_id: &str, track_uri: &str) -> ServiceResult<bool> {
        self.record("is_track_in_playlist");
        if let Some(err) = self.state.lock().unwrap().membership_error.clone() {
            return Err(err);
        }
        Ok(self.contains(playlist_id, track_uri))
    }

    async fn add_track_to_playlist(&self, playlist_id: &str, track_uri: &str) -> ServiceResult<()> {
        self.record("add_track_to_playlist");
        let (delay, error) = {
            let state = self.state.lock().unwrap();
            (state.mutation_delay, state.mutation_error.clone())
        };
        pause(delay).await;
        if let Some(err) = error {
            return Err(err);
        }
        self.put(playlist_id, track_uri);
        Ok(())
    }

    async fn remove_track_from_playlist(
        &self,
        playlist_id: &str,
        track_uri: &str,
    ) -> ServiceResult<()> {
        self.record("remove_track_from_playlist");
        let (delay, error) = {
            let state = self.state.lock().unwrap();
            (state.mutation_delay, state.mutation_error.clone())
        };
        pause(delay).await;
        if let Some(err) = error {
            return Err(err);
        }
        if let Some(members) = self.state.lock().unwrap().members.get_mut(playlist_id) {
            members.remove(track_uri);
        }
        Ok(())
    }

    async fn subscribe_playlist(&self, playlist_id: &str) -> ServiceResult<()> {
        self.record("subscribe_playlist");
        let (delay, error) = {
            let state = self.state.lock().unwrap();
            (
                state.subscribe_delay,
                state.subscribe_errors.get(playlist_id).cloned(),
            )
        };
        pause(delay).await;
        match error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn unsubscribe_playlist(&self, _playlist_id: &str) -> ServiceResult<()> {
        self.record("unsubscribe_playlist");
        Ok(())
    }
}
