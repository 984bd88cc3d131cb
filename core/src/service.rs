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

use crate::models::{Artist, Playback, PlaylistSummary, Track};
use async_trait::async_trait;
use log::debug;
use rspotify::{
    http::HttpError,
    model::{PlayableId, PlayableItem, PlaylistId, TrackId},
    prelude::*,
    AuthCodeSpotify, ClientError,
};
use std::sync::Arc;
use thiserror::Error;

/// Single page size used for the playlist catalog.
pub const PLAYLIST_PAGE_LIMIT: u32 = 50;

/// Page size used while scanning playlist items for membership.
const ITEMS_PAGE_LIMIT: u32 = 100;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("Spotify rejected the access token (401)")]
    Unauthorized,
    #[error("Too many requests to the Spotify API (429)")]
    RateLimited,
    #[error("Spotify API error: {message}")]
    Service {
        status: Option<u16>,
        message: String,
    },
}

impl ServiceError {
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        match status {
            401 => ServiceError::Unauthorized,
            429 => ServiceError::RateLimited,
            _ => ServiceError::Service {
                status: Some(status),
                message: message.into(),
            },
        }
    }

    /// A failure that carries no HTTP status (transport, parsing, bad input).
    pub fn other(message: impl Into<String>) -> Self {
        ServiceError::Service {
            status: None,
            message: message.into(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ServiceError::Unauthorized => Some(401),
            ServiceError::RateLimited => Some(429),
            ServiceError::Service { status, .. } => *status,
        }
    }
}

impl From<ClientError> for ServiceError {
    fn from(err: ClientError) -> Self {
        // rspotify reports a missing token locally, before any request.
        if let ClientError::InvalidToken = err {
            return ServiceError::Unauthorized;
        }
        if let ClientError::Http(http) = &err {
            if let HttpError::StatusCode(response) = &**http {
                return ServiceError::from_status(response.status().as_u16(), err.to_string());
            }
        }
        ServiceError::other(err.to_string())
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// The remote operations the tracker needs. Every call hits the network;
/// nothing is cached or coalesced.
#[async_trait]
pub trait StreamingService: Send + Sync {
    async fn current_playback(&self) -> ServiceResult<Playback>;

    /// Single page of the current user's playlists.
    async fn list_playlists(&self) -> ServiceResult<Vec<PlaylistSummary>>;

    async fn is_track_in_playlist(&self, playlist_id: &str, track_uri: &str)
        -> ServiceResult<bool>;

    async fn add_track_to_playlist(&self, playlist_id: &str, track_uri: &str)
        -> ServiceResult<()>;

    async fn remove_track_from_playlist(
        &self,
        playlist_id: &str,
        track_uri: &str,
    ) -> ServiceResult<()>;

    /// Registers a playlist for membership tracking.
    async fn subscribe_playlist(&self, playlist_id: &str) -> ServiceResult<()>;

    async fn unsubscribe_playlist(&self, playlist_id: &str) -> ServiceResult<()>;
}

/// [`StreamingService`] backed by the Spotify Web API through `rspotify`.
pub struct SpotifyService {
    spotify: Arc<AuthCodeSpotify>,
}

impl SpotifyService {
    pub fn new(spotify: AuthCodeSpotify) -> Self {
        Self {
            spotify: Arc::new(spotify),
        }
    }
}

fn playlist_id(id: &str) -> ServiceResult<PlaylistId<'_>> {
    PlaylistId::from_id_or_uri(id)
        .map_err(|_| ServiceError::other(format!("Invalid Playlist ID: {}", id)))
}

fn track_id(uri: &str) -> ServiceResult<TrackId<'_>> {
    TrackId::from_id_or_uri(uri)
        .map_err(|_| ServiceError::other(format!("Invalid Track URI: {}", uri)))
}

#[async_trait]
impl StreamingService for SpotifyService {
    async fn current_playback(&self) -> ServiceResult<Playback> {
        let playback = self
            .spotify
            .current_playback(None, None::<Vec<_>>)
            .await?;

        match playback.and_then(|ctx| ctx.item) {
            Some(PlayableItem::Track(track)) => match track.id {
                Some(id) => Ok(Playback::Track(Track {
                    uri: id.uri(),
                    name: track.name,
                    artists: track
                        .artists
                        .into_iter()
                        .map(|a| Artist { name: a.name })
                        .collect(),
                })),
                None => {
                    debug!("Playing a local file ({}), not trackable", track.name);
                    Ok(Playback::NothingPlaying)
                }
            },
            Some(_) => {
                debug!("Playing an episode, not trackable");
                Ok(Playback::NothingPlaying)
            }
            None => Ok(Playback::NothingPlaying),
        }
    }

    async fn list_playlists(&self) -> ServiceResult<Vec<PlaylistSummary>> {
        let page = self
            .spotify
            .current_user_playlists_manual(Some(PLAYLIST_PAGE_LIMIT), None)
            .await?;

        debug!("Fetched {} of {} playlists", page.items.len(), page.total);

        Ok(page
            .items
            .into_iter()
            .map(|pl| PlaylistSummary {
                id: pl.id.id().to_string(),
                name: pl.name,
            })
            .collect())
    }

    async fn is_track_in_playlist(
        &self,
        playlist_id_str: &str,
        track_uri: &str,
    ) -> ServiceResult<bool> {
        let playlist = playlist_id(playlist_id_str)?;
        let target = track_id(track_uri)?;
        let mut offset = 0;

        loop {
            let page = self
                .spotify
                .playlist_items_manual(
                    playlist.clone(),
                    None,
                    None,
                    Some(ITEMS_PAGE_LIMIT),
                    Some(offset),
                )
                .await?;

            let found = page.items.iter().any(|item| match &item.track {
                Some(PlayableItem::Track(track)) => track
                    .id
                    .as_ref()
                    .map_or(false, |id| id.id() == target.id()),
                _ => false,
            });

            if found {
                return Ok(true);
            }
            if page.next.is_none() || page.items.is_empty() {
                return Ok(false);
            }
            offset += page.items.len() as u32;
        }
    }

    async fn add_track_to_playlist(
        &self,
        playlist_id_str: &str,
        track_uri: &str,
    ) -> ServiceResult<()> {
        let playlist = playlist_id(playlist_id_str)?;
        let track = track_id(track_uri)?;

        self.spotify
            .playlist_add_items(playlist, [PlayableId::Track(track)], None)
            .await?;
        debug!("Added {} to playlist {}", track_uri, playlist_id_str);
        Ok(())
    }

    async fn remove_track_from_playlist(
        &self,
        playlist_id_str: &str,
        track_uri: &str,
    ) -> ServiceResult<()> {
        let playlist = playlist_id(playlist_id_str)?;
        let track = track_id(track_uri)?;

        self.spotify
            .playlist_remove_all_occurrences_of_items(playlist, [PlayableId::Track(track)], None)
            .await?;
        debug!("Removed {} from playlist {}", track_uri, playlist_id_str);
        Ok(())
    }

    // Spotify keeps no server-side tracking registry. Subscribing confirms
    // the playlist is reachable with the current token so a bad id or an
    // expired session shows up when the playlist is picked.
    async fn subscribe_playlist(&self, playlist_id_str: &str) -> ServiceResult<()> {
        let playlist = playlist_id(playlist_id_str)?;
        let full = self.spotify.playlist(playlist, None, None).await?;
        debug!("Subscribed to playlist '{}'", full.name);
        Ok(())
    }

    async fn unsubscribe_playlist(&self, playlist_id_str: &str) -> ServiceResult<()> {
        playlist_id(playlist_id_str)?;
        debug!("Unsubscribed from playlist {}", playlist_id_str);
        Ok(())
    }
}
