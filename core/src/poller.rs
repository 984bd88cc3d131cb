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

use crate::app::TrackerApp;
use crate::models::Playback;
use crate::service::{ServiceResult, StreamingService};
use log::{debug, info};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PollerState {
    Idle,
    Polling,
}

/// Repeating playback poll driving [`TrackerApp::update`].
///
/// The timer is armed by the first successful poll and then fires on a fixed
/// period until [`TrackPoller::stop`]. Each tick runs in its own task, so a
/// slow or failing request never shifts the schedule, and a manual
/// [`TrackPoller::trigger_now`] never resets it.
pub struct TrackPoller<S> {
    app: Arc<TrackerApp<S>>,
    period: Duration,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl<S: StreamingService + 'static> TrackPoller<S> {
    pub fn new(app: Arc<TrackerApp<S>>, period: Duration) -> Self {
        Self {
            app,
            period,
            timer: Mutex::new(None),
        }
    }

    pub fn app(&self) -> &Arc<TrackerApp<S>> {
        &self.app
    }

    pub async fn start(&self) -> ServiceResult<Playback> {
        self.trigger_now().await
    }

    /// Polls immediately, independent of the timer phase.
    pub async fn trigger_now(&self) -> ServiceResult<Playback> {
        let result = self.app.update().await;
        if result.is_ok() {
            self.arm().await;
        }
        result
    }

    async fn arm(&self) {
        let mut timer = self.timer.lock().await;
        if timer.is_some() {
            return;
        }

        info!("Polling playback every {:?}", self.period);
        let app = Arc::clone(&self.app);
        let period = self.period;

        *timer = Some(tokio::spawn(async move {
            let mut ticks = interval_at(Instant::now() + period, period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticks.tick().await;
                let app = Arc::clone(&app);
                tokio::spawn(async move {
                    if let Err(e) = app.update().await {
                        debug!("Poll tick failed: {}", e);
                    }
                });
            }
        }));
    }

    pub async fn stop(&self) {
        if let Some(handle) = self.timer.lock().await.take() {
            handle.abort();
            info!("Polling stopped");
        }
    }

    pub async fn state(&self) -> PollerState {
        if self.timer.lock().await.is_some() {
            PollerState::Polling
        } else {
            PollerState::Idle
        }
    }
}

impl<S> Drop for TrackPoller<S> {
    fn drop(&mut self) {
        if let Some(handle) = self.timer.get_mut().take() {
            handle.abort();
        }
    }
}
