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

mod commands;

use anyhow::Context;
use clap::{Parser, Subcommand};
use commands::{Command, Target, HELP};
use dotenvy::dotenv;
use log::debug;
use std::fs::File;
use std::io::Write;
use std::process;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracker_core::{
    authorize_url, get_spotify_client, Session, SpotifyService, TrackPoller, TrackerApp,
    TrackerConfig, View,
};

type App = TrackerApp<SpotifyService>;

#[derive(Parser)]
#[command(name = "playlist-tracker")]
#[command(about = "Shows which of your Spotify playlists contain the playing track", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Prints the Spotify login URL
    Login {
        /// Always show the Spotify consent dialog
        #[arg(long)]
        show_dialog: bool,
    },
    /// Starts an interactive tracking session
    Run {
        /// The URL Spotify redirected to after login (contains #access_token=...)
        #[arg(long, env = "TRACKER_REDIRECT_URL")]
        redirect_url: Option<String>,
    },
    /// Lists your playlists with their IDs
    Playlists {
        /// The URL Spotify redirected to after login (contains #access_token=...)
        #[arg(long, env = "TRACKER_REDIRECT_URL")]
        redirect_url: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    env_logger::init();

    if dotenv().is_err() {
        // Silently ignore
    }

    let cli = Cli::parse();

    let mut config = match TrackerConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            eprintln!("Set RSPOTIFY_CLIENT_ID and RSPOTIFY_REDIRECT_URI (a .env file works too).");
            process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Login { show_dialog } => {
            config.show_dialog |= show_dialog;
            handle_login(&config);
            Ok(())
        }
        Commands::Run { redirect_url } => handle_run(&config, redirect_url).await,
        Commands::Playlists { redirect_url } => handle_playlists(&config, redirect_url).await,
    };

    if let Err(e) = result {
        eprintln!();
        eprintln!("[ERROR] {:#}", e);
        process::exit(1);
    }
}

fn handle_login(config: &TrackerConfig) {
    println!("Open this URL in your browser and log in:");
    println!();
    println!("  {}", authorize_url(config));
    println!();
    println!("Then copy the full URL you are redirected to and run:");
    println!("  playlist-tracker run --redirect-url '<URL>'");
}

async fn read_session(config: &TrackerConfig, redirect_url: Option<String>) -> anyhow::Result<Session> {
    let redirect = match redirect_url {
        Some(url) => url,
        None => {
            handle_login(config);
            println!();
            print!("Or paste the redirect URL here: ");
            std::io::stdout().flush()?;
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            lines
                .next_line()
                .await?
                .context("No redirect URL given")?
        }
    };

    Ok(Session::from_redirect_url(&redirect)?)
}

fn build_app(session: &Session) -> anyhow::Result<Arc<App>> {
    let spotify = get_spotify_client(session)?;
    let service = Arc::new(SpotifyService::new(spotify));
    Ok(Arc::new(TrackerApp::new(service, session.login_visible())))
}

async fn handle_playlists(config: &TrackerConfig, redirect_url: Option<String>) -> anyhow::Result<()> {
    let session = read_session(config, redirect_url).await?;
    let app = build_app(&session)?;
    println!("Fetching your playlists...");

    app.browse_playlists().await?;
    let view = app.view().await;

    println!();
    println!("{:<4} | {:<25} | {:<40}", "#", "ID", "Name");
    println!("{:-<4}-+-{:-<25}-+-{:-<40}", "", "", "");
    for (i, pl) in view.catalog.unwrap_or_default().iter().enumerate() {
        println!("{:<4} | {:<25} | {:<40}", i + 1, pl.id, truncate(&pl.name, 40));
    }
    println!();
    println!("Tip: run 'playlist-tracker run' and 'select <#>' to track one");
    Ok(())
}

async fn handle_run(config: &TrackerConfig, redirect_url: Option<String>) -> anyhow::Result<()> {
    let session = read_session(config, redirect_url).await?;
    let app = build_app(&session)?;
    let poller = TrackPoller::new(Arc::clone(&app), config.poll_interval);

    println!("Session started. Type 'help' for commands.");
    if let Err(e) = poller.start().await {
        debug!("Initial poll failed: {}", e);
    }
    let mut last = app.view().await;
    render(&last);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut refresh = tokio::time::interval(config.poll_interval);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match Command::parse(&line) {
                    Ok(Command::Quit) => break,
                    Ok(command) => dispatch(config, &poller, command).await?,
                    Err(msg) => println!("{}", msg),
                }
                last = app.view().await;
            }
            _ = refresh.tick() => {
                let view = app.view().await;
                if view.track_context != last.track_context || view.tracked != last.tracked {
                    render(&view);
                } else if view.error != last.error {
                    render_status(&view);
                }
                last = view;
            }
        }
    }

    poller.stop().await;
    Ok(())
}

async fn dispatch(
    config: &TrackerConfig,
    poller: &TrackPoller<SpotifyService>,
    command: Command,
) -> anyhow::Result<()> {
    let app = poller.app();
    let view = app.view().await;

    // Failures are already on the status board; the re-render shows them.
    match command {
        Command::Update => {
            if view.controls.update_disabled {
                println!("Busy, try again in a moment.");
                return Ok(());
            }
            let _ = poller.trigger_now().await;
        }
        Command::Browse => {
            let _ = app.browse_playlists().await;
        }
        Command::Select(target) => {
            let ids: Vec<String> = view
                .catalog
                .iter()
                .flatten()
                .map(|e| e.id.clone())
                .collect();
            match target.resolve(&ids) {
                Some(id) => {
                    let _ = app.select_playlist(id).await;
                }
                None => println!("No playlist at that position, try 'browse' first."),
            }
        }
        Command::Add(target) => edit(poller, &view, &target, true).await,
        Command::Remove(target) => edit(poller, &view, &target, false).await,
        Command::Status => {}
        Command::Dump(path) => {
            match save_view(&path, &view) {
                Ok(()) => println!("[SAVED] State saved to: {}", path),
                Err(e) => eprintln!("[ERROR] Failed to write state to '{}': {}", path, e),
            }
            return Ok(());
        }
        Command::Login => {
            handle_login(config);
            return Ok(());
        }
        Command::Help => {
            println!("{}", HELP);
            return Ok(());
        }
        Command::Quit => return Ok(()),
    }

    render(&app.view().await);
    Ok(())
}

async fn edit(poller: &TrackPoller<SpotifyService>, view: &View, target: &Target, add: bool) {
    if view.tracked.is_empty() {
        println!("No tracked playlists yet, use 'browse' and 'select'.");
        return;
    }
    let ids: Vec<String> = view.tracked.iter().map(|pl| pl.id.clone()).collect();
    let Some(id) = target.resolve(&ids) else {
        println!("No tracked playlist at that position.");
        return;
    };

    let app = poller.app();
    let result = if add {
        app.add_current_track(id).await
    } else {
        app.remove_current_track(id).await
    };
    if let Ok(false) = result {
        println!("Still working on that playlist...");
    }
}

/// Writes the state snapshot as pretty JSON.
fn save_view(path: &str, view: &View) -> std::io::Result<()> {
    let json_content = serde_json::to_string_pretty(view).unwrap_or_default();
    let mut file = File::create(path)?;
    file.write_all(json_content.as_bytes())
}

fn render(view: &View) {
    println!();
    println!("---------------------------------------------------");
    match &view.track_context {
        Some(context) => println!("Now playing: {}", context),
        None => println!("Nothing playing"),
    }
    println!("---------------------------------------------------");

    if let Some(catalog) = view.catalog.as_ref().filter(|_| view.controls.catalog_visible) {
        println!("Your playlists:");
        for (i, entry) in catalog.iter().enumerate() {
            let mark = if entry.selected { "x" } else { " " };
            println!("  {:>2}. [{}] {}", i + 1, mark, entry.name);
        }
        println!();
    }

    if view.tracked.is_empty() {
        println!("Not tracking any playlists yet.");
    } else {
        println!("Tracking playlists:");
        for (i, pl) in view.tracked.iter().enumerate() {
            let (state, action) = if pl.contains_current_track {
                ("FOUND", "remove")
            } else {
                ("-", "add")
            };
            let busy = if view.controls.pending.contains(&pl.id) {
                " (working...)"
            } else {
                ""
            };
            println!("  {:>2}. {:<30} {:<6} [{}]{}", i + 1, truncate(&pl.name, 30), state, action, busy);
        }
    }
    if view.controls.loading {
        println!("Loading...");
    }
    render_status(view);
}

fn render_status(view: &View) {
    if let Some(error) = &view.error {
        println!("[ERROR] {}", error);
    }
    if view.login_visible {
        println!("Not logged in. Type 'login' for the login URL.");
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let cut: String = text.chars().take(max - 2).collect();
        format!("{}..", cut)
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracker_core::app::Controls;

    fn empty_view() -> View {
        View {
            login_visible: false,
            error: None,
            track_context: Some("Song by Band".to_string()),
            current_track: None,
            catalog: None,
            tracked: Vec::new(),
            controls: Controls::default(),
        }
    }

    #[test]
    fn test_save_view_bad_path_is_an_error() {
        let path = std::env::temp_dir()
            .join("playlist-tracker-missing-dir")
            .join("nested")
            .join("state.json");
        assert!(save_view(path.to_str().unwrap(), &empty_view()).is_err());
    }

    #[test]
    fn test_save_view_writes_json() {
        let path = std::env::temp_dir().join(format!("playlist-tracker-{}.json", process::id()));
        save_view(path.to_str().unwrap(), &empty_view()).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        let json: serde_json::Value = serde_json::from_str(&written).unwrap();
        assert_eq!(json["track_context"], "Song by Band");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a very long playlist name", 8), "a very..");
    }
}
