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

/// A line typed at the interactive prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Update,
    Browse,
    Select(Target),
    Add(Target),
    Remove(Target),
    Status,
    Dump(String),
    Login,
    Help,
    Quit,
}

/// A playlist given either by its 1-based position in the listing or by id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Index(usize),
    Id(String),
}

impl Target {
    fn parse(raw: &str) -> Result<Self, String> {
        match raw.parse::<usize>() {
            Ok(0) => Err("Positions start at 1".to_string()),
            Ok(n) => Ok(Target::Index(n)),
            Err(_) => Ok(Target::Id(raw.to_string())),
        }
    }

    /// Resolves against `ids`, the listing the user is looking at.
    pub fn resolve<'a>(&'a self, ids: &'a [String]) -> Option<&'a str> {
        match self {
            Target::Index(n) => ids.get(n - 1).map(String::as_str),
            Target::Id(id) => Some(id.as_str()),
        }
    }
}

impl Command {
    pub fn parse(line: &str) -> Result<Self, String> {
        let mut words = line.split_whitespace();
        let verb = words.next().unwrap_or_default().to_ascii_lowercase();
        let arg = words.next();

        let target = |arg: Option<&str>| match arg {
            Some(raw) => Target::parse(raw),
            None => Err(format!("Usage: {} <number|playlist id>", verb)),
        };

        match verb.as_str() {
            "u" | "update" => Ok(Command::Update),
            "b" | "browse" | "playlists" => Ok(Command::Browse),
            "s" | "select" => target(arg).map(Command::Select),
            "a" | "add" => target(arg).map(Command::Add),
            "r" | "remove" => target(arg).map(Command::Remove),
            "status" | "" => Ok(Command::Status),
            "dump" => arg
                .map(|path| Command::Dump(path.to_string()))
                .ok_or_else(|| "Usage: dump <file.json>".to_string()),
            "login" => Ok(Command::Login),
            "h" | "help" | "?" => Ok(Command::Help),
            "q" | "quit" | "exit" => Ok(Command::Quit),
            other => Err(format!("Unknown command '{}', type 'help'", other)),
        }
    }
}

pub const HELP: &str = "\
Commands:
  update            poll the playing track now
  browse            show/hide your playlists
  select <n|id>     track or untrack a playlist from the list
  add <n|id>        add the playing track to a tracked playlist
  remove <n|id>     remove the playing track from a tracked playlist
  status            show the current state
  dump <file>       save the current state as JSON
  login             print the login URL
  quit";
