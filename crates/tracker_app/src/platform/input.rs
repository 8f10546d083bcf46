//! Line commands typed at the prompt.

use tracker_core::{AppState, CardAction, Location, Msg};

pub(crate) const HELP: &str = "\
commands:
  search <query>              search the catalog
  get <n> [local|navidrome]   download result n (default: local)
  info <n>                    show credits, release date and link of result n
  candidates <n>              list YouTube sources for result n
  pick <k> [local|navidrome]  download from candidate k
  albums <query>              search albums
  tracks <n>                  list the tracks of album n
  album <n> [local|navidrome] download every track of album n
  dismiss                     clear the error banner
  health                      ask the backend for its health
  show                        redraw the screen
  config                      print the active configuration
  help                        this text
  quit                        exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Command {
    Search(String),
    Download { index: usize, location: Location },
    Info { index: usize },
    Candidates { index: usize },
    Pick { index: usize, location: Location },
    SearchAlbums(String),
    AlbumTracks { index: usize },
    AlbumDownload { index: usize, location: Location },
    Dismiss,
    Health,
    Show,
    Config,
    Help,
    Quit,
}

/// Parses one input line. `Ok(None)` for blank lines.
pub(crate) fn parse_command(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let command = match word.to_ascii_lowercase().as_str() {
        "search" | "s" | "/" => Command::Search(rest.to_string()),
        "get" | "download" | "d" => {
            let (index, location) = parse_target(rest, "get <n> [local|navidrome]")?;
            Command::Download { index, location }
        }
        "info" | "i" => Command::Info {
            index: parse_target(rest, "info <n>")?.0,
        },
        "candidates" | "yt" => Command::Candidates {
            index: parse_target(rest, "candidates <n>")?.0,
        },
        "pick" => {
            let (index, location) = parse_target(rest, "pick <k> [local|navidrome]")?;
            Command::Pick { index, location }
        }
        "albums" | "sa" => Command::SearchAlbums(rest.to_string()),
        "tracks" => Command::AlbumTracks {
            index: parse_target(rest, "tracks <n>")?.0,
        },
        "album" => {
            let (index, location) = parse_target(rest, "album <n> [local|navidrome]")?;
            Command::AlbumDownload { index, location }
        }
        "dismiss" => Command::Dismiss,
        "health" => Command::Health,
        "show" | "ls" => Command::Show,
        "config" => Command::Config,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => return Err(format!("unknown command `{other}`; type `help`")),
    };
    Ok(Some(command))
}

/// A 1-based number followed by an optional location.
fn parse_target(rest: &str, usage: &str) -> Result<(usize, Location), String> {
    let mut parts = rest.split_whitespace();
    let index = parts.next().ok_or_else(|| format!("usage: {usage}"))?;
    let index: usize = index
        .parse()
        .map_err(|_| format!("`{index}` is not a result number"))?;
    let location = parts.next().map(Location::parse).unwrap_or_default();
    Ok((index, location))
}

/// Resolves a command that targets state into a message for `update`.
/// Commands that never reach the core return `Err` with text for the user.
pub(crate) fn command_to_msg(state: &AppState, command: Command) -> Result<Msg, String> {
    match command {
        Command::Search(query) => Ok(Msg::SearchSubmitted { query }),
        Command::Download { index, location } => {
            let card = state
                .card_at(index)
                .ok_or_else(|| format!("no result #{index}"))?;
            match card.action {
                CardAction::Download => Ok(Msg::DownloadClicked {
                    track_id: card.track.id.clone(),
                    location,
                }),
                CardAction::Downloading => Err(format!("#{index} is already downloading")),
                CardAction::Downloaded => Err(format!("#{index} is already downloaded")),
            }
        }
        Command::Candidates { index } => {
            let card = state
                .card_at(index)
                .ok_or_else(|| format!("no result #{index}"))?;
            Ok(Msg::CandidatesRequested {
                track_id: card.track.id.clone(),
            })
        }
        Command::Pick { index, location } => {
            let (track_id, candidate) = state
                .candidate_at(index)
                .ok_or_else(|| format!("no candidate #{index}"))?;
            if state.registry().contains(track_id) {
                return Err(format!("{track_id} is already downloading"));
            }
            Ok(Msg::CandidateChosen {
                track_id: track_id.clone(),
                video_id: candidate.video_id.clone(),
                location,
            })
        }
        Command::SearchAlbums(query) => Ok(Msg::AlbumSearchSubmitted { query }),
        Command::AlbumTracks { index } => {
            let album = state
                .album_at(index)
                .ok_or_else(|| format!("no album #{index}"))?;
            Ok(Msg::AlbumDetailsRequested {
                album_id: album.id.clone(),
            })
        }
        Command::AlbumDownload { index, location } => {
            let album = state
                .album_at(index)
                .ok_or_else(|| format!("no album #{index}"))?;
            if state.album_downloads().is_active(&album.id) {
                return Err(format!("album #{index} is already downloading"));
            }
            Ok(Msg::AlbumDownloadClicked {
                album_id: album.id.clone(),
                location,
            })
        }
        Command::Dismiss => Ok(Msg::BannerDismissed),
        Command::Health => Ok(Msg::HealthRequested),
        Command::Info { .. }
        | Command::Show
        | Command::Config
        | Command::Help
        | Command::Quit => Err(HELP.to_string()),
    }
}
