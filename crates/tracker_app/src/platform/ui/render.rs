use chrono::{DateTime, Local};
use tracker_core::{
    AlbumCardView, AlbumLineView, AppViewModel, CandidateView, CardAction, StatusKind,
    StatusLineView, TrackCardView,
};

const RULE_WIDTH: usize = 60;

/// Renders the view model as terminal lines, headed by a local timestamp.
pub fn render(view: &AppViewModel, now: DateTime<Local>) -> Vec<String> {
    let mut lines = vec![header(&now.format("%H:%M:%S").to_string())];

    if let Some(banner) = &view.banner {
        lines.push(format!("! {banner}  (type `dismiss` to clear)"));
    }

    if view.searching {
        lines.push(format!("Searching for \"{}\"...", view.query));
    } else if let Some(error) = &view.search_error {
        lines.push(format!("Search error: {error}"));
    } else if !view.query.is_empty() {
        lines.push(format!(
            "{} result(s) for \"{}\"",
            view.cards.len(),
            view.query
        ));
    }
    lines.extend(view.cards.iter().map(card_line));

    if let Some(candidates) = &view.candidates {
        lines.push(String::new());
        if candidates.loading {
            lines.push(format!("Finding sources for {}...", candidates.label));
        } else if let Some(error) = &candidates.error {
            lines.push(format!("Sources for {}: {error}", candidates.label));
        } else {
            lines.push(format!(
                "Sources for {} (type `pick <k>`)",
                candidates.label
            ));
            lines.extend(candidates.items.iter().map(candidate_line));
        }
    }

    if view.album_searching {
        lines.push(String::new());
        lines.push(format!("Searching albums for \"{}\"...", view.album_query));
    } else if let Some(error) = &view.album_search_error {
        lines.push(String::new());
        lines.push(format!("Album search error: {error}"));
    } else if !view.album_query.is_empty() {
        lines.push(String::new());
        lines.push(format!(
            "{} album(s) for \"{}\"",
            view.albums.len(),
            view.album_query
        ));
        lines.extend(view.albums.iter().map(album_line));
    }

    if let Some(details) = &view.album_details {
        if details.loading {
            lines.push(format!("Loading tracks of {}...", details.title));
        } else if let Some(error) = &details.error {
            lines.push(format!("Tracks of {}: {error}", details.title));
        } else {
            lines.push(format!("Tracks of {}", details.title));
            lines.extend(
                details
                    .tracks
                    .iter()
                    .enumerate()
                    .map(|(idx, (name, duration))| format!("    {:>2}. {name} {duration}", idx + 1)),
            );
        }
    }

    if view.panel_visible {
        lines.push(String::new());
        lines.push(format!("Downloads ({} active)", view.active_downloads));
        lines.extend(view.status_lines.iter().map(status_line));
    }

    if !view.album_lines.is_empty() {
        lines.push(String::new());
        lines.push(format!(
            "Album downloads ({} active)",
            view.active_album_downloads
        ));
        lines.extend(view.album_lines.iter().map(album_status_line));
    }

    if let Some(health) = &view.health {
        lines.push(format!("Health: {health}"));
    }
    lines
}

fn header(time: &str) -> String {
    let title = format!(" track fetcher {time} ");
    let pad = RULE_WIDTH.saturating_sub(title.len());
    format!("{}{}{}", "-".repeat(pad / 2), title, "-".repeat(pad - pad / 2))
}

fn card_line(card: &TrackCardView) -> String {
    let action = match card.action {
        CardAction::Download => "[get]",
        CardAction::Downloading => "[downloading...]",
        CardAction::Downloaded => "[downloaded]",
    };
    let artist = if card.artists.len() > 1 {
        card.artists.join(", ")
    } else {
        card.artist.clone()
    };
    let year = card
        .release_year
        .as_deref()
        .map(|year| format!(", {year}"))
        .unwrap_or_default();
    format!(
        "{:>3}. {} - {} ({}{}) {} {}",
        card.index, artist, card.name, card.album, year, card.duration, action
    )
}

/// Every detail known about one result card, for the `info` command.
pub fn card_details(card: &TrackCardView) -> Vec<String> {
    let mut lines = vec![format!("#{} {}", card.index, card.name)];
    let artists = if card.artists.is_empty() {
        card.artist.clone()
    } else {
        card.artists.join(", ")
    };
    lines.push(format!("  artists:  {artists}"));
    lines.push(format!("  album:    {}", card.album));
    lines.push(format!("  length:   {}", card.duration));
    if let Some(date) = &card.release_date {
        lines.push(format!("  released: {date}"));
    }
    if let Some(url) = &card.external_url {
        lines.push(format!("  link:     {url}"));
    }
    if let Some(artwork) = &card.artwork {
        lines.push(format!("  artwork:  {artwork}"));
    }
    lines
}

fn candidate_line(candidate: &CandidateView) -> String {
    let mut line = format!("{:>3}. {}", candidate.index, candidate.title);
    if let Some(channel) = &candidate.channel {
        line.push_str(&format!(" [{channel}]"));
    }
    if let Some(duration) = &candidate.duration {
        line.push_str(&format!(" {duration}"));
    }
    if let Some(confidence) = candidate.confidence {
        line.push_str(&format!(" {confidence}% match"));
    }
    line
}

fn album_line(album: &AlbumCardView) -> String {
    let year = album
        .release_year
        .as_deref()
        .map(|year| format!(", {year}"))
        .unwrap_or_default();
    let action = if album.downloading {
        "[downloading...]"
    } else {
        "[get album]"
    };
    format!(
        "{:>3}. {} - {} ({} tracks{}) {}",
        album.index, album.artist, album.name, album.total_tracks, year, action
    )
}

fn album_status_line(line: &AlbumLineView) -> String {
    let marker = match line.kind {
        StatusKind::Completed => "ok",
        StatusKind::Error => "!!",
        _ => "..",
    };
    format!("  {marker} {}: {} {}", line.label, line.kind, line.message)
}

fn status_line(line: &StatusLineView) -> String {
    let marker = match line.kind {
        StatusKind::Completed => "ok",
        StatusKind::Error => "!!",
        _ => "..",
    };
    let stage = line
        .stage
        .as_deref()
        .map(|stage| format!(" [{stage}]"))
        .unwrap_or_default();
    let progress = line
        .progress
        .map(|p| format!(" {p}%"))
        .unwrap_or_default();
    format!(
        "  {marker} {}: {}{}{} {}",
        line.label, line.kind, stage, progress, line.message
    )
}
