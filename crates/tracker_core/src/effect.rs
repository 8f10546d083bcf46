use std::time::Duration;

use crate::{AlbumId, LineGeneration, Location, TrackId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Search {
        query: String,
        limit: usize,
    },
    SubmitDownload {
        track_id: TrackId,
        location: Location,
        /// Pins the source video; `None` lets the server pick.
        video_id: Option<String>,
    },
    StartPolling {
        track_id: TrackId,
    },
    StopPolling {
        track_id: TrackId,
    },
    /// Fetch `download_url` and store it as `filename`. Emitted once per completion.
    SaveFile {
        track_id: TrackId,
        download_url: String,
        filename: String,
    },
    /// Deliver `Msg::StatusLineExpired` for this line after `after`.
    ScheduleStatusLineRemoval {
        track_id: TrackId,
        generation: LineGeneration,
        after: Duration,
    },
    CheckHealth,
    SearchAlbums {
        query: String,
        limit: usize,
    },
    FetchAlbum {
        album_id: AlbumId,
    },
    SubmitAlbumDownload {
        album_id: AlbumId,
        location: Location,
    },
    StartAlbumPolling {
        album_id: AlbumId,
    },
    StopAlbumPolling {
        album_id: AlbumId,
    },
    ScheduleAlbumLineRemoval {
        album_id: AlbumId,
        generation: LineGeneration,
        after: Duration,
    },
    FetchCandidates {
        track_id: TrackId,
    },
}
