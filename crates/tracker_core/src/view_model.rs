use crate::{AlbumId, CardAction, StatusKind, TrackId};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub query: String,
    pub searching: bool,
    pub search_error: Option<String>,
    pub cards: Vec<TrackCardView>,
    pub panel_visible: bool,
    pub status_lines: Vec<StatusLineView>,
    pub active_downloads: usize,
    pub banner: Option<String>,
    pub health: Option<String>,
    pub album_query: String,
    pub album_searching: bool,
    pub album_search_error: Option<String>,
    pub albums: Vec<AlbumCardView>,
    pub album_details: Option<AlbumDetailsView>,
    pub candidates: Option<CandidatesView>,
    pub album_lines: Vec<AlbumLineView>,
    pub active_album_downloads: usize,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackCardView {
    /// 1-based position, used to pick a card for download.
    pub index: usize,
    pub track_id: TrackId,
    pub name: String,
    pub artist: String,
    pub album: String,
    pub duration: String,
    pub artwork: Option<String>,
    pub artists: Vec<String>,
    pub release_year: Option<String>,
    pub release_date: Option<String>,
    pub external_url: Option<String>,
    pub action: CardAction,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlbumCardView {
    /// 1-based position, used by the album commands.
    pub index: usize,
    pub album_id: AlbumId,
    pub name: String,
    pub artist: String,
    pub total_tracks: u32,
    pub release_year: Option<String>,
    pub artwork: Option<String>,
    /// An album download is in flight.
    pub downloading: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlbumDetailsView {
    pub album_id: AlbumId,
    /// Album name if it is among the album results, else the id.
    pub title: String,
    pub loading: bool,
    pub error: Option<String>,
    /// `(name, duration)` in album order.
    pub tracks: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidatesView {
    pub track_id: TrackId,
    pub label: String,
    pub loading: bool,
    pub error: Option<String>,
    pub items: Vec<CandidateView>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateView {
    pub index: usize,
    pub video_id: String,
    pub title: String,
    pub channel: Option<String>,
    pub duration: Option<String>,
    pub confidence: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlbumLineView {
    pub album_id: AlbumId,
    pub label: String,
    pub kind: StatusKind,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLineView {
    pub track_id: TrackId,
    pub label: String,
    pub kind: StatusKind,
    pub message: String,
    pub progress: Option<u8>,
    pub stage: Option<String>,
}

/// `m:ss` for a duration in milliseconds. Seconds are truncated.
pub fn format_duration(duration_ms: u64) -> String {
    let total_secs = duration_ms / 1000;
    format!("{}:{:02}", total_secs / 60, total_secs % 60)
}
