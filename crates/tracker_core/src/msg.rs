use crate::{
    Album, AlbumId, AlbumProgress, Candidate, DownloadStatus, LineGeneration, Location, Track,
    TrackId,
};

/// One search result as delivered by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub track: Track,
    /// Result of the existence check; `false` when the check failed.
    pub downloaded: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User submitted a search query.
    SearchSubmitted { query: String },
    /// Search and all existence checks settled.
    SearchCompleted { query: String, hits: Vec<SearchHit> },
    /// Search request failed; `detail` is the server message or a fallback.
    SearchFailed { query: String, detail: String },
    /// User clicked download on a result card.
    DownloadClicked { track_id: TrackId, location: Location },
    /// User asked which YouTube videos could serve a result card.
    CandidatesRequested { track_id: TrackId },
    CandidatesLoaded {
        track_id: TrackId,
        candidates: Vec<Candidate>,
    },
    CandidatesFailed { track_id: TrackId, detail: String },
    /// User downloads a result card from one specific candidate video.
    CandidateChosen {
        track_id: TrackId,
        video_id: String,
        location: Location,
    },
    /// Server acknowledged the download submission.
    DownloadAccepted { track_id: TrackId },
    /// Download submission failed.
    DownloadRejected { track_id: TrackId, detail: String },
    /// A status poll returned.
    StatusPolled { track_id: TrackId, status: DownloadStatus },
    /// A status poll failed at transport or HTTP level.
    PollFailed { track_id: TrackId, reason: String },
    /// Grace period for a completed line elapsed.
    StatusLineExpired {
        track_id: TrackId,
        generation: LineGeneration,
    },
    /// Artifact for a local download was written to disk.
    FileSaved { track_id: TrackId, path: String },
    /// Artifact for a local download could not be fetched or written.
    FileSaveFailed { track_id: TrackId, reason: String },
    AlbumSearchSubmitted { query: String },
    AlbumSearchCompleted { query: String, albums: Vec<Album> },
    AlbumSearchFailed { query: String, detail: String },
    /// User opened an album's track list.
    AlbumDetailsRequested { album_id: AlbumId },
    AlbumDetailsLoaded { album_id: AlbumId, tracks: Vec<Track> },
    AlbumDetailsFailed { album_id: AlbumId, detail: String },
    /// User asked for every track of an album.
    AlbumDownloadClicked { album_id: AlbumId, location: Location },
    AlbumDownloadAccepted { album_id: AlbumId, total_tracks: u32 },
    AlbumDownloadRejected { album_id: AlbumId, detail: String },
    AlbumStatusPolled {
        album_id: AlbumId,
        progress: AlbumProgress,
    },
    AlbumPollFailed { album_id: AlbumId, reason: String },
    AlbumLineExpired {
        album_id: AlbumId,
        generation: LineGeneration,
    },
    /// User dismissed the error banner.
    BannerDismissed,
    /// User asked for the backend health.
    HealthRequested,
    /// Backend health summary arrived.
    HealthReported { summary: String },
    /// Render tick.
    Tick,
    NoOp,
}
