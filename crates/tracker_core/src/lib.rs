//! Tracker core: pure download-tracking state machine and view-model helpers.
mod albums;
mod effect;
mod msg;
mod panel;
mod registry;
mod state;
pub mod transition;
mod types;
mod update;
mod view_model;

pub use albums::{AlbumDownloads, AlbumLine};
pub use effect::Effect;
pub use msg::{Msg, SearchHit};
pub use panel::{LineGeneration, StatusLine, StatusPanel};
pub use registry::DownloadRegistry;
pub use state::{
    AppState, CardAction, TrackCard, ALBUM_SEARCH_LIMIT, SEARCH_LIMIT, STATUS_LINE_GRACE,
};
pub use types::{
    Album, AlbumId, AlbumProgress, Candidate, DownloadStatus, Location, StatusKind, Track, TrackId,
};
pub use update::{update, ALBUM_POLL_FAILURE_MESSAGE};
pub use view_model::{
    format_duration, AlbumCardView, AlbumDetailsView, AlbumLineView, AppViewModel, CandidateView,
    CandidatesView, StatusLineView, TrackCardView,
};
