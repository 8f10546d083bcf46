//! Tracker engine: HTTP boundary, per-track and per-album pollers, effect execution.
mod client;
mod engine;
mod filename;
mod persist;
mod poller;
mod save;
mod search;
mod types;

pub use client::{
    CatalogClient, ClientSettings, ReqwestCatalogClient, ALBUM_FALLBACK, ALBUM_SEARCH_FALLBACK,
    ALBUM_SUBMIT_FALLBACK, CANDIDATES_FALLBACK, SEARCH_FALLBACK, STATUS_FALLBACK,
    SUBMIT_FALLBACK,
};
pub use engine::{EngineError, EngineEvents, EngineHandle, EngineSettings};
pub use filename::{safe_filename, FALLBACK_FILENAME};
pub use persist::{ensure_download_dir, AtomicFileWriter, PersistError};
pub use poller::{ChannelEventSink, EventSink, Pollers, DEFAULT_POLL_INTERVAL};
pub use save::save_artifact;
pub use search::search_with_existence;
pub use types::{
    AlbumAckRecord, AlbumDetailsRecord, AlbumKey, AlbumRecord, AlbumStatusRecord, ApiError,
    CandidateRecord, CandidatesRecord, EngineEvent, FailureKind, HealthRecord, StatusRecord,
    TrackHit, TrackKey, TrackRecord,
};
