use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

pub type TrackKey = String;
pub type AlbumKey = String;

/// A search result as returned by `POST /api/search`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackRecord {
    #[serde(deserialize_with = "string_or_number")]
    pub id: TrackKey,
    pub name: String,
    #[serde(default)]
    pub artist: String,
    #[serde(default)]
    pub artists: Vec<String>,
    #[serde(default)]
    pub album: String,
    #[serde(default)]
    pub duration_ms: u64,
    #[serde(default)]
    pub external_url: Option<String>,
    #[serde(default)]
    pub preview_url: Option<String>,
    #[serde(default)]
    pub album_art: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
}

/// Body of `GET /api/download/status/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRecord {
    pub status: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub download_url: Option<String>,
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub progress: Option<u32>,
    #[serde(default)]
    pub stage: Option<String>,
}

impl StatusRecord {
    pub fn is_terminal(&self) -> bool {
        matches!(self.status.as_str(), "completed" | "error")
    }
}

/// An album as returned by `POST /api/search/albums`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlbumRecord {
    #[serde(deserialize_with = "string_or_number")]
    pub id: AlbumKey,
    pub name: String,
    #[serde(default)]
    pub artist: String,
    #[serde(default)]
    pub total_tracks: u32,
    #[serde(default)]
    pub album_art: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
}

/// Body of `GET /api/album/{id}`: the album plus its tracks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlbumDetailsRecord {
    #[serde(flatten)]
    pub album: AlbumRecord,
    #[serde(default)]
    pub tracks: Vec<TrackRecord>,
}

/// Acknowledgement of `POST /api/download/album`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AlbumAckRecord {
    #[serde(default)]
    pub total_tracks: u32,
    #[serde(default)]
    pub message: String,
}

/// Body of `GET /api/download/album/status/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlbumStatusRecord {
    pub status: String,
    #[serde(default)]
    pub album_name: String,
    #[serde(default)]
    pub artist: String,
    #[serde(default)]
    pub total_tracks: u32,
    #[serde(default)]
    pub completed_tracks: u32,
    #[serde(default)]
    pub failed_tracks: u32,
    #[serde(default)]
    pub current_track: Option<String>,
}

impl AlbumStatusRecord {
    /// The server marks an album `completed` once every track settled,
    /// whether it downloaded or failed.
    pub fn is_terminal(&self) -> bool {
        matches!(self.status.as_str(), "completed" | "error")
            || (self.total_tracks > 0
                && self.completed_tracks + self.failed_tracks >= self.total_tracks)
    }
}

/// Body of `GET /api/youtube/candidates/{id}`. Only the candidate list is read.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CandidatesRecord {
    #[serde(default)]
    pub candidates: Vec<CandidateRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateRecord {
    #[serde(alias = "id")]
    pub video_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, alias = "uploader")]
    pub channel: Option<String>,
    /// Seconds.
    #[serde(default)]
    pub duration: Option<serde_json::Number>,
    /// Match confidence, either a 0..1 fraction or a percentage.
    #[serde(default, alias = "confidence")]
    pub score: Option<serde_json::Number>,
}

impl CandidateRecord {
    pub fn duration_secs(&self) -> Option<u64> {
        let secs = self.duration.as_ref()?.as_f64()?;
        (secs.is_finite() && secs >= 0.0).then(|| secs.round() as u64)
    }

    pub fn confidence_percent(&self) -> Option<u8> {
        let score = self.score.as_ref()?.as_f64()?;
        if !score.is_finite() || score < 0.0 {
            return None;
        }
        let percent = if score <= 1.0 { score * 100.0 } else { score };
        Some(percent.round().min(100.0) as u8)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub(crate) struct ExistsRecord {
    pub exists: bool,
}

/// Body of `GET /api/health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthRecord {
    pub status: String,
    #[serde(default)]
    pub spotify_configured: bool,
    #[serde(default)]
    pub navidrome_path: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct SearchRequest<'a> {
    pub query: &'a str,
    pub limit: usize,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct DownloadRequest<'a> {
    pub track_id: &'a str,
    pub location: &'a str,
    /// A specific YouTube video picked from the candidates.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_id: Option<&'a str>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct AlbumDownloadRequest<'a> {
    pub album_id: &'a str,
    pub location: &'a str,
}

/// A search result joined with its existence check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackHit {
    pub track: TrackRecord,
    /// `false` when the check failed.
    pub downloaded: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    SearchFinished {
        query: String,
        result: Result<Vec<TrackHit>, ApiError>,
    },
    DownloadSubmitted {
        track_id: TrackKey,
        result: Result<(), ApiError>,
    },
    StatusPolled {
        track_id: TrackKey,
        status: StatusRecord,
    },
    PollFailed {
        track_id: TrackKey,
        error: ApiError,
    },
    StatusLineExpired {
        track_id: TrackKey,
        generation: u64,
    },
    FileSaved {
        track_id: TrackKey,
        result: Result<PathBuf, ApiError>,
    },
    HealthChecked(Result<HealthRecord, ApiError>),
    AlbumSearchFinished {
        query: String,
        result: Result<Vec<AlbumRecord>, ApiError>,
    },
    AlbumFetched {
        album_id: AlbumKey,
        result: Result<AlbumDetailsRecord, ApiError>,
    },
    AlbumSubmitted {
        album_id: AlbumKey,
        result: Result<AlbumAckRecord, ApiError>,
    },
    AlbumStatusPolled {
        album_id: AlbumKey,
        status: AlbumStatusRecord,
    },
    AlbumPollFailed {
        album_id: AlbumKey,
        error: ApiError,
    },
    AlbumLineExpired {
        album_id: AlbumKey,
        generation: u64,
    },
    CandidatesFetched {
        track_id: TrackKey,
        result: Result<CandidatesRecord, ApiError>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ApiError {
    pub kind: FailureKind,
    pub message: String,
}

impl ApiError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    Network,
    Decode,
    TooLarge { max_bytes: u64 },
    Io,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::Decode => write!(f, "malformed response"),
            FailureKind::TooLarge { max_bytes } => {
                write!(f, "response larger than {max_bytes} bytes")
            }
            FailureKind::Io => write!(f, "io error"),
        }
    }
}

/// Catalog ids arrive as strings, but numeric ids are accepted too.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(text) => Ok(text),
        serde_json::Value::Number(number) => Ok(number.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {other}"
        ))),
    }
}
