use std::fmt;

/// Catalog identifier of a track. Opaque to the tracker.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TrackId(String);

impl TrackId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TrackId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for TrackId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Catalog identifier of an album. Separate from [`TrackId`] so the two
/// cannot be mixed up in registries and pollers.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AlbumId(String);

impl AlbumId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AlbumId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AlbumId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for AlbumId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    pub id: TrackId,
    pub name: String,
    /// Display artist; the joined `artists` when the catalog gave none.
    pub artist: String,
    /// Every credited artist, in catalog order.
    pub artists: Vec<String>,
    pub album: String,
    pub duration_ms: u64,
    pub artwork: Option<String>,
    pub release_date: Option<String>,
    /// Catalog page of the track.
    pub external_url: Option<String>,
}

impl Track {
    /// Leading four digits of the release date, if it has them.
    pub fn release_year(&self) -> Option<&str> {
        release_year(self.release_date.as_deref())
    }
}

pub(crate) fn release_year(date: Option<&str>) -> Option<&str> {
    let year = date?.get(..4)?;
    year.bytes().all(|b| b.is_ascii_digit()).then_some(year)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Album {
    pub id: AlbumId,
    pub name: String,
    pub artist: String,
    pub total_tracks: u32,
    pub release_date: Option<String>,
    pub artwork: Option<String>,
}

/// Progress of a whole-album download as reported by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlbumProgress {
    pub status: StatusKind,
    pub total: u32,
    pub completed: u32,
    pub failed: u32,
    pub current_track: Option<String>,
}

impl AlbumProgress {
    /// Finished once the server says so or every track either landed or failed.
    pub fn is_finished(&self) -> bool {
        self.status.is_terminal() || (self.total > 0 && self.completed + self.failed >= self.total)
    }
}

/// A YouTube video the server considers a possible source for a track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub video_id: String,
    pub title: String,
    pub channel: Option<String>,
    pub duration_secs: Option<u64>,
    /// Match confidence in percent.
    pub confidence: Option<u8>,
}

/// Where a finished download ends up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Location {
    /// Served back to the client, which saves the file itself.
    #[default]
    Local,
    /// Written into the Navidrome library by the server.
    Navidrome,
}

impl Location {
    /// Parses a selector value. Anything unrecognised means `Local`.
    pub fn parse(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("navidrome") {
            Location::Navidrome
        } else {
            Location::Local
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Location::Local => "local",
            Location::Navidrome => "navidrome",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusKind {
    Queued,
    Downloading,
    Completed,
    Error,
    /// Any status string the tracker does not act on (e.g. `processing`).
    Other(String),
}

impl StatusKind {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "queued" => StatusKind::Queued,
            "downloading" => StatusKind::Downloading,
            "completed" => StatusKind::Completed,
            "error" => StatusKind::Error,
            other => StatusKind::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            StatusKind::Queued => "queued",
            StatusKind::Downloading => "downloading",
            StatusKind::Completed => "completed",
            StatusKind::Error => "error",
            StatusKind::Other(raw) => raw,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, StatusKind::Completed | StatusKind::Error)
    }
}

impl fmt::Display for StatusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadStatus {
    pub status: StatusKind,
    pub message: String,
    pub download_url: Option<String>,
    pub file_path: Option<String>,
    pub progress: Option<u8>,
    pub stage: Option<String>,
}

impl DownloadStatus {
    pub fn new(status: StatusKind, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            download_url: None,
            file_path: None,
            progress: None,
            stage: None,
        }
    }

    pub fn queued() -> Self {
        Self::new(StatusKind::Queued, "Queued")
    }
}
