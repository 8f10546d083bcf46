//! Poll result → next UI instruction, with no side effects.

use crate::{DownloadStatus, StatusKind};

/// Line message shown when a status request itself fails.
pub const POLL_FAILURE_MESSAGE: &str = "Failed to check download status";
/// Filename used when `file_path` yields no usable last segment.
pub const DEFAULT_FILENAME: &str = "download.mp3";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Status(DownloadStatus),
    /// Transport failure or non-success response.
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// The client fetches the artifact and saves it under `filename`.
    Save {
        download_url: String,
        filename: String,
    },
    /// The server delivered the file into the library; nothing left to fetch.
    Library,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Result for a track that is no longer tracked.
    Ignore,
    /// Keep polling; line mirrors the new status.
    Continue {
        kind: StatusKind,
        message: String,
        progress: Option<u8>,
        stage: Option<String>,
    },
    Completed {
        message: String,
        delivery: Delivery,
    },
    Failed {
        message: String,
    },
}

impl Transition {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Transition::Completed { .. } | Transition::Failed { .. })
    }
}

/// Decides the transition for a poll outcome given the tracked status.
///
/// `previous` is the registry entry; `None` means the download is no longer
/// tracked and the outcome is dropped.
pub fn decide(previous: Option<&DownloadStatus>, outcome: PollOutcome) -> Transition {
    if previous.is_none() {
        return Transition::Ignore;
    }
    let status = match outcome {
        PollOutcome::Failed => {
            return Transition::Failed {
                message: POLL_FAILURE_MESSAGE.to_string(),
            }
        }
        PollOutcome::Status(status) => status,
    };

    match status.status {
        StatusKind::Completed => match status.download_url {
            Some(download_url) => {
                let filename = suggested_filename(status.file_path.as_deref());
                Transition::Completed {
                    message: format!("Saving {filename}"),
                    delivery: Delivery::Save {
                        download_url,
                        filename,
                    },
                }
            }
            None => Transition::Completed {
                message: status.message,
                delivery: Delivery::Library,
            },
        },
        StatusKind::Error => Transition::Failed {
            message: status.message,
        },
        kind => Transition::Continue {
            kind,
            message: status.message,
            progress: status.progress,
            stage: status.stage,
        },
    }
}

/// Last path segment of `file_path`, or [`DEFAULT_FILENAME`].
///
/// Both `/` and `\` separate segments. A path ending in a separator, or one
/// whose last segment is `.`/`..`, has no usable name.
pub fn suggested_filename(file_path: Option<&str>) -> String {
    file_path
        .map(str::trim)
        .and_then(|path| path.rsplit(['/', '\\']).next())
        .filter(|segment| !segment.is_empty() && *segment != "." && *segment != "..")
        .map(ToOwned::to_owned)
        .unwrap_or_else(|| DEFAULT_FILENAME.to_string())
}
