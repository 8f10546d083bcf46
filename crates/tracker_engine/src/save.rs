use std::path::PathBuf;
use std::sync::Arc;

use tracker_logging::{tracker_info, tracker_warn};

use crate::filename::safe_filename;
use crate::{ApiError, AtomicFileWriter, CatalogClient, FailureKind};

/// Fetches a finished artifact and stores it in the writer's directory.
///
/// Stands in for the browser's "save file" step of a local download; it is
/// invoked exactly once per completion. The write itself runs on tokio's
/// blocking pool.
pub async fn save_artifact(
    client: &dyn CatalogClient,
    writer: Arc<AtomicFileWriter>,
    track_id: &str,
    download_url: &str,
    filename: &str,
) -> Result<PathBuf, ApiError> {
    let body = client.fetch_artifact(download_url).await.inspect_err(|err| {
        tracker_warn!(track = track_id; "fetching {} failed: {}", download_url, err);
    })?;

    let name = safe_filename(filename);
    let size = body.len();
    let path = tokio::task::spawn_blocking(move || writer.write(&name, &body))
        .await
        .map_err(|err| ApiError::new(FailureKind::Io, err.to_string()))?
        .map_err(|err| {
            tracker_warn!(track = track_id; "writing {} failed: {}", filename, err);
            ApiError::new(FailureKind::Io, err.to_string())
        })?;
    tracker_info!(track = track_id; "saved {} bytes to {:?}", size, path);
    Ok(path)
}
