use futures_util::future::join_all;
use tracker_logging::{tracker_debug, tracker_info};

use crate::{ApiError, CatalogClient, TrackHit};

/// Runs the search, then checks every result for an existing download.
///
/// All checks run concurrently and the result is returned only once every
/// check settled. A failed check counts as "not downloaded".
pub async fn search_with_existence(
    client: &dyn CatalogClient,
    query: &str,
    limit: usize,
) -> Result<Vec<TrackHit>, ApiError> {
    let tracks = client.search(query, limit).await?;
    tracker_info!("search {:?} returned {} track(s)", query, tracks.len());

    let checks = tracks.iter().map(|track| async move {
        match client.track_exists(&track.id).await {
            Ok(exists) => exists,
            Err(err) => {
                tracker_debug!(track = track.id; "existence check failed: {}", err);
                false
            }
        }
    });
    let downloaded = join_all(checks).await;

    Ok(tracks
        .into_iter()
        .zip(downloaded)
        .map(|(track, downloaded)| TrackHit { track, downloaded })
        .collect())
}
