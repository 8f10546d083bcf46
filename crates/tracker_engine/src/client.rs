use std::time::Duration;

use bytes::{Bytes, BytesMut};
use futures_util::StreamExt;
use reqwest::{Response, Url};
use serde::de::DeserializeOwned;

use crate::types::{AlbumDownloadRequest, DownloadRequest, ExistsRecord, SearchRequest};
use crate::{
    AlbumAckRecord, AlbumDetailsRecord, AlbumRecord, AlbumStatusRecord, ApiError,
    CandidatesRecord, FailureKind, HealthRecord, StatusRecord, TrackRecord,
};

pub const SEARCH_FALLBACK: &str = "Search failed";
pub const SUBMIT_FALLBACK: &str = "Download failed";
pub const STATUS_FALLBACK: &str = "Status check failed";
pub const ALBUM_SEARCH_FALLBACK: &str = "Album search failed";
pub const ALBUM_FALLBACK: &str = "Failed to load album";
pub const ALBUM_SUBMIT_FALLBACK: &str = "Album download failed";
pub const CANDIDATES_FALLBACK: &str = "Failed to load candidates";

#[derive(Debug, Clone)]
pub struct ClientSettings {
    /// Backend root; API paths are resolved below it.
    pub base_url: String,
    pub connect_timeout: Duration,
    /// `None` leaves requests unbounded.
    pub request_timeout: Option<Duration>,
    pub max_artifact_bytes: u64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000/".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: None,
            max_artifact_bytes: 200 * 1024 * 1024,
        }
    }
}

/// The HTTP boundary to the search and download backend.
#[async_trait::async_trait]
pub trait CatalogClient: Send + Sync {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<TrackRecord>, ApiError>;

    async fn track_exists(&self, track_id: &str) -> Result<bool, ApiError>;

    /// Asks the backend to start a download job. Only the acknowledgement matters.
    /// `video_id` pins the source to one YouTube candidate.
    async fn submit_download(
        &self,
        track_id: &str,
        location: &str,
        video_id: Option<&str>,
    ) -> Result<(), ApiError>;

    async fn download_status(&self, track_id: &str) -> Result<StatusRecord, ApiError>;

    async fn search_albums(&self, query: &str, limit: usize) -> Result<Vec<AlbumRecord>, ApiError>;

    async fn album_details(&self, album_id: &str) -> Result<AlbumDetailsRecord, ApiError>;

    async fn submit_album_download(
        &self,
        album_id: &str,
        location: &str,
    ) -> Result<AlbumAckRecord, ApiError>;

    async fn album_status(&self, album_id: &str) -> Result<AlbumStatusRecord, ApiError>;

    async fn youtube_candidates(&self, track_id: &str) -> Result<CandidatesRecord, ApiError>;

    /// Fetches a finished artifact. `download_url` may be relative to the base URL.
    async fn fetch_artifact(&self, download_url: &str) -> Result<Bytes, ApiError>;

    async fn health(&self) -> Result<HealthRecord, ApiError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestCatalogClient {
    base: Url,
    client: reqwest::Client,
    max_artifact_bytes: u64,
}

impl ReqwestCatalogClient {
    pub fn new(settings: &ClientSettings) -> Result<Self, ApiError> {
        let mut raw = settings.base_url.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        let base =
            Url::parse(&raw).map_err(|err| ApiError::new(FailureKind::InvalidUrl, err.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(ApiError::new(
                FailureKind::InvalidUrl,
                format!("{raw} cannot be used as a base url"),
            ));
        }

        let mut builder = reqwest::Client::builder().connect_timeout(settings.connect_timeout);
        if let Some(timeout) = settings.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|err| ApiError::new(FailureKind::Network, err.to_string()))?;

        Ok(Self {
            base,
            client,
            max_artifact_bytes: settings.max_artifact_bytes,
        })
    }

    /// Base URL extended by path segments; each segment is percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::new(FailureKind::InvalidUrl, "base url has no path"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

#[async_trait::async_trait]
impl CatalogClient for ReqwestCatalogClient {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<TrackRecord>, ApiError> {
        let url = self.endpoint(&["api", "search"])?;
        let response = self
            .client
            .post(url)
            .json(&SearchRequest { query, limit })
            .send()
            .await
            .map_err(|err| map_reqwest_error(err, SEARCH_FALLBACK))?;
        decode_json(ensure_success(response, SEARCH_FALLBACK).await?).await
    }

    async fn track_exists(&self, track_id: &str) -> Result<bool, ApiError> {
        let url = self.endpoint(&["api", "track", track_id, "exists"])?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| map_reqwest_error(err, "Existence check failed"))?;
        let record: ExistsRecord =
            decode_json(ensure_success(response, "Existence check failed").await?).await?;
        Ok(record.exists)
    }

    async fn submit_download(
        &self,
        track_id: &str,
        location: &str,
        video_id: Option<&str>,
    ) -> Result<(), ApiError> {
        let url = self.endpoint(&["api", "download"])?;
        let response = self
            .client
            .post(url)
            .json(&DownloadRequest {
                track_id,
                location,
                video_id,
            })
            .send()
            .await
            .map_err(|err| map_reqwest_error(err, SUBMIT_FALLBACK))?;
        ensure_success(response, SUBMIT_FALLBACK).await?;
        Ok(())
    }

    async fn download_status(&self, track_id: &str) -> Result<StatusRecord, ApiError> {
        let url = self.endpoint(&["api", "download", "status", track_id])?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| map_reqwest_error(err, STATUS_FALLBACK))?;
        decode_json(ensure_success(response, STATUS_FALLBACK).await?).await
    }

    async fn search_albums(&self, query: &str, limit: usize) -> Result<Vec<AlbumRecord>, ApiError> {
        let url = self.endpoint(&["api", "search", "albums"])?;
        let response = self
            .client
            .post(url)
            .json(&SearchRequest { query, limit })
            .send()
            .await
            .map_err(|err| map_reqwest_error(err, ALBUM_SEARCH_FALLBACK))?;
        decode_json(ensure_success(response, ALBUM_SEARCH_FALLBACK).await?).await
    }

    async fn album_details(&self, album_id: &str) -> Result<AlbumDetailsRecord, ApiError> {
        let url = self.endpoint(&["api", "album", album_id])?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| map_reqwest_error(err, ALBUM_FALLBACK))?;
        decode_json(ensure_success(response, ALBUM_FALLBACK).await?).await
    }

    async fn submit_album_download(
        &self,
        album_id: &str,
        location: &str,
    ) -> Result<AlbumAckRecord, ApiError> {
        let url = self.endpoint(&["api", "download", "album"])?;
        let response = self
            .client
            .post(url)
            .json(&AlbumDownloadRequest { album_id, location })
            .send()
            .await
            .map_err(|err| map_reqwest_error(err, ALBUM_SUBMIT_FALLBACK))?;
        let response = ensure_success(response, ALBUM_SUBMIT_FALLBACK).await?;
        // The acknowledgement body is informational; an unexpected shape still counts as accepted.
        Ok(decode_json(response).await.unwrap_or_default())
    }

    async fn album_status(&self, album_id: &str) -> Result<AlbumStatusRecord, ApiError> {
        let url = self.endpoint(&["api", "download", "album", "status", album_id])?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| map_reqwest_error(err, STATUS_FALLBACK))?;
        decode_json(ensure_success(response, STATUS_FALLBACK).await?).await
    }

    async fn youtube_candidates(&self, track_id: &str) -> Result<CandidatesRecord, ApiError> {
        let url = self.endpoint(&["api", "youtube", "candidates", track_id])?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| map_reqwest_error(err, CANDIDATES_FALLBACK))?;
        decode_json(ensure_success(response, CANDIDATES_FALLBACK).await?).await
    }

    async fn fetch_artifact(&self, download_url: &str) -> Result<Bytes, ApiError> {
        let url = self
            .base
            .join(download_url)
            .map_err(|err| ApiError::new(FailureKind::InvalidUrl, err.to_string()))?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| map_reqwest_error(err, "File download failed"))?;
        let response = ensure_success(response, "File download failed").await?;

        let max_bytes = self.max_artifact_bytes;
        if response.content_length().is_some_and(|len| len > max_bytes) {
            return Err(ApiError::new(
                FailureKind::TooLarge { max_bytes },
                "file too large",
            ));
        }

        let mut body = BytesMut::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|err| map_reqwest_error(err, "File download failed"))?;
            if body.len() as u64 + chunk.len() as u64 > max_bytes {
                return Err(ApiError::new(
                    FailureKind::TooLarge { max_bytes },
                    "file too large",
                ));
            }
            body.extend_from_slice(&chunk);
        }
        Ok(body.freeze())
    }

    async fn health(&self) -> Result<HealthRecord, ApiError> {
        let url = self.endpoint(&["api", "health"])?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| map_reqwest_error(err, "Health check failed"))?;
        decode_json(ensure_success(response, "Health check failed").await?).await
    }
}

/// Passes 2xx responses through; otherwise reads `{detail}` from the body.
async fn ensure_success(response: Response, fallback: &str) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ApiError::new(
        FailureKind::HttpStatus(status.as_u16()),
        error_detail(&body).unwrap_or_else(|| fallback.to_string()),
    ))
}

async fn decode_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let bytes = response
        .bytes()
        .await
        .map_err(|err| map_reqwest_error(err, "Reading response failed"))?;
    serde_json::from_slice(&bytes).map_err(|err| ApiError::new(FailureKind::Decode, err.to_string()))
}

/// The `detail` string of an error body, if there is a non-empty one.
pub(crate) fn error_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("detail")
        .and_then(serde_json::Value::as_str)
        .map(str::trim)
        .filter(|detail| !detail.is_empty())
        .map(ToOwned::to_owned)
}

fn map_reqwest_error(err: reqwest::Error, context: &str) -> ApiError {
    if err.is_timeout() {
        return ApiError::new(FailureKind::Timeout, format!("{context}: {err}"));
    }
    if err.is_decode() {
        return ApiError::new(FailureKind::Decode, format!("{context}: {err}"));
    }
    ApiError::new(FailureKind::Network, format!("{context}: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_is_read_from_error_body() {
        assert_eq!(
            error_detail(r#"{"detail": "Spotify service not configured"}"#).as_deref(),
            Some("Spotify service not configured")
        );
    }

    #[test]
    fn missing_or_structured_detail_yields_none() {
        assert_eq!(error_detail(""), None);
        assert_eq!(error_detail("<html>502</html>"), None);
        assert_eq!(error_detail(r#"{"detail": "  "}"#), None);
        assert_eq!(error_detail(r#"{"detail": [{"loc": ["body"]}]}"#), None);
    }

    #[test]
    fn endpoints_keep_base_path_and_encode_ids() {
        let client = ReqwestCatalogClient::new(&ClientSettings {
            base_url: "http://example.com/fetcher".to_string(),
            ..ClientSettings::default()
        })
        .unwrap();
        let url = client
            .endpoint(&["api", "download", "status", "a b/c"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://example.com/fetcher/api/download/status/a%20b%2Fc"
        );
    }

    #[test]
    fn rejects_unparseable_base_url() {
        let err = ReqwestCatalogClient::new(&ClientSettings {
            base_url: "not a url".to_string(),
            ..ClientSettings::default()
        })
        .unwrap_err();
        assert_eq!(err.kind, FailureKind::InvalidUrl);
    }
}
