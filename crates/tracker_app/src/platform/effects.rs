use std::sync::mpsc;
use std::thread;

use tracker_core::{
    Album, AlbumId, AlbumProgress, Candidate, DownloadStatus, Effect, Msg, SearchHit, StatusKind,
    Track, TrackId,
};
use tracker_engine::{
    AlbumRecord, AlbumStatusRecord, CandidateRecord, EngineError, EngineEvent, EngineEvents,
    EngineHandle, EngineSettings, HealthRecord, StatusRecord, TrackHit, TrackRecord,
};
use tracker_logging::{tracker_debug, tracker_info, tracker_warn};

use super::app::AppEvent;

pub struct EffectRunner {
    engine: EngineHandle,
}

impl EffectRunner {
    pub fn new(settings: EngineSettings, tx: mpsc::Sender<AppEvent>) -> Result<Self, EngineError> {
        let (engine, events) = EngineHandle::new(settings)?;
        spawn_event_pump(events, tx);
        Ok(Self { engine })
    }

    pub fn enqueue(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Search { query, limit } => {
                    tracker_info!("Search query_len={} limit={}", query.len(), limit);
                    self.engine.search(query, limit);
                }
                Effect::SubmitDownload {
                    track_id,
                    location,
                    video_id,
                } => {
                    tracker_info!(
                        track = track_id;
                        "SubmitDownload location={} video={:?}",
                        location.as_str(),
                        video_id
                    );
                    self.engine
                        .submit_download(track_id.as_str(), location.as_str(), video_id);
                }
                Effect::StartPolling { track_id } => {
                    self.engine.start_polling(track_id.as_str());
                }
                Effect::StopPolling { track_id } => {
                    self.engine.stop_polling(track_id.as_str());
                }
                Effect::SaveFile {
                    track_id,
                    download_url,
                    filename,
                } => {
                    tracker_info!(track = track_id; "SaveFile filename={}", filename);
                    self.engine
                        .save_file(track_id.as_str(), download_url, filename);
                }
                Effect::ScheduleStatusLineRemoval {
                    track_id,
                    generation,
                    after,
                } => {
                    tracker_debug!(
                        track = track_id;
                        "ScheduleStatusLineRemoval generation={} after_ms={}",
                        generation,
                        after.as_millis()
                    );
                    self.engine
                        .expire_status_line(track_id.as_str(), generation, after);
                }
                Effect::CheckHealth => self.engine.check_health(),
                Effect::SearchAlbums { query, limit } => {
                    tracker_info!("SearchAlbums query_len={} limit={}", query.len(), limit);
                    self.engine.search_albums(query, limit);
                }
                Effect::FetchAlbum { album_id } => self.engine.fetch_album(album_id.as_str()),
                Effect::SubmitAlbumDownload { album_id, location } => {
                    tracker_info!(album = album_id; "SubmitAlbumDownload location={}", location.as_str());
                    self.engine
                        .submit_album_download(album_id.as_str(), location.as_str());
                }
                Effect::StartAlbumPolling { album_id } => {
                    self.engine.start_album_polling(album_id.as_str());
                }
                Effect::StopAlbumPolling { album_id } => {
                    self.engine.stop_album_polling(album_id.as_str());
                }
                Effect::ScheduleAlbumLineRemoval {
                    album_id,
                    generation,
                    after,
                } => {
                    self.engine
                        .expire_album_line(album_id.as_str(), generation, after);
                }
                Effect::FetchCandidates { track_id } => {
                    tracker_debug!(track = track_id; "FetchCandidates");
                    self.engine.fetch_candidates(track_id.as_str());
                }
            }
        }
    }

    /// Stops all pollers and joins the engine worker.
    pub fn shutdown(self) {
        self.engine.shutdown();
    }
}

fn spawn_event_pump(events: EngineEvents, tx: mpsc::Sender<AppEvent>) {
    // Ends once the engine drops its sender or the app loop is gone.
    thread::spawn(move || {
        while let Some(event) = events.recv() {
            if tx.send(AppEvent::Engine(map_event(event))).is_err() {
                break;
            }
        }
    });
}

pub(crate) fn map_event(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::SearchFinished { query, result } => match result {
            Ok(hits) => Msg::SearchCompleted {
                query,
                hits: hits.into_iter().map(map_hit).collect(),
            },
            Err(err) => {
                tracker_warn!("Search for {:?} failed: {:?}", query, err.kind);
                Msg::SearchFailed {
                    query,
                    detail: err.message,
                }
            }
        },
        EngineEvent::DownloadSubmitted { track_id, result } => match result {
            Ok(()) => Msg::DownloadAccepted {
                track_id: TrackId::from(track_id),
            },
            Err(err) => Msg::DownloadRejected {
                track_id: TrackId::from(track_id),
                detail: err.message,
            },
        },
        EngineEvent::StatusPolled { track_id, status } => Msg::StatusPolled {
            track_id: TrackId::from(track_id),
            status: map_status(status),
        },
        EngineEvent::PollFailed { track_id, error } => Msg::PollFailed {
            track_id: TrackId::from(track_id),
            reason: error.to_string(),
        },
        EngineEvent::StatusLineExpired {
            track_id,
            generation,
        } => Msg::StatusLineExpired {
            track_id: TrackId::from(track_id),
            generation,
        },
        EngineEvent::FileSaved { track_id, result } => match result {
            Ok(path) => Msg::FileSaved {
                track_id: TrackId::from(track_id),
                path: path.display().to_string(),
            },
            Err(err) => Msg::FileSaveFailed {
                track_id: TrackId::from(track_id),
                reason: err.to_string(),
            },
        },
        EngineEvent::HealthChecked(result) => Msg::HealthReported {
            summary: match result {
                Ok(health) => health_summary(&health),
                Err(err) => format!("backend unreachable: {err}"),
            },
        },
        EngineEvent::AlbumSearchFinished { query, result } => match result {
            Ok(albums) => Msg::AlbumSearchCompleted {
                query,
                albums: albums.into_iter().map(map_album).collect(),
            },
            Err(err) => {
                tracker_warn!("Album search for {:?} failed: {:?}", query, err.kind);
                Msg::AlbumSearchFailed {
                    query,
                    detail: err.message,
                }
            }
        },
        EngineEvent::AlbumFetched { album_id, result } => match result {
            Ok(details) => Msg::AlbumDetailsLoaded {
                album_id: AlbumId::from(album_id),
                tracks: details.tracks.into_iter().map(map_track).collect(),
            },
            Err(err) => Msg::AlbumDetailsFailed {
                album_id: AlbumId::from(album_id),
                detail: err.message,
            },
        },
        EngineEvent::AlbumSubmitted { album_id, result } => match result {
            Ok(ack) => Msg::AlbumDownloadAccepted {
                album_id: AlbumId::from(album_id),
                total_tracks: ack.total_tracks,
            },
            Err(err) => Msg::AlbumDownloadRejected {
                album_id: AlbumId::from(album_id),
                detail: err.message,
            },
        },
        EngineEvent::AlbumStatusPolled { album_id, status } => Msg::AlbumStatusPolled {
            album_id: AlbumId::from(album_id),
            progress: map_album_progress(status),
        },
        EngineEvent::AlbumPollFailed { album_id, error } => Msg::AlbumPollFailed {
            album_id: AlbumId::from(album_id),
            reason: error.to_string(),
        },
        EngineEvent::AlbumLineExpired {
            album_id,
            generation,
        } => Msg::AlbumLineExpired {
            album_id: AlbumId::from(album_id),
            generation,
        },
        EngineEvent::CandidatesFetched { track_id, result } => match result {
            Ok(found) => Msg::CandidatesLoaded {
                track_id: TrackId::from(track_id),
                candidates: found.candidates.into_iter().map(map_candidate).collect(),
            },
            Err(err) => Msg::CandidatesFailed {
                track_id: TrackId::from(track_id),
                detail: err.message,
            },
        },
    }
}

fn map_hit(hit: TrackHit) -> SearchHit {
    SearchHit {
        track: map_track(hit.track),
        downloaded: hit.downloaded,
    }
}

fn map_track(record: TrackRecord) -> Track {
    let artist = if record.artist.is_empty() {
        record.artists.join(", ")
    } else {
        record.artist
    };
    Track {
        id: TrackId::from(record.id),
        name: record.name,
        artist,
        artists: record.artists,
        album: record.album,
        duration_ms: record.duration_ms,
        artwork: record.album_art,
        release_date: record.release_date,
        external_url: record.external_url,
    }
}

fn map_album(record: AlbumRecord) -> Album {
    Album {
        id: AlbumId::from(record.id),
        name: record.name,
        artist: record.artist,
        total_tracks: record.total_tracks,
        release_date: record.release_date,
        artwork: record.album_art,
    }
}

fn map_album_progress(record: AlbumStatusRecord) -> AlbumProgress {
    AlbumProgress {
        status: StatusKind::parse(&record.status),
        total: record.total_tracks,
        completed: record.completed_tracks,
        failed: record.failed_tracks,
        current_track: record.current_track,
    }
}

fn map_candidate(record: CandidateRecord) -> Candidate {
    Candidate {
        duration_secs: record.duration_secs(),
        confidence: record.confidence_percent(),
        video_id: record.video_id,
        title: record.title,
        channel: record.channel,
    }
}

fn map_status(record: StatusRecord) -> DownloadStatus {
    DownloadStatus {
        status: StatusKind::parse(&record.status),
        message: record.message,
        download_url: record.download_url,
        file_path: record.file_path,
        progress: record.progress.map(|p| p.min(100) as u8),
        stage: record.stage,
    }
}

fn health_summary(health: &HealthRecord) -> String {
    let catalog = if health.spotify_configured {
        "configured"
    } else {
        "not configured"
    };
    match &health.navidrome_path {
        Some(path) => format!(
            "backend {}, catalog {}, library at {}",
            health.status, catalog, path
        ),
        None => format!("backend {}, catalog {}", health.status, catalog),
    }
}
