use std::path::PathBuf;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use thiserror::Error;
use tracker_logging::{tracker_debug, tracker_info, tracker_warn};

use crate::client::{ClientSettings, ReqwestCatalogClient};
use crate::poller::{ChannelEventSink, EventSink, Pollers, DEFAULT_POLL_INTERVAL};
use crate::{save_artifact, search_with_existence, ApiError, AtomicFileWriter, CatalogClient, EngineEvent};

#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub client: ClientSettings,
    pub poll_interval: Duration,
    /// Where artifacts of local downloads are written.
    pub download_dir: PathBuf,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            client: ClientSettings::default(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            download_dir: PathBuf::from("downloads"),
        }
    }
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to start async runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error("invalid client configuration: {0}")]
    Client(#[from] ApiError),
}

enum EngineCommand {
    Search {
        query: String,
        limit: usize,
    },
    SubmitDownload {
        track_id: String,
        location: String,
        video_id: Option<String>,
    },
    StartPolling {
        track_id: String,
    },
    StopPolling {
        track_id: String,
    },
    SaveFile {
        track_id: String,
        download_url: String,
        filename: String,
    },
    ExpireStatusLine {
        track_id: String,
        generation: u64,
        after: Duration,
    },
    CheckHealth,
    SearchAlbums {
        query: String,
        limit: usize,
    },
    FetchAlbum {
        album_id: String,
    },
    SubmitAlbumDownload {
        album_id: String,
        location: String,
    },
    StartAlbumPolling {
        album_id: String,
    },
    StopAlbumPolling {
        album_id: String,
    },
    ExpireAlbumLine {
        album_id: String,
        generation: u64,
        after: Duration,
    },
    FetchCandidates {
        track_id: String,
    },
    Shutdown,
}

/// Command side of the engine. Dropping it or calling [`EngineHandle::shutdown`]
/// stops every poller.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    worker: Option<thread::JoinHandle<()>>,
}

/// Event side of the engine.
pub struct EngineEvents {
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineEvents {
    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Blocks until the next event; `None` once the engine is gone.
    pub fn recv(&self) -> Option<EngineEvent> {
        self.event_rx.recv().ok()
    }
}

impl EngineHandle {
    pub fn new(settings: EngineSettings) -> Result<(Self, EngineEvents), EngineError> {
        let client: Arc<dyn CatalogClient> = Arc::new(ReqwestCatalogClient::new(&settings.client)?);
        Self::with_client(client, settings)
    }

    /// Builds an engine around any client implementation.
    pub fn with_client(
        client: Arc<dyn CatalogClient>,
        settings: EngineSettings,
    ) -> Result<(Self, EngineEvents), EngineError> {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let runtime = tokio::runtime::Runtime::new()?;
        let sink: Arc<dyn EventSink> = Arc::new(ChannelEventSink::new(event_tx));
        let pollers = Pollers::new(client.clone(), sink.clone(), settings.poll_interval);
        let writer = Arc::new(AtomicFileWriter::new(settings.download_dir));

        let worker = thread::spawn(move || {
            let _guard = runtime.enter();
            let context = CommandContext {
                client,
                sink,
                pollers,
                writer,
            };
            while let Ok(command) = cmd_rx.recv() {
                if matches!(command, EngineCommand::Shutdown) {
                    break;
                }
                context.dispatch(command);
            }
            context.pollers.shutdown();
            tracker_debug!("engine worker exiting");
        });

        Ok((
            Self {
                cmd_tx,
                worker: Some(worker),
            },
            EngineEvents { event_rx },
        ))
    }

    pub fn search(&self, query: impl Into<String>, limit: usize) {
        self.send(EngineCommand::Search {
            query: query.into(),
            limit,
        });
    }

    pub fn submit_download(
        &self,
        track_id: impl Into<String>,
        location: impl Into<String>,
        video_id: Option<String>,
    ) {
        self.send(EngineCommand::SubmitDownload {
            track_id: track_id.into(),
            location: location.into(),
            video_id,
        });
    }

    pub fn start_polling(&self, track_id: impl Into<String>) {
        self.send(EngineCommand::StartPolling {
            track_id: track_id.into(),
        });
    }

    pub fn stop_polling(&self, track_id: impl Into<String>) {
        self.send(EngineCommand::StopPolling {
            track_id: track_id.into(),
        });
    }

    pub fn save_file(
        &self,
        track_id: impl Into<String>,
        download_url: impl Into<String>,
        filename: impl Into<String>,
    ) {
        self.send(EngineCommand::SaveFile {
            track_id: track_id.into(),
            download_url: download_url.into(),
            filename: filename.into(),
        });
    }

    /// Emits `EngineEvent::StatusLineExpired` after `after`.
    pub fn expire_status_line(&self, track_id: impl Into<String>, generation: u64, after: Duration) {
        self.send(EngineCommand::ExpireStatusLine {
            track_id: track_id.into(),
            generation,
            after,
        });
    }

    pub fn check_health(&self) {
        self.send(EngineCommand::CheckHealth);
    }

    pub fn search_albums(&self, query: impl Into<String>, limit: usize) {
        self.send(EngineCommand::SearchAlbums {
            query: query.into(),
            limit,
        });
    }

    pub fn fetch_album(&self, album_id: impl Into<String>) {
        self.send(EngineCommand::FetchAlbum {
            album_id: album_id.into(),
        });
    }

    pub fn submit_album_download(&self, album_id: impl Into<String>, location: impl Into<String>) {
        self.send(EngineCommand::SubmitAlbumDownload {
            album_id: album_id.into(),
            location: location.into(),
        });
    }

    pub fn start_album_polling(&self, album_id: impl Into<String>) {
        self.send(EngineCommand::StartAlbumPolling {
            album_id: album_id.into(),
        });
    }

    pub fn stop_album_polling(&self, album_id: impl Into<String>) {
        self.send(EngineCommand::StopAlbumPolling {
            album_id: album_id.into(),
        });
    }

    /// Emits `EngineEvent::AlbumLineExpired` after `after`.
    pub fn expire_album_line(&self, album_id: impl Into<String>, generation: u64, after: Duration) {
        self.send(EngineCommand::ExpireAlbumLine {
            album_id: album_id.into(),
            generation,
            after,
        });
    }

    pub fn fetch_candidates(&self, track_id: impl Into<String>) {
        self.send(EngineCommand::FetchCandidates {
            track_id: track_id.into(),
        });
    }

    /// Stops all pollers and joins the worker thread.
    pub fn shutdown(mut self) {
        self.stop_worker();
    }

    fn stop_worker(&mut self) {
        let _ = self.cmd_tx.send(EngineCommand::Shutdown);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracker_warn!("engine worker panicked");
            }
        }
    }

    fn send(&self, command: EngineCommand) {
        if self.cmd_tx.send(command).is_err() {
            tracker_warn!("engine worker is gone; command dropped");
        }
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        self.stop_worker();
    }
}

struct CommandContext {
    client: Arc<dyn CatalogClient>,
    sink: Arc<dyn EventSink>,
    pollers: Pollers,
    writer: Arc<AtomicFileWriter>,
}

impl CommandContext {
    /// Runs on the worker thread inside the runtime context.
    fn dispatch(&self, command: EngineCommand) {
        let client = self.client.clone();
        let sink = self.sink.clone();
        match command {
            EngineCommand::Search { query, limit } => {
                tokio::spawn(async move {
                    let result = search_with_existence(client.as_ref(), &query, limit).await;
                    sink.emit(EngineEvent::SearchFinished { query, result });
                });
            }
            EngineCommand::SubmitDownload {
                track_id,
                location,
                video_id,
            } => {
                tracker_info!(track = track_id; "submitting download to {} (video {:?})", location, video_id);
                tokio::spawn(async move {
                    let result = client
                        .submit_download(&track_id, &location, video_id.as_deref())
                        .await;
                    if let Err(err) = &result {
                        tracker_warn!(track = track_id; "submission rejected: {}", err);
                    }
                    sink.emit(EngineEvent::DownloadSubmitted { track_id, result });
                });
            }
            EngineCommand::StartPolling { track_id } => {
                self.pollers.start(&track_id);
            }
            EngineCommand::StopPolling { track_id } => {
                self.pollers.stop(&track_id);
            }
            EngineCommand::SaveFile {
                track_id,
                download_url,
                filename,
            } => {
                let writer = self.writer.clone();
                tokio::spawn(async move {
                    let result = save_artifact(
                        client.as_ref(),
                        writer,
                        &track_id,
                        &download_url,
                        &filename,
                    )
                    .await;
                    sink.emit(EngineEvent::FileSaved { track_id, result });
                });
            }
            EngineCommand::ExpireStatusLine {
                track_id,
                generation,
                after,
            } => {
                tokio::spawn(async move {
                    tokio::time::sleep(after).await;
                    sink.emit(EngineEvent::StatusLineExpired {
                        track_id,
                        generation,
                    });
                });
            }
            EngineCommand::CheckHealth => {
                tokio::spawn(async move {
                    let result = client.health().await;
                    sink.emit(EngineEvent::HealthChecked(result));
                });
            }
            EngineCommand::SearchAlbums { query, limit } => {
                tokio::spawn(async move {
                    let result = client.search_albums(&query, limit).await;
                    sink.emit(EngineEvent::AlbumSearchFinished { query, result });
                });
            }
            EngineCommand::FetchAlbum { album_id } => {
                tokio::spawn(async move {
                    let result = client.album_details(&album_id).await;
                    sink.emit(EngineEvent::AlbumFetched { album_id, result });
                });
            }
            EngineCommand::SubmitAlbumDownload { album_id, location } => {
                tracker_info!(album = album_id; "submitting album download to {}", location);
                tokio::spawn(async move {
                    let result = client.submit_album_download(&album_id, &location).await;
                    if let Err(err) = &result {
                        tracker_warn!(album = album_id; "submission rejected: {}", err);
                    }
                    sink.emit(EngineEvent::AlbumSubmitted { album_id, result });
                });
            }
            EngineCommand::StartAlbumPolling { album_id } => {
                self.pollers.start_album(&album_id);
            }
            EngineCommand::StopAlbumPolling { album_id } => {
                self.pollers.stop_album(&album_id);
            }
            EngineCommand::ExpireAlbumLine {
                album_id,
                generation,
                after,
            } => {
                tokio::spawn(async move {
                    tokio::time::sleep(after).await;
                    sink.emit(EngineEvent::AlbumLineExpired {
                        album_id,
                        generation,
                    });
                });
            }
            EngineCommand::FetchCandidates { track_id } => {
                tokio::spawn(async move {
                    let result = client.youtube_candidates(&track_id).await;
                    sink.emit(EngineEvent::CandidatesFetched { track_id, result });
                });
            }
            EngineCommand::Shutdown => self.pollers.shutdown(),
        }
    }
}
