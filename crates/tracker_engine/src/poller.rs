//! Per-track and per-album status pollers.
//!
//! Each tracked download gets its own task that waits one interval, asks for
//! the status, reports it, and repeats until the status is terminal or the
//! request fails. Polls of one target never overlap: the next interval starts
//! only after the previous request settled. Tracks and albums live in separate
//! key spaces, so a track and an album may share an id.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracker_logging::{tracker_debug, tracker_info, tracker_warn};

use crate::{AlbumKey, CatalogClient, EngineEvent, TrackKey};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);

pub trait EventSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelEventSink {
    tx: std::sync::mpsc::Sender<EngineEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: std::sync::mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum PollTarget {
    Track(TrackKey),
    Album(AlbumKey),
}

struct ActivePoll {
    serial: u64,
    token: CancellationToken,
}

/// Start/stop handles for all running pollers.
#[derive(Clone)]
pub struct Pollers {
    client: Arc<dyn CatalogClient>,
    sink: Arc<dyn EventSink>,
    interval: Duration,
    root: CancellationToken,
    active: Arc<Mutex<HashMap<PollTarget, ActivePoll>>>,
    next_serial: Arc<AtomicU64>,
}

impl Pollers {
    pub fn new(client: Arc<dyn CatalogClient>, sink: Arc<dyn EventSink>, interval: Duration) -> Self {
        Self {
            client,
            sink,
            interval,
            root: CancellationToken::new(),
            active: Arc::new(Mutex::new(HashMap::new())),
            next_serial: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Spawns a poller for the track on the current tokio runtime.
    ///
    /// Returns false, and spawns nothing, if the track already has a running
    /// poller or after [`Pollers::shutdown`].
    pub fn start(&self, track_id: &str) -> bool {
        self.spawn(PollTarget::Track(track_id.to_string()))
    }

    /// Cancels the track's poller. Returns false if none was running.
    pub fn stop(&self, track_id: &str) -> bool {
        self.cancel(&PollTarget::Track(track_id.to_string()))
    }

    pub fn is_polling(&self, track_id: &str) -> bool {
        self.contains(&PollTarget::Track(track_id.to_string()))
    }

    /// Album counterpart of [`Pollers::start`].
    pub fn start_album(&self, album_id: &str) -> bool {
        self.spawn(PollTarget::Album(album_id.to_string()))
    }

    pub fn stop_album(&self, album_id: &str) -> bool {
        self.cancel(&PollTarget::Album(album_id.to_string()))
    }

    pub fn is_polling_album(&self, album_id: &str) -> bool {
        self.contains(&PollTarget::Album(album_id.to_string()))
    }

    fn spawn(&self, target: PollTarget) -> bool {
        if self.root.is_cancelled() {
            return false;
        }
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        if active.contains_key(&target) {
            tracker_debug!("poller for {:?} already running", target);
            return false;
        }
        let serial = self.next_serial.fetch_add(1, Ordering::Relaxed);
        let token = self.root.child_token();
        active.insert(
            target.clone(),
            ActivePoll {
                serial,
                token: token.clone(),
            },
        );
        drop(active);

        let client = self.client.clone();
        let sink = self.sink.clone();
        let registry = self.active.clone();
        let interval = self.interval;
        tokio::spawn(async move {
            run_poller(client.as_ref(), sink.as_ref(), &target, interval, &token).await;
            let mut active = registry.lock().unwrap_or_else(PoisonError::into_inner);
            // A stop followed by a restart may have installed a newer poller.
            if active.get(&target).is_some_and(|poll| poll.serial == serial) {
                active.remove(&target);
            }
        });
        true
    }

    fn cancel(&self, target: &PollTarget) -> bool {
        let removed = self
            .active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(target);
        match removed {
            Some(poll) => {
                poll.token.cancel();
                true
            }
            None => false,
        }
    }

    fn contains(&self, target: &PollTarget) -> bool {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(target)
    }

    pub fn active_count(&self) -> usize {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Cancels every poller and refuses new ones.
    pub fn shutdown(&self) {
        self.root.cancel();
        let drained = {
            let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
            active.drain().count()
        };
        if drained > 0 {
            tracker_info!("stopped {} active poller(s)", drained);
        }
    }
}

async fn run_poller(
    client: &dyn CatalogClient,
    sink: &dyn EventSink,
    target: &PollTarget,
    interval: Duration,
    token: &CancellationToken,
) {
    let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tracker_debug!("polling {:?} every {:?}", target, interval);

    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = ticker.tick() => {}
        }
        // Dropping the poll on cancellation also drops its event.
        let keep_polling = tokio::select! {
            _ = token.cancelled() => break,
            keep_polling = poll_once(client, sink, target) => keep_polling,
        };
        if !keep_polling {
            return;
        }
    }
    tracker_debug!("poller for {:?} cancelled", target);
}

/// One status request and its event. Returns whether polling continues.
async fn poll_once(client: &dyn CatalogClient, sink: &dyn EventSink, target: &PollTarget) -> bool {
    match target {
        PollTarget::Track(track_id) => match client.download_status(track_id).await {
            Ok(status) => {
                let terminal = status.is_terminal();
                tracker_debug!(track = track_id; "status {} ({})", status.status, status.message);
                sink.emit(EngineEvent::StatusPolled {
                    track_id: track_id.clone(),
                    status,
                });
                if terminal {
                    tracker_info!(track = track_id; "reached terminal status");
                }
                !terminal
            }
            Err(error) => {
                tracker_warn!(track = track_id; "status poll failed: {} ({})", error, error.kind);
                sink.emit(EngineEvent::PollFailed {
                    track_id: track_id.clone(),
                    error,
                });
                false
            }
        },
        PollTarget::Album(album_id) => match client.album_status(album_id).await {
            Ok(status) => {
                let terminal = status.is_terminal();
                tracker_debug!(
                    album = album_id;
                    "{} of {} done, {} failed",
                    status.completed_tracks,
                    status.total_tracks,
                    status.failed_tracks
                );
                sink.emit(EngineEvent::AlbumStatusPolled {
                    album_id: album_id.clone(),
                    status,
                });
                if terminal {
                    tracker_info!(album = album_id; "album finished");
                }
                !terminal
            }
            Err(error) => {
                tracker_warn!(album = album_id; "status poll failed: {} ({})", error, error.kind);
                sink.emit(EngineEvent::AlbumPollFailed {
                    album_id: album_id.clone(),
                    error,
                });
                false
            }
        },
    }
}
