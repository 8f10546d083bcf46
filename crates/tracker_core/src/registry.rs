use std::collections::BTreeMap;

use crate::{DownloadStatus, TrackId};

/// Active downloads keyed by track id.
///
/// Holds only what is being tracked right now: an entry exists from the
/// moment a download is initiated until its poller reaches a terminal
/// outcome. There is no history.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DownloadRegistry {
    entries: BTreeMap<TrackId, DownloadStatus>,
}

impl DownloadRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a `queued` entry. Returns false if the track is already tracked.
    pub fn register(&mut self, track_id: TrackId) -> bool {
        if self.entries.contains_key(&track_id) {
            return false;
        }
        self.entries.insert(track_id, DownloadStatus::queued());
        true
    }

    /// Overwrites the entry for a tracked download. Untracked ids are ignored.
    pub fn record(&mut self, track_id: &TrackId, status: DownloadStatus) -> bool {
        match self.entries.get_mut(track_id) {
            Some(entry) => {
                *entry = status;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, track_id: &TrackId) -> Option<DownloadStatus> {
        self.entries.remove(track_id)
    }

    pub fn get(&self, track_id: &TrackId) -> Option<&DownloadStatus> {
        self.entries.get(track_id)
    }

    pub fn contains(&self, track_id: &TrackId) -> bool {
        self.entries.contains_key(track_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TrackId, &DownloadStatus)> {
        self.entries.iter()
    }
}
