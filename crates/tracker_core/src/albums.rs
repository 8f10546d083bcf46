use std::collections::BTreeSet;

use crate::{AlbumId, AlbumProgress, LineGeneration, StatusKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlbumLine {
    pub album_id: AlbumId,
    pub label: String,
    pub kind: StatusKind,
    pub message: String,
    pub generation: LineGeneration,
}

/// Whole-album downloads: which albums are in flight and their status lines.
///
/// Mirrors the per-track registry and panel on a smaller scale. An album is
/// active from the click until its download finishes, fails, or is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AlbumDownloads {
    active: BTreeSet<AlbumId>,
    lines: Vec<AlbumLine>,
    next_generation: LineGeneration,
}

impl AlbumDownloads {
    /// Marks the album in flight. False if it already is.
    pub fn begin(&mut self, album_id: &AlbumId) -> bool {
        self.active.insert(album_id.clone())
    }

    pub fn is_active(&self, album_id: &AlbumId) -> bool {
        self.active.contains(album_id)
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Clears the in-flight mark. False if the album was not active.
    pub fn finish(&mut self, album_id: &AlbumId) -> bool {
        self.active.remove(album_id)
    }

    /// Replaces any earlier line for the album with a fresh `queued` one.
    pub fn show_queued(&mut self, album_id: AlbumId, label: String, total_tracks: u32) {
        self.lines.retain(|line| line.album_id != album_id);
        let generation = self.bump();
        self.lines.push(AlbumLine {
            album_id,
            label,
            kind: StatusKind::Queued,
            message: format!("Queued, {total_tracks} track(s)"),
            generation,
        });
    }

    /// Applies a poll. Returns the line's generation if it is now finished.
    pub fn apply_progress(
        &mut self,
        album_id: &AlbumId,
        progress: &AlbumProgress,
    ) -> Option<LineGeneration> {
        let line = self.lines.iter_mut().find(|line| &line.album_id == album_id)?;
        let finished = progress.is_finished();
        line.message = progress_message(progress, finished);
        line.kind = if finished {
            StatusKind::Completed
        } else {
            progress.status.clone()
        };
        finished.then_some(line.generation)
    }

    /// Turns the line into a persistent error line.
    pub fn fail(&mut self, album_id: &AlbumId, message: impl Into<String>) -> bool {
        let generation = self.bump();
        match self.lines.iter_mut().find(|line| &line.album_id == album_id) {
            Some(line) => {
                line.kind = StatusKind::Error;
                line.message = message.into();
                line.generation = generation;
                true
            }
            None => false,
        }
    }

    /// Removes the line if it still has the given generation.
    pub fn expire(&mut self, album_id: &AlbumId, generation: LineGeneration) -> bool {
        let before = self.lines.len();
        self.lines
            .retain(|line| !(&line.album_id == album_id && line.generation == generation));
        self.lines.len() != before
    }

    pub fn lines(&self) -> &[AlbumLine] {
        &self.lines
    }

    fn bump(&mut self) -> LineGeneration {
        self.next_generation += 1;
        self.next_generation
    }
}

fn progress_message(progress: &AlbumProgress, finished: bool) -> String {
    let mut message = format!("{}/{} done", progress.completed, progress.total);
    if progress.failed > 0 {
        message.push_str(&format!(", {} failed", progress.failed));
    }
    if !finished {
        if let Some(current) = &progress.current_track {
            message.push_str(&format!(", now {current}"));
        }
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    fn progress(completed: u32, failed: u32) -> AlbumProgress {
        AlbumProgress {
            status: StatusKind::Downloading,
            total: 4,
            completed,
            failed,
            current_track: Some("t9".to_string()),
        }
    }

    #[test]
    fn begin_refuses_album_in_flight() {
        let mut albums = AlbumDownloads::default();
        let id = AlbumId::new("al1");
        assert!(albums.begin(&id));
        assert!(!albums.begin(&id));
        assert!(albums.finish(&id));
        assert!(!albums.finish(&id));
    }

    #[test]
    fn progress_updates_message_until_finished() {
        let mut albums = AlbumDownloads::default();
        let id = AlbumId::new("al1");
        albums.show_queued(id.clone(), "Daft Punk - Discovery".to_string(), 4);
        assert_eq!(albums.lines()[0].message, "Queued, 4 track(s)");

        assert_eq!(albums.apply_progress(&id, &progress(1, 0)), None);
        assert_eq!(albums.lines()[0].kind, StatusKind::Downloading);
        assert_eq!(albums.lines()[0].message, "1/4 done, now t9");

        let generation = albums.apply_progress(&id, &progress(3, 1));
        assert_eq!(generation, Some(albums.lines()[0].generation));
        assert_eq!(albums.lines()[0].kind, StatusKind::Completed);
        assert_eq!(albums.lines()[0].message, "3/4 done, 1 failed");
    }

    #[test]
    fn failed_line_ignores_stale_expiry() {
        let mut albums = AlbumDownloads::default();
        let id = AlbumId::new("al1");
        albums.show_queued(id.clone(), "x".to_string(), 1);
        let stale = albums.lines()[0].generation;
        assert!(albums.fail(&id, "Failed to check album status"));
        assert!(!albums.expire(&id, stale));
        assert_eq!(albums.lines()[0].kind, StatusKind::Error);

        let current = albums.lines()[0].generation;
        assert!(albums.expire(&id, current));
        assert!(albums.lines().is_empty());
    }
}
