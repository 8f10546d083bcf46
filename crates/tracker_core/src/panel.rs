use crate::{StatusKind, TrackId};

/// Monotonic counter distinguishing successive lines for the same track.
pub type LineGeneration = u64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub track_id: TrackId,
    pub label: String,
    pub kind: StatusKind,
    pub message: String,
    pub progress: Option<u8>,
    /// Server-reported step, e.g. `downloading` or `tagging`.
    pub stage: Option<String>,
    pub generation: LineGeneration,
}

/// The ordered list of visible status lines, one per track at most.
///
/// Lines outlive registry entries: a completed line stays until its expiry
/// fires, an error line until a new download of that track replaces it.
/// Every mutation tolerates the line being gone already.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatusPanel {
    lines: Vec<StatusLine>,
    visible: bool,
    next_generation: LineGeneration,
}

impl StatusPanel {
    /// Appends a fresh `queued` line, dropping any older line for the track.
    /// Reveals the panel. Returns the new line's generation.
    pub fn show_queued(&mut self, track_id: TrackId, label: String) -> LineGeneration {
        self.lines.retain(|line| line.track_id != track_id);
        self.next_generation += 1;
        let generation = self.next_generation;
        self.lines.push(StatusLine {
            track_id,
            label,
            kind: StatusKind::Queued,
            message: "Queued".to_string(),
            progress: None,
            stage: None,
            generation,
        });
        self.visible = true;
        generation
    }

    /// Replaces kind, message, progress and stage of the track's line.
    pub fn update(
        &mut self,
        track_id: &TrackId,
        kind: StatusKind,
        message: impl Into<String>,
        progress: Option<u8>,
        stage: Option<String>,
    ) -> Option<LineGeneration> {
        let line = self.lines.iter_mut().find(|line| &line.track_id == track_id)?;
        line.kind = kind;
        line.message = message.into();
        line.progress = progress;
        line.stage = stage;
        Some(line.generation)
    }

    /// Turns the line into an error line under a fresh generation, so a
    /// removal already scheduled for it no longer applies. Returns false if
    /// the line is gone.
    pub fn fail(&mut self, track_id: &TrackId, message: impl Into<String>) -> bool {
        self.next_generation += 1;
        let generation = self.next_generation;
        match self.lines.iter_mut().find(|line| &line.track_id == track_id) {
            Some(line) => {
                line.kind = StatusKind::Error;
                line.message = message.into();
                line.progress = None;
                line.stage = None;
                line.generation = generation;
                true
            }
            None => false,
        }
    }

    /// Replaces only the message, keeping the kind.
    pub fn set_message(&mut self, track_id: &TrackId, message: impl Into<String>) -> bool {
        match self.lines.iter_mut().find(|line| &line.track_id == track_id) {
            Some(line) => {
                line.message = message.into();
                true
            }
            None => false,
        }
    }

    /// Removes the line if it still has the given generation. Hides the panel
    /// once the last line is gone.
    pub fn expire(&mut self, track_id: &TrackId, generation: LineGeneration) -> bool {
        let before = self.lines.len();
        self.lines
            .retain(|line| !(&line.track_id == track_id && line.generation == generation));
        let removed = self.lines.len() != before;
        if removed && self.lines.is_empty() {
            self.visible = false;
        }
        removed
    }

    pub fn line(&self, track_id: &TrackId) -> Option<&StatusLine> {
        self.lines.iter().find(|line| &line.track_id == track_id)
    }

    pub fn lines(&self) -> &[StatusLine] {
        &self.lines
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }
}
