use std::time::Duration;

use crate::types::release_year;
use crate::view_model::{
    format_duration, AlbumCardView, AlbumDetailsView, AlbumLineView, AppViewModel, CandidateView,
    CandidatesView, StatusLineView, TrackCardView,
};
use crate::{
    Album, AlbumDownloads, AlbumId, Candidate, DownloadRegistry, SearchHit, StatusPanel, Track,
    TrackId,
};

/// Results requested per search.
pub const SEARCH_LIMIT: usize = 20;
/// Results requested per album search.
pub const ALBUM_SEARCH_LIMIT: usize = 20;
/// How long a completed status line stays visible.
pub const STATUS_LINE_GRACE: Duration = Duration::from_millis(5000);

/// What a result card offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardAction {
    /// Enabled download control.
    Download,
    /// Disabled control while the track is tracked.
    Downloading,
    /// Persistent badge; no control.
    Downloaded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackCard {
    pub track: Track,
    pub action: CardAction,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct SearchState {
    query: String,
    pending: bool,
    error: Option<String>,
}

/// The album whose track list was last requested.
#[derive(Debug, Clone, PartialEq, Eq)]
struct AlbumDetails {
    album_id: AlbumId,
    loading: bool,
    error: Option<String>,
    tracks: Vec<Track>,
}

/// Candidate videos for one result card.
#[derive(Debug, Clone, PartialEq, Eq)]
struct CandidateList {
    track_id: TrackId,
    loading: bool,
    error: Option<String>,
    items: Vec<Candidate>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    search: SearchState,
    cards: Vec<TrackCard>,
    album_search: SearchState,
    albums: Vec<Album>,
    album_details: Option<AlbumDetails>,
    candidates: Option<CandidateList>,
    album_downloads: AlbumDownloads,
    registry: DownloadRegistry,
    panel: StatusPanel,
    banner: Option<String>,
    health: Option<String>,
    status_line_grace: Duration,
    dirty: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            search: SearchState::default(),
            cards: Vec::new(),
            album_search: SearchState::default(),
            albums: Vec::new(),
            album_details: None,
            candidates: None,
            album_downloads: AlbumDownloads::default(),
            registry: DownloadRegistry::new(),
            panel: StatusPanel::default(),
            banner: None,
            health: None,
            status_line_grace: STATUS_LINE_GRACE,
            dirty: false,
        }
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status_line_grace(mut self, grace: Duration) -> Self {
        self.status_line_grace = grace;
        self
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel {
            query: self.search.query.clone(),
            searching: self.search.pending,
            search_error: self.search.error.clone(),
            cards: self
                .cards
                .iter()
                .enumerate()
                .map(|(idx, card)| TrackCardView {
                    index: idx + 1,
                    track_id: card.track.id.clone(),
                    name: card.track.name.clone(),
                    artist: card.track.artist.clone(),
                    album: card.track.album.clone(),
                    duration: format_duration(card.track.duration_ms),
                    artwork: card.track.artwork.clone(),
                    artists: card.track.artists.clone(),
                    release_year: card.track.release_year().map(str::to_string),
                    release_date: card.track.release_date.clone(),
                    external_url: card.track.external_url.clone(),
                    action: card.action,
                })
                .collect(),
            panel_visible: self.panel.is_visible(),
            status_lines: self
                .panel
                .lines()
                .iter()
                .map(|line| StatusLineView {
                    track_id: line.track_id.clone(),
                    label: line.label.clone(),
                    kind: line.kind.clone(),
                    message: line.message.clone(),
                    progress: line.progress,
                    stage: line.stage.clone(),
                })
                .collect(),
            active_downloads: self.registry.len(),
            banner: self.banner.clone(),
            health: self.health.clone(),
            album_query: self.album_search.query.clone(),
            album_searching: self.album_search.pending,
            album_search_error: self.album_search.error.clone(),
            albums: self
                .albums
                .iter()
                .enumerate()
                .map(|(idx, album)| AlbumCardView {
                    index: idx + 1,
                    album_id: album.id.clone(),
                    name: album.name.clone(),
                    artist: album.artist.clone(),
                    total_tracks: album.total_tracks,
                    release_year: release_year(album.release_date.as_deref()).map(str::to_string),
                    artwork: album.artwork.clone(),
                    downloading: self.album_downloads.is_active(&album.id),
                })
                .collect(),
            album_details: self.album_details.as_ref().map(|details| AlbumDetailsView {
                album_id: details.album_id.clone(),
                title: self.album_label(&details.album_id),
                loading: details.loading,
                error: details.error.clone(),
                tracks: details
                    .tracks
                    .iter()
                    .map(|track| (track.name.clone(), format_duration(track.duration_ms)))
                    .collect(),
            }),
            candidates: self.candidates.as_ref().map(|list| CandidatesView {
                track_id: list.track_id.clone(),
                label: self.line_label(&list.track_id),
                loading: list.loading,
                error: list.error.clone(),
                items: list
                    .items
                    .iter()
                    .enumerate()
                    .map(|(idx, candidate)| CandidateView {
                        index: idx + 1,
                        video_id: candidate.video_id.clone(),
                        title: candidate.title.clone(),
                        channel: candidate.channel.clone(),
                        duration: candidate
                            .duration_secs
                            .map(|secs| format_duration(secs.saturating_mul(1000))),
                        confidence: candidate.confidence,
                    })
                    .collect(),
            }),
            album_lines: self
                .album_downloads
                .lines()
                .iter()
                .map(|line| AlbumLineView {
                    album_id: line.album_id.clone(),
                    label: line.label.clone(),
                    kind: line.kind.clone(),
                    message: line.message.clone(),
                })
                .collect(),
            active_album_downloads: self.album_downloads.active_count(),
            dirty: self.dirty,
        }
    }

    /// Returns whether anything changed since the last call, and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn registry(&self) -> &DownloadRegistry {
        &self.registry
    }

    pub fn panel(&self) -> &StatusPanel {
        &self.panel
    }

    pub fn card(&self, track_id: &TrackId) -> Option<&TrackCard> {
        self.cards.iter().find(|card| &card.track.id == track_id)
    }

    /// Resolves a 1-based card number as shown by the renderer.
    pub fn card_at(&self, index: usize) -> Option<&TrackCard> {
        index.checked_sub(1).and_then(|idx| self.cards.get(idx))
    }

    pub fn album(&self, album_id: &AlbumId) -> Option<&Album> {
        self.albums.iter().find(|album| &album.id == album_id)
    }

    /// Resolves a 1-based album number as shown by the renderer.
    pub fn album_at(&self, index: usize) -> Option<&Album> {
        index.checked_sub(1).and_then(|idx| self.albums.get(idx))
    }

    pub fn album_downloads(&self) -> &AlbumDownloads {
        &self.album_downloads
    }

    /// Resolves a 1-based candidate number to the track it belongs to and the
    /// candidate itself. `None` while candidates are loading.
    pub fn candidate_at(&self, index: usize) -> Option<(&TrackId, &Candidate)> {
        let list = self.candidates.as_ref()?;
        let candidate = index.checked_sub(1).and_then(|idx| list.items.get(idx))?;
        Some((&list.track_id, candidate))
    }

    pub(crate) fn status_line_grace(&self) -> Duration {
        self.status_line_grace
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn begin_search(&mut self, query: String) {
        self.search = SearchState {
            query,
            pending: true,
            error: None,
        };
        self.mark_dirty();
    }

    /// Replaces the cards with fresh results. Results for a superseded query
    /// are dropped.
    pub(crate) fn accept_results(&mut self, query: &str, hits: Vec<SearchHit>) -> bool {
        if query != self.search.query {
            return false;
        }
        self.search.pending = false;
        self.search.error = None;
        self.cards = hits
            .into_iter()
            .map(|hit| {
                let action = if self.registry.contains(&hit.track.id) {
                    CardAction::Downloading
                } else if hit.downloaded {
                    CardAction::Downloaded
                } else {
                    CardAction::Download
                };
                TrackCard {
                    track: hit.track,
                    action,
                }
            })
            .collect();
        self.mark_dirty();
        true
    }

    pub(crate) fn fail_search(&mut self, query: &str, detail: String) -> bool {
        if query != self.search.query {
            return false;
        }
        self.search.pending = false;
        self.search.error = Some(detail);
        self.cards.clear();
        self.mark_dirty();
        true
    }

    /// Registers the track and disables its control. Refuses tracks that are
    /// unknown, already tracked, or already downloaded.
    pub(crate) fn begin_download(&mut self, track_id: &TrackId) -> bool {
        let Some(card) = self.cards.iter_mut().find(|card| &card.track.id == track_id) else {
            return false;
        };
        if card.action != CardAction::Download || self.registry.contains(track_id) {
            return false;
        }
        if !self.registry.register(track_id.clone()) {
            return false;
        }
        card.action = CardAction::Downloading;
        self.mark_dirty();
        true
    }

    pub(crate) fn registry_mut(&mut self) -> &mut DownloadRegistry {
        &mut self.registry
    }

    pub(crate) fn panel_mut(&mut self) -> &mut StatusPanel {
        &mut self.panel
    }

    /// Sets the card's action if the card is currently shown.
    pub(crate) fn set_card_action(&mut self, track_id: &TrackId, action: CardAction) {
        if let Some(card) = self.cards.iter_mut().find(|card| &card.track.id == track_id) {
            card.action = action;
        }
    }

    pub(crate) fn line_label(&self, track_id: &TrackId) -> String {
        self.card(track_id)
            .map(|card| format!("{} - {}", card.track.artist, card.track.name))
            .unwrap_or_else(|| track_id.to_string())
    }

    pub(crate) fn set_banner(&mut self, text: String) {
        self.banner = Some(text);
        self.mark_dirty();
    }

    pub(crate) fn dismiss_banner(&mut self) -> bool {
        let had = self.banner.take().is_some();
        if had {
            self.mark_dirty();
        }
        had
    }

    pub(crate) fn set_health(&mut self, summary: String) {
        self.health = Some(summary);
        self.mark_dirty();
    }

    pub(crate) fn begin_album_search(&mut self, query: String) {
        self.album_search = SearchState {
            query,
            pending: true,
            error: None,
        };
        self.mark_dirty();
    }

    /// Replaces the album results. Results for a superseded query are dropped.
    pub(crate) fn accept_albums(&mut self, query: &str, albums: Vec<Album>) -> bool {
        if query != self.album_search.query {
            return false;
        }
        self.album_search.pending = false;
        self.album_search.error = None;
        self.albums = albums;
        self.mark_dirty();
        true
    }

    pub(crate) fn fail_album_search(&mut self, query: &str, detail: String) -> bool {
        if query != self.album_search.query {
            return false;
        }
        self.album_search.pending = false;
        self.album_search.error = Some(detail);
        self.albums.clear();
        self.mark_dirty();
        true
    }

    pub(crate) fn begin_album_details(&mut self, album_id: AlbumId) {
        self.album_details = Some(AlbumDetails {
            album_id,
            loading: true,
            error: None,
            tracks: Vec::new(),
        });
        self.mark_dirty();
    }

    /// Settles the pending track list. Ignored unless `album_id` is the album
    /// last requested.
    pub(crate) fn settle_album_details(
        &mut self,
        album_id: &AlbumId,
        outcome: Result<Vec<Track>, String>,
    ) -> bool {
        let Some(details) = self
            .album_details
            .as_mut()
            .filter(|details| &details.album_id == album_id)
        else {
            return false;
        };
        details.loading = false;
        match outcome {
            Ok(tracks) => details.tracks = tracks,
            Err(detail) => details.error = Some(detail),
        }
        self.mark_dirty();
        true
    }

    pub(crate) fn album_label(&self, album_id: &AlbumId) -> String {
        self.album(album_id)
            .map(|album| format!("{} - {}", album.artist, album.name))
            .unwrap_or_else(|| album_id.to_string())
    }

    pub(crate) fn album_downloads_mut(&mut self) -> &mut AlbumDownloads {
        &mut self.album_downloads
    }

    pub(crate) fn begin_candidates(&mut self, track_id: TrackId) {
        self.candidates = Some(CandidateList {
            track_id,
            loading: true,
            error: None,
            items: Vec::new(),
        });
        self.mark_dirty();
    }

    /// Settles the pending candidate list. Ignored unless it belongs to the
    /// track last asked about.
    pub(crate) fn settle_candidates(
        &mut self,
        track_id: &TrackId,
        outcome: Result<Vec<Candidate>, String>,
    ) -> bool {
        let Some(list) = self
            .candidates
            .as_mut()
            .filter(|list| &list.track_id == track_id)
        else {
            return false;
        };
        list.loading = false;
        match outcome {
            Ok(items) => list.items = items,
            Err(detail) => list.error = Some(detail),
        }
        self.mark_dirty();
        true
    }

    pub(crate) fn clear_candidates(&mut self) {
        if self.candidates.take().is_some() {
            self.mark_dirty();
        }
    }
}
