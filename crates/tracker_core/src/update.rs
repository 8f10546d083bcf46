use crate::transition::{decide, Delivery, PollOutcome, Transition};
use crate::{
    AlbumId, AlbumProgress, AppState, CardAction, DownloadStatus, Effect, Msg, StatusKind, TrackId,
    ALBUM_SEARCH_LIMIT, SEARCH_LIMIT,
};

/// Line text when an album status poll fails.
pub const ALBUM_POLL_FAILURE_MESSAGE: &str = "Failed to check album status";

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::SearchSubmitted { query } => {
            let query = query.trim();
            if query.is_empty() {
                return (state, Vec::new());
            }
            state.begin_search(query.to_string());
            vec![Effect::Search {
                query: query.to_string(),
                limit: SEARCH_LIMIT,
            }]
        }
        Msg::SearchCompleted { query, hits } => {
            state.accept_results(&query, hits);
            Vec::new()
        }
        Msg::SearchFailed { query, detail } => {
            state.fail_search(&query, detail);
            Vec::new()
        }
        Msg::DownloadClicked { track_id, location } => {
            if state.begin_download(&track_id) {
                vec![Effect::SubmitDownload {
                    track_id,
                    location,
                    video_id: None,
                }]
            } else {
                Vec::new()
            }
        }
        Msg::CandidatesRequested { track_id } => {
            if state.card(&track_id).is_none() {
                return (state, Vec::new());
            }
            state.begin_candidates(track_id.clone());
            vec![Effect::FetchCandidates { track_id }]
        }
        Msg::CandidatesLoaded {
            track_id,
            candidates,
        } => {
            state.settle_candidates(&track_id, Ok(candidates));
            Vec::new()
        }
        Msg::CandidatesFailed { track_id, detail } => {
            state.settle_candidates(&track_id, Err(detail));
            Vec::new()
        }
        Msg::CandidateChosen {
            track_id,
            video_id,
            location,
        } => {
            if state.begin_download(&track_id) {
                state.clear_candidates();
                vec![Effect::SubmitDownload {
                    track_id,
                    location,
                    video_id: Some(video_id),
                }]
            } else {
                Vec::new()
            }
        }
        Msg::DownloadAccepted { track_id } => {
            // A late ack for a rolled-back or finished download starts nothing.
            if !state.registry().contains(&track_id) {
                return (state, Vec::new());
            }
            let label = state.line_label(&track_id);
            state.panel_mut().show_queued(track_id.clone(), label);
            state.mark_dirty();
            vec![Effect::StartPolling { track_id }]
        }
        Msg::DownloadRejected { track_id, detail } => {
            if state.registry_mut().remove(&track_id).is_some() {
                state.set_card_action(&track_id, CardAction::Download);
                state.set_banner(detail);
            }
            Vec::new()
        }
        Msg::StatusPolled { track_id, status } => apply_poll(&mut state, track_id, Some(status)),
        Msg::PollFailed { track_id, .. } => apply_poll(&mut state, track_id, None),
        Msg::StatusLineExpired {
            track_id,
            generation,
        } => {
            if state.panel_mut().expire(&track_id, generation) {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::FileSaved { track_id, path } => {
            if state.panel_mut().set_message(&track_id, format!("Saved to {path}")) {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::FileSaveFailed { track_id, reason } => {
            let text = format!("Could not save file: {reason}");
            state.panel_mut().fail(&track_id, text.clone());
            state.set_banner(text);
            Vec::new()
        }
        Msg::AlbumSearchSubmitted { query } => {
            let query = query.trim();
            if query.is_empty() {
                return (state, Vec::new());
            }
            state.begin_album_search(query.to_string());
            vec![Effect::SearchAlbums {
                query: query.to_string(),
                limit: ALBUM_SEARCH_LIMIT,
            }]
        }
        Msg::AlbumSearchCompleted { query, albums } => {
            state.accept_albums(&query, albums);
            Vec::new()
        }
        Msg::AlbumSearchFailed { query, detail } => {
            state.fail_album_search(&query, detail);
            Vec::new()
        }
        Msg::AlbumDetailsRequested { album_id } => {
            state.begin_album_details(album_id.clone());
            vec![Effect::FetchAlbum { album_id }]
        }
        Msg::AlbumDetailsLoaded { album_id, tracks } => {
            state.settle_album_details(&album_id, Ok(tracks));
            Vec::new()
        }
        Msg::AlbumDetailsFailed { album_id, detail } => {
            state.settle_album_details(&album_id, Err(detail));
            Vec::new()
        }
        Msg::AlbumDownloadClicked { album_id, location } => {
            if state.album_downloads_mut().begin(&album_id) {
                state.mark_dirty();
                vec![Effect::SubmitAlbumDownload { album_id, location }]
            } else {
                Vec::new()
            }
        }
        Msg::AlbumDownloadAccepted {
            album_id,
            total_tracks,
        } => {
            if !state.album_downloads().is_active(&album_id) {
                return (state, Vec::new());
            }
            let label = state.album_label(&album_id);
            state
                .album_downloads_mut()
                .show_queued(album_id.clone(), label, total_tracks);
            state.mark_dirty();
            vec![Effect::StartAlbumPolling { album_id }]
        }
        Msg::AlbumDownloadRejected { album_id, detail } => {
            if state.album_downloads_mut().finish(&album_id) {
                state.set_banner(detail);
            }
            Vec::new()
        }
        Msg::AlbumStatusPolled { album_id, progress } => {
            apply_album_poll(&mut state, album_id, Some(progress))
        }
        Msg::AlbumPollFailed { album_id, .. } => apply_album_poll(&mut state, album_id, None),
        Msg::AlbumLineExpired {
            album_id,
            generation,
        } => {
            if state.album_downloads_mut().expire(&album_id, generation) {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::BannerDismissed => {
            state.dismiss_banner();
            Vec::new()
        }
        Msg::HealthRequested => vec![Effect::CheckHealth],
        Msg::HealthReported { summary } => {
            state.set_health(summary);
            Vec::new()
        }
        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

/// `status` is `None` when the poll itself failed.
fn apply_poll(
    state: &mut AppState,
    track_id: TrackId,
    status: Option<DownloadStatus>,
) -> Vec<Effect> {
    let outcome = match &status {
        Some(status) => PollOutcome::Status(status.clone()),
        None => PollOutcome::Failed,
    };
    let transition = decide(state.registry().get(&track_id), outcome);

    match transition {
        Transition::Ignore => Vec::new(),
        Transition::Continue {
            kind,
            message,
            progress,
            stage,
        } => {
            if let Some(status) = status {
                state.registry_mut().record(&track_id, status);
            }
            state
                .panel_mut()
                .update(&track_id, kind, message, progress, stage);
            state.mark_dirty();
            Vec::new()
        }
        Transition::Completed { message, delivery } => {
            state.registry_mut().remove(&track_id);
            let (progress, stage) = status
                .map(|status| (status.progress, status.stage))
                .unwrap_or_default();
            let generation = state.panel_mut().update(
                &track_id,
                StatusKind::Completed,
                message,
                progress,
                stage,
            );
            state.mark_dirty();

            let mut effects = vec![Effect::StopPolling {
                track_id: track_id.clone(),
            }];
            match delivery {
                Delivery::Save {
                    download_url,
                    filename,
                } => {
                    state.set_card_action(&track_id, CardAction::Download);
                    effects.push(Effect::SaveFile {
                        track_id: track_id.clone(),
                        download_url,
                        filename,
                    });
                }
                Delivery::Library => {
                    state.set_card_action(&track_id, CardAction::Downloaded);
                }
            }
            if let Some(generation) = generation {
                effects.push(Effect::ScheduleStatusLineRemoval {
                    track_id,
                    generation,
                    after: state.status_line_grace(),
                });
            }
            effects
        }
        Transition::Failed { message } => {
            state.registry_mut().remove(&track_id);
            state.set_card_action(&track_id, CardAction::Download);
            state.panel_mut().fail(&track_id, message);
            state.mark_dirty();
            vec![Effect::StopPolling { track_id }]
        }
    }
}

/// Album counterpart of [`apply_poll`]. Polls for albums no longer in
/// flight are ignored.
fn apply_album_poll(
    state: &mut AppState,
    album_id: AlbumId,
    progress: Option<AlbumProgress>,
) -> Vec<Effect> {
    if !state.album_downloads().is_active(&album_id) {
        return Vec::new();
    }
    let progress = match progress {
        Some(progress) if progress.status != StatusKind::Error => progress,
        other => {
            let message = match other {
                Some(progress) => format!(
                    "Album download failed after {}/{} track(s)",
                    progress.completed, progress.total
                ),
                None => ALBUM_POLL_FAILURE_MESSAGE.to_string(),
            };
            let albums = state.album_downloads_mut();
            albums.finish(&album_id);
            albums.fail(&album_id, message);
            state.mark_dirty();
            return vec![Effect::StopAlbumPolling { album_id }];
        }
    };

    let finished = state.album_downloads_mut().apply_progress(&album_id, &progress);
    state.mark_dirty();
    match finished {
        Some(generation) => {
            state.album_downloads_mut().finish(&album_id);
            vec![
                Effect::StopAlbumPolling {
                    album_id: album_id.clone(),
                },
                Effect::ScheduleAlbumLineRemoval {
                    album_id,
                    generation,
                    after: state.status_line_grace(),
                },
            ]
        }
        None => Vec::new(),
    }
}
