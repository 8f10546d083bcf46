use std::sync::Once;
use std::time::Duration;

use tracker_core::transition::{DEFAULT_FILENAME, POLL_FAILURE_MESSAGE};
use tracker_core::{
    update, AppState, CardAction, DownloadStatus, Effect, Location, Msg, SearchHit, StatusKind,
    Track, TrackId, STATUS_LINE_GRACE,
};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(tracker_logging::initialize_for_tests);
}

fn id(raw: &str) -> TrackId {
    TrackId::from(raw)
}

fn with_results(ids: &[&str]) -> AppState {
    let (state, _) = update(
        AppState::new(),
        Msg::SearchSubmitted {
            query: "test".to_string(),
        },
    );
    let hits = ids
        .iter()
        .map(|raw| SearchHit {
            track: Track {
                id: id(raw),
                name: format!("Song {raw}"),
                artist: "B".to_string(),
                album: "C".to_string(),
                duration_ms: 125_000,
                artwork: None,
                release_date: None,
                artists: Vec::new(),
                external_url: None,
            },
            downloaded: false,
        })
        .collect();
    let (state, _) = update(
        state,
        Msg::SearchCompleted {
            query: "test".to_string(),
            hits,
        },
    );
    state
}

/// Clicks download and acknowledges the submission.
fn start_download(state: AppState, raw: &str, location: Location) -> AppState {
    let (state, effects) = update(
        state,
        Msg::DownloadClicked {
            track_id: id(raw),
            location,
        },
    );
    assert_eq!(
        effects,
        vec![Effect::SubmitDownload {
            track_id: id(raw),
            location,
            video_id: None,
        }]
    );
    let (state, effects) = update(state, Msg::DownloadAccepted { track_id: id(raw) });
    assert_eq!(effects, vec![Effect::StartPolling { track_id: id(raw) }]);
    state
}

fn polled(state: AppState, raw: &str, status: DownloadStatus) -> (AppState, Vec<Effect>) {
    update(
        state,
        Msg::StatusPolled {
            track_id: id(raw),
            status,
        },
    )
}

fn action_of(state: &AppState, raw: &str) -> CardAction {
    state.card(&id(raw)).expect("card").action
}

#[test]
fn click_registers_queued_and_disables_control() {
    init_logging();
    let state = with_results(&["1"]);
    let (state, effects) = update(
        state,
        Msg::DownloadClicked {
            track_id: id("1"),
            location: Location::Local,
        },
    );

    assert_eq!(
        effects,
        vec![Effect::SubmitDownload {
            track_id: id("1"),
            location: Location::Local,
            video_id: None,
        }]
    );
    assert_eq!(
        state.registry().get(&id("1")).map(|s| &s.status),
        Some(&StatusKind::Queued)
    );
    assert_eq!(action_of(&state, "1"), CardAction::Downloading);
    // The line only appears once the server accepted the submission.
    assert!(!state.view().panel_visible);
}

#[test]
fn second_click_while_tracked_is_noop() {
    init_logging();
    let state = start_download(with_results(&["1"]), "1", Location::Local);
    let before = state.clone();

    let (state, effects) = update(
        state,
        Msg::DownloadClicked {
            track_id: id("1"),
            location: Location::Navidrome,
        },
    );
    assert!(effects.is_empty());
    assert_eq!(state, before);
}

#[test]
fn unknown_track_click_is_noop() {
    init_logging();
    let state = with_results(&["1"]);
    let (state, effects) = update(
        state,
        Msg::DownloadClicked {
            track_id: id("42"),
            location: Location::Local,
        },
    );
    assert!(effects.is_empty());
    assert!(state.registry().is_empty());
}

#[test]
fn rejected_submission_rolls_back() {
    init_logging();
    let state = with_results(&["1"]);
    let (state, _) = update(
        state,
        Msg::DownloadClicked {
            track_id: id("1"),
            location: Location::Local,
        },
    );
    let (state, effects) = update(
        state,
        Msg::DownloadRejected {
            track_id: id("1"),
            detail: "Spotify service not configured".to_string(),
        },
    );

    assert!(effects.is_empty());
    assert!(state.registry().is_empty());
    assert_eq!(action_of(&state, "1"), CardAction::Download);
    let view = state.view();
    assert_eq!(view.banner.as_deref(), Some("Spotify service not configured"));
    assert!(view.status_lines.is_empty());

    let (state, _) = update(state, Msg::BannerDismissed);
    assert_eq!(state.view().banner, None);
}

#[test]
fn late_ack_after_rollback_starts_nothing() {
    init_logging();
    let state = with_results(&["1"]);
    let (state, _) = update(
        state,
        Msg::DownloadClicked {
            track_id: id("1"),
            location: Location::Local,
        },
    );
    let (state, _) = update(
        state,
        Msg::DownloadRejected {
            track_id: id("1"),
            detail: "nope".to_string(),
        },
    );
    let (state, effects) = update(state, Msg::DownloadAccepted { track_id: id("1") });
    assert!(effects.is_empty());
    assert!(state.view().status_lines.is_empty());
}

#[test]
fn accepted_download_reveals_panel_with_queued_line() {
    init_logging();
    let state = start_download(with_results(&["1"]), "1", Location::Local);
    let view = state.view();
    assert!(view.panel_visible);
    assert_eq!(view.status_lines.len(), 1);
    assert_eq!(view.status_lines[0].kind, StatusKind::Queued);
    assert_eq!(view.status_lines[0].label, "B - Song 1");
}

#[test]
fn downloading_poll_updates_registry_and_line_only() {
    init_logging();
    let state = start_download(with_results(&["1"]), "1", Location::Local);
    let mut status = DownloadStatus::new(StatusKind::Downloading, "Searching YouTube and downloading...");
    status.progress = Some(30);

    let (state, effects) = polled(state, "1", status.clone());

    assert!(effects.is_empty(), "no stop and no removal while downloading");
    assert_eq!(state.registry().get(&id("1")), Some(&status));
    assert_eq!(action_of(&state, "1"), CardAction::Downloading);
    let line = &state.view().status_lines[0];
    assert_eq!(line.kind, StatusKind::Downloading);
    assert_eq!(line.message, "Searching YouTube and downloading...");
    assert_eq!(line.progress, Some(30));
}

#[test]
fn each_poll_replaces_previous_text() {
    init_logging();
    let state = start_download(with_results(&["1"]), "1", Location::Local);
    let (state, _) = polled(
        state,
        "1",
        DownloadStatus::new(StatusKind::Other("processing".into()), "Fetching track info..."),
    );
    let (state, _) = polled(
        state,
        "1",
        DownloadStatus::new(StatusKind::Downloading, "Applying metadata..."),
    );

    let line = &state.view().status_lines[0];
    assert_eq!(line.kind, StatusKind::Downloading);
    assert_eq!(line.message, "Applying metadata...");
    assert_eq!(line.progress, None);
}

#[test]
fn local_completion_saves_once_and_schedules_removal() {
    init_logging();
    let state = start_download(with_results(&["1"]), "1", Location::Local);
    let (state, _) = polled(
        state,
        "1",
        DownloadStatus::new(StatusKind::Downloading, "downloading"),
    );
    let mut done = DownloadStatus::new(StatusKind::Completed, "Track ready for download");
    done.download_url = Some("/files/a.mp3".to_string());
    done.file_path = Some("/tmp/a.mp3".to_string());

    let (state, effects) = polled(state, "1", done.clone());

    let saves: Vec<_> = effects
        .iter()
        .filter(|effect| matches!(effect, Effect::SaveFile { .. }))
        .collect();
    assert_eq!(
        saves,
        vec![&Effect::SaveFile {
            track_id: id("1"),
            download_url: "/files/a.mp3".to_string(),
            filename: "a.mp3".to_string(),
        }]
    );
    assert!(effects.contains(&Effect::StopPolling { track_id: id("1") }));
    let removal = effects
        .iter()
        .find_map(|effect| match effect {
            Effect::ScheduleStatusLineRemoval {
                track_id,
                generation,
                after,
            } => Some((track_id.clone(), *generation, *after)),
            _ => None,
        })
        .expect("removal scheduled");
    assert_eq!(removal.0, id("1"));
    assert_eq!(removal.2, Duration::from_millis(5000));
    assert_eq!(STATUS_LINE_GRACE, Duration::from_millis(5000));

    assert!(!state.registry().contains(&id("1")));
    assert_eq!(action_of(&state, "1"), CardAction::Download);
    let line = &state.view().status_lines[0];
    assert_eq!(line.kind, StatusKind::Completed);
    assert_eq!(line.message, "Saving a.mp3");

    // A duplicate completed poll (already in flight) must not save again.
    let (state, effects) = polled(state, "1", done);
    assert!(effects.is_empty());

    let (state, _) = update(
        state,
        Msg::FileSaved {
            track_id: id("1"),
            path: "downloads/a.mp3".to_string(),
        },
    );
    assert_eq!(state.view().status_lines[0].message, "Saved to downloads/a.mp3");

    let (state, _) = update(
        state,
        Msg::StatusLineExpired {
            track_id: id("1"),
            generation: removal.1,
        },
    );
    let view = state.view();
    assert!(view.status_lines.is_empty());
    assert!(!view.panel_visible);
}

#[test]
fn malformed_file_path_falls_back_to_default_name() {
    init_logging();
    let state = start_download(with_results(&["1"]), "1", Location::Local);
    let mut done = DownloadStatus::new(StatusKind::Completed, "ready");
    done.download_url = Some("api/download/file/1?filename=x".to_string());
    done.file_path = Some("/tmp/".to_string());

    let (_, effects) = polled(state, "1", done);
    assert!(effects.iter().any(|effect| matches!(
        effect,
        Effect::SaveFile { filename, .. } if filename == DEFAULT_FILENAME
    )));
}

#[test]
fn library_completion_swaps_control_for_badge() {
    init_logging();
    let state = start_download(with_results(&["1"]), "1", Location::Navidrome);
    let done = DownloadStatus::new(
        StatusKind::Completed,
        "Track successfully added to Navidrome library",
    );

    let (state, effects) = polled(state, "1", done);

    assert!(!effects
        .iter()
        .any(|effect| matches!(effect, Effect::SaveFile { .. })));
    assert!(effects
        .iter()
        .any(|effect| matches!(effect, Effect::ScheduleStatusLineRemoval { .. })));
    assert!(state.registry().is_empty());
    assert_eq!(action_of(&state, "1"), CardAction::Downloaded);
    assert_eq!(
        state.view().status_lines[0].message,
        "Track successfully added to Navidrome library"
    );
}

#[test]
fn server_error_persists_line_without_removal() {
    init_logging();
    let state = start_download(with_results(&["1"]), "1", Location::Local);
    let failed = DownloadStatus::new(StatusKind::Error, "Download failed: no candidates");

    let (state, effects) = polled(state, "1", failed);

    assert_eq!(effects, vec![Effect::StopPolling { track_id: id("1") }]);
    assert!(state.registry().is_empty());
    assert_eq!(action_of(&state, "1"), CardAction::Download);
    let line = &state.view().status_lines[0];
    assert_eq!(line.kind, StatusKind::Error);
    assert_eq!(line.message, "Download failed: no candidates");
}

#[test]
fn poll_failure_is_terminal() {
    init_logging();
    let state = start_download(with_results(&["1"]), "1", Location::Local);

    let (state, effects) = update(
        state,
        Msg::PollFailed {
            track_id: id("1"),
            reason: "network error".to_string(),
        },
    );

    assert_eq!(effects, vec![Effect::StopPolling { track_id: id("1") }]);
    assert!(state.registry().is_empty());
    assert_eq!(action_of(&state, "1"), CardAction::Download);
    let line = &state.view().status_lines[0];
    assert_eq!(line.kind, StatusKind::Error);
    assert_eq!(line.message, POLL_FAILURE_MESSAGE);

    // Nothing for that id is acted on afterwards.
    let (_, effects) = polled(
        state,
        "1",
        DownloadStatus::new(StatusKind::Downloading, "still going"),
    );
    assert!(effects.is_empty());
}

#[test]
fn retry_after_error_replaces_line_and_ignores_stale_expiry() {
    init_logging();
    let state = start_download(with_results(&["1"]), "1", Location::Local);
    let mut done = DownloadStatus::new(StatusKind::Completed, "ready");
    done.download_url = Some("/files/a.mp3".to_string());
    let (state, effects) = polled(state, "1", done);
    let stale_generation = effects
        .iter()
        .find_map(|effect| match effect {
            Effect::ScheduleStatusLineRemoval { generation, .. } => Some(*generation),
            _ => None,
        })
        .expect("removal scheduled");

    // Download again before the grace period ends.
    let state = start_download(state, "1", Location::Local);
    assert_eq!(state.view().status_lines.len(), 1);
    assert_eq!(state.view().status_lines[0].kind, StatusKind::Queued);

    let (state, _) = update(
        state,
        Msg::StatusLineExpired {
            track_id: id("1"),
            generation: stale_generation,
        },
    );
    assert_eq!(state.view().status_lines.len(), 1);
    assert!(state.view().panel_visible);
}

#[test]
fn concurrent_downloads_do_not_interfere() {
    init_logging();
    let state = with_results(&["1", "2", "3"]);
    let state = start_download(state, "1", Location::Local);
    let state = start_download(state, "2", Location::Navidrome);
    let state = start_download(state, "3", Location::Local);
    assert_eq!(state.registry().len(), 3);

    let (state, _) = update(
        state,
        Msg::PollFailed {
            track_id: id("2"),
            reason: "timeout".to_string(),
        },
    );
    let (state, _) = polled(
        state,
        "3",
        DownloadStatus::new(StatusKind::Downloading, "three"),
    );

    assert!(state.registry().contains(&id("1")));
    assert!(!state.registry().contains(&id("2")));
    assert!(state.registry().contains(&id("3")));
    assert_eq!(action_of(&state, "1"), CardAction::Downloading);
    assert_eq!(action_of(&state, "2"), CardAction::Download);
    assert_eq!(action_of(&state, "3"), CardAction::Downloading);

    let kinds: Vec<_> = state
        .view()
        .status_lines
        .iter()
        .map(|line| (line.track_id.to_string(), line.kind.clone()))
        .collect();
    assert_eq!(
        kinds,
        vec![
            ("1".to_string(), StatusKind::Queued),
            ("2".to_string(), StatusKind::Error),
            ("3".to_string(), StatusKind::Downloading),
        ]
    );
}

#[test]
fn control_is_disabled_only_while_tracked() {
    init_logging();
    let mut state = with_results(&["1", "2"]);
    let steps = vec![
        Msg::DownloadClicked {
            track_id: id("1"),
            location: Location::Local,
        },
        Msg::DownloadAccepted { track_id: id("1") },
        Msg::DownloadClicked {
            track_id: id("2"),
            location: Location::Local,
        },
        Msg::DownloadRejected {
            track_id: id("2"),
            detail: "busy".to_string(),
        },
        Msg::StatusPolled {
            track_id: id("1"),
            status: DownloadStatus::new(StatusKind::Downloading, "x"),
        },
        Msg::StatusPolled {
            track_id: id("1"),
            status: DownloadStatus::new(StatusKind::Error, "failed"),
        },
    ];

    for msg in steps {
        state = update(state, msg).0;
        for card in state.view().cards {
            let tracked = state.registry().contains(&card.track_id);
            assert_eq!(card.action == CardAction::Downloading, tracked);
        }
    }
}

#[test]
fn configured_grace_is_used_for_removal() {
    init_logging();
    let state = AppState::new().with_status_line_grace(Duration::from_millis(50));
    let (state, _) = update(
        state,
        Msg::SearchSubmitted {
            query: "q".to_string(),
        },
    );
    let (state, _) = update(
        state,
        Msg::SearchCompleted {
            query: "q".to_string(),
            hits: vec![SearchHit {
                track: Track {
                    id: id("1"),
                    name: "A".to_string(),
                    artist: "B".to_string(),
                    album: "C".to_string(),
                    duration_ms: 1,
                    artwork: None,
                    release_date: None,
                    artists: Vec::new(),
                    external_url: None,
                },
                downloaded: false,
            }],
        },
    );
    let state = start_download(state, "1", Location::Navidrome);
    let (_, effects) = polled(state, "1", DownloadStatus::new(StatusKind::Completed, "done"));
    assert!(effects.iter().any(|effect| matches!(
        effect,
        Effect::ScheduleStatusLineRemoval { after, .. } if *after == Duration::from_millis(50)
    )));
}

#[test]
fn processing_stage_is_shown_on_the_line() {
    init_logging();
    let state = start_download(with_results(&["1"]), "1", Location::Local);
    let mut status = DownloadStatus::new(
        StatusKind::Other("processing".into()),
        "Searching YouTube and downloading...",
    );
    status.stage = Some("downloading".to_string());
    status.progress = Some(30);

    let (state, _) = polled(state, "1", status);

    let line = &state.view().status_lines[0];
    assert_eq!(line.kind, StatusKind::Other("processing".into()));
    assert_eq!(line.stage.as_deref(), Some("downloading"));
    assert_eq!(line.progress, Some(30));

    let (state, _) = polled(
        state,
        "1",
        DownloadStatus::new(StatusKind::Other("processing".into()), "no stage reported"),
    );
    assert_eq!(state.view().status_lines[0].stage, None);
}

#[test]
fn failed_save_turns_line_into_persistent_error() {
    init_logging();
    let state = start_download(with_results(&["1"]), "1", Location::Local);
    let mut done = DownloadStatus::new(StatusKind::Completed, "Track ready for download");
    done.download_url = Some("/files/a.mp3".to_string());
    done.file_path = Some("/tmp/a.mp3".to_string());
    let (state, effects) = polled(state, "1", done);
    let generation = effects
        .iter()
        .find_map(|effect| match effect {
            Effect::ScheduleStatusLineRemoval { generation, .. } => Some(*generation),
            _ => None,
        })
        .expect("removal scheduled");

    let (state, _) = update(
        state,
        Msg::FileSaveFailed {
            track_id: id("1"),
            reason: "disk full".to_string(),
        },
    );
    let (state, _) = update(
        state,
        Msg::StatusLineExpired {
            track_id: id("1"),
            generation,
        },
    );

    let view = state.view();
    assert_eq!(view.status_lines.len(), 1);
    assert_eq!(view.status_lines[0].kind, StatusKind::Error);
    assert_eq!(view.status_lines[0].message, "Could not save file: disk full");
    assert_eq!(view.banner.as_deref(), Some("Could not save file: disk full"));
    assert_eq!(action_of(&state, "1"), CardAction::Download);
}
