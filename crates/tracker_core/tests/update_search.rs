use std::sync::Once;

use tracker_core::{
    update, AppState, CardAction, Effect, Location, Msg, SearchHit, Track, TrackId, SEARCH_LIMIT,
};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(tracker_logging::initialize_for_tests);
}

fn track(id: &str, name: &str) -> Track {
    Track {
        id: TrackId::from(id),
        name: name.to_string(),
        artist: "B".to_string(),
        album: "C".to_string(),
        duration_ms: 125_000,
        artwork: None,
        release_date: None,
        artists: Vec::new(),
        external_url: None,
    }
}

fn hit(id: &str, downloaded: bool) -> SearchHit {
    SearchHit {
        track: track(id, "A"),
        downloaded,
    }
}

fn search(state: AppState, query: &str) -> (AppState, Vec<Effect>) {
    update(
        state,
        Msg::SearchSubmitted {
            query: query.to_string(),
        },
    )
}

#[test]
fn search_emits_effect_with_fixed_limit() {
    init_logging();
    let (mut state, effects) = search(AppState::new(), "  test  ");

    assert_eq!(
        effects,
        vec![Effect::Search {
            query: "test".to_string(),
            limit: SEARCH_LIMIT,
        }]
    );
    assert_eq!(SEARCH_LIMIT, 20);
    let view = state.view();
    assert!(view.searching);
    assert_eq!(view.query, "test");
    assert!(state.consume_dirty());
}

#[test]
fn blank_query_is_ignored() {
    init_logging();
    let (mut state, effects) = search(AppState::new(), "   ");
    assert!(effects.is_empty());
    assert!(!state.consume_dirty());
    assert!(!state.view().searching);
}

#[test]
fn results_render_artist_and_duration() {
    init_logging();
    let (state, _) = search(AppState::new(), "test");
    let (state, effects) = update(
        state,
        Msg::SearchCompleted {
            query: "test".to_string(),
            hits: vec![hit("1", false)],
        },
    );

    assert!(effects.is_empty());
    let view = state.view();
    assert!(!view.searching);
    assert_eq!(view.cards.len(), 1);
    let card = &view.cards[0];
    assert_eq!(card.index, 1);
    assert_eq!(card.name, "A");
    assert_eq!(card.artist, "B");
    assert_eq!(card.album, "C");
    assert_eq!(card.duration, "2:05");
    assert_eq!(card.action, CardAction::Download);
}

#[test]
fn cards_carry_credits_link_and_release_year() {
    init_logging();
    let (state, _) = search(AppState::new(), "test");
    let mut credited = track("1", "Get Lucky");
    credited.artists = vec!["Daft Punk".to_string(), "Pharrell Williams".to_string()];
    credited.release_date = Some("2013-04-19".to_string());
    credited.external_url = Some("https://open.spotify.com/track/1".to_string());
    let (state, _) = update(
        state,
        Msg::SearchCompleted {
            query: "test".to_string(),
            hits: vec![SearchHit {
                track: credited,
                downloaded: false,
            }],
        },
    );

    let card = &state.view().cards[0];
    assert_eq!(card.artists, vec!["Daft Punk", "Pharrell Williams"]);
    assert_eq!(card.release_year.as_deref(), Some("2013"));
    assert_eq!(card.release_date.as_deref(), Some("2013-04-19"));
    assert_eq!(
        card.external_url.as_deref(),
        Some("https://open.spotify.com/track/1")
    );
}

#[test]
fn failed_existence_check_still_gets_a_control() {
    init_logging();
    let (state, _) = search(AppState::new(), "mix");
    // The engine reports failed checks as not downloaded.
    let (state, _) = update(
        state,
        Msg::SearchCompleted {
            query: "mix".to_string(),
            hits: vec![hit("1", true), hit("2", false), hit("3", true)],
        },
    );

    let actions: Vec<_> = state.view().cards.iter().map(|c| c.action).collect();
    assert_eq!(
        actions,
        vec![
            CardAction::Downloaded,
            CardAction::Download,
            CardAction::Downloaded
        ]
    );

    let (_, effects) = update(
        state,
        Msg::DownloadClicked {
            track_id: TrackId::from("1"),
            location: Location::Local,
        },
    );
    assert!(effects.is_empty(), "downloaded cards have no control");
}

#[test]
fn search_failure_shows_detail_and_clears_results() {
    init_logging();
    let (state, _) = search(AppState::new(), "first");
    let (state, _) = update(
        state,
        Msg::SearchCompleted {
            query: "first".to_string(),
            hits: vec![hit("1", false)],
        },
    );
    let (state, _) = search(state, "second");
    let (state, _) = update(
        state,
        Msg::SearchFailed {
            query: "second".to_string(),
            detail: "Spotify service not configured".to_string(),
        },
    );

    let view = state.view();
    assert_eq!(
        view.search_error.as_deref(),
        Some("Spotify service not configured")
    );
    assert!(view.cards.is_empty());
    assert!(!view.searching);
}

#[test]
fn superseded_results_are_dropped() {
    init_logging();
    let (state, _) = search(AppState::new(), "old");
    let (mut state, _) = search(state, "new");
    assert!(state.consume_dirty());

    let (mut state, _) = update(
        state,
        Msg::SearchCompleted {
            query: "old".to_string(),
            hits: vec![hit("1", false)],
        },
    );
    assert!(state.view().cards.is_empty());
    assert!(state.view().searching);
    assert!(!state.consume_dirty());
}

#[test]
fn tracked_download_survives_a_new_search() {
    init_logging();
    let (state, _) = search(AppState::new(), "q");
    let (state, _) = update(
        state,
        Msg::SearchCompleted {
            query: "q".to_string(),
            hits: vec![hit("1", false)],
        },
    );
    let (state, _) = update(
        state,
        Msg::DownloadClicked {
            track_id: TrackId::from("1"),
            location: Location::Local,
        },
    );

    let (state, _) = search(state, "q2");
    let (state, _) = update(
        state,
        Msg::SearchCompleted {
            query: "q2".to_string(),
            hits: vec![hit("1", false), hit("2", false)],
        },
    );

    let actions: Vec<_> = state.view().cards.iter().map(|c| c.action).collect();
    assert_eq!(actions, vec![CardAction::Downloading, CardAction::Download]);
    assert_eq!(state.view().active_downloads, 1);
}
