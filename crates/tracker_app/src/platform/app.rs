use std::io::{self, BufRead, Write};
use std::sync::mpsc;
use std::thread;

use anyhow::Context;
use chrono::Local;
use tracker_core::{update, AppState, AppViewModel, Msg};
use tracker_logging::{tracker_info, tracker_warn};

use super::config::{config_path, load_config, AppConfig};
use super::effects::EffectRunner;
use super::input::{command_to_msg, parse_command, Command, HELP};
use super::logging;
use super::ui;

/// Everything the app loop reacts to, in arrival order.
pub(crate) enum AppEvent {
    Input(Command),
    InputError(String),
    InputClosed,
    Engine(Msg),
}

pub fn run_app() -> anyhow::Result<()> {
    let path = config_path(std::env::args());
    let (config, config_warning) = match load_config(&path) {
        Ok(config) => (config, None),
        Err(err) => (AppConfig::default(), Some(err)),
    };
    logging::initialize(config.log_destination, config.level_filter());
    if let Some(err) = config_warning {
        tracker_warn!("Using default configuration: {}", err);
        eprintln!("warning: {err}; using defaults");
    }
    tracker_info!(
        "Starting with server {} and download dir {:?}",
        config.server_url,
        config.download_dir
    );

    let (tx, rx) = mpsc::channel::<AppEvent>();
    let runner = EffectRunner::new(config.engine_settings(), tx.clone())
        .context("failed to start the download engine")?;
    spawn_input_reader(tx);

    let mut state = AppState::new().with_status_line_grace(config.status_line_grace());
    let mut out = io::stdout().lock();
    writeln!(out, "{HELP}")?;
    print_view(&mut out, &state.view())?;

    for event in rx {
        let msg = match event {
            AppEvent::InputClosed | AppEvent::Input(Command::Quit) => break,
            AppEvent::Input(Command::Help) => {
                writeln!(out, "{HELP}")?;
                continue;
            }
            AppEvent::Input(Command::Show) => {
                print_view(&mut out, &state.view())?;
                continue;
            }
            AppEvent::Input(Command::Info { index }) => {
                let view = state.view();
                match view.cards.iter().find(|card| card.index == index) {
                    Some(card) => {
                        for line in ui::render::card_details(card) {
                            writeln!(out, "{line}")?;
                        }
                    }
                    None => writeln!(out, "no result #{index}")?,
                }
                continue;
            }
            AppEvent::Input(Command::Config) => {
                writeln!(out, "# {}\n{}", path.display(), config.to_ron()?)?;
                continue;
            }
            AppEvent::Input(command) => match command_to_msg(&state, command) {
                Ok(msg) => msg,
                Err(text) => {
                    writeln!(out, "{text}")?;
                    continue;
                }
            },
            AppEvent::InputError(text) => {
                writeln!(out, "{text}")?;
                continue;
            }
            AppEvent::Engine(msg) => msg,
        };

        let (next, effects) = update(state, msg);
        state = next;
        runner.enqueue(effects);
        if state.consume_dirty() {
            print_view(&mut out, &state.view())?;
        }
    }

    tracker_info!(
        "Shutting down with {} download(s) still tracked",
        state.registry().len()
    );
    runner.shutdown();
    Ok(())
}

fn print_view(out: &mut impl Write, view: &AppViewModel) -> io::Result<()> {
    for line in ui::render::render(view, Local::now()) {
        writeln!(out, "{line}")?;
    }
    write!(out, "> ")?;
    out.flush()
}

fn spawn_input_reader(tx: mpsc::Sender<AppEvent>) {
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let event = match line {
                Ok(line) => match parse_command(&line) {
                    Ok(Some(command)) => AppEvent::Input(command),
                    Ok(None) => continue,
                    Err(text) => AppEvent::InputError(text),
                },
                Err(err) => {
                    tracker_warn!("Reading stdin failed: {}", err);
                    break;
                }
            };
            if tx.send(event).is_err() {
                return;
            }
        }
        let _ = tx.send(AppEvent::InputClosed);
    });
}
