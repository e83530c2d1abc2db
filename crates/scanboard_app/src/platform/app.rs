use std::sync::mpsc;
use std::thread;

use anyhow::Context;
use client_logging::client_error;
use scanboard_client::ClientConfig;
use scanboard_core::{update, AppState, Effect, Msg};

use super::effects::EffectRunner;
use super::logging::{self, LogDestination};
use super::render;

/// App-level inbox: core messages plus terminal-only controls.
pub(crate) enum AppMsg {
    Core(Msg),
    ShowList,
    Quit,
}

pub fn run_app() -> anyhow::Result<()> {
    logging::initialize(LogDestination::File);

    let config = config_from_env();
    let base_url = config.base_url.clone();
    let (msg_tx, msg_rx) = mpsc::channel::<AppMsg>();

    let runner = EffectRunner::new(config, msg_tx.clone()).context("starting client backend")?;

    spawn_input_thread(msg_tx);

    println!("scanboard — commands: scan <args> | list | clear | quit");

    // Initial wiring: open the push channel, then seed from the server list.
    runner.connect_push();
    runner.fetch_job_list();

    // The dispatch loop is the single writer of the job state. Every signal
    // source (stdin, poll loops, the push stream) funnels through one queue,
    // so updates apply in arrival order.
    let mut state = AppState::new();
    while let Ok(input) = msg_rx.recv() {
        match input {
            AppMsg::Quit => break,
            AppMsg::ShowList => render::print_snapshot(&state.view(), &base_url),
            AppMsg::Core(msg) => {
                if let Msg::SubmissionRejected { failure } = &msg {
                    render::print_error(&failure.to_string());
                }
                let (next, effects) = update(std::mem::take(&mut state), msg);
                state = next;
                for effect in effects {
                    match effect {
                        Effect::JobChanged { job_id, status } => {
                            render::card_changed(&job_id, &status, &base_url);
                        }
                        Effect::JobRemoved { job_id } => render::card_removed(&job_id),
                        other => runner.run(other),
                    }
                }
            }
        }
    }

    Ok(())
}

fn config_from_env() -> ClientConfig {
    let mut config = ClientConfig::default();
    if let Ok(url) = std::env::var("SCANBOARD_URL") {
        config.base_url = url;
    }
    // The bearer credential comes from an outside collaborator; the client
    // only carries it.
    if let Ok(token) = std::env::var("SCANBOARD_TOKEN") {
        config.bearer_token = token;
    }
    config
}

fn spawn_input_thread(tx: mpsc::Sender<AppMsg>) {
    thread::spawn(move || {
        let stdin = std::io::stdin();
        let mut line = String::new();
        loop {
            line.clear();
            match stdin.read_line(&mut line) {
                Ok(0) => {
                    let _ = tx.send(AppMsg::Quit);
                    break;
                }
                Ok(_) => {
                    let Some(msg) = parse_command(line.trim()) else {
                        continue;
                    };
                    let quitting = matches!(msg, AppMsg::Quit);
                    if tx.send(msg).is_err() || quitting {
                        break;
                    }
                }
                Err(err) => {
                    client_error!("stdin read failed: {err}");
                    let _ = tx.send(AppMsg::Quit);
                    break;
                }
            }
        }
    });
}

fn parse_command(line: &str) -> Option<AppMsg> {
    if line.is_empty() {
        return None;
    }
    if let Some(args) = line.strip_prefix("scan ") {
        return Some(AppMsg::Core(Msg::ScanSubmitted(args.to_string())));
    }
    match line {
        // Bare "scan" still goes through; the validator reports it as empty.
        "scan" => Some(AppMsg::Core(Msg::ScanSubmitted(String::new()))),
        "list" => Some(AppMsg::ShowList),
        "clear" => Some(AppMsg::Core(Msg::ClearAllRequested)),
        "quit" | "exit" => Some(AppMsg::Quit),
        other => {
            println!("unknown command: {other}");
            None
        }
    }
}
