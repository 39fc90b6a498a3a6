mod app;
mod commands;
mod state;
mod view;

use crate::app::App;
use crate::commands::{CommandEffect, handle_command, parse_command};
use crate::state::app_settings::AppSettings;
use crate::state::countdown::{Clock, SystemClock};
use crate::state::messages::{NetworkRequest, NetworkResponse, UiEvent};
use crate::state::network::NetworkWorker;
use crate::state::refresher::PeriodicRefresher;
use log::{error, info};
use lovecast_api::client::LovecastApi;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if handle_cli_args() {
        return Ok(());
    }

    better_panic::install();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(AppSettings::log_filter())?)
        .with_writer(std::io::stderr)
        .init();

    let settings = AppSettings::load();
    info!("using backend {}", settings.backend_url);

    let client = LovecastApi::new()
        .with_base_url(settings.backend_url.clone())
        .with_token(settings.token.clone());
    let refresh_interval = settings.refresh_interval;
    let app = App::new(settings);

    let (ui_event_tx, ui_event_rx) = mpsc::channel::<UiEvent>(100);
    let (network_req_tx, network_req_rx) = mpsc::channel::<NetworkRequest>(100);
    let (network_resp_tx, network_resp_rx) = mpsc::channel::<NetworkResponse>(100);

    // Line input
    let input_handler = tokio::spawn(input_handler_task(ui_event_tx.clone()));

    // Network
    let network_worker = NetworkWorker::new(client, network_req_rx, network_resp_tx);
    let network_task = tokio::spawn(network_worker.run());

    // Countdown ticks and snapshot refresh
    let periodic_updater = PeriodicRefresher::new(ui_event_tx.clone(), refresh_interval);
    let periodic_task = tokio::spawn(periodic_updater.run());

    let _ = ui_event_tx.send(UiEvent::AppStarted).await;

    main_loop(app, ui_event_rx, network_req_tx, network_resp_rx).await;

    input_handler.abort();
    network_task.abort();
    periodic_task.abort();

    Ok(())
}

fn handle_cli_args() -> bool {
    let mut args = std::env::args().skip(1);
    let Some(arg) = args.next() else {
        return false;
    };

    match arg.as_str() {
        "-h" | "--help" => {
            println!("{}", usage_text());
            true
        }
        "-V" | "--version" => {
            println!("lovecast {}", env!("CARGO_PKG_VERSION"));
            true
        }
        _ => {
            eprintln!("Unknown argument: {arg}\n\n{}", usage_text());
            std::process::exit(2);
        }
    }
}

fn usage_text() -> &'static str {
    "lovecast - reality-show prediction companion

Usage:
  lovecast
  lovecast --help
  lovecast --version

Environment:
  LOVECAST_BACKEND_URL   Prediction backend base URL (default http://localhost:8000)
  LOVECAST_TOKEN         Bearer token for the signed-in user
  LOVECAST_REFRESH_SECS  Snapshot refresh interval in seconds (default 60)
  LOVECAST_LABELS_JSON   Path to a JSON file overriding history and badge labels
  LOVECAST_LOG           Log filter, falls back to RUST_LOG (default warn)"
}

async fn main_loop(
    mut app: App,
    mut ui_events: mpsc::Receiver<UiEvent>,
    network_requests: mpsc::Sender<NetworkRequest>,
    mut network_responses: mpsc::Receiver<NetworkResponse>,
) {
    let clock = SystemClock;

    loop {
        tokio::select! {
            Some(ui_event) = ui_events.recv() => {
                if !handle_ui_event(ui_event, &mut app, &clock, &network_requests).await {
                    break;
                }
            }

            Some(response) = network_responses.recv() => {
                handle_network_response(response, &mut app);
            }

            else => break,
        }
    }
}

/// Returns false when the loop should stop.
async fn handle_ui_event(
    ui_event: UiEvent,
    app: &mut App,
    clock: &impl Clock,
    network_requests: &mpsc::Sender<NetworkRequest>,
) -> bool {
    let effect = match ui_event {
        UiEvent::AppStarted => {
            println!("{}", view::help_text());
            CommandEffect::send(app.request_overview())
        }
        UiEvent::Command(command) => handle_command(command, app),
        UiEvent::InvalidInput(message) => {
            println!("{message}");
            return true;
        }
        UiEvent::ClockTick => {
            if app.on_clock_tick(clock.now()) {
                println!("Episode predictions are now closed");
            }
            return true;
        }
        UiEvent::RefreshDue => CommandEffect::send(app.request_overview()),
        UiEvent::InputClosed => return false,
    };

    if let Some(output) = effect.output {
        println!("{output}");
    }
    if let Some(request) = effect.request
        && network_requests.send(request).await.is_err()
    {
        error!("network worker stopped");
        return false;
    }
    !effect.quit
}

fn handle_network_response(response: NetworkResponse, app: &mut App) {
    match response {
        NetworkResponse::OverviewLoaded { ticket, overview } => {
            let first_load = app.session.roster().is_empty();
            if app.on_overview_loaded(ticket, overview) && first_load {
                println!("{}", view::render_status(&app.session));
            }
        }
        NetworkResponse::HistoryLoaded { episodes } => {
            app.on_history_loaded(episodes);
            println!("{}", view::render_history(&app.history_rows()));
        }
        NetworkResponse::ProfileLoaded { summary, badges, accuracy } => {
            for name in app.on_profile_loaded(summary, badges, accuracy) {
                println!("New badge earned: {name}");
            }
            if let Some(profile) = &app.profile {
                println!("{}", view::render_profile(profile, &app.settings.labels));
            }
        }
        NetworkResponse::RankingsLoaded { ranking } => {
            app.on_rankings_loaded(ranking);
            if let Some(board) = app.ranking_board() {
                println!("{}", view::render_rankings(&board));
            }
        }
        NetworkResponse::Submitted { submission } => {
            println!("{}", app.on_submitted(&submission));
        }
        NetworkResponse::SubmitFailed { submission, error } => {
            println!("{}", app.on_submit_failed(submission, &error));
        }
        NetworkResponse::Error { message } => {
            error!("Network error: {message}");
            println!("{message}");
            app.on_error(message);
        }
    }
}

async fn input_handler_task(ui_events: mpsc::Sender<UiEvent>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let ui_event = match lines.next_line().await {
            Ok(Some(line)) => match parse_command(&line) {
                Ok(command) => UiEvent::Command(command),
                Err(message) => UiEvent::InvalidInput(message),
            },
            Ok(None) => UiEvent::InputClosed,
            Err(e) => {
                error!("reading input failed: {e}");
                UiEvent::InputClosed
            }
        };
        let closed = matches!(ui_event, UiEvent::InputClosed);
        if ui_events.send(ui_event).await.is_err() || closed {
            break;
        }
    }
}
