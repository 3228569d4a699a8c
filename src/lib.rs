pub mod dashboard;
pub mod events;
pub mod host;
pub mod keyboard;
pub mod live;
pub mod narration;
pub mod protection;
pub mod scheduler;
pub mod sequencer;
pub mod sessions;
pub mod settings;
pub mod storage;
pub mod tour;
mod utils;
pub mod views;

use std::path::PathBuf;
use std::sync::{Arc, Weak};
use std::time::Duration;

use anyhow::{Context, Result};
use log::warn;
use tokio::io::{AsyncBufReadExt, BufReader};

use dashboard::{Dashboard, DashboardHost};
use events::DashboardEvent;
use host::{parse_command, HostCommand, StaticLayout, HELP};
use narration::TimedSpeech;
use scheduler::TokioScheduler;
use settings::SettingsStore;
use storage::JsonFileStore;
use views::RenderTable;

fn data_dir() -> PathBuf {
    std::env::var_os("VITASIGNAL_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(".vitasignal"))
}

pub fn run() -> Result<()> {
    // Initialize logging; RUST_LOG overrides the default level.
    env_logger::Builder::new()
        .filter_level(utils::logging::default_level(utils::logging::debug_from_env()))
        .parse_default_env()
        .init();

    log::info!("VitaSignal demo starting up...");

    let data_dir = data_dir();
    let store = Arc::new(JsonFileStore::new(&data_dir)?);
    let settings_store = SettingsStore::new(data_dir.join("settings.json"))?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;

    let result = runtime.block_on(async move {
        let scheduler = Arc::new(TokioScheduler::from_current()?);
        let settings = settings_store.get();
        let speech = Arc::new(TimedSpeech::new(
            scheduler.clone(),
            settings.narration.words_per_minute,
        ));

        let dashboard = Arc::new(Dashboard::new(
            settings,
            DashboardHost {
                scheduler,
                store,
                speech,
                locator: Arc::new(StaticLayout::standard()),
            },
        ));
        let table = Arc::new(RenderTable::text());
        attach_terminal_renderer(&dashboard, table.clone());

        println!("{HELP}");
        dashboard.start();
        if let Some(panel) = dashboard.render(&table) {
            println!("{panel}");
        }

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            let line = tokio::select! {
                line = lines.next_line() => line.context("failed to read stdin")?,
                _ = tokio::signal::ctrl_c() => None,
            };
            let Some(line) = line else { break };
            if !apply_command(&dashboard, &table, parse_command(&line)) {
                break;
            }
        }

        if let Err(err) = settings_store.remember_live_state(dashboard.live()) {
            warn!("could not save settings: {err:#}");
        }
        dashboard.shutdown();
        log::info!("VitaSignal demo stopped");
        Ok::<(), anyhow::Error>(())
    });

    // A pending stdin read would otherwise keep the runtime alive.
    runtime.shutdown_timeout(Duration::from_millis(200));
    result
}

/// Prints the active panel on view changes and narrates tour steps.
fn attach_terminal_renderer(dashboard: &Arc<Dashboard>, table: Arc<RenderTable>) {
    let weak: Weak<Dashboard> = Arc::downgrade(dashboard);
    dashboard.events().subscribe(move |event| {
        let Some(dashboard) = weak.upgrade() else {
            return;
        };
        match event {
            DashboardEvent::ViewChanged { .. } => {
                if let Some(panel) = dashboard.render(&table) {
                    println!("{panel}");
                }
            }
            DashboardEvent::TourStepChanged {
                step_index,
                total_steps,
            } => {
                if let Some(step) = dashboard.current_tour_step() {
                    println!(
                        "[tour {}/{}] {}: {}",
                        step_index + 1,
                        total_steps,
                        step.title,
                        step.description
                    );
                }
            }
            DashboardEvent::TourEnded => println!("[tour] finished"),
            DashboardEvent::PrintBlocked {
                warning_visible: true,
            } => println!("!! Printing is disabled for this confidential demo."),
            DashboardEvent::LiveToggled { is_active } => {
                println!("live feed {}", if *is_active { "on" } else { "off" })
            }
            DashboardEvent::DemoToggled { is_running } => {
                println!("auto-demo {}", if *is_running { "playing" } else { "paused" })
            }
            _ => {}
        }
    });
}

/// Returns false when the host should exit.
fn apply_command(dashboard: &Dashboard, table: &RenderTable, command: HostCommand) -> bool {
    match command {
        HostCommand::Quit => return false,
        HostCommand::Help => println!("{HELP}"),
        HostCommand::Key(event) => {
            if dashboard.handle_key(&event).is_none() {
                println!("(no shortcut)");
            }
        }
        HostCommand::Stats => {
            let stats = dashboard.session_stats();
            match serde_json::to_string_pretty(&stats) {
                Ok(json) => println!("{json}"),
                Err(err) => warn!("could not format stats: {err}"),
            }
        }
        HostCommand::Status => {
            match serde_json::to_string_pretty(&dashboard.snapshot()) {
                Ok(json) => println!("{json}"),
                Err(err) => warn!("could not format status: {err}"),
            }
            if let Some(panel) = dashboard.render(table) {
                println!("{panel}");
            }
        }
        HostCommand::ClearHistory => {
            dashboard.clear_history();
            println!("session history cleared");
        }
        HostCommand::StartTour => dashboard.start_tour(),
        HostCommand::ResetTour => {
            dashboard.reset_tour_history();
            println!("tour will start again on next launch");
        }
        HostCommand::Speed(ms) => match dashboard.set_speed(ms) {
            Ok(()) => println!("auto-demo interval {ms} ms"),
            Err(err) => println!("{err}"),
        },
        HostCommand::Narration(enabled) => dashboard.narration().set_enabled(enabled),
        HostCommand::Unknown(line) => println!("unknown command '{line}', try help"),
    }
    true
}
