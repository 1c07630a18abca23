mod app;
mod color;
mod config;
mod data;
mod error;
mod state;
mod ui;

use std::path::{Path, PathBuf};

use app::DashboardApp;
use config::Preset;
use eframe::egui;
use state::AppState;

/// Usage: `rusty-dashboard [DATA_FILE] [PRESET_NAME | PRESET.json]`
///
/// Without a preset argument the preset is detected from the file header.
fn main() -> eframe::Result {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let data_path = args.next().map(PathBuf::from);
    let state = initial_state(data_path, args.next());

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 860.0])
            .with_min_inner_size([700.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Rusty Dashboard",
        options,
        Box::new(|_cc| Ok(Box::new(DashboardApp::new(state)))),
    )
}

fn initial_state(data_path: Option<PathBuf>, preset_arg: Option<String>) -> AppState {
    let pinned = preset_arg.as_deref().map(|arg| {
        if arg.ends_with(".json") {
            Preset::from_json_file(Path::new(arg))
        } else {
            Preset::by_name(arg).map_err(anyhow::Error::from)
        }
    });

    let mut state = match pinned {
        Some(Ok(preset)) => AppState::new(preset, true),
        Some(Err(e)) => {
            log::error!("Ignoring preset argument: {e:#}");
            let mut state = AppState::new(Preset::builtin().remove(0), false);
            state.status_message = Some(format!("Error: {e:#}"));
            state
        }
        None => AppState::new(Preset::builtin().remove(0), false),
    };

    let path = data_path.unwrap_or_else(|| state.preset.default_path.clone());
    if path.exists() {
        state.open(&path);
    } else {
        log::warn!("Data file {} not found; use File → Open…", path.display());
        state.status_message = Some(format!("File not found: {}", path.display()));
    }
    state
}
