use eframe::egui;

use crate::state::AppState;
use crate::ui::panels;
use crate::ui::plot::{self, ChartEvent};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct DashboardApp {
    pub state: AppState,
}

impl DashboardApp {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: filters ----
        egui::SidePanel::left("filter_panel")
            .default_width(240.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: charts ----
        let event = egui::CentralPanel::default()
            .show(ctx, |ui| plot::dashboard(ui, &self.state))
            .inner;

        match event {
            Some(ChartEvent::Brush(brush)) => self.state.set_brush(brush),
            Some(ChartEvent::Highlight(highlight)) => self.state.toggle_highlight(highlight),
            None => {}
        }
    }
}
