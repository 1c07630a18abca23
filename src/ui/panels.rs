use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::config::Preset;
use crate::data::filter::{CategorySelection, Interval};
use crate::data::model::{date_from_ordinal, Value};
use crate::data::schema::ColumnKind;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading(state.preset.title.as_str());
    ui.separator();

    if state.dataset.is_none() {
        ui.label("No dataset loaded.");
        return;
    }

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            category_selector(ui, state);
            ui.separator();
            range_selector(ui, state);
            ui.separator();
            selection_summary(ui, state);

            if let Some(report) = &state.report {
                ui.separator();
                ui.small(format!(
                    "{} of {} rows kept ({} missing values, {} bad dates)",
                    report.rows_kept, report.rows_read, report.dropped_missing, report.dropped_bad_date
                ));
            }
        });
}

// ---- Single-select category control ----

fn category_selector(ui: &mut Ui, state: &mut AppState) {
    let Some(column) = state.preset.category_column.clone() else {
        return;
    };
    ui.strong(format!("Choose a {column}"));

    let current = match &state.filters.category {
        CategorySelection::All => "All".to_string(),
        CategorySelection::Only(v) => v.to_string(),
    };

    let mut picked: Option<CategorySelection> = None;
    egui::ComboBox::from_id_salt("category")
        .selected_text(current)
        .width(ui.available_width() - 8.0)
        .show_ui(ui, |ui: &mut Ui| {
            let all = state.filters.category == CategorySelection::All;
            if ui.selectable_label(all, "All").clicked() {
                picked = Some(CategorySelection::All);
            }
            for (value, count) in &state.category_options {
                let selected = matches!(&state.filters.category, CategorySelection::Only(v) if v == value);
                if ui
                    .selectable_label(selected, format!("{value}  ({count})"))
                    .clicked()
                {
                    picked = Some(CategorySelection::Only(value.clone()));
                }
            }
        });

    if let Some(selection) = picked {
        state.set_category(selection);
    }
}

// ---- Inclusive range control ----

fn range_selector(ui: &mut Ui, state: &mut AppState) {
    let Some(range) = state.filters.range.clone() else {
        return;
    };
    let Some(&(min, max)) = state
        .dataset
        .as_ref()
        .and_then(|ds| ds.ranges.get(&range.column))
    else {
        return;
    };

    ui.strong(range.column.as_str());
    let Interval { mut lower, mut upper } = range.interval;

    let changed = match state.preset.schema.kind_of(&range.column) {
        Some(ColumnKind::Date) => date_range(ui, &mut lower, &mut upper, (min, max)),
        Some(ColumnKind::Integer) => {
            let a = ui.add(egui::Slider::new(&mut lower, min..=max).step_by(1.0).text("from"));
            let b = ui.add(egui::Slider::new(&mut upper, min..=max).step_by(1.0).text("to"));
            a.changed() || b.changed()
        }
        _ => {
            let a = ui.add(egui::Slider::new(&mut lower, min..=max).text("from"));
            let b = ui.add(egui::Slider::new(&mut upper, min..=max).text("to"));
            a.changed() || b.changed()
        }
    };

    if ui.small_button("Reset").clicked() {
        state.set_range(Interval::new(min, max));
    } else if changed {
        state.set_range(Interval::new(lower, upper));
    }
}

fn date_range(ui: &mut Ui, lower: &mut f64, upper: &mut f64, (min, max): (f64, f64)) -> bool {
    let (Some(mut from), Some(mut to)) = (date_from_ordinal(*lower), date_from_ordinal(*upper))
    else {
        return false;
    };
    let (Some(first), Some(last)) = (date_from_ordinal(min), date_from_ordinal(max)) else {
        return false;
    };

    let mut changed = false;
    ui.horizontal(|ui: &mut Ui| {
        ui.label("from");
        changed |= ui
            .add(egui_extras::DatePickerButton::new(&mut from).id_salt("range_from"))
            .changed();
    });
    ui.horizontal(|ui: &mut Ui| {
        ui.label("to");
        changed |= ui
            .add(egui_extras::DatePickerButton::new(&mut to).id_salt("range_to"))
            .changed();
    });
    ui.small(format!("{first} – {last}"));

    if changed {
        *lower = Value::Date(from).ordinal().unwrap_or(*lower);
        *upper = Value::Date(to).ordinal().unwrap_or(*upper);
    }
    changed
}

// ---- Brush / highlight status ----

fn selection_summary(ui: &mut Ui, state: &mut AppState) {
    if state.preset.has_brush() {
        match state.brush {
            Some(brush) => {
                let column = state
                    .preset
                    .brush_source
                    .and_then(|i| state.preset.charts.get(i))
                    .and_then(|c| c.kind.brush_column())
                    .unwrap_or_default()
                    .to_string();
                ui.label(format!(
                    "Brushed {column}: {} – {}",
                    format_bound(state, &column, brush.lower),
                    format_bound(state, &column, brush.upper)
                ));
                if ui.small_button("Clear brush").clicked() {
                    state.set_brush(None);
                }
            }
            None => {
                ui.weak("Drag across the first chart to brush.");
            }
        }
    }

    if let Some(highlight) = state.highlight.clone() {
        ui.label(format!("Highlighted {}: {}", highlight.column, highlight.value));
        if ui.small_button("Clear highlight").clicked() {
            state.toggle_highlight(highlight);
        }
    } else {
        ui.weak("Click a bar to highlight its group.");
    }

    ui.label(format!("{} records selected", state.visible_indices.len()));
}

fn format_bound(state: &AppState, column: &str, x: f64) -> String {
    match state.preset.schema.kind_of(column) {
        Some(ColumnKind::Date) => date_from_ordinal(x)
            .map(|d| d.to_string())
            .unwrap_or_default(),
        _ => format!("{x:.2}"),
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.menu_button("Dashboard", |ui: &mut Ui| {
            for preset in Preset::builtin() {
                let active = preset.name == state.preset.name;
                if ui.selectable_label(active, preset.title.as_str()).clicked() {
                    state.use_preset(preset);
                    ui.close_menu();
                }
            }
        });

        ui.separator();

        if let Some(ds) = &state.dataset {
            ui.label(format!(
                "{} records loaded, {} visible",
                ds.len(),
                state.visible_indices.len()
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open data file")
        .add_filter("Supported files", &["csv", "parquet", "pq"])
        .add_filter("CSV", &["csv"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        // A new file may have a different shape; let the header decide.
        state.preset_pinned = false;
        state.open(&path);
    }
}
