use std::collections::{BTreeMap, BTreeSet};

use eframe::egui::{self, Color32, Stroke, Ui};
use egui_plot::{Bar, BarChart, GridMark, Line, Plot, PlotPoints, PlotUi, Points, Polygon};

use crate::color::{ColorMap, DIMMED, STEEL_BLUE};
use crate::data::aggregate::{AggregateOp, GroupRow, MonthTotal};
use crate::data::bins::BinCount;
use crate::data::filter::{Highlight, Interval};
use crate::data::model::{date_from_ordinal, Value};
use crate::data::view::{ChartKind, DerivedView, ScatterPoint};
use crate::state::AppState;

/// Selection changes produced by interacting with a chart; applied to the
/// state once the frame is drawn.
#[derive(Debug, Clone, PartialEq)]
pub enum ChartEvent {
    Brush(Option<Interval>),
    Highlight(Highlight),
}

// ---------------------------------------------------------------------------
// Dashboard (central panel)
// ---------------------------------------------------------------------------

/// Render every chart of the active preset: the first two side by side,
/// the rest underneath at full width.
pub fn dashboard(ui: &mut Ui, state: &AppState) -> Option<ChartEvent> {
    if state.dataset.is_none() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a file to explore it  (File → Open…)");
        });
        return None;
    }

    let charts = &state.preset.charts;
    let split = charts.len().min(2);
    let rows = if charts.len() > split { 2.0 } else { 1.0 };
    let height = (ui.available_height() / rows - 40.0).max(120.0);

    let mut event = None;
    let mut draw_row = |ui: &mut Ui, range: std::ops::Range<usize>| {
        ui.columns(range.len(), |cols: &mut [Ui]| {
            for (col, idx) in cols.iter_mut().zip(range.clone()) {
                if let Some(e) = chart(col, state, idx, height) {
                    event = Some(e);
                }
            }
        });
    };

    draw_row(ui, 0..split);
    if charts.len() > split {
        ui.separator();
        draw_row(ui, split..charts.len());
    }
    event
}

fn chart(ui: &mut Ui, state: &AppState, idx: usize, height: f32) -> Option<ChartEvent> {
    let spec = &state.preset.charts[idx];
    let view = state.views.get(idx)?;
    let is_brush_source = state.preset.has_brush() && state.preset.brush_source == Some(idx);

    ui.strong(spec.title.as_str());
    if view.is_empty() {
        ui.label("No records match the current filters.");
    }

    match (view, &spec.kind) {
        (DerivedView::Histogram(bins), ChartKind::Histogram { column, .. }) => {
            let brush = is_brush_source.then_some(state.brush).flatten();
            histogram_chart(ui, idx, bins, column, brush, is_brush_source, height)
        }
        (DerivedView::Scatter(points), ChartKind::Scatter { x, y, color, x_domain, .. }) => {
            let axes = (x.as_str(), y.as_str());
            scatter_chart(ui, idx, points, axes, color.as_deref(), *x_domain, state, height);
            None
        }
        (DerivedView::Groups(rows), ChartKind::GroupBar { group, value, op, .. }) => {
            group_chart(ui, idx, rows, (group.as_str(), value.as_str(), *op), state, height)
        }
        (DerivedView::Series(months), ChartKind::MonthlySeries { value, log_scale, .. }) => {
            let brush = is_brush_source.then_some(state.brush).flatten();
            series_chart(ui, idx, months, value, *log_scale, brush, is_brush_source, height)
        }
        _ => {
            log::warn!("View does not match chart '{}'", spec.title);
            None
        }
    }
}

fn plot_id(idx: usize) -> String {
    format!("chart_{idx}")
}

// ---------------------------------------------------------------------------
// Brush interaction
// ---------------------------------------------------------------------------

/// Drag on the plot to brush an x interval, double-click to clear it.
///
/// The drag origin lives in egui's temporary memory between frames.
fn brush_interaction(plot_ui: &PlotUi, ctx: &egui::Context, id: egui::Id) -> Option<ChartEvent> {
    let response = plot_ui.response();
    let pointer = plot_ui.pointer_coordinate();

    if response.double_clicked() {
        ctx.data_mut(|d| d.remove::<f64>(id));
        return Some(ChartEvent::Brush(None));
    }
    if response.drag_started() {
        if let Some(p) = pointer {
            ctx.data_mut(|d| d.insert_temp(id, p.x));
        }
    }
    if response.dragged() || response.drag_stopped() {
        let start = ctx.data(|d| d.get_temp::<f64>(id));
        if let (Some(start), Some(p)) = (start, pointer) {
            return Some(ChartEvent::Brush(Some(Interval::new(start, p.x))));
        }
    }
    None
}

fn brush_overlay(interval: &Interval, y_max: f64) -> Polygon {
    let pts = vec![
        [interval.lower, 0.0],
        [interval.upper, 0.0],
        [interval.upper, y_max],
        [interval.lower, y_max],
    ];
    Polygon::new(PlotPoints::from(pts))
        .fill_color(Color32::from_rgba_unmultiplied(120, 120, 120, 50))
        .stroke(Stroke::new(1.0, Color32::GRAY))
}

// ---------------------------------------------------------------------------
// Histogram
// ---------------------------------------------------------------------------

#[allow(clippy::too_many_arguments)]
fn histogram_chart(
    ui: &mut Ui,
    idx: usize,
    bins: &[BinCount],
    column: &str,
    brush: Option<Interval>,
    brushable: bool,
    height: f32,
) -> Option<ChartEvent> {
    let bars: Vec<Bar> = bins
        .iter()
        .map(|b| {
            Bar::new((b.lower + b.upper) / 2.0, b.count as f64)
                .width(b.upper - b.lower)
                .fill(STEEL_BLUE)
                .name(format!("({:.2}, {:.2}]", b.lower, b.upper))
        })
        .collect();
    let y_max = bins.iter().map(|b| b.count).max().unwrap_or(0) as f64;

    let ctx = ui.ctx().clone();
    let brush_id = egui::Id::new(("brush", idx));

    Plot::new(plot_id(idx))
        .height(height)
        .x_axis_label(column)
        .y_axis_label("Count")
        .include_y(0.0)
        .allow_drag(!brushable)
        .allow_boxed_zoom(!brushable)
        .allow_double_click_reset(!brushable)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).color(STEEL_BLUE));
            if let Some(interval) = &brush {
                plot_ui.polygon(brush_overlay(interval, y_max.max(1.0)));
            }
            if brushable {
                brush_interaction(plot_ui, &ctx, brush_id)
            } else {
                None
            }
        })
        .inner
}

// ---------------------------------------------------------------------------
// Scatter
// ---------------------------------------------------------------------------

#[allow(clippy::too_many_arguments)]
fn scatter_chart(
    ui: &mut Ui,
    idx: usize,
    points: &[ScatterPoint],
    (x_col, y_col): (&str, &str),
    color_col: Option<&str>,
    x_domain: Option<(f64, f64)>,
    state: &AppState,
    height: f32,
) {
    // One series per colour group; egui_plot colours whole series.
    let mut groups: BTreeMap<Option<&Value>, Vec<[f64; 2]>> = BTreeMap::new();
    for p in points {
        groups.entry(p.color_key.as_ref()).or_default().push([p.x, p.y]);
    }

    // Hover text needs the listing label of the nearest point.
    let labelled: Vec<(f64, f64, String)> = points
        .iter()
        .map(|p| (p.x, p.y, p.label.clone().unwrap_or_default()))
        .collect();
    let (x_name, y_name) = (x_col.to_string(), y_col.to_string());

    let mut plot = Plot::new(plot_id(idx))
        .height(height)
        .x_axis_label(x_col)
        .y_axis_label(y_col)
        .label_formatter(move |series, value| {
            let nearest = labelled.iter().min_by(|a, b| {
                let da = (a.0 - value.x).powi(2) + (a.1 - value.y).powi(2);
                let db = (b.0 - value.x).powi(2) + (b.1 - value.y).powi(2);
                da.total_cmp(&db)
            });
            match nearest {
                Some((x, y, label)) => {
                    format!("{label}\n{series}\n{x_name}: {x:.2}\n{y_name}: {y:.2}")
                }
                None => String::new(),
            }
        });
    if let Some((lo, hi)) = x_domain {
        plot = plot.include_x(lo).include_x(hi);
    }

    let lit = color_col.and_then(|c| state.lit_groups(c));
    let colored = state
        .color_map
        .as_ref()
        .filter(|cm| Some(cm.column.as_str()) == color_col);
    plot.show(ui, |plot_ui| {
        for (key, pts) in groups {
            let color = match key {
                Some(v) => bar_color(v, colored, lit.as_ref()),
                None if lit.is_some() => DIMMED,
                None => STEEL_BLUE,
            };
            let name = key.map(|v| v.to_string()).unwrap_or_default();
            plot_ui.points(
                Points::new(PlotPoints::from(pts))
                    .radius(3.0)
                    .color(color.gamma_multiply(0.6))
                    .name(name),
            );
        }
    });
}

// ---------------------------------------------------------------------------
// Grouped bars
// ---------------------------------------------------------------------------

/// Horizontal bars, largest aggregate at the top. Clicking a bar highlights
/// its group.
fn group_chart(
    ui: &mut Ui,
    idx: usize,
    rows: &[GroupRow],
    (group_col, value_col, op): (&str, &str, AggregateOp),
    state: &AppState,
    height: f32,
) -> Option<ChartEvent> {
    let n = rows.len();
    let position = move |i: usize| (n - 1 - i) as f64;
    let colored = state
        .color_map
        .as_ref()
        .filter(|cm| cm.column == group_col);
    let lit = state.lit_groups(group_col);

    let bars: Vec<Bar> = rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let fill = bar_color(&row.group, colored, lit.as_ref());
            Bar::new(position(i), row.value)
                .width(0.8)
                .fill(fill)
                .name(format!("{}: {:.2}", row.group, row.value))
        })
        .collect();

    let names: Vec<String> = rows.iter().rev().map(|r| r.group.to_string()).collect();
    let groups: Vec<Value> = rows.iter().map(|r| r.group.clone()).collect();

    Plot::new(plot_id(idx))
        .height(height)
        .x_axis_label(format!("{} {value_col}", op.label()))
        .y_axis_label(group_col)
        .include_x(0.0)
        .allow_drag(false)
        .allow_boxed_zoom(false)
        .y_axis_formatter(move |mark: GridMark, _range| category_tick(&names, mark.value))
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).horizontal());
            if !plot_ui.response().clicked() || n == 0 {
                return None;
            }
            let y = plot_ui.pointer_coordinate()?.y.round();
            if y < 0.0 || y >= n as f64 {
                return None;
            }
            let i = n - 1 - y as usize;
            groups
                .get(i)
                .map(|g| ChartEvent::Highlight(Highlight::new(group_col, g.clone())))
        })
        .inner
}

/// Fill of a mark for `group`; `lit` holds the groups left undimmed by the
/// active highlight.
fn bar_color(
    group: &Value,
    colored: Option<&ColorMap>,
    lit: Option<&BTreeSet<Value>>,
) -> Color32 {
    match (colored, lit) {
        (Some(cm), _) => cm.color_with_highlight(group, lit),
        (None, Some(lit)) if !lit.contains(group) => DIMMED,
        _ => STEEL_BLUE,
    }
}

/// Label of the category bar at integer position `value`.
fn category_tick(names: &[String], value: f64) -> String {
    if (value - value.round()).abs() > 1e-6 || value < 0.0 {
        return String::new();
    }
    names.get(value.round() as usize).cloned().unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Monthly series
// ---------------------------------------------------------------------------

#[allow(clippy::too_many_arguments)]
fn series_chart(
    ui: &mut Ui,
    idx: usize,
    months: &[MonthTotal],
    value_col: &str,
    log_scale: bool,
    brush: Option<Interval>,
    brushable: bool,
    height: f32,
) -> Option<ChartEvent> {
    let scale = move |v: f64| if log_scale { v.max(1.0).log10() } else { v };
    let pts: Vec<[f64; 2]> = months
        .iter()
        .filter_map(|m| Some([Value::Date(m.month).ordinal()?, scale(m.total)]))
        .collect();
    let y_max = pts.iter().map(|p| p[1]).fold(1.0, f64::max);

    let ctx = ui.ctx().clone();
    let brush_id = egui::Id::new(("brush", idx));

    Plot::new(plot_id(idx))
        .height(height)
        .x_axis_label("Month")
        .y_axis_label(if log_scale {
            format!("{value_col} (log)")
        } else {
            value_col.to_string()
        })
        .include_y(0.0)
        .allow_drag(!brushable)
        .allow_boxed_zoom(!brushable)
        .allow_double_click_reset(!brushable)
        .x_axis_formatter(|mark: GridMark, _range| {
            date_from_ordinal(mark.value)
                .map(|d| d.format("%Y-%m").to_string())
                .unwrap_or_default()
        })
        .y_axis_formatter(move |mark: GridMark, _range| {
            if log_scale {
                format!("{:.0}", 10f64.powf(mark.value))
            } else {
                format!("{:.0}", mark.value)
            }
        })
        .show(ui, |plot_ui| {
            plot_ui.line(Line::new(PlotPoints::from(pts)).color(STEEL_BLUE).width(1.5));
            if let Some(interval) = &brush {
                plot_ui.polygon(brush_overlay(interval, y_max));
            }
            if brushable {
                brush_interaction(plot_ui, &ctx, brush_id)
            } else {
                None
            }
        })
        .inner
}
