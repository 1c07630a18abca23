use serde::{Deserialize, Serialize};

use super::aggregate::{self, group_aggregate, monthly_sum, AggregateOp, GroupRow, MonthTotal};
use super::bins::{histogram, BinCount, Binning};
use super::filter::{apply_brush, Interval};
use super::model::{Dataset, Value};

// ---------------------------------------------------------------------------
// Chart specifications
// ---------------------------------------------------------------------------

/// What a chart shows, independent of how it is drawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChartKind {
    /// Record counts over equal-width bins of `column`.
    Histogram { column: String, bins: usize },
    /// One point per record.
    Scatter {
        x: String,
        y: String,
        #[serde(default)]
        color: Option<String>,
        /// Column shown on hover.
        #[serde(default)]
        label: Option<String>,
        #[serde(default)]
        x_domain: Option<(f64, f64)>,
    },
    /// Per-group aggregate, largest first, optionally truncated.
    GroupBar {
        group: String,
        value: String,
        op: AggregateOp,
        #[serde(default)]
        top_n: Option<usize>,
    },
    /// Monthly totals of `value` by `date`.
    MonthlySeries {
        date: String,
        value: String,
        #[serde(default)]
        log_scale: bool,
    },
}

impl ChartKind {
    /// Column on the chart's x axis; a brush drawn on the chart selects an
    /// interval of this column.
    pub fn brush_column(&self) -> Option<&str> {
        match self {
            ChartKind::Histogram { column, .. } => Some(column),
            ChartKind::Scatter { x, .. } => Some(x),
            ChartKind::MonthlySeries { date, .. } => Some(date),
            ChartKind::GroupBar { .. } => None,
        }
    }

    /// Column whose values the chart can highlight.
    pub fn highlight_column(&self) -> Option<&str> {
        match self {
            ChartKind::Scatter { color, .. } => color.as_deref(),
            ChartKind::GroupBar { group, .. } => Some(group),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    pub title: String,
    #[serde(flatten)]
    pub kind: ChartKind,
    /// Whether the chart only shows the population inside the brush.
    #[serde(default)]
    pub linked: bool,
}

// ---------------------------------------------------------------------------
// Derived views
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct ScatterPoint {
    /// Source record index.
    pub index: usize,
    pub x: f64,
    pub y: f64,
    pub color_key: Option<Value>,
    pub label: Option<String>,
}

/// The table feeding exactly one chart.
#[derive(Debug, Clone, PartialEq)]
pub enum DerivedView {
    Histogram(Vec<BinCount>),
    Scatter(Vec<ScatterPoint>),
    Groups(Vec<GroupRow>),
    Series(Vec<MonthTotal>),
}

impl DerivedView {
    pub fn is_empty(&self) -> bool {
        match self {
            DerivedView::Histogram(bins) => bins.iter().all(|b| b.count == 0),
            DerivedView::Scatter(points) => points.is_empty(),
            DerivedView::Groups(rows) => rows.is_empty(),
            DerivedView::Series(months) => months.is_empty(),
        }
    }
}

/// Compute the view of `chart` over the records at `indices`.
pub fn compute_view(dataset: &Dataset, indices: &[usize], chart: &ChartKind) -> DerivedView {
    match chart {
        ChartKind::Histogram { column, bins } => {
            // Bin over the population being shown, not the whole dataset.
            let (min, max) = indices
                .iter()
                .filter_map(|&i| dataset.value(i, column).as_f64())
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                    (lo.min(v), hi.max(v))
                });
            match Binning::over(min, max, *bins) {
                Some(binning) => {
                    DerivedView::Histogram(histogram(dataset, indices, column, &binning))
                }
                None => DerivedView::Histogram(Vec::new()),
            }
        }
        ChartKind::Scatter { x, y, color, label, .. } => {
            let points = indices
                .iter()
                .filter_map(|&index| {
                    let px = dataset.value(index, x).ordinal()?;
                    let py = dataset.value(index, y).ordinal()?;
                    Some(ScatterPoint {
                        index,
                        x: px,
                        y: py,
                        color_key: color.as_ref().map(|c| dataset.value(index, c).clone()),
                        label: label.as_ref().map(|l| dataset.value(index, l).to_string()),
                    })
                })
                .collect();
            DerivedView::Scatter(points)
        }
        ChartKind::GroupBar { group, value, op, top_n } => {
            let rows = match top_n {
                Some(n) => aggregate::top_n(dataset, indices, group, value, *op, *n),
                None => group_aggregate(dataset, indices, group, value, *op),
            };
            DerivedView::Groups(rows)
        }
        ChartKind::MonthlySeries { date, value, .. } => {
            DerivedView::Series(monthly_sum(dataset, indices, date, value))
        }
    }
}

/// Compute every chart of a dashboard.
///
/// The brush source chart always sees the filtered population; linked charts
/// see it narrowed to the brush.
pub fn compute_views(
    dataset: &Dataset,
    charts: &[ChartSpec],
    indices: &[usize],
    brush_source: Option<usize>,
    brush: Option<&Interval>,
) -> Vec<DerivedView> {
    let brushed = brush_source
        .and_then(|src| charts.get(src))
        .and_then(|chart| chart.kind.brush_column())
        .zip(brush)
        .map(|(column, interval)| apply_brush(dataset, indices, column, interval));

    charts
        .iter()
        .enumerate()
        .map(|(i, chart)| {
            let population = match &brushed {
                Some(b) if chart.linked && Some(i) != brush_source => b.as_slice(),
                _ => indices,
            };
            compute_view(dataset, population, &chart.kind)
        })
        .collect()
}
