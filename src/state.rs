use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::color::ColorMap;
use crate::config::{CategoryDefault, Preset};
use crate::data::clean::{clean, CleanReport};
use crate::data::filter::{
    category_options, filtered_indices, CategorySelection, FilterSpec, Highlight, Interval,
};
use crate::data::loader::load_file;
use crate::data::model::{Dataset, Value};
use crate::data::view::{compute_views, DerivedView};

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
///
/// Every interaction goes through one of the setters below, which replace the
/// selection and recompute the views from the immutable dataset.
pub struct AppState {
    pub preset: Preset,
    /// Keep `preset` when opening new files instead of detecting one.
    pub preset_pinned: bool,

    /// File the dataset was read from.
    pub source_path: Option<PathBuf>,

    /// Loaded dataset (None until a file is loaded).
    pub dataset: Option<Dataset>,
    pub report: Option<CleanReport>,

    /// Category values offered in the side panel, most frequent first.
    pub category_options: Vec<(Value, usize)>,

    /// Current category + range selection.
    pub filters: FilterSpec,

    /// Indices of records passing the current filters (cached).
    pub visible_indices: Vec<usize>,

    /// Interval selected on the brush source chart.
    pub brush: Option<Interval>,

    /// Category value picked on a bar chart, with the column it belongs to.
    pub highlight: Option<Highlight>,

    /// One view per chart of the preset, in chart order.
    pub views: Vec<DerivedView>,

    pub color_map: Option<ColorMap>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(preset: Preset, preset_pinned: bool) -> Self {
        Self {
            preset,
            preset_pinned,
            source_path: None,
            dataset: None,
            report: None,
            category_options: Vec::new(),
            filters: FilterSpec::default(),
            visible_indices: Vec::new(),
            brush: None,
            highlight: None,
            views: Vec::new(),
            color_map: None,
            status_message: None,
        }
    }

    /// Load `path`, reporting failures in the status line.
    ///
    /// The schema comes from the pinned preset, or is detected from the
    /// file header when nothing is pinned.
    pub fn open(&mut self, path: &Path) {
        let pinned = self.preset_pinned.then(|| self.preset.clone());
        self.open_with(path, pinned);
    }

    /// Switch to `preset` and reload the current file with it. On failure
    /// the previous preset and dataset stay active.
    pub fn use_preset(&mut self, preset: Preset) {
        log::info!("Switching to preset '{}'", preset.name);
        match self.source_path.clone() {
            Some(path) => {
                if self.open_with(&path, Some(preset)) {
                    self.preset_pinned = true;
                }
            }
            None => {
                self.preset = preset;
                self.preset_pinned = true;
            }
        }
    }

    fn open_with(&mut self, path: &Path, preset: Option<Preset>) -> bool {
        match self.load(path, preset) {
            Ok(()) => {
                if let Some(ds) = &self.dataset {
                    log::info!(
                        "Loaded {} records from {} with preset '{}'",
                        ds.len(),
                        path.display(),
                        self.preset.name
                    );
                }
                true
            }
            Err(e) => {
                log::error!("Failed to load {}: {e:#}", path.display());
                self.status_message = Some(format!("Error: {e:#}"));
                false
            }
        }
    }

    fn load(&mut self, path: &Path, preset: Option<Preset>) -> Result<()> {
        let raw = load_file(path)?;
        let preset = match preset {
            Some(p) => p,
            None => Preset::detect(&raw.headers)?,
        };
        let (dataset, report) = clean(&raw, &preset.schema)?;
        self.preset = preset;
        self.source_path = Some(path.to_path_buf());
        self.set_dataset(dataset, report);
        Ok(())
    }

    /// Ingest a cleaned dataset and initialise filters, colours and views.
    pub fn set_dataset(&mut self, dataset: Dataset, report: CleanReport) {
        self.category_options = self
            .preset
            .category_column
            .as_deref()
            .map(|col| category_options(&dataset, col))
            .unwrap_or_default();

        let mut filters = FilterSpec::unrestricted(
            &dataset,
            self.preset.category_column.as_deref(),
            self.preset.range_column.as_deref(),
        );
        if self.preset.category_default == CategoryDefault::MostFrequent {
            if let Some((top, _)) = self.category_options.first() {
                filters.category = CategorySelection::Only(top.clone());
            }
        }

        self.color_map = self
            .preset
            .charts
            .iter()
            .find_map(|c| c.kind.highlight_column())
            .and_then(|col| {
                dataset
                    .unique_values
                    .get(col)
                    .map(|vals| ColorMap::new(col, vals))
            });

        self.filters = filters;
        self.brush = None;
        self.highlight = None;
        self.dataset = Some(dataset);
        self.report = Some(report);
        self.status_message = None;
        self.refilter();
    }

    /// Recompute `visible_indices` and every view after a selection change.
    pub fn refilter(&mut self) {
        let Some(ds) = &self.dataset else {
            return;
        };
        self.visible_indices = filtered_indices(ds, &self.filters);
        let brush = if self.preset.has_brush() {
            self.brush.as_ref()
        } else {
            None
        };
        self.views = compute_views(
            ds,
            &self.preset.charts,
            &self.visible_indices,
            self.preset.brush_source,
            brush,
        );
        log::debug!(
            "{} of {} records visible",
            self.visible_indices.len(),
            ds.len()
        );
    }

    pub fn set_category(&mut self, category: CategorySelection) {
        if self.filters.category == category {
            return;
        }
        self.filters.category = category;
        // A brush or highlight drawn on another population is meaningless.
        self.brush = None;
        self.highlight = None;
        self.refilter();
    }

    /// Set the range selection, clamped to the observed bounds.
    pub fn set_range(&mut self, interval: Interval) {
        let Some(ds) = &self.dataset else {
            return;
        };
        let Some(range) = &mut self.filters.range else {
            return;
        };
        range.interval = interval;
        self.filters = std::mem::take(&mut self.filters).clamped(ds);
        self.refilter();
    }

    pub fn set_brush(&mut self, brush: Option<Interval>) {
        if !self.preset.has_brush() || self.brush == brush {
            return;
        }
        self.brush = brush;
        self.refilter();
    }

    /// Apply `highlight`, or clear it if it is already selected.
    pub fn toggle_highlight(&mut self, highlight: Highlight) {
        if self.highlight.as_ref() == Some(&highlight) {
            self.highlight = None;
        } else {
            self.highlight = Some(highlight);
        }
    }

    /// Values of `group_column` that stay in full colour under the current
    /// highlight; `None` when nothing is highlighted.
    pub fn lit_groups(&self, group_column: &str) -> Option<BTreeSet<Value>> {
        let highlight = self.highlight.as_ref()?;
        let ds = self.dataset.as_ref()?;
        Some(highlight.matching_groups(ds, &self.visible_indices, group_column))
    }
}
