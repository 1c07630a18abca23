use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::aggregate::AggregateOp;
use crate::data::schema::{ColumnDef, ColumnKind, DerivedColumn, TableSchema};
use crate::data::view::{ChartKind, ChartSpec};
use crate::error::PipelineError;

// ---------------------------------------------------------------------------
// Preset – one dashboard variant
// ---------------------------------------------------------------------------

/// Initial value of the category control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryDefault {
    #[default]
    All,
    /// The category with the most records.
    MostFrequent,
}

/// Everything that distinguishes one dashboard from another: the table
/// schema, which columns drive the side-panel controls, and the charts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    pub name: String,
    pub title: String,
    /// File opened at startup when no path is given.
    pub default_path: PathBuf,
    pub schema: TableSchema,
    #[serde(default)]
    pub category_column: Option<String>,
    #[serde(default)]
    pub category_default: CategoryDefault,
    #[serde(default)]
    pub range_column: Option<String>,
    /// Index into `charts` of the chart that owns the brush.
    #[serde(default)]
    pub brush_source: Option<usize>,
    pub charts: Vec<ChartSpec>,
}

impl Preset {
    /// Read a preset from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading preset {}", path.display()))?;
        let preset: Preset = serde_json::from_str(&text)
            .with_context(|| format!("parsing preset {}", path.display()))?;
        log::info!("Loaded preset '{}' from {}", preset.name, path.display());
        Ok(preset)
    }

    pub fn builtin() -> Vec<Preset> {
        vec![listings(), gifts(), gifts_static()]
    }

    pub fn by_name(name: &str) -> Result<Preset, PipelineError> {
        Self::builtin()
            .into_iter()
            .find(|p| p.name == name)
            .ok_or_else(|| PipelineError::UnknownPreset(name.to_string()))
    }

    /// First built-in preset whose schema columns all appear in `headers`.
    pub fn detect(headers: &[String]) -> Result<Preset, PipelineError> {
        Self::builtin()
            .into_iter()
            .find(|p| p.schema.matches_headers(headers))
            .ok_or(PipelineError::NoMatchingPreset)
    }

    /// The brush interval is ignored unless a brush source is set.
    pub fn has_brush(&self) -> bool {
        self.brush_source
            .and_then(|i| self.charts.get(i))
            .is_some_and(|c| c.kind.brush_column().is_some())
    }
}

// ---------------------------------------------------------------------------
// Built-in presets
// ---------------------------------------------------------------------------

fn listings() -> Preset {
    Preset {
        name: "listings".into(),
        title: "Airbnb Listing Explorer".into(),
        default_path: PathBuf::from("data/listings.csv"),
        schema: TableSchema {
            columns: vec![
                ColumnDef::new("name", ColumnKind::Text),
                ColumnDef::new("price", ColumnKind::Money),
                ColumnDef::new("review_scores_rating", ColumnKind::Number),
                ColumnDef::new("number_of_reviews", ColumnKind::Integer),
                ColumnDef::new("neighbourhood_cleansed", ColumnKind::Text),
                ColumnDef::new("property_type", ColumnKind::Text),
            ],
            required: vec![
                "price".into(),
                "review_scores_rating".into(),
                "number_of_reviews".into(),
                "neighbourhood_cleansed".into(),
                "property_type".into(),
            ],
            money_floor: None,
            derived: vec![DerivedColumn::Bins {
                source: "price".into(),
                name: "price_bin".into(),
                bins: 40,
            }],
        },
        category_column: Some("property_type".into()),
        category_default: CategoryDefault::MostFrequent,
        range_column: Some("review_scores_rating".into()),
        brush_source: Some(0),
        charts: vec![
            ChartSpec {
                title: "Price Distribution".into(),
                kind: ChartKind::Histogram {
                    column: "price".into(),
                    bins: 40,
                },
                linked: false,
            },
            ChartSpec {
                title: "Review Score vs Price".into(),
                kind: ChartKind::Scatter {
                    x: "review_scores_rating".into(),
                    y: "price".into(),
                    color: Some("neighbourhood_cleansed".into()),
                    label: Some("name".into()),
                    x_domain: Some((1.0, 5.0)),
                },
                linked: true,
            },
            ChartSpec {
                title: "Average Price by Neighborhood".into(),
                kind: ChartKind::GroupBar {
                    group: "neighbourhood_cleansed".into(),
                    value: "price".into(),
                    op: AggregateOp::Mean,
                    top_n: None,
                },
                linked: false,
            },
        ],
    }
}

fn gift_schema() -> TableSchema {
    TableSchema {
        columns: vec![
            ColumnDef::new("Gift Amount", ColumnKind::Money),
            ColumnDef::new("Gift Date", ColumnKind::Date),
            ColumnDef::new("College", ColumnKind::Text),
            ColumnDef::new("Major", ColumnKind::Text),
            ColumnDef::new("Year of Graduation", ColumnKind::Integer),
            ColumnDef::new("City", ColumnKind::Text),
            ColumnDef::new("State", ColumnKind::Text),
        ],
        required: vec!["Gift Date".into()],
        // Keeps the log-scale series well defined.
        money_floor: Some(1.0),
        derived: vec![DerivedColumn::Month {
            source: "Gift Date".into(),
            name: "gift_month".into(),
        }],
    }
}

fn gift_series() -> ChartSpec {
    ChartSpec {
        title: "Gifts Over Time".into(),
        kind: ChartKind::MonthlySeries {
            date: "Gift Date".into(),
            value: "Gift Amount".into(),
            log_scale: true,
        },
        linked: false,
    }
}

fn top_majors(linked: bool) -> ChartSpec {
    ChartSpec {
        title: "Top 20 Majors by Total Gifts".into(),
        kind: ChartKind::GroupBar {
            group: "Major".into(),
            value: "Gift Amount".into(),
            op: AggregateOp::Sum,
            top_n: Some(20),
        },
        linked,
    }
}

fn gifts() -> Preset {
    Preset {
        name: "gifts".into(),
        title: "University Giving Dashboard".into(),
        default_path: PathBuf::from("data/gifts.csv"),
        schema: gift_schema(),
        category_column: Some("College".into()),
        category_default: CategoryDefault::All,
        range_column: Some("Year of Graduation".into()),
        brush_source: Some(0),
        charts: vec![
            gift_series(),
            top_majors(true),
            ChartSpec {
                title: "Total Gifts by State".into(),
                kind: ChartKind::GroupBar {
                    group: "State".into(),
                    value: "Gift Amount".into(),
                    op: AggregateOp::Sum,
                    top_n: None,
                },
                linked: true,
            },
        ],
    }
}

fn gifts_static() -> Preset {
    Preset {
        name: "gifts_static".into(),
        title: "University Giving Overview".into(),
        default_path: PathBuf::from("data/gifts.csv"),
        schema: gift_schema(),
        category_column: Some("College".into()),
        category_default: CategoryDefault::All,
        range_column: Some("Year of Graduation".into()),
        brush_source: None,
        charts: vec![
            gift_series(),
            top_majors(false),
            ChartSpec {
                title: "Average Gift by College".into(),
                kind: ChartKind::GroupBar {
                    group: "College".into(),
                    value: "Gift Amount".into(),
                    op: AggregateOp::Mean,
                    top_n: None,
                },
                linked: false,
            },
        ],
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn headers(cols: &[&str]) -> Vec<String> {
        cols.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn detects_preset_from_headers() {
        let listing = headers(&[
            "id",
            "name",
            "price",
            "review_scores_rating",
            "number_of_reviews",
            "neighbourhood_cleansed",
            "property_type",
        ]);
        assert_eq!(Preset::detect(&listing).unwrap().name, "listings");

        let gift = headers(&[
            "Prospect ID",
            "Gift Amount",
            "Gift Date",
            "College",
            "Major",
            "Year of Graduation",
            "City",
            "State",
        ]);
        assert_eq!(Preset::detect(&gift).unwrap().name, "gifts");

        assert!(matches!(
            Preset::detect(&headers(&["a", "b"])),
            Err(PipelineError::NoMatchingPreset)
        ));
    }

    #[test]
    fn builtin_presets_are_consistent() {
        for preset in Preset::builtin() {
            let columns = preset.schema.output_columns();
            for chart in &preset.charts {
                for col in [chart.kind.brush_column(), chart.kind.highlight_column()]
                    .into_iter()
                    .flatten()
                {
                    assert!(columns.iter().any(|c| c == col), "{}: {col}", preset.name);
                }
            }
        }
        assert!(Preset::by_name("gifts").unwrap().has_brush());
        assert!(!Preset::by_name("gifts_static").unwrap().has_brush());
        assert!(Preset::by_name("nope").is_err());
    }

    #[test]
    fn preset_round_trips_through_json_file() {
        let preset = Preset::by_name("listings").unwrap();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", serde_json::to_string_pretty(&preset).unwrap()).unwrap();

        let loaded = Preset::from_json_file(file.path()).unwrap();
        assert_eq!(loaded, preset);
    }
}
