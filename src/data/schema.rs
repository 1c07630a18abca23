use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Column declarations
// ---------------------------------------------------------------------------

/// How a raw CSV cell is parsed during cleaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    /// Kept verbatim; empty cells become `Null`.
    Text,
    Integer,
    Number,
    /// Currency text such as `"$1,250.00"`.
    Money,
    Date,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    pub kind: ColumnKind,
}

impl ColumnDef {
    pub fn new(name: &str, kind: ColumnKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
        }
    }
}

/// Auxiliary columns computed once the source columns are parsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DerivedColumn {
    /// Fixed-width bins over the observed range of `source`; the cell holds
    /// the interval label, e.g. `(4.91, 7.25]`.
    Bins {
        source: String,
        name: String,
        bins: usize,
    },
    /// `source` date truncated to the first day of its month.
    Month { source: String, name: String },
}

impl DerivedColumn {
    pub fn name(&self) -> &str {
        match self {
            DerivedColumn::Bins { name, .. } | DerivedColumn::Month { name, .. } => name,
        }
    }

    fn kind(&self) -> ColumnKind {
        match self {
            DerivedColumn::Bins { .. } => ColumnKind::Text,
            DerivedColumn::Month { .. } => ColumnKind::Date,
        }
    }
}

// ---------------------------------------------------------------------------
// TableSchema
// ---------------------------------------------------------------------------

/// Expected shape of the input table and the cleaning rules applied to it.
///
/// Columns present in the file but absent here are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSchema {
    pub columns: Vec<ColumnDef>,
    /// Rows with a missing or unparseable value in any of these are dropped.
    #[serde(default)]
    pub required: Vec<String>,
    /// Monetary values below this floor are raised to it.
    #[serde(default)]
    pub money_floor: Option<f64>,
    #[serde(default)]
    pub derived: Vec<DerivedColumn>,
}

impl TableSchema {
    /// Declared kind of a source or derived column.
    pub fn kind_of(&self, column: &str) -> Option<ColumnKind> {
        self.columns
            .iter()
            .find(|c| c.name == column)
            .map(|c| c.kind)
            .or_else(|| {
                self.derived
                    .iter()
                    .find(|d| d.name() == column)
                    .map(DerivedColumn::kind)
            })
    }

    /// Source columns followed by derived columns.
    pub fn output_columns(&self) -> Vec<String> {
        self.columns
            .iter()
            .map(|c| c.name.clone())
            .chain(self.derived.iter().map(|d| d.name().to_string()))
            .collect()
    }

    /// Whether every declared source column appears in `headers`.
    pub fn matches_headers(&self, headers: &[String]) -> bool {
        self.columns
            .iter()
            .all(|c| headers.iter().any(|h| h == &c.name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> TableSchema {
        TableSchema {
            columns: vec![
                ColumnDef::new("price", ColumnKind::Money),
                ColumnDef::new("name", ColumnKind::Text),
            ],
            required: vec!["price".into()],
            money_floor: None,
            derived: vec![DerivedColumn::Bins {
                source: "price".into(),
                name: "price_bin".into(),
                bins: 40,
            }],
        }
    }

    #[test]
    fn derived_columns_have_kinds() {
        let s = schema();
        assert_eq!(s.kind_of("price"), Some(ColumnKind::Money));
        assert_eq!(s.kind_of("price_bin"), Some(ColumnKind::Text));
        assert_eq!(s.kind_of("missing"), None);
        assert_eq!(s.output_columns(), vec!["price", "name", "price_bin"]);
    }

    #[test]
    fn header_match_ignores_extra_columns() {
        let s = schema();
        let headers: Vec<String> = ["id", "name", "price"].iter().map(|h| h.to_string()).collect();
        assert!(s.matches_headers(&headers));
        assert!(!s.matches_headers(&headers[..2]));
    }

    #[test]
    fn schema_parses_from_json() {
        let json = r#"{
            "columns": [{"name": "Gift Date", "kind": "date"}],
            "derived": [{"type": "month", "source": "Gift Date", "name": "gift_month"}]
        }"#;
        let s: TableSchema = serde_json::from_str(json).unwrap();
        assert!(s.required.is_empty());
        assert_eq!(s.kind_of("gift_month"), Some(ColumnKind::Date));
    }
}
