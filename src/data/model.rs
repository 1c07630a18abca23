use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{Datelike, NaiveDate};

use super::bins::Binning;
use super::schema::{ColumnKind, TableSchema};

// ---------------------------------------------------------------------------
// Value – a single typed cell
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value after cleaning.
/// Using `BTreeMap` / `BTreeSet` downstream so `Value` must be `Ord`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Integer(i64),
    Float(f64),
    Date(NaiveDate),
    Null,
}

// -- Manual Eq/Ord so we can put Value in BTreeSet --

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use Value::*;
        fn discriminant(v: &Value) -> u8 {
            match v {
                Null => 0,
                Integer(_) => 1,
                Float(_) => 2,
                Date(_) => 3,
                String(_) => 4,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Null, Null) => std::cmp::Ordering::Equal,
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (Date(a), Date(b)) => a.cmp(b),
            (String(a), String(b)) => a.cmp(b),
            _ => std::cmp::Ordering::Equal,
        }
    }
}

impl std::hash::Hash for Value {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::String(s) => s.hash(state),
            Value::Integer(i) => i.hash(state),
            Value::Float(f) => f.to_bits().hash(state),
            Value::Date(d) => d.hash(state),
            Value::Null => {}
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{s}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v:.2}"),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Value::Null => write!(f, "<null>"),
        }
    }
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Interpret the value as an `f64` for aggregation and plotting.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// Position of the value on an ordinal axis. Dates map to their day
    /// number so numeric and date ranges share one representation.
    pub fn ordinal(&self) -> Option<f64> {
        match self {
            Value::Date(d) => Some(d.num_days_from_ce() as f64),
            other => other.as_f64(),
        }
    }
}

/// Inverse of [`Value::ordinal`] for date axes.
pub fn date_from_ordinal(days: f64) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(days.round() as i32)
}

// ---------------------------------------------------------------------------
// Record – one cleaned row
// ---------------------------------------------------------------------------

/// One row of the cleaned dataset: column_name → value.
pub type Record = BTreeMap<String, Value>;

// ---------------------------------------------------------------------------
// Dataset – the complete cleaned table
// ---------------------------------------------------------------------------

/// The full cleaned dataset with pre-computed column indices.
///
/// Built once per load and never mutated afterwards; every filter and view is
/// computed from it by index.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// All records (rows), in file order.
    pub records: Vec<Record>,
    /// Ordered list of column names, source columns first, then derived ones.
    pub column_names: Vec<String>,
    /// For each text column the sorted set of distinct non-null values.
    pub unique_values: BTreeMap<String, BTreeSet<Value>>,
    /// Observed `[min, max]` of every ordinal (numeric or date) column.
    pub ranges: BTreeMap<String, (f64, f64)>,
    /// Bin edges of every binned derived column, keyed by the derived name.
    pub binnings: BTreeMap<String, Binning>,
}

impl Dataset {
    /// Build column indices from cleaned records.
    pub fn from_records(
        records: Vec<Record>,
        schema: &TableSchema,
        binnings: BTreeMap<String, Binning>,
    ) -> Self {
        let column_names = schema.output_columns();
        let mut unique_values: BTreeMap<String, BTreeSet<Value>> = BTreeMap::new();
        let mut ranges: BTreeMap<String, (f64, f64)> = BTreeMap::new();

        for rec in &records {
            for (col, val) in rec {
                if val.is_null() {
                    continue;
                }
                match schema.kind_of(col) {
                    Some(ColumnKind::Text) | None => {
                        unique_values
                            .entry(col.clone())
                            .or_default()
                            .insert(val.clone());
                    }
                    Some(_) => {
                        if let Some(x) = val.ordinal() {
                            let entry = ranges.entry(col.clone()).or_insert((x, x));
                            entry.0 = entry.0.min(x);
                            entry.1 = entry.1.max(x);
                        }
                    }
                }
            }
        }

        Dataset {
            records,
            column_names,
            unique_values,
            ranges,
            binnings,
        }
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Value of `column` in record `idx`, `Null` when absent.
    pub fn value(&self, idx: usize, column: &str) -> &Value {
        static NULL: Value = Value::Null;
        self.records[idx].get(column).unwrap_or(&NULL)
    }
}
