use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate, NaiveDateTime};

use super::bins::Binning;
use super::loader::RawTable;
use super::model::{Dataset, Record, Value};
use super::schema::{ColumnKind, DerivedColumn, TableSchema};
use crate::error::PipelineError;

/// Date layouts accepted in date columns, tried in order.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%y", "%m/%d/%Y", "%Y/%m/%d"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

// ---------------------------------------------------------------------------
// Cleaning report
// ---------------------------------------------------------------------------

/// What happened to the rows of a raw table during cleaning.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanReport {
    pub rows_read: usize,
    pub rows_kept: usize,
    /// Rows dropped for a missing value in a required column.
    pub dropped_missing: usize,
    /// Rows dropped for a date that could not be parsed.
    pub dropped_bad_date: usize,
    /// Monetary cells raised to the schema floor.
    pub clipped: usize,
}

// ---------------------------------------------------------------------------
// Cell parsers
// ---------------------------------------------------------------------------

/// Parse currency text such as `"$1,250.00"`.
pub fn parse_money(s: &str) -> Option<f64> {
    let cleaned: String = s.chars().filter(|c| *c != '$' && *c != ',').collect();
    cleaned.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|dt| dt.date())
        })
}

pub fn month_start(d: NaiveDate) -> NaiveDate {
    d.with_day(1).unwrap_or(d)
}

/// Outcome of parsing one cell.
enum Cell {
    Ok(Value),
    BadDate,
}

fn parse_cell(raw: Option<&str>, kind: ColumnKind) -> Cell {
    let Some(raw) = raw else {
        return Cell::Ok(Value::Null);
    };
    let value = match kind {
        ColumnKind::Text => Value::String(raw.to_string()),
        ColumnKind::Integer => raw
            .parse::<i64>()
            .map(Value::Integer)
            // Integer columns with nulls are often exported as floats ("2012.0").
            .or_else(|_| {
                raw.parse::<f64>()
                    .ok()
                    .filter(|f| f.fract() == 0.0)
                    .map(|f| Value::Integer(f as i64))
                    .ok_or(())
            })
            .unwrap_or(Value::Null),
        ColumnKind::Number => raw
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(Value::Float)
            .unwrap_or(Value::Null),
        ColumnKind::Money => parse_money(raw).map(Value::Float).unwrap_or(Value::Null),
        ColumnKind::Date => match parse_date(raw) {
            Some(d) => Value::Date(d),
            None => return Cell::BadDate,
        },
    };
    Cell::Ok(value)
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Turn a raw table into a [`Dataset`] conforming to `schema`.
///
/// Malformed rows are dropped and counted; an empty result is still a valid
/// dataset. Only a schema column missing from the header is an error.
pub fn clean(raw: &RawTable, schema: &TableSchema) -> Result<(Dataset, CleanReport), PipelineError> {
    let positions = schema
        .columns
        .iter()
        .map(|c| {
            raw.column_index(&c.name)
                .map(|i| (i, c))
                .ok_or_else(|| PipelineError::MissingColumn(c.name.clone()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut report = CleanReport {
        rows_read: raw.rows.len(),
        ..CleanReport::default()
    };
    let mut records: Vec<Record> = Vec::with_capacity(raw.rows.len());

    'rows: for (row_no, row) in raw.rows.iter().enumerate() {
        let mut record = Record::new();
        for &(idx, col) in &positions {
            let cell = row.get(idx).and_then(|c| c.as_deref());
            match parse_cell(cell, col.kind) {
                Cell::Ok(mut value) => {
                    if let (ColumnKind::Money, Some(floor), Value::Float(v)) =
                        (col.kind, schema.money_floor, &value)
                    {
                        if *v < floor {
                            value = Value::Float(floor);
                            report.clipped += 1;
                        }
                    }
                    record.insert(col.name.clone(), value);
                }
                Cell::BadDate => {
                    log::debug!("Row {row_no}: unparseable date in '{}'", col.name);
                    report.dropped_bad_date += 1;
                    continue 'rows;
                }
            }
        }

        let missing = schema
            .required
            .iter()
            .find(|name| record.get(*name).map_or(true, Value::is_null));
        if let Some(name) = missing {
            log::debug!("Row {row_no}: missing required value '{name}'");
            report.dropped_missing += 1;
            continue;
        }

        records.push(record);
    }

    let binnings = derive_columns(&mut records, schema);
    report.rows_kept = records.len();

    log::info!(
        "Cleaned {} of {} rows ({} missing required values, {} bad dates, {} clipped amounts)",
        report.rows_kept,
        report.rows_read,
        report.dropped_missing,
        report.dropped_bad_date,
        report.clipped
    );

    Ok((Dataset::from_records(records, schema, binnings), report))
}

/// Fill in derived columns; returns the binnings used so charts can reuse
/// the same edges.
fn derive_columns(records: &mut [Record], schema: &TableSchema) -> BTreeMap<String, Binning> {
    let mut binnings = BTreeMap::new();

    for derived in &schema.derived {
        match derived {
            DerivedColumn::Bins { source, name, bins } => {
                let (min, max) = records
                    .iter()
                    .filter_map(|r| r.get(source).and_then(Value::as_f64))
                    .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                        (lo.min(v), hi.max(v))
                    });
                let Some(binning) = Binning::over(min, max, *bins) else {
                    // No numeric values to bin.
                    continue;
                };
                for record in records.iter_mut() {
                    let label = record
                        .get(source)
                        .and_then(Value::as_f64)
                        .and_then(|v| binning.bin_of(v))
                        .map(|i| Value::String(binning.label(i)))
                        .unwrap_or(Value::Null);
                    record.insert(name.clone(), label);
                }
                binnings.insert(name.clone(), binning);
            }
            DerivedColumn::Month { source, name } => {
                for record in records.iter_mut() {
                    let month = record
                        .get(source)
                        .and_then(Value::as_date)
                        .map(|d| Value::Date(month_start(d)))
                        .unwrap_or(Value::Null);
                    record.insert(name.clone(), month);
                }
            }
        }
    }

    binnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::schema::ColumnDef;

    fn raw(headers: &[&str], rows: &[&[&str]]) -> RawTable {
        RawTable {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: rows
                .iter()
                .map(|r| {
                    r.iter()
                        .map(|c| (!c.is_empty()).then(|| c.to_string()))
                        .collect()
                })
                .collect(),
        }
    }

    fn gift_schema() -> TableSchema {
        TableSchema {
            columns: vec![
                ColumnDef::new("Gift Amount", ColumnKind::Money),
                ColumnDef::new("Gift Date", ColumnKind::Date),
                ColumnDef::new("College", ColumnKind::Text),
            ],
            required: vec!["Gift Date".into()],
            money_floor: Some(1.0),
            derived: vec![DerivedColumn::Month {
                source: "Gift Date".into(),
                name: "gift_month".into(),
            }],
        }
    }

    #[test]
    fn money_strips_currency_symbols() {
        assert_eq!(parse_money("$1,250.50"), Some(1250.5));
        assert_eq!(parse_money(" 75 "), Some(75.0));
        assert_eq!(parse_money("n/a"), None);
    }

    #[test]
    fn dates_accept_common_layouts() {
        let d = NaiveDate::from_ymd_opt(2014, 3, 9).unwrap();
        assert_eq!(parse_date("2014-03-09"), Some(d));
        assert_eq!(parse_date("3/9/2014"), Some(d));
        assert_eq!(parse_date("2014-03-09 10:15:00"), Some(d));
        assert_eq!(parse_date("yesterday"), None);
    }

    #[test]
    fn gifts_are_clipped_and_bad_dates_dropped() {
        let table = raw(
            &["Gift Amount", "Gift Date", "College"],
            &[
                &["$0.00", "2015-01-20", "Arts"],
                &["-5", "2015-01-03", "Arts"],
                &["$2,000", "2015-02-11", "Engineering"],
                &["$30", "not a date", "Law"],
                &["$40", "", "Law"],
            ],
        );
        let (ds, report) = clean(&table, &gift_schema()).unwrap();

        assert_eq!(ds.len(), 3);
        assert_eq!(report.rows_read, 5);
        assert_eq!(report.rows_kept, 3);
        assert_eq!(report.dropped_bad_date, 1);
        assert_eq!(report.dropped_missing, 1);
        assert_eq!(report.clipped, 2);

        for i in 0..ds.len() {
            assert!(ds.value(i, "Gift Amount").as_f64().unwrap() >= 1.0);
        }
        assert_eq!(
            ds.value(0, "gift_month"),
            &Value::Date(NaiveDate::from_ymd_opt(2015, 1, 1).unwrap())
        );
        assert_eq!(ds.ranges.get("Gift Amount"), Some(&(1.0, 2000.0)));
    }

    #[test]
    fn listings_get_price_bins() {
        let schema = TableSchema {
            columns: vec![ColumnDef::new("price", ColumnKind::Money)],
            required: vec!["price".into()],
            money_floor: None,
            derived: vec![DerivedColumn::Bins {
                source: "price".into(),
                name: "price_bin".into(),
                bins: 40,
            }],
        };
        let table = raw(&["price"], &[&["$5.00"], &["$45.00"], &["$95.00"], &["free"]]);
        let (ds, report) = clean(&table, &schema).unwrap();

        assert_eq!(report.dropped_missing, 1);
        let labels: Vec<&Value> = (0..ds.len()).map(|i| ds.value(i, "price_bin")).collect();
        assert_eq!(labels[0], &Value::String("(4.91, 7.25]".into()));
        assert_ne!(labels[0], labels[1]);
        assert_ne!(labels[1], labels[2]);
        assert_eq!(ds.binnings["price_bin"].len(), 40);
    }

    #[test]
    fn extreme_prices_keep_rows_without_bins() {
        let schema = TableSchema {
            columns: vec![ColumnDef::new("price", ColumnKind::Money)],
            required: vec!["price".into()],
            money_floor: None,
            derived: vec![DerivedColumn::Bins {
                source: "price".into(),
                name: "price_bin".into(),
                bins: 40,
            }],
        };
        let table = raw(&["price"], &[&["-1.7e308"], &["$1.7e308"], &["$10.00"]]);
        let (ds, report) = clean(&table, &schema).unwrap();

        assert_eq!(report.rows_kept, 3);
        assert!(ds.binnings.get("price_bin").is_none());
        assert!((0..ds.len()).all(|i| ds.value(i, "price_bin").is_null()));
    }

    #[test]
    fn missing_schema_column_is_an_error() {
        let table = raw(&["Gift Amount", "College"], &[]);
        let err = clean(&table, &gift_schema()).unwrap_err();
        assert!(matches!(err, PipelineError::MissingColumn(c) if c == "Gift Date"));
    }

    #[test]
    fn empty_table_is_a_valid_dataset() {
        let table = raw(&["Gift Amount", "Gift Date", "College"], &[]);
        let (ds, report) = clean(&table, &gift_schema()).unwrap();
        assert!(ds.is_empty());
        assert_eq!(report.rows_kept, 0);
    }
}
