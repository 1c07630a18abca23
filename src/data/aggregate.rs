use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::clean::month_start;
use super::model::{Dataset, Value};

// ---------------------------------------------------------------------------
// Group aggregates
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateOp {
    Sum,
    Mean,
    Count,
}

impl AggregateOp {
    pub fn label(&self) -> &'static str {
        match self {
            AggregateOp::Sum => "Total",
            AggregateOp::Mean => "Average",
            AggregateOp::Count => "Count",
        }
    }
}

/// One bar of a grouped view.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupRow {
    pub group: Value,
    pub value: f64,
    /// Number of records that contributed.
    pub count: usize,
}

#[derive(Default)]
struct Acc {
    sum: f64,
    count: usize,
}

/// Group the records at `indices` by `group_col` and aggregate `value_col`.
///
/// Rows come out sorted by the aggregate, largest first; equal aggregates
/// keep the order in which their groups were first seen. Records with a null
/// group, or a null value for `Sum`/`Mean`, are skipped.
pub fn group_aggregate(
    dataset: &Dataset,
    indices: &[usize],
    group_col: &str,
    value_col: &str,
    op: AggregateOp,
) -> Vec<GroupRow> {
    let mut slot: BTreeMap<&Value, usize> = BTreeMap::new();
    let mut groups: Vec<(&Value, Acc)> = Vec::new();

    for &idx in indices {
        let group = dataset.value(idx, group_col);
        if group.is_null() {
            continue;
        }
        let value = match op {
            AggregateOp::Count => 0.0,
            AggregateOp::Sum | AggregateOp::Mean => {
                match dataset.value(idx, value_col).as_f64() {
                    Some(v) => v,
                    None => continue,
                }
            }
        };
        let pos = *slot.entry(group).or_insert_with(|| {
            groups.push((group, Acc::default()));
            groups.len() - 1
        });
        let acc = &mut groups[pos].1;
        acc.sum += value;
        acc.count += 1;
    }

    let mut rows: Vec<GroupRow> = groups
        .into_iter()
        .map(|(group, acc)| {
            let value = match op {
                AggregateOp::Sum => acc.sum,
                AggregateOp::Mean => acc.sum / acc.count as f64,
                AggregateOp::Count => acc.count as f64,
            };
            GroupRow {
                group: group.clone(),
                value,
                count: acc.count,
            }
        })
        .collect();

    // `sort_by` is stable, so ties stay in first-encounter order.
    rows.sort_by(|a, b| b.value.total_cmp(&a.value));
    rows
}

/// The `n` groups with the largest aggregate.
pub fn top_n(
    dataset: &Dataset,
    indices: &[usize],
    group_col: &str,
    value_col: &str,
    op: AggregateOp,
    n: usize,
) -> Vec<GroupRow> {
    let mut rows = group_aggregate(dataset, indices, group_col, value_col, op);
    rows.truncate(n);
    rows
}

// ---------------------------------------------------------------------------
// Time buckets
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct MonthTotal {
    /// First day of the month.
    pub month: NaiveDate,
    pub total: f64,
    pub count: usize,
}

/// Sum `value_col` per calendar month of `date_col`, oldest month first.
pub fn monthly_sum(
    dataset: &Dataset,
    indices: &[usize],
    date_col: &str,
    value_col: &str,
) -> Vec<MonthTotal> {
    let mut buckets: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();
    for &idx in indices {
        let (Some(date), Some(v)) = (
            dataset.value(idx, date_col).as_date(),
            dataset.value(idx, value_col).as_f64(),
        ) else {
            continue;
        };
        let entry = buckets.entry(month_start(date)).or_default();
        entry.0 += v;
        entry.1 += 1;
    }
    buckets
        .into_iter()
        .map(|(month, (total, count))| MonthTotal { month, total, count })
        .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::data::model::Record;
    use crate::data::schema::{ColumnDef, ColumnKind, TableSchema};

    fn dataset(rows: &[(&str, f64, &str)]) -> Dataset {
        let records: Vec<Record> = rows
            .iter()
            .map(|(cat, value, date)| {
                let mut r = Record::new();
                r.insert("category".into(), Value::String(cat.to_string()));
                r.insert("value".into(), Value::Float(*value));
                r.insert(
                    "date".into(),
                    Value::Date(NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap()),
                );
                r
            })
            .collect();
        let schema = TableSchema {
            columns: vec![
                ColumnDef::new("category", ColumnKind::Text),
                ColumnDef::new("value", ColumnKind::Number),
                ColumnDef::new("date", ColumnKind::Date),
            ],
            required: vec![],
            money_floor: None,
            derived: vec![],
        };
        Dataset::from_records(records, &schema, BTreeMap::new())
    }

    fn total(ds: &Dataset, indices: &[usize], value_col: &str) -> f64 {
        indices
            .iter()
            .filter_map(|&idx| ds.value(idx, value_col).as_f64())
            .sum()
    }

    fn all(ds: &Dataset) -> Vec<usize> {
        (0..ds.len()).collect()
    }

    fn s(v: &str) -> Value {
        Value::String(v.to_string())
    }

    #[test]
    fn group_sum_ties_keep_encounter_order() {
        let ds = dataset(&[
            ("A", 10.0, "2020-01-01"),
            ("B", 30.0, "2020-01-01"),
            ("A", 20.0, "2020-01-01"),
        ]);
        let rows = group_aggregate(&ds, &all(&ds), "category", "value", AggregateOp::Sum);
        assert_eq!(
            rows,
            vec![
                GroupRow { group: s("A"), value: 30.0, count: 2 },
                GroupRow { group: s("B"), value: 30.0, count: 1 },
            ]
        );
        let sum: f64 = rows.iter().map(|r| r.value).sum();
        assert_eq!(sum, 60.0);
    }

    #[test]
    fn group_sums_add_up_to_filtered_total() {
        let ds = dataset(&[
            ("A", 1.5, "2020-01-01"),
            ("B", 2.0, "2020-01-01"),
            ("C", 4.25, "2020-01-01"),
            ("B", 8.0, "2020-01-01"),
            ("A", 16.0, "2020-01-01"),
        ]);
        let subset = vec![0, 2, 3, 4];
        let rows = group_aggregate(&ds, &subset, "category", "value", AggregateOp::Sum);
        let grouped: f64 = rows.iter().map(|r| r.value).sum();
        assert_eq!(grouped, total(&ds, &subset, "value"));
    }

    #[test]
    fn mean_sorts_descending() {
        let ds = dataset(&[
            ("Pearl", 100.0, "2020-01-01"),
            ("Pearl", 300.0, "2020-01-01"),
            ("Alberta", 250.0, "2020-01-01"),
            ("Sellwood", 90.0, "2020-01-01"),
        ]);
        let rows = group_aggregate(&ds, &all(&ds), "category", "value", AggregateOp::Mean);
        let order: Vec<(Value, f64)> = rows.into_iter().map(|r| (r.group, r.value)).collect();
        assert_eq!(
            order,
            vec![(s("Alberta"), 250.0), (s("Pearl"), 200.0), (s("Sellwood"), 90.0)]
        );
    }

    #[test]
    fn top_n_is_bounded_and_ranked() {
        let rows: Vec<(String, f64)> = (0..30).map(|i| (format!("m{i}"), (i % 7) as f64)).collect();
        let refs: Vec<(&str, f64, &str)> =
            rows.iter().map(|(c, v)| (c.as_str(), *v, "2020-01-01")).collect();
        let ds = dataset(&refs);

        let top = top_n(&ds, &all(&ds), "category", "value", AggregateOp::Sum, 20);
        assert_eq!(top.len(), 20);
        assert!(top.windows(2).all(|w| w[0].value >= w[1].value));

        let few = top_n(&ds, &[0, 1, 2], "category", "value", AggregateOp::Sum, 20);
        assert_eq!(few.len(), 3);
    }

    #[test]
    fn count_ignores_value_column() {
        let ds = dataset(&[("A", 1.0, "2020-01-01"), ("A", 1.0, "2020-01-01"), ("B", 9.0, "2020-01-01")]);
        let rows = group_aggregate(&ds, &all(&ds), "category", "missing", AggregateOp::Count);
        assert_eq!(rows[0].group, s("A"));
        assert_eq!(rows[0].value, 2.0);
    }

    #[test]
    fn months_are_chronological() {
        let ds = dataset(&[
            ("A", 5.0, "2016-03-14"),
            ("A", 1.0, "2015-12-31"),
            ("B", 2.0, "2016-03-01"),
            ("B", 7.0, "2015-12-02"),
        ]);
        let months = monthly_sum(&ds, &all(&ds), "date", "value");
        let d = |y, m| NaiveDate::from_ymd_opt(y, m, 1).unwrap();
        assert_eq!(
            months,
            vec![
                MonthTotal { month: d(2015, 12), total: 8.0, count: 2 },
                MonthTotal { month: d(2016, 3), total: 7.0, count: 2 },
            ]
        );
    }

    #[test]
    fn empty_selection_yields_empty_views() {
        let ds = dataset(&[("A", 5.0, "2016-03-14")]);
        assert!(group_aggregate(&ds, &[], "category", "value", AggregateOp::Sum).is_empty());
        assert!(monthly_sum(&ds, &[], "date", "value").is_empty());
    }
}
