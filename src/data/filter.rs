use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::model::{Dataset, Value};

// ---------------------------------------------------------------------------
// Filter predicate: one category column + one inclusive ordinal range
// ---------------------------------------------------------------------------

/// Which category values pass the filter.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategorySelection {
    /// No category restriction.
    #[default]
    All,
    Only(Value),
}

impl CategorySelection {
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            CategorySelection::All => true,
            CategorySelection::Only(selected) => selected == value,
        }
    }
}

/// Inclusive `[lower, upper]` interval on an ordinal column.
///
/// Bounds are ordinals (see [`Value::ordinal`]), so date columns are
/// filtered by day number.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    pub lower: f64,
    pub upper: f64,
}

impl Interval {
    /// Build an interval, swapping the bounds if they arrive reversed.
    pub fn new(a: f64, b: f64) -> Self {
        Interval {
            lower: a.min(b),
            upper: a.max(b),
        }
    }

    pub fn contains(&self, x: f64) -> bool {
        self.lower <= x && x <= self.upper
    }

    /// Restrict to `[min, max]`, keeping `lower <= upper`.
    pub fn clamp_to(self, min: f64, max: f64) -> Self {
        let lower = self.lower.clamp(min, max);
        let upper = self.upper.clamp(min, max);
        Interval::new(lower, upper)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RangeFilter {
    pub column: String,
    pub interval: Interval,
}

/// The active user selection, passed explicitly to every recomputation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterSpec {
    pub category_column: Option<String>,
    pub category: CategorySelection,
    pub range: Option<RangeFilter>,
}

impl FilterSpec {
    /// Selection that lets every record through: `All` categories and the
    /// full observed range of `range_column`.
    pub fn unrestricted(
        dataset: &Dataset,
        category_column: Option<&str>,
        range_column: Option<&str>,
    ) -> Self {
        let range = range_column.and_then(|col| {
            dataset.ranges.get(col).map(|&(min, max)| RangeFilter {
                column: col.to_string(),
                interval: Interval::new(min, max),
            })
        });
        FilterSpec {
            category_column: category_column.map(str::to_string),
            category: CategorySelection::All,
            range,
        }
    }

    /// Copy of this spec with the range clamped to the observed bounds.
    pub fn clamped(mut self, dataset: &Dataset) -> Self {
        if let Some(range) = &mut self.range {
            if let Some(&(min, max)) = dataset.ranges.get(&range.column) {
                range.interval = range.interval.clamp_to(min, max);
            }
        }
        self
    }

    /// Whether record `idx` satisfies the category and range predicates.
    pub fn matches(&self, dataset: &Dataset, idx: usize) -> bool {
        if let Some(col) = &self.category_column {
            if !self.category.accepts(dataset.value(idx, col)) {
                return false;
            }
        }
        if let Some(range) = &self.range {
            match dataset.value(idx, &range.column).ordinal() {
                Some(x) if range.interval.contains(x) => {}
                _ => return false,
            }
        }
        true
    }
}

/// Return indices of records that pass `spec`, in dataset order.
pub fn filtered_indices(dataset: &Dataset, spec: &FilterSpec) -> Vec<usize> {
    (0..dataset.len())
        .filter(|&idx| spec.matches(dataset, idx))
        .collect()
}

/// Narrow already-filtered `indices` to records whose `column` lies inside
/// the brushed `interval`.
pub fn apply_brush(
    dataset: &Dataset,
    indices: &[usize],
    column: &str,
    interval: &Interval,
) -> Vec<usize> {
    indices
        .iter()
        .copied()
        .filter(|&idx| {
            dataset
                .value(idx, column)
                .ordinal()
                .is_some_and(|x| interval.contains(x))
        })
        .collect()
}

/// A category value picked on a chart, together with the column it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Highlight {
    pub column: String,
    pub value: Value,
}

impl Highlight {
    pub fn new(column: &str, value: Value) -> Self {
        Highlight {
            column: column.to_string(),
            value,
        }
    }

    /// Values of `group_column` that stay lit: the highlighted value itself
    /// when the chart groups by the highlighted column, otherwise every group
    /// holding at least one record of `indices` with `column == value`.
    pub fn matching_groups(
        &self,
        dataset: &Dataset,
        indices: &[usize],
        group_column: &str,
    ) -> BTreeSet<Value> {
        if group_column == self.column {
            return BTreeSet::from([self.value.clone()]);
        }
        indices
            .iter()
            .filter(|&&idx| *dataset.value(idx, &self.column) == self.value)
            .map(|&idx| dataset.value(idx, group_column))
            .filter(|group| !group.is_null())
            .cloned()
            .collect()
    }
}

/// Distinct non-null values of `column` with their record counts, most
/// frequent first; ties keep first-encounter order.
pub fn category_options(dataset: &Dataset, column: &str) -> Vec<(Value, usize)> {
    let mut first_seen: BTreeMap<&Value, usize> = BTreeMap::new();
    let mut options: Vec<(Value, usize)> = Vec::new();
    for idx in 0..dataset.len() {
        let value = dataset.value(idx, column);
        if value.is_null() {
            continue;
        }
        match first_seen.get(value) {
            Some(&pos) => options[pos].1 += 1,
            None => {
                first_seen.insert(value, options.len());
                options.push((value.clone(), 1));
            }
        }
    }
    options.sort_by(|a, b| b.1.cmp(&a.1));
    options
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Record;
    use crate::data::schema::{ColumnDef, ColumnKind, TableSchema};

    fn alumni() -> Dataset {
        let rows = [
            ("Arts", 2009),
            ("Engineering", 2010),
            ("Arts", 2012),
            ("Engineering", 2013),
            ("Arts", 2010),
        ];
        let records: Vec<Record> = rows
            .iter()
            .map(|(college, year)| {
                let mut r = Record::new();
                r.insert("College".into(), Value::String(college.to_string()));
                r.insert("Year of Graduation".into(), Value::Integer(*year));
                r
            })
            .collect();
        let schema = TableSchema {
            columns: vec![
                ColumnDef::new("College", ColumnKind::Text),
                ColumnDef::new("Year of Graduation", ColumnKind::Integer),
            ],
            required: vec![],
            money_floor: None,
            derived: vec![],
        };
        Dataset::from_records(records, &schema, BTreeMap::new())
    }

    fn years(ds: &Dataset, indices: &[usize]) -> Vec<i64> {
        indices
            .iter()
            .map(|&i| match ds.value(i, "Year of Graduation") {
                Value::Integer(y) => *y,
                other => panic!("unexpected {other:?}"),
            })
            .collect()
    }

    #[test]
    fn range_filter_is_inclusive() {
        let ds = alumni();
        let mut spec = FilterSpec::unrestricted(&ds, Some("College"), Some("Year of Graduation"));
        spec.range.as_mut().unwrap().interval = Interval::new(2010.0, 2012.0);

        let idx = filtered_indices(&ds, &spec);
        assert_eq!(years(&ds, &idx), vec![2010, 2012, 2010]);
    }

    #[test]
    fn category_and_range_combine() {
        let ds = alumni();
        let mut spec = FilterSpec::unrestricted(&ds, Some("College"), Some("Year of Graduation"));
        spec.category = CategorySelection::Only(Value::String("Arts".into()));
        spec.range.as_mut().unwrap().interval = Interval::new(2010.0, 2013.0);

        let idx = filtered_indices(&ds, &spec);
        assert_eq!(idx, vec![2, 4]);
    }

    #[test]
    fn unrestricted_spec_keeps_everything() {
        let ds = alumni();
        let spec = FilterSpec::unrestricted(&ds, Some("College"), Some("Year of Graduation"));
        assert_eq!(
            spec.range.as_ref().unwrap().interval,
            Interval::new(2009.0, 2013.0)
        );
        assert_eq!(filtered_indices(&ds, &spec), (0..ds.len()).collect::<Vec<_>>());
    }

    #[test]
    fn filtering_is_a_subset_and_idempotent() {
        let ds = alumni();
        let mut spec = FilterSpec::unrestricted(&ds, Some("College"), Some("Year of Graduation"));
        spec.category = CategorySelection::Only(Value::String("Engineering".into()));

        let first = filtered_indices(&ds, &spec);
        let second = filtered_indices(&ds, &spec);
        assert_eq!(first, second);
        assert!(first.iter().all(|&i| i < ds.len()));
        assert!(first.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(first, vec![1, 3]);
    }

    #[test]
    fn clamping_keeps_bounds_inside_observed_range() {
        let ds = alumni();
        let mut spec = FilterSpec::unrestricted(&ds, None, Some("Year of Graduation"));
        spec.range.as_mut().unwrap().interval = Interval::new(1990.0, 2050.0);
        let spec = spec.clamped(&ds);
        assert_eq!(
            spec.range.unwrap().interval,
            Interval::new(2009.0, 2013.0)
        );

        let reversed = Interval::new(2012.0, 2010.0);
        assert!(reversed.lower <= reversed.upper);
    }

    #[test]
    fn brush_narrows_filtered_population() {
        let ds = alumni();
        let idx = vec![0, 1, 2, 3];
        let brushed = apply_brush(&ds, &idx, "Year of Graduation", &Interval::new(2011.0, 2014.0));
        assert_eq!(brushed, vec![2, 3]);
    }

    #[test]
    fn highlight_lights_groups_through_shared_records() {
        let ds = alumni();
        let all: Vec<usize> = (0..ds.len()).collect();
        let arts = Highlight::new("College", Value::String("Arts".into()));

        let same = arts.matching_groups(&ds, &all, "College");
        assert_eq!(same, BTreeSet::from([Value::String("Arts".into())]));

        let years = arts.matching_groups(&ds, &all, "Year of Graduation");
        assert_eq!(
            years,
            BTreeSet::from([Value::Integer(2009), Value::Integer(2010), Value::Integer(2012)])
        );

        // Only records still on screen count.
        let visible = arts.matching_groups(&ds, &[0, 1, 3], "Year of Graduation");
        assert_eq!(visible, BTreeSet::from([Value::Integer(2009)]));
    }

    #[test]
    fn options_are_ordered_by_frequency() {
        let ds = alumni();
        let opts = category_options(&ds, "College");
        assert_eq!(
            opts,
            vec![
                (Value::String("Arts".into()), 3),
                (Value::String("Engineering".into()), 2),
            ]
        );
    }
}
