//! Column aggregation and grouped reductions.
//!
//! Every aggregate is computed through the [`Reduction`] strategy, so a
//! scalar reduction and its grouped variant always agree.

use crate::error::{AnalysisError, AnalysisResult};
use crate::models::{ColumnType, Dataset, Value};
use std::collections::BTreeMap;

/// A fold over the values of one column.
pub trait Reduction {
    type Output: Clone;

    /// Short name used in log lines.
    fn name(&self) -> &'static str;

    /// Whether the reduction can run over a column of this type.
    fn accepts(&self, column_type: ColumnType) -> bool;

    fn empty(&self) -> Self::Output;

    /// Fold one record's value (`None` when missing) into the accumulator.
    fn accumulate(&self, acc: &mut Self::Output, value: Option<&Value>);
}

/// Sum of present numeric values.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sum;

impl Reduction for Sum {
    type Output = f64;

    fn name(&self) -> &'static str {
        "sum"
    }

    fn accepts(&self, column_type: ColumnType) -> bool {
        column_type.is_numeric()
    }

    fn empty(&self) -> f64 {
        0.0
    }

    fn accumulate(&self, acc: &mut f64, value: Option<&Value>) {
        if let Some(n) = value.and_then(Value::as_f64) {
            *acc += n;
        }
    }
}

/// Number of present values.
#[derive(Debug, Clone, Copy, Default)]
pub struct Count;

impl Reduction for Count {
    type Output = usize;

    fn name(&self) -> &'static str {
        "count"
    }

    fn accepts(&self, _column_type: ColumnType) -> bool {
        true
    }

    fn empty(&self) -> usize {
        0
    }

    fn accumulate(&self, acc: &mut usize, value: Option<&Value>) {
        if value.is_some() {
            *acc += 1;
        }
    }
}

/// Result of a grouped reduction.
///
/// `groups` has exactly one key per distinct group value present in the
/// data. Records whose group value is missing are reduced separately into
/// `unkeyed`, which is `None` when there are no such records.
#[derive(Debug, Clone, PartialEq)]
pub struct Grouped<T> {
    pub groups: BTreeMap<Value, T>,
    pub unkeyed: Option<T>,
}

impl<T> Grouped<T> {
    /// Apply a pure post-processing step (e.g. unit scaling) to every partition.
    pub fn map<U>(self, f: impl Fn(T) -> U) -> Grouped<U> {
        Grouped {
            groups: self.groups.into_iter().map(|(k, v)| (k, f(v))).collect(),
            unkeyed: self.unkeyed.map(f),
        }
    }
}

/// Reduce one column of a dataset.
pub fn reduce<R: Reduction>(
    dataset: &Dataset,
    column: &str,
    reduction: &R,
) -> AnalysisResult<R::Output> {
    let col = dataset.column(column)?;
    if !reduction.accepts(col.column_type()) {
        return Err(AnalysisError::non_numeric(dataset.name(), column));
    }

    let mut acc = reduction.empty();
    for value in col.values() {
        reduction.accumulate(&mut acc, value.as_ref());
    }
    Ok(acc)
}

/// Reduce `value_column` within each partition of `group_column`.
pub fn reduce_by_group<R: Reduction>(
    dataset: &Dataset,
    value_column: &str,
    group_column: &str,
    reduction: &R,
) -> AnalysisResult<Grouped<R::Output>> {
    let values = dataset.column(value_column)?;
    let keys = dataset.column(group_column)?;
    if !reduction.accepts(values.column_type()) {
        return Err(AnalysisError::non_numeric(dataset.name(), value_column));
    }

    let mut groups: BTreeMap<Value, R::Output> = BTreeMap::new();
    let mut unkeyed: Option<R::Output> = None;

    for (key, value) in keys.values().iter().zip(values.values()) {
        let acc = match key {
            Some(k) => groups.entry(k.clone()).or_insert_with(|| reduction.empty()),
            None => unkeyed.get_or_insert_with(|| reduction.empty()),
        };
        reduction.accumulate(acc, value.as_ref());
    }

    tracing::debug!(
        "{} of '{}' by '{}' in '{}': {} groups",
        reduction.name(),
        value_column,
        group_column,
        dataset.name(),
        groups.len()
    );

    Ok(Grouped { groups, unkeyed })
}

/// Sum of the present values of a numeric column.
pub fn sum(dataset: &Dataset, column: &str) -> AnalysisResult<f64> {
    reduce(dataset, column, &Sum)
}

/// Number of records where the column is present.
pub fn count(dataset: &Dataset, column: &str) -> AnalysisResult<usize> {
    reduce(dataset, column, &Count)
}

/// Sum `value_column` per distinct value of `group_column`.
pub fn sum_by_group(
    dataset: &Dataset,
    value_column: &str,
    group_column: &str,
) -> AnalysisResult<Grouped<f64>> {
    reduce_by_group(dataset, value_column, group_column, &Sum)
}

/// Count present values of `value_column` per distinct value of `group_column`.
pub fn count_by_group(
    dataset: &Dataset,
    value_column: &str,
    group_column: &str,
) -> AnalysisResult<Grouped<usize>> {
    reduce_by_group(dataset, value_column, group_column, &Count)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::DatasetBuilder;

    /// Geophysical survey rows: (Material, Saturation, Tot_dist_m).
    pub(crate) fn survey_dataset(rows: &[(Option<&str>, &str, Option<f64>)]) -> Dataset {
        let mut builder = DatasetBuilder::new("geophysical survey")
            .field("Material", ColumnType::Text)
            .field("Saturation", ColumnType::Text)
            .field("Tot_dist_m", ColumnType::Number);
        for (material, saturation, dist) in rows {
            builder
                .push(
                    vec![
                        material.map(Value::from),
                        Some(Value::from(*saturation)),
                        dist.map(Value::Number),
                    ],
                    None,
                )
                .unwrap();
        }
        builder.build().unwrap()
    }

    /// Sum over every partition, unkeyed included.
    fn total<T: Copy + std::iter::Sum<T>>(grouped: &Grouped<T>) -> T {
        grouped.groups.values().chain(grouped.unkeyed.iter()).copied().sum()
    }

    fn sample() -> Dataset {
        survey_dataset(&[
            (Some("CLAY"), "Normal", Some(1200.0)),
            (Some("SILT"), "High", Some(800.0)),
            (Some("CLAY"), "Normal", Some(500.0)),
            (None, "Low", Some(250.0)),
            (Some("clay"), "Normal", None),
        ])
    }

    #[test]
    fn test_sum_skips_missing() {
        assert_eq!(sum(&sample(), "Tot_dist_m").unwrap(), 2750.0);
    }

    #[test]
    fn test_sum_of_empty_dataset_is_zero() {
        let empty = survey_dataset(&[]);
        assert_eq!(sum(&empty, "Tot_dist_m").unwrap(), 0.0);
        assert_eq!(count(&empty, "Material").unwrap(), 0);
    }

    #[test]
    fn test_sum_rejects_text_column() {
        let err = sum(&sample(), "Material").unwrap_err();
        assert_eq!(
            err,
            AnalysisError::NonNumericColumn {
                dataset: "geophysical survey".to_string(),
                column: "Material".to_string(),
            }
        );
    }

    #[test]
    fn test_count_excludes_missing() {
        let ds = sample();
        assert_eq!(count(&ds, "Material").unwrap(), 4);
        assert_eq!(count(&ds, "Tot_dist_m").unwrap(), 4);
        assert_eq!(count(&ds, "Saturation").unwrap(), 5);
    }

    #[test]
    fn test_sum_by_group_is_case_sensitive() {
        let grouped = sum_by_group(&sample(), "Tot_dist_m", "Material").unwrap();
        assert_eq!(grouped.groups.len(), 3);
        assert_eq!(grouped.groups[&Value::from("CLAY")], 1700.0);
        assert_eq!(grouped.groups[&Value::from("SILT")], 800.0);
        assert_eq!(grouped.groups[&Value::from("clay")], 0.0);
        assert_eq!(grouped.unkeyed, Some(250.0));
    }

    #[test]
    fn test_grouping_preserves_total() {
        let ds = sample();
        let expected = sum(&ds, "Tot_dist_m").unwrap();
        for group in ["Material", "Saturation"] {
            let grouped = sum_by_group(&ds, "Tot_dist_m", group).unwrap();
            assert_eq!(total(&grouped), expected, "grouping by {}", group);
        }
    }

    #[test]
    fn test_no_unkeyed_partition_when_keys_complete() {
        let grouped = sum_by_group(&sample(), "Tot_dist_m", "Saturation").unwrap();
        assert!(grouped.unkeyed.is_none());
        assert_eq!(grouped.groups[&Value::from("Normal")], 1700.0);
    }

    #[test]
    fn test_grouping_by_unknown_column_fails() {
        let err = sum_by_group(&sample(), "Tot_dist_m", "HS_Hyd_Uni").unwrap_err();
        assert!(matches!(err, AnalysisError::UnknownColumn { ref column, .. } if column == "HS_Hyd_Uni"));

        let err = count_by_group(&sample(), "Shape_Leng", "Material").unwrap_err();
        assert!(matches!(err, AnalysisError::UnknownColumn { .. }));
    }

    #[test]
    fn test_count_by_group() {
        let grouped = count_by_group(&sample(), "Tot_dist_m", "Saturation").unwrap();
        assert_eq!(grouped.groups[&Value::from("Normal")], 2);
        assert_eq!(total(&grouped), count(&sample(), "Tot_dist_m").unwrap());
    }

    #[test]
    fn test_grouped_map_scales_every_partition() {
        let km = sum_by_group(&sample(), "Tot_dist_m", "Material")
            .unwrap()
            .map(|m| m / 1000.0);
        assert_eq!(km.groups[&Value::from("CLAY")], 1.7);
        assert_eq!(km.unkeyed, Some(0.25));
    }
}
