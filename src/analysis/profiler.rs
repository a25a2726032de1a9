//! Categorical profiling: distinct values and per-value counts.

use super::aggregator::{count, count_by_group};
use super::ratio::percentage;
use crate::error::AnalysisResult;
use crate::models::{CategoryProfile, CategoryShare, Dataset, Value};
use std::collections::{BTreeMap, BTreeSet};

/// Distinct present values of a column. Empty for an empty dataset.
pub fn distinct_values(dataset: &Dataset, column: &str) -> AnalysisResult<BTreeSet<Value>> {
    Ok(dataset.column(column)?.present().cloned().collect())
}

/// Number of records per distinct value of a column.
pub fn count_by_value(
    dataset: &Dataset,
    column: &str,
) -> AnalysisResult<BTreeMap<Value, usize>> {
    // Missing keys only ever pair with missing values, which Count skips.
    Ok(count_by_group(dataset, column, column)?.groups)
}

/// Number of records whose column equals `value`; 0 when it never occurs.
pub fn count_where(dataset: &Dataset, column: &str, value: &Value) -> AnalysisResult<usize> {
    Ok(count_by_value(dataset, column)?
        .get(value)
        .copied()
        .unwrap_or(0))
}

/// Counts and shares of every distinct value of a column.
pub fn profile(dataset: &Dataset, column: &str) -> AnalysisResult<CategoryProfile> {
    let total = count(dataset, column)?;
    let counts = count_by_value(dataset, column)?;

    let mut shares = Vec::with_capacity(counts.len());
    for (value, n) in counts {
        // total is non-zero whenever a value exists
        let pct = percentage(n as f64, total as f64)?;
        shares.push(CategoryShare {
            value,
            count: n,
            percentage: pct,
        });
    }
    shares.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.value.cmp(&b.value)));

    Ok(CategoryProfile {
        dataset: dataset.name().to_string(),
        column: column.to_string(),
        total,
        shares,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::ratio::round_to;
    use crate::error::AnalysisError;
    use crate::models::{ColumnType, DatasetBuilder};

    fn categorical(name: &str, column: &str, counts: &[(&str, usize)], missing: usize) -> Dataset {
        let mut builder = DatasetBuilder::new(name).field(column, ColumnType::Text);
        for (value, n) in counts {
            for _ in 0..*n {
                builder.push(vec![Some(Value::from(*value))], None).unwrap();
            }
        }
        for _ in 0..missing {
            builder.push(vec![None], None).unwrap();
        }
        builder.build().unwrap()
    }

    #[test]
    fn test_distinct_values_of_empty_dataset() {
        let empty = categorical("empty", "Face", &[], 0);
        assert!(distinct_values(&empty, "Face").unwrap().is_empty());
    }

    #[test]
    fn test_steep_slopes_by_face() {
        let slopes = categorical("steep slopes", "Face", &[("Rear", 2995), ("Front", 1034)], 0);

        let counts = count_by_value(&slopes, "Face").unwrap();
        assert_eq!(counts.len(), 2);
        assert_eq!(counts[&Value::from("Rear")], 2995);
        assert_eq!(counts[&Value::from("Front")], 1034);

        let profile = profile(&slopes, "Face").unwrap();
        assert_eq!(profile.total, 4029);
        assert_eq!(profile.shares[0].value, Value::from("Rear"));
        assert_eq!(round_to(profile.shares[0].percentage, 1), 74.3);
        assert_eq!(round_to(profile.shares[1].percentage, 1), 25.7);
    }

    #[test]
    fn test_palaeochannels_by_type() {
        let channels = categorical(
            "palaeochannels",
            "channel",
            &[("Depression", 49), ("Extrusion", 4)],
            0,
        );
        let profile = profile(&channels, "channel").unwrap();
        let depression = profile.share(&Value::from("Depression")).unwrap();
        assert_eq!(depression.count, 49);
        assert_eq!(round_to(depression.percentage, 1), 92.5);
        assert_eq!(distinct_values(&channels, "channel").unwrap().len(), 2);
    }

    #[test]
    fn test_counts_sum_to_present_count() {
        let ds = categorical("mixed", "Face", &[("Rear", 3), ("Front", 2), ("front", 1)], 4);
        let counts = count_by_value(&ds, "Face").unwrap();
        let total: usize = counts.values().sum();
        assert_eq!(total, count(&ds, "Face").unwrap());
        assert_eq!(total, 6);
        assert_eq!(counts.len(), 3);
    }

    #[test]
    fn test_count_where() {
        let ds = categorical("steep slopes", "Face", &[("Rear", 3), ("Front", 2)], 1);
        assert_eq!(count_where(&ds, "Face", &Value::from("Rear")).unwrap(), 3);
        assert_eq!(count_where(&ds, "Face", &Value::from("Crest")).unwrap(), 0);
        assert_eq!(count_where(&ds, "Face", &Value::from("rear")).unwrap(), 0);
    }

    #[test]
    fn test_unknown_column() {
        let ds = categorical("steep slopes", "Face", &[("Rear", 1)], 0);
        for result in [
            distinct_values(&ds, "channel").map(|_| ()),
            count_by_value(&ds, "channel").map(|_| ()),
            count_where(&ds, "channel", &Value::from("Rear")).map(|_| ()),
            profile(&ds, "channel").map(|_| ()),
        ] {
            assert!(matches!(result, Err(AnalysisError::UnknownColumn { .. })));
        }
    }

    #[test]
    fn test_profile_of_all_missing_column() {
        let ds = categorical("blank", "Face", &[], 3);
        let profile = profile(&ds, "Face").unwrap();
        assert_eq!(profile.total, 0);
        assert!(profile.shares.is_empty());
    }
}
