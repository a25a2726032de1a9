//! Data models for the embankment analysis.
//!
//! This module contains the typed table abstraction (values, columns and
//! datasets) and the report structures built from it.

use crate::error::{AnalysisError, AnalysisResult};
use chrono::{DateTime, NaiveDate, Utc};
use geo::Geometry;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

/// Semantic type of an attribute column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Text,
    Integer,
    Number,
    Boolean,
    Date,
}

impl ColumnType {
    /// Whether values of this type can be summed.
    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnType::Integer | ColumnType::Number)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Text => write!(f, "text"),
            ColumnType::Integer => write!(f, "integer"),
            ColumnType::Number => write!(f, "number"),
            ColumnType::Boolean => write!(f, "boolean"),
            ColumnType::Date => write!(f, "date"),
        }
    }
}

/// A single present attribute value.
///
/// Equality, hashing and ordering are total so values can key a grouping.
/// Numbers compare by bit pattern with `-0.0` folded into `0.0`; text
/// compares case-sensitively.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Text(String),
    Integer(i64),
    Number(f64),
    Boolean(bool),
    Date(NaiveDate),
}

impl Value {
    pub fn column_type(&self) -> ColumnType {
        match self {
            Value::Text(_) => ColumnType::Text,
            Value::Integer(_) => ColumnType::Integer,
            Value::Number(_) => ColumnType::Number,
            Value::Boolean(_) => ColumnType::Boolean,
            Value::Date(_) => ColumnType::Date,
        }
    }

    /// Numeric view of the value, if it has one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Value::Text(_) => 0,
            Value::Integer(_) => 1,
            Value::Number(_) => 2,
            Value::Boolean(_) => 3,
            Value::Date(_) => 4,
        }
    }
}

fn fold_zero(n: f64) -> f64 {
    if n == 0.0 {
        0.0
    } else {
        n
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            Value::Text(s) => s.hash(state),
            Value::Integer(i) => i.hash(state),
            Value::Number(n) => fold_zero(*n).to_bits().hash(state),
            Value::Boolean(b) => b.hash(state),
            Value::Date(d) => d.hash(state),
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            (Value::Integer(a), Value::Integer(b)) => a.cmp(b),
            (Value::Number(a), Value::Number(b)) => fold_zero(*a).total_cmp(&fold_zero(*b)),
            (Value::Boolean(a), Value::Boolean(b)) => a.cmp(b),
            (Value::Date(a), Value::Date(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => write!(f, "{}", s),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Number(n) => write!(f, "{}", n),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

/// A named attribute column: one optional value per record.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    column_type: ColumnType,
    values: Vec<Option<Value>>,
}

impl Column {
    pub fn column_type(&self) -> ColumnType {
        self.column_type
    }

    pub fn values(&self) -> &[Option<Value>] {
        &self.values
    }

    /// Iterate over present values only.
    pub fn present(&self) -> impl Iterator<Item = &Value> {
        self.values.iter().flatten()
    }
}

/// A named, immutable table of attribute records with one geometry each.
///
/// Built through [`DatasetBuilder`], so every column has exactly one entry
/// per record.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    name: String,
    path: PathBuf,
    fields: Vec<String>,
    columns: Vec<Column>,
    geometries: Vec<Option<Geometry<f64>>>,
}

impl Dataset {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.geometries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.geometries.is_empty()
    }

    /// Column names and types in schema order.
    pub fn schema(&self) -> Vec<(&str, ColumnType)> {
        self.fields
            .iter()
            .zip(&self.columns)
            .map(|(name, col)| (name.as_str(), col.column_type))
            .collect()
    }

    /// Look up a column by exact name.
    pub fn column(&self, name: &str) -> AnalysisResult<&Column> {
        self.fields
            .iter()
            .position(|f| f == name)
            .map(|idx| &self.columns[idx])
            .ok_or_else(|| AnalysisError::unknown_column(&self.name, name))
    }

    pub fn geometries(&self) -> &[Option<Geometry<f64>>] {
        &self.geometries
    }

    /// Attribute values of one record, paired with their column names.
    pub fn record(&self, index: usize) -> Vec<(&str, Option<&Value>)> {
        self.fields
            .iter()
            .zip(&self.columns)
            .map(|(name, col)| (name.as_str(), col.values.get(index).and_then(Option::as_ref)))
            .collect()
    }
}

/// Incremental, schema-checked construction of a [`Dataset`].
#[derive(Debug)]
pub struct DatasetBuilder {
    name: String,
    path: PathBuf,
    fields: Vec<String>,
    columns: Vec<Column>,
    geometries: Vec<Option<Geometry<f64>>>,
}

impl DatasetBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: PathBuf::new(),
            fields: Vec::new(),
            columns: Vec::new(),
            geometries: Vec::new(),
        }
    }

    pub fn source_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = path.into();
        self
    }

    /// Declare a column. Must be called before any record is pushed.
    pub fn field(mut self, name: impl Into<String>, column_type: ColumnType) -> Self {
        self.fields.push(name.into());
        self.columns.push(Column {
            column_type,
            values: Vec::new(),
        });
        self
    }

    /// Append one record. Values are given in schema order.
    pub fn push(
        &mut self,
        values: Vec<Option<Value>>,
        geometry: Option<Geometry<f64>>,
    ) -> AnalysisResult<()> {
        if values.len() != self.fields.len() {
            return Err(self.mismatch(format!(
                "record {} has {} values, schema has {} columns",
                self.geometries.len(),
                values.len(),
                self.fields.len()
            )));
        }

        for (idx, value) in values.iter().enumerate() {
            if let Some(v) = value {
                let expected = self.columns[idx].column_type;
                if v.column_type() != expected {
                    return Err(self.mismatch(format!(
                        "record {}: column '{}' expects {}, got {}",
                        self.geometries.len(),
                        self.fields[idx],
                        expected,
                        v.column_type()
                    )));
                }
            }
        }

        for (column, value) in self.columns.iter_mut().zip(values) {
            column.values.push(value);
        }
        self.geometries.push(geometry);
        Ok(())
    }

    /// Finish the dataset, rejecting duplicate column names.
    pub fn build(self) -> AnalysisResult<Dataset> {
        for (idx, name) in self.fields.iter().enumerate() {
            if self.fields[..idx].contains(name) {
                return Err(self.mismatch(format!("duplicate column '{}'", name)));
            }
        }

        Ok(Dataset {
            name: self.name,
            path: self.path,
            fields: self.fields,
            columns: self.columns,
            geometries: self.geometries,
        })
    }

    fn mismatch(&self, detail: String) -> AnalysisError {
        AnalysisError::SchemaMismatch {
            dataset: self.name.clone(),
            detail,
        }
    }
}

/// Count and share of one distinct value in a categorical column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryShare {
    pub value: Value,
    pub count: usize,
    /// Unrounded percentage of the column's present-value count.
    pub percentage: f64,
}

/// Distinct values of one column with their counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryProfile {
    pub dataset: String,
    pub column: String,
    /// Number of records where the column is present.
    pub total: usize,
    pub shares: Vec<CategoryShare>,
}

impl CategoryProfile {
    /// Share of a given value, if it occurs.
    pub fn share(&self, value: &Value) -> Option<&CategoryShare> {
        self.shares.iter().find(|s| &s.value == value)
    }
}

/// Summed length for one group value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupLength {
    pub group: String,
    pub kilometres: f64,
}

/// Coverage figures for the geophysical (DEMP) survey.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveySummary {
    /// Number of survey features (records).
    pub features: usize,
    pub surveyed_km: f64,
    /// Surveyed length as a percentage of the embankment network.
    pub surveyed_pct: f64,
    pub material_types: Vec<String>,
    pub by_material: Vec<GroupLength>,
    pub by_saturation: Vec<GroupLength>,
    pub by_hydraulic_unit: Vec<GroupLength>,
    pub units_surveyed: usize,
    pub units_total: usize,
    pub units_not_surveyed: Vec<String>,
}

/// All narrative figures for the Humber embankment network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbankmentSummary {
    pub defences_km: f64,
    pub low_sections_km: f64,
    /// Low-section length as a percentage of the embankment network.
    pub low_sections_pct: f64,
    /// Steep-slope occurrences, counted on `Face`.
    pub steep_slope_count: usize,
    pub steep_slopes_by_face: CategoryProfile,
    /// Palaeochannel occurrences, counted on `Class`.
    pub palaeochannel_count: usize,
    pub palaeochannels_by_type: CategoryProfile,
    pub survey: SurveySummary,
    pub flood_areas: usize,
    pub hydraulic_units: Vec<String>,
}

/// One loaded dataset as listed in the report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetInfo {
    pub name: String,
    pub path: String,
    pub records: usize,
    pub columns: usize,
}

impl From<&Dataset> for DatasetInfo {
    fn from(dataset: &Dataset) -> Self {
        Self {
            name: dataset.name().to_string(),
            path: dataset.path().display().to_string(),
            records: dataset.len(),
            columns: dataset.fields.len(),
        }
    }
}

/// Metadata about the analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Root directory of the shapefile tree.
    pub data_dir: String,
    pub analysis_date: DateTime<Utc>,
    pub datasets: Vec<DatasetInfo>,
    /// Decimal places used when presenting figures.
    pub decimals: usize,
    pub duration_seconds: f64,
}

/// The complete analysis report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    pub summary: EmbankmentSummary,
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{point, Geometry};
    use std::collections::HashSet;

    fn slopes_builder() -> DatasetBuilder {
        DatasetBuilder::new("steep slopes")
            .field("Face", ColumnType::Text)
            .field("Shape_Leng", ColumnType::Number)
    }

    #[test]
    fn test_value_equality_is_exact() {
        assert_eq!(Value::from("Rear"), Value::from("Rear"));
        assert_ne!(Value::from("Rear"), Value::from("rear"));
        assert_eq!(Value::Number(0.0), Value::Number(-0.0));
        assert_ne!(Value::Integer(1), Value::Number(1.0));
    }

    #[test]
    fn test_value_hash_matches_equality() {
        let mut set = HashSet::new();
        set.insert(Value::Number(0.0));
        set.insert(Value::Number(-0.0));
        set.insert(Value::from("Front"));
        set.insert(Value::from("Front"));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_builder_rejects_wrong_arity() {
        let mut builder = slopes_builder();
        let result = builder.push(vec![Some(Value::from("Front"))], None);
        assert!(matches!(result, Err(AnalysisError::SchemaMismatch { .. })));
    }

    #[test]
    fn test_builder_rejects_wrong_type() {
        let mut builder = slopes_builder();
        let result = builder.push(
            vec![Some(Value::Number(1.0)), Some(Value::Number(2.0))],
            None,
        );
        assert!(matches!(result, Err(AnalysisError::SchemaMismatch { .. })));
    }

    #[test]
    fn test_builder_rejects_duplicate_columns() {
        let builder = DatasetBuilder::new("dup")
            .field("Face", ColumnType::Text)
            .field("Face", ColumnType::Text);
        assert!(builder.build().is_err());
    }

    #[test]
    fn test_dataset_columns_match_record_count() {
        let mut builder = slopes_builder().source_path("LIDAR_derived_data/slopes.shp");
        builder
            .push(
                vec![Some(Value::from("Front")), Some(Value::Number(12.5))],
                Some(Geometry::Point(point!(x: 500000.0, y: 420000.0))),
            )
            .unwrap();
        builder.push(vec![None, Some(Value::Number(3.0))], None).unwrap();
        let dataset = builder.build().unwrap();

        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.column("Face").unwrap().values().len(), 2);
        assert_eq!(dataset.column("Face").unwrap().present().count(), 1);
        assert_eq!(dataset.geometries().len(), 2);
        assert_eq!(
            dataset.schema(),
            vec![("Face", ColumnType::Text), ("Shape_Leng", ColumnType::Number)]
        );
        assert_eq!(dataset.record(1)[0], ("Face", None));
    }

    #[test]
    fn test_unknown_column_names_dataset() {
        let dataset = slopes_builder().build().unwrap();
        match dataset.column("Material") {
            Err(AnalysisError::UnknownColumn { dataset, column }) => {
                assert_eq!(dataset, "steep slopes");
                assert_eq!(column, "Material");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }
}
