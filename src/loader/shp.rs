//! Shapefile-backed source provider.
//!
//! Geometry comes from the `.shp` file, attributes from the sibling `.dbf`
//! table. Both are read eagerly; the files are not touched again.

use super::{SourceProvider, SourceSpec};
use crate::error::{AnalysisError, AnalysisResult};
use crate::models::{ColumnType, Dataset, DatasetBuilder, Value};
use chrono::NaiveDate;
use geo::Geometry;
use shapefile::dbase::{self, FieldType, FieldValue};
use shapefile::Shape;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Reads ESRI shapefiles relative to a data directory.
#[derive(Debug, Clone)]
pub struct ShapefileProvider {
    root: PathBuf,
}

impl ShapefileProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn read(&self, spec: &SourceSpec, shp_path: &Path) -> Result<Dataset, String> {
        let dbf_path = shp_path.with_extension("dbf");

        let shapes = shapefile::read_shapes(shp_path).map_err(|e| e.to_string())?;
        let mut table = dbase::Reader::from_path(&dbf_path)
            .map_err(|e| format!("{}: {}", dbf_path.display(), e))?;

        let fields: Vec<(String, ColumnType)> = table
            .fields()
            .iter()
            .filter(|f| f.name() != "DeletionFlag")
            .map(|f| (f.name().to_string(), column_type(f.field_type())))
            .collect();
        let records = table.read().map_err(|e| e.to_string())?;

        if shapes.len() != records.len() {
            return Err(format!(
                "{} shapes but {} attribute records",
                shapes.len(),
                records.len()
            ));
        }

        let mut builder = fields.iter().fold(
            DatasetBuilder::new(&spec.name).source_path(&spec.path),
            |builder, (name, ty)| builder.field(name.clone(), *ty),
        );

        for (shape, record) in shapes.into_iter().zip(records) {
            let values = fields
                .iter()
                .map(|(name, ty)| match record.get(name) {
                    Some(v) => to_value(v, *ty).map_err(|e| format!("field '{}': {}", name, e)),
                    None => Ok(None),
                })
                .collect::<Result<Vec<_>, String>>()?;
            builder
                .push(values, to_geometry(shape)?)
                .map_err(|e| e.to_string())?;
        }

        builder.build().map_err(|e| e.to_string())
    }
}

impl SourceProvider for ShapefileProvider {
    fn load(&self, spec: &SourceSpec) -> AnalysisResult<Dataset> {
        let shp_path = self.root.join(&spec.path);
        debug!("Reading shapefile: {}", shp_path.display());

        let dataset = self
            .read(spec, &shp_path)
            .map_err(|reason| AnalysisError::SourceUnavailable {
                dataset: spec.name.clone(),
                path: shp_path.clone(),
                reason,
            })?;

        debug!(
            "Loaded '{}': {} records, {} columns",
            dataset.name(),
            dataset.len(),
            dataset.schema().len()
        );
        Ok(dataset)
    }
}

/// Map a dBase field type onto the table's column types.
fn column_type(field_type: FieldType) -> ColumnType {
    match field_type {
        FieldType::Numeric | FieldType::Float | FieldType::Double | FieldType::Currency => {
            ColumnType::Number
        }
        FieldType::Integer => ColumnType::Integer,
        FieldType::Logical => ColumnType::Boolean,
        FieldType::Date | FieldType::DateTime => ColumnType::Date,
        FieldType::Character | FieldType::Memo => ColumnType::Text,
    }
}

/// Convert a dBase value into a typed value; `Ok(None)` when missing.
///
/// A value that does not fit its column's type, or a date the calendar
/// rejects, is an error rather than a missing value.
fn to_value(value: &FieldValue, column_type: ColumnType) -> Result<Option<Value>, String> {
    let value = match value {
        FieldValue::Character(s) => s.clone().map(Value::Text),
        FieldValue::Memo(s) => Some(Value::Text(s.clone())),
        FieldValue::Numeric(n) => n.map(Value::Number),
        FieldValue::Float(f) => f.map(|f| Value::Number(f as f64)),
        FieldValue::Double(d) => Some(Value::Number(*d)),
        FieldValue::Currency(c) => Some(Value::Number(*c)),
        FieldValue::Integer(i) => Some(Value::Integer(*i as i64)),
        FieldValue::Logical(b) => b.map(Value::Boolean),
        FieldValue::Date(d) => d.as_ref().map(to_date).transpose()?,
        FieldValue::DateTime(dt) => Some(to_date(&dt.date())?),
    };

    match value {
        // NaN marks an unset numeric field in some writers
        Some(Value::Number(n)) if n.is_nan() => Ok(None),
        Some(v) if v.column_type() != column_type => Err(format!(
            "{} value '{}' in a {} column",
            v.column_type(),
            v,
            column_type
        )),
        v => Ok(v),
    }
}

fn to_date(d: &dbase::Date) -> Result<Value, String> {
    NaiveDate::from_ymd_opt(d.year() as i32, d.month(), d.day())
        .map(Value::Date)
        .ok_or_else(|| format!("invalid date {}-{}-{}", d.year(), d.month(), d.day()))
}

fn to_geometry(shape: Shape) -> Result<Option<Geometry<f64>>, String> {
    if let Shape::NullShape = shape {
        return Ok(None);
    }
    Geometry::<f64>::try_from(shape)
        .map(Some)
        .map_err(|e| e.to_string())
}
