//! GeoJSON layer files and the `map.json` manifest.

use super::{MapManifest, MapSink, StyledLayer};
use anyhow::{Context, Result};
use geo::{Coord, Geometry, LineString, Polygon};
use serde_json::{json, Map, Value as Json};
use std::path::{Path, PathBuf};

/// File name of the manifest written next to the layers.
pub const MANIFEST_FILE: &str = "map.json";

/// Writes one `<id>.geojson` FeatureCollection per layer into a directory.
#[derive(Debug, Clone)]
pub struct GeoJsonSink {
    dir: PathBuf,
}

impl GeoJsonSink {
    /// Create the sink, creating the output directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create map directory: {}", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl MapSink for GeoJsonSink {
    fn write_layer(&mut self, layer: &StyledLayer<'_>, crs: &str) -> Result<String> {
        let file = format!("{}.geojson", layer.style.id);
        let collection = feature_collection(layer, crs)?;
        let path = self.dir.join(&file);

        std::fs::write(&path, serde_json::to_string(&collection)?)
            .with_context(|| format!("Failed to write map layer: {}", path.display()))?;

        Ok(file)
    }

    fn write_manifest(&mut self, manifest: &MapManifest) -> Result<()> {
        let path = self.dir.join(MANIFEST_FILE);
        std::fs::write(&path, serde_json::to_string_pretty(manifest)?)
            .with_context(|| format!("Failed to write map manifest: {}", path.display()))
    }
}

/// Build the FeatureCollection for a styled layer.
///
/// Feature properties are the record's attributes plus `category` and
/// `color`; missing attributes become `null`.
fn feature_collection(layer: &StyledLayer<'_>, crs: &str) -> Result<Json> {
    let dataset = layer.dataset;
    let category = dataset.column(layer.style.category_column)?;

    let mut features = Vec::with_capacity(dataset.len());
    for (i, geometry) in dataset.geometries().iter().enumerate() {
        let mut properties = Map::new();
        for (name, value) in dataset.record(i) {
            properties.insert(
                name.to_string(),
                value.map_or(Json::Null, |v| serde_json::to_value(v).unwrap_or(Json::Null)),
            );
        }

        let value = category.values()[i].as_ref();
        properties.insert(
            "category".to_string(),
            value.map_or(Json::Null, |v| Json::String(v.to_string())),
        );
        properties.insert("color".to_string(), json!(layer.color_for(value)));

        features.push(json!({
            "type": "Feature",
            "geometry": geometry.as_ref().map_or(Json::Null, geometry_json),
            "properties": properties,
        }));
    }

    Ok(json!({
        "type": "FeatureCollection",
        "name": layer.style.caption,
        "crs": { "type": "name", "properties": { "name": crs } },
        "features": features,
    }))
}

fn position(c: &Coord<f64>) -> Json {
    json!([c.x, c.y])
}

fn line_coordinates(line: &LineString<f64>) -> Json {
    Json::Array(line.coords().map(position).collect())
}

fn polygon_coordinates(polygon: &Polygon<f64>) -> Json {
    let rings = std::iter::once(polygon.exterior())
        .chain(polygon.interiors())
        .map(line_coordinates)
        .collect();
    Json::Array(rings)
}

/// GeoJSON geometry object for a `geo` geometry.
pub fn geometry_json(geometry: &Geometry<f64>) -> Json {
    match geometry {
        Geometry::Point(p) => json!({ "type": "Point", "coordinates": position(&p.0) }),
        Geometry::Line(l) => json!({
            "type": "LineString",
            "coordinates": [position(&l.start), position(&l.end)],
        }),
        Geometry::LineString(ls) => json!({
            "type": "LineString",
            "coordinates": line_coordinates(ls),
        }),
        Geometry::Polygon(p) => json!({ "type": "Polygon", "coordinates": polygon_coordinates(p) }),
        Geometry::MultiPoint(mp) => json!({
            "type": "MultiPoint",
            "coordinates": mp.iter().map(|p| position(&p.0)).collect::<Vec<_>>(),
        }),
        Geometry::MultiLineString(mls) => json!({
            "type": "MultiLineString",
            "coordinates": mls.iter().map(line_coordinates).collect::<Vec<_>>(),
        }),
        Geometry::MultiPolygon(mp) => json!({
            "type": "MultiPolygon",
            "coordinates": mp.iter().map(polygon_coordinates).collect::<Vec<_>>(),
        }),
        Geometry::GeometryCollection(gc) => json!({
            "type": "GeometryCollection",
            "geometries": gc.iter().map(geometry_json).collect::<Vec<_>>(),
        }),
        Geometry::Rect(r) => geometry_json(&Geometry::Polygon(r.to_polygon())),
        Geometry::Triangle(t) => geometry_json(&Geometry::Polygon(t.to_polygon())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::embankments::tests::humber;
    use crate::config::MapConfig;
    use crate::map::{export_map, style_layer, LayerStyle};
    use crate::models::{ColumnType, DatasetBuilder, Value};
    use geo::{line_string, point, polygon, MultiLineString};
    use tempfile::TempDir;

    #[test]
    fn test_geometry_json() {
        let p = geometry_json(&Geometry::Point(point!(x: 1.0, y: 2.0)));
        assert_eq!(p, json!({ "type": "Point", "coordinates": [1.0, 2.0] }));

        let line = line_string![(x: 0.0, y: 0.0), (x: 3.0, y: 4.0)];
        let mls = geometry_json(&Geometry::MultiLineString(MultiLineString(vec![line])));
        assert_eq!(mls["type"], "MultiLineString");
        assert_eq!(mls["coordinates"][0][1], json!([3.0, 4.0]));

        let poly = geometry_json(&Geometry::Polygon(polygon![
            (x: 0.0, y: 0.0),
            (x: 1.0, y: 0.0),
            (x: 1.0, y: 1.0),
        ]));
        assert_eq!(poly["type"], "Polygon");
        // exterior ring is closed
        assert_eq!(poly["coordinates"][0].as_array().unwrap().len(), 4);
    }

    #[test]
    fn test_feature_collection_properties() {
        let mut builder = DatasetBuilder::new("steep slopes")
            .field("Face", ColumnType::Text)
            .field("Shape_Leng", ColumnType::Number);
        builder
            .push(
                vec![Some(Value::from("Rear")), Some(Value::Number(12.5))],
                Some(Geometry::LineString(line_string![
                    (x: 0.0, y: 0.0),
                    (x: 10.0, y: 0.0),
                ])),
            )
            .unwrap();
        builder.push(vec![None, None], None).unwrap();
        let dataset = builder.build().unwrap();

        let style = LayerStyle {
            id: "steep_slopes",
            caption: "Steep slopes",
            category_column: "Face",
            palette: &["#111111"],
            legend: None,
        };
        let layer = style_layer(&dataset, style).unwrap();
        let collection = feature_collection(&layer, "EPSG:27700").unwrap();

        assert_eq!(collection["type"], "FeatureCollection");
        assert_eq!(collection["crs"]["properties"]["name"], "EPSG:27700");

        let first = &collection["features"][0];
        assert_eq!(first["geometry"]["type"], "LineString");
        assert_eq!(first["properties"]["Face"], "Rear");
        assert_eq!(first["properties"]["Shape_Leng"], 12.5);
        assert_eq!(first["properties"]["category"], "Rear");
        assert_eq!(first["properties"]["color"], "#111111");

        let second = &collection["features"][1];
        assert!(second["geometry"].is_null());
        assert!(second["properties"]["category"].is_null());
        assert_eq!(second["properties"]["color"], crate::map::MISSING_COLOR);
    }

    #[test]
    fn test_export_writes_layers_and_manifest() {
        let dir = TempDir::new().unwrap();
        let mut sink = GeoJsonSink::new(dir.path().join("layers")).unwrap();

        let manifest = export_map(&humber(), &MapConfig::default(), &mut sink).unwrap();

        for layer in &manifest.layers {
            assert!(sink.dir().join(&layer.file).exists(), "{}", layer.file);
        }
        let written = std::fs::read_to_string(sink.dir().join(MANIFEST_FILE)).unwrap();
        let parsed: MapManifest = serde_json::from_str(&written).unwrap();
        assert_eq!(parsed, manifest);
        // fixture areas carry no geometry
        assert!(parsed.extent.is_none());

        let slopes = std::fs::read_to_string(sink.dir().join("steep_slopes.geojson")).unwrap();
        let slopes: Json = serde_json::from_str(&slopes).unwrap();
        assert_eq!(slopes["features"].as_array().unwrap().len(), 4029);
    }
}
