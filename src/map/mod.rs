//! Map layers for external rendering.
//!
//! Each dataset is paired with a category column and a palette; the
//! resulting styled layers, legend, extent and scale bar are handed to a
//! [`MapSink`]. Drawing itself is left to whatever consumes the sink's
//! output.

mod geojson;

pub use geojson::GeoJsonSink;

use crate::analysis::embankments::{
    HumberDatasets, AREA_UNIT, CHANNEL, FACE, MATERIAL, TYPE,
};
use crate::analysis::profiler::distinct_values;
use crate::config::MapConfig;
use crate::models::{Dataset, Value};
use anyhow::{Context, Result};
use geo::BoundingRect;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Colour for features whose category value is missing.
pub const MISSING_COLOR: &str = "#cccccc";

const ACCENT: &[&str] = &[
    "#7fc97f", "#beaed4", "#fdc086", "#ffff99", "#386cb0", "#f0027f", "#bf5b17", "#666666",
];
const DARK2: &[&str] = &[
    "#1b9e77", "#d95f02", "#7570b3", "#e7298a", "#66a61e", "#e6ab02", "#a6761d", "#666666",
];
const SET1: &[&str] = &[
    "#e41a1c", "#377eb8", "#4daf4a", "#984ea3", "#ff7f00", "#ffff33", "#a65628", "#f781bf",
    "#999999",
];
const TAB20B: &[&str] = &[
    "#393b79", "#5254a3", "#6b6ecf", "#9c9ede", "#637939", "#8ca252", "#b5cf6b", "#cedb9c",
    "#8c6d31", "#bd9e39", "#e7ba52", "#e7cb94", "#843c39", "#ad494a", "#d6616b", "#e7969c",
    "#7b4173", "#a55194", "#ce6dbd", "#de9ed6",
];
const TAB10: &[&str] = &[
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
    "#bcbd22", "#17becf",
];

/// Legend order by layer id; layers are still drawn in `humber_layers` order.
pub const LEGEND_ORDER: &[&str] = &[
    "defences",
    "low_sections",
    "steep_slopes",
    "palaeochannels",
    "geophysical_survey",
];

/// How one dataset is drawn.
#[derive(Debug, Clone)]
pub struct LayerStyle {
    /// File stem and manifest id.
    pub id: &'static str,
    pub caption: &'static str,
    /// Column whose values pick the feature colour.
    pub category_column: &'static str,
    pub palette: &'static [&'static str],
    /// Static-map legend entry (label, colour); `None` keeps it out of the legend.
    pub legend: Option<(&'static str, &'static str)>,
}

/// A dataset with its style and resolved category colours.
#[derive(Debug)]
pub struct StyledLayer<'a> {
    pub dataset: &'a Dataset,
    pub style: LayerStyle,
    pub colors: BTreeMap<Value, String>,
}

impl StyledLayer<'_> {
    /// Colour of a feature given its category value.
    pub fn color_for(&self, value: Option<&Value>) -> &str {
        value
            .and_then(|v| self.colors.get(v))
            .map(String::as_str)
            .unwrap_or(MISSING_COLOR)
    }
}

/// Bounding box in source coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Extent {
    /// Grow the box by `margin` on every side.
    pub fn buffered(&self, margin: f64) -> Extent {
        Extent {
            min_x: self.min_x - margin,
            min_y: self.min_y - margin,
            max_x: self.max_x + margin,
            max_y: self.max_y + margin,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryColor {
    pub value: String,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegendEntry {
    pub label: String,
    pub color: String,
}

/// One exported layer as listed in the manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerEntry {
    pub id: String,
    pub caption: String,
    pub file: String,
    pub category_column: String,
    pub features: usize,
    pub categories: Vec<CategoryColor>,
}

/// Everything a renderer needs besides the layer files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapManifest {
    pub crs: String,
    /// Basemap extent plus the configured buffer; `None` without geometry.
    pub extent: Option<Extent>,
    pub scale_bar_km: f64,
    /// Layers in drawing order, basemap first.
    pub layers: Vec<LayerEntry>,
    pub legend: Vec<LegendEntry>,
}

/// Destination for styled map layers.
pub trait MapSink {
    /// Write one layer; returns the file name it was stored under.
    fn write_layer(&mut self, layer: &StyledLayer<'_>, crs: &str) -> Result<String>;

    fn write_manifest(&mut self, manifest: &MapManifest) -> Result<()>;
}

/// Layer styles for the Humber datasets, in drawing order.
pub fn humber_layers(data: &HumberDatasets) -> Vec<(&Dataset, LayerStyle)> {
    vec![
        (
            &data.areas,
            LayerStyle {
                id: "flood_areas",
                caption: "Hydraulic units",
                category_column: AREA_UNIT,
                palette: ACCENT,
                legend: None,
            },
        ),
        (
            &data.defences,
            LayerStyle {
                id: "defences",
                caption: "Flood Defence Embankments",
                category_column: TYPE,
                palette: DARK2,
                legend: Some(("Flood embankments", "blue")),
            },
        ),
        (
            &data.geophysical_survey,
            LayerStyle {
                id: "geophysical_survey",
                caption: "Material",
                category_column: MATERIAL,
                palette: DARK2,
                legend: Some(("Geophysical survey extents", "lime")),
            },
        ),
        (
            &data.low_sections,
            LayerStyle {
                id: "low_sections",
                caption: "Low sections",
                category_column: TYPE,
                palette: SET1,
                legend: Some(("Low sections of embankments", "darkorange")),
            },
        ),
        (
            &data.steep_slopes,
            LayerStyle {
                id: "steep_slopes",
                caption: "Steep slopes",
                category_column: FACE,
                palette: TAB20B,
                legend: Some(("Steep embankment slopes", "black")),
            },
        ),
        (
            &data.palaeochannels,
            LayerStyle {
                id: "palaeochannels",
                caption: "Palaeochannels",
                category_column: CHANNEL,
                palette: TAB10,
                legend: Some(("Palaeochannel intersections", "chocolate")),
            },
        ),
    ]
}

/// Assign palette colours to the distinct values of the style's column.
pub fn style_layer(dataset: &Dataset, style: LayerStyle) -> Result<StyledLayer<'_>> {
    let values = distinct_values(dataset, style.category_column)?;
    let colors = values
        .into_iter()
        .enumerate()
        .map(|(i, v)| (v, style.palette[i % style.palette.len()].to_string()))
        .collect();

    Ok(StyledLayer {
        dataset,
        style,
        colors,
    })
}

/// Bounding box of every present geometry in the dataset.
pub fn extent(dataset: &Dataset) -> Option<Extent> {
    dataset
        .geometries()
        .iter()
        .flatten()
        .filter_map(|g| g.bounding_rect())
        .fold(None, |acc: Option<Extent>, rect| {
            let (min, max) = (rect.min(), rect.max());
            Some(match acc {
                None => Extent {
                    min_x: min.x,
                    min_y: min.y,
                    max_x: max.x,
                    max_y: max.y,
                },
                Some(e) => Extent {
                    min_x: e.min_x.min(min.x),
                    min_y: e.min_y.min(min.y),
                    max_x: e.max_x.max(max.x),
                    max_y: e.max_y.max(max.y),
                },
            })
        })
}

/// Style every Humber layer and hand it to the sink, then write the manifest.
pub fn export_map(
    data: &HumberDatasets,
    config: &MapConfig,
    sink: &mut dyn MapSink,
) -> Result<MapManifest> {
    let mut layers = Vec::new();
    let mut legend = Vec::new();

    for (dataset, style) in humber_layers(data) {
        let layer = style_layer(dataset, style)
            .with_context(|| format!("Failed to style layer for {}", dataset.name()))?;
        let file = sink.write_layer(&layer, &config.crs)?;
        debug!(
            "Wrote layer {} ({} features, {} categories)",
            file,
            dataset.len(),
            layer.colors.len()
        );

        if let Some((label, color)) = layer.style.legend {
            legend.push((
                layer.style.id,
                LegendEntry {
                    label: label.to_string(),
                    color: color.to_string(),
                },
            ));
        }

        layers.push(LayerEntry {
            id: layer.style.id.to_string(),
            caption: layer.style.caption.to_string(),
            file,
            category_column: layer.style.category_column.to_string(),
            features: dataset.len(),
            categories: layer
                .colors
                .iter()
                .map(|(v, c)| CategoryColor {
                    value: v.to_string(),
                    color: c.clone(),
                })
                .collect(),
        });
    }

    legend.sort_by_key(|(id, _)| {
        LEGEND_ORDER
            .iter()
            .position(|o| o == id)
            .unwrap_or(LEGEND_ORDER.len())
    });

    let manifest = MapManifest {
        crs: config.crs.clone(),
        extent: extent(&data.areas).map(|e| e.buffered(config.buffer_m)),
        scale_bar_km: config.scale_bar_km,
        layers,
        legend: legend.into_iter().map(|(_, entry)| entry).collect(),
    };
    sink.write_manifest(&manifest)?;
    info!("Exported {} map layers", manifest.layers.len());

    Ok(manifest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::embankments::tests::humber;
    use crate::models::{ColumnType, DatasetBuilder};
    use geo::{line_string, point, polygon, Geometry};

    /// Records every call instead of writing files.
    #[derive(Default)]
    struct RecordingSink {
        layers: Vec<(String, usize)>,
        manifest: Option<MapManifest>,
    }

    impl MapSink for RecordingSink {
        fn write_layer(&mut self, layer: &StyledLayer<'_>, _crs: &str) -> Result<String> {
            self.layers
                .push((layer.style.id.to_string(), layer.colors.len()));
            Ok(format!("{}.geojson", layer.style.id))
        }

        fn write_manifest(&mut self, manifest: &MapManifest) -> Result<()> {
            self.manifest = Some(manifest.clone());
            Ok(())
        }
    }

    fn areas_with_geometry() -> Dataset {
        let mut builder = DatasetBuilder::new("flood areas")
            .field(AREA_UNIT, ColumnType::Text)
            .field("FloodArea_", ColumnType::Integer);
        builder
            .push(
                vec![Some(Value::from("Hull")), Some(Value::Integer(1))],
                Some(Geometry::Polygon(polygon![
                    (x: 500_000.0, y: 420_000.0),
                    (x: 510_000.0, y: 420_000.0),
                    (x: 510_000.0, y: 430_000.0),
                ])),
            )
            .unwrap();
        builder
            .push(
                vec![Some(Value::from("Goole")), Some(Value::Integer(2))],
                Some(Geometry::LineString(line_string![
                    (x: 470_000.0, y: 425_000.0),
                    (x: 480_000.0, y: 440_000.0),
                ])),
            )
            .unwrap();
        builder
            .push(vec![Some(Value::from("Hull")), Some(Value::Integer(3))], None)
            .unwrap();
        builder.build().unwrap()
    }

    #[test]
    fn test_extent_covers_all_geometries() {
        let e = extent(&areas_with_geometry()).unwrap();
        assert_eq!(
            e,
            Extent {
                min_x: 470_000.0,
                min_y: 420_000.0,
                max_x: 510_000.0,
                max_y: 440_000.0,
            }
        );
        assert_eq!(e.buffered(10_000.0).min_x, 460_000.0);
    }

    #[test]
    fn test_extent_without_geometry() {
        let mut builder = DatasetBuilder::new("points").field(CHANNEL, ColumnType::Text);
        builder.push(vec![Some(Value::from("Depression"))], None).unwrap();
        assert!(extent(&builder.build().unwrap()).is_none());

        let mut builder = DatasetBuilder::new("points").field(CHANNEL, ColumnType::Text);
        builder
            .push(
                vec![Some(Value::from("Depression"))],
                Some(Geometry::Point(point!(x: 1.0, y: 2.0))),
            )
            .unwrap();
        let e = extent(&builder.build().unwrap()).unwrap();
        assert_eq!((e.min_x, e.max_y), (1.0, 2.0));
    }

    #[test]
    fn test_style_layer_assigns_palette_in_value_order() {
        let areas = areas_with_geometry();
        let layer = style_layer(&areas, humber_layers(&humber()).remove(0).1).unwrap();

        assert_eq!(layer.colors.len(), 2);
        assert_eq!(layer.color_for(Some(&Value::from("Goole"))), ACCENT[0]);
        assert_eq!(layer.color_for(Some(&Value::from("Hull"))), ACCENT[1]);
        assert_eq!(layer.color_for(None), MISSING_COLOR);
        assert_eq!(layer.color_for(Some(&Value::from("Grimsby"))), MISSING_COLOR);
    }

    #[test]
    fn test_style_layer_requires_category_column() {
        let mut builder = DatasetBuilder::new("defences").field("Shape_Leng", ColumnType::Number);
        builder.push(vec![Some(Value::Number(1.0))], None).unwrap();
        let defences = builder.build().unwrap();

        let style = humber_layers(&humber()).remove(1).1;
        assert!(style_layer(&defences, style).is_err());
    }

    #[test]
    fn test_export_map_builds_manifest() {
        let mut data = humber();
        data.areas = areas_with_geometry();
        let mut sink = RecordingSink::default();

        let manifest = export_map(&data, &MapConfig::default(), &mut sink).unwrap();

        assert_eq!(manifest.layers.len(), 6);
        assert_eq!(manifest.layers[0].id, "flood_areas");
        assert_eq!(manifest.layers[4].categories.len(), 2);
        let labels: Vec<&str> = manifest.legend.iter().map(|e| e.label.as_str()).collect();
        assert_eq!(
            labels,
            vec![
                "Flood embankments",
                "Low sections of embankments",
                "Steep embankment slopes",
                "Palaeochannel intersections",
                "Geophysical survey extents",
            ]
        );
        // survey is drawn beneath the defects but listed last
        assert_eq!(manifest.layers[2].id, "geophysical_survey");
        assert_eq!(manifest.crs, "EPSG:27700");
        assert_eq!(manifest.scale_bar_km, 20.0);
        assert_eq!(manifest.extent.unwrap().max_y, 450_000.0);

        assert_eq!(sink.layers.len(), 6);
        assert_eq!(sink.manifest, Some(manifest));
    }
}
