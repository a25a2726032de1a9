//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.humber.toml` files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Name of the configuration file looked up in the working and data directories.
pub const CONFIG_FILE: &str = ".humber.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Source shapefile paths.
    #[serde(default)]
    pub sources: SourcesConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,

    /// Map layer export settings.
    #[serde(default)]
    pub map: MapConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default report file path.
    #[serde(default = "default_output")]
    pub output: String,

    /// Root directory of the shapefile tree.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            data_dir: default_data_dir(),
        }
    }
}

fn default_output() -> String {
    "humber_embankment_report.md".to_string()
}

fn default_data_dir() -> String {
    ".".to_string()
}

/// Shapefile paths, relative to the data directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    /// Flood-area polygons used as the basemap.
    #[serde(default = "default_areas")]
    pub areas: String,

    /// Embankment alignment polylines.
    #[serde(default = "default_defences")]
    pub defences: String,

    #[serde(default = "default_low_sections")]
    pub low_sections: String,

    #[serde(default = "default_steep_slopes")]
    pub steep_slopes: String,

    #[serde(default = "default_palaeochannels")]
    pub palaeochannels: String,

    /// DEMP survey lines with interpreted materials.
    #[serde(default = "default_geophysical_survey")]
    pub geophysical_survey: String,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            areas: default_areas(),
            defences: default_defences(),
            low_sections: default_low_sections(),
            steep_slopes: default_steep_slopes(),
            palaeochannels: default_palaeochannels(),
            geophysical_survey: default_geophysical_survey(),
        }
    }
}

fn default_areas() -> String {
    "HSCR_Flood_Areas/HSCR_FloodAreas_2080406.shp".to_string()
}

fn default_defences() -> String {
    "Flood_embankment_network/Embankment_alignment_Humber_primary.shp".to_string()
}

fn default_low_sections() -> String {
    "LIDAR_derived_data/Embankment_low_sections_defects.shp".to_string()
}

fn default_steep_slopes() -> String {
    "LIDAR_derived_data/Embankment_steep_slope_anomalies.shp".to_string()
}

fn default_palaeochannels() -> String {
    "LIDAR_derived_data/Palaeochannel_anomalies_intersect_embank.shp".to_string()
}

fn default_geophysical_survey() -> String {
    "Geophysical_survey_data_material_composition/Geophysical_survey_embankment_materials.shp"
        .to_string()
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Decimal places for kilometres and percentages.
    #[serde(default = "default_decimals")]
    pub decimals: usize,

    /// Include the grouped survey breakdowns (material, saturation, unit).
    #[serde(default = "default_true")]
    pub include_breakdowns: bool,

    /// List the loaded datasets with their record counts.
    #[serde(default = "default_true")]
    pub include_sources: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            decimals: default_decimals(),
            include_breakdowns: true,
            include_sources: true,
        }
    }
}

fn default_decimals() -> usize {
    1
}

fn default_true() -> bool {
    true
}

/// Map layer export settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapConfig {
    /// Directory for GeoJSON layers; no export when unset.
    #[serde(default)]
    pub output_dir: Option<String>,

    /// Buffer around the basemap extent, in metres.
    #[serde(default = "default_buffer_m")]
    pub buffer_m: f64,

    /// Scale bar length, in kilometres.
    #[serde(default = "default_scale_bar_km")]
    pub scale_bar_km: f64,

    /// Coordinate reference system of the source data.
    #[serde(default = "default_crs")]
    pub crs: String,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            output_dir: None,
            buffer_m: default_buffer_m(),
            scale_bar_km: default_scale_bar_km(),
            crs: default_crs(),
        }
    }
}

fn default_buffer_m() -> f64 {
    10_000.0
}

fn default_scale_bar_km() -> f64 {
    20.0
}

fn default_crs() -> String {
    "EPSG:27700".to_string()
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load configuration from a data directory.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// This method only overrides config when CLI provides explicit values.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref data_dir) = args.data_dir {
            self.general.data_dir = data_dir.display().to_string();
        }

        if let Some(ref output) = args.output {
            self.general.output = output.display().to_string();
        }

        if let Some(decimals) = args.decimals {
            self.report.decimals = decimals;
        }

        if let Some(ref map_dir) = args.map_dir {
            self.map.output_dir = Some(map_dir.display().to_string());
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
