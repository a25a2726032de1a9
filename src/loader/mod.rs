//! Dataset loading and data-directory discovery.
//!
//! A [`SourceProvider`] turns a named source into a [`Dataset`]. The
//! [`SourceCatalog`] names the six sources of the Humber analysis and
//! [`load_humber`] binds each of them once.

mod shp;

pub use shp::ShapefileProvider;

use crate::analysis::HumberDatasets;
use crate::error::AnalysisResult;
use crate::models::Dataset;
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// A named external source, relative to the data directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSpec {
    pub name: String,
    pub path: PathBuf,
}

impl SourceSpec {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

/// Something that can read a dataset from an external source.
pub trait SourceProvider {
    /// Read the source in full. Fails with `SourceUnavailable` when the
    /// source is missing or cannot be parsed.
    fn load(&self, spec: &SourceSpec) -> AnalysisResult<Dataset>;
}

/// The six sources of the Humber embankment analysis.
#[derive(Debug, Clone)]
pub struct SourceCatalog {
    pub areas: SourceSpec,
    pub defences: SourceSpec,
    pub low_sections: SourceSpec,
    pub steep_slopes: SourceSpec,
    pub palaeochannels: SourceSpec,
    pub geophysical_survey: SourceSpec,
}

impl SourceCatalog {
    /// Sources in load order.
    pub fn specs(&self) -> [&SourceSpec; 6] {
        [
            &self.areas,
            &self.defences,
            &self.low_sections,
            &self.steep_slopes,
            &self.palaeochannels,
            &self.geophysical_survey,
        ]
    }
}

impl From<&crate::config::SourcesConfig> for SourceCatalog {
    fn from(config: &crate::config::SourcesConfig) -> Self {
        Self {
            areas: SourceSpec::new("flood areas", &config.areas),
            defences: SourceSpec::new("defences", &config.defences),
            low_sections: SourceSpec::new("low sections", &config.low_sections),
            steep_slopes: SourceSpec::new("steep slopes", &config.steep_slopes),
            palaeochannels: SourceSpec::new("palaeochannels", &config.palaeochannels),
            geophysical_survey: SourceSpec::new(
                "geophysical survey",
                &config.geophysical_survey,
            ),
        }
    }
}

/// Load every catalogued source. The first failure aborts the run.
pub fn load_humber(
    provider: &dyn SourceProvider,
    catalog: &SourceCatalog,
    show_progress: bool,
) -> AnalysisResult<HumberDatasets> {
    let progress = if show_progress {
        let pb = ProgressBar::new(catalog.specs().len() as u64);
        pb.set_style(
            ProgressStyle::with_template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        Some(pb)
    } else {
        None
    };

    let load = |spec: &SourceSpec| -> AnalysisResult<Dataset> {
        if let Some(ref pb) = progress {
            pb.set_message(spec.name.clone());
        }
        let dataset = provider.load(spec)?;
        if dataset.is_empty() {
            warn!("{} has no records", spec.name);
        }
        info!(
            "Loaded {} ({} records) from {}",
            spec.name,
            dataset.len(),
            spec.path.display()
        );
        if let Some(ref pb) = progress {
            pb.inc(1);
        }
        Ok(dataset)
    };

    let datasets = HumberDatasets {
        areas: load(&catalog.areas)?,
        defences: load(&catalog.defences)?,
        low_sections: load(&catalog.low_sections)?,
        steep_slopes: load(&catalog.steep_slopes)?,
        palaeochannels: load(&catalog.palaeochannels)?,
        geophysical_survey: load(&catalog.geophysical_survey)?,
    };

    if let Some(pb) = progress {
        pb.finish_with_message("all sources loaded");
    }

    Ok(datasets)
}

/// A shapefile found under the data directory.
#[derive(Debug, Clone)]
pub struct DiscoveredSource {
    /// Path relative to the data directory.
    pub path: String,
    /// Size of the `.shp` file in bytes.
    pub size: u64,
    /// Whether the sibling `.dbf` attribute table exists.
    pub has_table: bool,
}

/// List every `.shp` file under `root`, skipping hidden entries.
pub fn discover(root: &Path) -> Result<Vec<DiscoveredSource>> {
    let mut found = Vec::new();

    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'));

    for entry in walker {
        let entry = entry.with_context(|| format!("Failed to walk {}", root.display()))?;
        let path = entry.path();
        let is_shp = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("shp"));
        if !entry.file_type().is_file() || !is_shp {
            continue;
        }

        let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
        let rel_path = path.strip_prefix(root).unwrap_or(path);
        debug!("Discovered {}", rel_path.display());

        found.push(DiscoveredSource {
            path: rel_path.to_string_lossy().to_string(),
            size,
            has_table: path.with_extension("dbf").exists(),
        });
    }

    Ok(found)
}
