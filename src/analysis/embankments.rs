//! Narrative figures for the Humber flood embankment network.
//!
//! Each source dataset has its own binding in [`HumberDatasets`]; the
//! summary reads them and never rebinds or mutates any of them.

use super::aggregator::{count, sum, sum_by_group, Grouped};
use super::profiler::{count_where, distinct_values, profile};
use super::ratio::Length;
use crate::error::AnalysisResult;
use crate::models::{Dataset, EmbankmentSummary, GroupLength, SurveySummary};
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Polyline or perimeter length in metres.
pub const SHAPE_LENGTH: &str = "Shape_Leng";
/// Embankment face (Front/Rear) of a steep-slope anomaly.
pub const FACE: &str = "Face";
/// Palaeochannel classification; the authoritative occurrence count.
pub const CLASS: &str = "Class";
/// Palaeochannel type (Depression/Extrusion).
pub const CHANNEL: &str = "channel";
/// Interpreted embankment material of a survey line.
pub const MATERIAL: &str = "Material";
pub const SATURATION: &str = "Saturation";
/// Surveyed distance in metres, as opposed to the polyline length.
pub const SURVEY_DISTANCE: &str = "Tot_dist_m";
/// Hydraulic unit a survey line lies in.
pub const SURVEY_UNIT: &str = "HS_Hyd_Uni";
/// Hydraulic unit of a flood-area polygon.
pub const AREA_UNIT: &str = "UNIT";
pub const FLOOD_AREA: &str = "FloodArea_";
/// Defence/defect type, used for map styling.
pub const TYPE: &str = "Type";

/// Faces of the embankment a steep slope can lie on.
pub const FRONT_FACE: &str = "Front";
pub const REAR_FACE: &str = "Rear";

/// Label for the partition of records whose group value is missing.
pub const MISSING_GROUP: &str = "(missing)";

/// The six loaded sources of the Humber analysis.
#[derive(Debug, Clone)]
pub struct HumberDatasets {
    /// Flood-area polygons (basemap).
    pub areas: Dataset,
    /// Embankment centrelines.
    pub defences: Dataset,
    /// LIDAR-derived low crest sections.
    pub low_sections: Dataset,
    /// LIDAR-derived steep slope polygons.
    pub steep_slopes: Dataset,
    /// LIDAR-derived palaeochannel intersections (points).
    pub palaeochannels: Dataset,
    /// Geophysical survey lines with interpreted materials.
    pub geophysical_survey: Dataset,
}

impl HumberDatasets {
    /// All datasets in load order.
    pub fn all(&self) -> [&Dataset; 6] {
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

/// Compute every figure of the embankment summary.
pub fn summarize(data: &HumberDatasets) -> AnalysisResult<EmbankmentSummary> {
    let defences = Length::metres(sum(&data.defences, SHAPE_LENGTH)?);
    info!("Embankment network: {}", defences);

    let low_sections = Length::metres(sum(&data.low_sections, SHAPE_LENGTH)?);
    let low_sections_pct = low_sections
        .percentage_of(defences)
        .map_err(|e| e.with_denominator(data.defences.name(), SHAPE_LENGTH))?;
    info!(
        "Low sections: {} ({:.1}% of network)",
        low_sections, low_sections_pct
    );

    let steep_slope_count = count(&data.steep_slopes, FACE)?;
    let steep_slopes_by_face = profile(&data.steep_slopes, FACE)?;
    info!(
        "Steep slopes: {} occurrences ({} front, {} rear)",
        steep_slope_count,
        count_where(&data.steep_slopes, FACE, &crate::models::Value::from(FRONT_FACE))?,
        count_where(&data.steep_slopes, FACE, &crate::models::Value::from(REAR_FACE))?
    );

    let palaeochannel_count = count(&data.palaeochannels, CLASS)?;
    let palaeochannels_by_type = profile(&data.palaeochannels, CHANNEL)?;
    info!("Palaeochannels: {} occurrences", palaeochannel_count);

    let survey = summarize_survey(
        &data.geophysical_survey,
        &data.areas,
        defences,
        data.defences.name(),
    )?;

    let flood_areas = distinct_values(&data.areas, FLOOD_AREA)?.len();
    let hydraulic_units = distinct_labels(&data.areas, AREA_UNIT)?
        .into_iter()
        .collect();

    Ok(EmbankmentSummary {
        defences_km: defences.as_kilometres(),
        low_sections_km: low_sections.as_kilometres(),
        low_sections_pct,
        steep_slope_count,
        steep_slopes_by_face,
        palaeochannel_count,
        palaeochannels_by_type,
        survey,
        flood_areas,
        hydraulic_units,
    })
}

/// Survey coverage relative to the embankment network and hydraulic units.
fn summarize_survey(
    survey: &Dataset,
    areas: &Dataset,
    network: Length,
    network_name: &str,
) -> AnalysisResult<SurveySummary> {
    let surveyed = Length::metres(sum(survey, SURVEY_DISTANCE)?);
    let surveyed_pct = surveyed
        .percentage_of(network)
        .map_err(|e| e.with_denominator(network_name, SHAPE_LENGTH))?;
    info!(
        "Geophysical survey: {} over {} features ({:.1}% of network)",
        surveyed,
        survey.len(),
        surveyed_pct
    );

    let units_surveyed = distinct_labels(survey, SURVEY_UNIT)?;
    let all_units = distinct_labels(areas, AREA_UNIT)?;
    let units_not_surveyed: Vec<String> =
        all_units.difference(&units_surveyed).cloned().collect();
    debug!(
        "Hydraulic units surveyed: {} of {}",
        units_surveyed.len(),
        all_units.len()
    );

    Ok(SurveySummary {
        features: survey.len(),
        surveyed_km: surveyed.as_kilometres(),
        surveyed_pct,
        material_types: distinct_labels(survey, MATERIAL)?.into_iter().collect(),
        by_material: lengths_by(survey, MATERIAL)?,
        by_saturation: lengths_by(survey, SATURATION)?,
        by_hydraulic_unit: lengths_by(survey, SURVEY_UNIT)?,
        units_surveyed: units_surveyed.len(),
        units_total: all_units.len(),
        units_not_surveyed,
    })
}

/// Distinct values rendered as text.
///
/// Hydraulic units are matched across datasets by label, since the two
/// tables do not store them with the same field type.
fn distinct_labels(dataset: &Dataset, column: &str) -> AnalysisResult<BTreeSet<String>> {
    Ok(distinct_values(dataset, column)?
        .iter()
        .map(ToString::to_string)
        .collect())
}

/// Surveyed kilometres per group, longest first.
fn lengths_by(survey: &Dataset, group: &str) -> AnalysisResult<Vec<GroupLength>> {
    let grouped: Grouped<Length> =
        sum_by_group(survey, SURVEY_DISTANCE, group)?.map(Length::metres);

    let mut lengths: Vec<GroupLength> = grouped
        .groups
        .iter()
        .map(|(key, len)| GroupLength {
            group: key.to_string(),
            kilometres: len.as_kilometres(),
        })
        .collect();
    if let Some(len) = grouped.unkeyed {
        lengths.push(GroupLength {
            group: MISSING_GROUP.to_string(),
            kilometres: len.as_kilometres(),
        });
    }

    lengths.sort_by(|a, b| {
        b.kilometres
            .partial_cmp(&a.kilometres)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    Ok(lengths)
}
