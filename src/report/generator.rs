//! Markdown and JSON report generation.
//!
//! This module renders the embankment summary and run metadata into a
//! readable report.

use super::{fixed, format_km, format_pct};
use crate::analysis::round_to;
use crate::config::ReportConfig;
use crate::models::{
    CategoryProfile, DatasetInfo, EmbankmentSummary, GroupLength, Report, ReportMetadata,
    SurveySummary,
};
use anyhow::Result;

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &Report, options: &ReportConfig) -> String {
    let d = report.metadata.decimals;
    let summary = &report.summary;
    let mut output = String::new();

    // Title
    output.push_str("# Humber Flood Embankment Analysis\n\n");

    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_table_of_contents(options));

    if options.include_sources {
        output.push_str(&generate_sources_section(&report.metadata.datasets));
    }

    output.push_str(&generate_network_section(summary, d));
    output.push_str(&generate_slopes_section(summary, d));
    output.push_str(&generate_palaeochannels_section(summary, d));
    output.push_str(&generate_survey_section(&summary.survey, options, d));
    output.push_str(&generate_areas_section(summary));

    // Footer
    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Data Directory:** `{}`\n", metadata.data_dir));
    section.push_str(&format!(
        "- **Analysis Date:** {}\n",
        metadata.analysis_date.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!(
        "- **Datasets Loaded:** {}\n",
        metadata.datasets.len()
    ));
    section.push_str(&format!(
        "- **Analysis Duration:** {:.1}s\n",
        metadata.duration_seconds
    ));
    section.push('\n');

    section
}

/// Generate the table of contents.
fn generate_table_of_contents(options: &ReportConfig) -> String {
    let mut toc = String::new();

    toc.push_str("## Table of Contents\n\n");
    toc.push_str("- [Metadata](#metadata)\n");
    if options.include_sources {
        toc.push_str("- [Sources](#sources)\n");
    }
    toc.push_str("- [Embankment Network](#embankment-network)\n");
    toc.push_str("- [Steep Slopes](#steep-slopes)\n");
    toc.push_str("- [Palaeochannels](#palaeochannels)\n");
    toc.push_str("- [Geophysical Survey](#geophysical-survey)\n");
    toc.push_str("- [Flood Areas](#flood-areas)\n");
    toc.push('\n');

    toc
}

/// Generate the table of loaded sources.
fn generate_sources_section(datasets: &[DatasetInfo]) -> String {
    let mut section = String::new();

    section.push_str("## Sources\n\n");
    section.push_str("| Dataset | Path | Records | Columns |\n");
    section.push_str("|:---|:---|:---:|:---:|\n");
    for info in datasets {
        section.push_str(&format!(
            "| {} | `{}` | {} | {} |\n",
            info.name, info.path, info.records, info.columns
        ));
    }
    section.push('\n');

    section
}

/// Embankment length and low sections.
fn generate_network_section(summary: &EmbankmentSummary, d: usize) -> String {
    let mut section = String::new();

    section.push_str("## Embankment Network\n\n");
    section.push_str(&format!(
        "- **Earth embankment length:** {}\n",
        format_km(summary.defences_km, d)
    ));
    section.push_str(&format!(
        "- **Low sections:** {} ({} of the network)\n\n",
        format_km(summary.low_sections_km, d),
        format_pct(summary.low_sections_pct, d)
    ));

    section
}

fn generate_slopes_section(summary: &EmbankmentSummary, d: usize) -> String {
    let mut section = String::new();

    section.push_str("## Steep Slopes\n\n");
    section.push_str(&format!(
        "{} steep slope anomalies steeper than the angle of repose.\n\n",
        summary.steep_slope_count
    ));
    section.push_str(&generate_profile_table(
        &summary.steep_slopes_by_face,
        "Face",
        d,
    ));

    section
}

fn generate_palaeochannels_section(summary: &EmbankmentSummary, d: usize) -> String {
    let mut section = String::new();

    section.push_str("## Palaeochannels\n\n");
    section.push_str(&format!(
        "{} palaeochannel intersections of {} types.\n\n",
        summary.palaeochannel_count,
        summary.palaeochannels_by_type.shares.len()
    ));
    section.push_str(&generate_profile_table(
        &summary.palaeochannels_by_type,
        "Type",
        d,
    ));

    section
}

/// Table of value, count and share for a category profile.
fn generate_profile_table(profile: &CategoryProfile, heading: &str, d: usize) -> String {
    let mut table = String::new();

    if profile.shares.is_empty() {
        table.push_str(&format!("No values recorded in `{}`.\n\n", profile.column));
        return table;
    }

    table.push_str(&format!("| {} | Count | Share |\n", heading));
    table.push_str("|:---|:---:|:---:|\n");
    for share in &profile.shares {
        table.push_str(&format!(
            "| {} | {} | {} |\n",
            share.value,
            share.count,
            format_pct(share.percentage, d)
        ));
    }
    table.push_str(&format!("| **Total** | **{}** | |\n\n", profile.total));

    table
}

fn generate_survey_section(survey: &SurveySummary, options: &ReportConfig, d: usize) -> String {
    let mut section = String::new();

    section.push_str("## Geophysical Survey\n\n");
    section.push_str(&format!("- **Survey features:** {}\n", survey.features));
    section.push_str(&format!(
        "- **Distance surveyed:** {}\n",
        format_km(survey.surveyed_km, d)
    ));
    // Remaining share is derived from the rounded surveyed share so both add to 100.
    let surveyed = round_to(survey.surveyed_pct, d);
    section.push_str(&format!(
        "- **Network surveyed:** {} ({} available for future survey)\n",
        format_pct(surveyed, d),
        format_pct(100.0 - surveyed, d)
    ));
    section.push_str(&format!(
        "- **Hydraulic units surveyed:** {} of {}\n",
        survey.units_surveyed, survey.units_total
    ));
    if !survey.units_not_surveyed.is_empty() {
        section.push_str(&format!(
            "- **Units without survey:** {}\n",
            survey.units_not_surveyed.join(", ")
        ));
    }
    if !survey.material_types.is_empty() {
        section.push_str(&format!(
            "- **Material types:** {}\n",
            survey.material_types.join(", ")
        ));
    }
    section.push('\n');

    if options.include_breakdowns {
        section.push_str(&generate_length_table("By Material", "Material", &survey.by_material, d));
        section.push_str(&generate_length_table(
            "By Saturation",
            "Saturation",
            &survey.by_saturation,
            d,
        ));
        section.push_str(&generate_length_table(
            "By Hydraulic Unit",
            "Hydraulic Unit",
            &survey.by_hydraulic_unit,
            d,
        ));
    }

    section
}

fn generate_length_table(title: &str, heading: &str, lengths: &[GroupLength], d: usize) -> String {
    let mut table = String::new();

    if lengths.is_empty() {
        return table;
    }

    table.push_str(&format!("### {}\n\n", title));
    table.push_str(&format!("| {} | Length (km) |\n", heading));
    table.push_str("|:---|:---:|\n");
    for group in lengths {
        table.push_str(&format!(
            "| {} | {} |\n",
            group.group,
            fixed(group.kilometres, d)
        ));
    }
    table.push('\n');

    table
}

fn generate_areas_section(summary: &EmbankmentSummary) -> String {
    let mut section = String::new();

    section.push_str("## Flood Areas\n\n");
    section.push_str(&format!("- **Flood areas:** {}\n", summary.flood_areas));
    section.push_str(&format!(
        "- **Hydraulic units:** {} ({})\n\n",
        summary.hydraulic_units.len(),
        summary.hydraulic_units.join(", ")
    ));

    section
}

/// Generate the report footer.
fn generate_footer() -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str(&format!(
        "*Report generated by humber-embankments v{}*\n",
        env!("CARGO_PKG_VERSION")
    ));

    footer
}

/// Generate a JSON report.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}
