//! Presentation of analysis results.
//!
//! Formatting helpers for scalars and mappings, and the Markdown/JSON
//! report generators. Nothing here mutates the results it is given.

pub mod generator;

pub use generator::{generate_json_report, generate_markdown_report};

use crate::analysis::round_to;
use crate::models::{CategoryProfile, GroupLength};

/// Fixed-point rendering after explicit rounding.
///
/// Values that round to zero print unsigned.
pub fn fixed(value: f64, decimals: usize) -> String {
    // -0.0 + 0.0 == +0.0
    format!("{:.*}", decimals, round_to(value, decimals) + 0.0)
}

pub fn format_km(km: f64, decimals: usize) -> String {
    format!("{} km", fixed(km, decimals))
}

pub fn format_pct(pct: f64, decimals: usize) -> String {
    format!("{}%", fixed(pct, decimals))
}

/// One-line breakdown of a category profile, most frequent value first.
///
/// e.g. `2995 Rear (74.3%), 1034 Front (25.7%)`
pub fn format_profile(profile: &CategoryProfile, decimals: usize) -> String {
    if profile.shares.is_empty() {
        return "none".to_string();
    }

    profile
        .shares
        .iter()
        .map(|s| {
            format!(
                "{} {} ({})",
                s.count,
                s.value,
                format_pct(s.percentage, decimals)
            )
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// One-line rendering of grouped lengths, e.g. `CLAY: 30.0 km, SILT: 20.0 km`.
pub fn format_lengths(lengths: &[GroupLength], decimals: usize) -> String {
    if lengths.is_empty() {
        return "none".to_string();
    }

    lengths
        .iter()
        .map(|g| format!("{}: {}", g.group, format_km(g.kilometres, decimals)))
        .collect::<Vec<_>>()
        .join(", ")
}
