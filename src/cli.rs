//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;

/// Largest number of decimal places accepted for presented figures.
pub const MAX_DECIMALS: usize = 6;

/// humber-embankments - summary statistics for Humber flood embankment data
///
/// Loads the flood-area, embankment, LIDAR defect and geophysical survey
/// shapefiles, prints lengths, counts and percentages, writes a report and
/// optionally exports styled GeoJSON map layers.
///
/// Examples:
///   humber-embankments --data-dir ./humber
///   humber-embankments -d ./humber --format json -o summary.json
///   humber-embankments -d ./humber --map-dir ./layers
///   humber-embankments -d ./humber --dry-run
///   humber-embankments --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Root directory of the shapefile tree
    ///
    /// Source paths from the configuration are resolved against it.
    #[arg(short, long, value_name = "DIR", env = "HUMBER_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Output file path for the report
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Path to configuration file
    ///
    /// If not specified, looks for .humber.toml in the current directory
    /// and then in the data directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Export GeoJSON map layers and a map manifest to this directory
    #[arg(long, value_name = "DIR")]
    pub map_dir: Option<PathBuf>,

    /// Decimal places for kilometres and percentages
    #[arg(long, value_name = "N")]
    pub decimals: Option<usize>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Dry run: list the shapefiles found and the sources that would be loaded
    #[arg(long)]
    pub dry_run: bool,

    /// Generate a default .humber.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(decimals) = self.decimals {
            if decimals > MAX_DECIMALS {
                return Err(format!("Decimals must be at most {}", MAX_DECIMALS));
            }
        }

        // Validate data directory if provided
        if let Some(ref dir) = self.data_dir {
            if !dir.exists() {
                return Err(format!("Data directory does not exist: {}", dir.display()));
            }
            if !dir.is_dir() {
                return Err(format!("Data path is not a directory: {}", dir.display()));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn make_args() -> Args {
        Args {
            data_dir: None,
            output: None,
            format: OutputFormat::Markdown,
            config: None,
            map_dir: None,
            decimals: None,
            verbose: false,
            quiet: false,
            dry_run: false,
            init_config: false,
        }
    }

    #[test]
    fn test_parse_flags() {
        let args = Args::try_parse_from([
            "humber-embankments",
            "--format",
            "json",
            "--decimals",
            "2",
            "-o",
            "out.json",
        ])
        .unwrap();
        assert_eq!(args.format, OutputFormat::Json);
        assert_eq!(args.decimals, Some(2));
        assert_eq!(args.output, Some(PathBuf::from("out.json")));
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_decimals() {
        let mut args = make_args();
        args.decimals = Some(MAX_DECIMALS);
        assert!(args.validate().is_ok());
        args.decimals = Some(MAX_DECIMALS + 1);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_data_dir() {
        let dir = TempDir::new().unwrap();
        let mut args = make_args();
        args.data_dir = Some(dir.path().to_path_buf());
        assert!(args.validate().is_ok());

        args.data_dir = Some(dir.path().join("missing"));
        assert!(args.validate().is_err());

        let file = dir.path().join("areas.shp");
        std::fs::write(&file, b"").unwrap();
        args.data_dir = Some(file);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }
}
