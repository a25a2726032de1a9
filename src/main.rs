//! humber-embankments - descriptive statistics for the Humber flood
//! embankment network
//!
//! Loads the flood-area, embankment, LIDAR defect and geophysical survey
//! shapefiles, derives lengths, counts and percentages, writes a report and
//! optionally exports styled map layers.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Any error (invalid arguments, unreadable source, schema mismatch,
//!       division by zero, report write failure)

mod analysis;
mod cli;
mod config;
mod error;
mod loader;
mod map;
mod models;
mod report;

use anyhow::{Context, Result};
use chrono::Utc;
use cli::{Args, OutputFormat};
use config::{Config, CONFIG_FILE};
use loader::{ShapefileProvider, SourceCatalog};
use models::{DatasetInfo, EmbankmentSummary, Report, ReportMetadata};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

fn main() {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        if let Err(e) = handle_init_config() {
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
        return;
    }

    // Initialize logging
    init_logging(&args);

    info!("humber-embankments v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    if let Err(e) = run_analysis(args) {
        error!("Analysis failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }
}

/// Handle --init-config: generate a default .humber.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE);

    if path.exists() {
        eprintln!("⚠️  {} already exists. Remove it first or edit it manually.", CONFIG_FILE);
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE);
    println!("   Edit it to point at your shapefiles and adjust report and map output.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Run the complete load, summarize, report workflow.
fn run_analysis(args: Args) -> Result<()> {
    let start_time = Instant::now();

    // Load configuration
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    let data_dir = PathBuf::from(&config.general.data_dir);
    let catalog = SourceCatalog::from(&config.sources);

    // Handle --dry-run: list sources and exit
    if args.dry_run {
        return handle_dry_run(&data_dir, &catalog);
    }

    let decimals = if config.report.decimals > cli::MAX_DECIMALS {
        warn!(
            "Configured decimals {} exceeds {}, clamping",
            config.report.decimals,
            cli::MAX_DECIMALS
        );
        cli::MAX_DECIMALS
    } else {
        config.report.decimals
    };

    // Step 1: Load every source
    println!("📥 Loading shapefiles from: {}", data_dir.display());
    let provider = ShapefileProvider::new(&data_dir);
    let data = loader::load_humber(&provider, &catalog, !args.quiet)?;

    // Step 2: Derive the figures
    println!("\n🔬 Computing embankment statistics...");
    let summary = analysis::summarize(&data)?;

    // Step 3: Build and save the report
    println!("\n📝 Generating report...");

    let duration = start_time.elapsed().as_secs_f64();
    let metadata = ReportMetadata {
        data_dir: data_dir.display().to_string(),
        analysis_date: Utc::now(),
        datasets: data.all().iter().map(|ds| DatasetInfo::from(*ds)).collect(),
        decimals,
        duration_seconds: duration,
    };

    let report = Report { metadata, summary };

    let output = match args.format {
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Markdown => report::generate_markdown_report(&report, &config.report),
    };

    let output_path = PathBuf::from(&config.general.output);
    std::fs::write(&output_path, &output)
        .with_context(|| format!("Failed to write report to {}", output_path.display()))?;

    // Step 4: Optional map layers
    if let Some(ref map_dir) = config.map.output_dir {
        println!("\n🗺️  Exporting map layers...");
        let mut sink = map::GeoJsonSink::new(map_dir)?;
        let manifest = map::export_map(&data, &config.map, &mut sink)?;
        println!(
            "   {} layers written to {}",
            manifest.layers.len(),
            sink.dir().display()
        );
    }

    print_summary(&report.summary, decimals);
    println!("   Duration: {:.1}s", duration);
    println!(
        "\n✅ Analysis complete! Report saved to: {}",
        output_path.display()
    );

    Ok(())
}

/// Print the headline figures to stdout.
fn print_summary(summary: &EmbankmentSummary, d: usize) {
    let survey = &summary.survey;

    println!("\n📊 Embankment Summary:");
    println!(
        "   Earth embankments: {}",
        report::format_km(summary.defences_km, d)
    );
    println!(
        "   Low sections: {} ({} of the network)",
        report::format_km(summary.low_sections_km, d),
        report::format_pct(summary.low_sections_pct, d)
    );
    println!(
        "   Steep slopes: {} ({})",
        summary.steep_slope_count,
        report::format_profile(&summary.steep_slopes_by_face, d)
    );
    println!(
        "   Palaeochannels: {} ({})",
        summary.palaeochannel_count,
        report::format_profile(&summary.palaeochannels_by_type, d)
    );
    println!(
        "   Geophysical survey: {} features, {} ({} of the network)",
        survey.features,
        report::format_km(survey.surveyed_km, d),
        report::format_pct(survey.surveyed_pct, d)
    );
    println!(
        "   Survey by material: {}",
        report::format_lengths(&survey.by_material, d)
    );
    println!(
        "   Hydraulic units surveyed: {} of {}",
        survey.units_surveyed, survey.units_total
    );
}

/// Handle --dry-run: list shapefiles and catalogued sources, exit.
fn handle_dry_run(data_dir: &Path, catalog: &SourceCatalog) -> Result<()> {
    println!("\n🔍 Dry run: scanning {} (nothing is loaded)...\n", data_dir.display());

    let found = loader::discover(data_dir)?;

    if found.is_empty() {
        println!("   No shapefiles found.");
    } else {
        println!("   Found {} shapefiles:\n", found.len());
        for source in &found {
            let table = if source.has_table { "" } else { " (no .dbf)" };
            println!("     📄 {} ({} bytes){}", source.path, source.size, table);
        }
    }

    println!("\n   Sources that would be loaded:\n");
    let mut missing = 0;
    for spec in catalog.specs() {
        let exists = data_dir.join(&spec.path).exists();
        if !exists {
            missing += 1;
        }
        println!(
            "     {} {}: {}",
            if exists { "✅" } else { "❌" },
            spec.name,
            spec.path.display()
        );
    }

    if missing > 0 {
        println!("\n⚠️  {} of {} sources are missing.", missing, catalog.specs().len());
    }
    println!("\n✅ Dry run complete. No datasets were loaded.");
    Ok(())
}

/// Load configuration from file or use defaults.
///
/// Order: `--config`, then `.humber.toml` in the working directory, then
/// `.humber.toml` in the data directory.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE);
            return Ok(config);
        }
        Ok(None) => {}
        Err(e) => warn!("Failed to load config: {:#}", e),
    }

    // Try the data directory
    if let Some(ref data_dir) = args.data_dir {
        match Config::load_from_dir(data_dir) {
            Ok(Some(config)) => {
                info!("Found {} in {}", CONFIG_FILE, data_dir.display());
                return Ok(config);
            }
            Ok(None) => {}
            Err(e) => warn!("Failed to load config: {:#}", e),
        }
    }

    debug!("No config file found, using defaults");
    Ok(Config::default())
}
