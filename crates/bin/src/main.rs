//! Normair CLI binary.
//!
//! Reads a joined sensor / weather CSV, runs the weather normalization and
//! writes the normalized table.

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use normair::features::{FeatureBuilder, FeatureConfig};
use normair::output::{ExportFormat, Exporter, MetricsTable, NormalizedRecord};
use normair::{NormalizationConfig, NormalizationEngine, RngMode, SensorPipeline, sensor_ids};
use polars::prelude::*;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "normair")]
#[command(about = "Normair: weather normalization of air-quality sensor readings", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize every sensor of a joined dataset
    Normalize {
        /// Joined observations CSV
        #[arg(long)]
        input: PathBuf,

        /// Output file
        #[arg(long)]
        output: PathBuf,

        /// JSON configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Number of extra bootstrap draws
        #[arg(long)]
        bootstrap: Option<usize>,

        /// Seed for reproducible runs
        #[arg(long)]
        seed: Option<u64>,

        /// Only these sensors (repeatable)
        #[arg(long)]
        sensor: Vec<String>,

        /// Output format: csv, json or pretty-json (default: from the output extension)
        #[arg(long)]
        format: Option<ExportFormat>,

        /// Run sensors and draws on one thread
        #[arg(long)]
        serial: bool,
    },

    /// Hold out one year and score the model on it
    Evaluate {
        /// Joined observations CSV
        #[arg(long)]
        input: PathBuf,

        /// Year to hold out
        #[arg(long)]
        test_year: i32,

        /// JSON configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Seed for reproducible runs
        #[arg(long)]
        seed: Option<u64>,

        /// Only these sensors (repeatable)
        #[arg(long)]
        sensor: Vec<String>,

        /// Write the metrics table to this file
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Print the feature schema built from a dataset
    Features {
        /// Joined observations CSV
        #[arg(long)]
        input: PathBuf,

        /// Expand sensor identity columns into indicators
        #[arg(long)]
        sensor_dummies: bool,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    init_tracing();
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn init_tracing() {
    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    if json_logging {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Normalize {
            input,
            output,
            config,
            bootstrap,
            seed,
            sensor,
            format,
            serial,
        } => {
            let mut config = load_config(config.as_deref(), seed)?;
            if let Some(bootstrap) = bootstrap {
                config.bootstrap_samples = bootstrap;
            }
            if serial {
                config.parallel = false;
            }
            let format = format.unwrap_or_else(|| ExportFormat::from_path(&output));
            normalize(&input, &output, config, sensor, format)?;
        }
        Commands::Evaluate {
            input,
            test_year,
            config,
            seed,
            sensor,
            output,
        } => {
            let config = load_config(config.as_deref(), seed)?;
            evaluate(&input, test_year, &config, sensor, output.as_deref())?;
        }
        Commands::Features {
            input,
            sensor_dummies,
            json,
        } => {
            print_features(&input, sensor_dummies, json)?;
        }
    }

    Ok(())
}

fn load_config(
    path: Option<&Path>,
    seed: Option<u64>,
) -> Result<NormalizationConfig, Box<dyn std::error::Error>> {
    let mut config = match path {
        Some(path) => NormalizationConfig::from_file(path)?,
        None => NormalizationConfig::default(),
    };
    if let Some(seed) = seed {
        config.rng = RngMode::Seeded(seed);
    }
    Ok(config)
}

fn read_observations(path: &Path) -> PolarsResult<DataFrame> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;
    info!(path = %path.display(), rows = df.height(), columns = df.width(), "observations loaded");
    Ok(df)
}

fn normalize(
    input: &Path,
    output: &Path,
    config: NormalizationConfig,
    sensors: Vec<String>,
    format: ExportFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let observations = read_observations(input)?;
    let sensors = if sensors.is_empty() {
        sensor_ids(&observations, &config.sensor_column)?
    } else {
        sensors
    };

    let pb = ProgressBar::new(sensors.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("█▓░"),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message("Normalizing sensors...");

    let observer = pb.clone();
    let pipeline = SensorPipeline::new(NormalizationEngine::new(config)?)
        .with_sensors(sensors)
        .with_progress(move |progress| {
            observer.set_position(progress.completed as u64);
            observer.set_message(format!("sensor {}", progress.sensor));
        });
    let report = pipeline.run(&observations)?;
    pb.finish_with_message(format!(
        "Normalized {} sensors ({} rows)",
        report.processed.len(),
        report.output.height()
    ));

    for failure in &report.failures {
        warn!(sensor = %failure.sensor, error = %failure.error, "not normalized");
    }

    let records = NormalizedRecord::from_frame(&report.output)?;
    records.export_to_file(output, format)?;
    info!(path = %output.display(), rows = records.len(), "normalized table written");
    Ok(())
}

fn evaluate(
    input: &Path,
    test_year: i32,
    config: &NormalizationConfig,
    sensors: Vec<String>,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let observations = read_observations(input)?;
    let sensors = if sensors.is_empty() {
        sensor_ids(&observations, &config.sensor_column)?
    } else {
        sensors
    };

    let mut table = MetricsTable::new();
    for sensor in &sensors {
        let rows = observations
            .clone()
            .lazy()
            .filter(col(config.sensor_column.as_str()).cast(DataType::String).eq(lit(sensor.as_str())))
            .collect()?;
        match normair::evaluate(config, &rows, test_year) {
            Ok(report) => table.insert(format!("{}_{sensor}", config.model_kind), report.metrics),
            Err(error) => warn!(sensor = %sensor, %error, "evaluation skipped"),
        }
    }

    println!("\nHoldout year {test_year}");
    print!("{}", table.to_ascii_table());

    if let Some(path) = output {
        table.export_to_file(path, ExportFormat::from_path(path))?;
        info!(path = %path.display(), "metrics written");
    }
    Ok(())
}

fn print_features(
    input: &Path,
    sensor_dummies: bool,
    as_json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let observations = read_observations(input)?;
    let builder = FeatureBuilder::new(FeatureConfig {
        sensor_dummies,
        ..FeatureConfig::default()
    });
    let vocabulary = builder.vocabulary(&observations)?;
    let matrix = builder.build(&observations)?;

    let columns: Vec<(String, String)> = matrix
        .frame()
        .get_columns()
        .iter()
        .map(|c| (c.name().to_string(), c.dtype().to_string()))
        .collect();

    if as_json {
        let output = json!({
            "rows": matrix.height(),
            "columns": columns
                .iter()
                .map(|(name, dtype)| json!({ "name": name, "dtype": dtype }))
                .collect::<Vec<_>>(),
            "weather_events": vocabulary.tokens().collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{} rows, {} feature columns", matrix.height(), columns.len());
        println!("{}", "-".repeat(40));
        for (name, dtype) in &columns {
            println!("{:<28} {:>10}", name, dtype);
        }
        if !vocabulary.is_empty() {
            println!("\nWeather events: {}", vocabulary.tokens().collect::<Vec<_>>().join(", "));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_arguments() {
        let cli = Cli::try_parse_from([
            "normair", "normalize", "--input", "in.csv", "--output", "out.json", "--seed", "7",
            "--sensor", "5504", "--sensor", "6328", "--format", "pretty-json",
        ])
        .unwrap();
        match cli.command {
            Commands::Normalize {
                seed,
                sensor,
                format,
                bootstrap,
                ..
            } => {
                assert_eq!(seed, Some(7));
                assert_eq!(sensor, vec!["5504", "6328"]);
                assert_eq!(format, Some(ExportFormat::PrettyJson));
                assert_eq!(bootstrap, None);
            }
            _ => panic!("expected normalize"),
        }
    }

    #[test]
    fn test_unknown_format_rejected() {
        assert!(
            Cli::try_parse_from([
                "normair", "normalize", "--input", "a", "--output", "b", "--format", "xml",
            ])
            .is_err()
        );
    }

    #[test]
    fn test_seed_overrides_config() {
        let config = load_config(None, Some(11)).unwrap();
        assert_eq!(config.rng, RngMode::Seeded(11));
        assert_eq!(config.bootstrap_samples, 100);
    }
}
