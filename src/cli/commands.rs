use crate::cli::args::{Cli, Commands};
use crate::config::QcConfig;
use crate::models::{IrradianceObservation, NormalizedBatch, StationObservation, Verdict};
use crate::processors::{
    CorpusAggregator, DocumentValidator, NormalizationStats, Normalizer, SourceValidator,
};
use crate::readers::{IrradianceReader, TabularReader};
use crate::utils::constants::{IRRADIANCE_TABLE, STATION_TABLE};
use crate::utils::progress::ProgressReporter;
use crate::writers::report::render_normalization;
use crate::writers::{ParquetSink, ReportEmitter, ReportFormat, TableSink};
use anyhow::{Context, Result};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info, warn};
use validator::Validate;

struct IngestOptions {
    input_dir: PathBuf,
    irradiance_file: PathBuf,
    output_dir: PathBuf,
    compression: String,
    force: bool,
}

/// Run one command. `Ok(false)` means a verdict failed.
pub fn run(cli: Cli) -> Result<bool> {
    setup_logging(&cli)?;

    let config = QcConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    let emitter = ReportEmitter::new().with_format(cli.format.into());
    let silent = cli.quiet;

    match cli.command {
        Commands::ValidateStations {
            input_dir,
            per_file,
            threshold,
        } => {
            let config = apply_threshold(config, threshold)?;
            validate_stations(&config, &emitter, &input_dir, per_file, silent)
        }

        Commands::ValidateIrradiance { file, threshold } => {
            let config = apply_threshold(config, threshold)?;
            let verdict =
                DocumentValidator::new(&config).validate_file(&IrradianceReader::new(), &file);
            println!("{}", emitter.render(&verdict)?);
            Ok(verdict.passed)
        }

        Commands::Ingest {
            input_dir,
            irradiance_file,
            output_dir,
            compression,
            force,
        } => {
            let options = IngestOptions {
                input_dir,
                irradiance_file,
                output_dir,
                compression,
                force,
            };
            ingest(&config, &emitter, &options, silent)
        }

        Commands::Info { output_dir } => {
            show_info(&output_dir)?;
            Ok(true)
        }
    }
}

/// Structured logging to stderr, or to `--log-file` when given
fn setup_logging(cli: &Cli) -> Result<()> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let log_level = cli.log_level();
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("weather_ingest={}", log_level)));

    match &cli.log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create log file {}", path.display()))?;
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_target(false)
                        .with_ansi(false)
                        .with_writer(Mutex::new(file)),
                )
                .try_init()?;
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_target(false)
                        .with_level(true)
                        .with_timer(fmt::time::uptime())
                        .with_writer(std::io::stderr),
                )
                .try_init()?;
        }
    }

    debug!("Logging initialized at level: {}", log_level);
    Ok(())
}

fn apply_threshold(config: QcConfig, threshold: Option<f64>) -> Result<QcConfig> {
    let Some(threshold) = threshold else {
        return Ok(config);
    };
    let config = config.with_threshold(threshold);
    config
        .validate()
        .with_context(|| format!("Invalid threshold: {}", threshold))?;
    Ok(config)
}

/// Discover and validate the station corpus with a progress bar
fn validate_corpus(
    config: &QcConfig,
    input_dir: &Path,
    silent: bool,
) -> Result<(Vec<PathBuf>, Verdict)> {
    let aggregator = CorpusAggregator::new(config);
    let files = aggregator
        .discover_files(input_dir)
        .with_context(|| format!("Failed to list station files in {}", input_dir.display()))?;

    let progress = ProgressReporter::new(files.len() as u64, "Validating station files...", silent);
    let verdict = aggregator.validate_files(&input_dir.display().to_string(), &files, Some(&progress));
    progress.finish_and_clear();

    Ok((files, verdict))
}

fn validate_stations(
    config: &QcConfig,
    emitter: &ReportEmitter,
    input_dir: &Path,
    per_file: bool,
    silent: bool,
) -> Result<bool> {
    let (files, corpus_verdict) = validate_corpus(config, input_dir, silent)?;

    if per_file {
        let validator = SourceValidator::new(config);
        let reader = TabularReader::new();
        let file_verdicts: Vec<Verdict> = files
            .iter()
            .map(|path| validator.validate_file(&reader, path))
            .collect();
        println!("{}", emitter.render_all(&file_verdicts)?);
    }

    println!("{}", emitter.render(&corpus_verdict)?);
    Ok(corpus_verdict.passed)
}

fn ingest(
    config: &QcConfig,
    emitter: &ReportEmitter,
    options: &IngestOptions,
    silent: bool,
) -> Result<bool> {
    let (files, station_verdict) = validate_corpus(config, &options.input_dir, silent)?;
    let document_verdict =
        DocumentValidator::new(config).validate_file(&IrradianceReader::new(), &options.irradiance_file);

    let verdicts = [station_verdict, document_verdict];
    println!("{}", emitter.render_all(&verdicts)?);
    let [station_verdict, document_verdict] = verdicts;

    fs::create_dir_all(&options.output_dir).with_context(|| {
        format!("Failed to create output directory {}", options.output_dir.display())
    })?;
    let mut sink = ParquetSink::new(&options.output_dir).with_compression(&options.compression)?;
    let normalizer = Normalizer::new(config);
    let mut summaries = Vec::new();

    if should_load(&station_verdict, options.force, STATION_TABLE) {
        let (records, stats) = normalize_stations(&normalizer, &files, silent);
        sink.append(STATION_TABLE, &NormalizedBatch::Station(records))
            .with_context(|| format!("Failed to write table {}", STATION_TABLE))?;
        summaries.push(render_normalization(STATION_TABLE, &stats));
    }

    if should_load(&document_verdict, options.force, IRRADIANCE_TABLE) {
        let (records, stats) = normalize_document(&normalizer, &options.irradiance_file)?;
        sink.append(IRRADIANCE_TABLE, &NormalizedBatch::Irradiance(records))
            .with_context(|| format!("Failed to write table {}", IRRADIANCE_TABLE))?;
        summaries.push(render_normalization(IRRADIANCE_TABLE, &stats));
    }

    for summary in &summaries {
        info!("{}", summary);
        if emitter.format() == ReportFormat::Text {
            println!("{}", summary);
        }
    }

    Ok(station_verdict.passed && document_verdict.passed)
}

fn should_load(verdict: &Verdict, force: bool, table: &str) -> bool {
    match (verdict.passed, force) {
        (true, _) => true,
        (false, true) => {
            warn!("{} failed validation; loading anyway (--force)", verdict.label);
            true
        }
        (false, false) => {
            warn!("{} failed validation; {} not loaded", verdict.label, table);
            false
        }
    }
}

fn normalize_stations(
    normalizer: &Normalizer,
    files: &[PathBuf],
    silent: bool,
) -> (Vec<StationObservation>, NormalizationStats) {
    let reader = TabularReader::new();
    let progress = ProgressReporter::new(files.len() as u64, "Normalizing station files...", silent);

    let mut records = Vec::new();
    let mut stats = NormalizationStats::default();
    for path in files {
        progress.set_message(&format!("Normalizing {}", path.display()));
        match reader.read(path) {
            Ok(record_set) => {
                let (file_records, file_stats) = normalizer.normalize_station(&record_set);
                records.extend(file_records);
                stats.merge(&file_stats);
            }
            Err(e) => warn!("Skipping {}: {}", path.display(), e),
        }
        progress.increment(1);
    }

    progress.finish_and_clear();
    (records, stats)
}

fn normalize_document(
    normalizer: &Normalizer,
    path: &Path,
) -> Result<(Vec<IrradianceObservation>, NormalizationStats)> {
    let document = IrradianceReader::new()
        .read(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    match document {
        Some(document) => Ok(normalizer.normalize_irradiance(&document)),
        None => {
            warn!("{} is empty; nothing to load", path.display());
            Ok((Vec::new(), NormalizationStats::default()))
        }
    }
}

fn show_info(output_dir: &Path) -> Result<()> {
    let sink = ParquetSink::new(output_dir);
    let tables = sink
        .tables()
        .with_context(|| format!("Failed to list tables in {}", output_dir.display()))?;

    if tables.is_empty() {
        println!("No tables found in {}", output_dir.display());
        return Ok(());
    }

    for table in tables {
        let info = sink.table_info(&table)?;
        println!("{}\n", info.summary());
    }
    Ok(())
}
