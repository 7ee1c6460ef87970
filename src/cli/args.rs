use crate::writers::ReportFormat;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "weather-ingest")]
#[command(about = "Quality checks and normalization for climate-station and irradiance data")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(
        short,
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Only log warnings and errors, hide progress bars"
    )]
    pub quiet: bool,

    #[arg(long, global = true, help = "Log file path")]
    pub log_file: Option<PathBuf>,

    #[arg(
        short,
        long,
        global = true,
        help = "Configuration file (TOML, YAML or JSON); WEATHER_INGEST_* variables override it"
    )]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

impl Cli {
    pub fn log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else if self.quiet {
            "warn"
        } else {
            "info"
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

impl From<OutputFormat> for ReportFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Text => ReportFormat::Text,
            OutputFormat::Json => ReportFormat::Json,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate a directory of climate-station files as one pooled corpus
    ValidateStations {
        #[arg(short, long, help = "Directory containing station CSV files")]
        input_dir: PathBuf,

        #[arg(long, help = "Also report a verdict for every file")]
        per_file: bool,

        #[arg(long, help = "Override the validity-ratio threshold (0.0 - 1.0)")]
        threshold: Option<f64>,
    },

    /// Validate one irradiance JSON document
    ValidateIrradiance {
        #[arg(short, long, help = "Irradiance JSON document")]
        file: PathBuf,

        #[arg(long, help = "Override the validity-ratio threshold (0.0 - 1.0)")]
        threshold: Option<f64>,
    },

    /// Validate both sources, then normalize and load the ones that passed
    Ingest {
        #[arg(short, long, help = "Directory containing station CSV files")]
        input_dir: PathBuf,

        #[arg(long, help = "Irradiance JSON document")]
        irradiance_file: PathBuf,

        #[arg(short, long, help = "Root directory of the output tables")]
        output_dir: PathBuf,

        #[arg(long, default_value = "snappy")]
        compression: String,

        #[arg(long, help = "Load sources even when their verdict failed")]
        force: bool,
    },

    /// Display row and file counts of the loaded tables
    Info {
        #[arg(short, long, help = "Root directory of the output tables")]
        output_dir: PathBuf,
    },
}
