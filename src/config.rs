//! Run configuration.
//!
//! Thresholds and required-name lists are passed explicitly into each
//! validator call. Values come from compiled defaults, then an optional
//! TOML file, then `WEATHER_INGEST_*` environment variables.

use crate::error::Result;
use crate::utils::constants::*;
use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct QcConfig {
    /// Minimum fraction of parseable timestamps for a source to pass
    #[validate(range(min = 0.0, max = 1.0))]
    pub validity_threshold: f64,

    /// Columns every station file must carry verbatim
    pub required_station_columns: Vec<String>,

    /// Parameter series every irradiance document must carry
    pub required_parameters: Vec<String>,

    /// Offset of station local standard time from UTC, in hours
    #[validate(range(min = -14.0, max = 14.0))]
    pub station_utc_offset_hours: f64,

    /// Offset of irradiance document timestamps from UTC, in hours
    #[validate(range(min = -14.0, max = 14.0))]
    pub irradiance_utc_offset_hours: f64,

    /// Extension of station files picked up from a corpus directory
    #[validate(length(min = 1))]
    pub station_file_extension: String,

    /// Report column-role ambiguity instead of silently taking the first match
    pub strict_column_roles: bool,

    /// Let schema problems (missing columns, unresolved roles) fail the corpus verdict
    pub corpus_gates_on_schema_mismatch: bool,
}

impl Default for QcConfig {
    fn default() -> Self {
        Self {
            validity_threshold: DEFAULT_VALIDITY_THRESHOLD,
            required_station_columns: vec![
                STATION_TIMESTAMP_COLUMN.to_string(),
                STATION_TEMP_COLUMN.to_string(),
                STATION_WIND_COLUMN.to_string(),
            ],
            required_parameters: vec![
                PARAM_GHI.to_string(),
                PARAM_DNI.to_string(),
                PARAM_DIF.to_string(),
            ],
            station_utc_offset_hours: DEFAULT_STATION_UTC_OFFSET_HOURS,
            irradiance_utc_offset_hours: DEFAULT_IRRADIANCE_UTC_OFFSET_HOURS,
            station_file_extension: DEFAULT_STATION_FILE_EXTENSION.to_string(),
            strict_column_roles: false,
            corpus_gates_on_schema_mismatch: false,
        }
    }
}

impl QcConfig {
    /// Load configuration, layering an optional file and the environment
    /// over the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_environment(path, environment())
    }

    fn load_with_environment(path: Option<&Path>, env: config::Environment) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            debug!("Loading configuration from {}", path.display());
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let config: QcConfig = builder.add_source(env).build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.validity_threshold = threshold;
        self
    }

    pub fn with_required_station_columns<S: Into<String>>(
        mut self,
        columns: impl IntoIterator<Item = S>,
    ) -> Self {
        self.required_station_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_required_parameters<S: Into<String>>(
        mut self,
        parameters: impl IntoIterator<Item = S>,
    ) -> Self {
        self.required_parameters = parameters.into_iter().map(Into::into).collect();
        self
    }

    pub fn station_offset(&self) -> FixedOffset {
        offset_from_hours(self.station_utc_offset_hours)
    }

    pub fn irradiance_offset(&self) -> FixedOffset {
        offset_from_hours(self.irradiance_utc_offset_hours)
    }
}

/// `WEATHER_INGEST_*` variables; list fields take comma-separated values
fn environment() -> config::Environment {
    config::Environment::with_prefix(CONFIG_ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("required_station_columns")
        .with_list_parse_key("required_parameters")
}

fn offset_from_hours(hours: f64) -> FixedOffset {
    let seconds = (hours * 3600.0).round() as i32;
    // Out-of-range offsets are rejected by `validate`
    FixedOffset::east_opt(seconds).unwrap_or(Utc.fix())
}
