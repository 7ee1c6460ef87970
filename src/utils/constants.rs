/// Validity ratio below which a source fails
pub const DEFAULT_VALIDITY_THRESHOLD: f64 = 0.90;

/// Climate-station column names
pub const STATION_TIMESTAMP_COLUMN: &str = "Date/Time (LST)";
pub const STATION_TEMP_COLUMN: &str = "Temp (°C)";
pub const STATION_WIND_COLUMN: &str = "Wind Spd (km/h)";
pub const YEAR_COLUMN: &str = "Year";
pub const MONTH_COLUMN: &str = "Month";
pub const DAY_COLUMN: &str = "Day";

/// Recognised composite timestamp columns, in priority order
pub const COMPOSITE_TIMESTAMP_COLUMNS: &[&str] = &[STATION_TIMESTAMP_COLUMN];

/// Irradiance document parameter names
pub const PARAM_GHI: &str = "ALLSKY_SFC_SW_DWN";
pub const PARAM_DNI: &str = "ALLSKY_SFC_SW_DNI";
pub const PARAM_DIF: &str = "ALLSKY_SFC_SW_DIFF";

/// Irradiance timestamp keys are `YYYYMMDDHH`
pub const PARAMETER_KEY_LEN: usize = 10;

/// Missing-value sentinel in irradiance documents
pub const MISSING_SENTINEL: f64 = -999.0;

/// Timezone defaults (hours east of UTC)
pub const DEFAULT_STATION_UTC_OFFSET_HOURS: f64 = -5.0;
pub const DEFAULT_IRRADIANCE_UTC_OFFSET_HOURS: f64 = 0.0;

/// Input discovery
pub const DEFAULT_STATION_FILE_EXTENSION: &str = "csv";

/// Destination tables
pub const STATION_TABLE: &str = "station_observations";
pub const IRRADIANCE_TABLE: &str = "irradiance_observations";

/// Environment variable prefix for configuration overrides
pub const CONFIG_ENV_PREFIX: &str = "WEATHER_INGEST";

/// Processing defaults
pub const DEFAULT_ROW_GROUP_SIZE: usize = 10000;

/// Parquet compression options
pub const COMPRESSION_SNAPPY: &str = "snappy";
pub const COMPRESSION_GZIP: &str = "gzip";
pub const COMPRESSION_LZ4: &str = "lz4";
pub const COMPRESSION_ZSTD: &str = "zstd";
pub const COMPRESSION_NONE: &str = "none";
