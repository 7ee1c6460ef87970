use crate::error::{ProcessingError, Result};
use crate::models::{IrradianceObservation, NormalizedBatch, StationObservation};
use crate::utils::constants::{
    COMPRESSION_GZIP, COMPRESSION_LZ4, COMPRESSION_NONE, COMPRESSION_SNAPPY, COMPRESSION_ZSTD,
    DEFAULT_ROW_GROUP_SIZE,
};
use arrow::array::{Array, ArrayRef, Float64Array, TimestampMicrosecondArray};
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;
use chrono::{DateTime, Utc};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression, GzipLevel, ZstdLevel};
use parquet::file::properties::WriterProperties;
use parquet::file::reader::{FileReader, SerializedFileReader};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

const PART_PREFIX: &str = "part-";
const PART_SUFFIX: &str = ".parquet";

/// Destination for normalized observations
pub trait TableSink {
    /// Append a batch to `table`, returning the number of rows written
    fn append(&mut self, table: &str, batch: &NormalizedBatch) -> Result<usize>;
}

/// Writes each table as a directory of Parquet part files:
/// `<root>/<table>/part-00000.parquet`, `part-00001.parquet`, ...
pub struct ParquetSink {
    root: PathBuf,
    compression: Compression,
    row_group_size: usize,
}

impl ParquetSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            compression: Compression::SNAPPY,
            row_group_size: DEFAULT_ROW_GROUP_SIZE,
        }
    }

    pub fn with_compression(mut self, compression: &str) -> Result<Self> {
        self.compression = match compression.to_lowercase().as_str() {
            COMPRESSION_SNAPPY => Compression::SNAPPY,
            COMPRESSION_GZIP => Compression::GZIP(GzipLevel::default()),
            COMPRESSION_LZ4 => Compression::LZ4,
            COMPRESSION_ZSTD => Compression::ZSTD(ZstdLevel::default()),
            COMPRESSION_NONE => Compression::UNCOMPRESSED,
            _ => {
                return Err(ProcessingError::Config(format!(
                    "Unsupported compression: {}",
                    compression
                )))
            }
        };
        Ok(self)
    }

    pub fn with_row_group_size(mut self, size: usize) -> Self {
        self.row_group_size = size;
        self
    }

    fn table_dir(&self, table: &str) -> PathBuf {
        self.root.join(table)
    }

    /// Part files of a table in write order
    pub fn part_files(&self, table: &str) -> Result<Vec<PathBuf>> {
        let dir = self.table_dir(table);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut parts: Vec<(usize, PathBuf)> = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if let Some(index) = part_index(&path) {
                parts.push((index, path));
            }
        }
        parts.sort_by_key(|(index, _)| *index);
        Ok(parts.into_iter().map(|(_, path)| path).collect())
    }

    /// Table directories present under the root, sorted by name
    pub fn tables(&self) -> Result<Vec<String>> {
        if !self.root.is_dir() {
            return Err(ProcessingError::InvalidFormat(format!(
                "Path is not a directory: {}",
                self.root.display()
            )));
        }

        let mut tables = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if entry.path().is_dir() {
                tables.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        tables.sort();
        Ok(tables)
    }

    fn next_part_path(&self, dir: &Path, table: &str) -> Result<PathBuf> {
        let next = self
            .part_files(table)?
            .iter()
            .filter_map(|path| part_index(path))
            .max()
            .map_or(0, |index| index + 1);
        Ok(dir.join(format!("{}{:05}{}", PART_PREFIX, next, PART_SUFFIX)))
    }

    fn write_batch(&self, path: &Path, batch: RecordBatch) -> Result<()> {
        let file = File::create(path)?;
        let props = WriterProperties::builder()
            .set_compression(self.compression)
            .set_max_row_group_size(self.row_group_size)
            .build();

        let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))?;
        writer.write(&batch)?;
        writer.close()?;
        Ok(())
    }

    /// Rows, files and time coverage of one table
    pub fn table_info(&self, table: &str) -> Result<TableInfo> {
        let files = self.part_files(table)?;
        let mut info = TableInfo {
            table: table.to_string(),
            files: files.len(),
            ..Default::default()
        };

        for path in &files {
            let reader = SerializedFileReader::new(File::open(path)?)?;
            let metadata = reader.metadata();
            info.total_rows += metadata.file_metadata().num_rows();
            info.row_groups += metadata.num_row_groups();
            info.file_size += fs::metadata(path)?.len();

            for (first, last) in timestamp_bounds(path)? {
                info.first_timestamp = Some(info.first_timestamp.map_or(first, |t| t.min(first)));
                info.last_timestamp = Some(info.last_timestamp.map_or(last, |t| t.max(last)));
            }
        }

        Ok(info)
    }
}

impl TableSink for ParquetSink {
    fn append(&mut self, table: &str, batch: &NormalizedBatch) -> Result<usize> {
        if batch.is_empty() {
            debug!("Skipping empty batch for table {}", table);
            return Ok(0);
        }

        let dir = self.table_dir(table);
        fs::create_dir_all(&dir)?;
        let path = self.next_part_path(&dir, table)?;

        let record_batch = to_record_batch(batch)?;
        let rows = record_batch.num_rows();
        self.write_batch(&path, record_batch)?;

        info!("Wrote {} rows to {}", rows, path.display());
        Ok(rows)
    }
}

fn part_index(path: &Path) -> Option<usize> {
    path.file_name()?
        .to_str()?
        .strip_prefix(PART_PREFIX)?
        .strip_suffix(PART_SUFFIX)?
        .parse()
        .ok()
}

fn timestamp_field() -> Field {
    Field::new(
        "timestamp_utc",
        DataType::Timestamp(TimeUnit::Microsecond, Some("UTC".into())),
        false,
    )
}

/// Fixed output schema for a batch kind; measurement columns are nullable
pub fn schema_for(batch: &NormalizedBatch) -> Arc<Schema> {
    let mut fields = vec![timestamp_field()];
    for name in &batch.column_names()[1..] {
        let nullable = !matches!(*name, "latitude" | "longitude");
        fields.push(Field::new(*name, DataType::Float64, nullable));
    }
    Arc::new(Schema::new(fields))
}

fn timestamp_array<'a>(timestamps: impl Iterator<Item = &'a DateTime<Utc>>) -> ArrayRef {
    let micros: Vec<i64> = timestamps.map(|t| t.timestamp_micros()).collect();
    Arc::new(TimestampMicrosecondArray::from(micros).with_timezone("UTC"))
}

fn float_array(values: Vec<Option<f64>>) -> ArrayRef {
    Arc::new(Float64Array::from(values))
}

fn station_columns(records: &[StationObservation]) -> Vec<ArrayRef> {
    vec![
        timestamp_array(records.iter().map(|r| &r.timestamp_utc)),
        float_array(records.iter().map(|r| Some(r.latitude)).collect()),
        float_array(records.iter().map(|r| Some(r.longitude)).collect()),
        float_array(records.iter().map(|r| r.air_temp_c).collect()),
        float_array(records.iter().map(|r| r.wind_speed_kmh).collect()),
    ]
}

fn irradiance_columns(records: &[IrradianceObservation]) -> Vec<ArrayRef> {
    vec![
        timestamp_array(records.iter().map(|r| &r.timestamp_utc)),
        float_array(records.iter().map(|r| Some(r.latitude)).collect()),
        float_array(records.iter().map(|r| Some(r.longitude)).collect()),
        float_array(records.iter().map(|r| r.ghi_wm2).collect()),
        float_array(records.iter().map(|r| r.dni_wm2).collect()),
        float_array(records.iter().map(|r| r.dif_wm2).collect()),
    ]
}

/// Convert a normalized batch to an Arrow RecordBatch
pub fn to_record_batch(batch: &NormalizedBatch) -> Result<RecordBatch> {
    let columns = match batch {
        NormalizedBatch::Station(records) => station_columns(records),
        NormalizedBatch::Irradiance(records) => irradiance_columns(records),
    };
    Ok(RecordBatch::try_new(schema_for(batch), columns)?)
}

/// Min and max of the timestamp column, per record batch of the file
fn timestamp_bounds(path: &Path) -> Result<Vec<(DateTime<Utc>, DateTime<Utc>)>> {
    let reader = ParquetRecordBatchReaderBuilder::try_new(File::open(path)?)?.build()?;

    let mut bounds = Vec::new();
    for batch_result in reader {
        let batch = batch_result?;
        let timestamps = batch
            .column(0)
            .as_any()
            .downcast_ref::<TimestampMicrosecondArray>()
            .ok_or_else(|| {
                ProcessingError::InvalidFormat(format!(
                    "Invalid timestamp_utc column in {}",
                    path.display()
                ))
            })?;

        let min = arrow::compute::min(timestamps).and_then(DateTime::<Utc>::from_timestamp_micros);
        let max = arrow::compute::max(timestamps).and_then(DateTime::<Utc>::from_timestamp_micros);
        if let (Some(min), Some(max)) = (min, max) {
            bounds.push((min, max));
        }
    }
    Ok(bounds)
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct TableInfo {
    pub table: String,
    pub files: usize,
    pub total_rows: i64,
    pub row_groups: usize,
    pub file_size: u64,
    pub first_timestamp: Option<DateTime<Utc>>,
    pub last_timestamp: Option<DateTime<Utc>>,
}

impl TableInfo {
    pub fn summary(&self) -> String {
        let coverage = match (self.first_timestamp, self.last_timestamp) {
            (Some(first), Some(last)) => format!("{} to {}", first.to_rfc3339(), last.to_rfc3339()),
            _ => "n/a".to_string(),
        };
        format!(
            "Table {}:\n\
            - Files: {}\n\
            - Total rows: {}\n\
            - Row groups: {}\n\
            - Size: {:.2} MB\n\
            - Coverage (UTC): {}",
            self.table,
            self.files,
            self.total_rows,
            self.row_groups,
            self.file_size as f64 / 1_048_576.0,
            coverage
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::constants::{IRRADIANCE_TABLE, STATION_TABLE};
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn station_batch(hours: &[u32]) -> NormalizedBatch {
        NormalizedBatch::Station(
            hours
                .iter()
                .map(|h| StationObservation {
                    timestamp_utc: Utc.with_ymd_and_hms(2024, 6, 30, *h, 0, 0).unwrap(),
                    latitude: 43.67,
                    longitude: -79.4,
                    air_temp_c: Some(20.0),
                    wind_speed_kmh: None,
                })
                .collect(),
        )
    }

    #[test]
    fn test_empty_batch_writes_nothing() -> Result<()> {
        let dir = TempDir::new()?;
        let mut sink = ParquetSink::new(dir.path());

        let written = sink.append(STATION_TABLE, &NormalizedBatch::Station(vec![]))?;
        assert_eq!(written, 0);
        assert!(!dir.path().join(STATION_TABLE).exists());
        Ok(())
    }

    #[test]
    fn test_appends_create_numbered_parts() -> Result<()> {
        let dir = TempDir::new()?;
        let mut sink = ParquetSink::new(dir.path());

        assert_eq!(sink.append(STATION_TABLE, &station_batch(&[0, 1, 2]))?, 3);
        assert_eq!(sink.append(STATION_TABLE, &station_batch(&[5]))?, 1);

        let names: Vec<String> = sink
            .part_files(STATION_TABLE)?
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["part-00000.parquet", "part-00001.parquet"]);

        let info = sink.table_info(STATION_TABLE)?;
        assert_eq!(info.files, 2);
        assert_eq!(info.total_rows, 4);
        assert_eq!(info.first_timestamp, Some(Utc.with_ymd_and_hms(2024, 6, 30, 0, 0, 0).unwrap()));
        assert_eq!(info.last_timestamp, Some(Utc.with_ymd_and_hms(2024, 6, 30, 5, 0, 0).unwrap()));
        assert_eq!(sink.tables()?, vec![STATION_TABLE.to_string()]);
        Ok(())
    }

    #[test]
    fn test_schema_and_nulls_survive() -> Result<()> {
        let dir = TempDir::new()?;
        let mut sink = ParquetSink::new(dir.path()).with_compression("zstd")?;
        let batch = NormalizedBatch::Irradiance(vec![IrradianceObservation {
            timestamp_utc: Utc.with_ymd_and_hms(2024, 6, 30, 12, 0, 0).unwrap(),
            latitude: 43.7,
            longitude: -79.4,
            ghi_wm2: Some(812.5),
            dni_wm2: None,
            dif_wm2: Some(150.25),
        }]);
        sink.append(IRRADIANCE_TABLE, &batch)?;

        let path = &sink.part_files(IRRADIANCE_TABLE)?[0];
        let mut reader = ParquetRecordBatchReaderBuilder::try_new(File::open(path)?)?.build()?;
        let read = reader.next().unwrap()?;

        assert_eq!(read.schema().field(0).name(), "timestamp_utc");
        assert_eq!(
            read.schema().field(0).data_type(),
            &DataType::Timestamp(TimeUnit::Microsecond, Some("UTC".into()))
        );
        let dni = read.column(4).as_any().downcast_ref::<Float64Array>().unwrap();
        assert!(dni.is_null(0));
        let ghi = read.column(3).as_any().downcast_ref::<Float64Array>().unwrap();
        assert_eq!(ghi.value(0), 812.5);
        Ok(())
    }

    #[test]
    fn test_row_group_size() -> Result<()> {
        let dir = TempDir::new()?;
        let mut sink = ParquetSink::new(dir.path()).with_row_group_size(2);
        sink.append(STATION_TABLE, &station_batch(&[0, 1, 2, 3, 4]))?;

        let info = sink.table_info(STATION_TABLE)?;
        assert_eq!(info.total_rows, 5);
        assert_eq!(info.row_groups, 3);
        Ok(())
    }

    #[test]
    fn test_different_compressions() -> Result<()> {
        for compression in ["snappy", "gzip", "lz4", "zstd", "none"] {
            let dir = TempDir::new()?;
            let mut sink = ParquetSink::new(dir.path()).with_compression(compression)?;
            let result = sink.append(STATION_TABLE, &station_batch(&[0]));
            assert!(result.is_ok(), "Failed with compression: {}", compression);
        }
        assert!(ParquetSink::new("out").with_compression("brotli-9").is_err());
        Ok(())
    }
}
