pub mod parquet_sink;
pub mod report;

pub use parquet_sink::{ParquetSink, TableInfo, TableSink};
pub use report::{ReportEmitter, ReportFormat};
