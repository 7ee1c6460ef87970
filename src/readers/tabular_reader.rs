use crate::error::Result;
use crate::models::RawTabularRecordSet;
use std::borrow::Cow;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Reads delimited station files with a header row.
///
/// Column names are kept exactly as the provider wrote them. Files that are
/// not valid UTF-8 are decoded as Windows-1252, which covers providers that
/// write a Latin-1 degree sign.
pub struct TabularReader {
    delimiter: u8,
}

impl TabularReader {
    pub fn new() -> Self {
        Self { delimiter: b',' }
    }

    pub fn with_delimiter(delimiter: u8) -> Self {
        Self { delimiter }
    }

    /// Read a file; zero-byte and header-only files give an empty record set
    pub fn read(&self, path: &Path) -> Result<RawTabularRecordSet> {
        let bytes = fs::read(path)?;
        debug!("Read {} bytes from {}", bytes.len(), path.display());
        self.read_bytes(&bytes)
    }

    pub fn read_bytes(&self, bytes: &[u8]) -> Result<RawTabularRecordSet> {
        if bytes.is_empty() {
            return Ok(RawTabularRecordSet::empty());
        }

        let text = decode(bytes);
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .flexible(true)
            .from_reader(text.as_bytes());

        let columns: Vec<String> = reader.headers()?.iter().map(String::from).collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(String::from).collect());
        }

        Ok(RawTabularRecordSet::new(columns, rows))
    }
}

impl Default for TabularReader {
    fn default() -> Self {
        Self::new()
    }
}

/// UTF-8 with BOM removal, falling back to Windows-1252
fn decode(bytes: &[u8]) -> Cow<'_, str> {
    let (text, _, had_errors) = encoding_rs::UTF_8.decode(bytes);
    if !had_errors {
        return text;
    }
    let (text, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
    text
}
