use crate::error::Result;
use crate::models::IrradianceDocument;
use std::fs;
use std::path::Path;
use tracing::debug;

pub struct IrradianceReader;

impl IrradianceReader {
    pub fn new() -> Self {
        Self
    }

    /// Read an irradiance document; `None` for a zero-byte file
    pub fn read(&self, path: &Path) -> Result<Option<IrradianceDocument>> {
        let bytes = fs::read(path)?;
        debug!("Read {} bytes from {}", bytes.len(), path.display());
        self.parse(&bytes)
    }

    pub fn parse(&self, bytes: &[u8]) -> Result<Option<IrradianceDocument>> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }
        Ok(Some(serde_json::from_slice(bytes)?))
    }
}

impl Default for IrradianceReader {
    fn default() -> Self {
        Self::new()
    }
}
