use crate::error::{ProcessingError, Result};
use crate::models::{ScanRecord, ScanSample};
use crate::utils::filename::parse_scan_timestamp;
use std::path::Path;

/// Reads retrieved scan files (`angle`, `SO2`, `SO2_err`, `int_av` columns).
#[derive(Debug, Clone, Default)]
pub struct ScanReader;

impl ScanReader {
    pub fn new() -> Self {
        Self
    }

    /// Read one scan, taking its timestamp from the filename
    pub fn read_scan(&self, path: &Path) -> Result<ScanRecord> {
        let filename = path
            .file_name()
            .and_then(|f| f.to_str())
            .ok_or_else(|| ProcessingError::InvalidFormat(format!("Invalid scan path: {}", path.display())))?;
        let timestamp = parse_scan_timestamp(filename)?;

        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)?;

        let mut scan = ScanRecord::new(filename, timestamp);
        for result in reader.deserialize::<ScanSample>() {
            scan.push(result?);
        }

        Ok(scan)
    }
}
