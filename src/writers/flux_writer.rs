use crate::error::Result;
use crate::models::{FluxRecord, FluxTable};
use crate::utils::constants::FLUX_TABLE_COLUMNS;
use crate::utils::filename::flux_table_path;
use csv::{ReaderBuilder, WriterBuilder};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// Which table a run writes: the live one or the out-of-band re-run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportMode {
    #[default]
    RealTime,
    Reanalysis,
}

impl ExportMode {
    pub fn is_reanalysis(&self) -> bool {
        matches!(self, ExportMode::Reanalysis)
    }
}

pub struct FluxTableWriter {
    mode: ExportMode,
}

impl FluxTableWriter {
    pub fn new() -> Self {
        Self {
            mode: ExportMode::RealTime,
        }
    }

    pub fn with_mode(mode: ExportMode) -> Self {
        Self { mode }
    }

    /// Destination of a station's table under a day root
    pub fn table_path(&self, table: &FluxTable, day_root: &Path) -> PathBuf {
        flux_table_path(
            day_root,
            table.date,
            &table.station,
            self.mode.is_reanalysis(),
        )
    }

    /// Write a station's table into `<day_root>/<station>/`.
    ///
    /// The station directory must already exist.
    pub fn write_table(&self, table: &FluxTable, day_root: &Path) -> Result<PathBuf> {
        let path = self.table_path(table, day_root);
        self.write_to_path(&table.records, &path)?;
        Ok(path)
    }

    /// Replace `path` with the given rows. The header is always written,
    /// so an empty table still produces a valid file.
    pub fn write_to_path(&self, records: &[FluxRecord], path: &Path) -> Result<()> {
        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };

        let mut tmp = NamedTempFile::new_in(parent)?;
        {
            let mut writer = WriterBuilder::new()
                .has_headers(false)
                .from_writer(tmp.as_file_mut());
            writer.write_record(FLUX_TABLE_COLUMNS)?;
            for record in records {
                writer.serialize(record)?;
            }
            writer.flush()?;
        }
        tmp.as_file_mut().flush()?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| e.error)?;

        debug!("Wrote {} rows to {}", records.len(), path.display());
        Ok(())
    }

    /// Read an exported table back
    pub fn read_table(&self, path: &Path) -> Result<Vec<FluxRecord>> {
        let file = File::open(path)?;
        let mut reader = ReaderBuilder::new().has_headers(true).from_reader(file);

        let mut records = Vec::new();
        for row in reader.deserialize() {
            let record: FluxRecord = row?;
            records.push(record);
        }
        Ok(records)
    }
}

impl Default for FluxTableWriter {
    fn default() -> Self {
        Self::new()
    }
}
