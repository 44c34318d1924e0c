use crate::error::{ProcessingError, Result};
use crate::models::Station;
use crate::utils::filename::{parse_scan_timestamp, station_scan_dir};
use chrono::NaiveDateTime;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct ScanEntry {
    pub path: PathBuf,
    pub filename: String,
    pub timestamp: NaiveDateTime,
}

impl ScanEntry {
    pub fn new(path: PathBuf, filename: &str, timestamp: NaiveDateTime) -> Self {
        Self {
            path,
            filename: filename.to_string(),
            timestamp,
        }
    }
}

/// Scans available for one station, in acquisition order
#[derive(Debug, Clone, PartialEq)]
pub struct StationScans {
    pub station: String,
    pub entries: Vec<ScanEntry>,
    /// False when the station had no scan directory for the day
    pub present: bool,
}

impl StationScans {
    /// Entries are ordered by timestamp, then filename
    pub fn new(station: &str, mut entries: Vec<ScanEntry>) -> Self {
        entries.sort_by(|a, b| {
            a.timestamp
                .cmp(&b.timestamp)
                .then_with(|| a.filename.cmp(&b.filename))
        });
        Self {
            station: station.to_string(),
            entries,
            present: true,
        }
    }

    /// A station whose scan directory does not exist
    pub fn missing(station: &str) -> Self {
        Self {
            station: station.to_string(),
            entries: Vec::new(),
            present: false,
        }
    }

    pub fn filenames(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.filename.as_str()).collect()
    }

    pub fn timestamps(&self) -> Vec<NaiveDateTime> {
        self.entries.iter().map(|e| e.timestamp).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Point-in-time snapshot of every participating station's scans for one day.
///
/// Files that appear after the snapshot is taken are picked up by the next run.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanCatalog {
    stations: Vec<StationScans>,
}

impl ScanCatalog {
    /// Enumerate `<day_root>/<station>/so2/` for each participating station.
    ///
    /// A missing station directory gives that station no scans. A missing
    /// day root or an unreadable directory is a hard error.
    pub fn build(stations: &[Station], day_root: &Path) -> Result<Self> {
        match fs::metadata(day_root) {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => {
                return Err(ProcessingError::InvalidFormat(format!(
                    "Results path is not a directory: {}",
                    day_root.display()
                )))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(ProcessingError::MissingData(format!(
                    "No results directory for the day: {}",
                    day_root.display()
                )))
            }
            Err(source) => {
                return Err(ProcessingError::Catalog {
                    path: day_root.to_path_buf(),
                    source,
                })
            }
        }

        let mut catalog = Vec::new();
        for station in stations {
            if !station.sync {
                info!("Station {} does not take part in the analysis", station.name);
                continue;
            }

            let dir = station_scan_dir(day_root, &station.name);
            let scans = match list_scan_dir(&dir)? {
                Some(entries) => StationScans::new(&station.name, entries),
                None => {
                    info!("No scan directory for {} at {}", station.name, dir.display());
                    StationScans::missing(&station.name)
                }
            };
            catalog.push(scans);
        }

        Ok(Self { stations: catalog })
    }

    pub fn from_stations(stations: Vec<StationScans>) -> Self {
        Self { stations }
    }

    pub fn stations(&self) -> &[StationScans] {
        &self.stations
    }

    pub fn station(&self, name: &str) -> Option<&StationScans> {
        self.stations.iter().find(|s| s.station == name)
    }

    pub fn total_scans(&self) -> usize {
        self.stations.iter().map(|s| s.len()).sum()
    }
}

/// List scan files in a directory. `Ok(None)` when the directory does not exist.
fn list_scan_dir(dir: &Path) -> Result<Option<Vec<ScanEntry>>> {
    let read_dir = match fs::read_dir(dir) {
        Ok(rd) => rd,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(ProcessingError::Catalog {
                path: dir.to_path_buf(),
                source,
            })
        }
    };

    let mut entries = Vec::new();
    for entry in read_dir {
        let entry = entry.map_err(|source| ProcessingError::Catalog {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let Some(filename) = path.file_name().and_then(|f| f.to_str()).map(str::to_string) else {
            warn!("Skipping scan file with non UTF-8 name in {}", dir.display());
            continue;
        };

        match parse_scan_timestamp(&filename) {
            Ok(timestamp) => entries.push(ScanEntry::new(path, &filename, timestamp)),
            Err(_) => warn!("Skipping {}: no scan timestamp in filename", path.display()),
        }
    }

    Ok(Some(entries))
}
