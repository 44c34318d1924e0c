use crate::error::{ProcessingError, Result};
use crate::utils::constants::{
    SCAN_TIME_FORMAT, SCAN_TIME_FORMAT_COMPACT, SCAN_TIME_LEN, SCAN_TIME_LEN_COMPACT, SO2_DIR,
};
use chrono::{NaiveDate, NaiveDateTime};
use std::path::{Path, PathBuf};

/// Parse the acquisition time embedded at the start of a scan filename.
///
/// Accepts `YYYYMMDD_HHMMSS...` and the compact `YYYYMMDDHHMMSS...` form.
pub fn parse_scan_timestamp(filename: &str) -> Result<NaiveDateTime> {
    if let Some(stamp) = filename.get(..SCAN_TIME_LEN) {
        if let Ok(ts) = NaiveDateTime::parse_from_str(stamp, SCAN_TIME_FORMAT) {
            return Ok(ts);
        }
    }

    filename
        .get(..SCAN_TIME_LEN_COMPACT)
        .and_then(|stamp| NaiveDateTime::parse_from_str(stamp, SCAN_TIME_FORMAT_COMPACT).ok())
        .ok_or_else(|| ProcessingError::InvalidTimestamp(filename.to_string()))
}

/// Directory holding all station results for one day: `<results_dir>/<YYYY-MM-DD>`
pub fn day_root(results_dir: &Path, date: NaiveDate) -> PathBuf {
    results_dir.join(date.format("%Y-%m-%d").to_string())
}

/// Directory holding a station's retrieved SO2 scans for the day
pub fn station_scan_dir(day_root: &Path, station: &str) -> PathBuf {
    day_root.join(station).join(SO2_DIR)
}

/// Flux table filename: `<date>_<station>_fluxes.csv` or `<date>_<station>_fluxes_reanalysed.csv`
pub fn flux_table_filename(date: NaiveDate, station: &str, reanalysed: bool) -> String {
    let suffix = if reanalysed { "_reanalysed" } else { "" };
    format!("{}_{}_fluxes{}.csv", date.format("%Y-%m-%d"), station, suffix)
}

pub fn flux_table_path(day_root: &Path, date: NaiveDate, station: &str, reanalysed: bool) -> PathBuf {
    day_root
        .join(station)
        .join(flux_table_filename(date, station, reanalysed))
}

/// Recover `(date, station, reanalysed)` from a flux table filename
pub fn parse_flux_table_filename(filename: &str) -> Option<(NaiveDate, String, bool)> {
    let stem = filename.strip_suffix(".csv")?;
    let (stem, reanalysed) = match stem.strip_suffix("_reanalysed") {
        Some(s) => (s, true),
        None => (stem, false),
    };
    let stem = stem.strip_suffix("_fluxes")?;

    let date = NaiveDate::parse_from_str(stem.get(..10)?, "%Y-%m-%d").ok()?;
    let station = stem.get(10..)?.strip_prefix('_')?;
    if station.is_empty() {
        return None;
    }
    Some((date, station.to_string(), reanalysed))
}
