use crate::error::{ProcessingError, Result};
use crate::models::Station;
use crate::utils::coordinates::parse_coordinate;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use validator::Validate;

/// Raw registry row; coordinates may be decimal or `DD:MM:SS`
#[derive(Debug, Deserialize)]
struct StationRow {
    name: String,
    latitude: String,
    longitude: String,
    elevation: f64,
    azimuth: f64,
    #[serde(default)]
    tilt: Option<f64>,
    #[serde(default)]
    sync: Option<bool>,
}

/// Reads the station registry CSV: `name,latitude,longitude,elevation,azimuth[,tilt][,sync]`.
/// Lines starting with `#` are comments.
#[derive(Debug, Clone, Default)]
pub struct StationReader;

impl StationReader {
    pub fn new() -> Self {
        Self
    }

    /// Read and validate all stations, keeping file order
    pub fn read_stations(&self, path: &Path) -> Result<Vec<Station>> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .comment(Some(b'#'))
            .from_path(path)?;

        let mut stations = Vec::new();
        let mut seen = HashSet::new();

        for row in reader.deserialize::<StationRow>() {
            let station = self.parse_row(row?)?;

            if !seen.insert(station.name.clone()) {
                return Err(ProcessingError::InvalidFormat(format!(
                    "Duplicate station name: '{}'",
                    station.name
                )));
            }
            stations.push(station);
        }

        Ok(stations)
    }

    fn parse_row(&self, row: StationRow) -> Result<Station> {
        let latitude = parse_coordinate(&row.latitude)?;
        let longitude = parse_coordinate(&row.longitude)?;

        let station = Station::new(&row.name, latitude, longitude, row.elevation, row.azimuth)
            .with_tilt(row.tilt.unwrap_or(0.0))
            .with_sync(row.sync.unwrap_or(true));

        station.validate()?;
        Ok(station)
    }
}
