use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeometrySource {
    Triangulated,
    Default,
}

/// Resolved plume altitude (m asl) and direction (deg from north)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlumeGeometry {
    pub altitude: f64,
    pub azimuth: f64,
    pub source: GeometrySource,
}

impl PlumeGeometry {
    pub fn triangulated(altitude: f64, azimuth: f64) -> Self {
        Self {
            altitude,
            azimuth,
            source: GeometrySource::Triangulated,
        }
    }

    pub fn default_values(altitude: f64, azimuth: f64) -> Self {
        Self {
            altitude,
            azimuth,
            source: GeometrySource::Default,
        }
    }

    pub fn is_triangulated(&self) -> bool {
        self.source == GeometrySource::Triangulated
    }
}

/// Geometry used for one scan, with the pairing that produced it (if any)
#[derive(Debug, Clone, PartialEq)]
pub struct PairedObservation {
    pub pair_station: Option<String>,
    pub pair_file: Option<String>,
    pub geometry: PlumeGeometry,
}

impl PairedObservation {
    pub fn unpaired(geometry: PlumeGeometry) -> Self {
        Self {
            pair_station: None,
            pair_file: None,
            geometry,
        }
    }

    pub fn paired(station: &str, file: &str, geometry: PlumeGeometry) -> Self {
        Self {
            pair_station: Some(station.to_string()),
            pair_file: Some(file.to_string()),
            geometry,
        }
    }

    pub fn is_paired(&self) -> bool {
        self.pair_station.is_some()
    }
}

/// One row of a station's daily flux table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FluxRecord {
    #[serde(rename = "Time [UTC]", with = "flux_time")]
    pub time: NaiveDateTime,

    #[serde(rename = "Scan File")]
    pub scan_file: String,

    #[serde(rename = "Pair Station")]
    pub pair_station: Option<String>,

    #[serde(rename = "Pair File")]
    pub pair_file: Option<String>,

    #[serde(rename = "Flux [kg/s]")]
    pub flux: Option<f64>,

    #[serde(rename = "Flux Err [kg/s]")]
    pub flux_err: Option<f64>,

    #[serde(rename = "Plume Altitude [m]")]
    pub plume_altitude: Option<f64>,

    #[serde(rename = "Plume Direction [deg]")]
    pub plume_azimuth: Option<f64>,

    #[serde(rename = "Wind Speed [m/s]")]
    pub wind_speed: Option<f64>,
}

impl FluxRecord {
    /// Row for a scan that was not analysed: only time and file are filled
    pub fn rejected(time: NaiveDateTime, scan_file: &str) -> Self {
        Self {
            time,
            scan_file: scan_file.to_string(),
            pair_station: None,
            pair_file: None,
            flux: None,
            flux_err: None,
            plume_altitude: None,
            plume_azimuth: None,
            wind_speed: None,
        }
    }

    /// Row for an analysed scan. `flux` is `None` when integration failed.
    pub fn analysed(
        time: NaiveDateTime,
        scan_file: &str,
        observation: &PairedObservation,
        flux: Option<(f64, f64)>,
        wind_speed: f64,
    ) -> Self {
        Self {
            time,
            scan_file: scan_file.to_string(),
            pair_station: observation.pair_station.clone(),
            pair_file: observation.pair_file.clone(),
            flux: flux.map(|(f, _)| f),
            flux_err: flux.map(|(_, e)| e),
            plume_altitude: Some(observation.geometry.altitude),
            plume_azimuth: Some(observation.geometry.azimuth),
            wind_speed: Some(wind_speed),
        }
    }

    pub fn has_flux(&self) -> bool {
        self.flux.is_some()
    }

    pub fn is_paired(&self) -> bool {
        self.pair_station.is_some()
    }
}

/// All rows for one station and day, in scan order
#[derive(Debug, Clone, PartialEq)]
pub struct FluxTable {
    pub station: String,
    pub date: NaiveDate,
    pub records: Vec<FluxRecord>,
}

impl FluxTable {
    pub fn new(station: &str, date: NaiveDate) -> Self {
        Self {
            station: station.to_string(),
            date,
            records: Vec::new(),
        }
    }

    pub fn from_records(station: &str, date: NaiveDate, records: Vec<FluxRecord>) -> Self {
        Self {
            station: station.to_string(),
            date,
            records,
        }
    }

    pub fn push(&mut self, record: FluxRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Rows whose scan passed the quality filter
    pub fn analysed_count(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.plume_altitude.is_some())
            .count()
    }

    pub fn flux_count(&self) -> usize {
        self.records.iter().filter(|r| r.has_flux()).count()
    }

    pub fn paired_count(&self) -> usize {
        self.records.iter().filter(|r| r.is_paired()).count()
    }

    pub fn mean_flux(&self) -> Option<f64> {
        let fluxes: Vec<f64> = self.records.iter().filter_map(|r| r.flux).collect();
        if fluxes.is_empty() {
            None
        } else {
            Some(fluxes.iter().sum::<f64>() / fluxes.len() as f64)
        }
    }

    pub fn max_flux(&self) -> Option<f64> {
        self.records
            .iter()
            .filter_map(|r| r.flux)
            .fold(None, |acc, f| Some(acc.map_or(f, |m: f64| m.max(f))))
    }
}

mod flux_time {
    use crate::utils::constants::FLUX_TIME_FORMAT;
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&time.format(FLUX_TIME_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let s = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&s, FLUX_TIME_FORMAT).map_err(serde::de::Error::custom)
    }
}
