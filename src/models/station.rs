use crate::utils::coordinates::{bearing_unit, project_local, LocalPoint};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// A fixed scanning spectrometer station.
///
/// The scan fan sweeps a vertical plane whose horizontal trace points along
/// `azimuth`; scan angles are measured from zenith within that plane, positive
/// towards `azimuth`. `tilt` is the mounting offset added to every recorded angle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Station {
    #[validate(length(min = 1))]
    pub name: String,

    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,

    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,

    pub elevation: f64,

    #[validate(range(min = 0.0, max = 360.0))]
    pub azimuth: f64,

    #[serde(default)]
    #[validate(range(min = -90.0, max = 90.0))]
    pub tilt: f64,

    #[serde(default = "default_sync")]
    pub sync: bool,
}

fn default_sync() -> bool {
    true
}

impl Station {
    pub fn new(name: &str, latitude: f64, longitude: f64, elevation: f64, azimuth: f64) -> Self {
        Self {
            name: name.to_string(),
            latitude,
            longitude,
            elevation,
            azimuth,
            tilt: 0.0,
            sync: true,
        }
    }

    pub fn with_tilt(mut self, tilt: f64) -> Self {
        self.tilt = tilt;
        self
    }

    pub fn with_sync(mut self, sync: bool) -> Self {
        self.sync = sync;
        self
    }

    /// Zenith angle of a recorded scan angle, in degrees
    pub fn zenith_angle(&self, scan_angle: f64) -> f64 {
        scan_angle + self.tilt
    }

    /// Position in the local plane centred on the vent
    pub fn local_position(&self, vent: &VentLocation) -> LocalPoint {
        project_local(vent.latitude, vent.longitude, self.latitude, self.longitude)
    }

    /// Horizontal unit vector of the scan plane, pointing towards positive angles
    pub fn plane_direction(&self) -> LocalPoint {
        bearing_unit(self.azimuth)
    }
}

/// Reference point for plume geometry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
pub struct VentLocation {
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,

    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,

    #[serde(default)]
    pub elevation: f64,
}

impl VentLocation {
    pub fn new(latitude: f64, longitude: f64, elevation: f64) -> Self {
        Self {
            latitude,
            longitude,
            elevation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_station_validation() {
        let station = Station::new("ENS", 14.4200, -90.8600, 1900.0, 135.0);
        assert!(station.validate().is_ok());
        assert!(station.sync);

        let invalid = Station::new("ENS", 91.0, -90.8600, 1900.0, 135.0);
        assert!(invalid.validate().is_err());

        let unnamed = Station::new("", 14.4200, -90.8600, 1900.0, 135.0);
        assert!(unnamed.validate().is_err());
    }

    #[test]
    fn test_zenith_angle_applies_tilt() {
        let station = Station::new("ENS", 14.42, -90.86, 1900.0, 135.0).with_tilt(-2.5);
        assert_eq!(station.zenith_angle(10.0), 7.5);
    }

    #[test]
    fn test_local_position_relative_to_vent() {
        let vent = VentLocation::new(14.473, -90.880, 3763.0);
        let north = Station::new("N", 14.500, -90.880, 2000.0, 90.0);
        let p = north.local_position(&vent);
        assert!(p.east.abs() < 1e-6);
        assert!((p.north - 3002.3).abs() < 1.0);
    }
}
