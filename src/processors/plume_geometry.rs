use crate::config::AnalysisSettings;
use crate::models::{PlumeGeometry, Station, VentLocation};
use crate::utils::constants::*;
use crate::utils::coordinates::LocalPoint;
use tracing::debug;

/// Two-station plume triangulation, referenced to the vent.
///
/// Each station's peak viewing angle defines a ray inside its vertical scan
/// plane. The horizontal traces of the two rays are intersected; the range
/// from each station to the intersection and its zenith angle give a plume
/// altitude, and the bearing from the vent to the intersection gives the
/// plume direction. Any degenerate configuration, including an altitude at
/// or below the vent, yields the defaults.
#[derive(Debug, Clone)]
pub struct PlumeGeometryEstimator {
    vent: VentLocation,
    default_altitude: f64,
    default_azimuth: f64,
}

impl PlumeGeometryEstimator {
    pub fn new(vent: VentLocation, default_altitude: f64, default_azimuth: f64) -> Self {
        Self {
            vent,
            default_altitude,
            default_azimuth,
        }
    }

    pub fn from_settings(settings: &AnalysisSettings) -> Self {
        Self::new(
            settings.vent,
            settings.default_altitude,
            settings.default_azimuth,
        )
    }

    pub fn default_geometry(&self) -> PlumeGeometry {
        PlumeGeometry::default_values(self.default_altitude, self.default_azimuth)
    }

    /// Triangulated geometry, or the configured defaults
    pub fn estimate(
        &self,
        own_station: &Station,
        own_peak_angle: f64,
        paired_station: &Station,
        paired_peak_angle: f64,
    ) -> PlumeGeometry {
        match self.triangulate(own_station, own_peak_angle, paired_station, paired_peak_angle) {
            Some(geometry) => geometry,
            None => {
                debug!(
                    "Degenerate geometry for {} / {} (peaks {} / {}), using defaults",
                    own_station.name, paired_station.name, own_peak_angle, paired_peak_angle
                );
                self.default_geometry()
            }
        }
    }

    pub fn triangulate(
        &self,
        own_station: &Station,
        own_peak_angle: f64,
        paired_station: &Station,
        paired_peak_angle: f64,
    ) -> Option<PlumeGeometry> {
        let own = ViewingRay::new(own_station, own_peak_angle, &self.vent)?;
        let paired = ViewingRay::new(paired_station, paired_peak_angle, &self.vent)?;

        let denom = cross(own.direction, paired.direction);
        if denom.abs() < PARALLEL_RAY_TOLERANCE {
            return None;
        }

        let offset = LocalPoint::new(
            paired.origin.east - own.origin.east,
            paired.origin.north - own.origin.north,
        );
        let own_range = cross(offset, paired.direction) / denom;
        let paired_range = cross(offset, own.direction) / denom;

        // The plume must lie on the side each station is looking at
        if own_range < 0.0 || paired_range < 0.0 {
            return None;
        }

        let estimates: Vec<f64> = [(&own, own_range), (&paired, paired_range)]
            .iter()
            .filter_map(|(ray, range)| ray.altitude_at(*range))
            .collect();
        if estimates.is_empty() {
            return None;
        }
        let altitude = estimates.iter().sum::<f64>() / estimates.len() as f64;
        // A plume at or below the summit vent means the peaks were misread
        if altitude <= self.vent.elevation {
            return None;
        }

        let intersection = LocalPoint::new(
            own.origin.east + own_range * own.direction.east,
            own.origin.north + own_range * own.direction.north,
        );
        if intersection.norm() < MIN_VENT_OFFSET_M {
            return None;
        }
        let azimuth = intersection.bearing();

        if !altitude.is_finite() || !azimuth.is_finite() {
            return None;
        }

        Some(PlumeGeometry::triangulated(altitude, azimuth))
    }
}

/// Horizontal trace of a station's peak viewing ray
struct ViewingRay {
    origin: LocalPoint,
    direction: LocalPoint,
    elevation: f64,
    tan_zenith: f64,
}

impl ViewingRay {
    fn new(station: &Station, scan_angle: f64, vent: &VentLocation) -> Option<Self> {
        let zenith = station.zenith_angle(scan_angle);
        if !zenith.is_finite() || zenith.abs() >= 90.0 {
            return None;
        }

        let plane = station.plane_direction();
        let sign = if zenith < 0.0 { -1.0 } else { 1.0 };

        Some(Self {
            origin: station.local_position(vent),
            direction: LocalPoint::new(sign * plane.east, sign * plane.north),
            elevation: station.elevation,
            tan_zenith: zenith.to_radians().tan().abs(),
        })
    }

    /// Altitude where the ray has travelled `range` metres horizontally
    fn altitude_at(&self, range: f64) -> Option<f64> {
        if self.tan_zenith < ZENITH_TAN_TOLERANCE {
            return None;
        }
        Some(self.elevation + range / self.tan_zenith)
    }
}

fn cross(a: LocalPoint, b: LocalPoint) -> f64 {
    a.east * b.north - a.north * b.east
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::constants::EARTH_RADIUS_M;
    use crate::models::GeometrySource;
    use approx::assert_relative_eq;

    fn vent() -> VentLocation {
        VentLocation::new(14.473, -90.880, 3763.0)
    }

    /// Station placed `east`/`north` metres from the vent
    fn station_at(name: &str, east: f64, north: f64, elevation: f64, azimuth: f64) -> Station {
        let v = vent();
        let lat = v.latitude + (north / EARTH_RADIUS_M).to_degrees();
        let lon = v.longitude + (east / (EARTH_RADIUS_M * v.latitude.to_radians().cos())).to_degrees();
        Station::new(name, lat, lon, elevation, azimuth)
    }

    /// Scan angle at which `station` sees a point `range` metres away along its plane at `altitude`
    fn angle_to(station: &Station, range: f64, altitude: f64) -> f64 {
        (range / (altitude - station.elevation)).atan().to_degrees()
    }

    fn estimator() -> PlumeGeometryEstimator {
        PlumeGeometryEstimator::new(vent(), 1000.0, 45.0)
    }

    #[test]
    fn test_triangulation_recovers_plume() {
        // Plume point 2 km east, 4 km south of the vent at 4500 m
        let a = station_at("A", 0.0, -4000.0, 1500.0, 90.0);
        let b = station_at("B", 2000.0, -9000.0, 1200.0, 0.0);

        let peak_a = angle_to(&a, 2000.0, 4500.0);
        let peak_b = angle_to(&b, 5000.0, 4500.0);

        let geometry = estimator().estimate(&a, peak_a, &b, peak_b);

        assert_eq!(geometry.source, GeometrySource::Triangulated);
        assert_relative_eq!(geometry.altitude, 4500.0, max_relative = 1e-6);
        let expected_az = 2000.0f64.atan2(-4000.0).to_degrees();
        assert_relative_eq!(geometry.azimuth, expected_az, epsilon = 1e-6);
    }

    #[test]
    fn test_negative_angles_look_backwards() {
        // Same plume point, station A now east of it looking west via a negative angle
        let a = station_at("A", 5000.0, -4000.0, 1500.0, 90.0);
        let b = station_at("B", 2000.0, -9000.0, 1200.0, 0.0);

        let peak_a = -angle_to(&a, 3000.0, 4500.0);
        let peak_b = angle_to(&b, 5000.0, 4500.0);

        let geometry = estimator().estimate(&a, peak_a, &b, peak_b);
        assert!(geometry.is_triangulated());
        assert_relative_eq!(geometry.altitude, 4500.0, max_relative = 1e-6);
    }

    #[test]
    fn test_parallel_planes_fall_back() {
        let a = station_at("A", 0.0, -4000.0, 1500.0, 90.0);
        let b = station_at("B", 0.0, -6000.0, 1500.0, 90.0);

        let geometry = estimator().estimate(&a, 20.0, &b, 25.0);
        assert_eq!(geometry, PlumeGeometry::default_values(1000.0, 45.0));
    }

    #[test]
    fn test_intersection_behind_station_falls_back() {
        let a = station_at("A", 0.0, -4000.0, 1500.0, 90.0);
        let b = station_at("B", 2000.0, -9000.0, 1200.0, 0.0);

        // A looks west, away from B's plane
        let geometry = estimator().estimate(&a, -20.0, &b, 30.0);
        assert_eq!(geometry.source, GeometrySource::Default);
        assert_eq!(geometry.altitude, 1000.0);
        assert_eq!(geometry.azimuth, 45.0);
    }

    #[test]
    fn test_horizontal_ray_falls_back() {
        let a = station_at("A", 0.0, -4000.0, 1500.0, 90.0);
        let b = station_at("B", 2000.0, -9000.0, 1200.0, 0.0);

        assert!(estimator().triangulate(&a, 90.0, &b, 30.0).is_none());
        assert!(estimator().triangulate(&a, f64::NAN, &b, 30.0).is_none());
    }

    #[test]
    fn test_plume_below_vent_falls_back() {
        // Geometrically consistent intersection, but 500 m under the 3763 m vent
        let a = station_at("A", 0.0, -4000.0, 1500.0, 90.0);
        let b = station_at("B", 2000.0, -9000.0, 1200.0, 0.0);
        let peak_a = angle_to(&a, 2000.0, 3263.0);
        let peak_b = angle_to(&b, 5000.0, 3263.0);

        assert!(estimator().triangulate(&a, peak_a, &b, peak_b).is_none());
        let geometry = estimator().estimate(&a, peak_a, &b, peak_b);
        assert_eq!(geometry, PlumeGeometry::default_values(1000.0, 45.0));

        // Same rays with a lower vent triangulate normally
        let low_vent = PlumeGeometryEstimator::new(VentLocation { elevation: 3000.0, ..vent() }, 1000.0, 45.0);
        let geometry = low_vent.estimate(&a, peak_a, &b, peak_b);
        assert!(geometry.is_triangulated());
        assert_relative_eq!(geometry.altitude, 3263.0, max_relative = 1e-6);
    }

    #[test]
    fn test_overhead_ray_uses_other_station() {
        // A sees the plume straight overhead; B's range gives the altitude
        let a = station_at("A", 2000.0, -4000.0, 1500.0, 90.0);
        let b = station_at("B", 2000.0, -9000.0, 1200.0, 0.0);
        let peak_b = angle_to(&b, 5000.0, 4500.0);

        let geometry = estimator().estimate(&a, 0.0, &b, peak_b);
        assert!(geometry.is_triangulated());
        assert_relative_eq!(geometry.altitude, 4500.0, max_relative = 1e-6);
    }
}
