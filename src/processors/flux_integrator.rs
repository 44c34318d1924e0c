use crate::error::{ProcessingError, Result};
use crate::models::{KeptSamples, PlumeGeometry, Station};
use crate::utils::constants::*;
use serde::Serialize;

/// molec/cm2 -> kg/m2 for SO2
pub const SO2_SCD_TO_KG_M2: f64 = CM2_PER_M2 * SO2_MOLAR_MASS_KG / AVOGADRO;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FluxEstimate {
    /// kg/s
    pub flux: f64,
    /// kg/s, one sigma
    pub flux_err: f64,
}

/// Integrates a scan's column profile across the plume into a mass flux
#[derive(Debug, Clone)]
pub struct FluxIntegrator {
    wind_speed: f64,
}

impl FluxIntegrator {
    pub fn new(wind_speed: f64) -> Self {
        Self { wind_speed }
    }

    pub fn wind_speed(&self) -> f64 {
        self.wind_speed
    }

    /// Flux through the station's scan plane.
    ///
    /// Each sample at zenith angle `z` maps to a horizontal position
    /// `h * tan(z)` along the scan plane, where `h` is the plume height above
    /// the station; only the component across the plume direction counts.
    /// Slant columns are converted to vertical columns with `cos(z)` and
    /// integrated with the trapezium rule. The uncertainty uses the same
    /// weights on the per-sample errors, added in quadrature.
    pub fn integrate(
        &self,
        samples: &KeptSamples,
        station: &Station,
        geometry: &PlumeGeometry,
    ) -> Result<FluxEstimate> {
        if samples.angles.is_empty() {
            return Err(ProcessingError::Integration(
                "no samples to integrate".to_string(),
            ));
        }

        let height = geometry.altitude - station.elevation;
        if !(height > 0.0) {
            return Err(ProcessingError::Integration(format!(
                "plume altitude {} m is not above station {} at {} m",
                geometry.altitude, station.name, station.elevation
            )));
        }

        let across = (station.azimuth - geometry.azimuth).to_radians().sin().abs();
        if across < PARALLEL_PLUME_TOLERANCE {
            return Err(ProcessingError::Integration(format!(
                "scan plane of {} (azimuth {}) is parallel to the plume (azimuth {})",
                station.name, station.azimuth, geometry.azimuth
            )));
        }

        let mut profile: Vec<ProfilePoint> = samples
            .angles
            .iter()
            .zip(samples.so2.iter())
            .zip(samples.so2_err.iter())
            .filter_map(|((&angle, &so2), &err)| {
                let zenith = station.zenith_angle(angle);
                if !zenith.is_finite() || zenith.abs() >= 90.0 {
                    return None;
                }
                let z = zenith.to_radians();
                Some(ProfilePoint {
                    distance: height * z.tan() * across,
                    column: so2 * z.cos() * SO2_SCD_TO_KG_M2,
                    column_err: err * z.cos() * SO2_SCD_TO_KG_M2,
                })
            })
            .collect();

        if profile.is_empty() {
            return Err(ProcessingError::Integration(
                "no samples above the horizon".to_string(),
            ));
        }
        profile.sort_by(|a, b| a.distance.total_cmp(&b.distance));

        let distances: Vec<f64> = profile.iter().map(|p| p.distance).collect();
        let weights = trapezium_weights(&distances);

        let mut column_integral = 0.0;
        let mut variance = 0.0;
        for (point, w) in profile.iter().zip(weights.iter()) {
            column_integral += w * point.column;
            variance += (w * point.column_err).powi(2);
        }

        Ok(FluxEstimate {
            flux: self.wind_speed * column_integral,
            flux_err: self.wind_speed * variance.sqrt(),
        })
    }
}

struct ProfilePoint {
    distance: f64,
    column: f64,
    column_err: f64,
}

/// Trapezium-rule weights for samples at sorted positions `x`
pub fn trapezium_weights(x: &[f64]) -> Vec<f64> {
    let n = x.len();
    let mut weights = vec![0.0; n];
    for i in 1..n {
        let half_step = 0.5 * (x[i] - x[i - 1]);
        weights[i - 1] += half_step;
        weights[i] += half_step;
    }
    weights
}
