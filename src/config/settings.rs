use crate::error::Result;
use crate::models::VentLocation;
use crate::utils::constants::*;
use ::config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use validator::{Validate, ValidationError};

/// Tunables of the flux pipeline.
///
/// Loaded from a TOML file, then overridden by `SO2FLUX_<FIELD>` environment
/// variables. Everything except the vent location has a default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_settings"))]
pub struct AnalysisSettings {
    /// Lowest accepted SO2 slant column (molec/cm2)
    #[serde(default = "default_min_scd")]
    pub min_scd: f64,

    /// Highest accepted SO2 slant column (molec/cm2)
    #[serde(default = "default_max_scd")]
    pub max_scd: f64,

    /// Lowest accepted averaged intensity (counts)
    #[serde(default = "default_min_int")]
    pub min_int: f64,

    /// Highest accepted averaged intensity (counts)
    #[serde(default = "default_max_int")]
    pub max_int: f64,

    /// Slant column above which a sample counts as in-plume
    #[serde(default = "default_plume_scd")]
    pub plume_scd: f64,

    /// Largest fraction of out-of-bounds samples a scan may have
    #[serde(default = "default_good_scan_lim")]
    #[validate(range(min = 0.0, max = 1.0))]
    pub good_scan_lim: f64,

    #[serde(default = "default_sg_window")]
    #[validate(range(min = 1))]
    pub sg_window: usize,

    #[serde(default = "default_sg_polyn")]
    pub sg_polyn: usize,

    /// Largest time gap for two scans to pair, in minutes (exclusive)
    #[serde(default = "default_scan_pair_time")]
    pub scan_pair_time: f64,

    #[serde(default = "default_scan_pair_flag")]
    pub scan_pair_flag: bool,

    /// Plume altitude used without a triangulation (m asl)
    #[serde(default = "default_altitude")]
    pub default_altitude: f64,

    /// Plume direction used without a triangulation (deg from north)
    #[serde(default = "default_azimuth")]
    #[validate(range(min = 0.0, max = 360.0))]
    pub default_azimuth: f64,

    #[serde(default = "default_wind_speed")]
    #[validate(range(min = 0.0))]
    pub wind_speed: f64,

    pub vent: VentLocation,
}

fn default_min_scd() -> f64 {
    DEFAULT_MIN_SCD
}

fn default_max_scd() -> f64 {
    DEFAULT_MAX_SCD
}

fn default_min_int() -> f64 {
    DEFAULT_MIN_INT
}

fn default_max_int() -> f64 {
    DEFAULT_MAX_INT
}

fn default_plume_scd() -> f64 {
    DEFAULT_PLUME_SCD
}

fn default_good_scan_lim() -> f64 {
    DEFAULT_GOOD_SCAN_LIM
}

fn default_sg_window() -> usize {
    DEFAULT_SG_WINDOW
}

fn default_sg_polyn() -> usize {
    DEFAULT_SG_POLYN
}

fn default_scan_pair_time() -> f64 {
    DEFAULT_SCAN_PAIR_TIME_MIN
}

fn default_scan_pair_flag() -> bool {
    true
}

fn default_altitude() -> f64 {
    DEFAULT_ALTITUDE_M
}

fn default_azimuth() -> f64 {
    DEFAULT_AZIMUTH_DEG
}

fn default_wind_speed() -> f64 {
    DEFAULT_WIND_SPEED
}

fn validate_settings(settings: &AnalysisSettings) -> std::result::Result<(), ValidationError> {
    if settings.sg_window % 2 == 0 {
        return Err(ValidationError::new("sg_window_must_be_odd"));
    }
    if settings.sg_polyn >= settings.sg_window {
        return Err(ValidationError::new("sg_polyn_must_be_less_than_window"));
    }
    if settings.min_scd > settings.max_scd {
        return Err(ValidationError::new("min_scd_above_max_scd"));
    }
    if settings.min_int > settings.max_int {
        return Err(ValidationError::new("min_int_above_max_int"));
    }
    if !(settings.scan_pair_time > 0.0) {
        return Err(ValidationError::new("scan_pair_time_must_be_positive"));
    }
    Ok(())
}

impl AnalysisSettings {
    pub fn new(vent: VentLocation) -> Self {
        Self {
            min_scd: DEFAULT_MIN_SCD,
            max_scd: DEFAULT_MAX_SCD,
            min_int: DEFAULT_MIN_INT,
            max_int: DEFAULT_MAX_INT,
            plume_scd: DEFAULT_PLUME_SCD,
            good_scan_lim: DEFAULT_GOOD_SCAN_LIM,
            sg_window: DEFAULT_SG_WINDOW,
            sg_polyn: DEFAULT_SG_POLYN,
            scan_pair_time: DEFAULT_SCAN_PAIR_TIME_MIN,
            scan_pair_flag: true,
            default_altitude: DEFAULT_ALTITUDE_M,
            default_azimuth: DEFAULT_AZIMUTH_DEG,
            wind_speed: DEFAULT_WIND_SPEED,
            vent,
        }
    }

    /// Load settings from a TOML file with environment overrides
    pub fn load(path: &Path) -> Result<Self> {
        let settings: AnalysisSettings = Config::builder()
            .add_source(File::from(path))
            .add_source(Environment::with_prefix(SETTINGS_ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize()?;

        settings.check()?;
        Ok(settings)
    }

    /// Run field, cross-field and vent validation
    pub fn check(&self) -> Result<()> {
        self.validate()?;
        self.vent.validate()?;
        Ok(())
    }

    pub fn with_pairing(mut self, enabled: bool) -> Self {
        self.scan_pair_flag = enabled;
        self
    }

    pub fn with_pair_window(mut self, minutes: f64) -> Self {
        self.scan_pair_time = minutes;
        self
    }

    pub fn with_smoothing(mut self, window: usize, order: usize) -> Self {
        self.sg_window = window;
        self.sg_polyn = order;
        self
    }

    pub fn with_defaults(mut self, altitude: f64, azimuth: f64) -> Self {
        self.default_altitude = altitude;
        self.default_azimuth = azimuth;
        self
    }

    pub fn with_wind_speed(mut self, wind_speed: f64) -> Self {
        self.wind_speed = wind_speed;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    fn vent() -> VentLocation {
        VentLocation::new(14.473, -90.880, 3763.0)
    }

    #[test]
    fn test_defaults_are_valid() {
        let settings = AnalysisSettings::new(vent());
        assert!(settings.check().is_ok());
        assert_eq!(settings.sg_window, 11);
        assert_eq!(settings.good_scan_lim, 0.2);
    }

    #[test]
    fn test_invalid_smoothing_rejected() {
        let even = AnalysisSettings::new(vent()).with_smoothing(10, 3);
        assert!(even.check().is_err());

        let high_order = AnalysisSettings::new(vent()).with_smoothing(5, 5);
        assert!(high_order.check().is_err());
    }

    #[test]
    fn test_invalid_bounds_rejected() {
        let mut settings = AnalysisSettings::new(vent());
        settings.good_scan_lim = 1.5;
        assert!(settings.check().is_err());

        let mut settings = AnalysisSettings::new(vent());
        settings.min_int = 70000.0;
        assert!(settings.check().is_err());

        let settings = AnalysisSettings::new(vent()).with_pair_window(0.0);
        assert!(settings.check().is_err());

        let settings = AnalysisSettings::new(VentLocation::new(95.0, 0.0, 0.0));
        assert!(settings.check().is_err());
    }

    #[test]
    fn test_load_from_toml() -> Result<()> {
        let mut file = Builder::new().suffix(".toml").tempfile()?;
        writeln!(file, "plume_scd = 2e17")?;
        writeln!(file, "sg_window = 7")?;
        writeln!(file, "scan_pair_flag = false")?;
        writeln!(file, "wind_speed = 6.5")?;
        writeln!(file, "[vent]")?;
        writeln!(file, "latitude = 14.473")?;
        writeln!(file, "longitude = -90.880")?;
        writeln!(file, "elevation = 3763.0")?;
        file.flush()?;

        let settings = AnalysisSettings::load(file.path())?;

        assert_eq!(settings.plume_scd, 2e17);
        assert_eq!(settings.sg_window, 7);
        assert!(!settings.scan_pair_flag);
        assert_eq!(settings.wind_speed, 6.5);
        assert_eq!(settings.vent, vent());
        assert_eq!(settings.max_int, DEFAULT_MAX_INT);

        Ok(())
    }

    #[test]
    fn test_load_requires_vent() -> Result<()> {
        let mut file = Builder::new().suffix(".toml").tempfile()?;
        writeln!(file, "wind_speed = 6.5")?;
        file.flush()?;

        assert!(AnalysisSettings::load(file.path()).is_err());
        Ok(())
    }
}
