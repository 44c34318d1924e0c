/// Directory names
pub const SO2_DIR: &str = "so2";

/// Scan timestamp formats (filename prefix)
pub const SCAN_TIME_FORMAT: &str = "%Y%m%d_%H%M%S";
pub const SCAN_TIME_FORMAT_COMPACT: &str = "%Y%m%d%H%M%S";
pub const SCAN_TIME_LEN: usize = 15;
pub const SCAN_TIME_LEN_COMPACT: usize = 14;

/// Output table
pub const FLUX_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub const FLUX_TABLE_COLUMNS: [&str; 9] = [
    "Time [UTC]",
    "Scan File",
    "Pair Station",
    "Pair File",
    "Flux [kg/s]",
    "Flux Err [kg/s]",
    "Plume Altitude [m]",
    "Plume Direction [deg]",
    "Wind Speed [m/s]",
];

/// Quality filter
pub const MIN_PLUME_SAMPLES: usize = 10;

/// Physical constants
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;
pub const SO2_MOLAR_MASS_KG: f64 = 0.064066;
pub const AVOGADRO: f64 = 6.022_140_76e23;
pub const CM2_PER_M2: f64 = 1.0e4;

/// Geometry tolerances
pub const PARALLEL_RAY_TOLERANCE: f64 = 1.0e-6;
pub const ZENITH_TAN_TOLERANCE: f64 = 1.0e-9;
pub const MIN_VENT_OFFSET_M: f64 = 1.0;
pub const PARALLEL_PLUME_TOLERANCE: f64 = 1.0e-3;

/// Processing defaults
pub const DEFAULT_MIN_SCD: f64 = -1.0e17;
pub const DEFAULT_MAX_SCD: f64 = 1.0e20;
pub const DEFAULT_MIN_INT: f64 = 500.0;
pub const DEFAULT_MAX_INT: f64 = 60000.0;
pub const DEFAULT_PLUME_SCD: f64 = 1.0e17;
pub const DEFAULT_GOOD_SCAN_LIM: f64 = 0.2;
pub const DEFAULT_SG_WINDOW: usize = 11;
pub const DEFAULT_SG_POLYN: usize = 3;
pub const DEFAULT_SCAN_PAIR_TIME_MIN: f64 = 5.0;
pub const DEFAULT_ALTITUDE_M: f64 = 1000.0;
pub const DEFAULT_AZIMUTH_DEG: f64 = 0.0;
pub const DEFAULT_WIND_SPEED: f64 = 10.0;

/// Environment prefix for settings overrides
pub const SETTINGS_ENV_PREFIX: &str = "SO2FLUX";
