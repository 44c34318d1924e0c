use crate::error::{ProcessingError, Result};
use crate::utils::constants::EARTH_RADIUS_M;

/// Degrees from `DD:MM:SS[.s]`, optionally signed or with a hemisphere letter.
///
/// ```
/// use so2_flux::utils::dms_to_decimal;
///
/// assert!((dms_to_decimal("14:28:22.8N").unwrap() - 14.473).abs() < 1e-9);
/// assert!((dms_to_decimal("90:52:48W").unwrap() + 90.88).abs() < 1e-9);
/// ```
pub fn dms_to_decimal(dms: &str) -> Result<f64> {
    let invalid = |what: &str| {
        ProcessingError::InvalidCoordinate(format!("{} in '{}', expected DD:MM:SS", what, dms))
    };

    let trimmed = dms.trim();
    let (body, hemisphere_sign) = match trimmed.chars().last() {
        Some('N') | Some('E') => (&trimmed[..trimmed.len() - 1], 1.0),
        Some('S') | Some('W') => (&trimmed[..trimmed.len() - 1], -1.0),
        _ => (trimmed, 1.0),
    };
    let (body, sign) = match body.strip_prefix('-') {
        Some(rest) => (rest, -hemisphere_sign),
        None => (body, hemisphere_sign),
    };

    let fields: Vec<f64> = body
        .split(':')
        .map(|f| f.trim().parse::<f64>().map_err(|_| invalid("Bad number")))
        .collect::<Result<_>>()?;
    let [deg, min, sec] = fields[..] else {
        return Err(invalid("Wrong field count"));
    };

    if deg < 0.0 || !(0.0..60.0).contains(&min) || !(0.0..60.0).contains(&sec) {
        return Err(invalid("Field out of range"));
    }

    Ok(sign * (deg + min / 60.0 + sec / 3600.0))
}

/// Decimal degrees or `DD:MM:SS`
pub fn parse_coordinate(coord_str: &str) -> Result<f64> {
    let trimmed = coord_str.trim();
    if trimmed.contains(':') {
        return dms_to_decimal(trimmed);
    }
    trimmed.parse::<f64>().map_err(|_| {
        ProcessingError::InvalidCoordinate(format!("Invalid coordinate value: '{}'", coord_str))
    })
}

/// A point in a local east/north plane, metres from the projection origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalPoint {
    pub east: f64,
    pub north: f64,
}

impl LocalPoint {
    pub fn new(east: f64, north: f64) -> Self {
        Self { east, north }
    }

    pub fn norm(&self) -> f64 {
        self.east.hypot(self.north)
    }

    /// Bearing from the origin to this point, degrees clockwise from north in [0, 360)
    pub fn bearing(&self) -> f64 {
        normalize_bearing(self.east.atan2(self.north).to_degrees())
    }
}

/// Equirectangular projection about `(origin_lat, origin_lon)`.
///
/// Accurate to well under a percent over the few-kilometre baselines
/// between scanning stations and a vent.
pub fn project_local(origin_lat: f64, origin_lon: f64, lat: f64, lon: f64) -> LocalPoint {
    let east = EARTH_RADIUS_M * (lon - origin_lon).to_radians() * origin_lat.to_radians().cos();
    let north = EARTH_RADIUS_M * (lat - origin_lat).to_radians();
    LocalPoint { east, north }
}

/// Unit vector (east, north) for a bearing in degrees
pub fn bearing_unit(bearing_deg: f64) -> LocalPoint {
    let rad = bearing_deg.to_radians();
    LocalPoint::new(rad.sin(), rad.cos())
}

pub fn normalize_bearing(bearing_deg: f64) -> f64 {
    let b = bearing_deg.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if b >= 360.0 {
        0.0
    } else {
        b
    }
}

/// Calculate the distance between two points using the Haversine formula, in metres
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_M * c
}
