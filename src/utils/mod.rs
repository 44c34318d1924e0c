pub mod constants;
pub mod coordinates;
pub mod filename;
pub mod progress;
pub mod smoothing;

pub use constants::*;
pub use coordinates::{dms_to_decimal, parse_coordinate, project_local, LocalPoint};
pub use filename::{
    day_root, flux_table_path, parse_flux_table_filename, parse_scan_timestamp, station_scan_dir,
};
pub use progress::ProgressReporter;
pub use smoothing::SavitzkyGolay;
