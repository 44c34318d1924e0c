pub mod scan_catalog;
pub mod scan_reader;
pub mod station_reader;

pub use scan_catalog::{ScanCatalog, ScanEntry, StationScans};
pub use scan_reader::ScanReader;
pub use station_reader::StationReader;
