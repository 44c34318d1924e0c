pub mod flux;
pub mod scan;
pub mod station;

pub use flux::{FluxRecord, FluxTable, GeometrySource, PairedObservation, PlumeGeometry};
pub use scan::{FilteredScan, KeptSamples, ScanRecord, ScanSample, ScanVerdict};
pub use station::{Station, VentLocation};
