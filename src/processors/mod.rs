pub mod flux_aggregator;
pub mod flux_integrator;
pub mod pair_finder;
pub mod plume_geometry;
pub mod quality_filter;
pub mod run_report;

pub use flux_aggregator::FluxAggregator;
pub use flux_integrator::{FluxEstimate, FluxIntegrator};
pub use pair_finder::{PairCandidate, StationPairFinder};
pub use plume_geometry::PlumeGeometryEstimator;
pub use quality_filter::{find_peak_angle, QualityFilter};
pub use run_report::{RunReport, StationReport};
