pub mod flux_writer;

pub use flux_writer::{ExportMode, FluxTableWriter};
