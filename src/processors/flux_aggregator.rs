use crate::config::AnalysisSettings;
use crate::error::{ProcessingError, Result};
use crate::models::{FluxRecord, FluxTable, PairedObservation, ScanVerdict, Station};
use crate::processors::{
    FluxIntegrator, PlumeGeometryEstimator, QualityFilter, RunReport, StationPairFinder,
    StationReport,
};
use crate::readers::{ScanCatalog, ScanEntry, ScanReader, StationScans};
use crate::utils::filename::day_root;
use crate::utils::progress::ProgressReporter;
use crate::writers::{ExportMode, FluxTableWriter};
use chrono::NaiveDate;
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info, warn};

/// Runs the per-scan pipeline over a day's catalog and exports one table per station.
///
/// Every run is a full recompute over a snapshot of the catalog. Only a
/// catalog-level failure aborts a run; rejected scans, unreadable files,
/// failed pairings and failed exports are recorded and skipped.
pub struct FluxAggregator {
    settings: AnalysisSettings,
    stations: Vec<Station>,
    filter: QualityFilter,
    estimator: PlumeGeometryEstimator,
    integrator: FluxIntegrator,
    reader: ScanReader,
}

impl FluxAggregator {
    pub fn new(settings: AnalysisSettings, stations: Vec<Station>) -> Result<Self> {
        settings.check()?;

        let mut names = HashSet::new();
        for station in &stations {
            if !names.insert(station.name.as_str()) {
                return Err(ProcessingError::Config(format!(
                    "Duplicate station name: {}",
                    station.name
                )));
            }
        }

        Ok(Self {
            filter: QualityFilter::from_settings(&settings),
            estimator: PlumeGeometryEstimator::from_settings(&settings),
            integrator: FluxIntegrator::new(settings.wind_speed),
            reader: ScanReader::new(),
            settings,
            stations,
        })
    }

    pub fn settings(&self) -> &AnalysisSettings {
        &self.settings
    }

    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    fn station(&self, name: &str) -> Option<&Station> {
        self.stations.iter().find(|s| s.name == name)
    }

    /// Catalog, compute and export every participating station for `date`
    pub fn run_day(
        &self,
        results_dir: &Path,
        date: NaiveDate,
        mode: ExportMode,
        progress: Option<&ProgressReporter>,
    ) -> Result<RunReport> {
        let root = day_root(results_dir, date);
        let catalog = ScanCatalog::build(&self.stations, &root)?;
        info!(
            "Cataloged {} scans from {} stations in {}",
            catalog.total_scans(),
            catalog.stations().len(),
            root.display()
        );

        if let Some(p) = progress {
            p.set_length(catalog.total_scans() as u64);
            p.set_message(&format!("Calculating fluxes for {}...", date));
        }

        let writer = FluxTableWriter::with_mode(mode);
        let finder = StationPairFinder::new(&catalog);
        let mut report = RunReport::new(date, root.clone());

        for scans in catalog.stations() {
            let Some((table, mut station_report)) =
                self.compute_station(scans, &finder, date, progress)
            else {
                continue;
            };

            if !scans.present {
                info!("No data for {} today, nothing to export", table.station);
                station_report.scan_dir_missing = true;
                report.stations.push(station_report);
                continue;
            }

            match writer.write_table(&table, &root) {
                Ok(path) => {
                    info!("Wrote {} rows for {} to {}", table.len(), table.station, path.display());
                    station_report.output = Some(path);
                }
                Err(e) => {
                    warn!("Failed to export flux table for {}: {}", table.station, e);
                    station_report.export_error = Some(e.to_string());
                }
            }
            report.stations.push(station_report);
        }

        if let Some(p) = progress {
            p.finish_with_message(&format!(
                "Analysed {} of {} scans",
                report.total_analysed(),
                report.total_scans()
            ));
        }

        Ok(report)
    }

    /// One table per cataloged station, without exporting
    pub fn compute_tables(
        &self,
        catalog: &ScanCatalog,
        date: NaiveDate,
        progress: Option<&ProgressReporter>,
    ) -> Vec<(FluxTable, StationReport)> {
        let finder = StationPairFinder::new(catalog);
        catalog
            .stations()
            .iter()
            .filter_map(|scans| self.compute_station(scans, &finder, date, progress))
            .collect()
    }

    fn compute_station(
        &self,
        scans: &StationScans,
        finder: &StationPairFinder<'_>,
        date: NaiveDate,
        progress: Option<&ProgressReporter>,
    ) -> Option<(FluxTable, StationReport)> {
        let Some(station) = self.station(&scans.station) else {
            warn!("Cataloged station {} is not in the registry", scans.station);
            return None;
        };
        if !station.sync {
            info!("Skipping station {}: not participating", station.name);
            return None;
        }

        let mut table = FluxTable::new(&station.name, date);
        let mut report = StationReport::new(&station.name);

        for entry in &scans.entries {
            table.push(self.process_scan(station, entry, finder, &mut report));
            report.scans += 1;
            if let Some(p) = progress {
                p.increment(1);
            }
        }

        Some((table, report))
    }

    fn process_scan(
        &self,
        station: &Station,
        entry: &ScanEntry,
        finder: &StationPairFinder<'_>,
        report: &mut StationReport,
    ) -> FluxRecord {
        let filtered = match self
            .reader
            .read_scan(&entry.path)
            .and_then(|scan| self.filter.filter(scan))
        {
            Ok(filtered) => filtered,
            Err(e) => {
                warn!("Could not analyse {} from {}: {}", entry.filename, station.name, e);
                report.unreadable += 1;
                return FluxRecord::rejected(entry.timestamp, &entry.filename);
            }
        };

        let peak_angle = match filtered.verdict {
            ScanVerdict::Analyzable { peak_angle } => peak_angle,
            verdict => {
                info!("{} {}: {}", station.name, entry.filename, verdict.reason());
                match verdict {
                    ScanVerdict::RejectedInsufficientPlume => report.rejected_insufficient_plume += 1,
                    _ => report.rejected_low_signal += 1,
                }
                return FluxRecord::rejected(entry.timestamp, &entry.filename);
            }
        };
        report.analysed += 1;

        let observation = self.pair_observation(station, entry, peak_angle, finder);
        if observation.is_paired() {
            report.paired += 1;
        }
        if observation.geometry.is_triangulated() {
            report.triangulated += 1;
        }
        debug!(
            "{} {}: peak {:.1} deg, plume {:.0} m / {:.1} deg ({:?})",
            station.name,
            entry.filename,
            peak_angle,
            observation.geometry.altitude,
            observation.geometry.azimuth,
            observation.geometry.source
        );

        let flux = match self
            .integrator
            .integrate(&filtered.kept_samples(), station, &observation.geometry)
        {
            Ok(estimate) => Some((estimate.flux, estimate.flux_err)),
            Err(e) => {
                warn!("Flux integration failed for {} {}: {}", station.name, entry.filename, e);
                report.integration_failures += 1;
                None
            }
        };

        FluxRecord::analysed(
            entry.timestamp,
            &entry.filename,
            &observation,
            flux,
            self.integrator.wind_speed(),
        )
    }

    /// Pair with the nearest other-station scan, falling back to the default
    /// geometry when pairing is off or the candidate is unusable. The nearest
    /// candidate is the only one tried.
    fn pair_observation(
        &self,
        station: &Station,
        entry: &ScanEntry,
        peak_angle: f64,
        finder: &StationPairFinder<'_>,
    ) -> PairedObservation {
        let unpaired = PairedObservation::unpaired(self.estimator.default_geometry());
        if !self.settings.scan_pair_flag {
            return unpaired;
        }

        let Some(candidate) = finder.find_nearest(&station.name, entry.timestamp) else {
            info!("No scans from other stations to pair with {}", entry.filename);
            return unpaired;
        };
        if !candidate.within(self.settings.scan_pair_time) {
            info!(
                "Nearest pair for {} is {} from {}, {} s away",
                entry.filename,
                candidate.entry.filename,
                candidate.station,
                candidate.delta.num_seconds()
            );
            return unpaired;
        }

        let Some(pair_station) = self.station(candidate.station) else {
            return unpaired;
        };

        let pair_peak = match self
            .reader
            .read_scan(&candidate.entry.path)
            .and_then(|scan| self.filter.filter(scan))
        {
            Ok(filtered) => match filtered.peak_angle() {
                Some(peak) => peak,
                None => {
                    info!(
                        "Pair candidate {} from {} rejected: {}",
                        candidate.entry.filename,
                        candidate.station,
                        filtered.verdict.reason()
                    );
                    return unpaired;
                }
            },
            Err(e) => {
                warn!(
                    "Could not analyse pair candidate {} from {}: {}",
                    candidate.entry.filename, candidate.station, e
                );
                return unpaired;
            }
        };

        let geometry = self
            .estimator
            .estimate(station, peak_angle, pair_station, pair_peak);
        PairedObservation::paired(candidate.station, &candidate.entry.filename, geometry)
    }
}
