use crate::cli::args::{Cli, Commands, RunArgs};
use crate::config::AnalysisSettings;
use crate::error::{ProcessingError, Result};
use crate::models::FluxTable;
use crate::processors::{FluxAggregator, RunReport};
use crate::readers::StationReader;
use crate::utils::filename::parse_flux_table_filename;
use crate::utils::progress::ProgressReporter;
use crate::writers::{ExportMode, FluxTableWriter};
use chrono::{NaiveDate, Utc};
use serde::Serialize;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{info, warn, Level};

pub async fn run(cli: Cli) -> Result<()> {
    init_logging(cli.verbose, cli.log_file.as_deref())?;

    match cli.command {
        Commands::Process { run } => {
            let job = FluxJob::prepare(&run)?;
            if !run.json {
                println!("Processing SO2 scans...");
                println!("Results directory: {}", run.results_dir.display());
                println!("Stations: {}", job.aggregator.stations().len());
            }

            let report = job.run_once(!run.json).await?;
            print_report(&report, run.json)?;

            if report.export_failures() > 0 {
                warn!("{} flux tables could not be written", report.export_failures());
            }
        }

        Commands::Watch { run, interval_secs } => {
            let job = FluxJob::prepare(&run)?;
            info!(
                "Watching {} every {} s (Ctrl-C to stop)",
                run.results_dir.display(),
                interval_secs
            );

            let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        match job.run_once(false).await {
                            Ok(report) => print_report(&report, run.json)?,
                            // The day's folder may not exist yet
                            Err(e) => warn!("Flux run failed: {}", e),
                        }
                    }
                    _ = tokio::signal::ctrl_c() => {
                        info!("Stopping watch");
                        break;
                    }
                }
            }
        }

        Commands::Info { file, json } => {
            let writer = FluxTableWriter::new();
            let records = writer.read_table(&file)?;

            let name = file
                .file_name()
                .and_then(|f| f.to_str())
                .unwrap_or_default();
            let (date, station, reanalysed) = parse_flux_table_filename(name).ok_or_else(|| {
                ProcessingError::InvalidFormat(format!("Not a flux table name: {}", name))
            })?;

            let table = FluxTable::from_records(&station, date, records);
            let summary = TableSummary::new(&file, &table, reanalysed);

            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!("{}", summary);
            }
        }
    }

    Ok(())
}

/// One configured aggregator plus where and how to run it
struct FluxJob {
    aggregator: Arc<FluxAggregator>,
    results_dir: PathBuf,
    date: Option<NaiveDate>,
    mode: ExportMode,
}

impl FluxJob {
    fn prepare(args: &RunArgs) -> Result<Self> {
        let settings = AnalysisSettings::load(&args.settings)?;
        let stations = StationReader::new().read_stations(&args.stations)?;
        info!(
            "Loaded {} stations from {}",
            stations.len(),
            args.stations.display()
        );

        let mode = if args.reanalyse {
            ExportMode::Reanalysis
        } else {
            ExportMode::RealTime
        };

        Ok(Self {
            aggregator: Arc::new(FluxAggregator::new(settings, stations)?),
            results_dir: args.results_dir.clone(),
            date: args.date,
            mode,
        })
    }

    /// Without an explicit date every run follows the current UTC day
    fn date(&self) -> NaiveDate {
        self.date.unwrap_or_else(|| Utc::now().date_naive())
    }

    async fn run_once(&self, show_progress: bool) -> Result<RunReport> {
        let aggregator = Arc::clone(&self.aggregator);
        let results_dir = self.results_dir.clone();
        let date = self.date();
        let mode = self.mode;

        tokio::task::spawn_blocking(move || {
            let progress = ProgressReporter::new(0, "Cataloging scans...", !show_progress);
            aggregator.run_day(&results_dir, date, mode, Some(&progress))
        })
        .await?
    }
}

fn print_report(report: &RunReport, json: bool) -> Result<()> {
    if json {
        println!("{}", report.to_json()?);
    } else {
        println!("\n{}", report.summary());
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct TableSummary {
    file: PathBuf,
    station: String,
    date: NaiveDate,
    reanalysed: bool,
    rows: usize,
    analysed: usize,
    with_flux: usize,
    paired: usize,
    mean_flux: Option<f64>,
    max_flux: Option<f64>,
}

impl TableSummary {
    fn new(file: &Path, table: &FluxTable, reanalysed: bool) -> Self {
        Self {
            file: file.to_path_buf(),
            station: table.station.clone(),
            date: table.date,
            reanalysed,
            rows: table.len(),
            analysed: table.analysed_count(),
            with_flux: table.flux_count(),
            paired: table.paired_count(),
            mean_flux: table.mean_flux(),
            max_flux: table.max_flux(),
        }
    }
}

impl std::fmt::Display for TableSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Flux table: {}", self.file.display())?;
        writeln!(
            f,
            "Station {} on {}{}",
            self.station,
            self.date,
            if self.reanalysed { " (reanalysed)" } else { "" }
        )?;
        writeln!(
            f,
            "Scans: {}, analysed: {}, with flux: {}, paired: {}",
            self.rows, self.analysed, self.with_flux, self.paired
        )?;
        match (self.mean_flux, self.max_flux) {
            (Some(mean), Some(max)) => write!(f, "Flux: mean {:.2} kg/s, max {:.2} kg/s", mean, max),
            _ => write!(f, "Flux: none"),
        }
    }
}

/// Install the fmt subscriber, writing to `log_file` (no ANSI) when given
pub fn init_logging(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };

    let result = match log_file {
        Some(path) => {
            let file = File::create(path)?;
            tracing_subscriber::fmt()
                .with_max_level(level)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        None => tracing_subscriber::fmt()
            .with_max_level(level)
            .with_writer(std::io::stderr)
            .try_init(),
    };

    result.map_err(|e| ProcessingError::Config(format!("Failed to initialise logging: {}", e)))
}
