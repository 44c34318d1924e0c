use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use so2_flux::config::AnalysisSettings;
use so2_flux::models::{FluxRecord, Station};
use so2_flux::processors::FluxAggregator;
use so2_flux::readers::StationReader;
use so2_flux::utils::filename::{day_root, flux_table_path};
use so2_flux::writers::{ExportMode, FluxTableWriter};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const STATIONS_CSV: &str = "\
# name,latitude,longitude,elevation,azimuth,tilt,sync
name,latitude,longitude,elevation,azimuth,tilt,sync
NORTH,-0.02,0.01,1000.0,0.0,0.0,true
WEST,0:00:36,0:01:48,1000.0,270.0,,
";

const SETTINGS_TOML: &str = r#"
sg_window = 5
sg_polyn = 2
scan_pair_time = 5.0
default_altitude = 2500.0
default_azimuth = 45.0
wind_speed = 8.0

[vent]
latitude = 0.0
longitude = 0.0
elevation = 2500.0
"#;

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 4, 15).unwrap()
}

/// Scan with a Gaussian plume at `peak` degrees; the first `bad` samples saturate
fn scan_csv(peak: f64, bad: usize) -> String {
    let mut csv = String::from("angle, SO2, SO2_err, int_av, fit_quality\n");
    for i in 0..41 {
        let angle = -80.0 + 4.0 * i as f64;
        let so2 = 1e18 * (-0.5 * ((angle - peak) / 12.0).powi(2)).exp();
        let intensity = if i < bad { 65000.0 } else { 25000.0 };
        csv.push_str(&format!("{}, {:e}, 2e16, {}, 1\n", angle, so2, intensity));
    }
    csv
}

struct Workspace {
    _temp: TempDir,
    results: PathBuf,
    settings: PathBuf,
    stations: PathBuf,
}

impl Workspace {
    fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let results = temp.path().join("Results");
        fs::create_dir_all(day_root(&results, date())).unwrap();

        let settings = temp.path().join("settings.toml");
        fs::write(&settings, SETTINGS_TOML).unwrap();
        let stations = temp.path().join("stations.csv");
        fs::write(&stations, STATIONS_CSV).unwrap();

        Self {
            _temp: temp,
            results,
            settings,
            stations,
        }
    }

    fn add_scan(&self, station: &str, name: &str, content: &str) {
        let dir = day_root(&self.results, date()).join(station).join("so2");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(name), content).unwrap();
    }

    fn aggregator(&self, pairing: bool) -> FluxAggregator {
        let settings = AnalysisSettings::load(&self.settings)
            .unwrap()
            .with_pairing(pairing);
        let stations = StationReader::new().read_stations(&self.stations).unwrap();
        FluxAggregator::new(settings, stations).unwrap()
    }

    fn table_path(&self, station: &str, reanalysed: bool) -> PathBuf {
        flux_table_path(&day_root(&self.results, date()), date(), station, reanalysed)
    }

    fn read(&self, station: &str) -> Vec<FluxRecord> {
        FluxTableWriter::new()
            .read_table(&self.table_path(station, false))
            .unwrap()
    }
}

fn run(ws: &Workspace, pairing: bool, mode: ExportMode) {
    ws.aggregator(pairing)
        .run_day(&ws.results, date(), mode, None)
        .unwrap();
}

#[test]
fn test_registry_and_settings_load() {
    let ws = Workspace::new();
    let stations = StationReader::new().read_stations(&ws.stations).unwrap();
    assert_eq!(stations.len(), 2);

    let west: &Station = &stations[1];
    assert!((west.latitude - 0.01).abs() < 1e-12);
    assert!((west.longitude - 0.03).abs() < 1e-12);
    assert!(west.sync);

    let settings = AnalysisSettings::load(&ws.settings).unwrap();
    assert_eq!(settings.sg_window, 5);
    assert_eq!(settings.wind_speed, 8.0);
    assert_eq!(settings.max_int, 60000.0);
}

#[test]
fn test_paired_scans_triangulate() {
    let ws = Workspace::new();
    ws.add_scan("NORTH", "20230415_100000.csv", &scan_csv(60.0, 0));
    ws.add_scan("WEST", "20230415_100030.csv", &scan_csv(48.0, 0));
    run(&ws, true, ExportMode::RealTime);

    let rows = ws.read("NORTH");
    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(row.scan_file, "20230415_100000.csv");
    assert_eq!(row.pair_station.as_deref(), Some("WEST"));
    assert_eq!(row.pair_file.as_deref(), Some("20230415_100030.csv"));
    assert_eq!(row.wind_speed, Some(8.0));

    let altitude = row.plume_altitude.unwrap();
    assert!(altitude > 2800.0 && altitude < 3100.0, "altitude {}", altitude);
    assert!((row.plume_azimuth.unwrap() - 45.0).abs() < 1e-3);
    assert!(row.flux.unwrap() > 0.0);
}

#[test]
fn test_disabling_pairing_only_changes_geometry() {
    let ws = Workspace::new();
    ws.add_scan("NORTH", "20230415_100000.csv", &scan_csv(60.0, 0));
    ws.add_scan("WEST", "20230415_100030.csv", &scan_csv(48.0, 0));

    run(&ws, true, ExportMode::RealTime);
    let paired = ws.read("NORTH");
    run(&ws, false, ExportMode::RealTime);
    let unpaired = ws.read("NORTH");

    assert_eq!(unpaired.len(), paired.len());
    assert_eq!(unpaired[0].time, paired[0].time);
    assert_eq!(unpaired[0].scan_file, paired[0].scan_file);
    assert_eq!(unpaired[0].pair_station, None);
    assert_eq!(unpaired[0].pair_file, None);
    assert_eq!(unpaired[0].plume_altitude, Some(2500.0));
    assert_eq!(unpaired[0].plume_azimuth, Some(45.0));
    assert!(unpaired[0].has_flux());
}

#[test]
fn test_every_scan_gets_a_row() {
    let ws = Workspace::new();
    ws.add_scan("NORTH", "20230415_100000.csv", &scan_csv(60.0, 0));
    // 25% saturated
    ws.add_scan("NORTH", "20230415_101000.csv", &scan_csv(60.0, 11));
    ws.add_scan("NORTH", "20230415_102000.csv", "garbage");
    ws.add_scan("NORTH", "README.txt", "not a scan");

    let report = ws
        .aggregator(true)
        .run_day(&ws.results, date(), ExportMode::RealTime, None)
        .unwrap();

    let rows = ws.read("NORTH");
    assert_eq!(rows.len(), 3);
    assert_eq!(report.station("NORTH").unwrap().scans, 3);
    assert_eq!(
        rows.iter().map(|r| r.has_flux()).collect::<Vec<_>>(),
        vec![true, false, false]
    );
    assert_eq!(rows[1].plume_altitude, None);
    assert_eq!(rows[1].wind_speed, None);

    // WEST has no data today: nothing written, and not a failure
    let west = report.station("WEST").unwrap();
    assert!(west.scan_dir_missing);
    assert_eq!(west.export_error, None);
    assert_eq!(report.export_failures(), 0);
    assert!(!ws.table_path("WEST", false).exists());
}

#[test]
fn test_rerun_is_byte_identical() {
    let ws = Workspace::new();
    ws.add_scan("NORTH", "20230415_100000.csv", &scan_csv(60.0, 0));
    ws.add_scan("WEST", "20230415_100030.csv", &scan_csv(48.0, 0));
    ws.add_scan("WEST", "20230415_101030.csv", &scan_csv(48.0, 20));

    run(&ws, true, ExportMode::RealTime);
    let first = fs::read(ws.table_path("WEST", false)).unwrap();
    run(&ws, true, ExportMode::RealTime);
    let second = fs::read(ws.table_path("WEST", false)).unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_new_scans_are_picked_up_on_next_run() {
    let ws = Workspace::new();
    ws.add_scan("NORTH", "20230415_100000.csv", &scan_csv(60.0, 0));
    run(&ws, true, ExportMode::RealTime);
    assert_eq!(ws.read("NORTH").len(), 1);
    assert_eq!(ws.read("NORTH")[0].pair_station, None);

    ws.add_scan("NORTH", "20230415_100500.csv", &scan_csv(60.0, 0));
    ws.add_scan("WEST", "20230415_100030.csv", &scan_csv(48.0, 0));
    run(&ws, true, ExportMode::RealTime);

    let rows = ws.read("NORTH");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].pair_station.as_deref(), Some("WEST"));
}

#[test]
fn test_reanalysis_writes_separate_table() {
    let ws = Workspace::new();
    ws.add_scan("NORTH", "20230415_100000.csv", &scan_csv(60.0, 0));

    run(&ws, true, ExportMode::RealTime);
    let realtime = fs::read(ws.table_path("NORTH", false)).unwrap();
    run(&ws, false, ExportMode::Reanalysis);

    assert!(ws.table_path("NORTH", true).exists());
    assert_eq!(fs::read(ws.table_path("NORTH", false)).unwrap(), realtime);
}

#[test]
fn test_missing_day_is_an_error() {
    let ws = Workspace::new();
    let other_day = NaiveDate::from_ymd_opt(2023, 4, 16).unwrap();
    let result = ws
        .aggregator(true)
        .run_day(&ws.results, other_day, ExportMode::RealTime, None);
    assert!(result.is_err());
    assert!(!Path::new(&day_root(&ws.results, other_day)).exists());
}
