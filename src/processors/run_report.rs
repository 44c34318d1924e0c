use crate::error::Result;
use chrono::NaiveDate;
use serde::Serialize;
use std::path::PathBuf;

/// What happened to each station's scans in one aggregator run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StationReport {
    pub station: String,
    pub scans: usize,
    pub analysed: usize,
    pub rejected_low_signal: usize,
    pub rejected_insufficient_plume: usize,
    pub unreadable: usize,
    pub paired: usize,
    pub triangulated: usize,
    pub integration_failures: usize,
    pub scan_dir_missing: bool,
    pub output: Option<PathBuf>,
    pub export_error: Option<String>,
}

impl StationReport {
    pub fn new(station: &str) -> Self {
        Self {
            station: station.to_string(),
            ..Default::default()
        }
    }

    pub fn rejected(&self) -> usize {
        self.rejected_low_signal + self.rejected_insufficient_plume + self.unreadable
    }

    pub fn exported(&self) -> bool {
        self.output.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub date: NaiveDate,
    pub day_root: PathBuf,
    pub stations: Vec<StationReport>,
}

impl RunReport {
    pub fn new(date: NaiveDate, day_root: PathBuf) -> Self {
        Self {
            date,
            day_root,
            stations: Vec::new(),
        }
    }

    pub fn station(&self, name: &str) -> Option<&StationReport> {
        self.stations.iter().find(|s| s.station == name)
    }

    pub fn total_scans(&self) -> usize {
        self.stations.iter().map(|s| s.scans).sum()
    }

    pub fn total_analysed(&self) -> usize {
        self.stations.iter().map(|s| s.analysed).sum()
    }

    pub fn export_failures(&self) -> usize {
        self.stations
            .iter()
            .filter(|s| s.export_error.is_some())
            .count()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn summary(&self) -> String {
        let mut summary = String::new();

        summary.push_str(&format!("=== Flux Run {} ===\n", self.date));
        summary.push_str(&format!("Results: {}\n", self.day_root.display()));
        summary.push_str(&format!(
            "Scans: {} ({} analysed)\n",
            self.total_scans(),
            self.total_analysed()
        ));

        for s in &self.stations {
            summary.push_str(&format!(
                "\n{}: {} scans, {} analysed, {} paired ({} triangulated)\n",
                s.station, s.scans, s.analysed, s.paired, s.triangulated
            ));
            if s.rejected() > 0 {
                summary.push_str(&format!(
                    "  Rejected: {} low signal, {} insufficient plume, {} unreadable\n",
                    s.rejected_low_signal, s.rejected_insufficient_plume, s.unreadable
                ));
            }
            if s.integration_failures > 0 {
                summary.push_str(&format!(
                    "  Integration failures: {}\n",
                    s.integration_failures
                ));
            }
            if s.scan_dir_missing {
                summary.push_str("  No scan directory\n");
            }
            match (&s.output, &s.export_error) {
                (Some(path), _) => summary.push_str(&format!("  Written: {}\n", path.display())),
                (None, Some(err)) => summary.push_str(&format!("  Export failed: {}\n", err)),
                (None, None) => {}
            }
        }

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> RunReport {
        let mut report = RunReport::new(
            NaiveDate::from_ymd_opt(2023, 4, 15).unwrap(),
            PathBuf::from("Results/2023-04-15"),
        );
        let mut a = StationReport::new("A");
        a.scans = 4;
        a.analysed = 2;
        a.rejected_low_signal = 1;
        a.unreadable = 1;
        a.paired = 1;
        a.output = Some(PathBuf::from("Results/2023-04-15/A/2023-04-15_A_fluxes.csv"));
        report.stations.push(a);

        let mut b = StationReport::new("B");
        b.export_error = Some("No such file or directory".to_string());
        report.stations.push(b);
        report
    }

    #[test]
    fn test_totals() {
        let report = report();
        assert_eq!(report.total_scans(), 4);
        assert_eq!(report.total_analysed(), 2);
        assert_eq!(report.export_failures(), 1);
        assert_eq!(report.station("A").unwrap().rejected(), 2);
        assert!(report.station("A").unwrap().exported());
        assert!(report.station("C").is_none());
    }

    #[test]
    fn test_summary_and_json() {
        let report = report();
        let summary = report.summary();
        assert!(summary.contains("Scans: 4 (2 analysed)"));
        assert!(summary.contains("Export failed: No such file or directory"));

        let json = report.to_json().unwrap();
        assert!(json.contains("\"rejected_low_signal\": 1"));
        assert!(json.contains("\"date\": \"2023-04-15\""));
    }
}
