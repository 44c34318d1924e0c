use crate::readers::{ScanCatalog, ScanEntry};
use chrono::{Duration, NaiveDateTime};

/// Nearest scan from another station
#[derive(Debug, Clone, PartialEq)]
pub struct PairCandidate<'a> {
    pub station: &'a str,
    pub entry: &'a ScanEntry,
    pub delta: Duration,
}

impl PairCandidate<'_> {
    /// True when the time gap is strictly inside the pairing window
    pub fn within(&self, window_minutes: f64) -> bool {
        (self.delta.num_milliseconds() as f64) < window_minutes * 60_000.0
    }
}

/// Finds the temporally nearest scan from any other station in a catalog
pub struct StationPairFinder<'a> {
    catalog: &'a ScanCatalog,
}

impl<'a> StationPairFinder<'a> {
    pub fn new(catalog: &'a ScanCatalog) -> Self {
        Self { catalog }
    }

    /// Globally nearest other-station scan to `scan_time`.
    ///
    /// Ties go to the earlier station in catalog order, then to the earlier
    /// scan within a station.
    pub fn find_nearest(&self, station_name: &str, scan_time: NaiveDateTime) -> Option<PairCandidate<'a>> {
        let mut best: Option<PairCandidate<'a>> = None;

        for scans in self.catalog.stations() {
            if scans.station == station_name {
                continue;
            }

            let Some((entry, delta_ms)) = nearest_entry(&scans.entries, scan_time) else {
                continue;
            };

            let closer = best
                .as_ref()
                .map_or(true, |b| delta_ms < b.delta.num_milliseconds());
            if closer {
                best = Some(PairCandidate {
                    station: &scans.station,
                    entry,
                    delta: Duration::milliseconds(delta_ms),
                });
            }
        }

        best
    }
}

fn nearest_entry(entries: &[ScanEntry], scan_time: NaiveDateTime) -> Option<(&ScanEntry, i64)> {
    let mut nearest: Option<(&ScanEntry, i64)> = None;
    for entry in entries {
        let delta_ms = (entry.timestamp - scan_time).num_milliseconds().abs();
        if nearest.map_or(true, |(_, best)| delta_ms < best) {
            nearest = Some((entry, delta_ms));
        }
    }
    nearest
}
