use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};

/// One sample of a scan as stored in the scan file.
///
/// Empty cells (a failed fit) read as NaN and are rejected per sample by
/// the quality filter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScanSample {
    #[serde(rename = "angle", deserialize_with = "nan_if_empty")]
    pub angle: f64,
    #[serde(rename = "SO2", deserialize_with = "nan_if_empty")]
    pub so2: f64,
    #[serde(rename = "SO2_err", deserialize_with = "nan_if_empty")]
    pub so2_err: f64,
    #[serde(rename = "int_av", deserialize_with = "nan_if_empty")]
    pub intensity: f64,
}

fn nan_if_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
}

impl ScanSample {
    pub fn new(angle: f64, so2: f64, so2_err: f64, intensity: f64) -> Self {
        Self {
            angle,
            so2,
            so2_err,
            intensity,
        }
    }
}

/// One completed sweep, held as parallel sequences in acquisition order.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanRecord {
    pub filename: String,
    pub timestamp: NaiveDateTime,
    pub angles: Vec<f64>,
    pub so2: Vec<f64>,
    pub so2_err: Vec<f64>,
    pub intensity: Vec<f64>,
}

impl ScanRecord {
    pub fn new(filename: &str, timestamp: NaiveDateTime) -> Self {
        Self {
            filename: filename.to_string(),
            timestamp,
            angles: Vec::new(),
            so2: Vec::new(),
            so2_err: Vec::new(),
            intensity: Vec::new(),
        }
    }

    pub fn from_samples(filename: &str, timestamp: NaiveDateTime, samples: &[ScanSample]) -> Self {
        let mut scan = Self::new(filename, timestamp);
        for sample in samples {
            scan.push(*sample);
        }
        scan
    }

    pub fn push(&mut self, sample: ScanSample) {
        self.angles.push(sample.angle);
        self.so2.push(sample.so2);
        self.so2_err.push(sample.so2_err);
        self.intensity.push(sample.intensity);
    }

    pub fn len(&self) -> usize {
        self.angles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.angles.is_empty()
    }

    pub fn sample(&self, idx: usize) -> Option<ScanSample> {
        Some(ScanSample::new(
            *self.angles.get(idx)?,
            *self.so2.get(idx)?,
            *self.so2_err.get(idx)?,
            *self.intensity.get(idx)?,
        ))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScanVerdict {
    Analyzable { peak_angle: f64 },
    RejectedLowSignal,
    RejectedInsufficientPlume,
}

impl ScanVerdict {
    pub fn is_analyzable(&self) -> bool {
        matches!(self, ScanVerdict::Analyzable { .. })
    }

    pub fn reason(&self) -> &'static str {
        match self {
            ScanVerdict::Analyzable { .. } => "Scan analysed",
            ScanVerdict::RejectedLowSignal => "Not enough good spectra",
            ScanVerdict::RejectedInsufficientPlume => "Not enough plume spectra",
        }
    }
}

/// Quality-filtered view of a scan
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredScan {
    pub scan: ScanRecord,
    pub keep_mask: Vec<bool>,
    pub verdict: ScanVerdict,
}

/// Kept samples of an analysable scan, still in acquisition order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeptSamples {
    pub angles: Vec<f64>,
    pub so2: Vec<f64>,
    pub so2_err: Vec<f64>,
}

impl FilteredScan {
    pub fn peak_angle(&self) -> Option<f64> {
        match self.verdict {
            ScanVerdict::Analyzable { peak_angle } => Some(peak_angle),
            _ => None,
        }
    }

    pub fn is_analyzable(&self) -> bool {
        self.verdict.is_analyzable()
    }

    pub fn kept_count(&self) -> usize {
        self.keep_mask.iter().filter(|k| **k).count()
    }

    pub fn kept_samples(&self) -> KeptSamples {
        let mut kept = KeptSamples::default();
        for (idx, keep) in self.keep_mask.iter().enumerate() {
            if !keep {
                continue;
            }
            kept.angles.push(self.scan.angles[idx]);
            kept.so2.push(self.scan.so2[idx]);
            kept.so2_err.push(self.scan.so2_err[idx]);
        }
        kept
    }
}
