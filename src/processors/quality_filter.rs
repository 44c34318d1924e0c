use crate::config::AnalysisSettings;
use crate::error::{ProcessingError, Result};
use crate::models::{FilteredScan, ScanRecord, ScanVerdict};
use crate::utils::constants::*;
use crate::utils::smoothing::SavitzkyGolay;

/// Per-scan quality gate and plume-centre finder
#[derive(Debug, Clone)]
pub struct QualityFilter {
    min_scd: f64,
    max_scd: f64,
    min_int: f64,
    max_int: f64,
    plume_scd: f64,
    good_scan_lim: f64,
    sg_window: usize,
    sg_polyn: usize,
}

impl QualityFilter {
    pub fn new(min_scd: f64, max_scd: f64, min_int: f64, max_int: f64) -> Self {
        Self {
            min_scd,
            max_scd,
            min_int,
            max_int,
            plume_scd: DEFAULT_PLUME_SCD,
            good_scan_lim: DEFAULT_GOOD_SCAN_LIM,
            sg_window: DEFAULT_SG_WINDOW,
            sg_polyn: DEFAULT_SG_POLYN,
        }
    }

    pub fn from_settings(settings: &AnalysisSettings) -> Self {
        Self::new(
            settings.min_scd,
            settings.max_scd,
            settings.min_int,
            settings.max_int,
        )
        .with_plume_scd(settings.plume_scd)
        .with_good_scan_lim(settings.good_scan_lim)
        .with_smoothing(settings.sg_window, settings.sg_polyn)
    }

    pub fn with_plume_scd(mut self, plume_scd: f64) -> Self {
        self.plume_scd = plume_scd;
        self
    }

    pub fn with_good_scan_lim(mut self, good_scan_lim: f64) -> Self {
        self.good_scan_lim = good_scan_lim;
        self
    }

    pub fn with_smoothing(mut self, window: usize, order: usize) -> Self {
        self.sg_window = window;
        self.sg_polyn = order;
        self
    }

    /// True for samples outside the SCD or intensity bounds, or with a
    /// missing (NaN) angle or SCD error
    pub fn reject_mask(&self, scan: &ScanRecord) -> Vec<bool> {
        (0..scan.len())
            .map(|i| {
                let (so2, int) = (scan.so2[i], scan.intensity[i]);
                let good = so2 >= self.min_scd
                    && so2 <= self.max_scd
                    && int >= self.min_int
                    && int <= self.max_int
                    && scan.angles[i].is_finite()
                    && scan.so2_err[i].is_finite();
                !good
            })
            .collect()
    }

    /// Apply the quality gate and locate the plume centre
    pub fn filter(&self, scan: ScanRecord) -> Result<FilteredScan> {
        let reject = self.reject_mask(&scan);
        let keep_mask: Vec<bool> = reject.iter().map(|r| !r).collect();
        let n_rejected = reject.iter().filter(|r| **r).count();
        let n_kept = scan.len() - n_rejected;

        if scan.is_empty()
            || n_rejected as f64 > self.good_scan_lim * scan.len() as f64
            || n_kept == 0
        {
            return Ok(FilteredScan {
                scan,
                keep_mask,
                verdict: ScanVerdict::RejectedLowSignal,
            });
        }

        let n_plume = scan
            .so2
            .iter()
            .zip(keep_mask.iter())
            .filter(|(so2, keep)| **keep && **so2 > self.plume_scd)
            .count();

        if n_plume < MIN_PLUME_SAMPLES {
            return Ok(FilteredScan {
                scan,
                keep_mask,
                verdict: ScanVerdict::RejectedInsufficientPlume,
            });
        }

        let (angles, so2): (Vec<f64>, Vec<f64>) = keep_mask
            .iter()
            .enumerate()
            .filter(|(_, keep)| **keep)
            .map(|(i, _)| (scan.angles[i], scan.so2[i]))
            .unzip();
        let peak_angle = find_peak_angle(&angles, &so2, self.sg_window, self.sg_polyn)?;

        Ok(FilteredScan {
            scan,
            keep_mask,
            verdict: ScanVerdict::Analyzable { peak_angle },
        })
    }
}

/// Angle of the maximum smoothed SCD.
///
/// Samples are smoothed in ascending angle order. The window is clipped to
/// the sample count; the first of equal maxima wins.
pub fn find_peak_angle(angles: &[f64], so2: &[f64], window: usize, order: usize) -> Result<f64> {
    if angles.is_empty() || angles.len() != so2.len() {
        return Err(ProcessingError::Smoothing(format!(
            "cannot locate a peak in {} angles and {} columns",
            angles.len(),
            so2.len()
        )));
    }

    let mut order_idx: Vec<usize> = (0..angles.len()).collect();
    order_idx.sort_by(|&a, &b| angles[a].total_cmp(&angles[b]));

    let sorted_so2: Vec<f64> = order_idx.iter().map(|&i| so2[i]).collect();
    let filter = SavitzkyGolay::clipped(window, order, sorted_so2.len())?;
    let smoothed = filter.smooth(&sorted_so2);

    let mut best = 0;
    for (i, v) in smoothed.iter().enumerate() {
        if *v > smoothed[best] {
            best = i;
        }
    }

    Ok(angles[order_idx[best]])
}
