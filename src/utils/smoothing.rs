use crate::error::{ProcessingError, Result};
use nalgebra::{DMatrix, DVector};

/// Savitzky-Golay smoothing filter with "nearest" edge handling.
///
/// The convolution coefficients come from a least-squares polynomial fit
/// over a centred window, solved once at construction.
#[derive(Debug, Clone)]
pub struct SavitzkyGolay {
    window: usize,
    order: usize,
    coeffs: Vec<f64>,
}

impl SavitzkyGolay {
    pub fn new(window: usize, order: usize) -> Result<Self> {
        if window == 0 || window % 2 == 0 {
            return Err(ProcessingError::Smoothing(format!(
                "window length must be a positive odd number, got {}",
                window
            )));
        }
        if order >= window {
            return Err(ProcessingError::Smoothing(format!(
                "polynomial order {} must be less than window length {}",
                order, window
            )));
        }

        let half = (window / 2) as f64;
        let terms = order + 1;
        let design = DMatrix::<f64>::from_fn(window, terms, |r, c| (r as f64 - half).powi(c as i32));
        let normal = design.transpose() * &design;

        let mut unit = DVector::<f64>::zeros(terms);
        unit[0] = 1.0;
        let solved = normal.lu().solve(&unit).ok_or_else(|| {
            ProcessingError::Smoothing(format!(
                "singular normal equations for window {} order {}",
                window, order
            ))
        })?;
        let coeffs = (&design * solved).iter().copied().collect();

        Ok(Self {
            window,
            order,
            coeffs,
        })
    }

    /// Build a filter for a series of `len` points, shrinking the window to the
    /// largest odd length that fits and the order to at most `window - 1`.
    pub fn clipped(window: usize, order: usize, len: usize) -> Result<Self> {
        let mut w = window.min(len);
        if w % 2 == 0 {
            w = w.saturating_sub(1);
        }
        if w == 0 {
            return Err(ProcessingError::Smoothing(
                "cannot smooth an empty series".to_string(),
            ));
        }
        Self::new(w, order.min(w - 1))
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn order(&self) -> usize {
        self.order
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coeffs
    }

    pub fn smooth(&self, values: &[f64]) -> Vec<f64> {
        let n = values.len();
        if n == 0 {
            return Vec::new();
        }
        let half = (self.window / 2) as isize;
        let last = n as isize - 1;

        (0..n as isize)
            .map(|i| {
                self.coeffs
                    .iter()
                    .enumerate()
                    .map(|(j, c)| {
                        let idx = (i + j as isize - half).clamp(0, last);
                        c * values[idx as usize]
                    })
                    .sum()
            })
            .collect()
    }
}
