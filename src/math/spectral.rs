//! Two-dimensional (time × longitude) power and co-spectra.
//!
//! Fields are rank 3 `[time, lat, lon]` or rank 4 `[time, level, lat, lon]`.
//! Time is transformed to a one-sided frequency axis and longitude to a
//! two-sided wavenumber axis, so the result has dimensions
//! `(frequency, [level,] lat, wavenumber)`.
//!
//! Conventions:
//! - frequency `i / (nperseg · dt)` for `i = 0..=nperseg/2`
//! - wavenumber strictly increasing from `-(nlon/2)`, scaled by
//!   `1 / (nlon · dlon)`; positive wavenumber with positive frequency is
//!   eastward propagation
//! - power sums to the (window-weighted) mean square of the input, the
//!   co-spectrum sums to the covariance of the two inputs

use ndarray::{Array1, Array2, Array3, ArrayD, ArrayView2, ArrayViewD, Axis, IxDyn};
use num_complex::Complex64;
use rustfft::{Fft, FftPlanner};
use std::f64::consts::PI;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SpectralError {
    #[error("Expected a rank 3 or rank 4 field, got rank {0}")]
    UnsupportedRank(usize),

    #[error("Paired fields differ in shape: {0:?} vs {1:?}")]
    ShapeMismatch(Vec<usize>, Vec<usize>),

    #[error("Insufficient samples along {axis}: {len} (need at least 2)")]
    InsufficientSamples { axis: &'static str, len: usize },

    #[error("Segment length {nperseg} must lie in 2..={ntime}")]
    InvalidSegmentLength { nperseg: usize, ntime: usize },

    #[error("Invalid sampling interval: {0}")]
    InvalidSampling(String),

    #[error("Array shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),
}

/// Window applied along the time axis of each segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Window {
    #[default]
    Boxcar,
    /// Periodic Hann window
    Hann,
}

impl Window {
    pub fn weights(&self, n: usize) -> Array1<f64> {
        match self {
            Window::Boxcar => Array1::ones(n),
            Window::Hann => Array1::from_shape_fn(n, |i| {
                0.5 - 0.5 * (2.0 * PI * i as f64 / n as f64).cos()
            }),
        }
    }
}

/// Trend removal along time within each segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Detrend {
    #[default]
    None,
    /// Subtract the segment time mean
    Constant,
}

/// Sampling and windowing parameters shared by every estimate
#[derive(Debug, Clone, PartialEq)]
pub struct SpectralSettings {
    /// Time step in days
    pub dt: f64,
    /// Longitude step as a fraction of the full circle
    pub dlon: f64,
    pub window: Window,
    pub detrend: Detrend,
    /// Segment length in time steps; `None` uses the whole series
    pub nperseg: Option<usize>,
}

impl SpectralSettings {
    /// Boxcar window, no detrending, one full-length segment
    pub fn new(dt: f64, dlon: f64) -> Self {
        Self {
            dt,
            dlon,
            window: Window::Boxcar,
            detrend: Detrend::None,
            nperseg: None,
        }
    }
}

/// Field(s) to analyse. A pair requests a co-spectrum.
#[derive(Debug, Clone)]
pub enum SpectralInput<'a> {
    Single(ArrayViewD<'a, f64>),
    Pair(ArrayViewD<'a, f64>, ArrayViewD<'a, f64>),
}

impl<'a> SpectralInput<'a> {
    pub fn is_cross(&self) -> bool {
        matches!(self, SpectralInput::Pair(..))
    }

    fn first(&self) -> &ArrayViewD<'a, f64> {
        match self {
            SpectralInput::Single(x) | SpectralInput::Pair(x, _) => x,
        }
    }
}

/// Output of one spectral estimate
#[derive(Debug, Clone)]
pub struct SpectralResult {
    /// Frequency axis, cycles per day
    pub frequency: Array1<f64>,
    /// Wavenumber axis, cycles per circle
    pub wavenumber: Array1<f64>,
    /// Power spectrum of a single field, or co-spectrum of a pair
    pub spectrum: ArrayD<f64>,
    /// Power spectra of the two inputs, present only for a pair
    pub powers: Option<(ArrayD<f64>, ArrayD<f64>)>,
}

/// Estimator of 2-D (time, longitude) spectra
pub trait SpectralEstimator {
    fn estimate(
        &mut self,
        input: SpectralInput<'_>,
        settings: &SpectralSettings,
    ) -> Result<SpectralResult, SpectralError>;
}

/// Time and longitude axes for a field of the given rank
pub fn analysis_axes(rank: usize) -> Result<(usize, usize), SpectralError> {
    match rank {
        3 => Ok((0, 2)),
        4 => Ok((0, 3)),
        other => Err(SpectralError::UnsupportedRank(other)),
    }
}

/// One-sided frequency axis for a segment of `nperseg` samples
pub fn frequency_axis(nperseg: usize, dt: f64) -> Array1<f64> {
    Array1::from_shape_fn(nperseg / 2 + 1, |i| i as f64 / (nperseg as f64 * dt))
}

/// Signed wavenumber in cycles per transform length, for output column `j`
fn signed_wavenumber(j: usize, nlon: usize) -> isize {
    j as isize - (nlon / 2) as isize
}

/// Two-sided, strictly increasing wavenumber axis
pub fn wavenumber_axis(nlon: usize, dlon: f64) -> Array1<f64> {
    Array1::from_shape_fn(nlon, |j| signed_wavenumber(j, nlon) as f64 / (nlon as f64 * dlon))
}

/// Weight folding negative frequencies onto the one-sided axis
fn one_sided_weight(i: usize, nperseg: usize) -> f64 {
    if i == 0 || 2 * i == nperseg {
        1.0
    } else {
        2.0
    }
}

/// FFT-based estimator using boxcar or Hann windows and half-overlapping segments
pub struct Power2d {
    planner: FftPlanner<f64>,
}

impl Default for Power2d {
    fn default() -> Self {
        Self::new()
    }
}

struct SegmentPlan {
    time_fft: Arc<dyn Fft<f64>>,
    lon_fft: Arc<dyn Fft<f64>>,
    window: Array1<f64>,
    detrend: Detrend,
    nperseg: usize,
    nlon: usize,
}

impl SegmentPlan {
    /// Fourier coefficients of one segment, shape `[nfreq, nlon]` in output order
    fn transform(&self, segment: ArrayView2<f64>) -> Array2<Complex64> {
        let (n, m) = (self.nperseg, self.nlon);

        let mut rows = Vec::with_capacity(n * m);
        let means: Vec<f64> = match self.detrend {
            Detrend::None => vec![0.0; m],
            Detrend::Constant => segment
                .mean_axis(Axis(0))
                .map(|mean| mean.to_vec())
                .unwrap_or_else(|| vec![0.0; m]),
        };
        for (t, row) in segment.outer_iter().enumerate() {
            let w = self.window[t];
            rows.extend(
                row.iter()
                    .zip(&means)
                    .map(|(&x, &mean)| Complex64::new(w * (x - mean), 0.0)),
            );
        }
        // Longitude transform of every time row
        self.lon_fft.process(&mut rows);

        let mut columns = vec![Complex64::default(); n * m];
        for t in 0..n {
            for x in 0..m {
                columns[x * n + t] = rows[t * m + x];
            }
        }
        // Time transform of every longitude column
        self.time_fft.process(&mut columns);

        // The FFT kernel puts exp(i(ωt - kx)) at bin -k, so output wavenumber κ reads bin -κ
        Array2::from_shape_fn((n / 2 + 1, m), |(f, j)| {
            let bin = (-signed_wavenumber(j, m)).rem_euclid(m as isize) as usize;
            columns[bin * n + f]
        })
    }
}

impl Power2d {
    pub fn new() -> Self {
        Self {
            planner: FftPlanner::new(),
        }
    }

    fn plan(&mut self, shape: &[usize], settings: &SpectralSettings) -> Result<SegmentPlan, SpectralError> {
        let (time_axis, lon_axis) = analysis_axes(shape.len())?;
        let (ntime, nlon) = (shape[time_axis], shape[lon_axis]);
        if ntime < 2 {
            return Err(SpectralError::InsufficientSamples { axis: "time", len: ntime });
        }
        if nlon < 2 {
            return Err(SpectralError::InsufficientSamples { axis: "longitude", len: nlon });
        }
        if !(settings.dt.is_finite() && settings.dt > 0.0) {
            return Err(SpectralError::InvalidSampling(format!("time step {}", settings.dt)));
        }
        if !(settings.dlon.is_finite() && settings.dlon > 0.0) {
            return Err(SpectralError::InvalidSampling(format!("longitude step {}", settings.dlon)));
        }
        let nperseg = settings.nperseg.unwrap_or(ntime);
        if nperseg < 2 || nperseg > ntime {
            return Err(SpectralError::InvalidSegmentLength { nperseg, ntime });
        }

        Ok(SegmentPlan {
            time_fft: self.planner.plan_fft_forward(nperseg),
            lon_fft: self.planner.plan_fft_forward(nlon),
            window: settings.window.weights(nperseg),
            detrend: settings.detrend,
            nperseg,
            nlon,
        })
    }
}

/// Field viewed as `[time, rest, lon]` with the middle axes flattened
fn as_slabs(field: &ArrayViewD<f64>) -> Result<Array3<f64>, SpectralError> {
    let shape = field.shape();
    let ntime = shape[0];
    let nlon = shape[shape.len() - 1];
    let nrest = shape[1..shape.len() - 1].iter().product::<usize>();
    let standard = field.as_standard_layout().into_owned();
    Ok(standard.into_shape_with_order((ntime, nrest, nlon))?)
}

/// Restore `(frequency, [level,] lat, wavenumber)` from the flattened layout
fn unflatten(spectrum: Array3<f64>, input_shape: &[usize]) -> Result<ArrayD<f64>, SpectralError> {
    let mut dims = vec![spectrum.len_of(Axis(0))];
    dims.extend_from_slice(&input_shape[1..input_shape.len() - 1]);
    dims.push(spectrum.len_of(Axis(2)));
    Ok(spectrum.into_shape_with_order(IxDyn(&dims))?)
}

impl SpectralEstimator for Power2d {
    fn estimate(
        &mut self,
        input: SpectralInput<'_>,
        settings: &SpectralSettings,
    ) -> Result<SpectralResult, SpectralError> {
        let shape = input.first().shape().to_vec();
        if let SpectralInput::Pair(a, b) = &input {
            if a.shape() != b.shape() {
                return Err(SpectralError::ShapeMismatch(a.shape().to_vec(), b.shape().to_vec()));
            }
        }
        let plan = self.plan(&shape, settings)?;
        let (n, m) = (plan.nperseg, plan.nlon);
        let nfreq = n / 2 + 1;
        let ntime = shape[0];

        let step = (n / 2).max(1);
        let starts: Vec<usize> = (0..=ntime - n).step_by(step).collect();
        let norm = 1.0 / (n as f64 * plan.window.mapv(|w| w * w).sum() * (m * m) as f64);
        let scale = |f: usize| one_sided_weight(f, n) * norm / starts.len() as f64;

        let first = as_slabs(input.first())?;
        let second = match &input {
            SpectralInput::Pair(_, b) => Some(as_slabs(b)?),
            SpectralInput::Single(_) => None,
        };
        let nrest = first.len_of(Axis(1));

        let mut power_a = Array3::<f64>::zeros((nfreq, nrest, m));
        let mut power_b = Array3::<f64>::zeros((nfreq, nrest, m));
        let mut cross = Array3::<f64>::zeros((nfreq, nrest, m));

        for r in 0..nrest {
            for &start in &starts {
                let seg_a = first.slice(ndarray::s![start..start + n, r, ..]);
                let coeff_a = plan.transform(seg_a);
                match &second {
                    None => {
                        for ((f, j), c) in coeff_a.indexed_iter() {
                            power_a[[f, r, j]] += c.norm_sqr() * scale(f);
                        }
                    }
                    Some(second) => {
                        let seg_b = second.slice(ndarray::s![start..start + n, r, ..]);
                        let coeff_b = plan.transform(seg_b);
                        for ((f, j), ca) in coeff_a.indexed_iter() {
                            let cb = coeff_b[[f, j]];
                            let s = scale(f);
                            power_a[[f, r, j]] += ca.norm_sqr() * s;
                            power_b[[f, r, j]] += cb.norm_sqr() * s;
                            cross[[f, r, j]] += (ca * cb.conj()).re * s;
                        }
                    }
                }
            }
        }

        let frequency = frequency_axis(n, settings.dt);
        let wavenumber = wavenumber_axis(m, settings.dlon);
        if second.is_some() {
            Ok(SpectralResult {
                frequency,
                wavenumber,
                spectrum: unflatten(cross, &shape)?,
                powers: Some((unflatten(power_a, &shape)?, unflatten(power_b, &shape)?)),
            })
        } else {
            Ok(SpectralResult {
                frequency,
                wavenumber,
                spectrum: unflatten(power_a, &shape)?,
                powers: None,
            })
        }
    }
}
