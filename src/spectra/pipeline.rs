//! Load → derive eddies → per-term spectra → dataset.

use std::borrow::Cow;

use ndarray::{Array4, Axis};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::SpectraConfig;
use crate::data_io::common::CoordinateVariable;
use crate::data_io::utils::time_unit_in_days;
use crate::data_io::{AtmosphericState, DatasetSink, GridSource, ReaderError, WriteError};
use crate::math::eddy::EddyError;
use crate::math::spectral::{SpectralError, SpectralEstimator, SpectralInput, SpectralSettings};
use crate::spectra::assembler::{AssembleError, DatasetBuilder, OutputDataset};
use crate::spectra::fields::DerivedFields;
use crate::spectra::registry::{FluxTerm, TermInputs, FLUX_TERMS};

const DEGREES_PER_CIRCLE: f64 = 360.0;
const TIME_AXIS: usize = 0;
const LON_AXIS: usize = 3;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Input error: {0}")]
    Reader(#[from] ReaderError),

    #[error("Output error: {0}")]
    Write(#[from] WriteError),

    #[error("Eddy field error: {0}")]
    Eddy(#[from] EddyError),

    #[error("Spectral estimate for {term} failed: {source}")]
    Spectral {
        term: &'static str,
        #[source]
        source: SpectralError,
    },

    #[error("Dataset assembly error: {0}")]
    Assemble(#[from] AssembleError),

    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("Insufficient samples along {axis}: {len} (need at least 2)")]
    InsufficientSamples { axis: &'static str, len: usize },

    #[error("Invalid coordinate spacing: {0}")]
    InvalidSpacing(String),
}

/// Sampling steps of the analysed axes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingIntervals {
    /// Time step in days
    pub dt: f64,
    /// Longitude step as a fraction of the full circle
    pub dlon: f64,
}

/// Check that the fields agree with the coordinate lengths
pub fn validate_state(state: &AtmosphericState) -> Result<(), PipelineError> {
    let (nt, nlev, nlat, nlon) = state.grid_shape();
    let expected = [nt, nlev, nlat, nlon];
    for (name, field) in [("u", &state.u), ("v", &state.v), ("t", &state.t)] {
        if field.shape() != expected {
            return Err(PipelineError::ShapeMismatch(format!(
                "{} has shape {:?}, coordinates give {:?}",
                name,
                field.shape(),
                expected
            )));
        }
    }
    Ok(())
}

/// Time step (days) and longitude step (fraction of 360°), both taken from
/// the first two coordinate values. Either axis may be descending.
pub fn sampling_intervals(state: &AtmosphericState) -> Result<SamplingIntervals, PipelineError> {
    let time = &state.time.values;
    let lon = &state.lon.values;
    if time.len() < 2 {
        return Err(PipelineError::InsufficientSamples {
            axis: "time",
            len: time.len(),
        });
    }
    if lon.len() < 2 {
        return Err(PipelineError::InsufficientSamples {
            axis: "lon",
            len: lon.len(),
        });
    }

    let unit = match state.time.units() {
        Some(units) => time_unit_in_days(units).unwrap_or_else(|| {
            warn!("Unrecognised time units {:?}, assuming days", units);
            1.0
        }),
        None => 1.0,
    };
    let dt = ((time[1] - time[0]) * unit).abs();
    if !(dt.is_finite() && dt > 0.0) {
        return Err(PipelineError::InvalidSpacing(format!("time step {} days", dt)));
    }

    let dlon = (lon[1] - lon[0]).abs() / DEGREES_PER_CIRCLE;
    if !(dlon.is_finite() && dlon > 0.0) {
        return Err(PipelineError::InvalidSpacing(format!(
            "longitude step {} degrees",
            lon[1] - lon[0]
        )));
    }
    Ok(SamplingIntervals { dt, dlon })
}

fn is_descending(coord: &CoordinateVariable) -> bool {
    coord.values.len() >= 2 && coord.values[1] < coord.values[0]
}

fn reverse_axis(field: &mut Array4<f64>, axis: usize) {
    field.invert_axis(Axis(axis));
    let reversed = field.as_standard_layout().into_owned();
    *field = reversed;
}

/// Reverse descending time or longitude so both increase with index and
/// eastward propagation keeps a positive wavenumber
pub fn orient_axes(state: &AtmosphericState) -> Cow<'_, AtmosphericState> {
    let flip_time = is_descending(&state.time);
    let flip_lon = is_descending(&state.lon);
    if !flip_time && !flip_lon {
        return Cow::Borrowed(state);
    }

    let mut oriented = state.clone();
    for (flip, axis, coord) in [
        (flip_time, TIME_AXIS, &mut oriented.time),
        (flip_lon, LON_AXIS, &mut oriented.lon),
    ] {
        if !flip {
            continue;
        }
        debug!("{} is descending, reversing", coord.name);
        coord.values.invert_axis(Axis(0));
        coord.values = coord.values.as_standard_layout().into_owned();
        for field in [&mut oriented.u, &mut oriented.v, &mut oriented.t] {
            reverse_axis(field, axis);
        }
    }
    Cow::Owned(oriented)
}

fn term_input<'a>(fields: &'a DerivedFields, term: &FluxTerm) -> SpectralInput<'a> {
    match &term.inputs {
        TermInputs::Single(component) => SpectralInput::Single(fields.view(component.field)),
        TermInputs::Paired { first, second, .. } => {
            SpectralInput::Pair(fields.view(first.field), fields.view(second.field))
        }
    }
}

/// Run every registered term through the estimator and collect the results
pub fn assemble_spectra<E: SpectralEstimator + ?Sized>(
    state: &AtmosphericState,
    fields: &DerivedFields,
    settings: &SpectralSettings,
    estimator: &mut E,
) -> Result<OutputDataset, PipelineError> {
    let builder = DatasetBuilder::new(&state.level, &state.lat, state.global_attributes.clone());
    let builder = FLUX_TERMS.iter().try_fold(builder, |builder, term| {
        info!("Computing {} spectra", term.name);
        let result = estimator
            .estimate(term_input(fields, term), settings)
            .map_err(|source| PipelineError::Spectral {
                term: term.name,
                source,
            })?;
        debug!("Estimated {} spectrum {:?}", term.name, result.spectrum.shape());
        Ok::<_, PipelineError>(builder.absorb(term, result)?)
    })?;
    Ok(builder.finish()?)
}

/// Compute the full spectral dataset for one input state
pub fn compute_spectra<E: SpectralEstimator + ?Sized>(
    state: &AtmosphericState,
    config: &SpectraConfig,
    estimator: &mut E,
) -> Result<OutputDataset, PipelineError> {
    validate_state(state)?;
    let state = orient_axes(state);
    let state = state.as_ref();
    let intervals = sampling_intervals(state)?;
    let settings = SpectralSettings {
        window: config.window,
        detrend: config.detrend,
        nperseg: config.segment_length,
        ..SpectralSettings::new(intervals.dt, intervals.dlon)
    };
    debug!(
        "dt = {} days, dlon = {} of a circle, window {:?}",
        intervals.dt, intervals.dlon, settings.window
    );

    let fields = DerivedFields::derive(state, config.meridional_clinic)?;
    let dataset = assemble_spectra(state, &fields, &settings, estimator)?;

    for variable in dataset.variables.values() {
        debug!("{} {:?} {:?}", variable.name, variable.dims, variable.data.shape());
    }
    info!(
        "Computed {} spectra over {} frequencies and {} wavenumbers",
        dataset.variables.len(),
        dataset.coordinate("frequency").map_or(0, |c| c.len()),
        dataset.coordinate("wavenumber").map_or(0, |c| c.len()),
    );
    Ok(dataset)
}

/// Load from `source`, compute, and hand the dataset to `sink`
pub fn run<S, W, E>(
    source: &S,
    sink: &W,
    estimator: &mut E,
    config: &SpectraConfig,
) -> Result<OutputDataset, PipelineError>
where
    S: GridSource + ?Sized,
    W: DatasetSink + ?Sized,
    E: SpectralEstimator + ?Sized,
{
    let state = source.load(&config.names)?;
    let dataset = compute_spectra(&state, config, estimator)?;
    sink.write(&dataset)?;
    info!("Wrote {}", sink.output_path().display());
    Ok(dataset)
}
