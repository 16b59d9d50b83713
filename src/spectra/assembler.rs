//! Incremental construction of the output dataset from per-term spectra.

use indexmap::IndexMap;
use ndarray::{Array1, ArrayD};
use thiserror::Error;

use crate::data_io::common::{AttributeValue, Attributes, CoordinateVariable};
use crate::math::spectral::SpectralResult;
use crate::spectra::registry::{FluxTerm, OutputSpec, TermInputs};

pub const FREQUENCY_DIM: &str = "frequency";
pub const LEVEL_DIM: &str = "level";
pub const LAT_DIM: &str = "lat";
pub const WAVENUMBER_DIM: &str = "wavenumber";

/// Attributes not carried over from input coordinates. Packing attributes
/// go too, since values are stored unpacked.
const DROPPED_COORDINATE_ATTRIBUTES: &[&str] = &[
    "bounds",
    "_FillValue",
    "missing_value",
    "scale_factor",
    "add_offset",
];

#[derive(Error, Debug, PartialEq)]
pub enum AssembleError {
    #[error("Spectrum of rank {0} has no dimension naming (expected 3 or 4)")]
    UnsupportedRank(usize),

    #[error("Term {term} expected {expected} but the estimator returned {found}")]
    TermMismatch {
        term: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Variable {variable}: dimension {dim} has length {found}, coordinate has {expected}")]
    DimensionMismatch {
        variable: String,
        dim: String,
        expected: usize,
        found: usize,
    },

    #[error("No flux term was processed, the dataset has no coordinates")]
    Empty,
}

/// Dimension names of a spectrum computed from a field of the given rank
pub fn spectral_dims(rank: usize) -> Result<Vec<String>, AssembleError> {
    let dims: &[&str] = match rank {
        3 => &[FREQUENCY_DIM, LAT_DIM, WAVENUMBER_DIM],
        4 => &[FREQUENCY_DIM, LEVEL_DIM, LAT_DIM, WAVENUMBER_DIM],
        other => return Err(AssembleError::UnsupportedRank(other)),
    };
    Ok(dims.iter().map(|d| d.to_string()).collect())
}

/// A named data variable of the output dataset
#[derive(Debug, Clone, PartialEq)]
pub struct OutputVariable {
    pub name: String,
    pub dims: Vec<String>,
    pub data: ArrayD<f64>,
    pub attributes: Attributes,
}

impl OutputVariable {
    /// The `long_name` attribute
    pub fn long_name(&self) -> Option<&str> {
        self.attributes.get("long_name").and_then(AttributeValue::as_str)
    }

    /// The `units` attribute
    pub fn units(&self) -> Option<&str> {
        self.attributes.get("units").and_then(AttributeValue::as_str)
    }
}

/// Spectral output: shared coordinates, spectra and global attributes
#[derive(Debug, Clone, PartialEq)]
pub struct OutputDataset {
    pub coordinates: IndexMap<String, CoordinateVariable>,
    pub variables: IndexMap<String, OutputVariable>,
    pub attributes: Attributes,
}

impl OutputDataset {
    pub fn variable(&self, name: &str) -> Option<&OutputVariable> {
        self.variables.get(name)
    }

    pub fn coordinate(&self, name: &str) -> Option<&CoordinateVariable> {
        self.coordinates.get(name)
    }

    /// Variable names in insertion order
    pub fn variable_names(&self) -> Vec<&str> {
        self.variables.keys().map(String::as_str).collect()
    }
}

/// Accumulates spectra term by term.
///
/// Coordinates are fixed by the first absorbed result. A variable that is
/// already present is never replaced.
#[derive(Debug, Clone)]
pub struct DatasetBuilder {
    level: CoordinateVariable,
    lat: CoordinateVariable,
    coordinates: Option<IndexMap<String, CoordinateVariable>>,
    variables: IndexMap<String, OutputVariable>,
    attributes: Attributes,
}

fn pass_through(coord: &CoordinateVariable, name: &str) -> CoordinateVariable {
    let mut renamed = coord.renamed(name);
    renamed
        .attributes
        .retain(|key, _| !DROPPED_COORDINATE_ATTRIBUTES.contains(&key.as_str()));
    renamed
}

impl DatasetBuilder {
    /// Start a dataset that passes through the input level and latitude
    /// coordinates and global attributes
    pub fn new(level: &CoordinateVariable, lat: &CoordinateVariable, attributes: Attributes) -> Self {
        Self {
            level: pass_through(level, LEVEL_DIM),
            lat: pass_through(lat, LAT_DIM),
            coordinates: None,
            variables: IndexMap::new(),
            attributes,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    fn ensure_coordinates(&mut self, frequency: &Array1<f64>, wavenumber: &Array1<f64>) {
        if self.coordinates.is_some() {
            return;
        }
        let mut coords = IndexMap::new();
        coords.insert(
            FREQUENCY_DIM.to_string(),
            CoordinateVariable::described(FREQUENCY_DIM, frequency.clone(), "frequency", "cycles/day"),
        );
        coords.insert(LEVEL_DIM.to_string(), self.level.clone());
        coords.insert(LAT_DIM.to_string(), self.lat.clone());
        coords.insert(
            WAVENUMBER_DIM.to_string(),
            CoordinateVariable::described(WAVENUMBER_DIM, wavenumber.clone(), "zonal wavenumber", "none"),
        );
        self.coordinates = Some(coords);
    }

    fn check_dims(&self, name: &str, dims: &[String], data: &ArrayD<f64>) -> Result<(), AssembleError> {
        let Some(coords) = &self.coordinates else {
            return Err(AssembleError::Empty);
        };
        for (dim, &found) in dims.iter().zip(data.shape()) {
            let expected = coords.get(dim).map(CoordinateVariable::len).unwrap_or(0);
            if expected != found {
                return Err(AssembleError::DimensionMismatch {
                    variable: name.to_string(),
                    dim: dim.clone(),
                    expected,
                    found,
                });
            }
        }
        Ok(())
    }

    /// Add a spectrum unless a variable of that name exists; returns whether it was added
    fn insert(&mut self, spec: &OutputSpec, description: &str, data: ArrayD<f64>) -> Result<bool, AssembleError> {
        let name = spec.variable_name();
        if self.contains(&name) {
            tracing::debug!("Keeping existing {}", name);
            return Ok(false);
        }
        let dims = spectral_dims(data.ndim())?;
        self.check_dims(&name, &dims, &data)?;

        let mut attributes = Attributes::new();
        attributes.insert(
            "long_name".to_string(),
            AttributeValue::String(format!("{} {}", spec.long, description)),
        );
        attributes.insert("units".to_string(), spec.units.into());
        self.variables.insert(
            name.clone(),
            OutputVariable {
                name,
                dims,
                data,
                attributes,
            },
        );
        Ok(true)
    }

    /// Merge the estimator result for one term
    pub fn absorb(mut self, term: &FluxTerm, result: SpectralResult) -> Result<Self, AssembleError> {
        self.ensure_coordinates(&result.frequency, &result.wavenumber);
        let SpectralResult {
            frequency,
            wavenumber,
            spectrum,
            powers,
        } = result;
        let axes = [(FREQUENCY_DIM, frequency.len()), (WAVENUMBER_DIM, wavenumber.len())];
        for (dim, found) in axes {
            let expected = self
                .coordinates
                .as_ref()
                .and_then(|coords| coords.get(dim))
                .map(CoordinateVariable::len)
                .unwrap_or(0);
            if expected != found {
                return Err(AssembleError::DimensionMismatch {
                    variable: term.name.to_string(),
                    dim: dim.to_string(),
                    expected,
                    found,
                });
            }
        }

        match (&term.inputs, powers) {
            (TermInputs::Paired { first, second, cross }, Some((power_first, power_second))) => {
                self.insert(&first.output, "power spectrum", power_first)?;
                self.insert(&second.output, "power spectrum", power_second)?;
                self.insert(cross, "co-spectrum", spectrum)?;
            }
            (TermInputs::Single(component), None) => {
                self.insert(&component.output, "power spectrum", spectrum)?;
            }
            (TermInputs::Paired { .. }, None) => {
                return Err(AssembleError::TermMismatch {
                    term: term.name,
                    expected: "a co-spectrum with component powers",
                    found: "a single power spectrum",
                });
            }
            (TermInputs::Single(_), Some(_)) => {
                return Err(AssembleError::TermMismatch {
                    term: term.name,
                    expected: "a single power spectrum",
                    found: "a co-spectrum",
                });
            }
        }
        Ok(self)
    }

    /// Freeze the dataset
    pub fn finish(self) -> Result<OutputDataset, AssembleError> {
        let coordinates = self.coordinates.ok_or(AssembleError::Empty)?;
        Ok(OutputDataset {
            coordinates,
            variables: self.variables,
            attributes: self.attributes,
        })
    }
}
