use ndarray::{Array1, Array2, Array4};
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::common::{AttributeValue, Attributes, CoordinateVariable};
use super::utils::validate_field_dimensions;
use super::{AtmosphericState, GridSource};
use crate::config::InputNames;

#[derive(Error, Debug)]
pub enum ReaderError {
    #[error("NetCDF error: {0}")]
    Netcdf(#[from] netcdf::Error),

    #[error("Variable not found: {0}")]
    MissingVariable(String),

    #[error("Variable {name} has {found} dimensions, expected {expected}")]
    UnexpectedRank {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("Invalid dimensions: {0}")]
    InvalidDimensions(String),

    #[error("Array shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    #[error("File not found: {0}")]
    FileNotFound(String),
}

/// NetCDF reader for gridded atmospheric input
pub struct NetCDFReader {
    pub file_path: PathBuf,
}

impl NetCDFReader {
    /// Create a new NetCDF reader
    pub fn new(file_path: impl AsRef<Path>) -> Self {
        Self {
            file_path: file_path.as_ref().to_path_buf(),
        }
    }

    /// Check that the file exists before any NetCDF call
    pub fn validate_file(&self) -> Result<(), ReaderError> {
        if !self.file_path.exists() {
            return Err(ReaderError::FileNotFound(self.file_path.display().to_string()));
        }
        Ok(())
    }

    fn open(&self) -> Result<netcdf::File, ReaderError> {
        self.validate_file()?;
        netcdf::open(&self.file_path).map_err(ReaderError::Netcdf)
    }

    /// Read coordinates, level bounds, winds, temperature and global
    /// attributes. The file is closed before returning.
    pub fn read_state(&self, names: &InputNames) -> Result<AtmosphericState, ReaderError> {
        let file = self.open()?;
        tracing::debug!("Reading {}", self.file_path.display());

        let time = read_coordinate(&file, &names.time)?;
        let level = read_coordinate(&file, &names.level)?;
        let lat = read_coordinate(&file, &names.lat)?;
        let lon = read_coordinate(&file, &names.lon)?;

        let (bounds, bounds_shape) = read_values(&file, &names.level_bounds)?;
        if bounds_shape.len() != 2 {
            return Err(ReaderError::UnexpectedRank {
                name: names.level_bounds.clone(),
                expected: 2,
                found: bounds_shape.len(),
            });
        }
        let level_bounds = Array2::from_shape_vec((bounds_shape[0], bounds_shape[1]), bounds)?;

        let u = read_field(&file, &names.zonal_wind)?;
        let v = read_field(&file, &names.meridional_wind)?;
        let t = read_field(&file, &names.temperature)?;

        let global_attributes = collect_attributes(file.attributes())?;

        Ok(AtmosphericState {
            time,
            level,
            lat,
            lon,
            level_bounds,
            u,
            v,
            t,
            global_attributes,
        })
    }
}

impl GridSource for NetCDFReader {
    fn load(&self, names: &InputNames) -> Result<AtmosphericState, ReaderError> {
        self.read_state(names)
    }
}

/// Collect attributes whose value kind is representable, in file order
fn collect_attributes<'f>(
    attributes: impl Iterator<Item = netcdf::Attribute<'f>>,
) -> Result<Attributes, ReaderError> {
    let mut collected = Attributes::new();
    for attribute in attributes {
        match AttributeValue::from_netcdf(attribute.value()?) {
            Some(value) => {
                collected.insert(attribute.name().to_string(), value);
            }
            None => tracing::debug!("Skipping attribute {} of unsupported type", attribute.name()),
        }
    }
    Ok(collected)
}

/// Numeric attribute as f64, whatever its stored type
fn numeric_attribute(var: &netcdf::Variable, name: &str) -> Result<Option<f64>, ReaderError> {
    use netcdf::AttributeValue as Nc;
    let Some(attribute) = var.attribute(name) else {
        return Ok(None);
    };
    let value = match attribute.value()? {
        Nc::Schar(x) => f64::from(x),
        Nc::Uchar(x) => f64::from(x),
        Nc::Short(x) => f64::from(x),
        Nc::Ushort(x) => f64::from(x),
        Nc::Int(x) => f64::from(x),
        Nc::Uint(x) => f64::from(x),
        Nc::Float(x) => f64::from(x),
        Nc::Double(x) => x,
        Nc::Shorts(xs) if xs.len() == 1 => f64::from(xs[0]),
        Nc::Ints(xs) if xs.len() == 1 => f64::from(xs[0]),
        Nc::Floats(xs) if xs.len() == 1 => f64::from(xs[0]),
        Nc::Doubles(xs) if xs.len() == 1 => xs[0],
        other => {
            tracing::warn!("Ignoring non-numeric {} on {}: {:?}", name, var.name(), other);
            return Ok(None);
        }
    };
    Ok(Some(value))
}

/// Read a variable as f64, masking `_FillValue`/`missing_value` to NaN and
/// applying `scale_factor` and `add_offset`
fn read_unpacked(var: &netcdf::Variable) -> Result<Vec<f64>, ReaderError> {
    let scale = numeric_attribute(var, "scale_factor")?.unwrap_or(1.0);
    let offset = numeric_attribute(var, "add_offset")?.unwrap_or(0.0);
    let fills: Vec<f64> = [
        numeric_attribute(var, "_FillValue")?,
        numeric_attribute(var, "missing_value")?,
    ]
    .into_iter()
    .flatten()
    .collect();

    let raw: Vec<f64> = var.get_values(..)?;
    let mut masked = 0usize;
    let values: Vec<f64> = raw
        .into_iter()
        .map(|x| {
            if fills.contains(&x) {
                masked += 1;
                f64::NAN
            } else {
                x * scale + offset
            }
        })
        .collect();
    if masked > 0 {
        tracing::warn!("{}: {} fill values set to NaN", var.name(), masked);
    }
    Ok(values)
}

/// Read a variable as f64 with its dimension lengths
fn read_values(file: &netcdf::File, name: &str) -> Result<(Vec<f64>, Vec<usize>), ReaderError> {
    let var = file
        .variable(name)
        .ok_or_else(|| ReaderError::MissingVariable(name.to_string()))?;
    let values = read_unpacked(&var)?;
    let shape = var.dimensions().iter().map(|d| d.len()).collect();
    Ok((values, shape))
}

fn read_coordinate(file: &netcdf::File, name: &str) -> Result<CoordinateVariable, ReaderError> {
    let var = file
        .variable(name)
        .ok_or_else(|| ReaderError::MissingVariable(name.to_string()))?;
    let rank = var.dimensions().len();
    if rank != 1 {
        return Err(ReaderError::UnexpectedRank {
            name: name.to_string(),
            expected: 1,
            found: rank,
        });
    }
    let values = read_unpacked(&var)?;
    Ok(CoordinateVariable {
        name: name.to_string(),
        values: Array1::from(values),
        attributes: collect_attributes(var.attributes())?,
    })
}

/// Read a `[time, level, lat, lon]` field
fn read_field(file: &netcdf::File, name: &str) -> Result<Array4<f64>, ReaderError> {
    let var = file
        .variable(name)
        .ok_or_else(|| ReaderError::MissingVariable(name.to_string()))?;
    let dims: Vec<String> = var.dimensions().iter().map(|d| d.name()).collect();
    validate_field_dimensions(name, &dims).map_err(ReaderError::InvalidDimensions)?;

    let shape: Vec<usize> = var.dimensions().iter().map(|d| d.len()).collect();
    let values = read_unpacked(&var)?;
    Ok(Array4::from_shape_vec(
        (shape[0], shape[1], shape[2], shape[3]),
        values,
    )?)
}
