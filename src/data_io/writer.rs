use std::fs;
use std::path::{Path, PathBuf};

use super::common::Attributes;
use super::output_trait::{DatasetSink, WriteError};
use crate::spectra::assembler::OutputDataset;

/// NetCDF writer for spectral output
pub struct NetCDFWriter {
    pub file_path: PathBuf,
}

fn put_attributes(var: &mut netcdf::VariableMut<'_>, attributes: &Attributes) -> Result<(), WriteError> {
    for (name, value) in attributes {
        var.put_attribute(name, netcdf::AttributeValue::from(value))?;
    }
    Ok(())
}

impl NetCDFWriter {
    /// Create a new NetCDF writer
    pub fn new(file_path: impl AsRef<Path>) -> Self {
        Self {
            file_path: file_path.as_ref().to_path_buf(),
        }
    }

    /// Write the dataset as NetCDF-4.
    ///
    /// An existing file at the output path is removed first. Coordinates are
    /// written as one-dimensional variables named after their dimension.
    pub fn write_dataset(&self, dataset: &OutputDataset) -> Result<(), WriteError> {
        for variable in dataset.variables.values() {
            for dim in &variable.dims {
                if !dataset.coordinates.contains_key(dim) {
                    return Err(WriteError::InvalidData(format!(
                        "variable {} uses dimension {} with no coordinate",
                        variable.name, dim
                    )));
                }
            }
        }

        if self.file_path.exists() {
            tracing::debug!("Removing existing {}", self.file_path.display());
            fs::remove_file(&self.file_path)?;
        }

        let mut file = netcdf::create(&self.file_path)?;

        for (name, value) in &dataset.attributes {
            file.add_attribute(name, netcdf::AttributeValue::from(value))?;
        }

        for coord in dataset.coordinates.values() {
            file.add_dimension(&coord.name, coord.len())?;
        }

        for coord in dataset.coordinates.values() {
            let mut var = file.add_variable::<f64>(&coord.name, &[coord.name.as_str()])?;
            put_attributes(&mut var, &coord.attributes)?;
            var.put_values(&coord.values.to_vec(), ..)?;
        }

        for variable in dataset.variables.values() {
            let dims: Vec<&str> = variable.dims.iter().map(String::as_str).collect();
            let mut var = file.add_variable::<f64>(&variable.name, &dims)?;
            put_attributes(&mut var, &variable.attributes)?;
            let values: Vec<f64> = variable.data.iter().copied().collect();
            var.put_values(&values, ..)?;
        }

        file.close()?;
        tracing::debug!(
            "Wrote {} variables to {}",
            dataset.variables.len(),
            self.file_path.display()
        );
        Ok(())
    }
}

impl DatasetSink for NetCDFWriter {
    fn write(&self, dataset: &OutputDataset) -> Result<(), WriteError> {
        self.write_dataset(dataset)
    }

    fn output_path(&self) -> &Path {
        &self.file_path
    }
}
