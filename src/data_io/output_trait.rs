use std::path::Path;
use thiserror::Error;

use crate::spectra::assembler::OutputDataset;

/// Error types for data writing operations
#[derive(Error, Debug)]
pub enum WriteError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("NetCDF error: {0}")]
    Netcdf(#[from] netcdf::Error),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Destination for a finished spectral dataset
pub trait DatasetSink {
    /// Persist the dataset, replacing any previous output
    fn write(&self, dataset: &OutputDataset) -> Result<(), WriteError>;

    /// Get the output file path
    fn output_path(&self) -> &Path;
}
