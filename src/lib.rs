pub mod config;
pub mod data_io;
pub mod math;
pub mod spectra;
pub mod timer;

pub use config::{CliArgs, InputNames, SpectraConfig};
pub use spectra::{compute_spectra, run, OutputDataset, PipelineError};
