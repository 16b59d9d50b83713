pub mod assembler;
pub mod fields;
pub mod pipeline;
pub mod registry;

pub use assembler::{DatasetBuilder, OutputDataset, OutputVariable};
pub use pipeline::{compute_spectra, run, PipelineError};
pub use registry::{FieldId, FluxTerm, FLUX_TERMS};
