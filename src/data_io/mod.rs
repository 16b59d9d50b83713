pub mod common;
pub mod output_trait;
pub mod reader;
pub mod utils;
pub mod writer;

pub use common::{AttributeValue, Attributes, CoordinateVariable};
pub use output_trait::{DatasetSink, WriteError};
pub use reader::*;
pub use writer::*;

use ndarray::{Array2, Array4};

/// Gridded input for the spectral pipeline
#[derive(Debug, Clone)]
pub struct AtmosphericState {
    /// Time axis, in the file's own units
    pub time: CoordinateVariable,
    /// Pressure levels
    pub level: CoordinateVariable,
    pub lat: CoordinateVariable,
    /// Longitudes in degrees, assumed evenly spaced
    pub lon: CoordinateVariable,
    /// `[lower, upper]` pressure bounds of each level, shape `[level, 2]`
    pub level_bounds: Array2<f64>,
    /// Zonal wind, `[time, level, lat, lon]`
    pub u: Array4<f64>,
    /// Meridional wind, `[time, level, lat, lon]`
    pub v: Array4<f64>,
    /// Temperature, `[time, level, lat, lon]`
    pub t: Array4<f64>,
    /// Global attributes of the source file
    pub global_attributes: Attributes,
}

impl AtmosphericState {
    /// Grid shape implied by the coordinates: `(time, level, lat, lon)`
    pub fn grid_shape(&self) -> (usize, usize, usize, usize) {
        (self.time.len(), self.level.len(), self.lat.len(), self.lon.len())
    }
}

/// Anything that can provide the pipeline's input state
pub trait GridSource {
    fn load(&self, names: &crate::config::InputNames) -> Result<AtmosphericState, ReaderError>;
}
