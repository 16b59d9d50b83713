pub mod eddy;
pub mod spectral;


pub use eddy::{EddyError, EddyFields, MeridionalClinic};
pub use spectral::{Power2d, SpectralEstimator, SpectralInput, SpectralResult, SpectralSettings};
