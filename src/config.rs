use clap::{Arg, ArgMatches, Command};
use std::path::PathBuf;

use crate::math::eddy::MeridionalClinic;
use crate::math::spectral::{Detrend, Window};

/// Names of the coordinate and data variables read from the input file
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InputNames {
    pub time: String,
    pub level: String,
    pub lat: String,
    pub lon: String,
    pub level_bounds: String,
    pub zonal_wind: String,
    pub meridional_wind: String,
    pub temperature: String,
}

impl Default for InputNames {
    fn default() -> Self {
        Self {
            time: "time".to_string(),
            level: "plev".to_string(),
            lat: "lat".to_string(),
            lon: "lon".to_string(),
            level_bounds: "plev_bnds".to_string(),
            zonal_wind: "u".to_string(),
            meridional_wind: "v".to_string(),
            temperature: "t".to_string(),
        }
    }
}

/// Settings for the spectral flux decomposition
#[derive(Clone, Debug)]
pub struct SpectraConfig {
    /// Input variable names
    pub names: InputNames,
    /// Window applied along time before the transform. Boxcar keeps power
    /// values exact; tapering windows bias the normalisation.
    pub window: Window,
    /// Detrending applied along time within each segment
    pub detrend: Detrend,
    /// Segment length in time steps; `None` uses the full series
    pub segment_length: Option<usize>,
    /// How the meridional baroclinic wind is formed
    pub meridional_clinic: MeridionalClinic,
}

impl Default for SpectraConfig {
    fn default() -> Self {
        Self {
            names: InputNames::default(),
            window: Window::Boxcar,
            detrend: Detrend::None,
            segment_length: None,
            meridional_clinic: MeridionalClinic::MeridionalWind,
        }
    }
}

/// Command-line arguments of the spectra binary
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CliArgs {
    /// Input gridded dataset
    pub input_path: PathBuf,
    /// Output dataset, replaced if it exists
    pub output_path: PathBuf,
}

impl CliArgs {
    /// Parse arguments from the process command line.
    ///
    /// Exits with a usage error unless exactly two positional arguments are
    /// given.
    pub fn from_args() -> Self {
        let matches = build_cli().get_matches();
        Self::from_matches(&matches)
    }

    /// Parse arguments from an explicit iterator (first item is the program name)
    pub fn try_from_iter<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let matches = build_cli().try_get_matches_from(args)?;
        Ok(Self::from_matches(&matches))
    }

    fn from_matches(matches: &ArgMatches) -> Self {
        // Both arguments are required, clap rejects the invocation before we get here
        let input_path = matches
            .get_one::<PathBuf>("input")
            .cloned()
            .unwrap_or_default();
        let output_path = matches
            .get_one::<PathBuf>("output")
            .cloned()
            .unwrap_or_default();
        Self {
            input_path,
            output_path,
        }
    }
}

/// Build the command-line interface
pub fn build_cli() -> Command {
    Command::new("eddy_spectra")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Phase-speed and zonal-wavenumber spectra of eddy heat, momentum and kinetic energy")
        .arg(
            Arg::new("input")
                .value_name("INPUT")
                .help("Input NetCDF file with time, plev, lat, lon, plev_bnds, u, v, t")
                .value_parser(clap::value_parser!(PathBuf))
                .required(true),
        )
        .arg(
            Arg::new("output")
                .value_name("OUTPUT")
                .help("Output NetCDF file (replaced if it exists)")
                .value_parser(clap::value_parser!(PathBuf))
                .required(true),
        )
}
