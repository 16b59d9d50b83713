use eddy_spectra::{
    config::{CliArgs, SpectraConfig},
    data_io::{DatasetSink, GridSource, NetCDFReader, NetCDFWriter},
    math::spectral::Power2d,
    spectra::{compute_spectra, PipelineError},
    timer::StageTimer,
};
use tracing_subscriber::EnvFilter;

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    let args = CliArgs::from_args();
    if let Err(e) = run_spectra(&args) {
        tracing::error!("{}", e);
        eprintln!("Spectra computation error: {}", e);
        std::process::exit(1);
    }
}

fn run_spectra(args: &CliArgs) -> Result<(), PipelineError> {
    let config = SpectraConfig::default();
    let mut timer = StageTimer::start();

    tracing::info!("Reading {}", args.input_path.display());
    let state = NetCDFReader::new(&args.input_path).load(&config.names)?;
    timer.lap(" * Time for loading input");

    let mut estimator = Power2d::new();
    let dataset = compute_spectra(&state, &config, &mut estimator)?;
    timer.lap(" * Time for spectral transforms");

    let writer = NetCDFWriter::new(&args.output_path);
    tracing::info!("Writing {}", writer.output_path().display());
    writer.write(&dataset)?;
    timer.lap(" * Time for writing to disk");

    timer.total("TOTAL ELAPSED TIME");
    Ok(())
}
