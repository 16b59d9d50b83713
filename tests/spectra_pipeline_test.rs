mod common;

use std::cell::RefCell;
use std::path::{Path, PathBuf};

use eddy_spectra::config::{InputNames, SpectraConfig};
use eddy_spectra::data_io::{AtmosphericState, DatasetSink, GridSource, ReaderError, WriteError};
use eddy_spectra::math::eddy::{EddyError, MeridionalClinic};
use eddy_spectra::math::spectral::Power2d;
use eddy_spectra::spectra::{compute_spectra, run, OutputDataset, PipelineError};
use ndarray::{array, s, Array1, Array4, Axis};

use common::{synthetic_state, LAG, NLAT, NLEV, NLON};

struct MemorySource(AtmosphericState);

impl GridSource for MemorySource {
    fn load(&self, _names: &InputNames) -> Result<AtmosphericState, ReaderError> {
        Ok(self.0.clone())
    }
}

struct MemorySink {
    path: PathBuf,
    written: RefCell<Vec<OutputDataset>>,
}

impl DatasetSink for MemorySink {
    fn write(&self, dataset: &OutputDataset) -> Result<(), WriteError> {
        self.written.borrow_mut().push(dataset.clone());
        Ok(())
    }

    fn output_path(&self) -> &Path {
        &self.path
    }
}

fn spectra() -> OutputDataset {
    compute_spectra(&synthetic_state(), &SpectraConfig::default(), &mut Power2d::new()).unwrap()
}

/// Sum of a spectrum over frequency and wavenumber at one level and latitude
fn total(dataset: &OutputDataset, name: &str, level: usize, lat: usize) -> f64 {
    let data = &dataset.variable(name).unwrap().data;
    data.slice(s![.., level, lat, ..]).sum()
}

fn assert_close(actual: f64, expected: f64, what: &str) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "{}: expected {}, got {}",
        what,
        expected,
        actual
    );
}

#[test]
fn test_all_variables_in_processing_order() {
    let dataset = spectra();
    assert_eq!(
        dataset.variable_names(),
        vec![
            "t_power",
            "v_power",
            "ehf_power",
            "u_power",
            "emf_power",
            "ke_power",
            "ke_tropic_power",
            "ke_clinic_power",
        ]
    );
}

#[test]
fn test_dimensions_and_coordinates() {
    let dataset = spectra();
    let coords: Vec<&str> = dataset.coordinates.keys().map(String::as_str).collect();
    assert_eq!(coords, vec!["frequency", "level", "lat", "wavenumber"]);

    let frequency = dataset.coordinate("frequency").unwrap();
    let expected = array![0.0, 0.5, 1.0, 1.5, 2.0];
    assert!(frequency.values.iter().zip(&expected).all(|(a, b)| (a - b).abs() < 1e-9));
    assert_eq!(frequency.units(), Some("cycles/day"));

    let wavenumber = dataset.coordinate("wavenumber").unwrap();
    let expected = Array1::range(-2.0, 2.0, 1.0);
    assert!(wavenumber.values.iter().zip(&expected).all(|(a, b)| (a - b).abs() < 1e-9));
    assert_eq!(wavenumber.units(), Some("none"));

    assert_eq!(dataset.coordinate("level").unwrap().units(), Some("Pa"));
    assert_eq!(dataset.coordinate("lat").unwrap().units(), Some("degrees_north"));

    for (name, variable) in &dataset.variables {
        if name == "ke_tropic_power" {
            assert_eq!(variable.dims, vec!["frequency", "lat", "wavenumber"]);
            assert_eq!(variable.data.shape(), &[5, NLAT, NLON]);
        } else {
            assert_eq!(variable.dims, vec!["frequency", "level", "lat", "wavenumber"]);
            assert_eq!(variable.data.shape(), &[5, NLEV, NLAT, NLON]);
        }
    }
}

#[test]
fn test_variable_metadata() {
    let dataset = spectra();
    let ehf = dataset.variable("ehf_power").unwrap();
    assert_eq!(ehf.long_name(), Some("eddy-heat flux co-spectrum"));
    assert_eq!(ehf.units(), Some("K*m/s"));

    let t = dataset.variable("t_power").unwrap();
    assert_eq!(t.long_name(), Some("temperature power spectrum"));
    assert_eq!(t.units(), Some("K2"));

    let ke = dataset.variable("ke_clinic_power").unwrap();
    assert_eq!(ke.long_name(), Some("baroclinic eddy-kinetic energy power spectrum"));
    assert_eq!(ke.units(), Some("m2/s2"));

    assert_eq!(
        dataset.attributes.get("title").and_then(|v| v.as_str()),
        Some("synthetic travelling wave")
    );
}

#[test]
fn test_eastward_wave_lands_at_positive_wavenumber() {
    let dataset = spectra();
    let t = &dataset.variable("t_power").unwrap().data;
    // frequency index 1 is 0.5 cycles/day, wavenumber index 3 is +1
    for l in 0..NLEV {
        for y in 0..NLAT {
            assert_close(t[[1, l, y, 3]], 2.0, "t power peak");
            assert!(t[[1, l, y, 1]].abs() < 1e-9);
        }
    }
}

#[test]
fn test_flux_cospectra_peak_in_the_wave_bin() {
    let dataset = spectra();
    let ehf = &dataset.variable("ehf_power").unwrap().data;
    let emf = &dataset.variable("emf_power").unwrap().data;
    for l in 0..NLEV {
        for y in 0..NLAT {
            let amplitude = y as f64 + 1.0;
            for f in 0..ehf.shape()[0] {
                for k in 0..NLON {
                    let (heat, momentum) = if (f, k) == (1, 3) {
                        (LAG.cos(), amplitude * LAG.cos() / 2.0)
                    } else {
                        (0.0, 0.0)
                    };
                    assert_close(ehf[[f, l, y, k]], heat, "heat flux bin");
                    assert_close(emf[[f, l, y, k]], momentum, "momentum flux bin");
                }
            }
        }
    }
}

#[test]
fn test_linear_ramp_spectra() {
    // Every field is t + 10 lev + 100 lat + 1000 lon, so the eddies are the
    // steady ramp 1000 (lon - 1.5) in grid units
    let mut state = synthetic_state();
    let ramp = Array4::from_shape_fn(state.u.raw_dim(), |(t, l, y, x)| {
        t as f64 + 10.0 * l as f64 + 100.0 * y as f64 + 1000.0 * x as f64
    });
    state.u = ramp.clone();
    state.v = ramp.clone();
    state.t = ramp;

    let dataset = compute_spectra(&state, &SpectraConfig::default(), &mut Power2d::new()).unwrap();
    // wavenumbers -2, -1, 0, +1
    let steady = [2.5e5, 5.0e5, 0.0, 5.0e5];
    for name in ["t_power", "u_power", "v_power", "ehf_power", "emf_power"] {
        let data = &dataset.variable(name).unwrap().data;
        for l in 0..NLEV {
            for y in 0..NLAT {
                for f in 0..data.shape()[0] {
                    for k in 0..NLON {
                        let expected = if f == 0 { steady[k] } else { 0.0 };
                        assert!(
                            (data[[f, l, y, k]] - expected).abs() < 1e-3,
                            "{} at ({}, {}, {}, {}): expected {}, got {}",
                            name,
                            f,
                            l,
                            y,
                            k,
                            expected,
                            data[[f, l, y, k]]
                        );
                    }
                }
                assert!((total(&dataset, name, l, y) - 1.25e6).abs() < 1e-3);
            }
        }
    }

    for l in 0..NLEV {
        for y in 0..NLAT {
            assert!((total(&dataset, "ke_power", l, y) - 2.5e6).abs() < 1e-3);
        }
    }

    // Levels differ only by a zonal constant, so the ramp is purely barotropic
    let clinic = &dataset.variable("ke_clinic_power").unwrap().data;
    assert!(clinic.iter().all(|x| x.abs() < 1e-3));
}

#[test]
fn test_spectra_sum_to_eddy_statistics() {
    let dataset = spectra();
    for l in 0..NLEV {
        for y in 0..NLAT {
            let amplitude = y as f64 + 1.0;
            assert_close(total(&dataset, "t_power", l, y), 2.0, "t variance");
            assert_close(total(&dataset, "v_power", l, y), 0.5, "v variance");
            assert_close(total(&dataset, "u_power", l, y), amplitude * amplitude / 2.0, "u variance");
            assert_close(total(&dataset, "ehf_power", l, y), LAG.cos(), "heat flux");
            assert_close(total(&dataset, "emf_power", l, y), amplitude * LAG.cos() / 2.0, "momentum flux");
            assert_close(
                total(&dataset, "ke_power", l, y),
                amplitude * amplitude / 2.0 + 0.5,
                "kinetic energy mean square",
            );
        }
    }
}

#[test]
fn test_barotropic_and_baroclinic_energy() {
    let dataset = spectra();

    let tropic = &dataset.variable("ke_tropic_power").unwrap().data;
    for y in 0..NLAT {
        let amplitude = y as f64 + 1.0;
        let sum = tropic.index_axis(Axis(1), y).sum();
        assert_close(sum, amplitude * amplitude / 2.0 + 0.5, "barotropic energy");
    }

    // The wave has no vertical structure, so nothing is left for the baroclinic part
    let clinic = &dataset.variable("ke_clinic_power").unwrap().data;
    assert!(clinic.iter().all(|x| x.abs() < 1e-9));
}

#[test]
fn test_legacy_meridional_clinic_mode() {
    let config = SpectraConfig {
        meridional_clinic: MeridionalClinic::ZonalWindDefect,
        ..SpectraConfig::default()
    };
    let dataset = compute_spectra(&synthetic_state(), &config, &mut Power2d::new()).unwrap();
    let clinic = &dataset.variable("ke_clinic_power").unwrap().data;
    assert!(clinic.sum() > 0.1);

    // Only the baroclinic term depends on the mode
    let fixed = spectra();
    assert_eq!(
        dataset.variable("ke_tropic_power"),
        fixed.variable("ke_tropic_power")
    );
}

#[test]
fn test_descending_axes_give_the_same_spectra() {
    let mut state = synthetic_state();
    state.lon.values = state.lon.values.slice(s![..;-1]).to_owned();
    state.time.values = state.time.values.slice(s![..;-1]).to_owned();
    for field in [&mut state.u, &mut state.v, &mut state.t] {
        *field = field.slice(s![..;-1, .., .., ..;-1]).to_owned();
    }

    let dataset = compute_spectra(&state, &SpectraConfig::default(), &mut Power2d::new()).unwrap();
    let expected = spectra();
    for name in expected.variable_names() {
        let a = &dataset.variable(name).unwrap().data;
        let b = &expected.variable(name).unwrap().data;
        assert!(
            a.iter().zip(b.iter()).all(|(x, y)| (x - y).abs() < 1e-9),
            "{} changed with descending axes",
            name
        );
    }
}

#[test]
fn test_single_time_step_fails() {
    let mut state = synthetic_state();
    state.time.values = state.time.values.slice(s![..1]).to_owned();
    state.u = state.u.slice(s![..1, .., .., ..]).to_owned();
    state.v = state.v.slice(s![..1, .., .., ..]).to_owned();
    state.t = state.t.slice(s![..1, .., .., ..]).to_owned();

    let err = compute_spectra(&state, &SpectraConfig::default(), &mut Power2d::new()).unwrap_err();
    assert!(matches!(
        err,
        PipelineError::InsufficientSamples { axis: "time", len: 1 }
    ));
}

#[test]
fn test_zero_thickness_levels_fail() {
    let mut state = synthetic_state();
    state.level_bounds.fill(500.0);
    let err = compute_spectra(&state, &SpectraConfig::default(), &mut Power2d::new()).unwrap_err();
    assert!(matches!(err, PipelineError::Eddy(EddyError::ZeroThickness)));
}

#[test]
fn test_run_hands_dataset_to_sink() {
    let source = MemorySource(synthetic_state());
    let sink = MemorySink {
        path: PathBuf::from("memory.nc"),
        written: RefCell::new(Vec::new()),
    };
    let dataset = run(&source, &sink, &mut Power2d::new(), &SpectraConfig::default()).unwrap();

    let written = sink.written.borrow();
    assert_eq!(written.len(), 1);
    assert_eq!(written[0], dataset);
}

#[test]
fn test_repeated_runs_are_identical() {
    assert_eq!(spectra(), spectra());
}
