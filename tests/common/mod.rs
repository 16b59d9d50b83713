#![allow(dead_code)]

use std::f64::consts::PI;
use std::path::Path;

use eddy_spectra::data_io::{AtmosphericState, Attributes, CoordinateVariable};
use ndarray::{array, Array1, Array4};

pub const NT: usize = 8;
pub const NLEV: usize = 3;
pub const NLAT: usize = 2;
pub const NLON: usize = 4;

/// Phase lag of the meridional wind behind temperature
pub const LAG: f64 = 0.3;

/// Phase of an eastward wave with one cycle per circle and one cycle per series
pub fn phase(t: usize, x: usize) -> f64 {
    2.0 * PI * (x as f64 / NLON as f64 - t as f64 / NT as f64)
}

/// Six-hourly grid with a single travelling wave in every field.
///
/// `u* = (lat + 1) cos φ`, `v* = cos(φ - LAG)`, `t* = 2 cos φ`
pub fn synthetic_state() -> AtmosphericState {
    let shape = (NT, NLEV, NLAT, NLON);
    let u = Array4::from_shape_fn(shape, |(t, l, y, x)| 10.0 + l as f64 + (y as f64 + 1.0) * phase(t, x).cos());
    let v = Array4::from_shape_fn(shape, |(t, l, _, x)| 0.5 * l as f64 + (phase(t, x) - LAG).cos());
    let temp = Array4::from_shape_fn(shape, |(t, l, _, x)| 280.0 - 10.0 * l as f64 + 2.0 * phase(t, x).cos());

    let mut time = CoordinateVariable::described(
        "time",
        Array1::from_shape_fn(NT, |i| 6.0 * i as f64),
        "time",
        "hours since 2000-01-01 00:00:00",
    );
    time.attributes.insert("calendar".to_string(), "standard".into());
    let mut level = CoordinateVariable::described("plev", array![85000.0, 50000.0, 25000.0], "pressure", "Pa");
    level.attributes.insert("bounds".to_string(), "plev_bnds".into());
    let lat = CoordinateVariable::described("lat", array![-45.0, 45.0], "latitude", "degrees_north");
    let lon = CoordinateVariable::described(
        "lon",
        Array1::from_shape_fn(NLON, |i| 90.0 * i as f64),
        "longitude",
        "degrees_east",
    );

    let mut global_attributes = Attributes::new();
    global_attributes.insert("title".to_string(), "synthetic travelling wave".into());
    global_attributes.insert("Conventions".to_string(), "CF-1.8".into());

    AtmosphericState {
        time,
        level,
        lat,
        lon,
        level_bounds: array![[100000.0, 70000.0], [70000.0, 35000.0], [35000.0, 10000.0]],
        u,
        v,
        t: temp,
        global_attributes,
    }
}

fn put_coordinate(file: &mut netcdf::FileMut, coord: &CoordinateVariable) {
    let mut var = file.add_variable::<f64>(&coord.name, &[coord.name.as_str()]).unwrap();
    for (name, value) in &coord.attributes {
        var.put_attribute(name, netcdf::AttributeValue::from(value)).unwrap();
    }
    var.put_values(&coord.values.to_vec(), ..).unwrap();
}

/// Packing used for the zonal wind in [`write_packed_input`]
pub const U_SCALE: f64 = 0.001;
pub const U_OFFSET: f64 = 10.0;

/// Write a state as an input file; winds are stored as 32-bit floats
pub fn write_input(path: &Path, state: &AtmosphericState) {
    write_input_with(path, state, false);
}

/// Like [`write_input`], but `u` is stored as i16 with `scale_factor` and `add_offset`
pub fn write_packed_input(path: &Path, state: &AtmosphericState) {
    write_input_with(path, state, true);
}

fn write_input_with(path: &Path, state: &AtmosphericState, pack_u: bool) {
    let mut file = netcdf::create(path).unwrap();
    for (name, value) in &state.global_attributes {
        file.add_attribute(name, netcdf::AttributeValue::from(value)).unwrap();
    }
    for coord in [&state.time, &state.level, &state.lat, &state.lon] {
        file.add_dimension(&coord.name, coord.len()).unwrap();
    }
    file.add_dimension("bnds", 2).unwrap();
    for coord in [&state.time, &state.level, &state.lat, &state.lon] {
        put_coordinate(&mut file, coord);
    }

    let mut bounds = file.add_variable::<f64>("plev_bnds", &["plev", "bnds"]).unwrap();
    bounds
        .put_values(&state.level_bounds.iter().copied().collect::<Vec<_>>(), ..)
        .unwrap();

    let dims = ["time", "plev", "lat", "lon"];
    let winds = if pack_u {
        let mut var = file.add_variable::<i16>("u", &dims).unwrap();
        var.put_attribute("units", "m s-1").unwrap();
        var.put_attribute("scale_factor", U_SCALE).unwrap();
        var.put_attribute("add_offset", U_OFFSET).unwrap();
        let packed: Vec<i16> = state
            .u
            .iter()
            .map(|&x| ((x - U_OFFSET) / U_SCALE).round() as i16)
            .collect();
        var.put_values(&packed, ..).unwrap();
        vec![("v", &state.v)]
    } else {
        vec![("u", &state.u), ("v", &state.v)]
    };
    for (name, field) in winds {
        let mut var = file.add_variable::<f32>(name, &dims).unwrap();
        var.put_attribute("units", "m s-1").unwrap();
        let values: Vec<f32> = field.iter().map(|&x| x as f32).collect();
        var.put_values(&values, ..).unwrap();
    }
    let mut var = file.add_variable::<f64>("t", &dims).unwrap();
    var.put_attribute("units", "K").unwrap();
    var.put_values(&state.t.iter().copied().collect::<Vec<_>>(), ..).unwrap();

    file.close().unwrap();
}
