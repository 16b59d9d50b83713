//! Eddy (zonal-mean removed) fields and the barotropic/baroclinic split.
//!
//! All fields use the layout `[time, level, lat, lon]`; longitude is always
//! the last axis.

use ndarray::{Array, Array1, Array2, Array3, Array4, Axis, Dimension, Zip};
use thiserror::Error;

/// Axis of the vertical coordinate in 4-D fields
pub const LEVEL_AXIS: usize = 1;

#[derive(Error, Debug, PartialEq)]
pub enum EddyError {
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("Level bounds have zero total thickness")]
    ZeroThickness,
}

/// How the meridional baroclinic wind is formed.
///
/// Earlier versions of this analysis computed `v_clinic = u - v_tropic`;
/// `ZonalWindDefect` reproduces those numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MeridionalClinic {
    /// `v_clinic = v - v_tropic`
    #[default]
    MeridionalWind,
    /// `v_clinic = u - v_tropic`
    ZonalWindDefect,
}

/// Subtract the longitudinal mean at every other index.
///
/// Works for any rank; the last axis is taken as longitude.
pub fn remove_zonal_mean<D: Dimension>(field: &Array<f64, D>) -> Array<f64, D> {
    let mut eddy = field.to_owned();
    if eddy.ndim() == 0 {
        return eddy;
    }
    let lon_axis = Axis(eddy.ndim() - 1);
    for mut lane in eddy.lanes_mut(lon_axis) {
        if let Some(mean) = lane.mean() {
            lane.mapv_inplace(|x| x - mean);
        }
    }
    eddy
}

/// Pointwise `sqrt(a² + b²)`
pub fn magnitude<D: Dimension>(a: &Array<f64, D>, b: &Array<f64, D>) -> Array<f64, D> {
    Zip::from(a).and(b).map_collect(|&x, &y| (x * x + y * y).sqrt())
}

/// Pressure thickness `|upper - lower|` of each level from its bounds,
/// whichever order the bounds are stored in
pub fn layer_thickness(level_bounds: &Array2<f64>, nlev: usize) -> Result<Array1<f64>, EddyError> {
    if level_bounds.dim() != (nlev, 2) {
        return Err(EddyError::ShapeMismatch(format!(
            "level bounds have shape {:?}, expected [{}, 2]",
            level_bounds.shape(),
            nlev
        )));
    }
    let dp = (&level_bounds.column(1) - &level_bounds.column(0)).mapv(f64::abs);
    if dp.sum() == 0.0 {
        return Err(EddyError::ZeroThickness);
    }
    Ok(dp)
}

/// Barotropic and baroclinic parts of a field
#[derive(Debug, Clone)]
pub struct VerticalSplit {
    /// Thickness-weighted vertical mean, shape `[time, 1, lat, lon]`
    pub tropic: Array4<f64>,
    /// Field minus its barotropic part, shape `[time, level, lat, lon]`
    pub clinic: Array4<f64>,
}

/// Thickness-weighted vertical mean with the level kept as a singleton
pub fn barotropic(field: &Array4<f64>, dp: &Array1<f64>) -> Result<Array4<f64>, EddyError> {
    let nlev = field.len_of(Axis(LEVEL_AXIS));
    if dp.len() != nlev {
        return Err(EddyError::ShapeMismatch(format!(
            "{} layer thicknesses for {} levels",
            dp.len(),
            nlev
        )));
    }
    let total = dp.sum();
    let weights = Array4::from_shape_fn((1, nlev, 1, 1), |(_, k, _, _)| dp[k]);
    let weighted = field * &weights;
    Ok((weighted.sum_axis(Axis(LEVEL_AXIS)) / total).insert_axis(Axis(LEVEL_AXIS)))
}

/// Split a field into barotropic and baroclinic components
pub fn vertical_split(field: &Array4<f64>, dp: &Array1<f64>) -> Result<VerticalSplit, EddyError> {
    let tropic = barotropic(field, dp)?;
    let clinic = field - &tropic;
    Ok(VerticalSplit { tropic, clinic })
}

/// Eddy and vertically split fields derived from raw winds and temperature
#[derive(Debug, Clone)]
pub struct EddyFields {
    pub u_star: Array4<f64>,
    pub v_star: Array4<f64>,
    pub t_star: Array4<f64>,
    pub u_tropic: Array4<f64>,
    pub v_tropic: Array4<f64>,
    pub u_clinic: Array4<f64>,
    pub v_clinic: Array4<f64>,
}

impl EddyFields {
    /// Derive star, tropic and clinic fields.
    ///
    /// `u`, `v` and `t` must share one `[time, level, lat, lon]` shape and
    /// `level_bounds` must have one row per level.
    pub fn derive(
        u: &Array4<f64>,
        v: &Array4<f64>,
        t: &Array4<f64>,
        level_bounds: &Array2<f64>,
        meridional_clinic: MeridionalClinic,
    ) -> Result<Self, EddyError> {
        for (name, field) in [("v", v), ("t", t)] {
            if field.shape() != u.shape() {
                return Err(EddyError::ShapeMismatch(format!(
                    "{} has shape {:?}, u has shape {:?}",
                    name,
                    field.shape(),
                    u.shape()
                )));
            }
        }

        let dp = layer_thickness(level_bounds, u.len_of(Axis(LEVEL_AXIS)))?;
        let u_split = vertical_split(u, &dp)?;
        let v_tropic = barotropic(v, &dp)?;
        let v_clinic = match meridional_clinic {
            MeridionalClinic::MeridionalWind => v - &v_tropic,
            MeridionalClinic::ZonalWindDefect => u - &v_tropic,
        };

        Ok(Self {
            u_star: remove_zonal_mean(u),
            v_star: remove_zonal_mean(v),
            t_star: remove_zonal_mean(t),
            u_tropic: u_split.tropic,
            v_tropic,
            u_clinic: u_split.clinic,
            v_clinic,
        })
    }

    /// Eddy kinetic energy amplitude `sqrt(u*² + v*²)`
    pub fn kinetic_energy(&self) -> Array4<f64> {
        magnitude(&self.u_star, &self.v_star)
    }

    /// Barotropic eddy kinetic energy amplitude, shape `[time, lat, lon]`
    pub fn barotropic_kinetic_energy(&self) -> Array3<f64> {
        let energy = magnitude(
            &remove_zonal_mean(&self.u_tropic),
            &remove_zonal_mean(&self.v_tropic),
        );
        energy.index_axis_move(Axis(LEVEL_AXIS), 0)
    }

    /// Baroclinic eddy kinetic energy amplitude, shape `[time, level, lat, lon]`
    pub fn baroclinic_kinetic_energy(&self) -> Array4<f64> {
        magnitude(
            &remove_zonal_mean(&self.u_clinic),
            &remove_zonal_mean(&self.v_clinic),
        )
    }
}
