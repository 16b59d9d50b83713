use ndarray::{Array3, Array4, ArrayViewD};

use crate::data_io::AtmosphericState;
use crate::math::eddy::{EddyError, EddyFields, MeridionalClinic};
use crate::spectra::registry::FieldId;

/// Every field a flux term can ask for, computed once per run
#[derive(Debug, Clone)]
pub struct DerivedFields {
    pub eddies: EddyFields,
    pub kinetic_energy: Array4<f64>,
    pub barotropic_kinetic_energy: Array3<f64>,
    pub baroclinic_kinetic_energy: Array4<f64>,
}

impl DerivedFields {
    pub fn derive(state: &AtmosphericState, meridional_clinic: MeridionalClinic) -> Result<Self, EddyError> {
        let eddies = EddyFields::derive(&state.u, &state.v, &state.t, &state.level_bounds, meridional_clinic)?;
        Ok(Self {
            kinetic_energy: eddies.kinetic_energy(),
            barotropic_kinetic_energy: eddies.barotropic_kinetic_energy(),
            baroclinic_kinetic_energy: eddies.baroclinic_kinetic_energy(),
            eddies,
        })
    }

    /// Dynamic-rank view of one field
    pub fn view(&self, id: FieldId) -> ArrayViewD<'_, f64> {
        match id {
            FieldId::TStar => self.eddies.t_star.view().into_dyn(),
            FieldId::UStar => self.eddies.u_star.view().into_dyn(),
            FieldId::VStar => self.eddies.v_star.view().into_dyn(),
            FieldId::KineticEnergy => self.kinetic_energy.view().into_dyn(),
            FieldId::BarotropicKineticEnergy => self.barotropic_kinetic_energy.view().into_dyn(),
            FieldId::BaroclinicKineticEnergy => self.baroclinic_kinetic_energy.view().into_dyn(),
        }
    }
}
