//! The fixed table of eddy transport terms analysed by the pipeline.

/// Derived field a flux term analyses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldId {
    /// Eddy temperature `t*`
    TStar,
    /// Eddy zonal wind `u*`
    UStar,
    /// Eddy meridional wind `v*`
    VStar,
    /// `sqrt(u*² + v*²)`
    KineticEnergy,
    /// Level-collapsed barotropic energy amplitude
    BarotropicKineticEnergy,
    /// Baroclinic energy amplitude
    BaroclinicKineticEnergy,
}

/// Short identifier, descriptive name and units of one output variable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputSpec {
    pub short: &'static str,
    pub long: &'static str,
    pub units: &'static str,
}

impl OutputSpec {
    /// Name of the output dataset variable
    pub fn variable_name(&self) -> String {
        format!("{}_power", self.short)
    }
}

/// A field together with the description of its power spectrum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Component {
    pub field: FieldId,
    pub output: OutputSpec,
}

/// What a term feeds to the spectral estimator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermInputs {
    /// Power spectrum of one field
    Single(Component),
    /// Co-spectrum of two fields, plus the power spectrum of each
    Paired {
        first: Component,
        second: Component,
        cross: OutputSpec,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FluxTerm {
    pub name: &'static str,
    pub inputs: TermInputs,
}

impl FluxTerm {
    /// Description of the term's own spectrum (co-spectrum or power spectrum)
    pub fn output(&self) -> &OutputSpec {
        match &self.inputs {
            TermInputs::Single(component) => &component.output,
            TermInputs::Paired { cross, .. } => cross,
        }
    }

    pub fn is_cross(&self) -> bool {
        matches!(self.inputs, TermInputs::Paired { .. })
    }
}

const TEMPERATURE: OutputSpec = OutputSpec {
    short: "t",
    long: "temperature",
    units: "K2",
};

const ZONAL_WIND: OutputSpec = OutputSpec {
    short: "u",
    long: "zonal wind",
    units: "m2/s2",
};

const MERIDIONAL_WIND: OutputSpec = OutputSpec {
    short: "v",
    long: "meridional wind",
    units: "m2/s2",
};

/// Terms in processing order. Earlier terms win when two terms share a
/// component power spectrum.
pub const FLUX_TERMS: &[FluxTerm] = &[
    FluxTerm {
        name: "ehf",
        inputs: TermInputs::Paired {
            first: Component {
                field: FieldId::TStar,
                output: TEMPERATURE,
            },
            second: Component {
                field: FieldId::VStar,
                output: MERIDIONAL_WIND,
            },
            cross: OutputSpec {
                short: "ehf",
                long: "eddy-heat flux",
                units: "K*m/s",
            },
        },
    },
    FluxTerm {
        name: "emf",
        inputs: TermInputs::Paired {
            first: Component {
                field: FieldId::UStar,
                output: ZONAL_WIND,
            },
            second: Component {
                field: FieldId::VStar,
                output: MERIDIONAL_WIND,
            },
            cross: OutputSpec {
                short: "emf",
                long: "eddy-momentum flux",
                units: "m2/s2",
            },
        },
    },
    FluxTerm {
        name: "ke",
        inputs: TermInputs::Single(Component {
            field: FieldId::KineticEnergy,
            output: OutputSpec {
                short: "ke",
                long: "eddy-kinetic energy",
                units: "m2/s2",
            },
        }),
    },
    FluxTerm {
        name: "ke_tropic",
        inputs: TermInputs::Single(Component {
            field: FieldId::BarotropicKineticEnergy,
            output: OutputSpec {
                short: "ke_tropic",
                long: "barotropic eddy-kinetic energy",
                units: "m2/s2",
            },
        }),
    },
    FluxTerm {
        name: "ke_clinic",
        inputs: TermInputs::Single(Component {
            field: FieldId::BaroclinicKineticEnergy,
            output: OutputSpec {
                short: "ke_clinic",
                long: "baroclinic eddy-kinetic energy",
                units: "m2/s2",
            },
        }),
    },
];
