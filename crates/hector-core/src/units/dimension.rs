//! Physical dimensions used to decide whether two units can be converted.
//!
//! The model only ever converts between units of the same dimension, for
//! example Tg CH4 and Gg CH4. Masses and mixing ratios carry the chemical
//! species they refer to, so that a mass of methane can never be mistaken for
//! a mass of nitrogen.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Chemical species attached to a mass or a mixing ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Species {
    /// No particular species (generic Gg of a halocarbon, for example).
    Any,
    CO2,
    CH4,
    /// Nitrogen, used for NOx emissions.
    N,
    CO,
    NMVOC,
    BlackCarbon,
    OrganicCarbon,
    /// Carbon in any form, for the carbon cycle pools.
    Carbon,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dimension {
    Dimensionless,
    Time,
    Mass(Species),
    MixingRatio(Species),
    /// Mass per unit of mixing ratio, e.g. the Tg/ppbv conversion for CH4.
    MassPerMixingRatio(Species),
    RadiativeFlux,
    /// Radiative flux per kelvin (feedback parameters).
    FluxPerTemperature,
    /// Heat capacity per unit area, W yr m-2 K-1.
    AreicHeatCapacity,
    /// A temperature difference or anomaly.
    Temperature,
    Length,
    Velocity,
    LengthPerTemperature,
    VelocityPerTemperature,
    ColumnOzone,
    Energy,
    /// Radiative efficiency of a well-mixed gas, W m-2 per pptv.
    FluxPerMixingRatio,
    MolarMass,
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dimension::Mass(species) => write!(f, "mass of {species:?}"),
            Dimension::MixingRatio(species) => write!(f, "mixing ratio of {species:?}"),
            Dimension::MassPerMixingRatio(species) => {
                write!(f, "mass per mixing ratio of {species:?}")
            }
            other => write!(f, "{other:?}"),
        }
    }
}
