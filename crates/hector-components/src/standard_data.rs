//! Identifiers of the data exchanged by the standard components.
//!
//! Each identifier is provided by exactly one component. Components register
//! the identifiers they provide while initialising; configuration refers to
//! the same strings.
//!
//! Halocarbon identifiers depend on the gas and are built at runtime with
//! [`halocarbon_concentration`], [`halocarbon_forcing`] and
//! [`halocarbon_emissions`].

use hector_core::capability::DataId;

// ============================================================================
// Methane
// ============================================================================

/// Atmospheric CH4 concentration, ppbv.
pub const D_ATMOSPHERIC_CH4: DataId = DataId::from_static("CH4");
/// Pre-industrial CH4 concentration, ppbv.
pub const D_PREINDUSTRIAL_CH4: DataId = DataId::from_static("preindustrial_CH4");
/// Natural CH4 emissions, Tg CH4/yr.
pub const D_NATURAL_CH4: DataId = DataId::from_static("CH4N");
/// Anthropogenic CH4 emissions, Tg CH4/yr.
pub const D_EMISSIONS_CH4: DataId = DataId::from_static("CH4_emissions");
/// Soil sink lifetime, years.
pub const D_LIFETIME_SOIL: DataId = DataId::from_static("Tsoil");
/// Stratospheric sink lifetime, years.
pub const D_LIFETIME_STRAT: DataId = DataId::from_static("Tstrat");
/// Conversion from CH4 mass to concentration, Tg/ppbv.
pub const D_CONVERSION_CH4: DataId = DataId::from_static("UC_CH4");

// ============================================================================
// Hydroxyl radical
// ============================================================================

/// OH lifetime of CH4, years.
pub const D_LIFETIME_OH: DataId = DataId::from_static("TAU_OH");
/// Initial OH lifetime, years.
pub const D_INITIAL_LIFETIME_OH: DataId = DataId::from_static("TOH0");
pub const D_COEFFICIENT_NOX: DataId = DataId::from_static("CNOX");
pub const D_COEFFICIENT_CO: DataId = DataId::from_static("CCO");
pub const D_COEFFICIENT_NMVOC: DataId = DataId::from_static("CNMVOC");
pub const D_COEFFICIENT_CH4: DataId = DataId::from_static("CCH4");
/// NOx emissions, Tg N/yr.
pub const D_EMISSIONS_NOX: DataId = DataId::from_static("NOX_emissions");
/// CO emissions, Tg CO/yr.
pub const D_EMISSIONS_CO: DataId = DataId::from_static("CO_emissions");
/// NMVOC emissions, Tg NMVOC/yr.
pub const D_EMISSIONS_NMVOC: DataId = DataId::from_static("NMVOC_emissions");

// ============================================================================
// Ozone and aerosols
// ============================================================================

/// Tropospheric ozone, DU.
pub const D_ATMOSPHERIC_O3: DataId = DataId::from_static("O3");
/// Pre-industrial tropospheric ozone, DU.
pub const D_PREINDUSTRIAL_O3: DataId = DataId::from_static("PO3");
/// Black carbon emissions, Tg/yr.
pub const D_EMISSIONS_BC: DataId = DataId::from_static("BC_emissions");
/// Organic carbon emissions, Tg/yr.
pub const D_EMISSIONS_OC: DataId = DataId::from_static("OC_emissions");

// ============================================================================
// Radiative forcing
// ============================================================================

pub const D_RF_TOTAL: DataId = DataId::from_static("Ftot");
pub const D_RF_CO2: DataId = DataId::from_static("FCO2");
pub const D_RF_CH4: DataId = DataId::from_static("FCH4");
pub const D_RF_O3: DataId = DataId::from_static("FO3");
pub const D_RF_BC: DataId = DataId::from_static("FBC");
pub const D_RF_OC: DataId = DataId::from_static("FOC");
/// Sum of every halocarbon forcing.
pub const D_RF_HALOCARBONS: DataId = DataId::from_static("Fhalos");

// ============================================================================
// Carbon cycle
// ============================================================================

/// Atmospheric CO2, ppmv.
pub const D_CO2_CONCENTRATIONS: DataId = DataId::from_static("Ca");
/// Pre-industrial CO2, ppmv.
pub const D_PREINDUSTRIAL_CO2: DataId = DataId::from_static("C0");
/// Prescribed atmospheric CO2 that overrides the computed value, ppmv.
pub const D_CA_CONSTRAINT: DataId = DataId::from_static("Ca_constrain");
/// Fossil fuel and industrial CO2 emissions, Pg C/yr.
pub const D_FFI_EMISSIONS: DataId = DataId::from_static("ffi_emissions");
/// Land use change CO2 emissions, Pg C/yr.
pub const D_LUC_EMISSIONS: DataId = DataId::from_static("luc_emissions");
/// Carbon pools, Pg C.
pub const D_ATMOSPHERIC_C: DataId = DataId::from_static("atmos_c");
pub const D_VEGETATION_C: DataId = DataId::from_static("veg_c");
pub const D_DETRITUS_C: DataId = DataId::from_static("detritus_c");
pub const D_SOIL_C: DataId = DataId::from_static("soil_c");
/// Net primary production, Pg C/yr.
pub const D_NPP: DataId = DataId::from_static("npp");
/// Net carbon flux from the atmosphere into the ocean, Pg C/yr.
pub const D_ATM_OCEAN_FLUX: DataId = DataId::from_static("atm_ocean_flux");

// ============================================================================
// Temperature, ocean and sea level
// ============================================================================

/// Global mean surface temperature anomaly, degC.
pub const D_GLOBAL_TEMP: DataId = DataId::from_static("Tgav");
/// Deep ocean temperature anomaly, degC.
pub const D_DEEP_OCEAN_TEMP: DataId = DataId::from_static("Tdeep");
/// Net downward heat flux at the top of the atmosphere, W/m2.
pub const D_HEAT_FLUX: DataId = DataId::from_static("heatflux");
/// Equilibrium climate sensitivity, degC.
pub const D_CLIMATE_SENSITIVITY: DataId = DataId::from_static("S");
/// Ocean heat content change since the start of the run, ZJ.
pub const D_OCEAN_HEAT_CONTENT: DataId = DataId::from_static("ocean_heat_content");
/// Heat flux into the ocean, W/m2.
pub const D_OCEAN_HEAT_FLUX: DataId = DataId::from_static("ocean_heat_flux");
/// Total sea level rise, cm.
pub const D_SL_TOTAL: DataId = DataId::from_static("sl_tot");
/// Rate of sea level rise, cm/yr.
pub const D_SL_RATE: DataId = DataId::from_static("sl_rate");

// ============================================================================
// Halocarbons
// ============================================================================

/// Atmospheric concentration of `gas`, pptv.
pub fn halocarbon_concentration(gas: &str) -> DataId {
    DataId::new(format!("{gas}_concentration"))
}

/// Radiative forcing of `gas`, W/m2.
pub fn halocarbon_forcing(gas: &str) -> DataId {
    DataId::new(format!("{gas}_forcing"))
}

/// Emissions of `gas`, Gg/yr.
pub fn halocarbon_emissions(gas: &str) -> DataId {
    DataId::new(format!("{gas}_emissions"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn halocarbon_ids() {
        assert_eq!(halocarbon_concentration("SF6").as_str(), "SF6_concentration");
        assert_eq!(halocarbon_forcing("SF6").as_str(), "SF6_forcing");
        assert_eq!(halocarbon_emissions("SF6").as_str(), "SF6_emissions");
    }
}
