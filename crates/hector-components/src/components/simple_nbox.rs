//! Carbon cycle.
//!
//! Four well-mixed pools: atmosphere, vegetation, detritus and soil. Net
//! primary production takes carbon from the atmosphere and splits it between
//! the land pools; vegetation sheds litter into detritus, and detritus and
//! soil respire back to the atmosphere at a rate scaled by a Q10 temperature
//! sensitivity. The ocean takes up a fixed fraction of the atmospheric excess
//! over pre-industrial each year.
//!
//! The pools are in equilibrium at their pre-industrial sizes, so the total
//! changes only by fossil emissions minus ocean uptake. Land use emissions
//! move carbon from vegetation to the atmosphere.
//!
//! An optional `Ca_constrain` series overrides the computed atmospheric CO2
//! on the dates it covers.

use super::{require_positive, set_dated_value, undated_value, unrecognised};
use crate::standard_data::{
    D_ATMOSPHERIC_C, D_ATM_OCEAN_FLUX, D_CA_CONSTRAINT, D_CO2_CONCENTRATIONS, D_DETRITUS_C,
    D_FFI_EMISSIONS, D_GLOBAL_TEMP, D_LUC_EMISSIONS, D_NPP, D_PREINDUSTRIAL_CO2, D_SOIL_C,
    D_VEGETATION_C,
};
use crate::visitor::HectorVisitor;
use hector_core::capability::{CapabilityRegistry, DataId};
use hector_core::component::{check_timestep, Component, Dependency, RunContext};
use hector_core::errors::{HectorError, HectorResult, ResultExt};
use hector_core::logger::ComponentLogger;
use hector_core::message::{forbid_date, require_date, MessageData};
use hector_core::timeseries::{FloatValue, Time, Timeseries};
use hector_core::units::{UnitTag, UnitValue};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const SIMPLE_NBOX_COMPONENT_NAME: &str = "simpleNbox";

/// Atmospheric carbon per unit of CO2 mixing ratio, Pg C/ppmv.
pub const PGC_PER_PPMV: FloatValue = 2.13;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimpleNboxParameters {
    /// Pre-industrial CO2 concentration
    /// unit: ppmv
    /// default: 278
    pub c0: FloatValue,
    /// unit: Pg C
    /// default: 550
    pub veg_c0: FloatValue,
    /// unit: Pg C
    /// default: 55
    pub detritus_c0: FloatValue,
    /// unit: Pg C
    /// default: 1782
    pub soil_c0: FloatValue,
    /// Pre-industrial net primary production
    /// unit: Pg C/yr
    /// default: 50
    pub npp_flux0: FloatValue,
    /// CO2 fertilisation factor
    /// default: 0.36
    pub beta: FloatValue,
    /// Respiration increase per 10 degC of warming
    /// default: 2.0
    pub q10_rh: FloatValue,
    /// Share of NPP going to vegetation
    /// default: 0.35
    pub f_nppv: FloatValue,
    /// Share of NPP going to detritus; the rest goes to soil
    /// default: 0.60
    pub f_nppd: FloatValue,
    /// Share of the atmospheric excess taken up by the ocean each year
    /// unit: 1/yr
    /// default: 0.02
    pub ocean_uptake_rate: FloatValue,
}

impl Default for SimpleNboxParameters {
    fn default() -> Self {
        Self {
            c0: 278.0,
            veg_c0: 550.0,
            detritus_c0: 55.0,
            soil_c0: 1782.0,
            npp_flux0: 50.0,
            beta: 0.36,
            q10_rh: 2.0,
            f_nppv: 0.35,
            f_nppd: 0.60,
            ocean_uptake_rate: 0.02,
        }
    }
}

impl SimpleNboxParameters {
    pub fn validate(&self) -> HectorResult<()> {
        let name = SIMPLE_NBOX_COMPONENT_NAME;
        require_positive(name, "C0", self.c0)?;
        require_positive(name, "veg_c0", self.veg_c0)?;
        require_positive(name, "detritus_c0", self.detritus_c0)?;
        require_positive(name, "soil_c0", self.soil_c0)?;
        require_positive(name, "npp_flux0", self.npp_flux0)?;
        require_positive(name, "q10_rh", self.q10_rh)?;
        let fractions = [self.f_nppv, self.f_nppd, self.ocean_uptake_rate];
        if fractions.iter().any(|f| !(0.0..=1.0).contains(f)) || self.f_nppv + self.f_nppd > 1.0 {
            return Err(HectorError::Configuration(format!(
                "{name}: NPP fractions {} and {} and ocean uptake rate {} must lie in [0, 1], \
                 with the NPP fractions summing to at most 1",
                self.f_nppv, self.f_nppd, self.ocean_uptake_rate
            )));
        }
        Ok(())
    }

    fn f_npps(&self) -> FloatValue {
        1.0 - self.f_nppv - self.f_nppd
    }

    pub fn preindustrial_pools(&self) -> CarbonPools {
        CarbonPools {
            atmosphere: self.c0 * PGC_PER_PPMV,
            vegetation: self.veg_c0,
            detritus: self.detritus_c0,
            soil: self.soil_c0,
        }
    }
}

/// Carbon held in each pool, Pg C.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CarbonPools {
    pub atmosphere: FloatValue,
    pub vegetation: FloatValue,
    pub detritus: FloatValue,
    pub soil: FloatValue,
}

impl CarbonPools {
    pub fn total(&self) -> FloatValue {
        self.atmosphere + self.vegetation + self.detritus + self.soil
    }

    /// Atmospheric CO2, ppmv.
    pub fn concentration(&self) -> FloatValue {
        self.atmosphere / PGC_PER_PPMV
    }
}

/// Fluxes over one annual step, Pg C/yr.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CarbonFluxes {
    pub npp: FloatValue,
    pub atm_ocean: FloatValue,
}

/// Values published every date.
const OUTPUTS: [DataId; 7] = [
    D_CO2_CONCENTRATIONS,
    D_ATMOSPHERIC_C,
    D_VEGETATION_C,
    D_DETRITUS_C,
    D_SOIL_C,
    D_NPP,
    D_ATM_OCEAN_FLUX,
];

#[derive(Debug)]
pub struct SimpleNboxComponent {
    parameters: SimpleNboxParameters,
    ffi_emissions: Timeseries<UnitValue>,
    luc_emissions: Timeseries<UnitValue>,
    ca_constraint: Timeseries<UnitValue>,
    outputs: BTreeMap<DataId, Timeseries<UnitValue>>,
    old_date: Time,
    logger: ComponentLogger,
}

impl Default for SimpleNboxComponent {
    fn default() -> Self {
        Self::new()
    }
}

fn interpolating(id: &DataId) -> Timeseries<UnitValue> {
    let mut series = Timeseries::new(id.as_str());
    series.allow_interp(true);
    series
}

/// Annual emissions from an optional driver; an unconfigured one emits nothing.
fn annual_emissions(series: &Timeseries<UnitValue>, date: Time) -> HectorResult<FloatValue> {
    if series.is_empty() {
        return Ok(0.0);
    }
    series.get(date)?.value_in(UnitTag::PgC)
}

impl SimpleNboxComponent {
    pub fn new() -> Self {
        Self::from_parameters(SimpleNboxParameters::default())
    }

    pub fn from_parameters(parameters: SimpleNboxParameters) -> Self {
        let outputs = OUTPUTS
            .into_iter()
            .map(|id| {
                let series = Timeseries::new(id.as_str());
                (id, series)
            })
            .collect();
        Self {
            parameters,
            ffi_emissions: interpolating(&D_FFI_EMISSIONS),
            luc_emissions: interpolating(&D_LUC_EMISSIONS),
            ca_constraint: interpolating(&D_CA_CONSTRAINT),
            outputs,
            old_date: Time::NAN,
            logger: ComponentLogger::new(),
        }
    }

    pub fn parameters(&self) -> &SimpleNboxParameters {
        &self.parameters
    }

    /// Identifiers of atmospheric CO2, the pools and the fluxes.
    pub fn outputs(&self) -> impl Iterator<Item = &DataId> {
        self.outputs.keys()
    }

    pub fn output_at(&self, id: &DataId, date: Time) -> HectorResult<UnitValue> {
        match self.outputs.get(id) {
            Some(series) => series.get(date),
            None => Err(unrecognised(SIMPLE_NBOX_COMPONENT_NAME, id)),
        }
    }

    pub fn pools_at(&self, date: Time) -> HectorResult<CarbonPools> {
        let pool = |id: &DataId| self.output_at(id, date)?.value_in(UnitTag::PgC);
        Ok(CarbonPools {
            atmosphere: pool(&D_ATMOSPHERIC_C)?,
            vegetation: pool(&D_VEGETATION_C)?,
            detritus: pool(&D_DETRITUS_C)?,
            soil: pool(&D_SOIL_C)?,
        })
    }

    /// Prescribed CO2 at `date`, ppmv, if the constraint covers it.
    pub fn constraint_at(&self, date: Time) -> HectorResult<Option<FloatValue>> {
        if self.ca_constraint.is_empty()
            || date < self.ca_constraint.first_date()?
            || date > self.ca_constraint.last_date()?
        {
            return Ok(None);
        }
        Ok(Some(self.ca_constraint.get(date)?.value_in(UnitTag::PpmvCO2)?))
    }

    /// Advance `pools` by one year.
    ///
    /// Production follows the previous year's CO2 and respiration the
    /// previous year's temperature anomaly.
    pub fn step(
        &self,
        pools: CarbonPools,
        tgav: FloatValue,
        ffi: FloatValue,
        luc: FloatValue,
    ) -> (CarbonPools, CarbonFluxes) {
        let p = &self.parameters;
        let npp = p.npp_flux0 * (1.0 + p.beta * (pools.concentration() / p.c0).ln());
        let q10 = p.q10_rh.powf(tgav / 10.0);

        let litter = p.f_nppv * p.npp_flux0 / p.veg_c0 * pools.vegetation;
        let rh_detritus = (p.f_nppv + p.f_nppd) * p.npp_flux0 / p.detritus_c0 * pools.detritus * q10;
        let rh_soil = p.f_npps() * p.npp_flux0 / p.soil_c0 * pools.soil * q10;
        let atm_ocean = p.ocean_uptake_rate * (pools.atmosphere - p.c0 * PGC_PER_PPMV);

        let next = CarbonPools {
            atmosphere: pools.atmosphere + ffi + luc - npp + rh_detritus + rh_soil - atm_ocean,
            vegetation: pools.vegetation + p.f_nppv * npp - litter - luc,
            detritus: pools.detritus + p.f_nppd * npp + litter - rh_detritus,
            soil: pools.soil + p.f_npps() * npp - rh_soil,
        };
        (next, CarbonFluxes { npp, atm_ocean })
    }

    fn record(&mut self, date: Time, pools: &CarbonPools, fluxes: &CarbonFluxes) {
        let values = [
            (D_CO2_CONCENTRATIONS, pools.concentration(), UnitTag::PpmvCO2),
            (D_ATMOSPHERIC_C, pools.atmosphere, UnitTag::PgC),
            (D_VEGETATION_C, pools.vegetation, UnitTag::PgC),
            (D_DETRITUS_C, pools.detritus, UnitTag::PgC),
            (D_SOIL_C, pools.soil, UnitTag::PgC),
            (D_NPP, fluxes.npp, UnitTag::PgC),
            (D_ATM_OCEAN_FLUX, fluxes.atm_ocean, UnitTag::PgC),
        ];
        for (id, value, unit) in values {
            self.outputs
                .entry(id.clone())
                .or_insert_with(|| Timeseries::new(id.as_str()))
                .set(date, UnitValue::new(value, unit));
        }
    }

    fn apply_data(&mut self, variable: &DataId, data: &MessageData) -> HectorResult<UnitValue> {
        let p = &mut self.parameters;
        let (field, unit) = match variable.as_str() {
            "C0" => (&mut p.c0, UnitTag::PpmvCO2),
            "veg_c0" => (&mut p.veg_c0, UnitTag::PgC),
            "detritus_c0" => (&mut p.detritus_c0, UnitTag::PgC),
            "soil_c0" => (&mut p.soil_c0, UnitTag::PgC),
            "npp_flux0" => (&mut p.npp_flux0, UnitTag::PgC),
            "beta" => (&mut p.beta, UnitTag::Unitless),
            "q10_rh" => (&mut p.q10_rh, UnitTag::Unitless),
            "f_nppv" => (&mut p.f_nppv, UnitTag::Unitless),
            "f_nppd" => (&mut p.f_nppd, UnitTag::Unitless),
            "ocean_uptake_rate" => (&mut p.ocean_uptake_rate, UnitTag::Unitless),
            _ => {
                return match variable {
                    v if *v == D_FFI_EMISSIONS => {
                        set_dated_value(&mut self.ffi_emissions, v, data, UnitTag::PgC)
                    }
                    v if *v == D_LUC_EMISSIONS => {
                        set_dated_value(&mut self.luc_emissions, v, data, UnitTag::PgC)
                    }
                    v if *v == D_CA_CONSTRAINT => {
                        set_dated_value(&mut self.ca_constraint, v, data, UnitTag::PpmvCO2)
                    }
                    v => Err(unrecognised(SIMPLE_NBOX_COMPONENT_NAME, v)),
                }
            }
        };
        let value = undated_value(variable, data, unit)?;
        *field = value.value();
        Ok(value)
    }
}

impl Component<dyn HectorVisitor> for SimpleNboxComponent {
    fn name(&self) -> &str {
        SIMPLE_NBOX_COMPONENT_NAME
    }

    fn init(&mut self, capabilities: &mut CapabilityRegistry) -> HectorResult<()> {
        self.logger.open(SIMPLE_NBOX_COMPONENT_NAME);
        for datum in OUTPUTS {
            capabilities.register(datum, SIMPLE_NBOX_COMPONENT_NAME)?;
        }
        for datum in [D_PREINDUSTRIAL_CO2, D_FFI_EMISSIONS, D_LUC_EMISSIONS, D_CA_CONSTRAINT] {
            capabilities.register(datum, SIMPLE_NBOX_COMPONENT_NAME)?;
        }
        Ok(())
    }

    fn dependencies(&self) -> Vec<Dependency> {
        vec![Dependency::previous_step(D_GLOBAL_TEMP)]
    }

    fn set_data(&mut self, variable: &DataId, data: &MessageData) -> HectorResult<UnitValue> {
        self.apply_data(variable, data)
            .with_context(|| format!("could not parse var: {variable}"))
    }

    fn get_data(&self, variable: &DataId, date: Option<Time>) -> HectorResult<UnitValue> {
        match variable {
            v if *v == D_PREINDUSTRIAL_CO2 => {
                forbid_date(date, v)?;
                Ok(UnitValue::new(self.parameters.c0, UnitTag::PpmvCO2))
            }
            v if *v == D_FFI_EMISSIONS => self.ffi_emissions.get(require_date(date, v)?),
            v if *v == D_LUC_EMISSIONS => self.luc_emissions.get(require_date(date, v)?),
            v if *v == D_CA_CONSTRAINT => self.ca_constraint.get(require_date(date, v)?),
            v => match self.outputs.get(v) {
                Some(series) => series.get(require_date(date, v)?),
                None => Err(unrecognised(SIMPLE_NBOX_COMPONENT_NAME, v)),
            },
        }
    }

    fn prepare_to_run(&mut self, ctx: &RunContext<'_, dyn HectorVisitor>) -> HectorResult<()> {
        self.parameters.validate()?;
        let pools = self.parameters.preindustrial_pools();
        let fluxes = CarbonFluxes {
            npp: self.parameters.npp_flux0,
            atm_ocean: 0.0,
        };
        self.old_date = ctx.date();
        self.record(ctx.date(), &pools, &fluxes);
        Ok(())
    }

    fn run(&mut self, date: Time, ctx: &RunContext<'_, dyn HectorVisitor>) -> HectorResult<()> {
        check_timestep(SIMPLE_NBOX_COMPONENT_NAME, self.old_date, date)?;
        let pools = self.pools_at(self.old_date)?;

        let (mut next, fluxes) = if ctx.in_spinup() {
            let fluxes = CarbonFluxes {
                npp: self.parameters.npp_flux0,
                atm_ocean: 0.0,
            };
            (pools, fluxes)
        } else {
            let tgav = ctx
                .get_data(&D_GLOBAL_TEMP, Some(self.old_date))?
                .value_in(UnitTag::DegC)?;
            let ffi = annual_emissions(&self.ffi_emissions, date)?;
            let luc = annual_emissions(&self.luc_emissions, date)?;
            self.step(pools, tgav, ffi, luc)
        };
        if !ctx.in_spinup() {
            if let Some(ca) = self.constraint_at(date)? {
                next.atmosphere = ca * PGC_PER_PPMV;
            }
        }

        self.record(date, &next, &fluxes);
        self.old_date = date;
        self.logger.debug(format_args!(
            "{date}: Ca = {} ppmv, land = {} Pg C",
            next.concentration(),
            next.vegetation + next.detritus + next.soil
        ));
        Ok(())
    }

    fn shut_down(&mut self) {
        self.logger.close();
    }

    fn accept(&self, visitor: &mut (dyn HectorVisitor + 'static)) -> HectorResult<()> {
        visitor.visit_simple_nbox(self)
    }
}
