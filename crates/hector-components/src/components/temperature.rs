//! Global mean temperature from a two-layer energy balance model.
//!
//! A surface layer (atmosphere and mixed-layer ocean) exchanges heat with a
//! deep ocean layer:
//!
//! ```text
//! C_s dT_s/dt = F - lambda T_s - efficacy eta (T_s - T_d)
//! C_d dT_d/dt = eta (T_s - T_d)
//! ```
//!
//! with `lambda = F2x / S`. Each year is integrated with RK4, holding the
//! forcing for the year constant. `heatflux` is the top-of-atmosphere
//! imbalance `F - lambda T_s - (efficacy - 1) eta (T_s - T_d)`.

use super::{undated_value, unrecognised};
use crate::standard_data::{
    D_CLIMATE_SENSITIVITY, D_DEEP_OCEAN_TEMP, D_GLOBAL_TEMP, D_HEAT_FLUX, D_RF_TOTAL,
};
use crate::visitor::HectorVisitor;
use hector_core::capability::{CapabilityRegistry, DataId};
use hector_core::component::{check_timestep, Component, Dependency, RunContext};
use hector_core::errors::{HectorError, HectorResult, ResultExt};
use hector_core::logger::ComponentLogger;
use hector_core::message::{forbid_date, require_date, MessageData};
use hector_core::timeseries::{FloatValue, Time, Timeseries};
use hector_core::units::{UnitTag, UnitValue};
use ode_solvers::{Rk4, System, Vector2};
use serde::{Deserialize, Serialize};

pub const TEMPERATURE_COMPONENT_NAME: &str = "temperature";

type ModelState = Vector2<FloatValue>;

/// Integration step within a year.
const STEP: Time = 0.1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemperatureParameters {
    /// Equilibrium climate sensitivity
    /// unit: degC
    /// default: 3.0
    pub climate_sensitivity: FloatValue,
    /// Forcing from doubled CO2
    /// unit: W/m2
    /// default: 3.7
    pub forcing_2x: FloatValue,
    /// unit: W yr/m2/K
    /// default: 8
    pub heat_capacity_surface: FloatValue,
    /// unit: W yr/m2/K
    /// default: 100
    pub heat_capacity_deep: FloatValue,
    /// Heat exchange coefficient between the layers
    /// unit: W/m2/K
    /// default: 0.7
    pub eta: FloatValue,
    /// Ocean heat uptake efficacy
    /// default: 1.0
    pub efficacy: FloatValue,
}

impl Default for TemperatureParameters {
    fn default() -> Self {
        Self {
            climate_sensitivity: 3.0,
            forcing_2x: 3.7,
            heat_capacity_surface: 8.0,
            heat_capacity_deep: 100.0,
            eta: 0.7,
            efficacy: 1.0,
        }
    }
}

impl TemperatureParameters {
    /// Climate feedback parameter, W/m2/K.
    pub fn lambda(&self) -> FloatValue {
        self.forcing_2x / self.climate_sensitivity
    }
}

/// The two-layer ODE system under a constant forcing.
struct TwoLayer<'a> {
    parameters: &'a TemperatureParameters,
    forcing: FloatValue,
}

impl System<Time, ModelState> for TwoLayer<'_> {
    fn system(&self, _t: Time, y: &ModelState, dy: &mut ModelState) {
        let p = self.parameters;
        let difference = y[0] - y[1];
        dy[0] = (self.forcing - p.lambda() * y[0] - p.efficacy * p.eta * difference)
            / p.heat_capacity_surface;
        dy[1] = p.eta * difference / p.heat_capacity_deep;
    }
}

#[derive(Debug)]
pub struct TemperatureComponent {
    parameters: TemperatureParameters,
    surface: Timeseries<UnitValue>,
    deep: Timeseries<UnitValue>,
    heat_flux: Timeseries<UnitValue>,
    old_date: Time,
    logger: ComponentLogger,
}

impl Default for TemperatureComponent {
    fn default() -> Self {
        Self::new()
    }
}

impl TemperatureComponent {
    pub fn new() -> Self {
        Self::from_parameters(TemperatureParameters::default())
    }

    pub fn from_parameters(parameters: TemperatureParameters) -> Self {
        Self {
            parameters,
            surface: Timeseries::new(D_GLOBAL_TEMP.as_str()),
            deep: Timeseries::new(D_DEEP_OCEAN_TEMP.as_str()),
            heat_flux: Timeseries::new(D_HEAT_FLUX.as_str()),
            old_date: Time::NAN,
            logger: ComponentLogger::new(),
        }
    }

    pub fn parameters(&self) -> &TemperatureParameters {
        &self.parameters
    }

    pub fn global_temperature_at(&self, date: Time) -> HectorResult<UnitValue> {
        self.surface.get(date)
    }

    pub fn deep_temperature_at(&self, date: Time) -> HectorResult<UnitValue> {
        self.deep.get(date)
    }

    pub fn heat_flux_at(&self, date: Time) -> HectorResult<UnitValue> {
        self.heat_flux.get(date)
    }

    /// Integrate `(T_s, T_d)` over one year under constant `forcing`.
    pub fn step(
        &self,
        t_current: Time,
        surface: FloatValue,
        deep: FloatValue,
        forcing: FloatValue,
    ) -> HectorResult<(FloatValue, FloatValue)> {
        let system = TwoLayer {
            parameters: &self.parameters,
            forcing,
        };
        let t_next = t_current + 1.0;
        let mut solver = Rk4::new(system, t_current, ModelState::new(surface, deep), t_next, STEP);
        solver
            .integrate()
            .map_err(|e| HectorError::Integration(format!("{e:?}")))?;
        let (times, states) = solver.results().get();
        match (times.last(), states.last()) {
            (Some(t), Some(state)) if (t - t_next).abs() < STEP / 2.0 => Ok((state[0], state[1])),
            _ => Err(HectorError::Integration(format!(
                "integration did not reach {t_next}"
            ))),
        }
    }

    /// Top-of-atmosphere imbalance, W/m2.
    pub fn calculate_heat_flux(
        &self,
        forcing: FloatValue,
        surface: FloatValue,
        deep: FloatValue,
    ) -> FloatValue {
        let p = &self.parameters;
        forcing - p.lambda() * surface - (p.efficacy - 1.0) * p.eta * (surface - deep)
    }

    fn apply_data(&mut self, variable: &DataId, data: &MessageData) -> HectorResult<UnitValue> {
        let p = &mut self.parameters;
        let (target, unit) = match variable.as_str() {
            "S" => (&mut p.climate_sensitivity, UnitTag::DegC),
            "F2x" => (&mut p.forcing_2x, UnitTag::WPerM2),
            "C_surface" => (&mut p.heat_capacity_surface, UnitTag::WYrPerM2PerK),
            "C_deep" => (&mut p.heat_capacity_deep, UnitTag::WYrPerM2PerK),
            "eta" => (&mut p.eta, UnitTag::WPerM2PerK),
            "efficacy" => (&mut p.efficacy, UnitTag::Unitless),
            _ => return Err(unrecognised(TEMPERATURE_COMPONENT_NAME, variable)),
        };
        let value = undated_value(variable, data, unit)?;
        *target = value.value();
        Ok(value)
    }

    fn record(&mut self, date: Time, surface: FloatValue, deep: FloatValue, flux: FloatValue) {
        self.surface.set(date, UnitValue::new(surface, UnitTag::DegC));
        self.deep.set(date, UnitValue::new(deep, UnitTag::DegC));
        self.heat_flux.set(date, UnitValue::new(flux, UnitTag::WPerM2));
    }
}

impl Component<dyn HectorVisitor> for TemperatureComponent {
    fn name(&self) -> &str {
        TEMPERATURE_COMPONENT_NAME
    }

    fn init(&mut self, capabilities: &mut CapabilityRegistry) -> HectorResult<()> {
        self.logger.open(TEMPERATURE_COMPONENT_NAME);
        for datum in [D_GLOBAL_TEMP, D_DEEP_OCEAN_TEMP, D_HEAT_FLUX, D_CLIMATE_SENSITIVITY] {
            capabilities.register(datum, TEMPERATURE_COMPONENT_NAME)?;
        }
        Ok(())
    }

    fn dependencies(&self) -> Vec<Dependency> {
        vec![Dependency::same_step(D_RF_TOTAL)]
    }

    fn set_data(&mut self, variable: &DataId, data: &MessageData) -> HectorResult<UnitValue> {
        self.apply_data(variable, data)
            .with_context(|| format!("could not parse var: {variable}"))
    }

    fn get_data(&self, variable: &DataId, date: Option<Time>) -> HectorResult<UnitValue> {
        match variable {
            v if *v == D_GLOBAL_TEMP => self.surface.get(require_date(date, v)?),
            v if *v == D_DEEP_OCEAN_TEMP => self.deep.get(require_date(date, v)?),
            v if *v == D_HEAT_FLUX => self.heat_flux.get(require_date(date, v)?),
            v if *v == D_CLIMATE_SENSITIVITY => {
                forbid_date(date, v)?;
                Ok(UnitValue::new(
                    self.parameters.climate_sensitivity,
                    UnitTag::DegC,
                ))
            }
            v => Err(unrecognised(TEMPERATURE_COMPONENT_NAME, v)),
        }
    }

    fn prepare_to_run(&mut self, ctx: &RunContext<'_, dyn HectorVisitor>) -> HectorResult<()> {
        let p = &self.parameters;
        for (name, value) in [
            ("S", p.climate_sensitivity),
            ("F2x", p.forcing_2x),
            ("C_surface", p.heat_capacity_surface),
            ("C_deep", p.heat_capacity_deep),
        ] {
            super::require_positive(TEMPERATURE_COMPONENT_NAME, name, value)?;
        }
        self.old_date = ctx.date();
        self.record(ctx.date(), 0.0, 0.0, 0.0);
        Ok(())
    }

    fn run(&mut self, date: Time, ctx: &RunContext<'_, dyn HectorVisitor>) -> HectorResult<()> {
        check_timestep(TEMPERATURE_COMPONENT_NAME, self.old_date, date)?;
        let surface = self.surface.get(self.old_date)?.value_in(UnitTag::DegC)?;
        let deep = self.deep.get(self.old_date)?.value_in(UnitTag::DegC)?;

        let (surface, deep, flux) = if ctx.in_spinup() {
            (surface, deep, 0.0)
        } else {
            let forcing = ctx
                .get_data(&D_RF_TOTAL, Some(date))?
                .value_in(UnitTag::WPerM2)?;
            let (surface, deep) = self.step(self.old_date, surface, deep, forcing)?;
            (surface, deep, self.calculate_heat_flux(forcing, surface, deep))
        };

        self.record(date, surface, deep, flux);
        self.old_date = date;
        self.logger
            .debug(format_args!("{date}: Tgav = {surface} degC, heatflux = {flux} W/m2"));
        Ok(())
    }

    fn shut_down(&mut self) {
        self.logger.close();
    }

    fn accept(&self, visitor: &mut (dyn HectorVisitor + 'static)) -> HectorResult<()> {
        visitor.visit_temperature(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn positive_forcing_warms() {
        let component = TemperatureComponent::new();
        let (surface, deep) = component.step(2000.0, 0.0, 0.0, 4.0).unwrap();
        assert!(surface > 0.0, "got {surface}");
        assert!(deep > 0.0 && deep < surface);
        // a year is far too short to reach equilibrium
        assert!(surface < 4.0 / component.parameters().lambda());
    }

    #[test]
    fn no_forcing_no_warming() {
        let component = TemperatureComponent::new();
        let (surface, deep) = component.step(2000.0, 0.0, 0.0, 0.0).unwrap();
        assert!(surface.abs() < 1e-12);
        assert!(deep.abs() < 1e-12);
    }

    #[test]
    fn response_is_linear_in_forcing() {
        let component = TemperatureComponent::new();
        let (small, _) = component.step(2000.0, 0.0, 0.0, 2.0).unwrap();
        let (large, _) = component.step(2000.0, 0.0, 0.0, 4.0).unwrap();
        assert_relative_eq!(large / small, 2.0, max_relative = 1e-9);
    }

    #[test]
    fn equilibrium_is_steady() {
        let component = TemperatureComponent::new();
        let forcing = 3.7;
        // at equilibrium both layers sit at S
        let (surface, deep) = component.step(2000.0, 3.0, 3.0, forcing).unwrap();
        assert_relative_eq!(surface, 3.0, max_relative = 1e-9);
        assert_relative_eq!(deep, 3.0, max_relative = 1e-9);
        assert_relative_eq!(
            component.calculate_heat_flux(forcing, surface, deep),
            0.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn sensitivity_is_settable() {
        let mut component = TemperatureComponent::new();
        Component::<dyn HectorVisitor>::set_data(
            &mut component,
            &D_CLIMATE_SENSITIVITY,
            &MessageData::text("4.5", "degC"),
        )
        .unwrap();
        assert_relative_eq!(component.parameters().lambda(), 3.7 / 4.5);
        assert!(Component::<dyn HectorVisitor>::set_data(
            &mut component,
            &DataId::from("eta"),
            &MessageData::text("0.7", "W/m2/K").dated(2000.0),
        )
        .is_err());
    }
}
