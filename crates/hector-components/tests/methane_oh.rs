use approx::assert_relative_eq;
use hector_components::components::{CH4Component, OHComponent};
use hector_components::standard_data::{
    D_ATMOSPHERIC_CH4, D_EMISSIONS_CH4, D_LIFETIME_OH, D_PREINDUSTRIAL_CH4,
};
use hector_components::{HectorCore, HectorVisitor};
use hector_core::capability::CapabilityRegistry;
use hector_core::component::{Component, RunContext};
use hector_core::config::{CoreConfig, SimulationConfig};
use hector_core::core::{CoreState, Phase};
use hector_core::errors::{HectorError, HectorResult};
use hector_core::message::{Message, MessageData};
use hector_core::timeseries::Time;
use hector_core::units::{UnitTag, UnitValue};
use hector_core::visitor::CoreVisitor;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn methane_core(config: &str) -> HectorCore {
    let config = SimulationConfig::from_toml_str(config).unwrap();
    let mut core = HectorCore::new(config.core.clone()).unwrap();
    core.add_component(Box::new(CH4Component::new())).unwrap();
    core.add_component(Box::new(OHComponent::new())).unwrap();
    core.init().unwrap();
    config.apply(&mut core).unwrap();
    core
}

/// Collects CH4 and the OH lifetime at every visited date.
#[derive(Default)]
struct Trace {
    date: Time,
    spinup_rounds: usize,
    ch4: Vec<(Time, f64)>,
    tau: Vec<(Time, f64)>,
}

impl CoreVisitor for Trace {
    fn should_visit(&mut self, in_spinup: bool, date: Time) -> bool {
        self.date = date;
        if in_spinup {
            self.spinup_rounds += 1;
        }
        true
    }

    fn visit_core(&mut self, state: &CoreState) -> HectorResult<()> {
        assert_eq!(state.current_date(), self.date);
        Ok(())
    }
}

impl HectorVisitor for Trace {
    fn visit_ch4(&mut self, component: &CH4Component) -> HectorResult<()> {
        let value = component.concentration_at(self.date)?;
        self.ch4.push((self.date, value.value_in(UnitTag::PpbvCH4)?));
        Ok(())
    }

    fn visit_oh(&mut self, component: &OHComponent) -> HectorResult<()> {
        let value = component.lifetime_at(self.date)?;
        self.tau.push((self.date, value.value()));
        Ok(())
    }
}

const CONFIG: &str = r#"
[core]
run_name = "methane"
start_date = 1800.0
end_date = 1803.0
spinup_years = 3

[CH4]
preindustrial_CH4 = "700 ppbv"
CH4_emissions = { 1801 = "300 Tg CH4", 1803 = "320 Tg CH4" }
"#;

#[test]
fn methane_and_oh_run_together() {
    init_tracing();
    let mut core = methane_core(CONFIG);
    let mut trace = Trace::default();
    core.run(&mut [&mut trace]).unwrap();

    // three spin-up rounds then three historical years
    assert_eq!(trace.spinup_rounds, 3);
    let dates: Vec<Time> = trace.ch4.iter().map(|(d, _)| *d).collect();
    assert_eq!(dates, vec![1798.0, 1799.0, 1800.0, 1801.0, 1802.0, 1803.0]);

    // spin-up holds the pre-industrial state
    for (_, ch4) in &trace.ch4[..3] {
        assert_eq!(*ch4, 700.0);
    }
    for (_, tau) in &trace.tau[..3] {
        assert_eq!(*tau, 6.6);
    }

    // first historical year uses TOH0 from the spun-up state
    let c0 = 700.0;
    let expected = c0 + (300.0 + 300.0) / 2.78 - c0 / 160.0 - c0 / 120.0 - c0 / 6.6;
    assert_relative_eq!(trace.ch4[3].1, expected, max_relative = 1e-12);

    // and OH responds to this year's methane
    let tau = 6.6 * (-0.32 * (expected.ln() - c0.ln())).exp();
    assert_relative_eq!(trace.tau[3].1, tau, max_relative = 1e-12);

    // the second year uses last year's lifetime and interpolated emissions
    let c1 = expected;
    let expected = c1 + (310.0 + 300.0) / 2.78 - c1 / 160.0 - c1 / 120.0 - c1 / tau;
    assert_relative_eq!(trace.ch4[4].1, expected, max_relative = 1e-12);

    // everything stays readable through the core after the run
    let ch4 = core.get_data(&D_ATMOSPHERIC_CH4, Some(1803.0)).unwrap();
    assert_eq!(ch4.value(), trace.ch4[5].1);
    let tau = core
        .send_message(Message::GetData, &D_LIFETIME_OH, &MessageData::at(1803.0))
        .unwrap();
    assert_eq!(tau.value(), trace.tau[5].1);
}

#[test]
fn preindustrial_methane_round_trips_through_messages() {
    let mut core = methane_core(CONFIG);
    let stored = core
        .send_message(
            Message::SetData,
            &D_PREINDUSTRIAL_CH4,
            &MessageData::value(UnitValue::new(0.72, UnitTag::PpmvCO2)),
        )
        .unwrap_err();
    assert!(matches!(
        stored.root_cause(),
        HectorError::IncompatibleUnits { .. }
    ));

    let stored = core
        .send_message(
            Message::SetData,
            &D_PREINDUSTRIAL_CH4,
            &MessageData::text("720", "ppbv"),
        )
        .unwrap();
    assert_eq!(stored, UnitValue::new(720.0, UnitTag::PpbvCH4));
    assert_eq!(
        core.get_data(&D_PREINDUSTRIAL_CH4, None).unwrap(),
        UnitValue::new(720.0, UnitTag::PpbvCH4)
    );
}

#[test]
fn missing_emissions_stop_the_run() {
    let config = r#"
[core]
start_date = 1800.0
end_date = 1805.0
spinup_years = 2

[CH4]
CH4_emissions = { 1801 = "300 Tg CH4", 1802 = "300 Tg CH4" }
"#;
    let mut core = methane_core(config);
    let mut trace = Trace::default();
    let err = core.run(&mut [&mut trace]).unwrap_err();

    // spin-up needs no emissions; the run fails the first year without any
    assert_eq!(trace.spinup_rounds, 2);
    assert!(matches!(err.root_cause(), HectorError::Lookup { .. }));
    assert_eq!(err.chain().last().unwrap(), "CH4 failed running to 1803");
    assert_eq!(trace.ch4.len(), 4);
    assert_eq!(core.phase(), Phase::ShutDown);
}

#[test]
fn components_refuse_to_skip_years() {
    let config = CoreConfig::default();
    let state = CoreState::new(&config);
    let registry = CapabilityRegistry::new();
    let ctx = RunContext::<dyn HectorVisitor>::detached(&state, &registry);

    let mut component = CH4Component::new();
    component.prepare_to_run(&ctx).unwrap();

    let state = state.at(config.start_date + 2.0, false);
    let ctx = RunContext::<dyn HectorVisitor>::detached(&state, &registry);
    let err = component.run(config.start_date + 2.0, &ctx).unwrap_err();
    assert!(matches!(err, HectorError::Timestep { .. }));
    assert_eq!(
        err.to_string(),
        "CH4 must advance one year at a time, asked to go from 1745 to 1747"
    );

    // with emissions in place the step is accepted and only the absent OH fails
    component
        .set_data(
            &D_EMISSIONS_CH4,
            &MessageData::text("10", "Tg CH4").dated(1746.0),
        )
        .unwrap();
    let state = state.at(config.start_date + 1.0, false);
    let ctx = RunContext::<dyn HectorVisitor>::detached(&state, &registry);
    let err = component.run(config.start_date + 1.0, &ctx).unwrap_err();
    // OH is not part of this model
    assert!(matches!(err, HectorError::UnknownVariable(_)));
}
