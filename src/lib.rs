//! A simple Earth-system model.
//!
//! The machinery lives in [`hector_core`] and the standard physical
//! components in [`hector_components`]. [`run_to_csv`] covers the common
//! case of running a configured model and writing every output quantity as
//! CSV.

pub use hector_components;
pub use hector_core;

use hector_components::standard_core;
use hector_components::visitors::{CsvSink, MemorySink, RecordSink, RecordingVisitor};
use hector_core::config::SimulationConfig;
use hector_core::errors::HectorResult;
use std::io::Write;

/// Run the standard model described by `config`, writing output to `writer`.
///
/// Spin-up years are written too when `include_spinup` is set. Output is
/// collected during the run and written once it has finished, so nothing
/// reaches `writer` if the run fails. Returns the writer after flushing it.
pub fn run_to_csv<W: Write>(
    config: &SimulationConfig,
    writer: W,
    include_spinup: bool,
) -> HectorResult<W> {
    let mut core = standard_core(config)?;
    let mut output = RecordingVisitor::new(MemorySink::new()).with_spinup(include_spinup);
    core.run(&mut [&mut output])?;
    core.shut_down();

    let records = output.into_sink().into_records();
    tracing::info!(
        run = config.core.run_name.as_str(),
        records = records.len(),
        "run complete"
    );

    let mut sink = CsvSink::new(writer);
    for record in records {
        sink.push(record)?;
    }
    sink.flush()?;
    Ok(sink.into_inner())
}
