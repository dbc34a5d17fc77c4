//! The standard components of the Hector simple climate model.
//!
//! Methane and its OH sink, tropospheric ozone, aerosols, halocarbons, a
//! four-pool carbon cycle, radiative forcing, a two-layer temperature model, ocean heat uptake and
//! sea level rise, along with the visitor interface they dispatch to and
//! visitors that write model output.

pub mod assembly;
pub mod components;
pub mod standard_data;
pub mod visitor;
pub mod visitors;

pub use assembly::standard_core;
pub use visitor::{HectorCore, HectorVisitor};
