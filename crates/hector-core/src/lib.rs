//! Core machinery for component-based simple Earth-system models.
//!
//! A model is a set of [`Component`](component::Component)s owned by a
//! [`Core`](core::Core). Components announce the data they provide in a
//! capability registry and read each other only through messages routed by
//! the core. Every exchanged value is a [`UnitValue`](units::UnitValue), and
//! components keep their history in [`Timeseries`](timeseries::Timeseries).
//! Output is produced by visitors that the core walks over the model after
//! each simulated year.

pub mod capability;
pub mod component;
pub mod config;
pub mod core;
pub mod errors;
pub mod logger;
pub mod message;
pub mod timeseries;
pub mod units;
pub mod visitor;

#[cfg(test)]
mod example_components;
