//! Units and unit-tagged values.
//!
//! Values exchanged between components are always [`UnitValue`]s, so that a
//! component asking for methane in ppbv cannot silently receive a mass in Tg.
//!
//! ```
//! use hector_core::units::{UnitTag, UnitValue};
//!
//! let emissions = UnitValue::parse("3000", "Gg CH4", UnitTag::TgCH4).unwrap();
//! assert_eq!(emissions, UnitValue::new(3.0, UnitTag::TgCH4));
//! ```

mod dimension;
mod registry;
mod unit_value;

pub use dimension::{Dimension, Species};
pub use registry::{UnitInfo, UnitTag, UNITS};
pub use unit_value::UnitValue;
