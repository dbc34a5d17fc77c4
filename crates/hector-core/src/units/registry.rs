//! Registry of the units known to the model.
//!
//! Every unit is a [`UnitTag`]. The tag's [`UnitInfo`] records its symbol, the
//! aliases accepted when parsing, its [`Dimension`] and the factor that
//! converts a magnitude in this unit into the canonical unit of the dimension.
//!
//! # Conversion Factor Convention
//!
//! Factors multiply FROM the registered unit TO the canonical unit of its
//! dimension. For example Gg CH4 has factor 1e-3 because the canonical mass of
//! methane is the teragram.
//!
//! # Temperatures
//!
//! Model temperatures are anomalies, so `degC` and `K` are registered as
//! temperature differences and convert one to one. An absolute reading such
//! as 288 K is not a value any component accepts.

use super::dimension::{Dimension, Species};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

/// Every unit a [`UnitValue`](super::UnitValue) can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitTag {
    Unitless,
    Years,
    PpmvCO2,
    PpbvCH4,
    Pptv,
    TgCH4,
    GgCH4,
    TgN,
    GgN,
    TgCO,
    GgCO,
    TgNMVOC,
    GgNMVOC,
    TgBC,
    TgOC,
    Gg,
    TgPerPpbvCH4,
    WPerM2,
    WPerM2PerK,
    WYrPerM2PerK,
    WPerM2PerPptv,
    DegC,
    Kelvin,
    Cm,
    Mm,
    Meters,
    CmPerYr,
    MmPerYr,
    CmPerK,
    CmPerYrPerK,
    DobsonUnits,
    Zettajoules,
    Joules,
    GramsPerMole,
    PgC,
}

/// Information about a known unit.
#[derive(Debug, Clone, Copy)]
pub struct UnitInfo {
    pub tag: UnitTag,
    /// The symbol used when formatting values in this unit.
    pub symbol: &'static str,
    /// Other spellings accepted by the parser.
    pub aliases: &'static [&'static str],
    pub dimension: Dimension,
    /// Multiplier from this unit to the canonical unit of its dimension.
    pub factor: f64,
}

const fn unit(
    tag: UnitTag,
    symbol: &'static str,
    aliases: &'static [&'static str],
    dimension: Dimension,
    factor: f64,
) -> UnitInfo {
    UnitInfo {
        tag,
        symbol,
        aliases,
        dimension,
        factor,
    }
}

/// The unit table, in [`UnitTag`] declaration order.
pub static UNITS: &[UnitInfo] = &[
    unit(UnitTag::Unitless, "unitless", &["1", "-", "dimensionless"], Dimension::Dimensionless, 1.0),
    unit(UnitTag::Years, "yrs", &["yr", "year", "years", "a"], Dimension::Time, 1.0),
    unit(UnitTag::PpmvCO2, "ppmv CO2", &["ppmv", "ppm", "ppmCO2"], Dimension::MixingRatio(Species::CO2), 1.0),
    unit(UnitTag::PpbvCH4, "ppbv CH4", &["ppbv", "ppb", "ppbCH4"], Dimension::MixingRatio(Species::CH4), 1.0),
    unit(UnitTag::Pptv, "pptv", &["ppt"], Dimension::MixingRatio(Species::Any), 1.0),
    unit(UnitTag::TgCH4, "Tg CH4", &["TgCH4", "Tg CH4/yr"], Dimension::Mass(Species::CH4), 1.0),
    unit(UnitTag::GgCH4, "Gg CH4", &["GgCH4", "Gg CH4/yr"], Dimension::Mass(Species::CH4), 1e-3),
    unit(UnitTag::TgN, "Tg N", &["TgN", "Tg N/yr"], Dimension::Mass(Species::N), 1.0),
    unit(UnitTag::GgN, "Gg N", &["GgN", "Gg N/yr"], Dimension::Mass(Species::N), 1e-3),
    unit(UnitTag::TgCO, "Tg CO", &["TgCO", "Tg CO/yr"], Dimension::Mass(Species::CO), 1.0),
    unit(UnitTag::GgCO, "Gg CO", &["GgCO", "Gg CO/yr"], Dimension::Mass(Species::CO), 1e-3),
    unit(UnitTag::TgNMVOC, "Tg NMVOC", &["TgNMVOC", "Tg NMVOC/yr"], Dimension::Mass(Species::NMVOC), 1.0),
    unit(UnitTag::GgNMVOC, "Gg NMVOC", &["GgNMVOC", "Gg NMVOC/yr"], Dimension::Mass(Species::NMVOC), 1e-3),
    unit(UnitTag::TgBC, "Tg BC", &["TgBC", "Tg BC/yr"], Dimension::Mass(Species::BlackCarbon), 1.0),
    unit(UnitTag::TgOC, "Tg OC", &["TgOC", "Tg OC/yr"], Dimension::Mass(Species::OrganicCarbon), 1.0),
    unit(UnitTag::Gg, "Gg", &["Gg/yr"], Dimension::Mass(Species::Any), 1.0),
    unit(UnitTag::TgPerPpbvCH4, "Tg/ppbv", &["Tg/ppb", "Tg CH4/ppbv"], Dimension::MassPerMixingRatio(Species::CH4), 1.0),
    unit(UnitTag::WPerM2, "W/m2", &["W m-2", "W/m^2", "Wm-2"], Dimension::RadiativeFlux, 1.0),
    unit(UnitTag::WPerM2PerK, "W/m2/K", &["W m-2 K-1", "W/m^2/K"], Dimension::FluxPerTemperature, 1.0),
    unit(UnitTag::WYrPerM2PerK, "W yr/m2/K", &["W yr m-2 K-1"], Dimension::AreicHeatCapacity, 1.0),
    unit(UnitTag::WPerM2PerPptv, "W/m2/pptv", &["W m-2 ppt-1", "W/m2/ppt"], Dimension::FluxPerMixingRatio, 1.0),
    // temperature differences only
    unit(UnitTag::DegC, "degC", &["C", "deg C"], Dimension::Temperature, 1.0),
    unit(UnitTag::Kelvin, "K", &[], Dimension::Temperature, 1.0),
    unit(UnitTag::Cm, "cm", &[], Dimension::Length, 1.0),
    unit(UnitTag::Mm, "mm", &[], Dimension::Length, 0.1),
    unit(UnitTag::Meters, "m", &[], Dimension::Length, 100.0),
    unit(UnitTag::CmPerYr, "cm/yr", &["cm yr-1"], Dimension::Velocity, 1.0),
    unit(UnitTag::MmPerYr, "mm/yr", &["mm yr-1"], Dimension::Velocity, 0.1),
    unit(UnitTag::CmPerK, "cm/K", &["cm K-1"], Dimension::LengthPerTemperature, 1.0),
    unit(UnitTag::CmPerYrPerK, "cm/yr/K", &["cm yr-1 K-1"], Dimension::VelocityPerTemperature, 1.0),
    unit(UnitTag::DobsonUnits, "DU O3", &["DU"], Dimension::ColumnOzone, 1.0),
    unit(UnitTag::Zettajoules, "ZJ", &[], Dimension::Energy, 1.0),
    unit(UnitTag::Joules, "J", &[], Dimension::Energy, 1e-21),
    unit(UnitTag::GramsPerMole, "g/mol", &["g mol-1"], Dimension::MolarMass, 1.0),
    unit(UnitTag::PgC, "Pg C", &["PgC", "GtC", "Gt C", "Pg C/yr", "GtC/yr"], Dimension::Mass(Species::Carbon), 1.0),
];

/// Parser lookup from every symbol and alias to its tag.
static SYMBOLS: LazyLock<HashMap<&'static str, UnitTag>> = LazyLock::new(|| {
    let mut symbols = HashMap::new();
    for info in UNITS {
        symbols.insert(info.symbol, info.tag);
        for alias in info.aliases {
            symbols.insert(*alias, info.tag);
        }
    }
    symbols
});

impl UnitTag {
    pub fn info(&self) -> &'static UnitInfo {
        // UNITS is listed in declaration order
        &UNITS[*self as usize]
    }

    pub fn symbol(&self) -> &'static str {
        self.info().symbol
    }

    pub fn dimension(&self) -> Dimension {
        self.info().dimension
    }

    /// Look up a unit by symbol or alias.
    ///
    /// Surrounding whitespace is ignored and runs of internal whitespace are
    /// treated as a single space, so `"Tg  CH4"` resolves to [`UnitTag::TgCH4`].
    pub fn from_symbol(symbol: &str) -> Option<UnitTag> {
        let normalised = symbol.split_whitespace().collect::<Vec<_>>().join(" ");
        SYMBOLS.get(normalised.as_str()).copied()
    }

    /// Two units are compatible when they share a dimension.
    pub fn is_compatible(&self, other: UnitTag) -> bool {
        self.dimension() == other.dimension()
    }

    /// Factor that converts a magnitude in `self` into `target`.
    ///
    /// Returns `None` if the units have different dimensions.
    pub fn conversion_factor(&self, target: UnitTag) -> Option<f64> {
        if *self == target {
            return Some(1.0);
        }
        if !self.is_compatible(target) {
            return None;
        }
        Some(self.info().factor / target.info().factor)
    }
}

impl fmt::Display for UnitTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use is_close::is_close;

    #[test]
    fn table_is_in_declaration_order() {
        for (i, info) in UNITS.iter().enumerate() {
            assert_eq!(info.tag as usize, i, "{} is out of order", info.symbol);
        }
    }

    #[test]
    fn symbols_are_unique() {
        let mut seen = HashMap::new();
        for info in UNITS {
            for symbol in std::iter::once(&info.symbol).chain(info.aliases.iter()) {
                if let Some(previous) = seen.insert(*symbol, info.tag) {
                    panic!("{symbol} is used by both {previous:?} and {:?}", info.tag);
                }
            }
        }
    }

    #[test]
    fn lookup_normalises_whitespace() {
        assert_eq!(UnitTag::from_symbol("Tg CH4"), Some(UnitTag::TgCH4));
        assert_eq!(UnitTag::from_symbol("  Tg   CH4 "), Some(UnitTag::TgCH4));
        assert_eq!(UnitTag::from_symbol("ppbv"), Some(UnitTag::PpbvCH4));
        assert_eq!(UnitTag::from_symbol("W m-2"), Some(UnitTag::WPerM2));
        assert_eq!(UnitTag::from_symbol("furlongs"), None);
    }

    #[test]
    fn conversion_factors() {
        assert!(is_close!(
            UnitTag::GgCH4.conversion_factor(UnitTag::TgCH4).unwrap(),
            1e-3
        ));
        assert!(is_close!(
            UnitTag::TgCH4.conversion_factor(UnitTag::GgCH4).unwrap(),
            1e3
        ));
        assert!(is_close!(
            UnitTag::Meters.conversion_factor(UnitTag::Mm).unwrap(),
            1000.0
        ));
        assert_eq!(UnitTag::TgCH4.conversion_factor(UnitTag::TgN), None);
        assert_eq!(UnitTag::PpbvCH4.conversion_factor(UnitTag::Pptv), None);
        assert_eq!(UnitTag::PgC.conversion_factor(UnitTag::TgBC), None);
        assert_eq!(UnitTag::from_symbol("GtC/yr"), Some(UnitTag::PgC));
    }

    #[test]
    fn temperatures_are_differences() {
        assert_eq!(UnitTag::Kelvin.conversion_factor(UnitTag::DegC), Some(1.0));
        let warming = crate::units::UnitValue::parse("1.5", "K", UnitTag::DegC).unwrap();
        assert_eq!(warming.value(), 1.5);
        assert_eq!(warming.unit(), UnitTag::DegC);
    }
}
