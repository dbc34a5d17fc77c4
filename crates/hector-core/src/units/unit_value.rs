use super::registry::UnitTag;
use crate::errors::{HectorError, HectorResult};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Div, Mul, Neg};

/// A magnitude tagged with the unit it is expressed in.
///
/// Values are only combined when their units are compatible. Addition and
/// subtraction convert the right-hand side into the unit of the left-hand
/// side, and fail with [`HectorError::IncompatibleUnits`] otherwise.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct UnitValue {
    value: f64,
    unit: UnitTag,
}

impl UnitValue {
    pub const fn new(value: f64, unit: UnitTag) -> Self {
        Self { value, unit }
    }

    pub const fn unitless(value: f64) -> Self {
        Self::new(value, UnitTag::Unitless)
    }

    /// Replace both the magnitude and the unit.
    pub fn set(&mut self, value: f64, unit: UnitTag) {
        self.value = value;
        self.unit = unit;
    }

    /// The magnitude in the value's own unit.
    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn unit(&self) -> UnitTag {
        self.unit
    }

    /// The magnitude expressed in `unit`.
    pub fn value_in(&self, unit: UnitTag) -> HectorResult<f64> {
        let factor = self
            .unit
            .conversion_factor(unit)
            .ok_or_else(|| HectorError::IncompatibleUnits {
                from: self.unit.to_string(),
                to: unit.to_string(),
            })?;
        Ok(self.value * factor)
    }

    pub fn convert_to(&self, unit: UnitTag) -> HectorResult<UnitValue> {
        Ok(UnitValue::new(self.value_in(unit)?, unit))
    }

    pub fn try_add(&self, other: &UnitValue) -> HectorResult<UnitValue> {
        Ok(UnitValue::new(
            self.value + other.value_in(self.unit)?,
            self.unit,
        ))
    }

    pub fn try_sub(&self, other: &UnitValue) -> HectorResult<UnitValue> {
        Ok(UnitValue::new(
            self.value - other.value_in(self.unit)?,
            self.unit,
        ))
    }

    /// Dimensionless ratio of two compatible values.
    pub fn ratio(&self, other: &UnitValue) -> HectorResult<f64> {
        Ok(self.value / other.value_in(self.unit)?)
    }

    /// Parse a value and unit supplied as text, as found in configuration.
    ///
    /// `unit_str` may be empty, in which case the value is taken to already
    /// be in `expected`. Otherwise the unit is looked up and the value is
    /// converted into `expected`.
    pub fn parse(value_str: &str, unit_str: &str, expected: UnitTag) -> HectorResult<UnitValue> {
        let trimmed = value_str.trim();
        let value: f64 = trimmed.parse().map_err(|e: std::num::ParseFloatError| {
            HectorError::Parse {
                input: value_str.to_string(),
                reason: e.to_string(),
            }
        })?;

        if unit_str.trim().is_empty() {
            return Ok(UnitValue::new(value, expected));
        }

        let unit = UnitTag::from_symbol(unit_str)
            .ok_or_else(|| HectorError::UnknownUnit(unit_str.to_string()))?;
        UnitValue::new(value, unit).convert_to(expected)
    }

    /// Both sides expressed in the canonical unit of their dimension.
    fn canonical(&self) -> f64 {
        self.value * self.unit.info().factor
    }
}

impl PartialEq for UnitValue {
    fn eq(&self, other: &Self) -> bool {
        self.unit.is_compatible(other.unit) && self.canonical() == other.canonical()
    }
}

impl PartialOrd for UnitValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if !self.unit.is_compatible(other.unit) {
            return None;
        }
        self.canonical().partial_cmp(&other.canonical())
    }
}

impl Mul<f64> for UnitValue {
    type Output = UnitValue;

    fn mul(self, rhs: f64) -> UnitValue {
        UnitValue::new(self.value * rhs, self.unit)
    }
}

impl Div<f64> for UnitValue {
    type Output = UnitValue;

    fn div(self, rhs: f64) -> UnitValue {
        UnitValue::new(self.value / rhs, self.unit)
    }
}

impl Neg for UnitValue {
    type Output = UnitValue;

    fn neg(self) -> UnitValue {
        UnitValue::new(-self.value, self.unit)
    }
}

impl fmt::Display for UnitValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    #[test]
    fn parse_converts_to_expected_unit() {
        let v = UnitValue::parse("300", "Gg CH4", UnitTag::TgCH4).unwrap();
        assert_eq!(v.unit(), UnitTag::TgCH4);
        assert_relative_eq!(v.value(), 0.3);
    }

    #[test]
    fn parse_with_empty_unit_uses_expected() {
        let v = UnitValue::parse(" 700 ", "", UnitTag::PpbvCH4).unwrap();
        assert_eq!(v, UnitValue::new(700.0, UnitTag::PpbvCH4));
    }

    #[test]
    fn parse_errors() {
        let err = UnitValue::parse("seven hundred", "ppbv", UnitTag::PpbvCH4).unwrap_err();
        assert!(matches!(err, HectorError::Parse { .. }));

        let err = UnitValue::parse("700", "bananas", UnitTag::PpbvCH4).unwrap_err();
        assert!(matches!(err, HectorError::UnknownUnit(_)));
        assert_eq!(err.kind(), ErrorKind::Unit);

        let err = UnitValue::parse("700", "Tg N", UnitTag::TgCH4).unwrap_err();
        assert!(matches!(err, HectorError::IncompatibleUnits { .. }));
    }

    #[test]
    fn arithmetic_requires_compatible_units() {
        let ch4 = UnitValue::new(1.0, UnitTag::TgCH4);
        let nox = UnitValue::new(1.0, UnitTag::TgN);
        assert!(ch4.try_add(&nox).is_err());
        assert!(ch4.try_sub(&nox).is_err());

        let sum = ch4.try_add(&UnitValue::new(500.0, UnitTag::GgCH4)).unwrap();
        assert_eq!(sum.unit(), UnitTag::TgCH4);
        assert_relative_eq!(sum.value(), 1.5);
    }

    #[test]
    fn scalar_operations_keep_unit() {
        let v = UnitValue::new(4.0, UnitTag::WPerM2);
        assert_eq!((v * 2.0).unit(), UnitTag::WPerM2);
        assert_eq!((v / 2.0).value(), 2.0);
        assert_eq!((-v).value(), -4.0);
    }

    #[test]
    fn equality_normalises_units() {
        assert_eq!(
            UnitValue::new(1.0, UnitTag::Meters),
            UnitValue::new(100.0, UnitTag::Cm)
        );
        assert_ne!(
            UnitValue::new(1.0, UnitTag::TgCH4),
            UnitValue::new(1.0, UnitTag::TgN)
        );
        assert!(UnitValue::new(1.0, UnitTag::TgCH4)
            .partial_cmp(&UnitValue::new(1.0, UnitTag::TgN))
            .is_none());
        assert!(UnitValue::new(2.0, UnitTag::Cm) > UnitValue::new(10.0, UnitTag::Mm));
    }

    #[test]
    fn set_replaces_value_and_unit() {
        let mut v = UnitValue::unitless(1.0);
        v.set(2.0, UnitTag::Years);
        assert_eq!(v, UnitValue::new(2.0, UnitTag::Years));
    }

    #[test]
    fn display() {
        assert_eq!(UnitValue::new(6.6, UnitTag::Years).to_string(), "6.6 yrs");
    }

    #[test]
    fn serialises() {
        let v = UnitValue::new(700.0, UnitTag::PpbvCH4);
        let json = serde_json::to_string(&v).unwrap();
        assert_eq!(json, r#"{"value":700.0,"unit":"PpbvCH4"}"#);
        let back: UnitValue = serde_json::from_str(&json).unwrap();
        assert_eq!(back, v);
    }

    proptest! {
        #[test]
        fn addition_commutes(a in -1e6f64..1e6, b in -1e6f64..1e6) {
            let x = UnitValue::new(a, UnitTag::TgCH4);
            let y = UnitValue::new(b, UnitTag::TgCH4);
            prop_assert_eq!(x.try_add(&y).unwrap(), y.try_add(&x).unwrap());
        }

        #[test]
        fn mixed_unit_addition_commutes(a in -1e6f64..1e6, b in -1e6f64..1e6) {
            let x = UnitValue::new(a, UnitTag::TgCH4);
            let y = UnitValue::new(b, UnitTag::GgCH4);
            let xy = x.try_add(&y).unwrap().value_in(UnitTag::TgCH4).unwrap();
            let yx = y.try_add(&x).unwrap().value_in(UnitTag::TgCH4).unwrap();
            prop_assert!((xy - yx).abs() <= 1e-9 * (1.0 + xy.abs()));
        }

        #[test]
        fn parse_round_trips(a in -1e9f64..1e9) {
            let v = UnitValue::new(a, UnitTag::WPerM2);
            let parsed = UnitValue::parse(&v.value().to_string(), v.unit().symbol(), UnitTag::WPerM2).unwrap();
            prop_assert_eq!(parsed, v);
        }
    }
}
