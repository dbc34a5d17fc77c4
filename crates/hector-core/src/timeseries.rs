use crate::errors::{HectorError, HectorResult};
use crate::units::UnitValue;
use serde::{Deserialize, Serialize};

pub type Time = f64;
pub type FloatValue = f64;

/// Values that can be linearly interpolated between two bracketing entries.
pub trait Interpolate: Sized {
    /// Interpolate `fraction` of the way from `lower` to `upper`.
    fn interpolate(lower: &Self, upper: &Self, fraction: f64) -> HectorResult<Self>;
}

impl Interpolate for FloatValue {
    fn interpolate(lower: &Self, upper: &Self, fraction: f64) -> HectorResult<Self> {
        Ok(lower + (upper - lower) * fraction)
    }
}

impl Interpolate for UnitValue {
    fn interpolate(lower: &Self, upper: &Self, fraction: f64) -> HectorResult<Self> {
        let upper = upper.value_in(lower.unit())?;
        Ok(UnitValue::new(
            lower.value() + (upper - lower.value()) * fraction,
            lower.unit(),
        ))
    }
}

/// A date-indexed series of values.
///
/// Entries are kept sorted by date. Setting a value at a date that is already
/// present replaces it. Lookups either hit a stored date exactly or, when
/// interpolation has been enabled with [`Timeseries::allow_interp`], are
/// interpolated linearly between the two bracketing entries. Dates outside
/// the stored range are never extrapolated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timeseries<T> {
    name: String,
    entries: Vec<(Time, T)>,
    interpolate: bool,
}

impl<T> Timeseries<T> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
            interpolate: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Enable or disable interpolation between stored dates.
    pub fn allow_interp(&mut self, allow: bool) {
        self.interpolate = allow;
    }

    pub fn interpolates(&self) -> bool {
        self.interpolate
    }

    /// Store `value` at `date`, replacing any value already stored there.
    pub fn set(&mut self, date: Time, value: T) {
        debug_assert!(date.is_finite(), "dates must be finite");
        let index = self.entries.partition_point(|(d, _)| *d < date);
        match self.entries.get_mut(index) {
            Some(entry) if entry.0 == date => entry.1 = value,
            _ => self.entries.insert(index, (date, value)),
        }
    }

    pub fn exists(&self, date: Time) -> bool {
        self.position(date).is_ok()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn first_date(&self) -> HectorResult<Time> {
        self.entries
            .first()
            .map(|(d, _)| *d)
            .ok_or_else(|| HectorError::EmptySeries(self.name.clone()))
    }

    pub fn last_date(&self) -> HectorResult<Time> {
        self.entries
            .last()
            .map(|(d, _)| *d)
            .ok_or_else(|| HectorError::EmptySeries(self.name.clone()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (Time, &T)> {
        self.entries.iter().map(|(d, v)| (*d, v))
    }

    /// `Ok(index)` of an exact hit, or `Err(index)` of the first later entry.
    fn position(&self, date: Time) -> Result<usize, usize> {
        let index = self.entries.partition_point(|(d, _)| *d < date);
        match self.entries.get(index) {
            Some((d, _)) if *d == date => Ok(index),
            _ => Err(index),
        }
    }
}

impl<T: Clone> Timeseries<T> {
    /// The value stored at the earliest date.
    pub fn first(&self) -> HectorResult<T> {
        self.entries
            .first()
            .map(|(_, v)| v.clone())
            .ok_or_else(|| HectorError::EmptySeries(self.name.clone()))
    }

    /// The value stored at the latest date.
    pub fn last(&self) -> HectorResult<T> {
        self.entries
            .last()
            .map(|(_, v)| v.clone())
            .ok_or_else(|| HectorError::EmptySeries(self.name.clone()))
    }
}

impl<T: Clone + Interpolate> Timeseries<T> {
    /// The value at `date`.
    pub fn get(&self, date: Time) -> HectorResult<T> {
        if self.entries.is_empty() {
            return Err(HectorError::EmptySeries(self.name.clone()));
        }

        let index = match self.position(date) {
            Ok(index) => return Ok(self.entries[index].1.clone()),
            Err(index) => index,
        };

        if !self.interpolate {
            return Err(self.lookup_error(date, "no value stored and interpolation is off"));
        }
        if index == 0 || index == self.entries.len() {
            return Err(self.lookup_error(date, "outside the stored range"));
        }

        let (lower_date, lower) = &self.entries[index - 1];
        let (upper_date, upper) = &self.entries[index];
        let fraction = (date - lower_date) / (upper_date - lower_date);
        T::interpolate(lower, upper, fraction)
    }

    fn lookup_error(&self, date: Time, reason: &str) -> HectorError {
        HectorError::Lookup {
            series: self.name.clone(),
            date,
            reason: reason.to_string(),
        }
    }
}
