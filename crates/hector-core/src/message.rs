use crate::capability::DataId;
use crate::errors::{HectorError, HectorResult};
use crate::timeseries::Time;
use crate::units::{UnitTag, UnitValue};
use std::fmt;
use std::str::FromStr;

/// Kinds of message routed between components by the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    GetData,
    SetData,
}

impl FromStr for Message {
    type Err = HectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "getData" => Ok(Message::GetData),
            "setData" => Ok(Message::SetData),
            other => Err(HectorError::UnknownMessage(other.to_string())),
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Message::GetData => f.write_str("getData"),
            Message::SetData => f.write_str("setData"),
        }
    }
}

/// Payload of a message.
///
/// `date` is `None` for date-independent data. A `SetData` payload carries
/// either text (as read from configuration) or an already typed value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageData {
    pub date: Option<Time>,
    pub value: String,
    pub units: String,
    pub typed: Option<UnitValue>,
}

impl MessageData {
    /// An undated request.
    pub fn undated() -> Self {
        Self::default()
    }

    /// A request for the value at `date`.
    pub fn at(date: Time) -> Self {
        Self {
            date: Some(date),
            ..Self::default()
        }
    }

    /// A textual value, parsed by the receiver into the unit it expects.
    pub fn text(value: impl Into<String>, units: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            units: units.into(),
            ..Self::default()
        }
    }

    /// A typed value, converted by the receiver into the unit it expects.
    pub fn value(value: UnitValue) -> Self {
        Self {
            typed: Some(value),
            ..Self::default()
        }
    }

    pub fn dated(mut self, date: Time) -> Self {
        self.date = Some(date);
        self
    }

    /// The carried value, converted into `expected`.
    pub fn parse(&self, expected: UnitTag) -> HectorResult<UnitValue> {
        match &self.typed {
            Some(value) => value.convert_to(expected),
            None => UnitValue::parse(&self.value, &self.units, expected),
        }
    }

    /// The date, failing if the message has none.
    pub fn require_date(&self, variable: &DataId) -> HectorResult<Time> {
        require_date(self.date, variable)
    }

    /// Fail if the message carries a date.
    pub fn forbid_date(&self, variable: &DataId) -> HectorResult<()> {
        forbid_date(self.date, variable)
    }
}

pub fn require_date(date: Option<Time>, variable: &DataId) -> HectorResult<Time> {
    date.ok_or_else(|| HectorError::InvalidDate {
        variable: variable.to_string(),
        reason: "a date is required".to_string(),
    })
}

pub fn forbid_date(date: Option<Time>, variable: &DataId) -> HectorResult<()> {
    match date {
        None => Ok(()),
        Some(date) => Err(HectorError::InvalidDate {
            variable: variable.to_string(),
            reason: format!("date-independent, but {date} was given"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;

    const D_CH4: DataId = DataId::from_static("CH4");

    #[test]
    fn message_strings() {
        assert_eq!("getData".parse::<Message>().unwrap(), Message::GetData);
        assert_eq!("setData".parse::<Message>().unwrap(), Message::SetData);
        assert!(matches!(
            "deleteData".parse::<Message>(),
            Err(HectorError::UnknownMessage(_))
        ));
        assert_eq!(Message::SetData.to_string(), "setData");
    }

    #[test]
    fn date_rules() {
        assert_eq!(MessageData::at(1800.0).require_date(&D_CH4).unwrap(), 1800.0);
        assert_eq!(
            MessageData::undated().require_date(&D_CH4).unwrap_err().kind(),
            ErrorKind::InvalidDate
        );
        assert!(MessageData::undated().forbid_date(&D_CH4).is_ok());
        assert_eq!(
            MessageData::at(1800.0).forbid_date(&D_CH4).unwrap_err().kind(),
            ErrorKind::InvalidDate
        );
    }

    #[test]
    fn parse_text_and_typed() {
        let text = MessageData::text("0.7", "ppmv").dated(1800.0);
        assert_eq!(text.date, Some(1800.0));
        assert_eq!(
            text.parse(UnitTag::PpmvCO2).unwrap(),
            UnitValue::new(0.7, UnitTag::PpmvCO2)
        );

        let typed = MessageData::value(UnitValue::new(2000.0, UnitTag::GgCH4));
        assert_eq!(
            typed.parse(UnitTag::TgCH4).unwrap(),
            UnitValue::new(2.0, UnitTag::TgCH4)
        );
        assert!(typed.parse(UnitTag::TgN).is_err());
    }
}
