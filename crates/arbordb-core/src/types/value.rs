//! Typed attribute values and their canonical text forms.
//!
//! This module provides the [`Value`] enum, which represents every value
//! kind an entity attribute may carry, and [`ValueKind`], the declared kind
//! stored in a type schema.
//!
//! # Example
//!
//! ```
//! use arbordb_core::{Value, ValueKind};
//!
//! // Create values via From trait
//! let name: Value = "Alice".into();
//! let count: Value = 30i64.into();
//! let score: Value = 95.5f64.into();
//! let active: Value = true.into();
//!
//! // Access typed values
//! assert_eq!(name.as_str(), Some("Alice"));
//! assert_eq!(count.as_int(), Some(30));
//! assert_eq!(score.as_float(), Some(95.5));
//! assert_eq!(active.as_bool(), Some(true));
//!
//! // Every value knows its kind and its canonical text form
//! assert_eq!(count.kind(), ValueKind::Integer);
//! assert_eq!(count.to_text(), "30");
//! assert_eq!(Value::from_text(ValueKind::Integer, "30").unwrap(), count);
//! ```

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// The declared kind of an attribute value.
///
/// A type schema maps each attribute name to one of these kinds; assigning
/// a value of any other kind to the attribute is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ValueKind {
    /// UTF-8 text.
    String,
    /// 64-bit signed integer.
    Integer,
    /// 64-bit floating point number.
    Float,
    /// Boolean flag.
    Boolean,
    /// Calendar date without time of day.
    Date,
    /// Time of day without a date.
    Time,
    /// Combined calendar date and time of day.
    DateTime,
}

impl ValueKind {
    /// All kinds, in declaration order.
    pub const ALL: [Self; 7] = [
        Self::String,
        Self::Integer,
        Self::Float,
        Self::Boolean,
        Self::Date,
        Self::Time,
        Self::DateTime,
    ];

    /// The lowercase kind name used by the registry and the JSON
    /// interchange format.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::Time => "time",
            Self::DateTime => "datetime",
        }
    }

    /// Whether values of this kind have a total order.
    ///
    /// Booleans are the only unordered kind; comparison operators against
    /// a boolean attribute are rejected by the query layer.
    #[must_use]
    pub const fn is_ordered(self) -> bool {
        !matches!(self, Self::Boolean)
    }

    /// Check that `value` carries exactly this kind.
    ///
    /// The check is type-exact: `Float(3.0)` is rejected for
    /// [`ValueKind::Integer`] even though the value is numerically whole,
    /// and a `DateTime` at midnight is rejected for [`ValueKind::Date`].
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::TypeMismatch`] when the kinds differ.
    pub fn check(self, value: &Value) -> Result<(), CoreError> {
        let actual = value.kind();
        if actual == self {
            Ok(())
        } else {
            Err(CoreError::type_mismatch_with_value(self.as_str(), actual.as_str(), value))
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValueKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "string" => Ok(Self::String),
            "integer" => Ok(Self::Integer),
            "float" => Ok(Self::Float),
            "boolean" => Ok(Self::Boolean),
            "date" => Ok(Self::Date),
            "time" => Ok(Self::Time),
            "datetime" => Ok(Self::DateTime),
            other => Err(CoreError::Validation(format!("unknown value kind: {other:?}"))),
        }
    }
}

/// Canonical text format for dates.
const DATE_FORMAT: &str = "%Y-%m-%d";
/// Canonical text format for times of day.
const TIME_FORMAT: &str = "%H:%M:%S";
/// Canonical text format for datetimes.
const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
/// Accepted alternative datetime format (space separator).
const DATETIME_FORMAT_SPACED: &str = "%Y-%m-%d %H:%M:%S";

/// A typed attribute value.
///
/// Each variant corresponds to one [`ValueKind`]. Values are immutable once
/// constructed and carry a canonical text encoding used for import/export
/// and for text-coerced assignment.
///
/// # Supported kinds
///
/// | Variant | Rust type | Canonical text |
/// |---------|-----------|----------------|
/// | `Str` | `String` | the text itself |
/// | `Int` | `i64` | decimal digits |
/// | `Float` | `f64` | shortest round-trip decimal |
/// | `Bool` | `bool` | `true` / `false` |
/// | `Date` | `NaiveDate` | `2009-07-23` |
/// | `Time` | `NaiveTime` | `14:12:35` |
/// | `DateTime` | `NaiveDateTime` | `2009-07-23T14:12:35` |
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// UTF-8 string.
    Str(String),
    /// 64-bit signed integer.
    Int(i64),
    /// 64-bit floating point number.
    Float(f64),
    /// Boolean value.
    Bool(bool),
    /// Calendar date.
    Date(NaiveDate),
    /// Time of day.
    Time(NaiveTime),
    /// Calendar date with time of day.
    DateTime(NaiveDateTime),
}

impl Value {
    /// The kind of this value.
    #[inline]
    #[must_use]
    pub const fn kind(&self) -> ValueKind {
        match self {
            Self::Str(_) => ValueKind::String,
            Self::Int(_) => ValueKind::Integer,
            Self::Float(_) => ValueKind::Float,
            Self::Bool(_) => ValueKind::Boolean,
            Self::Date(_) => ValueKind::Date,
            Self::Time(_) => ValueKind::Time,
            Self::DateTime(_) => ValueKind::DateTime,
        }
    }

    /// Returns the value as a string slice if it is one.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the value as an integer if it is one.
    #[inline]
    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the value as a float if it is one.
    #[inline]
    #[must_use]
    pub const fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Returns the value as a boolean if it is one.
    #[inline]
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the value as a date if it is one.
    #[inline]
    #[must_use]
    pub const fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// Returns the value as a time of day if it is one.
    #[inline]
    #[must_use]
    pub const fn as_time(&self) -> Option<NaiveTime> {
        match self {
            Self::Time(t) => Some(*t),
            _ => None,
        }
    }

    /// Returns the value as a datetime if it is one.
    #[inline]
    #[must_use]
    pub const fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            Self::DateTime(dt) => Some(*dt),
            _ => None,
        }
    }

    /// The canonical text form of this value.
    ///
    /// `Value::from_text(value.kind(), &value.to_text())` reconstructs an
    /// equal value for every kind.
    #[must_use]
    pub fn to_text(&self) -> String {
        match self {
            Self::Str(s) => s.clone(),
            Self::Int(i) => i.to_string(),
            Self::Float(f) => f.to_string(),
            Self::Bool(b) => b.to_string(),
            Self::Date(d) => d.format(DATE_FORMAT).to_string(),
            Self::Time(t) => t.format(TIME_FORMAT).to_string(),
            Self::DateTime(dt) => dt.format(DATETIME_FORMAT).to_string(),
        }
    }

    /// Parse the canonical text form of a value of the given kind.
    ///
    /// The date kind additionally accepts a full datetime rendering whose
    /// time component is exactly midnight; any non-zero time component is
    /// rejected. The datetime kind accepts both the `T` and the space
    /// separator on input.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] when the text does not parse as
    /// the requested kind.
    pub fn from_text(kind: ValueKind, text: &str) -> Result<Self, CoreError> {
        match kind {
            ValueKind::String => Ok(Self::Str(text.to_owned())),
            ValueKind::Integer => text
                .parse::<i64>()
                .map(Self::Int)
                .map_err(|e| CoreError::Validation(format!("invalid integer {text:?}: {e}"))),
            ValueKind::Float => text
                .parse::<f64>()
                .map(Self::Float)
                .map_err(|e| CoreError::Validation(format!("invalid float {text:?}: {e}"))),
            ValueKind::Boolean => match text {
                "true" => Ok(Self::Bool(true)),
                "false" => Ok(Self::Bool(false)),
                _ => Err(CoreError::Validation(format!("invalid boolean {text:?}"))),
            },
            ValueKind::Date => parse_date(text),
            ValueKind::Time => NaiveTime::parse_from_str(text, TIME_FORMAT)
                .map(Self::Time)
                .map_err(|e| CoreError::Validation(format!("invalid time {text:?}: {e}"))),
            ValueKind::DateTime => parse_datetime(text).map(Self::DateTime),
        }
    }

    /// Compare two values of the same kind.
    ///
    /// Returns `None` when the kinds differ, when either float is NaN, or
    /// for booleans (which have no meaningful order here).
    #[must_use]
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Str(a), Self::Str(b)) => Some(a.cmp(b)),
            (Self::Int(a), Self::Int(b)) => Some(a.cmp(b)),
            (Self::Float(a), Self::Float(b)) => a.partial_cmp(b),
            (Self::Date(a), Self::Date(b)) => Some(a.cmp(b)),
            (Self::Time(a), Self::Time(b)) => Some(a.cmp(b)),
            (Self::DateTime(a), Self::DateTime(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

/// Parse a date, accepting a datetime rendering only at midnight.
fn parse_date(text: &str) -> Result<Value, CoreError> {
    if let Ok(date) = NaiveDate::parse_from_str(text, DATE_FORMAT) {
        return Ok(Value::Date(date));
    }
    let dt = parse_datetime(text)
        .map_err(|_| CoreError::Validation(format!("invalid date {text:?}")))?;
    if dt.time() == NaiveTime::MIN {
        Ok(Value::Date(dt.date()))
    } else {
        Err(CoreError::Validation(format!(
            "date {text:?} carries a non-zero time component"
        )))
    }
}

fn parse_datetime(text: &str) -> Result<NaiveDateTime, CoreError> {
    NaiveDateTime::parse_from_str(text, DATETIME_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(text, DATETIME_FORMAT_SPACED))
        .map_err(|e| CoreError::Validation(format!("invalid datetime {text:?}: {e}")))
}

impl From<&str> for Value {
    #[inline]
    fn from(s: &str) -> Self {
        Self::Str(s.to_owned())
    }
}

impl From<String> for Value {
    #[inline]
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<i64> for Value {
    #[inline]
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<i32> for Value {
    #[inline]
    fn from(i: i32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    #[inline]
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<bool> for Value {
    #[inline]
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<NaiveDate> for Value {
    #[inline]
    fn from(d: NaiveDate) -> Self {
        Self::Date(d)
    }
}

impl From<NaiveTime> for Value {
    #[inline]
    fn from(t: NaiveTime) -> Self {
        Self::Time(t)
    }
}

impl From<NaiveDateTime> for Value {
    #[inline]
    fn from(dt: NaiveDateTime) -> Self {
        Self::DateTime(dt)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn june_23() -> NaiveDate {
        NaiveDate::from_ymd_opt(2009, 6, 23).unwrap()
    }

    #[test]
    fn value_conversions() {
        assert_eq!(Value::from(true).as_bool(), Some(true));
        assert_eq!(Value::from(42i64).as_int(), Some(42));
        assert_eq!(Value::from(2.5f64).as_float(), Some(2.5));
        assert_eq!(Value::from("hello").as_str(), Some("hello"));
        assert_eq!(Value::from(june_23()).as_date(), Some(june_23()));
    }

    #[test]
    fn kind_check_is_exact() {
        // A whole float is still not an integer.
        assert!(ValueKind::Integer.check(&Value::Float(3.0)).is_err());
        assert!(ValueKind::Float.check(&Value::Int(3)).is_err());
        assert!(ValueKind::Integer.check(&Value::Int(3)).is_ok());
        // A midnight datetime is still not a date.
        let midnight = june_23().and_hms_opt(0, 0, 0).unwrap();
        assert!(ValueKind::Date.check(&Value::DateTime(midnight)).is_err());
    }

    #[test]
    fn text_roundtrip_all_kinds() {
        let values = [
            Value::from("some text"),
            Value::from(-17i64),
            Value::from(1.25f64),
            Value::from(false),
            Value::from(june_23()),
            Value::from(NaiveTime::from_hms_opt(14, 12, 35).unwrap()),
            Value::from(june_23().and_hms_opt(14, 12, 35).unwrap()),
        ];
        for value in values {
            let text = value.to_text();
            let parsed = Value::from_text(value.kind(), &text).unwrap();
            assert_eq!(parsed, value, "round-trip failed for {text:?}");
        }
    }

    #[test]
    fn date_accepts_midnight_datetime_text() {
        let parsed = Value::from_text(ValueKind::Date, "2009-06-23 00:00:00").unwrap();
        assert_eq!(parsed, Value::Date(june_23()));
    }

    #[test]
    fn date_rejects_nonzero_time_component() {
        let err = Value::from_text(ValueKind::Date, "2009-06-23 14:12:00");
        assert!(err.is_err());
    }

    #[test]
    fn datetime_accepts_both_separators() {
        let expected = Value::DateTime(june_23().and_hms_opt(14, 12, 35).unwrap());
        assert_eq!(Value::from_text(ValueKind::DateTime, "2009-06-23T14:12:35").unwrap(), expected);
        assert_eq!(Value::from_text(ValueKind::DateTime, "2009-06-23 14:12:35").unwrap(), expected);
    }

    #[test]
    fn kind_names_roundtrip() {
        for kind in ValueKind::ALL {
            assert_eq!(kind.as_str().parse::<ValueKind>().unwrap(), kind);
        }
        assert!("vector".parse::<ValueKind>().is_err());
    }

    #[test]
    fn compare_same_kind_only() {
        assert_eq!(Value::from(1i64).compare(&Value::from(2i64)), Some(Ordering::Less));
        assert_eq!(Value::from("a").compare(&Value::from("b")), Some(Ordering::Less));
        assert_eq!(Value::from(1i64).compare(&Value::from(1.0f64)), None);
        assert_eq!(Value::from(true).compare(&Value::from(false)), None);
    }
}
