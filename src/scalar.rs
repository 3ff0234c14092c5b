//! Scalar values and their text encodings.
//!
//! Every leaf of an element tree holds one of the kinds in [`ScalarValue`].
//! Integers are written as decimal text, booleans as `true`/`false`, floats
//! in a fixed-point format (six decimals unless configured otherwise) and
//! timestamps as decimal seconds since the Unix epoch.

use crate::error::{Error, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::de::{self, Deserialize, Deserializer, Visitor};
use serde::ser::{Serialize, Serializer};
use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Format of the legacy date encoding, read but never written.
const LEGACY_DATE_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Newtype name the XML deserializer reads with [`Element::get_timestamp`].
///
/// [`Element::get_timestamp`]: crate::element::Element::get_timestamp
pub(crate) const TIMESTAMP_TOKEN: &str = "$xml_marshal::timestamp";

/// How floating-point numbers are rendered as text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloatFormat {
    /// Fixed-point with the given number of decimals (`%.Nf`).
    Fixed(usize),
    /// The shortest text that parses back to the identical value.
    Shortest,
}

impl Default for FloatFormat {
    fn default() -> Self {
        FloatFormat::Fixed(6)
    }
}

impl FloatFormat {
    /// Formats `value` according to this format.
    pub fn format(self, value: f64) -> String {
        match self {
            FloatFormat::Fixed(precision) => format!("{:.*}", precision, value),
            FloatFormat::Shortest => {
                let mut buffer = ryu::Buffer::new();
                buffer.format(value).to_string()
            }
        }
    }
}

/// A point in time stored as seconds since 1970-01-01T00:00:00Z.
///
/// Serializes as a newtype around a floating-point number, so formats other
/// than XML see a plain number.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Timestamp(f64);

impl Timestamp {
    /// Creates a timestamp from seconds since the Unix epoch.
    #[inline]
    pub fn from_epoch_seconds(seconds: f64) -> Self {
        Timestamp(seconds)
    }

    /// Returns the current time.
    pub fn now() -> Self {
        Timestamp::from(SystemTime::now())
    }

    /// Returns the seconds since the Unix epoch.
    #[inline]
    pub fn epoch_seconds(self) -> f64 {
        self.0
    }

    /// Converts to a UTC date-time, if it is representable.
    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        let secs = self.0.floor();
        let nanos = ((self.0 - secs) * 1e9).round() as u32;
        DateTime::from_timestamp(secs as i64, nanos.min(999_999_999))
    }

    /// Parses epoch seconds, falling back to the legacy `yyyyMMdd_HHmmss`
    /// format (interpreted as UTC).
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if let Ok(seconds) = text.parse::<f64>() {
            return seconds.is_finite().then_some(Timestamp(seconds));
        }
        NaiveDateTime::parse_from_str(text, LEGACY_DATE_FORMAT)
            .ok()
            .map(|naive| Timestamp::from(naive.and_utc()))
    }

    /// Returns whether two timestamps are within `tolerance` seconds.
    pub fn approx_eq(self, other: Timestamp, tolerance: f64) -> bool {
        (self.0 - other.0).abs() <= tolerance
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Timestamp(dt.timestamp() as f64 + f64::from(dt.timestamp_subsec_nanos()) / 1e9)
    }
}

impl From<SystemTime> for Timestamp {
    fn from(time: SystemTime) -> Self {
        match time.duration_since(UNIX_EPOCH) {
            Ok(after) => Timestamp(after.as_secs_f64()),
            Err(before) => Timestamp(-before.duration().as_secs_f64()),
        }
    }
}

impl TryFrom<Timestamp> for SystemTime {
    type Error = Error;

    /// Fails for NaN and for times the system clock cannot represent.
    fn try_from(ts: Timestamp) -> Result<Self> {
        let out_of_range = || Error::type_mismatch("time within the system clock range", ts.0.to_string());
        let offset = Duration::try_from_secs_f64(ts.0.abs()).map_err(|_| out_of_range())?;
        let time = if ts.0 >= 0.0 {
            UNIX_EPOCH.checked_add(offset)
        } else {
            UNIX_EPOCH.checked_sub(offset)
        };
        time.ok_or_else(out_of_range)
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_newtype_struct(TIMESTAMP_TOKEN, &self.0)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct TimestampVisitor;

        impl<'de> Visitor<'de> for TimestampVisitor {
            type Value = Timestamp;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("seconds since the Unix epoch")
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<Timestamp, E> {
                Ok(Timestamp(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<Timestamp, E> {
                Ok(Timestamp(v as f64))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<Timestamp, E> {
                Ok(Timestamp(v as f64))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Timestamp, E> {
                Timestamp::parse(v)
                    .ok_or_else(|| E::invalid_value(de::Unexpected::Str(v), &self))
            }

            fn visit_newtype_struct<D: Deserializer<'de>>(
                self,
                deserializer: D,
            ) -> std::result::Result<Timestamp, D::Error> {
                deserializer.deserialize_any(self)
            }
        }

        deserializer.deserialize_newtype_struct(TIMESTAMP_TOKEN, TimestampVisitor)
    }
}

/// A value that can be stored as the text of a leaf element.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    /// Signed integer.
    Int(i64),
    /// Unsigned integer.
    UInt(u64),
    /// Floating-point number.
    Float(f64),
    /// Text.
    Text(String),
    /// Boolean.
    Bool(bool),
    /// Timestamp.
    Timestamp(Timestamp),
}

impl ScalarValue {
    /// Renders the value as element text.
    ///
    /// `precision` overrides the decimal count of floats and timestamps.
    pub fn to_text(&self, precision: Option<usize>) -> String {
        let float_format = precision.map(FloatFormat::Fixed).unwrap_or_default();
        self.to_text_with(float_format)
    }

    /// Renders the value as element text using `float_format` for floats.
    pub fn to_text_with(&self, float_format: FloatFormat) -> String {
        match self {
            ScalarValue::Int(v) => itoa::Buffer::new().format(*v).to_string(),
            ScalarValue::UInt(v) => itoa::Buffer::new().format(*v).to_string(),
            ScalarValue::Float(v) => float_format.format(*v),
            ScalarValue::Text(v) => v.clone(),
            ScalarValue::Bool(v) => (if *v { "true" } else { "false" }).to_string(),
            ScalarValue::Timestamp(v) => float_format.format(v.epoch_seconds()),
        }
    }
}

macro_rules! scalar_from {
    ($variant:ident: $($ty:ty),*) => {
        $(
            impl From<$ty> for ScalarValue {
                fn from(v: $ty) -> Self {
                    ScalarValue::$variant(v.into())
                }
            }
        )*
    };
}

scalar_from!(Int: i8, i16, i32, i64);
scalar_from!(UInt: u8, u16, u32, u64);
scalar_from!(Float: f32, f64);
scalar_from!(Text: String, &str, char);
scalar_from!(Bool: bool);
scalar_from!(Timestamp: Timestamp);

/// Parses a boolean: `true`/`false` in any case, or the integers `1`/`0`.
pub fn parse_bool(text: &str) -> Option<bool> {
    let text = text.trim();
    if text.eq_ignore_ascii_case("true") {
        return Some(true);
    }
    if text.eq_ignore_ascii_case("false") {
        return Some(false);
    }
    match text.parse::<i64>() {
        Ok(1) => Some(true),
        Ok(0) => Some(false),
        _ => None,
    }
}

/// Parses `text` as `T`, reporting failures as a type mismatch.
pub fn parse_number<T: std::str::FromStr>(text: &str, expected: &'static str) -> Result<T> {
    text.trim()
        .parse()
        .map_err(|_| Error::type_mismatch(expected, text))
}
