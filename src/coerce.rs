//! Conversion of raw environment text into typed field values.
//!
//! This is the only place raw strings are interpreted. Overflow is always a
//! failure, never a truncation.

use std::{fmt, num::IntErrorKind, time::Duration};

/// A signed count of seconds
///
/// Bound with the same range and failures as `i64`; a negative count is left
/// for the consumer to interpret.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Seconds(pub i64);

impl Seconds {
    pub fn as_secs(self) -> i64 {
        self.0
    }

    /// The count as a `Duration`, `None` when negative
    pub fn to_duration(self) -> Option<Duration> {
        u64::try_from(self.0).ok().map(Duration::from_secs)
    }
}

impl From<Seconds> for i64 {
    fn from(seconds: Seconds) -> Self {
        seconds.0
    }
}

impl fmt::Display for Seconds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.0)
    }
}

/// The semantic type a field's raw value is coerced into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum FieldKind {
    Text,
    Bool,
    Int32,
    Int64,
    /// 64-bit integer count of seconds
    Duration,
    Float32,
    /// A field type the binder has no coercion for, carrying the type's name
    Unsupported(&'static str),
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Bool => write!(f, "bool"),
            Self::Int32 => write!(f, "int32"),
            Self::Int64 => write!(f, "int64"),
            Self::Duration => write!(f, "duration (seconds)"),
            Self::Float32 => write!(f, "float32"),
            Self::Unsupported(name) => write!(f, "{}", name),
        }
    }
}

/// A coerced field value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Bool(bool),
    Int32(i32),
    Int64(i64),
    Duration(Seconds),
    Float32(f32),
}

impl Value {
    pub fn kind(&self) -> FieldKind {
        match self {
            Self::Text(_) => FieldKind::Text,
            Self::Bool(_) => FieldKind::Bool,
            Self::Int32(_) => FieldKind::Int32,
            Self::Int64(_) => FieldKind::Int64,
            Self::Duration(_) => FieldKind::Duration,
            Self::Float32(_) => FieldKind::Float32,
        }
    }
}

/// Why a raw value could not be coerced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoercionFailure {
    /// The text is not a literal of the target kind
    InvalidSyntax,
    /// The literal does not fit the target kind's range
    OutOfRange,
    /// The target kind has no coercion
    UnsupportedKind,
    /// The value is set but is not valid Unicode
    InvalidUnicode,
}

impl fmt::Display for CoercionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSyntax => write!(f, "not a valid literal"),
            Self::OutOfRange => write!(f, "out of range"),
            Self::UnsupportedKind => write!(f, "unsupported field type"),
            Self::InvalidUnicode => write!(f, "not valid unicode"),
        }
    }
}

/// Coerce a raw string into a value of the given kind
pub fn coerce(raw: &str, kind: FieldKind) -> Result<Value, CoercionFailure> {
    match kind {
        FieldKind::Text => Ok(Value::Text(raw.to_string())),
        FieldKind::Bool => parse_bool(raw).map(Value::Bool),
        FieldKind::Int32 => raw.parse().map(Value::Int32).map_err(int_failure),
        FieldKind::Int64 => raw.parse().map(Value::Int64).map_err(int_failure),
        FieldKind::Duration => raw
            .parse()
            .map(|secs| Value::Duration(Seconds(secs)))
            .map_err(int_failure),
        FieldKind::Float32 => parse_f32(raw).map(Value::Float32),
        FieldKind::Unsupported(_) => Err(CoercionFailure::UnsupportedKind),
    }
}

fn parse_bool(raw: &str) -> Result<bool, CoercionFailure> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "t" | "true" => Ok(true),
        "0" | "f" | "false" => Ok(false),
        _ => Err(CoercionFailure::InvalidSyntax),
    }
}

fn int_failure(err: std::num::ParseIntError) -> CoercionFailure {
    match err.kind() {
        IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => CoercionFailure::OutOfRange,
        _ => CoercionFailure::InvalidSyntax,
    }
}

fn parse_f32(raw: &str) -> Result<f32, CoercionFailure> {
    let value: f32 = raw.parse().map_err(|_| CoercionFailure::InvalidSyntax)?;

    // A finite literal too large for f32 parses as infinity
    if value.is_infinite() {
        let unsigned = raw.trim_start_matches(['+', '-']);
        if !unsigned.to_ascii_lowercase().starts_with("inf") {
            return Err(CoercionFailure::OutOfRange);
        }
    }

    Ok(value)
}

/// A Rust type a field can be bound to
pub trait Bindable: Default + Sized {
    const KIND: FieldKind;

    /// Unwrap a value coerced with `Self::KIND`; `None` on any other variant
    fn from_value(value: Value) -> Option<Self>;
}

impl Bindable for String {
    const KIND: FieldKind = FieldKind::Text;

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Text(v) => Some(v),
            _ => None,
        }
    }
}

impl Bindable for bool {
    const KIND: FieldKind = FieldKind::Bool;

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Bool(v) => Some(v),
            _ => None,
        }
    }
}

impl Bindable for i32 {
    const KIND: FieldKind = FieldKind::Int32;

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Int32(v) => Some(v),
            _ => None,
        }
    }
}

impl Bindable for i64 {
    const KIND: FieldKind = FieldKind::Int64;

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Int64(v) => Some(v),
            _ => None,
        }
    }
}

impl Bindable for Seconds {
    const KIND: FieldKind = FieldKind::Duration;

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Duration(v) => Some(v),
            _ => None,
        }
    }
}

impl Bindable for f32 {
    const KIND: FieldKind = FieldKind::Float32;

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Float32(v) => Some(v),
            _ => None,
        }
    }
}
