use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::fmt;
use std::marker::PhantomData;

use crate::error::{SaltError, SaltResult};

/// Semantic type of a leaf node's text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Integer,
    Float,
    Timestamp,
}

impl FieldKind {
    pub fn label(self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Integer => "integer",
            FieldKind::Float => "float",
            FieldKind::Timestamp => "timestamp",
        }
    }
}

/// One row of an entity's field table: property name, path relative to the
/// entity's node, semantic type and the text used when the node is absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldInfo {
    pub name: &'static str,
    pub path: &'static str,
    pub kind: FieldKind,
    /// `None` means the field is required
    pub default: Option<&'static str>,
    /// Empty text reads as absent rather than as a value
    pub optional: bool,
}

/// Typed handle on a [`FieldInfo`]
#[derive(Debug)]
pub struct FieldSpec<T> {
    pub info: FieldInfo,
    marker: PhantomData<fn() -> T>,
}

impl<T> Clone for FieldSpec<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for FieldSpec<T> {}

impl<T: FieldType> FieldSpec<T> {
    pub const fn required(name: &'static str, path: &'static str) -> Self {
        Self {
            info: FieldInfo {
                name,
                path,
                kind: T::KIND,
                default: None,
                optional: T::OPTIONAL,
            },
            marker: PhantomData,
        }
    }

    pub const fn defaulted(name: &'static str, path: &'static str, default: &'static str) -> Self {
        Self {
            info: FieldInfo {
                name,
                path,
                kind: T::KIND,
                default: Some(default),
                optional: T::OPTIONAL,
            },
            marker: PhantomData,
        }
    }

    /// Coerce leaf text into `T`
    pub fn parse(&self, raw: &str) -> SaltResult<T> {
        T::parse(raw).ok_or_else(|| SaltError::TypeCoercion {
            field: self.info.name.to_string(),
            value: raw.to_string(),
            expected: T::KIND.label(),
        })
    }
}

/// Conversion between leaf text and a Rust value
pub trait FieldType: Sized {
    const KIND: FieldKind;
    const OPTIONAL: bool = false;

    fn parse(raw: &str) -> Option<Self>;

    fn render(&self) -> String;
}

impl FieldType for String {
    const KIND: FieldKind = FieldKind::Text;

    fn parse(raw: &str) -> Option<Self> {
        Some(raw.to_string())
    }

    fn render(&self) -> String {
        self.clone()
    }
}

impl FieldType for i32 {
    const KIND: FieldKind = FieldKind::Integer;

    fn parse(raw: &str) -> Option<Self> {
        raw.trim().parse().ok()
    }

    fn render(&self) -> String {
        self.to_string()
    }
}

impl FieldType for f64 {
    const KIND: FieldKind = FieldKind::Float;

    fn parse(raw: &str) -> Option<Self> {
        raw.trim().parse().ok()
    }

    fn render(&self) -> String {
        self.to_string()
    }
}

impl FieldType for NaiveDateTime {
    const KIND: FieldKind = FieldKind::Timestamp;

    fn parse(raw: &str) -> Option<Self> {
        parse_timestamp(raw)
    }

    fn render(&self) -> String {
        self.format("%Y-%m-%dT%H:%M:%S%.3f").to_string()
    }
}

/// Optional leaves: empty text reads as `None`, `None` writes empty text
impl<T: FieldType> FieldType for Option<T> {
    const KIND: FieldKind = T::KIND;
    const OPTIONAL: bool = true;

    fn parse(raw: &str) -> Option<Self> {
        if raw.trim().is_empty() {
            return Some(None);
        }
        T::parse(raw).map(Some)
    }

    fn render(&self) -> String {
        self.as_ref().map(FieldType::render).unwrap_or_default()
    }
}

/// Accepts RFC 3339, ISO date-time with optional fraction, or a bare date
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Dynamically typed field value, produced when walking a field table
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Timestamp(NaiveDateTime),
    Absent,
}

impl FieldValue {
    /// Coerce raw text according to `info.kind`
    pub fn from_text(info: &FieldInfo, raw: &str) -> SaltResult<Self> {
        if (info.optional || info.kind != FieldKind::Text) && raw.trim().is_empty() {
            return Ok(FieldValue::Absent);
        }
        let coerced = match info.kind {
            FieldKind::Text => Some(FieldValue::Text(raw.to_string())),
            FieldKind::Integer => raw.trim().parse().ok().map(FieldValue::Integer),
            FieldKind::Float => raw.trim().parse().ok().map(FieldValue::Float),
            FieldKind::Timestamp => parse_timestamp(raw).map(FieldValue::Timestamp),
        };
        coerced.ok_or_else(|| SaltError::TypeCoercion {
            field: info.name.to_string(),
            value: raw.to_string(),
            expected: info.kind.label(),
        })
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => write!(f, "{}", s),
            FieldValue::Integer(i) => write!(f, "{}", i),
            FieldValue::Float(x) => write!(f, "{}", x),
            FieldValue::Timestamp(t) => write!(f, "{}", t.format("%Y-%m-%dT%H:%M:%S%.3f")),
            FieldValue::Absent => write!(f, "-"),
        }
    }
}
