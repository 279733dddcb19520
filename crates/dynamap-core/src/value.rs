//! In-memory attribute values.
//!
//! [`Value`] is what a mapped object holds before a codec turns it into an
//! [`AttributeValue`](dynamap_model::AttributeValue). It deliberately mirrors
//! the shapes a column can have rather than the wire tags: a UUID stays a UUID
//! until the codec decides it is stored as a string.

use std::collections::BTreeMap;
use std::fmt;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A decoded attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// UTF-8 string.
    String(String),
    /// Floating point number.
    Number(f64),
    /// Signed integer.
    Integer(i64),
    /// Raw bytes.
    Binary(Bytes),
    /// Boolean.
    Boolean(bool),
    /// UUID.
    Uuid(Uuid),
    /// Timestamp, always UTC.
    DateTime(DateTime<Utc>),
    /// Unordered collection of scalars.
    Set(Vec<Value>),
    /// Ordered collection.
    List(Vec<Value>),
    /// String-keyed document.
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// `true` for values that have nothing to store: empty strings, binaries
    /// and collections. Such values are removed remotely, never written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::String(s) => s.is_empty(),
            Self::Binary(b) => b.is_empty(),
            Self::Set(v) | Self::List(v) => v.is_empty(),
            Self::Map(m) => m.is_empty(),
            Self::Number(_)
            | Self::Integer(_)
            | Self::Boolean(_)
            | Self::Uuid(_)
            | Self::DateTime(_) => false,
        }
    }

    /// Short name of the variant, used in error messages.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::String(_) => "string",
            Self::Number(_) => "number",
            Self::Integer(_) => "integer",
            Self::Binary(_) => "binary",
            Self::Boolean(_) => "boolean",
            Self::Uuid(_) => "uuid",
            Self::DateTime(_) => "datetime",
            Self::Set(_) => "set",
            Self::List(_) => "list",
            Self::Map(_) => "map",
        }
    }
}

/// The live value when it is stored remotely; `None` when absent or empty.
#[must_use]
pub fn present(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| !v.is_empty())
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => write!(f, "{s:?}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Binary(b) => write!(f, "<{} bytes>", b.len()),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Uuid(u) => write!(f, "{u}"),
            Self::DateTime(dt) => write!(f, "{}", dt.to_rfc3339()),
            Self::Set(items) => write_seq(f, "{", items, "}"),
            Self::List(items) => write_seq(f, "[", items, "]"),
            Self::Map(m) => {
                f.write_str("{")?;
                for (i, (k, v)) in m.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k:?}: {v}")?;
                }
                f.write_str("}")
            }
        }
    }
}

fn write_seq(f: &mut fmt::Formatter<'_>, open: &str, items: &[Value], close: &str) -> fmt::Result {
    f.write_str(open)?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    f.write_str(close)
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Integer(i64::from(n))
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<Bytes> for Value {
    fn from(b: Bytes) -> Self {
        Self::Binary(b)
    }
}

impl From<Uuid> for Value {
    fn from(u: Uuid) -> Self {
        Self::Uuid(u)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(dt: DateTime<Utc>) -> Self {
        Self::DateTime(dt)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::List(items)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(m: BTreeMap<String, Value>) -> Self {
        Self::Map(m)
    }
}
