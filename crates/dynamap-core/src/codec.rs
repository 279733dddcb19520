//! Column codecs: encoding [`Value`]s into wire [`AttributeValue`]s and back.
//!
//! Every column owns one codec. Collection codecs wrap an inner codec and
//! expose it through [`Codec::element_codec`], which is how the renderer finds
//! the right encoder for a value addressed by a nested path such as
//! `tags[0]` or `address["city"]`.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, SecondsFormat, Utc};
use dynamap_model::AttributeValue;
use uuid::Uuid;

use crate::expression::PathElement;
use crate::value::Value;

/// Errors produced while encoding or decoding attribute values.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EncodingError {
    /// The value's variant does not fit the codec.
    #[error("{codec} codec cannot encode a {found} value")]
    TypeMismatch {
        /// Codec that rejected the value.
        codec: &'static str,
        /// Variant that was offered.
        found: &'static str,
    },
    /// Wire data could not be decoded.
    #[error("malformed {codec} attribute: {message}")]
    Malformed {
        /// Codec that was decoding.
        codec: &'static str,
        /// Explanation.
        message: String,
    },
    /// A nested path does not lead to a codec.
    #[error("no codec at path {path} of column {column}")]
    UnknownPath {
        /// Wire name of the column.
        column: String,
        /// The unresolvable path.
        path: String,
    },
    /// A key column has no value.
    #[error("missing value for key column {column}")]
    MissingKey {
        /// Field name of the key column.
        column: String,
    },
}

/// Converts between in-memory values and wire values for one column type.
pub trait Codec: fmt::Debug + Send + Sync {
    /// Name used in errors and debug output.
    fn type_name(&self) -> &'static str;

    /// The wire tag this codec produces (`"S"`, `"N"`, `"B"`, `"L"`...).
    fn backing_type(&self) -> &'static str;

    /// Encode a non-empty value.
    fn encode(&self, value: &Value) -> Result<AttributeValue, EncodingError>;

    /// Decode a wire value.
    fn decode(&self, value: &AttributeValue) -> Result<Value, EncodingError>;

    /// Codec for the value one path step below this one, if addressable.
    fn element_codec(&self, _segment: &PathElement) -> Option<Arc<dyn Codec>> {
        None
    }

    /// Codec for a single member, for collections tested with `contains`.
    fn member_codec(&self) -> Option<Arc<dyn Codec>> {
        None
    }
}

/// Walk a codec along a path. An empty path returns the codec itself.
#[must_use]
pub fn codec_at(codec: &Arc<dyn Codec>, path: &[PathElement]) -> Option<Arc<dyn Codec>> {
    path.iter().try_fold(Arc::clone(codec), |current, segment| {
        current.element_codec(segment)
    })
}

fn mismatch(codec: &'static str, value: &Value) -> EncodingError {
    EncodingError::TypeMismatch {
        codec,
        found: value.kind(),
    }
}

fn malformed(codec: &'static str, message: impl Into<String>) -> EncodingError {
    EncodingError::Malformed {
        codec,
        message: message.into(),
    }
}

/// Drop repeated set members, keeping the first occurrence. The store rejects
/// sets with duplicates.
fn distinct<T: Eq + Hash + Clone>(members: Vec<T>) -> Vec<T> {
    let mut seen = HashSet::with_capacity(members.len());
    members
        .into_iter()
        .filter(|member| seen.insert(member.clone()))
        .collect()
}

fn expect_s<'a>(codec: &'static str, value: &'a AttributeValue) -> Result<&'a str, EncodingError> {
    value
        .as_s()
        .ok_or_else(|| malformed(codec, format!("expected S, got {}", value.type_descriptor())))
}

fn expect_n<'a>(codec: &'static str, value: &'a AttributeValue) -> Result<&'a str, EncodingError> {
    value
        .as_n()
        .ok_or_else(|| malformed(codec, format!("expected N, got {}", value.type_descriptor())))
}

// ---------------------------------------------------------------------------
// Scalars
// ---------------------------------------------------------------------------

/// Plain strings, stored as `S`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringCodec;

impl Codec for StringCodec {
    fn type_name(&self) -> &'static str {
        "String"
    }

    fn backing_type(&self) -> &'static str {
        "S"
    }

    fn encode(&self, value: &Value) -> Result<AttributeValue, EncodingError> {
        match value {
            Value::String(s) => Ok(AttributeValue::S(s.clone())),
            other => Err(mismatch(self.type_name(), other)),
        }
    }

    fn decode(&self, value: &AttributeValue) -> Result<Value, EncodingError> {
        expect_s(self.type_name(), value).map(|s| Value::String(s.to_owned()))
    }
}

/// Floating point numbers, stored as `N`. Integers are accepted on encode.
#[derive(Debug, Clone, Copy, Default)]
pub struct NumberCodec;

impl Codec for NumberCodec {
    fn type_name(&self) -> &'static str {
        "Number"
    }

    fn backing_type(&self) -> &'static str {
        "N"
    }

    fn encode(&self, value: &Value) -> Result<AttributeValue, EncodingError> {
        match value {
            Value::Number(n) if n.is_finite() => Ok(AttributeValue::number(n)),
            Value::Number(n) => Err(malformed(self.type_name(), format!("{n} is not finite"))),
            Value::Integer(n) => Ok(AttributeValue::number(n)),
            other => Err(mismatch(self.type_name(), other)),
        }
    }

    fn decode(&self, value: &AttributeValue) -> Result<Value, EncodingError> {
        let raw = expect_n(self.type_name(), value)?;
        raw.parse::<f64>()
            .map(Value::Number)
            .map_err(|e| malformed(self.type_name(), format!("{raw}: {e}")))
    }
}

/// Signed integers, stored as `N`.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntegerCodec;

impl Codec for IntegerCodec {
    fn type_name(&self) -> &'static str {
        "Integer"
    }

    fn backing_type(&self) -> &'static str {
        "N"
    }

    fn encode(&self, value: &Value) -> Result<AttributeValue, EncodingError> {
        match value {
            Value::Integer(n) => Ok(AttributeValue::number(n)),
            other => Err(mismatch(self.type_name(), other)),
        }
    }

    fn decode(&self, value: &AttributeValue) -> Result<Value, EncodingError> {
        let raw = expect_n(self.type_name(), value)?;
        raw.parse::<i64>()
            .map(Value::Integer)
            .map_err(|e| malformed(self.type_name(), format!("{raw}: {e}")))
    }
}

/// Raw bytes, stored as `B`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BinaryCodec;

impl Codec for BinaryCodec {
    fn type_name(&self) -> &'static str {
        "Binary"
    }

    fn backing_type(&self) -> &'static str {
        "B"
    }

    fn encode(&self, value: &Value) -> Result<AttributeValue, EncodingError> {
        match value {
            Value::Binary(b) => Ok(AttributeValue::B(b.clone())),
            other => Err(mismatch(self.type_name(), other)),
        }
    }

    fn decode(&self, value: &AttributeValue) -> Result<Value, EncodingError> {
        match value {
            AttributeValue::B(b) => Ok(Value::Binary(b.clone())),
            other => Err(malformed(
                self.type_name(),
                format!("expected B, got {}", other.type_descriptor()),
            )),
        }
    }
}

/// Booleans, stored as `BOOL`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BooleanCodec;

impl Codec for BooleanCodec {
    fn type_name(&self) -> &'static str {
        "Boolean"
    }

    fn backing_type(&self) -> &'static str {
        "BOOL"
    }

    fn encode(&self, value: &Value) -> Result<AttributeValue, EncodingError> {
        match value {
            Value::Boolean(b) => Ok(AttributeValue::Bool(*b)),
            other => Err(mismatch(self.type_name(), other)),
        }
    }

    fn decode(&self, value: &AttributeValue) -> Result<Value, EncodingError> {
        match value {
            AttributeValue::Bool(b) => Ok(Value::Boolean(*b)),
            other => Err(malformed(
                self.type_name(),
                format!("expected BOOL, got {}", other.type_descriptor()),
            )),
        }
    }
}

/// UUIDs, stored as their hyphenated string form in `S`.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidCodec;

impl Codec for UuidCodec {
    fn type_name(&self) -> &'static str {
        "UUID"
    }

    fn backing_type(&self) -> &'static str {
        "S"
    }

    fn encode(&self, value: &Value) -> Result<AttributeValue, EncodingError> {
        match value {
            Value::Uuid(u) => Ok(AttributeValue::S(u.hyphenated().to_string())),
            other => Err(mismatch(self.type_name(), other)),
        }
    }

    fn decode(&self, value: &AttributeValue) -> Result<Value, EncodingError> {
        let raw = expect_s(self.type_name(), value)?;
        Uuid::parse_str(raw)
            .map(Value::Uuid)
            .map_err(|e| malformed(self.type_name(), format!("{raw}: {e}")))
    }
}

/// Timestamps, stored as RFC 3339 strings in UTC.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateTimeCodec;

impl Codec for DateTimeCodec {
    fn type_name(&self) -> &'static str {
        "DateTime"
    }

    fn backing_type(&self) -> &'static str {
        "S"
    }

    fn encode(&self, value: &Value) -> Result<AttributeValue, EncodingError> {
        match value {
            Value::DateTime(dt) => Ok(AttributeValue::S(
                dt.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            )),
            other => Err(mismatch(self.type_name(), other)),
        }
    }

    fn decode(&self, value: &AttributeValue) -> Result<Value, EncodingError> {
        let raw = expect_s(self.type_name(), value)?;
        DateTime::parse_from_rfc3339(raw)
            .map(|dt| Value::DateTime(dt.with_timezone(&Utc)))
            .map_err(|e| malformed(self.type_name(), format!("{raw}: {e}")))
    }
}

// ---------------------------------------------------------------------------
// Collections
// ---------------------------------------------------------------------------

/// Sets of scalars, stored as `SS`, `NS` or `BS` depending on the inner codec.
#[derive(Debug, Clone)]
pub struct SetCodec {
    inner: Arc<dyn Codec>,
}

impl SetCodec {
    /// Create a set codec over a scalar codec.
    #[must_use]
    pub fn new(inner: Arc<dyn Codec>) -> Self {
        Self { inner }
    }
}

impl Codec for SetCodec {
    fn type_name(&self) -> &'static str {
        "Set"
    }

    fn backing_type(&self) -> &'static str {
        match self.inner.backing_type() {
            "N" => "NS",
            "B" => "BS",
            _ => "SS",
        }
    }

    fn encode(&self, value: &Value) -> Result<AttributeValue, EncodingError> {
        let Value::Set(items) = value else {
            return Err(mismatch(self.type_name(), value));
        };
        let encoded = items
            .iter()
            .map(|item| self.inner.encode(item))
            .collect::<Result<Vec<_>, _>>()?;
        let wrong_member = |av: &AttributeValue| {
            malformed(
                self.type_name(),
                format!("set member encoded as {}", av.type_descriptor()),
            )
        };
        match self.inner.backing_type() {
            "S" => encoded
                .into_iter()
                .map(|av| match av {
                    AttributeValue::S(s) => Ok(s),
                    other => Err(wrong_member(&other)),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(|members| AttributeValue::Ss(distinct(members))),
            "N" => encoded
                .into_iter()
                .map(|av| match av {
                    AttributeValue::N(n) => Ok(n),
                    other => Err(wrong_member(&other)),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(|members| AttributeValue::Ns(distinct(members))),
            "B" => encoded
                .into_iter()
                .map(|av| match av {
                    AttributeValue::B(b) => Ok(b),
                    other => Err(wrong_member(&other)),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(|members| AttributeValue::Bs(distinct(members))),
            other => Err(malformed(
                self.type_name(),
                format!("sets of {other} are not supported"),
            )),
        }
    }

    fn decode(&self, value: &AttributeValue) -> Result<Value, EncodingError> {
        let members: Vec<AttributeValue> = match value {
            AttributeValue::Ss(v) => v.iter().cloned().map(AttributeValue::S).collect(),
            AttributeValue::Ns(v) => v.iter().cloned().map(AttributeValue::N).collect(),
            AttributeValue::Bs(v) => v.iter().cloned().map(AttributeValue::B).collect(),
            other => {
                return Err(malformed(
                    self.type_name(),
                    format!("expected a set, got {}", other.type_descriptor()),
                ));
            }
        };
        members
            .iter()
            .map(|m| self.inner.decode(m))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Set)
    }

    fn member_codec(&self) -> Option<Arc<dyn Codec>> {
        Some(Arc::clone(&self.inner))
    }
}

/// Homogeneous lists, stored as `L`. Addressable by index.
#[derive(Debug, Clone)]
pub struct ListCodec {
    inner: Arc<dyn Codec>,
}

impl ListCodec {
    /// Create a list codec over an element codec.
    #[must_use]
    pub fn new(inner: Arc<dyn Codec>) -> Self {
        Self { inner }
    }
}

impl Codec for ListCodec {
    fn type_name(&self) -> &'static str {
        "List"
    }

    fn backing_type(&self) -> &'static str {
        "L"
    }

    fn encode(&self, value: &Value) -> Result<AttributeValue, EncodingError> {
        let Value::List(items) = value else {
            return Err(mismatch(self.type_name(), value));
        };
        items
            .iter()
            .map(|item| self.inner.encode(item))
            .collect::<Result<Vec<_>, _>>()
            .map(AttributeValue::L)
    }

    fn decode(&self, value: &AttributeValue) -> Result<Value, EncodingError> {
        let items = value.as_l().ok_or_else(|| {
            malformed(
                self.type_name(),
                format!("expected L, got {}", value.type_descriptor()),
            )
        })?;
        items
            .iter()
            .map(|item| self.inner.decode(item))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List)
    }

    fn element_codec(&self, segment: &PathElement) -> Option<Arc<dyn Codec>> {
        match segment {
            PathElement::Index(_) => Some(Arc::clone(&self.inner)),
            PathElement::Key(_) => None,
        }
    }

    fn member_codec(&self) -> Option<Arc<dyn Codec>> {
        Some(Arc::clone(&self.inner))
    }
}

/// String-keyed maps with homogeneous values, stored as `M`. Addressable by key.
#[derive(Debug, Clone)]
pub struct MapCodec {
    inner: Arc<dyn Codec>,
}

impl MapCodec {
    /// Create a map codec over a value codec.
    #[must_use]
    pub fn new(inner: Arc<dyn Codec>) -> Self {
        Self { inner }
    }
}

impl Codec for MapCodec {
    fn type_name(&self) -> &'static str {
        "Map"
    }

    fn backing_type(&self) -> &'static str {
        "M"
    }

    fn encode(&self, value: &Value) -> Result<AttributeValue, EncodingError> {
        let Value::Map(entries) = value else {
            return Err(mismatch(self.type_name(), value));
        };
        entries
            .iter()
            .map(|(k, v)| self.inner.encode(v).map(|av| (k.clone(), av)))
            .collect::<Result<HashMap<_, _>, _>>()
            .map(AttributeValue::M)
    }

    fn decode(&self, value: &AttributeValue) -> Result<Value, EncodingError> {
        let entries = value.as_m().ok_or_else(|| {
            malformed(
                self.type_name(),
                format!("expected M, got {}", value.type_descriptor()),
            )
        })?;
        entries
            .iter()
            .map(|(k, v)| self.inner.decode(v).map(|decoded| (k.clone(), decoded)))
            .collect::<Result<BTreeMap<_, _>, _>>()
            .map(Value::Map)
    }

    fn element_codec(&self, segment: &PathElement) -> Option<Arc<dyn Codec>> {
        match segment {
            PathElement::Key(_) => Some(Arc::clone(&self.inner)),
            PathElement::Index(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Constructors
// ---------------------------------------------------------------------------

/// Shared [`StringCodec`].
#[must_use]
pub fn string() -> Arc<dyn Codec> {
    Arc::new(StringCodec)
}

/// Shared [`NumberCodec`].
#[must_use]
pub fn number() -> Arc<dyn Codec> {
    Arc::new(NumberCodec)
}

/// Shared [`IntegerCodec`].
#[must_use]
pub fn integer() -> Arc<dyn Codec> {
    Arc::new(IntegerCodec)
}

/// Shared [`BinaryCodec`].
#[must_use]
pub fn binary() -> Arc<dyn Codec> {
    Arc::new(BinaryCodec)
}

/// Shared [`BooleanCodec`].
#[must_use]
pub fn boolean() -> Arc<dyn Codec> {
    Arc::new(BooleanCodec)
}

/// Shared [`UuidCodec`].
#[must_use]
pub fn uuid() -> Arc<dyn Codec> {
    Arc::new(UuidCodec)
}

/// Shared [`DateTimeCodec`].
#[must_use]
pub fn datetime() -> Arc<dyn Codec> {
    Arc::new(DateTimeCodec)
}

/// Shared [`SetCodec`].
#[must_use]
pub fn set(inner: Arc<dyn Codec>) -> Arc<dyn Codec> {
    Arc::new(SetCodec::new(inner))
}

/// Shared [`ListCodec`].
#[must_use]
pub fn list(inner: Arc<dyn Codec>) -> Arc<dyn Codec> {
    Arc::new(ListCodec::new(inner))
}

/// Shared [`MapCodec`].
#[must_use]
pub fn map(inner: Arc<dyn Codec>) -> Arc<dyn Codec> {
    Arc::new(MapCodec::new(inner))
}

/// Build a binary value from a byte slice.
#[must_use]
pub fn bytes_value(data: &[u8]) -> Value {
    Value::Binary(Bytes::copy_from_slice(data))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_should_pick_set_tag_from_inner_codec() {
        let codec = set(integer());
        let encoded = codec
            .encode(&Value::Set(vec![Value::Integer(1), Value::Integer(2)]))
            .unwrap();
        assert_eq!(
            encoded,
            AttributeValue::Ns(vec!["1".to_owned(), "2".to_owned()])
        );
        assert_eq!(codec.backing_type(), "NS");
    }

    #[test]
    fn test_should_drop_duplicate_set_members() {
        let encoded = set(string())
            .encode(&Value::Set(vec![
                Value::from("b"),
                Value::from("a"),
                Value::from("b"),
            ]))
            .unwrap();
        assert_eq!(
            encoded,
            AttributeValue::Ss(vec!["b".to_owned(), "a".to_owned()])
        );

        let encoded = set(integer())
            .encode(&Value::Set(vec![Value::Integer(7), Value::Integer(7)]))
            .unwrap();
        assert_eq!(encoded, AttributeValue::Ns(vec!["7".to_owned()]));

        let encoded = set(binary())
            .encode(&Value::Set(vec![bytes_value(b"x"), bytes_value(b"x")]))
            .unwrap();
        assert_eq!(encoded, AttributeValue::Bs(vec![Bytes::from_static(b"x")]));
    }

    #[test]
    fn test_should_expose_member_codec_for_sets_and_lists() {
        assert_eq!(set(integer()).member_codec().unwrap().type_name(), "Integer");
        assert_eq!(list(string()).member_codec().unwrap().type_name(), "String");
        assert!(map(string()).member_codec().is_none());
        assert!(string().member_codec().is_none());
    }

    #[test]
    fn test_should_reject_mismatched_variant() {
        let err = string().encode(&Value::Integer(3)).unwrap_err();
        assert_eq!(
            err,
            EncodingError::TypeMismatch {
                codec: "String",
                found: "integer"
            }
        );
    }

    #[test]
    fn test_should_reject_non_finite_numbers() {
        let err = number().encode(&Value::Number(f64::NAN)).unwrap_err();
        assert!(matches!(err, EncodingError::Malformed { codec: "Number", .. }));
    }

    #[test]
    fn test_should_store_datetime_in_utc() {
        let dt = Utc.with_ymd_and_hms(2020, 1, 2, 3, 4, 5).unwrap();
        let encoded = datetime().encode(&Value::DateTime(dt)).unwrap();
        assert_eq!(encoded, AttributeValue::from("2020-01-02T03:04:05Z"));

        let offset = AttributeValue::from("2020-01-02T05:04:05+02:00");
        assert_eq!(datetime().decode(&offset).unwrap(), Value::DateTime(dt));
    }

    #[test]
    fn test_should_report_malformed_wire_data() {
        let err = uuid().decode(&AttributeValue::from("not-a-uuid")).unwrap_err();
        assert!(matches!(err, EncodingError::Malformed { codec: "UUID", .. }));
        let err = integer().decode(&AttributeValue::from("7")).unwrap_err();
        assert!(matches!(err, EncodingError::Malformed { codec: "Integer", .. }));
    }

    #[test]
    fn test_should_walk_nested_codecs() {
        let codec = map(list(string()));
        let leaf = codec_at(&codec, &[PathElement::from("tags"), PathElement::from(0)]).unwrap();
        assert_eq!(leaf.type_name(), "String");

        assert!(codec_at(&codec, &[PathElement::from(0)]).is_none());
        assert!(codec_at(&string(), &[PathElement::from("x")]).is_none());
        assert_eq!(codec_at(&codec, &[]).unwrap().type_name(), "Map");
    }

    #[test]
    fn test_should_decode_binary_sets() {
        let codec = set(binary());
        let wire = AttributeValue::Bs(vec![Bytes::from_static(b"a")]);
        assert_eq!(
            codec.decode(&wire).unwrap(),
            Value::Set(vec![bytes_value(b"a")])
        );
    }
}
