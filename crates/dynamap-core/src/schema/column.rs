//! Column definitions.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::codec::Codec;

/// A mapped attribute of a model.
///
/// Columns are schema singletons: once a model is built every column lives in
/// an `Arc` owned by its [`ModelMeta`](super::ModelMeta) and is referenced,
/// never copied, by conditions and update plans. Equality and hashing use the
/// column's address, so two columns with the same wire name in different
/// models (or rebuilt models) never compare equal.
pub struct Column {
    name: String,
    dynamo_name: String,
    model: String,
    codec: Arc<dyn Codec>,
    hash_key: bool,
    range_key: bool,
}

impl Column {
    /// Define a column whose wire name equals its field name.
    #[must_use]
    pub fn new(name: impl Into<String>, codec: Arc<dyn Codec>) -> Self {
        let name = name.into();
        Self {
            dynamo_name: name.clone(),
            name,
            model: String::new(),
            codec,
            hash_key: false,
            range_key: false,
        }
    }

    /// Store the attribute under a different wire name.
    #[must_use]
    pub fn with_dynamo_name(mut self, dynamo_name: impl Into<String>) -> Self {
        self.dynamo_name = dynamo_name.into();
        self
    }

    /// Mark this column as the partition (hash) key.
    #[must_use]
    pub fn as_hash_key(mut self) -> Self {
        self.hash_key = true;
        self
    }

    /// Mark this column as the sort (range) key.
    #[must_use]
    pub fn as_range_key(mut self) -> Self {
        self.range_key = true;
        self
    }

    pub(crate) fn bind(mut self, model: &str) -> Self {
        model.clone_into(&mut self.model);
        self
    }

    /// In-memory field name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attribute name on the wire.
    #[must_use]
    pub fn dynamo_name(&self) -> &str {
        &self.dynamo_name
    }

    /// Name of the model this column is bound to (empty until bound).
    #[must_use]
    pub fn model_name(&self) -> &str {
        &self.model
    }

    /// The column's codec.
    #[must_use]
    pub fn codec(&self) -> &Arc<dyn Codec> {
        &self.codec
    }

    /// `true` for the partition key.
    #[must_use]
    pub fn is_hash_key(&self) -> bool {
        self.hash_key
    }

    /// `true` for the sort key.
    #[must_use]
    pub fn is_range_key(&self) -> bool {
        self.range_key
    }
}

impl PartialEq for Column {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other)
    }
}

impl Eq for Column {}

impl Hash for Column {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::ptr::hash(self, state);
    }
}

impl fmt::Debug for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Column")
            .field("model", &self.model)
            .field("name", &self.name)
            .field("dynamo_name", &self.dynamo_name)
            .field("codec", &self.codec.type_name())
            .field("hash_key", &self.hash_key)
            .field("range_key", &self.range_key)
            .finish()
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.model, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec;

    #[test]
    fn test_should_default_wire_name_to_field_name() {
        let col = Column::new("email", codec::string());
        assert_eq!(col.dynamo_name(), "email");
        let col = col.with_dynamo_name("e");
        assert_eq!(col.name(), "email");
        assert_eq!(col.dynamo_name(), "e");
    }

    #[test]
    fn test_should_compare_columns_by_identity() {
        let a = Arc::new(Column::new("email", codec::string()));
        let b = Arc::new(Column::new("email", codec::string()));
        assert_eq!(a, Arc::clone(&a));
        assert_ne!(a, b);
    }
}
