//! Tracked objects.
//!
//! [`Tracked`] is the seam between user types and the tracking functions: a
//! type that can name its model, read a column's live value, and hand out its
//! embedded [`Tracking`] handle can be marked, synced and diffed.
//!
//! [`Item`] is the generic implementation, a field map over a [`ModelMeta`].

use std::collections::HashMap;
use std::sync::Arc;

use dynamap_model::AttributeMap;
use tracing::debug;

use crate::codec::EncodingError;
use crate::schema::{Column, ModelMeta, SchemaError};
use crate::tracking::{self, Tracking};
use crate::value::{Value, present};

/// An object whose changes are tracked.
pub trait Tracked {
    /// The object's model.
    fn meta(&self) -> &ModelMeta;

    /// Live in-memory value of a column, `None` when unset.
    fn value(&self, column: &Column) -> Option<&Value>;

    /// The embedded tracking handle.
    fn tracking(&self) -> &Tracking;
}

/// Encode every non-empty column into a wire attribute map.
pub fn dump<T: Tracked + ?Sized>(obj: &T) -> Result<AttributeMap, EncodingError> {
    let mut attrs = AttributeMap::new();
    for column in obj.meta().columns() {
        if let Some(value) = present(obj.value(column)) {
            attrs.insert(column.dynamo_name().to_owned(), column.codec().encode(value)?);
        }
    }
    Ok(attrs)
}

/// Encode the primary key attributes.
///
/// Fails with `MissingKey` when a key column is unset or empty.
pub fn key_of<T: Tracked + ?Sized>(obj: &T) -> Result<AttributeMap, EncodingError> {
    let mut key = AttributeMap::new();
    for column in obj.meta().keys() {
        let value = present(obj.value(column)).ok_or_else(|| EncodingError::MissingKey {
            column: column.name().to_owned(),
        })?;
        key.insert(column.dynamo_name().to_owned(), column.codec().encode(value)?);
    }
    Ok(key)
}

/// A tracked item of any model.
#[derive(Debug)]
pub struct Item {
    meta: Arc<ModelMeta>,
    /// field name -> value
    values: HashMap<String, Value>,
    tracking: Tracking,
}

impl Item {
    /// An item with no values and no tracking state.
    #[must_use]
    pub fn new(meta: Arc<ModelMeta>) -> Self {
        Self {
            meta,
            values: HashMap::new(),
            tracking: Tracking::new(),
        }
    }

    /// An item with initial values. Every provided column is marked, keys
    /// included.
    pub fn with_values<I, K, V>(meta: Arc<ModelMeta>, values: I) -> Result<Self, SchemaError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let mut item = Self::new(meta);
        for (field, value) in values {
            item.set(field.as_ref(), value)?;
        }
        Ok(item)
    }

    /// The model as a shared handle.
    #[must_use]
    pub fn model(&self) -> &Arc<ModelMeta> {
        &self.meta
    }

    /// Value of a field.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    /// Set a field and mark its column.
    pub fn set(&mut self, field: &str, value: impl Into<Value>) -> Result<(), SchemaError> {
        let column = Arc::clone(self.meta.require_column(field)?);
        self.values.insert(column.name().to_owned(), value.into());
        tracking::mark(&*self, &column);
        Ok(())
    }

    /// Unset a field and mark its column, even if nothing was stored, so the
    /// next save removes the remote attribute.
    pub fn delete(&mut self, field: &str) -> Result<Option<Value>, SchemaError> {
        let column = Arc::clone(self.meta.require_column(field)?);
        let previous = self.values.remove(column.name());
        tracking::mark(&*self, &column);
        Ok(previous)
    }

    /// Mutable access to a field without marking it.
    ///
    /// In-place edits of collections are not tracked; call
    /// [`tracking::mark`] for the column afterwards.
    pub fn get_mut(&mut self, field: &str) -> Option<&mut Value> {
        self.values.get_mut(field)
    }

    /// Encoded primary key.
    pub fn key(&self) -> Result<AttributeMap, EncodingError> {
        key_of(self)
    }

    /// Encoded non-empty attributes.
    pub fn dump(&self) -> Result<AttributeMap, EncodingError> {
        dump(self)
    }

    /// Build an item from the attributes returned by a read.
    ///
    /// Every `expected` column is decoded from `attrs` when present, left
    /// unset otherwise, and marked. The item is then synced, so its atomic
    /// condition matches what was read, and the attributes are recorded for
    /// [`diff_loaded`](crate::update::diff_loaded).
    pub fn load(
        meta: Arc<ModelMeta>,
        attrs: &AttributeMap,
        expected: &[Arc<Column>],
    ) -> Result<Self, EncodingError> {
        let mut item = Self::new(meta);
        for column in expected {
            if let Some(wire) = attrs.get(column.dynamo_name()) {
                let value = column.codec().decode(wire)?;
                item.values.insert(column.name().to_owned(), value);
            }
            tracking::mark(&item, column);
        }
        tracking::sync(&item)?;
        tracking::record_loaded(&item, attrs, expected);
        debug!(
            model = item.meta.name(),
            attributes = attrs.len(),
            expected = expected.len(),
            "loaded item"
        );
        Ok(item)
    }
}

impl Tracked for Item {
    fn meta(&self) -> &ModelMeta {
        &self.meta
    }

    fn value(&self, column: &Column) -> Option<&Value> {
        self.values.get(column.name())
    }

    fn tracking(&self) -> &Tracking {
        &self.tracking
    }
}
