//! Model metadata: the ordered column list and key columns of a mapped type.

use std::collections::HashSet;
use std::sync::Arc;

use super::SchemaError;
use super::column::Column;
use crate::expression::ColumnRef;

/// Metadata describing one mapped model.
#[derive(Debug)]
pub struct ModelMeta {
    name: String,
    table_name: String,
    columns: Vec<Arc<Column>>,
    hash_key: Arc<Column>,
    range_key: Option<Arc<Column>>,
}

impl ModelMeta {
    /// Start building a model. The table name defaults to the model name.
    #[must_use]
    pub fn builder(name: impl Into<String>) -> ModelMetaBuilder {
        ModelMetaBuilder {
            name: name.into(),
            table_name: None,
            columns: Vec::new(),
        }
    }

    /// Model name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Backing table name.
    #[must_use]
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Columns in declaration order.
    #[must_use]
    pub fn columns(&self) -> &[Arc<Column>] {
        &self.columns
    }

    /// The partition key column.
    #[must_use]
    pub fn hash_key(&self) -> &Arc<Column> {
        &self.hash_key
    }

    /// The sort key column, if any.
    #[must_use]
    pub fn range_key(&self) -> Option<&Arc<Column>> {
        self.range_key.as_ref()
    }

    /// Key columns, hash key first.
    pub fn keys(&self) -> impl Iterator<Item = &Arc<Column>> {
        std::iter::once(&self.hash_key).chain(self.range_key.iter())
    }

    /// `true` if `column` is this model's hash or range key.
    #[must_use]
    pub fn is_key(&self, column: &Column) -> bool {
        self.keys().any(|key| key.as_ref() == column)
    }

    /// Look up a column by field name.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&Arc<Column>> {
        self.columns.iter().find(|c| c.name() == name)
    }

    /// Look up a column by wire name.
    #[must_use]
    pub fn column_by_dynamo_name(&self, dynamo_name: &str) -> Option<&Arc<Column>> {
        self.columns.iter().find(|c| c.dynamo_name() == dynamo_name)
    }

    /// Look up a column by field name, failing with `UnknownColumn`.
    pub fn require_column(&self, name: &str) -> Result<&Arc<Column>, SchemaError> {
        self.column(name).ok_or_else(|| SchemaError::UnknownColumn {
            model: self.name.clone(),
            name: name.to_owned(),
        })
    }

    /// Condition builder for a column, e.g. `meta.attr("age")?.at_least(18)`.
    pub fn attr(&self, name: &str) -> Result<ColumnRef, SchemaError> {
        self.require_column(name).map(ColumnRef::new)
    }

    /// Columns sorted by wire name.
    #[must_use]
    pub fn columns_by_dynamo_name(&self) -> Vec<&Arc<Column>> {
        let mut columns: Vec<_> = self.columns.iter().collect();
        columns.sort_by(|a, b| a.dynamo_name().cmp(b.dynamo_name()));
        columns
    }
}

/// Builder for [`ModelMeta`].
#[derive(Debug)]
pub struct ModelMetaBuilder {
    name: String,
    table_name: Option<String>,
    columns: Vec<Column>,
}

impl ModelMetaBuilder {
    /// Override the table name.
    #[must_use]
    pub fn table_name(mut self, table_name: impl Into<String>) -> Self {
        self.table_name = Some(table_name.into());
        self
    }

    /// Append a column.
    #[must_use]
    pub fn column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    /// Validate and freeze the model.
    ///
    /// Requires exactly one hash key, at most one range key, and unique field
    /// and wire names.
    pub fn build(self) -> Result<Arc<ModelMeta>, SchemaError> {
        let Self {
            name,
            table_name,
            columns,
        } = self;

        let mut field_names = HashSet::new();
        let mut dynamo_names = HashSet::new();
        for column in &columns {
            if !field_names.insert(column.name()) {
                return Err(SchemaError::DuplicateColumn {
                    model: name,
                    name: column.name().to_owned(),
                });
            }
            if !dynamo_names.insert(column.dynamo_name()) {
                return Err(SchemaError::DuplicateColumn {
                    model: name,
                    name: column.dynamo_name().to_owned(),
                });
            }
        }

        let columns: Vec<Arc<Column>> = columns
            .into_iter()
            .map(|c| Arc::new(c.bind(&name)))
            .collect();

        let hash_key = single_key(&name, &columns, "hash", Column::is_hash_key)?
            .ok_or_else(|| SchemaError::MissingHashKey {
                model: name.clone(),
            })?;
        let range_key = single_key(&name, &columns, "range", Column::is_range_key)?;
        if range_key.as_ref().is_some_and(|rk| rk == &hash_key) {
            return Err(SchemaError::DuplicateKey {
                model: name,
                kind: "hash/range",
            });
        }

        Ok(Arc::new(ModelMeta {
            table_name: table_name.unwrap_or_else(|| name.clone()),
            name,
            columns,
            hash_key,
            range_key,
        }))
    }
}

fn single_key(
    model: &str,
    columns: &[Arc<Column>],
    kind: &'static str,
    is_key: fn(&Column) -> bool,
) -> Result<Option<Arc<Column>>, SchemaError> {
    let mut keys = columns.iter().filter(|c| is_key(c));
    let first = keys.next().cloned();
    if keys.next().is_some() {
        return Err(SchemaError::DuplicateKey {
            model: model.to_owned(),
            kind,
        });
    }
    Ok(first)
}
