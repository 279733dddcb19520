//! Write-request builders.
//!
//! These functions turn a tracked object into the inputs a transport sends.
//! They do not touch tracking state: after the transport reports success the
//! caller runs [`tracking::sync`](crate::tracking::sync) for a save or put, and
//! [`tracking::clear`](crate::tracking::clear) for a delete. A
//! `ConditionalCheckFailedException` coming back means the remote item changed
//! since it was last synced; refreshing and retrying is up to the caller.

use dynamap_model::{DeleteItemInput, PutItemInput, ReturnValue, UpdateItemInput};
use tracing::debug;
use typed_builder::TypedBuilder;

use crate::codec::EncodingError;
use crate::config::MapperConfig;
use crate::expression::{Condition, ExpressionRenderer};
use crate::item::{Tracked, dump, key_of};
use crate::update::{atomic_condition, get_update};

/// Per-request options.
#[derive(Debug, Clone, Default, PartialEq, TypedBuilder)]
pub struct WriteOptions {
    /// Extra condition the remote item must satisfy.
    #[builder(default)]
    pub condition: Condition,

    /// AND the object's atomic condition into the request condition.
    #[builder(default)]
    pub atomic: bool,

    /// Attributes to return.
    #[builder(default)]
    pub return_values: Option<ReturnValue>,
}

impl WriteOptions {
    /// Options with `atomic` taken from the configuration.
    #[must_use]
    pub fn from_config(config: &MapperConfig) -> Self {
        Self {
            atomic: config.atomic_by_default,
            ..Self::default()
        }
    }
}

fn request_condition<T: Tracked + ?Sized>(obj: &T, options: &WriteOptions) -> Condition {
    if options.atomic {
        options.condition.clone().and_with(atomic_condition(obj))
    } else {
        options.condition.clone()
    }
}

/// `UpdateItem` input pushing the pending changes.
pub fn save_request<T: Tracked + ?Sized>(
    obj: &T,
    options: &WriteOptions,
    config: &MapperConfig,
) -> Result<UpdateItemInput, EncodingError> {
    let meta = obj.meta();
    let key = key_of(obj)?;
    let plan = get_update(obj);
    let condition = request_condition(obj, options);

    let mut renderer = ExpressionRenderer::new(config);
    renderer.render_update(&plan)?;
    renderer.render_condition(&condition)?;
    let rendered = renderer.finish();

    debug!(
        table = meta.table_name(),
        atomic = options.atomic,
        conditions = condition.len(),
        "built update request"
    );
    Ok(UpdateItemInput {
        table_name: meta.table_name().to_owned(),
        key,
        update_expression: rendered.update,
        condition_expression: rendered.condition,
        expression_attribute_names: rendered.names,
        expression_attribute_values: rendered.values,
        return_values: options.return_values,
    })
}

/// `PutItem` input replacing the whole remote item with the current dump.
pub fn put_request<T: Tracked + ?Sized>(
    obj: &T,
    options: &WriteOptions,
    config: &MapperConfig,
) -> Result<PutItemInput, EncodingError> {
    let meta = obj.meta();
    // validates the key before anything is rendered
    key_of(obj)?;
    let item = dump(obj)?;
    let condition = request_condition(obj, options);

    let mut renderer = ExpressionRenderer::new(config);
    renderer.render_condition(&condition)?;
    let rendered = renderer.finish();

    debug!(
        table = meta.table_name(),
        atomic = options.atomic,
        attributes = item.len(),
        "built put request"
    );
    Ok(PutItemInput {
        table_name: meta.table_name().to_owned(),
        item,
        condition_expression: rendered.condition,
        expression_attribute_names: rendered.names,
        expression_attribute_values: rendered.values,
        return_values: options.return_values,
    })
}

/// `DeleteItem` input for the object's key.
pub fn delete_request<T: Tracked + ?Sized>(
    obj: &T,
    options: &WriteOptions,
    config: &MapperConfig,
) -> Result<DeleteItemInput, EncodingError> {
    let meta = obj.meta();
    let key = key_of(obj)?;
    let condition = request_condition(obj, options);

    let mut renderer = ExpressionRenderer::new(config);
    renderer.render_condition(&condition)?;
    let rendered = renderer.finish();

    debug!(
        table = meta.table_name(),
        atomic = options.atomic,
        "built delete request"
    );
    Ok(DeleteItemInput {
        table_name: meta.table_name().to_owned(),
        key,
        condition_expression: rendered.condition,
        expression_attribute_names: rendered.names,
        expression_attribute_values: rendered.values,
        return_values: options.return_values,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use dynamap_model::AttributeValue;

    use super::*;
    use crate::codec;
    use crate::item::Item;
    use crate::schema::{Column, ModelMeta};
    use crate::tracking;
    use crate::value::Value;

    fn meta() -> Arc<ModelMeta> {
        ModelMeta::builder("User")
            .table_name("users")
            .column(Column::new("id", codec::string()).as_hash_key())
            .column(Column::new("email", codec::string()))
            .build()
            .unwrap()
    }

    fn user() -> Item {
        let mut item = Item::new(meta());
        item.set("id", "u1").unwrap();
        item.set("email", "a@b.com").unwrap();
        item
    }

    #[test]
    fn test_should_build_plain_save_request() {
        let item = user();
        let input = save_request(&item, &WriteOptions::default(), &MapperConfig::default()).unwrap();
        assert_eq!(input.table_name, "users");
        assert_eq!(input.key["id"], AttributeValue::from("u1"));
        assert_eq!(input.update_expression.as_deref(), Some("SET #n0=:v0"));
        assert!(input.condition_expression.is_none());
        assert_eq!(input.expression_attribute_names["#n0"], "email");
        assert_eq!(
            input.expression_attribute_values[":v0"],
            AttributeValue::from("a@b.com")
        );
    }

    #[test]
    fn test_should_guard_atomic_save_with_snapshot() {
        let item = user();
        let options = WriteOptions::builder().atomic(true).build();
        let input = save_request(&item, &options, &MapperConfig::default()).unwrap();
        // never synced: every column must be absent remotely
        assert_eq!(
            input.condition_expression.as_deref(),
            Some("((attribute_not_exists(#n0)) AND (attribute_not_exists(#n1)))")
        );
        assert_eq!(input.expression_attribute_names.len(), 2);
    }

    #[test]
    fn test_should_combine_caller_condition_with_atomic() {
        let item = user();
        tracking::sync(&item).unwrap();
        let options = WriteOptions::builder()
            .condition(item.meta().attr("email").unwrap().begins_with("a"))
            .atomic(true)
            .build();
        let input = delete_request(&item, &options, &MapperConfig::default()).unwrap();
        assert_eq!(
            input.condition_expression.as_deref(),
            Some("((begins_with(#n0, :v0)) AND ((#n0 = :v1) AND (#n1 = :v2)))")
        );
        assert_eq!(input.expression_attribute_values[":v2"], AttributeValue::from("u1"));
    }

    #[test]
    fn test_should_take_atomic_from_config() {
        let config = MapperConfig::builder().atomic_by_default(true).build();
        let options = WriteOptions::from_config(&config);
        assert!(options.atomic);
        assert!(options.condition.is_empty());
    }

    #[test]
    fn test_should_build_put_request_from_dump() {
        let item = user();
        let input = put_request(&item, &WriteOptions::default(), &MapperConfig::default()).unwrap();
        assert_eq!(input.item.len(), 2);
        assert!(input.condition_expression.is_none());
        assert!(input.expression_attribute_values.is_empty());
    }

    #[test]
    fn test_should_require_key_for_requests() {
        let mut item = Item::new(meta());
        item.set("email", "a@b.com").unwrap();
        let err = delete_request(&item, &WriteOptions::default(), &MapperConfig::default())
            .unwrap_err();
        assert_eq!(
            err,
            EncodingError::MissingKey {
                column: "id".to_owned()
            }
        );
    }

    #[test]
    fn test_should_send_sets_without_duplicate_members() {
        let meta = ModelMeta::builder("Member")
            .table_name("members")
            .column(Column::new("id", codec::string()).as_hash_key())
            .column(Column::new("roles", codec::set(codec::string())))
            .build()
            .unwrap();
        let mut item = Item::new(meta);
        item.set("id", "m1").unwrap();
        item.set("roles", Value::Set(vec![Value::from("a"), Value::from("a")]))
            .unwrap();

        let input = save_request(&item, &WriteOptions::default(), &MapperConfig::default()).unwrap();
        assert_eq!(
            input.expression_attribute_values[":v0"],
            AttributeValue::Ss(vec!["a".to_owned()])
        );

        tracking::sync(&item).unwrap();
        let guarded = WriteOptions::builder().atomic(true).build();
        let input = save_request(&item, &guarded, &MapperConfig::default()).unwrap();
        // the SET value and the guard both carry the deduplicated set
        let sets: Vec<&AttributeValue> = input
            .expression_attribute_values
            .values()
            .filter(|v| matches!(v, AttributeValue::Ss(_)))
            .collect();
        assert_eq!(sets.len(), 2);
        assert!(
            sets.iter()
                .all(|v| **v == AttributeValue::Ss(vec!["a".to_owned()]))
        );
    }
}
