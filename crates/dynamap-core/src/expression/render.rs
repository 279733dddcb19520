//! Placeholder allocation and expression rendering.
//!
//! A render pass substitutes every attribute name and value with a token and
//! collects the token tables that travel next to the expression in the
//! request (`ExpressionAttributeNames` / `ExpressionAttributeValues`).

use std::collections::HashMap;
use std::sync::Arc;

use dynamap_model::AttributeValue;
use tracing::debug;

use super::condition::{Condition, ConditionValue};
use super::path::{PathElement, display_path};
use crate::codec::{Codec, EncodingError, codec_at};
use crate::config::MapperConfig;
use crate::schema::Column;
use crate::update::UpdatePlan;

/// Placeholder allocator consumed by [`Condition::render`].
pub trait Renderer {
    /// Token for an attribute name. Repeated calls for the same column and path
    /// within one pass return the same token.
    fn name_ref(&mut self, column: &Column, path: &[PathElement]) -> String;

    /// Fresh token for a value. Raw values are encoded through the codec found
    /// at `path` under the column's codec; dumped values are bound as-is.
    fn value_ref(
        &mut self,
        column: &Column,
        value: &ConditionValue,
        path: &[PathElement],
    ) -> Result<String, EncodingError>;

    /// Fresh token for the operand of `contains`. When the attribute at `path`
    /// is a set or list, a raw value is a single member and is encoded with the
    /// member codec; otherwise this is [`value_ref`](Self::value_ref).
    fn member_ref(
        &mut self,
        column: &Column,
        value: &ConditionValue,
        path: &[PathElement],
    ) -> Result<String, EncodingError> {
        self.value_ref(column, value, path)
    }
}

/// Output of a render pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderedExpressions {
    /// Rendered condition expression, if any.
    pub condition: Option<String>,
    /// Rendered update expression, if any.
    pub update: Option<String>,
    /// Name placeholders to attribute names.
    pub names: HashMap<String, String>,
    /// Value placeholders to wire values.
    pub values: HashMap<String, AttributeValue>,
}

/// The renderer used to build requests.
///
/// One instance per request: the condition and update expressions of a request
/// share its token tables.
#[derive(Debug)]
pub struct ExpressionRenderer {
    name_prefix: String,
    value_prefix: String,
    /// attribute name -> token
    name_tokens: HashMap<String, String>,
    names: HashMap<String, String>,
    values: HashMap<String, AttributeValue>,
    condition: Option<String>,
    update: Option<String>,
}

impl ExpressionRenderer {
    /// Create a renderer using the configured placeholder prefixes.
    #[must_use]
    pub fn new(config: &MapperConfig) -> Self {
        Self {
            name_prefix: config.name_prefix.clone(),
            value_prefix: config.value_prefix.clone(),
            name_tokens: HashMap::new(),
            names: HashMap::new(),
            values: HashMap::new(),
            condition: None,
            update: None,
        }
    }

    /// Render a condition as this pass's condition expression.
    ///
    /// Returns the rendered text, which is also kept for [`finish`](Self::finish).
    pub fn render_condition(
        &mut self,
        condition: &Condition,
    ) -> Result<Option<String>, EncodingError> {
        let rendered = condition.render(&mut *self)?;
        self.condition.clone_from(&rendered);
        Ok(rendered)
    }

    /// Render an update plan as `SET #a=:v, #b=:w REMOVE #c`.
    ///
    /// Empty clauses are omitted; an empty plan renders to `None`.
    pub fn render_update(&mut self, plan: &UpdatePlan) -> Result<Option<String>, EncodingError> {
        let mut clauses = Vec::with_capacity(2);

        if !plan.set.is_empty() {
            let mut assignments = Vec::with_capacity(plan.set.len());
            for (column, value) in &plan.set {
                let name = self.name_ref(column, &[]);
                let encoded = column.codec().encode(value)?;
                let value = self.bind_value(encoded);
                assignments.push(format!("{name}={value}"));
            }
            clauses.push(format!("SET {}", assignments.join(", ")));
        }

        if !plan.remove.is_empty() {
            let names: Vec<String> = plan
                .remove
                .iter()
                .map(|column| self.name_ref(column, &[]))
                .collect();
            clauses.push(format!("REMOVE {}", names.join(", ")));
        }

        let rendered = if clauses.is_empty() {
            None
        } else {
            Some(clauses.join(" "))
        };
        self.update.clone_from(&rendered);
        Ok(rendered)
    }

    /// Close the pass and hand out the expressions and token tables.
    #[must_use]
    pub fn finish(self) -> RenderedExpressions {
        debug!(
            names = self.names.len(),
            values = self.values.len(),
            has_condition = self.condition.is_some(),
            has_update = self.update.is_some(),
            "rendered expressions"
        );
        RenderedExpressions {
            condition: self.condition,
            update: self.update,
            names: self.names,
            values: self.values,
        }
    }

    fn name_token(&mut self, name: &str) -> String {
        if let Some(token) = self.name_tokens.get(name) {
            return token.clone();
        }
        let token = format!("{}{}", self.name_prefix, self.name_tokens.len());
        self.name_tokens.insert(name.to_owned(), token.clone());
        self.names.insert(token.clone(), name.to_owned());
        token
    }

    fn bind_value(&mut self, value: AttributeValue) -> String {
        let token = format!("{}{}", self.value_prefix, self.values.len());
        self.values.insert(token.clone(), value);
        token
    }
}

impl Default for ExpressionRenderer {
    fn default() -> Self {
        Self::new(&MapperConfig::default())
    }
}

impl Renderer for ExpressionRenderer {
    fn name_ref(&mut self, column: &Column, path: &[PathElement]) -> String {
        let mut rendered = self.name_token(column.dynamo_name());
        for segment in path {
            match segment {
                PathElement::Key(key) => {
                    let token = self.name_token(key);
                    rendered.push('.');
                    rendered.push_str(&token);
                }
                PathElement::Index(index) => rendered.push_str(&format!("[{index}]")),
            }
        }
        rendered
    }

    fn value_ref(
        &mut self,
        column: &Column,
        value: &ConditionValue,
        path: &[PathElement],
    ) -> Result<String, EncodingError> {
        let encoded = match value {
            ConditionValue::Dumped(av) => av.clone(),
            ConditionValue::Raw(raw) => resolve_codec(column, path)?.encode(raw)?,
        };
        Ok(self.bind_value(encoded))
    }

    fn member_ref(
        &mut self,
        column: &Column,
        value: &ConditionValue,
        path: &[PathElement],
    ) -> Result<String, EncodingError> {
        let encoded = match value {
            ConditionValue::Dumped(av) => av.clone(),
            ConditionValue::Raw(raw) => {
                let codec = resolve_codec(column, path)?;
                codec.member_codec().unwrap_or(codec).encode(raw)?
            }
        };
        Ok(self.bind_value(encoded))
    }
}

fn resolve_codec(column: &Column, path: &[PathElement]) -> Result<Arc<dyn Codec>, EncodingError> {
    codec_at(column.codec(), path).ok_or_else(|| EncodingError::UnknownPath {
        column: column.dynamo_name().to_owned(),
        path: display_path(path),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec;
    use crate::schema::ModelMeta;
    use crate::value::Value;

    fn meta() -> Arc<ModelMeta> {
        ModelMeta::builder("Doc")
            .column(Column::new("id", codec::string()).as_hash_key())
            .column(Column::new("count", codec::integer()).with_dynamo_name("c"))
            .column(Column::new("tags", codec::map(codec::list(codec::string()))))
            .build()
            .unwrap()
    }

    #[test]
    fn test_should_reuse_name_tokens_and_allocate_fresh_values() {
        let meta = meta();
        let count = meta.attr("count").unwrap();
        let cond = count.at_least(1) & count.at_most(1);

        let mut renderer = ExpressionRenderer::default();
        let rendered = renderer.render_condition(&cond).unwrap();
        assert_eq!(rendered.as_deref(), Some("((#n0 >= :v0) AND (#n0 <= :v1))"));

        let out = renderer.finish();
        assert_eq!(out.names.len(), 1);
        assert_eq!(out.names["#n0"], "c");
        assert_eq!(out.values.len(), 2);
        assert_eq!(out.values[":v0"], AttributeValue::N("1".to_owned()));
        assert_eq!(out.values[":v1"], AttributeValue::N("1".to_owned()));
    }

    #[test]
    fn test_should_render_nested_paths() {
        let meta = meta();
        let cond = meta.attr("tags").unwrap().at("colors").at(2).equal("red");
        let mut renderer = ExpressionRenderer::default();
        assert_eq!(
            renderer.render_condition(&cond).unwrap().as_deref(),
            Some("(#n0.#n1[2] = :v0)")
        );
        let out = renderer.finish();
        assert_eq!(out.names["#n0"], "tags");
        assert_eq!(out.names["#n1"], "colors");
        assert_eq!(out.values[":v0"], AttributeValue::from("red"));
    }

    #[test]
    fn test_should_fail_on_unresolvable_path() {
        let meta = meta();
        let cond = meta.attr("count").unwrap().at("x").equal(1);
        let err = ExpressionRenderer::default()
            .render_condition(&cond)
            .unwrap_err();
        assert_eq!(
            err,
            EncodingError::UnknownPath {
                column: "c".to_owned(),
                path: r#"["x"]"#.to_owned()
            }
        );
    }

    #[test]
    fn test_should_propagate_codec_failures() {
        let meta = meta();
        let cond = meta.attr("count").unwrap().equal("not a number");
        let err = ExpressionRenderer::default()
            .render_condition(&cond)
            .unwrap_err();
        assert!(matches!(err, EncodingError::TypeMismatch { codec: "Integer", .. }));
    }

    #[test]
    fn test_should_bind_dumped_values_without_encoding() {
        let meta = meta();
        let count = meta.attr("count").unwrap();
        // A string wire value on an integer column would fail the codec.
        let cond = count.compare(
            crate::expression::CompareOp::Eq,
            AttributeValue::from("already encoded"),
        );
        let mut renderer = ExpressionRenderer::default();
        renderer.render_condition(&cond).unwrap();
        let out = renderer.finish();
        assert_eq!(out.values[":v0"], AttributeValue::from("already encoded"));
    }

    #[test]
    fn test_should_render_update_plan() {
        let meta = meta();
        let plan = UpdatePlan {
            set: vec![(Arc::clone(meta.column("count").unwrap()), Value::from(3))],
            remove: vec![Arc::clone(meta.column("tags").unwrap())],
        };
        let mut renderer = ExpressionRenderer::default();
        assert_eq!(
            renderer.render_update(&plan).unwrap().as_deref(),
            Some("SET #n0=:v0 REMOVE #n1")
        );
        assert_eq!(
            renderer.render_update(&UpdatePlan::default()).unwrap(),
            None
        );
    }

    #[test]
    fn test_should_share_tokens_between_condition_and_update() {
        let meta = meta();
        let count = meta.column("count").unwrap();
        let plan = UpdatePlan {
            set: vec![(Arc::clone(count), Value::from(2))],
            remove: Vec::new(),
        };
        let config = MapperConfig::builder()
            .name_prefix("#a".into())
            .value_prefix(":x".into())
            .build();

        let mut renderer = ExpressionRenderer::new(&config);
        renderer.render_update(&plan).unwrap();
        renderer
            .render_condition(&meta.attr("count").unwrap().equal(1))
            .unwrap();
        let out = renderer.finish();

        assert_eq!(out.update.as_deref(), Some("SET #a0=:x0"));
        assert_eq!(out.condition.as_deref(), Some("(#a0 = :x1)"));
        assert_eq!(out.names.len(), 1);
        assert_eq!(out.values.len(), 2);
    }

    #[test]
    fn test_should_encode_contains_operand_as_collection_member() {
        let meta = ModelMeta::builder("Account")
            .column(Column::new("id", codec::string()).as_hash_key())
            .column(Column::new("roles", codec::set(codec::string())))
            .column(Column::new("scores", codec::list(codec::integer())))
            .column(Column::new("nick", codec::string()))
            .build()
            .unwrap();
        let cond = meta.attr("roles").unwrap().contains("admin")
            & meta.attr("scores").unwrap().contains(10)
            & meta.attr("nick").unwrap().contains("bo");

        let mut renderer = ExpressionRenderer::default();
        assert_eq!(
            renderer.render_condition(&cond).unwrap().as_deref(),
            Some(
                "((contains(#n0, :v0)) AND (contains(#n1, :v1)) AND \
                 (contains(#n2, :v2)))"
            )
        );
        let out = renderer.finish();
        assert_eq!(out.values[":v0"], AttributeValue::from("admin"));
        assert_eq!(out.values[":v1"], AttributeValue::N("10".to_owned()));
        assert_eq!(out.values[":v2"], AttributeValue::from("bo"));
    }

    #[test]
    fn test_should_reject_mistyped_member_in_contains() {
        let meta = ModelMeta::builder("Account")
            .column(Column::new("id", codec::string()).as_hash_key())
            .column(Column::new("scores", codec::set(codec::integer())))
            .build()
            .unwrap();
        let err = ExpressionRenderer::default()
            .render_condition(&meta.attr("scores").unwrap().contains("ten"))
            .unwrap_err();
        assert!(matches!(err, EncodingError::TypeMismatch { codec: "Integer", .. }));
    }

    #[test]
    fn test_should_omit_empty_condition() {
        let mut renderer = ExpressionRenderer::default();
        assert_eq!(renderer.render_condition(&Condition::Empty).unwrap(), None);
        let out = renderer.finish();
        assert!(out.condition.is_none());
        assert!(out.names.is_empty());
    }
}
