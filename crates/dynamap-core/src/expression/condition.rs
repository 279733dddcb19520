//! Condition AST for DynamoDB condition and filter expressions.
//!
//! Conditions are built from [`ColumnRef`]s (a column plus an optional path
//! into a nested attribute) and combined with [`Condition::and_with`],
//! [`Condition::or_with`] and [`Condition::negate`], or the `&`, `|` and `!`
//! operators which delegate to them.
//!
//! Combinator contract:
//!
//! - `Empty` is the identity for both `AND` and `OR`, and `NOT Empty` is `Empty`.
//! - Combining an `And` accumulator with another condition appends to the
//!   accumulator's children in place instead of nesting, and likewise for `Or`.
//!   A loop doing `cond &= next` therefore builds one flat node in O(n).
//! - Negation is never simplified: `NOT NOT x` stays as written and `NOT (a = b)`
//!   is not rewritten to `a <> b`.
//!
//! Rendering walks the tree and asks a [`Renderer`] for name and value
//! placeholders, so the AST never sees the placeholder tables.

use std::fmt;
use std::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign};
use std::str::FromStr;
use std::sync::Arc;

use dynamap_model::AttributeValue;

use super::path::{PathElement, display_path};
use super::render::Renderer;
use crate::codec::EncodingError;
use crate::schema::Column;
use crate::value::Value;

/// Errors raised while constructing conditions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConditionError {
    /// The comparison operator is not one of `=`, `<>`, `<`, `>`, `<=`, `>=`.
    #[error("unknown comparison operator '{operator}'")]
    InvalidOperator {
        /// The rejected operator.
        operator: String,
    },
}

/// Relational operators supported by comparison leaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    /// Equal (`=`).
    Eq,
    /// Not equal (`<>`).
    Ne,
    /// Less than (`<`).
    Lt,
    /// Greater than (`>`).
    Gt,
    /// Less than or equal (`<=`).
    Le,
    /// Greater than or equal (`>=`).
    Ge,
}

impl CompareOp {
    /// The operator as written in an expression.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "<>",
            Self::Lt => "<",
            Self::Gt => ">",
            Self::Le => "<=",
            Self::Ge => ">=",
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CompareOp {
    type Err = ConditionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "=" => Ok(Self::Eq),
            "<>" => Ok(Self::Ne),
            "<" => Ok(Self::Lt),
            ">" => Ok(Self::Gt),
            "<=" => Ok(Self::Le),
            ">=" => Ok(Self::Ge),
            other => Err(ConditionError::InvalidOperator {
                operator: other.to_owned(),
            }),
        }
    }
}

/// A value carried by a leaf.
///
/// `Raw` values are encoded through the column's codec at render time.
/// `Dumped` values are already wire-encoded and are bound as-is, which pins
/// the comparison to the exact encoding taken when the condition was built,
/// regardless of later in-memory mutation of the source value.
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionValue {
    /// In-memory value, encoded when rendered.
    Raw(Value),
    /// Wire value, bound without re-encoding.
    Dumped(AttributeValue),
}

impl ConditionValue {
    /// `true` if the value is already wire-encoded.
    #[must_use]
    pub fn is_dumped(&self) -> bool {
        matches!(self, Self::Dumped(_))
    }
}

impl From<Value> for ConditionValue {
    fn from(value: Value) -> Self {
        Self::Raw(value)
    }
}

impl From<AttributeValue> for ConditionValue {
    fn from(value: AttributeValue) -> Self {
        Self::Dumped(value)
    }
}

impl fmt::Display for ConditionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Raw(v) => write!(f, "{v}"),
            Self::Dumped(av) => write!(f, "{av}"),
        }
    }
}

/// A column, optionally narrowed to a nested attribute, that conditions target.
///
/// Equality compares the column by identity and the path by value.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnRef {
    column: Arc<Column>,
    path: Vec<PathElement>,
}

impl ColumnRef {
    /// Reference a whole column.
    #[must_use]
    pub fn new(column: &Arc<Column>) -> Self {
        Self {
            column: Arc::clone(column),
            path: Vec::new(),
        }
    }

    /// Step into a map key or list index.
    #[must_use]
    pub fn at(mut self, segment: impl Into<PathElement>) -> Self {
        self.path.push(segment.into());
        self
    }

    /// The referenced column.
    #[must_use]
    pub fn column(&self) -> &Arc<Column> {
        &self.column
    }

    /// Path into the column's value; empty for the whole attribute.
    #[must_use]
    pub fn path(&self) -> &[PathElement] {
        &self.path
    }

    /// Comparison leaf with an explicit operator.
    #[must_use]
    pub fn compare(&self, op: CompareOp, value: impl Into<ConditionValue>) -> Condition {
        Condition::Comparison {
            target: self.clone(),
            op,
            value: value.into(),
        }
    }

    /// Comparison leaf with an operator given as text; fails with
    /// `InvalidOperator` for anything but the six relational operators.
    pub fn compare_with(
        &self,
        op: &str,
        value: impl Into<ConditionValue>,
    ) -> Result<Condition, ConditionError> {
        Ok(self.compare(op.parse()?, value))
    }

    /// `self = value`
    #[must_use]
    pub fn equal(&self, value: impl Into<Value>) -> Condition {
        self.compare(CompareOp::Eq, ConditionValue::Raw(value.into()))
    }

    /// `self <> value`
    #[must_use]
    pub fn not_equal(&self, value: impl Into<Value>) -> Condition {
        self.compare(CompareOp::Ne, ConditionValue::Raw(value.into()))
    }

    /// `self < value`
    #[must_use]
    pub fn less_than(&self, value: impl Into<Value>) -> Condition {
        self.compare(CompareOp::Lt, ConditionValue::Raw(value.into()))
    }

    /// `self > value`
    #[must_use]
    pub fn greater_than(&self, value: impl Into<Value>) -> Condition {
        self.compare(CompareOp::Gt, ConditionValue::Raw(value.into()))
    }

    /// `self <= value`
    #[must_use]
    pub fn at_most(&self, value: impl Into<Value>) -> Condition {
        self.compare(CompareOp::Le, ConditionValue::Raw(value.into()))
    }

    /// `self >= value`
    #[must_use]
    pub fn at_least(&self, value: impl Into<Value>) -> Condition {
        self.compare(CompareOp::Ge, ConditionValue::Raw(value.into()))
    }

    /// `attribute_not_exists(self)`
    #[must_use]
    pub fn is_none(&self) -> Condition {
        Condition::Exists {
            target: self.clone(),
            negate: true,
        }
    }

    /// `attribute_exists(self)`
    #[must_use]
    pub fn is_not_none(&self) -> Condition {
        Condition::Exists {
            target: self.clone(),
            negate: false,
        }
    }

    /// `begins_with(self, value)`
    #[must_use]
    pub fn begins_with(&self, value: impl Into<Value>) -> Condition {
        Condition::BeginsWith {
            target: self.clone(),
            value: ConditionValue::Raw(value.into()),
        }
    }

    /// `contains(self, value)`: a member of a set or list, or a substring of a
    /// string.
    #[must_use]
    pub fn contains(&self, value: impl Into<Value>) -> Condition {
        Condition::Contains {
            target: self.clone(),
            value: ConditionValue::Raw(value.into()),
        }
    }

    /// `self BETWEEN lower AND upper`
    #[must_use]
    pub fn between(&self, lower: impl Into<Value>, upper: impl Into<Value>) -> Condition {
        Condition::Between {
            target: self.clone(),
            lower: ConditionValue::Raw(lower.into()),
            upper: ConditionValue::Raw(upper.into()),
        }
    }

    /// `self IN (values...)`, in the given order. An empty list is accepted.
    #[must_use]
    pub fn is_in<I, V>(&self, values: I) -> Condition
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Condition::In {
            target: self.clone(),
            values: values
                .into_iter()
                .map(|v| ConditionValue::Raw(v.into()))
                .collect(),
        }
    }
}

impl From<&Arc<Column>> for ColumnRef {
    fn from(column: &Arc<Column>) -> Self {
        Self::new(column)
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.column, display_path(&self.path))
    }
}

/// A boolean expression over item attributes.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Condition {
    /// No condition. Renders to nothing.
    #[default]
    Empty,
    /// All children must hold.
    And(Vec<Condition>),
    /// Any child must hold.
    Or(Vec<Condition>),
    /// The inner condition must not hold.
    Not(Box<Condition>),
    /// `target op value`
    Comparison {
        /// Compared attribute.
        target: ColumnRef,
        /// Operator.
        op: CompareOp,
        /// Right-hand side.
        value: ConditionValue,
    },
    /// `attribute_exists(target)`, or `attribute_not_exists` when negated.
    Exists {
        /// Tested attribute.
        target: ColumnRef,
        /// `true` selects `attribute_not_exists`.
        negate: bool,
    },
    /// `begins_with(target, value)`
    BeginsWith {
        /// Tested attribute.
        target: ColumnRef,
        /// Prefix.
        value: ConditionValue,
    },
    /// `contains(target, value)`
    Contains {
        /// Tested attribute.
        target: ColumnRef,
        /// Member of a set or list, or a substring.
        value: ConditionValue,
    },
    /// `target BETWEEN lower AND upper`
    Between {
        /// Tested attribute.
        target: ColumnRef,
        /// Inclusive lower bound.
        lower: ConditionValue,
        /// Inclusive upper bound.
        upper: ConditionValue,
    },
    /// `target IN (values...)`
    In {
        /// Tested attribute.
        target: ColumnRef,
        /// Candidates, in order.
        values: Vec<ConditionValue>,
    },
}

impl Condition {
    /// Conjunction. `Empty` on either side yields the other side; an `And`
    /// receiver absorbs `other` as a new child.
    #[must_use]
    pub fn and_with(self, other: Condition) -> Condition {
        match (self, other) {
            (Self::Empty, other) => other,
            (this, Self::Empty) => this,
            (Self::And(mut children), other) => {
                children.push(other);
                Self::And(children)
            }
            (this, other) => Self::And(vec![this, other]),
        }
    }

    /// Disjunction. `Empty` on either side yields the other side; an `Or`
    /// receiver absorbs `other` as a new child.
    #[must_use]
    pub fn or_with(self, other: Condition) -> Condition {
        match (self, other) {
            (Self::Empty, other) => other,
            (this, Self::Empty) => this,
            (Self::Or(mut children), other) => {
                children.push(other);
                Self::Or(children)
            }
            (this, other) => Self::Or(vec![this, other]),
        }
    }

    /// Negation. `Empty` stays `Empty`; nothing else is simplified.
    #[must_use]
    pub fn negate(self) -> Condition {
        match self {
            Self::Empty => Self::Empty,
            other => Self::Not(Box::new(other)),
        }
    }

    /// Number of leaves: 0 for `Empty`, the sum over children for `And`/`Or`,
    /// 1 for everything else.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Empty => 0,
            Self::And(children) | Self::Or(children) => children.iter().map(Self::len).sum(),
            _ => 1,
        }
    }

    /// `true` for [`Condition::Empty`].
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Render to expression text, or `None` for a condition that renders to
    /// nothing (`Empty`, or combinators with only empty children).
    ///
    /// # Errors
    ///
    /// Returns `EncodingError` if a raw value fails its codec.
    pub fn render<R: Renderer + ?Sized>(
        &self,
        renderer: &mut R,
    ) -> Result<Option<String>, EncodingError> {
        let rendered = match self {
            Self::Empty => return Ok(None),
            Self::And(children) => return render_multi(children, "AND", renderer),
            Self::Or(children) => return render_multi(children, "OR", renderer),
            Self::Not(inner) => return Ok(inner.render(renderer)?.map(|s| format!("(NOT {s})"))),
            Self::Comparison { target, op, value } => {
                let name = renderer.name_ref(&target.column, &target.path);
                let value = renderer.value_ref(&target.column, value, &target.path)?;
                format!("({name} {op} {value})")
            }
            Self::Exists { target, negate } => {
                let function = if *negate {
                    "attribute_not_exists"
                } else {
                    "attribute_exists"
                };
                let name = renderer.name_ref(&target.column, &target.path);
                format!("({function}({name}))")
            }
            Self::BeginsWith { target, value } => {
                let name = renderer.name_ref(&target.column, &target.path);
                let value = renderer.value_ref(&target.column, value, &target.path)?;
                format!("(begins_with({name}, {value}))")
            }
            Self::Contains { target, value } => {
                let name = renderer.name_ref(&target.column, &target.path);
                let value = renderer.member_ref(&target.column, value, &target.path)?;
                format!("(contains({name}, {value}))")
            }
            Self::Between {
                target,
                lower,
                upper,
            } => {
                let name = renderer.name_ref(&target.column, &target.path);
                let lower = renderer.value_ref(&target.column, lower, &target.path)?;
                let upper = renderer.value_ref(&target.column, upper, &target.path)?;
                format!("({name} BETWEEN {lower} AND {upper})")
            }
            Self::In { target, values } => {
                let name = renderer.name_ref(&target.column, &target.path);
                let refs = values
                    .iter()
                    .map(|v| renderer.value_ref(&target.column, v, &target.path))
                    .collect::<Result<Vec<_>, _>>()?;
                format!("({name} IN ({}))", refs.join(", "))
            }
        };
        Ok(Some(rendered))
    }
}

fn render_multi<R: Renderer + ?Sized>(
    children: &[Condition],
    joiner: &str,
    renderer: &mut R,
) -> Result<Option<String>, EncodingError> {
    let mut rendered = Vec::with_capacity(children.len());
    for child in children {
        if let Some(text) = child.render(renderer)? {
            rendered.push(text);
        }
    }
    Ok(match rendered.len() {
        0 => None,
        1 => rendered.pop(),
        _ => Some(format!("({})", rendered.join(&format!(" {joiner} ")))),
    })
}

impl BitAnd for Condition {
    type Output = Condition;

    fn bitand(self, rhs: Condition) -> Condition {
        self.and_with(rhs)
    }
}

impl BitAndAssign for Condition {
    fn bitand_assign(&mut self, rhs: Condition) {
        *self = std::mem::take(self).and_with(rhs);
    }
}

impl BitOr for Condition {
    type Output = Condition;

    fn bitor(self, rhs: Condition) -> Condition {
        self.or_with(rhs)
    }
}

impl BitOrAssign for Condition {
    fn bitor_assign(&mut self, rhs: Condition) {
        *self = std::mem::take(self).or_with(rhs);
    }
}

impl std::ops::Not for Condition {
    type Output = Condition;

    fn not(self) -> Condition {
        self.negate()
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("()"),
            Self::And(children) => write_multi(f, children, "&"),
            Self::Or(children) => write_multi(f, children, "|"),
            Self::Not(inner) => write!(f, "(~{inner})"),
            Self::Comparison { target, op, value } => write!(f, "({target} {op} {value})"),
            Self::Exists { target, negate } => {
                let is = if *negate { "is" } else { "is not" };
                write!(f, "({target} {is} None)")
            }
            Self::BeginsWith { target, value } => write!(f, "({target} begins with {value})"),
            Self::Contains { target, value } => write!(f, "({target} contains {value})"),
            Self::Between {
                target,
                lower,
                upper,
            } => write!(f, "({target} between [{lower}, {upper}])"),
            Self::In { target, values } => {
                let values: Vec<String> = values.iter().map(ToString::to_string).collect();
                write!(f, "({target} in [{}])", values.join(", "))
            }
        }
    }
}

fn write_multi(f: &mut fmt::Formatter<'_>, children: &[Condition], joiner: &str) -> fmt::Result {
    // A single child prints with a trailing joiner so it is distinguishable
    // from the bare child.
    if let [only] = children {
        return write!(f, "({only} {joiner})");
    }
    let parts: Vec<String> = children.iter().map(ToString::to_string).collect();
    write!(f, "({})", parts.join(&format!(" {joiner} ")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec;
    use crate::schema::ModelMeta;

    /// Returns the same placeholders for every call.
    struct FixedRenderer;

    impl Renderer for FixedRenderer {
        fn name_ref(&mut self, _column: &Column, _path: &[PathElement]) -> String {
            "#n0".to_owned()
        }

        fn value_ref(
            &mut self,
            _column: &Column,
            _value: &ConditionValue,
            _path: &[PathElement],
        ) -> Result<String, EncodingError> {
            Ok("#v0".to_owned())
        }
    }

    /// Counts allocations and echoes the path it was given.
    #[derive(Default)]
    struct CountingRenderer {
        names: usize,
        values: usize,
        paths: Vec<Vec<PathElement>>,
    }

    impl Renderer for CountingRenderer {
        fn name_ref(&mut self, column: &Column, path: &[PathElement]) -> String {
            self.names += 1;
            self.paths.push(path.to_vec());
            column.dynamo_name().to_owned()
        }

        fn value_ref(
            &mut self,
            _column: &Column,
            _value: &ConditionValue,
            _path: &[PathElement],
        ) -> Result<String, EncodingError> {
            self.values += 1;
            Ok(format!(":v{}", self.values - 1))
        }
    }

    fn meta() -> Arc<ModelMeta> {
        ModelMeta::builder("User")
            .column(Column::new("id", codec::string()).as_hash_key())
            .column(Column::new("age", codec::integer()))
            .column(Column::new("name", codec::string()))
            .column(Column::new("tags", codec::map(codec::list(codec::string()))))
            .build()
            .unwrap()
    }

    fn attr(meta: &ModelMeta, name: &str) -> ColumnRef {
        meta.attr(name).unwrap()
    }

    #[test]
    fn test_should_render_empty_as_absent() {
        assert_eq!(Condition::Empty.render(&mut FixedRenderer).unwrap(), None);
    }

    #[test]
    fn test_should_treat_empty_as_identity() {
        let meta = meta();
        let c = attr(&meta, "age").equal(5);
        assert_eq!(Condition::Empty.and_with(c.clone()), c);
        assert_eq!(c.clone().and_with(Condition::Empty), c);
        assert_eq!(Condition::Empty.or_with(c.clone()), c);
        assert_eq!(c.clone().or_with(Condition::Empty), c);
        assert_eq!(Condition::Empty.negate(), Condition::Empty);
    }

    #[test]
    fn test_should_render_comparison_with_fixed_placeholders() {
        let meta = meta();
        let c = attr(&meta, "age").equal(5);
        assert_eq!(
            c.render(&mut FixedRenderer).unwrap().as_deref(),
            Some("(#n0 = #v0)")
        );
    }

    #[test]
    fn test_should_reject_unknown_operator() {
        let meta = meta();
        let err = attr(&meta, "age")
            .compare_with("==", Value::from(1))
            .unwrap_err();
        assert_eq!(
            err,
            ConditionError::InvalidOperator {
                operator: "==".to_owned()
            }
        );
        assert!(attr(&meta, "age").compare_with("<>", Value::from(1)).is_ok());
    }

    #[test]
    fn test_should_append_to_and_accumulator_in_place() {
        let meta = meta();
        let a = attr(&meta, "age").at_least(18);
        let b = attr(&meta, "name").begins_with("A");
        let c = attr(&meta, "id").is_not_none();

        let combined = (a.clone() & b.clone()) & c.clone();
        assert_eq!(combined, Condition::And(vec![a.clone(), b.clone(), c.clone()]));

        let mut acc = Condition::Empty;
        for cond in [a, b, c] {
            acc &= cond;
        }
        assert!(matches!(&acc, Condition::And(children) if children.len() == 3));
        assert_eq!(acc.len(), 3);
    }

    #[test]
    fn test_should_append_to_or_accumulator_in_place() {
        let meta = meta();
        let age = attr(&meta, "age");
        let combined = age.equal(1) | age.equal(2) | age.equal(3);
        assert!(matches!(&combined, Condition::Or(children) if children.len() == 3));
    }

    #[test]
    fn test_should_nest_mixed_combinators() {
        let meta = meta();
        let age = attr(&meta, "age");
        let combined = (age.equal(1) | age.equal(2)) & age.equal(3);
        match &combined {
            Condition::And(children) => {
                assert_eq!(children.len(), 2);
                assert!(matches!(children[0], Condition::Or(_)));
            }
            other => panic!("expected And, got {other:?}"),
        }
        assert_eq!(combined.len(), 3);
    }

    #[test]
    fn test_should_count_leaves() {
        let meta = meta();
        let age = attr(&meta, "age");
        assert_eq!(Condition::Empty.len(), 0);
        assert_eq!(age.equal(1).len(), 1);
        assert_eq!((!age.equal(1)).len(), 1);
        let nested = Condition::And(vec![
            age.equal(1),
            Condition::Or(vec![age.equal(2), age.equal(3)]),
            Condition::Empty,
        ]);
        assert_eq!(nested.len(), 3);
    }

    #[test]
    fn test_should_not_simplify_double_negation() {
        let meta = meta();
        let c = attr(&meta, "age").equal(1);
        let twice = !!c.clone();
        assert_eq!(twice, Condition::Not(Box::new(Condition::Not(Box::new(c)))));
        let mut renderer = CountingRenderer::default();
        assert_eq!(
            twice.render(&mut renderer).unwrap().as_deref(),
            Some("(NOT (NOT (age = :v0)))")
        );
    }

    #[test]
    fn test_should_compare_columns_by_identity() {
        let a = meta();
        let b = meta();
        assert_eq!(attr(&a, "age").equal(1), attr(&a, "age").equal(1));
        assert_ne!(attr(&a, "age").equal(1), attr(&b, "age").equal(1));
        assert_ne!(attr(&a, "age").equal(1), attr(&a, "age").equal(2));
        assert_ne!(attr(&a, "age").equal(1), attr(&a, "age").not_equal(1));
        assert_ne!(
            attr(&a, "tags").at("x").equal("y"),
            attr(&a, "tags").at("z").equal("y")
        );
    }

    #[test]
    fn test_should_render_single_child_without_extra_parens() {
        let meta = meta();
        let single = Condition::And(vec![attr(&meta, "age").equal(1)]);
        let mut renderer = CountingRenderer::default();
        assert_eq!(
            single.render(&mut renderer).unwrap().as_deref(),
            Some("(age = :v0)")
        );
    }

    #[test]
    fn test_should_skip_empty_children_when_rendering() {
        let meta = meta();
        let cond = Condition::Or(vec![
            Condition::Empty,
            attr(&meta, "age").equal(1),
            Condition::Empty,
            attr(&meta, "name").is_none(),
        ]);
        let mut renderer = CountingRenderer::default();
        assert_eq!(
            cond.render(&mut renderer).unwrap().as_deref(),
            Some("((age = :v0) OR (attribute_not_exists(name)))")
        );
        assert_eq!(Condition::And(Vec::new()).render(&mut renderer).unwrap(), None);
    }

    #[test]
    fn test_should_render_every_leaf_shape() {
        let meta = meta();
        let age = attr(&meta, "age");
        let name = attr(&meta, "name");
        let cond = name.is_not_none()
            & name.begins_with("A")
            & name.contains("b")
            & age.between(1, 9)
            & age.is_in([1, 2, 3])
            & age.less_than(100)
            & age.greater_than(0)
            & age.at_most(99);
        let mut renderer = CountingRenderer::default();
        assert_eq!(
            cond.render(&mut renderer).unwrap().as_deref(),
            Some(
                "((attribute_exists(name)) AND (begins_with(name, :v0)) AND \
                 (contains(name, :v1)) AND (age BETWEEN :v2 AND :v3) AND \
                 (age IN (:v4, :v5, :v6)) AND (age < :v7) AND (age > :v8) AND (age <= :v9))"
            )
        );
    }

    #[test]
    fn test_should_allocate_two_refs_for_degenerate_between() {
        let meta = meta();
        let mut renderer = CountingRenderer::default();
        let rendered = attr(&meta, "age").between(1, 1).render(&mut renderer).unwrap();
        assert_eq!(rendered.as_deref(), Some("(age BETWEEN :v0 AND :v1)"));
        assert_eq!(renderer.names, 1);
        assert_eq!(renderer.values, 2);
    }

    #[test]
    fn test_should_render_empty_in_list() {
        let meta = meta();
        let empty: [i64; 0] = [];
        let mut renderer = CountingRenderer::default();
        let rendered = attr(&meta, "age").is_in(empty).render(&mut renderer).unwrap();
        assert_eq!(rendered.as_deref(), Some("(age IN ())"));
        assert_eq!(renderer.values, 0);
    }

    #[test]
    fn test_should_forward_paths_to_renderer() {
        let meta = meta();
        let target = attr(&meta, "tags").at("colors").at(2);
        let mut renderer = CountingRenderer::default();
        target.equal("red").render(&mut renderer).unwrap();
        assert_eq!(
            renderer.paths,
            vec![vec![PathElement::from("colors"), PathElement::from(2)]]
        );
    }

    #[test]
    fn test_should_display_for_debugging() {
        let meta = meta();
        let cond = attr(&meta, "tags").at("colors").at(0).equal("red") & !attr(&meta, "age").is_none();
        assert_eq!(
            cond.to_string(),
            r#"((User.tags["colors"][0] = "red") & (~(User.age is None)))"#
        );
        assert_eq!(
            Condition::And(vec![attr(&meta, "age").equal(1)]).to_string(),
            "((User.age = 1) &)"
        );
    }
}
