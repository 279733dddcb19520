//! Condition expressions and their rendering.
//!
//! - [`condition`]: the [`Condition`] AST and the [`ColumnRef`] builders.
//! - [`path`]: document paths into nested attributes.
//! - [`render`]: the [`Renderer`] contract and [`ExpressionRenderer`].

pub mod condition;
pub mod path;
pub mod render;

pub use condition::{ColumnRef, CompareOp, Condition, ConditionError, ConditionValue};
pub use path::{PathElement, display_path};
pub use render::{ExpressionRenderer, RenderedExpressions, Renderer};
