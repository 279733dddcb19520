//! Model schemas: columns, model metadata, and the registry.

mod column;
mod model;
mod registry;

pub use column::Column;
pub use model::{ModelMeta, ModelMetaBuilder};
pub use registry::{ModelRegistry, SchemaHook};

/// Errors raised while defining or registering models.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// A model has no hash key column.
    #[error("model {model} has no hash key")]
    MissingHashKey {
        /// Model name.
        model: String,
    },
    /// More than one column claims the same key role.
    #[error("model {model} declares more than one {kind} key")]
    DuplicateKey {
        /// Model name.
        model: String,
        /// Which key role is duplicated.
        kind: &'static str,
    },
    /// Two columns share a field or wire name.
    #[error("model {model} declares column {name} twice")]
    DuplicateColumn {
        /// Model name.
        model: String,
        /// The duplicated name.
        name: String,
    },
    /// A field name does not belong to the model.
    #[error("model {model} has no column {name}")]
    UnknownColumn {
        /// Model name.
        model: String,
        /// The unknown field name.
        name: String,
    },
    /// A model with this name is already registered.
    #[error("model {name} is already registered")]
    DuplicateModel {
        /// Model name.
        name: String,
    },
    /// The registry's schema hook rejected the model.
    #[error("schema hook failed for model {model}: {source}")]
    Hook {
        /// Model name.
        model: String,
        /// Error returned by the hook.
        source: anyhow::Error,
    },
}
