//! Model registry with an injected schema-generation hook.

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use super::SchemaError;
use super::model::ModelMeta;

/// Callback run once for every model registered with a [`ModelRegistry`].
///
/// This is where a serialization-schema generator plugs in. It is passed to
/// the registry that owns it, so two registries can run different hooks.
pub trait SchemaHook: Send + Sync {
    /// Called after validation, before the model becomes visible.
    fn on_register(&self, meta: &ModelMeta) -> anyhow::Result<()>;
}

impl<F> SchemaHook for F
where
    F: Fn(&ModelMeta) -> anyhow::Result<()> + Send + Sync,
{
    fn on_register(&self, meta: &ModelMeta) -> anyhow::Result<()> {
        self(meta)
    }
}

/// Registered models keyed by name.
#[derive(Default)]
pub struct ModelRegistry {
    models: DashMap<String, Arc<ModelMeta>>,
    hook: Option<Box<dyn SchemaHook>>,
}

impl ModelRegistry {
    /// Create an empty registry without a hook.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the hook run for every subsequent registration.
    #[must_use]
    pub fn with_schema_hook(mut self, hook: impl SchemaHook + 'static) -> Self {
        self.hook = Some(Box::new(hook));
        self
    }

    /// Register a model. Fails if the name is taken or the hook rejects it.
    ///
    /// The hook runs while the name is reserved, so it must not call back into
    /// this registry.
    pub fn register(&self, meta: Arc<ModelMeta>) -> Result<Arc<ModelMeta>, SchemaError> {
        match self.models.entry(meta.name().to_owned()) {
            dashmap::mapref::entry::Entry::Occupied(e) => Err(SchemaError::DuplicateModel {
                name: e.key().clone(),
            }),
            dashmap::mapref::entry::Entry::Vacant(e) => {
                if let Some(hook) = &self.hook {
                    hook.on_register(&meta).map_err(|source| SchemaError::Hook {
                        model: meta.name().to_owned(),
                        source,
                    })?;
                }
                debug!(model = meta.name(), table = meta.table_name(), "registered model");
                e.insert(Arc::clone(&meta));
                Ok(meta)
            }
        }
    }

    /// Get a model by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<ModelMeta>> {
        self.models.get(name).map(|r| Arc::clone(r.value()))
    }

    /// All registered model names (sorted).
    #[must_use]
    pub fn model_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.models.iter().map(|r| r.key().clone()).collect();
        names.sort();
        names
    }
}

impl fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelRegistry")
            .field("models", &self.model_names())
            .field("hook", &self.hook.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::codec;
    use crate::schema::Column;

    fn model(name: &str) -> Arc<ModelMeta> {
        ModelMeta::builder(name)
            .column(Column::new("id", codec::string()).as_hash_key())
            .build()
            .unwrap()
    }

    #[test]
    fn test_should_run_hook_per_registration() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let registry =
            ModelRegistry::new().with_schema_hook(move |meta: &ModelMeta| -> anyhow::Result<()> {
                sink.lock().unwrap().push(meta.name().to_owned());
                Ok(())
            });

        registry.register(model("User")).unwrap();
        registry.register(model("Order")).unwrap();

        assert_eq!(*seen.lock().unwrap(), ["User", "Order"]);
        assert_eq!(registry.model_names(), ["Order", "User"]);
    }

    #[test]
    fn test_should_not_register_when_hook_fails() {
        let registry =
            ModelRegistry::new().with_schema_hook(|_: &ModelMeta| -> anyhow::Result<()> {
                Err(anyhow::anyhow!("unsupported column type"))
            });
        let err = registry.register(model("User")).unwrap_err();
        assert!(matches!(err, SchemaError::Hook { ref model, .. } if model == "User"));
        assert!(registry.get("User").is_none());
    }

    #[test]
    fn test_should_reject_duplicate_model_names() {
        let registry = ModelRegistry::new();
        registry.register(model("User")).unwrap();
        let err = registry.register(model("User")).unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateModel { .. }));
    }
}
