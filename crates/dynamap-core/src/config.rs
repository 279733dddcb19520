//! Mapper configuration.
//!
//! Provides [`MapperConfig`], which controls the placeholder tokens produced by
//! [`ExpressionRenderer`](crate::expression::ExpressionRenderer) and whether write
//! requests carry the atomic condition unless told otherwise.

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

/// Mapper configuration.
///
/// # Examples
///
/// ```
/// use dynamap_core::config::MapperConfig;
///
/// let config = MapperConfig::default();
/// assert_eq!(config.name_prefix, "#n");
/// assert!(!config.atomic_by_default);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct MapperConfig {
    /// Prefix of attribute-name placeholders (`#n0`, `#n1`...).
    #[builder(default = String::from("#n"))]
    pub name_prefix: String,

    /// Prefix of attribute-value placeholders (`:v0`, `:v1`...).
    #[builder(default = String::from(":v"))]
    pub value_prefix: String,

    /// Whether save and delete requests are guarded by the atomic condition
    /// when the caller does not say.
    #[builder(default = false)]
    pub atomic_by_default: bool,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            name_prefix: String::from("#n"),
            value_prefix: String::from(":v"),
            atomic_by_default: false,
        }
    }
}

impl MapperConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `DYNAMAP_NAME_PREFIX` | `#n` |
    /// | `DYNAMAP_VALUE_PREFIX` | `:v` |
    /// | `DYNAMAP_ATOMIC` | `false` |
    ///
    /// Empty prefixes are ignored, since they would make tokens collide with
    /// plain attribute names.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(v) = std::env::var("DYNAMAP_NAME_PREFIX") {
            if !v.is_empty() {
                config.name_prefix = v;
            }
        }
        if let Ok(v) = std::env::var("DYNAMAP_VALUE_PREFIX") {
            if !v.is_empty() {
                config.value_prefix = v;
            }
        }
        if let Ok(v) = std::env::var("DYNAMAP_ATOMIC") {
            config.atomic_by_default = parse_bool(&v);
        }

        config
    }
}

/// Parse a string as a boolean, accepting `"1"` and `"true"` (case-insensitive).
fn parse_bool(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}
