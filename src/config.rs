//! Bridge configuration.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use netbridge_registry::{DEFAULT_FUNCTION_PREFIX, RegistryBuilder};

/// Settings shared by every runtime attached to a bridge.
///
/// Every field has a default, so a partial document only overrides what it
/// names:
///
/// ```
/// use netbridge::BridgeConfig;
///
/// let config = BridgeConfig::from_json(r#"{ "defaultWaitTimeoutMs": 500 }"#).unwrap();
/// assert_eq!(config.function_prefix, "netFunc_");
/// assert_eq!(config.default_wait_timeout_ms, Some(500));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BridgeConfig {
    /// Declared-name prefix marking reflected functions as scriptable
    pub function_prefix: String,
    /// Timeout applied to waits begun without an explicit one
    pub default_wait_timeout_ms: Option<u64>,
}

impl BridgeConfig {
    /// Parse a JSON configuration document.
    pub fn from_json(source: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(source)?)
    }

    /// A registry builder using the configured function prefix.
    pub fn registry_builder(&self) -> RegistryBuilder {
        RegistryBuilder::new().with_function_prefix(self.function_prefix.clone())
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            function_prefix: DEFAULT_FUNCTION_PREFIX.to_string(),
            default_wait_timeout_ms: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        assert_eq!(BridgeConfig::from_json("{}").unwrap(), BridgeConfig::default());
    }

    #[test]
    fn overrides_prefix() {
        let config = BridgeConfig::from_json(r#"{ "functionPrefix": "lua_" }"#).unwrap();
        assert_eq!(config.function_prefix, "lua_");
        assert_eq!(config.default_wait_timeout_ms, None);
        assert_eq!(config.registry_builder().build().function_prefix(), "lua_");
    }

    #[test]
    fn malformed_document_is_an_error() {
        let err = BridgeConfig::from_json("{ functionPrefix").unwrap_err();
        assert!(format!("{err}").starts_with("invalid bridge config"));
    }
}
