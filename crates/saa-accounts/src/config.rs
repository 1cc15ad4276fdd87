//! Store configuration.

use serde::{Deserialize, Serialize};

/// Storage key used when none is configured.
pub const DEFAULT_STORAGE_KEY: &str = "saa_accounts_v1";

/// Settings for an [`AccountListStore`](crate::AccountListStore).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Key of the storage slot holding the account list.
    pub storage_key: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
        }
    }
}

impl StoreConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different storage key.
    #[must_use]
    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_key() {
        assert_eq!(StoreConfig::default().storage_key, "saa_accounts_v1");
    }

    #[test]
    fn missing_fields_use_defaults() {
        let config: StoreConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, StoreConfig::default());
    }

    #[test]
    fn custom_key() {
        let config = StoreConfig::new().with_storage_key("other");
        assert_eq!(config.storage_key, "other");

        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(json, r#"{"storage_key":"other"}"#);
    }
}
