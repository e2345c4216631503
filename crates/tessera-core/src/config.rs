//! Tree configuration

use serde::{Deserialize, Serialize};

/// Configuration for Merkle tree behavior
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    /// Recalculate synchronously after every mutation. When off, mutations
    /// only mark the tree dirty and the root is recalculated on demand.
    pub eager_recalculate: bool,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            eager_recalculate: true,
        }
    }
}

impl TreeConfig {
    /// Configuration that defers recalculation until the root is read
    pub fn lazy() -> Self {
        Self {
            eager_recalculate: false,
        }
    }

    /// Set eager recalculation
    pub fn with_eager_recalculate(mut self, eager: bool) -> Self {
        self.eager_recalculate = eager;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        assert!(TreeConfig::default().eager_recalculate);
        assert!(!TreeConfig::lazy().eager_recalculate);
        assert_eq!(
            TreeConfig::default().with_eager_recalculate(false),
            TreeConfig::lazy()
        );
    }

    #[test]
    fn test_deserialize_fills_missing_fields() {
        let config: TreeConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, TreeConfig::default());

        let config: TreeConfig = serde_json::from_str(r#"{"eager_recalculate":false}"#).unwrap();
        assert_eq!(config, TreeConfig::lazy());
    }
}
