//! Task construction settings.

/// Default namespace for labels reserved by mvirt.
pub const DEFAULT_LABEL_NAMESPACE: &str = "io.mvirt";

/// Length of the random identity suffix.
pub const DEFAULT_ID_LENGTH: usize = 12;

/// Configuration applied when constructing tasks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskConfig {
    /// Prefix for labels written by this crate (e.g. `io.mvirt.task.name`).
    pub label_namespace: String,
    /// Number of hex characters kept from the random token.
    pub id_length: usize,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            label_namespace: DEFAULT_LABEL_NAMESPACE.to_string(),
            id_length: DEFAULT_ID_LENGTH,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TaskConfig::default();
        assert_eq!(config.label_namespace, "io.mvirt");
        assert_eq!(config.id_length, 12);
    }
}
