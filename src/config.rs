use crate::statics;
use serde::{Deserialize, Serialize};

/// Deployment policy for the editing core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Keep `name` read-only once a unit has been saved.
    pub lock_persisted_name: bool,
    /// Language used for schema descriptions.
    pub schema_language: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            lock_persisted_name: true,
            schema_language: statics::DEFAULT_LANGUAGE.to_string(),
        }
    }
}
