use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::surface::EditorOptions;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Display name of the root entity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
    /// Global option defaults every editor inherits unless it overrides them.
    #[serde(default = "default_editor_options")]
    pub editor_defaults: EditorOptions,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            project_name: None,
            editor_defaults: default_editor_options(),
        }
    }
}

impl Settings {
    pub fn from_json_str(data: &str) -> serde_json::Result<Self> {
        serde_json::from_str(data)
    }
}

fn default_editor_options() -> EditorOptions {
    [
        ("tabSize", json!(4)),
        ("indentUnit", json!(4)),
        ("lineNumbers", json!(true)),
        ("lineWrapping", json!(false)),
        ("theme", Value::from("default")),
    ]
    .into_iter()
    .map(|(name, value)| (name.to_string(), value))
    .collect()
}
