use serde::{Deserialize, Serialize};
use serde_json::Value;

const ID_KEYS: [&str; 4] = ["id", "agent_id", "name", "label"];
const LABEL_KEYS: [&str; 3] = ["name", "id", "label"];

/// An agent as reported by the backend. No shape is enforced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Agent(Value);

impl Agent {
    pub fn new(raw: Value) -> Self {
        Self(raw)
    }

    /// Identity used when talking to the backend.
    pub fn id(&self) -> Option<String> {
        match &self.0 {
            Value::Object(_) => first_present(&self.0, &ID_KEYS),
            other => scalar_text(other),
        }
    }

    /// Human-facing name for selection lists.
    pub fn label(&self) -> String {
        match &self.0 {
            Value::Object(_) => {
                first_present(&self.0, &LABEL_KEYS).unwrap_or_else(|| self.0.to_string())
            }
            other => scalar_text(other).unwrap_or_else(|| other.to_string()),
        }
    }
}

fn first_present(record: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| record.get(*key))
        .find_map(scalar_text)
}

/// Text form of a scalar, skipping values that carry no identity.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
