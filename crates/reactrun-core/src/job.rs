//! Job inputs as delivered by the job poller.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::CoreError;

/// Key used for the output payload when the job carries no `form_id`.
///
/// Matches what the remote caller already receives from the polling server,
/// which serializes a missing key as `null`.
pub const MISSING_FORM_KEY: &str = "null";

/// Immutable inputs of one job.
///
/// Decoded once from the poller's context document and never mutated.
/// Field names on the wire follow the context document (`task_id`,
/// `agent_list`), not the Rust names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobInputs {
    /// Work item identifier, stringified if the poller sent a number.
    #[serde(rename = "task_id", default, deserialize_with = "stringified")]
    pub todo_id: Option<String>,

    /// Process instance identifier, stringified if present.
    #[serde(default, deserialize_with = "stringified")]
    pub proc_inst_id: Option<String>,

    /// Name of the activity (work item) being performed.
    #[serde(default, deserialize_with = "text_or_empty")]
    pub activity_name: String,

    /// Free-text instructions for the agent.
    #[serde(default, deserialize_with = "text_or_empty")]
    pub description: String,

    /// Form whose fields the result must fill.
    #[serde(default, deserialize_with = "stringified")]
    pub form_id: Option<String>,

    /// Field-type schema of the form.
    #[serde(default)]
    pub form_types: Option<Value>,

    /// Form markup, used as a hint for value shapes.
    #[serde(default)]
    pub form_html: Option<Value>,

    /// Result of a previous attempt at this work item.
    #[serde(default, deserialize_with = "text_or_empty")]
    pub output_summary: String,

    /// Reviewer feedback on a previous attempt.
    #[serde(default, deserialize_with = "text_or_empty")]
    pub feedback_summary: String,

    /// Agent metadata, passed through untouched.
    #[serde(rename = "agent_list", default)]
    pub agent_info: Option<Value>,

    /// Requesting user metadata, passed through untouched.
    #[serde(default)]
    pub user_info: Option<Value>,

    /// Human participants, passed through untouched.
    #[serde(default)]
    pub human_users: Option<Value>,

    /// Free-form user message attached to the job. Logged only.
    #[serde(default)]
    pub user_input: Option<String>,
}

impl JobInputs {
    /// Decode inputs from a context document.
    pub fn from_context(context: Value) -> Result<Self, CoreError> {
        if !context.is_object() {
            return Err(CoreError::InvalidContext(format!(
                "expected a JSON object, got {}",
                type_name(&context)
            )));
        }
        serde_json::from_value(context).map_err(|e| CoreError::InvalidContext(e.to_string()))
    }

    /// Key the final output payload is stored under.
    pub fn output_key(&self) -> &str {
        self.form_id.as_deref().unwrap_or(MISSING_FORM_KEY)
    }
}

/// Whether a JSON value counts as present for prompt composition.
///
/// `null`, `false`, `0`, empty strings, empty arrays and empty objects are
/// absent; everything else is present.
pub fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn stringified<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

fn text_or_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s,
        Some(other) => other.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_context_maps_poller_keys() {
        let inputs = JobInputs::from_context(json!({
            "task_id": "todo-1",
            "proc_inst_id": 42,
            "activity_name": "Draft summary",
            "description": "Summarize the attached report",
            "form_id": "summary_form",
            "form_types": {"summary": "string"},
            "agent_list": [{"name": "react"}],
        }))
        .unwrap();

        assert_eq!(inputs.todo_id.as_deref(), Some("todo-1"));
        assert_eq!(inputs.proc_inst_id.as_deref(), Some("42"));
        assert_eq!(inputs.activity_name, "Draft summary");
        assert_eq!(inputs.form_types, Some(json!({"summary": "string"})));
        assert_eq!(inputs.agent_info, Some(json!([{"name": "react"}])));
        assert_eq!(inputs.output_key(), "summary_form");
    }

    #[test]
    fn test_missing_and_null_fields_default() {
        let inputs = JobInputs::from_context(json!({
            "task_id": null,
            "output_summary": null,
        }))
        .unwrap();

        assert_eq!(inputs.todo_id, None);
        assert_eq!(inputs.proc_inst_id, None);
        assert_eq!(inputs.output_summary, "");
        assert_eq!(inputs.feedback_summary, "");
        assert_eq!(inputs.form_html, None);
        assert_eq!(inputs.output_key(), MISSING_FORM_KEY);
    }

    #[test]
    fn test_from_context_rejects_non_object() {
        let result = JobInputs::from_context(json!(["not", "an", "object"]));
        assert!(matches!(result, Err(CoreError::InvalidContext(_))));
    }

    #[test]
    fn test_is_present() {
        assert!(!is_present(&Value::Null));
        assert!(!is_present(&json!("")));
        assert!(!is_present(&json!({})));
        assert!(!is_present(&json!([])));
        assert!(!is_present(&json!(0)));
        assert!(!is_present(&json!(false)));
        assert!(is_present(&json!("<form/>")));
        assert!(is_present(&json!({"a": "string"})));
        assert!(is_present(&json!(1)));
    }
}
