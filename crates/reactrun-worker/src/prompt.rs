//! Composite prompt construction.

use serde_json::Value;

use reactrun_core::is_present;

const HEADER: &str = "Perform the task using the inputs below. \
Your final output must be a single JSON object only (no code blocks, no explanations).\n\n";

const RESULT_REQUIREMENTS: &str = "[Result format requirements]\n\
- If feedback is provided, treat it as the highest-priority criterion.\n\
- The result must be a JSON object whose keys are the form keys from form_type (form key: value).\n\
- Respect the declared type of each form key (number, string, array, object, ...).\n\
- form_html is a hint for interpreting form_type. Inspect its structure (for example an items array) to shape the values.\n\
- Return only JSON, without any additional sentences.\n\n";

const OUTPUT_EXAMPLE: &str = "[Output JSON example]\n\
{\n  \"example_number_key\": 123,\n  \"example_text_key\": \"text\"\n}\n\n";

const CLOSING_NOTE: &str = "Note: the example above only illustrates the format. \
The final output must contain only the form keys defined in form_type, with values matching each key's type and name. \
Return only JSON, with no extra text, explanation, or code blocks.\n";

/// Build the instruction string handed to the agent.
///
/// Sections appear in a fixed order and are omitted when empty: feedback,
/// work item name, instructions, previous output, `form_type`, `form_html`.
/// The result-format contract always closes the prompt.
pub fn compose(
    activity_name: &str,
    description: &str,
    previous_result: &str,
    feedback_summary: &str,
    form_types: Option<&Value>,
    form_html: Option<&Value>,
) -> String {
    let mut prompt = String::from(HEADER);

    // Feedback first so the agent weighs it most
    push_section(&mut prompt, "Feedback", feedback_summary);
    push_section(&mut prompt, "Work item name", activity_name);
    push_section(&mut prompt, "Instructions", description);
    push_section(&mut prompt, "Previous output", previous_result);
    push_json_section(&mut prompt, "form_type", form_types);
    push_json_section(&mut prompt, "form_html", form_html);

    prompt.push_str(RESULT_REQUIREMENTS);
    prompt.push_str(OUTPUT_EXAMPLE);
    prompt.push_str(CLOSING_NOTE);
    prompt
}

fn push_section(prompt: &mut String, title: &str, value: &str) {
    let value = value.trim();
    if value.is_empty() {
        return;
    }
    prompt.push_str(&format!("[{}]\n{}\n\n", title, value));
}

fn push_json_section(prompt: &mut String, title: &str, value: Option<&Value>) {
    let Some(value) = value.filter(|v| is_present(v)) else {
        return;
    };
    // Serializing a Value cannot fail
    let text = serde_json::to_string(value).unwrap_or_default();
    prompt.push_str(&format!("[{}]\n{}\n\n", title, text));
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn compose_all(feedback: &str, form_types: Option<&Value>) -> String {
        compose(
            "Draft summary",
            "Summarize the attached report",
            "previous draft",
            feedback,
            form_types,
            Some(&json!("<form/>")),
        )
    }

    #[test]
    fn test_section_order() {
        let form_types = json!({"summary": "string"});
        let prompt = compose_all("Be shorter", Some(&form_types));

        let order = [
            "[Feedback]\nBe shorter\n\n",
            "[Work item name]\nDraft summary\n\n",
            "[Instructions]\nSummarize the attached report\n\n",
            "[Previous output]\nprevious draft\n\n",
            "[form_type]\n{\"summary\":\"string\"}\n\n",
            "[form_html]\n\"<form/>\"\n\n",
            "[Result format requirements]",
        ];
        let positions: Vec<usize> = order
            .iter()
            .map(|section| prompt.find(section).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert!(prompt.starts_with(HEADER));
        assert!(prompt.ends_with(CLOSING_NOTE));
    }

    #[test]
    fn test_empty_sections_omitted() {
        let prompt = compose("  ", "do it", "", "\n", Some(&json!({})), None);

        assert!(!prompt.contains("[Feedback]"));
        assert!(!prompt.contains("[Work item name]"));
        assert!(!prompt.contains("[Previous output]"));
        assert!(!prompt.contains("[form_type]"));
        assert!(!prompt.contains("[form_html]"));
        assert!(prompt.contains("[Instructions]\ndo it\n\n"));
    }

    #[test]
    fn test_sections_are_trimmed() {
        let prompt = compose("  Draft  ", "", "", "", None, None);
        assert!(prompt.contains("[Work item name]\nDraft\n\n"));
    }

    #[test]
    fn test_compose_is_deterministic() {
        let form_types = json!({"b": "number", "a": "string"});
        assert_eq!(
            compose_all("x", Some(&form_types)),
            compose_all("x", Some(&form_types))
        );
    }

    #[test]
    fn test_output_example_is_valid_json() {
        let body = OUTPUT_EXAMPLE
            .trim_start_matches("[Output JSON example]\n")
            .trim();
        let parsed: Value = serde_json::from_str(body).unwrap();
        assert!(parsed.is_object());
    }
}
