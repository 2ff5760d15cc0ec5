use crate::state::WorkflowState;
use serde_json::Value;

/// Build a prompt string with variable substitution.
///
/// Replaces `{field}` placeholders in the template with values from the
/// state record. String values are substituted verbatim; other values use
/// their JSON rendering. Placeholders with no matching field are left
/// as-is.
pub fn render(template: &str, state: &WorkflowState) -> String {
    let mut rendered = template.to_string();
    for (key, value) in state.iter() {
        let placeholder = format!("{{{}}}", key);
        if !rendered.contains(&placeholder) {
            continue;
        }
        let text = match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        rendered = rendered.replace(&placeholder, &text);
    }
    rendered
}

/// Create a numbered list from items (1-indexed).
pub fn numbered_list(items: &[String]) -> String {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| format!("{}. {}", i + 1, item))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Wrap text in a labeled section for structured prompts.
pub fn section(label: &str, content: &str) -> String {
    format!("## {}\n{}", label, content)
}
