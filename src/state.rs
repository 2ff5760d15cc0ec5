use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Shared state record threaded through every stage of a workflow run.
///
/// A state is a mapping from field name to JSON value, created fresh per
/// run and owned by exactly one run at a time. Fields are only ever
/// overwritten or appended to — there is deliberately no delete API, so a
/// stage can rely on every field written by an earlier stage still being
/// present when it executes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkflowState {
    fields: BTreeMap<String, Value>,
    path: Vec<String>,
}

impl WorkflowState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style field initialization for the entry stage's inputs.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    /// Set a field, overwriting any previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(|v| v.as_str())
    }

    /// String field with a fallback for missing or non-string values.
    pub fn str_or(&self, key: &str, default: &str) -> String {
        self.get_str(key).unwrap_or(default).to_string()
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.fields.get(key).and_then(|v| v.as_i64())
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.fields.get(key).and_then(|v| v.as_bool())
    }

    pub fn get_list(&self, key: &str) -> Option<&Vec<Value>> {
        self.fields.get(key).and_then(|v| v.as_array())
    }

    /// Length of a list field, 0 when the field is missing or not a list.
    pub fn list_len(&self, key: &str) -> usize {
        self.get_list(key).map(|l| l.len()).unwrap_or(0)
    }

    /// String items of a list field, skipping non-string entries.
    pub fn strings(&self, key: &str) -> Vec<String> {
        self.get_list(key)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| v.as_str().map(|s| s.to_string()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Append to a list field, creating the list if the field is missing.
    ///
    /// A non-list value under `key` is replaced by a fresh single-item list.
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let entry = self
            .fields
            .entry(key.into())
            .or_insert_with(|| Value::Array(Vec::new()));
        match entry.as_array_mut() {
            Some(list) => list.push(value.into()),
            None => *entry = Value::Array(vec![value.into()]),
        }
    }

    /// Current value of an integer cursor field, 0 when unset.
    pub fn cursor(&self, key: &str) -> u64 {
        self.fields.get(key).and_then(|v| v.as_u64()).unwrap_or(0)
    }

    /// Increment a cursor field and return the new value.
    ///
    /// Iterative workflows rely on this being strictly monotonic: the loop
    /// predicate compares the cursor against a fixed list length, so every
    /// advance is one guaranteed step toward the exit condition.
    pub fn advance(&mut self, key: &str) -> u64 {
        let next = self.cursor(key) + 1;
        self.fields.insert(key.to_string(), Value::from(next));
        next
    }

    /// Names of the stages executed so far, in execution order.
    pub fn path(&self) -> &[String] {
        &self.path
    }

    pub(crate) fn record_visit(&mut self, stage: &str) {
        self.path.push(stage.to_string());
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }
}
