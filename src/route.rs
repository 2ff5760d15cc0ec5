use std::collections::HashMap;

/// Mapping from a classification value to a successor stage name.
///
/// Lookups are total: a value with no matching case resolves to the
/// fallback stage declared at construction, never to an error. Values are
/// trimmed and lowercased before matching so that upstream parsers do not
/// have to normalize perfectly.
#[derive(Debug, Clone)]
pub struct RoutingTable {
    cases: HashMap<String, String>,
    fallback: String,
}

impl RoutingTable {
    /// Create a table with the mandatory fallback successor.
    pub fn new(fallback: impl Into<String>) -> Self {
        Self {
            cases: HashMap::new(),
            fallback: fallback.into(),
        }
    }

    /// Map a classification value to a successor stage.
    pub fn case(mut self, value: impl Into<String>, stage: impl Into<String>) -> Self {
        self.cases
            .insert(value.into().trim().to_lowercase(), stage.into());
        self
    }

    /// Resolve a classification value to a stage name. Never fails.
    pub fn resolve(&self, value: &str) -> &str {
        self.cases
            .get(&value.trim().to_lowercase())
            .unwrap_or(&self.fallback)
    }

    /// All stage names this table can dispatch to, fallback included.
    pub fn targets(&self) -> impl Iterator<Item = &str> {
        self.cases
            .values()
            .map(|s| s.as_str())
            .chain(std::iter::once(self.fallback.as_str()))
    }
}
