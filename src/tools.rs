//! Stateless utility tools dispatched by name.
//!
//! Each tool is a pure function from free text to a result string. Unlike
//! the usual chatbot pattern of stringifying exceptions into the reply,
//! failures come back on a distinguished error channel ([`ToolError`]);
//! callers decide how to present them.

use chrono::Local;
use rand::Rng;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ToolError {
    #[error("unknown tool '{0}'")]
    UnknownTool(String),

    #[error("invalid input: {0}")]
    BadInput(String),
}

pub type ToolResult = std::result::Result<String, ToolError>;

pub type ToolFn = fn(&str) -> ToolResult;

/// Registry mapping tool names to functions.
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    tools: BTreeMap<String, ToolFn>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: BTreeMap::new(),
        }
    }

    /// Registry preloaded with the built-in tools.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register("calculator", calculator);
        registry.register("random_number", random_number);
        registry.register("datetime", current_datetime);
        registry.register("word_count", word_count);
        registry.register("reverse_text", reverse_text);
        registry
    }

    pub fn register(&mut self, name: impl Into<String>, tool: ToolFn) {
        self.tools.insert(name.into(), tool);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(|s| s.as_str()).collect()
    }

    /// Run the named tool on the input.
    pub fn dispatch(&self, name: &str, input: &str) -> ToolResult {
        match self.tools.get(name) {
            Some(tool) => tool(input),
            None => Err(ToolError::UnknownTool(name.to_string())),
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Evaluate an arithmetic expression embedded in the input.
///
/// Supports `+ - * / ^` and parentheses; surrounding words are ignored, so
/// both `"5+3"` and `"calculate 5+3"` work.
pub fn calculator(input: &str) -> ToolResult {
    let expr = extract_expression(input)
        .ok_or_else(|| ToolError::BadInput(format!("no arithmetic expression in '{}'", input)))?;
    let value = calc::eval(&expr)?;
    Ok(format!(
        "Calculator result: {} = {}",
        expr,
        format_number(value)
    ))
}

/// Generate a random number, honoring a range when one appears in the
/// input (e.g. "between 1 and 50"); defaults to 1..=100 otherwise.
pub fn random_number(input: &str) -> ToolResult {
    let bounds: Vec<i64> = input
        .split(|c: char| !c.is_ascii_digit() && c != '-')
        .filter_map(|s| s.parse().ok())
        .collect();
    let (min, max) = match bounds.as_slice() {
        [a, b, ..] => (*a.min(b), *a.max(b)),
        _ => (1, 100),
    };
    let number = rand::rng().random_range(min..=max);
    Ok(format!(
        "Random number between {} and {}: {}",
        min, max, number
    ))
}

/// Current local date and time.
pub fn current_datetime(_input: &str) -> ToolResult {
    let now = Local::now();
    Ok(format!(
        "Current date and time: {}",
        now.format("%Y-%m-%d %H:%M:%S")
    ))
}

/// Word and character counts for the input text.
pub fn word_count(text: &str) -> ToolResult {
    let words = text.split_whitespace().count();
    let chars = text.chars().count();
    Ok(format!(
        "Text analysis - Words: {}, Characters: {}",
        words, chars
    ))
}

/// Reverse the input text.
pub fn reverse_text(text: &str) -> ToolResult {
    let reversed: String = text.trim().chars().rev().collect();
    Ok(format!("Reversed text: {}", reversed))
}

/// Longest run of arithmetic characters that contains at least one digit.
fn extract_expression(input: &str) -> Option<String> {
    let allowed = |c: char| c.is_ascii_digit() || "+-*/^(). ".contains(c);
    let mut best: Option<String> = None;
    let mut current = String::new();

    for c in input.chars().chain(std::iter::once('\0')) {
        if allowed(c) {
            current.push(c);
            continue;
        }
        let candidate = current.trim();
        if candidate.chars().any(|c| c.is_ascii_digit())
            && best.as_ref().map(|b| b.len() < candidate.len()).unwrap_or(true)
        {
            best = Some(candidate.to_string());
        }
        current.clear();
    }
    best
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

/// Recursive-descent evaluator for `+ - * / ^` with parentheses.
mod calc {
    use super::ToolError;

    pub fn eval(expr: &str) -> Result<f64, ToolError> {
        let tokens: Vec<char> = expr.chars().filter(|c| !c.is_whitespace()).collect();
        let mut parser = Parser { tokens, pos: 0 };
        let value = parser.expression()?;
        if parser.pos != parser.tokens.len() {
            return Err(ToolError::BadInput(format!(
                "unexpected character at position {} in '{}'",
                parser.pos, expr
            )));
        }
        Ok(value)
    }

    struct Parser {
        tokens: Vec<char>,
        pos: usize,
    }

    impl Parser {
        fn peek(&self) -> Option<char> {
            self.tokens.get(self.pos).copied()
        }

        fn bump(&mut self) -> Option<char> {
            let c = self.peek();
            if c.is_some() {
                self.pos += 1;
            }
            c
        }

        // expression := term (('+' | '-') term)*
        fn expression(&mut self) -> Result<f64, ToolError> {
            let mut value = self.term()?;
            while let Some(op) = self.peek() {
                match op {
                    '+' => {
                        self.bump();
                        value += self.term()?;
                    }
                    '-' => {
                        self.bump();
                        value -= self.term()?;
                    }
                    _ => break,
                }
            }
            Ok(value)
        }

        // term := factor (('*' | '/') factor)*
        fn term(&mut self) -> Result<f64, ToolError> {
            let mut value = self.factor()?;
            while let Some(op) = self.peek() {
                match op {
                    '*' => {
                        self.bump();
                        value *= self.factor()?;
                    }
                    '/' => {
                        self.bump();
                        let divisor = self.factor()?;
                        if divisor == 0.0 {
                            return Err(ToolError::BadInput("division by zero".to_string()));
                        }
                        value /= divisor;
                    }
                    _ => break,
                }
            }
            Ok(value)
        }

        // factor := '-' factor | power
        fn factor(&mut self) -> Result<f64, ToolError> {
            if self.peek() == Some('-') {
                self.bump();
                return Ok(-self.factor()?);
            }
            self.power()
        }

        // power := atom ('^' factor)?   (right-associative)
        fn power(&mut self) -> Result<f64, ToolError> {
            let base = self.atom()?;
            if self.peek() == Some('^') {
                self.bump();
                let exponent = self.factor()?;
                return Ok(base.powf(exponent));
            }
            Ok(base)
        }

        // atom := number | '(' expression ')'
        fn atom(&mut self) -> Result<f64, ToolError> {
            match self.peek() {
                Some('(') => {
                    self.bump();
                    let value = self.expression()?;
                    if self.bump() != Some(')') {
                        return Err(ToolError::BadInput("unbalanced parentheses".to_string()));
                    }
                    Ok(value)
                }
                Some(c) if c.is_ascii_digit() || c == '.' => {
                    let mut number = String::new();
                    while let Some(c) = self.peek() {
                        if c.is_ascii_digit() || c == '.' {
                            number.push(c);
                            self.bump();
                        } else {
                            break;
                        }
                    }
                    number
                        .parse()
                        .map_err(|_| ToolError::BadInput(format!("bad number '{}'", number)))
                }
                _ => Err(ToolError::BadInput("expected a number".to_string())),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── calculator ──

    #[test]
    fn calculator_simple_addition() {
        let result = calculator("calculate 5+3").unwrap();
        assert!(result.contains("8"), "result was: {result}");
    }

    #[test]
    fn calculator_precedence() {
        assert!(calculator("2+3*4").unwrap().ends_with("= 14"));
        assert!(calculator("(2+3)*4").unwrap().ends_with("= 20"));
    }

    #[test]
    fn calculator_power_and_unary_minus() {
        assert!(calculator("2^10").unwrap().ends_with("= 1024"));
        assert!(calculator("-3 + 5").unwrap().ends_with("= 2"));
    }

    #[test]
    fn calculator_division() {
        assert!(calculator("15/3").unwrap().ends_with("= 5"));
        assert!(calculator("7/2").unwrap().ends_with("= 3.5"));
    }

    #[test]
    fn calculator_division_by_zero() {
        let err = calculator("1/0").unwrap_err();
        assert!(matches!(err, ToolError::BadInput(_)));
    }

    #[test]
    fn calculator_no_expression() {
        let err = calculator("what is the meaning of life").unwrap_err();
        assert!(matches!(err, ToolError::BadInput(_)));
    }

    #[test]
    fn calculator_unbalanced_parens() {
        assert!(calculator("(2+3").is_err());
    }

    // ── random_number ──

    #[test]
    fn random_number_default_range() {
        for _ in 0..20 {
            let result = random_number("give me a random number").unwrap();
            assert!(result.starts_with("Random number between 1 and 100:"));
        }
    }

    #[test]
    fn random_number_explicit_range() {
        for _ in 0..20 {
            let result = random_number("random between 10 and 20").unwrap();
            let n: i64 = result.rsplit(' ').next().unwrap().parse().unwrap();
            assert!((10..=20).contains(&n));
        }
    }

    #[test]
    fn random_number_reversed_bounds() {
        let result = random_number("between 50 and 5").unwrap();
        assert!(result.contains("between 5 and 50"));
    }

    // ── datetime ──

    #[test]
    fn datetime_has_expected_shape() {
        let result = current_datetime("").unwrap();
        assert!(result.starts_with("Current date and time: "));
        // YYYY-MM-DD HH:MM:SS
        let stamp = result.trim_start_matches("Current date and time: ");
        assert_eq!(stamp.len(), 19);
    }

    // ── word_count / reverse ──

    #[test]
    fn word_count_counts_words_and_chars() {
        let result = word_count("The quick brown fox").unwrap();
        assert_eq!(result, "Text analysis - Words: 4, Characters: 19");
    }

    #[test]
    fn reverse_text_embeds_reversal() {
        let result = reverse_text("reverse this text: Hello").unwrap();
        assert!(result.contains("olleH"), "result was: {result}");
        assert_eq!(reverse_text("Hello").unwrap(), "Reversed text: olleH");
    }

    // ── registry ──

    #[test]
    fn registry_dispatches_by_name() {
        let registry = ToolRegistry::builtin();
        assert!(registry.contains("calculator"));
        let result = registry.dispatch("calculator", "2*3").unwrap();
        assert!(result.ends_with("= 6"));
    }

    #[test]
    fn registry_unknown_tool_is_distinct_error() {
        let registry = ToolRegistry::builtin();
        let err = registry.dispatch("teleport", "home").unwrap_err();
        assert_eq!(err, ToolError::UnknownTool("teleport".to_string()));
    }

    #[test]
    fn registry_names_are_sorted() {
        let registry = ToolRegistry::builtin();
        assert_eq!(
            registry.names(),
            vec![
                "calculator",
                "datetime",
                "random_number",
                "reverse_text",
                "word_count"
            ]
        );
    }
}
