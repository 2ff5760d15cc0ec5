//! Best-effort extraction of structured fields from free-text model output.
//!
//! Models are prompted to answer in line-prefixed formats like
//! `Content Type: question` or `SCORE: 8`, but they routinely add brackets,
//! change case, or ramble. Every parser here returns a declared default on
//! failure instead of erroring, so a pipeline always has a well-typed field
//! to continue with.

/// Strip `<think>...</think>` blocks emitted by reasoning models.
///
/// Handles both complete and incomplete think blocks:
/// - `<think>reasoning</think>content` -> `content`
/// - `<think>reasoning without closing` -> `` (strips to end)
pub fn strip_think_tags(text: &str) -> String {
    let mut result = text.to_string();
    while let Some(start) = result.find("<think>") {
        if let Some(end) = result[start..].find("</think>") {
            result = format!("{}{}", &result[..start], &result[start + end + 8..]);
        } else {
            result = result[..start].to_string();
            break;
        }
    }
    result
}

/// Value of the first line starting with `prefix` (case-insensitive).
///
/// The prefix is given without the colon: `line_value(text, "Content Type")`
/// matches `Content Type: question`. Surrounding brackets and asterisks —
/// common when a model echoes the `[type]` placeholder or bolds the value —
/// are trimmed off.
pub fn line_value(text: &str, prefix: &str) -> Option<String> {
    for line in text.lines() {
        let trimmed = line.trim().trim_start_matches(['-', '*', '#']).trim_start();
        let matches = trimmed
            .get(..prefix.len())
            .map(|head| head.eq_ignore_ascii_case(prefix))
            .unwrap_or(false);
        if !matches {
            continue;
        }
        let rest = trimmed[prefix.len()..]
            .trim_start()
            .trim_start_matches(':')
            .trim()
            .trim_matches(['[', ']', '*'])
            .trim();
        if !rest.is_empty() {
            return Some(rest.to_string());
        }
    }
    None
}

/// Classification field constrained to a fixed vocabulary.
///
/// The extracted value is lowercased and matched against the vocabulary;
/// a vocabulary entry also matches when the value merely starts with it
/// (`"question - needs an answer"` matches `"question"`). Anything else
/// falls back to `default`.
pub fn classification(text: &str, prefix: &str, vocabulary: &[&str], default: &str) -> String {
    let value = match line_value(text, prefix) {
        Some(v) => v.to_lowercase(),
        None => return default.to_string(),
    };
    for entry in vocabulary {
        let boundary_ok = value
            .as_bytes()
            .get(entry.len())
            .map(|b| !b.is_ascii_alphanumeric())
            .unwrap_or(true);
        if value.starts_with(entry) && boundary_ok {
            return (*entry).to_string();
        }
    }
    default.to_string()
}

/// Integer score from a prefixed line, clamped into `[min, max]`.
///
/// Out-of-range values clamp; non-numeric or missing lines yield `default`.
pub fn clamped_score(text: &str, prefix: &str, min: i64, max: i64, default: i64) -> i64 {
    line_value(text, prefix)
        .and_then(|v| first_int(&v))
        .map(|n| n.clamp(min, max))
        .unwrap_or(default)
}

/// Yes/no flag from a prefixed line, `default` when unparseable.
pub fn yes_no(text: &str, prefix: &str, default: bool) -> bool {
    match line_value(text, prefix) {
        Some(v) => {
            let v = v.to_lowercase();
            if v.starts_with("yes") || v.starts_with("true") {
                true
            } else if v.starts_with("no") || v.starts_with("false") {
                false
            } else {
                default
            }
        }
        None => default,
    }
}

/// First integer embedded in a string, e.g. `"8/10 overall"` -> 8.
pub fn first_int(text: &str) -> Option<i64> {
    let mut digits = String::new();
    for c in text.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
        } else if !digits.is_empty() {
            break;
        }
    }
    digits.parse().ok()
}

/// Items of a numbered or bulleted list, one per line.
///
/// Handles `1. step`, `2) step`, `- step`, `* step`, and `• step`;
/// numbering and surrounding quotes are stripped. Lines that are not list
/// items are ignored, so a model's chatter around the list is harmless.
/// An empty result is valid: a plan with zero steps is a legal plan.
pub fn numbered_items(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(|line| {
            let trimmed = line.trim();
            if let Some(rest) = trimmed
                .strip_prefix(|c: char| c.is_ascii_digit())
                .map(|s| s.trim_start_matches(|c: char| c.is_ascii_digit()))
                .and_then(|s| s.strip_prefix('.').or_else(|| s.strip_prefix(')')))
            {
                let item = rest.trim().trim_matches('"').trim();
                if !item.is_empty() {
                    return Some(item.to_string());
                }
            }
            for prefix in ["-", "*", "•"] {
                if let Some(rest) = trimmed.strip_prefix(prefix) {
                    let item = rest.trim().trim_matches('"').trim();
                    if !item.is_empty() {
                        return Some(item.to_string());
                    }
                }
            }
            None
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── think tags ──

    #[test]
    fn strip_think_tags_complete() {
        assert_eq!(strip_think_tags("<think>reasoning</think>result"), "result");
    }

    #[test]
    fn strip_think_tags_incomplete() {
        assert_eq!(strip_think_tags("<think>reasoning without close"), "");
    }

    #[test]
    fn strip_think_tags_multiple() {
        let input = "<think>first</think>middle<think>second</think>end";
        assert_eq!(strip_think_tags(input), "middleend");
    }

    // ── line_value ──

    #[test]
    fn line_value_basic() {
        let text = "Content Type: question\nSentiment: positive";
        assert_eq!(line_value(text, "Content Type"), Some("question".to_string()));
        assert_eq!(line_value(text, "Sentiment"), Some("positive".to_string()));
    }

    #[test]
    fn line_value_case_insensitive_and_bracketed() {
        let text = "CONTENT TYPE: [Question]";
        assert_eq!(line_value(text, "Content Type"), Some("Question".to_string()));
    }

    #[test]
    fn line_value_bulleted_line() {
        let text = "- Tone: humorous";
        assert_eq!(line_value(text, "Tone"), Some("humorous".to_string()));
    }

    #[test]
    fn line_value_missing() {
        assert_eq!(line_value("no structured output here", "Score"), None);
    }

    // ── classification ──

    const TYPES: &[&str] = &["question", "creative", "technical", "math"];

    #[test]
    fn classification_known_value() {
        let got = classification("Category: question", "Category", TYPES, "question");
        assert_eq!(got, "question");
    }

    #[test]
    fn classification_trailing_commentary() {
        let text = "Category: creative - the user wants a poem";
        assert_eq!(classification(text, "Category", TYPES, "question"), "creative");
    }

    #[test]
    fn classification_unknown_falls_back() {
        let text = "Category: philosophical";
        assert_eq!(classification(text, "Category", TYPES, "question"), "question");
    }

    #[test]
    fn classification_prefix_is_not_substring_match() {
        // "mathematical" starts with "math" but continues with a letter,
        // so the boundary check rejects it.
        let text = "Category: mathematical";
        assert_eq!(classification(text, "Category", TYPES, "question"), "question");
    }

    #[test]
    fn classification_missing_line_falls_back() {
        assert_eq!(classification("nothing", "Category", TYPES, "other"), "other");
    }

    // ── clamped_score ──

    #[test]
    fn score_in_range() {
        assert_eq!(clamped_score("SCORE: 6", "SCORE", 0, 10, 7), 6);
    }

    #[test]
    fn score_clamps_high_and_low() {
        assert_eq!(clamped_score("SCORE: 42", "SCORE", 0, 10, 7), 10);
        assert_eq!(clamped_score("SCORE: 0", "SCORE", 1, 10, 7), 1);
    }

    #[test]
    fn score_with_denominator() {
        assert_eq!(clamped_score("SCORE: 8/10", "SCORE", 0, 10, 7), 8);
    }

    #[test]
    fn score_non_numeric_uses_default() {
        assert_eq!(clamped_score("SCORE: excellent", "SCORE", 0, 10, 7), 7);
        assert_eq!(clamped_score("no score line", "SCORE", 0, 10, 7), 7);
    }

    // ── yes_no ──

    #[test]
    fn yes_no_variants() {
        assert!(yes_no("NEEDS_TOOL: yes", "NEEDS_TOOL", false));
        assert!(yes_no("NEEDS_TOOL: Yes, definitely", "NEEDS_TOOL", false));
        assert!(!yes_no("NEEDS_TOOL: no", "NEEDS_TOOL", true));
        assert!(!yes_no("NEEDS_TOOL: maybe", "NEEDS_TOOL", false));
        assert!(!yes_no("unrelated", "NEEDS_TOOL", false));
    }

    // ── numbered_items ──

    #[test]
    fn numbered_items_mixed_formats() {
        let text = "Here is the plan:\n1. Understand the question\n2) Gather facts\n- Verify\n";
        assert_eq!(
            numbered_items(text),
            vec!["Understand the question", "Gather facts", "Verify"]
        );
    }

    #[test]
    fn numbered_items_multi_digit() {
        let text = "9. ninth\n10. tenth\n11. eleventh";
        assert_eq!(numbered_items(text), vec!["ninth", "tenth", "eleventh"]);
    }

    #[test]
    fn numbered_items_empty_input() {
        assert!(numbered_items("no list here, just prose").is_empty());
        assert!(numbered_items("").is_empty());
    }

    // ── first_int ──

    #[test]
    fn first_int_embedded() {
        assert_eq!(first_int("confidence of 7 out of 10"), Some(7));
        assert_eq!(first_int("no digits"), None);
    }
}
