//! Locating and repairing JSON embedded in free-form model output.
//!
//! [`candidates`] finds fenced blocks and top-level brace/bracket spans;
//! [`repair`] applies the syntactic fixes models most often need: quote
//! normalization, comment and trailing-comma removal, Python literals, and
//! bracket balancing at the first imbalance.

/// Upper bound on the number of spans examined per response.
const MAX_CANDIDATES: usize = 16;

/// A region of text that may hold a JSON value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate<'a> {
    pub text: &'a str,
    /// Byte offset of the region in the source text
    pub start: usize,
    /// `false` when the span ran to the end of the text without closing
    pub closed: bool,
}

/// Fenced blocks first (in order), then top-level `{...}` / `[...]` spans.
pub fn candidates(text: &str) -> Vec<Candidate<'_>> {
    let mut found = fenced_blocks(text);
    for span in spans(text) {
        if found.len() >= MAX_CANDIDATES {
            break;
        }
        if !found.iter().any(|c| c.text.trim() == span.text.trim()) {
            found.push(span);
        }
    }
    found
}

/// Contents of ```` ``` ```` fenced blocks, with any language tag ignored.
fn fenced_blocks(text: &str) -> Vec<Candidate<'_>> {
    let mut blocks = Vec::new();
    let mut offset = 0;
    let mut open_at: Option<usize> = None;

    for line in text.split_inclusive('\n') {
        let trimmed = line.trim();
        match open_at {
            None if trimmed.starts_with("```") => open_at = Some(offset + line.len()),
            Some(start) if trimmed == "```" => {
                let body = &text[start..offset];
                if !body.trim().is_empty() {
                    blocks.push(Candidate {
                        text: body,
                        start,
                        closed: true,
                    });
                }
                open_at = None;
            }
            _ => {}
        }
        offset += line.len();
    }

    if let Some(start) = open_at
        && start < text.len()
        && !text[start..].trim().is_empty()
    {
        blocks.push(Candidate {
            text: &text[start..],
            start,
            closed: false,
        });
    }
    blocks
}

/// Top-level bracketed spans, string-aware. An unterminated span runs to
/// the end of the text.
fn spans(text: &str) -> Vec<Candidate<'_>> {
    let mut result = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if depth == 0 {
            if c == '{' || c == '[' {
                depth = 1;
                start = i;
                in_string = false;
                escaped = false;
            }
            continue;
        }

        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            '{' | '[' => depth += 1,
            '}' | ']' => {
                depth -= 1;
                if depth == 0 {
                    result.push(Candidate {
                        text: &text[start..i + c.len_utf8()],
                        start,
                        closed: true,
                    });
                    if result.len() >= MAX_CANDIDATES {
                        return result;
                    }
                }
            }
            _ => {}
        }
    }

    if depth > 0 {
        result.push(Candidate {
            text: &text[start..],
            start,
            closed: false,
        });
    }
    result
}

/// Apply every repair pass in order.
pub fn repair(text: &str) -> String {
    let normalized = normalize(text.trim());
    let without_commas = strip_trailing_commas(&normalized);
    let balanced = balance(&without_commas);
    strip_trailing_commas(&balanced)
}

/// Smart quotes, single-quoted strings, comments and Python literals.
fn normalize(text: &str) -> String {
    let text: String = text
        .chars()
        .map(|c| match c {
            '\u{201C}' | '\u{201D}' => '"',
            '\u{2018}' | '\u{2019}' => '\'',
            other => other,
        })
        .collect();

    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '"' => {
                out.push('"');
                i += 1;
                while i < chars.len() {
                    let d = chars[i];
                    out.push(d);
                    i += 1;
                    if d == '\\' && i < chars.len() {
                        out.push(chars[i]);
                        i += 1;
                    } else if d == '"' {
                        break;
                    }
                }
            }
            '\'' => {
                out.push('"');
                i += 1;
                while i < chars.len() {
                    let d = chars[i];
                    i += 1;
                    match d {
                        '\\' if i < chars.len() && chars[i] == '\'' => {
                            out.push('\'');
                            i += 1;
                        }
                        '"' => out.push_str("\\\""),
                        '\'' => {
                            out.push('"');
                            break;
                        }
                        other => out.push(other),
                    }
                }
            }
            '/' if chars.get(i + 1) == Some(&'/') => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
            }
            '/' if chars.get(i + 1) == Some(&'*') => {
                i += 2;
                while i < chars.len() && !(chars[i] == '*' && chars.get(i + 1) == Some(&'/')) {
                    i += 1;
                }
                i = (i + 2).min(chars.len());
            }
            c if c.is_ascii_alphabetic() => {
                let begin = i;
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                let word: String = chars[begin..i].iter().collect();
                out.push_str(match word.as_str() {
                    "True" => "true",
                    "False" => "false",
                    "None" => "null",
                    _ => &word,
                });
            }
            other => {
                out.push(other);
                i += 1;
            }
        }
    }
    out
}

/// Drop commas directly followed (modulo whitespace) by a closer or the end.
fn strip_trailing_commas(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;

    for (i, &c) in chars.iter().enumerate() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        if c == '"' {
            in_string = true;
        }
        if c == ',' {
            let next = chars[i + 1..].iter().find(|n| !n.is_whitespace());
            if matches!(next, None | Some('}') | Some(']')) {
                continue;
            }
        }
        out.push(c);
    }
    out
}

/// Insert missing closers at the first imbalance, fix mismatched closers,
/// drop stray ones, and close whatever is still open at the end.
fn balance(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    let mut stack: Vec<char> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for c in text.chars() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            '{' => {
                stack.push('}');
                out.push(c);
            }
            '[' => {
                stack.push(']');
                out.push(c);
            }
            '}' | ']' => {
                if stack.contains(&c) {
                    while let Some(expected) = stack.pop() {
                        out.push(expected);
                        if expected == c {
                            break;
                        }
                    }
                } else if let Some(expected) = stack.pop() {
                    // wrong closer kind: substitute the one the open bracket needs
                    out.push(expected);
                }
            }
            other => out.push(other),
        }
    }

    if in_string {
        if escaped {
            out.pop();
        }
        out.push('"');
    }
    let trimmed_len = out.trim_end().len();
    out.truncate(trimmed_len);
    if out.ends_with(':') {
        out.push_str(" null");
    }
    while let Some(closer) = stack.pop() {
        out.push(closer);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn parse(text: &str) -> Value {
        serde_json::from_str(&repair(text)).unwrap()
    }

    #[test]
    fn test_candidates_prefer_fences() {
        let text = "Thought: ok {\"a\": 1}\n```json\n{\"b\": 2}\n```\n";
        let found = candidates(text);
        assert_eq!(found[0].text.trim(), "{\"b\": 2}");
        assert_eq!(found[1].text, "{\"a\": 1}");
    }

    #[test]
    fn test_spans_ignore_braces_in_strings() {
        let text = r#"prefix {"msg": "a } b", "n": [1, {"x": 2}]} suffix"#;
        let found = spans(text);
        assert_eq!(found.len(), 1);
        assert!(found[0].closed);
        assert_eq!(found[0].text, r#"{"msg": "a } b", "n": [1, {"x": 2}]}"#);
    }

    #[test]
    fn test_unclosed_span_runs_to_end() {
        let text = "go {\"kind\": \"Continue\", \"args\": {";
        let found = spans(text);
        assert_eq!(found.len(), 1);
        assert!(!found[0].closed);
        assert_eq!(found[0].start, 3);
    }

    #[test]
    fn test_unclosed_fence_is_candidate() {
        let found = fenced_blocks("```json\n{\"a\": 1\n");
        assert_eq!(found.len(), 1);
        assert!(!found[0].closed);
    }

    #[test]
    fn test_repair_trailing_commas() {
        assert_eq!(parse(r#"{"a": [1, 2,], "b": 3,}"#), json!({"a": [1, 2], "b": 3}));
    }

    #[test]
    fn test_repair_single_and_smart_quotes() {
        assert_eq!(parse("{'tool': 'scan_all'}"), json!({"tool": "scan_all"}));
        assert_eq!(
            parse("{\u{201C}tool\u{201D}: \u{201C}ping\u{201D}}"),
            json!({"tool": "ping"})
        );
        assert_eq!(parse(r#"{'say': 'he said "hi"'}"#), json!({"say": "he said \"hi\""}));
    }

    #[test]
    fn test_repair_comments_and_python_literals() {
        let text = "{\n  \"wide\": True, // utf-16\n  \"id\": None /* later */\n}";
        assert_eq!(parse(text), json!({"wide": true, "id": null}));
    }

    #[test]
    fn test_repair_inserts_closer_at_first_imbalance() {
        assert_eq!(parse(r#"{"a": [1, 2}"#), json!({"a": [1, 2]}));
        assert_eq!(parse(r#"{"a": {"b": 1], "c": 2}"#), json!({"a": {"b": 1}, "c": 2}));
    }

    #[test]
    fn test_repair_closes_truncated_output() {
        assert_eq!(
            parse(r#"{"kind": "Continue", "args": {"value": "100"#),
            json!({"kind": "Continue", "args": {"value": "100"}})
        );
        assert_eq!(parse(r#"{"a": 1, "b":"#), json!({"a": 1, "b": null}));
        assert_eq!(parse(r#"{"a": [1, 2,"#), json!({"a": [1, 2]}));
    }

    #[test]
    fn test_repair_drops_stray_closer() {
        assert_eq!(parse(r#"{"a": 1}}"#), json!({"a": 1}));
    }

    #[test]
    fn test_repair_keeps_apostrophes_inside_double_quotes() {
        assert_eq!(parse(r#"{"reason": "can't attach",}"#), json!({"reason": "can't attach"}));
    }
}
