//! Tolerant decoding for the JSON-ish data islands found in product pages.
//!
//! Product pages embed data that is close to JSON but not conformant:
//! JavaScript object literals with single-quoted strings, unquoted keys and
//! trailing commas, or JSON-LD blocks carrying one stray closing brace. The
//! helpers here rewrite those into strict JSON and hand the result to
//! `serde_json`.

use serde_json::Value;

use crate::utils::error::{AppError, Result};

/// Decode a JavaScript-style literal into a JSON value.
///
/// Accepts single-quoted strings, unquoted object keys, trailing commas,
/// `//` and `/* */` comments. Bare identifiers other than `true`, `false`
/// and `null` in value position (`undefined`, `NaN`) decode as `null`.
pub fn parse_relaxed(text: &str) -> Result<Value> {
    let normalized = normalize(text)?;
    serde_json::from_str(&normalized).map_err(AppError::from)
}

/// Decode a JSON-LD block that may carry one extra trailing `}`.
///
/// Lines are trimmed and joined, then one trailing brace is dropped before
/// decoding. If the block turns out to be well formed, the untouched text is
/// decoded instead.
pub fn parse_json_ld(raw: &str) -> Result<Value> {
    let joined = raw
        .lines()
        .map(str::trim)
        .collect::<Vec<_>>()
        .join(" ");
    let trimmed = joined.trim_end();

    if let Some(stripped) = trimmed.strip_suffix('}') {
        if let Ok(value) = parse_relaxed(stripped) {
            return Ok(value);
        }
    }

    parse_relaxed(trimmed)
}

/// Return the bracket-balanced array that follows `marker` in `content`.
///
/// Scanning stops at the `]` that brings the depth back to zero, so nested
/// arrays inside the elements are kept intact. Brackets inside string
/// literals are ignored.
pub fn extract_balanced_array<'a>(content: &'a str, marker: &str) -> Option<&'a str> {
    let marker_pos = content.find(marker)?;
    let start = marker_pos + content[marker_pos..].find('[')?;

    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (offset, ch) in content[start..].char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == q {
                quote = None;
            }
            continue;
        }

        match ch {
            '"' | '\'' => quote = Some(ch),
            '[' => depth += 1,
            ']' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(&content[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }

    None
}

fn normalize(text: &str) -> Result<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];
        match ch {
            '"' | '\'' => {
                i = copy_string(&chars, i, &mut out)?;
            }
            '/' if chars.get(i + 1) == Some(&'/') => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
            }
            '/' if chars.get(i + 1) == Some(&'*') => {
                i += 2;
                while i + 1 < chars.len() && !(chars[i] == '*' && chars[i + 1] == '/') {
                    i += 1;
                }
                i += 2;
            }
            ',' => {
                let next = skip_whitespace(&chars, i + 1);
                if !matches!(chars.get(next), Some(']') | Some('}')) {
                    out.push(',');
                }
                i += 1;
            }
            c if c.is_ascii_digit() || c == '-' => {
                while i < chars.len()
                    && (chars[i].is_ascii_digit() || matches!(chars[i], '-' | '+' | '.' | 'e' | 'E'))
                {
                    out.push(chars[i]);
                    i += 1;
                }
            }
            c if c.is_alphabetic() || c == '_' || c == '$' => {
                let start = i;
                while i < chars.len()
                    && (chars[i].is_alphanumeric() || chars[i] == '_' || chars[i] == '$')
                {
                    i += 1;
                }
                let ident: String = chars[start..i].iter().collect();
                let next = skip_whitespace(&chars, i);
                if chars.get(next) == Some(&':') {
                    out.push('"');
                    out.push_str(&ident);
                    out.push('"');
                } else {
                    match ident.as_str() {
                        "true" | "false" | "null" => out.push_str(&ident),
                        _ => out.push_str("null"),
                    }
                }
            }
            _ => {
                out.push(ch);
                i += 1;
            }
        }
    }

    Ok(out)
}

/// Copy a quoted string starting at `start` into `out` as a double-quoted
/// JSON string. Returns the index just past the closing quote.
fn copy_string(chars: &[char], start: usize, out: &mut String) -> Result<usize> {
    let quote = chars[start];
    let mut i = start + 1;
    out.push('"');

    while i < chars.len() {
        let ch = chars[i];
        if ch == '\\' {
            match chars.get(i + 1) {
                Some('\'') => out.push('\''),
                Some(next) => {
                    out.push('\\');
                    out.push(*next);
                }
                None => return Err(AppError::parse("unterminated escape in string literal")),
            }
            i += 2;
            continue;
        }
        if ch == quote {
            out.push('"');
            return Ok(i + 1);
        }
        match ch {
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(ch),
        }
        i += 1;
    }

    Err(AppError::parse("unterminated string literal"))
}

fn skip_whitespace(chars: &[char], mut i: usize) -> usize {
    while i < chars.len() && chars[i].is_whitespace() {
        i += 1;
    }
    i
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_strict_json_passes_through() {
        let value = parse_relaxed(r#"{"a": [1, 2.5, "x"], "b": null}"#).unwrap();
        assert_eq!(value, json!({"a": [1, 2.5, "x"], "b": null}));
    }

    #[test]
    fn test_single_quotes_and_unquoted_keys() {
        let value = parse_relaxed(r#"{hiRes: 'https://m.media/a.jpg', 'variant': 'MAIN'}"#).unwrap();
        assert_eq!(value["hiRes"], "https://m.media/a.jpg");
        assert_eq!(value["variant"], "MAIN");
    }

    #[test]
    fn test_trailing_commas_removed() {
        let value = parse_relaxed("[{\"a\": 1,}, {\"a\": 2},\n]").unwrap();
        assert_eq!(value, json!([{"a": 1}, {"a": 2}]));
    }

    #[test]
    fn test_embedded_quotes_are_escaped() {
        let value = parse_relaxed(r#"{'title': 'He said "hi"', 'it\'s': true}"#).unwrap();
        assert_eq!(value["title"], "He said \"hi\"");
        assert_eq!(value["it's"], true);
    }

    #[test]
    fn test_bare_identifiers_become_null() {
        let value = parse_relaxed("{main: undefined, large: NaN}").unwrap();
        assert_eq!(value, json!({"main": null, "large": null}));
    }

    #[test]
    fn test_comments_are_skipped() {
        let value = parse_relaxed("{ // first\n a: 1, /* second */ b: 2 }").unwrap();
        assert_eq!(value, json!({"a": 1, "b": 2}));
    }

    #[test]
    fn test_unterminated_string_is_error() {
        assert!(parse_relaxed("{'a': 'oops}").is_err());
    }

    #[test]
    fn test_json_ld_with_stray_brace() {
        let raw = "{\n  \"@type\": \"Product\",\n  \"name\": \"Milo\"\n}\n}\n";
        let value = parse_json_ld(raw).unwrap();
        assert_eq!(value["name"], "Milo");
    }

    #[test]
    fn test_json_ld_without_stray_brace() {
        let raw = "{\"@type\": \"Product\", \"name\": \"Milo\"}";
        let value = parse_json_ld(raw).unwrap();
        assert_eq!(value["@type"], "Product");
    }

    #[test]
    fn test_json_ld_garbage_is_error() {
        assert!(parse_json_ld("not json at all").is_err());
    }

    #[test]
    fn test_balanced_array_keeps_nested_arrays() {
        let script = "var data = {'colorImages': { 'initial': [{'hiRes':'a.jpg','main':{'x':[1,2]}},{'large':'b.jpg'}]}, 'other': [9]};";
        let array = extract_balanced_array(script, "'colorImages': { 'initial': ").unwrap();
        assert_eq!(
            array,
            "[{'hiRes':'a.jpg','main':{'x':[1,2]}},{'large':'b.jpg'}]"
        );
        let value = parse_relaxed(array).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_balanced_array_ignores_brackets_in_strings() {
        let script = "key: ['a]b', ['c']] tail";
        assert_eq!(extract_balanced_array(script, "key:"), Some("['a]b', ['c']]"));
    }

    #[test]
    fn test_balanced_array_missing_marker_or_unbalanced() {
        assert_eq!(extract_balanced_array("nothing here", "key:"), None);
        assert_eq!(extract_balanced_array("key: [1, [2, 3]", "key:"), None);
    }
}
