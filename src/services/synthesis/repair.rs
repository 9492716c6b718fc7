//! Payload Repair
//!
//! A fixed, ordered sequence of conservative syntax rewrites applied to an
//! extracted payload before strict parsing. Each rule is a pure `&str ->
//! String` transformation; none of them touch text inside double-quoted
//! strings.

use serde_json::Value;
use thiserror::Error;

use super::extraction::{extract_payload, find_matching_close, PayloadShape};

/// Maximum characters of offending text carried in errors and logs.
pub const PREVIEW_CHARS: usize = 200;

/// Strict parse failed even after repair.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct MalformedPayload {
    pub message: String,
    pub preview: String,
}

/// Truncated, single-line preview of model text.
pub fn preview(text: &str) -> String {
    let flat: String = text
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .take(PREVIEW_CHARS)
        .collect();
    if text.chars().count() > PREVIEW_CHARS {
        format!("{}...", flat)
    } else {
        flat
    }
}

/// Run every repair rule in order.
pub fn repair(text: &str, shape: PayloadShape) -> String {
    let text = normalize_smart_quotes(text);
    let text = convert_single_quotes(&text);
    let text = quote_bare_keys(&text);
    let text = strip_trailing_commas(&text);
    let text = convert_backticks(&text);
    let text = truncate_trailing_garbage(&text, shape);
    auto_balance(&text)
}

/// Extract, repair and strictly parse a model payload.
pub fn parse_payload(raw: &str, shape: PayloadShape) -> Result<Value, MalformedPayload> {
    let extracted = extract_payload(raw, shape);
    let repaired = repair(&extracted, shape);
    serde_json::from_str(&repaired).map_err(|e| MalformedPayload {
        message: format!("Failed to parse repaired payload: {}", e),
        preview: preview(raw),
    })
}

// ============================================================================
// Rules
// ============================================================================

fn is_smart_double(c: char) -> bool {
    matches!(
        c,
        '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{201F}' | '\u{00AB}' | '\u{00BB}'
    )
}

fn is_smart_single(c: char) -> bool {
    matches!(c, '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}')
}

/// Replace typographic quotes used as JSON delimiters with straight ones.
///
/// Curly quotes inside a straight-quoted string are content and stay as-is.
/// A string opened by a curly double quote is closed by the next curly or
/// straight double quote.
pub fn normalize_smart_quotes(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    // Some(true) when the open string began with a curly quote
    let mut open: Option<bool> = None;
    let mut escaped = false;

    for c in text.chars() {
        match open {
            Some(smart) => {
                if escaped {
                    escaped = false;
                    out.push(c);
                } else if c == '\\' {
                    escaped = true;
                    out.push(c);
                } else if c == '"' || (smart && is_smart_double(c)) {
                    open = None;
                    out.push('"');
                } else {
                    out.push(c);
                }
            }
            None if c == '"' => {
                open = Some(false);
                out.push(c);
            }
            None if is_smart_double(c) => {
                open = Some(true);
                out.push('"');
            }
            None if is_smart_single(c) => out.push('\''),
            None => out.push(c),
        }
    }
    out
}

/// Rewrite `'key'` and `'value'` to double-quoted strings.
///
/// A single quote only opens a string where a JSON token may start (after
/// `{`, `[`, `,` or `:`) so apostrophes in prose are left alone. The closing
/// quote must be followed by a structural character.
pub fn convert_single_quotes(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            i += 1;
            continue;
        }

        if c == '"' {
            in_string = true;
            out.push(c);
            i += 1;
            continue;
        }

        if c == '\'' && at_token_start(&out) {
            if let Some(close) = find_single_quote_close(&chars, i + 1) {
                out.push('"');
                let mut j = i + 1;
                while j < close {
                    match chars[j] {
                        '\\' if chars.get(j + 1) == Some(&'\'') => {
                            out.push('\'');
                            j += 2;
                            continue;
                        }
                        '"' => out.push_str("\\\""),
                        other => out.push(other),
                    }
                    j += 1;
                }
                out.push('"');
                i = close + 1;
                continue;
            }
        }

        out.push(c);
        i += 1;
    }
    out
}

fn at_token_start(out: &str) -> bool {
    match out.trim_end().chars().last() {
        None => true,
        Some(c) => matches!(c, '{' | '[' | ',' | ':'),
    }
}

fn find_single_quote_close(chars: &[char], from: usize) -> Option<usize> {
    let mut j = from;
    while j < chars.len() {
        match chars[j] {
            '\\' => j += 2,
            '\'' => {
                let next = chars[j + 1..].iter().find(|c| !c.is_whitespace());
                if matches!(next, None | Some(':' | ',' | '}' | ']')) {
                    return Some(j);
                }
                j += 1;
            }
            '\n' => return None,
            _ => j += 1,
        }
    }
    None
}

/// Quote unquoted identifier keys: `{score: 1}` becomes `{"score": 1}`.
pub fn quote_bare_keys(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len() + 8);
    let mut in_string = false;
    let mut escaped = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            i += 1;
            continue;
        }

        if c == '"' {
            in_string = true;
        } else if (c.is_ascii_alphabetic() || c == '_')
            && matches!(out.trim_end().chars().last(), Some('{' | ','))
        {
            let mut end = i;
            while end < chars.len() && (chars[end].is_ascii_alphanumeric() || chars[end] == '_') {
                end += 1;
            }
            let next = chars[end..].iter().find(|c| !c.is_whitespace());
            if next == Some(&':') {
                out.push('"');
                out.extend(&chars[i..end]);
                out.push('"');
                i = end;
                continue;
            }
        }
        out.push(c);
        i += 1;
    }
    out
}

/// Drop commas that directly precede `}` or `]`.
pub fn strip_trailing_commas(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;

    for (i, &c) in chars.iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
        } else if c == '"' {
            in_string = true;
        } else if c == ',' {
            let next = chars[i + 1..].iter().find(|c| !c.is_whitespace());
            if matches!(next, Some('}' | ']')) {
                continue;
            }
        }
        out.push(c);
    }
    out
}

/// Rewrite `` `value` `` to `"value"`.
pub fn convert_backticks(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut in_backtick = false;
    let mut escaped = false;

    for c in text.chars() {
        if in_backtick {
            match c {
                '`' => {
                    out.push('"');
                    in_backtick = false;
                }
                '"' => out.push_str("\\\""),
                other => out.push(other),
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
            out.push(c);
            continue;
        }
        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            '`' => {
                in_backtick = true;
                out.push('"');
            }
            other => out.push(other),
        }
    }
    out
}

/// Cut anything after the close of the top-level container.
pub fn truncate_trailing_garbage(text: &str, shape: PayloadShape) -> String {
    let Some(start) = text.find(shape.opener()) else {
        return text.to_string();
    };
    match find_matching_close(text, start) {
        Some(end) => text[..=end].to_string(),
        None => text.to_string(),
    }
}

/// Close a dangling string and any unclosed brackets, innermost first.
pub fn auto_balance(text: &str) -> String {
    let mut stack: Vec<char> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for c in text.chars() {
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
            '{' => stack.push('}'),
            '[' => stack.push(']'),
            '}' | ']' => {
                if stack.last() == Some(&c) {
                    stack.pop();
                }
            }
            _ => {}
        }
    }

    if !in_string && stack.is_empty() {
        return text.to_string();
    }

    let mut out = text.to_string();
    if in_string {
        if escaped {
            out.pop();
        }
        out.push('"');
    }
    if !stack.is_empty() {
        let kept = out.trim_end().trim_end_matches(',').len();
        out.truncate(kept);
        while let Some(closer) = stack.pop() {
            out.push(closer);
        }
    }
    out
}
