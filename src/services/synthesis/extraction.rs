//! Payload Extraction
//!
//! Pulls the structured payload out of raw model text: a fenced code block
//! when present, then the first balanced top-level object (or array) found by
//! a string-aware bracket scan.

/// Top-level shape the caller expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadShape {
    Object,
    Array,
}

impl PayloadShape {
    pub fn opener(&self) -> char {
        match self {
            PayloadShape::Object => '{',
            PayloadShape::Array => '[',
        }
    }
}

/// Extract the payload candidate from raw model text.
///
/// Returns the trimmed input unchanged when no opener is found.
pub fn extract_payload(raw: &str, shape: PayloadShape) -> String {
    let trimmed = raw.trim();
    let candidate = fenced_block(trimmed).unwrap_or(trimmed);

    let Some(start) = candidate.find(shape.opener()) else {
        return candidate.to_string();
    };

    match find_matching_close(candidate, start) {
        Some(end) => candidate[start..=end].to_string(),
        // Unterminated: hand everything from the opener to the repair pass
        None => candidate[start..].trim_end().to_string(),
    }
}

/// Content of the first fenced code block, minus an optional language tag.
fn fenced_block(text: &str) -> Option<&str> {
    let start = text.find("```")?;
    let after_fence = &text[start + 3..];

    let content_start = match after_fence.find('\n') {
        Some(nl) if after_fence[..nl].trim().chars().all(|c| c.is_ascii_alphanumeric()) => nl + 1,
        _ => 0,
    };
    let content = &after_fence[content_start..];
    let end = content.find("```")?;
    Some(content[..end].trim())
}

/// Byte index of the bracket closing the one at `open_idx`.
///
/// Tracks double-quoted strings and backslash escapes so brackets inside
/// string values are ignored. Both bracket kinds count toward depth.
pub fn find_matching_close(text: &str, open_idx: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text[open_idx..].char_indices() {
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
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(open_idx + i);
                }
            }
            _ => {}
        }
    }
    None
}
