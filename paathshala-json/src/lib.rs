#![deny(missing_docs)]
//! Robust extraction of a single JSON object out of a raw model
//! completion (spec §4.6).
//!
//! Model completions wrap JSON in code fences, trail it with prose, or
//! emit near-miss JSON (bare keys, trailing commas). This crate runs a
//! fixed sequence of increasingly permissive passes and gives up with a
//! typed error only once all of them fail, mirroring the fence-stripping
//! and regex-retry chain the Python prototype's crisis handler used.

use regex::Regex;
use serde::de::DeserializeOwned;
use std::sync::LazyLock;
use thiserror::Error;

/// Failure to extract a JSON value from raw model output.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// No `{`-delimited candidate could be found in the text at all.
    #[error("no JSON object found in completion")]
    NoCandidate,

    /// A candidate was found but every parse pass on it failed.
    #[error("candidate did not parse as JSON: {0}")]
    Unparseable(String),

    /// The candidate parsed but didn't deserialize into the target shape.
    #[error("parsed JSON did not match expected shape: {0}")]
    ShapeMismatch(String),
}

static FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(?:json)?\s*(.*?)\s*```").unwrap());
static TRAILING_COMMA: LazyLock<Regex> = LazyLock::new(|| Regex::new(r",(\s*[}\]])").unwrap());
static BARE_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"([{,]\s*)([A-Za-z_][A-Za-z0-9_]*)(\s*:)"#).unwrap());

/// Extract and deserialize a `T` out of raw model output.
///
/// Runs, in order: fence stripping, a balanced-brace scan for the first
/// complete `{...}` span, a strict parse, a repair-and-retry parse
/// (quoting bare keys, dropping trailing commas), and a
/// truncate-to-last-balanced-depth retry. The first pass that both
/// parses and deserializes into `T` wins.
pub fn extract<T: DeserializeOwned>(raw: &str) -> Result<T, ExtractError> {
    let unfenced = strip_fences(raw);
    let start = unfenced.find('{').ok_or(ExtractError::NoCandidate)?;
    let rest = &unfenced[start..];
    // A complete, balanced object if the model closed its braces; otherwise
    // fall back to everything from the opening brace onward, for the
    // truncation pass below to work with.
    let candidate = balanced_object(rest).unwrap_or(rest);

    if let Some(value) = try_parse::<T>(candidate) {
        return value;
    }

    let repaired = repair(candidate);
    if let Some(value) = try_parse::<T>(&repaired) {
        return value;
    }

    if let Some(truncated) = truncate_to_balanced(candidate) {
        if let Some(value) = try_parse::<T>(&truncated) {
            return value;
        }
        let repaired_truncated = repair(&truncated);
        if let Some(value) = try_parse::<T>(&repaired_truncated) {
            return value;
        }
    }

    Err(ExtractError::Unparseable(candidate.to_string()))
}

/// Run one parse-then-deserialize attempt. Returns `None` if the text
/// isn't even valid JSON; `Some(Err(ShapeMismatch))` if it parses but
/// doesn't fit `T`.
fn try_parse<T: DeserializeOwned>(text: &str) -> Option<Result<T, ExtractError>> {
    let value: serde_json::Value = serde_json::from_str(text).ok()?;
    Some(
        serde_json::from_value(value)
            .map_err(|e| ExtractError::ShapeMismatch(e.to_string())),
    )
}

/// Step 1: if the text contains a fenced block, prefer its contents.
/// Otherwise return the text unchanged — completions aren't always
/// fenced.
fn strip_fences(raw: &str) -> String {
    match FENCE.captures(raw) {
        Some(caps) => caps.get(1).unwrap().as_str().to_string(),
        None => raw.to_string(),
    }
}

/// Step 2: given text starting at `{`, scan forward tracking brace depth
/// and string-literal context to find the matching `}`. Returns `None`
/// if the object is never closed (a truncated completion), leaving step
/// 5 to cope with that.
fn balanced_object(text: &str) -> Option<&str> {
    let bytes = text.as_bytes();
    let mut depth = 0i32;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &b) in bytes.iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[..offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Step 4: quote bare object keys and drop trailing commas before a
/// closing brace or bracket. Cheap syntactic fixups for the mistakes
/// models actually make, not a general JSON5 parser.
fn repair(candidate: &str) -> String {
    let quoted = BARE_KEY.replace_all(candidate, r#"$1"$2"$3"#);
    TRAILING_COMMA.replace_all(&quoted, "$1").into_owned()
}

/// Step 5: the model's output was cut short mid-object. Walk backward
/// from the end, and at each point where depth returns to zero
/// (treating unmatched opens as needing a synthetic close), emit a
/// best-effort closed object. Only used when straightforward parses
/// have already failed.
fn truncate_to_balanced(candidate: &str) -> Option<String> {
    let mut depth = 0i32;
    let mut in_string = false;
    let mut escaped = false;
    let mut last_safe_end = None;

    for (idx, ch) in candidate.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    last_safe_end = Some(idx + ch.len_utf8());
                }
            }
            ',' if depth == 1 => last_safe_end = Some(idx),
            _ => {}
        }
    }

    let end = last_safe_end?;
    let mut truncated = candidate[..end].to_string();
    if !truncated.trim_end().ends_with('}') {
        truncated.push('}');
    }
    Some(truncated)
}
