//! Placeholder substitution.
//!
//! Templates reference variables as `${key}`. Keys are free-form; any key
//! absent from the mapping is left in place untouched. Substitution runs as
//! a bounded fixed-point iteration so that variable values may themselves
//! contain placeholders, while cyclic references still terminate.

use std::collections::BTreeMap;

use serde_json::Value;
use thiserror::Error;
use tracing::warn;

/// Upper bound on expansion passes for variables and for content
pub const MAX_PASSES: usize = 10;

/// Largest expanded variable value, and the growth allowed over the raw
/// content length when substituting into content
pub const MAX_EXPANDED_LEN: usize = 4 * 1024 * 1024;

/// Expansion that outgrew its size budget.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("Variable {key:?} expands beyond {limit} bytes")]
    VariableTooLarge { key: String, limit: usize },

    #[error("Rendered content exceeds {limit} bytes")]
    ContentTooLarge { limit: usize },
}

/// Caller-supplied variables, any JSON value per key.
pub type Variables = BTreeMap<String, Value>;

/// Text form of one variable value: `null` is empty, strings are verbatim,
/// everything else uses its JSON text.
pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Coerce every variable value to text.
pub fn coerce_variables(variables: &Variables) -> BTreeMap<String, String> {
    variables
        .iter()
        .map(|(key, value)| (key.clone(), value_to_text(value)))
        .collect()
}

/// Single substitution pass over `text`.
///
/// An unknown `${key}` is copied through and scanning resumes right after
/// its `${`, so a placeholder nested inside it can still resolve.
pub fn substitute(text: &str, variables: &BTreeMap<String, String>) -> String {
    substitute_within(text, variables, usize::MAX).unwrap_or_default()
}

/// Like [`substitute`], but gives up with `None` as soon as the output
/// grows past `limit` bytes.
fn substitute_within(
    text: &str,
    variables: &BTreeMap<String, String>,
    limit: usize,
) -> Option<String> {
    let mut out = String::with_capacity(text.len().min(limit));
    let mut rest = text;

    while let Some(start) = rest.find("${") {
        if out.len() > limit {
            return None;
        }
        out.push_str(&rest[..start]);
        let after_open = &rest[start + 2..];

        match after_open.find('}') {
            Some(end) => match variables.get(&after_open[..end]) {
                Some(value) => {
                    out.push_str(value);
                    rest = &after_open[end + 1..];
                }
                None => {
                    out.push_str("${");
                    rest = after_open;
                }
            },
            None => {
                out.push_str("${");
                rest = after_open;
            }
        }
    }

    out.push_str(rest);
    if out.len() > limit {
        return None;
    }
    Some(out)
}

/// Resolve placeholders inside variable values.
///
/// Each pass reads from a snapshot of the previous pass, so the result does
/// not depend on key order. A value growing past [`MAX_EXPANDED_LEN`]
/// aborts the expansion.
pub fn expand_variables(
    mut variables: BTreeMap<String, String>,
) -> Result<BTreeMap<String, String>, RenderError> {
    for _ in 0..MAX_PASSES {
        let snapshot = variables.clone();
        let mut changed = false;

        for (key, value) in variables.iter_mut() {
            let Some(expanded) = substitute_within(value, &snapshot, MAX_EXPANDED_LEN) else {
                return Err(RenderError::VariableTooLarge {
                    key: key.clone(),
                    limit: MAX_EXPANDED_LEN,
                });
            };
            if expanded != *value {
                *value = expanded;
                changed = true;
            }
        }

        if !changed {
            break;
        }
    }
    Ok(variables)
}

/// Substitute into `content` until nothing changes or the pass limit is hit.
///
/// Fails once the text grows more than [`MAX_EXPANDED_LEN`] bytes past the
/// raw content.
pub fn render_content(
    content: &str,
    variables: &BTreeMap<String, String>,
) -> Result<String, RenderError> {
    let limit = content.len().saturating_add(MAX_EXPANDED_LEN);
    let mut current = content.to_string();
    for _ in 0..MAX_PASSES {
        let next = substitute_within(&current, variables, limit)
            .ok_or(RenderError::ContentTooLarge { limit })?;
        if next == current {
            break;
        }
        current = next;
    }
    Ok(current)
}

/// Expansion and substitution without the fallback.
pub fn try_render(content: &str, variables: &Variables) -> Result<String, RenderError> {
    let expanded = expand_variables(coerce_variables(variables))?;
    render_content(content, &expanded)
}

/// Full rendering: coerce, expand variables, then substitute into content.
///
/// Returns `content` unchanged when expansion outgrows its size budget.
pub fn render(content: &str, variables: &Variables) -> String {
    match try_render(content, variables) {
        Ok(rendered) => rendered,
        Err(e) => {
            warn!("Rendering failed, keeping raw content: {}", e);
            content.to_string()
        }
    }
}

/// Distinct placeholder keys in order of first appearance.
pub fn placeholders(content: &str) -> Vec<String> {
    let mut keys: Vec<String> = Vec::new();
    let mut rest = content;

    while let Some(start) = rest.find("${") {
        let after_open = &rest[start + 2..];
        let Some(end) = after_open.find('}') else {
            break;
        };

        let key = &after_open[..end];
        // A `${` inside the candidate means the real placeholder starts later
        if let Some(inner) = key.rfind("${") {
            rest = &after_open[inner..];
            continue;
        }
        if !key.is_empty() && !keys.iter().any(|k| k == key) {
            keys.push(key.to_string());
        }
        rest = &after_open[end + 1..];
    }
    keys
}
