//! Extraction of structured data from model responses.
//!
//! Model responses are rarely pure JSON. They may wrap the payload in prose
//! or a markdown fence, and list-valued answers come either as a bare array
//! or as an object holding the array under a named field. [`extract_items`]
//! tries each shape in turn and reports which one matched.

use reelforge_error::{ParseError, ReelforgeResult};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error};

/// Which JSON layout a list response used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonShape {
    /// `[ ... ]`
    BareArray,
    /// `{ "<field>": [ ... ] }`
    Wrapped,
}

/// Items parsed from a list response, tagged with the layout they came in.
#[derive(Debug, Clone, PartialEq)]
pub struct Extracted<T> {
    /// Layout of the payload
    pub shape: JsonShape,
    /// Parsed items, in response order
    pub items: Vec<T>,
}

/// Parse a list of `T` from `response`.
///
/// Tried in order: the whole response as a bare array, then as an object
/// carrying the array under `field`; then the same two shapes against the
/// contents of a markdown code fence; then against the first balanced
/// `[...]` or `{...}` substring. The first success wins.
///
/// # Errors
///
/// Returns a [`ParseError`] with a bounded preview of `response` when no
/// attempt succeeds.
///
/// # Examples
///
/// ```
/// use reelforge_pipeline::{JsonShape, extract_items};
///
/// let bare: Vec<u32> = extract_items("[1, 2]", "numbers").unwrap().items;
/// let wrapped = extract_items::<u32>("Sure!\n{\"numbers\": [1, 2]}", "numbers").unwrap();
/// assert_eq!(bare, wrapped.items);
/// assert_eq!(wrapped.shape, JsonShape::Wrapped);
/// ```
pub fn extract_items<T: DeserializeOwned>(
    response: &str,
    field: &str,
) -> ReelforgeResult<Extracted<T>> {
    let trimmed = response.trim();

    let mut candidates = vec![trimmed.to_string()];
    if let Some(fenced) = extract_from_code_block(trimmed) {
        candidates.push(fenced);
    }
    candidates.extend(balanced_candidates(trimmed));

    for candidate in &candidates {
        if let Some(extracted) = parse_shapes(candidate, field) {
            debug!(
                shape = ?extracted.shape,
                count = extracted.items.len(),
                "Extracted items from model response"
            );
            return Ok(extracted);
        }
    }

    error!(
        response_length = response.len(),
        field, "No parsable item list in model response"
    );
    Err(ParseError::new(
        format!("expected a JSON array or an object with a \"{field}\" array"),
        response,
    )
    .into())
}

/// Parse a single JSON object of type `T` from `response`.
///
/// Accepts the raw response, a fenced block, or the first balanced `{...}`.
///
/// # Errors
///
/// Returns a [`ParseError`] with a preview when nothing parses.
pub fn extract_object<T: DeserializeOwned>(response: &str) -> ReelforgeResult<T> {
    let trimmed = response.trim();

    let mut candidates = vec![trimmed.to_string()];
    if let Some(fenced) = extract_from_code_block(trimmed) {
        candidates.push(fenced);
    }
    if let Some(object) = extract_balanced(trimmed, '{', '}') {
        candidates.push(object);
    }

    for candidate in &candidates {
        if let Ok(value) = serde_json::from_str::<T>(candidate) {
            return Ok(value);
        }
    }

    error!(response_length = response.len(), "No parsable object in model response");
    Err(ParseError::new("expected a JSON object", response).into())
}

fn parse_shapes<T: DeserializeOwned>(text: &str, field: &str) -> Option<Extracted<T>> {
    if let Ok(items) = serde_json::from_str::<Vec<T>>(text) {
        return Some(Extracted {
            shape: JsonShape::BareArray,
            items,
        });
    }

    let Ok(Value::Object(mut object)) = serde_json::from_str::<Value>(text) else {
        return None;
    };
    let array = object.remove(field)?;
    let items = serde_json::from_value::<Vec<T>>(array).ok()?;
    Some(Extracted {
        shape: JsonShape::Wrapped,
        items,
    })
}

/// Balanced substrings, the one that starts first tried first.
fn balanced_candidates(response: &str) -> Vec<String> {
    let mut found: Vec<(usize, String)> = [('[', ']'), ('{', '}')]
        .into_iter()
        .filter_map(|(open, close)| {
            let start = response.find(open)?;
            extract_balanced(response, open, close).map(|s| (start, s))
        })
        .collect();
    found.sort_by_key(|(start, _)| *start);
    found.into_iter().map(|(_, s)| s).collect()
}

/// Contents of the first markdown code fence.
///
/// An unterminated fence yields everything after the opening line, since
/// long responses are sometimes cut off before the closing fence.
fn extract_from_code_block(response: &str) -> Option<String> {
    let start = response.find("```")?;
    let after_ticks = start + 3;
    let content_start = response[after_ticks..]
        .find('\n')
        .map(|n| after_ticks + n + 1)
        .unwrap_or(after_ticks);

    let content = match response[content_start..].find("```") {
        Some(end) => &response[content_start..content_start + end],
        None => &response[content_start..],
    };
    Some(content.trim().to_string())
}

/// First substring opening with `open` whose delimiters balance.
///
/// Delimiters inside JSON strings are ignored.
fn extract_balanced(response: &str, open: char, close: char) -> Option<String> {
    let start = response.find(open)?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, ch) in response[start..].char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }

        match ch {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            c if c == open && !in_string => depth += 1,
            c if c == close && !in_string => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(response[start..start + i + ch.len_utf8()].to_string());
                }
            }
            _ => {}
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use reelforge_error::{PREVIEW_LIMIT, ReelforgeErrorKind};
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Item {
        name: String,
    }

    #[test]
    fn parses_bare_array() {
        let extracted = extract_items::<Item>(r#"[{"name": "a"}]"#, "items").unwrap();
        assert_eq!(extracted.shape, JsonShape::BareArray);
        assert_eq!(extracted.items[0].name, "a");
    }

    #[test]
    fn parses_wrapped_array_in_fence() {
        let response = "Here you go:\n```json\n{\"items\": [{\"name\": \"b\"}]}\n```\nEnjoy.";
        let extracted = extract_items::<Item>(response, "items").unwrap();
        assert_eq!(extracted.shape, JsonShape::Wrapped);
        assert_eq!(extracted.items, vec![Item { name: "b".into() }]);
    }

    #[test]
    fn finds_array_inside_prose() {
        let response = "I split it into shots [{\"name\": \"x]\"}] as requested.";
        let extracted = extract_items::<Item>(response, "items").unwrap();
        assert_eq!(extracted.items[0].name, "x]");
    }

    #[test]
    fn tolerates_unterminated_fence() {
        let response = "```json\n[{\"name\": \"c\"}]";
        let extracted = extract_items::<Item>(response, "items").unwrap();
        assert_eq!(extracted.items.len(), 1);
    }

    #[test]
    fn wrong_field_is_a_parse_error_with_preview() {
        let response = format!("{{\"other\": \"none\"}} {}", "z".repeat(2000));
        let err = extract_items::<Item>(&response, "items").unwrap_err();
        match err.kind() {
            ReelforgeErrorKind::Parse(e) => {
                assert_eq!(e.preview.chars().count(), PREVIEW_LIMIT);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn extracts_single_object() {
        #[derive(Debug, Deserialize)]
        struct Frame {
            prompt: String,
        }
        let frame: Frame = extract_object("Result:\n{\"prompt\": \"wide shot {dawn}\"}").unwrap();
        assert_eq!(frame.prompt, "wide shot {dawn}");
        assert!(extract_object::<Frame>("no json here").is_err());
    }
}
