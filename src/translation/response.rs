/*!
 * Parsing of model responses.
 *
 * Responses are expected as raw JSON but models often wrap them in markdown
 * fences or answer with plain text. A response that starts like JSON but
 * does not parse is treated as truncated and rejected; nothing from it is
 * ever applied.
 */

use log::debug;
use serde::Deserialize;
use serde_json::Value;

use crate::errors::ProviderError;

#[derive(Debug, Deserialize)]
struct SegmentResponse {
    translation: String,
}

#[derive(Debug, Deserialize)]
struct ChunkResponse {
    chunks: Vec<String>,
}

/// Remove a surrounding markdown code fence, if any
pub fn strip_code_fence(response: &str) -> &str {
    let trimmed = response.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Skip the language tag on the opening line
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// Whether the text starts like a JSON document rather than plain text
///
/// A leading `{1}` is a token, not an object.
fn looks_like_json(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some('{') => matches!(chars.find(|c| !c.is_whitespace()), Some('"') | Some('}') | None),
        Some('[') | Some('"') => true,
        _ => false,
    }
}

fn parse_json(text: &str) -> Result<Option<Value>, ProviderError> {
    match serde_json::from_str::<Value>(text) {
        Ok(value) => Ok(Some(value)),
        Err(e) if looks_like_json(text) => {
            debug!("Unparsable JSON response: {}", e);
            Err(ProviderError::ParseError(format!(
                "Incomplete or invalid JSON response: {}",
                e
            )))
        }
        Err(_) => Ok(None),
    }
}

/// Extract the translated text of a whole-segment response
///
/// Accepts `{"translation": ".."}`, a bare JSON string, or plain text.
pub fn parse_segment_response(response: &str) -> Result<String, ProviderError> {
    let body = strip_code_fence(response);
    if body.is_empty() {
        return Err(ProviderError::ParseError("Empty response".to_string()));
    }

    match parse_json(body)? {
        Some(Value::String(text)) => Ok(text),
        Some(value @ Value::Object(_)) => serde_json::from_value::<SegmentResponse>(value)
            .map(|r| r.translation)
            .map_err(|e| ProviderError::ParseError(format!("Missing translation field: {}", e))),
        Some(other) => Err(ProviderError::ParseError(format!(
            "Unexpected response shape: {}",
            other
        ))),
        None => Ok(body.to_string()),
    }
}

/// Extract chunk translations, requiring exactly `expected` entries
///
/// Accepts `{"chunks": [..]}` or a bare JSON array of strings.
pub fn parse_chunk_response(response: &str, expected: usize) -> Result<Vec<String>, ProviderError> {
    let body = strip_code_fence(response);
    let chunks = match parse_json(body)? {
        Some(value @ Value::Object(_)) => serde_json::from_value::<ChunkResponse>(value)
            .map(|r| r.chunks)
            .map_err(|e| ProviderError::ParseError(format!("Missing chunks field: {}", e)))?,
        Some(value @ Value::Array(_)) => serde_json::from_value::<Vec<String>>(value)
            .map_err(|e| ProviderError::ParseError(format!("Invalid chunk list: {}", e)))?,
        _ => {
            return Err(ProviderError::ParseError(
                "Chunk response is not a JSON object or array".to_string(),
            ));
        }
    };

    if chunks.len() != expected {
        return Err(ProviderError::ParseError(format!(
            "Expected {} chunk(s), got {}",
            expected,
            chunks.len()
        )));
    }
    Ok(chunks)
}
