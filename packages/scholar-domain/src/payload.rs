//! Extraction of JSON payloads from free-form model output.
//!
//! Models asked for "JSON only" still wrap answers in Markdown fences or a sentence of prose.
//! Every component that parses model output goes through [`extract_json_payload`] so the
//! accepted wrappers and the failure kinds are the same everywhere.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Deserializer, de::DeserializeOwned};
use serde_json::Value;

const CLOSED_FENCE_PATTERN: &str = r"(?s)```[A-Za-z0-9_-]*[ \t]*\r?\n?(.*?)```";
const OPEN_FENCE_PATTERN: &str = r"(?s)^```[A-Za-z0-9_-]*[ \t]*\r?\n?(.*)$";
const SNIPPET_CHARS: usize = 120;

/// Closed fence first, then a fence the model never closed.
static FENCE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
	[CLOSED_FENCE_PATTERN, OPEN_FENCE_PATTERN]
		.into_iter()
		.filter_map(|pattern| Regex::new(pattern).ok())
		.collect()
});

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PayloadError {
	#[error("Model output is empty.")]
	Empty,
	#[error("Model output is not JSON: {snippet}")]
	NotJson { snippet: String },
	#[error("Model output does not match the expected schema: {message}")]
	Schema { message: String },
}

/// Returns the JSON value carried by `text`.
///
/// Accepted shapes, in order: bare JSON, a fenced block (closed or truncated), and JSON embedded
/// in surrounding prose (outermost object or array span).
pub fn extract_json_payload(text: &str) -> Result<Value, PayloadError> {
	let trimmed = text.trim();

	if trimmed.is_empty() {
		return Err(PayloadError::Empty);
	}

	let candidate = strip_code_fence(trimmed).trim();

	if let Ok(value) = serde_json::from_str::<Value>(candidate) {
		return Ok(value);
	}
	if let Some(span) = outermost_json_span(candidate)
		&& let Ok(value) = serde_json::from_str::<Value>(span)
	{
		return Ok(value);
	}

	Err(PayloadError::NotJson { snippet: snippet(trimmed) })
}

/// Extracts and decodes in one step; schema mismatches get their own error kind.
pub fn decode_payload<T>(text: &str) -> Result<T, PayloadError>
where
	T: DeserializeOwned,
{
	let value = extract_json_payload(text)?;

	serde_json::from_value(value).map_err(|err| PayloadError::Schema { message: err.to_string() })
}

/// A JSON number or a numeric string, if finite.
pub fn number_from_value(value: &Value) -> Option<f64> {
	let number = match value {
		Value::Number(number) => number.as_f64(),
		Value::String(text) => text.trim().parse().ok(),
		_ => None,
	}?;

	number.is_finite().then_some(number)
}

/// A whole number given as an integer, an integral float such as `3.0`, or a numeric string.
pub fn integral_from_value(value: &Value) -> Option<i64> {
	if let Some(integer) = value.as_i64() {
		return Some(integer);
	}

	let number = number_from_value(value)?;

	(number.fract() == 0.0 && number.abs() <= i64::MAX as f64).then_some(number as i64)
}

/// `deserialize_with` helper for numbers models sometimes quote. Anything else reads as `None`.
pub fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
	D: Deserializer<'de>,
{
	Ok(Option::<Value>::deserialize(deserializer)?.as_ref().and_then(number_from_value))
}

fn strip_code_fence(text: &str) -> &str {
	FENCE_PATTERNS
		.iter()
		.find_map(|re| re.captures(text).and_then(|caps| caps.get(1)))
		.map_or(text, |inner| inner.as_str())
}

fn outermost_json_span(text: &str) -> Option<&str> {
	let start = text.find(['{', '['])?;
	let closer = if text[start..].starts_with('{') { '}' } else { ']' };
	let end = text.rfind(closer)?;

	if end <= start {
		return None;
	}

	Some(&text[start..=end])
}

fn snippet(text: &str) -> String {
	let mut out = text.chars().take(SNIPPET_CHARS).collect::<String>();

	if text.chars().count() > SNIPPET_CHARS {
		out.push_str("...");
	}

	out
}
