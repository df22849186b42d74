use std::time::Duration;

use serde_json::Value;

use crate::{AuthScheme, Error, Result};

pub async fn embed(cfg: &scholar_config::EmbeddingProviderConfig, text: &str) -> Result<Vec<f32>> {
	let headers = crate::auth_headers(&cfg.api_key, AuthScheme::Bearer, &cfg.default_headers)?;
	let body = serde_json::json!({
		"model": cfg.model,
		"texts": [text],
	});
	let json = crate::post_json(
		"embedding",
		format!("{}{}", cfg.api_base, cfg.path),
		Some(Duration::from_millis(cfg.timeout_ms)),
		headers,
		&body,
	)
	.await?;

	parse_embedding_response(json)
}

/// Cuts `text` to at most `max_chars` characters without splitting a code point.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
	match text.char_indices().nth(max_chars) {
		Some((byte_index, _)) => &text[..byte_index],
		None => text,
	}
}

/// Accepts `{"embeddings": [[...]]}` and `{"data": [{"index", "embedding"}]}` bodies and returns
/// the first vector.
fn parse_embedding_response(json: Value) -> Result<Vec<f32>> {
	let raw = if let Some(embeddings) = json.get("embeddings").and_then(|v| v.as_array()) {
		embeddings.first()
	} else if let Some(data) = json.get("data").and_then(|v| v.as_array()) {
		data.iter()
			.min_by_key(|item| item.get("index").and_then(|v| v.as_u64()).unwrap_or(u64::MAX))
			.and_then(|item| item.get("embedding"))
	} else {
		return Err(Error::InvalidResponse {
			message: "Embedding response is missing embeddings array.".to_string(),
		});
	};
	let values = raw.and_then(|v| v.as_array()).ok_or_else(|| Error::InvalidResponse {
		message: "Embedding response contains no vectors.".to_string(),
	})?;

	if values.is_empty() {
		return Err(Error::InvalidResponse { message: "Embedding vector is empty.".to_string() });
	}

	let mut vec = Vec::with_capacity(values.len());

	for value in values {
		let number = value.as_f64().ok_or_else(|| Error::InvalidResponse {
			message: "Embedding value must be numeric.".to_string(),
		})?;

		vec.push(number as f32);
	}

	Ok(vec)
}
