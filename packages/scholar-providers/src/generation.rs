use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

use crate::{AuthScheme, Error, Result};

/// A single-message completion request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationRequest {
	pub prompt: String,
	pub max_tokens: u32,
	pub temperature: f32,
}

pub async fn generate(
	cfg: &scholar_config::GenerationProviderConfig,
	request: &GenerationRequest,
) -> Result<String> {
	let scheme = AuthScheme::parse(&cfg.auth_scheme)?;
	let headers = crate::auth_headers(&cfg.api_key, scheme, &cfg.default_headers)?;
	let body = serde_json::json!({
		"model": cfg.model,
		"max_tokens": request.max_tokens,
		"temperature": request.temperature,
		"messages": [
			{ "role": "user", "content": request.prompt }
		],
	});
	let json = crate::post_json(
		"generation",
		format!("{}{}", cfg.api_base, cfg.path),
		cfg.timeout_ms.map(Duration::from_millis),
		headers,
		&body,
	)
	.await?;

	parse_generation_response(json)
}

/// Text of the completion from either the messages shape (`content[].text`) or the chat
/// completions shape (`choices[0].message.content`).
fn parse_generation_response(json: Value) -> Result<String> {
	let text = if let Some(blocks) = json.get("content").and_then(|v| v.as_array()) {
		blocks
			.iter()
			.filter(|block| block.get("type").and_then(|v| v.as_str()).unwrap_or("text") == "text")
			.filter_map(|block| block.get("text").and_then(|v| v.as_str()))
			.collect::<Vec<_>>()
			.join("\n")
	} else if let Some(content) = json
		.get("choices")
		.and_then(|v| v.as_array())
		.and_then(|arr| arr.first())
		.and_then(|choice| choice.get("message"))
		.and_then(|msg| msg.get("content"))
		.and_then(|c| c.as_str())
	{
		content.to_string()
	} else {
		return Err(Error::InvalidResponse {
			message: "Generation response is missing text content.".to_string(),
		});
	};

	if text.trim().is_empty() {
		return Err(Error::InvalidResponse {
			message: "Generation response text is empty.".to_string(),
		});
	}

	Ok(text)
}
