pub mod embedding;
pub mod generation;

mod error;

pub use error::{Error, Result};

use std::time::Duration;

use reqwest::{
	Client,
	header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue},
};
use serde_json::{Map, Value};

const X_API_KEY: &str = "x-api-key";

/// How the credential is presented to the upstream service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScheme {
	Bearer,
	ApiKeyHeader,
}
impl AuthScheme {
	pub fn parse(raw: &str) -> Result<Self> {
		match raw {
			"bearer" => Ok(Self::Bearer),
			"x-api-key" => Ok(Self::ApiKeyHeader),
			other =>
				Err(Error::InvalidConfig { message: format!("Unknown auth scheme {other:?}.") }),
		}
	}
}

pub fn auth_headers(
	api_key: &str,
	scheme: AuthScheme,
	default_headers: &Map<String, Value>,
) -> Result<HeaderMap> {
	let mut headers = HeaderMap::new();

	match scheme {
		AuthScheme::Bearer => {
			headers.insert(AUTHORIZATION, format!("Bearer {api_key}").parse()?);
		},
		AuthScheme::ApiKeyHeader => {
			headers.insert(HeaderName::from_static(X_API_KEY), HeaderValue::from_str(api_key)?);
		},
	}

	for (key, value) in default_headers {
		let Some(raw) = value.as_str() else {
			return Err(Error::InvalidConfig {
				message: "Default header values must be strings.".to_string(),
			});
		};

		headers.insert(HeaderName::from_bytes(key.as_bytes())?, raw.parse()?);
	}

	Ok(headers)
}

/// POSTs `body` and decodes the JSON answer. `service` names the upstream in errors.
pub(crate) async fn post_json(
	service: &'static str,
	url: String,
	timeout: Option<Duration>,
	headers: HeaderMap,
	body: &Value,
) -> Result<Value> {
	let request_failed = |source| Error::Request { service, source };
	let mut builder = Client::builder();

	if let Some(timeout) = timeout {
		builder = builder.timeout(timeout);
	}

	let client = builder.build().map_err(request_failed)?;
	let res =
		client.post(url).headers(headers).json(body).send().await.map_err(request_failed)?;
	let status = res.status();

	if !status.is_success() {
		return Err(Error::Status { service, status: status.as_u16() });
	}

	res.json().await.map_err(request_failed)
}
