pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Provider error: {message}")]
	Provider { message: String },
	#[error("Malformed model response: {message}")]
	MalformedResponse { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
	#[error("No strategy available: {message}")]
	NoStrategy { message: String },
}
impl From<scholar_providers::Error> for Error {
	fn from(err: scholar_providers::Error) -> Self {
		Self::Provider { message: err.to_string() }
	}
}

impl From<scholar_storage::Error> for Error {
	fn from(err: scholar_storage::Error) -> Self {
		Self::Storage { message: err.to_string() }
	}
}

impl From<scholar_domain::PayloadError> for Error {
	fn from(err: scholar_domain::PayloadError) -> Self {
		Self::MalformedResponse { message: err.to_string() }
	}
}
