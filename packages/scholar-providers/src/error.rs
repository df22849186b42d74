use reqwest::header::{InvalidHeaderName, InvalidHeaderValue};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Request to the {service} service failed.")]
	Request {
		service: &'static str,
		#[source]
		source: reqwest::Error,
	},
	#[error("The {service} service answered with HTTP {status}.")]
	Status { service: &'static str, status: u16 },
	#[error("Invalid request header: {message}")]
	InvalidHeader { message: String },
	#[error("{message}")]
	InvalidConfig { message: String },
	#[error("{message}")]
	InvalidResponse { message: String },
}
impl From<InvalidHeaderName> for Error {
	fn from(err: InvalidHeaderName) -> Self {
		Self::InvalidHeader { message: err.to_string() }
	}
}
impl From<InvalidHeaderValue> for Error {
	fn from(err: InvalidHeaderValue) -> Self {
		Self::InvalidHeader { message: err.to_string() }
	}
}
