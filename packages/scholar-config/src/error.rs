use std::path::PathBuf;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Failed to read config file at {path:?}.")]
	ReadConfig { path: PathBuf, source: std::io::Error },
	#[error("Failed to parse config file at {path:?}.")]
	ParseConfig { path: PathBuf, source: toml::de::Error },
	/// `key` is the dotted TOML path of the rejected setting.
	#[error("{key} {message}")]
	Validation { key: String, message: String },
}
impl Error {
	pub(crate) fn invalid(key: impl Into<String>, message: impl Into<String>) -> Self {
		Self::Validation { key: key.into(), message: message.into() }
	}

	/// Offending key for validation failures.
	pub fn key(&self) -> Option<&str> {
		match self {
			Self::Validation { key, .. } => Some(key),
			_ => None,
		}
	}
}
