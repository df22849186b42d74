use qdrant_client::QdrantError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Unknown distance metric {0:?}.")]
	UnknownMetric(String),
	#[error("Invalid scholarship payload: {0}")]
	InvalidPayload(String),
	#[error("Scholarship index is unavailable: {0}")]
	Unavailable(String),
	#[error(transparent)]
	Qdrant(#[from] Box<QdrantError>),
}
impl From<QdrantError> for Error {
	fn from(err: QdrantError) -> Self {
		Self::Qdrant(Box::new(err))
	}
}
