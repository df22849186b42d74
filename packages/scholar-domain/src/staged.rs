use std::fmt;

/// Why a stage produced a degraded value instead of its primary result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackReason {
	/// The embedding, generation, or vector service failed.
	Upstream(String),
	/// The service answered but not with what was asked for.
	Malformed(String),
	/// The stage produced nothing usable.
	Empty,
}
impl fmt::Display for FallbackReason {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Upstream(message) => write!(f, "upstream failure: {message}"),
			Self::Malformed(message) => write!(f, "malformed response: {message}"),
			Self::Empty => f.write_str("empty result"),
		}
	}
}

/// A degraded-but-valid stage value tagged with the reason it was used.
#[derive(Debug, Clone, PartialEq)]
pub struct Fallback<T> {
	pub value: T,
	pub reason: FallbackReason,
}
impl<T> Fallback<T> {
	pub fn new(value: T, reason: FallbackReason) -> Self {
		Self { value, reason }
	}

	pub fn map<U, F>(self, f: F) -> Fallback<U>
	where
		F: FnOnce(T) -> U,
	{
		Fallback { value: f(self.value), reason: self.reason }
	}
}

/// `Ok` is the primary result, `Err` is the fallback the stage substituted for it.
pub type Staged<T> = Result<T, Fallback<T>>;

pub trait StagedExt<T> {
	/// The usable value, primary or fallback.
	fn settle(self) -> T;

	fn is_degraded(&self) -> bool;

	fn fallback_reason(&self) -> Option<&FallbackReason>;
}
impl<T> StagedExt<T> for Staged<T> {
	fn settle(self) -> T {
		match self {
			Ok(value) => value,
			Err(fallback) => fallback.value,
		}
	}

	fn is_degraded(&self) -> bool {
		self.is_err()
	}

	fn fallback_reason(&self) -> Option<&FallbackReason> {
		self.as_ref().err().map(|fallback| &fallback.reason)
	}
}
