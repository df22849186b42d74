pub mod clusters;
pub mod enhancer;
pub mod essay;
pub mod matching;
pub mod rerank;
pub mod retrieval;
pub mod structurer;

mod error;

pub use error::{Error, Result};

use std::{
	future::Future,
	pin::Pin,
	sync::{Arc, Mutex},
};

use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};

use scholar_config::{Config, EmbeddingProviderConfig, GenerationProviderConfig};
use scholar_domain::{FallbackReason, ScholarshipRecord, StrategyCatalog, StudentProfile};
use scholar_providers::{embedding, generation, generation::GenerationRequest};
use scholar_storage::qdrant::QdrantStore;

pub use essay::EssayRequest;
pub use matching::{MatchRequest, MatchResponse};
pub use retrieval::{FilterCounts, Retrieval};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		text: &'a str,
	) -> BoxFuture<'a, scholar_providers::Result<Vec<f32>>>;
}

pub trait GenerationProvider
where
	Self: Send + Sync,
{
	fn generate<'a>(
		&'a self,
		cfg: &'a GenerationProviderConfig,
		request: &'a GenerationRequest,
	) -> BoxFuture<'a, scholar_providers::Result<String>>;
}

/// Read-only nearest-neighbour access to the scholarship corpus.
pub trait ScholarshipIndex
where
	Self: Send + Sync,
{
	fn count(&self) -> BoxFuture<'_, scholar_storage::Result<u64>>;

	fn nearest(
		&self,
		vector: Vec<f32>,
		limit: u64,
	) -> BoxFuture<'_, scholar_storage::Result<Vec<ScholarshipRecord>>>;
}

/// Picks one of `count` feasible strategies. Implementations must return an index below `count`.
pub trait StrategySelector
where
	Self: Send + Sync,
{
	fn pick(&self, count: usize) -> usize;
}

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn EmbeddingProvider>,
	pub generation: Arc<dyn GenerationProvider>,
}

/// Uniform choice from the thread-local generator.
pub struct RandomSelector;

/// Uniform choice from a seeded generator, for reproducible runs.
pub struct SeededSelector {
	rng: Mutex<StdRng>,
}

pub struct ScholarService {
	pub cfg: Config,
	pub index: Arc<dyn ScholarshipIndex>,
	pub catalog: StrategyCatalog,
	pub providers: Providers,
	pub selector: Arc<dyn StrategySelector>,
}

/// Body of every failed run, on the CLI and over HTTP alike.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
	pub error: String,
}

struct DefaultProviders;

impl EmbeddingProvider for DefaultProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		text: &'a str,
	) -> BoxFuture<'a, scholar_providers::Result<Vec<f32>>> {
		Box::pin(embedding::embed(cfg, text))
	}
}

impl GenerationProvider for DefaultProviders {
	fn generate<'a>(
		&'a self,
		cfg: &'a GenerationProviderConfig,
		request: &'a GenerationRequest,
	) -> BoxFuture<'a, scholar_providers::Result<String>> {
		Box::pin(generation::generate(cfg, request))
	}
}

impl ScholarshipIndex for QdrantStore {
	fn count(&self) -> BoxFuture<'_, scholar_storage::Result<u64>> {
		Box::pin(QdrantStore::count(self))
	}

	fn nearest(
		&self,
		vector: Vec<f32>,
		limit: u64,
	) -> BoxFuture<'_, scholar_storage::Result<Vec<ScholarshipRecord>>> {
		Box::pin(QdrantStore::nearest(self, vector, limit))
	}
}

impl StrategySelector for RandomSelector {
	fn pick(&self, count: usize) -> usize {
		if count <= 1 { 0 } else { rand::rng().random_range(0..count) }
	}
}

impl SeededSelector {
	pub fn new(seed: u64) -> Self {
		Self { rng: Mutex::new(StdRng::seed_from_u64(seed)) }
	}
}

impl StrategySelector for SeededSelector {
	fn pick(&self, count: usize) -> usize {
		if count <= 1 {
			return 0;
		}

		let mut rng = self.rng.lock().unwrap_or_else(|err| err.into_inner());

		rng.random_range(0..count)
	}
}

impl Providers {
	pub fn new(
		embedding: Arc<dyn EmbeddingProvider>,
		generation: Arc<dyn GenerationProvider>,
	) -> Self {
		Self { embedding, generation }
	}
}

impl Default for Providers {
	fn default() -> Self {
		let provider = Arc::new(DefaultProviders);

		Self { embedding: provider.clone(), generation: provider }
	}
}

impl ScholarService {
	pub fn new(cfg: Config, index: Arc<dyn ScholarshipIndex>, catalog: StrategyCatalog) -> Self {
		Self {
			cfg,
			index,
			catalog,
			providers: Providers::default(),
			selector: Arc::new(RandomSelector),
		}
	}

	pub fn with_providers(
		cfg: Config,
		index: Arc<dyn ScholarshipIndex>,
		catalog: StrategyCatalog,
		providers: Providers,
	) -> Self {
		Self { cfg, index, catalog, providers, selector: Arc::new(RandomSelector) }
	}

	pub fn with_selector(mut self, selector: Arc<dyn StrategySelector>) -> Self {
		self.selector = selector;

		self
	}

	pub(crate) async fn classify(&self, prompt: String, max_tokens: u32) -> Result<String> {
		let cfg = &self.cfg.providers.generation;
		let request =
			GenerationRequest { prompt, max_tokens, temperature: cfg.classify_temperature };

		Ok(self.providers.generation.generate(cfg, &request).await?)
	}

	pub(crate) async fn draft(&self, prompt: String, max_tokens: u32) -> Result<String> {
		let cfg = &self.cfg.providers.generation;
		let request = GenerationRequest { prompt, max_tokens, temperature: cfg.draft_temperature };

		Ok(self.providers.generation.generate(cfg, &request).await?)
	}
}

impl From<&Error> for ErrorResponse {
	fn from(err: &Error) -> Self {
		Self { error: err.to_string() }
	}
}

/// Fallback reason for a failed model call, split by whether the model answered at all.
pub(crate) fn fallback_reason(err: &Error) -> FallbackReason {
	match err {
		Error::MalformedResponse { message } => FallbackReason::Malformed(message.clone()),
		other => FallbackReason::Upstream(other.to_string()),
	}
}

/// Profile content is required before either pipeline spends a model call on it.
pub(crate) fn ensure_profile_present(profile: &StudentProfile) -> Result<()> {
	let has_text = [
		&profile.field_of_study,
		&profile.activities,
		&profile.background_story,
		&profile.career_goals,
		&profile.challenges,
	]
	.into_iter()
	.any(|field| field.as_deref().is_some_and(|text| !text.trim().is_empty()));

	if has_text || !profile.name.trim().is_empty() || profile.gpa.is_some() {
		return Ok(());
	}

	Err(Error::InvalidRequest { message: "studentProfile must not be empty.".to_string() })
}
