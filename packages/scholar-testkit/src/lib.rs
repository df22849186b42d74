use std::{
	path::PathBuf,
	sync::{
		Arc, Mutex,
		atomic::{AtomicUsize, Ordering},
	},
};

use serde_json::{Map, Value};

use scholar_config::{
	Config, EmbeddingProviderConfig, Essay, GenerationProviderConfig, Matching, Providers, Qdrant,
	Service, Storage,
};
use scholar_domain::{DegreeLevel, ScholarshipRecord, StrategyCatalog, StudentProfile};
use scholar_providers::generation::GenerationRequest;
use scholar_service::{
	BoxFuture, EmbeddingProvider, GenerationProvider, ScholarService, ScholarshipIndex,
	StrategySelector,
};

const STRATEGY_MAP: &str = include_str!("../fixtures/strategy_map.json");

/// Generation stub that answers from a fixed script and records every request it saw.
pub struct ScriptedGeneration {
	replies: Vec<std::result::Result<String, String>>,
	repeat: bool,
	calls: AtomicUsize,
	requests: Mutex<Vec<GenerationRequest>>,
}
impl ScriptedGeneration {
	/// Answers in order; calls past the end of the script fail.
	pub fn new(replies: Vec<std::result::Result<String, String>>) -> Self {
		Self {
			replies,
			repeat: false,
			calls: AtomicUsize::new(0),
			requests: Mutex::new(Vec::new()),
		}
	}

	/// Answers in order and starts over after the last reply.
	pub fn repeating(replies: Vec<std::result::Result<String, String>>) -> Self {
		Self { repeat: true, ..Self::new(replies) }
	}

	pub fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}

	pub fn requests(&self) -> Vec<GenerationRequest> {
		self.requests.lock().unwrap_or_else(|err| err.into_inner()).clone()
	}

	fn next_reply(&self) -> std::result::Result<String, String> {
		let index = self.calls.fetch_add(1, Ordering::SeqCst);
		let index = if self.repeat && !self.replies.is_empty() {
			index % self.replies.len()
		} else {
			index
		};

		self.replies
			.get(index)
			.cloned()
			.unwrap_or_else(|| Err(format!("Script has no reply for call {index}.")))
	}
}

impl GenerationProvider for ScriptedGeneration {
	fn generate<'a>(
		&'a self,
		_cfg: &'a GenerationProviderConfig,
		request: &'a GenerationRequest,
	) -> BoxFuture<'a, scholar_providers::Result<String>> {
		self.requests.lock().unwrap_or_else(|err| err.into_inner()).push(request.clone());

		let reply = self.next_reply();

		Box::pin(async move {
			reply.map_err(|message| scholar_providers::Error::InvalidResponse { message })
		})
	}
}

/// Embedding stub returning one fixed vector, or failing every call.
pub struct StubEmbedding {
	vector: Option<Vec<f32>>,
	inputs: Mutex<Vec<String>>,
}
impl StubEmbedding {
	pub fn returning(vector: Vec<f32>) -> Self {
		Self { vector: Some(vector), inputs: Mutex::new(Vec::new()) }
	}

	pub fn failing() -> Self {
		Self { vector: None, inputs: Mutex::new(Vec::new()) }
	}

	/// Texts received, after any truncation the caller applied.
	pub fn inputs(&self) -> Vec<String> {
		self.inputs.lock().unwrap_or_else(|err| err.into_inner()).clone()
	}
}

impl EmbeddingProvider for StubEmbedding {
	fn embed<'a>(
		&'a self,
		_cfg: &'a EmbeddingProviderConfig,
		text: &'a str,
	) -> BoxFuture<'a, scholar_providers::Result<Vec<f32>>> {
		self.inputs.lock().unwrap_or_else(|err| err.into_inner()).push(text.to_string());

		let result = self.vector.clone().ok_or_else(|| scholar_providers::Error::InvalidResponse {
			message: "Embedding service unavailable.".to_string(),
		});

		Box::pin(async move { result })
	}
}

/// Corpus held in memory; `nearest` ignores the vector and returns records by stored distance.
pub struct InMemoryIndex {
	records: Vec<ScholarshipRecord>,
	unavailable: bool,
	limits: Mutex<Vec<u64>>,
}
impl InMemoryIndex {
	pub fn new(records: Vec<ScholarshipRecord>) -> Self {
		Self { records, unavailable: false, limits: Mutex::new(Vec::new()) }
	}

	pub fn unavailable() -> Self {
		Self { unavailable: true, ..Self::new(Vec::new()) }
	}

	/// The `limit` of every `nearest` call.
	pub fn limits(&self) -> Vec<u64> {
		self.limits.lock().unwrap_or_else(|err| err.into_inner()).clone()
	}

	fn check_available(&self) -> scholar_storage::Result<()> {
		if self.unavailable {
			return Err(scholar_storage::Error::Unavailable("connection refused".to_string()));
		}

		Ok(())
	}
}

impl ScholarshipIndex for InMemoryIndex {
	fn count(&self) -> BoxFuture<'_, scholar_storage::Result<u64>> {
		let result = self.check_available().map(|()| self.records.len() as u64);

		Box::pin(async move { result })
	}

	fn nearest(
		&self,
		_vector: Vec<f32>,
		limit: u64,
	) -> BoxFuture<'_, scholar_storage::Result<Vec<ScholarshipRecord>>> {
		self.limits.lock().unwrap_or_else(|err| err.into_inner()).push(limit);

		let result = self.check_available().map(|()| {
			let mut records = self.records.clone();

			records.sort_by(|a, b| a.distance.total_cmp(&b.distance));
			records.truncate(usize::try_from(limit).unwrap_or(usize::MAX));

			records
		});

		Box::pin(async move { result })
	}
}

/// Always picks the same position, clamped to the last one.
pub struct FixedSelector(pub usize);

impl StrategySelector for FixedSelector {
	fn pick(&self, count: usize) -> usize {
		self.0.min(count.saturating_sub(1))
	}
}

/// Stubs wired into a service for pipeline tests.
pub struct TestRig {
	pub generation: Arc<ScriptedGeneration>,
	pub embedding: Arc<StubEmbedding>,
	pub index: Arc<InMemoryIndex>,
}
impl TestRig {
	pub fn new(generation: ScriptedGeneration, index: InMemoryIndex) -> Self {
		Self {
			generation: Arc::new(generation),
			embedding: Arc::new(StubEmbedding::returning(vec![0.1, 0.2, 0.3])),
			index: Arc::new(index),
		}
	}

	pub fn with_embedding(mut self, embedding: StubEmbedding) -> Self {
		self.embedding = Arc::new(embedding);

		self
	}

	pub fn service(&self) -> ScholarService {
		self.service_with(test_config(), Arc::new(FixedSelector(0)))
	}

	pub fn service_with(
		&self,
		cfg: Config,
		selector: Arc<dyn StrategySelector>,
	) -> ScholarService {
		let providers =
			scholar_service::Providers::new(self.embedding.clone(), self.generation.clone());

		ScholarService::with_providers(cfg, self.index.clone(), sample_catalog(), providers)
			.with_selector(selector)
	}
}

pub fn test_config() -> Config {
	Config {
		service: Service { http_bind: "127.0.0.1:0".to_string(), log_level: "info".to_string() },
		storage: Storage {
			qdrant: Qdrant {
				url: "http://127.0.0.1:6334".to_string(),
				collection: "scholarships_test".to_string(),
				vector_name: None,
				distance: "cosine".to_string(),
			},
		},
		providers: Providers {
			embedding: EmbeddingProviderConfig {
				api_base: "http://127.0.0.1:1".to_string(),
				api_key: "test-key".to_string(),
				path: "/embed".to_string(),
				model: "test-embedding".to_string(),
				timeout_ms: 1_000,
				max_input_chars: 8_000,
				default_headers: Map::new(),
			},
			generation: GenerationProviderConfig {
				api_base: "http://127.0.0.1:1".to_string(),
				api_key: "test-key".to_string(),
				path: "/generate".to_string(),
				model: "test-generation".to_string(),
				auth_scheme: "bearer".to_string(),
				timeout_ms: Some(1_000),
				classify_temperature: 0.2,
				draft_temperature: 0.7,
				default_headers: Map::new(),
			},
		},
		matching: Matching::default(),
		essay: Essay {
			strategy_map_path: PathBuf::from("fixtures/strategy_map.json"),
			max_matching_clusters: 4,
		},
	}
}

/// Four clusters with ids 1-4.
pub fn sample_catalog() -> StrategyCatalog {
	match StrategyCatalog::from_json(STRATEGY_MAP) {
		Ok(catalog) => catalog,
		Err(err) => panic!("Fixture strategy map must load: {err}."),
	}
}

pub fn sample_profile() -> StudentProfile {
	StudentProfile {
		name: "Maya Torres".to_string(),
		gpa: Some(3.6),
		degree_level: DegreeLevel::Undergraduate,
		field_of_study: Some("Environmental Engineering".to_string()),
		citizenship: Some("US citizen".to_string()),
		age: Some(19),
		activities: Some(
			"Founded a campus composting program; captain of the robotics team.".to_string(),
		),
		background_story: Some("First in my family to attend college.".to_string()),
		career_goals: Some("Design water systems for rural towns.".to_string()),
		challenges: Some("Worked nights to support my family during high school.".to_string()),
	}
}

/// Record with metadata given as JSON, for example `json!({ "minimum_gpa": 3.0 })`.
pub fn record(id: &str, distance: f64, metadata: Value) -> ScholarshipRecord {
	let metadata = match serde_json::from_value(metadata) {
		Ok(metadata) => metadata,
		Err(err) => panic!("Fixture metadata must decode: {err}."),
	};

	ScholarshipRecord {
		id: id.to_string(),
		distance,
		url: format!("https://scholarships.example.org/{}", id.to_lowercase().replace(' ', "-")),
		full_text: format!("{id} supports students who lead and serve."),
		metadata,
	}
}

/// Structurer reply for [`sample_profile`].
pub fn structured_reply() -> String {
	serde_json::json!({
		"gpa": 3.6,
		"degree_level": "undergraduate",
		"field_of_study": "Environmental Engineering",
		"citizenship": "US citizen",
		"age": 19,
		"key_activities": ["campus composting program", "robotics captain"]
	})
	.to_string()
}
