use std::path::PathBuf;

use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	#[serde(default)]
	pub matching: Matching,
	pub essay: Essay,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Storage {
	pub qdrant: Qdrant,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Qdrant {
	pub url: String,
	pub collection: String,
	/// Optional. Named dense vector to query; the unnamed default vector is used when absent.
	pub vector_name: Option<String>,
	/// Metric the collection was built with: "cosine", "dot", or "euclid".
	#[serde(default = "default_distance")]
	pub distance: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
	pub generation: GenerationProviderConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	#[serde(default = "default_embedding_timeout_ms")]
	pub timeout_ms: u64,
	/// Inputs longer than this many characters are truncated before the request is sent.
	#[serde(default = "default_max_input_chars")]
	pub max_input_chars: usize,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerationProviderConfig {
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	/// "bearer" sends `Authorization: Bearer <key>`, "x-api-key" sends `x-api-key: <key>`.
	#[serde(default = "default_auth_scheme")]
	pub auth_scheme: String,
	/// Optional. The HTTP client default applies when absent.
	pub timeout_ms: Option<u64>,
	#[serde(default = "default_classify_temperature")]
	pub classify_temperature: f32,
	#[serde(default = "default_draft_temperature")]
	pub draft_temperature: f32,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Matching {
	/// Candidates kept after retrieval and filtering.
	#[serde(default = "default_retrieve_k")]
	pub retrieve_k: u32,
	/// Matches returned after reranking.
	#[serde(default = "default_rerank_k")]
	pub rerank_k: u32,
	/// Candidates farther than this are dropped; compared as `distance > threshold`.
	#[serde(default = "default_distance_threshold")]
	pub distance_threshold: f64,
	#[serde(default = "default_overfetch_factor")]
	pub overfetch_factor: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Essay {
	pub strategy_map_path: PathBuf,
	#[serde(default = "default_max_matching_clusters")]
	pub max_matching_clusters: u32,
}

impl Default for Matching {
	fn default() -> Self {
		Self {
			retrieve_k: default_retrieve_k(),
			rerank_k: default_rerank_k(),
			distance_threshold: default_distance_threshold(),
			overfetch_factor: default_overfetch_factor(),
		}
	}
}

fn default_distance() -> String {
	"cosine".to_string()
}

fn default_embedding_timeout_ms() -> u64 {
	30_000
}

fn default_max_input_chars() -> usize {
	8_000
}

fn default_auth_scheme() -> String {
	"bearer".to_string()
}

fn default_classify_temperature() -> f32 {
	0.2
}

fn default_draft_temperature() -> f32 {
	0.7
}

fn default_retrieve_k() -> u32 {
	15
}

fn default_rerank_k() -> u32 {
	5
}

fn default_distance_threshold() -> f64 {
	1.0
}

fn default_overfetch_factor() -> u32 {
	3
}

fn default_max_matching_clusters() -> u32 {
	4
}
