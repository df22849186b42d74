mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Config, EmbeddingProviderConfig, Essay, GenerationProviderConfig, Matching, Providers, Qdrant,
	Service, Storage,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);
	resolve_paths(&mut cfg, path);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	require_text("service.log_level", &cfg.service.log_level)?;
	require_text("service.http_bind", &cfg.service.http_bind)?;
	require_text("storage.qdrant.collection", &cfg.storage.qdrant.collection)?;

	if !matches!(cfg.storage.qdrant.distance.as_str(), "cosine" | "dot" | "euclid") {
		return Err(Error::invalid(
			"storage.qdrant.distance",
			"must be one of cosine, dot, or euclid.",
		));
	}

	require_text("providers.embedding.api_key", &cfg.providers.embedding.api_key)?;
	require_text("providers.generation.api_key", &cfg.providers.generation.api_key)?;

	let embedding = &cfg.providers.embedding;

	if embedding.timeout_ms == 0 {
		return Err(Error::invalid("providers.embedding.timeout_ms", "must be greater than zero."));
	}
	if embedding.max_input_chars == 0 {
		return Err(Error::invalid(
			"providers.embedding.max_input_chars",
			"must be greater than zero.",
		));
	}

	let generation = &cfg.providers.generation;

	if !matches!(generation.auth_scheme.as_str(), "bearer" | "x-api-key") {
		return Err(Error::invalid(
			"providers.generation.auth_scheme",
			"must be one of bearer or x-api-key.",
		));
	}
	if generation.timeout_ms == Some(0) {
		return Err(Error::invalid("providers.generation.timeout_ms", "must be greater than zero."));
	}

	for (key, temperature) in [
		("providers.generation.classify_temperature", generation.classify_temperature),
		("providers.generation.draft_temperature", generation.draft_temperature),
	] {
		if !temperature.is_finite() {
			return Err(Error::invalid(key, "must be a finite number."));
		}
		if !(0.0..=1.0).contains(&temperature) {
			return Err(Error::invalid(key, "must be in the range 0.0-1.0."));
		}
	}

	validate_matching(&cfg.matching)?;

	if cfg.essay.strategy_map_path.as_os_str().is_empty() {
		return Err(Error::invalid("essay.strategy_map_path", "must be non-empty."));
	}
	if !(1..=8).contains(&cfg.essay.max_matching_clusters) {
		return Err(Error::invalid("essay.max_matching_clusters", "must be in the range 1-8."));
	}

	Ok(())
}

fn validate_matching(matching: &Matching) -> Result<()> {
	if matching.retrieve_k == 0 {
		return Err(Error::invalid("matching.retrieve_k", "must be greater than zero."));
	}
	if matching.rerank_k == 0 {
		return Err(Error::invalid("matching.rerank_k", "must be greater than zero."));
	}
	if matching.rerank_k > matching.retrieve_k {
		return Err(Error::invalid(
			"matching.rerank_k",
			"must be less than or equal to matching.retrieve_k.",
		));
	}
	if matching.overfetch_factor == 0 {
		return Err(Error::invalid("matching.overfetch_factor", "must be greater than zero."));
	}
	if !matching.distance_threshold.is_finite() {
		return Err(Error::invalid("matching.distance_threshold", "must be a finite number."));
	}
	if matching.distance_threshold < 0.0 {
		return Err(Error::invalid("matching.distance_threshold", "must be zero or greater."));
	}

	Ok(())
}

fn require_text(key: &str, value: &str) -> Result<()> {
	if value.trim().is_empty() {
		return Err(Error::invalid(key, "must be non-empty."));
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	if cfg.storage.qdrant.vector_name.as_deref().map(|name| name.trim().is_empty()).unwrap_or(false)
	{
		cfg.storage.qdrant.vector_name = None;
	}

	cfg.storage.qdrant.distance = cfg.storage.qdrant.distance.trim().to_ascii_lowercase();
	cfg.providers.generation.auth_scheme =
		cfg.providers.generation.auth_scheme.trim().to_ascii_lowercase();
}

/// Relative paths in the file are taken from the directory holding the file.
fn resolve_paths(cfg: &mut Config, config_path: &Path) {
	let strategy_map_path = &cfg.essay.strategy_map_path;

	if strategy_map_path.is_relative()
		&& !strategy_map_path.as_os_str().is_empty()
		&& let Some(dir) = config_path.parent()
	{
		cfg.essay.strategy_map_path = dir.join(strategy_map_path);
	}
}
