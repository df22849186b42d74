use std::{collections::HashSet, fs, path::Path};

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
	#[error("Failed to read strategy map at {path:?}.")]
	Read { path: std::path::PathBuf, source: std::io::Error },
	#[error("Failed to parse strategy map.")]
	Parse(#[from] serde_json::Error),
	#[error("Strategy map must contain at least one cluster.")]
	Empty,
	#[error("Strategy map contains duplicate cluster_id {0}.")]
	DuplicateId(i64),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WritingStrategy {
	pub broad_instructions: String,
	pub structural_template: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyCluster {
	pub cluster_id: i64,
	#[serde(default)]
	pub cluster_name: String,
	pub description_archetype: String,
	pub writing_strategy: WritingStrategy,
}
impl StrategyCluster {
	pub fn display_name(&self) -> String {
		if self.cluster_name.trim().is_empty() {
			format!("Cluster {}", self.cluster_id)
		} else {
			self.cluster_name.clone()
		}
	}
}

/// Fixed catalog of writing strategies, loaded once and never mutated.
///
/// `new` and `load` reject an empty catalog. `Default` is the empty catalog a process holds when
/// it only matches scholarships and never loads the strategy map.
#[derive(Debug, Clone, Default)]
pub struct StrategyCatalog {
	clusters: Vec<StrategyCluster>,
}
impl StrategyCatalog {
	pub fn new(clusters: Vec<StrategyCluster>) -> Result<Self, CatalogError> {
		if clusters.is_empty() {
			return Err(CatalogError::Empty);
		}

		let mut seen = HashSet::new();

		for cluster in &clusters {
			if !seen.insert(cluster.cluster_id) {
				return Err(CatalogError::DuplicateId(cluster.cluster_id));
			}
		}

		Ok(Self { clusters })
	}

	pub fn from_json(raw: &str) -> Result<Self, CatalogError> {
		Self::new(serde_json::from_str(raw)?)
	}

	pub fn load(path: &Path) -> Result<Self, CatalogError> {
		let raw = fs::read_to_string(path)
			.map_err(|err| CatalogError::Read { path: path.to_path_buf(), source: err })?;

		Self::from_json(&raw)
	}

	pub fn get(&self, cluster_id: i64) -> Option<&StrategyCluster> {
		self.clusters.iter().find(|cluster| cluster.cluster_id == cluster_id)
	}

	pub fn clusters(&self) -> &[StrategyCluster] {
		&self.clusters
	}

	pub fn len(&self) -> usize {
		self.clusters.len()
	}

	pub fn is_empty(&self) -> bool {
		self.clusters.is_empty()
	}
}
