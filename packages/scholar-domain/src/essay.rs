use serde::Serialize;

use crate::strategy::StrategyCluster;

pub const DEFAULT_SCHOLARSHIP_NAME: &str = "Scholarship";

const MAX_NAME_CHARS: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EssayResult {
	pub essay: String,
	pub selected_strategy: StrategyCluster,
	pub matching_clusters: Vec<String>,
	pub scholarship_name: String,
}

/// First line of the description, capped at 100 characters.
pub fn scholarship_name_from_description(description: &str) -> String {
	let first_line = description.trim().lines().next().unwrap_or_default().trim();

	if first_line.is_empty() {
		return DEFAULT_SCHOLARSHIP_NAME.to_string();
	}

	first_line.chars().take(MAX_NAME_CHARS).collect()
}
