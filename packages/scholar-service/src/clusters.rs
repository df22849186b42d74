use serde_json::{Value, json};
use tracing::{info, warn};

use scholar_domain::{
	Fallback, FallbackReason, Staged, StagedExt, StrategyCatalog, StrategyCluster, StudentProfile,
	payload,
};

use crate::{Error, Result, ScholarService};

const MAX_TOKENS: u32 = 500;

impl ScholarService {
	/// Clusters whose archetype fits `description`, most relevant first.
	///
	/// This stage has no fallback: a failed call, an unreadable answer, or an answer naming no
	/// known cluster is an error for the whole run.
	pub async fn match_clusters(&self, description: &str) -> Result<Vec<StrategyCluster>> {
		if self.catalog.is_empty() {
			return Err(Error::NoStrategy {
				message: "Strategy catalog is not loaded.".to_string(),
			});
		}

		let limit = self.cfg.essay.max_matching_clusters as usize;
		let prompt = build_match_prompt(description, &self.catalog, limit);
		let text = self.classify(prompt, MAX_TOKENS).await?;
		let ids = payload::decode_payload::<Vec<Value>>(&text)?;
		let matched = resolve_clusters(&ids, &self.catalog, limit);

		if matched.is_empty() {
			return Err(Error::NoStrategy {
				message: "No strategy cluster matched the scholarship description.".to_string(),
			});
		}

		info!(
			clusters = ?matched.iter().map(|cluster| cluster.cluster_id).collect::<Vec<_>>(),
			"Matched strategy clusters."
		);

		Ok(matched)
	}

	/// The subset of `matched` the student can credibly write, in matched order.
	///
	/// A failed or unreadable answer degrades to an empty subset; see [`reinstate_top_match`].
	pub async fn filter_by_capability(
		&self,
		matched: &[StrategyCluster],
		profile: &StudentProfile,
	) -> Staged<Vec<StrategyCluster>> {
		let prompt = build_capability_prompt(matched, profile);
		let decoded = self.classify(prompt, MAX_TOKENS).await.and_then(|text| {
			payload::decode_payload::<Vec<Value>>(&text).map_err(Error::from)
		});
		let accepted = match decoded {
			Ok(ids) => ids.iter().filter_map(cluster_id).collect::<Vec<_>>(),
			Err(err) => {
				warn!(error = %err, "Capability filtering failed; no strategy counts as feasible.");

				return Err(Fallback::new(Vec::new(), crate::fallback_reason(&err)));
			},
		};
		let feasible = matched
			.iter()
			.filter(|cluster| accepted.contains(&cluster.cluster_id))
			.cloned()
			.collect::<Vec<_>>();

		info!(
			matched = matched.len(),
			feasible = feasible.len(),
			"Filtered strategies by capability."
		);

		Ok(feasible)
	}
}

/// Keeps a non-empty filter result as is; otherwise substitutes the top matched cluster so the
/// drafter always has a strategy.
pub fn reinstate_top_match(
	filtered: Staged<Vec<StrategyCluster>>,
	matched: &[StrategyCluster],
) -> Staged<Vec<StrategyCluster>> {
	let reason = filtered.fallback_reason().cloned().unwrap_or(FallbackReason::Empty);
	let feasible = filtered.settle();

	if !feasible.is_empty() {
		return Ok(feasible);
	}

	warn!(%reason, "No feasible strategy; reinstating the top matched cluster.");

	Err(Fallback::new(matched.iter().take(1).cloned().collect(), reason))
}

/// Maps ids onto the catalog in answer order, skipping unknown and repeated ids.
pub fn resolve_clusters(
	ids: &[Value],
	catalog: &StrategyCatalog,
	limit: usize,
) -> Vec<StrategyCluster> {
	let mut resolved: Vec<StrategyCluster> = Vec::new();

	for id in ids.iter().filter_map(cluster_id) {
		if resolved.len() >= limit {
			break;
		}
		if resolved.iter().any(|cluster| cluster.cluster_id == id) {
			continue;
		}
		if let Some(cluster) = catalog.get(id) {
			resolved.push(cluster.clone());
		}
	}

	resolved
}

fn cluster_id(value: &Value) -> Option<i64> {
	payload::integral_from_value(value)
}

fn build_match_prompt(description: &str, catalog: &StrategyCatalog, limit: usize) -> String {
	let clusters = catalog
		.clusters()
		.iter()
		.map(|cluster| {
			json!({
				"cluster_id": cluster.cluster_id,
				"cluster_name": cluster.display_name(),
				"description_archetype": cluster.description_archetype,
			})
		})
		.collect::<Vec<_>>();
	let clusters = serde_json::to_string_pretty(&clusters).unwrap_or_else(|_| "[]".to_string());

	format!(
		"Below is a scholarship description and a catalog of essay strategy clusters. Each cluster \
describes the kind of scholarship it suits.\n\
\n\
Scholarship description:\n\
{description}\n\
\n\
Strategy clusters:\n\
{clusters}\n\
\n\
Pick between 1 and {limit} clusters whose archetype best fits this scholarship, most relevant \
first. Return only a JSON array of cluster_id values, for example [3, 7]."
	)
}

fn build_capability_prompt(matched: &[StrategyCluster], profile: &StudentProfile) -> String {
	let strategies = matched
		.iter()
		.map(|cluster| {
			json!({
				"cluster_id": cluster.cluster_id,
				"cluster_name": cluster.display_name(),
				"broad_instructions": cluster.writing_strategy.broad_instructions,
			})
		})
		.collect::<Vec<_>>();
	let strategies =
		serde_json::to_string_pretty(&strategies).unwrap_or_else(|_| "[]".to_string());

	format!(
		"Decide which of the essay strategies below this student can credibly carry out with \
their real experience.\n\
\n\
Student profile:\n\
{profile}\n\
\n\
Strategies:\n\
{strategies}\n\
\n\
Rules:\n\
- Reject a strategy built on overcoming hardship when the profile shows no significant \
hardship.\n\
- Reject a strategy built on research when the profile shows no research experience.\n\
- Reject a strategy built on leadership when the profile shows no leadership role.\n\
- Accept a strategy when the profile contains experience that matches what it asks for.\n\
\n\
Return only a JSON array of the accepted cluster_id values. Return [] if none fit.",
		profile = profile.to_prompt_json(),
	)
}
